//! The two columnar functions, `polygonsUnionCartesian` and
//! `polygonsUnionGeographic`.
//!
//! Each takes two multipolygon columns of equal length and returns, row by
//! row, the union of the two inputs.  Either argument may be a constant (one
//! value standing for every row); when both are, the union is computed once.

use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef, ListArray};
use arrow_schema::DataType;
use geo::MultiPolygon;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{RowErrorPolicy, UnionConfig};
use crate::error::{Result, UnionError};
use crate::geom::{self, Domain};
use crate::io::arrow::{decode_row, encode_column, is_multipolygon_type, multipolygon_type, MultiPolygonBuilder};
use crate::io::nested::{from_multipolygon, to_multipolygon, NestedMultiPolygon};

pub const CARTESIAN_NAME: &str = "polygonsUnionCartesian";
pub const GEOGRAPHIC_NAME: &str = "polygonsUnionGeographic";

/// A function argument: a full column, or a single value repeated `rows`
/// times.
#[derive(Debug, Clone)]
pub enum Argument {
    Column(ArrayRef),
    Constant { value: ArrayRef, rows: usize },
}

impl Argument {
    /// A constant argument holding `mp` for `rows` rows.
    pub fn constant(mp: &MultiPolygon<f64>, rows: usize) -> Result<Self> {
        Ok(Argument::Constant { value: Arc::new(encode_column([mp])?), rows })
    }

    pub fn column(rows: &[MultiPolygon<f64>]) -> Result<Self> {
        Ok(Argument::Column(Arc::new(encode_column(rows)?)))
    }

    /// Number of rows this argument stands for.
    pub fn len(&self) -> usize {
        match self {
            Argument::Column(array) => array.len(),
            Argument::Constant { rows, .. } => *rows,
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[inline] pub fn is_constant(&self) -> bool { matches!(self, Argument::Constant { .. }) }

    pub fn data_type(&self) -> &DataType {
        match self {
            Argument::Column(array) | Argument::Constant { value: array, .. } => array.data_type(),
        }
    }

    fn array(&self) -> &ArrayRef {
        match self {
            Argument::Column(array) | Argument::Constant { value: array, .. } => array,
        }
    }
}

/// A decoded argument, ready for row access.
enum Rows<'a> {
    Column(&'a ListArray),
    Constant(MultiPolygon<f64>),
}

impl Rows<'_> {
    fn get(&self, row: usize) -> Result<MultiPolygon<f64>> {
        match self {
            Rows::Column(column) => decode_row(column, row),
            Rows::Constant(mp) => Ok(mp.clone()),
        }
    }
}

/// Row-wise polygon union over one coordinate domain.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonsUnion {
    domain: Domain,
    config: UnionConfig,
}

impl PolygonsUnion {
    pub fn new(domain: Domain, config: UnionConfig) -> Self { Self { domain, config } }

    /// `polygonsUnionCartesian` with the default configuration.
    pub fn cartesian() -> Self { Self::new(Domain::Cartesian, UnionConfig::default()) }

    /// `polygonsUnionGeographic` with the default configuration.
    pub fn geographic() -> Self { Self::new(Domain::Geographic, UnionConfig::default()) }

    /// Look up a function by its registered name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            CARTESIAN_NAME => Some(Self::cartesian()),
            GEOGRAPHIC_NAME => Some(Self::geographic()),
            _ => None,
        }
    }

    /// Every registered function name.
    pub fn names() -> [&'static str; 2] { [CARTESIAN_NAME, GEOGRAPHIC_NAME] }

    pub fn with_config(self, config: UnionConfig) -> Self { Self { config, ..self } }

    pub fn name(&self) -> &'static str {
        match self.domain {
            Domain::Cartesian => CARTESIAN_NAME,
            Domain::Geographic => GEOGRAPHIC_NAME,
        }
    }

    #[inline] pub fn domain(&self) -> Domain { self.domain }

    #[inline] pub fn config(&self) -> &UnionConfig { &self.config }

    #[inline] pub fn number_of_arguments(&self) -> usize { 2 }

    pub fn return_type(&self) -> DataType { multipolygon_type() }

    /// Validate argument types before execution and return the result type.
    pub fn check_input_types(&self, types: &[&DataType]) -> Result<DataType> {
        if types.len() != self.number_of_arguments() {
            return Err(UnionError::Format(format!(
                "function {} takes {} arguments, got {}", self.name(), self.number_of_arguments(), types.len()
            )));
        }
        for (i, data_type) in types.iter().enumerate() {
            if !is_multipolygon_type(data_type) {
                return Err(UnionError::Format(format!(
                    "argument {} of function {} must be a list of polygons of rings of (Float64, Float64) points, got {data_type}",
                    i + 1, self.name()
                )));
            }
        }
        Ok(self.return_type())
    }

    /// Union two arguments row by row.
    pub fn execute(&self, args: &[Argument]) -> Result<ListArray> {
        let types: Vec<&DataType> = args.iter().map(Argument::data_type).collect();
        self.check_input_types(&types)?;
        let (a, b) = (&args[0], &args[1]);
        if a.len() != b.len() {
            return Err(UnionError::Format(format!(
                "function {}: arguments have {} and {} rows", self.name(), a.len(), b.len()
            )));
        }
        let rows = a.len();
        debug!(function = self.name(), rows, constant_a = a.is_constant(), constant_b = b.is_constant(), "executing");

        let (ra, rb) = (self.rows_of(a)?, self.rows_of(b)?);

        if a.is_constant() && b.is_constant() {
            let mut builder = MultiPolygonBuilder::with_capacity(rows);
            if rows > 0 {
                let merged = self.resolve(0, ra.get(0).and_then(|a| rb.get(0).and_then(|b| self.union(&a, &b))))?;
                for _ in 0..rows {
                    builder.append(&merged)?;
                }
            }
            return Ok(builder.finish());
        }

        let results = self.map_rows(rows, |row| {
            let a = ra.get(row)?;
            let b = rb.get(row)?;
            self.union(&a, &b)
        })?;
        encode_column(&results)
    }

    /// Union two columns of already decoded multipolygons.
    pub fn execute_rows(&self, a: &[MultiPolygon<f64>], b: &[MultiPolygon<f64>]) -> Result<Vec<MultiPolygon<f64>>> {
        if a.len() != b.len() {
            return Err(UnionError::Format(format!(
                "function {}: arguments have {} and {} rows", self.name(), a.len(), b.len()
            )));
        }
        self.map_rows(a.len(), |row| self.union(&a[row], &b[row]))
    }

    /// Union of one pair of multipolygons.
    pub fn union(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        geom::union(self.domain, a, b, &self.config)
    }

    fn rows_of<'a>(&self, arg: &'a Argument) -> Result<Rows<'a>> {
        let column = arg.array().as_list_opt::<i32>()
            .ok_or_else(|| UnionError::Format(format!("function {}: argument is not a list column", self.name())))?;
        match arg {
            Argument::Column(_) => Ok(Rows::Column(column)),
            Argument::Constant { .. } => {
                if column.is_empty() {
                    return Err(UnionError::Format(format!("function {}: constant argument has no value", self.name())));
                }
                Ok(Rows::Constant(decode_row(column, 0).map_err(|e| e.at_row(0))?))
            }
        }
    }

    /// Evaluate `f` for every row, in parallel when configured.  Results keep
    /// row order and the first failing row (by index) decides the error.
    fn map_rows<F>(&self, rows: usize, f: F) -> Result<Vec<MultiPolygon<f64>>>
    where
        F: Fn(usize) -> Result<MultiPolygon<f64>> + Sync,
    {
        let results: Vec<Result<MultiPolygon<f64>>> = if self.config.parallel && rows > 1 {
            (0..rows).into_par_iter().map(|row| self.resolve(row, f(row))).collect()
        } else {
            (0..rows).map(|row| self.resolve(row, f(row))).collect()
        };
        results.into_iter().collect()
    }

    /// Apply the row error policy to one row's result.
    fn resolve(&self, row: usize, result: Result<MultiPolygon<f64>>) -> Result<MultiPolygon<f64>> {
        match result {
            Ok(mp) => Ok(mp),
            Err(e) => {
                let e = e.at_row(row);
                if self.config.on_row_error == RowErrorPolicy::EmitEmpty && e.is_row_recoverable() {
                    warn!(function = self.name(), row, error = %e, "row failed; emitting empty result");
                    Ok(MultiPolygon::new(Vec::new()))
                } else {
                    Err(e)
                }
            }
        }
    }
}

/// Union of one pair of rows in nested form, for callers without Arrow.
pub fn union_rows(domain: Domain, a: &NestedMultiPolygon, b: &NestedMultiPolygon, config: &UnionConfig) -> Result<NestedMultiPolygon> {
    let a = to_multipolygon(a)?;
    let b = to_multipolygon(b)?;
    geom::union(domain, &a, &b, config).map(|mp| from_multipolygon(&mp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve() {
        for name in PolygonsUnion::names() {
            assert_eq!(PolygonsUnion::by_name(name).unwrap().name(), name);
        }
        assert!(PolygonsUnion::by_name("polygonsUnionSpherical").is_none());
        assert_eq!(PolygonsUnion::geographic().domain(), Domain::Geographic);
    }

    #[test]
    fn input_types_are_checked() {
        let f = PolygonsUnion::cartesian();
        let good = multipolygon_type();
        assert_eq!(f.check_input_types(&[&good, &good]).unwrap(), good);
        assert!(matches!(f.check_input_types(&[&good]), Err(UnionError::Format(_))));
        let err = f.check_input_types(&[&good, &DataType::Float64]).unwrap_err();
        assert!(err.to_string().contains("argument 2"));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let empty = MultiPolygon::new(vec![]);
        let a = Argument::column(&[empty.clone(), empty.clone()]).unwrap();
        let b = Argument::column(&[empty]).unwrap();
        assert!(matches!(PolygonsUnion::cartesian().execute(&[a, b]), Err(UnionError::Format(_))));
    }

    #[test]
    fn nested_rows_union() {
        let a = vec![vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]]];
        let b = vec![vec![vec![(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)]]];
        let out = union_rows(Domain::Cartesian, &a, &b, &UnionConfig::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 1);
        assert_eq!(out[0][0].first(), Some(&(0.0, 0.0)));
        assert_eq!(out[0][0].first(), out[0][0].last());

        let err = union_rows(Domain::Cartesian, &vec![vec![]], &b, &UnionConfig::default()).unwrap_err();
        assert!(matches!(err, UnionError::Format(_)));
    }
}
