//! Arrow representation of multipolygon columns.
//!
//! A column is `List<List<List<Struct<x: Float64, y: Float64>>>>`: rows of
//! polygons of rings of points.  Field names and nullability are not part of
//! the contract; only the nesting and the two Float64 components are checked.

use std::sync::Arc;

use arrow_array::builder::{Float64Builder, ListBuilder, StructBuilder};
use arrow_array::cast::AsArray;
use arrow_array::types::Float64Type;
use arrow_array::{Array, ListArray};
use arrow_schema::{DataType, Field, Fields};
use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::error::{Result, UnionError};

fn format_error(msg: String) -> UnionError {
    UnionError::Format(format!("[io::arrow] {msg}"))
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The `(x, y)` point struct fields.
pub fn point_fields() -> Fields {
    Fields::from(vec![
        Field::new("x", DataType::Float64, false),
        Field::new("y", DataType::Float64, false),
    ])
}

fn list_of(inner: DataType) -> DataType {
    DataType::List(Arc::new(Field::new_list_field(inner, true)))
}

/// Data type of a ring column.
pub fn ring_type() -> DataType { list_of(DataType::Struct(point_fields())) }

/// Data type of a polygon column.
pub fn polygon_type() -> DataType { list_of(ring_type()) }

/// Data type of a multipolygon column, the type both functions accept and
/// return.
pub fn multipolygon_type() -> DataType { list_of(polygon_type()) }

fn is_point(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Struct(fields)
        if fields.len() == 2 && fields.iter().all(|f| f.data_type() == &DataType::Float64))
}

fn is_list_of(data_type: &DataType, inner: impl Fn(&DataType) -> bool) -> bool {
    matches!(data_type, DataType::List(field) if inner(field.data_type()))
}

/// Whether `data_type` has multipolygon structure.
pub fn is_multipolygon_type(data_type: &DataType) -> bool {
    is_list_of(data_type, |polygon| is_list_of(polygon, |ring| is_list_of(ring, is_point)))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Decode one row of a multipolygon column.  A null row is an empty
/// multipolygon; nulls anywhere inside a row are format errors.
pub fn decode_row(column: &ListArray, row: usize) -> Result<MultiPolygon<f64>> {
    if row >= column.len() {
        return Err(format_error(format!("row {row} out of bounds for column of length {}", column.len())));
    }
    if column.is_null(row) {
        return Ok(MultiPolygon::new(Vec::new()));
    }

    let polygons = column.value(row);
    let polygons = polygons.as_list_opt::<i32>()
        .ok_or_else(|| format_error("polygon level is not a list".into()))?;

    let mut out = Vec::with_capacity(polygons.len());
    for p in 0..polygons.len() {
        if polygons.is_null(p) {
            return Err(format_error(format!("polygon {p} is null")));
        }
        let rings = polygons.value(p);
        let rings = rings.as_list_opt::<i32>()
            .ok_or_else(|| format_error("ring level is not a list".into()))?;
        if rings.is_empty() {
            return Err(format_error(format!("polygon {p} has no rings")));
        }

        let mut decoded = Vec::with_capacity(rings.len());
        for r in 0..rings.len() {
            if rings.is_null(r) {
                return Err(format_error(format!("polygon {p} ring {r} is null")));
            }
            decoded.push(decode_ring(&*rings.value(r), p, r)?);
        }
        let mut decoded = decoded.into_iter();
        let exterior = decoded.next().unwrap_or_else(|| LineString::new(Vec::new()));
        out.push(Polygon::new(exterior, decoded.collect()));
    }
    Ok(MultiPolygon::new(out))
}

fn decode_ring(points: &dyn Array, p: usize, r: usize) -> Result<LineString<f64>> {
    let points = points.as_struct_opt()
        .ok_or_else(|| format_error(format!("polygon {p} ring {r}: points are not structs")))?;
    if points.num_columns() != 2 {
        return Err(format_error(format!("polygon {p} ring {r}: points have {} components", points.num_columns())));
    }
    let component = |i: usize| {
        points.column(i).as_primitive_opt::<Float64Type>()
            .ok_or_else(|| format_error(format!("polygon {p} ring {r}: component {i} is not Float64")))
    };
    let (xs, ys) = (component(0)?, component(1)?);

    let mut coords = Vec::with_capacity(points.len());
    for i in 0..points.len() {
        if points.is_null(i) || xs.is_null(i) || ys.is_null(i) {
            return Err(format_error(format!("polygon {p} ring {r} point {i} is null")));
        }
        coords.push(Coord { x: xs.value(i), y: ys.value(i) });
    }
    Ok(LineString::new(coords))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Incremental builder for a multipolygon column.
pub struct MultiPolygonBuilder {
    inner: ListBuilder<ListBuilder<ListBuilder<StructBuilder>>>,
}

impl Default for MultiPolygonBuilder {
    fn default() -> Self { Self::with_capacity(0) }
}

impl MultiPolygonBuilder {
    pub fn with_capacity(rows: usize) -> Self {
        let points = StructBuilder::from_fields(point_fields(), 0);
        Self {
            inner: ListBuilder::with_capacity(ListBuilder::new(ListBuilder::new(points)), rows),
        }
    }

    /// Append one row.  Rings are written exactly as stored (closed rings
    /// keep their closing point).
    pub fn append(&mut self, mp: &MultiPolygon<f64>) -> Result<()> {
        for polygon in &mp.0 {
            let rings = self.inner.values();
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                let points = rings.values();
                for c in &ring.0 {
                    let point = points.values();
                    point.field_builder::<Float64Builder>(0)
                        .ok_or_else(|| format_error("x builder is not Float64".into()))?
                        .append_value(c.x);
                    point.field_builder::<Float64Builder>(1)
                        .ok_or_else(|| format_error("y builder is not Float64".into()))?
                        .append_value(c.y);
                    point.append(true);
                }
                points.append(true);
            }
            rings.append(true);
        }
        self.inner.append(true);
        Ok(())
    }

    pub fn finish(mut self) -> ListArray { self.inner.finish() }
}

/// Build a column from multipolygons.
pub fn encode_column<'a>(rows: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Result<ListArray> {
    let mut builder = MultiPolygonBuilder::default();
    for mp in rows {
        builder.append(mp)?;
    }
    Ok(builder.finish())
}

/// Decode every row of a column.
pub fn decode_column(column: &ListArray) -> Result<Vec<MultiPolygon<f64>>> {
    (0..column.len()).map(|row| decode_row(column, row).map_err(|e| e.at_row(row))).collect()
}
