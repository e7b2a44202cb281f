//! Plain nested-sequence form of a multipolygon: polygons of rings of
//! `(x, y)` pairs, the first ring of each polygon being its exterior.

use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::error::{Result, UnionError};

pub type NestedRing = Vec<(f64, f64)>;
pub type NestedPolygon = Vec<NestedRing>;
pub type NestedMultiPolygon = Vec<NestedPolygon>;

/// Convert nested sequences into a multipolygon.  Orientation is left as
/// given and fixed later by normalization.
pub fn to_multipolygon(nested: &NestedMultiPolygon) -> Result<MultiPolygon<f64>> {
    let ring = |points: &NestedRing| {
        LineString::new(points.iter().map(|&(x, y)| Coord { x, y }).collect())
    };
    nested.iter().enumerate()
        .map(|(p, rings)| match rings.split_first() {
            Some((exterior, holes)) => Ok(Polygon::new(ring(exterior), holes.iter().map(ring).collect())),
            None => Err(UnionError::Format(format!("[io::nested] polygon {p} has no rings"))),
        })
        .collect::<Result<Vec<_>>>()
        .map(MultiPolygon::new)
}

/// Convert a multipolygon into nested sequences.
pub fn from_multipolygon(mp: &MultiPolygon<f64>) -> NestedMultiPolygon {
    mp.0.iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.0.iter().map(|c| (c.x, c.y)).collect())
                .collect()
        })
        .collect()
}
