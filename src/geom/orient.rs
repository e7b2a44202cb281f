use geo::{Coord, LineString, MultiPolygon, Polygon};
use tracing::trace;

use super::kernel::Kernel;
use super::ring::{distinct_points, open_coords};
use crate::error::{Result, UnionError};

/// Reject NaN and infinite coordinates.
pub(crate) fn check_finite(mp: &MultiPolygon<f64>) -> Result<()> {
    for (p, polygon) in mp.0.iter().enumerate() {
        for (r, ring) in std::iter::once(polygon.exterior()).chain(polygon.interiors()).enumerate() {
            if let Some((i, c)) = ring.0.iter().enumerate().find(|(_, c)| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(UnionError::Numeric(format!(
                    "[geom::orient] polygon {p} ring {r} point {i}: coordinate ({}, {}) is not finite", c.x, c.y
                )));
            }
        }
    }
    Ok(())
}

/// Bring a multipolygon into the shape the overlay expects: rings closed,
/// consecutive duplicates removed, exteriors counter-clockwise and holes
/// clockwise.
///
/// Degenerate rings (fewer than three distinct points, or zero area) are
/// dropped; a polygon whose exterior is degenerate is dropped with its
/// holes.  In `strict` mode the same rings are errors instead, and so is
/// any ring that touches or crosses itself within `tolerance`.
pub fn normalize(kernel: &dyn Kernel, mp: &MultiPolygon<f64>, strict: bool, tolerance: f64) -> Result<MultiPolygon<f64>> {
    check_finite(mp)?;

    let mut polygons = Vec::with_capacity(mp.0.len());
    for (p, polygon) in mp.0.iter().enumerate() {
        let Some(exterior) = orient_ring(kernel, polygon.exterior(), true) else {
            if strict {
                return Err(UnionError::GeometryValidity(format!("[geom::orient] polygon {p}: degenerate exterior ring")));
            }
            trace!(polygon = p, "dropping polygon with degenerate exterior");
            continue;
        };

        let mut holes = Vec::with_capacity(polygon.interiors().len());
        for (h, ring) in polygon.interiors().iter().enumerate() {
            match orient_ring(kernel, ring, false) {
                Some(hole) => holes.push(hole),
                None if strict => {
                    return Err(UnionError::GeometryValidity(format!("[geom::orient] polygon {p} hole {h}: degenerate ring")));
                }
                None => trace!(polygon = p, hole = h, "dropping degenerate hole"),
            }
        }

        if strict {
            for (r, ring) in std::iter::once(&exterior).chain(&holes).enumerate() {
                check_simple(kernel, open_coords(ring), tolerance)
                    .map_err(|msg| UnionError::GeometryValidity(format!("[geom::orient] polygon {p} ring {r}: {msg}")))?;
            }
        }
        polygons.push(Polygon::new(exterior, holes));
    }
    Ok(MultiPolygon::new(polygons))
}

/// Clean and orient one ring; `None` if it is degenerate.
fn orient_ring(kernel: &dyn Kernel, ring: &LineString<f64>, ccw: bool) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = ring.0.clone();
    coords.dedup();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if distinct_points(&coords) < 3 { return None; }

    let area = kernel.signed_area(&coords);
    if area == 0.0 { return None; }

    let mut ring = LineString::new(coords);
    ring.close();
    if (area > 0.0) != ccw {
        ring.0.reverse();
    }
    Some(ring)
}

/// Check that an open ring neither revisits a vertex nor touches or crosses
/// itself.
fn check_simple(kernel: &dyn Kernel, ring: &[Coord<f64>], tolerance: f64) -> std::result::Result<(), String> {
    let n = ring.len();
    let edge = |i: usize| (ring[i], ring[(i + 1) % n]);

    for i in 0..n {
        for j in i + 1..n {
            if kernel.distance(ring[i], ring[j]) <= tolerance {
                return Err(format!("vertices {i} and {j} coincide"));
            }
        }
    }

    for i in 0..n {
        let (a1, a2) = edge(i);
        for j in i + 1..n {
            let (b1, b2) = edge(j);
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if !adjacent && kernel.crossing(a1, a2, b1, b2).is_some() {
                return Err(format!("edges {i} and {j} cross"));
            }
            // A vertex on another edge's interior; for adjacent edges this
            // catches a spike folding back over itself.
            let touches = [(b1, (a1, a2)), (b2, (a1, a2)), (a1, (b1, b2)), (a2, (b1, b2))]
                .into_iter()
                .any(|(p, (s, e))| kernel.locate_on_edge(p, s, e, tolerance).is_some());
            if touches {
                return Err(format!("edges {i} and {j} touch"));
            }
        }
    }
    Ok(())
}
