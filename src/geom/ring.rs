use std::cmp::Ordering;

use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Lexicographic (x, y) order; the tie-break used everywhere output order
/// must be reproducible.
#[inline]
pub(crate) fn lex_cmp(a: &Coord<f64>, b: &Coord<f64>) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// The ring's coordinates without the closing duplicate, if present.
pub(crate) fn open_coords(ring: &LineString<f64>) -> &[Coord<f64>] {
    match ring.0.as_slice() {
        [first, .., last] if first == last => &ring.0[..ring.0.len() - 1],
        coords => coords,
    }
}

/// Number of distinct points (exact comparison).
pub(crate) fn distinct_points(coords: &[Coord<f64>]) -> usize {
    let mut sorted = coords.to_vec();
    sorted.sort_by(lex_cmp);
    sorted.dedup();
    sorted.len()
}

/// Rotate an open ring to start at its lexicographically smallest vertex and
/// close it.
pub(crate) fn canonical_ring(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
    if let Some(start) = (0..coords.len()).min_by(|&i, &j| lex_cmp(&coords[i], &coords[j])) {
        coords.rotate_left(start);
    }
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

/// Canonical vertex order for a multipolygon: every ring starts at its
/// smallest vertex, holes are sorted by that vertex, and polygons by the
/// smallest vertex of their exterior.
pub(crate) fn canonicalize(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
    let mut polygons: Vec<Polygon<f64>> = mp.0.into_iter()
        .map(|polygon| {
            let (exterior, interiors) = polygon.into_inner();
            let exterior = canonical_ring(open_coords(&exterior).to_vec());
            let mut holes: Vec<LineString<f64>> = interiors.iter()
                .map(|hole| canonical_ring(open_coords(hole).to_vec()))
                .collect();
            holes.sort_by(|a, b| first_cmp(a, b));
            Polygon::new(exterior, holes)
        })
        .collect();
    polygons.sort_by(|a, b| first_cmp(a.exterior(), b.exterior()));
    MultiPolygon::new(polygons)
}

fn first_cmp(a: &LineString<f64>, b: &LineString<f64>) -> Ordering {
    match (a.0.first(), b.0.first()) {
        (Some(p), Some(q)) => lex_cmp(p, q),
        (p, q) => p.is_some().cmp(&q.is_some()),
    }
}
