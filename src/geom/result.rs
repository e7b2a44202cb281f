use ahash::AHashMap;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use rstar::{RTree, RTreeObject, AABB};

use super::kernel::Kernel;
use super::ring::{canonical_ring, canonicalize};
use crate::error::{Result, UnionError};

/// A simple loop of the union boundary.
struct Loop {
    /// Open vertex sequence.
    coords: Vec<Coord<f64>>,
    area:   f64,
    /// A point on the loop that is not a vertex, used for containment tests.
    sample: Coord<f64>,
}

/// Envelope of a loop, indexed in an R-tree.
struct LoopBox {
    idx: usize,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for LoopBox {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope { self.env }
}

/// Split a closed ring at every vertex it visits more than once, giving
/// simple loops (open vertex sequences).
fn split_pinches(ring: &[Coord<f64>]) -> Vec<Vec<Coord<f64>>> {
    let open = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    let key = |c: &Coord<f64>| (c.x.to_bits(), c.y.to_bits());

    let mut loops = Vec::new();
    let mut path: Vec<Coord<f64>> = Vec::with_capacity(open.len());
    let mut seen: AHashMap<(u64, u64), usize> = AHashMap::new();
    for &c in open {
        match seen.get(&key(&c)) {
            Some(&at) => {
                let tail: Vec<Coord<f64>> = path.drain(at + 1..).collect();
                for p in &tail {
                    seen.remove(&key(p));
                }
                let mut lp = Vec::with_capacity(tail.len() + 1);
                lp.push(path[at]);
                lp.extend(tail);
                loops.push(lp);
            }
            None => {
                seen.insert(key(&c), path.len());
                path.push(c);
            }
        }
    }
    loops.push(path);
    loops.retain(|lp| lp.len() >= 3);
    loops
}

/// Turn traced boundary rings into an OGC multipolygon.
///
/// Rings are split into simple loops and loops with area within
/// `area_tolerance` of zero are dropped.  Each remaining loop's nesting depth
/// is the number of other loops containing it: even depths are exteriors,
/// odd depths are holes of the smallest loop around them.  Orientation
/// (counter-clockwise exteriors, clockwise holes) comes from the overlay and
/// is checked against the depth.
pub(crate) fn assemble(kernel: &dyn Kernel, rings: Vec<Vec<Coord<f64>>>, area_tolerance: f64) -> Result<MultiPolygon<f64>> {
    let mut loops: Vec<Loop> = Vec::new();
    for ring in &rings {
        for coords in split_pinches(ring) {
            let area = kernel.signed_area(&coords);
            if !area.is_finite() {
                return Err(UnionError::Numeric(format!("[geom::result] loop area {area} is not finite")));
            }
            if area.abs() <= area_tolerance { continue; }
            let sample = kernel.midpoint(coords[0], coords[1]);
            loops.push(Loop { coords, area, sample });
        }
    }
    if loops.is_empty() {
        return Ok(MultiPolygon::new(Vec::new()));
    }

    let tree = RTree::bulk_load(
        loops.iter().enumerate()
            .map(|(idx, lp)| {
                let (lo, hi) = kernel.envelope(&lp.coords);
                LoopBox { idx, env: AABB::from_corners(lo, hi) }
            })
            .collect(),
    );

    let mut depth = vec![0usize; loops.len()];
    let mut parent: Vec<Option<usize>> = vec![None; loops.len()];
    for (i, lp) in loops.iter().enumerate() {
        let at = AABB::from_point([lp.sample.x, lp.sample.y]);
        for candidate in tree.locate_in_envelope_intersecting(&at) {
            let j = candidate.idx;
            if j == i || !kernel.contains(&loops[j].coords, lp.sample) { continue; }
            depth[i] += 1;
            if parent[i].is_none_or(|p| loops[j].area.abs() < loops[p].area.abs()) {
                parent[i] = Some(j);
            }
        }
    }

    let mut polygon_of: Vec<Option<usize>> = vec![None; loops.len()];
    let mut shells: Vec<(Vec<Coord<f64>>, Vec<LineString<f64>>)> = Vec::new();
    for (i, lp) in loops.iter().enumerate() {
        if depth[i] % 2 == 0 {
            if lp.area < 0.0 {
                return Err(UnionError::AlgorithmInternal(format!(
                    "[geom::result] loop {i} at depth {} is clockwise", depth[i]
                )));
            }
            polygon_of[i] = Some(shells.len());
            shells.push((lp.coords.clone(), Vec::new()));
        }
    }
    for (i, lp) in loops.iter().enumerate() {
        if depth[i] % 2 == 0 { continue; }
        let shell = parent[i]
            .filter(|&p| depth[p] + 1 == depth[i] && lp.area < 0.0)
            .and_then(|p| polygon_of[p])
            .ok_or_else(|| UnionError::AlgorithmInternal(format!(
                "[geom::result] hole loop {i} at depth {} has no enclosing exterior", depth[i]
            )))?;
        shells[shell].1.push(canonical_ring(lp.coords.clone()));
    }

    let polygons = shells.into_iter()
        .map(|(exterior, holes)| Polygon::new(canonical_ring(exterior), holes))
        .collect();
    Ok(canonicalize(MultiPolygon::new(polygons)))
}
