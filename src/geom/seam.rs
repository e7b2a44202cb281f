//! Longitude frames for the spherical overlay.
//!
//! Input longitudes are only meaningful modulo 360.  Before overlaying, every
//! ring is unwrapped into a continuous sequence and shifted into a common
//! 360° window `[cut, cut + 360]` whose edges fall in a longitude band no
//! polygon touches.  Edges that cross the antimeridian get an explicit vertex
//! on it, so the output can be wrapped back to `[-180, 180]` without any edge
//! spanning the seam in the wrong direction.
//!
//! Polygons whose footprints (longitude arc and latitude range) are apart can
//! never meet, so [`partition`] splits the inputs into groups first and each
//! group fits its own frame.  Only a group that wraps all the way around the
//! globe is left without a free meridian.

use geo::{Coord, LineString, MapCoords, MultiPolygon, Polygon};

use super::overlay::Components;
use super::ring::open_coords;
use super::spherical::{latitude_at, ring_latitude_range, wrap_delta};
use crate::error::{Result, UnionError};

/// The frame used when the antimeridian itself is free.
const STANDARD_CUT: f64 = -180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Frame {
    cut: f64,
}

/// A ring unwrapped into continuous longitudes, starting at its first vertex.
fn unwrap(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        let x = match out.last() {
            Some(prev) => prev.x + wrap_delta(c.x - prev.x),
            None => c.x,
        };
        out.push(Coord { x, y: c.y });
    }
    out
}

/// Whether `x` (modulo 360) lies in the closed arc `[start, end]`.
fn in_arc(x: f64, start: f64, end: f64) -> bool {
    let shifted = start + (x - start).rem_euclid(360.0);
    shifted <= end
}

/// Wrap a longitude into `[-180, 180]`, leaving in-range values untouched.
fn wrap_lon(x: f64) -> f64 {
    if (-180.0..=180.0).contains(&x) { return x; }
    let r = x - 360.0 * (x / 360.0).round();
    if r <= -180.0 { r + 360.0 } else { r }
}

/// Longitude span of an open ring as `(start in [0, 360), length)`.
fn lon_arc(ring: &[Coord<f64>]) -> Result<Option<(f64, f64)>> {
    let coords = unwrap(ring);
    let Some(first) = coords.first() else { return Ok(None) };
    let (lo, hi) = coords.iter()
        .fold((first.x, first.x), |(lo, hi), c| (lo.min(c.x), hi.max(c.x)));
    if hi - lo >= 360.0 {
        return Err(UnionError::GeometryValidity("[geom::seam] ring spans every longitude".into()));
    }
    Ok(Some((lo.rem_euclid(360.0), hi - lo)))
}

/// Longitude arc and latitude range of a polygon's exterior.  A pole-free
/// polygon lies inside it.
#[derive(Debug, Clone, Copy)]
struct Footprint {
    start: f64,
    len:   f64,
    south: f64,
    north: f64,
}

impl Footprint {
    fn of(polygon: &Polygon<f64>) -> Result<Option<Self>> {
        let ring = open_coords(polygon.exterior());
        let Some((start, len)) = lon_arc(ring)? else { return Ok(None) };
        let (south, north) = ring_latitude_range(ring);
        Ok(Some(Footprint { start, len, south, north }))
    }

    fn meets(&self, other: &Footprint, pad: f64) -> bool {
        let lat = self.south <= other.north + pad && other.south <= self.north + pad;
        let lon = in_arc(other.start, self.start - pad, self.start + self.len + pad)
            || in_arc(self.start, other.start - pad, other.start + other.len + pad);
        lat && lon
    }
}

/// Split the polygons of both operands into groups whose footprints, padded
/// by `pad` degrees, do not meet any other group's.  Groups come out in
/// order of their first polygon, each as `[from a, from b]`.
pub(crate) fn partition(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, pad: f64) -> Result<Vec<[MultiPolygon<f64>; 2]>> {
    let polygons: Vec<(usize, &Polygon<f64>)> = a.0.iter().map(|p| (0, p))
        .chain(b.0.iter().map(|p| (1, p)))
        .collect();
    let footprints = polygons.iter()
        .map(|(_, polygon)| Footprint::of(polygon))
        .collect::<Result<Vec<_>>>()?;

    let mut components = Components::new(polygons.len());
    for i in 0..polygons.len() {
        let Some(fi) = footprints[i] else { continue };
        for j in i + 1..polygons.len() {
            if footprints[j].is_some_and(|fj| fi.meets(&fj, pad)) {
                components.union(i, j);
            }
        }
    }

    let mut group_of: Vec<Option<usize>> = vec![None; polygons.len()];
    let mut groups: Vec<[Vec<Polygon<f64>>; 2]> = Vec::new();
    for (i, &(operand, polygon)) in polygons.iter().enumerate() {
        let root = components.find(i);
        let g = *group_of[root].get_or_insert_with(|| {
            groups.push([Vec::new(), Vec::new()]);
            groups.len() - 1
        });
        groups[g][operand].push(polygon.clone());
    }
    Ok(groups.into_iter()
        .map(|[ga, gb]| [MultiPolygon::new(ga), MultiPolygon::new(gb)])
        .collect())
}

impl Frame {
    #[inline] pub(crate) fn cut(&self) -> f64 { self.cut }

    /// Choose a cut meridian that no ring of `inputs` crosses.  The standard
    /// antimeridian is kept whenever it is free.
    pub(crate) fn fit(inputs: &[&MultiPolygon<f64>]) -> Result<Self> {
        let mut arcs: Vec<(f64, f64)> = Vec::new();
        for mp in inputs {
            for polygon in &mp.0 {
                for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                    arcs.extend(lon_arc(open_coords(ring))?);
                }
            }
        }
        if arcs.is_empty() { return Ok(Frame { cut: STANDARD_CUT }); }

        arcs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let first = arcs[0].0;
        let mut reach = first + arcs[0].1;
        let mut gaps: Vec<(f64, f64)> = Vec::new();
        for &(start, len) in &arcs[1..] {
            if start > reach { gaps.push((reach, start)); }
            reach = reach.max(start + len);
        }
        if first + 360.0 > reach { gaps.push((reach, first + 360.0)); }

        if gaps.iter().any(|&(s, e)| in_arc(STANDARD_CUT, s, e)) {
            return Ok(Frame { cut: STANDARD_CUT });
        }
        let Some(&(s, e)) = gaps.iter().max_by(|a, b| (a.1 - a.0).total_cmp(&(b.1 - b.0))) else {
            return Err(UnionError::GeometryValidity(
                "[geom::seam] overlapping polygons wrap around every longitude; no meridian is free to cut along".into(),
            ));
        };
        Ok(Frame { cut: (s + e) / 2.0 })
    }

    /// Move a multipolygon into this frame, splitting edges at the
    /// antimeridian.
    pub(crate) fn enter(&self, mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        let polygons = mp.0.iter()
            .map(|polygon| Polygon::new(
                self.enter_ring(polygon.exterior()),
                polygon.interiors().iter().map(|ring| self.enter_ring(ring)).collect(),
            ))
            .collect();
        MultiPolygon::new(polygons)
    }

    fn enter_ring(&self, ring: &LineString<f64>) -> LineString<f64> {
        let coords = unwrap(open_coords(ring));
        let Some(lo) = coords.iter().map(|c| c.x).min_by(f64::total_cmp) else {
            return LineString::new(Vec::new());
        };
        let shift = 360.0 * ((self.cut - lo) / 360.0).ceil();

        let n = coords.len();
        let mut out = Vec::with_capacity(n + 2);
        for i in 0..n {
            let a = Coord { x: coords[i].x + shift, y: coords[i].y };
            let next = coords[(i + 1) % n];
            // The closing edge wraps back to the unwrapped start.
            let b = Coord { x: next.x + shift, y: next.y };
            out.push(a);
            if let Some(seam) = seam_crossing(a, b) {
                out.push(Coord { x: seam, y: latitude_at(a, b, seam) });
            }
        }
        if let Some(&first) = out.first() { out.push(first); }
        LineString::new(out)
    }

    /// Wrap a multipolygon from this frame back to `[-180, 180]`.
    pub(crate) fn leave(&self, mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        mp.map_coords(|c| Coord { x: wrap_lon(c.x), y: c.y })
    }
}

/// The antimeridian (an odd multiple of 180) strictly between the edge's
/// endpoint longitudes, if any.
fn seam_crossing(a: Coord<f64>, b: Coord<f64>) -> Option<f64> {
    let (lo, hi) = if a.x <= b.x { (a.x, b.x) } else { (b.x, a.x) };
    let mut seam = 180.0 + 360.0 * ((lo - 180.0) / 360.0).floor();
    if seam <= lo { seam += 360.0; }
    (seam < hi).then_some(seam)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn standard_cut_when_antimeridian_is_free() {
        let mp = MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 0.0)]]);
        let frame = Frame::fit(&[&mp]).unwrap();
        assert_eq!(frame.cut(), STANDARD_CUT);
        assert_eq!(frame.enter(&mp), mp);
    }

    #[test]
    fn crossing_ring_moves_the_cut_and_gains_seam_vertices() {
        let mp = MultiPolygon::new(vec![polygon![
            (x: 170.0, y: 0.0), (x: -170.0, y: 0.0), (x: -170.0, y: 10.0), (x: 170.0, y: 10.0), (x: 170.0, y: 0.0)
        ]]);
        let frame = Frame::fit(&[&mp]).unwrap();
        assert_ne!(frame.cut(), STANDARD_CUT);

        let entered = frame.enter(&mp);
        let ring = &entered.0[0].exterior().0;
        // Continuous longitudes, two seam vertices, closed.
        assert_eq!(ring.len(), 7);
        assert_eq!(ring.first(), ring.last());
        for w in ring.windows(2) {
            assert!((w[1].x - w[0].x).abs() < 180.0);
        }
        let seams = ring[..6].iter().filter(|c| (c.x - 180.0).rem_euclid(360.0) == 0.0).count();
        assert_eq!(seams, 2);

        let back = frame.leave(&entered);
        for c in &back.0[0].exterior().0 {
            assert!((-180.0..=180.0).contains(&c.x));
        }
    }

    fn band(lon: f64, lat: f64) -> Polygon<f64> {
        polygon![
            (x: lon, y: lat), (x: lon + 100.0, y: lat), (x: lon + 100.0, y: lat + 10.0), (x: lon, y: lat + 10.0), (x: lon, y: lat)
        ]
    }

    #[test]
    fn belt_around_the_globe_has_no_cut() {
        let mp = MultiPolygon::new(vec![band(-180.0, 0.0), band(-90.0, 0.0), band(0.0, 0.0), band(90.0, 0.0)]);
        let err = Frame::fit(&[&mp]).unwrap_err();
        assert!(matches!(err, UnionError::GeometryValidity(_)));

        let groups = partition(&mp, &MultiPolygon::new(vec![]), 1e-7).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0][0].0.len(), 4);
    }

    #[test]
    fn separate_latitudes_split_into_groups() {
        // Together the bands reach every longitude, but they never meet.
        let a = MultiPolygon::new(vec![band(-180.0, 0.0), band(-90.0, 0.0)]);
        let b = MultiPolygon::new(vec![band(0.0, 40.0), band(90.0, 40.0)]);
        assert!(Frame::fit(&[&a, &b]).is_err());

        let groups = partition(&a, &b, 1e-7).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0][0].0.len(), groups[0][1].0.len()), (2, 0));
        assert_eq!((groups[1][0].0.len(), groups[1][1].0.len()), (0, 2));
        for [ga, gb] in &groups {
            assert!(Frame::fit(&[ga, gb]).is_ok());
        }
    }

    #[test]
    fn touching_polygons_share_a_group() {
        let a = MultiPolygon::new(vec![band(0.0, 0.0)]);
        let b = MultiPolygon::new(vec![band(100.0, 0.0), band(0.0, 60.0)]);
        let groups = partition(&a, &b, 1e-7).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0][0].0.len(), groups[0][1].0.len()), (1, 1));
        assert_eq!((groups[1][0].0.len(), groups[1][1].0.len()), (0, 1));
    }

    #[test]
    fn wrap_lon_keeps_in_range_values() {
        assert_eq!(wrap_lon(-180.0), -180.0);
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(540.0), 180.0);
    }
}
