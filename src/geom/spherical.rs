//! Geographic kernel: `(longitude, latitude)` in degrees on the unit sphere,
//! edges are minor great-circle arcs.
//!
//! The overlay itself runs in a longitude frame chosen by [`Frame`], so every
//! ring is continuous in longitude and never crosses the frame's cut.  Kernel
//! operations assume their arguments come from one such frame.

use std::f64::consts::{FRAC_PI_2, PI};

use geo::{Coord, MultiPolygon};
use nalgebra::Vector3;
use tracing::trace;

use super::kernel::{vertex_bounds, Crossing, Kernel, Tolerances};
use super::overlay::{Operand, Overlay};
use super::result;
use super::ring::{canonicalize, open_coords};
use super::seam::{partition, Frame};
use crate::config::UnionConfig;
use crate::error::{Result, UnionError};

/// Cross products shorter than this are treated as degenerate (coincident or
/// antipodal points).
const DEGENERATE: f64 = 1e-15;

/// Relative threshold below which two great circles are considered the same.
const PARALLEL_EPS: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Vector helpers
// ---------------------------------------------------------------------------

/// Unit vector for a `(lon, lat)` coordinate in degrees.
pub(crate) fn to_unit(c: Coord<f64>) -> Vector3<f64> {
    let (lon, lat) = (c.x.to_radians(), c.y.to_radians());
    Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Coordinate of a unit vector, with the longitude taken within 180° of
/// `near_lon`.
pub(crate) fn from_unit(v: &Vector3<f64>, near_lon: f64) -> Coord<f64> {
    let lon = v.y.atan2(v.x).to_degrees();
    let lon = lon + 360.0 * ((near_lon - lon) / 360.0).round();
    Coord { x: lon, y: v.z.clamp(-1.0, 1.0).asin().to_degrees() }
}

/// Wrap a longitude difference into `(-180, 180]`.
pub(crate) fn wrap_delta(d: f64) -> f64 {
    let r = d - 360.0 * (d / 360.0).round();
    if r <= -180.0 { r + 360.0 } else { r }
}

/// Angle between two unit vectors, in radians.
#[inline]
fn angle(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}

/// Whether `x` lies strictly between `a` and `b` on the minor arc with
/// normal `n = a × b`.
#[inline]
fn within_arc(x: &Vector3<f64>, a: &Vector3<f64>, b: &Vector3<f64>, n: &Vector3<f64>) -> bool {
    a.cross(x).dot(n) > 0.0 && x.cross(b).dot(n) > 0.0
}

/// Latitude where the minor arc `a→b` meets the meridian `lon`, for `lon`
/// between the endpoint longitudes (same frame).
pub(crate) fn latitude_at(a: Coord<f64>, b: Coord<f64>, lon: f64) -> f64 {
    let (l1, l2, l) = (a.x.to_radians(), b.x.to_radians(), lon.to_radians());
    let denom = (l2 - l1).sin();
    if denom.abs() < DEGENERATE {
        if a.x == b.x { return a.y.max(b.y); }
        return a.y + (b.y - a.y) * (lon - a.x) / (b.x - a.x);
    }
    let tan = (a.y.to_radians().tan() * (l2 - l).sin() + b.y.to_radians().tan() * (l - l1).sin()) / denom;
    tan.atan().to_degrees()
}

/// Latitude range covered by the minor arc `a→b`.  Arcs bulge poleward, so
/// the range can extend past both endpoints.
pub(crate) fn arc_latitude_range(a: Coord<f64>, b: Coord<f64>) -> (f64, f64) {
    let (mut south, mut north) = (a.y.min(b.y), a.y.max(b.y));
    let (va, vb) = (to_unit(a), to_unit(b));
    let n = va.cross(&vb);
    let len = n.norm();
    if len < DEGENERATE { return (south, north); }
    let n = n / len;

    // Northernmost point of the great circle.
    let top = Vector3::z() - n * n.z;
    let top_len = top.norm();
    if top_len < DEGENERATE { return (south, north); }
    let top = top / top_len;
    let peak = top.z.clamp(-1.0, 1.0).asin().to_degrees();
    if within_arc(&top, &va, &vb, &n) { north = north.max(peak); }
    if within_arc(&-top, &va, &vb, &n) { south = south.min(-peak); }
    (south, north)
}

/// Latitude range covered by the edges of an open ring.
pub(crate) fn ring_latitude_range(ring: &[Coord<f64>]) -> (f64, f64) {
    let n = ring.len();
    (0..n)
        .map(|i| arc_latitude_range(ring[i], ring[(i + 1) % n]))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (s, e)| (lo.min(s), hi.max(e)))
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct Spherical;

impl Kernel for Spherical {
    fn name(&self) -> &'static str { "geographic" }

    fn tolerances(&self, _inputs: &[&MultiPolygon<f64>], config: &UnionConfig) -> Result<Tolerances> {
        Ok(Tolerances {
            snap: config.snap_tolerance * 180.0,
            area: config.area_tolerance * 4.0 * PI,
        })
    }

    fn validate(&self, mp: &MultiPolygon<f64>) -> Result<()> {
        let invalid = |p: usize, r: usize, msg: String| {
            UnionError::GeometryValidity(format!("[geom::spherical] polygon {p} ring {r}: {msg}"))
        };
        for (p, polygon) in mp.0.iter().enumerate() {
            for (r, ring) in std::iter::once(polygon.exterior()).chain(polygon.interiors()).enumerate() {
                let coords = open_coords(ring);
                for c in coords {
                    if c.y.abs() > 90.0 {
                        return Err(invalid(p, r, format!("latitude {} outside [-90, 90]", c.y)));
                    }
                    if c.y.abs() == 90.0 {
                        return Err(invalid(p, r, format!("vertex ({}, {}) lies on a pole", c.x, c.y)));
                    }
                }
                let n = coords.len();
                let mut winding = 0.0;
                for i in 0..n {
                    let (a, b) = (coords[i], coords[(i + 1) % n]);
                    let d = wrap_delta(b.x - a.x);
                    if d == 180.0 {
                        return Err(invalid(p, r, format!("edge ({}, {}) -> ({}, {}) passes over a pole", a.x, a.y, b.x, b.y)));
                    }
                    winding += d;
                }
                if winding.abs() > 180.0 {
                    return Err(invalid(p, r, "ring encloses a pole".into()));
                }
            }
        }
        Ok(())
    }

    /// Area on the unit sphere, in steradians.
    fn signed_area(&self, ring: &[Coord<f64>]) -> f64 {
        let n = ring.len();
        if n < 3 { return 0.0; }
        let mut sum = 0.0;
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            let dl = wrap_delta(b.x - a.x).to_radians();
            sum += dl * (2.0 + a.y.to_radians().sin() + b.y.to_radians().sin());
        }
        -sum / 2.0
    }

    fn heading(&self, from: Coord<f64>, to: Coord<f64>) -> f64 {
        let (p1, p2) = (from.y.to_radians(), to.y.to_radians());
        let dl = (to.x - from.x).to_radians();
        let azimuth = (dl.sin() * p2.cos()).atan2(p1.cos() * p2.sin() - p1.sin() * p2.cos() * dl.cos());
        FRAC_PI_2 - azimuth
    }

    /// Central angle in degrees.
    fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        angle(&to_unit(a), &to_unit(b)).to_degrees()
    }

    fn locate_on_edge(&self, p: Coord<f64>, a: Coord<f64>, b: Coord<f64>, tolerance: f64) -> Option<f64> {
        let (va, vb, vp) = (to_unit(a), to_unit(b), to_unit(p));
        let n = va.cross(&vb);
        let len = n.norm();
        if len < DEGENERATE { return None; }
        let n = n / len;

        let offset = vp.dot(&n).clamp(-1.0, 1.0).asin().abs().to_degrees();
        if offset > tolerance { return None; }
        if !within_arc(&vp, &va, &vb, &n) { return None; }

        let t = angle(&va, &vp) / angle(&va, &vb);
        (t > 0.0 && t < 1.0).then_some(t)
    }

    fn crossing(&self, a1: Coord<f64>, a2: Coord<f64>, b1: Coord<f64>, b2: Coord<f64>) -> Option<Crossing> {
        let (va1, va2, vb1, vb2) = (to_unit(a1), to_unit(a2), to_unit(b1), to_unit(b2));
        let na = va1.cross(&va2);
        let nb = vb1.cross(&vb2);
        let (la, lb) = (na.norm(), nb.norm());
        if la < DEGENERATE || lb < DEGENERATE { return None; }

        let line = na.cross(&nb);
        let len = line.norm();
        if len <= PARALLEL_EPS * la * lb { return None; }
        let x = line / len;

        for candidate in [x, -x] {
            if !within_arc(&candidate, &va1, &va2, &na) || !within_arc(&candidate, &vb1, &vb2, &nb) {
                continue;
            }
            let t = angle(&va1, &candidate) / angle(&va1, &va2);
            let u = angle(&vb1, &candidate) / angle(&vb1, &vb2);
            if t <= 0.0 || t >= 1.0 || u <= 0.0 || u >= 1.0 { return None; }
            return Some(Crossing { point: from_unit(&candidate, a1.x), t, u });
        }
        None
    }

    /// Even-odd count along the meridian from `p` to the north pole; rings
    /// never enclose a pole.
    fn contains(&self, ring: &[Coord<f64>], p: Coord<f64>) -> bool {
        let n = ring.len();
        let mut inside = false;
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            if (a.x <= p.x) != (b.x <= p.x) && latitude_at(a, b, p.x) > p.y {
                inside = !inside;
            }
        }
        inside
    }

    fn midpoint(&self, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
        let sum = to_unit(a) + to_unit(b);
        let len = sum.norm();
        if len < DEGENERATE {
            return Coord { x: (a.x + b.x) / 2.0, y: (a.y + b.y) / 2.0 };
        }
        from_unit(&(sum / len), a.x)
    }

    /// Longitude range of the vertices; arcs bulge poleward, so latitude is
    /// left unbounded.
    fn envelope(&self, ring: &[Coord<f64>]) -> ([f64; 2], [f64; 2]) {
        let (lo, hi) = vertex_bounds(ring);
        ([lo[0], -90.0], [hi[0], 90.0])
    }
}

/// Union of two normalized multipolygons on the sphere.  Either may be
/// empty.
///
/// Polygons are first split into groups that cannot meet; each group is
/// overlaid in its own longitude frame, so inputs that together cover every
/// longitude still union as long as no single group does.
pub(crate) fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, tolerances: Tolerances) -> Result<MultiPolygon<f64>> {
    let groups = partition(a, b, tolerances.snap)?;
    trace!(groups = groups.len(), "spherical partition");

    let mut polygons = Vec::new();
    for [ga, gb] in &groups {
        let frame = Frame::fit(&[ga, gb])?;
        trace!(cut = frame.cut(), "longitude frame");

        let mut overlay = Overlay::new(&Spherical, tolerances);
        overlay.add_operand(Operand::A, &frame.enter(ga));
        overlay.add_operand(Operand::B, &frame.enter(gb));
        let rings = overlay.boundary_rings()?;
        trace!(rings = rings.len(), "spherical overlay traced");

        let merged = result::assemble(&Spherical, rings, tolerances.area)?;
        polygons.extend(frame.leave(&merged).0);
    }
    Ok(canonicalize(MultiPolygon::new(polygons)))
}
