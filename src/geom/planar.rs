//! Cartesian kernel: straight segments in the `(x, y)` plane.

use geo::{Coord, MultiPolygon};
use tracing::trace;

use super::kernel::{vertex_bounds, Crossing, Kernel, Tolerances};
use super::overlay::{Operand, Overlay};
use super::result;
use crate::config::UnionConfig;
use crate::error::{Result, UnionError};

/// Largest coordinate magnitude the kernel accepts.  Shoelace terms and the
/// area tolerance grow with its square and must stay finite.
const MAX_MAGNITUDE: f64 = 1e150;

/// Relative threshold on `|r × s| / (|r| |s|)` below which two segments are
/// treated as parallel.
const PARALLEL_EPS: f64 = 1e-12;

#[inline]
fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.y - a.y * b.x }

#[inline]
fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.x + a.y * b.y }

#[derive(Debug, Clone, Copy, Default)]
pub struct Planar;

impl Kernel for Planar {
    fn name(&self) -> &'static str { "cartesian" }

    fn tolerances(&self, inputs: &[&MultiPolygon<f64>], config: &UnionConfig) -> Result<Tolerances> {
        let magnitude = inputs.iter()
            .flat_map(|mp| mp.0.iter())
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
            .flat_map(|ring| ring.0.iter())
            .filter(|c| c.x.is_finite() && c.y.is_finite())
            .fold(1.0_f64, |m, c| m.max(c.x.abs()).max(c.y.abs()));
        if magnitude > MAX_MAGNITUDE {
            return Err(UnionError::Numeric(format!(
                "[geom::planar] coordinate magnitude {magnitude:e} exceeds {MAX_MAGNITUDE:e}; areas would overflow"
            )));
        }
        Ok(Tolerances {
            snap: config.snap_tolerance * magnitude,
            area: config.area_tolerance * magnitude * magnitude,
        })
    }

    fn signed_area(&self, ring: &[Coord<f64>]) -> f64 {
        let n = ring.len();
        if n < 3 { return 0.0; }
        // Shoelace, translated to the first vertex for precision.
        let origin = ring[0];
        let mut twice = 0.0;
        for i in 1..n - 1 {
            twice += cross(ring[i] - origin, ring[i + 1] - origin);
        }
        twice / 2.0
    }

    #[inline]
    fn heading(&self, from: Coord<f64>, to: Coord<f64>) -> f64 {
        (to.y - from.y).atan2(to.x - from.x)
    }

    #[inline]
    fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        (b.x - a.x).hypot(b.y - a.y)
    }

    fn locate_on_edge(&self, p: Coord<f64>, a: Coord<f64>, b: Coord<f64>, tolerance: f64) -> Option<f64> {
        let d = b - a;
        let len2 = dot(d, d);
        if len2 == 0.0 { return None; }
        let t = dot(p - a, d) / len2;
        if t <= 0.0 || t >= 1.0 { return None; }
        let foot = a + d * t;
        (self.distance(p, foot) <= tolerance).then_some(t)
    }

    fn crossing(&self, a1: Coord<f64>, a2: Coord<f64>, b1: Coord<f64>, b2: Coord<f64>) -> Option<Crossing> {
        let r = a2 - a1;
        let s = b2 - b1;
        let denom = cross(r, s);
        let scale = r.x.hypot(r.y) * s.x.hypot(s.y);
        if denom.abs() <= PARALLEL_EPS * scale { return None; }

        let qp = b1 - a1;
        let t = cross(qp, s) / denom;
        let u = cross(qp, r) / denom;
        if t <= 0.0 || t >= 1.0 || u <= 0.0 || u >= 1.0 { return None; }
        Some(Crossing { point: a1 + r * t, t, u })
    }

    fn contains(&self, ring: &[Coord<f64>], p: Coord<f64>) -> bool {
        let n = ring.len();
        let mut inside = false;
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x { inside = !inside; }
            }
        }
        inside
    }

    #[inline]
    fn midpoint(&self, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
        Coord { x: (a.x + b.x) / 2.0, y: (a.y + b.y) / 2.0 }
    }

    fn envelope(&self, ring: &[Coord<f64>]) -> ([f64; 2], [f64; 2]) {
        vertex_bounds(ring)
    }
}

/// Union of two normalized multipolygons on the plane.  Either may be empty;
/// the other is still overlaid with itself.
pub(crate) fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, tolerances: Tolerances) -> Result<MultiPolygon<f64>> {
    let mut overlay = Overlay::new(&Planar, tolerances);
    overlay.add_operand(Operand::A, a);
    overlay.add_operand(Operand::B, b);
    let rings = overlay.boundary_rings()?;
    trace!(rings = rings.len(), "planar overlay traced");
    result::assemble(&Planar, rings, tolerances.area)
}
