use geo::{Coord, MultiPolygon};

use crate::config::UnionConfig;
use crate::error::Result;

/// Absolute tolerances for one union, in the kernel's own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Vertices closer than this are merged; points this close to an edge
    /// split it.
    pub snap: f64,
    /// Result loops with at most this much area are dropped.
    pub area: f64,
}

/// A proper crossing of two edges `a1→a2` and `b1→b2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub point: Coord<f64>,
    /// Parameter along `a1→a2`, strictly inside `(0, 1)`.
    pub t: f64,
    /// Parameter along `b1→b2`, strictly inside `(0, 1)`.
    pub u: f64,
}

/// Geometric primitives the overlay engine needs from a coordinate domain.
///
/// The planar kernel treats coordinates as `(x, y)` and edges as straight
/// segments; the spherical kernel treats them as `(longitude, latitude)` in
/// degrees and edges as minor great-circle arcs.  Everything above this
/// trait (snapping, splitting, face classification, ring assembly) is shared.
pub trait Kernel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Absolute tolerances for a union of `inputs` under `config`.  Fails
    /// with a numeric error when the inputs are too large for the kernel's
    /// arithmetic to stay finite.
    fn tolerances(&self, inputs: &[&MultiPolygon<f64>], config: &UnionConfig) -> Result<Tolerances>;

    /// Domain-specific input checks run before normalization.
    fn validate(&self, _mp: &MultiPolygon<f64>) -> Result<()> { Ok(()) }

    /// Signed area of a ring (open or closed); positive when counter-clockwise.
    fn signed_area(&self, ring: &[Coord<f64>]) -> f64;

    /// Direction of the edge `from→to` at `from`, measured counter-clockwise
    /// from east, in radians.
    fn heading(&self, from: Coord<f64>, to: Coord<f64>) -> f64;

    fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64;

    /// If `p` lies within `tolerance` of the interior of edge `a→b`, its
    /// parameter along the edge in `(0, 1)`.
    fn locate_on_edge(&self, p: Coord<f64>, a: Coord<f64>, b: Coord<f64>, tolerance: f64) -> Option<f64>;

    /// The crossing of two edges when their interiors intersect at a single
    /// point.  Touches at endpoints and collinear overlaps are not crossings.
    fn crossing(&self, a1: Coord<f64>, a2: Coord<f64>, b1: Coord<f64>, b2: Coord<f64>) -> Option<Crossing>;

    /// Whether `p` is strictly inside `ring` (even-odd rule).  Points on the
    /// boundary may go either way.
    fn contains(&self, ring: &[Coord<f64>], p: Coord<f64>) -> bool;

    /// A point on the edge `a→b` halfway between its endpoints.
    fn midpoint(&self, a: Coord<f64>, b: Coord<f64>) -> Coord<f64>;

    /// A coordinate-space box guaranteed to contain every point of the ring
    /// and of its interior, as `([min_x, min_y], [max_x, max_y])`.
    fn envelope(&self, ring: &[Coord<f64>]) -> ([f64; 2], [f64; 2]);
}

/// Coordinate-space bounds of a ring's vertices.
pub(crate) fn vertex_bounds(ring: &[Coord<f64>]) -> ([f64; 2], [f64; 2]) {
    ring.iter().fold(
        ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
        |(lo, hi), c| ([lo[0].min(c.x), lo[1].min(c.y)], [hi[0].max(c.x), hi[1].max(c.y)]),
    )
}
