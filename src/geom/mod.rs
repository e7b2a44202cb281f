//! Polygon union on the plane and on the sphere.
//!
//! Both domains share one pipeline: validate, normalize orientation, overlay
//! the boundaries, classify faces, and assemble the result.  Only the
//! geometric primitives differ; they live behind [`Kernel`].

mod kernel;
mod orient;
mod overlay;
mod planar;
mod result;
mod ring;
mod seam;
mod spherical;

use std::fmt;
use std::str::FromStr;

use geo::MultiPolygon;
use tracing::trace;

pub use kernel::{Crossing, Kernel, Tolerances};
pub use orient::normalize;
pub use planar::Planar;
pub use spherical::Spherical;

use crate::config::UnionConfig;
use crate::error::{Result, UnionError};

/// Coordinate domain of a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// `(x, y)` on the Euclidean plane.
    Cartesian,
    /// `(longitude, latitude)` in degrees on the sphere.
    Geographic,
}

static PLANAR: Planar = Planar;
static SPHERICAL: Spherical = Spherical;

impl Domain {
    /// The geometric primitives for this domain.
    pub fn kernel(self) -> &'static dyn Kernel {
        match self {
            Domain::Cartesian => &PLANAR,
            Domain::Geographic => &SPHERICAL,
        }
    }

    pub fn as_str(self) -> &'static str { self.kernel().name() }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = UnionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cartesian" => Ok(Domain::Cartesian),
            "geographic" => Ok(Domain::Geographic),
            other => Err(UnionError::Config(format!("[geom] unknown domain '{other}'"))),
        }
    }
}

/// Union of two multipolygons.
///
/// Inputs are normalized first (ring closure, orientation, degenerate ring
/// removal), so their vertex order and orientation do not matter.  The result
/// is a valid multipolygon in canonical vertex order, with counter-clockwise
/// exteriors and clockwise holes.  A single non-empty operand still goes
/// through the overlay, so overlapping polygons within it are merged.
pub fn union(domain: Domain, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, config: &UnionConfig) -> Result<MultiPolygon<f64>> {
    let kernel = domain.kernel();
    orient::check_finite(a)?;
    orient::check_finite(b)?;
    kernel.validate(a)?;
    kernel.validate(b)?;

    let tolerances = kernel.tolerances(&[a, b], config)?;
    let a = orient::normalize(kernel, a, config.strict, tolerances.snap)?;
    let b = orient::normalize(kernel, b, config.strict, tolerances.snap)?;

    if a.0.is_empty() && b.0.is_empty() {
        trace!(domain = %domain, "both operands empty");
        return Ok(MultiPolygon::new(Vec::new()));
    }

    match domain {
        Domain::Cartesian => planar::union(&a, &b, tolerances),
        Domain::Geographic => spherical::union(&a, &b, tolerances),
    }
}
