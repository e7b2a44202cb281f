//! Tolerances and execution switches shared by both union functions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnionError};

/// What to do when a single row fails with bad data (validity or numeric
/// errors).  Format errors and internal faults always abort the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Fail the whole batch on the first failing row.
    #[default]
    Abort,
    /// Emit an empty multi-polygon for the failing row and keep going.
    EmitEmpty,
}

/// Union configuration.
///
/// Tolerances are relative: the engines scale them by the coordinate
/// magnitude of each row (planar) or by the sphere (geographic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnionConfig {
    /// Distance below which two points are the same vertex.
    pub snap_tolerance: f64,
    /// Area below which a result ring is treated as numerical noise.
    pub area_tolerance: f64,
    /// Reject self-intersecting input rings instead of overlaying them as-is.
    pub strict: bool,
    pub on_row_error: RowErrorPolicy,
    /// Process rows on the rayon pool.
    pub parallel: bool,
}

impl Default for UnionConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 1e-9,
            area_tolerance: 1e-12,
            strict: false,
            on_row_error: RowErrorPolicy::Abort,
            parallel: true,
        }
    }
}

impl UnionConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| UnionError::Config(format!("[config] {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| UnionError::Config(format!("[config] failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("snap_tolerance", self.snap_tolerance), ("area_tolerance", self.area_tolerance)] {
            if !value.is_finite() || value < 0.0 {
                return Err(UnionError::Config(format!("[config] {name} must be finite and non-negative, got {value}")));
            }
        }
        Ok(())
    }
}
