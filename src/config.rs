// src/config.rs

//! Tunable constants of the colliders.
//!
//! The defaults reproduce the stock behaviour. A `CollisionConfig` can be
//! deserialized from JSON; missing fields keep their default values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings shared by the shift and kern colliders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Smallest margin the kern collider slices with, in font units.
    pub kern_min_margin: f32,
    /// Padding added above and below the cluster before slicing it.
    pub kern_slice_padding: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        CollisionConfig {
            kern_min_margin: 10.0,
            kern_slice_padding: 1.0,
        }
    }
}

impl CollisionConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CollisionConfig =
            serde_json::from_str(json).context("Failed to parse collision config JSON")?;
        if !(config.kern_min_margin > 0.0) {
            anyhow::bail!(
                "kern_min_margin must be positive, got {}",
                config.kern_min_margin
            );
        }
        Ok(config)
    }
}
