use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named numeric shader parameters, e.g. `{"lowThreshold": 1.0}`.
pub type Parameters = BTreeMap<String, f32>;

/// Looks up `key`, falling back to `default` when absent.
pub(crate) fn parameter(params: &Parameters, key: &str, default: f32) -> f32 {
	params.get(key).copied().unwrap_or(default)
}

/// Configuration for a terrain instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
	/// Cells per tile side; must be a power of two.
	pub resolution: u32,
	/// Mixed into every synthesis seed, so one set of base points can yield
	/// several distinct worlds.
	pub seed: u64,
	/// Whether segments compute surfaces at all.
	pub shaded: bool,
}

impl TerrainConfig {
	pub fn new(seed: u64) -> Self {
		Self { seed, ..Self::default() }
	}

	pub fn with_resolution(mut self, resolution: u32) -> Self {
		self.resolution = resolution;
		self
	}

	pub fn with_shading(mut self, shaded: bool) -> Self {
		self.shaded = shaded;
		self
	}
}

impl Default for TerrainConfig {
	fn default() -> Self {
		Self { resolution: defaults::DEFAULT_RESOLUTION, seed: defaults::DEFAULT_SEED, shaded: true }
	}
}
