use crate::config::{parameter, Parameters};
use crate::error::TerrainError;
use crate::segment::Segment;
use crate::shader::{shade_cells, Shade};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};

/// Underwater shading: nothing above `water_level`, deepening linearly to
/// full weight at `murky_depth` and below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DepthShader {
	pub water_level: f32,
	pub murky_depth: f32,
}

impl DepthShader {
	pub const KEY_WATER_LEVEL: &'static str = "waterLevel";
	pub const KEY_MURKY_DEPTH: &'static str = "murkyDepth";

	pub const DEFAULT_WATER_LEVEL: f32 = 0.0;
	pub const DEFAULT_MURKY_DEPTH: f32 = -64.0;

	/// Panics unless `murky_depth < water_level`.
	pub fn new(water_level: f32, murky_depth: f32) -> Self {
		let shader = Self { water_level, murky_depth };
		if let Err(e) = shader.validate() {
			panic!("{e}");
		}
		shader
	}

	pub fn from_parameters(params: &Parameters) -> Result<Self, TerrainError> {
		let shader = Self {
			water_level: parameter(params, Self::KEY_WATER_LEVEL, Self::DEFAULT_WATER_LEVEL),
			murky_depth: parameter(params, Self::KEY_MURKY_DEPTH, Self::DEFAULT_MURKY_DEPTH),
		};
		shader.validate()?;
		Ok(shader)
	}

	pub(crate) fn validate(&self) -> Result<(), TerrainError> {
		if self.murky_depth >= self.water_level {
			return Err(TerrainError::invalid(
				Self::KEY_MURKY_DEPTH,
				self.murky_depth,
				"must lie below waterLevel",
			));
		}
		Ok(())
	}

	pub fn alpha(&self, height: f32) -> f32 {
		if height >= self.water_level {
			0.0
		} else if height <= self.murky_depth {
			1.0
		} else {
			(self.water_level - height) / (self.water_level - self.murky_depth)
		}
	}
}

impl Default for DepthShader {
	fn default() -> Self {
		Self { water_level: Self::DEFAULT_WATER_LEVEL, murky_depth: Self::DEFAULT_MURKY_DEPTH }
	}
}

impl Shade for DepthShader {
	fn check_intersect(&self, segment: &Segment) -> bool {
		segment.min() < self.water_level
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		shade_cells(segment, surface, 0, |height, _| self.alpha(height));
	}
}
