use crate::error::TerrainError;
use crate::segment::Segment;
use crate::shader::{shade_cells, Shade};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};

/// Paints a constant weight everywhere, typically the base layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillShader {
	pub weight: f32,
}

impl FillShader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Panics when `weight` is outside `[0, 1]`.
	pub fn with_weight(weight: f32) -> Self {
		let shader = Self { weight };
		if let Err(e) = shader.validate() {
			panic!("{e}");
		}
		shader
	}

	pub(crate) fn validate(&self) -> Result<(), TerrainError> {
		if !(0.0..=1.0).contains(&self.weight) {
			return Err(TerrainError::invalid("weight", self.weight, "must be within [0, 1]"));
		}
		Ok(())
	}
}

impl Default for FillShader {
	fn default() -> Self {
		Self { weight: 1.0 }
	}
}

impl Shade for FillShader {
	fn check_intersect(&self, _segment: &Segment) -> bool {
		true
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		shade_cells(segment, surface, 0, |_, _| self.weight);
	}
}
