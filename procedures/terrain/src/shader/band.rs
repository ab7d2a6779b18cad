use crate::config::{parameter, Parameters};
use crate::error::TerrainError;
use crate::segment::Segment;
use crate::shader::{shade_cells, Shade};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};

/// Full weight inside a height band, e.g. a beach between two levels.
///
/// With a non-zero `fade` the weight falls off linearly over that distance
/// outside either threshold instead of stopping dead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BandShader {
	pub low_threshold: f32,
	pub high_threshold: f32,
	pub fade: f32,
}

impl BandShader {
	pub const KEY_LOW_THRESHOLD: &'static str = "lowThreshold";
	pub const KEY_HIGH_THRESHOLD: &'static str = "highThreshold";
	pub const KEY_FADE: &'static str = "fade";

	pub const DEFAULT_LOW_THRESHOLD: f32 = -1.0;
	pub const DEFAULT_HIGH_THRESHOLD: f32 = 1.0;
	pub const DEFAULT_FADE: f32 = 0.0;

	/// Panics when `low_threshold > high_threshold`.
	pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
		Self::with_fade(low_threshold, high_threshold, Self::DEFAULT_FADE)
	}

	pub fn with_fade(low_threshold: f32, high_threshold: f32, fade: f32) -> Self {
		let shader = Self { low_threshold, high_threshold, fade };
		if let Err(e) = shader.validate() {
			panic!("{e}");
		}
		shader
	}

	pub fn from_parameters(params: &Parameters) -> Result<Self, TerrainError> {
		let shader = Self {
			low_threshold: parameter(params, Self::KEY_LOW_THRESHOLD, Self::DEFAULT_LOW_THRESHOLD),
			high_threshold: parameter(params, Self::KEY_HIGH_THRESHOLD, Self::DEFAULT_HIGH_THRESHOLD),
			fade: parameter(params, Self::KEY_FADE, Self::DEFAULT_FADE),
		};
		shader.validate()?;
		Ok(shader)
	}

	pub(crate) fn validate(&self) -> Result<(), TerrainError> {
		if self.low_threshold > self.high_threshold {
			return Err(TerrainError::invalid(
				Self::KEY_LOW_THRESHOLD,
				self.low_threshold,
				"must not exceed highThreshold",
			));
		}
		if self.fade < 0.0 {
			return Err(TerrainError::invalid(Self::KEY_FADE, self.fade, "must not be negative"));
		}
		Ok(())
	}

	pub fn alpha(&self, height: f32) -> f32 {
		let distance = if height < self.low_threshold {
			self.low_threshold - height
		} else if height > self.high_threshold {
			height - self.high_threshold
		} else {
			return 1.0;
		};
		if distance < self.fade {
			1.0 - distance / self.fade
		} else {
			0.0
		}
	}
}

impl Default for BandShader {
	fn default() -> Self {
		Self {
			low_threshold: Self::DEFAULT_LOW_THRESHOLD,
			high_threshold: Self::DEFAULT_HIGH_THRESHOLD,
			fade: Self::DEFAULT_FADE,
		}
	}
}

impl Shade for BandShader {
	fn check_intersect(&self, segment: &Segment) -> bool {
		segment.min() <= self.high_threshold + self.fade
			&& segment.max() >= self.low_threshold - self.fade
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		shade_cells(segment, surface, 0, |height, _| self.alpha(height));
	}
}
