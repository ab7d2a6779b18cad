use crate::config::{parameter, Parameters};
use crate::error::TerrainError;
use crate::segment::Segment;
use crate::shader::{shade_cells, Shade};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};

/// Vegetation that grows within a height band on gentle enough slopes.
///
/// Inside the band the weight is 1 up to a slope of `cutoff`, falls linearly
/// and reaches 0 at `intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrassShader {
	pub low_threshold: f32,
	pub high_threshold: f32,
	pub cutoff: f32,
	pub intercept: f32,
}

impl GrassShader {
	pub const KEY_LOW_THRESHOLD: &'static str = "lowThreshold";
	pub const KEY_HIGH_THRESHOLD: &'static str = "highThreshold";
	pub const KEY_CUTOFF: &'static str = "cutoff";
	pub const KEY_INTERCEPT: &'static str = "intercept";

	pub const DEFAULT_LOW_THRESHOLD: f32 = 1.0;
	pub const DEFAULT_HIGH_THRESHOLD: f32 = 20.0;
	pub const DEFAULT_CUTOFF: f32 = 1.0;
	pub const DEFAULT_INTERCEPT: f32 = 2.0;

	/// Panics on an inverted band or when `cutoff` is not below `intercept`.
	pub fn new(low_threshold: f32, high_threshold: f32, cutoff: f32, intercept: f32) -> Self {
		let shader = Self { low_threshold, high_threshold, cutoff, intercept };
		if let Err(e) = shader.validate() {
			panic!("{e}");
		}
		shader
	}

	pub fn from_parameters(params: &Parameters) -> Result<Self, TerrainError> {
		let shader = Self {
			low_threshold: parameter(params, Self::KEY_LOW_THRESHOLD, Self::DEFAULT_LOW_THRESHOLD),
			high_threshold: parameter(params, Self::KEY_HIGH_THRESHOLD, Self::DEFAULT_HIGH_THRESHOLD),
			cutoff: parameter(params, Self::KEY_CUTOFF, Self::DEFAULT_CUTOFF),
			intercept: parameter(params, Self::KEY_INTERCEPT, Self::DEFAULT_INTERCEPT),
		};
		shader.validate()?;
		Ok(shader)
	}

	pub fn parameters(&self) -> Parameters {
		Parameters::from([
			(Self::KEY_LOW_THRESHOLD.to_string(), self.low_threshold),
			(Self::KEY_HIGH_THRESHOLD.to_string(), self.high_threshold),
			(Self::KEY_CUTOFF.to_string(), self.cutoff),
			(Self::KEY_INTERCEPT.to_string(), self.intercept),
		])
	}

	pub(crate) fn validate(&self) -> Result<(), TerrainError> {
		if self.low_threshold > self.high_threshold {
			return Err(TerrainError::invalid(
				Self::KEY_LOW_THRESHOLD,
				self.low_threshold,
				"must not exceed highThreshold",
			));
		}
		if self.cutoff < 0.0 {
			return Err(TerrainError::invalid(Self::KEY_CUTOFF, self.cutoff, "must not be negative"));
		}
		if self.cutoff >= self.intercept {
			return Err(TerrainError::invalid(
				Self::KEY_INTERCEPT,
				self.intercept,
				"must be greater than cutoff",
			));
		}
		Ok(())
	}

	pub fn alpha(&self, height: f32, slope: f32) -> f32 {
		if height < self.low_threshold || height > self.high_threshold {
			0.0
		} else if slope <= self.cutoff {
			1.0
		} else if slope >= self.intercept {
			0.0
		} else {
			(self.intercept - slope) / (self.intercept - self.cutoff)
		}
	}
}

impl Default for GrassShader {
	fn default() -> Self {
		Self {
			low_threshold: Self::DEFAULT_LOW_THRESHOLD,
			high_threshold: Self::DEFAULT_HIGH_THRESHOLD,
			cutoff: Self::DEFAULT_CUTOFF,
			intercept: Self::DEFAULT_INTERCEPT,
		}
	}
}

impl Shade for GrassShader {
	fn check_intersect(&self, segment: &Segment) -> bool {
		segment.min() <= self.high_threshold && segment.max() >= self.low_threshold
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		shade_cells(segment, surface, 0, |height, slope| self.alpha(height, slope));
	}
}
