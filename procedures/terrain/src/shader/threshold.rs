use crate::config::{parameter, Parameters};
use crate::segment::Segment;
use crate::shader::{shade_cells, Shade};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};

/// Full weight strictly above a height threshold, e.g. snow caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighShader {
	pub threshold: f32,
}

impl HighShader {
	pub const KEY_THRESHOLD: &'static str = "threshold";
	pub const DEFAULT_THRESHOLD: f32 = 1.0;

	pub fn new(threshold: f32) -> Self {
		Self { threshold }
	}

	pub fn from_parameters(params: &Parameters) -> Self {
		Self::new(parameter(params, Self::KEY_THRESHOLD, Self::DEFAULT_THRESHOLD))
	}

	pub fn alpha(&self, height: f32) -> f32 {
		if height > self.threshold {
			1.0
		} else {
			0.0
		}
	}
}

impl Default for HighShader {
	fn default() -> Self {
		Self::new(Self::DEFAULT_THRESHOLD)
	}
}

impl Shade for HighShader {
	fn check_intersect(&self, segment: &Segment) -> bool {
		segment.max() > self.threshold
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		shade_cells(segment, surface, 0, |height, _| self.alpha(height));
	}
}

/// Full weight strictly below a height threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowShader {
	pub threshold: f32,
}

impl LowShader {
	pub const KEY_THRESHOLD: &'static str = "threshold";
	pub const DEFAULT_THRESHOLD: f32 = -1.0;

	pub fn new(threshold: f32) -> Self {
		Self { threshold }
	}

	pub fn from_parameters(params: &Parameters) -> Self {
		Self::new(parameter(params, Self::KEY_THRESHOLD, Self::DEFAULT_THRESHOLD))
	}

	pub fn alpha(&self, height: f32) -> f32 {
		if height < self.threshold {
			1.0
		} else {
			0.0
		}
	}
}

impl Default for LowShader {
	fn default() -> Self {
		Self::new(Self::DEFAULT_THRESHOLD)
	}
}

impl Shade for LowShader {
	fn check_intersect(&self, segment: &Segment) -> bool {
		segment.min() < self.threshold
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		shade_cells(segment, surface, 0, |height, _| self.alpha(height));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_high_is_strict() {
		let high = HighShader::new(5.0);
		assert_eq!(high.alpha(5.0), 0.0);
		assert_eq!(high.alpha(5.1), 1.0);
	}

	#[test]
	fn test_low_is_strict() {
		let low = LowShader::default();
		assert_eq!(low.alpha(-1.0), 0.0);
		assert_eq!(low.alpha(-1.5), 1.0);
	}

	#[test]
	fn test_from_parameters() {
		let mut params = Parameters::new();
		assert_eq!(HighShader::from_parameters(&params), HighShader::new(1.0));
		params.insert("threshold".to_string(), 110.0);
		assert_eq!(HighShader::from_parameters(&params), HighShader::new(110.0));
		assert_eq!(LowShader::from_parameters(&params), LowShader::new(110.0));
	}
}
