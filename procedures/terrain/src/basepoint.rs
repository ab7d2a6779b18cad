use crate::defaults;
use crate::error::TerrainError;
use serde::{Deserialize, Serialize};

/// Authored control datum at a grid intersection.
///
/// A base point fixes the height of the tile corners it belongs to and biases
/// the noise used to fill in the tiles around it: higher `roughness` gives
/// rougher terrain, `falloff` sets how fast that roughness fades as
/// subdivision gets finer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBasePoint")]
pub struct BasePoint {
	height: f32,
	roughness: f32,
	falloff: f32,
}

impl BasePoint {
	pub const HEIGHT: f32 = defaults::HEIGHT;
	pub const ROUGHNESS: f32 = defaults::ROUGHNESS;
	pub const FALLOFF: f32 = defaults::FALLOFF;

	pub fn new(height: f32) -> Self {
		Self { height, roughness: Self::ROUGHNESS, falloff: Self::FALLOFF }
	}

	/// Panics when `roughness` is negative or `falloff` is outside `(0, 1]`.
	pub fn with_params(height: f32, roughness: f32, falloff: f32) -> Self {
		match Self::try_with_params(height, roughness, falloff) {
			Ok(point) => point,
			Err(e) => panic!("{e}"),
		}
	}

	pub fn try_with_params(height: f32, roughness: f32, falloff: f32) -> Result<Self, TerrainError> {
		if roughness.is_nan() || roughness < 0.0 {
			return Err(TerrainError::invalid("roughness", roughness, "must not be negative"));
		}
		if falloff.is_nan() || falloff <= 0.0 || falloff > 1.0 {
			return Err(TerrainError::invalid("falloff", falloff, "must be within (0, 1]"));
		}
		Ok(Self { height, roughness, falloff })
	}

	pub fn height(&self) -> f32 {
		self.height
	}

	pub fn roughness(&self) -> f32 {
		self.roughness
	}

	pub fn falloff(&self) -> f32 {
		self.falloff
	}

	/// Synthesis seed contributed by this point: its height at millimetre
	/// precision.
	pub fn seed(&self) -> u32 {
		(self.height * 1000.0).round() as i32 as u32
	}
}

impl Default for BasePoint {
	fn default() -> Self {
		Self::new(Self::HEIGHT)
	}
}

/// Unchecked wire form; missing fields take the defaults.
#[derive(Deserialize)]
#[serde(default)]
struct RawBasePoint {
	height: f32,
	roughness: f32,
	falloff: f32,
}

impl Default for RawBasePoint {
	fn default() -> Self {
		Self { height: BasePoint::HEIGHT, roughness: BasePoint::ROUGHNESS, falloff: BasePoint::FALLOFF }
	}
}

impl TryFrom<RawBasePoint> for BasePoint {
	type Error = TerrainError;

	fn try_from(raw: RawBasePoint) -> Result<Self, Self::Error> {
		Self::try_with_params(raw.height, raw.roughness, raw.falloff)
	}
}

impl From<f32> for BasePoint {
	fn from(height: f32) -> Self {
		Self::new(height)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let bp = BasePoint::default();
		assert_eq!(bp.height(), 8.0);
		assert_eq!(bp.roughness(), 1.25);
		assert_eq!(bp.falloff(), 0.25);
	}

	#[test]
	fn test_seed_tracks_height() {
		assert_eq!(BasePoint::new(1.5).seed(), 1500);
		assert_eq!(BasePoint::new(1.5).seed(), BasePoint::with_params(1.5, 3.0, 0.5).seed());
		assert_ne!(BasePoint::new(1.5).seed(), BasePoint::new(1.501).seed());
		assert_eq!(BasePoint::new(-2.0).seed(), (-2000_i32) as u32);
	}

	#[test]
	#[should_panic(expected = "falloff")]
	fn test_zero_falloff_rejected() {
		let _ = BasePoint::with_params(0.0, 1.0, 0.0);
	}

	#[test]
	fn test_partial_json_uses_defaults() {
		let bp: BasePoint = serde_json::from_str(r#"{"height": 3.0}"#).unwrap();
		assert_eq!(bp, BasePoint::new(3.0));
	}

	#[test]
	fn test_json_is_validated() {
		assert!(serde_json::from_str::<BasePoint>(r#"{"height": 1.0, "roughness": -0.5}"#).is_err());
		assert!(serde_json::from_str::<BasePoint>(r#"{"height": 1.0, "falloff": 0.0}"#).is_err());
		assert!(serde_json::from_str::<BasePoint>(r#"{"falloff": 1.5}"#).is_err());
		let bp: BasePoint = serde_json::from_str(r#"{"height": 1.0, "falloff": 1.0}"#).unwrap();
		assert_eq!(bp, BasePoint::with_params(1.0, BasePoint::ROUGHNESS, 1.0));
	}

	#[test]
	fn test_try_with_params_reports_key() {
		let err = BasePoint::try_with_params(0.0, -1.0, 0.5).unwrap_err();
		assert!(matches!(err, TerrainError::InvalidParameter { ref key, .. } if key == "roughness"));
	}
}
