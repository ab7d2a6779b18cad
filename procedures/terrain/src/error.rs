use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
	/// A read-only query reached a segment whose heights are stale. Distinct
	/// from a location with no terrain at all, which is reported as `None`.
	#[error("segment ({x}, {z}) was sampled before its heights were populated")]
	Unpopulated { x: i32, z: i32 },
	#[error("invalid parameter {key} = {value}: {reason}")]
	InvalidParameter { key: String, value: f32, reason: &'static str },
}

impl TerrainError {
	pub(crate) fn invalid(key: &str, value: f32, reason: &'static str) -> Self {
		Self::InvalidParameter { key: key.to_string(), value, reason }
	}
}
