use crate::error::TerrainError;
use crate::segment::Segment;
use crate::shader::{Shade, Shader};
use crate::surface::Surface;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Packs several shaders into one multi-channel surface.
///
/// Channel `k` carries the weights of the sub-shader registered under id
/// `k`; channels with no sub-shader, or whose sub-shader misses the
/// segment, stay at zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TileShader {
	pub layers: BTreeMap<i32, Shader>,
}

impl TileShader {
	/// Highest number of channels a tile surface may carry.
	pub const MAX_CHANNELS: usize = 64;

	pub fn new() -> Self {
		Self::default()
	}

	/// Panics on an id outside `0..MAX_CHANNELS` or a nested tile shader.
	pub fn add_shader(&mut self, shader: impl Into<Shader>, id: i32) {
		let shader = shader.into();
		assert!(id >= 0, "tile channel id must not be negative, got {id}");
		assert!(
			(id as usize) < Self::MAX_CHANNELS,
			"tile channel id {id} exceeds the {} channel limit",
			Self::MAX_CHANNELS
		);
		assert!(!matches!(shader, Shader::Tile(_)), "tile shaders do not nest");
		self.layers.insert(id, shader);
	}

	pub fn with_shader(mut self, shader: impl Into<Shader>, id: i32) -> Self {
		self.add_shader(shader, id);
		self
	}

	pub(crate) fn validate(&self) -> Result<(), TerrainError> {
		for (id, shader) in &self.layers {
			if *id < 0 {
				return Err(TerrainError::invalid("layers", *id as f32, "channel id must not be negative"));
			}
			if *id as usize >= Self::MAX_CHANNELS {
				return Err(TerrainError::invalid("layers", *id as f32, "channel id exceeds the channel limit"));
			}
			if let Shader::Tile(_) = shader {
				return Err(TerrainError::invalid("layers", *id as f32, "tile shaders do not nest"));
			}
			shader.validate()?;
		}
		Ok(())
	}
}

impl Shade for TileShader {
	fn check_intersect(&self, segment: &Segment) -> bool {
		self.layers.values().any(|shader| shader.check_intersect(segment))
	}

	fn channels(&self) -> usize {
		self.layers.keys().next_back().map_or(1, |id| *id as usize + 1)
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		surface.fill(0.0);
		let channels = surface.channels();
		for (id, shader) in &self.layers {
			if !shader.check_intersect(segment) {
				trace!("tile channel {id} ({}) misses segment {:?}", shader.name(), segment.coord());
				continue;
			}
			let mut layer = shader.new_surface(segment);
			shader.shade(segment, &mut layer);
			let channel = *id as usize;
			let stride = layer.channels();
			for (cell, weight) in layer.data().iter().step_by(stride).enumerate() {
				surface.data_mut()[cell * channels + channel] = *weight;
			}
		}
	}
}
