pub mod area;
pub mod band;
pub mod depth;
pub mod fill;
pub mod grass;
pub mod threshold;
pub mod tile;

pub use area::AreaShader;
pub use band::BandShader;
pub use depth::DepthShader;
pub use fill::FillShader;
pub use grass::GrassShader;
pub use threshold::{HighShader, LowShader};
pub use tile::TileShader;

use crate::error::TerrainError;
use crate::segment::Segment;
use crate::surface::Surface;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shaders registered on a terrain, keyed by layer id.
pub type ShaderStore = BTreeMap<i32, Shader>;

/// A rule that turns a segment's heights and slopes into blend weights.
pub trait Shade {
	/// Cheap pre-filter on the segment's height range.
	///
	/// May answer `true` for a segment that ends up with zero weight
	/// everywhere, but never `false` for one that would get any weight.
	fn check_intersect(&self, segment: &Segment) -> bool;

	fn channels(&self) -> usize {
		1
	}

	fn new_surface(&self, segment: &Segment) -> Surface {
		Surface::new(segment.size(), self.channels())
	}

	/// Overwrites every weight of `surface`.
	fn shade(&self, segment: &Segment, surface: &mut Surface);
}

/// Writes `alpha(height, slope)` into one channel for every grid point.
pub(crate) fn shade_cells(
	segment: &Segment,
	surface: &mut Surface,
	channel: usize,
	alpha: impl Fn(f32, f32) -> f32,
) {
	let size = segment.size();
	for z in 0..size {
		for x in 0..size {
			surface.set(x, z, channel, alpha(segment.get(x, z), segment.slope(x, z)));
		}
	}
}

/// Every shading rule the terrain knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shader {
	Fill(FillShader),
	Band(BandShader),
	Depth(DepthShader),
	High(HighShader),
	Low(LowShader),
	Grass(GrassShader),
	Area(AreaShader),
	Tile(TileShader),
}

impl Shader {
	pub fn name(&self) -> &'static str {
		match self {
			Shader::Fill(_) => "fill",
			Shader::Band(_) => "band",
			Shader::Depth(_) => "depth",
			Shader::High(_) => "high",
			Shader::Low(_) => "low",
			Shader::Grass(_) => "grass",
			Shader::Area(_) => "area",
			Shader::Tile(_) => "tile",
		}
	}

	/// Checks parameters that bypassed the constructors, e.g. after
	/// deserializing.
	pub fn validate(&self) -> Result<(), TerrainError> {
		match self {
			Shader::Fill(s) => s.validate(),
			Shader::Band(s) => s.validate(),
			Shader::Depth(s) => s.validate(),
			Shader::Grass(s) => s.validate(),
			Shader::Tile(s) => s.validate(),
			Shader::High(_) | Shader::Low(_) | Shader::Area(_) => Ok(()),
		}
	}

	/// Whether this shader paints area layer `layer`, on its own or as a
	/// channel of a tile shader.
	pub fn paints_layer(&self, layer: i32) -> bool {
		match self {
			Shader::Area(s) => s.layer == layer,
			Shader::Tile(s) => s.layers.values().any(|sub| sub.paints_layer(layer)),
			_ => false,
		}
	}

	fn as_shade(&self) -> &dyn Shade {
		match self {
			Shader::Fill(s) => s,
			Shader::Band(s) => s,
			Shader::Depth(s) => s,
			Shader::High(s) => s,
			Shader::Low(s) => s,
			Shader::Grass(s) => s,
			Shader::Area(s) => s,
			Shader::Tile(s) => s,
		}
	}
}

impl Shade for Shader {
	fn check_intersect(&self, segment: &Segment) -> bool {
		self.as_shade().check_intersect(segment)
	}

	fn channels(&self) -> usize {
		self.as_shade().channels()
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		self.as_shade().shade(segment, surface);
	}
}

macro_rules! impl_from_shader {
	($($variant:ident => $ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Shader {
				fn from(shader: $ty) -> Self {
					Shader::$variant(shader)
				}
			}
		)*
	};
}

impl_from_shader! {
	Fill => FillShader,
	Band => BandShader,
	Depth => DepthShader,
	High => HighShader,
	Low => LowShader,
	Grass => GrassShader,
	Area => AreaShader,
	Tile => TileShader,
}
