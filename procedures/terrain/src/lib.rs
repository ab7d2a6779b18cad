pub mod area;
pub mod basepoint;
pub mod config;
pub mod defaults;
pub mod error;
pub mod heightmap;
pub mod modifier;
pub mod segment;
pub mod shader;
pub mod surface;
pub mod terrain;

pub use area::Area;
pub use basepoint::BasePoint;
pub use config::{Parameters, TerrainConfig};
pub use error::TerrainError;
pub use heightmap::HeightMap;
pub use modifier::{AdjustMod, CraterMod, LevelMod, Shape, SlopeMod, TerrainMod};
pub use segment::{Segment, SegmentState};
pub use shader::{
	AreaShader, BandShader, DepthShader, FillShader, GrassShader, HighShader, LowShader, Shade,
	Shader, ShaderStore, TileShader,
};
pub use surface::Surface;
pub use terrain::Terrain;
