//! Named defaults shared by the terrain types.

pub mod world {
	/// Distance between adjacent base points, and so the cells per tile side.
	pub const DEFAULT_RESOLUTION: u32 = 64;
	/// Height reported where no terrain data exists.
	pub const DEFAULT_LEVEL: f32 = 8.0;
	pub const DEFAULT_SEED: u64 = 0;
}
pub mod basepoint {
	pub const HEIGHT: f32 = 8.0;
	pub const ROUGHNESS: f32 = 1.25;
	pub const FALLOFF: f32 = 0.25;
}
pub use basepoint::*;
pub use world::*;
