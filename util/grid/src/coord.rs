use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Integer coordinate in the tile grid.
///
/// The same type addresses base points (grid intersections) and tiles: the
/// tile at `(x, z)` spans the base points `(x, z)` to `(x + 1, z + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
	pub x: i32,
	pub z: i32,
}

impl TileCoord {
	pub fn new(x: i32, z: i32) -> Self {
		Self { x, z }
	}

	/// Tile containing a world position, for tiles `resolution` units wide.
	pub fn from_world_pos(x: f32, z: f32, resolution: u32) -> Self {
		let res = resolution as f32;
		Self { x: (x / res).floor() as i32, z: (z / res).floor() as i32 }
	}

	/// World position of the tile's low corner.
	pub fn to_world_origin(&self, resolution: u32) -> Vec2 {
		Vec2::new((self.x * resolution as i32) as f32, (self.z * resolution as i32) as f32)
	}

	pub fn offset(&self, dx: i32, dz: i32) -> Self {
		Self { x: self.x + dx, z: self.z + dz }
	}

	/// The four base points a tile is built from, as `((cx, cz), point)` with
	/// `cx`/`cz` the corner index in `{0, 1}`.
	pub fn corners(&self) -> [((usize, usize), TileCoord); 4] {
		[
			((0, 0), *self),
			((1, 0), self.offset(1, 0)),
			((0, 1), self.offset(0, 1)),
			((1, 1), self.offset(1, 1)),
		]
	}

	/// The up to four tiles that use this base point as a corner, paired with
	/// the corner index the point occupies in each of them.
	pub fn tiles_sharing_point(&self) -> [(TileCoord, (usize, usize)); 4] {
		[
			(self.offset(-1, -1), (1, 1)),
			(self.offset(0, -1), (0, 1)),
			(self.offset(-1, 0), (1, 0)),
			(*self, (0, 0)),
		]
	}
}

impl From<(i32, i32)> for TileCoord {
	fn from((x, z): (i32, i32)) -> Self {
		Self { x, z }
	}
}
