use bevy::math::{Rect, Vec2, Vec3};
use std::fmt::Debug;

/// A height edit applied on top of synthesized terrain.
///
/// Mods work in world space and must be pure: the same input height at the
/// same position always gives the same output, so re-applying every mod to a
/// freshly synthesized tile reproduces the previous result, and tiles
/// sharing an edge edit it identically.
pub trait TerrainMod: Debug + Send + Sync {
	/// World-space footprint. Grid points outside it are never passed to
	/// [`TerrainMod::apply`].
	fn bbox(&self) -> Rect;

	/// Returns the edited height of the grid point at world `(x, z)`.
	fn apply(&self, height: f32, x: f32, z: f32) -> f32;
}

/// Footprint of a mod in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
	Rect(Rect),
	Disc { center: Vec2, radius: f32 },
}

impl Shape {
	pub fn bbox(&self) -> Rect {
		match self {
			Shape::Rect(rect) => *rect,
			Shape::Disc { center, radius } => Rect::from_center_half_size(*center, Vec2::splat(*radius)),
		}
	}

	pub fn contains(&self, p: Vec2) -> bool {
		match self {
			Shape::Rect(rect) => rect.contains(p),
			Shape::Disc { center, radius } => p.distance_squared(*center) <= radius * radius,
		}
	}
}

/// Flattens the shape to a fixed level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelMod {
	pub shape: Shape,
	pub level: f32,
}

impl LevelMod {
	pub fn new(shape: Shape, level: f32) -> Self {
		Self { shape, level }
	}
}

impl TerrainMod for LevelMod {
	fn bbox(&self) -> Rect {
		self.shape.bbox()
	}

	fn apply(&self, height: f32, x: f32, z: f32) -> f32 {
		if self.shape.contains(Vec2::new(x, z)) {
			self.level
		} else {
			height
		}
	}
}

/// Raises or lowers the shape by a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustMod {
	pub shape: Shape,
	pub offset: f32,
}

impl AdjustMod {
	pub fn new(shape: Shape, offset: f32) -> Self {
		Self { shape, offset }
	}
}

impl TerrainMod for AdjustMod {
	fn bbox(&self) -> Rect {
		self.shape.bbox()
	}

	fn apply(&self, height: f32, x: f32, z: f32) -> f32 {
		if self.shape.contains(Vec2::new(x, z)) {
			height + self.offset
		} else {
			height
		}
	}
}

/// Replaces the shape with an inclined plane through `level` at the shape's
/// centre, rising `gradient.x` per unit x and `gradient.y` per unit z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeMod {
	pub shape: Shape,
	pub level: f32,
	pub gradient: Vec2,
}

impl SlopeMod {
	pub fn new(shape: Shape, level: f32, gradient: Vec2) -> Self {
		Self { shape, level, gradient }
	}
}

impl TerrainMod for SlopeMod {
	fn bbox(&self) -> Rect {
		self.shape.bbox()
	}

	fn apply(&self, height: f32, x: f32, z: f32) -> f32 {
		let p = Vec2::new(x, z);
		if !self.shape.contains(p) {
			return height;
		}
		let d = p - self.shape.bbox().center();
		self.level + d.dot(self.gradient)
	}
}

/// Scoops out the terrain under a ball: inside its horizontal radius the
/// height is capped at the ball's lower surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CraterMod {
	pub center: Vec3,
	pub radius: f32,
}

impl CraterMod {
	pub fn new(center: Vec3, radius: f32) -> Self {
		Self { center, radius }
	}
}

impl TerrainMod for CraterMod {
	fn bbox(&self) -> Rect {
		Rect::from_center_half_size(Vec2::new(self.center.x, self.center.z), Vec2::splat(self.radius))
	}

	fn apply(&self, height: f32, x: f32, z: f32) -> f32 {
		let d2 = Vec2::new(x - self.center.x, z - self.center.z).length_squared();
		let r2 = self.radius * self.radius;
		if d2 > r2 {
			return height;
		}
		height.min(self.center.y - (r2 - d2).sqrt())
	}
}
