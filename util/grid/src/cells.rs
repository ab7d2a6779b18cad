use bevy::prelude::*;

/// Inclusive range of grid cells inside one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
	pub lx: usize,
	pub hx: usize,
	pub lz: usize,
	pub hz: usize,
}

impl CellRange {
	pub fn new(lx: usize, hx: usize, lz: usize, hz: usize) -> Self {
		debug_assert!(lx <= hx && lz <= hz);
		Self { lx, hx, lz, hz }
	}

	/// Every cell of a `size` x `size` grid.
	pub fn full(size: usize) -> Self {
		Self::new(0, size - 1, 0, size - 1)
	}

	/// Clips a box in tile local coordinates to a grid of `size` cells per
	/// side. Box corners are rounded to the nearest cell; `None` when the box
	/// misses the grid entirely.
	pub fn clip(rect: &Rect, size: usize) -> Option<Self> {
		let last = size as i64 - 1;
		let lx = rect.min.x.round() as i64;
		let hx = rect.max.x.round() as i64;
		let lz = rect.min.y.round() as i64;
		let hz = rect.max.y.round() as i64;
		if lx > last || hx < 0 || lz > last || hz < 0 || lx > hx || lz > hz {
			return None;
		}
		Some(Self::new(
			lx.max(0) as usize,
			hx.min(last) as usize,
			lz.max(0) as usize,
			hz.min(last) as usize,
		))
	}

	pub fn contains(&self, x: usize, z: usize) -> bool {
		x >= self.lx && x <= self.hx && z >= self.lz && z <= self.hz
	}

	pub fn cell_count(&self) -> usize {
		(self.hx - self.lx + 1) * (self.hz - self.lz + 1)
	}

	pub fn union(&self, other: &Self) -> Self {
		Self::new(
			self.lx.min(other.lx),
			self.hx.max(other.hx),
			self.lz.min(other.lz),
			self.hz.max(other.hz),
		)
	}

	/// Iterates `(x, z)` row by row.
	pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> {
		let (lx, hx) = (self.lx, self.hx);
		(self.lz..=self.hz).flat_map(move |z| (lx..=hx).map(move |x| (x, z)))
	}
}

/// Overlap test that, unlike `Rect::intersect`, counts shared edges.
pub fn rect_overlaps(a: &Rect, b: &Rect) -> bool {
	a.min.x <= b.max.x && a.max.x >= b.min.x && a.min.y <= b.max.y && a.max.y >= b.min.y
}
