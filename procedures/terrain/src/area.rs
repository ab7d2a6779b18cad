use crate::segment::Segment;
use bevy::math::{Rect, Vec2};
use grid::rect_overlaps;

/// A polygonal zone of the terrain tied to a shader layer.
///
/// Areas do not touch heights. They decide which surfaces a segment has to
/// compute and, through [`crate::shader::AreaShader`], where that layer is
/// painted. A hole area clears its layer instead of painting it.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
	layer: i32,
	hole: bool,
	polygon: Vec<Vec2>,
	bbox: Rect,
}

impl Area {
	/// Panics when the polygon has fewer than three vertices.
	pub fn new(layer: i32, polygon: Vec<Vec2>) -> Self {
		assert!(polygon.len() >= 3, "area polygon needs at least three vertices");
		let bbox = polygon.iter().skip(1).fold(Rect::from_corners(polygon[0], polygon[0]), |r, p| {
			r.union_point(*p)
		});
		Self { layer, hole: false, polygon, bbox }
	}

	pub fn hole(mut self) -> Self {
		self.hole = true;
		self
	}

	pub fn layer(&self) -> i32 {
		self.layer
	}

	pub fn is_hole(&self) -> bool {
		self.hole
	}

	pub fn polygon(&self) -> &[Vec2] {
		&self.polygon
	}

	pub fn bbox(&self) -> Rect {
		self.bbox
	}

	/// Whether the area's box touches the segment's footprint.
	pub fn intersects(&self, segment: &Segment) -> bool {
		rect_overlaps(&self.bbox, &segment.rect())
	}

	/// Even-odd point in polygon test.
	pub fn contains(&self, p: Vec2) -> bool {
		if !self.bbox.contains(p) {
			return false;
		}
		let mut inside = false;
		let n = self.polygon.len();
		for i in 0..n {
			let a = self.polygon[i];
			let b = self.polygon[(i + n - 1) % n];
			if (a.y > p.y) != (b.y > p.y) {
				let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
				if p.x < x {
					inside = !inside;
				}
			}
		}
		inside
	}
}
