use crate::segment::Segment;
use crate::shader::Shade;
use crate::surface::Surface;
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Paints the areas of one layer.
///
/// Each grid point is tested at its own world position: it gets full weight
/// when some area of the layer contains it and no hole of the layer does.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaShader {
	pub layer: i32,
}

impl AreaShader {
	pub fn new(layer: i32) -> Self {
		Self { layer }
	}
}

impl Shade for AreaShader {
	fn check_intersect(&self, segment: &Segment) -> bool {
		segment.areas_in_layer(self.layer).any(|area| !area.is_hole())
	}

	fn shade(&self, segment: &Segment, surface: &mut Surface) {
		surface.fill(0.0);
		let (fills, holes): (Vec<_>, Vec<_>) =
			segment.areas_in_layer(self.layer).partition(|area| !area.is_hole());
		let origin = segment.origin();
		let Some(range) = fills
			.iter()
			.filter_map(|area| segment.clip_to_segment(&area.bbox()))
			.reduce(|a, b| a.union(&b))
		else {
			return;
		};
		for (x, z) in range.iter() {
			let p = origin + Vec2::new(x as f32, z as f32);
			if fills.iter().any(|a| a.contains(p)) && !holes.iter().any(|a| a.contains(p)) {
				surface.set(x, z, 0, 1.0);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::area::Area;
	use crate::basepoint::BasePoint;
	use grid::TileCoord;
	use std::sync::Arc;

	fn square(layer: i32, lo: f32, hi: f32) -> Area {
		Area::new(layer, vec![Vec2::new(lo, lo), Vec2::new(hi, lo), Vec2::new(hi, hi), Vec2::new(lo, hi)])
	}

	fn flat_segment() -> Segment {
		let mut segment = Segment::new(TileCoord::new(0, 0), 16);
		for (x, z) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
			segment.set_corner_point(x, z, BasePoint::new(0.0));
		}
		segment.populate_normals();
		segment
	}

	fn shade(shader: &AreaShader, segment: &Segment) -> Surface {
		let mut surface = shader.new_surface(segment);
		shader.shade(segment, &mut surface);
		surface
	}

	#[test]
	fn test_hole_clears_layer() {
		let mut segment = flat_segment();
		segment.update_area(1, Some(Arc::new(square(7, 1.0, 10.0))));
		segment.update_area(2, Some(Arc::new(square(7, 4.0, 6.0).hole())));
		let shader = AreaShader::new(7);
		assert!(shader.check_intersect(&segment));

		let surface = shade(&shader, &segment);
		assert_eq!(surface.get(2, 2, 0), 1.0);
		assert_eq!(surface.get(5, 5, 0), 0.0);
		assert_eq!(surface.get(12, 12, 0), 0.0);
	}

	#[test]
	fn test_other_layers_ignored() {
		let mut segment = flat_segment();
		segment.update_area(1, Some(Arc::new(square(3, 1.0, 10.0))));
		let shader = AreaShader::new(7);
		assert!(!shader.check_intersect(&segment));
		assert_eq!(shade(&shader, &segment).coverage(0), 0.0);
	}

	#[test]
	fn test_hole_alone_does_not_intersect() {
		let mut segment = flat_segment();
		segment.update_area(2, Some(Arc::new(square(7, 4.0, 6.0).hole())));
		assert!(!AreaShader::new(7).check_intersect(&segment));
	}

	#[test]
	fn test_grid_points_are_sampled_in_place() {
		// (2, 2) lies inside the triangle, the cell centre (2.5, 2.5) does not
		let mut segment = flat_segment();
		let triangle = Area::new(7, vec![Vec2::new(0.0, 0.0), Vec2::new(4.5, 0.0), Vec2::new(0.0, 4.5)]);
		segment.update_area(1, Some(Arc::new(triangle)));
		let surface = shade(&AreaShader::new(7), &segment);
		assert_eq!(surface.get(2, 2, 0), 1.0);
		assert_eq!(surface.get(3, 2, 0), 0.0);
	}

	#[test]
	fn test_areas_follow_segment_origin() {
		let mut segment = Segment::new(TileCoord::new(1, 0), 16);
		for (x, z) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
			segment.set_corner_point(x, z, BasePoint::new(0.0));
		}
		segment.populate_normals();
		let area = Area::new(
			7,
			vec![Vec2::new(17.0, 1.0), Vec2::new(20.0, 1.0), Vec2::new(20.0, 4.0), Vec2::new(17.0, 4.0)],
		);
		segment.update_area(1, Some(Arc::new(area)));
		let surface = shade(&AreaShader::new(7), &segment);
		assert_eq!(surface.get(2, 2, 0), 1.0);
		assert_eq!(surface.get(0, 0, 0), 0.0);
	}
}
