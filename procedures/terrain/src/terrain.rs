use crate::area::Area;
use crate::basepoint::BasePoint;
use crate::config::TerrainConfig;
use crate::defaults;
use crate::error::TerrainError;
use crate::modifier::TerrainMod;
use crate::segment::Segment;
use crate::shader::{Shader, ShaderStore};
use bevy::math::{Rect, Vec3};
use grid::{rect_overlaps, Matrix, TileCoord};
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Sparse tiled terrain.
///
/// The terrain owns the authored base points and is the only writer of the
/// segments built from them. Segments appear as soon as all four of their
/// corners are known, but are only synthesized when first sampled or
/// refreshed. Every edit (base point, shader, mod, area) is fanned out to
/// the segments it touches as invalidation.
#[derive(Debug)]
pub struct Terrain {
	config: TerrainConfig,
	base_points: BTreeMap<TileCoord, BasePoint>,
	segments: BTreeMap<TileCoord, Segment>,
	shaders: ShaderStore,
	mods: BTreeMap<i64, Arc<dyn TerrainMod>>,
	areas: BTreeMap<i64, Arc<Area>>,
}

impl Terrain {
	/// Panics unless the configured resolution is a power of two.
	pub fn new(config: TerrainConfig) -> Self {
		assert!(
			config.resolution.is_power_of_two(),
			"terrain resolution must be a power of two, got {}",
			config.resolution
		);
		Self {
			config,
			base_points: BTreeMap::new(),
			segments: BTreeMap::new(),
			shaders: ShaderStore::new(),
			mods: BTreeMap::new(),
			areas: BTreeMap::new(),
		}
	}

	pub fn resolution(&self) -> u32 {
		self.config.resolution
	}

	pub fn config(&self) -> &TerrainConfig {
		&self.config
	}

	pub fn is_shaded(&self) -> bool {
		self.config.shaded
	}

	/// Stores the base point at grid intersection `(x, z)`.
	///
	/// The up to four segments cornered on it are reset; segments whose
	/// corners are now all known are created.
	pub fn set_base_point(&mut self, x: i32, z: i32, point: BasePoint) {
		let coord = TileCoord::new(x, z);
		self.base_points.insert(coord, point);
		for (tile, (cx, cz)) in coord.tiles_sharing_point() {
			if let Some(segment) = self.segments.get_mut(&tile) {
				segment.set_corner_point(cx, cz, point);
				debug!("base point {coord:?} invalidated segment {tile:?}");
			} else if let Some(corners) = self.corners_of(tile) {
				let segment = self.create_segment(tile, &corners);
				self.segments.insert(tile, segment);
			}
		}
	}

	/// Changes the height of a base point, keeping its other parameters.
	pub fn set_base_point_height(&mut self, x: i32, z: i32, height: f32) {
		let point = match self.base_point(x, z) {
			Some(p) => BasePoint::with_params(height, p.roughness(), p.falloff()),
			None => BasePoint::new(height),
		};
		self.set_base_point(x, z, point);
	}

	pub fn base_point(&self, x: i32, z: i32) -> Option<BasePoint> {
		self.base_points.get(&TileCoord::new(x, z)).copied()
	}

	pub fn points(&self) -> &BTreeMap<TileCoord, BasePoint> {
		&self.base_points
	}

	fn corners_of(&self, tile: TileCoord) -> Option<Matrix<2, 2, BasePoint>> {
		let mut corners = Matrix::default();
		for ((cx, cz), point) in tile.corners() {
			corners[(cx, cz)] = *self.base_points.get(&point)?;
		}
		Some(corners)
	}

	fn create_segment(&self, tile: TileCoord, corners: &Matrix<2, 2, BasePoint>) -> Segment {
		let mut segment = Segment::new(tile, self.config.resolution).with_seed(self.config.seed);
		for ((cx, cz), point) in corners.iter() {
			segment.set_corner_point(cx, cz, *point);
		}
		let rect = segment.rect();
		for (id, m) in &self.mods {
			if rect_overlaps(&m.bbox(), &rect) {
				segment.update_mod(*id, Some(m.clone()));
			}
		}
		for (id, area) in &self.areas {
			if area.intersects(&segment) {
				segment.update_area(*id, Some(area.clone()));
			}
		}
		segment
	}

	pub fn segments(&self) -> &BTreeMap<TileCoord, Segment> {
		&self.segments
	}

	pub fn segment(&self, coord: TileCoord) -> Option<&Segment> {
		self.segments.get(&coord)
	}

	/// Segment covering a world position.
	pub fn segment_at(&self, x: f32, z: f32) -> Option<&Segment> {
		self.segments.get(&TileCoord::from_world_pos(x, z, self.config.resolution))
	}

	fn segment_at_mut(&mut self, x: f32, z: f32) -> Option<&mut Segment> {
		self.segments.get_mut(&TileCoord::from_world_pos(x, z, self.config.resolution))
	}

	/// Registers a shader under layer `id`, replacing any previous one.
	pub fn add_shader(&mut self, id: i32, shader: impl Into<Shader>) -> Result<(), TerrainError> {
		let shader = shader.into();
		shader.validate()?;
		debug!("shader {id} ({}) registered", shader.name());
		self.shaders.insert(id, shader);
		self.invalidate_surfaces();
		Ok(())
	}

	pub fn remove_shader(&mut self, id: i32) -> Option<Shader> {
		let removed = self.shaders.remove(&id);
		if removed.is_some() {
			self.invalidate_surfaces();
		}
		removed
	}

	pub fn shaders(&self) -> &ShaderStore {
		&self.shaders
	}

	/// Whether areas on `layer` get painted: a shader is registered under that
	/// id, or a registered shader (possibly inside a tile) paints the layer.
	pub fn layer_has_shader(&self, layer: i32) -> bool {
		self.shaders.contains_key(&layer) || self.shaders.values().any(|s| s.paints_layer(layer))
	}

	fn invalidate_surfaces(&mut self) {
		for segment in self.segments.values_mut() {
			segment.invalidate_surfaces();
		}
	}

	/// Adds, replaces (`Some`) or removes (`None`) the mod under `id`.
	///
	/// Returns the world box whose heights may have changed: the union of
	/// the old and new footprints.
	pub fn update_mod(&mut self, id: i64, m: Option<Arc<dyn TerrainMod>>) -> Option<Rect> {
		let old = match &m {
			Some(m) => self.mods.insert(id, m.clone()),
			None => self.mods.remove(&id),
		};
		let new_box = m.as_ref().map(|m| m.bbox());
		let affected = match (old.map(|o| o.bbox()), new_box) {
			(Some(a), Some(b)) => Some(a.union(b)),
			(a, b) => a.or(b),
		};
		let mut touched = 0;
		for segment in self.segments.values_mut() {
			if new_box.is_some_and(|b| rect_overlaps(&b, &segment.rect())) {
				segment.update_mod(id, m.clone());
				touched += 1;
			} else if segment.mods().contains_key(&id) {
				segment.update_mod(id, None);
				touched += 1;
			}
		}
		debug!("mod {id} update invalidated {touched} segments");
		affected
	}

	pub fn add_mod(&mut self, id: i64, m: impl TerrainMod + 'static) -> Option<Rect> {
		self.update_mod(id, Some(Arc::new(m)))
	}

	pub fn remove_mod(&mut self, id: i64) -> Option<Rect> {
		self.update_mod(id, None)
	}

	pub fn mods(&self) -> &BTreeMap<i64, Arc<dyn TerrainMod>> {
		&self.mods
	}

	/// Adds, replaces (`Some`) or removes (`None`) the area under `id`.
	pub fn update_area(&mut self, id: i64, area: Option<Area>) {
		let area = area.map(Arc::new);
		match &area {
			Some(area) => {
				if !self.layer_has_shader(area.layer()) {
					warn!("area {id} is on layer {} which has no shader", area.layer());
				}
				self.areas.insert(id, area.clone());
			}
			None => {
				self.areas.remove(&id);
			}
		}
		for segment in self.segments.values_mut() {
			if area.as_ref().is_some_and(|a| a.intersects(segment)) {
				segment.update_area(id, area.clone());
			} else if segment.areas().contains_key(&id) {
				segment.update_area(id, None);
			}
		}
	}

	pub fn add_area(&mut self, id: i64, area: Area) {
		self.update_area(id, Some(area));
	}

	pub fn remove_area(&mut self, id: i64) {
		self.update_area(id, None);
	}

	pub fn areas(&self) -> &BTreeMap<i64, Arc<Area>> {
		&self.areas
	}

	/// Height at a world position, synthesizing the segment if needed.
	///
	/// Where no segment exists the default level is returned.
	pub fn get(&mut self, x: f32, z: f32) -> f32 {
		match self.segment_at_mut(x, z) {
			Some(segment) => {
				if !segment.is_valid() {
					segment.populate();
				}
				let origin = segment.origin();
				segment.get_height(x - origin.x, z - origin.y)
			}
			None => defaults::DEFAULT_LEVEL,
		}
	}

	/// Height and unit normal at a world position, synthesizing the segment
	/// if needed. `None` where no segment exists.
	pub fn get_height_and_normal(&mut self, x: f32, z: f32) -> Option<(f32, Vec3)> {
		let segment = self.segment_at_mut(x, z)?;
		if !segment.is_valid() {
			segment.populate();
		}
		let origin = segment.origin();
		Some(segment.get_height_and_normal(x - origin.x, z - origin.y))
	}

	/// Read-only height query. `Ok(None)` where no segment exists; an error
	/// when the segment exists but its heights are stale.
	pub fn try_get(&self, x: f32, z: f32) -> Result<Option<f32>, TerrainError> {
		let Some(segment) = self.segment_at(x, z) else {
			return Ok(None);
		};
		if !segment.is_valid() {
			let coord = segment.coord();
			return Err(TerrainError::Unpopulated { x: coord.x, z: coord.z });
		}
		let origin = segment.origin();
		Ok(Some(segment.get_height(x - origin.x, z - origin.y)))
	}

	/// Brings one segment fully up to date and returns it.
	pub fn populated_segment(&mut self, coord: TileCoord) -> Option<&Segment> {
		let shaders = self.config.shaded.then_some(&self.shaders);
		let segment = self.segments.get_mut(&coord)?;
		segment.refresh(shaders);
		Some(&*segment)
	}

	/// Brings every segment up to date, in parallel.
	pub fn refresh(&mut self) {
		let shaders = self.config.shaded.then_some(&self.shaders);
		self.segments.par_iter_mut().for_each(|(_, segment)| segment.refresh(shaders));
		debug!("refreshed {} segments", self.segments.len());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modifier::{CraterMod, LevelMod, Shape};
	use crate::segment::SegmentState;
	use crate::shader::{AreaShader, FillShader, GrassShader, TileShader};
	use bevy::math::Vec2;

	const RES: u32 = 16;

	/// Base points on `0..=n` in both axes with varied heights.
	fn grid_terrain(n: i32) -> Terrain {
		let mut terrain = Terrain::new(TerrainConfig::new(5).with_resolution(RES));
		for z in 0..=n {
			for x in 0..=n {
				terrain.set_base_point(x, z, BasePoint::new((x * 3 - z * 2) as f32));
			}
		}
		terrain
	}

	#[test]
	fn test_segment_created_once_corners_exist() {
		let mut terrain = Terrain::new(TerrainConfig::default().with_resolution(RES));
		terrain.set_base_point(0, 0, BasePoint::new(1.0));
		terrain.set_base_point(1, 0, BasePoint::new(2.0));
		terrain.set_base_point(0, 1, BasePoint::new(3.0));
		assert!(terrain.segments().is_empty());
		terrain.set_base_point(1, 1, BasePoint::new(4.0));
		let segment = terrain.segment(TileCoord::new(0, 0));
		assert_eq!(segment.map(Segment::state), Some(SegmentState::Uninitialized));
		assert_eq!(terrain.segments().len(), 1);
	}

	#[test]
	fn test_shared_point_edit_invalidates_four_segments() {
		let mut terrain = grid_terrain(2);
		terrain.refresh();
		assert!(terrain.segments().values().all(Segment::is_valid));

		terrain.set_base_point_height(1, 1, 42.0);
		assert_eq!(terrain.segments().len(), 4);
		assert!(terrain.segments().values().all(|s| !s.is_valid()));

		let shared = RES as f32;
		assert_eq!(terrain.get(shared, shared), 42.0);
		assert_eq!(terrain.segment_at(shared, shared).map(Segment::is_valid), Some(true));
		assert_eq!(terrain.base_point(1, 1).map(|p| p.roughness()), Some(BasePoint::ROUGHNESS));
	}

	#[test]
	fn test_neighbours_share_edges() {
		let mut terrain = grid_terrain(2);
		terrain.refresh();
		let a = terrain.segment(TileCoord::new(0, 0)).unwrap();
		let b = terrain.segment(TileCoord::new(1, 0)).unwrap();
		let c = terrain.segment(TileCoord::new(0, 1)).unwrap();
		let last = RES as usize;
		for i in 0..=last {
			assert_eq!(a.get(last, i), b.get(0, i));
			assert_eq!(a.get(i, last), c.get(i, 0));
		}
	}

	#[test]
	fn test_missing_terrain_uses_default_level() {
		let mut terrain = grid_terrain(1);
		assert_eq!(terrain.get(-100.0, 5.0), defaults::DEFAULT_LEVEL);
		assert_eq!(terrain.get_height_and_normal(-100.0, 5.0), None);
		assert_eq!(terrain.try_get(-100.0, 5.0), Ok(None));
	}

	#[test]
	fn test_try_get_reports_stale_segment() {
		let mut terrain = grid_terrain(1);
		assert_eq!(terrain.try_get(3.0, 3.0), Err(TerrainError::Unpopulated { x: 0, z: 0 }));
		let _ = terrain.get(3.0, 3.0);
		assert!(matches!(terrain.try_get(3.0, 3.0), Ok(Some(_))));
		assert_eq!(terrain.try_get(0.0, 0.0), Ok(Some(0.0)));
	}

	#[test]
	fn test_mod_fans_out_to_overlapping_segments() {
		let mut terrain = grid_terrain(2);
		terrain.refresh();
		let shared = RES as f32;
		let crater = CraterMod::new(Vec3::new(shared, 0.0, shared), 4.0);
		let affected = terrain.add_mod(1, crater);
		assert_eq!(affected, Some(Rect::new(12.0, 12.0, 20.0, 20.0)));
		assert!(terrain.segments().values().all(|s| !s.is_valid() && s.mods().contains_key(&1)));
		assert_eq!(terrain.get(shared, shared), -4.0);

		terrain.refresh();
		let far = Shape::Rect(Rect::new(20.0, 20.0, 30.0, 30.0));
		let affected = terrain.update_mod(1, Some(Arc::new(LevelMod::new(far, 0.0))));
		assert_eq!(affected, Some(Rect::new(12.0, 12.0, 30.0, 30.0)));
		assert!(terrain.segments().values().all(|s| !s.is_valid()));
		assert!(!terrain.segment(TileCoord::new(0, 0)).unwrap().mods().contains_key(&1));
		assert!(terrain.segment(TileCoord::new(1, 1)).unwrap().mods().contains_key(&1));

		terrain.refresh();
		assert_eq!(terrain.remove_mod(1), Some(Rect::new(20.0, 20.0, 30.0, 30.0)));
		assert!(terrain.segment(TileCoord::new(0, 0)).unwrap().is_valid());
		assert!(!terrain.segment(TileCoord::new(1, 1)).unwrap().is_valid());
	}

	#[test]
	fn test_new_segments_pick_up_existing_mods() {
		let mut terrain = Terrain::new(TerrainConfig::default().with_resolution(RES));
		terrain.add_mod(3, LevelMod::new(Shape::Rect(Rect::new(0.0, 0.0, 4.0, 4.0)), 100.0));
		for (x, z) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
			terrain.set_base_point(x, z, BasePoint::new(0.0));
		}
		assert_eq!(terrain.get(2.0, 2.0), 100.0);
		assert_eq!(terrain.get(10.0, 10.0), 0.0);
	}

	#[test]
	fn test_shaders_and_areas_reach_surfaces() {
		let mut terrain = grid_terrain(1);
		let tile = TileShader::new().with_shader(FillShader::new(), 0).with_shader(GrassShader::default(), 1);
		terrain.add_shader(0, tile).unwrap();
		terrain.refresh();
		let segment = terrain.segment(TileCoord::new(0, 0)).unwrap();
		assert_eq!(segment.state(), SegmentState::SurfacesValid);
		assert_eq!(segment.surface(0).map(|s| s.channels()), Some(2));

		let square = vec![Vec2::new(1.0, 1.0), Vec2::new(5.0, 1.0), Vec2::new(5.0, 5.0)];
		terrain.add_area(9, Area::new(4, square));
		let segment = terrain.segment(TileCoord::new(0, 0)).unwrap();
		assert_eq!(segment.state(), SegmentState::NormalsValid);
		assert_eq!(segment.areas().len(), 1);

		terrain.remove_shader(0);
		let segment = terrain.populated_segment(TileCoord::new(0, 0)).unwrap();
		assert!(segment.surfaces().is_empty());
	}

	#[test]
	fn test_shader_edits_invalidate_shaded_segments() {
		let mut terrain = grid_terrain(2);
		terrain.add_shader(0, FillShader::new()).unwrap();
		terrain.refresh();
		assert!(terrain.segments().values().all(|s| s.state() == SegmentState::SurfacesValid));

		terrain.add_shader(1, GrassShader::new(-100.0, 100.0, 50.0, 60.0)).unwrap();
		assert!(terrain.segments().values().all(|s| s.state() == SegmentState::NormalsValid));
		let segment = terrain.populated_segment(TileCoord::new(1, 1)).unwrap();
		assert_eq!(segment.state(), SegmentState::SurfacesValid);
		assert!(segment.surface(1).is_some());

		terrain.refresh();
		assert!(terrain.segments().values().all(|s| s.state() == SegmentState::SurfacesValid));
		assert!(terrain.remove_shader(1).is_some());
		assert!(terrain.segments().values().all(|s| s.state() == SegmentState::NormalsValid));
		let segment = terrain.populated_segment(TileCoord::new(0, 0)).unwrap();
		assert!(segment.surface(1).is_none());
		assert!(segment.surface(0).is_some());

		terrain.refresh();
		assert!(terrain.remove_shader(5).is_none());
		assert!(terrain.segments().values().all(|s| s.state() == SegmentState::SurfacesValid));
	}

	#[test]
	fn test_layer_shader_lookup_sees_tile_channels() {
		let mut terrain = grid_terrain(1);
		assert!(!terrain.layer_has_shader(7));
		let tile = TileShader::new().with_shader(FillShader::new(), 0).with_shader(AreaShader::new(7), 1);
		terrain.add_shader(0, tile).unwrap();
		assert!(terrain.layer_has_shader(7));
		assert!(terrain.layer_has_shader(0));
		assert!(!terrain.layer_has_shader(1));

		let square = vec![Vec2::new(1.0, 1.0), Vec2::new(5.0, 1.0), Vec2::new(5.0, 5.0), Vec2::new(1.0, 5.0)];
		terrain.add_area(3, Area::new(7, square));
		terrain.refresh();
		let surface = terrain.segment(TileCoord::new(0, 0)).unwrap().surface(0).unwrap();
		assert_eq!(surface.get(2, 2, 1), 1.0);
		assert_eq!(surface.get(10, 10, 1), 0.0);
	}

	#[test]
	fn test_invalid_shader_is_rejected() {
		let mut terrain = grid_terrain(1);
		let bad: Shader = serde_json::from_str(r#"{"kind": "depth", "murkyDepth": 5.0}"#).unwrap();
		assert!(terrain.add_shader(0, bad).is_err());
		assert!(terrain.shaders().is_empty());
	}

	#[test]
	fn test_unshaded_terrain_stops_at_normals() {
		let mut terrain = Terrain::new(TerrainConfig::new(1).with_resolution(RES).with_shading(false));
		for (x, z) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
			terrain.set_base_point(x, z, BasePoint::new(x as f32));
		}
		terrain.add_shader(0, FillShader::new()).unwrap();
		terrain.refresh();
		let segment = terrain.segment(TileCoord::new(0, 0)).unwrap();
		assert_eq!(segment.state(), SegmentState::NormalsValid);
		assert!(segment.surfaces().is_empty());
	}
}
