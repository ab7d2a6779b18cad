use crate::area::Area;
use crate::basepoint::BasePoint;
use crate::heightmap::HeightMap;
use crate::modifier::TerrainMod;
use crate::shader::{Shade, ShaderStore};
use crate::surface::Surface;
use bevy::math::{Rect, Vec2, Vec3};
use grid::{CellRange, Matrix, TileCoord};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// How far a segment's derived data is up to date.
///
/// Each state implies every state before it. Invalidation only ever moves
/// backwards; population only ever moves forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentState {
	Uninitialized,
	HeightsValid,
	NormalsValid,
	SurfacesValid,
}

/// One square tile of terrain.
///
/// A segment caches everything derived from its four corner base points:
/// the height grid with mods baked in, per point normals and one surface per
/// applicable shader. Accessors for a stage panic when that stage is stale;
/// call the matching `populate_*` (or [`Segment::refresh`]) first.
#[derive(Debug, Clone)]
pub struct Segment {
	coord: TileCoord,
	resolution: u32,
	size: usize,
	seed: u64,
	control_points: Matrix<2, 2, BasePoint>,
	heightmap: HeightMap,
	normals: Vec<f32>,
	state: SegmentState,
	surfaces: BTreeMap<i32, Surface>,
	mods: BTreeMap<i64, Arc<dyn TerrainMod>>,
	areas: BTreeMap<i64, Arc<Area>>,
	/// Area ids by layer.
	layers: BTreeMap<i32, BTreeSet<i64>>,
}

impl Segment {
	/// Panics unless `resolution` is a power of two.
	pub fn new(coord: TileCoord, resolution: u32) -> Self {
		let heightmap = HeightMap::new(resolution as usize);
		let size = heightmap.size();
		debug!("new segment {coord:?} at resolution {resolution}");
		Self {
			coord,
			resolution,
			size,
			seed: 0,
			control_points: Matrix::default(),
			heightmap,
			normals: Vec::new(),
			state: SegmentState::Uninitialized,
			surfaces: BTreeMap::new(),
			mods: BTreeMap::new(),
			areas: BTreeMap::new(),
			layers: BTreeMap::new(),
		}
	}

	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = seed;
		self.invalidate(true);
		self
	}

	pub fn resolution(&self) -> u32 {
		self.resolution
	}

	/// Grid points per side, `resolution + 1`.
	pub fn size(&self) -> usize {
		self.size
	}

	pub fn coord(&self) -> TileCoord {
		self.coord
	}

	pub fn x_ref(&self) -> i32 {
		self.coord.x
	}

	pub fn z_ref(&self) -> i32 {
		self.coord.z
	}

	/// World position of grid point `(0, 0)`.
	pub fn origin(&self) -> Vec2 {
		self.coord.to_world_origin(self.resolution)
	}

	/// World-space footprint.
	pub fn rect(&self) -> Rect {
		let origin = self.origin();
		Rect::from_corners(origin, origin + Vec2::splat(self.resolution as f32))
	}

	pub fn state(&self) -> SegmentState {
		self.state
	}

	/// Whether the heights are up to date.
	pub fn is_valid(&self) -> bool {
		self.state >= SegmentState::HeightsValid
	}

	/// Marks derived data stale. With `points` the heights go too, otherwise
	/// only normals and surfaces.
	pub fn invalidate(&mut self, points: bool) {
		if points {
			self.heightmap.invalidate();
			self.state = SegmentState::Uninitialized;
		} else if self.state > SegmentState::HeightsValid {
			self.state = SegmentState::HeightsValid;
		}
	}

	pub fn invalidate_surfaces(&mut self) {
		if self.state == SegmentState::SurfacesValid {
			self.state = SegmentState::NormalsValid;
		}
	}

	pub fn control_points(&self) -> &Matrix<2, 2, BasePoint> {
		&self.control_points
	}

	/// Replaces corner `(x, z)`, each in `{0, 1}`, and resets the segment.
	pub fn set_corner_point(&mut self, x: usize, z: usize, point: BasePoint) {
		assert!(x < 2 && z < 2, "corner index ({x}, {z}) out of range");
		self.control_points[(x, z)] = point;
		self.invalidate(true);
	}

	/// Synthesizes heights from the corner points, then bakes in every mod in
	/// ascending id order.
	pub fn populate(&mut self) {
		self.heightmap.populate(&self.control_points, self.seed);
		let mods = std::mem::take(&mut self.mods);
		for (id, m) in &mods {
			if let Some(range) = self.apply_mod(m.as_ref()) {
				trace!("mod {id} touched {} points of {:?}", range.cell_count(), self.coord);
			}
		}
		self.mods = mods;
		self.heightmap.recompute_bounds();
		self.state = SegmentState::HeightsValid;
		debug!(
			"populated {:?}: heights {:.2}..{:.2}",
			self.coord,
			self.heightmap.min(),
			self.heightmap.max()
		);
	}

	/// Runs one mod over the grid points under its footprint.
	fn apply_mod(&mut self, m: &dyn TerrainMod) -> Option<CellRange> {
		let range = self.clip_to_segment(&m.bbox())?;
		let origin = self.origin();
		for (x, z) in range.iter() {
			let height = m.apply(self.heightmap.get(x, z), origin.x + x as f32, origin.y + z as f32);
			self.heightmap.set(x, z, height);
		}
		Some(range)
	}

	pub fn populate_normals(&mut self) {
		if !self.is_valid() {
			self.populate();
		}
		self.normals.clear();
		self.normals.reserve(self.size * self.size * 3);
		for z in 0..self.size {
			for x in 0..self.size {
				let d = self.heightmap.derivative(x, z);
				let n = Vec3::new(-d.x, 1.0, -d.y).normalize();
				self.normals.extend_from_slice(&[n.x, n.y, n.z]);
			}
		}
		self.state = SegmentState::NormalsValid;
		trace!("computed normals for {:?}", self.coord);
	}

	/// Shades every shader that applies to this segment.
	///
	/// A shader applies when it intersects the height range or when areas of
	/// its layer lie in the segment. Surfaces of shaders that no longer apply
	/// are dropped.
	pub fn populate_surfaces(&mut self, shaders: &ShaderStore) {
		if self.state < SegmentState::NormalsValid {
			self.populate_normals();
		}
		let mut previous = std::mem::take(&mut self.surfaces);
		let mut surfaces = BTreeMap::new();
		for (id, shader) in shaders {
			if !shader.check_intersect(self) && !self.layers.contains_key(id) {
				continue;
			}
			let mut surface = match previous.remove(id) {
				Some(surface) if surface.channels() == shader.channels() => surface,
				_ => shader.new_surface(self),
			};
			shader.shade(self, &mut surface);
			trace!("shaded layer {id} ({}) on {:?}", shader.name(), self.coord);
			surfaces.insert(*id, surface);
		}
		self.surfaces = surfaces;
		self.state = SegmentState::SurfacesValid;
		debug!("{:?} has {} surfaces", self.coord, self.surfaces.len());
	}

	/// Brings the segment up to date: surfaces when given shaders, otherwise
	/// normals.
	pub fn refresh(&mut self, shaders: Option<&ShaderStore>) {
		match shaders {
			Some(shaders) if self.state < SegmentState::SurfacesValid => self.populate_surfaces(shaders),
			None if self.state < SegmentState::NormalsValid => self.populate_normals(),
			_ => {}
		}
	}

	pub fn heightmap(&self) -> &HeightMap {
		&self.heightmap
	}

	/// Height of grid point `(x, z)`.
	pub fn get(&self, x: usize, z: usize) -> f32 {
		self.heightmap.get(x, z)
	}

	pub fn heights(&self) -> &[f32] {
		self.heightmap.data()
	}

	pub fn min(&self) -> f32 {
		self.heightmap.min()
	}

	pub fn max(&self) -> f32 {
		self.heightmap.max()
	}

	fn assert_normals(&self) {
		assert!(
			self.state >= SegmentState::NormalsValid,
			"normals of {:?} read before they were computed",
			self.coord
		);
	}

	/// Flat `[x, y, z]` normal per grid point, in grid order.
	pub fn normals(&self) -> &[f32] {
		self.assert_normals();
		&self.normals
	}

	pub fn normal_vectors(&self) -> &[[f32; 3]] {
		bytemuck::cast_slice(self.normals())
	}

	pub fn normal(&self, x: usize, z: usize) -> Vec3 {
		Vec3::from(self.normal_vectors()[z * self.size + x])
	}

	/// Height gradient magnitude at a grid point, `0` on flat ground.
	pub fn slope(&self, x: usize, z: usize) -> f32 {
		if self.state >= SegmentState::NormalsValid {
			let n = self.normal(x, z);
			(n.x * n.x + n.z * n.z).sqrt() / n.y
		} else {
			self.heightmap.derivative(x, z).length()
		}
	}

	/// Interpolated height at a local position.
	pub fn get_height(&self, x: f32, z: f32) -> f32 {
		self.heightmap.get_height(x, z)
	}

	pub fn get_height_and_normal(&self, x: f32, z: f32) -> (f32, Vec3) {
		self.heightmap.get_height_and_normal(x, z)
	}

	/// Grid points of this segment under a world-space box.
	pub fn clip_to_segment(&self, rect: &Rect) -> Option<CellRange> {
		let origin = self.origin();
		let local = Rect::from_corners(rect.min - origin, rect.max - origin);
		CellRange::clip(&local, self.size)
	}

	/// Adds, replaces (`Some`) or removes (`None`) the mod under `id`.
	pub fn update_mod(&mut self, id: i64, m: Option<Arc<dyn TerrainMod>>) {
		let changed = match m {
			Some(m) => {
				self.mods.insert(id, m);
				true
			}
			None => self.mods.remove(&id).is_some(),
		};
		if changed {
			self.invalidate(true);
		}
	}

	pub fn clear_mods(&mut self) {
		if !self.mods.is_empty() {
			self.mods.clear();
			self.invalidate(true);
		}
	}

	pub fn mods(&self) -> &BTreeMap<i64, Arc<dyn TerrainMod>> {
		&self.mods
	}

	/// Adds, replaces (`Some`) or removes (`None`) the area under `id`.
	pub fn update_area(&mut self, id: i64, area: Option<Arc<Area>>) {
		if let Some(old) = self.areas.remove(&id) {
			if let Some(ids) = self.layers.get_mut(&old.layer()) {
				ids.remove(&id);
				if ids.is_empty() {
					self.layers.remove(&old.layer());
				}
			}
		}
		if let Some(area) = area {
			self.layers.entry(area.layer()).or_default().insert(id);
			self.areas.insert(id, area);
		}
		self.invalidate_surfaces();
	}

	pub fn areas(&self) -> &BTreeMap<i64, Arc<Area>> {
		&self.areas
	}

	pub fn areas_in_layer(&self, layer: i32) -> impl Iterator<Item = &Area> + '_ {
		self.layers
			.get(&layer)
			.into_iter()
			.flatten()
			.filter_map(|id| self.areas.get(id))
			.map(|area| area.as_ref())
	}

	pub fn surfaces(&self) -> &BTreeMap<i32, Surface> {
		&self.surfaces
	}

	pub fn surface(&self, id: i32) -> Option<&Surface> {
		self.surfaces.get(&id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modifier::{AdjustMod, CraterMod, LevelMod, Shape};
	use crate::shader::{AreaShader, FillShader, HighShader, Shader};

	fn flat(coord: TileCoord, resolution: u32, height: f32) -> Segment {
		let mut segment = Segment::new(coord, resolution);
		for (corner, _) in coord.corners() {
			segment.set_corner_point(corner.0, corner.1, BasePoint::new(height));
		}
		segment
	}

	#[test]
	fn test_flat_corners_give_flat_tile() {
		let mut segment = flat(TileCoord::new(0, 0), 16, 10.0);
		segment.populate();
		segment.populate_normals();
		assert!(segment.heights().iter().all(|h| *h == 10.0));
		assert_eq!(segment.min(), 10.0);
		assert_eq!(segment.max(), 10.0);
		assert_eq!(segment.normals().len(), 17 * 17 * 3);
		assert!(segment.normal_vectors().iter().all(|n| *n == [0.0, 1.0, 0.0]));
		assert_eq!(segment.slope(8, 8), 0.0);
	}

	#[test]
	fn test_state_transitions() {
		let mut segment = flat(TileCoord::new(0, 0), 8, 2.0);
		assert_eq!(segment.state(), SegmentState::Uninitialized);
		assert!(!segment.is_valid());

		segment.populate();
		assert_eq!(segment.state(), SegmentState::HeightsValid);

		let shaders = ShaderStore::from([(0, Shader::from(FillShader::new()))]);
		segment.populate_surfaces(&shaders);
		assert_eq!(segment.state(), SegmentState::SurfacesValid);

		segment.invalidate_surfaces();
		assert_eq!(segment.state(), SegmentState::NormalsValid);
		segment.invalidate(false);
		assert_eq!(segment.state(), SegmentState::HeightsValid);

		segment.set_corner_point(1, 1, BasePoint::new(5.0));
		assert_eq!(segment.state(), SegmentState::Uninitialized);
	}

	#[test]
	fn test_stages_populate_lazily() {
		let mut segment = flat(TileCoord::new(2, 3), 8, 1.0);
		let shaders = ShaderStore::from([(0, Shader::from(FillShader::new()))]);
		segment.refresh(Some(&shaders));
		assert_eq!(segment.state(), SegmentState::SurfacesValid);
		assert_eq!(segment.surface(0).map(|s| s.coverage(0)), Some(1.0));
	}

	#[test]
	#[should_panic(expected = "before they were computed")]
	fn test_stale_normals_panic() {
		let mut segment = flat(TileCoord::new(0, 0), 8, 1.0);
		segment.populate();
		let _ = segment.normals();
	}

	#[test]
	#[should_panic(expected = "out of range")]
	fn test_bad_corner_panics() {
		let mut segment = Segment::new(TileCoord::new(0, 0), 8);
		segment.set_corner_point(2, 0, BasePoint::default());
	}

	#[test]
	fn test_mods_apply_in_id_order() {
		let shape = Shape::Rect(Rect::new(2.0, 2.0, 4.0, 4.0));
		let level: Arc<dyn TerrainMod> = Arc::new(LevelMod::new(shape, 4.0));
		let raise: Arc<dyn TerrainMod> = Arc::new(AdjustMod::new(shape, 1.0));

		let mut segment = flat(TileCoord::new(0, 0), 8, 10.0);
		segment.update_mod(1, Some(level.clone()));
		segment.update_mod(2, Some(raise.clone()));
		segment.populate();
		assert_eq!(segment.get(3, 3), 5.0);
		assert_eq!(segment.get(5, 3), 10.0);
		assert_eq!(segment.min(), 5.0);

		segment.update_mod(1, Some(raise));
		segment.update_mod(2, Some(level));
		assert!(!segment.is_valid());
		segment.populate();
		assert_eq!(segment.get(3, 3), 4.0);

		segment.clear_mods();
		segment.populate();
		assert_eq!(segment.get(3, 3), 10.0);
	}

	#[test]
	fn test_mods_work_in_world_space() {
		let mut segment = flat(TileCoord::new(-1, 0), 8, 10.0);
		segment.update_mod(7, Some(Arc::new(CraterMod::new(Vec3::new(-4.0, 10.0, 4.0), 3.0))));
		segment.populate();
		assert_eq!(segment.get(4, 4), 7.0);
		assert_eq!(segment.get(0, 0), 10.0);
		segment.update_mod(7, None);
		segment.populate();
		assert_eq!(segment.get(4, 4), 10.0);
	}

	#[test]
	fn test_clip_to_segment() {
		let segment = Segment::new(TileCoord::new(1, 0), 16);
		assert_eq!(segment.rect(), Rect::new(16.0, 0.0, 32.0, 16.0));
		let range = segment.clip_to_segment(&Rect::new(20.0, -5.0, 40.0, 3.0));
		assert_eq!(range, Some(CellRange::new(4, 16, 0, 3)));
		assert_eq!(segment.clip_to_segment(&Rect::new(-10.0, 0.0, 10.0, 10.0)), None);
	}

	#[test]
	fn test_area_surfaces_follow_areas() {
		let mut segment = flat(TileCoord::new(0, 0), 8, 0.0);
		let shaders = ShaderStore::from([
			(3, Shader::from(AreaShader::new(3))),
			(5, Shader::from(HighShader::new(1000.0))),
		]);
		let square = Area::new(
			3,
			vec![Vec2::new(1.0, 1.0), Vec2::new(4.0, 1.0), Vec2::new(4.0, 4.0), Vec2::new(1.0, 4.0)],
		);
		segment.update_area(11, Some(Arc::new(square)));
		assert_eq!(segment.areas_in_layer(3).count(), 1);

		segment.populate_surfaces(&shaders);
		assert!(segment.surface(5).is_none());
		let surface = segment.surface(3).unwrap();
		assert_eq!(surface.get(2, 2, 0), 1.0);
		assert_eq!(surface.get(6, 6, 0), 0.0);

		segment.update_area(11, None);
		assert_eq!(segment.state(), SegmentState::NormalsValid);
		assert_eq!(segment.areas_in_layer(3).count(), 0);
		segment.populate_surfaces(&shaders);
		assert!(segment.surfaces().is_empty());
	}
}
