use crate::basepoint::BasePoint;
use bevy::math::{Vec2, Vec3};
use grid::Matrix;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Linear blend of a base point parameter along one tile edge.
struct EdgeInterp {
	size: f32,
	low: f32,
	high: f32,
}

impl EdgeInterp {
	fn new(resolution: usize, low: f32, high: f32) -> Self {
		Self { size: resolution as f32, low, high }
	}

	fn calc(&self, i: usize) -> f32 {
		self.low + (self.high - self.low) * (i as f32 / self.size)
	}
}

/// Bilinear blend of a base point parameter across a whole tile.
struct TileInterp {
	size: f32,
	corners: [f32; 4],
}

impl TileInterp {
	/// Corners in the order `(0,0)`, `(1,0)`, `(1,1)`, `(0,1)`.
	fn new(resolution: usize, corners: [f32; 4]) -> Self {
		Self { size: resolution as f32, corners }
	}

	fn calc(&self, x: usize, z: usize) -> f32 {
		let u = x as f32 / self.size;
		let v = z as f32 / self.size;
		let [c00, c10, c11, c01] = self.corners;
		c00 * (1.0 - u) * (1.0 - v) + c10 * u * (1.0 - v) + c11 * u * v + c01 * (1.0 - u) * v
	}
}

fn splitmix(mut z: u64) -> u64 {
	z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
	z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
	z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
	z ^ (z >> 31)
}

/// Folds base point seeds into the terrain seed. Order sensitive, so edges
/// must always be walked in the same direction.
fn mix_seed(seed: u64, parts: &[u32]) -> u64 {
	parts.iter().fold(splitmix(seed), |acc, part| splitmix(acc ^ u64::from(*part)))
}

/// One midpoint displacement step.
///
/// `spread` is the height range of the parent samples. Nearly flat parents
/// get a small bump so rough terrain never collapses into plateaus.
fn displace(
	rng: &mut StdRng,
	mean: f32,
	spread: f32,
	roughness: f32,
	falloff: f32,
	depth: f32,
) -> f32 {
	let spread = if spread * 100.0 < roughness { spread + 0.05 * roughness } else { spread };
	mean + (rng.gen::<f32>() - 0.5) * roughness * spread / (1.0 + depth.powf(falloff))
}

/// Dense height grid of a single tile.
///
/// Holds `(resolution + 1)²` heights indexed `z * size + x`. Only meaningful
/// while [`HeightMap::is_valid`]; every sampling call panics otherwise.
#[derive(Debug, Clone)]
pub struct HeightMap {
	resolution: usize,
	size: usize,
	data: Vec<f32>,
	min: f32,
	max: f32,
	valid: bool,
}

impl HeightMap {
	/// Panics unless `resolution` is a power of two.
	pub fn new(resolution: usize) -> Self {
		assert!(
			resolution.is_power_of_two(),
			"height map resolution must be a power of two, got {resolution}"
		);
		let size = resolution + 1;
		Self { resolution, size, data: vec![0.0; size * size], min: 0.0, max: 0.0, valid: false }
	}

	pub fn resolution(&self) -> usize {
		self.resolution
	}

	pub fn size(&self) -> usize {
		self.size
	}

	pub fn is_valid(&self) -> bool {
		self.valid
	}

	pub fn invalidate(&mut self) {
		self.valid = false;
	}

	fn assert_valid(&self) {
		assert!(self.valid, "height map sampled before it was populated");
	}

	pub fn min(&self) -> f32 {
		self.assert_valid();
		self.min
	}

	pub fn max(&self) -> f32 {
		self.assert_valid();
		self.max
	}

	/// Height of grid point `(x, z)`.
	pub fn get(&self, x: usize, z: usize) -> f32 {
		self.assert_valid();
		debug_assert!(x < self.size && z < self.size);
		self.data[z * self.size + x]
	}

	pub fn data(&self) -> &[f32] {
		self.assert_valid();
		&self.data
	}

	/// Raw bytes of the height grid, for upload by a renderer.
	pub fn as_bytes(&self) -> &[u8] {
		bytemuck::cast_slice(self.data())
	}

	pub(crate) fn set(&mut self, x: usize, z: usize, height: f32) {
		self.data[z * self.size + x] = height;
	}

	/// Rescans the grid for its extremes.
	pub(crate) fn recompute_bounds(&mut self) {
		let (min, max) = self
			.data
			.iter()
			.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| (lo.min(*h), hi.max(*h)));
		self.min = min;
		self.max = max;
	}

	/// Synthesizes the grid from four corner points.
	///
	/// Corner `(cx, cz)` of `corners` lands on grid point
	/// `(cx * resolution, cz * resolution)` exactly. Each edge is generated
	/// from its two end points alone, so neighbouring tiles that share those
	/// points share the edge too. Identical inputs and `seed` always give
	/// bit-identical grids.
	pub fn populate(&mut self, corners: &Matrix<2, 2, BasePoint>, seed: u64) {
		let p00 = corners[(0, 0)];
		let p10 = corners[(1, 0)];
		let p11 = corners[(1, 1)];
		let p01 = corners[(0, 1)];
		let res = self.resolution;

		let level = p00.height();
		if [p10, p11, p01].iter().all(|p| p.height() == level) {
			self.data.fill(level);
			self.min = level;
			self.max = level;
			self.valid = true;
			return;
		}

		// edges run in +x or +z so both tiles sharing one walk it identically
		let top = self.fill_edge(seed, &p00, &p10);
		let bottom = self.fill_edge(seed, &p01, &p11);
		let left = self.fill_edge(seed, &p00, &p01);
		let right = self.fill_edge(seed, &p10, &p11);
		for i in 0..=res {
			self.set(i, 0, top[i]);
			self.set(i, res, bottom[i]);
			self.set(0, i, left[i]);
			self.set(res, i, right[i]);
		}

		let mut rng =
			StdRng::seed_from_u64(mix_seed(seed, &[p00.seed(), p10.seed(), p11.seed(), p01.seed()]));
		let roughness = TileInterp::new(
			res,
			[p00.roughness(), p10.roughness(), p11.roughness(), p01.roughness()],
		);
		let falloff =
			TileInterp::new(res, [p00.falloff(), p10.falloff(), p11.falloff(), p01.falloff()]);

		let mut stride = res / 2;
		let mut depth = 1.0_f32;
		while stride > 0 {
			// diamond step: square centres
			for z in (stride..res).step_by(stride * 2) {
				for x in (stride..res).step_by(stride * 2) {
					let parents = [
						self.data[(z - stride) * self.size + x - stride],
						self.data[(z - stride) * self.size + x + stride],
						self.data[(z + stride) * self.size + x - stride],
						self.data[(z + stride) * self.size + x + stride],
					];
					let h = self.displace_from(&mut rng, parents, &roughness, &falloff, x, z, depth);
					self.set(x, z, h);
				}
			}
			depth += 1.0;

			// square step: interior edge midpoints, boundary rows are done
			for z in (stride..res).step_by(stride * 2) {
				for x in (stride * 2..res).step_by(stride * 2) {
					let h = self.square_point(&mut rng, &roughness, &falloff, x, z, stride, depth);
					self.set(x, z, h);
				}
			}
			for z in (stride * 2..res).step_by(stride * 2) {
				for x in (stride..res).step_by(stride * 2) {
					let h = self.square_point(&mut rng, &roughness, &falloff, x, z, stride, depth);
					self.set(x, z, h);
				}
			}

			stride /= 2;
			depth += 1.0;
		}

		self.recompute_bounds();
		self.valid = true;
	}

	fn fill_edge(&self, seed: u64, low: &BasePoint, high: &BasePoint) -> Vec<f32> {
		let res = self.resolution;
		let mut edge = vec![low.height(); res + 1];
		if low.height() == high.height() {
			return edge;
		}
		edge[res] = high.height();

		let mut rng = StdRng::seed_from_u64(mix_seed(seed, &[low.seed(), high.seed()]));
		let roughness = EdgeInterp::new(res, low.roughness(), high.roughness());
		let falloff = EdgeInterp::new(res, low.falloff(), high.falloff());

		let mut stride = res / 2;
		let mut depth = 1.0_f32;
		while stride > 0 {
			for i in (stride..res).step_by(stride * 2) {
				let a = edge[i - stride];
				let b = edge[i + stride];
				edge[i] = displace(
					&mut rng,
					(a + b) / 2.0,
					(a - b).abs(),
					roughness.calc(i),
					falloff.calc(i),
					depth,
				);
			}
			stride /= 2;
			depth += 1.0;
		}
		edge
	}

	#[allow(clippy::too_many_arguments)]
	fn square_point(
		&self,
		rng: &mut StdRng,
		roughness: &TileInterp,
		falloff: &TileInterp,
		x: usize,
		z: usize,
		stride: usize,
		depth: f32,
	) -> f32 {
		let parents = [
			self.data[z * self.size + x - stride],
			self.data[z * self.size + x + stride],
			self.data[(z - stride) * self.size + x],
			self.data[(z + stride) * self.size + x],
		];
		self.displace_from(rng, parents, roughness, falloff, x, z, depth)
	}

	#[allow(clippy::too_many_arguments)]
	fn displace_from(
		&self,
		rng: &mut StdRng,
		parents: [f32; 4],
		roughness: &TileInterp,
		falloff: &TileInterp,
		x: usize,
		z: usize,
		depth: f32,
	) -> f32 {
		let (lo, hi) = parents
			.iter()
			.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| (lo.min(*h), hi.max(*h)));
		let mean = parents.iter().sum::<f32>() / 4.0;
		displace(rng, mean, hi - lo, roughness.calc(x, z), falloff.calc(x, z), depth)
	}

	/// Finite difference gradient `(dh/dx, dh/dz)` at a grid point.
	///
	/// Central differences inside the tile. On an edge only the along-edge
	/// component is taken and corners are flat, so tiles sharing an edge agree.
	pub fn derivative(&self, x: usize, z: usize) -> Vec2 {
		let res = self.resolution;
		let dx = if x > 0 && x < res { (self.get(x + 1, z) - self.get(x - 1, z)) / 2.0 } else { 0.0 };
		let dz = if z > 0 && z < res { (self.get(x, z + 1) - self.get(x, z - 1)) / 2.0 } else { 0.0 };
		Vec2::new(dx, dz)
	}

	/// Splits a local position into its cell and the offset inside it.
	/// Positions are clamped to the tile.
	fn locate(&self, x: f32, z: f32) -> (usize, usize, f32, f32) {
		let res = self.resolution as f32;
		let x = x.clamp(0.0, res);
		let z = z.clamp(0.0, res);
		let tx = (x.floor() as usize).min(self.resolution - 1);
		let tz = (z.floor() as usize).min(self.resolution - 1);
		(tx, tz, x - tx as f32, z - tz as f32)
	}

	/// Heights of a cell's corners as `(h00, h10, h01, h11)`.
	fn cell(&self, tx: usize, tz: usize) -> (f32, f32, f32, f32) {
		(self.get(tx, tz), self.get(tx + 1, tz), self.get(tx, tz + 1), self.get(tx + 1, tz + 1))
	}

	/// Height at a continuous local position.
	///
	/// Every cell is split into two triangles along its `(0,0)`-`(1,1)`
	/// diagonal, the same way in every tile, and the height is taken from the
	/// plane of the triangle containing the position.
	pub fn get_height(&self, x: f32, z: f32) -> f32 {
		let (tx, tz, ox, oz) = self.locate(x, z);
		let (h00, h10, h01, h11) = self.cell(tx, tz);
		if ox <= oz {
			h00 + (h11 - h01) * ox + (h01 - h00) * oz
		} else {
			h00 + (h10 - h00) * ox + (h11 - h10) * oz
		}
	}

	/// Height and unit normal (Y up) at a continuous local position. On the
	/// cell diagonal the normal is the average of both triangles.
	pub fn get_height_and_normal(&self, x: f32, z: f32) -> (f32, Vec3) {
		let (tx, tz, ox, oz) = self.locate(x, z);
		let (h00, h10, h01, h11) = self.cell(tx, tz);
		let upper = Vec3::new(h01 - h11, 1.0, h00 - h01);
		let lower = Vec3::new(h00 - h10, 1.0, h10 - h11);
		if ox <= oz {
			let normal = if ox == oz { upper + lower } else { upper };
			(h00 + (h11 - h01) * ox + (h01 - h00) * oz, normal.normalize())
		} else {
			(h00 + (h10 - h00) * ox + (h11 - h10) * oz, lower.normalize())
		}
	}
}
