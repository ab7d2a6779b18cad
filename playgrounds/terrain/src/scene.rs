use anyhow::{ensure, Context};
use bevy::math::{Rect, Vec2, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use terrain_heightfield::{
	AdjustMod, Area, AreaShader, BandShader, BasePoint, CraterMod, DepthShader, FillShader,
	GrassShader, HighShader, LevelMod, Shader, Shape, SlopeMod, Terrain, TerrainConfig, TerrainMod,
	TileShader,
};

/// A base point as written in a scene file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSpec {
	pub x: i32,
	pub z: i32,
	pub height: f32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub roughness: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub falloff: Option<f32>,
}

impl PointSpec {
	fn to_base_point(self) -> anyhow::Result<BasePoint> {
		let roughness = self.roughness.unwrap_or(BasePoint::ROUGHNESS);
		let falloff = self.falloff.unwrap_or(BasePoint::FALLOFF);
		BasePoint::try_with_params(self.height, roughness, falloff)
			.with_context(|| format!("point ({}, {}) rejected", self.x, self.z))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
	Rect { min: [f32; 2], max: [f32; 2] },
	Disc { center: [f32; 2], radius: f32 },
}

impl From<ShapeSpec> for Shape {
	fn from(spec: ShapeSpec) -> Self {
		match spec {
			ShapeSpec::Rect { min, max } => Shape::Rect(Rect::from_corners(min.into(), max.into())),
			ShapeSpec::Disc { center, radius } => Shape::Disc { center: center.into(), radius },
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModSpec {
	Level { id: i64, shape: ShapeSpec, level: f32 },
	Adjust { id: i64, shape: ShapeSpec, offset: f32 },
	Slope { id: i64, shape: ShapeSpec, level: f32, gradient: [f32; 2] },
	Crater { id: i64, center: [f32; 3], radius: f32 },
}

impl ModSpec {
	pub fn id(&self) -> i64 {
		match self {
			ModSpec::Level { id, .. }
			| ModSpec::Adjust { id, .. }
			| ModSpec::Slope { id, .. }
			| ModSpec::Crater { id, .. } => *id,
		}
	}

	fn to_mod(self) -> Arc<dyn TerrainMod> {
		match self {
			ModSpec::Level { shape, level, .. } => Arc::new(LevelMod::new(shape.into(), level)),
			ModSpec::Adjust { shape, offset, .. } => Arc::new(AdjustMod::new(shape.into(), offset)),
			ModSpec::Slope { shape, level, gradient, .. } => {
				Arc::new(SlopeMod::new(shape.into(), level, gradient.into()))
			}
			ModSpec::Crater { center, radius, .. } => Arc::new(CraterMod::new(center.into(), radius)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSpec {
	pub id: i64,
	pub layer: i32,
	#[serde(default)]
	pub hole: bool,
	pub polygon: Vec<[f32; 2]>,
}

/// Everything needed to rebuild a terrain, as stored in a JSON scene file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
	pub config: TerrainConfig,
	pub points: Vec<PointSpec>,
	pub shaders: BTreeMap<i32, Shader>,
	pub mods: Vec<ModSpec>,
	pub areas: Vec<AreaSpec>,
}

impl Scene {
	/// Layer painted by the generated scene's area.
	pub const AREA_LAYER: i32 = 1;

	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let text = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read scene {}", path.display()))?;
		serde_json::from_str(&text).with_context(|| format!("failed to parse scene {}", path.display()))
	}

	pub fn save(&self, path: &Path) -> anyhow::Result<()> {
		let text = serde_json::to_string_pretty(self)?;
		std::fs::write(path, text).with_context(|| format!("failed to write scene {}", path.display()))
	}

	/// A seeded random scene of `extent` × `extent` segments.
	///
	/// Layer 0 is a five-channel tile shader (fill, beach band, grass,
	/// underwater depth, snow), layer 1 paints a single area. A crater sits in
	/// the middle of the world and a plateau is levelled off near its corner.
	pub fn random(seed: u64, extent: i32, resolution: u32) -> Self {
		let mut rng = StdRng::seed_from_u64(seed);
		let mut points = Vec::new();
		for z in 0..=extent {
			for x in 0..=extent {
				points.push(PointSpec {
					x,
					z,
					height: rng.gen_range(-20.0..40.0_f32).round(),
					roughness: Some(rng.gen_range(0.5..2.0)),
					falloff: None,
				});
			}
		}

		let tile = TileShader::new()
			.with_shader(FillShader::new(), 0)
			.with_shader(BandShader::with_fade(-2.0, 2.0, 1.0), 1)
			.with_shader(GrassShader::default(), 2)
			.with_shader(DepthShader::default(), 3)
			.with_shader(HighShader::new(30.0), 4);
		let shaders = BTreeMap::from([
			(0, Shader::from(tile)),
			(Self::AREA_LAYER, Shader::from(AreaShader::new(Self::AREA_LAYER))),
		]);

		let res = resolution as f32;
		let middle = extent as f32 * res / 2.0;
		let mods = vec![
			ModSpec::Crater { id: 1, center: [middle, 20.0, middle], radius: res / 2.0 },
			ModSpec::Level {
				id: 2,
				shape: ShapeSpec::Disc { center: [res / 2.0, res / 2.0], radius: res / 4.0 },
				level: 12.0,
			},
		];

		let areas = vec![AreaSpec {
			id: 1,
			layer: Self::AREA_LAYER,
			hole: false,
			polygon: vec![
				[res * 0.25, middle],
				[middle, res * 0.25],
				[middle + res * 0.5, middle + res * 0.5],
			],
		}];

		Self {
			config: TerrainConfig::new(seed).with_resolution(resolution),
			points,
			shaders,
			mods,
			areas,
		}
	}

	/// Builds an unpopulated terrain from the scene.
	pub fn build(&self) -> anyhow::Result<Terrain> {
		ensure!(
			self.config.resolution.is_power_of_two(),
			"resolution {} is not a power of two",
			self.config.resolution
		);
		let mut terrain = Terrain::new(self.config);
		for (id, shader) in &self.shaders {
			terrain
				.add_shader(*id, shader.clone())
				.with_context(|| format!("shader {id} ({}) rejected", shader.name()))?;
		}
		for spec in &self.mods {
			terrain.update_mod(spec.id(), Some(spec.to_mod()));
		}
		for spec in &self.areas {
			ensure!(spec.polygon.len() >= 3, "area {} needs at least three vertices", spec.id);
			let polygon = spec.polygon.iter().copied().map(Vec2::from).collect();
			let area = Area::new(spec.layer, polygon);
			terrain.add_area(spec.id, if spec.hole { area.hole() } else { area });
		}
		for point in &self.points {
			terrain.set_base_point(point.x, point.z, point.to_base_point()?);
		}
		Ok(terrain)
	}
}

/// Centre of the crater in a generated scene, if it has one.
pub fn crater_centre(scene: &Scene) -> Option<Vec3> {
	scene.mods.iter().find_map(|m| match m {
		ModSpec::Crater { center, .. } => Some(Vec3::from(*center)),
		_ => None,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_random_scene_is_seeded() {
		assert_eq!(Scene::random(3, 2, 16), Scene::random(3, 2, 16));
		assert_ne!(Scene::random(3, 2, 16), Scene::random(4, 2, 16));
	}

	#[test]
	fn test_random_scene_builds_every_segment() {
		let scene = Scene::random(7, 3, 16);
		let terrain = scene.build().unwrap();
		assert_eq!(terrain.segments().len(), 9);
		assert_eq!(terrain.mods().len(), 2);
		assert_eq!(terrain.areas().len(), 1);
	}

	#[test]
	fn test_scene_json_round_trip() {
		let scene = Scene::random(1, 1, 8);
		let json = serde_json::to_string(&scene).unwrap();
		let back: Scene = serde_json::from_str(&json).unwrap();
		assert_eq!(back, scene);
	}

	#[test]
	fn test_minimal_scene_file() {
		let json = r#"{
			"config": {"resolution": 8},
			"points": [
				{"x": 0, "z": 0, "height": 1.0},
				{"x": 1, "z": 0, "height": 1.0},
				{"x": 0, "z": 1, "height": 1.0},
				{"x": 1, "z": 1, "height": 1.0, "roughness": 0.5}
			],
			"shaders": {"0": {"kind": "fill"}},
			"mods": [{"kind": "adjust", "id": 4, "shape": {"type": "rect", "min": [0, 0], "max": [2, 2]}, "offset": 3.0}]
		}"#;
		let scene: Scene = serde_json::from_str(json).unwrap();
		let mut terrain = scene.build().unwrap();
		assert_eq!(terrain.get(1.0, 1.0), 4.0);
		assert_eq!(terrain.get(6.0, 6.0), 1.0);
	}

	#[test]
	fn test_bad_falloff_is_reported() {
		let scene = Scene {
			points: vec![PointSpec { x: 0, z: 0, height: 0.0, roughness: None, falloff: Some(2.0) }],
			..Scene::default()
		};
		assert!(scene.build().is_err());
	}
}
