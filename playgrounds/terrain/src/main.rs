mod scene;

use clap::Parser;
use log::info;
use scene::Scene;
use std::path::PathBuf;
use std::time::Instant;
use terrain_heightfield::Terrain;
use tracing_subscriber::EnvFilter;

/// Builds a terrain from a scene and reports what every segment ended up with.
#[derive(Debug, Parser)]
#[command(name = "terrain-playground")]
struct Args {
	/// JSON scene to load; a random one is generated when omitted.
	#[arg(long)]
	scene: Option<PathBuf>,

	/// Seed for the generated scene.
	#[arg(long, default_value_t = 12345)]
	seed: u64,

	/// Cells per segment side for the generated scene.
	#[arg(long, default_value_t = 64)]
	resolution: u32,

	/// Segments per side for the generated scene.
	#[arg(long, default_value_t = 4)]
	extent: i32,

	/// Write the scene that was used to this path.
	#[arg(long)]
	dump: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();
	let scene = match &args.scene {
		Some(path) => Scene::load(path)?,
		None => Scene::random(args.seed, args.extent, args.resolution),
	};
	if let Some(path) = &args.dump {
		scene.save(path)?;
		info!("scene written to {}", path.display());
	}

	let mut terrain = scene.build()?;
	info!(
		"{} base points, {} segments, {} shaders, {} mods, {} areas",
		terrain.points().len(),
		terrain.segments().len(),
		terrain.shaders().len(),
		terrain.mods().len(),
		terrain.areas().len()
	);

	let start = Instant::now();
	terrain.refresh();
	info!("refreshed in {:?}", start.elapsed());

	report(&terrain);

	if let Some(centre) = scene::crater_centre(&scene) {
		match terrain.get_height_and_normal(centre.x, centre.z) {
			Some((height, normal)) => info!("crater floor at {height:.2}, normal {normal:?}"),
			None => info!("crater lies outside the terrain"),
		}
	}
	Ok(())
}

fn report(terrain: &Terrain) {
	for (coord, segment) in terrain.segments() {
		let layers = segment
			.surfaces()
			.iter()
			.map(|(id, surface)| {
				let means = (0..surface.channels())
					.map(|ch| format!("{:.2}", surface.coverage(ch)))
					.collect::<Vec<_>>()
					.join("/");
				format!("{id}:[{means}]")
			})
			.collect::<Vec<_>>()
			.join(" ");
		info!(
			"segment ({:>3}, {:>3}) heights {:>7.2}..{:>7.2} layers {}",
			coord.x,
			coord.z,
			segment.min(),
			segment.max(),
			layers
		);
	}
}
