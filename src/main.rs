use log::error;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::process;

use quadtile_pyramid::object_store::LocalDirStore;
use quadtile_pyramid::pyramid::LogStatus;
use quadtile_pyramid::reader::read_points_file;
use quadtile_pyramid::row_store::ArrowRowStore;
use quadtile_pyramid::{run, PyramidJob, Result, RunConfig};

fn tile(config_path: &str) -> Result<()> {
	let config = RunConfig::from_reader(BufReader::new(File::open(config_path)?))?;
	let points = read_points_file(&config.points_path())?;
	let row_store = ArrowRowStore::open_dir(&config.run_dir, &[config.vector_column.as_str()])?;
	let object_store = LocalDirStore::new(&config.store_dir);
	let status = LogStatus::new(&config.projection_id);
	let job = PyramidJob {
		projection_id: config.projection_id.clone(),
		vector_column: config.vector_column.clone(),
		primary_key_column: config.primary_key_column.clone(),
	};

	run(&job, points, &row_store, &object_store, &status, &config.options)?;
	Ok(())
}

fn main() {
	env_logger::init();

	let config_path = match env::args().nth(1) {
		Some(path) => path,
		None => {
			eprintln!("usage: quadtile-pyramid <run-config.json>");
			process::exit(2);
		}
	};

	if let Err(e) = tile(&config_path) {
		error!("{}", e);
		process::exit(1);
	}
}
