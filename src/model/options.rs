use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, TilerError};
use crate::model::tile_address::MAX_ADDRESS_DEPTH;

/// How the quadtree is populated.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
	/// Whole-population recursive build with density-aware sampling per node.
	#[default]
	Batch,
	/// One point at a time; a full leaf pushes its newest point into a child.
	Streaming,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TilerOptions {
	pub max_tile_points: usize,
	/// Blend between uniform (0) and inverse-density (1) weighting.
	pub beta: f64,
	/// Exponent applied to the inverse density.
	pub alpha: f64,
	/// Share of each sample drawn uniformly over the node's bounding box.
	pub spatial_fraction: f64,
	/// The k in the k-th nearest neighbour density proxy.
	pub density_neighbors: usize,
	pub max_depth: u32,
	pub build_mode: BuildMode,
	pub upload_attempts: u32,
	pub seed: Option<u64>,
	pub extent_size: f64,
	pub work_dir: PathBuf,
}

impl Default for TilerOptions {
	fn default() -> TilerOptions {
		TilerOptions {
			max_tile_points: 4000,
			beta: 0.05,
			alpha: 0.1,
			spatial_fraction: 1.0,
			density_neighbors: 8,
			max_depth: 32,
			build_mode: BuildMode::Batch,
			upload_attempts: 4,
			seed: None,
			extent_size: 100.0,
			work_dir: PathBuf::from("/tmp/tiles"),
		}
	}
}

impl TilerOptions {
	pub fn validate(&self) -> Result<()> {
		if self.max_tile_points == 0 {
			return Err(TilerError::Config("max_tile_points must be at least 1".to_string()));
		}
		if !(0.0..=1.0).contains(&self.beta) {
			return Err(TilerError::Config(format!("beta {} is outside [0, 1]", self.beta)));
		}
		if !(self.alpha >= 0.0) {
			return Err(TilerError::Config(format!("alpha {} must be non-negative", self.alpha)));
		}
		if !(0.0..=1.0).contains(&self.spatial_fraction) {
			return Err(TilerError::Config(format!(
				"spatial_fraction {} is outside [0, 1]",
				self.spatial_fraction
			)));
		}
		if self.max_depth > MAX_ADDRESS_DEPTH {
			return Err(TilerError::Config(format!(
				"max_depth {} exceeds the addressable depth {}",
				self.max_depth, MAX_ADDRESS_DEPTH
			)));
		}
		if self.density_neighbors == 0 {
			return Err(TilerError::Config("density_neighbors must be at least 1".to_string()));
		}
		if self.upload_attempts == 0 {
			return Err(TilerError::Config("upload_attempts must be at least 1".to_string()));
		}
		if !(self.extent_size > 0.0) {
			return Err(TilerError::Config(format!(
				"extent_size {} must be positive",
				self.extent_size
			)));
		}
		Ok(())
	}

	pub fn root_center(&self) -> [f64; 2] {
		[self.extent_size / 2.0, self.extent_size / 2.0]
	}

	pub fn root_half_extent(&self) -> f64 {
		self.extent_size / 2.0
	}
}

/// A complete tiling run as read from the command line's JSON config.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RunConfig {
	pub projection_id: String,
	/// Directory holding the source row shards and, by default, `xy.arrow`.
	pub run_dir: PathBuf,
	/// Point file; defaults to `xy.arrow` inside `run_dir`.
	#[serde(default)]
	pub points_path: Option<PathBuf>,
	/// Root of the local object store.
	pub store_dir: PathBuf,
	pub vector_column: String,
	pub primary_key_column: String,
	#[serde(default)]
	pub options: TilerOptions,
}

impl RunConfig {
	pub fn from_reader<R: std::io::Read>(reader: R) -> Result<RunConfig> {
		let config: RunConfig = serde_json::from_reader(reader)?;
		config.options.validate()?;
		Ok(config)
	}

	pub fn points_path(&self) -> PathBuf {
		match &self.points_path {
			Some(path) => path.clone(),
			None => self.run_dir.join(crate::row_store::POINTS_FILE),
		}
	}
}
