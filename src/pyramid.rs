use log::{error, info};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use crate::digest::ColumnDigestAccumulator;
use crate::error::{Result, TilerError};
use crate::model::metadata::{ColorStats, Extent, PyramidMetadata, TileMetadata};
use crate::object_store::{put_with_retry, ObjectStore};

pub const METADATA_FILE: &str = "metadata.json";

pub fn metadata_key(prefix: &str) -> String {
	format!("{}/{}", prefix, METADATA_FILE)
}

/// Assembles the root `metadata.json` document from the materialized tile
/// tree and the finished column digests.
pub struct PyramidMetadataBuilder {
	extent_size: f64,
}

impl PyramidMetadataBuilder {
	pub fn new(extent_size: f64) -> PyramidMetadataBuilder {
		PyramidMetadataBuilder { extent_size }
	}

	pub fn build(&self, tiles: Vec<TileMetadata>, digests: &ColumnDigestAccumulator) -> PyramidMetadata {
		let mut index = BTreeMap::new();
		for tile in &tiles {
			tile.walk(&mut |t| {
				index.insert(t.tile_id.clone(), t.clone());
			});
		}

		// columns that never saw a value have no meaningful quantiles
		let color_stats = digests
			.columns()
			.filter(|(_, digest)| !digest.is_empty())
			.map(|(name, digest)| {
				(
					name.clone(),
					ColorStats {
						buckets: digest.deciles(),
					},
				)
			})
			.collect();

		PyramidMetadata {
			extent: Extent { size: self.extent_size },
			tiles: index,
			color_stats,
		}
	}
}

/// Writes `metadata.json` to the work directory and uploads it.
pub fn publish_metadata(
	metadata: &PyramidMetadata,
	work_dir: &Path,
	store: &dyn ObjectStore,
	prefix: &str,
	attempts: u32,
) -> Result<()> {
	fs::create_dir_all(work_dir)?;
	let path = work_dir.join(METADATA_FILE);
	let writer = BufWriter::new(File::create(&path)?);
	serde_json::to_writer_pretty(writer, metadata)?;
	put_with_retry(store, &path, &metadata_key(prefix), attempts)?;
	info!(
		"published {} with {} tiles, {} levels deep",
		metadata_key(prefix),
		metadata.tiles.len(),
		metadata.root().map_or(0, |root| root.max_depth())
	);
	Ok(())
}

/// Receives the terminal state of a run.
pub trait StatusSink {
	fn mark_live(&self, metadata: &PyramidMetadata, row_count: usize) -> Result<()>;

	fn mark_failed(&self, error: &TilerError);
}

/// Reports run status through the log.
#[derive(Default)]
pub struct LogStatus {
	pub projection_id: String,
}

impl LogStatus {
	pub fn new(projection_id: &str) -> LogStatus {
		LogStatus {
			projection_id: projection_id.to_string(),
		}
	}
}

impl StatusSink for LogStatus {
	fn mark_live(&self, metadata: &PyramidMetadata, row_count: usize) -> Result<()> {
		info!(
			"projection {} is live: {} points in {} tiles",
			self.projection_id,
			row_count,
			metadata.tiles.len()
		);
		Ok(())
	}

	fn mark_failed(&self, error: &TilerError) {
		error!("projection {} failed: {}", self.projection_id, error);
	}
}
