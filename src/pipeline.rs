use log::info;
use rustc_hash::FxHashSet;

use crate::error::{Result, TilerError};
use crate::materializer::TileMaterializer;
use crate::model::metadata::PyramidMetadata;
use crate::model::options::TilerOptions;
use crate::model::point::Point;
use crate::object_store::ObjectStore;
use crate::pyramid::{publish_metadata, PyramidMetadataBuilder, StatusSink};
use crate::quadtree::build_tree;
use crate::row_store::RowStore;
use crate::schema::OutputSchema;

/// Identifies one projection and the columns that shape its tiles.
#[derive(Clone, Debug)]
pub struct PyramidJob {
	pub projection_id: String,
	pub vector_column: String,
	pub primary_key_column: String,
}

#[derive(Clone, Debug)]
pub struct PyramidRun {
	pub metadata: PyramidMetadata,
	pub tile_count: usize,
	pub row_count: usize,
}

/// Rejects point sets that cannot produce a pyramid, before anything is built.
pub fn validate_points(points: &[Point]) -> Result<()> {
	if points.is_empty() {
		return Err(TilerError::EmptyInput);
	}
	let mut seen = FxHashSet::default();
	for point in points {
		if !point.is_finite() {
			return Err(TilerError::NonFiniteCoordinate {
				row_index: point.row_index,
			});
		}
		if !seen.insert(point.row_index) {
			return Err(TilerError::DuplicateRowIndex {
				row_index: point.row_index,
			});
		}
	}
	Ok(())
}

/// Builds, materializes and publishes one pyramid. The status sink hears about
/// the outcome exactly once.
pub fn run(
	job: &PyramidJob,
	points: Vec<Point>,
	row_store: &dyn RowStore,
	object_store: &dyn ObjectStore,
	status: &dyn StatusSink,
	options: &TilerOptions,
) -> Result<PyramidRun> {
	let result = run_inner(job, points, row_store, object_store, options)
		.and_then(|run| status.mark_live(&run.metadata, run.row_count).map(|_| run));
	if let Err(e) = &result {
		status.mark_failed(e);
	}
	result
}

fn run_inner(
	job: &PyramidJob,
	points: Vec<Point>,
	row_store: &dyn RowStore,
	object_store: &dyn ObjectStore,
	options: &TilerOptions,
) -> Result<PyramidRun> {
	options.validate()?;
	validate_points(&points)?;
	let schema = OutputSchema::derive(&row_store.schema(), &job.vector_column, &job.primary_key_column)?;

	info!(
		"tiling projection {}: {} points, {} rows",
		job.projection_id,
		points.len(),
		row_store.count_rows()
	);
	let root = build_tree(points, options)?;

	let mut materializer = TileMaterializer::new(row_store, object_store, schema, options, &job.projection_id);
	let tiles = materializer.materialize(&root)?;
	let tile_count = materializer.tiles_written();
	let digests = materializer.into_digests();

	let metadata = PyramidMetadataBuilder::new(options.extent_size).build(tiles, &digests);
	publish_metadata(
		&metadata,
		&options.work_dir,
		object_store,
		&job.projection_id,
		options.upload_attempts,
	)?;

	Ok(PyramidRun {
		metadata,
		tile_count,
		row_count: row_store.count_rows(),
	})
}
