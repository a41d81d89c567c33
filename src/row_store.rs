use arrow::array::UInt64Array;
use arrow::compute::{concat_batches, take_record_batch};
use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::FileReader;
use arrow::record_batch::RecordBatch;
use log::info;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, TilerError};

/// Shard file in a run directory that holds the embedding, not row data.
pub const POINTS_FILE: &str = "xy.arrow";

/// Random access to source rows by row index. Implementations are read-only
/// and may be called concurrently.
pub trait RowStore: Send + Sync {
	fn schema(&self) -> SchemaRef;

	fn count_rows(&self) -> usize;

	/// Rows in the order of `indices`. An index the store cannot resolve is
	/// an error, never a skipped row.
	fn take(&self, indices: &[u64]) -> Result<RecordBatch>;
}

/// Rows held as the shards they were read from. Row indices run through the
/// shards in order; `offsets[i]` is the first row index of shard `i`.
pub struct ArrowRowStore {
	schema: SchemaRef,
	shards: Vec<RecordBatch>,
	offsets: Vec<usize>,
	row_count: usize,
}

impl ArrowRowStore {
	pub fn from_batches(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<ArrowRowStore> {
		let mut offsets = Vec::with_capacity(batches.len());
		let mut row_count = 0;
		let mut shards = Vec::with_capacity(batches.len());
		for batch in batches {
			if batch.schema().fields() != schema.fields() {
				return Err(TilerError::Schema(
					"row batch does not match the row store schema".to_string(),
				));
			}
			if batch.num_rows() == 0 {
				continue;
			}
			offsets.push(row_count);
			row_count += batch.num_rows();
			shards.push(batch);
		}
		Ok(ArrowRowStore {
			schema,
			shards,
			offsets,
			row_count,
		})
	}

	/// Loads Arrow IPC files in the given order; row indices follow that order.
	/// Columns named in `excluded` are dropped as each batch is read.
	pub fn open(paths: &[PathBuf], excluded: &[&str]) -> Result<ArrowRowStore> {
		let mut source: Option<SchemaRef> = None;
		let mut projection: Vec<usize> = Vec::new();
		let mut batches = Vec::new();
		for path in paths {
			let reader = FileReader::try_new(BufReader::new(File::open(path)?), None)?;
			match &source {
				None => {
					let schema = reader.schema();
					projection = (0..schema.fields().len())
						.filter(|&i| !excluded.contains(&schema.field(i).name().as_str()))
						.collect();
					source = Some(schema);
				}
				Some(expected) if expected.fields() != reader.schema().fields() => {
					return Err(TilerError::Schema(format!(
						"{} does not match the schema of the first shard",
						path.display()
					)));
				}
				Some(_) => {}
			}
			for batch in reader {
				batches.push(batch?.project(&projection)?);
			}
		}

		let source = source.ok_or_else(|| TilerError::Schema("no row shards to open".to_string()))?;
		let schema = Arc::new(source.project(&projection)?);
		let store = ArrowRowStore::from_batches(schema, batches)?;
		info!(
			"opened {} shards with {} rows in {} batches",
			paths.len(),
			store.count_rows(),
			store.shards.len()
		);
		Ok(store)
	}

	/// Opens every `*.arrow` shard in a run directory except the point file,
	/// sorted by file name.
	pub fn open_dir(dir: &Path, excluded: &[&str]) -> Result<ArrowRowStore> {
		let mut paths = Vec::new();
		for entry in fs::read_dir(dir)? {
			let path = entry?.path();
			let is_shard = path.extension().map_or(false, |ext| ext == "arrow")
				&& path.file_name().map_or(false, |name| name != POINTS_FILE);
			if is_shard {
				paths.push(path);
			}
		}
		paths.sort();
		ArrowRowStore::open(&paths, excluded)
	}

	/// Shard holding `row_index` and the row's position inside it.
	fn locate(&self, row_index: u64) -> Result<(usize, u64)> {
		if row_index >= self.row_count as u64 {
			return Err(TilerError::MissingRow {
				row_index,
				row_count: self.row_count,
			});
		}
		let row = row_index as usize;
		let shard = self.offsets.partition_point(|&offset| offset <= row) - 1;
		Ok((shard, (row - self.offsets[shard]) as u64))
	}
}

impl RowStore for ArrowRowStore {
	fn schema(&self) -> SchemaRef {
		self.schema.clone()
	}

	fn count_rows(&self) -> usize {
		self.row_count
	}

	fn take(&self, indices: &[u64]) -> Result<RecordBatch> {
		// gather per shard, then restore the requested order
		let mut local: Vec<Vec<u64>> = vec![Vec::new(); self.shards.len()];
		let mut slots = Vec::with_capacity(indices.len());
		for &row_index in indices {
			let (shard, row) = self.locate(row_index)?;
			slots.push((shard, local[shard].len()));
			local[shard].push(row);
		}

		let mut starts = vec![0; self.shards.len()];
		let mut taken = Vec::new();
		let mut gathered = 0;
		for (shard, rows) in local.into_iter().enumerate() {
			starts[shard] = gathered;
			if rows.is_empty() {
				continue;
			}
			gathered += rows.len();
			taken.push(take_record_batch(&self.shards[shard], &UInt64Array::from(rows))?);
		}

		let gathered = concat_batches(&self.schema, &taken)?;
		if taken.len() <= 1 {
			return Ok(gathered);
		}
		let order = UInt64Array::from_iter_values(slots.iter().map(|&(shard, slot)| (starts[shard] + slot) as u64));
		Ok(take_record_batch(&gathered, &order)?)
	}
}
