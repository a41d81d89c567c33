use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, TimestampMillisecondType};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeMap;
use tdigest::TDigest;

use crate::error::{Result, TilerError};
use crate::schema::{ColumnKind, OutputSchema};

const DIGEST_SIZE: usize = 100;
const FLUSH_THRESHOLD: usize = 4096;

/// Streaming quantile estimate for one column. Values are buffered and folded
/// into the t-digest in chunks.
#[derive(Clone, Debug)]
pub struct ColumnDigest {
	digest: TDigest,
	pending: Vec<f64>,
	count: u64,
}

impl Default for ColumnDigest {
	fn default() -> ColumnDigest {
		ColumnDigest::new()
	}
}

impl ColumnDigest {
	pub fn new() -> ColumnDigest {
		ColumnDigest {
			digest: TDigest::new_with_size(DIGEST_SIZE),
			pending: Vec::with_capacity(FLUSH_THRESHOLD),
			count: 0,
		}
	}

	/// Adds one value. NaN and infinities are ignored.
	pub fn update(&mut self, value: f64) {
		if !value.is_finite() {
			return;
		}
		self.pending.push(value);
		self.count += 1;
		if self.pending.len() >= FLUSH_THRESHOLD {
			self.flush();
		}
	}

	pub fn flush(&mut self) {
		if !self.pending.is_empty() {
			let values = std::mem::take(&mut self.pending);
			self.digest = self.digest.merge_unsorted(values);
		}
	}

	pub fn count(&self) -> u64 {
		self.count
	}

	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	/// Estimated value at percentile `p` in `[0, 100]`.
	pub fn percentile(&self, p: f64) -> f64 {
		let q = (p / 100.0).clamp(0.0, 1.0);
		if self.pending.is_empty() {
			self.digest.estimate_quantile(q)
		} else {
			self.digest.merge_unsorted(self.pending.clone()).estimate_quantile(q)
		}
	}

	/// Percentiles 0, 10, ..., 100.
	pub fn deciles(&self) -> Vec<f64> {
		let digest = if self.pending.is_empty() {
			self.digest.clone()
		} else {
			self.digest.merge_unsorted(self.pending.clone())
		};
		(0..=10)
			.map(|decile| digest.estimate_quantile(decile as f64 / 10.0))
			.collect()
	}
}

/// One [`ColumnDigest`] per digestible output column, created once per run and
/// fed every materialized row exactly once.
#[derive(Clone, Debug, Default)]
pub struct ColumnDigestAccumulator {
	columns: BTreeMap<String, ColumnDigest>,
	/// Output name to source name for decimals, read before their `f32` narrowing.
	decimal_sources: BTreeMap<String, String>,
	rows: u64,
}

impl ColumnDigestAccumulator {
	pub fn for_schema(schema: &OutputSchema) -> ColumnDigestAccumulator {
		ColumnDigestAccumulator {
			columns: schema
				.digest_columns()
				.map(|column| (column.output.clone(), ColumnDigest::new()))
				.collect(),
			decimal_sources: schema
				.digest_columns()
				.filter(|column| column.kind == ColumnKind::Decimal)
				.map(|column| (column.output.clone(), column.source.clone()))
				.collect(),
			rows: 0,
		}
	}

	#[cfg(test)]
	pub(crate) fn update(&mut self, column: &str, value: f64) {
		if let Some(digest) = self.columns.get_mut(column) {
			digest.update(value);
		}
	}

	/// Feeds every row of a tile: `tile` is the projected batch and `rows`
	/// the source rows it was projected from. Nulls are skipped.
	pub fn update_batch(&mut self, tile: &RecordBatch, rows: &RecordBatch) -> Result<()> {
		for (name, digest) in self.columns.iter_mut() {
			let column = match self.decimal_sources.get(name) {
				Some(source) => rows.column_by_name(source),
				None => tile.column_by_name(name),
			}
			.ok_or_else(|| TilerError::Schema(format!("tile batch is missing digest column {}", name)))?;
			for value in column_values(column)?.into_iter().flatten() {
				digest.update(value);
			}
		}
		self.rows += tile.num_rows() as u64;
		Ok(())
	}

	pub fn get(&self, column: &str) -> Option<&ColumnDigest> {
		self.columns.get(column)
	}

	pub fn columns(&self) -> impl Iterator<Item = (&String, &ColumnDigest)> {
		self.columns.iter()
	}

	/// Rows seen across all tiles.
	pub fn rows(&self) -> u64 {
		self.rows
	}

	pub fn flush(&mut self) {
		for digest in self.columns.values_mut() {
			digest.flush();
		}
	}
}

/// Column values as `f64`; timestamps become epoch milliseconds.
fn column_values(column: &ArrayRef) -> Result<Vec<Option<f64>>> {
	match column.data_type() {
		DataType::Timestamp(_, _) => {
			let millis = column
				.as_primitive_opt::<TimestampMillisecondType>()
				.ok_or_else(|| TilerError::Schema("timestamp column is not in milliseconds".to_string()))?;
			Ok(millis.iter().map(|v| v.map(|ms| ms as f64)).collect())
		}
		_ => {
			let floats = cast(column, &DataType::Float64)?;
			Ok(floats.as_primitive::<Float64Type>().iter().collect())
		}
	}
}
