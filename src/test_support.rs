//! Fixtures shared by the unit tests.

use arrow::array::{
	Decimal128Array, FixedSizeListArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Float32Type, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::error::TilerError;
use crate::materializer::write_arrow_file;
use crate::model::metadata::PyramidMetadata;
use crate::object_store::ObjectStore;
use crate::pyramid::StatusSink;

pub fn source_schema() -> Schema {
	Schema::new(vec![
		Field::new("id", DataType::Int64, false),
		Field::new(
			"embedding",
			DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), 2),
			true,
		),
		Field::new("name", DataType::Utf8, true),
		Field::new("score", DataType::Float64, true),
		Field::new("price", DataType::Decimal128(10, 2), true),
		Field::new("created", DataType::Timestamp(TimeUnit::Microsecond, None), true),
	])
}

/// `rows` source rows: id `1000 + i`, score `i`, price `12.50 + i/100`,
/// created `1.5s + i ms` except row 1, which has no timestamp.
pub fn source_batch(rows: usize) -> RecordBatch {
	let embedding = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
		(0..rows).map(|i| Some(vec![Some(i as f32), Some(-(i as f32))])),
		2,
	);
	let price = Decimal128Array::from((0..rows).map(|i| Some(1250 + i as i128)).collect::<Vec<_>>())
		.with_precision_and_scale(10, 2)
		.unwrap();
	RecordBatch::try_new(
		Arc::new(source_schema()),
		vec![
			Arc::new(Int64Array::from((0..rows).map(|i| 1000 + i as i64).collect::<Vec<_>>())),
			Arc::new(embedding),
			Arc::new(StringArray::from(
				(0..rows).map(|i| Some(format!("row{}", i))).collect::<Vec<_>>(),
			)),
			Arc::new(Float64Array::from((0..rows).map(|i| i as f64).collect::<Vec<_>>())),
			Arc::new(price),
			Arc::new(TimestampMicrosecondArray::from(
				(0..rows)
					.map(|i| if i == 1 { None } else { Some(1_500_000 + 1000 * i as i64) })
					.collect::<Vec<_>>(),
			)),
		],
	)
	.unwrap()
}

pub fn write_ipc(path: &Path, batch: &RecordBatch) {
	write_arrow_file(path, batch).unwrap();
}

/// Keeps uploaded payloads in memory, keyed by object key.
#[derive(Default)]
pub struct MemoryStore {
	objects: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
	pub fn keys(&self) -> Vec<String> {
		self.objects.borrow().keys().cloned().collect()
	}

	pub fn get(&self, key: &str) -> Option<Vec<u8>> {
		self.objects.borrow().get(key).cloned()
	}
}

impl ObjectStore for MemoryStore {
	fn put(&self, local: &Path, key: &str) -> io::Result<()> {
		let bytes = fs::read(local)?;
		self.objects.borrow_mut().insert(key.to_string(), bytes);
		Ok(())
	}
}

/// Fails the first `failures` calls, then records keys without reading files.
pub struct FlakyStore {
	failures: Cell<u32>,
	calls: Cell<u32>,
	keys: RefCell<Vec<String>>,
}

impl FlakyStore {
	pub fn new(failures: u32) -> FlakyStore {
		FlakyStore {
			failures: Cell::new(failures),
			calls: Cell::new(0),
			keys: RefCell::new(Vec::new()),
		}
	}

	pub fn calls(&self) -> u32 {
		self.calls.get()
	}

	pub fn keys(&self) -> Vec<String> {
		self.keys.borrow().clone()
	}
}

impl ObjectStore for FlakyStore {
	fn put(&self, _local: &Path, key: &str) -> io::Result<()> {
		self.calls.set(self.calls.get() + 1);
		if self.failures.get() > 0 {
			self.failures.set(self.failures.get() - 1);
			return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
		}
		self.keys.borrow_mut().push(key.to_string());
		Ok(())
	}
}

#[derive(Debug, PartialEq)]
pub enum StatusEvent {
	Live { tiles: usize, row_count: usize },
	Failed(String),
}

#[derive(Default)]
pub struct RecordingStatus {
	pub events: RefCell<Vec<StatusEvent>>,
}

impl StatusSink for RecordingStatus {
	fn mark_live(&self, metadata: &PyramidMetadata, row_count: usize) -> crate::error::Result<()> {
		self.events.borrow_mut().push(StatusEvent::Live {
			tiles: metadata.tiles.len(),
			row_count,
		});
		Ok(())
	}

	fn mark_failed(&self, error: &TilerError) {
		self.events.borrow_mut().push(StatusEvent::Failed(error.to_string()));
	}
}
