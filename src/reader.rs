use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::ipc::reader::FileReader;
use byteorder::{LittleEndian, ReadBytesExt};
use csv::Reader;
use log::info;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::error::{Result, TilerError};
use crate::model::point::Point;

pub const ROW_INDEX_COLUMN: &str = "row-index";

/// Size of one packed `f32, f32, u32` point record.
const RECORD_SIZE: u64 = 12;

#[derive(Debug, Deserialize)]
struct CsvPoint {
	x: f64,
	y: f64,
	row_index: u64,
}

pub fn read_points_csv(buf: &[u8]) -> Result<Vec<Point>> {
	let mut rdr = Reader::from_reader(buf);
	let mut points = Vec::new();
	for result in rdr.deserialize() {
		let CsvPoint { x, y, row_index } = result?;
		points.push(Point::new(x, y, row_index));
	}
	Ok(points)
}

/// Little-endian `x: f32, y: f32, row_index: u32` records, back to back.
pub fn read_points_bin(buf: &[u8]) -> Result<Vec<Point>> {
	let size = buf.len() as u64;
	if size % RECORD_SIZE != 0 {
		return Err(TilerError::Schema(format!(
			"point buffer of {} bytes is not a whole number of {} byte records",
			size, RECORD_SIZE
		)));
	}

	let mut points = Vec::with_capacity((size / RECORD_SIZE) as usize);
	let mut rdr = Cursor::new(buf);
	while rdr.position() < size {
		let x = rdr.read_f32::<LittleEndian>()?;
		let y = rdr.read_f32::<LittleEndian>()?;
		let row_index = rdr.read_u32::<LittleEndian>()?;
		points.push(Point::new(f64::from(x), f64::from(y), u64::from(row_index)));
	}
	Ok(points)
}

/// Reads an Arrow IPC point file with `x`, `y` and `row-index` columns.
pub fn read_points_arrow(path: &Path) -> Result<Vec<Point>> {
	let reader = FileReader::try_new(BufReader::new(File::open(path)?), None)?;
	let mut points = Vec::new();
	for batch in reader {
		let batch = batch?;
		let column = |name: &str| {
			batch
				.column_by_name(name)
				.ok_or_else(|| TilerError::Schema(format!("{} has no {} column", path.display(), name)))
		};
		let x = cast(column("x")?, &DataType::Float64)?;
		let y = cast(column("y")?, &DataType::Float64)?;
		let row_index = cast(column(ROW_INDEX_COLUMN)?, &DataType::Int64)?;
		if x.null_count() + y.null_count() + row_index.null_count() > 0 {
			return Err(TilerError::Schema(format!("{} contains null point values", path.display())));
		}

		let x = x.as_primitive::<Float64Type>();
		let y = y.as_primitive::<Float64Type>();
		let row_index = row_index.as_primitive::<Int64Type>();
		for i in 0..batch.num_rows() {
			let index = u64::try_from(row_index.value(i))
				.map_err(|_| TilerError::Schema(format!("negative row index {}", row_index.value(i))))?;
			points.push(Point::new(x.value(i), y.value(i), index));
		}
	}
	info!("read {} points from {}", points.len(), path.display());
	Ok(points)
}

/// Picks a reader by file extension: `.csv`, `.bin` or Arrow IPC otherwise.
pub fn read_points_file(path: &Path) -> Result<Vec<Point>> {
	match path.extension().and_then(|e| e.to_str()) {
		Some("csv") => read_points_csv(&fs::read(path)?),
		Some("bin") => read_points_bin(&fs::read(path)?),
		_ => read_points_arrow(path),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::write_ipc;
	use arrow::array::{Float32Array, Int32Array};
	use arrow::datatypes::{Field, Schema};
	use arrow::record_batch::RecordBatch;
	use byteorder::WriteBytesExt;
	use std::sync::Arc;

	#[test]
	fn reads_csv_points() {
		let csv = "x,y,row_index\n1.5,2.5,0\n10,20,1\n99.9,0.1,2\n";
		let points = read_points_csv(csv.as_bytes()).unwrap();
		assert_eq!(points.len(), 3);
		assert_eq!(points[1], Point::new(10.0, 20.0, 1));
	}

	#[test]
	fn malformed_csv_is_an_error() {
		let csv = "x,y,row_index\n1.5,abc,0\n";
		assert!(matches!(read_points_csv(csv.as_bytes()), Err(TilerError::Csv(_))));
	}

	#[test]
	fn reads_packed_records() {
		let mut buf = Vec::new();
		for (x, y, i) in [(1.0f32, 2.0f32, 7u32), (50.5, 75.25, 8)] {
			buf.write_f32::<LittleEndian>(x).unwrap();
			buf.write_f32::<LittleEndian>(y).unwrap();
			buf.write_u32::<LittleEndian>(i).unwrap();
		}
		let points = read_points_bin(&buf).unwrap();
		assert_eq!(points, vec![Point::new(1.0, 2.0, 7), Point::new(50.5, 75.25, 8)]);

		assert!(read_points_bin(&buf[..13]).is_err());
	}

	#[test]
	fn reads_arrow_point_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("xy.arrow");
		let schema = Schema::new(vec![
			Field::new("x", DataType::Float32, false),
			Field::new("y", DataType::Float32, false),
			Field::new(ROW_INDEX_COLUMN, DataType::Int32, false),
		]);
		let batch = RecordBatch::try_new(
			Arc::new(schema),
			vec![
				Arc::new(Float32Array::from(vec![1.0, 2.0, 3.0])),
				Arc::new(Float32Array::from(vec![4.0, 5.0, 6.0])),
				Arc::new(Int32Array::from(vec![0, 1, 2])),
			],
		)
		.unwrap();
		write_ipc(&path, &batch);

		let points = read_points_file(&path).unwrap();
		assert_eq!(points.len(), 3);
		assert_eq!(points[2], Point::new(3.0, 6.0, 2));
	}

	#[test]
	fn negative_row_index_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("xy.arrow");
		let schema = Schema::new(vec![
			Field::new("x", DataType::Float32, false),
			Field::new("y", DataType::Float32, false),
			Field::new(ROW_INDEX_COLUMN, DataType::Int32, false),
		]);
		let batch = RecordBatch::try_new(
			Arc::new(schema),
			vec![
				Arc::new(Float32Array::from(vec![1.0])),
				Arc::new(Float32Array::from(vec![4.0])),
				Arc::new(Int32Array::from(vec![-1])),
			],
		)
		.unwrap();
		write_ipc(&path, &batch);

		assert!(matches!(read_points_arrow(&path), Err(TilerError::Schema(_))));
	}
}
