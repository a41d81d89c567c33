use arrow::array::{ArrayRef, AsArray, Float32Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit, TimestampMillisecondType};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::error::{Result, TilerError};
use crate::model::point::Point;

pub const X_COLUMN: &str = "x";
pub const Y_COLUMN: &str = "y";
pub const KEY_COLUMN: &str = "ix";
pub const USER_PREFIX: &str = "user_";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
	/// The source primary key, emitted as `ix` with its original type.
	Key,
	/// Any timestamp, normalized to milliseconds.
	Timestamp,
	/// Decimals, narrowed to `float32`.
	Decimal,
	Passthrough,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnMapping {
	pub source: String,
	pub output: String,
	pub kind: ColumnKind,
	pub data_type: DataType,
	/// Whether a quantile digest is kept for this column.
	pub digestible: bool,
}

/// Tile schema derived once per run from the row store's schema:
/// `x: float32, y: float32, ix: <key type>, user_*: ...`.
#[derive(Clone, Debug)]
pub struct OutputSchema {
	schema: SchemaRef,
	columns: Vec<ColumnMapping>,
}

impl OutputSchema {
	pub fn derive(source: &Schema, vector_column: &str, primary_key_column: &str) -> Result<OutputSchema> {
		if source.field_with_name(primary_key_column).is_err() {
			return Err(TilerError::Schema(format!(
				"primary key column {} is not in the row store",
				primary_key_column
			)));
		}

		let mut fields = vec![
			Field::new(X_COLUMN, DataType::Float32, false),
			Field::new(Y_COLUMN, DataType::Float32, false),
		];
		let mut columns = Vec::new();

		for field in source.fields() {
			let name = field.name();
			if name == vector_column {
				continue;
			}

			let (output, kind, data_type) = if name == primary_key_column {
				(KEY_COLUMN.to_string(), ColumnKind::Key, field.data_type().clone())
			} else {
				let output = format!("{}{}", USER_PREFIX, name);
				match field.data_type() {
					DataType::Timestamp(_, tz) => (
						output,
						ColumnKind::Timestamp,
						DataType::Timestamp(
							TimeUnit::Millisecond,
							Some(tz.clone().unwrap_or_else(|| "UTC".into())),
						),
					),
					DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => {
						(output, ColumnKind::Decimal, DataType::Float32)
					}
					other => (output, ColumnKind::Passthrough, other.clone()),
				}
			};

			let digestible = kind != ColumnKind::Key
				&& (data_type.is_integer()
					|| data_type.is_floating()
					|| matches!(data_type, DataType::Timestamp(_, _)));

			fields.push(Field::new(output.as_str(), data_type.clone(), field.is_nullable()));
			columns.push(ColumnMapping {
				source: name.to_string(),
				output,
				kind,
				data_type,
				digestible,
			});
		}

		Ok(OutputSchema {
			schema: Arc::new(Schema::new(fields)),
			columns,
		})
	}

	pub fn schema(&self) -> SchemaRef {
		self.schema.clone()
	}

	pub fn columns(&self) -> &[ColumnMapping] {
		&self.columns
	}

	pub fn digest_columns(&self) -> impl Iterator<Item = &ColumnMapping> {
		self.columns.iter().filter(|c| c.digestible)
	}

	/// Combines a tile's sample with the rows fetched for it, row `i` of
	/// `rows` belonging to `points[i]`.
	pub fn project(&self, rows: &RecordBatch, points: &[Point]) -> Result<RecordBatch> {
		if rows.num_rows() != points.len() {
			return Err(TilerError::Schema(format!(
				"fetched {} rows for {} points",
				rows.num_rows(),
				points.len()
			)));
		}

		let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len() + 2);
		arrays.push(Arc::new(Float32Array::from_iter_values(points.iter().map(|p| p.x as f32))));
		arrays.push(Arc::new(Float32Array::from_iter_values(points.iter().map(|p| p.y as f32))));

		for mapping in &self.columns {
			let column = rows.column_by_name(&mapping.source).ok_or_else(|| {
				TilerError::Schema(format!("row store batch is missing column {}", mapping.source))
			})?;
			let array = match mapping.kind {
				ColumnKind::Key | ColumnKind::Passthrough => column.clone(),
				ColumnKind::Timestamp => to_milliseconds(column, &mapping.data_type)?,
				ColumnKind::Decimal => cast(column, &mapping.data_type)?,
			};
			arrays.push(array);
		}

		Ok(RecordBatch::try_new(self.schema.clone(), arrays)?)
	}
}

/// Rescales a timestamp column to milliseconds in its own zone, then labels it
/// with the output zone. Naive timestamps are read as UTC.
fn to_milliseconds(column: &ArrayRef, output_type: &DataType) -> Result<ArrayRef> {
	let (source_tz, output_tz) = match (column.data_type(), output_type) {
		(DataType::Timestamp(_, source_tz), DataType::Timestamp(_, Some(output_tz))) => {
			(source_tz.clone(), output_tz.clone())
		}
		(other, _) => {
			return Err(TilerError::Schema(format!(
				"expected a timestamp column, found {}",
				other
			)))
		}
	};
	let millis = cast(column, &DataType::Timestamp(TimeUnit::Millisecond, source_tz))?;
	Ok(Arc::new(
		millis
			.as_primitive::<TimestampMillisecondType>()
			.clone()
			.with_timezone(output_tz),
	))
}
