use thiserror::Error;

pub type Result<T> = std::result::Result<T, TilerError>;

#[derive(Error, Debug)]
pub enum TilerError {
	#[error("point set is empty")]
	EmptyInput,

	#[error("point for row {row_index} has a non-finite coordinate")]
	NonFiniteCoordinate { row_index: u64 },

	#[error("tile {address} is too deep for its children to be addressed")]
	AddressOverflow { address: String },

	#[error("row index {row_index} appears more than once in the point set")]
	DuplicateRowIndex { row_index: u64 },

	#[error("{population} points cannot be separated below depth {depth}")]
	DegenerateGeometry { depth: u32, population: usize },

	#[error("row index {row_index} is not in the row store ({row_count} rows)")]
	MissingRow { row_index: u64, row_count: usize },

	#[error("upload of {key} failed after {attempts} attempts: {source}")]
	Upload {
		key: String,
		attempts: u32,
		#[source]
		source: std::io::Error,
	},

	#[error("schema error: {0}")]
	Schema(String),

	#[error("configuration error: {0}")]
	Config(String),

	#[error("sampling error: {0}")]
	Sampling(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Arrow error: {0}")]
	Arrow(#[from] arrow::error::ArrowError),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),
}
