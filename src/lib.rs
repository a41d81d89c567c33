pub mod digest;
pub mod error;
pub mod materializer;
pub mod model;
pub mod object_store;
pub mod pipeline;
pub mod pyramid;
pub mod quadtree;
pub mod reader;
pub mod row_store;
pub mod sampling;
pub mod schema;

#[cfg(test)]
mod test_support;

pub use error::{Result, TilerError};
pub use model::options::{BuildMode, RunConfig, TilerOptions};
pub use pipeline::{run, validate_points, PyramidJob, PyramidRun};
