pub mod batch;
pub mod node;
pub mod streaming;

pub use batch::BatchBuilder;
pub use node::QuadTreeNode;
pub use streaming::{StreamingBuilder, StreamingQuadTree};

use log::info;

use crate::error::Result;
use crate::model::options::{BuildMode, TilerOptions};
use crate::model::point::Point;

/// A strategy for turning a point population into a quadtree.
pub trait TreeBuilder {
	fn build(&mut self, points: Vec<Point>, center: [f64; 2], half_extent: f64) -> Result<QuadTreeNode>;
}

/// Builds the tree over the configured extent with the configured strategy.
pub fn build_tree(points: Vec<Point>, options: &TilerOptions) -> Result<QuadTreeNode> {
	let center = options.root_center();
	let half_extent = options.root_half_extent();
	let population = points.len();

	let root = match options.build_mode {
		BuildMode::Batch => BatchBuilder::from_options(options).build(points, center, half_extent)?,
		BuildMode::Streaming => StreamingBuilder::from_options(options).build(points, center, half_extent)?,
	};

	info!(
		"built {:?} quadtree over {} points: {} nodes, depth {}",
		options.build_mode,
		population,
		root.num_nodes(),
		root.tree_depth()
	);
	Ok(root)
}
