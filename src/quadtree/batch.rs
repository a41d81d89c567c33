use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashSet;

use crate::error::{Result, TilerError};
use crate::model::options::TilerOptions;
use crate::model::point::Point;
use crate::quadtree::node::QuadTreeNode;
use crate::quadtree::TreeBuilder;
use crate::sampling::{DensityWeightedSampler, NearestRealPointProjector};

/// Builds the tree from the whole population at once. An over-full node keeps
/// a density-aware sample of exactly `max_tile_points` real points and hands
/// everything else to its four children.
pub struct BatchBuilder {
	max_tile_points: usize,
	max_depth: u32,
	sampler: DensityWeightedSampler,
	projector: NearestRealPointProjector,
	rng: StdRng,
}

impl BatchBuilder {
	pub fn from_options(options: &TilerOptions) -> BatchBuilder {
		BatchBuilder {
			max_tile_points: options.max_tile_points,
			max_depth: options.max_depth,
			sampler: DensityWeightedSampler::from_options(options),
			projector: NearestRealPointProjector,
			rng: match options.seed {
				Some(seed) => StdRng::seed_from_u64(seed),
				None => StdRng::from_entropy(),
			},
		}
	}

	fn build_node(
		&mut self,
		points: Vec<Point>,
		center: [f64; 2],
		half_extent: f64,
		depth: u32,
	) -> Result<QuadTreeNode> {
		let mut node = QuadTreeNode::new(center, half_extent, depth);
		if points.len() <= self.max_tile_points {
			node.sample = points;
			return Ok(node);
		}
		if depth >= self.max_depth {
			return Err(TilerError::DegenerateGeometry {
				depth,
				population: points.len(),
			});
		}

		let ideal = self.sampler.sample(&points, self.max_tile_points, &mut self.rng)?;
		let sample = self
			.projector
			.project(&ideal, &points, self.max_tile_points, &mut self.rng);
		let sampled: FxHashSet<u64> = sample.iter().map(|p| p.row_index).collect();

		let mut quadrants: [Vec<Point>; 4] = Default::default();
		for point in points {
			if !sampled.contains(&point.row_index) {
				quadrants[node.find_quadrant(point.x, point.y)].push(point);
			}
		}
		debug!(
			"node depth {} at {:?}: sampled {}, quadrants {:?}",
			depth,
			center,
			sample.len(),
			quadrants.iter().map(|q| q.len()).collect::<Vec<_>>()
		);
		node.sample = sample;

		let child_half_extent = half_extent / 2.0;
		let [lower_left, upper_left, lower_right, upper_right] = quadrants;
		let children = [
			self.build_node(lower_left, node.child_center(0), child_half_extent, depth + 1)?,
			self.build_node(upper_left, node.child_center(1), child_half_extent, depth + 1)?,
			self.build_node(lower_right, node.child_center(2), child_half_extent, depth + 1)?,
			self.build_node(upper_right, node.child_center(3), child_half_extent, depth + 1)?,
		];
		node.set_children(children);

		Ok(node)
	}
}

impl TreeBuilder for BatchBuilder {
	fn build(&mut self, points: Vec<Point>, center: [f64; 2], half_extent: f64) -> Result<QuadTreeNode> {
		self.build_node(points, center, half_extent, 0)
	}
}
