use crate::error::{Result, TilerError};
use crate::model::options::TilerOptions;
use crate::model::point::Point;
use crate::quadtree::node::QuadTreeNode;
use crate::quadtree::TreeBuilder;

/// Insertion-ordered tree. A leaf keeps the first `max_tile_points` points it
/// receives; the point that overflows it is pushed into a newly allocated
/// child and every later point routes straight to the children. Resident
/// points of a split node stay where they are.
pub struct StreamingQuadTree {
	root: QuadTreeNode,
	max_tile_points: usize,
	max_depth: u32,
	len: usize,
}

impl StreamingQuadTree {
	pub fn new(center: [f64; 2], half_extent: f64, max_tile_points: usize, max_depth: u32) -> StreamingQuadTree {
		StreamingQuadTree {
			root: QuadTreeNode::new(center, half_extent, 0),
			max_tile_points,
			max_depth,
			len: 0,
		}
	}

	pub fn insert(&mut self, point: Point) -> Result<()> {
		let mut node = &mut self.root;
		while !node.is_leaf_node() {
			let quadrant = node.find_quadrant(point.x, point.y);
			node = node.child_mut(quadrant);
		}

		if node.sample.len() >= self.max_tile_points && node.depth >= self.max_depth {
			return Err(TilerError::DegenerateGeometry {
				depth: node.depth,
				population: node.sample.len() + 1,
			});
		}

		node.sample.push(point);
		if node.sample.len() > self.max_tile_points {
			node.split();
			node.sample.pop();
			let quadrant = node.find_quadrant(point.x, point.y);
			node.child_mut(quadrant).sample.push(point);
		}

		self.len += 1;
		Ok(())
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn root(&self) -> &QuadTreeNode {
		&self.root
	}

	pub fn into_root(self) -> QuadTreeNode {
		self.root
	}
}

/// Adapts [`StreamingQuadTree`] to the [`TreeBuilder`] interface by inserting
/// points in the order given.
pub struct StreamingBuilder {
	max_tile_points: usize,
	max_depth: u32,
}

impl StreamingBuilder {
	pub fn from_options(options: &TilerOptions) -> StreamingBuilder {
		StreamingBuilder {
			max_tile_points: options.max_tile_points,
			max_depth: options.max_depth,
		}
	}
}

impl TreeBuilder for StreamingBuilder {
	fn build(&mut self, points: Vec<Point>, center: [f64; 2], half_extent: f64) -> Result<QuadTreeNode> {
		let mut tree = StreamingQuadTree::new(center, half_extent, self.max_tile_points, self.max_depth);
		for point in points {
			tree.insert(point)?;
		}
		Ok(tree.into_root())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::quadtree::tests::{assert_capacity, assert_partition, assert_quadrants, random_points};

	#[test]
	fn only_the_overflowing_point_moves() {
		let mut tree = StreamingQuadTree::new([50.0, 50.0], 50.0, 3, 32);
		for (i, (x, y)) in [(10.0, 10.0), (90.0, 90.0), (10.0, 90.0)].iter().enumerate() {
			tree.insert(Point::new(*x, *y, i as u64)).unwrap();
		}
		assert!(tree.root().is_leaf_node());

		tree.insert(Point::new(80.0, 20.0, 3)).unwrap();
		let root = tree.root();
		assert_eq!(
			root.sample.iter().map(|p| p.row_index).collect::<Vec<_>>(),
			vec![0, 1, 2]
		);
		assert_eq!(root.children()[2].sample, vec![Point::new(80.0, 20.0, 3)]);
		assert_eq!(root.num_points(), 4);
	}

	#[test]
	fn later_points_bypass_the_split_node() {
		let mut tree = StreamingQuadTree::new([50.0, 50.0], 50.0, 2, 32);
		for i in 0..3 {
			tree.insert(Point::new(10.0 + i as f64, 10.0, i)).unwrap();
		}
		tree.insert(Point::new(60.0, 60.0, 3)).unwrap();
		let root = tree.root();
		assert_eq!(root.sample.len(), 2);
		assert_eq!(root.children()[0].sample.len(), 1);
		assert_eq!(root.children()[3].sample.len(), 1);
		assert_eq!(tree.len(), 4);
	}

	#[test]
	fn invariants_hold_on_random_input() {
		let points = random_points(2500, 11);
		let root = StreamingBuilder { max_tile_points: 50, max_depth: 32 }
			.build(points.clone(), [50.0, 50.0], 50.0)
			.unwrap();
		assert_partition(&root, &points);
		assert_capacity(&root, 50);
		assert_quadrants(&root);
	}

	#[test]
	fn coincident_points_hit_the_depth_guard() {
		let mut tree = StreamingQuadTree::new([50.0, 50.0], 50.0, 4, 5);
		let mut result = Ok(());
		for i in 0..100 {
			result = tree.insert(Point::new(70.0, 70.0, i));
			if result.is_err() {
				break;
			}
		}
		assert!(matches!(
			result,
			Err(TilerError::DegenerateGeometry { depth: 5, population: 5 })
		));
		assert_eq!(tree.len(), 24);
	}
}
