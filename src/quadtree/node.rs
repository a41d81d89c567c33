use crate::error::Result;
use crate::model::bounds::Bounds;
use crate::model::point::Point;
use crate::model::tile_address::TileAddress;

/// One quadrant of the pyramid. Children are either absent or exactly four,
/// ordered `[lower-left, upper-left, lower-right, upper-right]`.
#[derive(Clone, Debug)]
pub struct QuadTreeNode {
	pub center: [f64; 2],
	/// Distance from the center to each edge.
	pub half_extent: f64,
	pub depth: u32,
	pub sample: Vec<Point>,
	children: Vec<QuadTreeNode>,
}

impl QuadTreeNode {
	pub fn new(center: [f64; 2], half_extent: f64, depth: u32) -> QuadTreeNode {
		QuadTreeNode {
			center,
			half_extent,
			depth,
			sample: Vec::new(),
			children: Vec::new(),
		}
	}

	pub fn is_leaf_node(&self) -> bool {
		self.children.is_empty()
	}

	pub fn children(&self) -> &[QuadTreeNode] {
		&self.children
	}

	pub(crate) fn child_mut(&mut self, quadrant: usize) -> &mut QuadTreeNode {
		&mut self.children[quadrant]
	}

	pub fn bounds(&self) -> Bounds {
		Bounds::around(self.center, self.half_extent)
	}

	/// Quadrant index for a coordinate. Points on the center lines go to the
	/// lower/left side.
	pub fn find_quadrant(&self, x: f64, y: f64) -> usize {
		let right = x > self.center[0];
		let upper = y > self.center[1];
		match (right, upper) {
			(false, false) => 0,
			(false, true) => 1,
			(true, false) => 2,
			(true, true) => 3,
		}
	}

	pub fn child_center(&self, quadrant: usize) -> [f64; 2] {
		let offset = self.half_extent / 2.0;
		let dx = if quadrant >= 2 { offset } else { -offset };
		let dy = if quadrant % 2 == 1 { offset } else { -offset };
		[self.center[0] + dx, self.center[1] + dy]
	}

	pub fn new_child_node(&self, quadrant: usize) -> QuadTreeNode {
		QuadTreeNode::new(
			self.child_center(quadrant),
			self.half_extent / 2.0,
			self.depth + 1,
		)
	}

	/// Allocates four empty children. The node's own sample is left untouched.
	pub(crate) fn split(&mut self) {
		self.children = (0..4).map(|quadrant| self.new_child_node(quadrant)).collect();
	}

	pub(crate) fn set_children(&mut self, children: [QuadTreeNode; 4]) {
		self.children = Vec::from(children);
	}

	/// Points held by this node and all of its descendants.
	pub fn num_points(&self) -> usize {
		self.sample.len() + self.children.iter().map(|c| c.num_points()).sum::<usize>()
	}

	pub fn num_nodes(&self) -> usize {
		1 + self.children.iter().map(|c| c.num_nodes()).sum::<usize>()
	}

	pub fn tree_depth(&self) -> u32 {
		self.children
			.iter()
			.map(|c| c.tree_depth())
			.max()
			.unwrap_or(self.depth)
	}

	/// Pre-order walk, handing each node its tile address.
	pub fn traverse<'a>(
		&'a self,
		address: TileAddress,
		visit: &mut impl FnMut(&'a QuadTreeNode, TileAddress),
	) -> Result<()> {
		visit(self, address);
		for (quadrant, child) in self.children.iter().enumerate() {
			child.traverse(address.child(quadrant)?, visit)?;
		}
		Ok(())
	}
}
