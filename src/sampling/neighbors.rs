use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::model::point::Point;

type IndexedCoord = GeomWithData<[f64; 2], usize>;

/// Read-only nearest-neighbour index over a point population. Results are
/// positions into the slice the index was built from.
pub struct NeighborIndex {
	tree: RTree<IndexedCoord>,
}

impl NeighborIndex {
	pub fn new(points: &[Point]) -> NeighborIndex {
		let coords = points
			.iter()
			.enumerate()
			.map(|(position, point)| IndexedCoord::new(point.to_array(), position))
			.collect();
		NeighborIndex {
			tree: RTree::bulk_load(coords),
		}
	}

	pub fn len(&self) -> usize {
		self.tree.size()
	}

	pub fn is_empty(&self) -> bool {
		self.tree.size() == 0
	}

	pub fn nearest(&self, query: [f64; 2]) -> Option<usize> {
		self.tree.nearest_neighbor(&query).map(|coord| coord.data)
	}

	/// Positions of the `k` nearest coordinates, closest first.
	pub fn k_nearest(&self, query: [f64; 2], k: usize) -> Vec<usize> {
		self.tree
			.nearest_neighbor_iter(&query)
			.take(k)
			.map(|coord| coord.data)
			.collect()
	}

	/// Distance to the k-th closest coordinate, counting a coordinate equal to
	/// `query` itself. Falls back to the farthest one when fewer than `k` exist.
	pub fn kth_distance(&self, query: [f64; 2], k: usize) -> Option<f64> {
		self.tree
			.nearest_neighbor_iter_with_distance_2(&query)
			.take(k)
			.last()
			.map(|(_, distance_2)| distance_2.sqrt())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn grid() -> Vec<Point> {
		let mut points = Vec::new();
		for i in 0..5 {
			for j in 0..5 {
				points.push(Point::new(i as f64, j as f64, (i * 5 + j) as u64));
			}
		}
		points
	}

	#[test]
	fn nearest_returns_position() {
		let points = grid();
		let index = NeighborIndex::new(&points);
		assert_eq!(index.len(), 25);
		let position = index.nearest([3.1, 1.8]).unwrap();
		assert_eq!(points[position].row_index, 17);
	}

	#[test]
	fn k_nearest_is_ordered() {
		let points = grid();
		let index = NeighborIndex::new(&points);
		let found = index.k_nearest([0.0, 0.0], 3);
		assert_eq!(found.len(), 3);
		assert_eq!(points[found[0]].row_index, 0);
	}

	#[test]
	fn kth_distance_counts_the_query_point() {
		let points = grid();
		let index = NeighborIndex::new(&points);
		assert_eq!(index.kth_distance([0.0, 0.0], 1), Some(0.0));
		assert_eq!(index.kth_distance([0.0, 0.0], 2), Some(1.0));
		let far = index.kth_distance([0.0, 0.0], 100).unwrap();
		assert!((far - 32f64.sqrt()).abs() < 1e-9);
	}

	#[test]
	fn empty_index_finds_nothing() {
		let index = NeighborIndex::new(&[]);
		assert!(index.is_empty());
		assert_eq!(index.nearest([1.0, 1.0]), None);
		assert_eq!(index.kth_distance([1.0, 1.0], 8), None);
	}
}
