use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;

use crate::model::point::Point;
use crate::sampling::neighbors::NeighborIndex;

/// Snaps ideal sample coordinates onto real points of the population.
#[derive(Clone, Copy, Debug, Default)]
pub struct NearestRealPointProjector;

impl NearestRealPointProjector {
	/// Returns `min(target_count, points.len())` points with distinct row
	/// indices. Each ideal coordinate claims its nearest real point, first
	/// claim wins; any shortfall is backfilled uniformly from unclaimed points.
	pub fn project<R: Rng + ?Sized>(
		&self,
		ideal: &[[f64; 2]],
		points: &[Point],
		target_count: usize,
		rng: &mut R,
	) -> Vec<Point> {
		let target = target_count.min(points.len());
		if target == 0 {
			return Vec::new();
		}

		let index = NeighborIndex::new(points);
		let mut claimed: FxHashSet<u64> = FxHashSet::default();
		let mut sample = Vec::with_capacity(target);

		for coord in ideal {
			if sample.len() == target {
				break;
			}
			if let Some(position) = index.nearest(*coord) {
				let point = points[position];
				if claimed.insert(point.row_index) {
					sample.push(point);
				}
			}
		}

		if sample.len() < target {
			let unclaimed: Vec<&Point> = points
				.iter()
				.filter(|p| !claimed.contains(&p.row_index))
				.collect();
			let need = target - sample.len();
			sample.extend(unclaimed.choose_multiple(rng, need).map(|p| **p));
		}

		sample
	}
}
