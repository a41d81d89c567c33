use rand::seq::SliceRandom;
use rand::Rng;
use std::f64::consts::PI;

use crate::error::{Result, TilerError};
use crate::model::bounds::find_bounds;
use crate::model::options::TilerOptions;
use crate::model::point::Point;
use crate::sampling::neighbors::NeighborIndex;

const DENSITY_EPSILON: f64 = 1e-12;

/// Picks "ideal" sample coordinates for an over-full node.
///
/// A share of the picks (`spatial_fraction`) is drawn uniformly over the
/// population's bounding box, which keeps sparse and empty regions visible.
/// The rest are real points drawn without replacement with probability
/// proportional to `(1 - beta) + beta * density^(-alpha)`, where density is
/// estimated from the distance to the k-th nearest neighbour.
#[derive(Clone, Debug)]
pub struct DensityWeightedSampler {
	pub neighbors: usize,
	pub beta: f64,
	pub alpha: f64,
	pub spatial_fraction: f64,
}

impl DensityWeightedSampler {
	pub fn from_options(options: &TilerOptions) -> DensityWeightedSampler {
		DensityWeightedSampler {
			neighbors: options.density_neighbors,
			beta: options.beta,
			alpha: options.alpha,
			spatial_fraction: options.spatial_fraction,
		}
	}

	/// Local density proxy `1 / (pi * r_k^2)` for every point.
	pub fn densities(&self, points: &[Point]) -> Vec<f64> {
		let index = NeighborIndex::new(points);
		points
			.iter()
			.map(|point| {
				let r_k = index.kth_distance(point.to_array(), self.neighbors).unwrap_or(0.0);
				1.0 / (PI * r_k * r_k + DENSITY_EPSILON)
			})
			.collect()
	}

	/// Inclusion probabilities, normalized to sum to one.
	pub fn inclusion_weights(&self, points: &[Point]) -> Vec<f64> {
		let raw: Vec<f64> = self
			.densities(points)
			.into_iter()
			.map(|density| (1.0 - self.beta) + self.beta * density.powf(-self.alpha))
			.collect();
		let total: f64 = raw.iter().sum();
		raw.into_iter().map(|w| w / total).collect()
	}

	pub fn sample<R: Rng + ?Sized>(
		&self,
		points: &[Point],
		target_count: usize,
		rng: &mut R,
	) -> Result<Vec<[f64; 2]>> {
		let target = target_count.min(points.len());
		if target == 0 {
			return Ok(Vec::new());
		}

		let spatial = ((self.spatial_fraction * target as f64) as usize).min(target);
		let adaptive = target - spatial;
		let mut ideal = Vec::with_capacity(target);

		if adaptive > 0 {
			let weights = self.inclusion_weights(points);
			let positions: Vec<usize> = (0..points.len()).collect();
			let picked = positions
				.choose_multiple_weighted(rng, adaptive, |&position| weights[position])
				.map_err(|e| TilerError::Sampling(e.to_string()))?;
			ideal.extend(picked.map(|&position| points[position].to_array()));
		}

		if spatial > 0 {
			let bounds = find_bounds(points)
				.ok_or_else(|| TilerError::Sampling("population has no bounds".to_string()))?;
			for _ in 0..spatial {
				ideal.push([
					rng.gen_range(bounds.lx..=bounds.ux),
					rng.gen_range(bounds.ly..=bounds.uy),
				]);
			}
		}

		Ok(ideal)
	}
}
