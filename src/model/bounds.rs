use crate::model::point::Point;
use ord_subset::OrdSubsetIterExt;

#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
	pub size_x: f64,
	pub size_y: f64,
	pub ux: f64,
	pub uy: f64,
	pub lx: f64,
	pub ly: f64,
}

impl Bounds {
	pub fn new(ux: f64, uy: f64, lx: f64, ly: f64) -> Bounds {
		Bounds {
			size_x: (lx - ux).abs(),
			size_y: (ly - uy).abs(),
			ux,
			uy,
			lx,
			ly,
		}
	}

	/// Square bounds around `center` reaching `half_extent` to each edge.
	pub fn around(center: [f64; 2], half_extent: f64) -> Bounds {
		Bounds::new(
			center[0] + half_extent,
			center[1] + half_extent,
			center[0] - half_extent,
			center[1] - half_extent,
		)
	}

	#[cfg(test)]
	pub(crate) fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.lx && x <= self.ux && y >= self.ly && y <= self.uy
	}
}

/// Tight bounds of a point population, `None` when empty or when no
/// coordinate is comparable.
pub fn find_bounds(points: &[Point]) -> Option<Bounds> {
	let xs = points.iter().map(|p| p.x);
	let ys = points.iter().map(|p| p.y);

	Some(Bounds::new(
		xs.clone().ord_subset_max()?,
		ys.clone().ord_subset_max()?,
		xs.ord_subset_min()?,
		ys.ord_subset_min()?,
	))
}
