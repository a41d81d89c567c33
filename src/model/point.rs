/// A normalized embedding coordinate with a back-reference into the row store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
	pub row_index: u64,
}

impl Point {
	pub fn new(x: f64, y: f64, row_index: u64) -> Point {
		Point { x, y, row_index }
	}

	pub fn to_array(&self) -> [f64; 2] {
		[self.x, self.y]
	}

	pub fn is_finite(&self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}
