use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TilerError};

/// Deepest level whose tiles and their children fit `u64` grid coordinates.
pub const MAX_ADDRESS_DEPTH: u32 = 62;

/// Grid offsets per quadrant, in `[lower-left, upper-left, lower-right, upper-right]` order.
pub const QUADRANT_OFFSETS: [(u64, u64); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileAddress {
	pub z: u32,
	pub x: u64,
	pub y: u64,
}

impl TileAddress {
	pub fn root() -> TileAddress {
		TileAddress { z: 0, x: 0, y: 0 }
	}

	pub fn child(&self, quadrant: usize) -> Result<TileAddress> {
		let (dx, dy) = QUADRANT_OFFSETS[quadrant];
		let overflow = || TilerError::AddressOverflow {
			address: self.to_string(),
		};
		Ok(TileAddress {
			z: self.z.checked_add(1).ok_or_else(overflow)?,
			x: self.x.checked_mul(2).and_then(|x| x.checked_add(dx)).ok_or_else(overflow)?,
			y: self.y.checked_mul(2).and_then(|y| y.checked_add(dy)).ok_or_else(overflow)?,
		})
	}

	pub fn children(&self) -> Result<[TileAddress; 4]> {
		Ok([self.child(0)?, self.child(1)?, self.child(2)?, self.child(3)?])
	}

	/// Flat name usable as a local file stem, e.g. `2/1_3` -> `2_1_3`.
	pub fn file_stem(&self) -> String {
		format!("{}_{}_{}", self.z, self.x, self.y)
	}
}

impl fmt::Display for TileAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}_{}", self.z, self.x, self.y)
	}
}

impl FromStr for TileAddress {
	type Err = TilerError;

	fn from_str(s: &str) -> Result<TileAddress> {
		let invalid = || TilerError::Config(format!("invalid tile address: {}", s));
		let (z, coords) = s.split_once('/').ok_or_else(invalid)?;
		let (x, y) = coords.split_once('_').ok_or_else(invalid)?;
		Ok(TileAddress {
			z: z.parse().map_err(|_| invalid())?,
			x: x.parse().map_err(|_| invalid())?,
			y: y.parse().map_err(|_| invalid())?,
		})
	}
}
