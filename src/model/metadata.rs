use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-tile record, nested the same way as the quadtree it was produced from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TileMetadata {
	pub tile_id: String,
	pub uncompressed_size: u64,
	pub compressed_size: u64,
	pub node_count: usize,
	pub children: Vec<TileMetadata>,
}

impl TileMetadata {
	pub fn tile_count(&self) -> usize {
		1 + self.children.iter().map(|c| c.tile_count()).sum::<usize>()
	}

	pub fn point_count(&self) -> usize {
		self.node_count + self.children.iter().map(|c| c.point_count()).sum::<usize>()
	}

	pub fn max_depth(&self) -> usize {
		self.children.iter().map(|c| 1 + c.max_depth()).max().unwrap_or(0)
	}

	/// Pre-order walk over this tile and all of its descendants.
	pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TileMetadata)) {
		visit(self);
		for child in &self.children {
			child.walk(visit);
		}
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Extent {
	pub size: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ColorStats {
	pub buckets: Vec<f64>,
}

/// The root `metadata.json` of a pyramid.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PyramidMetadata {
	pub extent: Extent,
	/// Every tile keyed by its address, each carrying its own subtree.
	pub tiles: BTreeMap<String, TileMetadata>,
	pub color_stats: BTreeMap<String, ColorStats>,
}

impl PyramidMetadata {
	pub fn root(&self) -> Option<&TileMetadata> {
		self.tiles.get("0/0_0")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn leaf(tile_id: &str, node_count: usize) -> TileMetadata {
		TileMetadata {
			tile_id: tile_id.to_string(),
			uncompressed_size: 10,
			compressed_size: 5,
			node_count,
			children: Vec::new(),
		}
	}

	#[test]
	fn counts_over_the_subtree() {
		let mut root = leaf("0/0_0", 4);
		let mut child = leaf("1/0_0", 3);
		child.children.push(leaf("2/0_0", 2));
		root.children.push(child);
		root.children.push(leaf("1/1_1", 1));

		assert_eq!(root.tile_count(), 4);
		assert_eq!(root.point_count(), 10);
		assert_eq!(root.max_depth(), 2);

		let mut ids = Vec::new();
		root.walk(&mut |t| ids.push(t.tile_id.as_str()));
		assert_eq!(ids, vec!["0/0_0", "1/0_0", "2/0_0", "1/1_1"]);
	}

	#[test]
	fn serializes_with_client_field_names() {
		let mut tiles = BTreeMap::new();
		tiles.insert("0/0_0".to_string(), leaf("0/0_0", 4));
		let mut color_stats = BTreeMap::new();
		color_stats.insert("user_score".to_string(), ColorStats { buckets: vec![1.0, 2.0] });
		let metadata = PyramidMetadata {
			extent: Extent { size: 100.0 },
			tiles,
			color_stats,
		};

		let json = serde_json::to_value(&metadata).unwrap();
		assert_eq!(json["extent"]["size"], 100.0);
		assert_eq!(json["tiles"]["0/0_0"]["node_count"], 4);
		assert_eq!(json["tiles"]["0/0_0"]["uncompressed_size"], 10);
		assert_eq!(json["colorStats"]["user_score"]["buckets"][1], 2.0);
		assert_eq!(metadata.root().unwrap().tile_id, "0/0_0");
	}
}
