use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::digest::ColumnDigestAccumulator;
use crate::error::Result;
use crate::model::metadata::TileMetadata;
use crate::model::options::TilerOptions;
use crate::model::point::Point;
use crate::model::tile_address::TileAddress;
use crate::object_store::{put_with_retry, ObjectStore};
use crate::quadtree::QuadTreeNode;
use crate::row_store::RowStore;
use crate::schema::OutputSchema;

const ZSTD_LEVEL: i32 = 3;

/// Remote key of a tile artifact.
pub fn tile_key(prefix: &str, address: TileAddress) -> String {
	format!("{}/tiles/{}.arrow.zst", prefix, address)
}

pub fn write_arrow_file(path: &Path, batch: &RecordBatch) -> Result<()> {
	let mut writer = FileWriter::try_new(BufWriter::new(File::create(path)?), &batch.schema())?;
	writer.write(batch)?;
	writer.finish()?;
	Ok(())
}

pub fn compress_file(source: &Path, target: &Path) -> Result<()> {
	let reader = BufReader::new(File::open(source)?);
	let writer = BufWriter::new(File::create(target)?);
	zstd::stream::copy_encode(reader, writer, ZSTD_LEVEL)?;
	Ok(())
}

/// Walks a finished tree depth-first, writing one compressed Arrow tile per
/// node that holds points and feeding every emitted row to the digests.
pub struct TileMaterializer<'a> {
	row_store: &'a dyn RowStore,
	object_store: &'a dyn ObjectStore,
	schema: OutputSchema,
	digests: ColumnDigestAccumulator,
	work_dir: PathBuf,
	key_prefix: String,
	upload_attempts: u32,
	tiles_written: usize,
}

impl<'a> TileMaterializer<'a> {
	pub fn new(
		row_store: &'a dyn RowStore,
		object_store: &'a dyn ObjectStore,
		schema: OutputSchema,
		options: &TilerOptions,
		key_prefix: &str,
	) -> TileMaterializer<'a> {
		let digests = ColumnDigestAccumulator::for_schema(&schema);
		TileMaterializer {
			row_store,
			object_store,
			schema,
			digests,
			work_dir: options.work_dir.clone(),
			key_prefix: key_prefix.to_string(),
			upload_attempts: options.upload_attempts,
			tiles_written: 0,
		}
	}

	/// Materializes the whole tree. Normally returns the single root tile; a
	/// node without points contributes its descendants' tiles instead.
	pub fn materialize(&mut self, root: &QuadTreeNode) -> Result<Vec<TileMetadata>> {
		fs::create_dir_all(&self.work_dir)?;
		let tiles = self.visit(root, TileAddress::root())?;
		self.digests.flush();
		info!(
			"materialized {} tiles covering {} rows",
			self.tiles_written,
			self.digests.rows()
		);
		Ok(tiles)
	}

	fn visit(&mut self, node: &QuadTreeNode, address: TileAddress) -> Result<Vec<TileMetadata>> {
		let own = if node.sample.is_empty() {
			None
		} else {
			Some(self.write_tile(address, &node.sample)?)
		};

		let mut children = Vec::new();
		for (quadrant, child) in node.children().iter().enumerate() {
			children.extend(self.visit(child, address.child(quadrant)?)?);
		}

		match own {
			Some(mut tile) => {
				tile.children = children;
				Ok(vec![tile])
			}
			None => Ok(children),
		}
	}

	/// Fetches, projects, digests, writes, compresses and uploads one tile.
	pub fn write_tile(&mut self, address: TileAddress, points: &[Point]) -> Result<TileMetadata> {
		let indices: Vec<u64> = points.iter().map(|p| p.row_index).collect();
		let rows = self.row_store.take(&indices)?;
		let batch = self.schema.project(&rows, points)?;
		self.digests.update_batch(&batch, &rows)?;

		let artifact = self.work_dir.join(format!("{}.arrow", address.file_stem()));
		let compressed = self.work_dir.join(format!("{}.arrow.zst", address.file_stem()));
		write_arrow_file(&artifact, &batch)?;
		compress_file(&artifact, &compressed)?;
		let uncompressed_size = fs::metadata(&artifact)?.len();
		let compressed_size = fs::metadata(&compressed)?.len();

		let key = tile_key(&self.key_prefix, address);
		put_with_retry(self.object_store, &compressed, &key, self.upload_attempts)?;
		self.tiles_written += 1;
		debug!(
			"tile {}: {} points, {} -> {} bytes",
			address,
			points.len(),
			uncompressed_size,
			compressed_size
		);

		Ok(TileMetadata {
			tile_id: address.to_string(),
			uncompressed_size,
			compressed_size,
			node_count: points.len(),
			children: Vec::new(),
		})
	}

	pub fn tiles_written(&self) -> usize {
		self.tiles_written
	}

	pub fn into_digests(self) -> ColumnDigestAccumulator {
		self.digests
	}
}
