use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, TilerError};

/// Destination for finished artifacts. `put` must be idempotent: the same
/// file may be sent again under the same key after a failed attempt.
pub trait ObjectStore {
	fn put(&self, local: &Path, key: &str) -> io::Result<()>;
}

/// Writes objects under a root directory, one file per key.
pub struct LocalDirStore {
	root: PathBuf,
}

impl LocalDirStore {
	pub fn new(root: impl Into<PathBuf>) -> LocalDirStore {
		LocalDirStore { root: root.into() }
	}

	pub fn path_for(&self, key: &str) -> PathBuf {
		self.root.join(key)
	}
}

impl ObjectStore for LocalDirStore {
	fn put(&self, local: &Path, key: &str) -> io::Result<()> {
		let target = self.path_for(key);
		if let Some(parent) = target.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::copy(local, &target)?;
		Ok(())
	}
}

/// Sends `local` to `key`, retrying the same payload up to `attempts` times.
pub fn put_with_retry(store: &dyn ObjectStore, local: &Path, key: &str, attempts: u32) -> Result<()> {
	let mut attempt = 1;
	loop {
		match store.put(local, key) {
			Ok(()) => {
				debug!("uploaded {}", key);
				return Ok(());
			}
			Err(e) if attempt < attempts => {
				warn!("upload of {} failed (attempt {}/{}): {}", key, attempt, attempts, e);
				attempt += 1;
			}
			Err(e) => {
				return Err(TilerError::Upload {
					key: key.to_string(),
					attempts,
					source: e,
				});
			}
		}
	}
}
