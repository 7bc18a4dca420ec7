//! Recursive directory traversal
//!
//! The walker is deliberately outside the protocol engine: it depends only
//! on two collaborator calls, a single-entry stat and a directory listing,
//! expressed as the `WalkSource` trait. `Client` implements the trait; the
//! walker's own tests run against a mock tree with no connection at all.

use async_trait::async_trait;

use crate::client::Client;
use crate::error::ClientError;
use crate::protocol::attrs::FileAttributes;
use crate::protocol::packets::NameEntry;

/// The two primitives a traversal needs
#[async_trait]
pub trait WalkSource {
	/// Attributes of one entry, not following symlinks
	async fn stat_entry(&self, path: &str) -> Result<FileAttributes, ClientError>;

	/// Complete listing of one directory
	async fn list_dir(&self, path: &str) -> Result<Vec<NameEntry>, ClientError>;
}

#[async_trait]
impl WalkSource for Client {
	async fn stat_entry(&self, path: &str) -> Result<FileAttributes, ClientError> {
		self.lstat(path).await
	}

	async fn list_dir(&self, path: &str) -> Result<Vec<NameEntry>, ClientError> {
		let mut dir = self.opendir(path).await?;
		let entries = dir.read_all().await;
		let _ = dir.close().await;
		entries
	}
}

/// Traversal policy
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
	/// Stop at the first error instead of recording it and continuing
	pub stop_on_error: bool,
}

/// One visited entry
#[derive(Debug, Clone)]
pub struct WalkEntry {
	pub path: String,
	pub attrs: FileAttributes,
}

/// One failed subtree
#[derive(Debug)]
pub struct WalkError {
	pub path: String,
	pub error: ClientError,
}

/// Everything a finished (or stopped) walk produced
#[derive(Debug, Default)]
pub struct WalkReport {
	pub entries: Vec<WalkEntry>,
	pub errors: Vec<WalkError>,
}

fn join_path(dir: &str, name: &str) -> String {
	if dir.ends_with('/') {
		format!("{}{}", dir, name)
	} else {
		format!("{}/{}", dir, name)
	}
}

/// Depth-first walk rooted at `root`. Every reachable entry is visited
/// exactly once; a directory that cannot be listed contributes exactly one
/// error covering its subtree. With `stop_on_error` the walk returns at
/// the first error, otherwise errors are collected and the walk continues
/// past the failed subtree.
pub async fn walk<S>(source: &S, root: &str, options: &WalkOptions) -> WalkReport
where
	S: WalkSource + Sync,
{
	let mut report = WalkReport::default();

	let root_attrs = match source.stat_entry(root).await {
		Ok(attrs) => attrs,
		Err(error) => {
			report.errors.push(WalkError { path: root.to_string(), error });
			return report;
		}
	};
	let root_is_dir = root_attrs.is_dir();
	report.entries.push(WalkEntry { path: root.to_string(), attrs: root_attrs });
	if !root_is_dir {
		return report;
	}

	let mut stack = vec![root.to_string()];
	while let Some(dir_path) = stack.pop() {
		let mut batch = match source.list_dir(&dir_path).await {
			Ok(batch) => batch,
			Err(error) => {
				report.errors.push(WalkError { path: dir_path, error });
				if options.stop_on_error {
					return report;
				}
				continue;
			}
		};
		batch.sort_by(|a, b| a.filename.cmp(&b.filename));
		for entry in batch {
			let child = join_path(&dir_path, &entry.filename);
			if entry.attrs.is_dir() {
				stack.push(child.clone());
			}
			report.entries.push(WalkEntry { path: child, attrs: entry.attrs });
		}
	}
	report
}


// vim: ts=4
