//! Remote file and directory handles
//!
//! A `RemoteFile` wraps the opaque handle the server issued for an open
//! file, plus the client-side sequential offset. Transfers larger than one
//! protocol round trip are split transparently. A closed handle refuses
//! every further operation without touching the wire.

use std::collections::VecDeque;

use futures::stream::{self, Stream};

use crate::client::Client;
use crate::error::ClientError;
use crate::protocol::attrs::FileAttributes;
use crate::protocol::consts::MAX_DATA_LEN;
use crate::protocol::error::ProtocolError;
use crate::protocol::packets::{Handle, NameEntry};

/// One (name, attributes) directory listing entry
pub type DirEntry = NameEntry;

/// An open remote file
pub struct RemoteFile {
	client: Client,
	path: String,
	handle: Handle,
	offset: u64,
	closed: bool,
}

impl std::fmt::Debug for RemoteFile {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteFile")
			.field("path", &self.path)
			.field("handle", &self.handle)
			.field("offset", &self.offset)
			.field("closed", &self.closed)
			.finish()
	}
}

impl RemoteFile {
	pub(crate) fn new(client: Client, path: String, handle: Handle) -> Self {
		RemoteFile { client, path, handle, offset: 0, closed: false }
	}

	/// Path this file was opened with
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Final component of the path
	pub fn name(&self) -> &str {
		self.path.rsplit('/').next().unwrap_or(&self.path)
	}

	fn check_open(&self) -> Result<(), ClientError> {
		if self.closed {
			Err(ClientError::HandleClosed)
		} else {
			Ok(())
		}
	}

	/// Read at the current sequential offset, advancing it by the number
	/// of bytes returned. `Ok(0)` with a non-empty buffer means end of
	/// file, the same convention as any byte stream.
	pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClientError> {
		let n = self.read_at(buf, self.offset).await?;
		self.offset += n as u64;
		Ok(n)
	}

	/// Read at an explicit offset without touching the sequential offset.
	/// An offset at or beyond end of file returns `Ok(0)`.
	pub async fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, ClientError> {
		self.check_open()?;
		if buf.is_empty() {
			return Ok(0);
		}
		let want = buf.len().min(MAX_DATA_LEN);
		match self.client.read_chunk(&self.handle, offset, want as u32).await? {
			None => Ok(0),
			Some(data) => {
				if data.len() > want {
					return Err(ClientError::Protocol(ProtocolError::BadMessage(format!(
						"server returned {} bytes for a {} byte read",
						data.len(),
						want
					))));
				}
				buf[..data.len()].copy_from_slice(&data);
				Ok(data.len())
			}
		}
	}

	/// Read from the current offset to end of file, appending to `out`.
	/// Returns the number of bytes appended.
	pub async fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize, ClientError> {
		let mut total = 0usize;
		let mut buf = vec![0u8; MAX_DATA_LEN];
		loop {
			let n = self.read(&mut buf).await?;
			if n == 0 {
				return Ok(total);
			}
			out.extend_from_slice(&buf[..n]);
			total += n;
		}
	}

	/// Write at the current sequential offset, one request per chunk of at
	/// most the protocol's data cap, advancing the offset by the bytes
	/// confirmed. A zero-length write is a no-op with no round trip. If a
	/// chunk fails after earlier chunks succeeded, the error reports how
	/// many bytes were durably written so the caller can retry the rest.
	pub async fn write(&mut self, buf: &[u8]) -> Result<usize, ClientError> {
		self.check_open()?;
		if buf.is_empty() {
			return Ok(0);
		}
		let mut written = 0usize;
		for chunk in buf.chunks(MAX_DATA_LEN) {
			let offset = self.offset + written as u64;
			if let Err(e) = self.client.write_chunk(&self.handle, offset, chunk).await {
				self.offset += written as u64;
				return Err(if written == 0 {
					e
				} else {
					ClientError::PartialWrite { written, source: Box::new(e) }
				});
			}
			written += chunk.len();
		}
		self.offset += written as u64;
		Ok(written)
	}

	/// Attributes of the open file, queried against the handle
	pub async fn stat(&self) -> Result<FileAttributes, ClientError> {
		self.check_open()?;
		self.client.fstat(&self.handle).await
	}

	/// Apply the present fields of `attrs` against the handle
	pub async fn setstat(&self, attrs: FileAttributes) -> Result<(), ClientError> {
		self.check_open()?;
		self.client.fsetstat(&self.handle, attrs).await
	}

	/// Release the handle. The first close wins; any later operation on
	/// this file, including another close, fails without wire traffic.
	pub async fn close(&mut self) -> Result<(), ClientError> {
		self.check_open()?;
		self.closed = true;
		self.client.close_handle(&self.handle).await
	}
}

/// An open remote directory
pub struct RemoteDir {
	client: Client,
	path: String,
	handle: Handle,
	closed: bool,
	exhausted: bool,
}

impl std::fmt::Debug for RemoteDir {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteDir")
			.field("path", &self.path)
			.field("handle", &self.handle)
			.field("closed", &self.closed)
			.field("exhausted", &self.exhausted)
			.finish()
	}
}

impl RemoteDir {
	pub(crate) fn new(client: Client, path: String, handle: Handle) -> Self {
		RemoteDir { client, path, handle, closed: false, exhausted: false }
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	fn check_open(&self) -> Result<(), ClientError> {
		if self.closed {
			Err(ClientError::HandleClosed)
		} else {
			Ok(())
		}
	}

	/// Next batch of entries, or `Ok(None)` once the listing is exhausted.
	/// The server decides batch sizes; call repeatedly until `None`. The
	/// `.` and `..` entries are filtered out. A consumed listing can only
	/// be restarted by reopening the directory.
	pub async fn read_dir(&mut self) -> Result<Option<Vec<DirEntry>>, ClientError> {
		self.check_open()?;
		if self.exhausted {
			return Ok(None);
		}
		loop {
			match self.client.read_dir_chunk(&self.handle).await? {
				None => {
					self.exhausted = true;
					return Ok(None);
				}
				Some(entries) => {
					let batch: Vec<DirEntry> = entries
						.into_iter()
						.filter(|e| e.filename != "." && e.filename != "..")
						.collect();
					if !batch.is_empty() {
						return Ok(Some(batch));
					}
					// batch held only dot entries; ask for the next one
				}
			}
		}
	}

	/// Drain the listing into one vector
	pub async fn read_all(&mut self) -> Result<Vec<DirEntry>, ClientError> {
		let mut all = Vec::new();
		while let Some(batch) = self.read_dir().await? {
			all.extend(batch);
		}
		Ok(all)
	}

	/// Consume the directory into a lazy entry stream. The handle is
	/// released when the listing is exhausted; dropping the stream early
	/// leaks the handle until the session closes.
	pub fn into_entries(self) -> impl Stream<Item = Result<DirEntry, ClientError>> {
		stream::try_unfold((self, VecDeque::new()), |(mut dir, mut buffer)| async move {
			loop {
				if let Some(entry) = buffer.pop_front() {
					return Ok(Some((entry, (dir, buffer))));
				}
				match dir.read_dir().await? {
					Some(batch) => buffer.extend(batch),
					None => {
						let _ = dir.close().await;
						return Ok(None);
					}
				}
			}
		})
	}

	/// Release the handle; same single-close discipline as files
	pub async fn close(&mut self) -> Result<(), ClientError> {
		self.check_open()?;
		self.closed = true;
		self.client.close_handle(&self.handle).await
	}
}

// vim: ts=4
