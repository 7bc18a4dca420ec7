//! Filesystem-shaped operations over one shared connection
//!
//! One method per protocol operation. Every method builds a typed request,
//! sends it through the session's dispatcher and checks that the response
//! is of the expected kind: a status where only success/failure is
//! meaningful, a handle, an attribute block or a name list otherwise.
//! Server-reported failures come back as `ClientError::Status` with the
//! numeric code preserved; a response of the wrong kind is a bad-message
//! protocol error, never silently ignored.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{ClientError, StatusCode};
use crate::file::{RemoteDir, RemoteFile};
use crate::protocol::attrs::FileAttributes;
use crate::protocol::consts::{OpenFlags, PacketType};
use crate::protocol::error::ProtocolError;
use crate::protocol::packets::{status_to_result, Handle, NameEntry, Request, Response};
use crate::protocol::session::Session;
use crate::walk::{walk, WalkOptions, WalkReport};

fn unexpected(expected: &'static str, got: &Response) -> ClientError {
	ClientError::Protocol(ProtocolError::UnexpectedResponse {
		expected,
		got: got.packet_type() as u8,
	})
}

/// Handle to one SFTP connection. Cheap to clone; all clones share the
/// session and may issue requests concurrently.
#[derive(Clone)]
pub struct Client {
	session: Arc<Session>,
}

impl Client {
	/// Negotiate the protocol on a fresh duplex stream and return a
	/// connected client. The stream is typically the stdio of a spawned
	/// sftp-server or ssh subprocess, but anything readable and writable
	/// works; see `crate::connect` for the subprocess plumbing.
	pub async fn handshake<R, W>(reader: R, writer: W) -> Result<Client, ClientError>
	where
		R: AsyncRead + Send + Unpin + 'static,
		W: AsyncWrite + Send + Unpin + 'static,
	{
		let session = Session::handshake(reader, writer).await?;
		Ok(Client { session: Arc::new(session) })
	}

	/// Negotiated protocol version
	pub fn version(&self) -> u32 {
		self.session.version()
	}

	/// Extension pairs the server advertised at handshake
	pub fn extensions(&self) -> &[(String, String)] {
		self.session.extensions()
	}

	/// Shut the connection down. Every pending request on any clone of
	/// this client fails with connection-lost.
	pub async fn close(&self) {
		self.session.close().await;
	}

	async fn call(&self, request: Request) -> Result<Response, ClientError> {
		let raw = self.session.call(&request).await?;
		Ok(Response::decode(raw.packet_type, &raw.payload)?)
	}

	/// For operations whose only positive outcome is an OK status
	async fn expect_status(&self, request: Request) -> Result<(), ClientError> {
		match self.call(request).await? {
			Response::Status { code, message, language } => {
				status_to_result(code, message, language)?;
				Ok(())
			}
			other => Err(unexpected("status", &other)),
		}
	}

	async fn expect_handle(&self, request: Request) -> Result<Handle, ClientError> {
		match self.call(request).await? {
			Response::Handle(handle) => Ok(handle),
			Response::Status { code, message, language } => {
				status_to_result(code, message, language)?;
				// an OK status where a handle was expected is a violation
				Err(ClientError::Protocol(ProtocolError::UnexpectedResponse {
					expected: "handle",
					got: PacketType::Status as u8,
				}))
			}
			other => Err(unexpected("handle", &other)),
		}
	}

	async fn expect_attrs(&self, request: Request) -> Result<FileAttributes, ClientError> {
		match self.call(request).await? {
			Response::Attrs(attrs) => Ok(attrs),
			Response::Status { code, message, language } => {
				status_to_result(code, message, language)?;
				Err(ClientError::Protocol(ProtocolError::UnexpectedResponse {
					expected: "attrs",
					got: PacketType::Status as u8,
				}))
			}
			other => Err(unexpected("attrs", &other)),
		}
	}

	async fn expect_name(&self, request: Request) -> Result<Vec<NameEntry>, ClientError> {
		match self.call(request).await? {
			Response::Name(entries) => Ok(entries),
			Response::Status { code, message, language } => {
				status_to_result(code, message, language)?;
				Err(ClientError::Protocol(ProtocolError::UnexpectedResponse {
					expected: "name",
					got: PacketType::Status as u8,
				}))
			}
			other => Err(unexpected("name", &other)),
		}
	}

	/// Open an existing file for reading
	pub async fn open(&self, path: &str) -> Result<RemoteFile, ClientError> {
		self.open_with_flags(path, OpenFlags::READ, FileAttributes::new()).await
	}

	/// Create (or truncate) a file and open it for reading and writing
	pub async fn create(&self, path: &str) -> Result<RemoteFile, ClientError> {
		self.open_with_flags(
			path,
			OpenFlags::READ | OpenFlags::WRITE | OpenFlags::CREAT | OpenFlags::TRUNC,
			FileAttributes::new(),
		)
		.await
	}

	/// Open with explicit SSH_FXF_* flags and initial attributes
	pub async fn open_with_flags(
		&self,
		path: &str,
		pflags: u32,
		attrs: FileAttributes,
	) -> Result<RemoteFile, ClientError> {
		let handle = self
			.expect_handle(Request::Open { path: path.to_string(), pflags, attrs })
			.await?;
		Ok(RemoteFile::new(self.clone(), path.to_string(), handle))
	}

	/// Open a directory for listing
	pub async fn opendir(&self, path: &str) -> Result<RemoteDir, ClientError> {
		let handle = self.expect_handle(Request::Opendir { path: path.to_string() }).await?;
		Ok(RemoteDir::new(self.clone(), path.to_string(), handle))
	}

	/// Attributes of the entry at `path`, following symlinks
	pub async fn stat(&self, path: &str) -> Result<FileAttributes, ClientError> {
		self.expect_attrs(Request::Stat { path: path.to_string() }).await
	}

	/// Attributes of the entry at `path` itself, not following symlinks
	pub async fn lstat(&self, path: &str) -> Result<FileAttributes, ClientError> {
		self.expect_attrs(Request::Lstat { path: path.to_string() }).await
	}

	/// Apply the present fields of `attrs` to the entry at `path`
	pub async fn setstat(&self, path: &str, attrs: FileAttributes) -> Result<(), ClientError> {
		self.expect_status(Request::Setstat { path: path.to_string(), attrs }).await
	}

	/// Remove a file
	pub async fn remove(&self, path: &str) -> Result<(), ClientError> {
		self.expect_status(Request::Remove { path: path.to_string() }).await
	}

	/// Create a directory
	pub async fn mkdir(&self, path: &str) -> Result<(), ClientError> {
		self.expect_status(Request::Mkdir {
			path: path.to_string(),
			attrs: FileAttributes::new(),
		})
		.await
	}

	/// Remove an empty directory
	pub async fn rmdir(&self, path: &str) -> Result<(), ClientError> {
		self.expect_status(Request::Rmdir { path: path.to_string() }).await
	}

	/// Move an entry from `old_path` to `new_path`
	pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), ClientError> {
		self.expect_status(Request::Rename {
			old_path: old_path.to_string(),
			new_path: new_path.to_string(),
		})
		.await
	}

	/// Target of the symlink at `path`
	pub async fn readlink(&self, path: &str) -> Result<String, ClientError> {
		let entries = self.expect_name(Request::Readlink { path: path.to_string() }).await?;
		entries
			.into_iter()
			.next()
			.map(|e| e.filename)
			.ok_or_else(|| {
				ClientError::Protocol(ProtocolError::BadMessage(
					"readlink reply carried no name".to_string(),
				))
			})
	}

	/// Create a symlink at `link_path` pointing at `target`
	pub async fn symlink(&self, target: &str, link_path: &str) -> Result<(), ClientError> {
		self.expect_status(Request::Symlink {
			target: target.to_string(),
			link_path: link_path.to_string(),
		})
		.await
	}

	/// Walk the tree rooted at `root` depth-first. Convenience over
	/// `crate::walk::walk` with this client as the source.
	pub async fn walk(&self, root: &str, options: &WalkOptions) -> WalkReport {
		walk(self, root, options).await
	}

	pub(crate) async fn close_handle(&self, handle: &Handle) -> Result<(), ClientError> {
		self.expect_status(Request::Close { handle: handle.clone() }).await
	}

	pub(crate) async fn fstat(&self, handle: &Handle) -> Result<FileAttributes, ClientError> {
		self.expect_attrs(Request::Fstat { handle: handle.clone() }).await
	}

	pub(crate) async fn fsetstat(
		&self,
		handle: &Handle,
		attrs: FileAttributes,
	) -> Result<(), ClientError> {
		self.expect_status(Request::Fsetstat { handle: handle.clone(), attrs }).await
	}

	/// One READ round trip. `Ok(None)` is the server's end-of-file status,
	/// normalized here so read loops can use the usual zero-bytes check.
	pub(crate) async fn read_chunk(
		&self,
		handle: &Handle,
		offset: u64,
		len: u32,
	) -> Result<Option<Vec<u8>>, ClientError> {
		let request = Request::Read { handle: handle.clone(), offset, len };
		match self.call(request).await? {
			Response::Data(data) => Ok(Some(data)),
			Response::Status { code: StatusCode::Eof, .. } => Ok(None),
			Response::Status { code, message, language } => {
				status_to_result(code, message, language)?;
				Err(ClientError::Protocol(ProtocolError::UnexpectedResponse {
					expected: "data",
					got: PacketType::Status as u8,
				}))
			}
			other => Err(unexpected("data", &other)),
		}
	}

	/// One WRITE round trip
	pub(crate) async fn write_chunk(
		&self,
		handle: &Handle,
		offset: u64,
		data: &[u8],
	) -> Result<(), ClientError> {
		self.expect_status(Request::Write {
			handle: handle.clone(),
			offset,
			data: data.to_vec(),
		})
		.await
	}

	/// One READDIR round trip; `Ok(None)` when the listing is exhausted
	pub(crate) async fn read_dir_chunk(
		&self,
		handle: &Handle,
	) -> Result<Option<Vec<NameEntry>>, ClientError> {
		match self.call(Request::Readdir { handle: handle.clone() }).await? {
			Response::Name(entries) => Ok(Some(entries)),
			Response::Status { code: StatusCode::Eof, .. } => Ok(None),
			Response::Status { code, message, language } => {
				status_to_result(code, message, language)?;
				Err(ClientError::Protocol(ProtocolError::UnexpectedResponse {
					expected: "name",
					got: PacketType::Status as u8,
				}))
			}
			other => Err(unexpected("name", &other)),
		}
	}
}

// vim: ts=4
