//! Client operation tests against a scripted in-memory server
//!
//! A tiny stateful SFTP server speaking the real codec over an in-memory
//! duplex pipe. No subprocess, no filesystem; every byte still goes
//! through the frame reader, the dispatcher and the typed packet layer.

use std::collections::HashMap;

use tokio::io::{AsyncWriteExt, DuplexStream};

use sftpr::protocol::consts::{OpenFlags, PacketType, MAX_DATA_LEN, SFTP_VERSION};
use sftpr::protocol::packets::{Handle, NameEntry, Request, Response};
use sftpr::protocol::wire::{read_frame, PacketEncoder};
use sftpr::{Client, ClientError, FileAttributes, StatusCode};

// ============================================================================
// Scripted server
// ============================================================================

fn status(code: StatusCode, message: &str) -> Response {
	Response::Status { code, message: message.to_string(), language: String::new() }
}

fn file_attrs(size: u64) -> FileAttributes {
	FileAttributes { size: Some(size), permissions: Some(0o100644), ..FileAttributes::default() }
}

fn dir_attrs() -> FileAttributes {
	FileAttributes { permissions: Some(0o040755), ..FileAttributes::default() }
}

fn join(dir: &str, name: &str) -> String {
	if dir.ends_with('/') {
		format!("{}{}", dir, name)
	} else {
		format!("{}/{}", dir, name)
	}
}

#[derive(Default)]
struct MiniServer {
	files: HashMap<String, Vec<u8>>,
	dirs: HashMap<String, Vec<String>>,
	links: HashMap<String, String>,
	handles: HashMap<Vec<u8>, String>,
	cursors: HashMap<Vec<u8>, usize>,
	next_handle: u32,
	// writes at or past this offset fail, for partial-write scenarios
	fail_writes_at: Option<u64>,
}

impl MiniServer {
	fn new() -> Self {
		Self::default()
	}

	fn with_file(mut self, path: &str, content: &[u8]) -> Self {
		self.files.insert(path.to_string(), content.to_vec());
		self
	}

	fn with_dir(mut self, path: &str, children: &[&str]) -> Self {
		self.dirs.insert(path.to_string(), children.iter().map(|c| c.to_string()).collect());
		self
	}

	fn issue_handle(&mut self, path: String) -> Handle {
		self.next_handle += 1;
		let raw = format!("h-{}", self.next_handle).into_bytes();
		self.handles.insert(raw.clone(), path);
		Handle::new(raw)
	}

	fn stat_path(&self, path: &str) -> Response {
		if let Some(content) = self.files.get(path) {
			Response::Attrs(file_attrs(content.len() as u64))
		} else if self.dirs.contains_key(path) {
			Response::Attrs(dir_attrs())
		} else {
			status(StatusCode::NoSuchFile, "no such file")
		}
	}

	fn listing(&self, path: &str) -> Vec<NameEntry> {
		let mut entries = vec![
			NameEntry { filename: ".".to_string(), longname: ".".to_string(), attrs: dir_attrs() },
			NameEntry { filename: "..".to_string(), longname: "..".to_string(), attrs: dir_attrs() },
		];
		for name in &self.dirs[path] {
			let full = join(path, name);
			let attrs = if self.dirs.contains_key(&full) {
				dir_attrs()
			} else {
				file_attrs(self.files.get(&full).map(|c| c.len()).unwrap_or(0) as u64)
			};
			entries.push(NameEntry {
				filename: name.clone(),
				longname: format!("?????????? 1 0 0 0 {}", name),
				attrs,
			});
		}
		entries
	}

	fn handle_request(&mut self, request: Request) -> Response {
		match request {
			Request::Open { path, pflags, .. } => {
				if !self.files.contains_key(&path) {
					if pflags & OpenFlags::CREAT == 0 {
						return status(StatusCode::NoSuchFile, "no such file");
					}
					self.files.insert(path.clone(), Vec::new());
				} else if pflags & OpenFlags::TRUNC != 0 {
					self.files.insert(path.clone(), Vec::new());
				}
				Response::Handle(self.issue_handle(path))
			}
			Request::Opendir { path } => {
				if self.dirs.contains_key(&path) {
					Response::Handle(self.issue_handle(path))
				} else {
					status(StatusCode::NoSuchFile, "no such directory")
				}
			}
			Request::Close { handle } => {
				self.handles.remove(handle.as_bytes());
				status(StatusCode::Ok, "")
			}
			Request::Read { handle, offset, len } => {
				let path = match self.handles.get(handle.as_bytes()) {
					Some(path) => path.clone(),
					None => return status(StatusCode::Failure, "bad handle"),
				};
				let content = &self.files[&path];
				let offset = offset as usize;
				if offset >= content.len() {
					return status(StatusCode::Eof, "end of file");
				}
				let end = content.len().min(offset + len as usize);
				Response::Data(content[offset..end].to_vec())
			}
			Request::Write { handle, offset, data } => {
				if let Some(limit) = self.fail_writes_at {
					if offset >= limit {
						return status(StatusCode::Failure, "simulated write failure");
					}
				}
				let path = match self.handles.get(handle.as_bytes()) {
					Some(path) => path.clone(),
					None => return status(StatusCode::Failure, "bad handle"),
				};
				let content = self.files.get_mut(&path).unwrap();
				let offset = offset as usize;
				if content.len() < offset + data.len() {
					content.resize(offset + data.len(), 0);
				}
				content[offset..offset + data.len()].copy_from_slice(&data);
				status(StatusCode::Ok, "")
			}
			Request::Lstat { path } | Request::Stat { path } => self.stat_path(&path),
			Request::Fstat { handle } => match self.handles.get(handle.as_bytes()) {
				Some(path) => self.stat_path(&path.clone()),
				None => status(StatusCode::Failure, "bad handle"),
			},
			Request::Setstat { .. } | Request::Fsetstat { .. } => status(StatusCode::Ok, ""),
			Request::Readdir { handle } => {
				let path = match self.handles.get(handle.as_bytes()) {
					Some(path) => path.clone(),
					None => return status(StatusCode::Failure, "bad handle"),
				};
				let entries = self.listing(&path);
				let served = self.cursors.entry(handle.as_bytes().to_vec()).or_insert(0);
				if *served >= entries.len() {
					return status(StatusCode::Eof, "end of listing");
				}
				// two entries per batch, so exhaustion takes several calls
				let batch: Vec<NameEntry> =
					entries.into_iter().skip(*served).take(2).collect();
				*served += batch.len();
				Response::Name(batch)
			}
			Request::Remove { path } => {
				if self.files.remove(&path).is_some() {
					status(StatusCode::Ok, "")
				} else {
					status(StatusCode::NoSuchFile, "no such file")
				}
			}
			Request::Mkdir { path, .. } => {
				self.dirs.insert(path, Vec::new());
				status(StatusCode::Ok, "")
			}
			Request::Rmdir { path } => {
				if self.dirs.remove(&path).is_some() {
					status(StatusCode::Ok, "")
				} else {
					status(StatusCode::NoSuchFile, "no such directory")
				}
			}
			Request::Rename { old_path, new_path } => {
				if let Some(content) = self.files.remove(&old_path) {
					self.files.insert(new_path, content);
					status(StatusCode::Ok, "")
				} else {
					status(StatusCode::NoSuchFile, "no such file")
				}
			}
			Request::Readlink { path } => match self.links.get(&path) {
				Some(target) => Response::Name(vec![NameEntry {
					filename: target.clone(),
					longname: target.clone(),
					attrs: FileAttributes::new(),
				}]),
				None => status(StatusCode::NoSuchFile, "no such link"),
			},
			Request::Symlink { target, link_path } => {
				self.links.insert(link_path, target);
				status(StatusCode::Ok, "")
			}
		}
	}
}

async fn run_server(mut stream: DuplexStream, mut server: MiniServer) {
	let init = read_frame(&mut stream).await.unwrap();
	assert_eq!(init[0], PacketType::Init as u8);
	let mut enc = PacketEncoder::new(PacketType::Version, None);
	enc.put_u32(SFTP_VERSION);
	stream.write_all(&enc.finish()).await.unwrap();

	loop {
		let body = match read_frame(&mut stream).await {
			Ok(body) => body,
			Err(_) => return, // client hung up
		};
		let (id, request) = Request::decode(&body).unwrap();
		let response = server.handle_request(request);
		stream.write_all(&response.encode(id)).await.unwrap();
	}
}

async fn connect(server: MiniServer) -> Client {
	let (client_stream, server_stream) = tokio::io::duplex(1 << 20);
	tokio::spawn(run_server(server_stream, server));
	let (reader, writer) = tokio::io::split(client_stream);
	Client::handshake(reader, writer).await.unwrap()
}

fn status_code(err: &ClientError) -> Option<StatusCode> {
	err.status().map(|s| s.code)
}

// ============================================================================
// Open / read
// ============================================================================

#[tokio::test]
async fn test_open_missing_file_reports_no_such_file() {
	let client = connect(MiniServer::new()).await;
	let err = client.open("/missing").await.unwrap_err();
	assert_eq!(status_code(&err), Some(StatusCode::NoSuchFile));
}

#[tokio::test]
async fn test_sequential_read_collects_whole_file() {
	let client = connect(MiniServer::new().with_file("/hello", b"Hello world!")).await;
	let mut file = client.open("/hello").await.unwrap();
	let mut out = Vec::new();
	let n = file.read_to_end(&mut out).await.unwrap();
	assert_eq!(n, 12);
	assert_eq!(out, b"Hello world!");
	file.close().await.unwrap();
}

#[tokio::test]
async fn test_read_at_offsets() {
	let client = connect(MiniServer::new().with_file("/hello", b"Hello world!")).await;
	let file = client.open("/hello").await.unwrap();
	let mut buf = [0u8; 100];

	let n = file.read_at(&mut buf, 6).await.unwrap();
	assert_eq!(&buf[..n], b"world!");

	let n = file.read_at(&mut buf, 0).await.unwrap();
	assert_eq!(&buf[..n], b"Hello world!");

	// at end of file: zero bytes and the plain end-of-stream signal,
	// not a typed status failure
	let n = file.read_at(&mut buf, 12).await.unwrap();
	assert_eq!(n, 0);
}

#[tokio::test]
async fn test_read_at_does_not_move_sequential_offset() {
	let client = connect(MiniServer::new().with_file("/hello", b"Hello world!")).await;
	let mut file = client.open("/hello").await.unwrap();
	let mut buf = [0u8; 5];

	let n = file.read_at(&mut buf, 6).await.unwrap();
	assert_eq!(&buf[..n], b"world");

	let n = file.read(&mut buf).await.unwrap();
	assert_eq!(&buf[..n], b"Hello");
}

#[tokio::test]
async fn test_large_read_is_split_into_chunks() {
	let content = vec![7u8; MAX_DATA_LEN * 2 + 123];
	let client = connect(MiniServer::new().with_file("/big", &content)).await;
	let mut file = client.open("/big").await.unwrap();
	let mut out = Vec::new();
	file.read_to_end(&mut out).await.unwrap();
	assert_eq!(out, content);
}

// ============================================================================
// Write
// ============================================================================

#[tokio::test]
async fn test_write_sizes_accumulate() {
	// every write size from one byte to several chunks, checking the
	// reported size after each write equals the running total
	let sizes: [usize; 17] = [
		0, 1, 0, 999, 24, 1023, 2048, 4096, 8192, 16384, 32768, 65536, 131072, 262144,
		524288, 1048576, 2097152,
	];
	let totals: [u64; 17] = [
		0, 1, 1, 1000, 1024, 2047, 4095, 8191, 16383, 32767, 65535, 131071, 262143, 524287,
		1048575, 2097151, 4194303,
	];

	let client = connect(MiniServer::new()).await;
	let mut file = client.create("/writeTest").await.unwrap();
	for (size, total) in sizes.iter().zip(totals.iter()) {
		let written = file.write(&vec![0u8; *size]).await.unwrap();
		assert_eq!(written, *size);
		let attrs = file.stat().await.unwrap();
		assert_eq!(attrs.size, Some(*total));
	}
	file.close().await.unwrap();
}

#[tokio::test]
async fn test_empty_write_reports_zero() {
	let client = connect(MiniServer::new()).await;
	let mut file = client.create("/empty").await.unwrap();
	assert_eq!(file.write(&[]).await.unwrap(), 0);
	assert_eq!(file.stat().await.unwrap().size, Some(0));
}

#[tokio::test]
async fn test_partial_write_reports_confirmed_bytes() {
	let mut server = MiniServer::new();
	server.fail_writes_at = Some(MAX_DATA_LEN as u64);
	let client = connect(server).await;

	let mut file = client.create("/partial").await.unwrap();
	// three chunks; the first is confirmed, the second hits the fault
	let err = file.write(&vec![1u8; MAX_DATA_LEN * 3]).await.unwrap_err();
	match err {
		ClientError::PartialWrite { written, source } => {
			assert_eq!(written, MAX_DATA_LEN);
			assert_eq!(source.status().map(|s| s.code), Some(StatusCode::Failure));
		}
		other => panic!("expected partial write, got {:?}", other),
	}
}

#[tokio::test]
async fn test_first_chunk_failure_is_a_plain_error() {
	let mut server = MiniServer::new();
	server.fail_writes_at = Some(0);
	let client = connect(server).await;

	let mut file = client.create("/poisoned").await.unwrap();
	let err = file.write(b"anything").await.unwrap_err();
	assert!(matches!(err, ClientError::Status(_)));
}

#[tokio::test]
async fn test_create_truncates_existing_file() {
	let client = connect(MiniServer::new().with_file("/t", b"old content")).await;
	let mut file = client.create("/t").await.unwrap();
	assert_eq!(file.stat().await.unwrap().size, Some(0));
	file.close().await.unwrap();
}

// ============================================================================
// Handle lifecycle
// ============================================================================

#[tokio::test]
async fn test_closed_file_refuses_every_operation() {
	let client = connect(MiniServer::new().with_file("/f", b"x")).await;
	let mut file = client.open("/f").await.unwrap();
	file.close().await.unwrap();

	let mut buf = [0u8; 4];
	assert!(matches!(file.read(&mut buf).await, Err(ClientError::HandleClosed)));
	assert!(matches!(file.read_at(&mut buf, 0).await, Err(ClientError::HandleClosed)));
	assert!(matches!(file.write(b"y").await, Err(ClientError::HandleClosed)));
	assert!(matches!(file.stat().await, Err(ClientError::HandleClosed)));
	assert!(matches!(file.close().await, Err(ClientError::HandleClosed)));
}

// ============================================================================
// Directories
// ============================================================================

#[tokio::test]
async fn test_readdir_batches_until_exhaustion() {
	let server = MiniServer::new()
		.with_dir("/d", &["one", "two", "three", "four", "five"])
		.with_file("/d/one", b"1")
		.with_file("/d/two", b"22")
		.with_file("/d/three", b"333")
		.with_file("/d/four", b"4444")
		.with_file("/d/five", b"55555");
	let client = connect(server).await;

	let mut dir = client.opendir("/d").await.unwrap();
	let mut names = Vec::new();
	while let Some(batch) = dir.read_dir().await.unwrap() {
		for entry in batch {
			names.push(entry.filename);
		}
	}
	names.sort();
	// dot entries are filtered, everything else arrives exactly once
	assert_eq!(names, vec!["five", "four", "one", "three", "two"]);

	// exhausted listings stay exhausted; restarting takes a fresh opendir
	assert!(dir.read_dir().await.unwrap().is_none());
	dir.close().await.unwrap();
}

#[tokio::test]
async fn test_read_all_drains_listing() {
	let server = MiniServer::new().with_dir("/d", &["a", "b"]).with_file("/d/a", b"").with_file("/d/b", b"");
	let client = connect(server).await;
	let mut dir = client.opendir("/d").await.unwrap();
	let entries = dir.read_all().await.unwrap();
	assert_eq!(entries.len(), 2);
	dir.close().await.unwrap();
}

#[tokio::test]
async fn test_opendir_missing_reports_no_such_file() {
	let client = connect(MiniServer::new()).await;
	let err = client.opendir("/nope").await.unwrap_err();
	assert_eq!(status_code(&err), Some(StatusCode::NoSuchFile));
}

// ============================================================================
// Namespace operations
// ============================================================================

#[tokio::test]
async fn test_remove_then_stat_fails() {
	let client = connect(MiniServer::new().with_file("/f", b"x")).await;
	client.remove("/f").await.unwrap();
	let err = client.lstat("/f").await.unwrap_err();
	assert_eq!(status_code(&err), Some(StatusCode::NoSuchFile));
}

#[tokio::test]
async fn test_remove_missing_fails_and_is_recoverable() {
	let client = connect(MiniServer::new().with_file("/keep", b"x")).await;
	let err = client.remove("/missing").await.unwrap_err();
	assert_eq!(status_code(&err), Some(StatusCode::NoSuchFile));
	// the connection survives an ordinary status failure
	assert!(client.lstat("/keep").await.is_ok());
}

#[tokio::test]
async fn test_rename_moves_entry() {
	let client = connect(MiniServer::new().with_file("/a", b"payload")).await;
	client.rename("/a", "/b").await.unwrap();

	let err = client.lstat("/a").await.unwrap_err();
	assert_eq!(status_code(&err), Some(StatusCode::NoSuchFile));
	assert_eq!(client.lstat("/b").await.unwrap().size, Some(7));
}

#[tokio::test]
async fn test_mkdir_rmdir() {
	let client = connect(MiniServer::new()).await;
	client.mkdir("/newdir").await.unwrap();
	assert!(client.lstat("/newdir").await.unwrap().is_dir());
	client.rmdir("/newdir").await.unwrap();
	let err = client.lstat("/newdir").await.unwrap_err();
	assert_eq!(status_code(&err), Some(StatusCode::NoSuchFile));
}

#[tokio::test]
async fn test_symlink_and_readlink() {
	let client = connect(MiniServer::new()).await;
	client.symlink("/target", "/link").await.unwrap();
	assert_eq!(client.readlink("/link").await.unwrap(), "/target");
}

#[tokio::test]
async fn test_setstat_round_trips() {
	let client = connect(MiniServer::new().with_file("/f", b"x")).await;
	let mut attrs = FileAttributes::new();
	attrs.atime = Some(1_600_000_000);
	attrs.mtime = Some(1_600_000_000);
	client.setstat("/f", attrs.clone()).await.unwrap();

	// same operation against an open handle
	let mut file = client.open("/f").await.unwrap();
	file.setstat(attrs).await.unwrap();
	file.close().await.unwrap();
}

// vim: ts=4
