//! Request dispatcher
//!
//! Owns both halves of the connection's byte stream. Any number of tasks
//! may have requests in flight at once; the wire never sees interleaved
//! frames because the write side is locked per frame, and each caller
//! suspends on its own single-use delivery slot until the background read
//! loop hands it the response matching its request id.
//!
//! Once the read loop fails (stream closed, malformed frame, transport
//! error) the dispatcher is dead for good: every pending caller is woken
//! with a connection-lost failure and every later send fails the same way
//! without touching the stream.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::{ProtocolError, ProtocolResult};
use super::packets::Request;
use super::wire::read_frame;

/// One incoming frame with the request id already stripped
#[derive(Debug)]
pub struct RawResponse {
	pub packet_type: u8,
	pub payload: Vec<u8>,
}

struct PendingTable {
	next_id: u32,
	slots: HashMap<u32, oneshot::Sender<RawResponse>>,
	failed: bool,
}

/// Pick the next request id, skipping any still in flight. The counter
/// wraps, so an id is only reused after its response was delivered or the
/// request abandoned.
fn alloc_id(pending: &mut PendingTable) -> u32 {
	loop {
		let id = pending.next_id;
		pending.next_id = pending.next_id.wrapping_add(1);
		if !pending.slots.contains_key(&id) {
			return id;
		}
	}
}

struct Shared {
	pending: Mutex<PendingTable>,
}

impl Shared {
	/// Terminal state: wake every pending caller and refuse future sends
	fn fail_all(&self) {
		let mut pending = self.pending.lock().unwrap();
		pending.failed = true;
		// dropping the senders wakes the receivers with a recv error,
		// which callers surface as connection-lost
		pending.slots.clear();
	}
}

pub struct Dispatcher {
	writer: tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
	shared: Arc<Shared>,
	reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
	/// Take ownership of both stream halves and start the read loop.
	/// The handshake must already be complete; from here on every frame
	/// carries a request id.
	pub fn start<R, W>(reader: R, writer: W) -> Self
	where
		R: AsyncRead + Send + Unpin + 'static,
		W: AsyncWrite + Send + Unpin + 'static,
	{
		let shared = Arc::new(Shared {
			pending: Mutex::new(PendingTable { next_id: 1, slots: HashMap::new(), failed: false }),
		});
		let loop_shared = Arc::clone(&shared);
		let task = tokio::spawn(async move {
			let mut reader = reader;
			let err = read_loop(&loop_shared, &mut reader).await;
			debug!("read loop exited: {}", err);
			loop_shared.fail_all();
		});
		Dispatcher {
			writer: tokio::sync::Mutex::new(Box::new(writer)),
			shared,
			reader_task: Mutex::new(Some(task)),
		}
	}

	/// Send one request and suspend until its response arrives or the
	/// connection dies. There is no timeout at this layer; a caller that
	/// stops waiting abandons the slot, and the eventual response is
	/// discarded by the read loop.
	pub async fn call(&self, request: &Request) -> ProtocolResult<RawResponse> {
		let (id, rx) = {
			let mut pending = self.shared.pending.lock().unwrap();
			if pending.failed {
				return Err(ProtocolError::ConnectionLost);
			}
			let id = alloc_id(&mut pending);
			let (tx, rx) = oneshot::channel();
			pending.slots.insert(id, tx);
			(id, rx)
		};

		let frame = request.encode(id);
		{
			let mut writer = self.writer.lock().await;
			let result = match writer.write_all(&frame).await {
				Ok(()) => writer.flush().await,
				Err(e) => Err(e),
			};
			if let Err(e) = result {
				self.shared.pending.lock().unwrap().slots.remove(&id);
				self.shared.fail_all();
				return Err(ProtocolError::Io(e));
			}
		}

		rx.await.map_err(|_| ProtocolError::ConnectionLost)
	}

	/// Stop the read loop, fail all pending requests and shut the stream down
	pub async fn close(&self) {
		if let Some(task) = self.reader_task.lock().unwrap().take() {
			task.abort();
		}
		self.shared.fail_all();
		let mut writer = self.writer.lock().await;
		let _ = writer.shutdown().await;
	}
}

impl Drop for Dispatcher {
	fn drop(&mut self) {
		if let Some(task) = self.reader_task.lock().unwrap().take() {
			task.abort();
		}
		self.shared.fail_all();
	}
}

/// Sole reader of the stream: decode one frame at a time and deliver it to
/// whichever caller registered the id. Runs until the first error.
async fn read_loop<R>(shared: &Shared, reader: &mut R) -> ProtocolError
where
	R: AsyncRead + Unpin,
{
	loop {
		let body = match read_frame(reader).await {
			Ok(body) => body,
			Err(e) => return e,
		};
		if body.len() < 5 {
			return ProtocolError::BadMessage(format!(
				"frame of {} bytes cannot carry a type and request id",
				body.len()
			));
		}
		let packet_type = body[0];
		let id = u32::from_be_bytes([body[1], body[2], body[3], body[4]]);
		let payload = body[5..].to_vec();

		let slot = shared.pending.lock().unwrap().slots.remove(&id);
		match slot {
			Some(tx) => {
				if tx.send(RawResponse { packet_type, payload }).is_err() {
					debug!("request {} was abandoned before its response arrived", id);
				}
			}
			// a frame nobody asked for is a server bug, not a reason to die
			None => warn!("dropping frame of type {} for unknown request id {}", packet_type, id),
		}
	}
}


// vim: ts=4
