//! Wire primitives
//!
//! Byte-level encoding and decoding shared by every packet type. Integers
//! are fixed-width big-endian; strings and byte blobs are a 4-byte length
//! followed by that many raw bytes. The decoder is a bounds-checked cursor:
//! a field that runs past the end of the buffer is a bad-message error,
//! never an out-of-bounds read.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::consts::{PacketType, MAX_FRAME_LEN};
use super::error::{ProtocolError, ProtocolResult};

/// Builds one outgoing frame: length prefix, type tag, optional request id,
/// then type-specific fields. The length prefix is patched in by `finish`.
pub struct PacketEncoder {
	buf: Vec<u8>,
}

impl PacketEncoder {
	/// Start a frame. INIT is the only packet sent without a request id.
	pub fn new(packet_type: PacketType, request_id: Option<u32>) -> Self {
		let mut buf = Vec::with_capacity(64);
		buf.extend_from_slice(&[0, 0, 0, 0]);
		buf.push(packet_type as u8);
		let mut enc = PacketEncoder { buf };
		if let Some(id) = request_id {
			enc.put_u32(id);
		}
		enc
	}

	pub fn put_u8(&mut self, v: u8) {
		self.buf.push(v);
	}

	pub fn put_u32(&mut self, v: u32) {
		self.buf.extend_from_slice(&v.to_be_bytes());
	}

	pub fn put_u64(&mut self, v: u64) {
		self.buf.extend_from_slice(&v.to_be_bytes());
	}

	/// Length-prefixed byte blob
	pub fn put_bytes(&mut self, v: &[u8]) {
		self.put_u32(v.len() as u32);
		self.buf.extend_from_slice(v);
	}

	/// Length-prefixed UTF-8 string
	pub fn put_str(&mut self, v: &str) {
		self.put_bytes(v.as_bytes());
	}

	/// Patch the length prefix and return the completed frame. The prefix
	/// covers everything after itself: type tag, id and payload.
	pub fn finish(mut self) -> Vec<u8> {
		let body_len = (self.buf.len() - 4) as u32;
		self.buf[..4].copy_from_slice(&body_len.to_be_bytes());
		self.buf
	}
}

/// Bounds-checked cursor over one decoded frame body
pub struct PacketDecoder<'a> {
	buf: &'a [u8],
	pos: usize,
}

impl<'a> PacketDecoder<'a> {
	pub fn new(buf: &'a [u8]) -> Self {
		PacketDecoder { buf, pos: 0 }
	}

	pub fn remaining(&self) -> usize {
		self.buf.len() - self.pos
	}

	fn take(&mut self, n: usize) -> ProtocolResult<&'a [u8]> {
		if self.remaining() < n {
			return Err(ProtocolError::BadMessage(format!(
				"field of {} bytes exceeds {} remaining",
				n,
				self.remaining()
			)));
		}
		let slice = &self.buf[self.pos..self.pos + n];
		self.pos += n;
		Ok(slice)
	}

	pub fn take_u8(&mut self) -> ProtocolResult<u8> {
		Ok(self.take(1)?[0])
	}

	pub fn take_u32(&mut self) -> ProtocolResult<u32> {
		let b = self.take(4)?;
		Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
	}

	pub fn take_u64(&mut self) -> ProtocolResult<u64> {
		let b = self.take(8)?;
		Ok(u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
	}

	/// Length-prefixed byte blob
	pub fn take_bytes(&mut self) -> ProtocolResult<Vec<u8>> {
		let len = self.take_u32()? as usize;
		Ok(self.take(len)?.to_vec())
	}

	/// Everything left in the buffer, consuming it
	pub fn take_remaining(&mut self) -> &'a [u8] {
		let slice = &self.buf[self.pos..];
		self.pos = self.buf.len();
		slice
	}

	/// Length-prefixed field interpreted as UTF-8 text
	pub fn take_str(&mut self) -> ProtocolResult<String> {
		let raw = self.take_bytes()?;
		String::from_utf8(raw)
			.map_err(|_| ProtocolError::BadMessage("string field is not valid UTF-8".to_string()))
	}
}

/// Read one length-prefixed frame body from the stream. Rejects zero-length
/// and oversized prefixes before allocating.
pub async fn read_frame<R>(reader: &mut R) -> ProtocolResult<Vec<u8>>
where
	R: AsyncRead + Unpin,
{
	let mut len_buf = [0u8; 4];
	reader.read_exact(&mut len_buf).await?;
	let len = u32::from_be_bytes(len_buf) as usize;
	if len == 0 || len > MAX_FRAME_LEN {
		return Err(ProtocolError::BadMessage(format!("frame length {} out of range", len)));
	}
	let mut body = vec![0u8; len];
	reader.read_exact(&mut body).await?;
	Ok(body)
}


// vim: ts=4
