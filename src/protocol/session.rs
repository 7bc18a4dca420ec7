//! Handshake and session
//!
//! The version exchange is the one part of the protocol outside the
//! request/response id scheme: the client announces its version in an INIT
//! frame, then exactly one VERSION reply must arrive before any other
//! traffic. Only after that does the dispatcher take the stream over.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::consts::{PacketType, SFTP_VERSION};
use super::dispatch::{Dispatcher, RawResponse};
use super::error::{ProtocolError, ProtocolResult};
use super::packets::Request;
use super::wire::{read_frame, PacketDecoder, PacketEncoder};

/// One negotiated connection: protocol version, server extensions and the
/// dispatcher owning the stream. Lives until closed or the stream fails;
/// closing fails every pending request.
pub struct Session {
	version: u32,
	extensions: Vec<(String, String)>,
	dispatcher: Dispatcher,
}

impl Session {
	/// Negotiate on a fresh duplex stream. A reply that is not a VERSION
	/// frame, or announces a version this client does not speak, is fatal;
	/// both halves of the stream are dropped on every failure path.
	pub async fn handshake<R, W>(mut reader: R, mut writer: W) -> ProtocolResult<Session>
	where
		R: AsyncRead + Send + Unpin + 'static,
		W: AsyncWrite + Send + Unpin + 'static,
	{
		let mut enc = PacketEncoder::new(PacketType::Init, None);
		enc.put_u32(SFTP_VERSION);
		writer.write_all(&enc.finish()).await?;
		writer.flush().await?;

		let body = read_frame(&mut reader).await.map_err(|e| match e {
			ProtocolError::Io(e) => {
				ProtocolError::Handshake(format!("no version reply: {}", e))
			}
			other => other,
		})?;
		let mut dec = PacketDecoder::new(&body);
		let type_byte = dec.take_u8()?;
		if type_byte != PacketType::Version as u8 {
			return Err(ProtocolError::Handshake(format!(
				"expected version reply, got packet type {}",
				type_byte
			)));
		}
		let version = dec.take_u32()?;
		if version != SFTP_VERSION {
			return Err(ProtocolError::Handshake(format!(
				"server speaks protocol version {}, this client requires {}",
				version, SFTP_VERSION
			)));
		}

		// extension name/value pairs trail the version field; parsed and
		// exposed, baseline capability is assumed regardless
		let mut extensions = Vec::new();
		while dec.remaining() > 0 {
			let name = dec.take_str()?;
			let value = dec.take_str()?;
			extensions.push((name, value));
		}
		debug!("negotiated version {} with {} extensions", version, extensions.len());

		Ok(Session { version, extensions, dispatcher: Dispatcher::start(reader, writer) })
	}

	/// Negotiated protocol version
	pub fn version(&self) -> u32 {
		self.version
	}

	/// Extension pairs advertised by the server in its version reply
	pub fn extensions(&self) -> &[(String, String)] {
		&self.extensions
	}

	pub fn has_extension(&self, name: &str) -> bool {
		self.extensions.iter().any(|(n, _)| n == name)
	}

	pub(crate) async fn call(&self, request: &Request) -> ProtocolResult<RawResponse> {
		self.dispatcher.call(request).await
	}

	/// Shut the connection down, failing all pending requests
	pub async fn close(&self) {
		self.dispatcher.close().await;
	}
}


// vim: ts=4
