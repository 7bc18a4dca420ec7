//! Protocol error types
//!
//! Errors raised below the operation layer: framing and field decoding,
//! response correlation and connection death. Server-reported status codes
//! are not protocol errors; they live in the crate-level error module.

use std::fmt;
use std::io;

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Protocol error type
#[derive(Debug)]
pub enum ProtocolError {
	/// I/O error from the underlying stream
	Io(io::Error),
	/// Malformed packet (truncated field, bad length prefix, unknown tag)
	BadMessage(String),
	/// The response kind did not match the request that was sent
	UnexpectedResponse { expected: &'static str, got: u8 },
	/// The connection is dead; every pending and future request fails this way
	ConnectionLost,
	/// Version negotiation failed
	Handshake(String),
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
			ProtocolError::BadMessage(msg) => write!(f, "Bad message: {}", msg),
			ProtocolError::UnexpectedResponse { expected, got } => {
				write!(f, "Unexpected response packet: expected {}, got type {}", expected, got)
			}
			ProtocolError::ConnectionLost => write!(f, "Connection lost"),
			ProtocolError::Handshake(msg) => write!(f, "Handshake failed: {}", msg),
		}
	}
}

impl std::error::Error for ProtocolError {}

impl From<io::Error> for ProtocolError {
	fn from(e: io::Error) -> Self {
		ProtocolError::Io(e)
	}
}

impl From<String> for ProtocolError {
	fn from(e: String) -> Self {
		ProtocolError::BadMessage(e)
	}
}

impl From<&str> for ProtocolError {
	fn from(e: &str) -> Self {
		ProtocolError::BadMessage(e.to_string())
	}
}

// vim: ts=4
