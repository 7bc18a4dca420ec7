//! Error types for sftpr operations
//!
//! Three layers, kept distinct on purpose: server-reported status outcomes
//! (`StatusError`, ordinary and recoverable), protocol failures
//! (`ProtocolError`, fatal to a request or the whole session) and transport
//! setup failures (`ConnectionError`). `ClientError` is the caller-facing
//! sum of all of them.

use std::error::Error;
use std::fmt;
use std::io;

pub use crate::protocol::error::ProtocolError;

/// Server-reported outcome classification (SSH_FX_*)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
	/// SSH_FX_OK - success
	Ok,
	/// SSH_FX_EOF - end of file; never surfaced as an error by this client
	Eof,
	/// SSH_FX_NO_SUCH_FILE
	NoSuchFile,
	/// SSH_FX_PERMISSION_DENIED
	PermissionDenied,
	/// SSH_FX_FAILURE - generic failure
	Failure,
	/// SSH_FX_BAD_MESSAGE
	BadMessage,
	/// SSH_FX_NO_CONNECTION
	NoConnection,
	/// SSH_FX_CONNECTION_LOST
	ConnectionLost,
	/// SSH_FX_OP_UNSUPPORTED
	OpUnsupported,
	/// Vendor extension code, preserved numerically
	Extended(u32),
}

impl StatusCode {
	pub fn from_u32(value: u32) -> Self {
		match value {
			0 => StatusCode::Ok,
			1 => StatusCode::Eof,
			2 => StatusCode::NoSuchFile,
			3 => StatusCode::PermissionDenied,
			4 => StatusCode::Failure,
			5 => StatusCode::BadMessage,
			6 => StatusCode::NoConnection,
			7 => StatusCode::ConnectionLost,
			8 => StatusCode::OpUnsupported,
			other => StatusCode::Extended(other),
		}
	}

	pub fn as_u32(&self) -> u32 {
		match self {
			StatusCode::Ok => 0,
			StatusCode::Eof => 1,
			StatusCode::NoSuchFile => 2,
			StatusCode::PermissionDenied => 3,
			StatusCode::Failure => 4,
			StatusCode::BadMessage => 5,
			StatusCode::NoConnection => 6,
			StatusCode::ConnectionLost => 7,
			StatusCode::OpUnsupported => 8,
			StatusCode::Extended(other) => *other,
		}
	}

	/// Fallback text for servers that send an empty message field
	pub fn message(&self) -> &'static str {
		match self {
			StatusCode::Ok => "success",
			StatusCode::Eof => "end of file",
			StatusCode::NoSuchFile => "no such file or directory",
			StatusCode::PermissionDenied => "permission denied",
			StatusCode::Failure => "failure",
			StatusCode::BadMessage => "bad message",
			StatusCode::NoConnection => "no connection",
			StatusCode::ConnectionLost => "connection lost",
			StatusCode::OpUnsupported => "operation unsupported",
			StatusCode::Extended(_) => "server-specific failure",
		}
	}
}

/// Typed failure carrying a server status code and message
#[derive(Debug, Clone)]
pub struct StatusError {
	pub code: StatusCode,
	pub message: String,
	pub language: String,
}

impl StatusError {
	pub fn new(code: StatusCode, message: String, language: String) -> Self {
		StatusError { code, message, language }
	}
}

impl fmt::Display for StatusError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.message.is_empty() {
			write!(f, "sftp status {}: {}", self.code.as_u32(), self.code.message())
		} else {
			write!(f, "sftp status {}: {}", self.code.as_u32(), self.message)
		}
	}
}

impl Error for StatusError {}

/// Caller-facing error for every client operation
#[derive(Debug)]
pub enum ClientError {
	/// Server reported a non-OK status
	Status(StatusError),

	/// Protocol-level failure (bad message, unexpected response, dead connection)
	Protocol(ProtocolError),

	/// Operation attempted on a handle that was already closed
	HandleClosed,

	/// A multi-chunk write failed after some chunks were confirmed.
	/// `written` is the number of bytes durably written before the failure.
	PartialWrite { written: usize, source: Box<ClientError> },

	/// Transport setup failure (nested)
	Connection(ConnectionError),
}

impl ClientError {
	/// The server status behind this error, if that is what it is
	pub fn status(&self) -> Option<&StatusError> {
		match self {
			ClientError::Status(e) => Some(e),
			ClientError::PartialWrite { source, .. } => source.status(),
			_ => None,
		}
	}

	/// True when the error is a no-such-file status
	pub fn is_not_found(&self) -> bool {
		self.status().map(|s| s.code == StatusCode::NoSuchFile).unwrap_or(false)
	}
}

impl fmt::Display for ClientError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ClientError::Status(e) => write!(f, "{}", e),
			ClientError::Protocol(e) => write!(f, "Protocol error: {}", e),
			ClientError::HandleClosed => write!(f, "Handle is closed"),
			ClientError::PartialWrite { written, source } => {
				write!(f, "Write failed after {} bytes: {}", written, source)
			}
			ClientError::Connection(e) => write!(f, "Connection error: {}", e),
		}
	}
}

impl Error for ClientError {}

impl From<StatusError> for ClientError {
	fn from(e: StatusError) -> Self {
		ClientError::Status(e)
	}
}

impl From<ProtocolError> for ClientError {
	fn from(e: ProtocolError) -> Self {
		ClientError::Protocol(e)
	}
}

impl From<ConnectionError> for ClientError {
	fn from(e: ConnectionError) -> Self {
		ClientError::Connection(e)
	}
}

impl From<io::Error> for ClientError {
	fn from(e: io::Error) -> Self {
		ClientError::Protocol(ProtocolError::Io(e))
	}
}

/// Transport setup errors
#[derive(Debug)]
pub enum ConnectionError {
	/// Subprocess spawn failed
	SpawnFailed { cmd: String, source: io::Error },

	/// Spawned subprocess did not expose the expected stdio pipe
	StdioUnavailable { what: String },
}

impl fmt::Display for ConnectionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConnectionError::SpawnFailed { cmd, source } => {
				write!(f, "Failed to spawn '{}': {}", cmd, source)
			}
			ConnectionError::StdioUnavailable { what } => {
				write!(f, "Stdio unavailable: {}", what)
			}
		}
	}
}

impl Error for ConnectionError {}


// vim: ts=4
