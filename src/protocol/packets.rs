//! Typed protocol packets
//!
//! One variant per operation. Requests encode to a complete frame with the
//! caller's request id; responses decode from a frame body with the id
//! already stripped. Both directions exist for every type so that tests can
//! drive a scripted in-memory server against the real codec.

use crate::error::{StatusCode, StatusError};

use super::attrs::FileAttributes;
use super::consts::PacketType;
use super::error::{ProtocolError, ProtocolResult};
use super::wire::{PacketDecoder, PacketEncoder};

/// Opaque server-issued token naming an open remote file or directory.
/// The bytes are never interpreted, only echoed back in later requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle(Vec<u8>);

impl Handle {
	pub fn new(raw: Vec<u8>) -> Self {
		Handle(raw)
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

/// One (name, attributes) pair from a NAME response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
	/// Bare file name, no path components
	pub filename: String,
	/// Server-formatted long listing line (ls -l style), informational only
	pub longname: String,
	pub attrs: FileAttributes,
}

/// Request packets, client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
	Open { path: String, pflags: u32, attrs: FileAttributes },
	Close { handle: Handle },
	Read { handle: Handle, offset: u64, len: u32 },
	Write { handle: Handle, offset: u64, data: Vec<u8> },
	Lstat { path: String },
	Fstat { handle: Handle },
	Setstat { path: String, attrs: FileAttributes },
	Fsetstat { handle: Handle, attrs: FileAttributes },
	Opendir { path: String },
	Readdir { handle: Handle },
	Remove { path: String },
	Mkdir { path: String, attrs: FileAttributes },
	Rmdir { path: String },
	Stat { path: String },
	Rename { old_path: String, new_path: String },
	Readlink { path: String },
	Symlink { target: String, link_path: String },
}

impl Request {
	pub fn packet_type(&self) -> PacketType {
		match self {
			Request::Open { .. } => PacketType::Open,
			Request::Close { .. } => PacketType::Close,
			Request::Read { .. } => PacketType::Read,
			Request::Write { .. } => PacketType::Write,
			Request::Lstat { .. } => PacketType::Lstat,
			Request::Fstat { .. } => PacketType::Fstat,
			Request::Setstat { .. } => PacketType::Setstat,
			Request::Fsetstat { .. } => PacketType::Fsetstat,
			Request::Opendir { .. } => PacketType::Opendir,
			Request::Readdir { .. } => PacketType::Readdir,
			Request::Remove { .. } => PacketType::Remove,
			Request::Mkdir { .. } => PacketType::Mkdir,
			Request::Rmdir { .. } => PacketType::Rmdir,
			Request::Stat { .. } => PacketType::Stat,
			Request::Rename { .. } => PacketType::Rename,
			Request::Readlink { .. } => PacketType::Readlink,
			Request::Symlink { .. } => PacketType::Symlink,
		}
	}

	/// Encode a complete frame, length prefix included
	pub fn encode(&self, request_id: u32) -> Vec<u8> {
		let mut enc = PacketEncoder::new(self.packet_type(), Some(request_id));
		match self {
			Request::Open { path, pflags, attrs } => {
				enc.put_str(path);
				enc.put_u32(*pflags);
				attrs.encode(&mut enc);
			}
			Request::Close { handle } | Request::Readdir { handle } | Request::Fstat { handle } => {
				enc.put_bytes(handle.as_bytes());
			}
			Request::Read { handle, offset, len } => {
				enc.put_bytes(handle.as_bytes());
				enc.put_u64(*offset);
				enc.put_u32(*len);
			}
			Request::Write { handle, offset, data } => {
				enc.put_bytes(handle.as_bytes());
				enc.put_u64(*offset);
				enc.put_bytes(data);
			}
			Request::Lstat { path }
			| Request::Opendir { path }
			| Request::Remove { path }
			| Request::Rmdir { path }
			| Request::Stat { path }
			| Request::Readlink { path } => {
				enc.put_str(path);
			}
			Request::Setstat { path, attrs } => {
				enc.put_str(path);
				attrs.encode(&mut enc);
			}
			Request::Fsetstat { handle, attrs } => {
				enc.put_bytes(handle.as_bytes());
				attrs.encode(&mut enc);
			}
			Request::Mkdir { path, attrs } => {
				enc.put_str(path);
				attrs.encode(&mut enc);
			}
			Request::Rename { old_path, new_path } => {
				enc.put_str(old_path);
				enc.put_str(new_path);
			}
			Request::Symlink { target, link_path } => {
				// SFTP v3 field order: target first, then the link to create
				enc.put_str(target);
				enc.put_str(link_path);
			}
		}
		enc.finish()
	}

	/// Decode a frame body (type byte onward). Returns the request id too.
	/// The client never calls this; scripted test servers do.
	pub fn decode(body: &[u8]) -> ProtocolResult<(u32, Request)> {
		let mut dec = PacketDecoder::new(body);
		let type_byte = dec.take_u8()?;
		let packet_type = PacketType::from_u8(type_byte)
			.ok_or_else(|| ProtocolError::BadMessage(format!("unknown packet type {}", type_byte)))?;
		let id = dec.take_u32()?;
		let request = match packet_type {
			PacketType::Open => Request::Open {
				path: dec.take_str()?,
				pflags: dec.take_u32()?,
				attrs: FileAttributes::decode(&mut dec)?,
			},
			PacketType::Close => Request::Close { handle: Handle::new(dec.take_bytes()?) },
			PacketType::Read => Request::Read {
				handle: Handle::new(dec.take_bytes()?),
				offset: dec.take_u64()?,
				len: dec.take_u32()?,
			},
			PacketType::Write => Request::Write {
				handle: Handle::new(dec.take_bytes()?),
				offset: dec.take_u64()?,
				data: dec.take_bytes()?,
			},
			PacketType::Lstat => Request::Lstat { path: dec.take_str()? },
			PacketType::Fstat => Request::Fstat { handle: Handle::new(dec.take_bytes()?) },
			PacketType::Setstat => Request::Setstat {
				path: dec.take_str()?,
				attrs: FileAttributes::decode(&mut dec)?,
			},
			PacketType::Fsetstat => Request::Fsetstat {
				handle: Handle::new(dec.take_bytes()?),
				attrs: FileAttributes::decode(&mut dec)?,
			},
			PacketType::Opendir => Request::Opendir { path: dec.take_str()? },
			PacketType::Readdir => Request::Readdir { handle: Handle::new(dec.take_bytes()?) },
			PacketType::Remove => Request::Remove { path: dec.take_str()? },
			PacketType::Mkdir => Request::Mkdir {
				path: dec.take_str()?,
				attrs: FileAttributes::decode(&mut dec)?,
			},
			PacketType::Rmdir => Request::Rmdir { path: dec.take_str()? },
			PacketType::Stat => Request::Stat { path: dec.take_str()? },
			PacketType::Rename => Request::Rename {
				old_path: dec.take_str()?,
				new_path: dec.take_str()?,
			},
			PacketType::Readlink => Request::Readlink { path: dec.take_str()? },
			PacketType::Symlink => Request::Symlink {
				target: dec.take_str()?,
				link_path: dec.take_str()?,
			},
			other => {
				return Err(ProtocolError::BadMessage(format!(
					"packet type {} is not a request",
					other as u8
				)))
			}
		};
		Ok((id, request))
	}
}

/// Response packets, server to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
	Status { code: StatusCode, message: String, language: String },
	Handle(Handle),
	Data(Vec<u8>),
	Name(Vec<NameEntry>),
	Attrs(FileAttributes),
	ExtendedReply(Vec<u8>),
}

impl Response {
	pub fn packet_type(&self) -> PacketType {
		match self {
			Response::Status { .. } => PacketType::Status,
			Response::Handle(_) => PacketType::Handle,
			Response::Data(_) => PacketType::Data,
			Response::Name(_) => PacketType::Name,
			Response::Attrs(_) => PacketType::Attrs,
			Response::ExtendedReply(_) => PacketType::ExtendedReply,
		}
	}

	/// Decode from a packet type tag and the payload that followed the id
	pub fn decode(type_byte: u8, payload: &[u8]) -> ProtocolResult<Response> {
		let mut dec = PacketDecoder::new(payload);
		match PacketType::from_u8(type_byte) {
			Some(PacketType::Status) => {
				let code = StatusCode::from_u32(dec.take_u32()?);
				// some servers omit the trailing message and language fields
				let message = if dec.remaining() > 0 { dec.take_str()? } else { String::new() };
				let language = if dec.remaining() > 0 { dec.take_str()? } else { String::new() };
				Ok(Response::Status { code, message, language })
			}
			Some(PacketType::Handle) => Ok(Response::Handle(Handle::new(dec.take_bytes()?))),
			Some(PacketType::Data) => Ok(Response::Data(dec.take_bytes()?)),
			Some(PacketType::Name) => {
				let count = dec.take_u32()?;
				let mut entries = Vec::with_capacity(count as usize);
				for _ in 0..count {
					let filename = dec.take_str()?;
					let longname = dec.take_str()?;
					let attrs = FileAttributes::decode(&mut dec)?;
					entries.push(NameEntry { filename, longname, attrs });
				}
				Ok(Response::Name(entries))
			}
			Some(PacketType::Attrs) => Ok(Response::Attrs(FileAttributes::decode(&mut dec)?)),
			Some(PacketType::ExtendedReply) => {
				Ok(Response::ExtendedReply(dec.take_remaining().to_vec()))
			}
			_ => Err(ProtocolError::BadMessage(format!(
				"packet type {} is not a response",
				type_byte
			))),
		}
	}

	/// Encode a complete frame, length prefix included. Used by scripted
	/// test servers; the client only decodes responses.
	pub fn encode(&self, request_id: u32) -> Vec<u8> {
		let mut enc = PacketEncoder::new(self.packet_type(), Some(request_id));
		match self {
			Response::Status { code, message, language } => {
				enc.put_u32(code.as_u32());
				enc.put_str(message);
				enc.put_str(language);
			}
			Response::Handle(handle) => enc.put_bytes(handle.as_bytes()),
			Response::Data(data) => enc.put_bytes(data),
			Response::Name(entries) => {
				enc.put_u32(entries.len() as u32);
				for entry in entries {
					enc.put_str(&entry.filename);
					enc.put_str(&entry.longname);
					entry.attrs.encode(&mut enc);
				}
			}
			Response::Attrs(attrs) => attrs.encode(&mut enc),
			Response::ExtendedReply(raw) => {
				for b in raw.iter() {
					enc.put_u8(*b);
				}
			}
		}
		enc.finish()
	}
}

/// Turn a decoded status payload into a result: OK is success, everything
/// else is a typed failure carrying the numeric code.
pub fn status_to_result(code: StatusCode, message: String, language: String) -> Result<(), StatusError> {
	match code {
		StatusCode::Ok => Ok(()),
		code => Err(StatusError::new(code, message, language)),
	}
}


// vim: ts=4
