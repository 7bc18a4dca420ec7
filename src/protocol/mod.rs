//! SFTP v3 protocol engine
//!
//! Everything below the operation layer: the wire codec, the typed packet
//! set, the request dispatcher multiplexing one shared stream, and the
//! version handshake. The operation layer (`crate::client`) composes these
//! and is the only intended consumer.

pub mod attrs;
pub mod consts;
pub mod dispatch;
pub mod error;
pub mod packets;
pub mod session;
pub mod wire;

pub use attrs::{AttrFlags, FileAttributes};
pub use consts::{OpenFlags, PacketType, MAX_DATA_LEN, SFTP_VERSION};
pub use error::{ProtocolError, ProtocolResult};
pub use packets::{Handle, NameEntry, Request, Response};
pub use session::Session;

// vim: ts=4
