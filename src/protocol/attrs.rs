//! File attribute record
//!
//! The optional-field attribute block carried by OPEN, MKDIR, SETSTAT and
//! the ATTRS/NAME responses. A 32-bit bitmask announces which fields follow;
//! absent fields are simply not encoded and decode to `None`.

use super::wire::{PacketDecoder, PacketEncoder};
use super::error::ProtocolResult;

/// Attribute presence bits (SSH_FILEXFER_ATTR_*)
#[derive(Debug, Clone, Copy)]
pub struct AttrFlags(pub u32);

impl AttrFlags {
	pub const SIZE: u32 = 0x00000001;
	pub const UIDGID: u32 = 0x00000002;
	pub const PERMISSIONS: u32 = 0x00000004;
	pub const ACMODTIME: u32 = 0x00000008;
	pub const EXTENDED: u32 = 0x80000000;
}

/// Attributes of a remote file system entry.
///
/// Field order on the wire is fixed: size, uid+gid, permissions,
/// atime+mtime, extended pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
	/// Size in bytes
	pub size: Option<u64>,
	/// Owning user id
	pub uid: Option<u32>,
	/// Owning group id
	pub gid: Option<u32>,
	/// Permission and file-type bits (POSIX st_mode layout)
	pub permissions: Option<u32>,
	/// Access time, seconds since the epoch
	pub atime: Option<u32>,
	/// Modification time, seconds since the epoch
	pub mtime: Option<u32>,
	/// Extension name/value pairs, carried through uninterpreted
	pub extended: Vec<(String, String)>,
}

impl FileAttributes {
	pub fn new() -> Self {
		Self::default()
	}

	/// Attributes carrying only a size, for truncating opens
	pub fn with_size(size: u64) -> Self {
		FileAttributes { size: Some(size), ..Self::default() }
	}

	/// Attributes carrying only permission bits
	pub fn with_permissions(permissions: u32) -> Self {
		FileAttributes { permissions: Some(permissions), ..Self::default() }
	}

	fn flags(&self) -> u32 {
		let mut flags = 0u32;
		if self.size.is_some() {
			flags |= AttrFlags::SIZE;
		}
		if self.uid.is_some() && self.gid.is_some() {
			flags |= AttrFlags::UIDGID;
		}
		if self.permissions.is_some() {
			flags |= AttrFlags::PERMISSIONS;
		}
		if self.atime.is_some() && self.mtime.is_some() {
			flags |= AttrFlags::ACMODTIME;
		}
		if !self.extended.is_empty() {
			flags |= AttrFlags::EXTENDED;
		}
		flags
	}

	pub fn encode(&self, enc: &mut PacketEncoder) {
		enc.put_u32(self.flags());
		if let Some(size) = self.size {
			enc.put_u64(size);
		}
		if let (Some(uid), Some(gid)) = (self.uid, self.gid) {
			enc.put_u32(uid);
			enc.put_u32(gid);
		}
		if let Some(permissions) = self.permissions {
			enc.put_u32(permissions);
		}
		if let (Some(atime), Some(mtime)) = (self.atime, self.mtime) {
			enc.put_u32(atime);
			enc.put_u32(mtime);
		}
		if !self.extended.is_empty() {
			enc.put_u32(self.extended.len() as u32);
			for (name, value) in &self.extended {
				enc.put_str(name);
				enc.put_str(value);
			}
		}
	}

	pub fn decode(dec: &mut PacketDecoder<'_>) -> ProtocolResult<Self> {
		let flags = dec.take_u32()?;
		let mut attrs = FileAttributes::new();
		if flags & AttrFlags::SIZE != 0 {
			attrs.size = Some(dec.take_u64()?);
		}
		if flags & AttrFlags::UIDGID != 0 {
			attrs.uid = Some(dec.take_u32()?);
			attrs.gid = Some(dec.take_u32()?);
		}
		if flags & AttrFlags::PERMISSIONS != 0 {
			attrs.permissions = Some(dec.take_u32()?);
		}
		if flags & AttrFlags::ACMODTIME != 0 {
			attrs.atime = Some(dec.take_u32()?);
			attrs.mtime = Some(dec.take_u32()?);
		}
		if flags & AttrFlags::EXTENDED != 0 {
			let count = dec.take_u32()?;
			for _ in 0..count {
				let name = dec.take_str()?;
				let value = dec.take_str()?;
				attrs.extended.push((name, value));
			}
		}
		Ok(attrs)
	}

	fn format_bits(&self) -> Option<u32> {
		self.permissions.map(|p| p & (libc::S_IFMT as u32))
	}

	pub fn is_dir(&self) -> bool {
		self.format_bits() == Some(libc::S_IFDIR as u32)
	}

	pub fn is_regular(&self) -> bool {
		self.format_bits() == Some(libc::S_IFREG as u32)
	}

	pub fn is_symlink(&self) -> bool {
		self.format_bits() == Some(libc::S_IFLNK as u32)
	}
}


// vim: ts=4
