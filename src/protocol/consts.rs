//! Protocol constants
//!
//! Packet type tags, open flags and size limits for SFTP version 3
//! (draft-ietf-secsh-filexfer-02).

/// Protocol version announced in INIT and required in VERSION
pub const SFTP_VERSION: u32 = 3;

/// Largest data payload carried by one READ or WRITE request.
/// Larger transfers are split into multiple round trips.
pub const MAX_DATA_LEN: usize = 32768;

/// Upper bound on an incoming frame body. Anything larger is treated as a
/// corrupt length prefix, not an allocation request.
pub const MAX_FRAME_LEN: usize = MAX_DATA_LEN + 1024;

/// Packet type tag, the first byte of every frame body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
	/// SSH_FXP_INIT - client version announcement (carries no request id)
	Init = 1,
	/// SSH_FXP_VERSION - server version reply (carries no request id)
	Version = 2,
	/// SSH_FXP_OPEN
	Open = 3,
	/// SSH_FXP_CLOSE
	Close = 4,
	/// SSH_FXP_READ
	Read = 5,
	/// SSH_FXP_WRITE
	Write = 6,
	/// SSH_FXP_LSTAT
	Lstat = 7,
	/// SSH_FXP_FSTAT
	Fstat = 8,
	/// SSH_FXP_SETSTAT
	Setstat = 9,
	/// SSH_FXP_FSETSTAT
	Fsetstat = 10,
	/// SSH_FXP_OPENDIR
	Opendir = 11,
	/// SSH_FXP_READDIR
	Readdir = 12,
	/// SSH_FXP_REMOVE
	Remove = 13,
	/// SSH_FXP_MKDIR
	Mkdir = 14,
	/// SSH_FXP_RMDIR
	Rmdir = 15,
	/// SSH_FXP_STAT
	Stat = 17,
	/// SSH_FXP_RENAME
	Rename = 18,
	/// SSH_FXP_READLINK
	Readlink = 19,
	/// SSH_FXP_SYMLINK
	Symlink = 20,
	/// SSH_FXP_STATUS
	Status = 101,
	/// SSH_FXP_HANDLE
	Handle = 102,
	/// SSH_FXP_DATA
	Data = 103,
	/// SSH_FXP_NAME
	Name = 104,
	/// SSH_FXP_ATTRS
	Attrs = 105,
	/// SSH_FXP_EXTENDED
	Extended = 200,
	/// SSH_FXP_EXTENDED_REPLY
	ExtendedReply = 201,
}

impl PacketType {
	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			1 => Some(PacketType::Init),
			2 => Some(PacketType::Version),
			3 => Some(PacketType::Open),
			4 => Some(PacketType::Close),
			5 => Some(PacketType::Read),
			6 => Some(PacketType::Write),
			7 => Some(PacketType::Lstat),
			8 => Some(PacketType::Fstat),
			9 => Some(PacketType::Setstat),
			10 => Some(PacketType::Fsetstat),
			11 => Some(PacketType::Opendir),
			12 => Some(PacketType::Readdir),
			13 => Some(PacketType::Remove),
			14 => Some(PacketType::Mkdir),
			15 => Some(PacketType::Rmdir),
			17 => Some(PacketType::Stat),
			18 => Some(PacketType::Rename),
			19 => Some(PacketType::Readlink),
			20 => Some(PacketType::Symlink),
			101 => Some(PacketType::Status),
			102 => Some(PacketType::Handle),
			103 => Some(PacketType::Data),
			104 => Some(PacketType::Name),
			105 => Some(PacketType::Attrs),
			200 => Some(PacketType::Extended),
			201 => Some(PacketType::ExtendedReply),
			_ => None,
		}
	}
}

/// File open flags (SSH_FXF_*), combined bitwise in an OPEN request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags(pub u32);

impl OpenFlags {
	/// Open for reading
	pub const READ: u32 = 0x00000001;
	/// Open for writing
	pub const WRITE: u32 = 0x00000002;
	/// Writes always land at end of file
	pub const APPEND: u32 = 0x00000004;
	/// Create if the file does not exist
	pub const CREAT: u32 = 0x00000008;
	/// Truncate to zero length on open
	pub const TRUNC: u32 = 0x00000010;
	/// Fail if the file already exists
	pub const EXCL: u32 = 0x00000020;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_packet_type_roundtrip() {
		for value in 0u8..=255 {
			if let Some(t) = PacketType::from_u8(value) {
				assert_eq!(t as u8, value);
			}
		}
	}

	#[test]
	fn test_packet_type_tags() {
		assert_eq!(PacketType::Init as u8, 1);
		assert_eq!(PacketType::Symlink as u8, 20);
		assert_eq!(PacketType::Status as u8, 101);
		assert_eq!(PacketType::ExtendedReply as u8, 201);
		assert_eq!(PacketType::from_u8(16), None); // REALPATH not in the operation set
		assert_eq!(PacketType::from_u8(0), None);
	}
}

// vim: ts=4
