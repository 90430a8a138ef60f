use chrono::{DateTime, Utc};
use deku::prelude::*;

use crate::error::SimpleError;

/// Longest name a member can have, in bytes.
pub const MAX_NAME_LENGTH: usize = u16::MAX as usize;

/// Length of an entry header with an empty name.
pub const ENTRY_HEADER_FIXED_LENGTH: usize = 1 + 4 + 8 + 8 + 8 + 2;

/// Largest entry header payload a reader accepts.
pub const MAX_ENTRY_HEADER_LENGTH: usize = ENTRY_HEADER_FIXED_LENGTH + MAX_NAME_LENGTH;

/// Entry header
///
/// Payload of the skippable frame that precedes each member's zstd frame.
#[derive(Clone, Debug, Eq, PartialEq, DekuRead, DekuWrite)]
#[deku(endian = "little")]
pub struct EntryHeader {
	/// File type, see [`EntryKind`].
	#[deku(bytes = "1")]
	pub kind: u8,

	/// POSIX permission bits.
	#[deku(bytes = "4")]
	pub mode: u32,

	/// Modification time, in seconds since the epoch.
	#[deku(bytes = "8")]
	pub modified: i64,

	/// Uncompressed size of the content.
	#[deku(bytes = "8")]
	pub size: u64,

	/// Size of the zstd frame that follows this header.
	#[deku(bytes = "8")]
	pub compressed: u64,

	/// Length of the name in bytes.
	#[deku(bytes = "2")]
	pub name_length: u16,

	/// Member name, UTF-8.
	#[deku(count = "name_length")]
	pub name: Vec<u8>,
}

/// File type of a member.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum EntryKind {
	/// Regular file. The only kind this library writes.
	Regular = 1,
}

/// An archive member, as seen while scanning.
///
/// This is the metadata only; the content is read through the
/// [`ArchiveReader`](crate::archive::ArchiveReader) that returned the entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
	name: String,
	kind: u8,
	mode: u32,
	modified: Option<DateTime<Utc>>,
	size: u64,
}

impl Entry {
	/// Member name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Uncompressed size of the content, in bytes.
	pub fn size(&self) -> u64 {
		self.size
	}

	/// POSIX permission bits.
	pub fn mode(&self) -> u32 {
		self.mode
	}

	/// Modification time, if it's representable.
	pub fn modified(&self) -> Option<DateTime<Utc>> {
		self.modified
	}

	/// Whether this is a regular file.
	pub fn is_regular(&self) -> bool {
		self.kind == EntryKind::Regular as u8
	}
}

impl EntryHeader {
	/// Build the header of a regular member.
	pub fn regular(
		name: &str,
		mode: u32,
		modified: DateTime<Utc>,
		size: u64,
		compressed: u64,
	) -> std::io::Result<Self> {
		let name_length = u16::try_from(name.len())
			.map_err(|_| std::io::Error::other("member name is too long"))?;

		Ok(Self {
			kind: EntryKind::Regular as u8,
			mode,
			modified: modified.timestamp(),
			size,
			compressed,
			name_length,
			name: name.as_bytes().to_vec(),
		})
	}

	/// Convert into the entry view, checking the name is UTF-8.
	pub fn to_entry(&self) -> crate::error::Result<Entry> {
		let name = String::from_utf8(self.name.clone())
			.map_err(|err| SimpleError::parse(format!("member name is not UTF-8: {err}")))?;

		Ok(Entry {
			name,
			kind: self.kind,
			mode: self.mode,
			modified: DateTime::<Utc>::from_timestamp(self.modified, 0),
			size: self.size,
		})
	}
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	#[test]
	fn header_roundtrip() {
		let modified = Utc
			.with_ymd_and_hms(2024, 12, 31, 23, 59, 59)
			.single()
			.expect("date");
		let header =
			EntryHeader::regular("[HDR] BackupProps", 0o644, modified, 120, 80).expect("header");
		let bytes = header.to_bytes().expect("encode");
		assert_eq!(bytes.len(), ENTRY_HEADER_FIXED_LENGTH + 17);

		let (_, decoded) = EntryHeader::from_bytes((bytes.as_slice(), 0)).expect("decode");
		assert_eq!(decoded, header);

		let entry = decoded.to_entry().expect("entry");
		assert_eq!(entry.name(), "[HDR] BackupProps");
		assert_eq!(entry.size(), 120);
		assert_eq!(entry.mode(), 0o644);
		assert_eq!(entry.modified(), Some(modified));
		assert!(entry.is_regular());
	}

	#[test]
	fn name_must_be_utf8() {
		let mut header =
			EntryHeader::regular("x", 0o644, Utc::now(), 0, 0).expect("header");
		header.name = vec![0xFF];
		assert!(header.to_entry().expect_err("invalid").is_parse());
	}
}
