//! Archive file header and format discriminator.
//!
//! The purpose of the header is to identify the file as a backup archive. Its last byte is the
//! [`FormatDiscriminator`], which tells the current multi-member encoding apart from the legacy one.
//!
//! Legacy backups are a single gzip stream of the dossier dump, with no header and no members.
//! They're recognised by their gzip magic so that the caller can be told what they are, but this
//! library does not decode them.

use deku::prelude::*;

use crate::constants::{GZIP_MAGIC, OBACKUP_MAGIC};

/// Archive header
#[derive(Clone, Debug, Eq, PartialEq, DekuRead, DekuWrite)]
#[deku(endian = "little")]
pub struct FileHeader {
	/// Magic number. Asserted to match [`OBACKUP_MAGIC`].
	#[deku(count = "3", assert = "*magic == OBACKUP_MAGIC")]
	pub magic: Vec<u8>,

	/// Format discriminator, as its integer tag.
	#[deku(bytes = "1")]
	pub format: u8,
}

/// Static file magic
///
/// This is a zstd Skippable frame containing the [`FileHeader`] of a multi-member archive, as a
/// hardcoded constant. In a valid archive, the first 12 bytes will match exactly.
#[rustfmt::skip]
pub const FILE_MAGIC: [u8; 12] = [
	0x50, 0x2A, 0x4D, 0x18, // zstd skippable frame
	0x04, 0x00, 0x00, 0x00, // payload size = 4 bytes
	0x0B, 0xAC, 0x4F, // obackup magic
	FormatDiscriminator::Members as u8, // format discriminator
];

/// Encoding of a backup file.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum FormatDiscriminator {
	/// Single compressed stream, with no per-record headers.
	Legacy = 1,

	/// Multi-member archive with header and data members.
	Members = 2,
}

impl FormatDiscriminator {
	/// Identify the encoding from the first bytes of a file.
	///
	/// Returns `None` if the bytes are neither a legacy backup nor an archive header. An archive
	/// header with an unknown discriminator also gives `None`.
	pub fn sniff(head: &[u8]) -> Option<Self> {
		if head.starts_with(&GZIP_MAGIC) {
			return Some(Self::Legacy);
		}

		if head.len() < FILE_MAGIC.len() || head[..8] != FILE_MAGIC[..8] {
			return None;
		}

		let (_, header) = FileHeader::from_bytes((&head[8..12], 0)).ok()?;
		Self::try_from(header.format).ok()
	}
}

impl TryFrom<u8> for FormatDiscriminator {
	type Error = u8;

	fn try_from(tag: u8) -> Result<Self, Self::Error> {
		match tag {
			1 => Ok(Self::Legacy),
			2 => Ok(Self::Members),
			other => Err(other),
		}
	}
}

impl From<FormatDiscriminator> for u8 {
	fn from(format: FormatDiscriminator) -> Self {
		format as u8
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_magic_is_a_header() {
		let (_, header) = FileHeader::from_bytes((&FILE_MAGIC[8..], 0)).expect("decode");
		assert_eq!(header.magic, OBACKUP_MAGIC);
		assert_eq!(header.format, 2);

		let encoded = FileHeader {
			magic: OBACKUP_MAGIC.to_vec(),
			format: FormatDiscriminator::Members.into(),
		}
		.to_bytes()
		.expect("encode");
		assert_eq!(encoded, FILE_MAGIC[8..]);
	}

	#[test]
	fn file_magic_is_a_skippable_frame() {
		let (_, frame) =
			crate::format::SkippableFrame::from_bytes((FILE_MAGIC.as_slice(), 0)).expect("frame");
		assert_eq!(frame.nibble(), crate::constants::FILE_HEADER_NIBBLE);
		assert_eq!(frame.data, FILE_MAGIC[8..]);
	}

	#[test]
	fn sniff_members() {
		assert_eq!(
			FormatDiscriminator::sniff(&FILE_MAGIC),
			Some(FormatDiscriminator::Members)
		);
	}

	#[test]
	fn sniff_legacy() {
		assert_eq!(
			FormatDiscriminator::sniff(&[0x1F, 0x8B, 0x08, 0x00]),
			Some(FormatDiscriminator::Legacy)
		);

		let mut tagged = FILE_MAGIC;
		tagged[11] = 1;
		assert_eq!(
			FormatDiscriminator::sniff(&tagged),
			Some(FormatDiscriminator::Legacy)
		);
	}

	#[test]
	fn sniff_unknown() {
		assert_eq!(FormatDiscriminator::sniff(b"PK\x03\x04 not ours"), None);
		assert_eq!(FormatDiscriminator::sniff(&FILE_MAGIC[..6]), None);

		let mut future = FILE_MAGIC;
		future[11] = 9;
		assert_eq!(FormatDiscriminator::sniff(&future), None);
	}
}
