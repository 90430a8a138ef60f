use deku::prelude::*;

/// Magic number for a [Skippable Frame](SkippableFrame).
///
/// This is only bytes 1-3 of the magic, and the first byte is any value from 0x50 to 0x5F.
pub const SKIPPABLE_FRAME_MAGIC: &[u8] = b"\x2A\x4D\x18";

/// Length of the magic and size fields of a skippable frame.
pub const SKIPPABLE_FRAME_OVERHEAD: usize = 8;

/// A "Skippable" frame.
///
/// [Spec](https://datatracker.ietf.org/doc/html/rfc8878#name-skippable-frames)
///
/// A standard zstd decoder skips these, which is where the archive keeps its own structures.
#[derive(Clone, Debug, Eq, PartialEq, DekuRead, DekuWrite)]
#[deku(endian = "little")]
pub struct SkippableFrame {
	#[deku(bytes = "4")]
	magic: u32,

	#[deku(bytes = "4")]
	size: u32,

	/// The user data contained in the frame.
	#[deku(count = "size")]
	pub data: Vec<u8>,
}

impl SkippableFrame {
	/// Create a new skippable frame.
	///
	/// Fails if the nibble is greater than 15 or the data doesn't fit a 32-bit length.
	pub fn new(nibble: u8, data: Vec<u8>) -> std::io::Result<Self> {
		if nibble > 0xF {
			return Err(std::io::Error::other(
				"skippable frame nibble must be between 0 and 15",
			));
		}

		Ok(Self {
			magic: u32::from_le_bytes([0x50 + nibble, 0x2A, 0x4D, 0x18]),
			size: data.len().try_into().map_err(std::io::Error::other)?,
			data,
		})
	}

	/// The magic nibble (lowest four bits of the magic).
	pub fn nibble(&self) -> u8 {
		(self.magic & 0xF) as u8
	}

	/// The length of the frame's content.
	pub fn size(&self) -> usize {
		self.size as usize
	}

	/// Read the payload length out of the first bytes of a frame.
	///
	/// Returns `None` if the bytes don't start with a skippable frame magic.
	pub fn peek_size(head: &[u8; SKIPPABLE_FRAME_OVERHEAD]) -> Option<u32> {
		if !(0x50..=0x5F).contains(&head[0]) || &head[1..4] != SKIPPABLE_FRAME_MAGIC {
			return None;
		}

		Some(u32::from_le_bytes([head[4], head[5], head[6], head[7]]))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn frame_layout() {
		let frame = SkippableFrame::new(0x1, vec![1, 2, 3]).expect("frame");
		let bytes = frame.to_bytes().expect("encode");
		assert_eq!(bytes, [0x51, 0x2A, 0x4D, 0x18, 3, 0, 0, 0, 1, 2, 3]);

		let head: [u8; 8] = bytes[..8].try_into().expect("head");
		assert_eq!(SkippableFrame::peek_size(&head), Some(3));

		let (_, decoded) = SkippableFrame::from_bytes((bytes.as_slice(), 0)).expect("decode");
		assert_eq!(decoded.nibble(), 0x1);
		assert_eq!(decoded.size(), 3);
		assert_eq!(decoded.data, [1, 2, 3]);
	}

	#[test]
	fn nibble_out_of_range() {
		assert!(SkippableFrame::new(0x10, Vec::new()).is_err());
	}

	#[test]
	fn peek_rejects_zstd_frame() {
		let head = [0x28, 0xB5, 0x2F, 0xFD, 0, 0, 0, 0];
		assert_eq!(SkippableFrame::peek_size(&head), None);
	}
}
