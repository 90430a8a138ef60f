//! Error types for archive and record operations.
use std::{borrow::Cow, path::Path};

use deku::DekuError;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Convenience return type.
pub type Result<T> = std::result::Result<T, Error>;

/// Combined return error type.
///
/// A missing header or data member is not an error: readers return `None` or `false` for it.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
	/// I/O error.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Error that's just a message.
	#[error(transparent)]
	Simple(#[from] SimpleError),

	/// Error that includes a snippet of the archive.
	#[error(transparent)]
	Source(#[from] SourceError),
}

impl Error {
	/// The kind of this error, if it has one.
	///
	/// Bare I/O errors don't have a kind.
	pub fn kind(&self) -> Option<ErrorKind> {
		match self {
			Self::Io(_) => None,
			Self::Simple(err) => Some(err.kind),
			Self::Source(err) => Some(err.kind),
		}
	}

	/// Whether the archive could not be opened or created.
	pub fn is_open(&self) -> bool {
		matches!(
			self.kind(),
			Some(ErrorKind::Open | ErrorKind::LegacyFormat | ErrorKind::UnknownFormat)
		)
	}

	/// Whether a member failed to write.
	pub fn is_write(&self) -> bool {
		matches!(self.kind(), Some(ErrorKind::Write))
	}

	/// Whether some text or structure failed to parse.
	pub fn is_parse(&self) -> bool {
		matches!(self.kind(), Some(ErrorKind::Parse))
	}
}

/// Error with a message.
#[derive(Error, Diagnostic, Debug)]
#[error("obackup: {message}")]
pub struct SimpleError {
	/// Error kind.
	pub kind: ErrorKind,

	/// Error message.
	pub message: Cow<'static, str>,
}

/// Error with a snippet of the archive bytes.
#[derive(Error, Diagnostic, Debug)]
#[error("obackup: {message}")]
pub struct SourceError {
	/// Error kind.
	pub kind: ErrorKind,

	/// Error message.
	pub message: Cow<'static, str>,

	/// Error location in the snippet.
	#[label("here")]
	pub at: SourceSpan,

	/// Snippet of the archive.
	#[source_code]
	pub snippet: String,
}

impl SimpleError {
	/// New error without source.
	pub fn new(kind: ErrorKind) -> Self {
		Self {
			kind,
			message: kind.default_message().into(),
		}
	}

	/// New open error for a path, with the underlying diagnostic.
	pub fn open(path: &Path, err: impl std::fmt::Display) -> Self {
		Self::new(ErrorKind::Open).with_message(format!("cannot open {}: {err}", path.display()))
	}

	/// New write error for a member, with the underlying diagnostic.
	pub fn write(member: &str, err: impl std::fmt::Display) -> Self {
		Self::new(ErrorKind::Write).with_message(format!("cannot write member {member:?}: {err}"))
	}

	/// New parse error with a message.
	pub fn parse(message: impl Into<Cow<'static, str>>) -> Self {
		Self::new(ErrorKind::Parse).with_message(message)
	}

	/// Change the error message.
	pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
		self.message = message.into();
		self
	}
}

impl SourceError {
	/// New error with source snippet.
	pub fn new(kind: ErrorKind, snippet: &[u8], at_byte: usize) -> Self {
		Self {
			kind,
			message: kind.default_message().into(),
			snippet: format!("{snippet:02x?}"),
			at: SourceSpan::from((
				(at_byte * 4) + 1, // to account for [ and the ", " separators
				2,                 // always 2 bytes for the hex value
			)),
		}
	}

	/// New error from deku, pointing at the start of the bytes that failed to parse.
	pub fn from_deku(orig: DekuError, source: &[u8]) -> Self {
		Self::new(ErrorKind::Parse, source, 0).with_message(orig.to_string())
	}

	/// Change the error message.
	pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
		self.message = message.into();
		self
	}
}

/// Error kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// The archive cannot be opened or created.
	Open,

	/// The archive is a legacy single-stream backup, which this library does not decode.
	LegacyFormat,

	/// The file is not a backup archive, or is of an unsupported format.
	UnknownFormat,

	/// A member failed to write fully.
	Write,

	/// JSON or binary structure is malformed.
	Parse,

	/// A record failed to serialise.
	Serialize,

	/// Zstd initialization error.
	ZstdInit,

	/// Zstd failed to decompress a member.
	Decompress,

	/// The archive ends in the middle of a member.
	Truncated,

	/// Invalid skippable frame magic nibble.
	InvalidNibble {
		/// Expected nibble value
		expected: u8,
		/// Value actually found
		actual: u8,
	},
}

impl ErrorKind {
	/// Get the default error message for this error kind.
	pub fn default_message(self) -> Cow<'static, str> {
		match self {
			ErrorKind::Open => Cow::Borrowed("cannot open archive"),
			ErrorKind::LegacyFormat => {
				Cow::Borrowed("legacy single-stream backup, not a multi-member archive")
			}
			ErrorKind::UnknownFormat => Cow::Borrowed("not a backup archive"),
			ErrorKind::Write => Cow::Borrowed("cannot write member"),
			ErrorKind::Parse => Cow::Borrowed("parse error"),
			ErrorKind::Serialize => Cow::Borrowed("cannot serialise record"),
			ErrorKind::ZstdInit => Cow::Borrowed("zstd initialization error"),
			ErrorKind::Decompress => Cow::Borrowed("zstd decompression error"),
			ErrorKind::Truncated => Cow::Borrowed("archive is truncated"),
			ErrorKind::InvalidNibble { expected, actual } => Cow::Owned(format!(
				"invalid skippable frame magic nibble: expected 0x{expected:X}, got 0x{actual:X}"
			)),
		}
	}
}

impl From<ErrorKind> for SimpleError {
	fn from(ek: ErrorKind) -> Self {
		Self::new(ek)
	}
}

impl From<ErrorKind> for Error {
	fn from(ek: ErrorKind) -> Self {
		Self::Simple(ek.into())
	}
}

pub(crate) fn zstd(code: usize) -> Error {
	SimpleError::new(ErrorKind::Decompress)
		.with_message(format!(
			"zstd decompression error: {}",
			zstd_safe::get_error_name(code)
		))
		.into()
}
