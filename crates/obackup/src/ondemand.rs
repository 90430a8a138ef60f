//! On-demand reader trait and implementations.
//!
//! This is a trait that allows for obtaining multiple independent readers from a single byte
//! source. Archive scanning is forward-only, so looking for a second member after the first one
//! has gone past needs a fresh reader; the one-shot functions in [`decode`](crate::decode) use
//! this trait to open one per call.
//!
//! This is implemented for files ([`Path`] and [`PathBuf`]) and in-memory buffers in this crate.

use std::{
	fs::File,
	io::{BufReader, Cursor, Read, Result},
	path::{Path, PathBuf},
};

/// On-demand independent readers for a byte source.
pub trait OnDemand {
	/// The output reader type.
	type Reader: Read;

	/// Open an independent reader for this byte source.
	fn open(&self) -> Result<Self::Reader>;

	/// Describe the source, for diagnostics.
	fn describe(&self) -> String;
}

impl OnDemand for &Path {
	type Reader = BufReader<File>;

	fn open(&self) -> Result<Self::Reader> {
		File::open(self).map(BufReader::new)
	}

	fn describe(&self) -> String {
		self.display().to_string()
	}
}

impl OnDemand for PathBuf {
	type Reader = BufReader<File>;

	fn open(&self) -> Result<Self::Reader> {
		File::open(self).map(BufReader::new)
	}

	fn describe(&self) -> String {
		self.display().to_string()
	}
}

impl<'b> OnDemand for &'b [u8] {
	type Reader = Cursor<&'b [u8]>;

	fn open(&self) -> Result<Self::Reader> {
		Ok(Cursor::new(*self))
	}

	fn describe(&self) -> String {
		format!("<{} bytes in memory>", self.len())
	}
}
