//! Backup reader.
//!
//! Reading is a single forward pass over the archive. Each lookup moves through these states:
//!
//! ```text
//! Scanning ──(matching member)──▶ Streaming ──(content exhausted)──▶ Done
//!     │
//!     └──(end of archive)──▶ NotFound
//! ```
//!
//! Members passed over while scanning are skipped without being decompressed, and can't be read
//! again from the same [`BackupReader`]. After a `NotFound` the reader stays usable, and further
//! lookups return `NotFound` again. To look for something that was already passed, open a new
//! reader; the [`read_header()`] and [`read_data()`] functions do this for one-shot lookups.

use std::{
	fs::File,
	io::{self, BufReader, Read},
	path::Path,
};

use tracing::{debug, instrument, trace};

use crate::{
	archive::{ArchiveReader, Entry},
	constants::DATA_CHUNK_SIZE,
	error::{ErrorKind, Result, SimpleError},
	format::FormatDiscriminator,
	naming::is_data_member,
	ondemand::OnDemand,
	records::{Record, Title},
};

/// Backup reader.
#[derive(Debug)]
pub struct BackupReader<R> {
	archive: ArchiveReader<R>,
}

impl BackupReader<BufReader<File>> {
	/// Open a backup archive file.
	pub fn open(path: &Path) -> Result<Self> {
		ArchiveReader::open(path).map(Self::from)
	}
}

impl<R: Read> From<ArchiveReader<R>> for BackupReader<R> {
	fn from(archive: ArchiveReader<R>) -> Self {
		Self { archive }
	}
}

impl<R: Read> BackupReader<R> {
	/// Start reading a backup archive.
	pub fn new(reader: R) -> Result<Self> {
		ArchiveReader::new(reader).map(Self::from)
	}

	/// The encoding of this archive.
	pub fn format(&self) -> FormatDiscriminator {
		self.archive.format()
	}

	/// Find the next member matching a predicate.
	///
	/// Members that don't match are skipped.
	fn seek_member(&mut self, mut wanted: impl FnMut(&str) -> bool) -> Result<Option<Entry>> {
		while let Some(entry) = self.archive.next_entry()? {
			if wanted(entry.name()) {
				return Ok(Some(entry));
			}
			trace!(name = entry.name(), "skip member");
		}

		Ok(None)
	}

	/// Read the JSON text of a header.
	///
	/// Returns `None` if there's no such header in the rest of the archive.
	#[instrument(level = "debug", skip(self))]
	pub fn read_header(&mut self, title: Title) -> Result<Option<String>> {
		let name = title.header_name();
		let Some(entry) = self.seek_member(|member| member == name)? else {
			debug!("header not found");
			return Ok(None);
		};

		let content = self.archive.read_to_end()?;
		debug!(bytes = entry.size(), "read header");
		String::from_utf8(content)
			.map(Some)
			.map_err(|err| SimpleError::parse(format!("header {name:?} is not UTF-8: {err}")).into())
	}

	/// Read and parse a header.
	pub fn read_record(&mut self, title: Title) -> Result<Option<Record>> {
		self.read_header(title)?
			.map(|text| Record::from_json(title, &text))
			.transpose()
	}

	/// Stream the content of the data member to a callback.
	///
	/// The callback gets chunks of up to 16 KiB, in order, from a buffer that's reused between
	/// calls. Scanning stops after the first data member. An error from the callback stops
	/// reading and is returned.
	///
	/// Returns whether a data member was found.
	#[instrument(level = "debug", skip(self, callback))]
	pub fn read_data(&mut self, mut callback: impl FnMut(&[u8]) -> io::Result<()>) -> Result<bool> {
		let Some(entry) = self.seek_member(is_data_member)? else {
			debug!("no data member");
			return Ok(false);
		};

		debug!(name = entry.name(), bytes = entry.size(), "stream data member");
		let mut buffer = vec![0; DATA_CHUNK_SIZE];
		let mut total = 0_u64;
		loop {
			let filled = self.fill_chunk(&mut buffer)?;
			if filled == 0 {
				break;
			}

			callback(&buffer[..filled])?;
			total += filled as u64;
		}

		if total < entry.size() {
			return Err(SimpleError::new(ErrorKind::Truncated)
				.with_message(format!(
					"data member {:?} ends after {total} of {} bytes",
					entry.name(),
					entry.size()
				))
				.into());
		}

		self.archive.skip_current()?;
		Ok(true)
	}

	/// Fill as much of the buffer as the current member allows.
	fn fill_chunk(&mut self, buffer: &mut [u8]) -> Result<usize> {
		let mut filled = 0;
		while filled < buffer.len() {
			match self.archive.read_chunk(&mut buffer[filled..])? {
				0 => break,
				n => filled += n,
			}
		}
		Ok(filled)
	}

	/// List the remaining members, skipping their content.
	pub fn members(&mut self) -> Result<Vec<Entry>> {
		let mut entries = Vec::new();
		while let Some(entry) = self.archive.next_entry()? {
			entries.push(entry);
		}
		Ok(entries)
	}

	/// The underlying archive reader.
	pub fn archive_mut(&mut self) -> &mut ArchiveReader<R> {
		&mut self.archive
	}
}

/// Open a source, read one header, and close it.
pub fn read_header<S: OnDemand>(source: S, title: Title) -> Result<Option<String>> {
	open_source(&source)?.read_header(title)
}

/// Open a source, stream its data member to a callback, and close it.
pub fn read_data<S: OnDemand>(
	source: S,
	callback: impl FnMut(&[u8]) -> io::Result<()>,
) -> Result<bool> {
	open_source(&source)?.read_data(callback)
}

fn open_source<S: OnDemand>(source: &S) -> Result<BackupReader<S::Reader>> {
	let reader = source
		.open()
		.map_err(|err| SimpleError::open(Path::new(&source.describe()), err))?;
	BackupReader::new(reader)
}
