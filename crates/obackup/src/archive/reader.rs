use std::{
	fmt,
	fs::File,
	io::{self, BufReader, ErrorKind as IoErrorKind, Read},
	path::Path,
};

use deku::DekuContainerRead;
use tracing::{debug, instrument, trace, warn};
use zstd_safe::{DCtx, InBuffer, OutBuffer, ResetDirective};

use crate::{
	constants::{DATA_CHUNK_SIZE, ENTRY_HEADER_NIBBLE},
	error::{self, ErrorKind, Result, SimpleError, SourceError},
	format::{
		Entry, EntryHeader, FormatDiscriminator, SkippableFrame, FILE_MAGIC,
		MAX_ENTRY_HEADER_LENGTH, SKIPPABLE_FRAME_OVERHEAD,
	},
};

/// Archive reader.
///
/// A forward-only cursor over the members of an archive. Call [`next_entry()`] to move to the
/// next member, then optionally read its content with [`read_chunk()`] or [`read_exact()`].
/// Moving on discards whatever content of the current member was not read.
///
/// The underlying reader only needs to be [`Read`]: the archive is never seeked.
///
/// [`next_entry()`]: ArchiveReader::next_entry
/// [`read_chunk()`]: ArchiveReader::read_chunk
/// [`read_exact()`]: ArchiveReader::read_exact
pub struct ArchiveReader<R> {
	reader: R,
	zstd: DCtx<'static>,

	/// Compressed bytes read from `reader` but not yet given to zstd.
	input: Vec<u8>,
	input_pos: usize,

	current: Option<OpenEntry>,
	finished: bool,
}

#[derive(Debug)]
struct OpenEntry {
	entry: Entry,

	/// Compressed bytes of this member still in `reader`.
	compressed_left: u64,

	/// Content bytes not yet returned.
	uncompressed_left: u64,
}

impl<R: fmt::Debug> fmt::Debug for ArchiveReader<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ArchiveReader")
			.field("reader", &self.reader)
			.field("zstd", &"zstd-safe decompression context")
			.field("input", &self.input.len())
			.field("input_pos", &self.input_pos)
			.field("current", &self.current)
			.field("finished", &self.finished)
			.finish()
	}
}

impl ArchiveReader<BufReader<File>> {
	/// Open an archive file.
	///
	/// Fails if the file can't be opened, if it's a legacy single-stream backup, or if it's not
	/// an archive at all.
	#[instrument(level = "debug")]
	pub fn open(path: &Path) -> Result<Self> {
		let file = File::open(path).map_err(|err| SimpleError::open(path, err))?;
		Self::new(BufReader::new(file)).map_err(|err| match err.kind() {
			Some(ErrorKind::Open | ErrorKind::LegacyFormat | ErrorKind::UnknownFormat) => err,
			_ => SimpleError::open(path, err).into(),
		})
	}
}

impl<R: Read> ArchiveReader<R> {
	/// Start reading an archive, checking its file header.
	#[instrument(level = "trace", skip(reader))]
	pub fn new(mut reader: R) -> Result<Self> {
		let mut head = [0; FILE_MAGIC.len()];
		let got = read_fully(&mut reader, &mut head)?;
		let format = FormatDiscriminator::sniff(&head[..got]);
		debug!(?format, "read file header");

		match format {
			Some(FormatDiscriminator::Members) => {}
			Some(FormatDiscriminator::Legacy) => return Err(ErrorKind::LegacyFormat.into()),
			None => {
				return Err(SimpleError::new(ErrorKind::UnknownFormat)
					.with_message(format!(
						"not a backup archive (starts with {:02x?})",
						&head[..got.min(4)]
					))
					.into())
			}
		}

		let zstd = DCtx::try_create().ok_or(ErrorKind::ZstdInit)?;
		Ok(Self {
			reader,
			zstd,
			input: Vec::with_capacity(DCtx::in_size().max(1024)),
			input_pos: 0,
			current: None,
			finished: false,
		})
	}

	/// The encoding of this archive.
	///
	/// Only multi-member archives can be opened, so this is always the current encoding.
	pub fn format(&self) -> FormatDiscriminator {
		FormatDiscriminator::Members
	}

	/// The member the cursor is on, if any.
	pub fn current(&self) -> Option<&Entry> {
		self.current.as_ref().map(|open| &open.entry)
	}

	/// Move to the next member.
	///
	/// Discards the unread content of the current member first. Returns `None` at the end of the
	/// archive, and keeps returning `None` after that.
	#[instrument(level = "debug", skip(self))]
	pub fn next_entry(&mut self) -> Result<Option<Entry>> {
		self.skip_current()?;
		if self.finished {
			return Ok(None);
		}

		let mut head = [0; SKIPPABLE_FRAME_OVERHEAD];
		match read_fully(&mut self.reader, &mut head)? {
			0 => {
				trace!("end of archive");
				self.finished = true;
				return Ok(None);
			}
			SKIPPABLE_FRAME_OVERHEAD => {}
			partial => {
				return Err(SimpleError::new(ErrorKind::Truncated)
					.with_message(format!(
						"archive is truncated: {partial} bytes of an entry header"
					))
					.into())
			}
		}

		let size = SkippableFrame::peek_size(&head).ok_or_else(|| {
			SourceError::new(ErrorKind::Parse, &head, 0)
				.with_message("expected an entry header frame")
		})? as usize;
		if size > MAX_ENTRY_HEADER_LENGTH {
			return Err(SimpleError::parse(format!(
				"entry header of {size} bytes is larger than any valid header"
			))
			.into());
		}

		let mut bytes = Vec::with_capacity(SKIPPABLE_FRAME_OVERHEAD + size);
		bytes.extend_from_slice(&head);
		bytes.resize(SKIPPABLE_FRAME_OVERHEAD + size, 0);
		self.reader
			.read_exact(&mut bytes[SKIPPABLE_FRAME_OVERHEAD..])
			.map_err(truncated)?;

		let (_, frame) = SkippableFrame::from_bytes((bytes.as_slice(), 0))
			.map_err(|err| SourceError::from_deku(err, &bytes))?;
		if frame.nibble() != ENTRY_HEADER_NIBBLE {
			return Err(ErrorKind::InvalidNibble {
				expected: ENTRY_HEADER_NIBBLE,
				actual: frame.nibble(),
			}
			.into());
		}

		let (_, header) = EntryHeader::from_bytes((frame.data.as_slice(), 0))
			.map_err(|err| SourceError::from_deku(err, &frame.data))?;
		let entry = header.to_entry()?;
		debug!(name = entry.name(), size = entry.size(), "read entry header");
		if !entry.is_regular() {
			warn!(name = entry.name(), "member is not a regular file");
		}

		self.zstd
			.reset(ResetDirective::SessionOnly)
			.map_err(error::zstd)?;
		self.current = Some(OpenEntry {
			entry: entry.clone(),
			compressed_left: header.compressed,
			uncompressed_left: header.size,
		});

		Ok(Some(entry))
	}

	/// Discard the rest of the current member.
	///
	/// Skipped content can't be read again with this reader. Does nothing if there's no current
	/// member.
	#[instrument(level = "trace", skip(self))]
	pub fn skip_current(&mut self) -> Result<()> {
		let Some(open) = self.current.take() else {
			return Ok(());
		};

		self.input.clear();
		self.input_pos = 0;

		trace!(name = open.entry.name(), bytes = open.compressed_left, "skip member data");
		let skipped = io::copy(
			&mut (&mut self.reader).take(open.compressed_left),
			&mut io::sink(),
		)?;
		if skipped < open.compressed_left {
			return Err(SimpleError::new(ErrorKind::Truncated)
				.with_message(format!(
					"archive is truncated: member {:?} is missing {} bytes",
					open.entry.name(),
					open.compressed_left - skipped
				))
				.into());
		}

		Ok(())
	}

	/// Read some content of the current member into `buf`.
	///
	/// Returns how many bytes were written into `buf`, which is zero only when the member is
	/// exhausted (or if there's no current member, or `buf` is empty).
	#[instrument(level = "trace", skip(self, buf), fields(buf = buf.len()))]
	pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
		let Some(open) = self.current.as_mut() else {
			return Ok(0);
		};

		let want = usize::try_from(open.uncompressed_left)
			.unwrap_or(usize::MAX)
			.min(buf.len());
		if want == 0 {
			return Ok(0);
		}
		let out = &mut buf[..want];

		loop {
			if self.input_pos == self.input.len() && open.compressed_left > 0 {
				let refill = usize::try_from(open.compressed_left)
					.unwrap_or(usize::MAX)
					.min(self.input.capacity().max(1024));
				self.input.resize(refill, 0);
				let got = self.reader.read(&mut self.input)?;
				self.input.truncate(got);
				self.input_pos = 0;
				if got == 0 {
					return Err(truncated(IoErrorKind::UnexpectedEof.into()));
				}

				open.compressed_left -= got as u64;
				trace!(bytes = got, left = open.compressed_left, "read compressed data");
			}

			let mut input = InBuffer::around(&self.input[self.input_pos..]);
			let mut output = OutBuffer::around(&mut *out);
			let hint = self
				.zstd
				.decompress_stream(&mut output, &mut input)
				.map_err(error::zstd)?;
			let written = output.pos();
			self.input_pos += input.pos;
			trace!(%written, frame_done = hint == 0, "decompressed");

			if written > 0 {
				open.uncompressed_left -= written as u64;
				return Ok(written);
			}

			if hint == 0 {
				return Err(SimpleError::new(ErrorKind::Decompress)
					.with_message(format!(
						"member {:?} ends {} bytes before its declared size",
						open.entry.name(),
						open.uncompressed_left
					))
					.into());
			}

			if self.input_pos == self.input.len() && open.compressed_left == 0 {
				return Err(truncated(IoErrorKind::UnexpectedEof.into()));
			}
		}
	}

	/// Read exactly `length` bytes of the current member.
	///
	/// The buffer grows as content is decompressed, so a length that the member can't back only
	/// costs what was actually read.
	pub fn read_exact(&mut self, length: usize) -> Result<Vec<u8>> {
		let mut content = Vec::with_capacity(length.min(DATA_CHUNK_SIZE));
		let mut chunk = vec![0; DATA_CHUNK_SIZE.min(length)];
		while content.len() < length {
			let want = (length - content.len()).min(chunk.len());
			match self.read_chunk(&mut chunk[..want])? {
				0 => {
					return Err(SimpleError::new(ErrorKind::Truncated)
						.with_message(format!(
							"wanted {length} bytes of member content, only {} available",
							content.len()
						))
						.into())
				}
				n => content.extend_from_slice(&chunk[..n]),
			}
		}

		Ok(content)
	}

	/// Read the whole content of the current member.
	///
	/// The length is taken from the entry header. Returns an empty buffer if there's no current
	/// member.
	pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
		let Some(open) = self.current.as_ref() else {
			return Ok(Vec::new());
		};

		let length = usize::try_from(open.uncompressed_left)
			.map_err(|_| SimpleError::parse("member is too large to read in memory"))?;
		self.read_exact(length)
	}
}

/// Read until `buf` is full or the reader is at its end.
///
/// Returns how many bytes were read.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
	let mut filled = 0;
	while filled < buf.len() {
		match reader.read(&mut buf[filled..]) {
			Ok(0) => break,
			Ok(n) => filled += n,
			Err(err) if err.kind() == IoErrorKind::Interrupted => continue,
			Err(err) => return Err(err),
		}
	}
	Ok(filled)
}

fn truncated(err: io::Error) -> error::Error {
	if err.kind() == IoErrorKind::UnexpectedEof {
		SimpleError::new(ErrorKind::Truncated).into()
	} else {
		err.into()
	}
}
