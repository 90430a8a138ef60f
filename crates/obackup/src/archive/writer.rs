use std::{
	collections::HashSet,
	fmt,
	fs::File,
	io::{BufWriter, Write},
	path::Path,
};

use chrono::Utc;
use deku::DekuContainerWrite;
use tracing::{debug, instrument, trace};
use zstd_safe::{CCtx, CParameter};

use crate::{
	constants::{DEFAULT_COMPRESSION_LEVEL, ENTRY_HEADER_NIBBLE, MEMBER_MODE},
	error::{ErrorKind, Result, SimpleError},
	format::{EntryHeader, SkippableFrame, FILE_MAGIC},
	map_zstd_error,
};

/// Archive writer.
///
/// Writes the file header on creation, then one member per [`write_member()`] call.
///
/// [`write_member()`]: ArchiveWriter::write_member
pub struct ArchiveWriter<W: Write> {
	writer: W,
	zstd: CCtx<'static>,
	names: HashSet<String>,
	offset: u64,
}

impl<W: Write + fmt::Debug> fmt::Debug for ArchiveWriter<W> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ArchiveWriter")
			.field("writer", &self.writer)
			.field("zstd", &"zstd-safe compression context")
			.field("names", &self.names)
			.field("offset", &self.offset)
			.finish()
	}
}

impl ArchiveWriter<BufWriter<File>> {
	/// Create (or truncate) an archive file.
	#[instrument(level = "debug")]
	pub fn create(path: &Path) -> Result<Self> {
		let file = File::create(path).map_err(|err| SimpleError::open(path, err))?;
		Self::new(BufWriter::new(file)).map_err(|err| match err.kind() {
			Some(ErrorKind::Write) => SimpleError::open(path, err).into(),
			_ => err,
		})
	}
}

impl<W: Write> ArchiveWriter<W> {
	/// Create a new writer and write the file header.
	#[instrument(level = "trace", skip(writer))]
	pub fn new(mut writer: W) -> Result<Self> {
		trace!("create zstd context");
		let mut zstd = CCtx::try_create().ok_or(ErrorKind::ZstdInit)?;
		zstd.set_parameter(CParameter::ChecksumFlag(true))
			.map_err(map_zstd_error)?;
		zstd.set_parameter(CParameter::CompressionLevel(DEFAULT_COMPRESSION_LEVEL))
			.map_err(map_zstd_error)?;

		trace!("write file magic");
		writer
			.write_all(&FILE_MAGIC)
			.map_err(|err| SimpleError::new(ErrorKind::Write).with_message(err.to_string()))?;

		Ok(Self {
			writer,
			zstd,
			names: HashSet::new(),
			offset: FILE_MAGIC.len() as u64,
		})
	}

	/// Set the zstd compression level.
	///
	/// This will apply to future members.
	#[instrument(level = "trace", skip(self))]
	pub fn set_compression_level(&mut self, level: i32) -> Result<()> {
		self.zstd
			.set_parameter(CParameter::CompressionLevel(level))
			.map_err(map_zstd_error)?;
		Ok(())
	}

	/// How many bytes have been written so far.
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// Write a member.
	///
	/// The entry is a regular file with mode 0644, modified now. The whole content is compressed
	/// in memory, then the entry header and the compressed frame are written.
	///
	/// Names must be unique within an archive. If writing fails partway, whatever was already
	/// written stays in the output.
	#[instrument(level = "debug", skip(self, content), fields(length = content.len()))]
	pub fn write_member(&mut self, name: &str, content: &[u8]) -> Result<()> {
		if self.names.contains(name) {
			return Err(SimpleError::write(name, "a member with that name was already written").into());
		}

		let compressed = self.compress(content)?;
		trace!(
			uncompressed = content.len(),
			compressed = compressed.len(),
			"compressed member content"
		);

		let header = EntryHeader::regular(
			name,
			MEMBER_MODE,
			Utc::now(),
			content.len() as u64,
			compressed.len() as u64,
		)
		.map_err(|err| SimpleError::write(name, err))?;
		let header = header
			.to_bytes()
			.map_err(|err| SimpleError::write(name, err))?;
		let frame = SkippableFrame::new(ENTRY_HEADER_NIBBLE, header)
			.and_then(|frame| frame.to_bytes().map_err(std::io::Error::other))
			.map_err(|err| SimpleError::write(name, err))?;

		self.writer
			.write_all(&frame)
			.map_err(|err| SimpleError::write(name, err))?;
		self.offset += frame.len() as u64;

		self.writer
			.write_all(&compressed)
			.map_err(|err| SimpleError::write(name, err))?;
		self.offset += compressed.len() as u64;

		self.names.insert(name.to_owned());
		debug!(offset = self.offset, "wrote member");
		Ok(())
	}

	/// Compress a buffer into a single zstd frame.
	///
	/// Zstd-safe is bad at writing data, so we always write to a buffer in memory and then write
	/// that buffer to the writer.
	fn compress(&mut self, content: &[u8]) -> Result<Vec<u8>> {
		let mut buffer: Vec<u8> = Vec::with_capacity(zstd_safe::compress_bound(content.len()));
		self.zstd
			.compress2(&mut buffer, content)
			.map_err(map_zstd_error)?;
		Ok(buffer)
	}

	/// Flush and close the archive, returning the underlying writer.
	#[instrument(level = "debug", skip(self))]
	pub fn finish(mut self) -> Result<W> {
		self.writer
			.flush()
			.map_err(|err| SimpleError::new(ErrorKind::Write).with_message(err.to_string()))?;
		debug!(bytes = self.offset, "archive finished");
		Ok(self.writer)
	}
}
