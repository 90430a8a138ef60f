//! Backup writer.
//!
//! ```no_run
//! # use obackup::{encode::{BackupContext, BackupWriter}, records::DossierProperties};
//! # struct Session;
//! # impl BackupContext for Session {
//! #     fn userid(&self) -> String { "alice".into() }
//! #     fn dossier(&self) -> DossierProperties { DossierProperties::default() }
//! # }
//! # fn main() -> obackup::Result<()> {
//! let mut backup = BackupWriter::create("dossier.obak".as_ref())?;
//! backup.write_headers(&Session, Some("monthly close"))?;
//! backup.write_data("entries", b"...dump of the dossier...")?;
//! backup.finish()?;
//! # Ok(())
//! # }
//! ```

use std::{
	fs::File,
	io::{BufWriter, Write},
	path::Path,
};

use tracing::{debug, info, instrument};

use crate::{
	archive::ArchiveWriter,
	error::Result,
	naming::data_name,
	records::{
		BackupProperties, DbModelProperties, DossierProperties, OpenbookProperties,
		PluginProperties, Serializable,
	},
};

/// Source of the values recorded in the headers.
///
/// Implemented by the application's session: this library doesn't know how to look at the
/// dossier, the loaded modules, or who's logged in.
pub trait BackupContext {
	/// Identifier of the operator making the backup.
	fn userid(&self) -> String;

	/// Snapshot of the dossier being backed up.
	fn dossier(&self) -> DossierProperties;

	/// Extension modules currently loaded.
	fn plugins(&self) -> Vec<PluginProperties> {
		Vec::new()
	}

	/// Database schema models currently installed.
	fn dbmodels(&self) -> Vec<DbModelProperties> {
		Vec::new()
	}
}

/// Backup writer.
///
/// There is no rollback: if a write fails, members written before it stay in the archive, and
/// it's up to the caller to discard the file.
#[derive(Debug)]
pub struct BackupWriter<W: Write> {
	archive: ArchiveWriter<W>,
}

impl BackupWriter<BufWriter<File>> {
	/// Create (or truncate) a backup archive file.
	pub fn create(path: &Path) -> Result<Self> {
		ArchiveWriter::create(path).map(Self::from)
	}
}

impl<W: Write> From<ArchiveWriter<W>> for BackupWriter<W> {
	fn from(archive: ArchiveWriter<W>) -> Self {
		Self { archive }
	}
}

impl<W: Write> BackupWriter<W> {
	/// Start a backup archive on a writer.
	pub fn new(writer: W) -> Result<Self> {
		ArchiveWriter::new(writer).map(Self::from)
	}

	/// The underlying archive, to set compression or write other members.
	pub fn archive_mut(&mut self) -> &mut ArchiveWriter<W> {
		&mut self.archive
	}

	/// Write one record as its header member.
	#[instrument(level = "debug", skip(self, record), fields(title = %record.title()))]
	pub fn write_record(&mut self, record: &impl Serializable) -> Result<()> {
		let json = record.to_json()?;
		debug!(bytes = json.len(), "serialised record");
		self.archive
			.write_member(&record.title().header_name(), json.as_bytes())
	}

	/// Write all the metadata headers.
	///
	/// In order: backup properties (with the comment, the current time, and the operator),
	/// dossier properties, and Openbook properties. Stops at the first failure.
	#[instrument(level = "debug", skip(self, context))]
	pub fn write_headers(&mut self, context: &impl BackupContext, comment: Option<&str>) -> Result<()> {
		self.write_record(&BackupProperties::new(comment, context.userid()))?;
		self.write_record(&context.dossier())?;
		self.write_record(&OpenbookProperties::new(
			context.plugins(),
			context.dbmodels(),
		))?;
		info!("wrote backup headers");
		Ok(())
	}

	/// Write the data member for a logical stream.
	#[instrument(level = "debug", skip(self, content), fields(length = content.len()))]
	pub fn write_data(&mut self, stream: &str, content: &[u8]) -> Result<()> {
		self.archive.write_member(&data_name(stream), content)
	}

	/// Flush and close the archive, returning the underlying writer.
	pub fn finish(self) -> Result<W> {
		self.archive.finish()
	}
}
