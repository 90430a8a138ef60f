//! Obackup: backup archive format for Openbook dossiers.
//!
//! A backup archive is a single file holding several named members: one header member per
//! metadata record (`"[HDR] <title>"`, JSON text) and one bulk data member (`"[DAT] <name>"`).
//! Members are stored as zstd frames, each preceded by a skippable frame describing the entry, so
//! that the whole archive can be read in one forward pass.
//!
//! - [`encode::BackupWriter`] writes the metadata headers, and lets the caller add the data member.
//! - [`decode::BackupReader`] scans an archive for one header or for the data member.
//! - [`records`] holds the metadata records and their JSON convention.
//! - [`archive`] is the member container underneath both.

#![warn(clippy::unwrap_used, missing_docs)]
#![deny(rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod archive;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod format;
pub mod naming;
pub mod ondemand;
pub mod records;

pub use error::{Error, Result};

pub(crate) fn map_zstd_error(code: usize) -> std::io::Error {
	let msg = zstd_safe::get_error_name(code);
	std::io::Error::other(msg)
}
