//! Metadata records stored in header members.
//!
//! Each record serialises to a flat JSON object where every leaf value is a string: optional
//! fields that are unset are `""`, booleans are `"Y"` or `"N"`, dates are `YYYY-MM-DD`, and integers
//! are decimal text. This is the convention of archives written by every previous version, and it
//! is kept exactly.
//!
//! Parsing is lenient: unknown members and values of the wrong shape are logged as warnings and
//! ignored, so that archives written by newer versions still open.

use std::{fmt, str::FromStr};

use crate::{error::Result, naming::header_name};

#[doc(inline)]
pub use self::backup::BackupProperties;
#[doc(inline)]
pub use self::dossier::DossierProperties;
#[doc(inline)]
pub use self::openbook::{DbModelProperties, OpenbookProperties, PluginProperties};

mod backup;
mod dossier;
mod json;
mod openbook;

/// Record type tag.
///
/// Each tag has a stable title, used as the header member name on disk.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Title {
	/// [`BackupProperties`]
	Backup,

	/// [`DossierProperties`]
	Dossier,

	/// [`OpenbookProperties`]
	Openbook,
}

impl Title {
	/// All titles, in the order headers are written.
	pub const ALL: [Title; 3] = [Title::Backup, Title::Dossier, Title::Openbook];

	/// The title as written on disk.
	pub fn as_str(self) -> &'static str {
		match self {
			Title::Backup => "BackupProps",
			Title::Dossier => "DossierProps",
			Title::Openbook => "OpenbookProps",
		}
	}

	/// Name of the header member for this title.
	pub fn header_name(self) -> String {
		header_name(self.as_str())
	}
}

impl fmt::Display for Title {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Title {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Title::ALL
			.into_iter()
			.find(|title| title.as_str() == s)
			.ok_or_else(|| {
				format!(
					"unknown header title {s:?}, expected one of {:?}",
					Title::ALL.map(Title::as_str)
				)
			})
	}
}

/// A record that can be stored in a header member.
pub trait Serializable {
	/// Version of the record's interface.
	///
	/// Bumped if the record's JSON ever changes incompatibly.
	fn interface_version(&self) -> u32 {
		1
	}

	/// The record's title.
	fn title(&self) -> Title;

	/// Serialise to JSON text.
	fn to_json(&self) -> Result<String>;
}

/// Any of the metadata records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
	/// Backup properties.
	Backup(BackupProperties),

	/// Dossier properties.
	Dossier(DossierProperties),

	/// Openbook properties.
	Openbook(OpenbookProperties),
}

impl Record {
	/// Parse the JSON text of a header, choosing the parser by title.
	pub fn from_json(title: Title, text: &str) -> Result<Self> {
		match title {
			Title::Backup => BackupProperties::from_json(text).map(Self::Backup),
			Title::Dossier => DossierProperties::from_json(text).map(Self::Dossier),
			Title::Openbook => OpenbookProperties::from_json(text).map(Self::Openbook),
		}
	}
}

impl Serializable for Record {
	fn interface_version(&self) -> u32 {
		match self {
			Record::Backup(props) => props.interface_version(),
			Record::Dossier(props) => props.interface_version(),
			Record::Openbook(props) => props.interface_version(),
		}
	}

	fn title(&self) -> Title {
		match self {
			Record::Backup(props) => props.title(),
			Record::Dossier(props) => props.title(),
			Record::Openbook(props) => props.title(),
		}
	}

	fn to_json(&self) -> Result<String> {
		match self {
			Record::Backup(props) => props.to_json(),
			Record::Dossier(props) => props.to_json(),
			Record::Openbook(props) => props.to_json(),
		}
	}
}

impl From<BackupProperties> for Record {
	fn from(props: BackupProperties) -> Self {
		Self::Backup(props)
	}
}

impl From<DossierProperties> for Record {
	fn from(props: DossierProperties) -> Self {
		Self::Dossier(props)
	}
}

impl From<OpenbookProperties> for Record {
	fn from(props: OpenbookProperties) -> Self {
		Self::Openbook(props)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn titles_are_fixed() {
		assert_eq!(Title::Backup.header_name(), "[HDR] BackupProps");
		assert_eq!(Title::Dossier.header_name(), "[HDR] DossierProps");
		assert_eq!(Title::Openbook.header_name(), "[HDR] OpenbookProps");
	}

	#[test]
	fn titles_parse() {
		assert_eq!("DossierProps".parse::<Title>(), Ok(Title::Dossier));
		assert!("dossierprops".parse::<Title>().is_err());
		assert!("Dossier".parse::<Title>().is_err());
	}

	#[test]
	fn titles_sort_alphabetically() {
		let mut names = Title::ALL.map(Title::as_str);
		names.sort();
		assert_eq!(names, Title::ALL.map(Title::as_str));
	}

	#[test]
	fn record_dispatches_by_title() {
		let record =
			Record::from_json(Title::Dossier, r#"{"Current":"Y","RPID":"RP-7"}"#).expect("parse");
		assert_eq!(record.title(), Title::Dossier);
		assert_eq!(record.interface_version(), 1);
		let Record::Dossier(props) = record else {
			panic!("expected dossier properties");
		};
		assert!(props.is_current);
		assert_eq!(props.rpid.as_deref(), Some("RP-7"));
	}
}
