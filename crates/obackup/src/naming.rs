//! Member naming convention.
//!
//! Header members are named `"[HDR] " + title` and the data member is named `"[DAT] " + stream`.
//! Names are compared byte for byte: there is no escaping and no case folding. These literals are
//! on-disk keys of existing archives and never change.

/// Prefix of header member names.
pub const HEADER_PREFIX: &str = "[HDR] ";

/// Prefix of data member names.
pub const DATA_PREFIX: &str = "[DAT] ";

/// Name of the header member for a record title.
pub fn header_name(title: &str) -> String {
	format!("{HEADER_PREFIX}{title}")
}

/// Prefix of data member names.
pub fn data_prefix() -> &'static str {
	DATA_PREFIX
}

/// Name of the data member for a logical stream.
pub fn data_name(stream: &str) -> String {
	format!("{DATA_PREFIX}{stream}")
}

/// Whether a member name is a data member's.
pub fn is_data_member(name: &str) -> bool {
	name.starts_with(DATA_PREFIX)
}

/// The title of a header member, if the name is a header member's.
pub fn header_title(name: &str) -> Option<&str> {
	name.strip_prefix(HEADER_PREFIX)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_names() {
		assert_eq!(header_name("BackupProps"), "[HDR] BackupProps");
		assert_eq!(header_title("[HDR] DossierProps"), Some("DossierProps"));
		assert_eq!(header_title("[DAT] entries"), None);
	}

	#[test]
	fn data_names() {
		assert_eq!(data_prefix(), "[DAT] ");
		assert_eq!(data_name("entries"), "[DAT] entries");
		assert!(is_data_member("[DAT] entries"));
		assert!(is_data_member("[DAT] "));
		assert!(!is_data_member("[HDR] BackupProps"));
		assert!(!is_data_member("[dat] entries"));
		assert!(!is_data_member(" [DAT] entries"));
	}
}
