use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{json, Serializable, Title};
use crate::error::Result;

/// Properties of the backup itself: who made it, when, and why.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackupProperties {
	/// Free-form comment given by the operator.
	pub comment: Option<String>,

	/// When the backup was made, UTC.
	///
	/// Stored to the microsecond: anything finer is truncated when serialised, so a timestamp with
	/// nanoseconds comes back truncated. [`BackupProperties::new`] truncates up front.
	///
	/// `None` only for a parsed record that didn't carry a valid timestamp.
	pub timestamp: Option<DateTime<Utc>>,

	/// Identifier of the operator who made the backup.
	pub userid: String,
}

#[derive(Serialize)]
struct Wire<'a> {
	#[serde(rename = "Comment")]
	comment: &'a str,
	#[serde(rename = "Timestamp")]
	timestamp: String,
	#[serde(rename = "UserId")]
	userid: &'a str,
}

impl BackupProperties {
	/// New properties, timestamped now.
	///
	/// An empty comment is the same as no comment.
	pub fn new(comment: Option<&str>, userid: impl Into<String>) -> Self {
		Self {
			comment: comment.map(str::to_owned).and_then(json::optional),
			timestamp: Some(json::now()),
			userid: userid.into(),
		}
	}

	/// Parse from JSON text.
	///
	/// Unknown members are ignored with a warning. Fails only if the text isn't a JSON object.
	pub fn from_json(text: &str) -> Result<Self> {
		let title = Title::Backup;
		let mut props = Self::default();

		for (key, value) in json::parse_object(title, text)? {
			match key.as_str() {
				"Comment" => {
					if let Some(text) = json::scalar(title, &key, &value) {
						props.comment = json::optional(text);
					}
				}
				"Timestamp" => {
					if let Some(text) = json::scalar(title, &key, &value) {
						props.timestamp = json::parse_timestamp(title, &key, &text);
					}
				}
				"UserId" => {
					if let Some(text) = json::scalar(title, &key, &value) {
						props.userid = text;
					}
				}
				_ => json::unknown_member(title, &key),
			}
		}

		Ok(props)
	}
}

impl Serializable for BackupProperties {
	fn title(&self) -> Title {
		Title::Backup
	}

	fn to_json(&self) -> Result<String> {
		json::to_string(
			self.title(),
			&Wire {
				comment: self.comment.as_deref().unwrap_or_default(),
				timestamp: json::format_timestamp(self.timestamp),
				userid: &self.userid,
			},
		)
	}
}

#[cfg(test)]
mod tests {
	use chrono::{TimeZone, Timelike};

	use super::*;

	fn stamp() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 12, 31, 18, 30, 5)
			.single()
			.and_then(|stamp| stamp.with_nanosecond(250_000_000))
			.expect("stamp")
	}

	#[test]
	fn wire_format() {
		let props = BackupProperties {
			comment: Some("monthly close".into()),
			timestamp: Some(stamp()),
			userid: "alice".into(),
		};
		assert_eq!(
			props.to_json().expect("json"),
			r#"{"Comment":"monthly close","Timestamp":"2024-12-31 18:30:05.250000","UserId":"alice"}"#
		);
	}

	#[test]
	fn unset_fields_are_empty_strings() {
		let props = BackupProperties::default();
		assert_eq!(
			props.to_json().expect("json"),
			r#"{"Comment":"","Timestamp":"","UserId":""}"#
		);
	}

	#[test]
	fn roundtrip() {
		let props = BackupProperties {
			comment: Some("before closing the exercice".into()),
			timestamp: Some(stamp()),
			userid: "bob".into(),
		};
		let parsed = BackupProperties::from_json(&props.to_json().expect("json")).expect("parse");
		assert_eq!(parsed, props);
	}

	#[test]
	fn new_is_timestamped_and_roundtrips() {
		let props = BackupProperties::new(Some(""), "carol");
		assert_eq!(props.comment, None);
		assert!(props.timestamp.is_some());

		let parsed = BackupProperties::from_json(&props.to_json().expect("json")).expect("parse");
		assert_eq!(parsed, props);
	}

	#[test]
	fn timestamp_is_truncated_to_microseconds() {
		let precise = stamp().with_nanosecond(250_000_999).expect("nanos");
		let props = BackupProperties {
			timestamp: Some(precise),
			..Default::default()
		};
		let json = props.to_json().expect("json");
		assert!(json.contains(r#""Timestamp":"2024-12-31 18:30:05.250000""#), "{json}");

		let parsed = BackupProperties::from_json(&json).expect("parse");
		assert_eq!(parsed.timestamp, Some(stamp()));
		assert_ne!(parsed.timestamp, Some(precise));
	}

	#[test]
	fn unknown_member_is_ignored() {
		let (parsed, logs) = json::capture_warnings(|| {
			BackupProperties::from_json(r#"{"UserId":"alice","Host":"ledger-01"}"#).expect("parse")
		});
		assert!(logs.contains("unknown member ignored"), "{logs}");
		assert!(logs.contains("Host"), "{logs}");
		assert!(!logs.contains("UserId"), "{logs}");
		assert_eq!(parsed.userid, "alice");
		assert_eq!(parsed.comment, None);
		assert_eq!(parsed.timestamp, None);
	}

	#[test]
	fn wrong_shape_is_ignored() {
		let parsed = BackupProperties::from_json(r#"{"Comment":["a","b"],"UserId":"alice"}"#)
			.expect("parse");
		assert_eq!(parsed.comment, None);
		assert_eq!(parsed.userid, "alice");
	}

	#[test]
	fn bad_timestamp_is_unset() {
		let parsed = BackupProperties::from_json(r#"{"Timestamp":"yesterday"}"#).expect("parse");
		assert_eq!(parsed.timestamp, None);
	}

	#[test]
	fn root_must_be_object() {
		assert!(BackupProperties::from_json("[1, 2]")
			.expect_err("array")
			.is_parse());
		assert!(BackupProperties::from_json("not json")
			.expect_err("garbage")
			.is_parse());
	}
}
