use chrono::NaiveDate;
use serde::Serialize;

use super::{json, Serializable, Title};
use crate::error::Result;

/// Properties of the dossier at the time of the backup.
///
/// This is a snapshot of the exercice that was open when the backup was made.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DossierProperties {
	/// Whether the exercice is the current one.
	pub is_current: bool,

	/// First day of the exercice.
	pub begin_date: Option<NaiveDate>,

	/// Last day of the exercice.
	pub end_date: Option<NaiveDate>,

	/// Identifier of the dossier in the administrative register.
	pub rpid: Option<String>,
}

#[derive(Serialize)]
struct Wire<'a> {
	#[serde(rename = "Current")]
	current: &'static str,
	#[serde(rename = "BeginDate")]
	begin_date: String,
	#[serde(rename = "EndDate")]
	end_date: String,
	#[serde(rename = "RPID")]
	rpid: &'a str,
}

impl DossierProperties {
	/// Parse from JSON text.
	///
	/// Members that are missing keep their defaults: not current, no dates, no identifier.
	pub fn from_json(text: &str) -> Result<Self> {
		let title = Title::Dossier;
		let mut props = Self::default();

		for (key, value) in json::parse_object(title, text)? {
			let scalar = || json::scalar(title, &key, &value);
			match key.as_str() {
				"Current" => {
					if let Some(text) = scalar() {
						props.is_current = json::parse_yes_no(title, &key, &text);
					}
				}
				"BeginDate" => {
					if let Some(text) = scalar() {
						props.begin_date = json::parse_date(title, &key, &text);
					}
				}
				"EndDate" => {
					if let Some(text) = scalar() {
						props.end_date = json::parse_date(title, &key, &text);
					}
				}
				"RPID" => {
					if let Some(text) = scalar() {
						props.rpid = json::optional(text);
					}
				}
				_ => json::unknown_member(title, &key),
			}
		}

		Ok(props)
	}
}

impl Serializable for DossierProperties {
	fn title(&self) -> Title {
		Title::Dossier
	}

	fn to_json(&self) -> Result<String> {
		json::to_string(
			self.title(),
			&Wire {
				current: json::yes_no(self.is_current),
				begin_date: json::format_date(self.begin_date),
				end_date: json::format_date(self.end_date),
				rpid: self.rpid.as_deref().unwrap_or_default(),
			},
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
		NaiveDate::from_ymd_opt(y, m, d)
	}

	#[test]
	fn wire_format() {
		let props = DossierProperties {
			is_current: true,
			begin_date: date(2024, 1, 1),
			end_date: date(2024, 12, 31),
			rpid: Some("RP-42".into()),
		};
		assert_eq!(
			props.to_json().expect("json"),
			r#"{"Current":"Y","BeginDate":"2024-01-01","EndDate":"2024-12-31","RPID":"RP-42"}"#
		);
	}

	#[test]
	fn unset_fields_are_empty_strings() {
		assert_eq!(
			DossierProperties::default().to_json().expect("json"),
			r#"{"Current":"N","BeginDate":"","EndDate":"","RPID":""}"#
		);
	}

	#[test]
	fn roundtrip() {
		let props = DossierProperties {
			is_current: true,
			begin_date: date(2024, 1, 1),
			end_date: date(2024, 12, 31),
			rpid: Some("RP-42".into()),
		};
		let parsed = DossierProperties::from_json(&props.to_json().expect("json")).expect("parse");
		assert!(parsed.is_current);
		assert_eq!(parsed.begin_date, date(2024, 1, 1));
		assert_eq!(parsed.end_date, date(2024, 12, 31));
		assert_eq!(parsed.rpid.as_deref(), Some("RP-42"));
		assert_eq!(parsed, props);
	}

	#[test]
	fn empty_object_gives_defaults() {
		let parsed = DossierProperties::from_json("{}").expect("parse");
		assert!(!parsed.is_current);
		assert_eq!(parsed.begin_date, None);
		assert_eq!(parsed.end_date, None);
		assert_eq!(parsed.rpid.as_deref().unwrap_or_default(), "");
	}

	#[test]
	fn known_and_unknown_members() {
		let (parsed, logs) = json::capture_warnings(|| {
			DossierProperties::from_json(r#"{"RPID":"RP-1","Currency":"EUR"}"#).expect("parse")
		});
		assert!(logs.contains("unknown member ignored"), "{logs}");
		assert!(logs.contains("Currency"), "{logs}");
		assert_eq!(logs.lines().count(), 1, "{logs}");
		assert_eq!(
			parsed,
			DossierProperties {
				rpid: Some("RP-1".into()),
				..Default::default()
			}
		);
	}

	#[test]
	fn invalid_date_is_unset() {
		let parsed =
			DossierProperties::from_json(r#"{"BeginDate":"2024-02-30","EndDate":"2024-12-31"}"#)
				.expect("parse");
		assert_eq!(parsed.begin_date, None);
		assert_eq!(parsed.end_date, date(2024, 12, 31));
	}

	#[test]
	fn nested_value_is_ignored() {
		let parsed =
			DossierProperties::from_json(r#"{"Current":{"value":"Y"}}"#).expect("parse");
		assert!(!parsed.is_current);
	}
}
