//! Helpers for the string-only JSON convention.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::Title;
use crate::error::{ErrorKind, Result, SimpleError};

/// Date format: fixed width, sortable.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format, UTC with microseconds.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Serialise a wire struct.
pub(crate) fn to_string<T: Serialize>(title: Title, wire: &T) -> Result<String> {
	serde_json::to_string(wire).map_err(|err| {
		SimpleError::new(ErrorKind::Serialize)
			.with_message(format!("cannot serialise {title}: {err}"))
			.into()
	})
}

/// Parse JSON text whose root must be an object.
pub(crate) fn parse_object(title: Title, text: &str) -> Result<Map<String, Value>> {
	match serde_json::from_str(text) {
		Ok(Value::Object(map)) => Ok(map),
		Ok(other) => Err(SimpleError::parse(format!(
			"{title}: root is not a JSON object but {}",
			shape(&other)
		))
		.into()),
		Err(err) => Err(SimpleError::parse(format!("{title}: invalid JSON: {err}")).into()),
	}
}

/// Get the text of a scalar value.
///
/// Strings are taken as-is. Numbers and booleans, which this convention never writes, are
/// accepted as their text. Null reads as empty. Arrays and objects warn and give `None`.
pub(crate) fn scalar(title: Title, key: &str, value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Null => Some(String::new()),
		Value::Bool(flag) => Some(yes_no(*flag).to_owned()),
		Value::Number(number) => Some(number.to_string()),
		other => {
			unexpected_shape(title, key, "a string", other);
			None
		}
	}
}

/// Get the elements of an array value, warning for anything else.
pub(crate) fn array<'v>(title: Title, key: &str, value: &'v Value) -> &'v [Value] {
	match value {
		Value::Array(items) => items,
		other => {
			unexpected_shape(title, key, "an array", other);
			&[]
		}
	}
}

/// Get an array element as an object, warning for anything else.
pub(crate) fn element<'v>(
	title: Title,
	key: &str,
	value: &'v Value,
) -> Option<&'v Map<String, Value>> {
	match value {
		Value::Object(map) => Some(map),
		other => {
			unexpected_shape(title, key, "an object", other);
			None
		}
	}
}

/// Log an unknown member.
pub(crate) fn unknown_member(title: Title, key: &str) {
	warn!(%title, member = key, "unknown member ignored");
}

fn unexpected_shape(title: Title, key: &str, expected: &str, value: &Value) {
	warn!(%title, member = key, %expected, found = shape(value), "unexpected value ignored");
}

fn shape(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

/// Optional text: empty means unset.
pub(crate) fn optional(text: String) -> Option<String> {
	if text.is_empty() {
		None
	} else {
		Some(text)
	}
}

pub(crate) fn yes_no(flag: bool) -> &'static str {
	if flag {
		"Y"
	} else {
		"N"
	}
}

/// Read a `"Y"`/`"N"` flag. Anything other than `"Y"` is false; values other than `"N"` and empty
/// also warn.
pub(crate) fn parse_yes_no(title: Title, key: &str, text: &str) -> bool {
	match text {
		"Y" | "y" => true,
		"N" | "n" | "" => false,
		other => {
			warn!(%title, member = key, value = other, "expected Y or N, reading as N");
			false
		}
	}
}

pub(crate) fn format_date(date: Option<NaiveDate>) -> String {
	date.map(|date| date.format(DATE_FORMAT).to_string())
		.unwrap_or_default()
}

/// Read a date. Empty is unset; unparseable text warns and is unset.
pub(crate) fn parse_date(title: Title, key: &str, text: &str) -> Option<NaiveDate> {
	if text.is_empty() {
		return None;
	}

	NaiveDate::parse_from_str(text, DATE_FORMAT)
		.map_err(|err| warn!(%title, member = key, value = text, %err, "invalid date ignored"))
		.ok()
}

/// Write a timestamp, truncated to the microsecond.
pub(crate) fn format_timestamp(stamp: Option<DateTime<Utc>>) -> String {
	stamp
		.map(|stamp| stamp.trunc_subsecs(6).format(TIMESTAMP_FORMAT).to_string())
		.unwrap_or_default()
}

/// Read a timestamp. Empty is unset; unparseable text warns and is unset.
pub(crate) fn parse_timestamp(title: Title, key: &str, text: &str) -> Option<DateTime<Utc>> {
	if text.is_empty() {
		return None;
	}

	NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
		.map(|naive| naive.and_utc())
		.map_err(|err| warn!(%title, member = key, value = text, %err, "invalid timestamp ignored"))
		.ok()
}

/// The current time, at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
	Utc::now().trunc_subsecs(6)
}

/// Read a decimal integer. Empty is zero; unparseable text warns and is zero.
pub(crate) fn parse_u32(title: Title, key: &str, text: &str) -> u32 {
	if text.is_empty() {
		return 0;
	}

	text.trim().parse().unwrap_or_else(|err| {
		warn!(%title, member = key, value = text, %err, "invalid integer read as 0");
		0
	})
}

/// Run `f`, returning its output and the warnings it logged.
#[cfg(test)]
pub(crate) fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
	use std::{
		io,
		sync::{Arc, Mutex},
	};

	#[derive(Clone, Default)]
	struct Capture(Arc<Mutex<Vec<u8>>>);

	impl io::Write for Capture {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0
				.lock()
				.map_err(|_| io::Error::other("capture poisoned"))?
				.extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	let capture = Capture::default();
	let writer = capture.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::WARN)
		.with_ansi(false)
		.with_writer(move || writer.clone())
		.finish();
	let output = tracing::subscriber::with_default(subscriber, f);

	let bytes = capture.0.lock().expect("capture").clone();
	(output, String::from_utf8(bytes).expect("utf8 logs"))
}

#[cfg(test)]
mod tests {
	use chrono::{TimeZone, Timelike};

	use super::*;

	#[test]
	fn root_must_be_object() {
		let err = parse_object(Title::Backup, "[]").expect_err("array root");
		assert!(err.is_parse());
		let err = parse_object(Title::Backup, "\"text\"").expect_err("string root");
		assert!(err.is_parse());
		let err = parse_object(Title::Backup, "{\"Comment\":").expect_err("malformed");
		assert!(err.is_parse());
		assert!(parse_object(Title::Backup, "{}").expect("empty").is_empty());
	}

	#[test]
	fn shape_mismatch_warns() {
		let ((text, items), logs) = capture_warnings(|| {
			(
				scalar(Title::Dossier, "RPID", &Value::Array(vec![])),
				array(Title::Openbook, "Plugins", &Value::Bool(true)).len(),
			)
		});
		assert_eq!(text, None);
		assert_eq!(items, 0);
		assert!(logs.contains("unexpected value ignored"), "{logs}");
		assert!(logs.contains("RPID"), "{logs}");
		assert!(logs.contains("Plugins"), "{logs}");

		let (text, quiet) = capture_warnings(|| scalar(Title::Dossier, "RPID", &Value::from("RP-1")));
		assert_eq!(text.as_deref(), Some("RP-1"));
		assert_eq!(quiet, "");
	}

	#[test]
	fn flags() {
		assert_eq!(yes_no(true), "Y");
		assert_eq!(yes_no(false), "N");
		assert!(parse_yes_no(Title::Dossier, "Current", "Y"));
		assert!(!parse_yes_no(Title::Dossier, "Current", "N"));
		assert!(!parse_yes_no(Title::Dossier, "Current", ""));
		assert!(!parse_yes_no(Title::Dossier, "Current", "true"));
	}

	#[test]
	fn dates_are_fixed_width() {
		let date = NaiveDate::from_ymd_opt(2024, 3, 5);
		assert_eq!(format_date(date), "2024-03-05");
		assert_eq!(format_date(None), "");
		assert_eq!(parse_date(Title::Dossier, "BeginDate", "2024-03-05"), date);
		assert_eq!(parse_date(Title::Dossier, "BeginDate", ""), None);
		assert_eq!(parse_date(Title::Dossier, "BeginDate", "05/03/2024"), None);
	}

	#[test]
	fn timestamps_keep_microseconds() {
		let stamp = Utc
			.with_ymd_and_hms(2024, 1, 31, 17, 45, 0)
			.single()
			.and_then(|stamp| stamp.with_nanosecond(123_456_000))
			.expect("stamp");
		let text = format_timestamp(Some(stamp));
		assert_eq!(text, "2024-01-31 17:45:00.123456");
		assert_eq!(parse_timestamp(Title::Backup, "Timestamp", &text), Some(stamp));
		assert_eq!(
			parse_timestamp(Title::Backup, "Timestamp", "2024-01-31 17:45:00"),
			Utc.with_ymd_and_hms(2024, 1, 31, 17, 45, 0).single()
		);
	}

	#[test]
	fn now_roundtrips() {
		let stamp = now();
		let text = format_timestamp(Some(stamp));
		assert_eq!(parse_timestamp(Title::Backup, "Timestamp", &text), Some(stamp));
	}

	#[test]
	fn scalars() {
		assert_eq!(
			scalar(Title::Backup, "UserId", &Value::from("alice")),
			Some("alice".into())
		);
		assert_eq!(scalar(Title::Backup, "UserId", &Value::Null), Some("".into()));
		assert_eq!(scalar(Title::Backup, "UserId", &Value::from(42)), Some("42".into()));
		assert_eq!(scalar(Title::Backup, "UserId", &serde_json::json!(["a"])), None);
	}

	#[test]
	fn integers() {
		assert_eq!(parse_u32(Title::Openbook, "Version", "42"), 42);
		assert_eq!(parse_u32(Title::Openbook, "Version", ""), 0);
		assert_eq!(parse_u32(Title::Openbook, "Version", "forty-two"), 0);
	}
}
