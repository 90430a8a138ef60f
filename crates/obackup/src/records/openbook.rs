use serde::Serialize;
use serde_json::{Map, Value};

use super::{json, Serializable, Title};
use crate::{constants::APP_VERSION, error::Result};

/// Properties of the software that made the backup.
///
/// Lists keep their order through serialisation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenbookProperties {
	/// Application version.
	pub app_version: String,

	/// Extension modules that were loaded.
	pub plugins: Vec<PluginProperties>,

	/// Database schema models that were installed.
	pub dbmodels: Vec<DbModelProperties>,
}

/// An extension module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PluginProperties {
	/// Canonical name, stable across versions.
	pub canon_name: String,

	/// Human-readable name.
	pub display_name: String,

	/// Module version.
	pub version: String,
}

/// A database schema model, and the schema version it was at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DbModelProperties {
	/// Model identifier.
	pub id: String,

	/// Schema version.
	pub version: u32,
}

impl Default for OpenbookProperties {
	fn default() -> Self {
		Self {
			app_version: APP_VERSION.into(),
			plugins: Vec::new(),
			dbmodels: Vec::new(),
		}
	}
}

#[derive(Serialize)]
struct Wire<'a> {
	#[serde(rename = "Version")]
	version: &'a str,
	#[serde(rename = "Plugins")]
	plugins: Vec<PluginWire<'a>>,
	#[serde(rename = "DBModels")]
	dbmodels: Vec<DbModelWire<'a>>,
}

#[derive(Serialize)]
struct PluginWire<'a> {
	#[serde(rename = "CanonName")]
	canon_name: &'a str,
	#[serde(rename = "DisplayName")]
	display_name: &'a str,
	#[serde(rename = "Version")]
	version: &'a str,
}

#[derive(Serialize)]
struct DbModelWire<'a> {
	#[serde(rename = "Id")]
	id: &'a str,
	#[serde(rename = "Version")]
	version: String,
}

impl OpenbookProperties {
	/// Properties of this build, with the given modules and models.
	pub fn new(plugins: Vec<PluginProperties>, dbmodels: Vec<DbModelProperties>) -> Self {
		Self {
			plugins,
			dbmodels,
			..Default::default()
		}
	}

	/// Parse from JSON text.
	///
	/// A missing version reads as empty, not as this build's version.
	pub fn from_json(text: &str) -> Result<Self> {
		let title = Title::Openbook;
		let mut props = Self {
			app_version: String::new(),
			..Default::default()
		};

		for (key, value) in json::parse_object(title, text)? {
			match key.as_str() {
				"Version" => {
					if let Some(text) = json::scalar(title, &key, &value) {
						props.app_version = text;
					}
				}
				"Plugins" => props.plugins.extend(
					json::array(title, &key, &value)
						.iter()
						.filter_map(|item| json::element(title, &key, item))
						.map(PluginProperties::from_map),
				),
				"DBModels" => props.dbmodels.extend(
					json::array(title, &key, &value)
						.iter()
						.filter_map(|item| json::element(title, &key, item))
						.map(DbModelProperties::from_map),
				),
				_ => json::unknown_member(title, &key),
			}
		}

		Ok(props)
	}
}

impl PluginProperties {
	fn from_map(map: &Map<String, Value>) -> Self {
		let title = Title::Openbook;
		let mut plugin = Self::default();
		for (key, value) in map {
			let field = match key.as_str() {
				"CanonName" => &mut plugin.canon_name,
				"DisplayName" => &mut plugin.display_name,
				"Version" => &mut plugin.version,
				_ => {
					json::unknown_member(title, &format!("Plugins.{key}"));
					continue;
				}
			};

			if let Some(text) = json::scalar(title, key, value) {
				*field = text;
			}
		}

		plugin
	}
}

impl DbModelProperties {
	fn from_map(map: &Map<String, Value>) -> Self {
		let title = Title::Openbook;
		let mut model = Self::default();
		for (key, value) in map {
			match key.as_str() {
				"Id" => {
					if let Some(text) = json::scalar(title, key, value) {
						model.id = text;
					}
				}
				"Version" => {
					if let Some(text) = json::scalar(title, key, value) {
						model.version = json::parse_u32(title, key, &text);
					}
				}
				_ => json::unknown_member(title, &format!("DBModels.{key}")),
			}
		}

		model
	}
}

impl Serializable for OpenbookProperties {
	fn title(&self) -> Title {
		Title::Openbook
	}

	fn to_json(&self) -> Result<String> {
		json::to_string(
			self.title(),
			&Wire {
				version: &self.app_version,
				plugins: self
					.plugins
					.iter()
					.map(|plugin| PluginWire {
						canon_name: &plugin.canon_name,
						display_name: &plugin.display_name,
						version: &plugin.version,
					})
					.collect(),
				dbmodels: self
					.dbmodels
					.iter()
					.map(|model| DbModelWire {
						id: &model.id,
						version: model.version.to_string(),
					})
					.collect(),
			},
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn plugin(canon: &str, display: &str, version: &str) -> PluginProperties {
		PluginProperties {
			canon_name: canon.into(),
			display_name: display.into(),
			version: version.into(),
		}
	}

	fn model(id: &str, version: u32) -> DbModelProperties {
		DbModelProperties {
			id: id.into(),
			version,
		}
	}

	fn sample() -> OpenbookProperties {
		OpenbookProperties {
			app_version: "0.71".into(),
			plugins: vec![
				plugin("openbook-recurrent", "Recurrent operations", "0.71"),
				plugin("openbook-importers", "Importers", "0.70"),
				plugin("openbook-mysql", "MySQL DBMS", "0.71"),
			],
			dbmodels: vec![model("CORE", 38), model("RECURRENT", 12)],
		}
	}

	#[test]
	fn default_is_this_build() {
		assert_eq!(OpenbookProperties::default().app_version, APP_VERSION);
		assert_eq!(
			OpenbookProperties::new(vec![], vec![model("CORE", 1)]).app_version,
			APP_VERSION
		);
	}

	#[test]
	fn wire_format() {
		let props = OpenbookProperties {
			app_version: "0.71".into(),
			plugins: vec![plugin("openbook-mysql", "MySQL DBMS", "0.71")],
			dbmodels: vec![model("CORE", 38)],
		};
		assert_eq!(
			props.to_json().expect("json"),
			concat!(
				r#"{"Version":"0.71","#,
				r#""Plugins":[{"CanonName":"openbook-mysql","DisplayName":"MySQL DBMS","Version":"0.71"}],"#,
				r#""DBModels":[{"Id":"CORE","Version":"38"}]}"#
			)
		);
	}

	#[test]
	fn empty_lists() {
		let props = OpenbookProperties {
			app_version: "0.71".into(),
			plugins: vec![],
			dbmodels: vec![],
		};
		assert_eq!(
			props.to_json().expect("json"),
			r#"{"Version":"0.71","Plugins":[],"DBModels":[]}"#
		);
	}

	#[test]
	fn roundtrip_keeps_order() {
		let props = sample();
		let parsed = OpenbookProperties::from_json(&props.to_json().expect("json")).expect("parse");
		assert_eq!(parsed, props);
		assert_eq!(
			parsed
				.plugins
				.iter()
				.map(|p| p.canon_name.as_str())
				.collect::<Vec<_>>(),
			["openbook-recurrent", "openbook-importers", "openbook-mysql"]
		);
	}

	#[test]
	fn missing_version_is_empty() {
		let parsed = OpenbookProperties::from_json("{}").expect("parse");
		assert_eq!(parsed.app_version, "");
		assert!(parsed.plugins.is_empty());
		assert!(parsed.dbmodels.is_empty());
	}

	#[test]
	fn unknown_content_is_ignored() {
		let (parsed, logs) = json::capture_warnings(|| {
			OpenbookProperties::from_json(
				r#"{
				"Version": "0.80",
				"Plugins": [
					{"CanonName": "a", "Licence": "GPL"},
					"not an object",
					{"CanonName": "b", "DisplayName": "B", "Version": "1"}
				],
				"DBModels": {"Id": "CORE"},
				"Locale": "fr_FR"
			}"#,
			)
			.expect("parse")
		});
		assert!(logs.contains("Plugins.Licence"), "{logs}");
		assert!(logs.contains("Locale"), "{logs}");
		assert_eq!(logs.matches("unexpected value ignored").count(), 2, "{logs}");
		assert_eq!(parsed.app_version, "0.80");
		assert_eq!(
			parsed.plugins,
			[plugin("a", "", ""), plugin("b", "B", "1")]
		);
		assert!(parsed.dbmodels.is_empty());
	}

	#[test]
	fn non_numeric_model_version_is_zero() {
		let parsed =
			OpenbookProperties::from_json(r#"{"DBModels":[{"Id":"CORE","Version":"v38"}]}"#)
				.expect("parse");
		assert_eq!(parsed.dbmodels, [model("CORE", 0)]);
	}
}
