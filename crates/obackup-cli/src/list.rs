use std::path::PathBuf;

use clap::{Parser, ValueHint};
use obackup::{decode::BackupReader, naming};
use regex::Regex;
use tracing::info;

#[derive(Debug, Clone, Parser)]
pub struct ListArgs {
	/// Input file.
	#[arg(
		value_hint = ValueHint::AnyPath,
		value_name = "PATH",
	)]
	pub input: PathBuf,

	/// Show the size and modification time of each member, and its role.
	#[arg(long, short)]
	pub long: bool,

	/// Filter members by name (with a regex).
	///
	/// Can be given multiple times, and members will be matched if they match any of the regexes.
	#[arg(long, value_name = "REGEX")]
	pub filter: Vec<Regex>,
}

pub(crate) fn list(args: ListArgs) -> miette::Result<()> {
	info!(path=?args.input, "open archive");
	let mut backup = BackupReader::open(&args.input)?;

	info!("list members");
	for entry in backup.members()? {
		let name = entry.name();
		if !args.filter.is_empty() && !args.filter.iter().any(|filter| filter.is_match(name)) {
			continue;
		}

		if !args.long {
			println!("{name}");
			continue;
		}

		let role = if let Some(title) = naming::header_title(name) {
			format!("header {title}")
		} else if naming::is_data_member(name) {
			"data".to_owned()
		} else {
			"other".to_owned()
		};
		let modified = entry
			.modified()
			.map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
			.unwrap_or_else(|| "-".into());
		println!(
			"{:o} {:>12} {modified} {name:<24} {role}",
			entry.mode(),
			entry.size()
		);
	}

	Ok(())
}
