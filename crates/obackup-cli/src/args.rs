use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::{data::DataArgs, header::HeaderArgs, list::ListArgs};

/// Inspect Openbook backup archives.
#[derive(Debug, Clone, Parser)]
#[command(
	name = "obackup",
	bin_name = "obackup",
	author,
	version,
	after_help = "Want more detail? Try the long '--help' flag!",
	after_long_help = "Didn't expect this much output? Use the short '-h' flag to get short help."
)]
#[cfg_attr(debug_assertions, command(before_help = "⚠ DEBUG BUILD ⚠"))]
pub struct Args {
	/// Set diagnostic log level.
	///
	/// This enables diagnostic logging, which is useful for investigating bugs. Use multiple
	/// times to increase verbosity.
	///
	/// You may want to use with '--log-file' to avoid polluting your terminal.
	///
	/// Setting $RUST_LOG also works, and takes precedence, but is not recommended.
	#[arg(
		long,
		short,
		action = ArgAction::Count,
		num_args = 0,
		global = true,
	)]
	pub verbose: Option<u8>,

	/// Write diagnostic logs to a file.
	///
	/// This writes diagnostic logs to a file, instead of the terminal, in JSON format. If the path
	/// is a directory, a file named after the current time is created in it.
	#[arg(
		long,
		value_hint = ValueHint::AnyPath,
		value_name = "PATH",
		global = true,
	)]
	pub log_file: Option<PathBuf>,

	#[command(subcommand)]
	pub action: Action,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Action {
	/// List the members of an archive.
	List(ListArgs),

	/// Print the JSON text of a header.
	Header(HeaderArgs),

	/// Write the content of the data member.
	Data(DataArgs),
}
