use std::path::PathBuf;

use clap::{Parser, ValueHint};
use miette::miette;
use obackup::{decode::BackupReader, records::Title};
use tracing::info;

#[derive(Debug, Clone, Parser)]
pub struct HeaderArgs {
	/// Input file.
	#[arg(
		value_hint = ValueHint::AnyPath,
		value_name = "PATH",
	)]
	pub input: PathBuf,

	/// Title of the header: BackupProps, DossierProps, or OpenbookProps.
	#[arg(value_name = "TITLE")]
	pub title: Title,

	/// Parse the header and print the decoded record instead of the raw JSON.
	#[arg(long)]
	pub parse: bool,
}

pub(crate) fn header(args: HeaderArgs) -> miette::Result<()> {
	info!(path=?args.input, "open archive");
	let mut backup = BackupReader::open(&args.input)?;

	if args.parse {
		let record = backup
			.read_record(args.title)?
			.ok_or_else(|| missing(&args))?;
		println!("{record:#?}");
	} else {
		let text = backup
			.read_header(args.title)?
			.ok_or_else(|| missing(&args))?;
		println!("{text}");
	}

	Ok(())
}

fn missing(args: &HeaderArgs) -> miette::Report {
	miette!(
		"{} has no {} header",
		args.input.display(),
		args.title
	)
}
