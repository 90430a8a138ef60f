use std::{
	fs::File,
	io::{stdout, BufWriter, Write},
	path::PathBuf,
};

use clap::{Parser, ValueHint};
use miette::{bail, IntoDiagnostic};
use obackup::decode::BackupReader;
use tracing::info;

#[derive(Debug, Clone, Parser)]
pub struct DataArgs {
	/// Input file.
	#[arg(
		value_hint = ValueHint::AnyPath,
		value_name = "PATH",
	)]
	pub input: PathBuf,

	/// Write to this file instead of standard output.
	#[arg(long, short,
		value_hint = ValueHint::AnyPath,
		value_name = "PATH",
	)]
	pub output: Option<PathBuf>,
}

pub(crate) fn data(args: DataArgs) -> miette::Result<()> {
	info!(path=?args.input, "open archive");
	let mut backup = BackupReader::open(&args.input)?;

	let mut output: Box<dyn Write> = if let Some(path) = &args.output {
		info!(?path, "create output file");
		Box::new(BufWriter::new(File::create(path).into_diagnostic()?))
	} else {
		Box::new(stdout().lock())
	};

	let found = backup.read_data(|chunk| output.write_all(chunk))?;
	output.flush().into_diagnostic()?;

	if !found {
		bail!("{} has no data member", args.input.display());
	}

	Ok(())
}
