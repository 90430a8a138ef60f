use std::{
	env::var,
	fs::{metadata, File},
	io::{Error, Result},
	sync::Mutex,
};

use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::args::Args;

pub fn from_env() -> Result<bool> {
	let Some(filter) = env_filter() else {
		return Ok(false);
	};

	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(filter)
		.try_init()
		.map_err(Error::other)?;
	Ok(true)
}

fn env_filter() -> Option<EnvFilter> {
	var("RUST_LOG").is_ok().then(EnvFilter::from_default_env)
}

fn verbosity_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 | 1 => "warn",
		2 => "info",
		3 => "debug",
		_ => "trace",
	}
}

pub fn from_args(args: &Args) -> Result<()> {
	let verbosity = args.verbose.unwrap_or(0);
	if verbosity == 0 {
		return Ok(());
	}

	let log_file = if let Some(file) = &args.log_file {
		let is_dir = metadata(file).map_or(false, |info| info.is_dir());
		let path = if is_dir {
			let filename = format!(
				"obackup.{}.log",
				chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ")
			);
			file.join(filename)
		} else {
			file.to_owned()
		};

		Some(File::create(path)?)
	} else {
		None
	};

	let mut builder = tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(verbosity_filter(verbosity));

	if verbosity > 2 {
		builder = builder.with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);
	}

	// stdout carries archive content, so logs never go there
	match if let Some(writer) = log_file {
		builder.json().with_writer(Mutex::new(writer)).try_init()
	} else if verbosity > 3 {
		builder.pretty().try_init()
	} else {
		builder.try_init()
	} {
		Ok(_) => info!("logging initialised"),
		Err(e) => eprintln!("Failed to initialise logging, continuing with none\n{e}"),
	}

	Ok(())
}
