//! Diagnostic command for native binding resolution.
//!
//! Prints the binding identifier the current host (or an overridden one)
//! resolves to, and optionally loads it.

mod cli;

use std::cell::Cell;
use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Libc};
use rollup_native::{BINDINGS_BY_PLATFORM, Loader, detect_musl, resolve, unsupported_message};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize, Debug)]
struct Report {
	platform: String,
	arch: String,
	/// `None` when the table entry does not depend on the libc flavor.
	musl: Option<bool>,
	identifier: Option<&'static str>,
	target: Option<String>,
	loaded_from: Option<String>,
	error: Option<String>,
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let mut stdout = io::stdout().lock();

	if cli.table {
		if cli.json {
			serde_json::to_writer_pretty(&mut stdout, &BINDINGS_BY_PLATFORM)?;
			writeln!(stdout)?;
		} else {
			for name in rollup_native::supported_combinations(&BINDINGS_BY_PLATFORM) {
				writeln!(stdout, "{name}")?;
			}
		}
		return Ok(());
	}

	let host = cli.host();
	let probed = Cell::new(None);
	let resolved = resolve(&BINDINGS_BY_PLATFORM, &host.platform, &host.arch, || {
		let musl = match cli.libc {
			Some(libc) => libc == Libc::Musl,
			None => detect_musl(),
		};
		probed.set(Some(musl));
		musl
	});
	debug!(?resolved, "resolution finished");

	let mut report = Report {
		platform: host.platform.clone(),
		arch: host.arch.clone(),
		musl: probed.get(),
		identifier: resolved.ok(),
		target: None,
		loaded_from: None,
		error: None,
	};

	let outcome = match resolved {
		Ok(identifier) => {
			let loader = Loader::new(cli.loader_config());
			report.target = Some(loader.locate(identifier).specifier());
			if cli.load {
				match loader.load(identifier) {
					Ok(bindings) => {
						report.loaded_from = Some(bindings.path().display().to_string());
						Ok(())
					}
					Err(err) => {
						report.error = Some(err.to_string());
						Err(anyhow::Error::new(err))
					}
				}
			} else {
				Ok(())
			}
		}
		Err(no_match) => {
			let message = unsupported_message(&host.platform, &host.arch, &BINDINGS_BY_PLATFORM);
			report.error = Some(message.clone());
			Err(anyhow::Error::new(no_match).context(message))
		}
	};

	if cli.json {
		serde_json::to_writer_pretty(&mut stdout, &report).context("writing report")?;
		writeln!(stdout)?;
	} else {
		print_report(&mut stdout, &report)?;
	}

	outcome
}

fn print_report(out: &mut impl Write, report: &Report) -> io::Result<()> {
	let libc = match report.musl {
		Some(true) => "musl",
		Some(false) => "glibc",
		None => "not probed",
	};

	writeln!(out, "platform:  {}", report.platform)?;
	writeln!(out, "arch:      {}", report.arch)?;
	writeln!(out, "libc:      {libc}")?;
	writeln!(out, "binding:   {}", report.identifier.unwrap_or("none"))?;
	if let Some(target) = &report.target {
		writeln!(out, "target:    {target}")?;
	}
	if let Some(path) = &report.loaded_from {
		writeln!(out, "loaded:    {path}")?;
	}
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("rollup_native=debug,rollup_native_probe=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_target(false)
		.init();
}
