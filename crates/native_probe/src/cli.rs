use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rollup_native::{HostTarget, LoaderConfig};

/// Report which native Rollup binding this host resolves to.
#[derive(Parser, Debug)]
#[command(name = "native-probe")]
#[command(about = "Report which native Rollup binding this host resolves to")]
pub struct Cli {
	/// Platform name to resolve for instead of the host's (e.g. `linux`, `darwin`, `win32`)
	#[arg(long)]
	pub platform: Option<String>,

	/// Architecture name to resolve for instead of the host's (e.g. `x64`, `arm64`)
	#[arg(long)]
	pub arch: Option<String>,

	/// Libc flavor to assume instead of probing the host
	#[arg(long, value_enum)]
	pub libc: Option<Libc>,

	/// Directory checked for a colocated `rollup.<id>.node` artifact
	#[arg(long, value_name = "DIR")]
	pub module_dir: Option<PathBuf>,

	/// Additional directory containing installed packages (repeatable)
	#[arg(long = "package-root", value_name = "DIR")]
	pub package_roots: Vec<PathBuf>,

	/// Load the resolved artifact and report where it came from
	#[arg(long)]
	pub load: bool,

	/// Print the compatibility table and exit
	#[arg(long)]
	pub table: bool,

	/// Emit JSON instead of text
	#[arg(long)]
	pub json: bool,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Libc {
	Glibc,
	Musl,
}

impl Cli {
	/// Host to resolve for, with overrides applied.
	pub fn host(&self) -> HostTarget {
		let current = HostTarget::current();
		HostTarget {
			platform: self.platform.clone().unwrap_or(current.platform),
			arch: self.arch.clone().unwrap_or(current.arch),
		}
	}

	pub fn loader_config(&self) -> LoaderConfig {
		let mut config = match &self.module_dir {
			Some(dir) => LoaderConfig::new(dir),
			None => LoaderConfig::default(),
		};
		config.package_roots.extend(self.package_roots.iter().cloned());
		config
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_overrides() {
		let cli = Cli::try_parse_from([
			"native-probe",
			"--platform",
			"linux",
			"--arch",
			"arm64",
			"--libc",
			"musl",
			"--module-dir",
			"/srv/app",
			"--package-root",
			"/opt/a",
			"--package-root",
			"/opt/b",
		])
		.unwrap();

		assert_eq!(cli.host(), HostTarget::new("linux", "arm64"));
		assert_eq!(cli.libc, Some(Libc::Musl));

		let config = cli.loader_config();
		assert_eq!(config.module_dir, PathBuf::from("/srv/app"));
		assert_eq!(config.package_roots, [PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]);
	}

	#[test]
	fn test_defaults_to_current_host() {
		let cli = Cli::try_parse_from(["native-probe"]).unwrap();
		assert_eq!(cli.host(), HostTarget::current());
		assert!(cli.libc.is_none());
		assert!(!cli.load);
	}
}
