//! Locating and loading the artifact for a resolved binding identifier.
//!
//! An artifact colocated with the module (`<module_dir>/rollup.<id>.node`)
//! wins. Otherwise the optional package `@rollup/rollup-<id>` is looked up in
//! the `node_modules` directories above the module directory, then in the
//! configured package roots.

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::abi::Bindings;

/// Prefix shared by artifact file names and package names.
pub const ARTIFACT_PREFIX: &str = "rollup";
/// Extension of native addon artifacts.
pub const ARTIFACT_EXTENSION: &str = "node";
/// npm scope the per-platform packages are published under.
pub const PACKAGE_SCOPE: &str = "@rollup";

/// File name of the artifact for `identifier`, e.g. `rollup.linux-x64-gnu.node`.
pub fn artifact_file_name(identifier: &str) -> String {
	format!("{ARTIFACT_PREFIX}.{identifier}.{ARTIFACT_EXTENSION}")
}

/// Package shipping the artifact for `identifier`, e.g. `@rollup/rollup-linux-x64-gnu`.
pub fn package_name(identifier: &str) -> String {
	format!("{PACKAGE_SCOPE}/{ARTIFACT_PREFIX}-{identifier}")
}

/// Where the loader looks for artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoaderConfig {
	/// Directory checked for a colocated artifact, and the starting point of
	/// the `node_modules` walk.
	pub module_dir: PathBuf,
	/// Extra directories that contain installed packages directly, searched
	/// after the `node_modules` walk.
	pub package_roots: Vec<PathBuf>,
}

impl Default for LoaderConfig {
	fn default() -> Self {
		Self {
			module_dir: default_module_dir(),
			package_roots: Vec::new(),
		}
	}
}

impl LoaderConfig {
	pub fn new(module_dir: impl Into<PathBuf>) -> Self {
		Self {
			module_dir: module_dir.into(),
			package_roots: Vec::new(),
		}
	}

	pub fn with_package_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.package_roots.push(root.into());
		self
	}
}

/// Directory of the running executable, or the working directory if unknown.
fn default_module_dir() -> PathBuf {
	std::env::current_exe()
		.ok()
		.and_then(|exe| exe.parent().map(Path::to_path_buf))
		.unwrap_or_else(|| PathBuf::from("."))
}

/// What the loader is going to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
	/// Artifact colocated with the module.
	Local(PathBuf),
	/// Installed optional package, by name.
	Package(String),
}

impl LoadTarget {
	/// Module specifier for messages: `./rollup.<id>.node` or the package name.
	pub fn specifier(&self) -> String {
		match self {
			Self::Local(path) => match path.file_name() {
				Some(name) => format!("./{}", name.to_string_lossy()),
				None => path.display().to_string(),
			},
			Self::Package(name) => name.clone(),
		}
	}
}

/// Underlying reason an artifact could not be loaded.
#[derive(Error, Debug)]
pub enum LoadCause {
	/// No directory for the package exists in any search location.
	#[error("package {package} is not installed ({} locations searched)", searched.len())]
	PackageNotFound { package: String, searched: Vec<PathBuf> },

	/// The package's `package.json` is not valid.
	#[error("invalid package manifest {}: {source}", path.display())]
	Manifest {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	/// Filesystem I/O error.
	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	/// The dynamic loader rejected the artifact.
	#[error("failed to load native library: {0}")]
	Library(#[from] libloading::Error),

	/// The artifact lacks one of the expected exports.
	#[error("native library does not export `{symbol}`")]
	MissingSymbol {
		symbol: &'static str,
		#[source]
		source: libloading::Error,
	},

	/// The artifact was built for a different ABI revision.
	#[error("native ABI version mismatch: expected {expected}, found {actual}")]
	AbiMismatch { expected: u32, actual: u32 },
}

/// A resolved binding that could not be loaded.
///
/// The message follows the npm optional-dependency failure mode, which is by
/// far the most common reason for a missing artifact.
#[derive(Error, Debug)]
#[error(
	"Cannot find module {specifier}. npm has a bug related to optional dependencies \
	 (https://github.com/npm/cli/issues/4828). Please try `npm i` again after removing both \
	 package-lock.json and node_modules directory."
)]
pub struct LoadError {
	/// Binding identifier that was resolved for the host.
	pub identifier: String,
	/// Module specifier that failed, see [`LoadTarget::specifier`].
	pub specifier: String,
	#[source]
	pub cause: LoadCause,
}

/// Loads artifacts according to a [`LoaderConfig`].
#[derive(Debug, Clone)]
pub struct Loader {
	config: LoaderConfig,
}

#[derive(Deserialize)]
struct PackageManifest {
	main: Option<String>,
}

impl Loader {
	pub fn new(config: LoaderConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &LoaderConfig {
		&self.config
	}

	/// Picks the local artifact when it exists, the package otherwise.
	pub fn locate(&self, identifier: &str) -> LoadTarget {
		let local = self.config.module_dir.join(artifact_file_name(identifier));
		if local.exists() {
			LoadTarget::Local(local)
		} else {
			LoadTarget::Package(package_name(identifier))
		}
	}

	/// Loads the artifact for `identifier`.
	pub fn load(&self, identifier: &str) -> Result<Bindings, LoadError> {
		let target = self.locate(identifier);
		debug!(identifier, target = %target.specifier(), "loading native artifact");

		self.open(identifier, &target).map_err(|cause| {
			warn!(identifier, target = %target.specifier(), error = %cause, "failed to load native artifact");
			LoadError {
				identifier: identifier.to_string(),
				specifier: target.specifier(),
				cause,
			}
		})
	}

	fn open(&self, identifier: &str, target: &LoadTarget) -> Result<Bindings, LoadCause> {
		let path = match target {
			LoadTarget::Local(path) => path.clone(),
			LoadTarget::Package(name) => self.package_artifact(identifier, name)?,
		};

		// SAFETY: artifacts named by the binding conventions are built
		// against this crate's ABI; the version symbol is checked first.
		let bindings = unsafe { Bindings::open(&path, identifier) }?;
		info!(identifier, path = %path.display(), "loaded native artifact");
		Ok(bindings)
	}

	/// Directories where package `name` may be installed, in search order.
	pub fn package_dirs(&self, name: &str) -> Vec<PathBuf> {
		let node_modules = self
			.config
			.module_dir
			.ancestors()
			.map(|dir| dir.join("node_modules"));

		node_modules
			.chain(self.config.package_roots.iter().cloned())
			.map(|root| name.split('/').fold(root, |dir, segment| dir.join(segment)))
			.collect()
	}

	/// Finds the installed package and the artifact it ships.
	fn package_artifact(&self, identifier: &str, name: &str) -> Result<PathBuf, LoadCause> {
		let searched = self.package_dirs(name);
		let Some(package_dir) = searched.iter().find(|dir| dir.is_dir()) else {
			return Err(LoadCause::PackageNotFound {
				package: name.to_string(),
				searched,
			});
		};

		debug!(package = name, dir = %package_dir.display(), "found installed package");
		let main = read_package_main(package_dir)?;
		Ok(package_dir.join(main.unwrap_or_else(|| artifact_file_name(identifier))))
	}
}

/// Reads the `main` entry of `<dir>/package.json`, if the manifest exists.
fn read_package_main(dir: &Path) -> Result<Option<String>, LoadCause> {
	let path = dir.join("package.json");
	let content = match fs::read_to_string(&path) {
		Ok(content) => content,
		Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
		Err(error) => return Err(error.into()),
	};

	let manifest: PackageManifest =
		serde_json::from_str(&content).map_err(|source| LoadCause::Manifest { path, source })?;
	Ok(manifest.main)
}
