//! Errors raised while initializing the native binding.

use thiserror::Error;

use crate::abi::InvalidHash;
use crate::loader::LoadError;

/// Initialization failed; the native binding is unavailable for this process.
#[derive(Error, Debug)]
pub enum Error {
	/// The table has no entry for the host's platform and architecture.
	#[error("{message}")]
	UnsupportedPlatform {
		platform: String,
		arch: String,
		message: String,
	},

	/// The host uses musl libc and its table entry has no musl artifact.
	#[error("{message}")]
	UnsupportedLibcVariant {
		platform: String,
		arch: String,
		message: String,
	},

	/// A binding was resolved but could not be loaded.
	#[error(transparent)]
	ArtifactLoad(#[from] LoadError),
}

impl Error {
	/// The binding identifier that failed to load, if resolution succeeded.
	pub fn identifier(&self) -> Option<&str> {
		match self {
			Self::ArtifactLoad(err) => Some(err.identifier.as_str()),
			Self::UnsupportedPlatform { .. } | Self::UnsupportedLibcVariant { .. } => None,
		}
	}
}

/// A call into the native binding failed.
#[derive(Error, Debug)]
pub enum CallError {
	/// The binding never initialized; every call observes the same error.
	#[error(transparent)]
	Unavailable(#[from] &'static Error),

	/// The artifact answered with output that is not valid UTF-8.
	#[error(transparent)]
	InvalidHash(#[from] InvalidHash),
}

pub type Result<T> = std::result::Result<T, Error>;
