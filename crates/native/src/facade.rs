//! One-shot initialization of the native binding.
//!
//! [`initialize`] runs resolution and loading and returns the outcome to the
//! caller. [`bindings`] wraps it in a process-wide singleton: the first call
//! initializes, every later call observes the same binding or the same error.
//! A failed initialization is never retried.

use std::sync::OnceLock;

use tracing::{debug, info, info_span, warn};

use crate::abi::{Bindings, ParseTask};
use crate::error::{CallError, Error, Result};
use crate::host::{HostTarget, detect_musl};
use crate::loader::{Loader, LoaderConfig};
use crate::matcher::{self, NoMatch};
use crate::report::unsupported_message;
use crate::table::BINDINGS_BY_PLATFORM;

/// Resolves and loads the binding for `host`, probing libc when needed.
pub fn initialize(host: &HostTarget, config: LoaderConfig) -> Result<Bindings> {
	initialize_with(host, config, detect_musl)
}

/// Like [`initialize`], with an explicit libc probe.
pub fn initialize_with(
	host: &HostTarget,
	config: LoaderConfig,
	detect_musl: impl FnOnce() -> bool,
) -> Result<Bindings> {
	let _span = info_span!("native_binding", platform = %host.platform, arch = %host.arch).entered();
	debug!("resolving native binding");

	let identifier = match matcher::resolve(&BINDINGS_BY_PLATFORM, &host.platform, &host.arch, detect_musl) {
		Ok(identifier) => identifier,
		Err(no_match) => {
			warn!(reason = %no_match, "no native binding for this host");
			let platform = host.platform.clone();
			let arch = host.arch.clone();
			let message = unsupported_message(&platform, &arch, &BINDINGS_BY_PLATFORM);
			return Err(match no_match {
				NoMatch::UnsupportedTarget => Error::UnsupportedPlatform {
					platform,
					arch,
					message,
				},
				NoMatch::UnsupportedLibc => Error::UnsupportedLibcVariant {
					platform,
					arch,
					message,
				},
			});
		}
	};

	let bindings = Loader::new(config).load(identifier)?;
	info!(identifier, path = %bindings.path().display(), "native binding ready");
	Ok(bindings)
}

static BINDINGS: OnceLock<Result<Bindings>> = OnceLock::new();

/// The binding for the running host, initialized on first use.
pub fn bindings() -> std::result::Result<&'static Bindings, &'static Error> {
	BINDINGS
		.get_or_init(|| initialize(&HostTarget::current(), LoaderConfig::default()))
		.as_ref()
}

/// Parses `code` with the native parser. See [`Bindings::parse`].
pub fn parse(
	code: &str,
	allow_return_outside_function: bool,
	jsx: bool,
) -> std::result::Result<Vec<u8>, &'static Error> {
	Ok(bindings()?.parse(code, allow_return_outside_function, jsx))
}

/// Parses `code` off the calling thread. See [`Bindings::parse_async`].
pub fn parse_async(
	code: &str,
	allow_return_outside_function: bool,
	jsx: bool,
) -> std::result::Result<ParseTask, &'static Error> {
	Ok(bindings()?.parse_async(code, allow_return_outside_function, jsx))
}

/// Hashes `input`. See [`Bindings::xxhash_base64_url`].
pub fn xxhash_base64_url(input: &[u8]) -> std::result::Result<String, CallError> {
	Ok(bindings()?.xxhash_base64_url(input)?)
}
