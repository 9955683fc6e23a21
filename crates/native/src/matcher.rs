//! Selects the binding identifier for a platform/architecture pair.

use thiserror::Error;
use tracing::debug;

use crate::table::CompatibilityTable;

/// Why no binding matched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatch {
	/// The table has no entry for the platform/architecture pair.
	#[error("no native binding for this platform and architecture")]
	UnsupportedTarget,
	/// The entry exists but refuses musl hosts, and musl was detected.
	#[error("no native binding for musl libc on this platform and architecture")]
	UnsupportedLibc,
}

/// Resolves the binding identifier for `platform`/`arch`.
///
/// `detect_musl` is only called when the entry declares musl handling; entries
/// without it resolve to their base identifier without probing the host.
pub fn resolve(
	table: &CompatibilityTable,
	platform: &str,
	arch: &str,
	detect_musl: impl FnOnce() -> bool,
) -> Result<&'static str, NoMatch> {
	let descriptor = table
		.get(platform, arch)
		.ok_or(NoMatch::UnsupportedTarget)?;

	let identifier = if descriptor.musl.is_not_applicable() || !detect_musl() {
		descriptor.base
	} else {
		descriptor
			.musl
			.artifact()
			.ok_or(NoMatch::UnsupportedLibc)?
	};

	debug!(platform, arch, identifier, "resolved native binding");
	Ok(identifier)
}
