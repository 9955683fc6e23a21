//! Host introspection.
//!
//! Maps Rust's target names onto the names the native artifacts are published
//! under, and answers whether the running process uses musl libc.

use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

/// Platform and architecture of a host, in artifact naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
	pub platform: String,
	pub arch: String,
}

impl HostTarget {
	pub fn new(platform: impl Into<String>, arch: impl Into<String>) -> Self {
		Self {
			platform: platform.into(),
			arch: arch.into(),
		}
	}

	/// The host this process runs on.
	pub fn current() -> Self {
		Self::new(
			platform_name(std::env::consts::OS),
			arch_name(std::env::consts::ARCH),
		)
	}
}

/// Translates a Rust `target_os` value into the artifact platform name.
///
/// Unknown names pass through unchanged so they show up verbatim in the
/// unsupported-platform message.
pub fn platform_name(os: &str) -> &str {
	match os {
		"macos" => "darwin",
		"windows" => "win32",
		"solaris" | "illumos" => "sunos",
		other => other,
	}
}

/// Translates a Rust `target_arch` value into the artifact architecture name.
pub fn arch_name(arch: &str) -> &str {
	match arch {
		"x86_64" => "x64",
		"x86" => "ia32",
		"aarch64" => "arm64",
		"powerpc" => "ppc",
		"powerpc64" => "ppc64",
		"loongarch64" => "loong64",
		"mips64" => "mips64el",
		other => other,
	}
}

/// Returns `true` when the running process is linked against musl libc.
///
/// The answer is computed once and cached for the process lifetime.
pub fn detect_musl() -> bool {
	static IS_MUSL: OnceLock<bool> = OnceLock::new();
	*IS_MUSL.get_or_init(|| {
		let is_musl = probe_musl();
		debug!(is_musl, "probed libc flavor");
		is_musl
	})
}

#[cfg(target_os = "linux")]
fn probe_musl() -> bool {
	if cfg!(target_env = "musl") {
		return true;
	}
	if cfg!(target_env = "gnu") {
		return false;
	}

	match std::fs::read_to_string("/proc/self/maps") {
		Ok(maps) => maps_mention_musl(&maps),
		Err(error) => {
			debug!(%error, "cannot read /proc/self/maps, assuming glibc");
			false
		}
	}
}

#[cfg(not(target_os = "linux"))]
fn probe_musl() -> bool {
	false
}

/// Scans a `/proc/<pid>/maps` listing for a mapped musl loader or libc.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn maps_mention_musl(maps: &str) -> bool {
	maps.lines()
		.filter_map(|line| line.split_whitespace().nth(5))
		.filter_map(|path| Path::new(path).file_name()?.to_str())
		.any(|name| name.starts_with("ld-musl-") || name.starts_with("libc.musl-"))
}
