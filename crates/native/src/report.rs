//! Diagnostic message for hosts without a matching binding.

use crate::table::CompatibilityTable;

/// Package to recommend when no native build fits the host.
pub const WASM_FALLBACK_PACKAGE: &str = "@rollup/wasm-node";

/// Builds the message shown when `platform`/`arch` has no binding.
///
/// Lists every supported combination in table order. Entries with a musl
/// artifact appear a second time with a `(musl)` suffix.
pub fn unsupported_message(platform: &str, arch: &str, table: &CompatibilityTable) -> String {
	let mut message = format!(
		"Your current platform \"{platform}\" and architecture \"{arch}\" combination is not yet \
		 supported by the native Rollup build. Please use the WASM build \
		 \"{WASM_FALLBACK_PACKAGE}\" instead.\n\n\
		 The following platform-architecture combinations are supported:\n"
	);

	message.push_str(&supported_combinations(table).join("\n"));
	message.push_str(
		"\n\nIf this is important to you, please consider supporting Rollup to make a native build \
		 for your platform and architecture available.",
	);
	message
}

/// One line per supported combination, musl variants included.
pub fn supported_combinations(table: &CompatibilityTable) -> Vec<String> {
	table
		.entries()
		.flat_map(|entry| {
			let name = format!("{}-{}", entry.platform, entry.arch);
			let musl = entry
				.descriptor
				.musl
				.artifact()
				.map(|_| format!("{name} (musl)"));
			std::iter::once(name).chain(musl)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::table::{BINDINGS_BY_PLATFORM, BindingDescriptor, PlatformBindings};

	#[test]
	fn test_full_message() {
		let expected = r#"Your current platform "freebsd" and architecture "x64" combination is not yet supported by the native Rollup build. Please use the WASM build "@rollup/wasm-node" instead.

The following platform-architecture combinations are supported:
android-arm
android-arm64
darwin-arm64
darwin-x64
linux-arm
linux-arm64
linux-arm64 (musl)
linux-riscv64
linux-x64
linux-x64 (musl)
win32-arm64
win32-ia32
win32-x64

If this is important to you, please consider supporting Rollup to make a native build for your platform and architecture available."#;

		assert_eq!(unsupported_message("freebsd", "x64", &BINDINGS_BY_PLATFORM), expected);
	}

	#[test]
	fn test_deterministic() {
		let first = unsupported_message("sunos", "x64", &BINDINGS_BY_PLATFORM);
		let second = unsupported_message("sunos", "x64", &BINDINGS_BY_PLATFORM);
		assert_eq!(first, second);
	}

	#[test]
	fn test_null_and_absent_musl_render_alike() {
		static TABLE: CompatibilityTable = CompatibilityTable::new(&[PlatformBindings {
			platform: "linux",
			architectures: &[
				("arm", BindingDescriptor::without_musl("linux-arm-gnueabihf")),
				("ppc64", BindingDescriptor::new("linux-ppc64-gnu")),
				("x64", BindingDescriptor::with_musl("linux-x64-gnu", "linux-x64-musl")),
			],
		}]);

		assert_eq!(
			supported_combinations(&TABLE),
			["linux-arm", "linux-ppc64", "linux-x64", "linux-x64 (musl)"]
		);
	}
}
