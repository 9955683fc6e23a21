//! Compatibility table of prebuilt native bindings.
//!
//! Every supported platform/architecture pair maps to exactly one
//! [`BindingDescriptor`]. The table is a `static` value: it is never built at
//! runtime and has no mutation path.
//!
//! Platform and architecture names follow the Node.js conventions the
//! artifacts are published under (`linux`, `darwin`, `win32`; `x64`, `arm64`,
//! `ia32`), see [`crate::host`] for the mapping from Rust target names.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// How an entry treats hosts running on musl libc.
///
/// The three states are load-bearing: [`MuslVariant::NotApplicable`] means the
/// libc probe is never consulted, while [`MuslVariant::Unsupported`] consults it
/// and refuses musl hosts instead of handing them the glibc artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuslVariant {
	/// The libc flavor is irrelevant for this entry.
	NotApplicable,
	/// musl hosts have no artifact for this entry.
	Unsupported,
	/// Identifier of the dedicated musl artifact.
	Artifact(&'static str),
}

impl MuslVariant {
	/// Returns `true` when resolving this entry never needs the libc probe.
	pub const fn is_not_applicable(&self) -> bool {
		matches!(self, Self::NotApplicable)
	}

	/// Returns the musl artifact identifier, if there is one.
	pub const fn artifact(&self) -> Option<&'static str> {
		match self {
			Self::Artifact(identifier) => Some(*identifier),
			Self::NotApplicable | Self::Unsupported => None,
		}
	}
}

// `NotApplicable` is skipped by the descriptor, `Unsupported` becomes `null`.
impl Serialize for MuslVariant {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Artifact(identifier) => serializer.serialize_some(identifier),
			Self::NotApplicable | Self::Unsupported => serializer.serialize_none(),
		}
	}
}

/// Artifact identifiers for one platform/architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BindingDescriptor {
	/// Identifier of the default (glibc or non-Linux) artifact.
	pub base: &'static str,
	/// musl handling for this pair.
	#[serde(skip_serializing_if = "MuslVariant::is_not_applicable")]
	pub musl: MuslVariant,
}

impl BindingDescriptor {
	/// A descriptor whose platform never uses libc detection.
	pub const fn new(base: &'static str) -> Self {
		Self {
			base,
			musl: MuslVariant::NotApplicable,
		}
	}

	/// A descriptor with a dedicated musl artifact.
	pub const fn with_musl(base: &'static str, musl: &'static str) -> Self {
		Self {
			base,
			musl: MuslVariant::Artifact(musl),
		}
	}

	/// A descriptor that refuses musl hosts.
	pub const fn without_musl(base: &'static str) -> Self {
		Self {
			base,
			musl: MuslVariant::Unsupported,
		}
	}
}

/// Architectures supported on one platform, in table order.
#[derive(Debug, Clone, Copy)]
pub struct PlatformBindings {
	pub platform: &'static str,
	pub architectures: &'static [(&'static str, BindingDescriptor)],
}

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
	pub platform: &'static str,
	pub arch: &'static str,
	pub descriptor: BindingDescriptor,
}

/// Ordered mapping from (platform, architecture) to [`BindingDescriptor`].
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityTable {
	platforms: &'static [PlatformBindings],
}

impl CompatibilityTable {
	pub const fn new(platforms: &'static [PlatformBindings]) -> Self {
		Self { platforms }
	}

	/// Looks up the descriptor for a platform/architecture pair.
	pub fn get(&self, platform: &str, arch: &str) -> Option<&'static BindingDescriptor> {
		let platforms: &'static [PlatformBindings] = self.platforms;
		platforms
			.iter()
			.find(|p| p.platform == platform)?
			.architectures
			.iter()
			.find(|(name, _)| *name == arch)
			.map(|(_, descriptor)| descriptor)
	}

	/// Iterates all entries in table order.
	pub fn entries(&self) -> impl Iterator<Item = TableEntry> + use<> {
		let platforms: &'static [PlatformBindings] = self.platforms;
		platforms.iter().flat_map(|p| {
			p.architectures.iter().map(move |&(arch, descriptor)| TableEntry {
				platform: p.platform,
				arch,
				descriptor,
			})
		})
	}

	pub fn platforms(&self) -> &'static [PlatformBindings] {
		self.platforms
	}

	/// Pairs that appear more than once. Empty for a well-formed table.
	pub fn duplicate_pairs(&self) -> Vec<(&'static str, &'static str)> {
		let entries: Vec<_> = self.entries().collect();
		let mut duplicates = Vec::new();
		for (i, entry) in entries.iter().enumerate() {
			let pair = (entry.platform, entry.arch);
			let seen = entries[..i].iter().any(|e| (e.platform, e.arch) == pair);
			if seen && !duplicates.contains(&pair) {
				duplicates.push(pair);
			}
		}
		duplicates
	}
}

impl Serialize for CompatibilityTable {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.platforms.len()))?;
		for platform in self.platforms {
			map.serialize_entry(platform.platform, &Architectures(platform.architectures))?;
		}
		map.end()
	}
}

struct Architectures(&'static [(&'static str, BindingDescriptor)]);

impl Serialize for Architectures {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for (arch, descriptor) in self.0 {
			map.serialize_entry(arch, descriptor)?;
		}
		map.end()
	}
}

/// The bindings published for this release.
pub static BINDINGS_BY_PLATFORM: CompatibilityTable = CompatibilityTable::new(&[
	PlatformBindings {
		platform: "android",
		architectures: &[
			("arm", BindingDescriptor::new("android-arm-eabi")),
			("arm64", BindingDescriptor::new("android-arm64")),
		],
	},
	PlatformBindings {
		platform: "darwin",
		architectures: &[
			("arm64", BindingDescriptor::new("darwin-arm64")),
			("x64", BindingDescriptor::new("darwin-x64")),
		],
	},
	PlatformBindings {
		platform: "linux",
		architectures: &[
			("arm", BindingDescriptor::without_musl("linux-arm-gnueabihf")),
			("arm64", BindingDescriptor::with_musl("linux-arm64-gnu", "linux-arm64-musl")),
			("riscv64", BindingDescriptor::without_musl("linux-riscv64-gnu")),
			("x64", BindingDescriptor::with_musl("linux-x64-gnu", "linux-x64-musl")),
		],
	},
	PlatformBindings {
		platform: "win32",
		architectures: &[
			("arm64", BindingDescriptor::new("win32-arm64-msvc")),
			("ia32", BindingDescriptor::new("win32-ia32-msvc")),
			("x64", BindingDescriptor::new("win32-x64-msvc")),
		],
	},
]);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_lookup_both_levels() {
		let descriptor = BINDINGS_BY_PLATFORM.get("linux", "x64").unwrap();
		assert_eq!(descriptor.base, "linux-x64-gnu");
		assert_eq!(descriptor.musl, MuslVariant::Artifact("linux-x64-musl"));

		assert!(BINDINGS_BY_PLATFORM.get("freebsd", "x64").is_none());
		assert!(BINDINGS_BY_PLATFORM.get("darwin", "ia32").is_none());
	}

	#[test]
	fn test_musl_states_are_distinct() {
		let arm = BINDINGS_BY_PLATFORM.get("linux", "arm").unwrap();
		let darwin = BINDINGS_BY_PLATFORM.get("darwin", "arm64").unwrap();
		assert_eq!(arm.musl, MuslVariant::Unsupported);
		assert_eq!(darwin.musl, MuslVariant::NotApplicable);
		assert_ne!(arm.musl, darwin.musl);
		assert_eq!(arm.musl.artifact(), None);
	}

	#[test]
	fn test_no_duplicate_pairs() {
		assert!(BINDINGS_BY_PLATFORM.duplicate_pairs().is_empty());
		assert_eq!(BINDINGS_BY_PLATFORM.entries().count(), 11);
	}

	#[test]
	fn test_duplicate_pairs_detected() {
		static TABLE: CompatibilityTable = CompatibilityTable::new(&[
			PlatformBindings {
				platform: "linux",
				architectures: &[
					("x64", BindingDescriptor::new("a")),
					("x64", BindingDescriptor::new("b")),
				],
			},
		]);
		assert_eq!(TABLE.duplicate_pairs(), vec![("linux", "x64")]);
	}

	#[test]
	fn test_entries_follow_table_order() {
		let pairs: Vec<_> = BINDINGS_BY_PLATFORM
			.entries()
			.map(|e| format!("{}-{}", e.platform, e.arch))
			.collect();
		assert_eq!(pairs.first().map(String::as_str), Some("android-arm"));
		assert_eq!(pairs.last().map(String::as_str), Some("win32-x64"));
		let linux: Vec<_> = pairs.iter().filter(|p| p.starts_with("linux-")).collect();
		assert_eq!(linux, ["linux-arm", "linux-arm64", "linux-riscv64", "linux-x64"]);
	}

	#[test]
	fn test_json_keeps_three_musl_states() {
		let json = serde_json::to_string(&BINDINGS_BY_PLATFORM).unwrap();
		assert!(json.starts_with(r#"{"android":{"arm":{"base":"android-arm-eabi"}"#));
		assert!(json.contains(r#""arm":{"base":"linux-arm-gnueabihf","musl":null}"#));
		assert!(json.contains(r#""x64":{"base":"linux-x64-gnu","musl":"linux-x64-musl"}"#));
		assert!(json.contains(r#""arm64":{"base":"darwin-arm64"}"#));
	}
}
