#![allow(unused_crate_dependencies)]

use std::error::Error as _;
use std::fs;

use rollup_native::{Error, HostTarget, LoadCause, LoadTarget, Loader, LoaderConfig, initialize_with};
use tempfile::TempDir;

#[test]
fn test_local_artifact_beats_package() {
	let temp = TempDir::new().unwrap();
	let local = temp.path().join("rollup.win32-x64-msvc.node");
	fs::write(&local, b"").unwrap();
	fs::create_dir_all(temp.path().join("node_modules/@rollup/rollup-win32-x64-msvc")).unwrap();

	let loader = Loader::new(LoaderConfig::new(temp.path()));
	assert_eq!(loader.locate("win32-x64-msvc"), LoadTarget::Local(local));
}

#[test]
fn test_package_found_above_module_dir() {
	let temp = TempDir::new().unwrap();
	let module_dir = temp.path().join("node_modules/rollup/dist/native");
	fs::create_dir_all(&module_dir).unwrap();
	let package_dir = temp.path().join("node_modules/@rollup/rollup-linux-x64-gnu");
	fs::create_dir_all(&package_dir).unwrap();
	fs::write(package_dir.join("rollup.linux-x64-gnu.node"), b"garbage").unwrap();

	let err = Loader::new(LoaderConfig::new(&module_dir))
		.load("linux-x64-gnu")
		.unwrap_err();

	// The package was found, so the failure comes from the dynamic loader.
	assert_eq!(err.specifier, "@rollup/rollup-linux-x64-gnu");
	assert!(matches!(err.cause, LoadCause::Library(_)));
}

#[test]
fn test_load_failure_is_diagnosable() {
	let temp = TempDir::new().unwrap();
	let host = HostTarget::new("win32", "ia32");
	let err = initialize_with(&host, LoaderConfig::new(temp.path()), || false).unwrap_err();

	let Error::ArtifactLoad(load) = &err else {
		panic!("expected a load failure, got {err:?}");
	};
	assert_eq!(load.identifier, "win32-ia32-msvc");

	let message = err.to_string();
	assert!(message.contains("win32-ia32-msvc"));
	assert!(message.contains("Please try `npm i` again"));
	assert!(err.source().is_some());
}

// The C library is a real shared object that exports none of the binding's
// symbols, so loading it gets past the dynamic loader and stops at the first
// export lookup.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_shared_object_without_exports() {
	const LIBC_CANDIDATES: &[&str] = &[
		"/lib/x86_64-linux-gnu/libc.so.6",
		"/lib/aarch64-linux-gnu/libc.so.6",
		"/lib64/libc.so.6",
		"/usr/lib64/libc.so.6",
		"/usr/lib/libc.so.6",
		"/lib/libc.so.6",
	];
	let Some(libc) = LIBC_CANDIDATES
		.iter()
		.map(std::path::Path::new)
		.find(|path| path.exists())
	else {
		eprintln!("no libc.so.6 found, skipping");
		return;
	};

	let temp = TempDir::new().unwrap();
	let local = temp.path().join("rollup.linux-x64-gnu.node");
	std::os::unix::fs::symlink(libc, &local).unwrap();

	let err = Loader::new(LoaderConfig::new(temp.path()))
		.load("linux-x64-gnu")
		.unwrap_err();

	assert_eq!(err.specifier, "./rollup.linux-x64-gnu.node");
	assert!(matches!(
		err.cause,
		LoadCause::MissingSymbol {
			symbol: "rollup_native_abi_version",
			..
		}
	));
	assert!(err.cause.source().is_some());
	assert!(err.cause.to_string().contains("rollup_native_abi_version"));
}
