//! Native Rollup binding resolution and loading
//!
//! Rollup's parser and hasher ship as one prebuilt artifact per
//! platform/architecture/libc combination. This crate picks the artifact that
//! fits the running host, loads it, and exposes its functions.
//!
//! # Architecture
//!
//! * [`table`]: static compatibility table of published artifacts
//! * [`host`]: platform/architecture naming and the musl probe
//! * [`matcher`]: identifier resolution, libc probe injected
//! * [`loader`]: local artifact or installed `@rollup/rollup-<id>` package
//! * [`report`]: message listing supported combinations
//! * [`abi`]: C ABI of the artifacts and the [`Bindings`] wrapper
//! * [`facade`]: one-shot initialization and the process-wide binding
//!
//! ```no_run
//! let hash = rollup_native::xxhash_base64_url(b"export default 42;")?;
//! # Ok::<(), rollup_native::CallError>(())
//! ```

pub mod abi;
pub mod error;
pub mod facade;
pub mod host;
pub mod loader;
pub mod matcher;
pub mod report;
pub mod table;

pub use abi::{Bindings, InvalidHash, NATIVE_ABI_VERSION, ParseAbandoned, ParseTask};
pub use error::{CallError, Error, Result};
pub use facade::{bindings, initialize, initialize_with, parse, parse_async, xxhash_base64_url};
pub use host::{HostTarget, detect_musl};
pub use loader::{LoadCause, LoadError, LoadTarget, Loader, LoaderConfig};
pub use matcher::{NoMatch, resolve};
pub use report::{supported_combinations, unsupported_message};
pub use table::{BINDINGS_BY_PLATFORM, BindingDescriptor, CompatibilityTable, MuslVariant};
