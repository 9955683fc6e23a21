//! C ABI exported by native binding artifacts, and the safe wrappers around it.
//!
//! An artifact exports five symbols with the C calling convention:
//!
//! * `rollup_native_abi_version() -> u32`
//! * `rollup_parse(code, code_len, allow_return_outside_function, jsx) -> NativeBuffer`
//! * `rollup_parse_async(code, code_len, allow_return_outside_function, jsx, callback, user_data)`
//! * `rollup_xxhash_base64_url(input, input_len) -> NativeBuffer`
//! * `rollup_buffer_free(NativeBuffer)`
//!
//! Buffers returned by the artifact are owned by it and handed back through
//! `rollup_buffer_free` once copied. Input pointers are only borrowed for the
//! duration of the call, so `rollup_parse_async` must copy `code` before it
//! returns.

use std::ffi::c_void;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::string::FromUtf8Error;
use std::task::{Context, Poll};

use libloading::Library;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::loader::LoadCause;

/// ABI revision this crate speaks.
pub const NATIVE_ABI_VERSION: u32 = 1;

/// Byte buffer allocated by the native artifact.
#[repr(C)]
#[derive(Debug)]
pub struct NativeBuffer {
	pub ptr: *mut u8,
	pub len: usize,
	pub cap: usize,
}

pub type AbiVersionFn = unsafe extern "C" fn() -> u32;
pub type ParseFn = unsafe extern "C" fn(
	code: *const u8,
	code_len: usize,
	allow_return_outside_function: bool,
	jsx: bool,
) -> NativeBuffer;
pub type ParseCallback = unsafe extern "C" fn(user_data: *mut c_void, result: NativeBuffer);
pub type ParseAsyncFn = unsafe extern "C" fn(
	code: *const u8,
	code_len: usize,
	allow_return_outside_function: bool,
	jsx: bool,
	callback: ParseCallback,
	user_data: *mut c_void,
);
pub type XxhashBase64UrlFn = unsafe extern "C" fn(input: *const u8, input_len: usize) -> NativeBuffer;
pub type BufferFreeFn = unsafe extern "C" fn(buffer: NativeBuffer);

pub(crate) mod symbols {
	pub const ABI_VERSION: &str = "rollup_native_abi_version";
	pub const PARSE: &str = "rollup_parse";
	pub const PARSE_ASYNC: &str = "rollup_parse_async";
	pub const XXHASH_BASE64_URL: &str = "rollup_xxhash_base64_url";
	pub const BUFFER_FREE: &str = "rollup_buffer_free";
}

/// The functions of a loaded native artifact.
///
/// The library stays mapped for as long as this value lives; the process-wide
/// instance in [`crate::facade`] is never dropped.
pub struct Bindings {
	parse: ParseFn,
	parse_async: ParseAsyncFn,
	xxhash_base64_url: XxhashBase64UrlFn,
	buffer_free: BufferFreeFn,
	identifier: String,
	path: PathBuf,
	_library: Library,
}

impl std::fmt::Debug for Bindings {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Bindings")
			.field("identifier", &self.identifier)
			.field("path", &self.path)
			.finish_non_exhaustive()
	}
}

impl Bindings {
	/// Opens the artifact at `path` and resolves its exports.
	///
	/// # Safety
	///
	/// Loading a library runs its initializers. `path` must point to an
	/// artifact built for this ABI, whose exports match the signatures above.
	pub(crate) unsafe fn open(path: &Path, identifier: &str) -> Result<Self, LoadCause> {
		// SAFETY: upheld by the caller.
		let library = unsafe { Library::new(path) }?;

		// SAFETY: symbol types match the documented ABI.
		let abi_version: AbiVersionFn = unsafe { symbol(&library, symbols::ABI_VERSION) }?;
		check_abi_version(unsafe { abi_version() })?;

		unsafe {
			Ok(Self {
				parse: symbol(&library, symbols::PARSE)?,
				parse_async: symbol(&library, symbols::PARSE_ASYNC)?,
				xxhash_base64_url: symbol(&library, symbols::XXHASH_BASE64_URL)?,
				buffer_free: symbol(&library, symbols::BUFFER_FREE)?,
				identifier: identifier.to_string(),
				path: path.to_path_buf(),
				_library: library,
			})
		}
	}

	/// Identifier of the loaded artifact, e.g. `linux-x64-gnu`.
	pub fn identifier(&self) -> &str {
		&self.identifier
	}

	/// Filesystem path the artifact was loaded from.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Parses `code` and returns the serialized AST buffer.
	pub fn parse(&self, code: &str, allow_return_outside_function: bool, jsx: bool) -> Vec<u8> {
		unsafe {
			let buffer = (self.parse)(code.as_ptr(), code.len(), allow_return_outside_function, jsx);
			take_buffer(buffer, self.buffer_free)
		}
	}

	/// Parses `code` off the calling thread.
	///
	/// The returned task resolves once the artifact reports completion; no
	/// particular async runtime is required to await it.
	pub fn parse_async(&self, code: &str, allow_return_outside_function: bool, jsx: bool) -> ParseTask {
		let (sender, receiver) = oneshot::channel();
		let pending = Box::into_raw(Box::new(PendingParse {
			sender,
			buffer_free: self.buffer_free,
		}));

		unsafe {
			(self.parse_async)(
				code.as_ptr(),
				code.len(),
				allow_return_outside_function,
				jsx,
				complete_parse,
				pending.cast(),
			);
		}

		ParseTask { receiver }
	}

	/// Hashes `input` with xxhash and encodes the digest as base64url.
	///
	/// The artifact's output is returned as is; bytes that are not UTF-8 are
	/// reported through [`InvalidHash`] rather than rewritten.
	pub fn xxhash_base64_url(&self, input: &[u8]) -> Result<String, InvalidHash> {
		let bytes = unsafe {
			let buffer = (self.xxhash_base64_url)(input.as_ptr(), input.len());
			take_buffer(buffer, self.buffer_free)
		};
		decode_hash(bytes)
	}
}

/// Rejects artifacts built for another ABI revision.
pub(crate) fn check_abi_version(actual: u32) -> Result<(), LoadCause> {
	if actual == NATIVE_ABI_VERSION {
		Ok(())
	} else {
		Err(LoadCause::AbiMismatch {
			expected: NATIVE_ABI_VERSION,
			actual,
		})
	}
}

/// The artifact returned a hash that is not valid UTF-8.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("native xxhash output is not valid UTF-8")]
pub struct InvalidHash(#[source] FromUtf8Error);

impl InvalidHash {
	/// The bytes the artifact returned, untouched.
	pub fn into_bytes(self) -> Vec<u8> {
		self.0.into_bytes()
	}
}

fn decode_hash(bytes: Vec<u8>) -> Result<String, InvalidHash> {
	String::from_utf8(bytes).map_err(InvalidHash)
}

/// The artifact dropped an async parse without reporting a result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("native parse was abandoned before completing")]
pub struct ParseAbandoned;

/// Pending result of [`Bindings::parse_async`].
#[derive(Debug)]
pub struct ParseTask {
	receiver: oneshot::Receiver<Vec<u8>>,
}

impl Future for ParseTask {
	type Output = Result<Vec<u8>, ParseAbandoned>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.receiver)
			.poll(cx)
			.map(|result| result.map_err(|_| ParseAbandoned))
	}
}

struct PendingParse {
	sender: oneshot::Sender<Vec<u8>>,
	buffer_free: BufferFreeFn,
}

/// Completion callback handed to `rollup_parse_async`; may run on any thread.
unsafe extern "C" fn complete_parse(user_data: *mut c_void, result: NativeBuffer) {
	// SAFETY: `user_data` is the `PendingParse` leaked in `parse_async`, and
	// the artifact calls this exactly once.
	let pending = unsafe { Box::from_raw(user_data.cast::<PendingParse>()) };
	let bytes = unsafe { take_buffer(result, pending.buffer_free) };
	// Receiver dropped means nobody awaits the result.
	let _ = pending.sender.send(bytes);
}

/// Copies a native buffer into a `Vec` and releases it.
///
/// # Safety
///
/// `buffer` must come from the artifact that exported `free`, and must not be
/// used afterwards.
unsafe fn take_buffer(buffer: NativeBuffer, free: BufferFreeFn) -> Vec<u8> {
	let bytes = if buffer.ptr.is_null() || buffer.len == 0 {
		Vec::new()
	} else {
		unsafe { std::slice::from_raw_parts(buffer.ptr, buffer.len) }.to_vec()
	};
	unsafe { free(buffer) };
	bytes
}

/// Resolves an exported function pointer.
///
/// # Safety
///
/// `T` must be the function pointer type of the exported symbol.
unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, LoadCause> {
	unsafe { library.get::<T>(name.as_bytes()) }
		.map(|symbol| *symbol)
		.map_err(|source| LoadCause::MissingSymbol { symbol: name, source })
}
