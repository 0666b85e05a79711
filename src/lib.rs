#![forbid(unsafe_code)]
#![warn(
	future_incompatible,
	nonstandard_style,
	rust_2018_idioms,
	rustdoc,
	unused
)]
#![warn(
	deprecated_in_future,
	missing_debug_implementations,
	missing_docs,
	// Disabled due to <https://github.com/rust-lang/rust/issues/69952> and
	// <https://github.com/rust-lang/rust/issues/77217>.
	// single_use_lifetimes,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_import_braces,
	// Disabled due to <https://github.com/rust-lang/rust/issues/77217>.
	// unused_lifetimes,
	unused_qualifications,
	unused_results
)]
#![warn(clippy::pedantic, clippy::cargo)]
// Disabled because we frequently mix u64 and usize, where the former is used for stream read
// lengths and the latter for in-memory buffer sizes.
#![allow(clippy::cast_possible_truncation)]

//! Blocking HTTP Round Trips over Resource-Based Hosts
//!
//! This crate sends one HTTP request and receives the complete response through a host which
//! exposes HTTP as explicitly owned resources and readiness pollables, in the manner of
//! `wasi:http`. It does no networking of its own, spawns no threads, and needs no asynchronous
//! executor: the calling thread blocks on the host’s pollables.
//!
//! The host is anything implementing [`host::Host`]. Two are provided: [`memory::MemoryHost`],
//! which answers from scripted replies and checks that every resource is released in order, and,
//! with the `wasi` feature, `wasi::WasiHost`, which uses the imports of a WASI component.
//!
//! # Example
//! ```
//! use wasi_transport::memory::{MemoryHost, Reply};
//! use wasi_transport::{Request, Transport};
//!
//! let host = MemoryHost::new();
//! host.push(
//! 	Reply::new(200)
//! 		.header("Content-Type", "text/plain")
//! 		.chunk("hello"),
//! );
//! let transport = Transport::new(host);
//!
//! let request = Request::new("GET", "http://example/test".parse().unwrap())
//! 	.header("X-Test", "1");
//! let response = transport.round_trip(request).unwrap();
//! assert_eq!(response.status, 200);
//! assert_eq!(response.headers.get("content-type"), Some("text/plain"));
//! assert_eq!(response.body.as_bytes(), b"hello");
//!
//! let sent = &transport.host().requests()[0];
//! assert_eq!(sent.path_with_query.as_deref(), Some("/test"));
//! assert!(transport.host().live().is_empty());
//! ```

#[cfg(feature = "detailed-errors")]
pub mod error;
#[cfg(not(feature = "detailed-errors"))]
mod error;
mod headers;
pub mod host;
pub mod memory;
mod request;
mod response;
mod transport;
mod util;
#[cfg(feature = "wasi")]
pub mod wasi;

pub use error::{BuildError, Error, ProtocolViolation};
pub use headers::Headers;
pub use httparse::Header;
pub use request::{Body, Request};
pub use response::body::{ResponseBody, DEFAULT_READ_CHUNK_SIZE};
pub use response::Response;
pub use transport::{Transport, DEFAULT_USER_AGENT};

