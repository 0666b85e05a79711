//! Errors reported by a round trip.
//!
//! A round trip fails in one of a handful of ways: the request could not be built, the host
//! refused to submit it, the connection-level operation failed, the HTTP exchange itself failed,
//! the host broke its own protocol, or the response body could not be read. Every failure is
//! reported as an [`Error`] whose variant identifies which of these happened; none are retried.
//!
//! [`Error`] converts into [`std::io::Error`] for callers that work in terms of I/O errors. If the
//! `detailed-errors` feature is enabled, the [`Error`] becomes the inner error of the
//! [`std::io::Error`]; otherwise only the [`ErrorKind`](std::io::ErrorKind) survives.

use crate::host::{Rejected, StreamError};
use std::fmt::{Display, Formatter};

/// The ways in which building a request can fail.
#[derive(Debug)]
pub enum BuildError {
	/// The request URI could not be parsed.
	Uri(http::uri::InvalidUri),

	/// The host rejected the header field list.
	Fields(String),

	/// The host rejected the method.
	Method,

	/// The host rejected the scheme.
	Scheme,

	/// The host rejected the authority.
	Authority,

	/// The host rejected the path and query.
	PathWithQuery,

	/// The host would not provide the request body or its write sink.
	Body(Rejected),
}

impl Display for BuildError {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		match self {
			Self::Uri(inner) => write!(f, "Invalid request URI: {inner}"),
			Self::Fields(detail) => write!(f, "Header fields rejected: {detail}"),
			Self::Method => write!(f, "Request method rejected"),
			Self::Scheme => write!(f, "Request scheme rejected"),
			Self::Authority => write!(f, "Request authority rejected"),
			Self::PathWithQuery => write!(f, "Request path and query rejected"),
			Self::Body(_) => write!(f, "Request body unavailable"),
		}
	}
}

impl std::error::Error for BuildError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Uri(inner) => Some(inner),
			Self::Body(inner) => Some(inner),
			Self::Fields(_)
			| Self::Method
			| Self::Scheme
			| Self::Authority
			| Self::PathWithQuery => None,
		}
	}
}

impl From<http::uri::InvalidUri> for BuildError {
	fn from(inner: http::uri::InvalidUri) -> Self {
		Self::Uri(inner)
	}
}

/// The ways in which a host can break the exchange protocol.
#[derive(Debug, Eq, PartialEq)]
pub enum ProtocolViolation {
	/// The future produced a result before it was waited on.
	ResultBeforeReady,

	/// The future produced no result after its pollable reported readiness.
	NoResultAfterReady,

	/// The response body had already been taken.
	BodyUnavailable,

	/// The response body stream had already been taken.
	StreamUnavailable,
}

impl Display for ProtocolViolation {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		match self {
			Self::ResultBeforeReady => write!(f, "Response result available before readiness"),
			Self::NoResultAfterReady => write!(f, "No response result after readiness"),
			Self::BodyUnavailable => write!(f, "Response body already taken"),
			Self::StreamUnavailable => write!(f, "Response body stream already taken"),
		}
	}
}

impl std::error::Error for ProtocolViolation {}

/// A failed round trip.
#[derive(Debug)]
pub enum Error {
	/// The request could not be built; nothing was sent.
	Build(BuildError),

	/// Reading the caller’s request body failed; nothing was sent.
	Body(std::io::Error),

	/// Writing the request body to the host failed.
	Write(StreamError),

	/// The host could not complete the request body.
	Finish(String),

	/// The host rejected the request outright.
	Submit(String),

	/// The handler failed to produce an HTTP exchange, e.g. because the connection failed.
	Handler(String),

	/// The HTTP exchange failed, e.g. because the response was malformed.
	Http(String),

	/// The host broke the exchange protocol.
	ProtocolViolation(ProtocolViolation),

	/// Reading the response body failed; the status and headers are discarded.
	Read(String),
}

impl Error {
	/// Returns the [`ErrorKind`](std::io::ErrorKind) used when converting into
	/// [`std::io::Error`].
	pub fn kind(&self) -> std::io::ErrorKind {
		use std::io::ErrorKind;
		match self {
			Self::Build(_) => ErrorKind::InvalidInput,
			Self::Body(inner) => inner.kind(),
			Self::Write(_) | Self::Finish(_) => ErrorKind::BrokenPipe,
			Self::Submit(_) | Self::Handler(_) => ErrorKind::ConnectionAborted,
			Self::Http(_) => ErrorKind::InvalidData,
			Self::ProtocolViolation(_) | Self::Read(_) => ErrorKind::Other,
		}
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		match self {
			Self::Build(inner) => write!(f, "Failed to build request: {inner}"),
			Self::Body(inner) => write!(f, "Failed to read request body: {inner}"),
			Self::Write(inner) => write!(f, "Failed to send request body: {inner}"),
			Self::Finish(detail) => write!(f, "Failed to finish request body: {detail}"),
			Self::Submit(detail) => write!(f, "Request rejected by host: {detail}"),
			Self::Handler(detail) => write!(f, "Request handler failed: {detail}"),
			Self::Http(detail) => write!(f, "HTTP exchange failed: {detail}"),
			Self::ProtocolViolation(inner) => write!(f, "Host protocol violation: {inner}"),
			Self::Read(detail) => write!(f, "Failed to read response body: {detail}"),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Build(inner) => Some(inner),
			Self::Body(inner) => Some(inner),
			Self::Write(inner) => Some(inner),
			Self::ProtocolViolation(inner) => Some(inner),
			Self::Finish(_) | Self::Submit(_) | Self::Handler(_) | Self::Http(_) | Self::Read(_) => {
				None
			}
		}
	}
}

impl From<BuildError> for Error {
	fn from(inner: BuildError) -> Self {
		Self::Build(inner)
	}
}

impl From<ProtocolViolation> for Error {
	fn from(inner: ProtocolViolation) -> Self {
		Self::ProtocolViolation(inner)
	}
}

impl From<Error> for std::io::Error {
	#[cfg(feature = "detailed-errors")]
	fn from(inner: Error) -> Self {
		match inner {
			Error::Body(inner) => inner,
			inner => Self::new(inner.kind(), inner),
		}
	}

	#[cfg(not(feature = "detailed-errors"))]
	fn from(inner: Error) -> Self {
		match inner {
			Error::Body(inner) => inner,
			inner => inner.kind().into(),
		}
	}
}
