//! The capability interface of the HTTP host.
//!
//! A host exposes every piece of HTTP state as an explicitly owned resource: field lists,
//! requests, bodies, streams, futures, and pollables. Nothing is reclaimed automatically; each
//! resource handed to the caller must be released exactly once, either by passing it back to the
//! host (which takes ownership) or by calling [`Resource::release`]. The adapter wraps every
//! resource it holds in a [`Guard`] so that release happens on every exit path.

use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// A host-owned object that must be released exactly once.
///
/// Releasing consumes the handle, so a double release cannot be expressed.
pub trait Resource {
	/// Returns the resource to the host.
	fn release(self);
}

/// A scoped owner of a resource which releases it when dropped.
///
/// Guards are dropped in reverse declaration order, so declaring a child resource’s guard after
/// its parent’s releases the child first.
pub struct Guard<R: Resource> {
	/// The resource, present until the guard is consumed or dropped.
	resource: Option<R>,
}

impl<R: Resource> Guard<R> {
	/// Takes ownership of a freshly acquired resource.
	pub fn new(resource: R) -> Self {
		Self {
			resource: Some(resource),
		}
	}

	/// Gives up ownership without releasing.
	///
	/// This is used when the resource is about to be passed to a host operation which takes
	/// ownership of it.
	pub fn into_inner(mut self) -> R {
		self.resource
			.take()
			.expect("guarded resource present until consumed")
	}
}

impl<R: Resource> Deref for Guard<R> {
	type Target = R;

	fn deref(&self) -> &R {
		self.resource
			.as_ref()
			.expect("guarded resource present until consumed")
	}
}

impl<R: Resource> Drop for Guard<R> {
	fn drop(&mut self) {
		if let Some(resource) = self.resource.take() {
			resource.release();
		}
	}
}

impl<R: Resource> Debug for Guard<R> {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		f.debug_struct("Guard")
			.field("resource", &std::any::type_name::<R>())
			.field("held", &self.resource.is_some())
			.finish()
	}
}

/// An HTTP request method as the host understands it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Method {
	/// `GET`
	Get,
	/// `PUT`
	Put,
	/// `POST`
	Post,
	/// `DELETE`
	Delete,
	/// `OPTIONS`
	Options,
	/// `PATCH`
	Patch,
	/// `CONNECT`
	Connect,
	/// `TRACE`
	Trace,
	/// Any other method, carried verbatim.
	Other(String),
}

impl Method {
	/// Returns the method as it appears on the wire.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Get => "GET",
			Self::Put => "PUT",
			Self::Post => "POST",
			Self::Delete => "DELETE",
			Self::Options => "OPTIONS",
			Self::Patch => "PATCH",
			Self::Connect => "CONNECT",
			Self::Trace => "TRACE",
			Self::Other(other) => other,
		}
	}
}

impl From<&str> for Method {
	/// Maps a method string onto the enumerated verbs.
	///
	/// Matching is case-sensitive; anything unrecognized, including `get`, becomes
	/// [`Other`](Self::Other).
	fn from(method: &str) -> Self {
		match method {
			"GET" => Self::Get,
			"PUT" => Self::Put,
			"POST" => Self::Post,
			"DELETE" => Self::Delete,
			"OPTIONS" => Self::Options,
			"PATCH" => Self::Patch,
			"CONNECT" => Self::Connect,
			"TRACE" => Self::Trace,
			other => Self::Other(other.to_owned()),
		}
	}
}

impl Display for Method {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		f.write_str(self.as_str())
	}
}

/// A URL scheme as the host understands it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Scheme {
	/// `http`
	Http,
	/// `https`
	Https,
	/// Any other scheme, carried verbatim.
	Other(String),
}

impl Scheme {
	/// Returns the scheme as written in a URL.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Http => "http",
			Self::Https => "https",
			Self::Other(other) => other,
		}
	}
}

impl From<&str> for Scheme {
	fn from(scheme: &str) -> Self {
		match scheme {
			"http" => Self::Http,
			"https" => Self::Https,
			other => Self::Other(other.to_owned()),
		}
	}
}

impl Display for Scheme {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		f.write_str(self.as_str())
	}
}

/// The host refused an operation without giving further detail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rejected;

impl Display for Rejected {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		write!(f, "Rejected by host")
	}
}

impl std::error::Error for Rejected {}

/// The outcome of a stream operation that did not succeed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamError {
	/// The stream has ended. When reading, this is the normal end of the data.
	Closed,

	/// The last operation failed.
	Failed(String),
}

impl Display for StreamError {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		match self {
			Self::Closed => write!(f, "Stream closed"),
			Self::Failed(detail) => write!(f, "Stream operation failed: {detail}"),
		}
	}
}

impl std::error::Error for StreamError {}

/// The state of an exchange future as reported by a single probe.
#[derive(Debug)]
pub enum FutureResult<Response> {
	/// No result yet.
	Pending,

	/// The handler could not produce an HTTP exchange at all, e.g. because the connection
	/// failed.
	HandlerFailed(String),

	/// The exchange completed, either with a response or with an HTTP-level error.
	Completed(Result<Response, String>),
}

/// A resource-based HTTP host.
///
/// Each associated type is a resource kind; each method is one host operation. Methods which take
/// a resource by value take ownership of it, after which the caller must not release it.
/// Methods which return a resource hand ownership to the caller.
pub trait Host {
	/// An ordered list of header fields.
	type Fields: Resource;

	/// A request which has not yet been submitted.
	type OutgoingRequest: Resource;

	/// The body of an outgoing request.
	type OutgoingBody: Resource;

	/// A write sink for an outgoing body.
	type OutputStream: Resource;

	/// The eventual result of a submitted request.
	type FutureResponse: Resource;

	/// Readiness of one other resource.
	type Pollable: Resource;

	/// A response received from the server.
	type IncomingResponse: Resource;

	/// The body of an incoming response.
	type IncomingBody: Resource;

	/// A readable stream over an incoming body.
	type InputStream: Resource;

	/// Builds a field list from name/value pairs.
	///
	/// # Errors
	/// Fails with a description if any name or value is unacceptable.
	fn fields_from_list(&self, entries: &[crate::Header<'_>]) -> Result<Self::Fields, String>;

	/// Returns the entries of a field list in order.
	fn fields_entries(&self, fields: &Self::Fields) -> Vec<(String, Vec<u8>)>;

	/// Creates a request carrying `headers`, which the request takes ownership of.
	fn new_outgoing_request(&self, headers: Self::Fields) -> Self::OutgoingRequest;

	/// Sets the request method.
	///
	/// # Errors
	/// Fails if the host does not accept the method.
	fn set_method(&self, request: &Self::OutgoingRequest, method: &Method) -> Result<(), Rejected>;

	/// Sets the request scheme, or clears it to use the host’s default.
	///
	/// # Errors
	/// Fails if the host does not accept the scheme.
	fn set_scheme(
		&self,
		request: &Self::OutgoingRequest,
		scheme: Option<&Scheme>,
	) -> Result<(), Rejected>;

	/// Sets the request authority.
	///
	/// # Errors
	/// Fails if the authority is syntactically unacceptable.
	fn set_authority(
		&self,
		request: &Self::OutgoingRequest,
		authority: Option<&str>,
	) -> Result<(), Rejected>;

	/// Sets the request path and query.
	///
	/// # Errors
	/// Fails if the path and query is syntactically unacceptable.
	fn set_path_with_query(
		&self,
		request: &Self::OutgoingRequest,
		path_with_query: Option<&str>,
	) -> Result<(), Rejected>;

	/// Obtains the request’s body. This succeeds at most once per request.
	///
	/// # Errors
	/// Fails if the body has already been obtained.
	fn outgoing_body(&self, request: &Self::OutgoingRequest)
		-> Result<Self::OutgoingBody, Rejected>;

	/// Obtains the write sink of a body. This succeeds at most once per body.
	///
	/// # Errors
	/// Fails if the sink has already been obtained.
	fn body_write(&self, body: &Self::OutgoingBody) -> Result<Self::OutputStream, Rejected>;

	/// Writes `contents` and blocks until it is flushed.
	///
	/// # Errors
	/// Fails if the stream is closed or the write fails.
	fn blocking_write_and_flush(
		&self,
		stream: &Self::OutputStream,
		contents: &[u8],
	) -> Result<(), StreamError>;

	/// Declares a body complete, optionally with trailers. Takes ownership of both.
	///
	/// # Errors
	/// Fails with a description if the body could not be completed.
	fn finish_body(
		&self,
		body: Self::OutgoingBody,
		trailers: Option<Self::Fields>,
	) -> Result<(), String>;

	/// Submits a request, taking ownership of it.
	///
	/// # Errors
	/// Fails with a description if the host rejects the request outright.
	fn handle(&self, request: Self::OutgoingRequest) -> Result<Self::FutureResponse, String>;

	/// Probes a future for its result.
	fn future_get(&self, future: &Self::FutureResponse) -> FutureResult<Self::IncomingResponse>;

	/// Obtains a pollable for the readiness of a future.
	fn future_subscribe(&self, future: &Self::FutureResponse) -> Self::Pollable;

	/// Suspends the calling thread until the pollable is ready.
	fn block(&self, pollable: &Self::Pollable);

	/// Returns the status code of a response.
	fn status(&self, response: &Self::IncomingResponse) -> u16;

	/// Returns the headers of a response as a new field list.
	fn response_headers(&self, response: &Self::IncomingResponse) -> Self::Fields;

	/// Takes the body out of a response. This succeeds at most once per response.
	///
	/// # Errors
	/// Fails if the body has already been taken.
	fn consume(&self, response: &Self::IncomingResponse) -> Result<Self::IncomingBody, Rejected>;

	/// Obtains the readable stream of a body. This succeeds at most once per body.
	///
	/// # Errors
	/// Fails if the stream has already been obtained.
	fn body_stream(&self, body: &Self::IncomingBody) -> Result<Self::InputStream, Rejected>;

	/// Obtains a pollable for the readability of a stream.
	fn stream_subscribe(&self, stream: &Self::InputStream) -> Self::Pollable;

	/// Reads up to `len` bytes without blocking.
	///
	/// # Errors
	/// Returns [`StreamError::Closed`] at the end of the data, or [`StreamError::Failed`] if the
	/// stream broke.
	fn read(&self, stream: &Self::InputStream, len: u64) -> Result<Vec<u8>, StreamError>;
}

#[cfg(test)]
mod test {
	use super::*;
	use std::cell::Cell;
	use std::rc::Rc;

	/// A resource which counts its releases.
	struct Counted(Rc<Cell<u32>>);

	impl Resource for Counted {
		fn release(self) {
			self.0.set(self.0.get() + 1);
		}
	}

	/// Tests that dropping a guard releases its resource once.
	#[test]
	fn test_guard_drop_releases() {
		let count = Rc::new(Cell::new(0));
		{
			let _guard = Guard::new(Counted(count.clone()));
		}
		assert_eq!(count.get(), 1);
	}

	/// Tests that a guard given up with `into_inner` does not release.
	#[test]
	fn test_guard_into_inner() {
		let count = Rc::new(Cell::new(0));
		let guard = Guard::new(Counted(count.clone()));
		let inner = guard.into_inner();
		assert_eq!(count.get(), 0);
		inner.release();
		assert_eq!(count.get(), 1);
	}

	/// Tests that every supported method string round-trips through the enumeration.
	#[test]
	fn test_method_bijective() {
		for name in [
			"GET", "PUT", "POST", "DELETE", "OPTIONS", "PATCH", "CONNECT", "TRACE",
		] {
			let method = Method::from(name);
			assert!(!matches!(method, Method::Other(_)), "{name} unrecognized");
			assert_eq!(method.as_str(), name);
		}
	}

	/// Tests that unknown methods are carried verbatim and never coerced.
	#[test]
	fn test_method_other() {
		assert_eq!(Method::from("get"), Method::Other("get".to_owned()));
		assert_eq!(Method::from("HEAD"), Method::Other("HEAD".to_owned()));
		assert_eq!(Method::from("PROPFIND").as_str(), "PROPFIND");
		assert_eq!(Method::from(""), Method::Other(String::new()));
	}

	/// Tests scheme mapping.
	#[test]
	fn test_scheme() {
		assert_eq!(Scheme::from("http"), Scheme::Http);
		assert_eq!(Scheme::from("https"), Scheme::Https);
		assert_eq!(Scheme::from("HTTP"), Scheme::Other("HTTP".to_owned()));
		assert_eq!(Scheme::from("ftp").to_string(), "ftp");
	}
}
