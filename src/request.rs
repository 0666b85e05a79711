pub(crate) mod body;
pub(crate) mod headers;

use crate::error::{BuildError, Error};
use crate::host::{Guard, Host, Method, Scheme};
use crate::Headers;
use std::fmt::{Debug, Formatter};
use std::io::Read;

/// A request body: a reader plus, if known, the number of bytes it will yield.
///
/// The body is read to the end before anything is sent, so its length need not be known in
/// advance. A known, positive length is advertised in a `Content-Length` header unless the caller
/// provided one.
pub struct Body {
	/// The source of the body bytes.
	reader: Box<dyn Read + Send>,

	/// The number of bytes `reader` will yield, if known.
	length: Option<u64>,
}

impl Body {
	/// Constructs a body from a reader whose length is not known in advance.
	pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
		Self {
			reader: Box::new(reader),
			length: None,
		}
	}

	/// Constructs a body from a reader which will yield exactly `length` bytes.
	pub fn sized(reader: impl Read + Send + 'static, length: u64) -> Self {
		Self {
			reader: Box::new(reader),
			length: Some(length),
		}
	}

	/// Returns the declared length, if known.
	pub fn length(&self) -> Option<u64> {
		self.length
	}

	/// Reads the whole body into memory.
	///
	/// # Errors
	/// This function returns an error if reading fails, or an error of kind
	/// [`InvalidData`](std::io::ErrorKind::InvalidData) if the reader yields a different number
	/// of bytes than the declared length.
	pub(crate) fn into_bytes(mut self) -> std::io::Result<Vec<u8>> {
		let mut buffer = Vec::with_capacity(self.length.map_or(0, |n| n.min(1 << 20) as usize));
		let _ = self.reader.read_to_end(&mut buffer)?;
		match self.length {
			Some(length) if length != buffer.len() as u64 => Err(std::io::Error::new(
				std::io::ErrorKind::InvalidData,
				format!(
					"body declared {length} bytes but yielded {}",
					buffer.len()
				),
			)),
			_ => Ok(buffer),
		}
	}
}

impl From<Vec<u8>> for Body {
	fn from(bytes: Vec<u8>) -> Self {
		let length = bytes.len() as u64;
		Self::sized(std::io::Cursor::new(bytes), length)
	}
}

impl From<&'static [u8]> for Body {
	fn from(bytes: &'static [u8]) -> Self {
		Self::sized(bytes, bytes.len() as u64)
	}
}

impl From<String> for Body {
	fn from(s: String) -> Self {
		s.into_bytes().into()
	}
}

impl From<&'static str> for Body {
	fn from(s: &'static str) -> Self {
		s.as_bytes().into()
	}
}

impl Debug for Body {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		f.debug_struct("Body")
			.field("length", &self.length)
			.finish_non_exhaustive()
	}
}

/// An HTTP request to send.
#[derive(Debug)]
pub struct Request {
	/// The method, e.g. `GET`. Strings outside the well-known set are sent verbatim.
	pub method: String,

	/// The target URL. Its scheme, authority, path, and query are sent to the host separately.
	pub uri: http::Uri,

	/// The request headers.
	pub headers: Headers,

	/// The authority to use instead of the one in [`uri`](Self::uri), if any.
	pub host: Option<String>,

	/// Whether to ask for the connection to be closed after this exchange.
	pub close: bool,

	/// The body, if any.
	pub body: Option<Body>,
}

impl Request {
	/// Constructs a request with no headers and no body.
	pub fn new(method: impl Into<String>, uri: http::Uri) -> Self {
		Self {
			method: method.into(),
			uri,
			headers: Headers::new(),
			host: None,
			close: false,
			body: None,
		}
	}

	/// Adds a header value.
	#[must_use]
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.append(name, value);
		self
	}

	/// Sets the body.
	#[must_use]
	pub fn body(mut self, body: impl Into<Body>) -> Self {
		self.body = Some(body.into());
		self
	}

	/// Returns the authority to send: the override if set, else the URI’s host and port.
	///
	/// Any userinfo in the URI is left out. IPv6 hosts keep their brackets.
	fn authority(&self) -> Option<String> {
		match self.host.as_deref() {
			Some(host) if !host.is_empty() => Some(host.to_owned()),
			_ => {
				let host = self.uri.host()?;
				Some(match self.uri.port() {
					Some(port) => format!("{host}:{}", port.as_str()),
					None => host.to_owned(),
				})
			}
		}
	}

	/// Returns the request target: the path, followed by `?` and the query if there is one.
	fn path_with_query(&self) -> String {
		let path = match self.uri.path() {
			"" => "/",
			path => path,
		};
		match self.uri.query() {
			Some(query) => format!("{path}?{query}"),
			None => path.to_owned(),
		}
	}
}

/// Creates the host request object for `request`.
///
/// The headers must already hold any defaults. On failure, every resource created so far has been
/// released and nothing has been sent.
///
/// # Errors
/// This function returns [`Error::Build`] if the host rejects the header fields or any of the
/// request line components.
pub(crate) fn build<H: Host>(
	host: &H,
	request: &Request,
) -> Result<Guard<H::OutgoingRequest>, Error> {
	let entries = headers::marshal(&request.headers);
	let fields = host
		.fields_from_list(&entries)
		.map_err(BuildError::Fields)?;
	let outgoing = Guard::new(host.new_outgoing_request(fields));

	let method = Method::from(request.method.as_str());
	host.set_method(&outgoing, &method)
		.map_err(|_| BuildError::Method)?;
	let scheme = request.uri.scheme_str().map(Scheme::from);
	host.set_scheme(&outgoing, scheme.as_ref())
		.map_err(|_| BuildError::Scheme)?;
	let authority = request.authority();
	host.set_authority(&outgoing, authority.as_deref())
		.map_err(|_| BuildError::Authority)?;
	host.set_path_with_query(&outgoing, Some(&request.path_with_query()))
		.map_err(|_| BuildError::PathWithQuery)?;

	log::trace!(
		"built {} request for {:?} {}",
		method,
		authority,
		request.path_with_query()
	);
	Ok(outgoing)
}
