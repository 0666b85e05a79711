pub(crate) mod body;
pub(crate) mod headers;

use crate::error::{Error, ProtocolViolation};
use crate::host::{Guard, Host};
use crate::{Headers, ResponseBody};

/// An HTTP response whose body has been received in full.
#[derive(Debug)]
pub struct Response {
	/// The status code.
	pub status: u16,

	/// The response headers, in the order the host reported them.
	pub headers: Headers,

	/// The response body.
	pub body: ResponseBody,
}

/// Reads the status, headers, and entire body of a response.
///
/// The `response` parameter is the host response, which is released before returning. The
/// `chunk_size` parameter is the most bytes requested by any single read.
///
/// Resources are released child-first: the body stream before the body, the body before the
/// response.
///
/// # Errors
/// This function returns an error if the body or its stream cannot be obtained, or if reading
/// the body fails for any reason other than reaching its end. In that case the already-read status
/// and headers are discarded.
pub(crate) fn receive<H: Host>(
	host: &H,
	response: Guard<H::IncomingResponse>,
	chunk_size: u64,
) -> Result<Response, Error> {
	let status = host.status(&response);
	let headers = {
		let fields = Guard::new(host.response_headers(&response));
		headers::reconstruct(host.fields_entries(&fields))
	};
	log::trace!("response status {status} with {} header names", headers.len());

	let body = Guard::new(
		host.consume(&response)
			.map_err(|_| ProtocolViolation::BodyUnavailable)?,
	);
	let stream = Guard::new(
		host.body_stream(&body)
			.map_err(|_| ProtocolViolation::StreamUnavailable)?,
	);
	let data = body::drain(host, &stream, chunk_size)?;

	drop(stream);
	drop(body);
	drop(response);
	Ok(Response {
		status,
		headers,
		body: ResponseBody::new(data),
	})
}
