//! A [`Host`] backed by the `wasi:http` imports of a WebAssembly component.
//!
//! This module is only available with the `wasi` feature, and only does anything useful when the
//! crate is compiled for a WASI target whose runtime provides `wasi:http/outgoing-handler`.

use crate::host::{FutureResult, Host, Method, Rejected, Resource, Scheme, StreamError};
use crate::Header;
use ::wasi::http::{outgoing_handler, types};
use ::wasi::io::{poll, streams};

macro_rules! release_by_drop {
	($($ty:ty),* $(,)?) => {
		$(
			impl Resource for $ty {
				fn release(self) {
					drop(self);
				}
			}
		)*
	};
}

release_by_drop!(
	types::Fields,
	types::OutgoingRequest,
	types::OutgoingBody,
	streams::OutputStream,
	types::FutureIncomingResponse,
	poll::Pollable,
	types::IncomingResponse,
	types::IncomingBody,
	streams::InputStream,
);

/// The host provided by the WASI runtime.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WasiHost;

impl WasiHost {
	/// Constructs the host.
	pub fn new() -> Self {
		Self
	}
}

/// Converts a method to the host's representation.
fn method(method: &Method) -> types::Method {
	match method {
		Method::Get => types::Method::Get,
		Method::Put => types::Method::Put,
		Method::Post => types::Method::Post,
		Method::Delete => types::Method::Delete,
		Method::Options => types::Method::Options,
		Method::Patch => types::Method::Patch,
		Method::Connect => types::Method::Connect,
		Method::Trace => types::Method::Trace,
		Method::Other(other) => types::Method::Other(other.clone()),
	}
}

/// Converts a scheme to the host's representation.
fn scheme(scheme: &Scheme) -> types::Scheme {
	match scheme {
		Scheme::Http => types::Scheme::Http,
		Scheme::Https => types::Scheme::Https,
		Scheme::Other(other) => types::Scheme::Other(other.clone()),
	}
}

/// Converts a host stream error, keeping only the debug description of a failure.
fn stream_error(e: streams::StreamError) -> StreamError {
	match e {
		streams::StreamError::Closed => StreamError::Closed,
		streams::StreamError::LastOperationFailed(e) => StreamError::Failed(e.to_debug_string()),
	}
}

impl Host for WasiHost {
	type Fields = types::Fields;
	type OutgoingRequest = types::OutgoingRequest;
	type OutgoingBody = types::OutgoingBody;
	type OutputStream = streams::OutputStream;
	type FutureResponse = types::FutureIncomingResponse;
	type Pollable = poll::Pollable;
	type IncomingResponse = types::IncomingResponse;
	type IncomingBody = types::IncomingBody;
	type InputStream = streams::InputStream;

	fn fields_from_list(&self, entries: &[Header<'_>]) -> Result<types::Fields, String> {
		let entries: Vec<(String, Vec<u8>)> = entries
			.iter()
			.map(|h| (h.name.to_owned(), h.value.to_vec()))
			.collect();
		types::Fields::from_list(&entries).map_err(|e| format!("{e:?}"))
	}

	fn fields_entries(&self, fields: &types::Fields) -> Vec<(String, Vec<u8>)> {
		fields.entries()
	}

	fn new_outgoing_request(&self, headers: types::Fields) -> types::OutgoingRequest {
		types::OutgoingRequest::new(headers)
	}

	fn set_method(&self, request: &types::OutgoingRequest, m: &Method) -> Result<(), Rejected> {
		request.set_method(&method(m)).map_err(|()| Rejected)
	}

	fn set_scheme(
		&self,
		request: &types::OutgoingRequest,
		s: Option<&Scheme>,
	) -> Result<(), Rejected> {
		request
			.set_scheme(s.map(scheme).as_ref())
			.map_err(|()| Rejected)
	}

	fn set_authority(
		&self,
		request: &types::OutgoingRequest,
		authority: Option<&str>,
	) -> Result<(), Rejected> {
		request.set_authority(authority).map_err(|()| Rejected)
	}

	fn set_path_with_query(
		&self,
		request: &types::OutgoingRequest,
		path_with_query: Option<&str>,
	) -> Result<(), Rejected> {
		request
			.set_path_with_query(path_with_query)
			.map_err(|()| Rejected)
	}

	fn outgoing_body(
		&self,
		request: &types::OutgoingRequest,
	) -> Result<types::OutgoingBody, Rejected> {
		request.body().map_err(|()| Rejected)
	}

	fn body_write(&self, body: &types::OutgoingBody) -> Result<streams::OutputStream, Rejected> {
		body.write().map_err(|()| Rejected)
	}

	fn blocking_write_and_flush(
		&self,
		stream: &streams::OutputStream,
		contents: &[u8],
	) -> Result<(), StreamError> {
		stream
			.blocking_write_and_flush(contents)
			.map_err(stream_error)
	}

	fn finish_body(
		&self,
		body: types::OutgoingBody,
		trailers: Option<types::Fields>,
	) -> Result<(), String> {
		types::OutgoingBody::finish(body, trailers).map_err(|e| format!("{e:?}"))
	}

	fn handle(
		&self,
		request: types::OutgoingRequest,
	) -> Result<types::FutureIncomingResponse, String> {
		outgoing_handler::handle(request, None).map_err(|e| format!("{e:?}"))
	}

	fn future_get(
		&self,
		future: &types::FutureIncomingResponse,
	) -> FutureResult<types::IncomingResponse> {
		match future.get() {
			None => FutureResult::Pending,
			Some(Err(())) => FutureResult::HandlerFailed("response already taken".to_owned()),
			Some(Ok(Err(e))) => FutureResult::Completed(Err(format!("{e:?}"))),
			Some(Ok(Ok(response))) => FutureResult::Completed(Ok(response)),
		}
	}

	fn future_subscribe(&self, future: &types::FutureIncomingResponse) -> poll::Pollable {
		future.subscribe()
	}

	fn block(&self, pollable: &poll::Pollable) {
		pollable.block();
	}

	fn status(&self, response: &types::IncomingResponse) -> u16 {
		response.status()
	}

	fn response_headers(&self, response: &types::IncomingResponse) -> types::Fields {
		response.headers()
	}

	fn consume(&self, response: &types::IncomingResponse) -> Result<types::IncomingBody, Rejected> {
		response.consume().map_err(|()| Rejected)
	}

	fn body_stream(&self, body: &types::IncomingBody) -> Result<streams::InputStream, Rejected> {
		body.stream().map_err(|()| Rejected)
	}

	fn stream_subscribe(&self, stream: &streams::InputStream) -> poll::Pollable {
		stream.subscribe()
	}

	fn read(&self, stream: &streams::InputStream, len: u64) -> Result<Vec<u8>, StreamError> {
		stream.read(len).map_err(stream_error)
	}
}
