//! A [`Host`] that runs entirely in memory.
//!
//! [`MemoryHost`] answers each submitted request with the next scripted [`Reply`], records what
//! was sent, and keeps a ledger of every resource it hands out. The ledger reports resources that
//! were never released and resources released while a child resource was still live (for
//! example, a body released before its stream), which a real host would treat as a fatal error.
//!
//! Field lists and request line components are validated the way a strict host would validate
//! them, so invalid input is rejected rather than recorded.
//!
//! # Example
//! ```
//! use wasi_transport::memory::{MemoryHost, Reply};
//! use wasi_transport::Transport;
//!
//! let host = MemoryHost::new();
//! host.push(Reply::parse(b"HTTP/1.1 404 Not Found\r\nContent-Length: 4\r\n\r\nnope").unwrap());
//! let transport = Transport::new(host);
//! let response = transport.get("https://example.com/missing").unwrap();
//! assert_eq!(response.status, 404);
//! assert_eq!(response.body.as_bytes(), b"nope");
//! assert!(transport.host().live().is_empty());
//! ```

use crate::host::{FutureResult, Host, Method, Rejected, Resource, Scheme, StreamError};
use crate::util::{is_authority, is_field_value, is_request_target, is_scheme, is_token};
use crate::Header;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// The most headers [`Reply::parse`] accepts.
const MAX_PARSED_HEADERS: usize = 64;

/// One step of a scripted response body.
type Chunk = Result<Vec<u8>, StreamError>;

/// How the host disposes of a submitted request.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Outcome {
	/// Deliver the response once the future has been waited on.
	Respond,

	/// Deliver the response on the very first probe, before any wait.
	RespondEarly,

	/// Never deliver anything.
	NeverReady,

	/// Refuse the submission.
	Reject(String),

	/// Fail at the connection level.
	HandlerFailure(String),

	/// Fail at the HTTP level.
	HttpError(String),
}

/// A scripted answer to one request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reply {
	/// How the request is disposed of.
	outcome: Outcome,

	/// The response status.
	status: u16,

	/// The response header fields.
	headers: Vec<(String, Vec<u8>)>,

	/// The results of successive body reads; the stream is closed after the last one.
	chunks: Vec<Chunk>,
}

impl Reply {
	/// Constructs a response with the given status, no headers, and an empty body.
	pub fn new(status: u16) -> Self {
		Self {
			outcome: Outcome::Respond,
			status,
			headers: Vec::new(),
			chunks: Vec::new(),
		}
	}

	/// Parses an HTTP/1.x response message: status line, headers, and body.
	///
	/// The body is everything after the blank line, delivered as a single chunk. No framing
	/// headers are interpreted.
	///
	/// # Errors
	/// This function returns an error if the status line or headers are malformed or incomplete,
	/// or if there are too many headers.
	pub fn parse(raw: &[u8]) -> Result<Self, httparse::Error> {
		let mut storage = [httparse::EMPTY_HEADER; MAX_PARSED_HEADERS];
		let mut parsed = httparse::Response::new(&mut storage);
		let length = match parsed.parse(raw)? {
			httparse::Status::Complete(n) => n,
			// Without the blank line the headers never ended.
			httparse::Status::Partial => return Err(httparse::Error::NewLine),
		};
		let mut reply = Self::new(parsed.code.ok_or(httparse::Error::Status)?);
		for header in parsed.headers.iter() {
			reply = reply.header(header.name, header.value);
		}
		if length < raw.len() {
			reply = reply.chunk(&raw[length..]);
		}
		Ok(reply)
	}

	/// Adds a response header field.
	#[must_use]
	pub fn header(mut self, name: &str, value: impl AsRef<[u8]>) -> Self {
		self.headers.push((name.to_owned(), value.as_ref().to_vec()));
		self
	}

	/// Adds a chunk to the response body. Each chunk is delivered by its own read, split further
	/// if a read asks for fewer bytes.
	#[must_use]
	pub fn chunk(mut self, data: impl AsRef<[u8]>) -> Self {
		self.chunks.push(Ok(data.as_ref().to_vec()));
		self
	}

	/// Makes the next body read fail, after any chunks already added.
	#[must_use]
	pub fn stream_error(mut self, detail: impl Into<String>) -> Self {
		self.chunks.push(Err(StreamError::Failed(detail.into())));
		self
	}

	/// Makes the response available before the future is waited on.
	#[must_use]
	pub fn ready_early(mut self) -> Self {
		self.outcome = Outcome::RespondEarly;
		self
	}

	/// Constructs a reply whose future never becomes ready.
	pub fn never_ready() -> Self {
		Self {
			outcome: Outcome::NeverReady,
			..Self::new(0)
		}
	}

	/// Constructs a reply that refuses the submission.
	pub fn reject(detail: impl Into<String>) -> Self {
		Self {
			outcome: Outcome::Reject(detail.into()),
			..Self::new(0)
		}
	}

	/// Constructs a reply that fails at the connection level.
	pub fn handler_failure(detail: impl Into<String>) -> Self {
		Self {
			outcome: Outcome::HandlerFailure(detail.into()),
			..Self::new(0)
		}
	}

	/// Constructs a reply that fails at the HTTP level.
	pub fn http_error(detail: impl Into<String>) -> Self {
		Self {
			outcome: Outcome::HttpError(detail.into()),
			..Self::new(0)
		}
	}
}

/// A request as the host saw it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordedRequest {
	/// The method, if set.
	pub method: Option<Method>,

	/// The scheme, if set.
	pub scheme: Option<Scheme>,

	/// The authority, if set.
	pub authority: Option<String>,

	/// The path and query, if set.
	pub path_with_query: Option<String>,

	/// The header fields, in order.
	pub headers: Vec<(String, Vec<u8>)>,

	/// Every byte written to the body.
	pub body: Vec<u8>,

	/// How many times the body was written to.
	pub writes: usize,

	/// How many times the body was finished.
	pub finishes: usize,

	/// Whether the request was accepted for submission.
	pub submitted: bool,
}

impl RecordedRequest {
	/// Returns every value of the fields whose name matches case-insensitively.
	pub fn header_values(&self, name: &str) -> Vec<&[u8]> {
		self.headers
			.iter()
			.filter(|(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_slice())
			.collect()
	}
}

/// The host’s shared bookkeeping.
#[derive(Debug, Default)]
struct State {
	/// The identifier of the next resource.
	next_id: u64,

	/// Live resources by identifier, with their kind and parent.
	live: BTreeMap<u64, (&'static str, Option<u64>)>,

	/// Descriptions of misuse observed so far.
	violations: Vec<String>,

	/// Replies waiting for requests.
	replies: VecDeque<Reply>,

	/// Every request created, in order.
	requests: Vec<Rc<RefCell<RecordedRequest>>>,

	/// How many times a future was probed.
	probes: usize,

	/// How many times a pollable was blocked on.
	blocks: usize,

	/// How many times a stream was read.
	reads: usize,

	/// The failure reported by the next body write, if one is scripted.
	write_failure: Option<String>,

	/// The failure reported by the next body finish, if one is scripted.
	finish_failure: Option<String>,
}

impl State {
	/// Records a new resource.
	fn acquire(&mut self, kind: &'static str, parent: Option<u64>) -> u64 {
		let id = self.next_id;
		self.next_id += 1;
		let _ = self.live.insert(id, (kind, parent));
		id
	}

	/// Records the release of a resource, checking that none of its children remain.
	fn release(&mut self, id: u64) {
		match self.live.remove(&id) {
			None => self.violations.push(format!("resource {id} released twice")),
			Some((kind, _)) => {
				let orphans: Vec<String> = self
					.live
					.iter()
					.filter(|(_, (_, parent))| *parent == Some(id))
					.map(|(child, (child_kind, _))| {
						format!("{kind} {id} released before its {child_kind} {child}")
					})
					.collect();
				self.violations.extend(orphans);
			}
		}
	}
}

/// Membership in a host’s resource ledger.
struct Handle {
	/// The resource’s identifier.
	id: u64,

	/// The ledger.
	state: Rc<RefCell<State>>,
}

impl Handle {
	/// Removes the resource from the ledger.
	fn release(self) {
		self.state.borrow_mut().release(self.id);
	}
}

impl Debug for Handle {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		f.debug_tuple("Handle").field(&self.id).finish()
	}
}

macro_rules! memory_resource {
	($(#[$doc:meta])* $name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
		$(#[$doc])*
		#[derive(Debug)]
		pub struct $name {
			/// Ledger membership.
			handle: Handle,
			$($field: $ty,)*
		}

		impl Resource for $name {
			fn release(self) {
				self.handle.release();
			}
		}
	};
}

memory_resource!(
	/// An in-memory field list.
	MemoryFields {
		entries: Vec<(String, Vec<u8>)>,
	}
);

memory_resource!(
	/// An in-memory outgoing request.
	MemoryRequest {
		record: Rc<RefCell<RecordedRequest>>,
		body_taken: Cell<bool>,
	}
);

memory_resource!(
	/// An in-memory outgoing body.
	MemoryOutgoingBody {
		record: Rc<RefCell<RecordedRequest>>,
		sink_taken: Cell<bool>,
	}
);

memory_resource!(
	/// An in-memory body sink.
	MemoryOutputStream {
		record: Rc<RefCell<RecordedRequest>>,
	}
);

memory_resource!(
	/// An in-memory response future.
	MemoryFuture {
		cell: Rc<RefCell<FutureCell>>,
	}
);

memory_resource!(
	/// An in-memory pollable.
	MemoryPollable {
		future: Option<Rc<RefCell<FutureCell>>>,
	}
);

memory_resource!(
	/// An in-memory incoming response.
	MemoryResponse {
		status: u16,
		headers: Vec<(String, Vec<u8>)>,
		chunks: RefCell<Option<VecDeque<Chunk>>>,
	}
);

memory_resource!(
	/// An in-memory incoming body.
	MemoryIncomingBody {
		chunks: RefCell<Option<VecDeque<Chunk>>>,
	}
);

memory_resource!(
	/// An in-memory body stream.
	MemoryInputStream {
		chunks: RefCell<VecDeque<Chunk>>,
	}
);

/// The state behind a response future.
#[derive(Debug)]
struct FutureCell {
	/// The reply, until it is delivered.
	reply: Option<Reply>,

	/// Whether a pollable for the future has been blocked on.
	ready: bool,
}

/// A [`Host`] backed by scripted replies.
///
/// Cloning the host shares its state, so a clone kept by a test observes everything done through
/// the transport that owns the host.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
	/// The shared bookkeeping.
	state: Rc<RefCell<State>>,
}

impl MemoryHost {
	/// Constructs a host with no replies scripted.
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a reply for the next request submitted.
	pub fn push(&self, reply: Reply) {
		self.state.borrow_mut().replies.push_back(reply);
	}

	/// Returns a snapshot of every request created so far.
	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.state
			.borrow()
			.requests
			.iter()
			.map(|r| r.borrow().clone())
			.collect()
	}

	/// Returns the kinds of all resources not yet released, oldest first.
	pub fn live(&self) -> Vec<&'static str> {
		self.state.borrow().live.values().map(|(kind, _)| *kind).collect()
	}

	/// Returns descriptions of resources released out of order.
	pub fn violations(&self) -> Vec<String> {
		self.state.borrow().violations.clone()
	}

	/// Returns how many times a future has been probed.
	pub fn probes(&self) -> usize {
		self.state.borrow().probes
	}

	/// Returns how many times a pollable has been blocked on.
	pub fn blocks(&self) -> usize {
		self.state.borrow().blocks
	}

	/// Returns how many times a stream has been read.
	pub fn reads(&self) -> usize {
		self.state.borrow().reads
	}

	/// Makes the next body write fail with `detail`. Nothing is recorded as written.
	pub fn fail_next_write(&self, detail: impl Into<String>) {
		self.state.borrow_mut().write_failure = Some(detail.into());
	}

	/// Makes the next body finish fail with `detail`. The body is still consumed.
	pub fn fail_next_finish(&self, detail: impl Into<String>) {
		self.state.borrow_mut().finish_failure = Some(detail.into());
	}

	/// Adds a resource to the ledger.
	fn acquire(&self, kind: &'static str, parent: Option<u64>) -> Handle {
		let id = self.state.borrow_mut().acquire(kind, parent);
		Handle {
			id,
			state: self.state.clone(),
		}
	}

	/// Turns a delivered reply into a probe result.
	fn deliver(&self, reply: Reply) -> FutureResult<MemoryResponse> {
		match reply.outcome {
			Outcome::HandlerFailure(detail) => FutureResult::HandlerFailed(detail),
			Outcome::HttpError(detail) => FutureResult::Completed(Err(detail)),
			Outcome::Respond | Outcome::RespondEarly | Outcome::NeverReady | Outcome::Reject(_) => {
				FutureResult::Completed(Ok(MemoryResponse {
					handle: self.acquire("incoming-response", None),
					status: reply.status,
					headers: reply.headers,
					chunks: RefCell::new(Some(reply.chunks.into())),
				}))
			}
		}
	}
}

impl Host for MemoryHost {
	type Fields = MemoryFields;
	type OutgoingRequest = MemoryRequest;
	type OutgoingBody = MemoryOutgoingBody;
	type OutputStream = MemoryOutputStream;
	type FutureResponse = MemoryFuture;
	type Pollable = MemoryPollable;
	type IncomingResponse = MemoryResponse;
	type IncomingBody = MemoryIncomingBody;
	type InputStream = MemoryInputStream;

	fn fields_from_list(&self, entries: &[Header<'_>]) -> Result<MemoryFields, String> {
		for entry in entries {
			if !is_token(entry.name) {
				return Err(format!("invalid field name {:?}", entry.name));
			}
			if !is_field_value(entry.value) {
				return Err(format!("invalid value for field {}", entry.name));
			}
		}
		Ok(MemoryFields {
			handle: self.acquire("fields", None),
			entries: entries
				.iter()
				.map(|h| (h.name.to_owned(), h.value.to_vec()))
				.collect(),
		})
	}

	fn fields_entries(&self, fields: &MemoryFields) -> Vec<(String, Vec<u8>)> {
		fields.entries.clone()
	}

	fn new_outgoing_request(&self, headers: MemoryFields) -> MemoryRequest {
		let record = Rc::new(RefCell::new(RecordedRequest {
			headers: headers.entries.clone(),
			..RecordedRequest::default()
		}));
		headers.release();
		self.state.borrow_mut().requests.push(record.clone());
		MemoryRequest {
			handle: self.acquire("outgoing-request", None),
			record,
			body_taken: Cell::new(false),
		}
	}

	fn set_method(&self, request: &MemoryRequest, method: &Method) -> Result<(), Rejected> {
		if !is_token(method.as_str()) {
			return Err(Rejected);
		}
		request.record.borrow_mut().method = Some(method.clone());
		Ok(())
	}

	fn set_scheme(&self, request: &MemoryRequest, scheme: Option<&Scheme>) -> Result<(), Rejected> {
		if !scheme.map_or(true, |s| is_scheme(s.as_str())) {
			return Err(Rejected);
		}
		request.record.borrow_mut().scheme = scheme.cloned();
		Ok(())
	}

	fn set_authority(&self, request: &MemoryRequest, authority: Option<&str>) -> Result<(), Rejected> {
		if !authority.map_or(true, is_authority) {
			return Err(Rejected);
		}
		request.record.borrow_mut().authority = authority.map(str::to_owned);
		Ok(())
	}

	fn set_path_with_query(
		&self,
		request: &MemoryRequest,
		path_with_query: Option<&str>,
	) -> Result<(), Rejected> {
		if !path_with_query.map_or(true, is_request_target) {
			return Err(Rejected);
		}
		request.record.borrow_mut().path_with_query = path_with_query.map(str::to_owned);
		Ok(())
	}

	fn outgoing_body(&self, request: &MemoryRequest) -> Result<MemoryOutgoingBody, Rejected> {
		if request.body_taken.replace(true) {
			return Err(Rejected);
		}
		Ok(MemoryOutgoingBody {
			handle: self.acquire("outgoing-body", None),
			record: request.record.clone(),
			sink_taken: Cell::new(false),
		})
	}

	fn body_write(&self, body: &MemoryOutgoingBody) -> Result<MemoryOutputStream, Rejected> {
		if body.sink_taken.replace(true) {
			return Err(Rejected);
		}
		Ok(MemoryOutputStream {
			handle: self.acquire("output-stream", Some(body.handle.id)),
			record: body.record.clone(),
		})
	}

	fn blocking_write_and_flush(
		&self,
		stream: &MemoryOutputStream,
		contents: &[u8],
	) -> Result<(), StreamError> {
		let mut record = stream.record.borrow_mut();
		record.writes += 1;
		if let Some(detail) = self.state.borrow_mut().write_failure.take() {
			return Err(StreamError::Failed(detail));
		}
		record.body.extend_from_slice(contents);
		Ok(())
	}

	fn finish_body(
		&self,
		body: MemoryOutgoingBody,
		trailers: Option<MemoryFields>,
	) -> Result<(), String> {
		body.record.borrow_mut().finishes += 1;
		if let Some(trailers) = trailers {
			trailers.release();
		}
		body.release();
		match self.state.borrow_mut().finish_failure.take() {
			Some(detail) => Err(detail),
			None => Ok(()),
		}
	}

	fn handle(&self, request: MemoryRequest) -> Result<MemoryFuture, String> {
		let reply = self.state.borrow_mut().replies.pop_front();
		let record = request.record.clone();
		request.release();
		let reply = match reply {
			None => return Err("no reply scripted".to_owned()),
			Some(Reply {
				outcome: Outcome::Reject(detail),
				..
			}) => return Err(detail),
			Some(reply) => reply,
		};
		record.borrow_mut().submitted = true;
		Ok(MemoryFuture {
			handle: self.acquire("future-incoming-response", None),
			cell: Rc::new(RefCell::new(FutureCell {
				reply: Some(reply),
				ready: false,
			})),
		})
	}

	fn future_get(&self, future: &MemoryFuture) -> FutureResult<MemoryResponse> {
		self.state.borrow_mut().probes += 1;
		let mut cell = future.cell.borrow_mut();
		let deliverable = match &cell.reply {
			None => return FutureResult::HandlerFailed("response already taken".to_owned()),
			Some(reply) => match reply.outcome {
				Outcome::NeverReady => false,
				Outcome::RespondEarly => true,
				_ => cell.ready,
			},
		};
		match cell.reply.take() {
			Some(reply) if deliverable => self.deliver(reply),
			reply => {
				cell.reply = reply;
				FutureResult::Pending
			}
		}
	}

	fn future_subscribe(&self, future: &MemoryFuture) -> MemoryPollable {
		MemoryPollable {
			handle: self.acquire("pollable", Some(future.handle.id)),
			future: Some(future.cell.clone()),
		}
	}

	fn block(&self, pollable: &MemoryPollable) {
		self.state.borrow_mut().blocks += 1;
		if let Some(future) = &pollable.future {
			future.borrow_mut().ready = true;
		}
	}

	fn status(&self, response: &MemoryResponse) -> u16 {
		response.status
	}

	fn response_headers(&self, response: &MemoryResponse) -> MemoryFields {
		MemoryFields {
			handle: self.acquire("fields", Some(response.handle.id)),
			entries: response.headers.clone(),
		}
	}

	fn consume(&self, response: &MemoryResponse) -> Result<MemoryIncomingBody, Rejected> {
		let chunks = response.chunks.borrow_mut().take().ok_or(Rejected)?;
		Ok(MemoryIncomingBody {
			handle: self.acquire("incoming-body", None),
			chunks: RefCell::new(Some(chunks)),
		})
	}

	fn body_stream(&self, body: &MemoryIncomingBody) -> Result<MemoryInputStream, Rejected> {
		let chunks = body.chunks.borrow_mut().take().ok_or(Rejected)?;
		Ok(MemoryInputStream {
			handle: self.acquire("input-stream", Some(body.handle.id)),
			chunks: RefCell::new(chunks),
		})
	}

	fn stream_subscribe(&self, stream: &MemoryInputStream) -> MemoryPollable {
		MemoryPollable {
			handle: self.acquire("pollable", Some(stream.handle.id)),
			future: None,
		}
	}

	fn read(&self, stream: &MemoryInputStream, len: u64) -> Result<Vec<u8>, StreamError> {
		self.state.borrow_mut().reads += 1;
		let mut chunks = stream.chunks.borrow_mut();
		match chunks.pop_front() {
			None => Err(StreamError::Closed),
			Some(Err(e)) => Err(e),
			Some(Ok(mut data)) => {
				let len = usize::try_from(len).unwrap_or(usize::MAX);
				if data.len() > len {
					chunks.push_front(Ok(data.split_off(len)));
				}
				Ok(data)
			}
		}
	}
}
