use crate::error::{BuildError, Error};
use crate::host::{Guard, Host};

/// Transmits the request body and declares it complete.
///
/// The `request` parameter is the host request whose body is being sent. The `payload` parameter
/// is the entire body, already read into memory, or `None` if the request has no body.
///
/// If there is a payload, the body’s write sink is obtained, the payload is written with a single
/// blocking write-and-flush, and the sink is released. Whether or not there was a payload, the
/// body is then finished exactly once, with no trailers. If anything fails, the body is released
/// unfinished, which tells the host the request is incomplete.
///
/// # Errors
/// This function returns an error if the host will not provide the body or sink, if the write
/// fails, or if finishing fails.
pub(crate) fn send<H: Host>(
	host: &H,
	request: &H::OutgoingRequest,
	payload: Option<&[u8]>,
) -> Result<(), Error> {
	let body = Guard::new(
		host.outgoing_body(request)
			.map_err(BuildError::Body)?,
	);

	if let Some(payload) = payload {
		let sink = Guard::new(host.body_write(&body).map_err(BuildError::Body)?);
		log::trace!("writing {} byte request body", payload.len());
		host.blocking_write_and_flush(&sink, payload)
			.map_err(Error::Write)?;
	}

	host.finish_body(body.into_inner(), None)
		.map_err(Error::Finish)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::memory::MemoryHost;

	/// Sends a body on a fresh request and submits it, returning what the host recorded.
	fn run(payload: Option<&[u8]>) -> (MemoryHost, Result<(), Error>) {
		let host = MemoryHost::new();
		let fields = host.fields_from_list(&[]).unwrap();
		let request = Guard::new(host.new_outgoing_request(fields));
		let result = send(&host, &request, payload);
		drop(request);
		(host, result)
	}

	/// Tests that a request with no body is finished without being written.
	#[test]
	fn test_empty() {
		let (host, result) = run(None);
		result.unwrap();
		let recorded = &host.requests()[0];
		assert_eq!(recorded.writes, 0);
		assert_eq!(recorded.finishes, 1);
		assert!(recorded.body.is_empty());
		assert!(host.live().is_empty());
		assert!(host.violations().is_empty());
	}

	/// Tests that a payload is written once and then finished, with the sink released before the
	/// body.
	#[test]
	fn test_payload() {
		let (host, result) = run(Some(&b"{\"a\":1}"[..]));
		result.unwrap();
		let recorded = &host.requests()[0];
		assert_eq!(recorded.writes, 1);
		assert_eq!(recorded.finishes, 1);
		assert_eq!(recorded.body, b"{\"a\":1}");
		assert!(host.live().is_empty());
		assert!(host.violations().is_empty());
	}

	/// Tests that an empty but present payload still goes through the sink.
	#[test]
	fn test_zero_length_payload() {
		let (host, result) = run(Some(&b""[..]));
		result.unwrap();
		let recorded = &host.requests()[0];
		assert_eq!(recorded.writes, 1);
		assert_eq!(recorded.finishes, 1);
	}

	/// Tests that a second attempt to obtain the body fails without leaking.
	#[test]
	fn test_body_taken_twice() {
		let host = MemoryHost::new();
		let fields = host.fields_from_list(&[]).unwrap();
		let request = Guard::new(host.new_outgoing_request(fields));
		send(&host, &request, None).unwrap();
		assert!(matches!(
			send(&host, &request, None),
			Err(Error::Build(BuildError::Body(_)))
		));
		drop(request);
		assert_eq!(host.requests()[0].finishes, 1);
		assert!(host.live().is_empty());
	}
}
