use crate::{Header, Headers};

/// Fills in headers the caller may have left out.
///
/// The `user_agent` parameter is sent as `User-Agent` unless the caller set one. If `close` is
/// set, `Connection: close` is added. If `body_length` is the known length of a body and is
/// positive, it is sent as `Content-Length` unless the caller set one. All presence checks compare
/// names case-insensitively, so a caller’s `user-agent` suppresses the default.
pub(crate) fn apply_defaults(
	headers: &mut Headers,
	user_agent: &str,
	close: bool,
	body_length: Option<u64>,
) {
	if !headers.contains("User-Agent") {
		headers.append("User-Agent", user_agent);
	}
	if close {
		headers.set("Connection", "close");
	}
	if !headers.contains("Content-Length") {
		if let Some(length) = body_length.filter(|&n| n > 0) {
			headers.append("Content-Length", length.to_string());
		}
	}
}

/// Flattens a header map into one field per value.
///
/// Fields appear in the map’s name order, and each name’s values appear in the order they were
/// added. Nothing is validated, normalized, or merged; that is left to the host’s field list
/// constructor.
pub(crate) fn marshal(headers: &Headers) -> Vec<Header<'_>> {
	headers
		.iter()
		.flat_map(|(name, values)| {
			values.iter().map(move |value| Header {
				name,
				value: value.as_bytes(),
			})
		})
		.collect()
}
