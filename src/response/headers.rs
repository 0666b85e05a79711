use crate::Headers;

/// Rebuilds a header map from a host field list.
///
/// Entries are taken in order; a repeated name appends to that name’s values rather than
/// replacing them. Values that are not valid UTF-8 are converted lossily.
pub(crate) fn reconstruct(entries: Vec<(String, Vec<u8>)>) -> Headers {
	let mut headers = Headers::new();
	for (name, value) in entries {
		let value = match String::from_utf8(value) {
			Ok(value) => value,
			Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
		};
		headers.append(name, value);
	}
	headers
}
