/// Checks whether a byte is a `tchar` (token character).
pub fn is_tchar(b: u8) -> bool {
	b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Checks whether a string is a token.
pub fn is_token(name: &str) -> bool {
	!name.is_empty() && name.bytes().all(is_tchar)
}

/// Checks whether a byte can legally appear in an HTTP header value.
pub fn is_field_vchar(b: u8) -> bool {
	b == b'\t' || (b >= 0x20 && b != 0x7F)
}

/// Checks whether a sequence of bytes is a valid HTTP header value.
pub fn is_field_value(value: &[u8]) -> bool {
	match (value.first(), value.last()) {
		(Some(&first), Some(&last)) => {
			first != b' '
				&& first != b'\t'
				&& last != b' '
				&& last != b'\t'
				&& value.iter().all(|b| is_field_vchar(*b))
		}
		_ => true,
	}
}

/// Checks whether a byte is a valid character to appear in a `request-target`.
///
/// This check is relaxed and does not check the full requirements for path validity.
pub fn is_request_target_char(b: u8) -> bool {
	(0x21_u8..0x7F_u8).contains(&b)
}

/// Checks whether a string is a `request-target`.
///
/// This check is relaxed and does not check the full requirements for path validity.
pub fn is_request_target(req: &str) -> bool {
	!req.is_empty() && req.bytes().all(is_request_target_char)
}

/// Checks whether a string is a `host[:port]` authority: request-target characters other than
/// the delimiters that would end it and the `@` that would introduce userinfo.
pub fn is_authority(authority: &str) -> bool {
	!authority.is_empty()
		&& authority
			.bytes()
			.all(|b| is_request_target_char(b) && !b"/?#@".contains(&b))
}

/// Checks whether a string is a URL scheme: a letter followed by letters, digits, `+`, `-`, or
/// `.`.
pub fn is_scheme(scheme: &str) -> bool {
	let mut bytes = scheme.bytes();
	bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
		&& bytes.all(|b| b.is_ascii_alphanumeric() || b"+-.".contains(&b))
}

#[cfg(test)]
mod test {
	use super::*;

	/// Tests token recognition.
	#[test]
	fn test_is_token() {
		assert!(is_token("Content-Type"));
		assert!(is_token("x-custom_1!"));
		assert!(!is_token(""));
		assert!(!is_token("Bad Name"));
		assert!(!is_token("colon:"));
	}

	/// Tests field value recognition.
	#[test]
	fn test_is_field_value() {
		assert!(is_field_value(b""));
		assert!(is_field_value(b"text/plain; charset=utf-8"));
		assert!(is_field_value(b"a\tb"));
		assert!(!is_field_value(b" leading"));
		assert!(!is_field_value(b"trailing\t"));
		assert!(!is_field_value(b"line\r\nbreak"));
		assert!(!is_field_value(b"del\x7f"));
	}

	/// Tests request target, authority, and scheme recognition.
	#[test]
	fn test_request_line_parts() {
		assert!(is_request_target("/a/b?c=d"));
		assert!(!is_request_target(""));
		assert!(!is_request_target("/with space"));
		assert!(is_authority("example.com:8080"));
		assert!(is_authority("[::1]:80"));
		assert!(!is_authority("user@example.com"));
		assert!(!is_authority("example.com/path"));
		assert!(!is_authority(""));
		assert!(is_scheme("http"));
		assert!(is_scheme("svn+ssh"));
		assert!(!is_scheme("1http"));
		assert!(!is_scheme(""));
	}
}
