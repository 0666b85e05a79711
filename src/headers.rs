/// An ordered, case-preserving multi-map of HTTP header names to values.
///
/// Names are stored exactly as given and kept in first-insertion order; each name holds its values
/// in insertion order. Two names differing only in case are distinct entries, because hosts treat
/// field names as opaque strings. The lookup methods ([`get`](Self::get),
/// [`get_all`](Self::get_all), [`contains`](Self::contains)) compare names case-insensitively,
/// while the `_exact` methods compare them byte for byte.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers {
	/// The entries, one per distinct exact name.
	entries: Vec<(String, Vec<String>)>,
}

impl Headers {
	/// Constructs an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a value after any existing values under exactly the same name.
	pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(n, _)| *n == name) {
			Some((_, values)) => values.push(value),
			None => self.entries.push((name, vec![value])),
		}
	}

	/// Replaces all values under exactly the same name with a single value.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(n, _)| *n == name) {
			Some((_, values)) => *values = vec![value],
			None => self.entries.push((name, vec![value])),
		}
	}

	/// Removes every entry whose name matches case-insensitively, returning whether any did.
	pub fn remove(&mut self, name: &str) -> bool {
		let before = self.entries.len();
		self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
		self.entries.len() != before
	}

	/// Returns the first value whose name matches case-insensitively.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.get_all(name).next()
	}

	/// Returns every value whose name matches case-insensitively, in storage order.
	pub fn get_all<'a: 'n, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + 'n {
		self.entries
			.iter()
			.filter(move |(n, _)| n.eq_ignore_ascii_case(name))
			.flat_map(|(_, values)| values.iter().map(String::as_str))
	}

	/// Returns the values stored under exactly `name`.
	pub fn get_exact(&self, name: &str) -> Option<&[String]> {
		self.entries
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, values)| values.as_slice())
	}

	/// Checks whether any name matches case-insensitively.
	pub fn contains(&self, name: &str) -> bool {
		self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
	}

	/// Checks whether exactly `name` is present.
	pub fn contains_exact(&self, name: &str) -> bool {
		self.get_exact(name).is_some()
	}

	/// Iterates over the distinct exact names and their values.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.entries
			.iter()
			.map(|(name, values)| (name.as_str(), values.as_slice()))
	}

	/// Returns the number of distinct exact names.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Checks whether the map is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
	fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
		let mut ret = Self::new();
		ret.extend(iter);
		ret
	}
}

impl<N: Into<String>, V: Into<String>> Extend<(N, V)> for Headers {
	fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
		for (name, value) in iter {
			self.append(name, value);
		}
	}
}

#[cfg(test)]
mod test {
	use super::Headers;

	/// Tests that values for the same name accumulate in order and names keep first-insertion
	/// order.
	#[test]
	fn test_append_order() {
		let mut headers = Headers::new();
		headers.append("Accept", "text/html");
		headers.append("X-One", "1");
		headers.append("Accept", "text/plain");
		let entries: Vec<_> = headers.iter().collect();
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].0, "Accept");
		assert_eq!(entries[0].1, ["text/html", "text/plain"]);
		assert_eq!(entries[1].0, "X-One");
	}

	/// Tests that storage is case-sensitive while lookup is case-insensitive.
	#[test]
	fn test_case() {
		let mut headers = Headers::new();
		headers.append("X-Test", "1");
		headers.append("x-test", "2");
		assert_eq!(headers.len(), 2);
		assert_eq!(headers.get_exact("X-Test").unwrap(), ["1"]);
		assert_eq!(headers.get_exact("x-test").unwrap(), ["2"]);
		assert!(headers.get_exact("X-TEST").is_none());
		assert!(!headers.contains_exact("X-TEST"));
		assert!(headers.contains("X-TEST"));
		assert_eq!(headers.get("X-TEST"), Some("1"));
		assert_eq!(headers.get_all("x-TEST").collect::<Vec<_>>(), ["1", "2"]);
	}

	/// Tests `set` and `remove`.
	#[test]
	fn test_set_remove() {
		let mut headers: Headers = [("A", "1"), ("A", "2"), ("a", "3")].into_iter().collect();
		headers.set("A", "9");
		assert_eq!(headers.get_exact("A").unwrap(), ["9"]);
		assert!(headers.remove("A"));
		assert!(headers.is_empty());
		assert!(!headers.remove("A"));
	}
}
