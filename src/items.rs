use core::fmt;

/// An ordered list of strings. Insertion order is kept and duplicates are allowed.
///
/// `delimiter` and `quote` only affect how the list is rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct List {
	items: Vec<String>,
	pub delimiter: String,
	pub quote: String,
}

impl List {
	pub fn new(delimiter: &str, quote: &str) -> Self {
		List { items: Vec::new(), delimiter: delimiter.to_owned(), quote: quote.to_owned() }
	}

	pub fn from_items<I, S>(items: I, delimiter: &str, quote: &str) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		List { items: items.into_iter().map(Into::into).collect(), delimiter: delimiter.to_owned(), quote: quote.to_owned() }
	}

	pub fn add(mut self, value: impl Into<String>) -> Self {
		self.items.push(value.into());
		self
	}

	pub fn extend<I, S>(mut self, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.items.extend(values.into_iter().map(Into::into));
		self
	}

	/// Prepends `base` to every element and passes the joined path through `normalizer`.
	pub fn prefix(&self, base: &str, normalizer: fn(&str) -> String) -> Self {
		let items = self
			.items
			.iter()
			.map(|x| {
				if base.is_empty() {
					normalizer(x)
				} else {
					normalizer(&(base.to_owned() + "/" + x))
				}
			})
			.collect();
		List { items, delimiter: self.delimiter.clone(), quote: self.quote.clone() }
	}

	pub fn to_set(&self) -> OrderedSet {
		let mut items: Vec<String> = Vec::with_capacity(self.items.len());
		for item in &self.items {
			if !items.contains(item) {
				items.push(item.clone());
			}
		}
		OrderedSet(List { items, delimiter: self.delimiter.clone(), quote: self.quote.clone() })
	}

	/// Joins the elements with `delimiter`, wrapping each one in `quote`.
	pub fn render(&self, delimiter: &str, quote: &str) -> String {
		self.items
			.iter()
			.map(|x| format!("{quote}{x}{quote}"))
			.collect::<Vec<String>>()
			.join(delimiter)
	}

	pub fn iter(&self) -> impl Iterator<Item = &String> {
		self.items.iter()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

impl fmt::Display for List {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.render(&self.delimiter, &self.quote))
	}
}

/// Duplicate-free projection of a [`List`], first occurrence wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderedSet(List);

impl OrderedSet {
	pub fn to_set(&self) -> OrderedSet {
		self.0.to_set()
	}

	pub fn render(&self, delimiter: &str, quote: &str) -> String {
		self.0.render(delimiter, quote)
	}

	pub fn iter(&self) -> impl Iterator<Item = &String> {
		self.0.iter()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Display for OrderedSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Canonical form used inside the generator: forward slashes, no `./` segments,
/// no doubled or trailing separators.
pub fn fix_path(path: &str) -> String {
	let unified = path.replace('\\', "/");
	let absolute = unified.starts_with('/');
	let joined = unified
		.split('/')
		.filter(|x| !x.is_empty() && *x != ".")
		.collect::<Vec<&str>>()
		.join("/");
	if absolute {
		"/".to_owned() + &joined
	} else {
		joined
	}
}

/// Same as [`fix_path`] but with backslashes, for Visual Studio files.
pub fn windows_path(path: &str) -> String {
	fix_path(path).replace('/', "\\")
}

#[test]
fn test_to_set_keeps_first_occurrence() {
	let list = List::from_items(["b", "a", "b", "c", "a"], ",", "");
	let set = list.to_set();
	assert_eq!(set.iter().cloned().collect::<Vec<_>>(), vec!["b", "a", "c"]);
	assert_eq!(set.to_set(), set);
	// Source list is untouched
	assert_eq!(list.len(), 5);
}

#[test]
fn test_render() {
	let list = List::new(",", "\"").add("a").add("b");
	assert_eq!(list.render(",", "\""), r#""a","b""#);
	assert_eq!(list.to_string(), r#""a","b""#);
	assert_eq!(List::new(",", "\"").render(",", "\""), "");
	assert_eq!(List::from_items(["x", "y"], ";", "").to_string(), "x;y");
}

#[test]
fn test_prefix() {
	let list = List::from_items(["source/main/include", r".\generated"], ",", "");
	let prefixed = list.prefix("../xbase", fix_path);
	assert_eq!(prefixed.iter().cloned().collect::<Vec<_>>(), vec!["../xbase/source/main/include", "../xbase/generated"]);
	let unprefixed = list.prefix("", fix_path);
	assert_eq!(unprefixed.iter().cloned().collect::<Vec<_>>(), vec!["source/main/include", "generated"]);
}

#[test]
fn test_fix_path() {
	assert_eq!(fix_path(r"source\main\\cpp\"), "source/main/cpp");
	assert_eq!(fix_path("./a/./b"), "a/b");
	assert_eq!(fix_path("/abs//dir"), "/abs/dir");
	assert_eq!(windows_path("../xbase/source"), r"..\xbase\source");
}
