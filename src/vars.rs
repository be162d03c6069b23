use core::fmt;
use std::collections::HashMap;

use crate::replacer::innermost_token;

/// Upper bound on substitutions per line, stops values that expand to themselves.
const MAX_EXPANSIONS_PER_LINE: usize = 256;

/// `<project>:<attribute>`
pub fn var_key(project: &str, attribute: &str) -> String {
	format!("{}:{}", project, attribute)
}

/// `<project>:<attribute>[<platform>][<config>]`
pub fn config_var_key(project: &str, attribute: &str, platform: &str, config: &str) -> String {
	format!("{}:{}[{}][{}]", project, attribute, platform, config)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarNotFound {
	pub key: String,
}

impl fmt::Display for VarNotFound {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "could not find variable {}", self.key)
	}
}

impl std::error::Error for VarNotFound {}

/// Flat key/value namespace for one generation run.
///
/// Keys are namespaced by project, see [`var_key`] and [`config_var_key`]. A fresh store is created
/// for every run; there is no reset.
#[derive(Debug, Default)]
pub struct Variables {
	vars: HashMap<String, String>,
}

impl Variables {
	pub fn new() -> Self {
		Variables { vars: HashMap::new() }
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.vars.insert(key.into(), value.into());
	}

	pub fn get(&self, key: &str) -> Result<&str, VarNotFound> {
		match self.vars.get(key) {
			Some(x) => Ok(x.as_str()),
			None => Err(VarNotFound { key: key.to_owned() }),
		}
	}

	pub fn remove(&mut self, key: &str) -> Option<String> {
		self.vars.remove(key)
	}

	/// Looks up the platform/config specific value first, then the unqualified one.
	pub fn resolve(&self, attribute: &str, project: &str, platform: &str, config: &str) -> Result<&str, VarNotFound> {
		if let Some(x) = self.vars.get(&config_var_key(project, attribute, platform, config)) {
			return Ok(x.as_str());
		}
		self.get(&var_key(project, attribute))
	}

	pub fn resolve_with_default<'a>(
		&'a self,
		attribute: &str,
		project: &str,
		platform: &str,
		config: &str,
		fallback: &'a str,
	) -> &'a str {
		self.resolve(attribute, project, platform, config).unwrap_or(fallback)
	}

	pub fn len(&self) -> usize {
		self.vars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vars.is_empty()
	}

	/// Resolves every remaining `${...}` reference in `lines` against the store.
	///
	/// Nested references are resolved innermost first, and resolved values are themselves expanded.
	/// A missing key is logged and substituted with an empty string.
	pub fn replace_in_lines(&self, lines: &mut [String]) {
		for line in lines.iter_mut() {
			let mut expansions = 0;
			while let Some((start, end)) = innermost_token(line, 0) {
				if expansions == MAX_EXPANSIONS_PER_LINE {
					log::warn!("Too many variable expansions, giving up on line: {}", line);
					break;
				}
				expansions += 1;
				let key = &line[start + 2..end - 1];
				let value = match self.get(key) {
					Ok(x) => x.to_owned(),
					Err(e) => {
						log::error!("{}", e);
						String::new()
					}
				};
				line.replace_range(start..end, &value);
			}
		}
	}

	/// Dumps the store at debug level, sorted by key.
	pub fn print(&self) {
		let mut keys = self.vars.keys().collect::<Vec<&String>>();
		keys.sort();
		for key in keys {
			log::debug!("{} = {}", key, self.vars[key]);
		}
	}
}

#[test]
fn test_resolve_fallback() {
	let mut vars = Variables::new();
	vars.set(var_key("xhash", "INCLUDE_DIRS"), "\"source/main/include\"");
	assert_eq!(vars.resolve("INCLUDE_DIRS", "xhash", "win64", "debug"), Ok("\"source/main/include\""));

	vars.set(config_var_key("xhash", "INCLUDE_DIRS", "win64", "debug"), "\"debug/include\"");
	assert_eq!(vars.resolve("INCLUDE_DIRS", "xhash", "win64", "debug"), Ok("\"debug/include\""));
	assert_eq!(vars.resolve("INCLUDE_DIRS", "xhash", "win64", "release"), Ok("\"source/main/include\""));

	let missing = vars.resolve("INCLUDE_DIRS", "xbase", "win64", "debug");
	assert_eq!(missing, Err(VarNotFound { key: "xbase:INCLUDE_DIRS".to_owned() }));
	assert_eq!(vars.resolve_with_default("DEFINES", "xhash", "win64", "debug", "NONE"), "NONE");
}

#[test]
fn test_set_overwrites_and_remove() {
	let mut vars = Variables::new();
	vars.set("Name", "a");
	vars.set("Name", "b");
	assert_eq!(vars.get("Name"), Ok("b"));
	assert_eq!(vars.remove("Name"), Some("b".to_owned()));
	assert!(vars.get("Name").is_err());
	assert!(vars.is_empty());
}

#[test]
fn test_replace_in_lines_nested() {
	let mut vars = Variables::new();
	vars.set("Name", "xbase");
	vars.set("xbase:TYPE", "StaticLibrary");
	vars.set("xbase:SOURCE_DIR", "${xbase:ROOT}/source/main/cpp");
	vars.set("xbase:ROOT", "../xbase");
	let mut lines = vec![
		"local ${Name}_library = ${${Name}:TYPE} {".to_owned(),
		"Sources = { SourceGlob(\"${xbase:SOURCE_DIR}\") },".to_owned(),
		"Missing = \"${nope:GUID}\"".to_owned(),
	];
	vars.replace_in_lines(&mut lines);
	assert_eq!(lines[0], "local xbase_library = StaticLibrary {");
	assert_eq!(lines[1], "Sources = { SourceGlob(\"../xbase/source/main/cpp\") },");
	assert_eq!(lines[2], "Missing = \"\"");
}

#[test]
fn test_replace_in_lines_self_reference_terminates() {
	let mut vars = Variables::new();
	vars.set("loop", "${loop}");
	let mut lines = vec!["${loop}".to_owned()];
	vars.replace_in_lines(&mut lines);
	assert_eq!(lines[0], "${loop}");
}
