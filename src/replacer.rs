//! Line based placeholder substitution for templates.
//!
//! Templates are held as a `Vec<String>`, one entry per output line. A placeholder is written
//! as `${TOKEN}` and the functions here always take the full placeholder text, braces included.

/// Substitutes every occurrence of `token` with `literal` in all lines.
pub fn replace_in_lines(token: &str, literal: &str, lines: &mut [String]) {
	for line in lines.iter_mut() {
		if line.contains(token) {
			*line = line.replace(token, literal);
		}
	}
}

/// Replaces `token` with a block that may span several lines.
///
/// A line holding `token` is split around it: the text before the token is kept in front of the
/// first block line, the text after it is appended to the last block line. `joiner` terminates every
/// block line except the last one, so list syntax stays valid across the split.
pub fn insert_in_lines(token: &str, block: &str, joiner: &str, lines: &mut Vec<String>) {
	let block_lines = block.split('\n').collect::<Vec<&str>>();
	let mut out = Vec::with_capacity(lines.len() + block_lines.len());
	for line in lines.drain(..) {
		let Some(pos) = line.find(token) else {
			out.push(line);
			continue;
		};
		let head = &line[..pos];
		let tail = &line[pos + token.len()..];
		let last = block_lines.len() - 1;
		for (i, block_line) in block_lines.iter().enumerate() {
			let mut new_line = String::new();
			if i == 0 {
				new_line += head;
			}
			new_line += block_line;
			if i == last {
				new_line += tail;
			} else {
				new_line += joiner;
			}
			out.push(new_line);
		}
	}
	*lines = out;
}

/// Finds the innermost `${...}` placeholder at or after `from`.
///
/// Returns the byte range of the whole placeholder, so nested references such as
/// `${${Name}:TYPE}` resolve from the inside out.
pub(crate) fn innermost_token(line: &str, from: usize) -> Option<(usize, usize)> {
	let mut search = from;
	while let Some(close) = line[search..].find('}').map(|x| x + search) {
		if let Some(open) = line[from..close].rfind("${").map(|x| x + from) {
			return Some((open, close + 1));
		}
		search = close + 1;
	}
	None
}

#[test]
fn test_replace_in_lines() {
	let mut lines = vec!["Name = \"${Name}\",".to_owned(), "${Name}_library ${Name}".to_owned(), "-".to_owned()];
	replace_in_lines("${Name}", "xbase", &mut lines);
	assert_eq!(lines, vec!["Name = \"xbase\",", "xbase_library xbase", "-"]);
}

#[test]
fn test_insert_single_line_block() {
	let mut lines = vec!["Includes = { ${INCLUDE_DIRS} },".to_owned()];
	insert_in_lines("${INCLUDE_DIRS}", r#""a","b""#, "", &mut lines);
	assert_eq!(lines, vec![r#"Includes = { "a","b" },"#]);
}

#[test]
fn test_insert_multi_line_block() {
	let mut lines = vec!["{".to_owned(), "  Includes = { ${INCLUDE_DIRS} },".to_owned(), "}".to_owned()];
	insert_in_lines("${INCLUDE_DIRS}", "\"a\"\n\"b\"\n\"c\"", ",", &mut lines);
	assert_eq!(lines, vec!["{", "  Includes = { \"a\",", "\"b\",", "\"c\" },", "}"]);
}

#[test]
fn test_innermost_token() {
	let line = "x ${${Name}:TYPE} y";
	let (start, end) = innermost_token(line, 0).unwrap();
	assert_eq!(&line[start..end], "${Name}");
	assert_eq!(innermost_token("no tokens } here", 0), None);
	assert_eq!(innermost_token("} ${A}", 0), Some((2, 6)));
}
