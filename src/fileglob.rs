use std::path::Path;

/// Returns the files under `base_path` matching `pattern`, relative to `base_path`.
///
/// Paths use forward slashes and come back sorted. A missing `base_path` yields no files.
pub fn glob_files(base_path: &Path, pattern: &str) -> Result<Vec<String>, String> {
	let pattern = pattern.replace('\\', "/");
	let full_pattern = base_path.join(&pattern);
	let full_pattern = full_pattern.to_string_lossy();
	let entries = match glob::glob(&full_pattern) {
		Ok(x) => x,
		Err(e) => return Err(format!("Invalid glob pattern \"{}\": {}", full_pattern, e)),
	};
	let mut files = Vec::new();
	for entry in entries {
		let path = match entry {
			Ok(x) => x,
			Err(e) => {
				log::warn!("Could not read glob match: {}", e);
				continue;
			}
		};
		if !path.is_file() {
			continue;
		}
		match path.strip_prefix(base_path) {
			Ok(rel) => files.push(rel.to_string_lossy().replace('\\', "/")),
			Err(_) => log::warn!("Glob match outside of base path: \"{}\"", path.display()),
		}
	}
	files.sort();
	log::debug!("glob_files({}, {}): {} files", base_path.display(), pattern, files.len());
	Ok(files)
}

#[test]
fn test_glob_files() {
	use std::fs;

	let dir = tempfile::tempdir().unwrap();
	let cpp_dir = dir.path().join("source").join("main").join("cpp");
	fs::create_dir_all(cpp_dir.join("sub")).unwrap();
	fs::write(cpp_dir.join("b.cpp"), "").unwrap();
	fs::write(cpp_dir.join("a.cpp"), "").unwrap();
	fs::write(cpp_dir.join("notes.txt"), "").unwrap();
	fs::write(cpp_dir.join("sub").join("c.cpp"), "").unwrap();

	let files = glob_files(&cpp_dir, "**/*.cpp").unwrap();
	assert_eq!(files, vec!["a.cpp", "b.cpp", "sub/c.cpp"]);

	let none = glob_files(&dir.path().join("does_not_exist"), "**/*.cpp").unwrap();
	assert!(none.is_empty());
}
