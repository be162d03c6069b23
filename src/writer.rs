use std::{
	fs,
	io::{BufWriter, Write}, //
	path::{Path, PathBuf},
};

/// Text sink for one generated file.
///
/// Content goes to a temporary file next to the target and only replaces the target on
/// [`TextWriter::close`]. If the writer is dropped without being closed, e.g. because generation
/// failed half way, the temporary file is removed and the target is left untouched.
///
/// Leading `+` characters of a line are written as tabs, one tab per `+`.
pub struct TextWriter {
	path: PathBuf,
	tmp_path: PathBuf,
	out: Option<BufWriter<fs::File>>,
}

impl TextWriter {
	pub fn open(path: &Path) -> Result<Self, String> {
		let file_name = match path.file_name() {
			Some(x) => x.to_string_lossy().into_owned(),
			None => return Err(format!("Error opening file \"{}\": not a file path", path.display())),
		};
		let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));
		let file = match fs::File::create(&tmp_path) {
			Ok(x) => x,
			Err(e) => return Err(format!("Error opening file \"{}\": {}", path.display(), e)),
		};
		Ok(TextWriter { path: path.to_owned(), tmp_path, out: Some(BufWriter::new(file)) })
	}

	pub fn write_ln(&mut self, line: &str) -> Result<(), String> {
		let Some(out) = self.out.as_mut() else {
			return Err(format!("Error writing to \"{}\": file already closed", self.path.display()));
		};
		let body = line.trim_start_matches('+');
		let mut text = "\t".repeat(line.len() - body.len());
		text += body;
		text.push('\n');
		match out.write_all(text.as_bytes()) {
			Ok(()) => Ok(()),
			Err(e) => Err(format!("Error writing to \"{}\": {}", self.path.display(), e)),
		}
	}

	pub fn write_lns<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), String> {
		for line in lines {
			self.write_ln(line.as_ref())?;
		}
		Ok(())
	}

	/// Flushes the content to the temporary file and checks that the target can be replaced.
	///
	/// On error the writer stays open, so dropping it still removes the temporary file.
	pub fn finish(&mut self) -> Result<(), String> {
		let Some(out) = self.out.as_mut() else {
			return Err(format!("Error writing to \"{}\": file already closed", self.path.display()));
		};
		if let Err(e) = out.flush() {
			return Err(format!("Error writing to \"{}\": {}", self.path.display(), e));
		}
		if let Err(e) = out.get_ref().sync_all() {
			return Err(format!("Error writing to \"{}\": {}", self.path.display(), e));
		}
		if self.path.is_dir() {
			return Err(format!("Error creating file at \"{}\": target is a directory", self.path.display()));
		}
		Ok(())
	}

	/// Flushes the content and moves it into place.
	pub fn close(mut self) -> Result<(), String> {
		self.finish()?;
		let Some(out) = self.out.take() else {
			return Ok(());
		};
		let result = match out.into_inner() {
			Ok(file) => {
				drop(file);
				match fs::rename(&self.tmp_path, &self.path) {
					Ok(()) => Ok(()),
					Err(e) => Err(format!("Error creating file at \"{}\": {}", self.path.display(), e)),
				}
			}
			Err(e) => Err(format!("Error writing to \"{}\": {}", self.path.display(), e.error())),
		};
		match result {
			Ok(()) => log::info!("Wrote {}", self.path.display()),
			Err(_) => self.remove_tmp(),
		}
		result
	}

	fn remove_tmp(&self) {
		if let Err(e) = fs::remove_file(&self.tmp_path) {
			log::warn!("Could not remove \"{}\": {}", self.tmp_path.display(), e);
		}
	}
}

impl Drop for TextWriter {
	fn drop(&mut self) {
		if let Some(out) = self.out.take() {
			drop(out);
			self.remove_tmp();
		}
	}
}

#[test]
fn test_writer_commits_on_close() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("tundra.lua");
	let mut writer = TextWriter::open(&path).unwrap();
	writer.write_ln("Build {").unwrap();
	writer.write_lns(&["+Units = {", "++x = 1,", "+},"]).unwrap();
	assert!(!path.exists());
	writer.write_ln("}").unwrap();
	writer.close().unwrap();
	assert_eq!(fs::read_to_string(&path).unwrap(), "Build {\n\tUnits = {\n\t\tx = 1,\n\t},\n}\n");
	assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_writer_drop_discards() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("out.sln");
	fs::write(&path, "previous").unwrap();
	{
		let mut writer = TextWriter::open(&path).unwrap();
		writer.write_ln("partial").unwrap();
	}
	assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
	assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_writer_open_fails_for_missing_dir() {
	let dir = tempfile::tempdir().unwrap();
	assert!(TextWriter::open(&dir.path().join("missing").join("x.lua")).is_err());
}

#[test]
fn test_writer_failed_close_removes_tmp() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("out.lua");
	fs::create_dir(&path).unwrap();
	let mut writer = TextWriter::open(&path).unwrap();
	writer.write_ln("Build {").unwrap();
	assert!(writer.finish().is_err());
	assert!(writer.close().is_err());
	let names = fs::read_dir(dir.path()).unwrap().map(|x| x.unwrap().file_name()).collect::<Vec<_>>();
	assert_eq!(names, vec!["out.lua"]);
	assert!(path.is_dir());
}
