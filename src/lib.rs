mod fileglob;
pub mod flatten;
pub mod generator;
pub mod items;
pub mod manifest;
pub mod platform;
pub mod project;
pub mod replacer;
pub mod uid;
pub mod vars;
pub mod writer;

use std::path::Path;

use generator::Generator;
use project::Package;

pub(crate) fn err_msg<T>(msg: String) -> Result<T, anyhow::Error> {
	Err(anyhow::Error::msg(msg))
}

/// Reads the package description at `manifest_path`.
pub fn load_package(manifest_path: &Path) -> Result<Package, anyhow::Error> {
	manifest::read_manifest(manifest_path)
}

/// Writes the build files for `package` into `root_dir` with `generator`.
pub fn generate(generator: Generator, package: &mut Package, root_dir: &Path) -> Result<(), anyhow::Error> {
	if !root_dir.is_dir() {
		return err_msg(format!("Source directory \"{}\" does not exist", root_dir.display()));
	}
	match generator.generate(package, root_dir) {
		Ok(()) => Ok(()),
		Err(e) => err_msg(e),
	}
}
