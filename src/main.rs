use std::{
	env, //
	process::ExitCode,
};

use clap::{Arg, Command};

use xgen::{generator::Generator, manifest::XGEN_TOML};

const SOURCE_DIR: &str = "source-dir";
const GENERATOR: &str = "generator";
const MANIFEST: &str = "manifest";

fn command() -> Command {
	Command::new("xgen")
		.about("Generates Tundra and Visual Studio build files for a package and its dependencies")
		.arg(
			Arg::new(SOURCE_DIR)
				.short('S')
				.long(SOURCE_DIR)
				.value_name("path-to-source")
				.default_value(".")
				.help("Directory of the package to generate for"),
		)
		.arg(
			Arg::new(GENERATOR)
				.short('G')
				.long(GENERATOR)
				.value_name("generator-name")
				.required(true)
				.help("Build system to generate for: tundra, vs2012, vs2013, vs2015 or vs2017"),
		)
		.arg(
			Arg::new(MANIFEST)
				.short('M')
				.long(MANIFEST)
				.value_name("path-to-manifest")
				.help("Package description, defaults to xgen.toml in the source directory"),
		)
}

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().filter_or("XGEN_LOG", "off"))
		.format_timestamp(None)
		.init();

	let matches = match command().try_get_matches() {
		Ok(x) => x,
		Err(e) => {
			let _ = e.print();
			return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
		}
	};

	let src_dir = matches.get_one::<String>(SOURCE_DIR).cloned().unwrap_or_else(|| ".".to_owned());
	let generator_str = matches.get_one::<String>(GENERATOR).cloned().unwrap_or_default();

	let generator = match Generator::from_dev(&generator_str) {
		Some(x) => x,
		None => {
			println!("Error: Not a valid generator '{}'", generator_str);
			return ExitCode::FAILURE;
		}
	};

	let current_dir = match env::current_dir() {
		Ok(x) => x,
		Err(e) => {
			println!("Error getting cwd: {}", e);
			return ExitCode::FAILURE;
		}
	};
	let src_path = current_dir.join(&src_dir);
	let manifest_path = match matches.get_one::<String>(MANIFEST) {
		Some(x) => current_dir.join(x),
		None => src_path.join(XGEN_TOML),
	};

	println!("source-dir: {}", src_path.display());
	println!("  manifest: {}", manifest_path.display());
	println!(" generator: {}", generator_str);

	let mut package = match xgen::load_package(&manifest_path) {
		Ok(x) => x,
		Err(e) => {
			println!("{}", e);
			return ExitCode::FAILURE;
		}
	};

	if let Err(e) = xgen::generate(generator, &mut package, &src_path) {
		println!("{}", e);
		return ExitCode::FAILURE;
	}

	ExitCode::SUCCESS
}

#[test]
fn test_command() {
	command().debug_assert();
	let matches = command().try_get_matches_from(["xgen", "-G", "VS2017"]).unwrap();
	assert_eq!(matches.get_one::<String>(SOURCE_DIR).unwrap(), ".");
	assert_eq!(matches.get_one::<String>(GENERATOR).unwrap(), "VS2017");
	assert!(matches.get_one::<String>(MANIFEST).is_none());
	assert!(command().try_get_matches_from(["xgen"]).is_err());
}
