use std::{
	collections::BTreeMap, //
	fs,
	path::Path,
};

use serde::Deserialize;

use crate::{
	err_msg,
	project::{Files, Package, Project, ProjectKind, Registry},
};

pub const XGEN_TOML: &str = "xgen.toml";

#[derive(Debug, Deserialize)]
struct Manifest {
	package: PackageManifest,
	projects: BTreeMap<String, ProjectManifest>,
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
	name: String,
	app: Option<String>,
	unittest: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KindManifest {
	StaticLibrary,
	SharedLibrary,
	Executable,
}

#[derive(Debug, Deserialize)]
struct ProjectManifest {
	kind: KindManifest,
	url: Option<String>,
	language: Option<String>,
	sources: Option<Vec<String>>,
	headers: Option<Vec<String>>,
	#[serde(default)]
	dependencies: Vec<String>,
	/// platform -> config -> settings
	#[serde(default)]
	platforms: BTreeMap<String, BTreeMap<String, ConfigManifest>>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigManifest {
	#[serde(default)]
	include_dirs: Vec<String>,
	#[serde(default)]
	defines: Vec<String>,
}

pub fn read_manifest(path: &Path) -> Result<Package, anyhow::Error> {
	let content = match fs::read_to_string(path) {
		Ok(x) => x,
		Err(e) => return err_msg(format!("Error opening {}: {}", path.display(), e)),
	};
	match parse_manifest(&content) {
		Ok(x) => Ok(x),
		Err(e) => err_msg(format!("Error reading {}: {}", path.display(), e)),
	}
}

/// Builds a [`Package`] from the text of an `xgen.toml`.
///
/// Projects start from the default layout for their kind. An executable named as the package's
/// `unittest` gets the unit-test layout. Settings under `platforms` are added on top of the
/// defaults.
pub fn parse_manifest(content: &str) -> Result<Package, anyhow::Error> {
	let manifest = toml::from_str::<Manifest>(content)?;

	let mut registry = Registry::new();
	for (name, info) in &manifest.projects {
		let url = info.url.as_deref().unwrap_or("");
		let is_unittest = manifest.package.unittest.as_deref() == Some(name.as_str());
		let mut project = match info.kind {
			KindManifest::StaticLibrary => Project::cpp_lib(name, url),
			KindManifest::SharedLibrary => {
				let mut project = Project::cpp_lib(name, url);
				project.kind = ProjectKind::SharedLibrary;
				project
			}
			KindManifest::Executable if is_unittest => Project::cpp_test(name, url),
			KindManifest::Executable => Project::cpp_app(name, url),
		};
		if let Some(language) = &info.language {
			project.language = language.clone();
		}
		if let Some(sources) = &info.sources {
			project.src_files = Files::new(&sources.iter().map(String::as_str).collect::<Vec<&str>>());
		}
		if let Some(headers) = &info.headers {
			project.hdr_files = Files::new(&headers.iter().map(String::as_str).collect::<Vec<&str>>());
		}
		project.dependencies = info.dependencies.clone();
		for (platform_name, configs) in &info.platforms {
			let platform = project.platforms.entry(platform_name);
			for (config_name, settings) in configs {
				let config = platform.config_entry(config_name);
				config.include_dirs = config.include_dirs.clone().extend(settings.include_dirs.iter());
				config.defines = config.defines.clone().extend(settings.defines.iter());
			}
		}
		registry.insert(project);
	}

	for (role, name) in [("app", &manifest.package.app), ("unittest", &manifest.package.unittest)] {
		if let Some(name) = name {
			if !registry.contains(name) {
				return err_msg(format!("Package {} \"{}\" is not one of the listed projects", role, name));
			}
		}
	}
	if let Err(e) = registry.validate() {
		return err_msg(e);
	}
	if let Some(cycle) = registry.find_cycle() {
		return err_msg(format!("Dependency cycle: {}", cycle.join(" -> ")));
	}

	let mut package = Package::new(&manifest.package.name, registry);
	package.main_app = manifest.package.app;
	package.unittest = manifest.package.unittest;
	log::debug!("Loaded package \"{}\" with {} projects", package.name, package.projects.len());
	Ok(package)
}

#[test]
fn test_parse_manifest() {
	let package = parse_manifest(
		r#"
[package]
name = "xhash"
app = "xhash_app"
unittest = "xhash_test"

[projects.xhash]
kind = "static_library"
url = "github.com/jurgen-kluft/xhash"
dependencies = ["xbase"]

[projects.xhash.platforms.win64.debug]
include_dirs = ["generated/${Name}"]
defines = ["XHASH_DEBUG"]

[projects.xbase]
kind = "shared_library"
sources = ["src/^*.c"]

[projects.xhash_app]
kind = "executable"
dependencies = ["xhash"]

[projects.xhash_test]
kind = "executable"
dependencies = ["xhash"]
"#,
	)
	.unwrap();

	assert_eq!(package.name, "xhash");
	assert_eq!(package.root_project().unwrap().name, "xhash_app");
	assert_eq!(package.projects.len(), 4);

	let xhash = package.projects.get("xhash").unwrap();
	assert_eq!(xhash.kind, ProjectKind::StaticLibrary);
	assert_eq!(xhash.url, "github.com/jurgen-kluft/xhash");
	assert_eq!(xhash.dependencies, vec!["xbase"]);
	let debug = xhash.platforms.get("win64").unwrap().get_config("debug").unwrap();
	assert_eq!(debug.include_dirs.iter().collect::<Vec<&String>>(), vec!["source/main/include", "generated/${Name}"]);
	assert_eq!(debug.defines.iter().collect::<Vec<&String>>(), vec!["XHASH_DEBUG"]);
	let release = xhash.platforms.get("win64").unwrap().get_config("release").unwrap();
	assert!(release.defines.is_empty());

	let xbase = package.projects.get("xbase").unwrap();
	assert_eq!(xbase.kind, ProjectKind::SharedLibrary);
	assert_eq!(xbase.source_dir(), "src");
	assert_eq!(xbase.language, "C++");

	let test = package.projects.get("xhash_test").unwrap();
	assert_eq!(test.source_dir(), "source/test/cpp");
	assert_eq!(package.projects.get("xhash_app").unwrap().source_dir(), "source/main/cpp");
}

#[test]
fn test_parse_manifest_rejects_bad_graphs() {
	let unknown_dep = r#"
[package]
name = "p"
app = "a"

[projects.a]
kind = "executable"
dependencies = ["missing"]
"#;
	let err = parse_manifest(unknown_dep).unwrap_err();
	assert_eq!(err.to_string(), "Project \"a\" depends on unknown project \"missing\"");

	let unknown_app = r#"
[package]
name = "p"
app = "nope"

[projects.a]
kind = "executable"
"#;
	assert!(parse_manifest(unknown_app).is_err());

	let cycle = r#"
[package]
name = "p"
app = "a"

[projects.a]
kind = "executable"
dependencies = ["b"]

[projects.b]
kind = "static_library"
dependencies = ["a"]
"#;
	let err = parse_manifest(cycle).unwrap_err();
	assert_eq!(err.to_string(), "Dependency cycle: a -> b -> a");

	assert!(parse_manifest("[package]\nname = \"p\"\n[projects.a]\nkind = \"plugin\"\n").is_err());
}
