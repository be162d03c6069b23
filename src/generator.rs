mod msvc;
mod tundra;

use std::{
	env, //
	iter,
	path::{Component, Path, PathBuf},
};

use crate::{
	flatten::flatten,
	items::{List, OrderedSet},
	project::{Package, Project, ProjectKind, Registry},
	vars::{config_var_key, var_key, Variables},
};

/// Platform/config placeholder for lookups that only want the unqualified value.
pub(crate) const ANY: &str = "*";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VsVersion {
	Vs2012,
	Vs2013,
	Vs2015,
	Vs2017,
}

impl VsVersion {
	pub fn name(&self) -> &'static str {
		match self {
			VsVersion::Vs2012 => "VS2012",
			VsVersion::Vs2013 => "VS2013",
			VsVersion::Vs2015 => "VS2015",
			VsVersion::Vs2017 => "VS2017",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generator {
	Tundra,
	VisualStudio(VsVersion),
}

impl Generator {
	/// Picks a generator for a development environment name, ignoring case.
	pub fn from_dev(dev: &str) -> Option<Generator> {
		match dev.to_ascii_lowercase().as_str() {
			"tundra" => Some(Generator::Tundra),
			"vs2012" => Some(Generator::VisualStudio(VsVersion::Vs2012)),
			"vs2013" => Some(Generator::VisualStudio(VsVersion::Vs2013)),
			"vs2015" => Some(Generator::VisualStudio(VsVersion::Vs2015)),
			"vs2017" => Some(Generator::VisualStudio(VsVersion::Vs2017)),
			_ => None,
		}
	}

	/// Writes the build files for `package` into `root_dir`, the directory of its root project.
	pub fn generate(&self, package: &mut Package, root_dir: &Path) -> Result<(), String> {
		match self {
			Generator::Tundra => tundra::Tundra::generate(package, root_dir),
			Generator::VisualStudio(version) => msvc::Msvc::generate(package, root_dir, *version),
		}
	}
}

/// How a backend wants project settings spelled when they go into the variable store.
pub(crate) struct ProjectSyntax {
	pub kind_name: fn(ProjectKind) -> &'static str,
	pub path: fn(&str) -> String,
	pub list_delimiter: &'static str,
	pub list_quote: &'static str,
}

/// State shared by the backends after the common preparation steps.
pub(crate) struct Run {
	pub root: String,
	pub root_is_app: bool,
	/// Flattened dependencies of the root, first-discovery order.
	pub dependencies: Vec<String>,
	pub variables: Variables,
}

impl Run {
	/// The root followed by its dependencies.
	pub fn project_names(&self) -> impl Iterator<Item = &String> {
		iter::once(&self.root).chain(self.dependencies.iter())
	}
}

pub(crate) fn get_project<'a>(registry: &'a Registry, name: &str) -> Result<&'a Project, String> {
	match registry.get(name) {
		Some(x) => Ok(x),
		None => Err(format!("Unknown project \"{}\"", name)),
	}
}

/// Resolves the root project, flattens its dependencies, sets up paths and fills a fresh
/// variable store with the settings of every project involved.
pub(crate) fn prepare(package: &mut Package, root_dir: &Path, syntax: &ProjectSyntax) -> Result<Run, String> {
	let root = package.root_project()?;
	let root_name = root.name.clone();
	let root_is_app = package.root_is_app();
	let dependencies = flatten(&package.projects, &root_name)
		.iter()
		.map(|x| x.name.clone())
		.collect::<Vec<String>>();

	setup_project_paths(&mut package.projects, &root_name, &dependencies, root_dir)?;

	let mut variables = Variables::new();
	for name in iter::once(&root_name).chain(dependencies.iter()) {
		let project = match package.projects.get_mut(name) {
			Some(x) => x,
			None => return Err(format!("Unknown project \"{}\"", name)),
		};
		project.glob_files()?;
		add_project_variables(project, name != &root_name, syntax, &mut variables);
	}
	variables.print();

	Ok(Run { root: root_name, root_is_app, dependencies, variables })
}

/// Places the root at `root_dir` and every dependency next to it, in a directory named after the
/// dependency. Dependencies from the root's own package (same url) share the root's directory.
/// All generated files go to `root_dir`.
pub(crate) fn setup_project_paths(
	registry: &mut Registry,
	root: &str,
	dependencies: &[String],
	root_dir: &Path,
) -> Result<(), String> {
	let root_dir = normalize_dir(root_dir)?;
	let root_dir = root_dir.as_path();
	let root_url = {
		let root_project = match registry.get_mut(root) {
			Some(x) => x,
			None => return Err(format!("Unknown project \"{}\"", root)),
		};
		root_project.package_path = root_dir.to_owned();
		root_project.project_path = root_dir.to_owned();
		log::info!(
			"PACKAGE: {} - package path: {}, project path: {}",
			root,
			root_dir.display(),
			root_dir.display()
		);
		root_project.url.clone()
	};
	let parent_dir = root_dir.parent().unwrap_or(root_dir);
	for name in dependencies {
		let dep = match registry.get_mut(name) {
			Some(x) => x,
			None => return Err(format!("Unknown project \"{}\"", name)),
		};
		dep.package_path = if !root_url.is_empty() && dep.url == root_url {
			root_dir.to_owned()
		} else {
			parent_dir.join(&dep.name)
		};
		dep.project_path = root_dir.to_owned();
		log::info!(
			"DEPENDENCY: {} - package path: {}, project path: {}",
			dep.name,
			dep.package_path.display(),
			dep.project_path.display()
		);
	}
	Ok(())
}

/// Projects the settings of `project` into `variables`.
///
/// For a project named `xhash` this sets `xhash:GUID`, `xhash:ROOT_DIR`, `xhash:TYPE`,
/// `xhash:SOURCE_DIR`, and `xhash:INCLUDE_DIRS` and `xhash:DEFINES`, the last two both per
/// platform/config and unqualified as the union over all configs. `${Name}` inside include dirs and
/// defines refers to the project itself.
pub(crate) fn add_project_variables(
	project: &mut Project,
	is_dependency: bool,
	syntax: &ProjectSyntax,
	variables: &mut Variables,
) {
	let name = project.name.clone();

	variables.set("Name", &name);
	for platform in project.platforms.iter_mut() {
		for config in platform.configs.iter_mut() {
			config.include_dirs = replace_list_vars(&config.include_dirs, variables);
			config.defines = replace_list_vars(&config.defines, variables);
		}
	}
	variables.remove("Name");

	variables.set(var_key(&name, "GUID"), &project.guid);
	variables.set(var_key(&name, "ROOT_DIR"), (syntax.path)(&project.package_path.to_string_lossy()));
	variables.set(var_key(&name, "TYPE"), (syntax.kind_name)(project.kind));

	let relative = relative_path(&project.project_path, &project.package_path);
	let source_dir = if is_dependency && !relative.is_empty() {
		format!("{}/{}", relative, project.source_dir())
	} else {
		project.source_dir().to_owned()
	};
	variables.set(var_key(&name, "SOURCE_DIR"), (syntax.path)(&source_dir));

	let mut all_includes = List::new(syntax.list_delimiter, syntax.list_quote);
	let mut all_defines = List::new(syntax.list_delimiter, "");
	for platform in project.platforms.iter() {
		for config in &platform.configs {
			let includes = config.include_dirs.prefix(&relative, syntax.path);
			variables.set(
				config_var_key(&name, "INCLUDE_DIRS", &platform.name, &config.name),
				includes.render(syntax.list_delimiter, syntax.list_quote),
			);
			all_includes = all_includes.extend(includes.iter().cloned());

			variables.set(
				config_var_key(&name, "DEFINES", &platform.name, &config.name),
				config.defines.render(syntax.list_delimiter, ""),
			);
			all_defines = all_defines.extend(config.defines.iter().cloned());
		}
	}
	variables.set(var_key(&name, "INCLUDE_DIRS"), all_includes.to_set().render(syntax.list_delimiter, syntax.list_quote));
	variables.set(var_key(&name, "DEFINES"), all_defines.to_set().render(syntax.list_delimiter, ""));
}

fn replace_list_vars(list: &List, variables: &Variables) -> List {
	let mut items = list.iter().cloned().collect::<Vec<String>>();
	variables.replace_in_lines(&mut items);
	List::from_items(items, &list.delimiter, &list.quote)
}

/// Unions the `attribute` values of `project` and of its direct dependencies into an ordered set,
/// so public settings propagate one level. Values are looked up for `platform`/`config` with
/// fallback to the unqualified value; pass [`ANY`] for the unqualified value only.
pub(crate) fn gather(
	variables: &Variables,
	attribute: &str,
	project: &Project,
	platform: &str,
	config: &str,
	delimiter: &str,
) -> OrderedSet {
	let mut list = List::new(delimiter, "");
	for name in iter::once(&project.name).chain(project.dependencies.iter()) {
		match variables.resolve(attribute, name, platform, config) {
			Ok(value) if !value.is_empty() => list = list.add(value),
			Ok(_) => {}
			Err(e) => log::error!("{}", e),
		}
	}
	list.to_set()
}

/// Path from `from` to `to` using `/`, empty when both are the same directory.
pub(crate) fn relative_path(from: &Path, to: &Path) -> String {
	let from = normal_components(from);
	let to = normal_components(to);
	let common = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();
	let mut parts = vec!["..".to_owned(); from.len() - common];
	parts.extend(to[common..].iter().cloned());
	parts.join("/")
}

/// `path` made absolute against the working directory, with `.` and `..` resolved lexically, so
/// that its parent is the directory that really contains it.
fn normalize_dir(path: &Path) -> Result<PathBuf, String> {
	let absolute = if path.is_absolute() {
		path.to_owned()
	} else {
		match env::current_dir() {
			Ok(x) => x.join(path),
			Err(e) => return Err(format!("Error getting cwd: {}", e)),
		}
	};
	Ok(normal_components(&absolute).iter().collect())
}

fn normal_components(path: &Path) -> Vec<String> {
	let mut parts: Vec<String> = Vec::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				let last = parts.last().map(|x| (x == "..", Path::new(x).has_root()));
				match last {
					Some((false, false)) => {
						parts.pop();
					}
					// `..` of the root is the root
					Some((false, true)) => {}
					Some((true, _)) | None => parts.push("..".to_owned()),
				}
			}
			other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
		}
	}
	parts
}

#[test]
fn test_from_dev() {
	assert_eq!(Generator::from_dev("Tundra"), Some(Generator::Tundra));
	assert_eq!(Generator::from_dev("TUNDRA"), Some(Generator::Tundra));
	assert_eq!(Generator::from_dev("vs2017"), Some(Generator::VisualStudio(VsVersion::Vs2017)));
	assert_eq!(Generator::from_dev("VS2012"), Some(Generator::VisualStudio(VsVersion::Vs2012)));
	assert_eq!(Generator::from_dev("xcode"), None);
}

#[test]
fn test_relative_path() {
	assert_eq!(relative_path(Path::new("/w/xhash"), Path::new("/w/xhash")), "");
	assert_eq!(relative_path(Path::new("/w/xhash"), Path::new("/w/xbase")), "../xbase");
	assert_eq!(relative_path(Path::new("/w/a/b"), Path::new("/w/c")), "../../c");
	assert_eq!(relative_path(Path::new("/w/xhash/."), Path::new("/w/xhash/../xbase")), "../xbase");
}

#[test]
fn test_setup_project_paths_normalizes_root() {
	let mut registry = Registry::new();
	let mut app = Project::cpp_app("app", "github.com/x/app");
	app.dependencies = vec!["libA".to_owned(), "app_lib".to_owned()];
	registry.insert(app);
	registry.insert(Project::cpp_lib("libA", "github.com/x/libA"));
	registry.insert(Project::cpp_lib("app_lib", "github.com/x/app"));
	let deps = vec!["libA".to_owned(), "app_lib".to_owned()];
	setup_project_paths(&mut registry, "app", &deps, Path::new("/w/app/sub/..")).unwrap();

	let app = registry.get("app").unwrap();
	assert_eq!(app.package_path, Path::new("/w/app"));
	assert_eq!(app.project_path, Path::new("/w/app"));
	assert_eq!(registry.get("libA").unwrap().package_path, Path::new("/w/libA"));
	assert_eq!(registry.get("libA").unwrap().project_path, Path::new("/w/app"));
	assert_eq!(registry.get("app_lib").unwrap().package_path, Path::new("/w/app"));

	assert_eq!(normalize_dir(Path::new("/w/./a/b/../c")).unwrap(), Path::new("/w/a/c"));
	assert_eq!(normalize_dir(Path::new("/..")).unwrap(), Path::new("/"));
	assert!(normalize_dir(Path::new("rel")).unwrap().is_absolute());
}

#[cfg(test)]
fn test_syntax() -> ProjectSyntax {
	ProjectSyntax {
		kind_name: |kind| match kind {
			ProjectKind::StaticLibrary => "lib",
			ProjectKind::SharedLibrary => "dll",
			ProjectKind::Executable => "exe",
		},
		path: crate::items::fix_path,
		list_delimiter: ",",
		list_quote: "\"",
	}
}

#[test]
fn test_add_project_variables() {
	use crate::platform::Config;

	let mut project = Project::cpp_lib("xbase", "github.com/x/xbase");
	project.package_path = PathBuf::from("/w/xbase");
	project.project_path = PathBuf::from("/w/xhash");
	let win64 = project.platforms.entry("win64");
	let debug = win64.config_entry("debug");
	debug.include_dirs = debug.include_dirs.clone().add("generated/${Name}");
	debug.defines = debug.defines.clone().add("${Name}_DEBUG");
	win64.configs.push(Config::new("profile"));

	let mut variables = Variables::new();
	add_project_variables(&mut project, true, &test_syntax(), &mut variables);

	assert!(variables.get("Name").is_err());
	assert_eq!(variables.get("xbase:TYPE"), Ok("lib"));
	assert_eq!(variables.get("xbase:ROOT_DIR"), Ok("/w/xbase"));
	assert_eq!(variables.get("xbase:SOURCE_DIR"), Ok("../xbase/source/main/cpp"));
	assert_eq!(
		variables.resolve("INCLUDE_DIRS", "xbase", "win64", "debug"),
		Ok(r#""../xbase/source/main/include","../xbase/generated/xbase""#)
	);
	assert_eq!(variables.resolve("INCLUDE_DIRS", "xbase", "win64", "release"), Ok(r#""../xbase/source/main/include""#));
	assert_eq!(variables.resolve("INCLUDE_DIRS", "xbase", "win64", "profile"), Ok(""));
	assert_eq!(variables.get("xbase:INCLUDE_DIRS"), Ok(r#""../xbase/source/main/include","../xbase/generated/xbase""#));
	assert_eq!(variables.resolve("DEFINES", "xbase", "win64", "debug"), Ok("xbase_DEBUG"));
	assert_eq!(variables.resolve("DEFINES", "xbase", ANY, ANY), Ok("xbase_DEBUG"));
	assert_eq!(variables.get("xbase:GUID"), Ok(crate::uid::new_guid("xbase").as_str()));
}

#[test]
fn test_gather_dedups_and_reports_missing() {
	let mut variables = Variables::new();
	variables.set("app:INCLUDE_DIRS", r#""source/main/include""#);
	variables.set("libA:INCLUDE_DIRS", r#""../libA/source/main/include""#);
	variables.set("libB:INCLUDE_DIRS", r#""../libA/source/main/include""#);
	let mut app = Project::cpp_app("app", "");
	app.dependencies = vec!["libA".to_owned(), "libB".to_owned(), "libC".to_owned()];
	let set = gather(&variables, "INCLUDE_DIRS", &app, ANY, ANY, ",");
	assert_eq!(set.render(",", ""), r#""source/main/include","../libA/source/main/include""#);
}
