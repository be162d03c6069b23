use std::{
	collections::HashMap, //
	path::{Path, PathBuf},
};

use crate::{
	fileglob::glob_files, //
	platform::PlatformSet,
	uid,
};

pub const CPP_LANGUAGE: &str = "C++";

pub const DEFAULT_MAIN_SOURCE_PATH: &str = "source/main/cpp/^**/*.cpp";
pub const DEFAULT_TEST_SOURCE_PATH: &str = "source/test/cpp/^**/*.cpp";
pub const DEFAULT_MAIN_INCLUDE_PATH: &str = "source/main/include/^**/*.h";
pub const DEFAULT_TEST_INCLUDE_PATH: &str = "source/test/include/^**/*.h";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectKind {
	StaticLibrary,
	SharedLibrary,
	Executable,
}

/// Glob patterns of a file set plus what they resolved to.
///
/// A glob path is split on `^`: the part before it is the directory to search from, the part after
/// it the pattern. Resolved files keep the directory part.
#[derive(Clone, Debug, Default)]
pub struct Files {
	pub glob_paths: Vec<String>,
	pub virtual_paths: Vec<String>,
	pub files: Vec<String>,
}

impl Files {
	pub fn new(glob_paths: &[&str]) -> Self {
		Files { glob_paths: glob_paths.iter().map(|x| x.to_string()).collect(), ..Default::default() }
	}

	/// Directory part of the first glob path.
	pub fn base_dir(&self) -> &str {
		match self.glob_paths.first() {
			Some(x) => x.split('^').next().unwrap_or("").trim_end_matches('/'),
			None => "",
		}
	}

	pub fn glob_files(&mut self, dir_path: &Path) -> Result<(), String> {
		let mut files = Vec::new();
		for glob_path in &self.glob_paths {
			let (base, pattern) = match glob_path.split_once('^') {
				Some(x) => x,
				None => ("", glob_path.as_str()),
			};
			let base = base.trim_end_matches('/');
			for file in glob_files(&dir_path.join(base), pattern)? {
				let file = if base.is_empty() { file } else { format!("{}/{}", base, file) };
				if !files.contains(&file) {
					files.push(file);
				}
			}
		}
		// Every directory level that holds a file, parents before children
		let mut virtual_paths: Vec<String> = Vec::new();
		for file in &files {
			let mut dir = String::new();
			let parts = file.split('/').collect::<Vec<&str>>();
			for part in &parts[..parts.len() - 1] {
				if !dir.is_empty() {
					dir.push('/');
				}
				dir += part;
				if !virtual_paths.contains(&dir) {
					virtual_paths.push(dir.clone());
				}
			}
		}
		self.files = files;
		self.virtual_paths = virtual_paths;
		Ok(())
	}
}

#[derive(Clone, Debug)]
pub struct Project {
	pub name: String,
	pub guid: String,
	pub url: String,
	pub language: String,
	pub kind: ProjectKind,
	/// Where the project lives on disk.
	pub package_path: PathBuf,
	/// Where the generated files go. Shared by every project of a run.
	pub project_path: PathBuf,
	pub platforms: PlatformSet,
	pub hdr_files: Files,
	pub src_files: Files,
	/// Names of the projects this one links against.
	pub dependencies: Vec<String>,
}

impl Project {
	pub fn new(name: &str, url: &str, kind: ProjectKind) -> Self {
		Project {
			name: name.to_owned(),
			guid: uid::new_guid(name),
			url: url.to_owned(),
			language: CPP_LANGUAGE.to_owned(),
			kind,
			package_path: PathBuf::new(),
			project_path: PathBuf::new(),
			platforms: PlatformSet::new(),
			hdr_files: Files::default(),
			src_files: Files::default(),
			dependencies: Vec::new(),
		}
	}

	pub fn cpp_lib(name: &str, url: &str) -> Self {
		let mut project = Project::new(name, url, ProjectKind::StaticLibrary);
		project.src_files = Files::new(&[DEFAULT_MAIN_SOURCE_PATH]);
		project.hdr_files = Files::new(&[DEFAULT_MAIN_INCLUDE_PATH]);
		project.platforms = PlatformSet::with_defaults(&["source/main/include"]);
		project
	}

	pub fn cpp_app(name: &str, url: &str) -> Self {
		let mut project = Project::new(name, url, ProjectKind::Executable);
		project.src_files = Files::new(&[DEFAULT_MAIN_SOURCE_PATH]);
		project.hdr_files = Files::new(&[DEFAULT_MAIN_INCLUDE_PATH]);
		project.platforms = PlatformSet::with_defaults(&["source/main/include"]);
		project
	}

	pub fn cpp_test(name: &str, url: &str) -> Self {
		let mut project = Project::new(name, url, ProjectKind::Executable);
		project.src_files = Files::new(&[DEFAULT_TEST_SOURCE_PATH]);
		project.hdr_files = Files::new(&[DEFAULT_MAIN_INCLUDE_PATH, DEFAULT_TEST_INCLUDE_PATH]);
		project.platforms = PlatformSet::with_defaults(&["source/main/include", "source/test/include"]);
		project
	}

	/// Source directory relative to the package path.
	pub fn source_dir(&self) -> &str {
		self.src_files.base_dir()
	}

	pub fn glob_files(&mut self) -> Result<(), String> {
		let package_path = self.package_path.clone();
		self.src_files.glob_files(&package_path)?;
		self.hdr_files.glob_files(&package_path)
	}
}

/// Every project known to a run, keyed by name.
///
/// Dependencies are stored as names and resolved through the registry, which keeps the graph free
/// of ownership cycles.
#[derive(Clone, Debug, Default)]
pub struct Registry {
	projects: Vec<Project>,
	index: HashMap<String, usize>,
}

impl Registry {
	pub fn new() -> Self {
		Registry { projects: Vec::new(), index: HashMap::new() }
	}

	/// Adds `project`, replacing one with the same name.
	pub fn insert(&mut self, project: Project) {
		match self.index.get(&project.name) {
			Some(&i) => self.projects[i] = project,
			None => {
				self.index.insert(project.name.clone(), self.projects.len());
				self.projects.push(project);
			}
		}
	}

	pub fn get(&self, name: &str) -> Option<&Project> {
		self.index.get(name).map(|&i| &self.projects[i])
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut Project> {
		match self.index.get(name) {
			Some(&i) => Some(&mut self.projects[i]),
			None => None,
		}
	}

	pub fn contains(&self, name: &str) -> bool {
		self.index.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.projects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.projects.is_empty()
	}

	/// Checks that every dependency name refers to a registered project.
	pub fn validate(&self) -> Result<(), String> {
		for project in &self.projects {
			for dep in &project.dependencies {
				if !self.contains(dep) {
					return Err(format!("Project \"{}\" depends on unknown project \"{}\"", project.name, dep));
				}
			}
		}
		Ok(())
	}

	/// Returns a dependency cycle as a list of names if the graph has one.
	pub fn find_cycle(&self) -> Option<Vec<String>> {
		#[derive(Clone, Copy, PartialEq)]
		enum Mark {
			New,
			Active,
			Done,
		}
		let mut marks = vec![Mark::New; self.projects.len()];
		for start in 0..self.projects.len() {
			if marks[start] != Mark::New {
				continue;
			}
			// (project index, next dependency to look at)
			let mut stack = vec![(start, 0)];
			marks[start] = Mark::Active;
			while let Some(top) = stack.last_mut() {
				let (current, next) = *top;
				let deps = &self.projects[current].dependencies;
				if next == deps.len() {
					marks[current] = Mark::Done;
					stack.pop();
					continue;
				}
				top.1 += 1;
				let dep_name = &deps[next];
				let Some(&dep) = self.index.get(dep_name) else {
					continue;
				};
				match marks[dep] {
					Mark::New => {
						marks[dep] = Mark::Active;
						stack.push((dep, 0));
					}
					Mark::Active => {
						let from = stack.iter().position(|x| x.0 == dep).unwrap_or(0);
						let mut cycle =
							stack[from..].iter().map(|x| self.projects[x.0].name.clone()).collect::<Vec<String>>();
						cycle.push(self.projects[dep].name.clone());
						return Some(cycle);
					}
					Mark::Done => {}
				}
			}
		}
		None
	}
}

/// Designates which project of a registry is the application and which the unit-test executable.
#[derive(Clone, Debug)]
pub struct Package {
	pub name: String,
	pub main_app: Option<String>,
	pub unittest: Option<String>,
	pub projects: Registry,
}

impl Package {
	pub fn new(name: &str, projects: Registry) -> Self {
		Package { name: name.to_owned(), main_app: None, unittest: None, projects }
	}

	pub fn get_main_app(&self) -> Option<&Project> {
		self.main_app.as_ref().and_then(|x| self.projects.get(x))
	}

	pub fn get_unittest(&self) -> Option<&Project> {
		self.unittest.as_ref().and_then(|x| self.projects.get(x))
	}

	/// The project a run is generated for. Prefers the application over the unit-test executable.
	pub fn root_project(&self) -> Result<&Project, String> {
		match self.get_main_app().or_else(|| self.get_unittest()) {
			Some(x) => Ok(x),
			None => Err(format!("Package \"{}\" has no main app or main test", self.name)),
		}
	}

	/// True when the root project is the application rather than the unit-test executable.
	pub fn root_is_app(&self) -> bool {
		self.get_main_app().is_some()
	}
}

#[test]
fn test_root_project_prefers_app() {
	let mut registry = Registry::new();
	registry.insert(Project::cpp_app("xhash_app", "github.com/x"));
	registry.insert(Project::cpp_test("xhash_test", "github.com/x"));
	let mut package = Package::new("xhash", registry);
	assert!(package.root_project().is_err());

	package.unittest = Some("xhash_test".to_owned());
	assert_eq!(package.root_project().unwrap().name, "xhash_test");
	assert!(!package.root_is_app());

	package.main_app = Some("xhash_app".to_owned());
	assert_eq!(package.root_project().unwrap().name, "xhash_app");
	assert!(package.root_is_app());
}

#[test]
fn test_registry_validation_and_cycles() {
	let mut registry = Registry::new();
	let mut a = Project::cpp_lib("a", "");
	a.dependencies = vec!["b".to_owned()];
	registry.insert(a);
	assert!(registry.validate().is_err());

	let mut b = Project::cpp_lib("b", "");
	b.dependencies = vec!["c".to_owned()];
	registry.insert(b);
	registry.insert(Project::cpp_lib("c", ""));
	assert!(registry.validate().is_ok());
	assert_eq!(registry.find_cycle(), None);

	let mut c = Project::cpp_lib("c", "");
	c.dependencies = vec!["a".to_owned()];
	registry.insert(c);
	assert_eq!(registry.len(), 3);
	assert_eq!(registry.find_cycle(), Some(vec!["a".to_owned(), "b".to_owned(), "c".to_owned(), "a".to_owned()]));
}

#[test]
fn test_files_base_dir() {
	let files = Files::new(&[DEFAULT_MAIN_SOURCE_PATH]);
	assert_eq!(files.base_dir(), "source/main/cpp");
	assert_eq!(Files::default().base_dir(), "");
	assert_eq!(Project::cpp_test("t", "").source_dir(), "source/test/cpp");
}

#[test]
fn test_files_glob_files() {
	use std::fs;

	let dir = tempfile::tempdir().unwrap();
	let cpp_dir = dir.path().join("source").join("main").join("cpp");
	fs::create_dir_all(cpp_dir.join("detail")).unwrap();
	fs::write(cpp_dir.join("x.cpp"), "").unwrap();
	fs::write(cpp_dir.join("detail").join("y.cpp"), "").unwrap();

	let mut files = Files::new(&[DEFAULT_MAIN_SOURCE_PATH, "source/main/cpp/^*.cpp"]);
	files.glob_files(dir.path()).unwrap();
	assert_eq!(files.files, vec!["source/main/cpp/detail/y.cpp", "source/main/cpp/x.cpp"]);
	assert_eq!(files.virtual_paths, vec!["source", "source/main", "source/main/cpp", "source/main/cpp/detail"]);
}
