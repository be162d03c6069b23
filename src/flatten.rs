use std::collections::HashSet;

use crate::project::{Project, Registry};

/// Every project reachable from `root` through its dependencies, `root` itself excluded.
///
/// Projects are identified by name, so one reachable over several paths is listed once. The result
/// is in first-discovery order of a depth-first walk over an explicit stack, which makes it stable
/// for a given registry. An edge back to an already visited project, the root included, is not
/// followed again, so cycles terminate.
pub fn flatten<'a>(registry: &'a Registry, root: &str) -> Vec<&'a Project> {
	let Some(root_project) = registry.get(root) else {
		log::warn!("flatten: unknown root project \"{}\"", root);
		return Vec::new();
	};
	let root_name = root_project.name.as_str();

	let mut visited: HashSet<&str> = HashSet::from([root_name]);
	let mut discovered = Vec::new();
	let mut stack = vec![root_project];
	while let Some(project) = stack.pop() {
		for dep_name in &project.dependencies {
			if dep_name == root_name {
				log::warn!("Dependency cycle: \"{}\" depends on root project \"{}\"", project.name, root_name);
			}
			if !visited.insert(dep_name.as_str()) {
				continue;
			}
			match registry.get(dep_name) {
				Some(dep) => {
					discovered.push(dep);
					stack.push(dep);
				}
				None => log::error!("Project \"{}\" depends on unknown project \"{}\"", project.name, dep_name),
			}
		}
	}
	discovered
}

#[cfg(test)]
fn names(projects: &[&Project]) -> Vec<String> {
	projects.iter().map(|x| x.name.clone()).collect()
}

#[cfg(test)]
fn registry_of(edges: &[(&str, &str)]) -> Registry {
	let mut registry = Registry::new();
	for (name, deps) in edges {
		let mut project = Project::cpp_lib(name, "");
		project.dependencies = deps.split_whitespace().map(|x| x.to_string()).collect();
		registry.insert(project);
	}
	registry
}

#[test]
fn test_flatten_chain() {
	let registry = registry_of(&[("app", "libA"), ("libA", "libB"), ("libB", "")]);
	assert_eq!(names(&flatten(&registry, "app")), vec!["libA", "libB"]);
	assert_eq!(names(&flatten(&registry, "libB")), Vec::<String>::new());
}

#[test]
fn test_flatten_diamond_lists_each_project_once() {
	let registry = registry_of(&[
		("app", "left right"),
		("left", "base"),
		("right", "base util"),
		("base", ""),
		("util", "base"),
	]);
	let flat = names(&flatten(&registry, "app"));
	assert_eq!(flat, vec!["left", "right", "base", "util"]);
	// Same result every run
	assert_eq!(names(&flatten(&registry, "app")), flat);
}

#[test]
fn test_flatten_cycle_terminates() {
	let registry = registry_of(&[("A", "B"), ("B", "A")]);
	assert_eq!(names(&flatten(&registry, "A")), vec!["B"]);

	let registry = registry_of(&[("root", "x"), ("x", "y"), ("y", "x root")]);
	assert_eq!(names(&flatten(&registry, "root")), vec!["x", "y"]);
}

#[test]
fn test_flatten_skips_unknown() {
	let registry = registry_of(&[("app", "missing lib"), ("lib", "")]);
	assert_eq!(names(&flatten(&registry, "app")), vec!["lib"]);
	assert!(flatten(&registry, "nope").is_empty());
}
