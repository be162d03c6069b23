use std::path::Path;

use super::{gather, get_project, prepare, ProjectSyntax, Run, ANY};
use crate::{
	items::{fix_path, List},
	project::{Package, Project, ProjectKind},
	replacer::{insert_in_lines, replace_in_lines},
	vars::Variables,
	writer::TextWriter,
};

const TUNDRA_LUA: &str = "tundra.lua";

fn tundra_type(kind: ProjectKind) -> &'static str {
	match kind {
		ProjectKind::StaticLibrary => "StaticLibrary",
		ProjectKind::SharedLibrary => "SharedLibrary",
		ProjectKind::Executable => "Program",
	}
}

const SYNTAX: ProjectSyntax = ProjectSyntax { kind_name: tundra_type, path: fix_path, list_delimiter: ",", list_quote: "\"" };

/// (platform, define, tundra config prefix)
const PLATFORM_DEFINES: [(&str, &str, &str); 3] = [
	("win64", "TARGET_PC", "win64-*"),
	("macosx", "TARGET_MAC", "macosx-*"),
	("linux", "TARGET_LINUX", "linux-*"),
];

const SUB_VARIANTS: [&str; 2] = ["dev", "test"];

fn config_filter(project_name: &str) -> &'static str {
	if project_name.ends_with("test") {
		"+++Config = \"*-*-*-test\","
	} else {
		"+++Config = \"*-*-*-*\","
	}
}

fn to_lines(lines: &[&str]) -> Vec<String> {
	lines.iter().map(|x| x.to_string()).collect()
}

pub struct Tundra {}

impl Tundra {
	pub fn generate(package: &mut Package, root_dir: &Path) -> Result<(), String> {
		let mut run = prepare(package, root_dir, &SYNTAX)?;
		let registry = &package.projects;
		let root = get_project(registry, &run.root)?;

		let mut writer = TextWriter::open(&root.project_path.join(TUNDRA_LUA))?;
		writer.write_lns(&header(root))?;
		for dep_name in &run.dependencies {
			let dep = get_project(registry, dep_name)?;
			writer.write_lns(&dependency_block(dep, &mut run.variables))?;
		}
		writer.write_lns(&program_block(root, &mut run))?;
		writer.write_ln(&format!("++Default({})", main_name(&run)))?;
		writer.write_lns(&footer())?;
		writer.close()
	}
}

fn main_name(run: &Run) -> &'static str {
	if run.root_is_app {
		"app"
	} else {
		"unittest"
	}
}

fn header(root: &Project) -> Vec<String> {
	let mut lines = to_lines(&[
		r#"local GlobExtension = require("tundra.syntax.glob")"#,
		"",
		"Build {",
		"+ReplaceEnv = {",
		"++OBJECTROOT = \"target\",",
		"+},",
		"+Env = {",
		"++CPPDEFS = {",
	]);
	for (platform, define, config_prefix) in PLATFORM_DEFINES {
		let Some(platform) = root.platforms.get(platform) else {
			continue;
		};
		for config in &platform.configs {
			let config_name = config.name.to_ascii_uppercase();
			for variant in SUB_VARIANTS {
				let variant_name = variant.to_ascii_uppercase();
				lines.push(format!(
					r#"+++{{ "{define}_{variant_name}_{config_name}", "{define}", "PLATFORM_64BIT"; Config = "{config_prefix}-{}-{variant}" }},"#,
					config.name
				));
			}
		}
	}
	lines.extend(to_lines(&[
		"++},",
		"+},",
		"+Units = function ()",
		"++-- Recursively globs for source files relevant to current build-id",
		"++local function SourceGlob(dir)",
		"+++return FGlob {",
		"++++Dir = dir,",
		r#"++++Extensions = { ".c", ".cpp", ".s", ".asm" },"#,
		"++++Filters = {",
		r#"+++++{ Pattern = "_win32"; Config = "win64-*-*" },"#,
		r#"+++++{ Pattern = "_mac"; Config = "macosx-*-*" },"#,
		r#"+++++{ Pattern = "_linux"; Config = "linux-*-*" },"#,
		r#"+++++{ Pattern = "_test"; Config = "*-*-*-test" },"#,
		"++++}",
		"+++}",
		"++end",
	]));
	lines
}

/// `local <name>_library = <TYPE> { ... }` for one dependency.
fn dependency_block(dep: &Project, variables: &mut Variables) -> Vec<String> {
	let mut lines = to_lines(&[
		"++local ${Name}_library = ${${Name}:TYPE} {",
		"+++Name = \"${Name}\",",
		config_filter(&dep.name),
		"+++Sources = { SourceGlob(\"${SOURCE_DIR}\") },",
		"+++Includes = { ${INCLUDE_DIRS} },",
		"++}",
	]);
	replace_in_lines("${SOURCE_DIR}", &format!("${{{}:SOURCE_DIR}}", dep.name), &mut lines);
	let includes = gather(variables, "INCLUDE_DIRS", dep, ANY, ANY, ",");
	insert_in_lines("${INCLUDE_DIRS}", &includes.render(",", ""), "", &mut lines);

	variables.set("Name", &dep.name);
	variables.replace_in_lines(&mut lines);
	variables.remove("Name");
	lines
}

/// `local app|unittest = <TYPE> { ... }` for the root project, depending on every flattened
/// dependency.
fn program_block(root: &Project, run: &mut Run) -> Vec<String> {
	let mut lines = to_lines(&[
		"++local ${Main} = ${${Name}:TYPE} {",
		"+++Name = \"${Name}\",",
		config_filter(&root.name),
		"+++Sources = { SourceGlob(\"${SOURCE_DIR}\") },",
		"+++Includes = { ${INCLUDE_DIRS} },",
		"+++Depends = { ${DEPENDS} },",
		"++}",
	]);
	let includes = gather(&run.variables, "INCLUDE_DIRS", root, ANY, ANY, ",");
	insert_in_lines("${INCLUDE_DIRS}", &includes.render(",", ""), "", &mut lines);

	let depends = run
		.dependencies
		.iter()
		.fold(List::new(",", ""), |acc, x| acc.add(x.clone() + "_library"))
		.to_set();
	insert_in_lines("${DEPENDS}", &depends.render(",", ""), "", &mut lines);
	replace_in_lines("${SOURCE_DIR}", &format!("${{{}:SOURCE_DIR}}", root.name), &mut lines);
	replace_in_lines("${Main}", main_name(run), &mut lines);

	run.variables.set("Name", &root.name);
	run.variables.replace_in_lines(&mut lines);
	run.variables.remove("Name");
	lines
}

fn footer() -> Vec<String> {
	to_lines(&[
		"+end,",
		"+Configs = {",
		"++Config {",
		"+++Name = \"macosx-clang\",",
		"+++Env = {",
		"++++PROGOPTS = { \"-lc++\" },",
		"++++CXXOPTS = {",
		"+++++\"-std=c++11\",",
		"+++++\"-arch x86_64\",",
		"+++++\"-Wno-new-returns-null\",",
		"+++++\"-Wno-missing-braces\",",
		"+++++\"-Wno-unused-function\",",
		"+++++\"-Wno-unused-variable\",",
		"+++++\"-Wno-unused-result\",",
		"+++++\"-Wno-write-strings\",",
		"+++++\"-Wno-c++11-compat-deprecated-writable-strings\",",
		"+++++\"-Wno-null-dereference\",",
		"+++++\"-Wno-format\",",
		"+++++\"-fno-strict-aliasing\",",
		"+++++\"-fno-omit-frame-pointer\",",
		"++++},",
		"+++},",
		"+++DefaultOnHost = \"macosx\",",
		"+++Tools = { \"clang\" },",
		"++},",
		"++Config {",
		"+++ReplaceEnv = {",
		"++++OBJECTROOT = \"target\",",
		"+++},",
		"+++Name = \"linux-gcc\",",
		"+++DefaultOnHost = \"linux\",",
		"+++Tools = { \"gcc\" },",
		"++},",
		"++Config {",
		"+++ReplaceEnv = {",
		"++++OBJECTROOT = \"target\",",
		"+++},",
		"+++Name = \"win64-msvc\",",
		"+++Env = {",
		"++++PROGOPTS = { \"/SUBSYSTEM:CONSOLE\" },",
		"++++CXXOPTS = { },",
		"+++},",
		"+++DefaultOnHost = \"windows\",",
		"+++Tools = { \"msvc-vs2017\" },",
		"++},",
		"+},",
		"",
		"+SubVariants = { \"dev\", \"test\" },",
		"}",
	])
}

#[cfg(test)]
fn chain_package() -> Package {
	use crate::project::Registry;

	let mut registry = Registry::new();
	let mut app = Project::cpp_app("app", "github.com/x/app");
	app.dependencies = vec!["libA".to_owned()];
	let mut lib_a = Project::cpp_lib("libA", "github.com/x/libA");
	lib_a.dependencies = vec!["libB".to_owned()];
	registry.insert(app);
	registry.insert(lib_a);
	registry.insert(Project::cpp_lib("libB", "github.com/x/libB"));
	let mut package = Package::new("app", registry);
	package.main_app = Some("app".to_owned());
	package
}

#[test]
fn test_blocks() {
	let dir = tempfile::tempdir().unwrap();
	let root_dir = dir.path().join("app");
	let mut package = chain_package();
	let mut run = prepare(&mut package, &root_dir, &SYNTAX).unwrap();
	assert_eq!(run.dependencies, vec!["libA", "libB"]);

	let lib_a = package.projects.get("libA").unwrap();
	let block = dependency_block(lib_a, &mut run.variables);
	assert_eq!(
		block,
		vec![
			"++local libA_library = StaticLibrary {",
			"+++Name = \"libA\",",
			"+++Config = \"*-*-*-*\",",
			"+++Sources = { SourceGlob(\"../libA/source/main/cpp\") },",
			"+++Includes = { \"../libA/source/main/include\",\"../libB/source/main/include\" },",
			"++}",
		]
	);
	assert!(run.variables.get("Name").is_err());

	let root = package.projects.get("app").unwrap();
	let block = program_block(root, &mut run);
	assert_eq!(
		block,
		vec![
			"++local app = Program {",
			"+++Name = \"app\",",
			"+++Config = \"*-*-*-*\",",
			"+++Sources = { SourceGlob(\"source/main/cpp\") },",
			"+++Includes = { \"source/main/include\",\"../libA/source/main/include\" },",
			"+++Depends = { libA_library,libB_library },",
			"++}",
		]
	);
	assert!(block.iter().all(|x| !x.contains("${")));
}

#[test]
fn test_generate_writes_tundra_lua() {
	let dir = tempfile::tempdir().unwrap();
	let root_dir = dir.path().join("app");
	std::fs::create_dir_all(&root_dir).unwrap();
	let mut package = chain_package();
	Tundra::generate(&mut package, &root_dir).unwrap();

	let content = std::fs::read_to_string(root_dir.join(TUNDRA_LUA)).unwrap();
	let lib_a = content.find("local libA_library").unwrap();
	let lib_b = content.find("local libB_library").unwrap();
	let app = content.find("local app = Program").unwrap();
	assert!(lib_a < lib_b && lib_b < app);
	assert!(content.contains("\tDefault(app)\n"));
	assert!(content.contains(r#"{ "TARGET_PC_DEV_DEBUG", "TARGET_PC", "PLATFORM_64BIT"; Config = "win64-*-debug-dev" },"#));
	assert!(!content.contains("${"));
}

#[test]
fn test_generate_without_root_fails() {
	let dir = tempfile::tempdir().unwrap();
	let mut package = chain_package();
	package.main_app = None;
	let result = Tundra::generate(&mut package, dir.path());
	assert!(result.is_err());
	assert!(!dir.path().join(TUNDRA_LUA).exists());
}
