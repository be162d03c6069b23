use std::{
	fs, //
	path::{Path, PathBuf},
};

use xgen::generator::{Generator, VsVersion};

fn copy_dir(from: &Path, to: &Path) {
	fs::create_dir_all(to).unwrap();
	for entry in fs::read_dir(from).unwrap() {
		let entry = entry.unwrap();
		let target = to.join(entry.file_name());
		if entry.file_type().unwrap().is_dir() {
			copy_dir(&entry.path(), &target);
		} else {
			fs::copy(entry.path(), &target).unwrap();
		}
	}
}

/// Copy of the fixture workspace, so generated files never land in the source tree.
fn workspace() -> (tempfile::TempDir, PathBuf) {
	let dir = tempfile::tempdir().unwrap();
	copy_dir(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_data/workspace"), dir.path());
	let root_dir = dir.path().join("xhash");
	(dir, root_dir)
}

#[test]
fn test_tundra() {
	let (_dir, root_dir) = workspace();
	let mut package = xgen::load_package(&root_dir.join("xgen.toml")).unwrap();
	xgen::generate(Generator::Tundra, &mut package, &root_dir).unwrap();

	let lua = fs::read_to_string(root_dir.join("tundra.lua")).unwrap();
	assert!(lua.starts_with("local GlobExtension = require(\"tundra.syntax.glob\")\n\nBuild {\n"));
	assert!(lua.contains(
		"\t\tlocal xhash_library = StaticLibrary {\n\
		 \t\t\tName = \"xhash\",\n\
		 \t\t\tConfig = \"*-*-*-*\",\n\
		 \t\t\tSources = { SourceGlob(\"source/main/cpp\") },\n\
		 \t\t\tIncludes = { \"source/main/include\",\"../xbase/source/main/include\" },\n\
		 \t\t}\n"
	));
	assert!(lua.contains("\t\t\tSources = { SourceGlob(\"../xbase/source/main/cpp\") },\n"));
	assert!(lua.contains(
		"\t\tlocal app = Program {\n\
		 \t\t\tName = \"xhash_app\",\n\
		 \t\t\tConfig = \"*-*-*-*\",\n\
		 \t\t\tSources = { SourceGlob(\"source/app/cpp\") },\n\
		 \t\t\tIncludes = { \"source/main/include\" },\n\
		 \t\t\tDepends = { xhash_library,xbase_library },\n\
		 \t\t}\n"
	));
	assert!(lua.find("local xhash_library").unwrap() < lua.find("local xbase_library").unwrap());
	assert!(lua.contains("\t\tDefault(app)\n"));
	assert!(lua.contains("\tSubVariants = { \"dev\", \"test\" },\n}\n"));
	assert!(!lua.contains("${"));
}

#[test]
fn test_tundra_unittest_root() {
	let (_dir, root_dir) = workspace();
	let mut package = xgen::load_package(&root_dir.join("xgen.toml")).unwrap();
	package.main_app = None;
	xgen::generate(Generator::Tundra, &mut package, &root_dir).unwrap();

	let lua = fs::read_to_string(root_dir.join("tundra.lua")).unwrap();
	assert!(lua.contains("\t\tlocal unittest = Program {\n\t\t\tName = \"xhash_test\",\n\t\t\tConfig = \"*-*-*-test\",\n"));
	assert!(lua.contains("SourceGlob(\"source/test/cpp\")"));
	assert!(lua.contains("\t\tDefault(unittest)\n"));
}

#[test]
fn test_visual_studio() {
	let (_dir, root_dir) = workspace();
	let mut package = xgen::load_package(&root_dir.join("xgen.toml")).unwrap();
	xgen::generate(Generator::VisualStudio(VsVersion::Vs2017), &mut package, &root_dir).unwrap();

	let xhash = fs::read_to_string(root_dir.join("xhash.vcxproj")).unwrap();
	assert!(xhash.contains(r#"<ClCompile Include="source\main\cpp\xhash.cpp" />"#));
	assert!(xhash.contains(r#"<ClInclude Include="source\main\include\xhash\xhash.h" />"#));
	assert!(xhash.contains("<PreprocessorDefinitions>XHASH_DEBUG;%(PreprocessorDefinitions)</PreprocessorDefinitions>"));
	assert!(xhash.contains(r#"<ProjectReference Include="xbase.vcxproj">"#));
	assert!(!xhash.contains("${"));

	let app = fs::read_to_string(root_dir.join("xhash_app.vcxproj")).unwrap();
	assert!(app.contains("<ConfigurationType>Application</ConfigurationType>"));
	assert!(app.contains(r#"<ClCompile Include="source\app\cpp\main.cpp" />"#));
	// Defines of direct dependencies are inherited
	assert!(app.contains("<PreprocessorDefinitions>XHASH_DEBUG;%(PreprocessorDefinitions)</PreprocessorDefinitions>"));
	assert!(!app.contains("xbase.vcxproj"));

	let xbase = fs::read_to_string(root_dir.join("xbase.vcxproj")).unwrap();
	assert!(xbase.contains(r#"<ClCompile Include="..\xbase\source\main\cpp\xbase.cpp" />"#));
	assert!(xbase.contains(
		r"<AdditionalIncludeDirectories>..\xbase\source\main\include;%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>"
	));

	let filters = fs::read_to_string(root_dir.join("xbase.vcxproj.filters")).unwrap();
	assert!(filters.contains("\t\t<Filter Include=\"source\\main\\include\\xbase\">\n"));

	let sln = fs::read_to_string(root_dir.join("xhash_app.sln")).unwrap();
	assert!(sln.contains("# Visual Studio 15\n"));
	assert!(sln.find("\"xhash_app\"").unwrap() < sln.find("\"xhash\"").unwrap());
	assert!(sln.find("\"xhash\"").unwrap() < sln.find("\"xbase\"").unwrap());
	assert!(!sln.contains("xhash_test"));
}

#[test]
fn test_generation_is_stable() {
	let (_dir, root_dir) = workspace();
	let generator = Generator::from_dev("vs2015").unwrap();
	let mut package = xgen::load_package(&root_dir.join("xgen.toml")).unwrap();
	xgen::generate(generator, &mut package, &root_dir).unwrap();
	let first = fs::read_to_string(root_dir.join("xhash_app.sln")).unwrap();

	let mut package = xgen::load_package(&root_dir.join("xgen.toml")).unwrap();
	xgen::generate(generator, &mut package, &root_dir).unwrap();
	assert_eq!(fs::read_to_string(root_dir.join("xhash_app.sln")).unwrap(), first);
}

#[test]
fn test_failures_leave_no_output() {
	let (_dir, root_dir) = workspace();
	let mut package = xgen::load_package(&root_dir.join("xgen.toml")).unwrap();
	let err = xgen::generate(Generator::VisualStudio(VsVersion::Vs2012), &mut package, &root_dir).unwrap_err();
	assert_eq!(err.to_string(), "Unsupported Visual Studio version VS2012");
	assert!(!root_dir.join("xhash_app.sln").exists());

	package.main_app = None;
	package.unittest = None;
	assert!(xgen::generate(Generator::Tundra, &mut package, &root_dir).is_err());
	assert!(!root_dir.join("tundra.lua").exists());

	assert!(xgen::generate(Generator::Tundra, &mut package, &root_dir.join("missing")).is_err());
	assert!(xgen::load_package(&root_dir.join("missing.toml")).is_err());
}

#[test]
fn test_tundra_root_with_parent_segment() {
	let (_dir, root_dir) = workspace();
	fs::create_dir(root_dir.join("sub")).unwrap();
	let mut package = xgen::load_package(&root_dir.join("xgen.toml")).unwrap();
	xgen::generate(Generator::Tundra, &mut package, &root_dir.join("sub").join("..")).unwrap();

	let lua = fs::read_to_string(root_dir.join("tundra.lua")).unwrap();
	assert!(lua.contains("SourceGlob(\"../xbase/source/main/cpp\")"));
	assert!(!lua.contains("sub/"));
}
