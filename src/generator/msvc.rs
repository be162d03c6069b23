use std::path::{Path, PathBuf};

use super::{gather, get_project, prepare, relative_path, ProjectSyntax, VsVersion};
use crate::{
	items::{windows_path, OrderedSet},
	project::{Files, Package, Project, ProjectKind},
	replacer::{insert_in_lines, replace_in_lines},
	uid::new_guid,
	vars::Variables,
	writer::TextWriter,
};

const VS_CPP_GUID: &str = "8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942";

fn msvc_type(kind: ProjectKind) -> &'static str {
	match kind {
		ProjectKind::StaticLibrary => "StaticLibrary",
		ProjectKind::SharedLibrary => "DynamicLibrary",
		ProjectKind::Executable => "Application",
	}
}

const SYNTAX: ProjectSyntax = ProjectSyntax { kind_name: msvc_type, path: windows_path, list_delimiter: ";", list_quote: "" };

struct Toolchain {
	tools_version: &'static str,
	platform_toolset: &'static str,
	/// Second line of the solution file
	sln_comment: &'static str,
	visual_studio_version: &'static str,
}

fn toolchain(version: VsVersion) -> Result<Toolchain, String> {
	match version {
		VsVersion::Vs2015 => Ok(Toolchain {
			tools_version: "14.0",
			platform_toolset: "v140",
			sln_comment: "# Visual Studio 14",
			visual_studio_version: "14.0.25420.1",
		}),
		VsVersion::Vs2017 => Ok(Toolchain {
			tools_version: "15.0",
			platform_toolset: "v141",
			sln_comment: "# Visual Studio 15",
			visual_studio_version: "15.0.26730.3",
		}),
		VsVersion::Vs2012 | VsVersion::Vs2013 => Err(format!("Unsupported Visual Studio version {}", version.name())),
	}
}

fn vs_platform(platform: &str) -> Option<&'static str> {
	match platform {
		"win64" => Some("x64"),
		"win32" => Some("Win32"),
		_ => None,
	}
}

/// One Visual Studio `Configuration|Platform` pair and the package platform/config it comes from.
#[derive(Clone, Debug, PartialEq)]
struct VsConfig {
	platform: String,
	config: String,
	vs_platform: &'static str,
	vs_config: String,
}

impl VsConfig {
	fn new(platform: &str, config: &str, vs_platform: &'static str) -> Self {
		let mut chars = config.chars();
		let vs_config = match chars.next() {
			Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
			None => String::new(),
		};
		VsConfig { platform: platform.to_owned(), config: config.to_owned(), vs_platform, vs_config }
	}

	fn pair(&self) -> String {
		format!("{}|{}", self.vs_config, self.vs_platform)
	}

	fn condition(&self) -> String {
		format!("'$(Configuration)|$(Platform)'=='{}'", self.pair())
	}

	fn is_debug(&self) -> bool {
		self.config.eq_ignore_ascii_case("debug")
	}
}

fn vs_configs(project: &Project) -> Vec<VsConfig> {
	let mut configs = Vec::new();
	for platform in project.platforms.iter() {
		let Some(vs_platform) = vs_platform(&platform.name) else {
			log::debug!("{}: skipping platform {}", project.name, platform.name);
			continue;
		};
		for config in &platform.configs {
			configs.push(VsConfig::new(&platform.name, &config.name, vs_platform));
		}
	}
	configs
}

pub struct Msvc {}

impl Msvc {
	pub fn generate(package: &mut Package, root_dir: &Path, version: VsVersion) -> Result<(), String> {
		let toolchain = toolchain(version)?;
		let mut run = prepare(package, root_dir, &SYNTAX)?;
		let registry = &package.projects;
		let mut projects = Vec::new();
		for name in run.project_names() {
			projects.push(get_project(registry, name)?);
		}

		// Everything is rendered before the first file is written
		let mut outputs: Vec<(PathBuf, Vec<String>)> = Vec::new();
		for project in &projects {
			let vcxproj = vcxproj_lines(project, &projects, &toolchain, &mut run.variables);
			outputs.push((project.project_path.join(format!("{}.vcxproj", project.name)), vcxproj));
			outputs.push((project.project_path.join(format!("{}.vcxproj.filters", project.name)), filters_lines(project)));
		}
		let root = projects[0];
		outputs.push((root.project_path.join(format!("{}.sln", root.name)), sln_lines(&package.name, &projects, &toolchain)));

		// Nothing is committed until every file is written and flushed. Dropped writers discard
		// their content, so only a failing rename in the last loop can leave a partial set behind.
		let mut writers = Vec::with_capacity(outputs.len());
		for (path, lines) in &outputs {
			let mut writer = TextWriter::open(path)?;
			writer.write_lns(lines)?;
			writers.push(writer);
		}
		for writer in writers.iter_mut() {
			writer.finish()?;
		}
		for writer in writers {
			writer.close()?;
		}
		Ok(())
	}
}

const VCXPROJ_TEMPLATE: &[&str] = &[
	r#"<?xml version="1.0" encoding="utf-8"?>"#,
	r#"<Project DefaultTargets="Build" ToolsVersion="${TOOLS_VERSION}" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">"#,
	r#"+<ItemGroup Label="ProjectConfigurations">"#,
	"${PROJECT_CONFIGURATIONS}",
	"+</ItemGroup>",
	r#"+<PropertyGroup Label="Globals">"#,
	"++<ProjectGuid>{${${Name}:GUID}}</ProjectGuid>",
	"++<RootNamespace>${Name}</RootNamespace>",
	"++<ProjectName>${Name}</ProjectName>",
	"+</PropertyGroup>",
	r#"+<Import Project="$(VCTargetsPath)\Microsoft.Cpp.Default.props" />"#,
	"${CONFIGURATION_PROPERTIES}",
	r#"+<Import Project="$(VCTargetsPath)\Microsoft.Cpp.props" />"#,
	r#"+<ImportGroup Label="ExtensionSettings" />"#,
	r#"+<ImportGroup Label="PropertySheets" />"#,
	r#"+<PropertyGroup Label="UserMacros" />"#,
	"${OUTPUT_PROPERTIES}",
	"${ITEM_DEFINITIONS}",
	"${CL_INCLUDE}",
	"${CL_COMPILE}",
	"${PROJECT_REFERENCES}",
	r#"+<Import Project="$(VCTargetsPath)\Microsoft.Cpp.targets" />"#,
	r#"+<ImportGroup Label="ExtensionTargets" />"#,
	"</Project>",
];

fn vcxproj_lines(project: &Project, projects: &[&Project], toolchain: &Toolchain, variables: &mut Variables) -> Vec<String> {
	let configs = vs_configs(project);
	let relative = relative_path(&project.project_path, &project.package_path);

	let mut lines = VCXPROJ_TEMPLATE.iter().map(|x| x.to_string()).collect::<Vec<String>>();
	replace_in_lines("${TOOLS_VERSION}", toolchain.tools_version, &mut lines);
	insert_in_lines("${PROJECT_CONFIGURATIONS}", &project_configurations(&configs), "", &mut lines);
	insert_in_lines("${CONFIGURATION_PROPERTIES}", &configuration_properties(&configs, toolchain), "", &mut lines);
	insert_in_lines("${OUTPUT_PROPERTIES}", &output_properties(&configs), "", &mut lines);
	insert_in_lines("${ITEM_DEFINITIONS}", &item_definitions(project, &configs, variables), "", &mut lines);
	insert_in_lines("${CL_INCLUDE}", &file_items("ClInclude", &relative, &project.hdr_files), "", &mut lines);
	insert_in_lines("${CL_COMPILE}", &file_items("ClCompile", &relative, &project.src_files), "", &mut lines);
	insert_in_lines("${PROJECT_REFERENCES}", &project_references(project, projects), "", &mut lines);

	variables.set("Name", &project.name);
	variables.replace_in_lines(&mut lines);
	variables.remove("Name");
	lines.retain(|x| !x.is_empty());
	lines
}

fn project_configurations(configs: &[VsConfig]) -> String {
	let mut lines = Vec::new();
	for config in configs {
		lines.push(format!(r#"++<ProjectConfiguration Include="{}">"#, config.pair()));
		lines.push(format!("+++<Configuration>{}</Configuration>", config.vs_config));
		lines.push(format!("+++<Platform>{}</Platform>", config.vs_platform));
		lines.push("++</ProjectConfiguration>".to_owned());
	}
	lines.join("\n")
}

fn configuration_properties(configs: &[VsConfig], toolchain: &Toolchain) -> String {
	let mut lines = Vec::new();
	for config in configs {
		lines.push(format!(r#"+<PropertyGroup Condition="{}" Label="Configuration">"#, config.condition()));
		lines.push("++<ConfigurationType>${${Name}:TYPE}</ConfigurationType>".to_owned());
		lines.push(format!("++<UseDebugLibraries>{}</UseDebugLibraries>", config.is_debug()));
		lines.push(format!("++<PlatformToolset>{}</PlatformToolset>", toolchain.platform_toolset));
		lines.push("++<CharacterSet>MultiByte</CharacterSet>".to_owned());
		lines.push("+</PropertyGroup>".to_owned());
	}
	lines.join("\n")
}

fn output_properties(configs: &[VsConfig]) -> String {
	let mut lines = Vec::new();
	for config in configs {
		lines.push(format!(r#"+<PropertyGroup Condition="{}">"#, config.condition()));
		lines.push(r"++<OutDir>$(SolutionDir)target\$(Platform)\$(Configuration)\</OutDir>".to_owned());
		lines.push(r"++<IntDir>$(SolutionDir)target\$(Platform)\$(Configuration)\$(ProjectName)\</IntDir>".to_owned());
		lines.push("+</PropertyGroup>".to_owned());
	}
	lines.join("\n")
}

/// `a;b;` for a non-empty set, so MSBuild's inherited value can follow directly.
fn msbuild_list(set: &OrderedSet) -> String {
	if set.is_empty() {
		String::new()
	} else {
		set.render(";", "") + ";"
	}
}

fn item_definitions(project: &Project, configs: &[VsConfig], variables: &Variables) -> String {
	let mut lines = Vec::new();
	for config in configs {
		let includes = gather(variables, "INCLUDE_DIRS", project, &config.platform, &config.config, ";");
		let defines = gather(variables, "DEFINES", project, &config.platform, &config.config, ";");
		let (optimization, runtime) = if config.is_debug() {
			("Disabled", "MultiThreadedDebugDLL")
		} else {
			("MaxSpeed", "MultiThreadedDLL")
		};
		lines.push(format!(r#"+<ItemDefinitionGroup Condition="{}">"#, config.condition()));
		lines.push("++<ClCompile>".to_owned());
		lines.push("+++<WarningLevel>Level3</WarningLevel>".to_owned());
		lines.push(format!("+++<Optimization>{}</Optimization>", optimization));
		lines.push(format!("+++<RuntimeLibrary>{}</RuntimeLibrary>", runtime));
		lines.push(format!(
			"+++<PreprocessorDefinitions>{}%(PreprocessorDefinitions)</PreprocessorDefinitions>",
			msbuild_list(&defines)
		));
		lines.push(format!(
			"+++<AdditionalIncludeDirectories>{}%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>",
			msbuild_list(&includes)
		));
		lines.push("++</ClCompile>".to_owned());
		lines.push("++<Link>".to_owned());
		lines.push("+++<GenerateDebugInformation>true</GenerateDebugInformation>".to_owned());
		lines.push("++</Link>".to_owned());
		lines.push("+</ItemDefinitionGroup>".to_owned());
	}
	lines.join("\n")
}

/// Path of a globbed file as seen from the directory the project files are written to.
fn file_path(relative: &str, file: &str) -> String {
	if relative.is_empty() {
		windows_path(file)
	} else {
		windows_path(&format!("{}/{}", relative, file))
	}
}

fn file_items(element: &str, relative: &str, files: &Files) -> String {
	if files.files.is_empty() {
		return String::new();
	}
	let mut lines = vec!["+<ItemGroup>".to_owned()];
	for file in &files.files {
		lines.push(format!(r#"++<{} Include="{}" />"#, element, file_path(relative, file)));
	}
	lines.push("+</ItemGroup>".to_owned());
	lines.join("\n")
}

/// References to the direct dependencies that are part of this run.
fn project_references(project: &Project, projects: &[&Project]) -> String {
	let deps = project
		.dependencies
		.iter()
		.filter(|x| projects.iter().any(|p| &p.name == *x))
		.collect::<Vec<&String>>();
	if deps.is_empty() {
		return String::new();
	}
	let mut lines = vec!["+<ItemGroup>".to_owned()];
	for dep in deps {
		lines.push(format!(r#"++<ProjectReference Include="{}.vcxproj">"#, dep));
		lines.push(format!("+++<Project>{{${{{}:GUID}}}}</Project>", dep));
		lines.push("++</ProjectReference>".to_owned());
	}
	lines.push("+</ItemGroup>".to_owned());
	lines.join("\n")
}

fn filters_lines(project: &Project) -> Vec<String> {
	let relative = relative_path(&project.project_path, &project.package_path);
	let mut lines = vec![
		r#"<?xml version="1.0" encoding="utf-8"?>"#.to_owned(),
		r#"<Project ToolsVersion="4.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">"#.to_owned(),
	];

	let mut virtual_paths: Vec<&String> = Vec::new();
	for path in project.hdr_files.virtual_paths.iter().chain(project.src_files.virtual_paths.iter()) {
		if !virtual_paths.contains(&path) {
			virtual_paths.push(path);
		}
	}
	if !virtual_paths.is_empty() {
		lines.push("+<ItemGroup>".to_owned());
		for path in virtual_paths {
			lines.push(format!(r#"++<Filter Include="{}">"#, windows_path(path)));
			lines.push(format!(
				"+++<UniqueIdentifier>{{{}}}</UniqueIdentifier>",
				new_guid(&format!("{}:{}", project.name, path))
			));
			lines.push("++</Filter>".to_owned());
		}
		lines.push("+</ItemGroup>".to_owned());
	}

	for (element, files) in [("ClInclude", &project.hdr_files), ("ClCompile", &project.src_files)] {
		if files.files.is_empty() {
			continue;
		}
		lines.push("+<ItemGroup>".to_owned());
		for file in &files.files {
			let include = file_path(&relative, file);
			match file.rsplit_once('/') {
				Some((dir, _)) => {
					lines.push(format!(r#"++<{} Include="{}">"#, element, include));
					lines.push(format!("+++<Filter>{}</Filter>", windows_path(dir)));
					lines.push(format!("++</{}>", element));
				}
				None => lines.push(format!(r#"++<{} Include="{}" />"#, element, include)),
			}
		}
		lines.push("+</ItemGroup>".to_owned());
	}
	lines.push("</Project>".to_owned());
	lines
}

/// Solution listing `projects` in order, with the first one as startup project.
fn sln_lines(package_name: &str, projects: &[&Project], toolchain: &Toolchain) -> Vec<String> {
	let mut lines = vec![
		String::new(),
		"Microsoft Visual Studio Solution File, Format Version 12.00".to_owned(),
		toolchain.sln_comment.to_owned(),
		format!("VisualStudioVersion = {}", toolchain.visual_studio_version),
		"MinimumVisualStudioVersion = 10.0.40219.1".to_owned(),
	];

	let mut sln_configs: Vec<VsConfig> = Vec::new();
	for project in projects {
		let guid = &project.guid;
		let name = &project.name;
		lines.push(format!(r#"Project("{{{VS_CPP_GUID}}}") = "{name}", "{name}.vcxproj", "{{{guid}}}""#));
		let deps = projects
			.iter()
			.filter(|x| project.dependencies.contains(&x.name))
			.collect::<Vec<&&Project>>();
		if !deps.is_empty() {
			lines.push("+ProjectSection(ProjectDependencies) = postProject".to_owned());
			for dep in deps {
				let dep_guid = &dep.guid;
				lines.push(format!("++{{{dep_guid}}} = {{{dep_guid}}}"));
			}
			lines.push("+EndProjectSection".to_owned());
		}
		lines.push("EndProject".to_owned());

		for config in vs_configs(project) {
			if !sln_configs.iter().any(|x| x.pair() == config.pair()) {
				sln_configs.push(config);
			}
		}
	}

	lines.push("Global".to_owned());
	lines.push("+GlobalSection(SolutionConfigurationPlatforms) = preSolution".to_owned());
	for config in &sln_configs {
		let pair = config.pair();
		lines.push(format!("++{pair} = {pair}"));
	}
	lines.push("+EndGlobalSection".to_owned());

	lines.push("+GlobalSection(ProjectConfigurationPlatforms) = postSolution".to_owned());
	for project in projects {
		let guid = &project.guid;
		let project_configs = vs_configs(project);
		for config in &sln_configs {
			let pair = config.pair();
			if !project_configs.iter().any(|x| x.pair() == pair) {
				continue;
			}
			lines.push(format!("++{{{guid}}}.{pair}.ActiveCfg = {pair}"));
			lines.push(format!("++{{{guid}}}.{pair}.Build.0 = {pair}"));
		}
	}
	lines.push("+EndGlobalSection".to_owned());

	let sln_guid = new_guid(&format!("{}.sln", package_name));
	lines.push("+GlobalSection(SolutionProperties) = preSolution".to_owned());
	lines.push("++HideSolutionNode = FALSE".to_owned());
	lines.push("+EndGlobalSection".to_owned());
	lines.push("+GlobalSection(ExtensibilityGlobals) = postSolution".to_owned());
	lines.push(format!("++SolutionGuid = {{{sln_guid}}}"));
	lines.push("+EndGlobalSection".to_owned());
	lines.push("EndGlobal".to_owned());
	lines
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
fn test_unsupported_versions() {
	assert!(toolchain(VsVersion::Vs2012).is_err());
	assert!(toolchain(VsVersion::Vs2013).is_err());
	assert_eq!(toolchain(VsVersion::Vs2015).unwrap().platform_toolset, "v140");
	assert_eq!(toolchain(VsVersion::Vs2017).unwrap().platform_toolset, "v141");

	let dir = tempfile::tempdir().unwrap();
	let mut package = chain_package();
	let err = Msvc::generate(&mut package, dir.path(), VsVersion::Vs2013).unwrap_err();
	assert_eq!(err, "Unsupported Visual Studio version VS2013");
	assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_vs_configs_skip_non_windows_platforms() {
	let project = Project::cpp_lib("libA", "");
	let configs = vs_configs(&project);
	assert_eq!(configs.len(), 2);
	assert_eq!(configs[0].pair(), "Debug|x64");
	assert_eq!(configs[1].pair(), "Release|x64");
	assert_eq!(configs[0].condition(), "'$(Configuration)|$(Platform)'=='Debug|x64'");
	assert!(configs[0].is_debug() && !configs[1].is_debug());
}

#[test]
fn test_vcxproj() {
	let dir = tempfile::tempdir().unwrap();
	let root_dir = dir.path().join("app");
	let mut package = chain_package();
	let mut run = prepare(&mut package, &root_dir, &SYNTAX).unwrap();
	let projects = run
		.project_names()
		.map(|x| package.projects.get(x).unwrap())
		.collect::<Vec<&Project>>();
	let toolchain = toolchain(VsVersion::Vs2017).unwrap();
	let app = projects[0];
	let lines = vcxproj_lines(app, &projects, &toolchain, &mut run.variables);
	let content = lines.join("\n");

	assert!(content.contains(r#"ToolsVersion="15.0""#));
	assert!(content.contains(&format!("<ProjectGuid>{{{}}}</ProjectGuid>", app.guid)));
	assert!(content.contains("<RootNamespace>app</RootNamespace>"));
	assert!(content.contains("<ConfigurationType>Application</ConfigurationType>"));
	assert!(content.contains("<PlatformToolset>v141</PlatformToolset>"));
	assert!(content.contains(
		r"<AdditionalIncludeDirectories>source\main\include;..\libA\source\main\include;%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>"
	));
	assert!(content.contains("<PreprocessorDefinitions>%(PreprocessorDefinitions)</PreprocessorDefinitions>"));
	assert_eq!(content.matches("<ItemDefinitionGroup ").count(), 2);
	assert!(content.contains(r#"<ProjectReference Include="libA.vcxproj">"#));
	assert!(content.contains(&format!("<Project>{{{}}}</Project>", new_guid("libA"))));
	assert!(!content.contains("libB.vcxproj"));
	assert!(!content.contains("${"));
	assert!(lines.iter().all(|x| !x.is_empty()));
	assert!(run.variables.get("Name").is_err());
}

#[test]
fn test_filters() {
	let dir = tempfile::tempdir().unwrap();
	let root_dir = dir.path().join("app");
	std::fs::create_dir_all(root_dir.join("source/main/cpp/util")).unwrap();
	std::fs::write(root_dir.join("source/main/cpp/main.cpp"), "").unwrap();
	std::fs::write(root_dir.join("source/main/cpp/util/str.cpp"), "").unwrap();
	let mut package = chain_package();
	prepare(&mut package, &root_dir, &SYNTAX).unwrap();

	let app = package.projects.get("app").unwrap();
	let content = filters_lines(app).join("\n");
	assert!(content.contains(r#"++<Filter Include="source\main\cpp\util">"#));
	assert!(content.contains(&format!("<UniqueIdentifier>{{{}}}</UniqueIdentifier>", new_guid("app:source/main/cpp"))));
	assert!(content.contains("++<ClCompile Include=\"source\\main\\cpp\\util\\str.cpp\">\n+++<Filter>source\\main\\cpp\\util</Filter>"));
	assert!(!content.contains("ClInclude"));
}

#[test]
fn test_generate_writes_solution() {
	let dir = tempfile::tempdir().unwrap();
	let root_dir = dir.path().join("app");
	std::fs::create_dir_all(&root_dir).unwrap();
	let mut package = chain_package();
	Msvc::generate(&mut package, &root_dir, VsVersion::Vs2015).unwrap();

	for name in ["app", "libA", "libB"] {
		assert!(root_dir.join(format!("{}.vcxproj", name)).exists());
		assert!(root_dir.join(format!("{}.vcxproj.filters", name)).exists());
	}
	let sln = std::fs::read_to_string(root_dir.join("app.sln")).unwrap();
	assert!(sln.contains("# Visual Studio 14\n"));
	let app = sln.find(r#"= "app", "app.vcxproj""#).unwrap();
	let lib_a = sln.find(r#"= "libA", "libA.vcxproj""#).unwrap();
	let lib_b = sln.find(r#"= "libB", "libB.vcxproj""#).unwrap();
	assert!(app < lib_a && lib_a < lib_b);
	let lib_a_guid = new_guid("libA");
	assert!(sln.contains(&format!("\t\t{{{lib_a_guid}}} = {{{lib_a_guid}}}\n")));
	assert!(sln.contains(&format!("\t\t{{{lib_a_guid}}}.Release|x64.Build.0 = Release|x64\n")));
	assert!(sln.contains("\t\tDebug|x64 = Debug|x64\n"));
	assert!(sln.contains(&format!("SolutionGuid = {{{}}}", new_guid("app.sln"))));
	assert!(sln.ends_with("EndGlobal\n"));
}

#[test]
fn test_failed_solution_commits_nothing() {
	let dir = tempfile::tempdir().unwrap();
	let root_dir = dir.path().join("app");
	std::fs::create_dir_all(root_dir.join("app.sln")).unwrap();
	let mut package = chain_package();
	let err = Msvc::generate(&mut package, &root_dir, VsVersion::Vs2017).unwrap_err();
	assert!(err.contains("app.sln"));
	let names = std::fs::read_dir(&root_dir).unwrap().map(|x| x.unwrap().file_name()).collect::<Vec<_>>();
	assert_eq!(names, vec!["app.sln"]);
}
