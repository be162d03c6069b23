use crate::items::List;

pub const DEFAULT_PLATFORMS: [&str; 3] = ["win64", "macosx", "linux"];
pub const DEFAULT_CONFIGS: [&str; 2] = ["debug", "release"];

/// A build variant, e.g. "debug".
#[derive(Clone, Debug)]
pub struct Config {
	pub name: String,
	pub include_dirs: List,
	pub defines: List,
}

impl Config {
	pub fn new(name: &str) -> Self {
		Config { name: name.to_owned(), include_dirs: List::new(",", "\""), defines: List::new(";", "") }
	}
}

#[derive(Clone, Debug)]
pub struct Platform {
	pub name: String,
	pub configs: Vec<Config>,
}

impl Platform {
	pub fn new(name: &str) -> Self {
		Platform { name: name.to_owned(), configs: Vec::new() }
	}

	pub fn has_config(&self, config_name: &str) -> bool {
		self.configs.iter().any(|x| x.name == config_name)
	}

	pub fn get_config(&self, config_name: &str) -> Option<&Config> {
		self.configs.iter().find(|x| x.name == config_name)
	}

	/// Returns the named config, adding an empty one if the platform doesn't have it yet.
	pub fn config_entry(&mut self, config_name: &str) -> &mut Config {
		match self.configs.iter().position(|x| x.name == config_name) {
			Some(index) => &mut self.configs[index],
			None => {
				self.configs.push(Config::new(config_name));
				let last = self.configs.len() - 1;
				&mut self.configs[last]
			}
		}
	}
}

/// Platforms of a project. Names are unique.
#[derive(Clone, Debug, Default)]
pub struct PlatformSet {
	platforms: Vec<Platform>,
}

impl PlatformSet {
	pub fn new() -> Self {
		PlatformSet { platforms: Vec::new() }
	}

	/// Every default platform with every default config, each config starting with `include_dirs`.
	pub fn with_defaults(include_dirs: &[&str]) -> Self {
		let mut set = PlatformSet::new();
		for platform_name in DEFAULT_PLATFORMS {
			let mut platform = Platform::new(platform_name);
			for config_name in DEFAULT_CONFIGS {
				let mut config = Config::new(config_name);
				config.include_dirs = config.include_dirs.extend(include_dirs.iter().copied());
				platform.configs.push(config);
			}
			set.insert(platform);
		}
		set
	}

	/// Adds `platform`, replacing an existing platform of the same name.
	pub fn insert(&mut self, platform: Platform) {
		match self.platforms.iter_mut().find(|x| x.name == platform.name) {
			Some(existing) => *existing = platform,
			None => self.platforms.push(platform),
		}
	}

	pub fn has_platform(&self, platform_name: &str) -> bool {
		self.platforms.iter().any(|x| x.name == platform_name)
	}

	pub fn get(&self, platform_name: &str) -> Option<&Platform> {
		self.platforms.iter().find(|x| x.name == platform_name)
	}

	/// Returns the named platform, adding an empty one if it doesn't exist yet.
	pub fn entry(&mut self, platform_name: &str) -> &mut Platform {
		match self.platforms.iter().position(|x| x.name == platform_name) {
			Some(index) => &mut self.platforms[index],
			None => {
				self.platforms.push(Platform::new(platform_name));
				let last = self.platforms.len() - 1;
				&mut self.platforms[last]
			}
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = &Platform> {
		self.platforms.iter()
	}

	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Platform> {
		self.platforms.iter_mut()
	}
}

#[test]
fn test_default_platforms() {
	let set = PlatformSet::with_defaults(&["source/main/include"]);
	for name in DEFAULT_PLATFORMS {
		let platform = set.get(name).unwrap();
		assert!(platform.has_config("debug"));
		assert!(platform.has_config("release"));
		let config = platform.get_config("debug").unwrap();
		assert_eq!(config.include_dirs.iter().cloned().collect::<Vec<_>>(), vec!["source/main/include"]);
	}
	assert!(!set.has_platform("ps4"));
}

#[test]
fn test_entry_keeps_names_unique() {
	let mut set = PlatformSet::new();
	set.entry("win64").config_entry("debug");
	set.entry("win64").config_entry("debug");
	set.entry("win64").config_entry("release");
	assert_eq!(set.iter().count(), 1);
	assert_eq!(set.get("win64").unwrap().configs.len(), 2);
}
