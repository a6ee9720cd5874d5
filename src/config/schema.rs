use serde::Deserialize;

/// TOML-deserializable config file. All fields optional for layered merging.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub defaults: DefaultsFileConfig,
    #[serde(default)]
    pub targeting: TargetingFileConfig,
    #[serde(default)]
    pub frameworks: FrameworksFileConfig,
    #[serde(default)]
    pub watch: WatchFileConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultsFileConfig {
    pub format: Option<String>,
    pub quiet: Option<bool>,
    pub include_tests: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TargetingFileConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FrameworksFileConfig {
    /// Framework names as accepted by `--framework`
    pub enabled: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchFileConfig {
    pub debounce_ms: Option<u64>,
}

impl FileConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
