use crate::error::ConfigError;
use crate::plugin::Plugin;
use crate::theme::ThemeValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_PREFIX: &str = "barocss-";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Namespace for generated custom properties (`--barocss-*`).
    pub prefix: String,
    #[serde(alias = "darkMode")]
    pub dark_mode: DarkMode,
    #[serde(alias = "darkModeSelector")]
    pub dark_mode_selector: Option<Vec<String>>,
    pub preflight: Preflight,
    #[serde(skip_serializing)]
    pub theme: ThemeConfig,
    #[serde(skip_serializing)]
    pub presets: Vec<Preset>,
    #[serde(skip)]
    pub plugins: Vec<Plugin>,
    #[serde(alias = "clearCacheOnContextChange")]
    pub clear_cache_on_context_change: bool,
    /// Keys this crate does not interpret, kept for `Context::config`.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            dark_mode: DarkMode::default(),
            dark_mode_selector: None,
            preflight: Preflight::default(),
            theme: ThemeConfig::default(),
            presets: Vec::new(),
            plugins: Vec::new(),
            clear_cache_on_context_change: true,
            extra: toml::Table::new(),
        }
    }
}

impl Config {
    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.presets.push(preset);
        self
    }

    /// Selectors used by the class strategy, in emission order.
    pub fn dark_selectors(&self) -> Vec<String> {
        if let Some(selectors) = self.dark_mode_selector.as_ref() {
            if !selectors.is_empty() {
                return selectors.clone();
            }
        }
        match &self.dark_mode {
            DarkMode::Custom(entries) => {
                let mut selectors = Vec::new();
                for entry in entries {
                    match entry.as_str() {
                        "media" => {}
                        "class" => selectors.push(".dark".to_string()),
                        other => selectors.push(other.to_string()),
                    }
                }
                selectors
            }
            DarkMode::Class => vec![".dark".to_string()],
            DarkMode::Media => Vec::new(),
        }
    }

    pub fn dark_uses_media(&self) -> bool {
        match &self.dark_mode {
            DarkMode::Media => true,
            DarkMode::Class => false,
            DarkMode::Custom(entries) => entries.iter().any(|entry| entry == "media"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "DarkModeRepr", into = "DarkModeRepr")]
pub enum DarkMode {
    #[default]
    Media,
    Class,
    /// Mix of `"media"`, `"class"` and literal selectors.
    Custom(Vec<String>),
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum DarkModeRepr {
    Keyword(String),
    List(Vec<String>),
}

impl TryFrom<DarkModeRepr> for DarkMode {
    type Error = String;

    fn try_from(value: DarkModeRepr) -> Result<Self, Self::Error> {
        match value {
            DarkModeRepr::Keyword(keyword) => match keyword.as_str() {
                "media" => Ok(DarkMode::Media),
                "class" | "selector" => Ok(DarkMode::Class),
                other => Err(format!("unknown dark mode strategy '{}'", other)),
            },
            DarkModeRepr::List(entries) => Ok(DarkMode::Custom(entries)),
        }
    }
}

impl From<DarkMode> for DarkModeRepr {
    fn from(value: DarkMode) -> Self {
        match value {
            DarkMode::Media => DarkModeRepr::Keyword("media".to_string()),
            DarkMode::Class => DarkModeRepr::Keyword("class".to_string()),
            DarkMode::Custom(entries) => DarkModeRepr::List(entries),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "PreflightRepr", into = "PreflightRepr")]
pub enum Preflight {
    Disabled,
    Minimal,
    #[default]
    Standard,
    Full,
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum PreflightRepr {
    Enabled(bool),
    Level(String),
}

impl TryFrom<PreflightRepr> for Preflight {
    type Error = String;

    fn try_from(value: PreflightRepr) -> Result<Self, Self::Error> {
        match value {
            PreflightRepr::Enabled(true) => Ok(Preflight::Standard),
            PreflightRepr::Enabled(false) => Ok(Preflight::Disabled),
            PreflightRepr::Level(level) => match level.as_str() {
                "minimal" => Ok(Preflight::Minimal),
                "standard" => Ok(Preflight::Standard),
                "full" => Ok(Preflight::Full),
                other => Err(format!("unknown preflight level '{}'", other)),
            },
        }
    }
}

impl From<Preflight> for PreflightRepr {
    fn from(value: Preflight) -> Self {
        match value {
            Preflight::Disabled => PreflightRepr::Enabled(false),
            Preflight::Minimal => PreflightRepr::Level("minimal".to_string()),
            Preflight::Standard => PreflightRepr::Level("standard".to_string()),
            Preflight::Full => PreflightRepr::Level("full".to_string()),
        }
    }
}

/// `[theme]` table: categories merged over the presets, plus `extend`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub extend: IndexMap<String, ThemeValue>,
    #[serde(flatten)]
    pub values: IndexMap<String, ThemeValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub theme: IndexMap<String, ThemeValue>,
}

impl Preset {
    pub fn new(name: impl Into<String>, theme: IndexMap<String, ThemeValue>) -> Self {
        Self {
            name: name.into(),
            theme,
        }
    }
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::{Config, DarkMode, Preflight, load, parse};
    use crate::theme::ThemeValue;
    use std::fs;

    #[test]
    fn loads_toml_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("barocss.toml");
        fs::write(&path, "prefix = \"tw-\"\ndark_mode = \"class\"").expect("write config");
        let config = load(&path).expect("config should parse");
        assert_eq!(config.prefix, "tw-");
        assert_eq!(config.dark_mode, DarkMode::Class);
    }

    #[test]
    fn defaults_when_empty() {
        let config = parse("").expect("config should parse");
        assert_eq!(config.prefix, "barocss-");
        assert_eq!(config.dark_mode, DarkMode::Media);
        assert_eq!(config.preflight, Preflight::Standard);
        assert!(config.clear_cache_on_context_change);
        assert!(config.theme.values.is_empty());
    }

    #[test]
    fn loads_theme_and_extend_tables() {
        let config = parse(
            r##"
[theme.colors.gray]
100 = "#f3f4f6"

[theme.extend.colors]
brand = "#123456"
"##,
        )
        .expect("config should parse");
        let gray = config.theme.values["colors"]
            .as_map()
            .and_then(|colors| colors.get("gray"))
            .and_then(ThemeValue::as_map)
            .expect("gray palette");
        assert_eq!(gray["100"], ThemeValue::str("#f3f4f6"));
        assert!(config.theme.extend.contains_key("colors"));
        assert!(!config.theme.values.contains_key("extend"));
    }

    #[test]
    fn preflight_accepts_bool_and_level() {
        assert_eq!(
            parse("preflight = false").expect("bool").preflight,
            Preflight::Disabled
        );
        assert_eq!(
            parse("preflight = \"full\"").expect("level").preflight,
            Preflight::Full
        );
        assert!(parse("preflight = \"huge\"").is_err());
    }

    #[test]
    fn dark_mode_lists_mix_strategies() {
        let config = parse("darkMode = [\"media\", \"[data-theme=dark]\"]").expect("list");
        assert!(config.dark_uses_media());
        assert_eq!(config.dark_selectors(), vec!["[data-theme=dark]".to_string()]);
    }

    #[test]
    fn explicit_selector_overrides_default_dark_class() {
        let config = Config {
            dark_mode: DarkMode::Class,
            dark_mode_selector: Some(vec![".night".to_string(), "[data-dark]".to_string()]),
            ..Config::default()
        };
        assert_eq!(
            config.dark_selectors(),
            vec![".night".to_string(), "[data-dark]".to_string()]
        );
    }

    #[test]
    fn unknown_keys_pass_through() {
        let config = parse("[important]\nselector = \"#app\"").expect("extra keys");
        assert!(config.extra.contains_key("important"));
    }
}
