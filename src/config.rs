//! Layered configuration: built-in defaults, user file, explicit file, env.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};

use crate::outline::editor::EditorOptions;
use crate::target::Target;

const DEFAULT_CONFIG: &str = include_str!("../assets/default-config.toml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub json: JsonConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub history_limit: usize,
    #[serde(default = "EditorConfig::default_new_title")]
    pub new_title: String,
    #[serde(default = "EditorConfig::default_new_page")]
    pub new_page: u32,
}

impl EditorConfig {
    fn default_new_title() -> String {
        "New Title".into()
    }

    fn default_new_page() -> u32 {
        1
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 0,
            new_title: Self::default_new_title(),
            new_page: Self::default_new_page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonConfig {
    #[serde(default = "JsonConfig::default_pretty")]
    pub pretty: bool,
}

impl JsonConfig {
    fn default_pretty() -> bool {
        true
    }
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            pretty: Self::default_pretty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: Option<String>,
    /// Where the interactive editor writes its log; discarded when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Environment overrides for a few settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    history_limit: Option<usize>,
    log_level: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            history_limit: env::var("TOCEDIT_HISTORY_LIMIT")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            log_level: env::var("TOCEDIT_LOG").ok(),
        }
    }
}

impl Config {
    /// Load defaults, then the user config, then `explicit`, then env overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }
        Self::load_with_layers(
            global_config_path(),
            explicit.map(Path::to_path_buf),
            EnvOverrides::from_env(),
        )
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        explicit: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut merged = parse_table(DEFAULT_CONFIG)?;

        for path in [global, explicit].into_iter().flatten() {
            if path.exists() {
                let data = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                let layer = parse_table(&data)
                    .with_context(|| format!("Invalid config file: {}", path.display()))?;
                merge_tables(&mut merged, layer);
            }
        }

        let config: Config = toml::Value::Table(merged)
            .try_into()
            .with_context(|| "Failed to parse TOML config")?;
        Ok(apply_env_overrides(config, env_overrides))
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            history_limit: self.editor.history_limit,
            new_title: self.editor.new_title.clone(),
            new_target: Target::Page(self.editor.new_page.max(1)),
        }
    }
}

fn parse_table(contents: &str) -> Result<toml::Table> {
    toml::from_str(contents).with_context(|| "Failed to parse TOML config")
}

/// Overlay `layer` onto `base`, merging nested tables key by key.
fn merge_tables(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("tocedit/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(limit) = env.history_limit {
        config.editor.history_limit = limit;
    }
    if let Some(level) = env.log_level {
        config.log.level = Some(level);
    }
    config
}
