use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    pub paths: PathsConfig,
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which module store receives new modules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Commit module files to a GitHub repository
    #[serde(rename = "github")]
    GitHub,
    /// Write module files to a local directory
    #[default]
    Local,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub github: GitHubStoreConfig,
    #[serde(default)]
    pub local: LocalStoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubStoreConfig {
    /// Repository in owner/name form
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory in the repository that holds one subdirectory per module
    #[serde(default = "default_modules_root")]
    pub root: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_modules_root() -> String {
    "modules".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for GitHubStoreConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            branch: default_branch(),
            root: default_modules_root(),
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStoreConfig {
    /// Directory that holds one subdirectory per module
    #[serde(default = "default_modules_root")]
    pub path: String,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            path: default_modules_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

impl Config {
    /// Path to the project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".module-wizard/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the wizard works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // Project config in .module-wizard/
        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/module-wizard/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("module-wizard").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. MODULE_WIZARD__STORE__BACKEND=github
        builder = builder.add_source(
            config::Environment::with_prefix("MODULE_WIZARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .module-wizard/config.toml
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::project_config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        absolute(&self.paths.state)
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// Get absolute path to the local module store
    pub fn local_store_path(&self) -> PathBuf {
        absolute(&self.store.local.path)
    }
}

fn absolute(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            paths: PathsConfig {
                state: ".module-wizard".to_string(), // Relative to cwd
            },
            ui: UiConfig { tick_rate_ms: 100 },
            logging: LoggingConfig::default(),
        }
    }
}
