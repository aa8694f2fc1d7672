use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default config file locations, searched in order
const CONFIG_PATHS: [&str; 2] = ["meme-analyzer.toml", "config/meme-analyzer.toml"];

/// Configuration for the meme analyzer client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Analysis service connection
    pub service: ServiceConfig,

    /// Meme image asset resolution
    pub assets: AssetConfig,

    /// External video player
    pub player: PlayerConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the analysis service
    pub endpoint: String,

    /// Upload timeout in seconds (0 = wait indefinitely)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Path segment meme images are served under
    pub assets_root: String,

    /// Host serving the assets; paths stay relative when unset
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Player executable
    pub command: String,

    /// Arguments; `{start}` and `{path}` are substituted at play time
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Log level
    pub log_level: String,
}

impl ServiceConfig {
    /// `POST` target for video uploads
    pub fn upload_url(&self) -> Result<Url> {
        self.join("upload")
    }

    /// Location of a stored analysis result
    pub fn result_url(&self, file_id: &str) -> Result<Url> {
        self.join(&format!("results/{}", urlencoding::encode(file_id)))
    }

    /// Service health probe
    pub fn health_url(&self) -> Result<Url> {
        self.join("health")
    }

    /// Upload timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    fn join(&self, path: &str) -> Result<Url> {
        let mut base = Url::parse(&self.endpoint)
            .map_err(|e| anyhow!("Invalid service endpoint '{}': {}", self.endpoint, e))?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path)?)
    }
}

impl Config {
    /// Load configuration from the first config file found, or from the
    /// environment when there is none. A file that exists but does not parse
    /// is an error, not a silent fallback to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&CONFIG_PATHS)
    }

    /// First of the default config locations that exists
    pub fn locate() -> Option<PathBuf> {
        Self::locate_in(&CONFIG_PATHS)
    }

    /// Like [`Config::load`], searching `candidates` in order
    pub fn load_from<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        match Self::locate_in(candidates) {
            Some(path) => Ok(Self::from_file(path)?.with_env_overrides()),
            None => Self::from_env(),
        }
    }

    fn locate_in<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
        candidates
            .iter()
            .map(|candidate| candidate.as_ref())
            .find(|candidate| candidate.is_file())
            .map(Path::to_path_buf)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config file {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::default().with_env_overrides())
    }

    /// Apply `MEME_ANALYZER_*` environment variables on top of this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("MEME_ANALYZER_ENDPOINT") {
            self.service.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("MEME_ANALYZER_TIMEOUT") {
            match timeout.parse() {
                Ok(seconds) => self.service.timeout_seconds = seconds,
                Err(_) => tracing::warn!("Ignoring invalid MEME_ANALYZER_TIMEOUT: {}", timeout),
            }
        }

        if let Ok(root) = std::env::var("MEME_ANALYZER_ASSETS_ROOT") {
            self.assets.assets_root = root;
        }

        if let Ok(log_level) = std::env::var("MEME_ANALYZER_LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        self
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.as_ref().display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let endpoint = Url::parse(&self.service.endpoint)
            .map_err(|e| anyhow!("Invalid service endpoint '{}': {}", self.service.endpoint, e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!("Service endpoint must be http or https, got {}", endpoint.scheme()));
        }

        if self.assets.assets_root.trim_matches('/').is_empty() {
            return Err(anyhow!("assets_root must not be empty"));
        }

        if let Some(base_url) = &self.assets.base_url {
            Url::parse(base_url).map_err(|e| anyhow!("Invalid assets base_url '{}': {}", base_url, e))?;
        }

        if self.player.command.trim().is_empty() {
            return Err(anyhow!("player command must not be empty"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Meme Analyzer Configuration:\n\
            - Service Endpoint: {}\n\
            - Upload Timeout: {}\n\
            - Assets Root: /{}\n\
            - Player: {} {}\n\
            - Log Level: {}",
            self.service.endpoint,
            match self.service.timeout() {
                Some(timeout) => format!("{}s", timeout.as_secs()),
                None => "none".to_string(),
            },
            self.assets.assets_root.trim_matches('/'),
            self.player.command,
            self.player.args.join(" "),
            self.output.log_level
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                endpoint: "http://localhost:5050".to_string(),
                timeout_seconds: 600, // 10 minutes for long videos
            },
            assets: AssetConfig {
                assets_root: "memes".to_string(),
                base_url: None,
            },
            player: PlayerConfig {
                command: "ffplay".to_string(),
                args: vec![
                    "-autoexit".to_string(),
                    "-loglevel".to_string(),
                    "quiet".to_string(),
                    "-ss".to_string(),
                    "{start}".to_string(),
                    "{path}".to_string(),
                ],
            },
            output: OutputConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.service.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.service.timeout_seconds = seconds;
        self
    }

    pub fn with_assets_root(mut self, root: impl Into<String>) -> Self {
        self.config.assets.assets_root = root.into();
        self
    }

    pub fn with_assets_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.assets.base_url = Some(base_url.into());
        self
    }

    pub fn with_player(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.config.player.command = command.into();
        self.config.player.args = args;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.output.log_level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
