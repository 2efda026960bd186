//! CLI configuration loader for pipewright
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./pipewright.json or ./.pipewright/config.json
//! 3. Git repository root: <repo_root>/.pipewright/config.json
//! 4. User config dir: <config_dir>/pipewright/config.json
//! 5. Environment variables only (no files)

use anyhow::{anyhow, Context, Result};
use pipewright_core::{AgentConfig, ModelParams, Protocol, ResolvedLlmConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = ".pipewright";
const CONFIG_FILE_NAME: &str = "pipewright.json";

/// Raw configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// Protocol to use
    pub protocol: String,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: String,
    /// Base URL (optional, uses protocol default if not specified)
    pub base_url: Option<String>,
    /// Model name
    pub model: String,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Executor pass limit (optional)
    #[serde(default)]
    pub max_passes: Option<usize>,
    /// Completion deadline in seconds (optional)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Everything the CLI needs to build an agent
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub llm: ResolvedLlmConfig,
    pub agent: AgentConfig,
}

/// CLI configuration loader
#[derive(Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    protocol_override: Option<String>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    /// Directory searched instead of the process working directory
    search_root: Option<PathBuf>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set protocol override
    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.protocol_override = Some(protocol);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Search from `root` instead of the current directory
    pub fn with_search_root(mut self, root: PathBuf) -> Self {
        self.search_root = Some(root);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<LoadedConfig> {
        let mut config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            self.search_and_load().await?
        };

        if let Some(protocol) = &self.protocol_override {
            config.protocol = protocol.clone();
        }
        if let Some(api_key) = &self.api_key_override {
            config.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            config.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            config.model = model.clone();
        }

        self.resolve_config(config)
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<RawConfig> {
        let root = match &self.search_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };

        if let Some(config) = self.try_load_dir(&root).await? {
            return Ok(config);
        }

        if let Some(git_root) = find_git_root(&root) {
            let config_path = git_root.join(CONFIG_DIR_NAME).join("config.json");
            if config_path.exists() {
                return self.load_file(&config_path).await;
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("pipewright").join("config.json");
            if config_path.exists() {
                return self.load_file(&config_path).await;
            }
        }

        self.load_env_only()
    }

    /// Try `<dir>/pipewright.json`, then `<dir>/.pipewright/config.json`
    async fn try_load_dir(&self, dir: &Path) -> Result<Option<RawConfig>> {
        let single_file = dir.join(CONFIG_FILE_NAME);
        if single_file.exists() {
            return Ok(Some(self.load_file(&single_file).await?));
        }

        let dir_config = dir.join(CONFIG_DIR_NAME).join("config.json");
        if dir_config.exists() {
            return Ok(Some(self.load_file(&dir_config).await?));
        }

        Ok(None)
    }

    /// Build a configuration from environment variables only
    fn load_env_only(&self) -> Result<RawConfig> {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let candidates = [
            ("openai", env("OPENAI_API_KEY")),
            ("anthropic", env("ANTHROPIC_API_KEY")),
            ("azure_openai", env("AZURE_OPENAI_API_KEY")),
        ];
        let available: Vec<&str> = candidates
            .iter()
            .filter(|(_, key)| key.is_some())
            .map(|(name, _)| *name)
            .collect();

        let env_protocol = env("PIPEWRIGHT_PROTOCOL");
        let preference = self.protocol_override.as_ref().or(env_protocol.as_ref());

        let protocol = match preference {
            Some(preferred) => {
                let preferred = if preferred == "openai_compat" {
                    "openai"
                } else {
                    preferred.as_str()
                };
                if !available.contains(&preferred) {
                    return Err(anyhow!(
                        "Protocol '{}' specified but no corresponding API key found. Available keys: {}",
                        preferred,
                        available.join(", ")
                    ));
                }
                preferred
            }
            None => match available.as_slice() {
                [] => {
                    return Err(anyhow!(
                        "No configuration found. Please create a pipewright.json file or set environment variables like OPENAI_API_KEY"
                    ))
                }
                [only] => *only,
                _ => {
                    return Err(anyhow!(
                        "Multiple API keys detected: {}. Please specify which protocol to use with PIPEWRIGHT_PROTOCOL or --protocol",
                        available.join(", ")
                    ))
                }
            },
        };

        let (prefix, default_model) = match protocol {
            "anthropic" => ("ANTHROPIC", "claude-3-5-sonnet-20241022"),
            "azure_openai" => ("AZURE_OPENAI", "gpt-4"),
            _ => ("OPENAI", "gpt-4o"),
        };

        let api_key = candidates
            .iter()
            .find(|(name, _)| *name == protocol)
            .and_then(|(_, key)| key.clone())
            .ok_or_else(|| anyhow!("No API key found for protocol '{}'", protocol))?;

        let base_url = env(&format!("{}_BASE_URL", prefix)).or_else(|| env("PIPEWRIGHT_BASE_URL"));
        let model = env(&format!("{}_MODEL", prefix))
            .or_else(|| env("PIPEWRIGHT_MODEL"))
            .unwrap_or_else(|| default_model.to_string());

        Ok(RawConfig {
            protocol: protocol.to_string(),
            api_key,
            base_url,
            model,
            params: ModelParams::default(),
            headers: HashMap::new(),
            max_passes: None,
            timeout_secs: None,
        })
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            match self.try_load_dir(path).await? {
                Some(config) => Ok(config),
                None => {
                    let config_file = path.join("config.json");
                    if config_file.exists() {
                        self.load_file(&config_file).await
                    } else {
                        Err(anyhow!("No config.json found in directory: {}", path.display()))
                    }
                }
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        tracing::debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Resolve raw config into core configuration types
    fn resolve_config(&self, config: RawConfig) -> Result<LoadedConfig> {
        let protocol = Protocol::from_name(&config.protocol);

        let api_key = match config.api_key.strip_prefix("env:") {
            Some(var) => std::env::var(var)
                .with_context(|| format!("Environment variable '{}' is not set", var))?,
            None => config.api_key,
        };

        let base_url = match config.base_url {
            Some(url) => url,
            None => protocol
                .default_base_url()
                .ok_or_else(|| {
                    anyhow!(
                        "Protocol '{}' has no default base URL; set base_url",
                        protocol.as_str()
                    )
                })?
                .to_string(),
        };

        let llm = ResolvedLlmConfig::new(protocol, base_url, api_key, config.model)
            .with_params(config.params)
            .with_headers(config.headers);
        llm.validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        let mut agent = AgentConfig::default();
        if let Some(max_passes) = config.max_passes {
            agent.max_passes = max_passes;
        }
        if let Some(timeout_secs) = config.timeout_secs {
            agent.completion_timeout_secs = timeout_secs;
        }

        Ok(LoadedConfig { llm, agent })
    }
}

/// Walk up from `start` looking for a `.git` entry
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, relative: &str, body: &str) -> PathBuf {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    const OPENAI_CONFIG: &str = r#"{
        "protocol": "openai",
        "api_key": "sk-test",
        "model": "gpt-4o",
        "max_passes": 7,
        "timeout_secs": 30
    }"#;

    #[tokio::test]
    async fn test_explicit_file_feeds_llm_and_agent_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "custom.json", OPENAI_CONFIG);

        let loaded = CliConfigLoader::new()
            .with_config_override(path)
            .load()
            .await
            .unwrap();

        assert_eq!(loaded.llm.protocol, Protocol::OpenAICompat);
        assert_eq!(loaded.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(loaded.llm.api_key, "sk-test");
        assert_eq!(loaded.agent.max_passes, 7);
        assert_eq!(loaded.agent.completion_timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_search_prefers_single_file_over_config_dir() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), CONFIG_FILE_NAME, OPENAI_CONFIG);
        write_config(
            dir.path(),
            ".pipewright/config.json",
            r#"{"protocol": "anthropic", "api_key": "other", "model": "claude"}"#,
        );

        let loaded = CliConfigLoader::new()
            .with_search_root(dir.path().to_path_buf())
            .load()
            .await
            .unwrap();

        assert_eq!(loaded.llm.protocol, Protocol::OpenAICompat);
    }

    #[tokio::test]
    async fn test_config_dir_and_flag_overrides() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            ".pipewright/config.json",
            r#"{"protocol": "anthropic", "api_key": "ak-test", "model": "claude"}"#,
        );

        let loaded = CliConfigLoader::new()
            .with_config_override(dir.path().to_path_buf())
            .with_model_override("claude-override".to_string())
            .with_base_url_override("http://localhost:8080".to_string())
            .load()
            .await
            .unwrap();

        assert_eq!(loaded.llm.protocol, Protocol::Anthropic);
        assert_eq!(loaded.llm.model, "claude-override");
        assert_eq!(loaded.llm.base_url, "http://localhost:8080");
        assert_eq!(loaded.agent.max_passes, 5);
    }

    #[tokio::test]
    async fn test_env_api_key_reference() {
        std::env::set_var("PIPEWRIGHT_TEST_KEY_REF", "from-env");
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            "config.json",
            r#"{"protocol": "openai", "api_key": "env:PIPEWRIGHT_TEST_KEY_REF", "model": "gpt-4o"}"#,
        );

        let loaded = CliConfigLoader::new()
            .with_config_override(path)
            .load()
            .await
            .unwrap();
        assert_eq!(loaded.llm.api_key, "from-env");
    }

    #[tokio::test]
    async fn test_missing_env_reference_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            "config.json",
            r#"{"protocol": "openai", "api_key": "env:PIPEWRIGHT_TEST_KEY_UNSET", "model": "gpt-4o"}"#,
        );

        let result = CliConfigLoader::new().with_config_override(path).load().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_override_path_fails() {
        let dir = TempDir::new().unwrap();
        let result = CliConfigLoader::new()
            .with_config_override(dir.path().join("nope.json"))
            .load()
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_git_root_discovery() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_git_root(&nested), Some(dir.path().to_path_buf()));
    }
}
