//! Application configuration for deploynote.
//!
//! User config lives at `~/.deploynote/deploynote.toml`.
//! Missing files fall back to defaults; credentials are named by
//! environment variable and never stored in the file itself.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DeployNoteError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "deploynote.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".deploynote";

// ---------------------------------------------------------------------------
// Config structs (matching deploynote.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitHub settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Generative-model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Deploy-note storage settings.
    #[serde(default)]
    pub notes: NotesConfig,
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Committer/author name attached to note commits.
    #[serde(default = "default_committer_name")]
    pub committer_name: String,

    /// Committer/author email attached to note commits.
    #[serde(default = "default_committer_email")]
    pub committer_email: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            api_base: default_api_base(),
            committer_name: default_committer_name(),
            committer_email: default_committer_email(),
        }
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_committer_name() -> String {
    "GitHub Actions".into()
}
fn default_committer_email() -> String {
    "actions@github.com".into()
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat-completions API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model ID to use for synthesis.
    #[serde(default = "default_model")]
    pub model: String,

    /// Fixed sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output-length cap in tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.deepseek.com/v1".into()
}
fn default_model() -> String {
    "deepseek-reasoner".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1000
}

/// `[notes]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Repository directory the notes are committed under.
    #[serde(default = "default_notes_dir")]
    pub dir: String,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            dir: default_notes_dir(),
        }
    }
}

fn default_notes_dir() -> String {
    "dev-utils/deployNotes".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.deploynote/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DeployNoteError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.deploynote/deploynote.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DeployNoteError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DeployNoteError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DeployNoteError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DeployNoteError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DeployNoteError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Credential checks
// ---------------------------------------------------------------------------

/// Check that the GitHub token env var is set and non-empty, returning it.
pub fn github_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.github.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(DeployNoteError::config(format!(
            "GitHub token not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that the model API key env var is set and non-empty, returning it.
pub fn model_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.model.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(DeployNoteError::config(format!(
            "Model API key not found. Set the {var_name} environment variable."
        ))),
    }
}
