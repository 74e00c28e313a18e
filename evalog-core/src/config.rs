//! Configuration for evalog.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalogConfig {
    /// Persistence settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Text-generation client settings.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Scorer settings.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// History browsing and statistics settings.
    #[serde(default)]
    pub history: HistoryConfig,
}

/// SQLite store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("chat_feedback.db")
}

/// OpenAI-compatible generation endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the chat completions API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name sent with each request.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (takes precedence over `api_key_env`).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Maximum number of tokens to generate.
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Nucleus sampling threshold.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_api_key_env() -> String {
    "EVALOG_API_KEY".to_string()
}

fn default_max_new_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_timeout_secs() -> u64 {
    120
}

/// Which morphological tokenizer produces word counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// Morphological analysis with the embedded IPADIC dictionary.
    #[default]
    Ipadic,
    /// Built-in longest-match segmenter with a small word list.
    Builtin,
    /// Whitespace-separated chunks.
    Whitespace,
}

/// Scorer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub tokenizer: TokenizerKind,
    /// Extra words for the built-in segmenter, one per line.
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
}

/// History and statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Records per history page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Entries shown in the efficiency ranking.
    #[serde(default = "default_efficiency_top_n")]
    pub efficiency_top_n: usize,
    /// Insert the sample evaluations when the store is empty.
    #[serde(default = "default_true")]
    pub seed_when_empty: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            efficiency_top_n: default_efficiency_top_n(),
            seed_when_empty: true,
        }
    }
}

fn default_page_size() -> usize {
    5
}

fn default_efficiency_top_n() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "evalog", "evalog")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".evalog").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `EVALOG_`, nested with `__`)
/// 3. Workspace-local config (`.evalog/config.toml`)
/// 4. User config (`~/.config/evalog/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&EvalogConfig>,
) -> Result<EvalogConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(EvalogConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // EVALOG_STORE__DB_PATH, EVALOG_GENERATION__MODEL, ...
    figment = figment.merge(Env::prefixed("EVALOG_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Check whether a user-level or workspace-level config file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}
