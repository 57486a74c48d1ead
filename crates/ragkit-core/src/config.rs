//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_CHUNKING__CHUNK_SIZE=300`). Provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window length in words.
    pub chunk_size: usize,
    /// Words shared by adjacent windows. Must be smaller than `chunk_size`.
    pub chunk_overlap: usize,
    /// Windows whose joined text is not longer than this are dropped.
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 50, min_chunk_chars: 50 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic feature hashing; no model required.
    Hash,
    /// Local sentence-transformer weights run with candle.
    Bert,
    /// Ollama's `/api/embed` endpoint.
    Ollama,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    /// Directory holding `config.json`, `tokenizer.json` and weights (bert provider).
    pub model_dir: String,
    /// Expected vector length. The hash provider produces exactly this.
    pub dimension: usize,
    pub batch_size: usize,
    /// Maximum tokens per input (bert provider).
    pub max_len: usize,
    pub base_url: String,
    pub timeout_secs: u64,
    pub show_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Bert,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            model_dir: "models/all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            batch_size: 32,
            max_len: 256,
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 30,
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// System message for answers grounded in retrieved material.
    pub system_prompt: String,
    /// System message for the no-retrieval comparison answer.
    pub baseline_system_prompt: String,
    pub temperature: Option<f32>,
    pub baseline_temperature: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemma3:1b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 120,
            system_prompt: "You are a helpful assistant that strictly follows the provided context.".to_string(),
            baseline_system_prompt: "You are a well-read AI researcher. Answer using your prior knowledge.".to_string(),
            temperature: Some(0.2),
            baseline_temperature: Some(0.4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self { Self { top_k: 3 } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persist the built index and reuse it while the corpus is unchanged.
    pub enabled: bool,
    pub uri: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { enabled: false, uri: "data/index/lancedb".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory scanned for `*.txt` source texts.
    pub source_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self { Self { source_dir: "data/txt".to_string() } }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub retry: RetryPolicy,
    pub store: StoreConfig,
}

pub struct Config {
    figment: Figment,
    env_name: String,
    /// Relative paths in the settings resolve against this directory.
    base_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Like [`Config::load`], reading the TOML files from `dir`.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name, base_dir: Some(dir.to_path_buf()) };
        config.validate_for_env()?;
        Ok(config)
    }

    /// Wraps an already assembled figment (used by tests and embedders of the crate).
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self { figment, env_name: "dev".to_string(), base_dir: None };
        config.validate_for_env()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed settings. When loaded from a directory, `data.source_dir`,
    /// `embedding.model_dir` and a local `store.uri` are resolved against it.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        if let Some(base) = &self.base_dir {
            let resolve = |p: &str| resolve_with_base(base, p).to_string_lossy().into_owned();
            settings.data.source_dir = resolve(&settings.data.source_dir);
            settings.embedding.model_dir = resolve(&settings.embedding.model_dir);
            if !settings.store.uri.contains("://") {
                settings.store.uri = resolve(&settings.store.uri);
            }
        }
        Ok(settings)
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    fn validate_for_env(&self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        match self.env_name.as_str() {
            "prod" | "production" => {
                if settings.embedding.provider == EmbeddingProvider::Hash {
                    anyhow::bail!("embedding.provider = \"hash\" is a test double and is not allowed in production");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
