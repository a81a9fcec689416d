use anyhow::{bail, Context, Result};
use ledgerlens_core::{Concurrency, DEFAULT_CONCURRENCY, DEFAULT_REPORT_EVERY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub processing: ProcessingSection,
    pub chat: ChatSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server, `/api/chat`
    Ollama,
    /// Any OpenAI-compatible `/v1/chat/completions` endpoint
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    /// Bearer token for OpenAI-compatible providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSection {
    pub max_concurrent_workers: usize,
    /// Log progress every N completed rows
    pub progress_every: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    /// Append each exchange to ~/.ledgerlens/chat/YYYY-MM-DD.md
    pub log_history: bool,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: "gemma3:latest".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.1,
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}

impl Default for ProcessingSection {
    fn default() -> Self {
        Self {
            max_concurrent_workers: DEFAULT_CONCURRENCY,
            progress_every: DEFAULT_REPORT_EVERY,
        }
    }
}

impl Default for ChatSection {
    fn default() -> Self {
        Self { log_history: true }
    }
}

impl Config {
    /// Apply environment overrides. `lookup` is `std::env::var` in the binary.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.model = model;
        }
        if let Some(t) = lookup("TEMPERATURE") {
            self.llm.temperature = t
                .trim()
                .parse()
                .with_context(|| format!("TEMPERATURE is not a number: {t}"))?;
        }
        if let Some(w) = lookup("MAX_CONCURRENT_WORKERS") {
            self.processing.max_concurrent_workers = w
                .trim()
                .parse()
                .with_context(|| format!("MAX_CONCURRENT_WORKERS is not an integer: {w}"))?;
        }
        if let Some(key) = lookup("LEDGERLENS_API_KEY") {
            self.llm.api_key = Some(key);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.processing.max_concurrent_workers == 0 {
            bail!("max_concurrent_workers must be at least 1");
        }
        if self.llm.base_url.trim().is_empty() {
            bail!("llm.base_url is empty");
        }
        if self.llm.model.trim().is_empty() {
            bail!("llm.model is empty");
        }
        Ok(())
    }

    pub fn concurrency(&self) -> Result<Concurrency> {
        Ok(Concurrency::new(self.processing.max_concurrent_workers)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_home()?.join("config.toml"))
}

pub fn read_config(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Load from `path` (or the default location), then the environment.
///
/// A missing default file means defaults; an explicit path must exist.
/// Call [`Config::validate`] once CLI overrides are applied.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut cfg = match path {
        Some(p) => read_config(p)?,
        None => {
            let p = config_path()?;
            if p.exists() { read_config(&p)? } else { Config::default() }
        }
    };
    cfg.apply_env(|k| std::env::var(k).ok())?;
    tracing::debug!(provider = ?cfg.llm.provider, model = %cfg.llm.model, base_url = %cfg.llm.base_url, "config loaded");
    Ok(cfg)
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
