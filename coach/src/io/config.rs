//! Coach configuration stored in `coach.toml`, plus API keys from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "coach.toml";

/// Coach configuration (TOML).
///
/// Human-edited and optional. Missing fields fall back to defaults. Secrets
/// never live here; see [`ApiKeys`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoachConfig {
    /// Model identifier sent with every completion request.
    pub model: String,

    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,

    pub temperature: f32,

    /// HTTP timeout for a single LLM or search request.
    pub request_timeout_secs: u64,

    /// Maximum completion/tool cycles per agent invocation.
    pub max_tool_rounds: u32,

    /// Directory for session and trace logs.
    pub logs_dir: PathBuf,

    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: u32,
    /// Tavily search depth: `basic` or `advanced`.
    pub search_depth: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            search_depth: "basic".to_string(),
        }
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            model: "google/gemini-3-flash-pre-thinking".to_string(),
            base_url: "https://api.vsegpt.ru/v1".to_string(),
            temperature: 0.2,
            request_timeout_secs: 120,
            max_tool_rounds: 4,
            logs_dir: PathBuf::from("./logs"),
            search: SearchConfig::default(),
        }
    }
}

impl CoachConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow!("base_url must be an http(s) url"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be within 0.0..=2.0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.logs_dir.as_os_str().is_empty() {
            return Err(anyhow!("logs_dir must be non-empty"));
        }
        if self.search.max_results == 0 {
            return Err(anyhow!("search.max_results must be > 0"));
        }
        if !matches!(self.search.search_depth.as_str(), "basic" | "advanced") {
            return Err(anyhow!("search.search_depth must be 'basic' or 'advanced'"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CoachConfig::default()`.
pub fn load_config(path: &Path) -> Result<CoachConfig> {
    if !path.exists() {
        let cfg = CoachConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CoachConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CoachConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

/// API credentials read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeys {
    pub llm: String,
    /// Web search is only offered to agents when this is set.
    pub search: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve keys through `lookup`. `COACH_API_KEY` wins over `VSEGPT_API_KEY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let llm = non_empty("COACH_API_KEY")
            .or_else(|| non_empty("VSEGPT_API_KEY"))
            .ok_or_else(|| anyhow!("missing llm api key (set COACH_API_KEY or VSEGPT_API_KEY)"))?;
        Ok(Self {
            llm,
            search: non_empty("TAVILY_API_KEY"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, CoachConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("coach.toml");
        let cfg = CoachConfig {
            model: "openai/gpt-4o-mini".to_string(),
            ..CoachConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("coach.toml");
        fs::write(&path, "temperature = 0.7\n[search]\nmax_results = 3\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.search.max_results, 3);
        assert_eq!(cfg.search.search_depth, "basic");
        assert_eq!(cfg.model, CoachConfig::default().model);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = CoachConfig {
            request_timeout_secs: 0,
            ..CoachConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = CoachConfig {
            search: SearchConfig {
                search_depth: "deep".to_string(),
                ..SearchConfig::default()
            },
            ..CoachConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("search_depth"));
    }

    #[test]
    fn api_keys_prefer_coach_key_and_ignore_blank_search() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("COACH_API_KEY", "primary"),
            ("VSEGPT_API_KEY", "fallback"),
            ("TAVILY_API_KEY", "  "),
        ]);
        let keys = ApiKeys::from_lookup(|name| env.get(name).map(|v| v.to_string()))
            .expect("keys");
        assert_eq!(keys.llm, "primary");
        assert_eq!(keys.search, None);
    }

    #[test]
    fn api_keys_require_llm_key() {
        let err = ApiKeys::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("COACH_API_KEY"));
    }
}
