use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            stale_after_days: default_stale_after_days(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/regulations.json")
}
fn default_stale_after_days() -> i64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: None,
            dims: None,
            url: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_gap_threshold")]
    pub gap_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            gap_threshold: default_gap_threshold(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_gap_threshold() -> f32 {
    0.5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.matching.top_k == 0 {
        anyhow::bail!("matching.top_k must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.matching.gap_threshold) {
        anyhow::bail!("matching.gap_threshold must be in [0.0, 1.0]");
    }

    if config.catalog.stale_after_days < 1 {
        anyhow::bail!("catalog.stale_after_days must be >= 1");
    }

    if let Some(dims) = config.embedding.dims {
        if dims == 0 {
            anyhow::bail!("embedding.dims must be > 0 when set");
        }
    }

    match config.embedding.provider.as_str() {
        "local" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be local or ollama.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let file = write_config("[db]\npath = \"data/ccm.sqlite\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.matching.top_k, 5);
        assert!((config.matching.gap_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.catalog.stale_after_days, 30);
        assert_eq!(config.embedding.provider, "local");
    }

    #[test]
    fn zero_top_k_rejected() {
        let file = write_config("[db]\npath = \"x.sqlite\"\n\n[matching]\ntop_k = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn out_of_range_gap_threshold_rejected() {
        let file = write_config("[db]\npath = \"x.sqlite\"\n\n[matching]\ngap_threshold = 1.5\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn unknown_provider_rejected() {
        let file = write_config("[db]\npath = \"x.sqlite\"\n\n[embedding]\nprovider = \"magic\"\n");
        assert!(load_config(file.path()).is_err());
    }
}
