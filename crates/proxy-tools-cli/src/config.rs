use anyhow::{Context, Result};
use proxy_deck::ResolverOptions;
use proxy_sheets::{NormalizerOptions, SheetOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "magic_cards";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Everything a run needs besides the deck list itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sheet: SheetOptions,
    pub normalizer: NormalizerOptions,
    pub resolver: ResolverOptions,
    /// Root of the per-deck output bundles
    pub output_dir: PathBuf,
    /// Response cache, downloaded artwork and normalized images
    pub cache_dir: PathBuf,
    pub http_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let output_dir = PathBuf::from(DEFAULT_OUTPUT_DIR);
        Self {
            sheet: SheetOptions::default(),
            normalizer: NormalizerOptions::default(),
            resolver: ResolverOptions::default(),
            cache_dir: output_dir.join("cache"),
            output_dir,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl PipelineConfig {
    /// Load a config from JSON; missing fields take their defaults
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save the config as pretty-printed JSON
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.sheet.validate()?;
        self.normalizer.validate()?;
        Ok(())
    }

    pub fn images_dir(&self) -> PathBuf {
        self.cache_dir.join("images")
    }

    pub fn normalized_dir(&self) -> PathBuf {
        self.cache_dir.join("UP")
    }
}
