//! Craft dataset provider: fresh network fetch with an on-disk fallback.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use crate::config::TownStarConfig;
use crate::craft::CraftDataset;
use crate::storage::{read_text_file, write_file_locked, CRAFT_DATA_FILE};

/// Where a loaded dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CraftDataSource {
    Fresh,
    Cached,
}

#[derive(Debug, Clone)]
pub struct LoadedCraftData {
    pub dataset: CraftDataset,
    pub source: CraftDataSource,
}

/// Supplies the craft dataset for one resolution request.
///
/// Every [`load`](Self::load) fetches the published document again. A good
/// download replaces `<data_dir>/craft_data.json`; a failed one falls back to
/// that file.
pub struct CraftDataProvider {
    url: String,
    timeout_seconds: u32,
    cache_path: PathBuf,
    client: reqwest::Client,
}

impl CraftDataProvider {
    pub fn new(config: &TownStarConfig, data_dir: &str) -> Self {
        Self {
            url: config.craft_data_url.clone(),
            timeout_seconds: config.timeout_seconds.max(1),
            cache_path: Path::new(data_dir).join(CRAFT_DATA_FILE),
            client: reqwest::Client::new(),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Fetch fresh data, falling back to the cached copy.
    pub async fn load(&self) -> Result<LoadedCraftData> {
        match self.fetch_remote().await {
            Ok((raw, dataset)) => {
                if let Err(e) = write_file_locked(&self.cache_path, &raw).await {
                    warn!(
                        "Failed to cache craft data at {}: {}",
                        self.cache_path.display(),
                        e
                    );
                }
                info!("Loaded {} craft recipes from {}", dataset.len(), self.url);
                Ok(LoadedCraftData {
                    dataset,
                    source: CraftDataSource::Fresh,
                })
            }
            Err(e) => {
                warn!("Unable to retrieve craft data ({}); trying cached copy", e);
                match self.load_cached().await? {
                    Some(dataset) => {
                        info!(
                            "Using cached craft data ({} recipes) from {}",
                            dataset.len(),
                            self.cache_path.display()
                        );
                        Ok(LoadedCraftData {
                            dataset,
                            source: CraftDataSource::Cached,
                        })
                    }
                    None => Err(anyhow!("craft data unavailable: {}", e)),
                }
            }
        }
    }

    /// Previously cached dataset, if any.
    pub async fn load_cached(&self) -> Result<Option<CraftDataset>> {
        match read_text_file(&self.cache_path).await? {
            Some(raw) => {
                let dataset = CraftDataset::from_json(&raw).map_err(|e| {
                    anyhow!("Cached craft data at {} is unusable: {}", self.cache_path.display(), e)
                })?;
                Ok(Some(dataset))
            }
            None => Ok(None),
        }
    }

    async fn fetch_remote(&self) -> Result<(String, CraftDataset)> {
        debug!("Fetching craft data from: {}", self.url);
        let request = self.client.get(&self.url);
        let response = timeout(Duration::from_secs(self.timeout_seconds as u64), request.send())
            .await
            .map_err(|_| anyhow!("Request timeout after {}s", self.timeout_seconds))?
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("API returned status: {}", response.status()));
        }
        let raw = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read craft data body: {}", e))?;
        let dataset = CraftDataset::from_json(&raw)?;
        Ok((raw, dataset))
    }
}
