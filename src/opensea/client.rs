//! OpenSea REST client with a name -> token index in front of it.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{timeout, Instant};

use super::asset_store::AssetStore;
use super::types::{AssetDetail, AssetPage, CachedAsset};
use crate::config::{CollectionConfig, OpenSeaConfig};

const API_KEY_HEADER: &str = "X-API-KEY";

/// Outcome of [`OpenSeaClient::find_asset`].
#[derive(Debug)]
pub enum AssetLookup {
    Found {
        asset: CachedAsset,
        detail: AssetDetail,
    },
    NotFound,
    UnknownCollection,
}

enum ScanEnd {
    Found(CachedAsset),
    /// Ran out of pages or hit `total_limit`.
    Exhausted,
    /// A page request failed.
    Interrupted,
}

pub struct OpenSeaClient {
    config: OpenSeaConfig,
    client: reqwest::Client,
    store: AssetStore,
    /// (collection, lowercased name) -> when a full scan missed it
    recent_misses: HashMap<(String, String), Instant>,
}

fn miss_key(slug: &str, name: &str) -> (String, String) {
    (slug.to_string(), name.trim().to_lowercase())
}

impl OpenSeaClient {
    pub fn new(config: OpenSeaConfig, store: AssetStore) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            store,
            recent_misses: HashMap::new(),
        }
    }

    fn miss_ttl(&self) -> Duration {
        Duration::from_secs(self.config.miss_ttl_seconds)
    }

    fn is_recent_miss(&self, slug: &str, name: &str) -> bool {
        let ttl = self.miss_ttl();
        self.recent_misses
            .get(&miss_key(slug, name))
            .is_some_and(|at| at.elapsed() < ttl)
    }

    fn remember_miss(&mut self, slug: &str, name: &str) {
        let ttl = self.miss_ttl();
        if ttl.is_zero() {
            return;
        }
        self.recent_misses.retain(|_, at| at.elapsed() < ttl);
        self.recent_misses.insert(miss_key(slug, name), Instant::now());
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        debug!("OpenSea request: {} {:?}", url, query);
        let mut request = self.client.get(url).query(query);
        if !self.config.api_key.is_empty() {
            request = request.header(API_KEY_HEADER, &self.config.api_key);
        }
        let secs = self.config.timeout_seconds.max(1);
        let response = timeout(Duration::from_secs(secs as u64), request.send())
            .await
            .map_err(|_| anyhow!("Request timeout after {}s", secs))?
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("API returned status: {}", response.status()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| anyhow!("Failed to parse OpenSea response: {}", e))
    }

    /// One page of assets in `collection`, starting at `offset`. Unnamed
    /// assets are skipped.
    pub async fn asset_page(
        &self,
        contract_address: &str,
        collection: &str,
        offset: u32,
    ) -> Result<Vec<CachedAsset>> {
        let url = format!("{}/assets", self.config.api_base.trim_end_matches('/'));
        let query = [
            ("asset_contract_address", contract_address.to_string()),
            ("offset", offset.to_string()),
            ("limit", self.config.page_limit.to_string()),
            ("collection", collection.to_string()),
        ];
        let page: AssetPage = self.get_json(&url, &query).await?;
        Ok(page
            .assets
            .into_iter()
            .filter_map(|element| {
                let name = element.name?.trim().to_string();
                if name.is_empty() || element.token_id.is_empty() {
                    return None;
                }
                Some(CachedAsset {
                    token_id: element.token_id,
                    name,
                    contract_address: contract_address.to_string(),
                    collection: collection.to_string(),
                })
            })
            .collect())
    }

    /// Full asset record for a cached pointer.
    pub async fn asset_detail(&self, asset: &CachedAsset) -> Result<AssetDetail> {
        let url = format!(
            "{}/asset/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            urlencoding::encode(&asset.contract_address),
            urlencoding::encode(&asset.token_id)
        );
        self.get_json(&url, &[("format", "json".to_string())]).await
    }

    /// Look an asset up by name in a configured collection.
    ///
    /// The local index answers first. On a miss the collection is scanned
    /// page by page (unless it is `cache_only`), indexing every asset seen and
    /// stopping at the first name match. A name that a complete scan did not
    /// find is answered `NotFound` without rescanning for `miss_ttl_seconds`.
    pub async fn find_asset(&mut self, slug: &str, name: &str) -> Result<AssetLookup> {
        let collection = match self.config.collections.get(slug) {
            Some(c) => c.clone(),
            None => return Ok(AssetLookup::UnknownCollection),
        };

        let cached = self.store.find(slug, name).cloned();
        let asset = match cached {
            Some(asset) => Some(asset),
            None if collection.cache_only => {
                debug!("'{}' not cached and {} is cache-only", name, slug);
                None
            }
            None if self.is_recent_miss(slug, name) => {
                debug!("'{}' missed a recent scan of {}", name, slug);
                None
            }
            None => match self.scan_collection(slug, &collection, name).await {
                ScanEnd::Found(asset) => Some(asset),
                ScanEnd::Exhausted => {
                    self.remember_miss(slug, name);
                    None
                }
                ScanEnd::Interrupted => None,
            },
        };

        match asset {
            Some(asset) => {
                let detail = self.asset_detail(&asset).await?;
                Ok(AssetLookup::Found { asset, detail })
            }
            None => Ok(AssetLookup::NotFound),
        }
    }

    async fn scan_collection(
        &mut self,
        slug: &str,
        collection: &CollectionConfig,
        name: &str,
    ) -> ScanEnd {
        let step = self.config.page_limit.max(1);
        let mut offset = 0u32;
        let mut end = ScanEnd::Exhausted;
        info!("Scanning OpenSea collection {} for '{}'", slug, name);

        while offset < self.config.total_limit {
            let page = match self
                .asset_page(&collection.contract_address, slug, offset)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!("OpenSea page at offset {} failed: {}", offset, e);
                    end = ScanEnd::Interrupted;
                    break;
                }
            };
            if page.is_empty() {
                break;
            }
            for asset in page {
                self.store.insert(asset);
            }
            if let Some(asset) = self.store.find(slug, name) {
                end = ScanEnd::Found(asset.clone());
                break;
            }
            offset = offset.saturating_add(step);
        }

        if let Err(e) = self.store.save().await {
            warn!("Failed to persist OpenSea asset index: {}", e);
        }
        end
    }
}
