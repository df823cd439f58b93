//! File-backed index of OpenSea asset names to token ids.

use anyhow::{anyhow, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::types::CachedAsset;
use crate::storage::{read_json_file, write_file_locked, ASSET_INDEX_FILE};

#[derive(Debug, Default, Serialize, Deserialize)]
struct AssetIndex {
    #[serde(default)]
    assets: Vec<CachedAsset>,
}

/// In-memory view of `<data_dir>/os_assets.json`.
///
/// Mutations only touch memory; call [`save`](Self::save) to persist.
#[derive(Debug)]
pub struct AssetStore {
    path: PathBuf,
    assets: Vec<CachedAsset>,
    dirty: bool,
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl AssetStore {
    /// Open the index in `data_dir`, starting empty when the file is absent.
    pub async fn open(data_dir: &str) -> Result<Self> {
        let path = Path::new(data_dir).join(ASSET_INDEX_FILE);
        let index: AssetIndex = read_json_file(&path).await?.unwrap_or_default();
        debug!(
            "Loaded {} cached OpenSea assets from {}",
            index.assets.len(),
            path.display()
        );
        Ok(Self {
            path,
            assets: index.assets,
            dirty: false,
        })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add an asset unless `(collection, token_id)` is already indexed.
    /// Returns whether the index changed.
    pub fn insert(&mut self, asset: CachedAsset) -> bool {
        let exists = self
            .assets
            .iter()
            .any(|a| a.collection == asset.collection && a.token_id == asset.token_id);
        if exists {
            return false;
        }
        self.assets.push(asset);
        self.dirty = true;
        true
    }

    /// First asset in `collection` whose name matches, ignoring case and
    /// surrounding whitespace.
    pub fn find(&self, collection: &str, name: &str) -> Option<&CachedAsset> {
        self.assets
            .iter()
            .find(|a| a.collection == collection && same_name(&a.name, name))
    }

    /// Persist pending changes.
    pub async fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let index = AssetIndex {
            assets: self.assets.clone(),
        };
        let json = serde_json::to_string_pretty(&index)
            .map_err(|e| anyhow!("Failed to serialize asset index: {}", e))?;
        write_file_locked(&self.path, &json).await?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(collection: &str, token: &str, name: &str) -> CachedAsset {
        CachedAsset {
            token_id: token.to_string(),
            name: name.to_string(),
            contract_address: "0xabc".to_string(),
            collection: collection.to_string(),
        }
    }

    #[test]
    fn insert_is_idempotent_per_collection() {
        let dir = tempfile::tempdir().unwrap();
        let mut store =
            tokio_test::block_on(AssetStore::open(dir.path().to_str().unwrap())).unwrap();
        assert!(store.insert(asset("town-star", "1", "Wheat Stand")));
        assert!(!store.insert(asset("town-star", "1", "Wheat Stand")));
        assert!(store.insert(asset("mirandus", "1", "Wharf")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn find_ignores_case_and_padding() {
        let dir = tempfile::tempdir().unwrap();
        let mut store =
            tokio_test::block_on(AssetStore::open(dir.path().to_str().unwrap())).unwrap();
        store.insert(asset("town-star", "7", "Wheat Stand"));
        assert_eq!(store.find("town-star", "  wheat STAND ").unwrap().token_id, "7");
        assert!(store.find("mirandus", "Wheat Stand").is_none());
    }
}
