//! # Storage Module - JSON File Persistence
//!
//! ntmbot keeps two small caches on disk under the configured data directory:
//!
//! ```text
//! data/
//! ├── craft_data.json   ← last good copy of the Town Star craft dataset
//! └── os_assets.json    ← OpenSea asset index (name -> token id per collection)
//! ```
//!
//! Writes take an exclusive `fs2` lock on the destination, write a temp file in
//! the same directory and atomically rename it into place, so a reader never
//! observes a half-written document and two bot instances sharing a data
//! directory do not interleave writes.

use anyhow::{anyhow, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Cached craft dataset file name.
pub const CRAFT_DATA_FILE: &str = "craft_data.json";

/// OpenSea asset index file name.
pub const ASSET_INDEX_FILE: &str = "os_assets.json";

/// Create the data directory if missing.
pub async fn ensure_data_dir(data_dir: &str) -> Result<()> {
    fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow!("Failed to create data directory {}: {}", data_dir, e))
}

/// Read a whole text file, `None` when it does not exist.
pub async fn read_text_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        // Guard against any accidental leading NULs
        Ok(data) => Ok(Some(data.trim_start_matches('\0').to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow!("Failed reading {}: {}", path.display(), e)),
    }
}

/// Read and parse a JSON file, `None` when it does not exist.
pub async fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match read_text_file(path).await? {
        Some(data) => {
            let value = serde_json::from_str(&data)
                .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Write content to a file with exclusive locking and atomic replacement.
pub async fn write_file_locked(path: &Path, content: &str) -> Result<()> {
    let path = path.to_path_buf();
    let content = content.to_string();
    // fs2 locks are blocking; keep them off the async workers
    tokio::task::spawn_blocking(move || write_file_locked_blocking(&path, &content))
        .await
        .map_err(|e| anyhow!("write task failed: {}", e))?
}

fn write_file_locked_blocking(path: &Path, content: &str) -> Result<()> {
    use std::fs::{self, File, OpenOptions};

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("data.json");
    let mut counter = 0u32;
    let (tmp_path, tmp) = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(tmp) => break (candidate, tmp),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(anyhow!("Failed to create temp file for atomic write: {}", e)),
        }
    };
    replace_with_temp(tmp, content, &tmp_path, path)?;
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    drop(lock_file);
    Ok(())
}

/// Fill `tmp` and rename it over `path`. The temp file is removed on failure.
fn replace_with_temp(tmp: std::fs::File, content: &str, tmp_path: &Path, path: &Path) -> Result<()> {
    fn write_and_rename(
        mut tmp: std::fs::File,
        content: &str,
        tmp_path: &Path,
        path: &Path,
    ) -> std::io::Result<()> {
        use std::io::Write;

        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        let _ = tmp.sync_all();
        drop(tmp);
        std::fs::rename(tmp_path, path)
    }

    write_and_rename(tmp, content, tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(tmp_path);
        anyhow!("Failed to replace {}: {}", path.display(), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn write_then_read_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        tokio_test::block_on(async {
            assert!(read_json_file::<BTreeMap<String, u32>>(&path).await.unwrap().is_none());
            write_file_locked(&path, r#"{"a": 1}"#).await.unwrap();
            write_file_locked(&path, r#"{"b": 2}"#).await.unwrap();
            let back: BTreeMap<String, u32> = read_json_file(&path).await.unwrap().unwrap();
            assert_eq!(back.get("b"), Some(&2));
            assert!(!back.contains_key("a"));
        });
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let res = tokio_test::block_on(read_json_file::<BTreeMap<String, u32>>(&path));
        assert!(res.is_err());
    }

    #[test]
    fn failed_replace_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let target = dir.path().join("occupied");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let tmp_path = dir.path().join(".occupied.tmp-test");
        let tmp = std::fs::File::create(&tmp_path).unwrap();
        let res = replace_with_temp(tmp, "{}", &tmp_path, &target);
        assert!(res.is_err());
        assert!(!tmp_path.exists());
        assert!(target.join("keep").exists());
    }
}
