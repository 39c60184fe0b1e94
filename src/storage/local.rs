//! Local filesystem storage implementation.
//!
//! Keeps every auction in a single JSON document that is rewritten atomically
//! on each change.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml        # Harvester configuration
//! └── auctions.json      # StoreData
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Auction;
use crate::storage::{AuctionStore, StoreData};

/// JSON file storage backend.
pub struct JsonStore {
    root_dir: PathBuf,
    file_name: String,
    /// Serializes read-modify-write cycles on the store file
    lock: Mutex<()>,
}

impl JsonStore {
    /// Create a JsonStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            file_name: file_name.into(),
            lock: Mutex::new(()),
        }
    }

    /// Full path of the store file.
    pub fn location(&self) -> PathBuf {
        self.path(&self.file_name)
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn read_auctions(&self) -> Result<Vec<Auction>> {
        match self.read_json::<StoreData>(&self.file_name).await? {
            Some(data) => Ok(data.auctions),
            None => {
                log::debug!("No {} found, starting empty", self.file_name);
                Ok(Vec::new())
            }
        }
    }

    async fn write_auctions(&self, auctions: Vec<Auction>) -> Result<()> {
        let data = StoreData::new(auctions);
        self.write_json(&self.file_name, &data).await?;
        log::debug!("{} auctions written to {}", data.count, self.file_name);
        Ok(())
    }
}

#[async_trait]
impl AuctionStore for JsonStore {
    async fn known_ids(&self) -> Result<HashSet<String>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_auctions()
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect())
    }

    async fn insert(&self, auctions: &[Auction]) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut stored = self.read_auctions().await?;
        let mut ids: HashSet<String> = stored.iter().map(|a| a.id.clone()).collect();

        let mut inserted = 0;
        for auction in auctions {
            if ids.insert(auction.id.clone()) {
                stored.push(auction.clone());
                inserted += 1;
            } else {
                log::debug!("Auction {} already stored, skipping", auction.id);
            }
        }

        if inserted > 0 {
            self.write_auctions(stored).await?;
        }
        Ok(inserted)
    }

    async fn mark_delivered(&self, ids: &[String]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut stored = self.read_auctions().await?;
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let mut changed = false;
        for auction in stored.iter_mut().filter(|a| ids.contains(a.id.as_str())) {
            if !auction.was_delivered {
                auction.was_delivered = true;
                changed = true;
            }
        }

        if changed {
            self.write_auctions(stored).await?;
        }
        Ok(())
    }

    async fn pending_delivery(&self, now: DateTime<Utc>) -> Result<Vec<Auction>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_auctions()
            .await?
            .into_iter()
            .filter(|a| !a.was_delivered && a.end_date.is_some_and(|end| end > now))
            .collect())
    }

    async fn load_all(&self) -> Result<Vec<Auction>> {
        let _guard = self.lock.lock().await;
        self.read_auctions().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::TempDir;

    use super::*;
    use crate::models::AuctionStatus;

    fn auction(id: &str, end_in_days: Option<i64>) -> Auction {
        let mut auction = Auction::new(id, AuctionStatus::Active);
        auction.end_date = end_in_days.map(|d| Utc::now() + Duration::days(d));
        auction
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path(), "auctions.json");

        store.write_bytes("test.txt", b"hello").await.unwrap();
        let data = store.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path(), "auctions.json");

        assert!(store.known_ids().await.unwrap().is_empty());
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(!store.location().exists());
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path(), "auctions.json");

        let batch = vec![auction("SUB-1", Some(3)), auction("SUB-2", Some(3))];
        assert_eq!(store.insert(&batch).await.unwrap(), 2);
        assert_eq!(store.insert(&batch).await.unwrap(), 0);

        let ids = store.known_ids().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("SUB-1"));

        let data: StoreData = store.read_json("auctions.json").await.unwrap().unwrap();
        assert_eq!(data.count, 2);
    }

    #[tokio::test]
    async fn test_pending_delivery_filters() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path(), "auctions.json");

        let batch = vec![
            auction("SUB-future", Some(5)),
            auction("SUB-past", Some(-1)),
            auction("SUB-undated", None),
            auction("SUB-delivered", Some(5)),
        ];
        store.insert(&batch).await.unwrap();
        store
            .mark_delivered(&["SUB-delivered".to_string()])
            .await
            .unwrap();

        let pending = store.pending_delivery(Utc::now()).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["SUB-future"]);
    }

    #[tokio::test]
    async fn test_mark_delivered_persists() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path(), "auctions.json");
        store.insert(&[auction("SUB-1", Some(1))]).await.unwrap();

        store.mark_delivered(&["SUB-1".to_string()]).await.unwrap();

        let reopened = JsonStore::new(tmp.path(), "auctions.json");
        let all = reopened.load_all().await.unwrap();
        assert!(all[0].was_delivered);
    }
}
