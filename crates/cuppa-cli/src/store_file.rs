//! JSON-file-backed remote store.
//!
//! The single-machine stand-in for the hosted document store: one JSON
//! document holds the shared collection and every private collection,
//! plus the id and timestamp high-water marks. Each operation takes an
//! advisory lock on a sidecar `.lock` file, loads the document, mutates,
//! and writes back atomically (temp file + rename), so concurrent `cup`
//! invocations never observe a torn document.
//!
//! Subscriptions are poll-diff: each poll re-reads the document and emits
//! one batch describing what changed since the last poll. The first poll
//! is the initial snapshot.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cuppa_core::model::draft::{ItemDraft, ItemPatch};
use cuppa_core::model::item::Item;
use cuppa_core::scope::CollectionPath;
use cuppa_core::store::{
    ChangeBatch, MonotonicClock, RemoteStore, StoreError, StoreSubscription,
};

const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The on-disk document: all collections plus server-side counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct StoreDocument {
    version: u32,
    next_id: u64,
    last_ts_us: i64,
    collections: BTreeMap<String, BTreeMap<String, Item>>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            next_id: 0,
            last_ts_us: 0,
            collections: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A [`RemoteStore`] persisted to one JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_path: PathBuf,
}

struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Advisory lock releases on close; unlock errors are moot here.
        let _ = FileExt::unlock(&self.file);
    }
}

impl FileStore {
    /// A store over `data_path`; the file is created on first write.
    pub fn open(data_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_path = data_path.into();
        if let Some(parent) = data_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("create data dir: {e}")))?;
        }
        Ok(Self { data_path })
    }

    /// Write an empty catalog document if none exists yet.
    ///
    /// Returns `true` when a new file was created.
    pub fn init(&self) -> Result<bool, StoreError> {
        let _lock = self.lock_exclusive()?;
        if self.data_path.exists() {
            // Validate rather than clobber.
            self.load_document()?;
            return Ok(false);
        }
        self.save_document(&StoreDocument::default())?;
        Ok(true)
    }

    fn lock_path(&self) -> PathBuf {
        let mut path = self.data_path.clone();
        path.as_mut_os_string().push(".lock");
        path
    }

    fn lock_exclusive(&self) -> Result<StoreLock, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(|e| StoreError::Unavailable(format!("open lock file: {e}")))?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| StoreError::Unavailable(format!("acquire lock: {e}")))?;
        Ok(StoreLock { file })
    }

    fn load_document(&self) -> Result<StoreDocument, StoreError> {
        if !self.data_path.exists() {
            return Ok(StoreDocument::default());
        }
        let raw = fs::read_to_string(&self.data_path)
            .map_err(|e| StoreError::Unavailable(format!("read catalog: {e}")))?;
        let doc: StoreDocument = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Unavailable(format!("parse catalog: {e}")))?;
        if doc.version > FORMAT_VERSION {
            return Err(StoreError::Unavailable(format!(
                "catalog format v{} is newer than this binary understands (v{FORMAT_VERSION})",
                doc.version
            )));
        }
        Ok(doc)
    }

    fn save_document(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::Unavailable(format!("serialize catalog: {e}")))?;
        let tmp = self.data_path.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .map_err(|e| StoreError::Unavailable(format!("write catalog: {e}")))?;
        fs::rename(&tmp, &self.data_path)
            .map_err(|e| StoreError::Unavailable(format!("replace catalog: {e}")))?;
        Ok(())
    }

    /// Lock, load, mutate, save.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut StoreDocument) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _lock = self.lock_exclusive()?;
        let mut doc = self.load_document()?;
        let result = f(&mut doc)?;
        self.save_document(&doc)?;
        Ok(result)
    }

    fn read_collection(
        &self,
        path: &CollectionPath,
    ) -> Result<BTreeMap<String, Item>, StoreError> {
        let _lock = self.lock_exclusive()?;
        let doc = self.load_document()?;
        Ok(doc.collections.get(path.as_str()).cloned().unwrap_or_default())
    }
}

impl RemoteStore for FileStore {
    fn subscribe(&self, path: &CollectionPath) -> Result<Box<dyn StoreSubscription>, StoreError> {
        // Validate the document up front so a corrupt file fails the bind,
        // not the first poll.
        let _ = self.read_collection(path)?;
        debug!(path = %path, file = %self.data_path.display(), "file store subscribe");
        Ok(Box::new(FileSubscription {
            store: self.clone(),
            path: path.clone(),
            last_seen: BTreeMap::new(),
            primed: false,
        }))
    }

    fn create(
        &self,
        path: &CollectionPath,
        owner: &str,
        draft: &ItemDraft,
    ) -> Result<Item, StoreError> {
        self.mutate(|doc| {
            doc.next_id += 1;
            let id = format!("srv-{}", doc.next_id);
            let mut clock = MonotonicClock::resume_from(doc.last_ts_us);
            let stamp = clock.next();
            doc.last_ts_us = clock.last_us();

            let item = Item {
                id: id.clone(),
                name: draft.name.clone(),
                address: draft.address.clone(),
                external_place_ref: draft.external_place_ref.clone(),
                rating: draft.rating,
                price_level: draft.price_level,
                category: draft.category,
                tags: draft.tags.clone(),
                notes: draft.notes.clone(),
                supports_cold_brew: draft.supports_cold_brew,
                coordinates: draft.coordinates,
                owner_id: owner.to_string(),
                created_at: stamp,
                updated_at: stamp,
            };
            doc.collections
                .entry(path.as_str().to_string())
                .or_default()
                .insert(id, item.clone());
            debug!(path = %path, id = %item.id, "file store create");
            Ok(item)
        })
    }

    fn patch(
        &self,
        path: &CollectionPath,
        id: &str,
        patch: &ItemPatch,
    ) -> Result<(), StoreError> {
        self.mutate(|doc| {
            let mut clock = MonotonicClock::resume_from(doc.last_ts_us);
            let stamp = clock.next();
            let Some(item) = doc
                .collections
                .get_mut(path.as_str())
                .and_then(|c| c.get_mut(id))
            else {
                return Err(StoreError::NotFound(id.to_string()));
            };
            patch.apply_to(item);
            item.updated_at = stamp;
            doc.last_ts_us = clock.last_us();
            debug!(path = %path, id, "file store patch");
            Ok(())
        })
    }

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError> {
        self.mutate(|doc| {
            let removed = doc
                .collections
                .get_mut(path.as_str())
                .and_then(|c| c.remove(id))
                .is_some();
            debug!(path = %path, id, removed, "file store delete");
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// FileSubscription
// ---------------------------------------------------------------------------

/// Poll-diff subscription: compares the document against the last-seen
/// snapshot and reports the difference as one batch.
struct FileSubscription {
    store: FileStore,
    path: CollectionPath,
    last_seen: BTreeMap<String, Item>,
    primed: bool,
}

impl StoreSubscription for FileSubscription {
    fn poll(&mut self) -> Result<Vec<ChangeBatch>, StoreError> {
        let current = self.store.read_collection(&self.path)?;

        let mut batch = ChangeBatch::default();
        for (id, item) in &current {
            match self.last_seen.get(id) {
                None => batch.added.push(item.clone()),
                Some(prev) if prev != item => batch.modified.push(item.clone()),
                Some(_) => {}
            }
        }
        for id in self.last_seen.keys() {
            if !current.contains_key(id) {
                batch.removed.push(id.clone());
            }
        }

        let first_poll = !self.primed;
        self.primed = true;
        self.last_seen = current;

        if first_poll || !batch.is_empty() {
            Ok(vec![batch])
        } else {
            Ok(Vec::new())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::Path;

    use cuppa_core::ViewScope;

    use super::*;

    fn store_in(dir: &Path) -> FileStore {
        FileStore::open(dir.join("catalog.json")).expect("open")
    }

    fn shared() -> CollectionPath {
        ViewScope::Shared.collection_path()
    }

    #[test]
    fn create_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let created = store
            .create(&shared(), "u1", &ItemDraft::new("Crema"))
            .expect("create");
        assert_eq!(created.id, "srv-1");

        let reopened = store_in(dir.path());
        let collection = reopened.read_collection(&shared()).expect("read");
        assert_eq!(collection.len(), 1);
        assert_eq!(collection["srv-1"].name, "Crema");
    }

    #[test]
    fn ids_continue_after_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        store_in(dir.path())
            .create(&shared(), "u1", &ItemDraft::new("A"))
            .expect("create");
        let second = store_in(dir.path())
            .create(&shared(), "u1", &ItemDraft::new("B"))
            .expect("create");
        assert_eq!(second.id, "srv-2");
    }

    #[test]
    fn subscription_first_poll_is_snapshot_then_diffs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());
        store
            .create(&shared(), "u1", &ItemDraft::new("A"))
            .expect("create");

        let mut sub = store.subscribe(&shared()).expect("subscribe");
        let batches = sub.poll().expect("poll");
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].added.len(), 1);

        // No change: nothing delivered.
        assert!(sub.poll().expect("poll").is_empty());

        // A write from "elsewhere" (same file, different handle).
        let other = store_in(dir.path());
        let b = other
            .create(&shared(), "u2", &ItemDraft::new("B"))
            .expect("create");
        let patch = ItemPatch {
            notes: Some("edited".into()),
            ..ItemPatch::default()
        };
        other.patch(&shared(), "srv-1", &patch).expect("patch");
        other.delete(&shared(), &b.id).expect("delete");

        let batches = sub.poll().expect("poll");
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert!(batch.added.is_empty(), "B was added and deleted");
        assert_eq!(batch.modified.len(), 1);
        assert_eq!(batch.modified[0].notes, "edited");
        assert!(batch.removed.is_empty());
    }

    #[test]
    fn patch_missing_id_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let err = store
            .patch(&shared(), "srv-404", &ItemPatch::default())
            .expect_err("missing");
        assert_eq!(err, StoreError::NotFound("srv-404".into()));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());
        store.delete(&shared(), "srv-404").expect("no-op delete");
    }

    #[test]
    fn corrupt_document_reports_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("catalog.json");
        fs::write(&data, "{ not json").expect("write");
        let store = FileStore::open(&data).expect("open");
        let err = store.subscribe(&shared()).err().expect("corrupt");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn newer_format_version_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = dir.path().join("catalog.json");
        fs::write(&data, r#"{"version": 99}"#).expect("write");
        let store = FileStore::open(&data).expect("open");
        let err = store.subscribe(&shared()).err().expect("future format");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn collections_are_isolated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let private = ViewScope::Private("u1".into()).collection_path();
        store
            .create(&private, "u1", &ItemDraft::new("Mine"))
            .expect("create");
        assert!(store.read_collection(&shared()).expect("read").is_empty());
        assert_eq!(store.read_collection(&private).expect("read").len(), 1);
    }
}
