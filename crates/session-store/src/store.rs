//! File-backed snapshot store.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use recompose_common::config::StorageConfig;
use recompose_common::error::{RecomposeError, RecomposeResult};
use recompose_model::session::{SessionSnapshot, SnapshotMeta};
use serde::{Deserialize, Serialize};

/// Which retention pool a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Explicit user save.
    Save,
    /// Automatic version taken after an edit.
    Version,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 2] = [SnapshotKind::Save, SnapshotKind::Version];

    fn dir_name(&self) -> &'static str {
        match self {
            Self::Save => "saves",
            Self::Version => "versions",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Version => "version",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_prefix())
    }
}

/// Maximum entries kept per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionLimits {
    pub max_saves: usize,
    pub max_versions: usize,
}

impl RetentionLimits {
    pub fn for_kind(&self, kind: SnapshotKind) -> usize {
        let limit = match kind {
            SnapshotKind::Save => self.max_saves,
            SnapshotKind::Version => self.max_versions,
        };
        limit.max(1)
    }
}

impl Default for RetentionLimits {
    fn default() -> Self {
        Self {
            max_saves: 200,
            max_versions: 500,
        }
    }
}

impl From<&StorageConfig> for RetentionLimits {
    fn from(config: &StorageConfig) -> Self {
        Self {
            max_saves: config.max_saves,
            max_versions: config.max_versions,
        }
    }
}

/// A snapshot as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub id: String,
    pub kind: SnapshotKind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub meta: SnapshotMeta,
    pub snapshot: SessionSnapshot,
}

/// Listing entry; the payload is not loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: String,
    pub kind: SnapshotKind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub meta: SnapshotMeta,
}

impl From<&StoredSnapshot> for SnapshotSummary {
    fn from(stored: &StoredSnapshot) -> Self {
        Self {
            id: stored.id.clone(),
            kind: stored.kind,
            created_at: stored.created_at,
            meta: stored.meta.clone(),
        }
    }
}

/// An open snapshot store.
///
/// The handle owns the directory layout for its lifetime; [`SnapshotStore::close`]
/// consumes it, so no operation can run against a closed store.
#[derive(Debug)]
pub struct SnapshotStore {
    root: PathBuf,
    limits: RetentionLimits,
    sequence: u32,
}

impl SnapshotStore {
    /// Open the store at `root`, creating its directories as needed.
    pub fn open(root: impl AsRef<Path>, limits: RetentionLimits) -> RecomposeResult<Self> {
        let root = root.as_ref().to_path_buf();
        for kind in SnapshotKind::ALL {
            let dir = root.join(kind.dir_name());
            std::fs::create_dir_all(&dir).map_err(|e| {
                RecomposeError::storage(format!("cannot create {}: {e}", dir.display()))
            })?;
        }
        tracing::debug!(root = %root.display(), "Snapshot store opened");
        Ok(Self {
            root,
            limits,
            sequence: 0,
        })
    }

    /// Open the store described by the application config.
    pub fn from_config(config: &StorageConfig) -> RecomposeResult<Self> {
        Self::open(&config.root, RetentionLimits::from(config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> RetentionLimits {
        self.limits
    }

    /// Write a snapshot and evict the oldest entries past the kind's limit.
    pub fn insert(
        &mut self,
        kind: SnapshotKind,
        snapshot: &SessionSnapshot,
        meta: SnapshotMeta,
    ) -> RecomposeResult<SnapshotSummary> {
        let created_at = Utc::now();
        let id = self.next_id(kind, created_at);
        let stored = StoredSnapshot {
            id,
            kind,
            created_at,
            meta,
            snapshot: snapshot.clone(),
        };

        let path = self.path_for(kind, &stored.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(&stored)?;
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| RecomposeError::storage(format!("cannot write {}: {e}", path.display())))?;

        tracing::info!(kind = %kind, id = %stored.id, "Snapshot stored");
        self.evict(kind)?;
        Ok(SnapshotSummary::from(&stored))
    }

    /// Summaries of `kind`, newest first.
    pub fn list(&self, kind: SnapshotKind) -> RecomposeResult<Vec<SnapshotSummary>> {
        let mut summaries = Vec::new();
        for id in self.ids(kind)?.into_iter().rev() {
            let path = self.path_for(kind, &id);
            match read_json::<SnapshotSummary>(&path) {
                Ok(summary) => summaries.push(summary),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot"),
            }
        }
        Ok(summaries)
    }

    pub fn get(&self, kind: SnapshotKind, id: &str) -> RecomposeResult<StoredSnapshot> {
        let path = self.path_for(kind, checked_id(id)?);
        if !path.exists() {
            return Err(RecomposeError::not_found(format!("{kind} {id}")));
        }
        read_json(&path)
    }

    pub fn remove(&mut self, kind: SnapshotKind, id: &str) -> RecomposeResult<()> {
        let path = self.path_for(kind, checked_id(id)?);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RecomposeError::not_found(format!("{kind} {id}")))
            }
            Err(e) => Err(RecomposeError::storage(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        }
    }

    /// Release the store.
    pub fn close(self) {
        tracing::debug!(root = %self.root.display(), "Snapshot store closed");
    }

    fn path_for(&self, kind: SnapshotKind, id: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(format!("{id}.json"))
    }

    /// Ids have the form `<kind>-<millis>-<seq>` with fixed-width numbers,
    /// so lexical order is insertion order.
    fn next_id(&mut self, kind: SnapshotKind, at: DateTime<Utc>) -> String {
        let millis = at.timestamp_millis().max(0);
        loop {
            self.sequence = self.sequence.wrapping_add(1) % 1_000_000;
            let id = format!("{}-{millis:014}-{:06}", kind.id_prefix(), self.sequence);
            if !self.path_for(kind, &id).exists() {
                return id;
            }
        }
    }

    /// Stored ids of `kind`, oldest first. Files whose stem is not a
    /// valid id were not written by the store and are ignored.
    fn ids(&self, kind: SnapshotKind) -> RecomposeResult<Vec<String>> {
        let dir = self.root.join(kind.dir_name());
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| RecomposeError::storage(format!("cannot read {}: {e}", dir.display())))?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let id = name.strip_suffix(".json")?;
                checked_id(id).ok().map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn evict(&mut self, kind: SnapshotKind) -> RecomposeResult<()> {
        let ids = self.ids(kind)?;
        let limit = self.limits.for_kind(kind);
        if ids.len() <= limit {
            return Ok(());
        }

        let excess = ids.len() - limit;
        for id in &ids[..excess] {
            self.remove(kind, id)?;
        }
        tracing::debug!(kind = %kind, evicted = excess, "Evicted oldest snapshots");
        Ok(())
    }
}

fn checked_id(id: &str) -> RecomposeResult<&str> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(RecomposeError::validation(format!("invalid snapshot id: {id:?}")))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> RecomposeResult<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RecomposeError::storage(format!("cannot read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SnapshotRepository;
    use recompose_model::geometry::Rectangle;
    use recompose_model::layer::Layer;
    use recompose_model::transport::EncodedRaster;

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn snapshot(label: &str) -> (SessionSnapshot, SnapshotMeta) {
        let mut snapshot = SessionSnapshot::new(EncodedRaster::png(vec![1, 2, 3]));
        snapshot.layers.add(Layer::text(Rectangle::new(0, 0, 5, 5), label));
        let meta = SnapshotMeta {
            label: Some(label.to_string()),
            ..Default::default()
        };
        (snapshot, meta)
    }

    #[test]
    fn test_open_creates_layout() {
        let dir = fresh_dir("recompose_test_store_layout");
        let store = SnapshotStore::open(&dir, RetentionLimits::default()).unwrap();
        assert!(dir.join("saves").is_dir());
        assert!(dir.join("versions").is_dir());
        store.close();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_insert_get_round_trip() {
        let dir = fresh_dir("recompose_test_store_round_trip");
        let mut store = SnapshotStore::open(&dir, RetentionLimits::default()).unwrap();

        let (snap, meta) = snapshot("first");
        let summary = store.insert(SnapshotKind::Save, &snap, meta.clone()).unwrap();
        assert!(summary.id.starts_with("save-"));
        assert!(dir.join("saves").join(format!("{}.json", summary.id)).is_file());

        let stored = store.get(SnapshotKind::Save, &summary.id).unwrap();
        assert_eq!(stored.snapshot, snap);
        assert_eq!(stored.meta, meta);

        let err = store.get(SnapshotKind::Version, &summary.id).unwrap_err();
        assert!(matches!(err, RecomposeError::NotFound { .. }));

        store.close();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_list_is_newest_first_and_evicts_oldest() {
        let dir = fresh_dir("recompose_test_store_evict");
        let limits = RetentionLimits {
            max_saves: 3,
            max_versions: 10,
        };
        let mut store = SnapshotStore::open(&dir, limits).unwrap();

        let mut ids = Vec::new();
        for i in 0..5 {
            let (snap, meta) = snapshot(&format!("s{i}"));
            ids.push(store.insert(SnapshotKind::Save, &snap, meta).unwrap().id);
        }

        let listed: Vec<String> = store
            .list(SnapshotKind::Save)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec![ids[4].clone(), ids[3].clone(), ids[2].clone()]);
        assert!(store.list(SnapshotKind::Version).unwrap().is_empty());

        let latest = store.latest(SnapshotKind::Save).unwrap().unwrap();
        assert_eq!(latest.meta.label.as_deref(), Some("s4"));

        store.close();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_remove_and_reopen() {
        let dir = fresh_dir("recompose_test_store_reopen");
        let mut store = SnapshotStore::open(&dir, RetentionLimits::default()).unwrap();
        let (snap, meta) = snapshot("keep");
        let keep = store.insert(SnapshotKind::Version, &snap, meta).unwrap();
        let (snap, meta) = snapshot("drop");
        let dropped = store.insert(SnapshotKind::Version, &snap, meta).unwrap();

        store.remove(SnapshotKind::Version, &dropped.id).unwrap();
        assert!(store.remove(SnapshotKind::Version, &dropped.id).is_err());
        store.close();

        let store = SnapshotStore::open(&dir, RetentionLimits::default()).unwrap();
        let listed = store.list(SnapshotKind::Version).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);
        store.close();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = fresh_dir("recompose_test_store_ids");
        let store = SnapshotStore::open(&dir, RetentionLimits::default()).unwrap();
        let err = store.get(SnapshotKind::Save, "../secret").unwrap_err();
        assert!(err.is_validation());
        store.close();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_stray_files_do_not_block_eviction() {
        let dir = fresh_dir("recompose_test_store_stray");
        let limits = RetentionLimits {
            max_saves: 1,
            max_versions: 10,
        };
        let mut store = SnapshotStore::open(&dir, limits).unwrap();
        let stray = dir.join("saves").join("my save.json");
        std::fs::write(&stray, "{}").unwrap();

        for label in ["a", "b", "c"] {
            let (snap, meta) = snapshot(label);
            store.insert(SnapshotKind::Save, &snap, meta).unwrap();
        }

        let listed = store.list(SnapshotKind::Save).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].meta.label.as_deref(), Some("c"));
        assert!(stray.is_file());

        store.close();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_limits_from_config() {
        let config = StorageConfig::default();
        let limits = RetentionLimits::from(&config);
        assert_eq!(limits, RetentionLimits::default());
        assert_eq!(limits.for_kind(SnapshotKind::Version), 500);
    }
}
