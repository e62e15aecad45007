//! Document store persisted as a single JSON snapshot file.

use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use eduhub_core::{
    application::{
        ApplicationError,
        ports::{DocumentStore, UpdateResult},
    },
    domain::{CollectionSchema, Document, DocumentId, Filter, IndexSpec, Record, Update},
    error::{EduhubError, EduhubResult},
};

use super::state::StoreState;

#[derive(Debug, Error)]
enum SnapshotError {
    #[error("Failed to {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Malformed snapshot: {0}")]
    Format(#[from] serde_json::Error),
}

impl SnapshotError {
    fn io(operation: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { operation, source }
    }

    fn at(self, path: &Path) -> EduhubError {
        ApplicationError::Persistence {
            path: path.to_path_buf(),
            reason: self.to_string(),
        }
        .into()
    }
}

/// Advisory lock on the sibling `<snapshot>.lock` file, released on drop.
///
/// Readers share it; a writer holds it exclusively for the whole
/// read-modify-write, so every process sees the others' committed writes.
struct SnapshotLock {
    file: File,
}

impl SnapshotLock {
    fn shared(snapshot: &Path) -> Result<Self, SnapshotError> {
        let file = open_lock_file(snapshot)?;
        FileExt::lock_shared(&file).map_err(SnapshotError::io("lock snapshot for reading"))?;
        Ok(Self { file })
    }

    fn exclusive(snapshot: &Path) -> Result<Self, SnapshotError> {
        let file = open_lock_file(snapshot)?;
        FileExt::lock_exclusive(&file).map_err(SnapshotError::io("lock snapshot for writing"))?;
        Ok(Self { file })
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(snapshot: &Path) -> Result<File, SnapshotError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(snapshot))
        .map_err(SnapshotError::io("open lock file"))
}

fn lock_path(snapshot: &Path) -> PathBuf {
    let mut name = snapshot.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// A [`DocumentStore`] backed by a JSON file.
///
/// Every operation reloads the snapshot under an advisory file lock; a
/// mutation holds the lock exclusively while it applies the change and
/// rewrites the file (sibling temp file, then rename). Unique indexes and
/// schemas are therefore checked against the latest committed state even
/// when several processes share the file. A failed mutation writes nothing.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: Arc<PathBuf>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; the file is
    /// created on the first write. A malformed snapshot fails here.
    #[instrument(fields(path = %path.as_ref().display()), skip(path))]
    pub fn open(path: impl AsRef<Path>) -> EduhubResult<Self> {
        let store = Self {
            path: Arc::new(path.as_ref().to_path_buf()),
        };
        let collections = store.read(|s| s.list_collections().len())?;
        debug!(collections, "Snapshot loaded");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> EduhubResult<T> {
        let state = self.load_shared().map_err(|e| e.at(&self.path))?;
        Ok(f(&state))
    }

    fn load_shared(&self) -> Result<StoreState, SnapshotError> {
        // Nothing has ever been written; don't create directories on a read.
        let dir_missing = self
            .path
            .parent()
            .is_some_and(|p| !p.as_os_str().is_empty() && !p.exists());
        if dir_missing {
            return Ok(StoreState::default());
        }
        let _lock = SnapshotLock::shared(&self.path)?;
        load(&self.path)
    }

    /// Reload, apply and persist under the exclusive lock.
    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> EduhubResult<T>) -> EduhubResult<T> {
        let at = |e: SnapshotError| e.at(&self.path);

        create_parent(&self.path).map_err(at)?;
        let _lock = SnapshotLock::exclusive(&self.path).map_err(at)?;
        let mut state = load(&self.path).map_err(at)?;
        let out = f(&mut state)?;
        save(&self.path, &state).map_err(at)?;
        trace!("Snapshot written");
        Ok(out)
    }
}

fn load(path: &Path) -> Result<StoreState, SnapshotError> {
    if !path.exists() {
        return Ok(StoreState::default());
    }
    let text = fs::read_to_string(path).map_err(SnapshotError::io("read snapshot"))?;
    if text.trim().is_empty() {
        return Ok(StoreState::default());
    }
    Ok(serde_json::from_str(&text)?)
}

fn create_parent(path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(SnapshotError::io("create data directory"))?;
    }
    Ok(())
}

fn save(path: &Path, state: &StoreState) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(SnapshotError::io("write snapshot"))?;
    fs::rename(&tmp, path).map_err(SnapshotError::io("replace snapshot"))?;
    Ok(())
}

impl DocumentStore for JsonFileStore {
    fn create_collection(&self, name: &str) -> EduhubResult<()> {
        self.mutate(|s| {
            s.create_collection(name);
            Ok(())
        })
    }

    fn drop_collection(&self, name: &str) -> EduhubResult<bool> {
        self.mutate(|s| Ok(s.drop_collection(name)))
    }

    fn list_collections(&self) -> EduhubResult<Vec<String>> {
        self.read(StoreState::list_collections)
    }

    fn insert_one(&self, collection: &str, record: Record) -> EduhubResult<DocumentId> {
        self.mutate(|s| s.insert_one(collection, record))
    }

    fn find(&self, collection: &str, filter: &Filter) -> EduhubResult<Vec<Document>> {
        self.read(|s| s.find(collection, filter))
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> EduhubResult<UpdateResult> {
        self.mutate(|s| s.update_one(collection, filter, update))
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> EduhubResult<u64> {
        self.mutate(|s| Ok(s.delete_one(collection, filter)))
    }

    fn delete_many(&self, collection: &str, filter: &Filter) -> EduhubResult<u64> {
        self.mutate(|s| Ok(s.delete_many(collection, filter)))
    }

    fn create_index(&self, collection: &str, spec: IndexSpec) -> EduhubResult<String> {
        self.mutate(|s| s.create_index(collection, spec))
    }

    fn drop_index(&self, collection: &str, name: &str) -> EduhubResult<()> {
        self.mutate(|s| s.drop_index(collection, name))
    }

    fn list_indexes(&self, collection: &str) -> EduhubResult<Vec<IndexSpec>> {
        self.read(|s| s.list_indexes(collection))
    }

    fn set_schema(&self, collection: &str, schema: Option<CollectionSchema>) -> EduhubResult<()> {
        self.mutate(|s| s.set_schema(collection, schema))
    }

    fn schema(&self, collection: &str) -> EduhubResult<Option<CollectionSchema>> {
        self.read(|s| s.schema(collection))
    }
}
