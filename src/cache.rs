use crate::error::Result;
use crate::loader;
use crate::table::Table;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

type LoadFn = dyn Fn(&Path) -> Result<Table> + Send + Sync;

/// Holds the dataset read from one source file
///
/// The first [`load_or_get`](DatasetCache::load_or_get) reads the file; every
/// later call hands out the same shared table. There is no invalidation: a
/// cache lives as long as the process that made it. A failed load leaves the
/// cache empty so the next call tries again.
pub struct DatasetCache {
    path: PathBuf,
    loader: Box<LoadFn>,
    slot: Mutex<Option<Arc<Table>>>,
}

impl DatasetCache {
    /// Cache over [`loader::load_dataset`]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_loader(path, |p| loader::load_dataset(p))
    }

    /// Cache over a custom load function
    pub fn with_loader<F>(path: impl Into<PathBuf>, load: F) -> Self
    where
        F: Fn(&Path) -> Result<Table> + Send + Sync + 'static,
    {
        DatasetCache {
            path: path.into(),
            loader: Box::new(load),
            slot: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_get(&self) -> Result<Arc<Table>> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(table) = slot.as_ref() {
            debug!("dataset cache hit for {}", self.path.display());
            return Ok(Arc::clone(table));
        }

        info!("dataset cache miss, reading {}", self.path.display());
        let table = Arc::new((self.loader)(&self.path)?);
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }
}
