//! In-process record store backed by a map. Keeps everything in memory,
//! which makes it a good fit for tests and isolated sandboxing.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::core::RecordStore;
use crate::error::Result;

/// A [`RecordStore`] holding records in a `BTreeMap`, keyed by path.
///
/// Not thread-safe; wrap it in a synchronization primitive at the application
/// level if concurrent access is required.
#[derive(Default)]
pub struct MemStore {
    records: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Returns true if a record exists under `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.records.borrow().contains_key(path)
    }
}

impl RecordStore for MemStore {
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.borrow().get(path).cloned())
    }

    fn upsert(&self, path: &str, content: &[u8]) -> Result<()> {
        self.records
            .borrow_mut()
            .insert(path.to_owned(), content.to_vec());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }
}
