use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Key-value persistence behind a [`crate::VirtualFile`]: one opaque byte blob per path.
///
/// The store owns its own durability guarantee. A virtual file performs at most
/// two round-trips against it: one `get` at open time (for modes that load
/// existing content) and one `upsert` + `commit` at close time (for modes that
/// may mutate).
pub trait RecordStore {
    /// Returns the blob stored under `path`, or `None` if no record exists.
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Inserts or fully replaces the record under `path`.
    fn upsert(&self, path: &str, content: &[u8]) -> Result<()>;

    /// Makes prior upserts durable. Stores that write through may treat this
    /// as a no-op.
    fn commit(&self) -> Result<()>;
}

pub(crate) mod utils {
    use super::*;

    /// Collapses `.`, `..` and redundant separators without touching the host
    /// filesystem. Relative paths stay relative.
    pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.as_ref().components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if let Some(parent) = result.parent() {
                        result = parent.to_path_buf();
                    }
                }
                _ => result.push(component),
            }
        }
        result
    }

    /// Normalized string form of a path, used as the record key.
    pub fn record_key<P: AsRef<Path>>(path: P) -> String {
        normalize(path).to_string_lossy().into_owned()
    }
}
