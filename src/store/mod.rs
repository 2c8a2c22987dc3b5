mod mem;
mod sqlite;

pub use mem::MemStore;
pub use sqlite::SqliteStore;
