//! Virtual file handles persisted in a key-value record store.
//!
//! `kvfs-kit` lets you work with file-like objects in Rust without touching
//! the actual disk: a [`VirtualFile`] behaves like a conventional file handle
//! (read, write, seek, tell, iterate by line, close) while its content lives
//! as a single record in a [`RecordStore`] keyed by path. The whole record is
//! loaded on open, mutated in memory, and written back atomically on close.
//!
//! ### Overview
//!
//! **Key ideas**:
//! - **Abstraction**: One file-handle API over different storage backends
//!   through the [`RecordStore`] trait.
//! - **Backends**: [`SqliteStore`] persists records in a SQLite database;
//!   [`MemStore`] keeps them in-process for tests and sandboxing.
//! - **Familiar modes**: Open with the usual `r` / `w` / `a` / `+` / `b`
//!   mode strings via [`OpenMode`]; text modes carry an [`Encoding`]
//!   (UTF-8 by default).
//! - **Explicit routing**: [`OpenDispatch`] decides per path whether to hand
//!   back a virtual file or a plain host file — an opt-in factory, never a
//!   process-wide interception.
//!
//! ```no_run
//! use kvfs_kit::{OpenMode, SqliteStore, VirtualFile};
//!
//! # fn main() -> kvfs_kit::Result<()> {
//! let store = SqliteStore::open("records.db")?;
//!
//! let mut f = VirtualFile::open(&store, "docs/note.txt", OpenMode::parse("w")?, None)?;
//! f.write_text("Hello\n")?;
//! f.close()?;
//!
//! let mut f = VirtualFile::open(&store, "docs/note.txt", OpenMode::parse("r")?, None)?;
//! assert_eq!(f.read_text(None)?, "Hello\n");
//! f.close()?;
//! # Ok(())
//! # }
//! ```

mod core;
mod error;
mod store;
mod vfs;

pub use encoding_rs::Encoding;

pub use self::core::RecordStore;
pub use error::{FsError, Result};
pub use store::{MemStore, SqliteStore};
pub use vfs::{Lines, OpenDispatch, OpenMode, OpenedFile, TextLines, VirtualFile};
