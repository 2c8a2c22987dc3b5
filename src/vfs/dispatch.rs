//! Open dispatch: routes a (path, mode) pair either to a [`VirtualFile`]
//! backed by the record store or to a plain host file.
//!
//! This is an explicit factory callers opt into — nothing here intercepts
//! the standard library.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use tracing::debug;

use crate::core::{RecordStore, utils};
use crate::error::Result;
use crate::vfs::file::VirtualFile;
use crate::vfs::mode::OpenMode;

/// Whatever the dispatcher decided to hand back.
pub enum OpenedFile<'s, S: RecordStore> {
    /// The path resolved inside the boundary: record-store backed.
    Virtual(VirtualFile<'s, S>),
    /// The path escaped the boundary: a conventional filesystem handle.
    Host(File),
}

/// Routes opens by path: anything that resolves inside the configured
/// boundary directory goes to the record store, anything outside goes to the
/// host filesystem with equivalent open options.
///
/// Relative paths are considered inside the boundary by definition. The
/// boundary check is lexical (after normalization); the mode string must
/// parse either way.
pub struct OpenDispatch {
    boundary: PathBuf,
}

impl OpenDispatch {
    /// `boundary` must exist on the host so it can be canonicalized.
    pub fn new<P: AsRef<Path>>(boundary: P) -> Result<Self> {
        Ok(Self {
            boundary: boundary.as_ref().canonicalize()?,
        })
    }

    pub fn boundary(&self) -> &Path {
        &self.boundary
    }

    /// Opens `path` with the given mode string, routing to the store or to
    /// the host. An unparsable mode is an error, not a silent fallback.
    pub fn open<'s, S: RecordStore>(
        &self,
        store: &'s S,
        path: &str,
        mode: &str,
        encoding: Option<&'static Encoding>,
    ) -> Result<OpenedFile<'s, S>> {
        let mode = OpenMode::parse(mode)?;
        if self.is_inside(path) {
            debug!(path, %mode, "dispatching to the record store");
            let file = VirtualFile::open(store, path, mode, encoding)?;
            Ok(OpenedFile::Virtual(file))
        } else {
            debug!(path, %mode, "dispatching to the host filesystem");
            Ok(OpenedFile::Host(host_options(mode).open(path)?))
        }
    }

    fn is_inside(&self, path: &str) -> bool {
        let path = Path::new(path);
        if path.is_relative() {
            return true;
        }
        utils::normalize(path).starts_with(&self.boundary)
    }
}

/// Host-side equivalent of an [`OpenMode`].
fn host_options(mode: OpenMode) -> OpenOptions {
    let mut opts = OpenOptions::new();
    opts.read(mode.readable());
    if mode.appends() {
        opts.append(true).create(true);
    } else if mode.truncates() {
        opts.write(true).create(true).truncate(true);
    } else if mode.updates() {
        // "r+": read and write an existing file, no create
        opts.write(true);
    }
    opts
}
