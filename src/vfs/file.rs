//! The virtual file object: a whole-record buffer with file-handle semantics.

use std::io::SeekFrom;

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use crate::core::{RecordStore, utils};
use crate::error::{FsError, Result};
use crate::vfs::mode::OpenMode;

/// A file handle whose content lives in a [`RecordStore`] rather than on a
/// physical filesystem.
///
/// Opening loads the entire record into an in-memory buffer (or starts empty
/// when no record exists); every read, write and seek manipulates that buffer
/// directly; closing writes the final buffer back as one whole record.
///
/// ### Internal state
///
/// * `path` — the normalized record key, fixed at construction.
/// * `mode` — the [`OpenMode`], fixed at construction; determines read/write
///   permission, whether existing content is loaded, and the initial cursor.
/// * `encoding` — the text encoding, defaulted to UTF-8 for text modes and
///   absent for binary modes.
/// * `buffer` — the complete current content. There is no partial or streamed
///   representation; the buffer *is* the file.
/// * `pos` — the cursor. It may point past the end of the buffer after a seek;
///   reads from out there return nothing and writes land at the current end.
///
/// ### Lifecycle
///
/// The one and only persistence flush happens in [`close`](Self::close) (for
/// writable modes). Dropping an unclosed handle discards all changes — scoped
/// callers should prefer [`with`](Self::with), which always closes.
///
/// ### Thread safety
///
/// A `VirtualFile` exclusively owns its buffer and is not thread-safe. The
/// design assumes at most one handle per path at a time; concurrent opens of
/// the same path end as a last-writer-wins race at close.
pub struct VirtualFile<'s, S: RecordStore> {
    store: &'s S,
    path: String,
    mode: OpenMode,
    encoding: Option<&'static Encoding>,
    buffer: Vec<u8>,
    pos: usize,
    closed: bool,
}

impl<'s, S: RecordStore> VirtualFile<'s, S> {
    /// Opens a virtual file at `path`.
    ///
    /// For modes that care about existing content (`r`, `a` or any `+` mode)
    /// the record is loaded from the store; a missing record is not an error
    /// and yields an empty buffer. A plain `w` starts empty without touching
    /// the store — any prior record is only replaced at close.
    ///
    /// Binary modes ignore `encoding`; text modes default it to UTF-8.
    pub fn open(
        store: &'s S,
        path: &str,
        mode: OpenMode,
        encoding: Option<&'static Encoding>,
    ) -> Result<Self> {
        let path = utils::record_key(path);
        let encoding = if mode.is_binary() {
            None
        } else {
            Some(encoding.unwrap_or(UTF_8))
        };
        let buffer = if mode.loads_existing() {
            store.get(&path)?.unwrap_or_default()
        } else {
            Vec::new()
        };
        let pos = if mode.appends() { buffer.len() } else { 0 };

        debug!(path = %path, %mode, loaded = buffer.len(), "opened virtual file");

        Ok(Self {
            store,
            path,
            mode,
            encoding,
            buffer,
            pos,
            closed: false,
        })
    }

    /// Opens a file, runs `op` against it, and always closes exactly once —
    /// on the success path and on the error path alike. An error from `op`
    /// takes precedence over an error from the close.
    pub fn with<T, F>(
        store: &'s S,
        path: &str,
        mode: OpenMode,
        encoding: Option<&'static Encoding>,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut file = Self::open(store, path, mode, encoding)?;
        let result = op(&mut file);
        let closed = file.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// The normalized record key this handle reads and writes.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reads raw bytes from the cursor.
    ///
    /// `None` returns everything up to the end of the buffer and leaves the
    /// cursor at the end; `Some(n)` returns at most `n` bytes (fewer if less
    /// data remains) and advances by the amount actually returned. A cursor
    /// at or past the end yields an empty result.
    pub fn read(&mut self, size: Option<usize>) -> Result<Vec<u8>> {
        self.check_readable()?;
        let len = self.buffer.len();
        let data = match size {
            None => {
                let out = self.buffer.get(self.pos..).unwrap_or(&[]).to_vec();
                self.pos = len;
                out
            }
            Some(n) => {
                if self.pos >= len {
                    Vec::new()
                } else {
                    let end = self.pos.saturating_add(n).min(len);
                    let out = self.buffer[self.pos..end].to_vec();
                    self.pos += out.len();
                    out
                }
            }
        };
        Ok(data)
    }

    /// Like [`read`](Self::read), decoded with the file's encoding.
    /// Fails with [`FsError::TypeMismatch`] on a binary file and with
    /// [`FsError::Decode`] when the bytes are not valid in that encoding.
    pub fn read_text(&mut self, size: Option<usize>) -> Result<String> {
        self.check_readable()?;
        let encoding = self.text_encoding()?;
        let bytes = self.read(size)?;
        decode(encoding, &bytes)
    }

    /// Reads one line: from the cursor through the next `\n` inclusive, or to
    /// the end of the buffer if no terminator follows.
    ///
    /// With `Some(cap)` the line is truncated to at most `cap` bytes and the
    /// cursor stops right after the truncated slice, so repeated capped calls
    /// reconstruct the full line. The cap counts raw bytes even for text files.
    pub fn readline(&mut self, size: Option<usize>) -> Result<Vec<u8>> {
        self.check_readable()?;
        Ok(self.take_line(size))
    }

    /// Like [`readline`](Self::readline), decoded with the file's encoding.
    ///
    /// A byte cap can split a multi-byte character; decoding the fragment then
    /// fails with [`FsError::Decode`] (the raw bytes remain reachable through
    /// [`readline`](Self::readline)).
    pub fn readline_text(&mut self, size: Option<usize>) -> Result<String> {
        self.check_readable()?;
        let encoding = self.text_encoding()?;
        let line = self.take_line(size);
        decode(encoding, &line)
    }

    /// Collects uncapped lines until the buffer is exhausted. A positive
    /// `hint` stops collection once the cumulative byte length reaches it.
    pub fn readlines(&mut self, hint: Option<usize>) -> Result<Vec<Vec<u8>>> {
        self.check_readable()?;
        let mut lines = Vec::new();
        let mut total = 0usize;
        loop {
            let line = self.take_line(None);
            if line.is_empty() {
                break;
            }
            total += line.len();
            lines.push(line);
            if hint.is_some_and(|h| h > 0 && total >= h) {
                break;
            }
        }
        Ok(lines)
    }

    /// Like [`readlines`](Self::readlines), with each line decoded. The hint
    /// still counts encoded bytes, not characters.
    pub fn readlines_text(&mut self, hint: Option<usize>) -> Result<Vec<String>> {
        self.check_readable()?;
        let encoding = self.text_encoding()?;
        let mut lines = Vec::new();
        let mut total = 0usize;
        loop {
            let line = self.take_line(None);
            if line.is_empty() {
                break;
            }
            total += line.len();
            lines.push(decode(encoding, &line)?);
            if hint.is_some_and(|h| h > 0 && total >= h) {
                break;
            }
        }
        Ok(lines)
    }

    /// Iterates the buffer as raw lines, starting over from the beginning.
    /// Creating the iterator resets the cursor to 0.
    pub fn lines(&mut self) -> Result<Lines<'_, 's, S>> {
        self.check_readable()?;
        self.pos = 0;
        Ok(Lines { file: self })
    }

    /// Iterates the buffer as decoded lines, starting over from the beginning.
    pub fn text_lines(&mut self) -> Result<TextLines<'_, 's, S>> {
        self.check_readable()?;
        self.text_encoding()?;
        self.pos = 0;
        Ok(TextLines { file: self })
    }

    /// Writes raw bytes at the cursor, overwriting exactly `data.len()` bytes
    /// in place and extending the buffer when the write runs past the end.
    /// This is an overwrite, not an insert: content beyond the written span is
    /// preserved unshifted. Returns the number of bytes written.
    ///
    /// Raw byte writes are permitted in both text and binary modes.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.check_writable()?;
        let len = self.buffer.len();
        let start = self.pos.min(len);
        let end = start.saturating_add(data.len()).min(len);
        self.buffer.splice(start..end, data.iter().copied());
        self.pos = self.pos.saturating_add(data.len());
        Ok(data.len())
    }

    /// Encodes `text` with the file's encoding and writes the result.
    /// Fails with [`FsError::TypeMismatch`] on a binary file and with
    /// [`FsError::Encode`] for characters the encoding cannot represent.
    /// Returns the number of *encoded bytes* written.
    pub fn write_text(&mut self, text: &str) -> Result<usize> {
        self.check_writable()?;
        let encoding = self.text_encoding()?;
        let bytes = encode(encoding, text)?;
        self.write(&bytes)
    }

    /// Moves the cursor. `Start`, `Current` and `End` follow the usual
    /// `std::io` meaning; the enum leaves no room for an invalid whence.
    ///
    /// A seek resolving to a negative position is rejected with
    /// [`FsError::InvalidSeek`]. Positions past the end are allowed — reads
    /// from there come back empty and writes land at the current end.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.check_open()?;
        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n).map_err(|_| FsError::InvalidSeek(i64::MAX))?,
            SeekFrom::Current(off) => (self.pos as i64)
                .checked_add(off)
                .ok_or(FsError::InvalidSeek(off))?,
            SeekFrom::End(off) => (self.buffer.len() as i64)
                .checked_add(off)
                .ok_or(FsError::InvalidSeek(off))?,
        };
        if target < 0 {
            return Err(FsError::InvalidSeek(target));
        }
        self.pos = target as usize;
        Ok(self.pos as u64)
    }

    /// Returns the cursor position. No side effects.
    pub fn tell(&self) -> Result<u64> {
        self.check_open()?;
        Ok(self.pos as u64)
    }

    /// No-op: the buffer is always complete in memory, there is nothing
    /// partial to flush. Fails only on a closed handle.
    pub fn flush(&self) -> Result<()> {
        self.check_open()
    }

    /// Closes the handle. Idempotent — only the first call has effect.
    ///
    /// For writable modes the final buffer is upserted into the store under
    /// the file's path (replacing any prior record in full) and committed
    /// before this returns. Read-only closes persist nothing. After close,
    /// every operation except another `close` fails with [`FsError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.mode.writable() {
            debug!(path = %self.path, bytes = self.buffer.len(), "persisting virtual file");
            self.store.upsert(&self.path, &self.buffer)?;
            self.store.commit()?;
        }
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(FsError::Closed);
        }
        Ok(())
    }

    fn check_readable(&self) -> Result<()> {
        self.check_open()?;
        if !self.mode.readable() {
            return Err(FsError::NotReadable);
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        self.check_open()?;
        if !self.mode.writable() {
            return Err(FsError::NotWritable);
        }
        Ok(())
    }

    /// The encoding for text operations. Binary files have none on purpose
    /// and report [`FsError::TypeMismatch`] here.
    fn text_encoding(&self) -> Result<&'static Encoding> {
        if self.mode.is_binary() {
            return Err(FsError::TypeMismatch);
        }
        self.encoding.ok_or(FsError::EncodingMissing)
    }

    /// One line from the cursor, caller has already checked permissions.
    /// Empty result means the cursor is at or past the end.
    fn take_line(&mut self, cap: Option<usize>) -> Vec<u8> {
        let len = self.buffer.len();
        if self.pos >= len {
            return Vec::new();
        }
        let start = self.pos;
        let end = match self.buffer[start..].iter().position(|&b| b == b'\n') {
            Some(i) => start + i + 1,
            None => len,
        };
        let end = match cap {
            Some(cap) if end - start > cap => start + cap,
            _ => end,
        };
        self.pos = end;
        self.buffer[start..end].to_vec()
    }
}

impl<S: RecordStore> Drop for VirtualFile<'_, S> {
    fn drop(&mut self) {
        // Silent-discard policy: an abandoned handle persists nothing.
        if !self.closed && self.mode.writable() {
            debug!(path = %self.path, "virtual file dropped without close; changes discarded");
        }
    }
}

/// Raw line iterator, created by [`VirtualFile::lines`]. Finite: ends without
/// error once the buffer is exhausted.
pub struct Lines<'f, 's, S: RecordStore> {
    file: &'f mut VirtualFile<'s, S>,
}

impl<S: RecordStore> Iterator for Lines<'_, '_, S> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.file.take_line(None);
        if line.is_empty() { None } else { Some(line) }
    }
}

/// Decoded line iterator, created by [`VirtualFile::text_lines`]. Each step
/// can fail independently if the line does not decode.
pub struct TextLines<'f, 's, S: RecordStore> {
    file: &'f mut VirtualFile<'s, S>,
}

impl<S: RecordStore> Iterator for TextLines<'_, '_, S> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.file.take_line(None);
        if line.is_empty() {
            return None;
        }
        let encoding = match self.file.text_encoding() {
            Ok(encoding) => encoding,
            Err(e) => return Some(Err(e)),
        };
        Some(decode(encoding, &line))
    }
}

fn decode(encoding: &'static Encoding, bytes: &[u8]) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|cow| cow.into_owned())
        .ok_or(FsError::Decode(encoding.name()))
}

fn encode(encoding: &'static Encoding, text: &str) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(FsError::Encode(encoding.name()));
    }
    Ok(bytes.into_owned())
}
