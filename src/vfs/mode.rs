use std::fmt;

use crate::error::{FsError, Result};

/// The open mode of a virtual file, fixed at construction.
///
/// Parsed from the usual mode strings: exactly one primary of `r` (read),
/// `w` (write/truncate) or `a` (append), an optional `+` (update: read *and*
/// write), and an optional `b` (binary) or `t` (text, the default).
///
/// ```
/// use kvfs_kit::OpenMode;
///
/// let mode = OpenMode::parse("rb+").unwrap();
/// assert!(mode.readable() && mode.writable() && mode.is_binary());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OpenMode {
    read: bool,
    write: bool,
    append: bool,
    update: bool,
    binary: bool,
}

impl OpenMode {
    /// Parses a mode string. Duplicate flags, a missing or repeated primary,
    /// combining `b` with `t`, and unknown characters are all rejected.
    pub fn parse(mode: &str) -> Result<Self> {
        let mut read = false;
        let mut write = false;
        let mut append = false;
        let mut update = false;
        let mut binary = false;
        let mut text = false;

        for ch in mode.chars() {
            let seen = match ch {
                'r' => std::mem::replace(&mut read, true),
                'w' => std::mem::replace(&mut write, true),
                'a' => std::mem::replace(&mut append, true),
                '+' => std::mem::replace(&mut update, true),
                'b' => std::mem::replace(&mut binary, true),
                't' => std::mem::replace(&mut text, true),
                _ => return Err(FsError::InvalidMode(mode.to_owned())),
            };
            if seen {
                return Err(FsError::InvalidMode(mode.to_owned()));
            }
        }

        let primaries = read as u8 + write as u8 + append as u8;
        if primaries != 1 || (binary && text) {
            return Err(FsError::InvalidMode(mode.to_owned()));
        }

        Ok(Self {
            read,
            write,
            append,
            update,
            binary,
        })
    }

    /// True if `read` or `read_text` is permitted (`r` or `+`).
    pub fn readable(&self) -> bool {
        self.read || self.update
    }

    /// True if `write` or `write_text` is permitted (`w`, `a` or `+`).
    pub fn writable(&self) -> bool {
        self.write || self.append || self.update
    }

    /// True for append mode: the cursor starts at the end of existing content.
    pub fn appends(&self) -> bool {
        self.append
    }

    /// True if opening should load any existing record (`r`, `a` or `+`
    /// present). Note that `w+` loads; only a plain `w` starts empty.
    pub fn loads_existing(&self) -> bool {
        self.read || self.append || self.update
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub(crate) fn updates(&self) -> bool {
        self.update
    }

    /// True for the `w` primary: opening discards existing content.
    pub(crate) fn truncates(&self) -> bool {
        self.write
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            write!(f, "r")?;
        } else if self.write {
            write!(f, "w")?;
        } else {
            write!(f, "a")?;
        }
        if self.binary {
            write!(f, "b")?;
        }
        if self.update {
            write!(f, "+")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_modes() {
        let r = OpenMode::parse("r").unwrap();
        assert!(r.readable() && !r.writable() && r.loads_existing());

        let w = OpenMode::parse("w").unwrap();
        assert!(!w.readable() && w.writable() && !w.loads_existing());

        let a = OpenMode::parse("a").unwrap();
        assert!(!a.readable() && a.writable() && a.appends() && a.loads_existing());
    }

    #[test]
    fn test_parse_update_modes() {
        for mode in ["r+", "w+", "a+"] {
            let m = OpenMode::parse(mode).unwrap();
            assert!(m.readable(), "{mode} must be readable");
            assert!(m.writable(), "{mode} must be writable");
            assert!(m.loads_existing(), "{mode} must load existing content");
        }
    }

    #[test]
    fn test_parse_binary_and_text_flags() {
        assert!(OpenMode::parse("rb").unwrap().is_binary());
        assert!(OpenMode::parse("wb+").unwrap().is_binary());
        assert!(!OpenMode::parse("rt").unwrap().is_binary());
        // flag order does not matter
        assert_eq!(
            OpenMode::parse("br").unwrap(),
            OpenMode::parse("rb").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for mode in ["", "x", "rw", "ra", "rr", "r++", "rbt", "rbb", "r b"] {
            assert!(
                matches!(OpenMode::parse(mode), Err(FsError::InvalidMode(_))),
                "{mode:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        for mode in ["r", "w", "a", "r+", "wb", "ab+"] {
            let parsed = OpenMode::parse(mode).unwrap();
            assert_eq!(parsed.to_string(), mode);
        }
    }
}
