//! File objects flowing through the stage.
//!
//! A [`FileObject`] is one pipeline item: a path, the path-resolution context
//! it was read with (`base`, `cwd`), and its contents. Only buffered contents
//! can be transformed; the other two forms exist so the stage can tell a
//! directory marker (passed through) from a live stream (rejected).

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Contents of a pipeline item.
pub enum Contents {
    /// Directory marker or otherwise empty entry.
    Null,
    /// Fully materialized bytes.
    Buffer(Vec<u8>),
    /// A live byte stream. Never transformed: the stage needs the whole
    /// image up front to evaluate per-file configuration.
    Stream(Box<dyn Read + Send>),
}

impl Contents {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Contents::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Contents::Stream(_))
    }
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Null => f.write_str("Null"),
            Contents::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Contents::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// One item in the stream.
#[derive(Debug)]
pub struct FileObject {
    /// Full path, extension included.
    pub path: PathBuf,
    /// Base directory the path was globbed from.
    pub base: PathBuf,
    /// Working directory at read time.
    pub cwd: PathBuf,
    pub contents: Contents,
}

impl FileObject {
    /// Buffered file with `base` and `cwd` set to the path's parent.
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            cwd: base.clone(),
            base,
            path,
            contents: Contents::Buffer(bytes),
        }
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn with_contents(mut self, contents: Contents) -> Self {
        self.contents = contents;
        self
    }

    /// A sibling sharing this file's resolution context.
    pub fn derive(&self, path: PathBuf, bytes: Vec<u8>) -> Self {
        Self {
            path,
            base: self.base.clone(),
            cwd: self.cwd.clone(),
            contents: Contents::Buffer(bytes),
        }
    }

    /// Path relative to `base`, or the full path when it lies outside it.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }
}
