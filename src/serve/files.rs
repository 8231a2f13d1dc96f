//! File serving entry point
//!
//! Resolves a route parameter against a read-only filesystem, reads the whole
//! entry into memory and hands it to the pipeline with caching enabled.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::{Payload, Pipeline};
use crate::error::ServeError;
use crate::http::{build_status_response, RequestSignal, ResponseDescriptor};
use crate::logger;

/// An opened, readable entry
pub trait FsEntry: Read {
    fn modified(&self) -> io::Result<SystemTime>;
}

/// Read-only filesystem the entry point loads from
pub trait ReadOnlyFs: Send + Sync {
    type Entry: FsEntry;

    /// Open the entry at a logical, `/`-separated path
    fn open(&self, path: &str) -> io::Result<Self::Entry>;
}

/// Handler invoked instead of the bare 404 when an entry cannot be opened
pub type NotFoundHandler = Arc<dyn Fn(&RequestSignal) -> Response<Full<Bytes>> + Send + Sync>;

/// Serves entries of a [`ReadOnlyFs`] through the [`Pipeline`]
///
/// Entries are read fully into memory; very large files are not streamed.
pub struct FileServer<F> {
    fs: F,
    pipeline: Pipeline,
    not_found: Option<NotFoundHandler>,
}

impl<F: ReadOnlyFs> FileServer<F> {
    pub const fn new(fs: F, pipeline: Pipeline) -> Self {
        Self {
            fs,
            pipeline,
            not_found: None,
        }
    }

    #[must_use]
    pub fn with_not_found<H>(mut self, handler: H) -> Self
    where
        H: Fn(&RequestSignal) -> Response<Full<Bytes>> + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(handler));
        self
    }

    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Serve the entry named by `path`
    ///
    /// Open failure → not-found handler or 404; read failure → 500.
    pub fn serve(&self, path: &str, request: &RequestSignal) -> Response<Full<Bytes>> {
        match self.load(path) {
            Ok(payload) => self
                .pipeline
                .serve(request, &payload, ResponseDescriptor::new(), true),
            Err(err @ ServeError::Open { .. }) => {
                logger::log_open_failed(&err);
                match &self.not_found {
                    Some(handler) => handler(request),
                    None => build_status_response(StatusCode::NOT_FOUND),
                }
            }
            Err(err) => {
                logger::log_read_failed(&err);
                build_status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Open and fully read an entry
    ///
    /// A missing modification time is recorded as unknown.
    pub fn load(&self, path: &str) -> Result<Payload, ServeError> {
        let mut entry = self.fs.open(path).map_err(|source| ServeError::Open {
            path: path.to_string(),
            source,
        })?;

        let modified = entry.modified().ok().map(DateTime::<Utc>::from);

        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|source| ServeError::Read {
                path: path.to_string(),
                source,
            })?;

        Ok(Payload::new(path, data).with_modified(modified))
    }
}

/// Filesystem rooted at a directory on disk
///
/// Paths are resolved inside the root; anything that canonicalizes outside
/// it, or is not a regular file, is reported as not found.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Open file from a [`DirFs`]
#[derive(Debug)]
pub struct DirEntry {
    file: File,
}

impl Read for DirEntry {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl FsEntry for DirEntry {
    fn modified(&self) -> io::Result<SystemTime> {
        self.file.metadata()?.modified()
    }
}

impl ReadOnlyFs for DirFs {
    type Entry = DirEntry;

    fn open(&self, path: &str) -> io::Result<DirEntry> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return Err(not_found(path));
        }

        let root = self.root.canonicalize()?;
        let candidate = root.join(relative).canonicalize()?;

        if !candidate.starts_with(&root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                path,
                candidate.display()
            ));
            return Err(not_found(path));
        }
        if !candidate.is_file() {
            return Err(not_found(path));
        }

        Ok(DirEntry {
            file: File::open(candidate)?,
        })
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such entry: {path}"))
}

#[derive(Debug, Clone)]
struct MemoryFile {
    data: Bytes,
    modified: Option<SystemTime>,
}

/// In-memory filesystem for embedded assets
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    entries: HashMap<String, MemoryFile>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry; a leading `/` in `name` is ignored
    pub fn insert(
        &mut self,
        name: impl AsRef<str>,
        data: impl Into<Bytes>,
        modified: Option<SystemTime>,
    ) {
        self.entries.insert(
            name.as_ref().trim_start_matches('/').to_string(),
            MemoryFile {
                data: data.into(),
                modified,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Open entry from a [`MemoryFs`]
#[derive(Debug)]
pub struct MemoryEntry {
    reader: Cursor<Bytes>,
    modified: Option<SystemTime>,
}

impl Read for MemoryEntry {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl FsEntry for MemoryEntry {
    fn modified(&self) -> io::Result<SystemTime> {
        self.modified
            .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "no modification time"))
    }
}

impl ReadOnlyFs for MemoryFs {
    type Entry = MemoryEntry;

    fn open(&self, path: &str) -> io::Result<MemoryEntry> {
        let file = self
            .entries
            .get(path.trim_start_matches('/'))
            .ok_or_else(|| not_found(path))?;
        Ok(MemoryEntry {
            reader: Cursor::new(file.data.clone()),
            modified: file.modified,
        })
    }
}
