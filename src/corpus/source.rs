//! Document source: flat directory listing and file reading.
//!
//! # Overview
//!
//! [`DirectorySource`] lists the regular files directly inside a directory
//! (no recursion) in lexicographic file-name order, so the same directory
//! always produces the same input sequence regardless of the platform's
//! native listing order. [`load_documents`] reads an ordered list of paths
//! into a [`Corpus`], skipping unreadable or non-UTF-8 files with a warning.
//!
//! # Example
//!
//! ```no_run
//! use neardup::corpus::{load_documents, DirectorySource, SourceConfig};
//! use std::path::Path;
//!
//! let source = DirectorySource::new(Path::new("./docs"), SourceConfig::default());
//! let paths = source.list().unwrap();
//! let loaded = load_documents(&paths, None).unwrap();
//! println!("{} documents, {} skipped", loaded.corpus.len(), loaded.skipped.len());
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::WalkDir;

use super::{Corpus, DocumentError, DocumentId, SkippedDocument};
use crate::progress::ProgressCallback;

/// Configuration for the directory source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// File extensions to include (case-insensitive, without the dot).
    /// An empty list includes every regular file.
    pub extensions: Vec<String>,

    /// Skip hidden files (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string()],
            skip_hidden: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl SourceConfig {
    /// Include every regular file regardless of extension.
    #[must_use]
    pub fn all_files(mut self) -> Self {
        self.extensions.clear();
        self
    }

    /// Set the extension filter.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Skip hidden files.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Set the ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    fn accepts_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }
}

/// Errors that can occur while listing or loading the corpus.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Permission was denied when listing the directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while listing the directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Loading was interrupted by a shutdown request.
    #[error("Loading interrupted by user")]
    Interrupted,
}

/// Flat, sorted listing of the text files in one directory.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    config: SourceConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl DirectorySource {
    /// Create a new source for the given directory.
    #[must_use]
    pub fn new(path: &Path, config: SourceConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// List the matching files, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the root does not exist, is not a directory,
    /// or cannot be read. Entries that vanish during listing are skipped.
    pub fn list(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.root.exists() {
            return Err(SourceError::NotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(SourceError::NotADirectory(self.root.clone()));
        }

        let gitignore = self.build_gitignore();
        let mut paths = Vec::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            if self.is_shutdown_requested() {
                log::debug!("Source: Shutdown requested, stopping listing");
                return Err(SourceError::Interrupted);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                    match e.into_io_error() {
                        Some(io_err) if io_err.kind() == io::ErrorKind::PermissionDenied => {
                            return Err(SourceError::PermissionDenied(path));
                        }
                        Some(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                            log::debug!("Entry vanished during listing: {}", path.display());
                            continue;
                        }
                        Some(io_err) => return Err(SourceError::Io { path, source: io_err }),
                        None => continue,
                    }
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if self.config.skip_hidden && hidden {
                log::trace!("Skipping hidden file: {}", path.display());
                continue;
            }

            if let Some(gi) = &gitignore {
                let relative = path.strip_prefix(&self.root).unwrap_or(path);
                if gi.matched(relative, false).is_ignore() {
                    log::trace!("Ignoring file: {}", path.display());
                    continue;
                }
            }

            if !self.config.accepts_extension(path) {
                log::trace!("Skipping file due to extension filter: {}", path.display());
                continue;
            }

            paths.push(path.to_path_buf());
        }

        log::debug!(
            "Listed {} document(s) in {}",
            paths.len(),
            self.root.display()
        );
        Ok(paths)
    }
}

/// Identity of a file on disk: the canonical path when it resolves, else the path as given.
///
/// Two spellings of one file (`docs/a.txt`, `docs/../docs/a.txt`, a symlink)
/// share a key.
#[must_use]
pub fn path_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Drop paths naming a file already in the list, keeping the first spelling
/// and the original order.
#[must_use]
pub fn unique_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::with_capacity(paths.len());
    let mut unique = Vec::with_capacity(paths.len());
    for path in paths {
        if seen.insert(path_key(&path)) {
            unique.push(path);
        } else {
            log::debug!("Ignoring repeated path {}", path.display());
        }
    }
    unique
}

/// Read a file fully as UTF-8 text.
///
/// The file handle is closed before returning on every path, including errors.
///
/// # Errors
///
/// Returns `DocumentError::Encoding` for invalid UTF-8 and the matching
/// I/O variant when the file cannot be read.
pub fn read_document(path: &Path) -> Result<String, DocumentError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DocumentError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => DocumentError::PermissionDenied(path.to_path_buf()),
        _ => DocumentError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    String::from_utf8(bytes).map_err(|e| DocumentError::Encoding {
        path: path.to_path_buf(),
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}

/// Result of loading an ordered list of files.
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    /// Successfully read documents, in the order the paths were given
    pub corpus: Corpus,
    /// Files that could not be read
    pub skipped: Vec<SkippedDocument>,
}

/// Read every path into a corpus, preserving the given order.
///
/// Unreadable files are recorded in [`LoadedCorpus::skipped`] and logged as
/// warnings instead of aborting the run. A file named twice (see
/// [`path_key`]) is loaded once, at its first position.
///
/// # Errors
///
/// Returns `SourceError::Interrupted` if the shutdown flag is raised between
/// files. The partially loaded corpus is dropped.
pub fn load_documents(
    paths: &[PathBuf],
    shutdown_flag: Option<&Arc<AtomicBool>>,
) -> Result<LoadedCorpus, SourceError> {
    load_documents_with_progress(paths, shutdown_flag, None)
}

/// Same as [`load_documents`], reporting each file to a progress callback.
///
/// # Errors
///
/// Returns `SourceError::Interrupted` on shutdown.
pub fn load_documents_with_progress(
    paths: &[PathBuf],
    shutdown_flag: Option<&Arc<AtomicBool>>,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Result<LoadedCorpus, SourceError> {
    let mut loaded = LoadedCorpus::default();

    if let Some(cb) = progress {
        cb.on_phase_start("loading", paths.len());
    }

    let mut seen = HashSet::with_capacity(paths.len());

    for (i, path) in paths.iter().enumerate() {
        if shutdown_flag.is_some_and(|f| f.load(Ordering::SeqCst)) {
            log::debug!("Loading: Shutdown requested after {} file(s)", i);
            return Err(SourceError::Interrupted);
        }

        // One document per file, whatever the spelling
        if !seen.insert(path_key(path)) {
            log::debug!("Ignoring repeated path {}", path.display());
            if let Some(cb) = progress {
                cb.on_progress(i + 1, &path.to_string_lossy());
            }
            continue;
        }

        match read_document(path) {
            Ok(text) => loaded.corpus.push(path.clone(), text),
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                loaded
                    .skipped
                    .push(SkippedDocument::new(DocumentId::Path(path.clone()), e.to_string()));
            }
        }

        if let Some(cb) = progress {
            cb.on_progress(i + 1, &path.to_string_lossy());
        }
    }

    if let Some(cb) = progress {
        cb.on_phase_end("loading");
    }

    Ok(loaded)
}
