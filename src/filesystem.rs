//! Named source roots: file enumeration, reads, and writes behind one trait.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::composer::ComposerManifest;
use crate::error::Error;
use crate::types::SourceText;

/// Files under the autoload paths declared in the root's `composer.json`.
pub struct ComposerFilesystem {
    /// Which files count as candidates.
    filter: FileFilter,
    /// Directory holding `composer.json`.
    root: PathBuf,
}

impl ComposerFilesystem {
    /// Root at the directory holding `composer.json`.
    pub fn new(root: PathBuf, filter: FileFilter) -> Self {
        return Self { filter, root };
    }
}

impl Filesystem for ComposerFilesystem {
    fn file_list(&self) -> Result<Vec<PathBuf>, Error> {
        let manifest = ComposerManifest::load(&self.root)?.ok_or_else(|| {
            return Error::ComposerInvalid {
                path: self.root.join("composer.json"),
                reason: "file not found".to_string(),
            };
        })?;

        let mut files = Vec::new();
        for source_path in manifest.source_paths() {
            let dir = self.root.join(source_path);
            if !dir.exists() {
                tracing::debug!(path = %dir.display(), "autoload path does not exist");
                continue;
            }
            files.extend(walk_candidate_files(&dir, &self.filter)?);
        }
        files.sort();
        files.dedup();
        return Ok(files);
    }

    fn root(&self) -> &Path {
        return &self.root;
    }
}

/// Candidate-file filter by extension (`php` by default).
#[derive(Debug, Clone)]
pub struct FileFilter {
    /// Extensions without the leading dot.
    extensions: Vec<String>,
}

impl FileFilter {
    /// Whether `path` has one of the configured extensions.
    pub fn matches(&self, path: &Path) -> bool {
        return path
            .extension()
            .and_then(|e| return e.to_str())
            .is_some_and(|ext| return self.extensions.iter().any(|x| return x == ext));
    }

    /// Filter keeping files with any of `extensions`.
    pub fn new(extensions: Vec<String>) -> Self {
        return Self { extensions };
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        return Self::new(vec!["php".to_string()]);
    }
}

/// A source root that can list, read, and persist candidate files.
/// Reads and writes go straight to disk unless an implementation says otherwise.
pub trait Filesystem {
    /// Whether something already exists at `path`.
    fn exists(&self, path: &Path) -> bool {
        return path.exists();
    }

    /// Snapshot of every candidate file, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be enumerated.
    fn file_list(&self) -> Result<Vec<PathBuf>, Error>;

    /// Read a file's current contents.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReadFailed` if the file cannot be read.
    fn read(&self, path: &Path) -> Result<SourceText, Error> {
        return std::fs::read(path)
            .map(SourceText::new)
            .map_err(|source| return Error::ReadFailed { path: path.to_path_buf(), source });
    }

    /// Directory the root is anchored at.
    fn root(&self) -> &Path;

    /// Replace a file's contents in one whole-file write, creating missing
    /// parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Error::WriteFailed` if the file cannot be written.
    fn write(&self, path: &Path, contents: &SourceText) -> Result<(), Error> {
        let failed = |source| return Error::WriteFailed { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent().filter(|p| return !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(failed)?;
        }
        return std::fs::write(path, contents.as_bytes()).map_err(failed);
    }
}

/// Explicit name → root map, built once at startup.
#[derive(Default)]
pub struct FilesystemRegistry {
    /// Roots by name.
    roots: BTreeMap<String, Box<dyn Filesystem>>,
}

impl FilesystemRegistry {
    /// Look up a named root.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownRoot` listing the registered names.
    pub fn get(&self, name: &str) -> Result<&dyn Filesystem, Error> {
        return self.roots.get(name).map(|fs| return &**fs).ok_or_else(|| {
            return Error::UnknownRoot {
                known: self.names(),
                name: name.to_string(),
            };
        });
    }

    /// Registered root names, sorted.
    pub fn names(&self) -> Vec<String> {
        return self.roots.keys().cloned().collect();
    }

    /// Empty registry.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Register (or replace) a named root.
    pub fn register(&mut self, name: &str, filesystem: Box<dyn Filesystem>) {
        self.roots.insert(name.to_string(), filesystem);
    }
}

/// Files tracked by git under the root (`git ls-files`).
pub struct GitFilesystem {
    /// Which files count as candidates.
    filter: FileFilter,
    /// Directory git is run in.
    root: PathBuf,
}

impl GitFilesystem {
    /// Root at a directory inside a git work tree.
    pub fn new(root: PathBuf, filter: FileFilter) -> Self {
        return Self { filter, root };
    }
}

impl Filesystem for GitFilesystem {
    fn file_list(&self) -> Result<Vec<PathBuf>, Error> {
        let output = Command::new("git")
            .args(["ls-files", "-z"])
            .current_dir(&self.root)
            .output()
            .map_err(|e| {
                return Error::GitFailed {
                    reason: e.to_string(),
                    root: self.root.clone(),
                };
            })?;

        if !output.status.success() {
            return Err(Error::GitFailed {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                root: self.root.clone(),
            });
        }

        // Tracked files deleted from the worktree are not candidates.
        return Ok(output
            .stdout
            .split(|b| return *b == 0)
            .filter(|entry| return !entry.is_empty())
            .map(|entry| return self.root.join(&*String::from_utf8_lossy(entry)))
            .filter(|path| return self.filter.matches(path) && path.is_file())
            .collect());
    }

    fn root(&self) -> &Path {
        return &self.root;
    }
}

/// In-memory root for tests. Clones share state, so a test can keep a handle
/// after moving one into a registry.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryFilesystem {
    /// Shared file table.
    state: std::rc::Rc<std::cell::RefCell<MemoryState>>,
}

#[cfg(test)]
impl MemoryFilesystem {
    /// Current contents of `path` as UTF-8.
    pub fn contents(&self, path: &str) -> String {
        let state = self.state.borrow();
        String::from_utf8(state.files[Path::new(path)].clone()).unwrap()
    }

    /// Copy of every file's contents.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.state.borrow().files.clone()
    }

    /// Add a file; listing order is insertion order.
    pub fn with_file(self, path: &str, contents: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.files.insert(PathBuf::from(path), contents.as_bytes().to_vec());
            state.listing.push(PathBuf::from(path));
        }
        self
    }

    /// List a path that has no contents, so reading it fails.
    pub fn with_unreadable(self, path: &str) -> Self {
        self.state.borrow_mut().listing.push(PathBuf::from(path));
        self
    }

    /// Add a readable file whose writes fail.
    pub fn with_unwritable(self, path: &str, contents: &str) -> Self {
        let this = self.with_file(path, contents);
        this.state.borrow_mut().unwritable.push(PathBuf::from(path));
        this
    }

    /// Paths written so far, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.state.borrow().writes.clone()
    }
}

#[cfg(test)]
impl Filesystem for MemoryFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.state.borrow().files.contains_key(path)
    }

    fn file_list(&self) -> Result<Vec<PathBuf>, Error> {
        Ok(self.state.borrow().listing.clone())
    }

    fn read(&self, path: &Path) -> Result<SourceText, Error> {
        self.state
            .borrow()
            .files
            .get(path)
            .map(|bytes| SourceText::new(bytes.clone()))
            .ok_or_else(|| Error::ReadFailed {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }

    fn root(&self) -> &Path {
        Path::new("/memory")
    }

    fn write(&self, path: &Path, contents: &SourceText) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        if state.unwritable.iter().any(|p| p == path) {
            return Err(Error::WriteFailed {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        state.files.insert(path.to_path_buf(), contents.as_bytes().to_vec());
        state.writes.push(path.to_path_buf());
        Ok(())
    }
}

/// Backing store shared by `MemoryFilesystem` clones.
#[cfg(test)]
#[derive(Default)]
struct MemoryState {
    /// Contents by path.
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Paths returned by `file_list`, in order.
    listing: Vec<PathBuf>,
    /// Paths whose writes fail.
    unwritable: Vec<PathBuf>,
    /// Successful writes, in order.
    writes: Vec<PathBuf>,
}

/// Walks a directory tree, skipping hidden directories.
pub struct SimpleFilesystem {
    /// Which files count as candidates.
    filter: FileFilter,
    /// Directory to walk.
    root: PathBuf,
}

impl SimpleFilesystem {
    /// Root at `root`, keeping files that pass `filter`.
    pub fn new(root: PathBuf, filter: FileFilter) -> Self {
        return Self { filter, root };
    }
}

impl Filesystem for SimpleFilesystem {
    fn file_list(&self) -> Result<Vec<PathBuf>, Error> {
        return walk_candidate_files(&self.root, &self.filter);
    }

    fn root(&self) -> &Path {
        return &self.root;
    }
}

/// Walk `dir` depth-first in file-name order, keeping matching files.
///
/// # Errors
///
/// Returns `Error::Io` if a directory cannot be traversed.
fn walk_candidate_files(dir: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| return e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| return Error::Io(e.into()))?;
        if entry.file_type().is_file() && filter.matches(entry.path()) {
            files.push(entry.into_path());
        }
    }
    return Ok(files);
}
