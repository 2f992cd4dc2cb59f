//! In-memory backend used by tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::ArtifactStore;

#[derive(Default)]
struct Inner {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    pinned: BTreeSet<PathBuf>,
}

impl Inner {
    fn add_dir(&mut self, dir: &Path) {
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn require_dir(&self, dir: &Path) -> io::Result<()> {
        if self.dirs.contains(dir) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory '{}' not found", dir.display()),
            ))
        }
    }
}

fn child_name(path: &Path, parent: &Path) -> Option<String> {
    if path.parent() == Some(parent) {
        path.file_name().map(|n| n.to_string_lossy().into_owned())
    } else {
        None
    }
}

/// Keeps directories and files in ordered maps.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `clear_files` fail on `dir` while `name` is in it, like a file
    /// held open by another program.
    pub fn pin(&self, dir: &Path, name: &str) {
        self.inner.lock().unwrap().pinned.insert(dir.join(name));
    }
}

impl ArtifactStore for MemoryStore {
    fn dir_exists(&self, dir: &Path) -> bool {
        self.inner.lock().unwrap().dirs.contains(dir)
    }

    fn file_exists(&self, dir: &Path, name: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .files
            .contains_key(&dir.join(name))
    }

    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        self.inner.lock().unwrap().add_dir(dir);
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        inner.require_dir(dir)?;
        let mut names: Vec<String> = inner
            .files
            .keys()
            .filter_map(|path| child_name(path, dir))
            .collect();
        names.sort();
        Ok(names)
    }

    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        inner.require_dir(dir)?;
        let mut names: Vec<String> = inner
            .dirs
            .iter()
            .filter_map(|path| child_name(path, dir))
            .collect();
        names.sort();
        Ok(names)
    }

    fn read(&self, dir: &Path, name: &str) -> io::Result<Vec<u8>> {
        let path = dir.join(name);
        self.inner
            .lock()
            .unwrap()
            .files
            .get(&path)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("'{}' not found", path.display()),
                )
            })
    }

    fn write(&self, dir: &Path, name: &str, bytes: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.add_dir(dir);
        inner.files.insert(dir.join(name), bytes.to_vec());
        Ok(())
    }

    fn copy(&self, src: &Path, name: &str, dst: &Path) -> io::Result<()> {
        let bytes = self.read(src, name)?;
        self.write(dst, name, &bytes)
    }

    fn clear_files(&self, dir: &Path) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.dirs.contains(dir) {
            inner.add_dir(dir);
            return Ok(0);
        }
        if let Some(path) = inner
            .pinned
            .iter()
            .find(|path| path.parent() == Some(dir) && inner.files.contains_key(*path))
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("'{}' is in use", path.display()),
            ));
        }
        let before = inner.files.len();
        inner.files.retain(|path, _| path.parent() != Some(dir));
        Ok(before - inner.files.len())
    }

    fn clear_dirs(&self, dir: &Path) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.dirs.contains(dir) {
            inner.add_dir(dir);
            return Ok(0);
        }
        let children: Vec<PathBuf> = inner
            .dirs
            .iter()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect();
        for child in &children {
            inner.dirs.retain(|path| !path.starts_with(child));
            inner.files.retain(|path, _| !path.starts_with(child));
        }
        Ok(children.len())
    }
}
