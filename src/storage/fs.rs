//! Local directory backend.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::ArtifactStore;

/// Stores artifacts as plain files below a root directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, dir: &Path) -> PathBuf {
        self.root.join(dir)
    }

    /// Collects entry names of `dir` whose path passes `keep`.
    fn entry_names(&self, dir: &Path, keep: impl Fn(&Path) -> bool) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.resolve(dir))? {
            let entry = entry?;
            if !keep(&entry.path()) {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => crate::log(&format!(
                    "Warning: skipping non UTF-8 file name {:?} in '{}'",
                    raw,
                    dir.display()
                )),
            }
        }
        names.sort();
        Ok(names)
    }
}

impl ArtifactStore for FsStore {
    fn dir_exists(&self, dir: &Path) -> bool {
        self.resolve(dir).is_dir()
    }

    fn file_exists(&self, dir: &Path, name: &str) -> bool {
        self.resolve(dir).join(name).is_file()
    }

    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(self.resolve(dir))
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.entry_names(dir, |path| path.is_file())
    }

    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.entry_names(dir, |path| path.is_dir())
    }

    fn read(&self, dir: &Path, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(dir).join(name))
    }

    fn write(&self, dir: &Path, name: &str, bytes: &[u8]) -> io::Result<()> {
        let target = self.resolve(dir);
        fs::create_dir_all(&target)?;
        fs::write(target.join(name), bytes)
    }

    fn copy(&self, src: &Path, name: &str, dst: &Path) -> io::Result<()> {
        let target = self.resolve(dst);
        fs::create_dir_all(&target)?;
        fs::copy(self.resolve(src).join(name), target.join(name))?;
        Ok(())
    }

    fn clear_files(&self, dir: &Path) -> io::Result<usize> {
        let target = self.resolve(dir);
        if !target.exists() {
            fs::create_dir_all(&target)?;
            crate::log(&format!("Created directory: '{}'", target.display()));
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&target)? {
            let path = entry?.path();
            let is_link = path
                .symlink_metadata()
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false);
            if !(path.is_file() || is_link) {
                continue;
            }
            fs::remove_file(&path).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("Failed to delete {}: {}", path.display(), e),
                )
            })?;
            removed += 1;
        }
        Ok(removed)
    }

    fn clear_dirs(&self, dir: &Path) -> io::Result<usize> {
        let target = self.resolve(dir);
        if !target.exists() {
            fs::create_dir_all(&target)?;
            return Ok(0);
        }

        let mut removed = 0;
        for name in self.list_dirs(dir)? {
            fs::remove_dir_all(target.join(&name))?;
            removed += 1;
        }
        Ok(removed)
    }
}
