//! Artifact storage shared by every pipeline stage.
//!
//! Stages never touch the filesystem directly. Screenshots, chapter folders and
//! text artifacts are read and written through [`ArtifactStore`], addressed by a
//! directory (relative to the store root) and a plain file name. Ordering is
//! always by file name, never by enumeration order of the backend.

pub mod fs;
#[cfg(test)]
pub mod memory;

pub use fs::FsStore;

use std::io;
use std::path::Path;

/// File extensions treated as page images (compared case-insensitively).
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Storage backend for pipeline artifacts.
pub trait ArtifactStore {
    /// Returns true if the directory exists.
    fn dir_exists(&self, dir: &Path) -> bool;

    /// Returns true if `name` exists as a file inside `dir`.
    fn file_exists(&self, dir: &Path, name: &str) -> bool;

    /// Creates the directory (and its parents) if it does not exist yet.
    fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Names of the files directly inside `dir`, sorted ascending.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Names of the sub-directories directly inside `dir`, sorted ascending.
    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<String>>;

    fn read(&self, dir: &Path, name: &str) -> io::Result<Vec<u8>>;

    /// Writes an artifact, creating `dir` when needed. An existing artifact
    /// with the same name is replaced.
    fn write(&self, dir: &Path, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Copies `name` from `src` into `dst`, keeping the file name and content.
    fn copy(&self, src: &Path, name: &str, dst: &Path) -> io::Result<()>;

    /// Deletes every file directly inside `dir` but keeps the directory and its
    /// sub-directories. Creates `dir` if it is absent. Returns the number of
    /// files removed. Stops at the first file that cannot be deleted.
    fn clear_files(&self, dir: &Path) -> io::Result<usize>;

    /// Deletes every sub-directory of `dir` with its contents. Creates `dir`
    /// if it is absent. Returns the number of directories removed.
    fn clear_dirs(&self, dir: &Path) -> io::Result<usize>;
}

/// Returns true if the file name has one of the supported image extensions.
pub fn is_image_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => IMAGE_EXTENSIONS
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(candidate)),
        _ => false,
    }
}

/// Lists the image files of `dir`, sorted ascending. A missing directory
/// yields an empty list.
pub fn list_images(store: &dyn ArtifactStore, dir: &Path) -> io::Result<Vec<String>> {
    if !store.dir_exists(dir) {
        return Ok(Vec::new());
    }
    let mut images: Vec<String> = store
        .list_files(dir)?
        .into_iter()
        .filter(|name| is_image_name(name))
        .collect();
    images.sort();
    Ok(images)
}

/// Lists the files of `dir` ending in `extension` (without the dot), sorted
/// ascending. A missing directory yields an empty list.
pub fn list_with_extension(
    store: &dyn ArtifactStore,
    dir: &Path,
    extension: &str,
) -> io::Result<Vec<String>> {
    if !store.dir_exists(dir) {
        return Ok(Vec::new());
    }
    let suffix = format!(".{}", extension);
    let mut names: Vec<String> = store
        .list_files(dir)?
        .into_iter()
        .filter(|name| name.ends_with(&suffix))
        .collect();
    names.sort();
    Ok(names)
}

/// Reads an artifact as UTF-8 text.
pub fn read_text(store: &dyn ArtifactStore, dir: &Path, name: &str) -> io::Result<String> {
    let bytes = store.read(dir, name)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
