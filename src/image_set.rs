//! An [ImageSet] is the sorted list of images in one directory, with wraparound navigation.
use std::fs;
use std::path::{Component, Path, PathBuf};

use relative_path::RelativePathBuf;

use crate::*;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"];

/// Whether `path` has one of the [SUPPORTED_EXTENSIONS], ignoring case.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Make `path` absolute against the working directory and resolve `.` and `..` lexically.
///
/// Symlinks are not followed, and a path that doesn't exist is fine.  Non UTF-8 paths are only made absolute.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut root = PathBuf::new();
    let mut rest = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => root.push(component.as_os_str()),
            other => rest.push(other.as_os_str()),
        }
    }

    // Going via `RelativePathBuf` lets `..` pop from the root instead of being appended.
    match RelativePathBuf::from_path(&rest) {
        Ok(relative) => relative.to_logical_path(&root),
        Err(_) => absolute,
    }
}

/// Comparison key for [ImageSet::index_of].
fn match_key(path: &Path) -> String {
    normalize_path(path).to_string_lossy().to_lowercase()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageSet {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl ImageSet {
    /// List the supported images in `dir`, or fail if the directory can't be read.
    pub fn try_open(dir: &Path) -> Result<ImageSet, DirectoryReadError> {
        let dir = normalize_path(dir);
        let entries = fs::read_dir(&dir).map_err(|source| DirectoryReadError {
            dir: dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && is_image_file(&p) {
                paths.push(p);
            }
        }
        // Within one directory this is plain byte order of the file names.
        paths.sort();

        log::info!("found {} images in {}", paths.len(), dir.display());
        Ok(ImageSet { dir, paths })
    }

    /// Like [ImageSet::try_open], but an unreadable directory gives an empty set.
    pub fn open(dir: &Path) -> ImageSet {
        match Self::try_open(dir) {
            Ok(set) => set,
            Err(e) => {
                log::warn!("{}", e);
                ImageSet {
                    dir: normalize_path(dir),
                    paths: Vec::new(),
                }
            }
        }
    }

    /// Build a set from an explicit list, normalizing and sorting it the same way [ImageSet::open] does.
    pub fn from_paths(dir: &Path, paths: impl IntoIterator<Item = PathBuf>) -> ImageSet {
        let mut paths = paths
            .into_iter()
            .map(|p| normalize_path(&p))
            .collect::<Vec<_>>();
        paths.sort();
        ImageSet {
            dir: normalize_path(dir),
            paths,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path_at(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(|p| p.as_path())
    }

    /// Position of `path`, compared case-insensitively after normalization.
    ///
    /// A path which isn't in the set maps to the first image rather than failing, since the caller always has
    /// something to show.
    pub fn index_of(&self, path: &Path) -> usize {
        let wanted = match_key(path);
        match self.paths.iter().position(|p| match_key(p) == wanted) {
            Some(i) => i,
            None => {
                log::debug!(
                    "{} is not in {}, defaulting to the first image",
                    path.display(),
                    self.dir.display()
                );
                0
            }
        }
    }

    /// The index after `index`, wrapping to the start.  `None` for an empty set.
    pub fn next(&self, index: usize) -> Option<usize> {
        let len = self.paths.len();
        if len == 0 {
            return None;
        }
        Some((index % len + 1) % len)
    }

    /// The index before `index`, wrapping to the end.  `None` for an empty set.
    pub fn previous(&self, index: usize) -> Option<usize> {
        let len = self.paths.len();
        if len == 0 {
            return None;
        }
        Some((index % len + len - 1) % len)
    }
}
