use std::io::Error as IoError;
use std::path::PathBuf;

/// An image file could not be turned into pixels.  Never cached; the next request tries again.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode {}: {source}", .path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

impl DecodeError {
    pub fn new(path: impl Into<PathBuf>, source: image::ImageError) -> DecodeError {
        DecodeError {
            path: path.into(),
            source,
        }
    }
}

/// A directory could not be listed.  Callers usually degrade to an empty image set.
#[derive(Debug, thiserror::Error)]
#[error("failed to read directory {}: {source}", .dir.display())]
pub struct DirectoryReadError {
    pub dir: PathBuf,
    #[source]
    pub source: IoError,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no image set is open")]
    NoImageSet,
    #[error("{} does not exist", .0.display())]
    FileNotFound(PathBuf),
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFile(PathBuf),
    #[error("no images found in {}", .0.display())]
    NoImages(PathBuf),
    #[error("index {index} is out of range for {len} images")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ViewerError {
    /// The image a failed request was about, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ViewerError::FileNotFound(p) | ViewerError::UnsupportedFile(p) => Some(p.as_path()),
            ViewerError::NoImages(dir) => Some(dir.as_path()),
            ViewerError::Decode(e) => Some(e.path.as_path()),
            ViewerError::NoImageSet | ViewerError::IndexOutOfRange { .. } => None,
        }
    }
}
