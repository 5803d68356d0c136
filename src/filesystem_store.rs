use std::path::Path;
use std::time::Instant;

use crate::*;

/// An [ImageStore] which reads files from disk and decodes them with the `image` crate.
///
/// The format is guessed from the file contents, falling back to the extension, so a misnamed file still opens.
#[derive(Debug, Default)]
pub struct FilesystemImageStore;

impl FilesystemImageStore {
    pub fn new() -> FilesystemImageStore {
        FilesystemImageStore
    }
}

impl ImageStore for FilesystemImageStore {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let start = Instant::now();
        let image = image::ImageReader::open(path)
            .map_err(|e| DecodeError::new(path, image::ImageError::IoError(e)))?
            .with_guessed_format()
            .map_err(|e| DecodeError::new(path, image::ImageError::IoError(e)))?
            .decode()
            .map_err(|e| DecodeError::new(path, e))?;

        let decoded = DecodedImage::new(image);
        log::debug!(
            "decoded {} ({}x{} {:?}) in {:.1}ms",
            path.display(),
            decoded.width(),
            decoded.height(),
            decoded.color_mode(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(decoded)
    }
}
