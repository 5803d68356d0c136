//! The [ViewerController] drives navigation over an [ImageSet] and resolves each image to a displayable bitmap.
//!
//! Requests go through the resize cache first, then the decoded cache, and only then to the [ImageStore].  A viewport
//! change invalidates every rendered bitmap and, when something is on screen, re-renders it at the new size.
//!
//! The controller is driven from one thread; the caches it owns may also be read from others.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ViewerState {
    /// No image set loaded.
    Empty,
    /// An image set is loaded and the current index is valid.
    Ready,
    /// The current image's bitmap has been handed to the display surface.
    Displaying,
}

/// A bitmap plus where to put it on the surface.
#[derive(Clone, Debug)]
pub struct Frame {
    pub index: usize,
    pub path: PathBuf,
    pub bitmap: Arc<Bitmap>,
    pub x: i32,
    pub y: i32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemoryReport {
    pub decoded: CacheStats,
    pub resized: CacheStats,
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

impl fmt::Display for MemoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "decoded images: {}/{} cached, {:.2}/{:.2} MB",
            self.decoded.count,
            self.decoded.max_entries,
            mib(self.decoded.bytes_used),
            mib(self.decoded.max_bytes)
        )?;
        write!(
            f,
            "resized bitmaps: {}/{} cached, {:.2}/{:.2} MB",
            self.resized.count,
            self.resized.max_entries,
            mib(self.resized.bytes_used),
            mib(self.resized.max_bytes)
        )
    }
}

pub struct ViewerController<S: ImageStore> {
    decoded: DecodedImageCache<S>,
    resized: ResizeCache,
    images: ImageSet,
    state: ViewerState,
    current_index: usize,
    viewport: (u32, u32),
}

impl<S: ImageStore> ViewerController<S> {
    /// The viewport starts at 0x0, so rendering uses the fallback until [ViewerController::resize] is called.
    pub fn new(store: S, config: ViewerConfig) -> ViewerController<S> {
        ViewerController {
            decoded: DecodedImageCache::from_config(store, &config),
            resized: ResizeCache::from_config(&config),
            images: ImageSet::default(),
            state: ViewerState::Empty,
            current_index: 0,
            viewport: (0, 0),
        }
    }

    /// Load the directory containing `path` and point at `path` within it.
    pub fn open_file(&mut self, path: &Path) -> Result<(), ViewerError> {
        let path = normalize_path(path);
        if !path.exists() {
            return Err(ViewerError::FileNotFound(path));
        }
        if !is_image_file(&path) {
            return Err(ViewerError::UnsupportedFile(path));
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("/"));
        let images = ImageSet::open(dir);
        if images.is_empty() {
            self.images = images;
            self.state = ViewerState::Empty;
            self.current_index = 0;
            return Err(ViewerError::NoImages(dir.to_path_buf()));
        }

        self.current_index = images.index_of(&path);
        log::info!(
            "opened {} ({}/{})",
            path.display(),
            self.current_index + 1,
            images.len()
        );
        self.images = images;
        self.state = ViewerState::Ready;
        Ok(())
    }

    /// Resolve image `index` to a bitmap fitted to the viewport.
    ///
    /// The index becomes current even when decoding fails, so navigation can step past a broken file.  On failure the
    /// controller drops back to `Ready` and every cache entry is left as it was.
    pub fn show(&mut self, index: usize) -> Result<Frame, ViewerError> {
        if self.state == ViewerState::Empty {
            return Err(ViewerError::NoImageSet);
        }
        let path = match self.images.path_at(index) {
            Some(p) => p.to_path_buf(),
            None => {
                return Err(ViewerError::IndexOutOfRange {
                    index,
                    len: self.images.len(),
                })
            }
        };
        self.current_index = index;

        let decoded = match self.decoded.load(&path) {
            Ok(x) => x,
            Err(e) => {
                self.state = ViewerState::Ready;
                return Err(e.into());
            }
        };

        let (vw, vh) = self.viewport;
        let bitmap = self.resized.get_or_render(&path, &decoded, vw, vh);
        let (x, y) = center_offset(
            self.resized.effective_viewport(vw, vh),
            bitmap.width(),
            bitmap.height(),
        );
        self.state = ViewerState::Displaying;
        Ok(Frame {
            index,
            path,
            bitmap,
            x,
            y,
        })
    }

    /// Show the current image again, e.g. after opening a file.
    pub fn show_current(&mut self) -> Result<Frame, ViewerError> {
        self.show(self.current_index)
    }

    pub fn next(&mut self) -> Result<Frame, ViewerError> {
        let index = self.step(ImageSet::next)?;
        self.show(index)
    }

    pub fn previous(&mut self) -> Result<Frame, ViewerError> {
        let index = self.step(ImageSet::previous)?;
        self.show(index)
    }

    fn step(&self, f: fn(&ImageSet, usize) -> Option<usize>) -> Result<usize, ViewerError> {
        if self.state == ViewerState::Empty {
            return Err(ViewerError::NoImageSet);
        }
        f(&self.images, self.current_index).ok_or(ViewerError::NoImageSet)
    }

    /// Record a new viewport size.
    ///
    /// If the size changed, all rendered bitmaps are dropped, and the current image is rendered again when it is on
    /// screen.  Returns the new frame in that case.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Option<Frame>, ViewerError> {
        if (width, height) == self.viewport {
            return Ok(None);
        }
        log::debug!(
            "viewport {}x{} -> {}x{}",
            self.viewport.0,
            self.viewport.1,
            width,
            height
        );
        self.viewport = (width, height);
        self.resized.invalidate_all();

        if self.state == ViewerState::Displaying {
            self.show(self.current_index).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Empty both caches.  Navigation state is untouched.
    pub fn clear_caches(&self) {
        self.decoded.clear();
        self.resized.invalidate_all();
    }

    pub fn memory_report(&self) -> MemoryReport {
        MemoryReport {
            decoded: self.decoded.stats(),
            resized: self.resized.stats(),
        }
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_path(&self) -> Option<&Path> {
        match self.state {
            ViewerState::Empty => None,
            _ => self.images.path_at(self.current_index),
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn image_set(&self) -> &ImageSet {
        &self.images
    }

    pub fn decoded_cache(&self) -> &DecodedImageCache<S> {
        &self.decoded
    }

    pub fn resize_cache(&self) -> &ResizeCache {
        &self.resized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    /// A directory with `a.png` (400x300), `b.png` (300x300), `broken.png` and `c.png` (200x400).
    fn gallery() -> TempDir {
        let tmp_dir = tempfile::tempdir().unwrap();
        let dir = tmp_dir.path();
        RgbaImage::from_pixel(400, 300, Rgba([200, 10, 10, 255]))
            .save(dir.join("a.png"))
            .unwrap();
        RgbaImage::from_pixel(300, 300, Rgba([10, 200, 10, 255]))
            .save(dir.join("b.png"))
            .unwrap();
        std::fs::write(dir.join("broken.png"), b"garbage").unwrap();
        RgbaImage::from_pixel(200, 400, Rgba([10, 10, 200, 255]))
            .save(dir.join("c.png"))
            .unwrap();
        std::fs::write(dir.join("readme.txt"), b"not listed").unwrap();
        tmp_dir
    }

    fn viewer() -> ViewerController<FilesystemImageStore> {
        ViewerController::new(FilesystemImageStore::new(), ViewerConfig::default())
    }

    fn name(frame: &Frame) -> &str {
        frame.path.file_name().unwrap().to_str().unwrap()
    }

    #[test]
    fn starts_empty() {
        let mut v = viewer();
        assert_eq!(v.state(), ViewerState::Empty);
        assert!(matches!(v.show(0), Err(ViewerError::NoImageSet)));
        assert!(matches!(v.next(), Err(ViewerError::NoImageSet)));
        assert!(v.current_path().is_none());
    }

    #[test]
    fn open_file_points_at_requested_image() {
        let tmp_dir = gallery();
        let mut v = viewer();
        v.open_file(&tmp_dir.path().join("c.png")).unwrap();

        assert_eq!(v.state(), ViewerState::Ready);
        assert_eq!(v.image_set().len(), 4);
        assert_eq!(v.current_index(), 3);
        assert_eq!(v.current_path(), Some(tmp_dir.path().join("c.png").as_path()));
    }

    #[test]
    fn open_file_rejects_missing_and_unsupported() {
        let tmp_dir = gallery();
        let mut v = viewer();

        let err = v.open_file(&tmp_dir.path().join("zzz.png")).unwrap_err();
        assert!(matches!(err, ViewerError::FileNotFound(_)));
        let err = v.open_file(&tmp_dir.path().join("readme.txt")).unwrap_err();
        assert!(matches!(err, ViewerError::UnsupportedFile(_)));
        assert_eq!(v.state(), ViewerState::Empty);
    }

    #[test]
    fn show_renders_centered_with_fallback_viewport() {
        let tmp_dir = gallery();
        let mut v = viewer();
        v.open_file(&tmp_dir.path().join("a.png")).unwrap();

        let frame = v.show_current().unwrap();
        assert_eq!(v.state(), ViewerState::Displaying);
        assert_eq!(name(&frame), "a.png");
        // 4:3 fills the 640x480 fallback exactly.
        assert_eq!((frame.bitmap.width(), frame.bitmap.height()), (640, 480));
        assert_eq!((frame.x, frame.y), (0, 0));

        v.resize(800, 400).unwrap();
        let frame = v.show(3).unwrap();
        assert_eq!(name(&frame), "c.png");
        assert_eq!((frame.bitmap.width(), frame.bitmap.height()), (200, 400));
        assert_eq!((frame.x, frame.y), (300, 0));
    }

    #[test]
    fn next_and_previous_wrap() {
        let tmp_dir = gallery();
        let mut v = viewer();
        v.open_file(&tmp_dir.path().join("c.png")).unwrap();
        v.resize(100, 100).unwrap();

        let frame = v.next().unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!(name(&frame), "a.png");

        let frame = v.previous().unwrap();
        assert_eq!(name(&frame), "c.png");
    }

    #[test]
    fn broken_image_is_recoverable() {
        let tmp_dir = gallery();
        let mut v = viewer();
        v.open_file(&tmp_dir.path().join("b.png")).unwrap();
        v.resize(100, 100).unwrap();
        v.show_current().unwrap();
        let before = v.memory_report();

        let err = v.next().unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)));
        assert_eq!(err.path(), Some(tmp_dir.path().join("broken.png").as_path()));
        assert_eq!(v.state(), ViewerState::Ready);
        assert_eq!(v.current_index(), 2);
        assert_eq!(v.memory_report(), before);
        assert!(v.decoded_cache().contains(&tmp_dir.path().join("b.png")));

        // Stepping on past the broken file still works.
        let frame = v.next().unwrap();
        assert_eq!(name(&frame), "c.png");
        assert_eq!(v.state(), ViewerState::Displaying);
    }

    #[test]
    fn resize_invalidates_and_rerenders() {
        let tmp_dir = gallery();
        let mut v = viewer();
        v.open_file(&tmp_dir.path().join("a.png")).unwrap();
        v.resize(200, 200).unwrap();
        v.show(1).unwrap();
        v.show(0).unwrap();
        assert_eq!(v.resize_cache().stats().count, 2);

        let frame = v.resize(800, 300).unwrap().expect("current image is re-rendered");
        assert_eq!((frame.bitmap.width(), frame.bitmap.height()), (400, 300));
        assert_eq!((frame.x, frame.y), (200, 0));

        let a = tmp_dir.path().join("a.png");
        assert_eq!(
            v.resize_cache().keys(),
            vec![ResizeKey::new(&a, 800, 300)]
        );
        // Decoded images survive a resize.
        assert_eq!(v.decoded_cache().stats().count, 2);

        // Same size again is a no-op.
        assert!(v.resize(800, 300).unwrap().is_none());
        assert_eq!(v.resize_cache().stats().count, 1);
    }

    #[test]
    fn resize_while_not_displaying_only_invalidates() {
        let tmp_dir = gallery();
        let mut v = viewer();
        v.open_file(&tmp_dir.path().join("a.png")).unwrap();
        assert!(v.resize(300, 300).unwrap().is_none());
        assert_eq!(v.state(), ViewerState::Ready);
        assert_eq!(v.viewport(), (300, 300));
    }

    #[test]
    fn decoded_cache_is_reused_across_viewports() {
        let tmp_dir = gallery();
        let mut v = viewer();
        v.open_file(&tmp_dir.path().join("a.png")).unwrap();
        v.resize(100, 100).unwrap();
        let first = v.show_current().unwrap();
        let again = v.show_current().unwrap();
        assert!(Arc::ptr_eq(&first.bitmap, &again.bitmap));

        let decoded = v.decoded_cache().get(&first.path).unwrap();
        v.resize(50, 50).unwrap();
        assert!(Arc::ptr_eq(&decoded, &v.decoded_cache().get(&first.path).unwrap()));
    }

    #[test]
    fn clear_caches_keeps_position() {
        let tmp_dir = gallery();
        let mut v = viewer();
        v.open_file(&tmp_dir.path().join("b.png")).unwrap();
        v.show_current().unwrap();
        v.clear_caches();

        let report = v.memory_report();
        assert_eq!(report.decoded.count, 0);
        assert_eq!(report.resized.count, 0);
        assert_eq!(v.current_index(), 1);
        assert!(report.to_string().starts_with("decoded images: 0/15 cached"));
    }
}
