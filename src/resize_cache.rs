//! The [ResizeCache] holds letterboxed bitmaps keyed by source path and target viewport.
//!
//! Keys embed the viewport, so once the surface changes size every entry is unreachable; the owner is expected to
//! call [ResizeCache::invalidate_all] at that point.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::FilterType;

use crate::*;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ResizeKey {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ResizeKey {
    pub fn new(path: &Path, width: u32, height: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            width,
            height,
        }
    }
}

/// Size of `image_w x image_h` scaled to fit inside `target_w x target_h` with its aspect ratio kept.
///
/// The bound side takes the target's length and the other is rounded down, never below one pixel.  Ratios are
/// compared by cross multiplication so the result is exact.
pub fn letterbox_size(image_w: u32, image_h: u32, target_w: u32, target_h: u32) -> (u32, u32) {
    let (iw, ih) = (image_w.max(1) as u64, image_h.max(1) as u64);
    let (tw, th) = (target_w as u64, target_h as u64);
    let (w, h) = if iw * th > tw * ih {
        (tw, tw * ih / iw)
    } else {
        (th * iw / ih, th)
    };
    (w.max(1) as u32, h.max(1) as u32)
}

/// Offset that centers a `bitmap_w x bitmap_h` bitmap on the viewport.
pub fn center_offset(viewport: (u32, u32), bitmap_w: u32, bitmap_h: u32) -> (i32, i32) {
    (
        (viewport.0 as i32 - bitmap_w as i32) / 2,
        (viewport.1 as i32 - bitmap_h as i32) / 2,
    )
}

pub struct ResizeCache {
    cache: BoundedCache<ResizeKey, Bitmap>,
    fallback_viewport: (u32, u32),
}

impl ResizeCache {
    pub fn new(max_entries: usize, max_bytes: u64, fallback_viewport: (u32, u32)) -> ResizeCache {
        ResizeCache {
            cache: BoundedCache::new(max_entries, max_bytes),
            fallback_viewport,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> ResizeCache {
        Self::new(
            config.max_resize_entries,
            config.max_resize_bytes,
            config.fallback_viewport,
        )
    }

    /// The viewport actually rendered into: `(width, height)` unless either side is one pixel or less.
    pub fn effective_viewport(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= 1 || height <= 1 {
            self.fallback_viewport
        } else {
            (width, height)
        }
    }

    /// Return the bitmap of `image` fitted to the viewport, rendering and caching it on a miss.
    ///
    /// Rendering is a pure function of the image and target size; Lanczos resampling is used whether scaling up or
    /// down.
    pub fn get_or_render(
        &self,
        path: &Path,
        image: &DecodedImage,
        target_w: u32,
        target_h: u32,
    ) -> Arc<Bitmap> {
        let (vw, vh) = self.effective_viewport(target_w, target_h);
        let key = ResizeKey::new(path, vw, vh);
        if let Some(x) = self.cache.get(&key) {
            log::debug!("resize cache hit: {} at {}x{}", path.display(), vw, vh);
            return x;
        }

        let bitmap = render(image, vw, vh);
        log::debug!(
            "resize cache insert: {} at {}x{} -> {}x{}",
            path.display(),
            vw,
            vh,
            bitmap.width(),
            bitmap.height()
        );
        let size = bitmap.size_bytes();
        self.cache.put(key, bitmap, size)
    }

    pub fn contains(&self, path: &Path, target_w: u32, target_h: u32) -> bool {
        let (vw, vh) = self.effective_viewport(target_w, target_h);
        self.cache.contains_key(&ResizeKey::new(path, vw, vh))
    }

    /// Drop every rendered bitmap.
    pub fn invalidate_all(&self) {
        let dropped = self.cache.len();
        self.cache.clear();
        log::debug!("resize cache invalidated ({} bitmaps dropped)", dropped);
    }

    pub fn keys(&self) -> Vec<ResizeKey> {
        self.cache.keys()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn render(image: &DecodedImage, viewport_w: u32, viewport_h: u32) -> Bitmap {
    let (w, h) = letterbox_size(image.width(), image.height(), viewport_w, viewport_h);
    Bitmap::new(
        image
            .image()
            .resize_exact(w, h, FilterType::Lanczos3)
            .into_rgba8(),
    )
}
