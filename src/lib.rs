//! The caching and navigation core of a directory image viewer.
//!
//! Showing an image means decoding a file, which is slow, and scaling the result to the window, which isn't free
//! either.  A viewer that steps back and forth through a directory, or whose window is being dragged to a new size,
//! wants to do neither more often than it must, without letting memory grow with the size of the directory.  This
//! crate provides that in layers:
//!
//! [BoundedLru] is an Lru cache bounded both by entry count and by the total byte estimate of its values, and
//! [BoundedCache] wraps it in a mutex so read-ahead threads can share it.  These are the building blocks and are
//! useful on their own.
//!
//! On top of them sit two caches:
//!
//! - [DecodedImageCache] keeps decoded images by path, calling an [ImageStore] on a miss.
//! - [ResizeCache] keeps letterboxed bitmaps by path and viewport size.  Each is an independent copy, so evicting a
//!   decoded image never invalidates a bitmap or the other way around.
//!
//! Finally, [ViewerController] owns both caches plus an [ImageSet] (the sorted images of one directory) and exposes
//! the operations a UI needs: open a file, show an index, step to the next or previous image, and report a new
//! viewport size.  Drawing is left to the caller, which receives a [Frame] with the bitmap and its centered origin.
//!
//! To use this crate, construct a [ViewerController] with a [FilesystemImageStore] (or your own [ImageStore]) and a
//! [ViewerConfig].
mod bounded_cache;
mod bounded_lru;
mod config;
mod controller;
mod decoded;
mod decoded_cache;
mod error;
mod filesystem_store;
mod image_set;
mod resize_cache;
mod traits;

pub use bounded_cache::*;
pub use bounded_lru::*;
pub use config::*;
pub use controller::*;
pub use decoded::*;
pub use decoded_cache::*;
pub use error::*;
pub use filesystem_store::*;
pub use image_set::*;
pub use resize_cache::*;
pub use traits::*;
