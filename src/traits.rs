//! The [ImageStore] trait is the only boundary between the caches and the filesystem/codec.
//!
//! The decoded cache calls it on a miss and charges the result against its budget; it is never called for a path
//! which is already cached.
use std::path::Path;
use std::sync::Arc;

use crate::*;

/// Turn a path into a [DecodedImage].  Implementations do no caching of their own.
pub trait ImageStore: Send + Sync + 'static {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

impl<T: ImageStore + ?Sized> ImageStore for Arc<T> {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        (**self).decode(path)
    }
}
