//! Budgets for the two caches and the viewport used before the surface has been laid out.
pub const DEFAULT_MAX_DECODED_ENTRIES: usize = 15;
pub const DEFAULT_MAX_DECODED_BYTES: u64 = 200 * 1024 * 1024;
pub const DEFAULT_MAX_RESIZE_ENTRIES: usize = 20;
pub const DEFAULT_MAX_RESIZE_BYTES: u64 = 200 * 1024 * 1024;
pub const DEFAULT_FALLBACK_VIEWPORT: (u32, u32) = (640, 480);

#[derive(Clone, Debug, PartialEq, derive_builder::Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct ViewerConfig {
    /// Maximum number of decoded images kept.
    #[builder(default = "DEFAULT_MAX_DECODED_ENTRIES")]
    pub max_decoded_entries: usize,
    /// Maximum estimated size of all decoded images, in bytes.
    #[builder(default = "DEFAULT_MAX_DECODED_BYTES")]
    pub max_decoded_bytes: u64,
    /// Maximum number of scaled bitmaps kept.
    #[builder(default = "DEFAULT_MAX_RESIZE_ENTRIES")]
    pub max_resize_entries: usize,
    /// Maximum size of all scaled bitmaps, in bytes.
    #[builder(default = "DEFAULT_MAX_RESIZE_BYTES")]
    pub max_resize_bytes: u64,
    /// Substituted for any viewport of one pixel or less in either direction.
    #[builder(default = "DEFAULT_FALLBACK_VIEWPORT")]
    pub fallback_viewport: (u32, u32),
}

impl ViewerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_decoded_entries == Some(0) {
            return Err("max_decoded_entries must be at least 1".into());
        }
        if self.max_resize_entries == Some(0) {
            return Err("max_resize_entries must be at least 1".into());
        }
        if let Some((w, h)) = self.fallback_viewport {
            if w <= 1 || h <= 1 {
                return Err(format!("fallback viewport {}x{} is degenerate", w, h));
            }
        }
        Ok(())
    }
}

impl Default for ViewerConfig {
    fn default() -> ViewerConfig {
        ViewerConfig {
            max_decoded_entries: DEFAULT_MAX_DECODED_ENTRIES,
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
            max_resize_entries: DEFAULT_MAX_RESIZE_ENTRIES,
            max_resize_bytes: DEFAULT_MAX_RESIZE_BYTES,
            fallback_viewport: DEFAULT_FALLBACK_VIEWPORT,
        }
    }
}
