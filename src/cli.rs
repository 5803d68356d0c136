use std::path::PathBuf;

use clap::Parser;
use image_view_cache::{ViewerConfig, ViewerConfigBuilder, ViewerConfigBuilderError};

#[derive(Parser)]
#[command(
    name = "image-view",
    about = "Open an image, step through its directory and render each one to a viewport"
)]
pub struct Cli {
    /// Image to open; its directory becomes the image set
    pub path: PathBuf,

    /// Viewport width in pixels
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value = "600")]
    pub height: u32,

    /// Number of images to step through after the first
    #[arg(short, long, default_value = "0")]
    pub steps: usize,

    /// Step backwards instead of forwards
    #[arg(short, long)]
    pub reverse: bool,

    /// Directory to write each rendered bitmap to, as PNG
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Maximum number of decoded images to keep
    #[arg(long)]
    pub max_decoded_entries: Option<usize>,

    /// Memory budget for decoded images (e.g. 200MB, 1GB)
    #[arg(short, long, value_parser = parse_memory_budget)]
    pub max_decoded_memory: Option<u64>,

    /// Maximum number of rendered bitmaps to keep
    #[arg(long)]
    pub max_resize_entries: Option<usize>,
}

impl Cli {
    pub fn viewer_config(&self) -> Result<ViewerConfig, ViewerConfigBuilderError> {
        let mut builder = ViewerConfigBuilder::default();
        if let Some(n) = self.max_decoded_entries {
            builder.max_decoded_entries(n);
        }
        if let Some(bytes) = self.max_decoded_memory {
            builder.max_decoded_bytes(bytes);
        }
        if let Some(n) = self.max_resize_entries {
            builder.max_resize_entries(n);
        }
        builder.build()
    }
}

/// Parse sizes like `512MB`, `2GB`, `64KB` or a bare number of megabytes.
pub fn parse_memory_budget(s: &str) -> Result<u64, String> {
    let s = s.trim().to_uppercase();
    let (num, unit) = if let Some(num) = s.strip_suffix("GB") {
        (num, 1024 * 1024 * 1024)
    } else if let Some(num) = s.strip_suffix("MB") {
        (num, 1024 * 1024)
    } else if let Some(num) = s.strip_suffix("KB") {
        (num, 1024)
    } else if let Some(num) = s.strip_suffix('B') {
        (num, 1)
    } else {
        (s.as_str(), 1024 * 1024)
    };
    let value = num
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid memory size {:?}: {}", s, e))?;
    if value < 0.0 {
        return Err(format!("memory size {:?} is negative", s));
    }
    Ok((value * unit as f64) as u64)
}
