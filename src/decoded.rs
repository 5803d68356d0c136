//! Pixel containers handed between the store, the caches and the display surface.
use std::fmt;

use image::{ColorType, DynamicImage, RgbaImage};

/// Channel layout of a decoded image, as far as memory accounting is concerned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
    Other,
}

impl ColorMode {
    /// RGB is counted at four bytes because it is held on an RGBA basis once rendered.
    pub fn bytes_per_pixel(self) -> u64 {
        match self {
            ColorMode::Grayscale => 1,
            ColorMode::GrayscaleAlpha => 2,
            ColorMode::Rgb | ColorMode::Rgba => 4,
            ColorMode::Other => 3,
        }
    }
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> ColorMode {
        match color {
            ColorType::L8 | ColorType::L16 => ColorMode::Grayscale,
            ColorType::La8 | ColorType::La16 => ColorMode::GrayscaleAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
            _ => ColorMode::Other,
        }
    }
}

/// An image file parsed into memory, prior to any scaling.
pub struct DecodedImage {
    image: DynamicImage,
    mode: ColorMode,
}

impl DecodedImage {
    pub fn new(image: DynamicImage) -> DecodedImage {
        let mode = image.color().into();
        DecodedImage { image, mode }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.mode
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// `width * height * bytes_per_pixel`, the cost charged against the decoded cache.
    pub fn estimated_bytes(&self) -> u64 {
        self.width() as u64 * self.height() as u64 * self.mode.bytes_per_pixel()
    }
}

impl From<DynamicImage> for DecodedImage {
    fn from(image: DynamicImage) -> DecodedImage {
        DecodedImage::new(image)
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("mode", &self.mode)
            .finish()
    }
}

/// A scaled RGBA copy ready to be drawn.  Owns its pixels; never a view into a [DecodedImage].
#[derive(Clone, PartialEq)]
pub struct Bitmap {
    pixels: RgbaImage,
}

impl Bitmap {
    pub fn new(pixels: RgbaImage) -> Bitmap {
        Bitmap { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn size_bytes(&self) -> u64 {
        self.pixels.as_raw().len() as u64
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
