//! Size limits for decoded images.
//!
//! [`ImageLimits`] caps what [`Image::load`](crate::Image::load) accepts from
//! a codec. Codecs receive the limits and check them against the header with
//! [`ImageLimits::check_allocation`] before allocating; `load` checks the
//! decoded image again. [`LimitExceeded`] is returned when a check fails.

use crate::format::ColorFormat;
use crate::image::Image;

/// Caps on image size. `None` means no limit for that dimension.
///
/// # Example
///
/// ```
/// use zenraster::ImageLimits;
///
/// let limits = ImageLimits::none()
///     .with_max_width(4096)
///     .with_max_pixels(16_000_000);
/// assert!(limits.check_dimensions(1024, 768).is_ok());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ImageLimits {
    /// Maximum width in pixels.
    pub max_width: Option<u32>,
    /// Maximum height in pixels.
    pub max_height: Option<u32>,
    /// Maximum total pixels (width × height).
    pub max_pixels: Option<u64>,
    /// Maximum pixel storage in bytes (stride × height).
    pub max_memory_bytes: Option<u64>,
}

impl ImageLimits {
    /// No limits.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set maximum width in pixels.
    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Set maximum height in pixels.
    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Set maximum total pixels.
    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    /// Set maximum pixel storage in bytes.
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Whether any limit is set.
    pub fn has_any(&self) -> bool {
        self.max_width.is_some()
            || self.max_height.is_some()
            || self.max_pixels.is_some()
            || self.max_memory_bytes.is_some()
    }

    /// Check dimensions against `max_width`, `max_height` and `max_pixels`.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_width
            && width > max
        {
            return Err(LimitExceeded::Width { actual: width, max });
        }
        if let Some(max) = self.max_height
            && height > max
        {
            return Err(LimitExceeded::Height {
                actual: height,
                max,
            });
        }
        if let Some(max) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max {
                return Err(LimitExceeded::Pixels {
                    actual: pixels,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Check a storage size against `max_memory_bytes`.
    pub fn check_memory(&self, bytes: u64) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_memory_bytes
            && bytes > max
        {
            return Err(LimitExceeded::Memory { actual: bytes, max });
        }
        Ok(())
    }

    /// Check a tightly packed `width`×`height` image in `format` against
    /// every limit, before allocating it.
    pub fn check_allocation(
        &self,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> Result<(), LimitExceeded> {
        self.check_dimensions(width, height)?;
        let bytes = u64::from(width)
            .saturating_mul(format.bytes_per_pixel() as u64)
            .saturating_mul(u64::from(height));
        self.check_memory(bytes)
    }

    /// Check an image's dimensions and storage against every limit.
    pub fn check_image(&self, image: &Image<'_>) -> Result<(), LimitExceeded> {
        self.check_dimensions(image.width(), image.height())?;
        self.check_memory(image.stride() as u64 * u64::from(image.height()))
    }
}

/// An image was larger than an [`ImageLimits`] allows.
///
/// Each variant carries the actual value and the limit it exceeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LimitExceeded {
    /// Width exceeded `max_width`.
    Width {
        /// Actual width.
        actual: u32,
        /// Maximum allowed.
        max: u32,
    },
    /// Height exceeded `max_height`.
    Height {
        /// Actual height.
        actual: u32,
        /// Maximum allowed.
        max: u32,
    },
    /// Pixel count exceeded `max_pixels`.
    Pixels {
        /// Actual pixel count.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
    /// Storage exceeded `max_memory_bytes`.
    Memory {
        /// Storage in bytes.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
}

impl core::fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Width { actual, max } => write!(f, "width {actual} exceeds limit {max}"),
            Self::Height { actual, max } => write!(f, "height {actual} exceeds limit {max}"),
            Self::Pixels { actual, max } => {
                write!(f, "pixel count {actual} exceeds limit {max}")
            }
            Self::Memory { actual, max } => {
                write!(f, "memory {actual} bytes exceeds limit {max}")
            }
        }
    }
}

impl core::error::Error for LimitExceeded {}
