//! Strided pixel storage with an optional palette.
//!
//! An [`Image`] either owns its bytes or borrows them from the caller. Owned
//! images are zero-filled and freed on drop; borrowed images never free the
//! caller's memory. A read-only borrow is copied into owned storage the first
//! time it is written, so caller memory handed over as `&[u8]` is never
//! modified. Hand over `&mut [u8]` to draw straight into a caller buffer.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use imgref::{ImgRef, ImgRefMut, ImgVec};
use rgb::alt::BGRA;
use rgb::{Gray, Rgb, Rgba};

use crate::convert::{self, convert_unchecked};
use crate::format::ColorFormat;
use crate::native::NATIVE;

/// Largest palette a [`ColorFormat::Pal8`] image can hold.
pub const MAX_PALETTE_SIZE: usize = 256;

// ---------------------------------------------------------------------------
// ImageError
// ---------------------------------------------------------------------------

/// Errors from image construction, pixel access and conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImageError {
    /// Stride is smaller than `width * bytes_per_pixel`, the buffer is too
    /// small, or the size overflows.
    InvalidLayout,
    /// Pixel coordinate or palette index outside the valid range.
    OutOfBounds,
    /// Palette resize beyond [`MAX_PALETTE_SIZE`] entries.
    PaletteTooLarge {
        /// Requested entry count.
        requested: usize,
    },
    /// The operation cannot be expressed in the requested format, e.g.
    /// converting a lone color to or from a palette index.
    UnsupportedFormat,
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLayout => write!(f, "stride or buffer too small for the image dimensions"),
            Self::OutOfBounds => write!(f, "coordinate or index out of bounds"),
            Self::PaletteTooLarge { requested } => {
                write!(
                    f,
                    "palette of {requested} entries exceeds limit {MAX_PALETTE_SIZE}"
                )
            }
            Self::UnsupportedFormat => write!(f, "operation not supported for this color format"),
        }
    }
}

impl core::error::Error for ImageError {}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

enum Storage<'a> {
    Owned(Vec<u8>),
    Shared(&'a [u8]),
    Exclusive(&'a mut [u8]),
}

impl Storage<'_> {
    #[inline]
    fn bytes(&self) -> &[u8] {
        match self {
            Self::Owned(data) => data,
            Self::Shared(data) => data,
            Self::Exclusive(data) => data,
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        if let Self::Shared(data) = self {
            log::debug!("copying {} borrowed bytes on first write", data.len());
            *self = Self::Owned(data.to_vec());
        }
        match self {
            Self::Owned(data) => data.as_mut_slice(),
            Self::Exclusive(data) => &mut data[..],
            Self::Shared(_) => &mut [],
        }
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// A rectangular pixel buffer in one [`ColorFormat`].
///
/// Rows are `stride` bytes apart; each pixel is `depth` bytes holding the
/// packed value little-endian. [`ColorFormat::Pal8`] images carry a palette
/// of up to 256 ARGB8 colors.
///
/// Pixel values come in two flavours: *raw* values are packed in the image's
/// own format, *logical* values are ARGB8 with palettes resolved.
pub struct Image<'a> {
    storage: Storage<'a>,
    palette: Option<Vec<u32>>,
    width: u32,
    height: u32,
    stride: usize,
    depth: usize,
    format: ColorFormat,
}

impl Image<'static> {
    /// Allocate a zero-filled, tightly packed image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidLayout`] if the size overflows.
    pub fn new(width: u32, height: u32, format: ColorFormat) -> Result<Self, ImageError> {
        let stride = min_stride(width, format)?;
        Self::with_stride(width, height, stride, format)
    }

    /// Allocate a zero-filled image in the build's native format.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidLayout`] if the size overflows.
    pub fn native(width: u32, height: u32) -> Result<Self, ImageError> {
        Self::new(width, height, NATIVE)
    }

    /// Allocate a zero-filled image with rows `stride` bytes apart.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidLayout`] if `stride` is smaller than a
    /// row or the size overflows.
    pub fn with_stride(
        width: u32,
        height: u32,
        stride: usize,
        format: ColorFormat,
    ) -> Result<Self, ImageError> {
        validate(width, height, stride, format, None)?;
        let total = stride
            .checked_mul(height as usize)
            .ok_or(ImageError::InvalidLayout)?;
        log::debug!("allocating {width}x{height} {format} image, stride {stride}");
        Ok(Self::from_storage(
            Storage::Owned(vec![0u8; total]),
            width,
            height,
            stride,
            format,
        ))
    }

    /// Take ownership of `data` as pixel storage.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidLayout`] if `data` is too small for the
    /// dimensions and stride.
    pub fn from_vec(
        data: Vec<u8>,
        width: u32,
        height: u32,
        stride: usize,
        format: ColorFormat,
    ) -> Result<Self, ImageError> {
        validate(width, height, stride, format, Some(data.len()))?;
        Ok(Self::from_storage(
            Storage::Owned(data),
            width,
            height,
            stride,
            format,
        ))
    }
}

impl<'a> Image<'a> {
    /// Wrap caller memory without copying.
    ///
    /// The first write copies the pixels into owned storage; `data` itself is
    /// never modified or freed.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidLayout`] if `stride` is smaller than a
    /// row or `data` is too small.
    pub fn from_borrowed(
        width: u32,
        height: u32,
        stride: usize,
        format: ColorFormat,
        data: &'a [u8],
    ) -> Result<Self, ImageError> {
        validate(width, height, stride, format, Some(data.len()))?;
        Ok(Self::from_storage(
            Storage::Shared(data),
            width,
            height,
            stride,
            format,
        ))
    }

    /// Wrap caller memory for in-place drawing.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidLayout`] if `stride` is smaller than a
    /// row or `data` is too small.
    pub fn from_borrowed_mut(
        width: u32,
        height: u32,
        stride: usize,
        format: ColorFormat,
        data: &'a mut [u8],
    ) -> Result<Self, ImageError> {
        validate(width, height, stride, format, Some(data.len()))?;
        Ok(Self::from_storage(
            Storage::Exclusive(data),
            width,
            height,
            stride,
            format,
        ))
    }

    fn from_storage(
        storage: Storage<'a>,
        width: u32,
        height: u32,
        stride: usize,
        format: ColorFormat,
    ) -> Self {
        Self {
            storage,
            palette: format.is_paletted().then(Vec::new),
            width,
            height,
            stride,
            depth: format.bytes_per_pixel(),
            format,
        }
    }

    /// Release the image, returning owned storage for reuse.
    ///
    /// Returns `None` for borrowed storage, which stays with its owner.
    pub fn release(self) -> Option<Vec<u8>> {
        match self.storage {
            Storage::Owned(data) => Some(data),
            Storage::Shared(_) | Storage::Exclusive(_) => None,
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes per pixel.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// Whether the image owns its storage.
    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    /// Whether the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Palette entries, ARGB8. Empty for non-paletted images.
    #[inline]
    pub fn palette(&self) -> &[u32] {
        self.palette.as_deref().unwrap_or(&[])
    }

    /// Number of palette entries.
    #[inline]
    pub fn palette_size(&self) -> usize {
        self.palette().len()
    }

    /// The underlying bytes, including row padding.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.bytes()
    }

    /// Pixel bytes for row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        self.span(0, y, self.width)
    }

    /// Bytes of `len` pixels starting at `(x, y)`.
    ///
    /// A zero-length span is empty even when a zero-width image has no
    /// backing bytes at the row offset.
    #[inline]
    pub(crate) fn span(&self, x: u32, y: u32, len: u32) -> &[u8] {
        if len == 0 {
            return &[];
        }
        let start = self.offset(x, y);
        &self.storage.bytes()[start..start + len as usize * self.depth]
    }

    /// Mutable bytes of `len` pixels starting at `(x, y)`.
    #[inline]
    pub(crate) fn span_mut(&mut self, x: u32, y: u32, len: u32) -> &mut [u8] {
        if len == 0 {
            return &mut [];
        }
        let start = self.offset(x, y);
        let end = start + len as usize * self.depth;
        &mut self.storage.bytes_mut()[start..end]
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * self.depth
    }

    #[inline]
    fn check_bounds(&self, x: u32, y: u32) -> Result<(), ImageError> {
        if x < self.width && y < self.height {
            Ok(())
        } else {
            Err(ImageError::OutOfBounds)
        }
    }

    // --- Pixel access -------------------------------------------------------

    /// Packed value at `(x, y)` in the image's own format.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    #[inline]
    pub fn get_pixel_raw(&self, x: u32, y: u32) -> u32 {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds ({}x{})",
            self.width,
            self.height
        );
        read_packed(self.span(x, y, 1))
    }

    /// Write a packed value in the image's own format at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    #[inline]
    pub fn set_pixel_raw(&mut self, x: u32, y: u32, color: u32) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds ({}x{})",
            self.width,
            self.height
        );
        write_packed(self.span_mut(x, y, 1), color);
    }

    /// ARGB8 value at `(x, y)`, with palette indices resolved.
    ///
    /// Indices past the end of the palette read as transparent black.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::OutOfBounds`] outside the image.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<u32, ImageError> {
        self.check_bounds(x, y)?;
        Ok(self.to_argb(self.get_pixel_raw(x, y)))
    }

    /// Value at `(x, y)` converted to `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::OutOfBounds`] outside the image and
    /// [`ImageError::UnsupportedFormat`] when asking a direct-color image
    /// for palette indices.
    pub fn get_pixel_as(&self, x: u32, y: u32, format: ColorFormat) -> Result<u32, ImageError> {
        self.check_bounds(x, y)?;
        self.convert_color(self.get_pixel_raw(x, y), format)
    }

    /// Write an ARGB8 color at `(x, y)`, converting to the image's format.
    ///
    /// Paletted images store the index of the closest palette entry.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::OutOfBounds`] outside the image and
    /// [`ImageError::UnsupportedFormat`] for a paletted image with an empty
    /// palette. The buffer is unchanged on error.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: u32) -> Result<(), ImageError> {
        self.check_bounds(x, y)?;
        let raw = self.encode_argb(color)?;
        self.set_pixel_raw(x, y, raw);
        Ok(())
    }

    /// Convert `color`, packed in this image's format, to `to`.
    ///
    /// Paletted images look the index up in their palette first.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::UnsupportedFormat`] if `to` is
    /// [`ColorFormat::Pal8`] and this image is not paletted.
    pub fn convert_color(&self, color: u32, to: ColorFormat) -> Result<u32, ImageError> {
        if self.format == to {
            Ok(color)
        } else if self.format.is_paletted() {
            convert::convert(self.palette_color(color), ColorFormat::Argb8, to)
        } else {
            convert::convert(color, self.format, to)
        }
    }

    /// Raw value to ARGB8.
    #[inline]
    pub(crate) fn to_argb(&self, raw: u32) -> u32 {
        if self.format.is_paletted() {
            self.palette_color(raw)
        } else {
            convert_unchecked(raw, self.format, ColorFormat::Argb8)
        }
    }

    /// ARGB8 to a raw value, quantizing to the palette if needed.
    pub(crate) fn encode_argb(&self, color: u32) -> Result<u32, ImageError> {
        if self.format.is_paletted() {
            self.nearest_palette_index(color)
                .ok_or(ImageError::UnsupportedFormat)
        } else {
            Ok(convert_unchecked(color, ColorFormat::Argb8, self.format))
        }
    }

    #[inline]
    fn palette_color(&self, index: u32) -> u32 {
        self.palette().get(index as usize).copied().unwrap_or(0)
    }

    fn nearest_palette_index(&self, color: u32) -> Option<u32> {
        let distance = |entry: u32| {
            (0..4)
                .map(|i| {
                    let a = (color >> (i * 8)) & 0xFF;
                    let b = (entry >> (i * 8)) & 0xFF;
                    a.abs_diff(b).pow(2)
                })
                .sum::<u32>()
        };
        self.palette()
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| distance(**entry))
            .map(|(index, _)| index as u32)
    }

    // --- Palette ------------------------------------------------------------

    /// Resize the palette to `count` entries; new entries are 0.
    ///
    /// Does nothing for non-paletted images.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::PaletteTooLarge`] if `count` exceeds
    /// [`MAX_PALETTE_SIZE`].
    pub fn set_palette_size(&mut self, count: usize) -> Result<(), ImageError> {
        if count > MAX_PALETTE_SIZE {
            log::warn!("rejecting palette of {count} entries");
            return Err(ImageError::PaletteTooLarge { requested: count });
        }
        if let Some(palette) = &mut self.palette {
            palette.resize(count, 0);
        }
        Ok(())
    }

    /// Set palette entry `index` to the ARGB8 `color`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::OutOfBounds`] if `index >= palette_size()`,
    /// which includes every index of a non-paletted image.
    pub fn set_palette_entry(&mut self, index: usize, color: u32) -> Result<(), ImageError> {
        let entry = self
            .palette
            .as_mut()
            .and_then(|palette| palette.get_mut(index))
            .ok_or(ImageError::OutOfBounds)?;
        *entry = color;
        Ok(())
    }

    // --- Conversion ---------------------------------------------------------

    /// Copy into a new, tightly packed, owned image in the same format.
    pub fn to_owned_image(&self) -> Image<'static> {
        let mut out = Image::from_storage(
            Storage::Owned(vec![0u8; self.width as usize * self.depth * self.height as usize]),
            self.width,
            self.height,
            self.width as usize * self.depth,
            self.format,
        );
        out.palette.clone_from(&self.palette);
        for y in 0..self.height {
            out.span_mut(0, y, self.width).copy_from_slice(self.row(y));
        }
        out
    }

    /// Convert every pixel into a new owned image in `format`.
    ///
    /// The result never shares memory with `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::UnsupportedFormat`] when converting a
    /// direct-color image to [`ColorFormat::Pal8`], and
    /// [`ImageError::InvalidLayout`] if the size overflows.
    pub fn convert_to_format(&self, format: ColorFormat) -> Result<Image<'static>, ImageError> {
        if format == self.format {
            return Ok(self.to_owned_image());
        }
        if format.is_paletted() {
            return Err(ImageError::UnsupportedFormat);
        }
        log::debug!(
            "converting {}x{} image from {} to {format}",
            self.width,
            self.height,
            self.format
        );
        let mut out = Image::new(self.width, self.height, format)?;
        let out_depth = out.depth;
        for y in 0..self.height {
            let src = self.row(y);
            let dst = out.span_mut(0, y, self.width);
            for (s, d) in src.chunks_exact(self.depth).zip(dst.chunks_exact_mut(out_depth)) {
                let argb = self.to_argb(read_packed(s));
                write_packed(d, convert_unchecked(argb, ColorFormat::Argb8, format));
            }
        }
        Ok(out)
    }

    /// Copy the logical pixels out as an RGBA8 [`ImgVec`].
    pub fn to_rgba_img(&self) -> ImgVec<Rgba<u8>> {
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for chunk in self.row(y).chunks_exact(self.depth) {
                let argb = self.to_argb(read_packed(chunk));
                pixels.push(Rgba {
                    r: (argb >> 16) as u8,
                    g: (argb >> 8) as u8,
                    b: argb as u8,
                    a: (argb >> 24) as u8,
                });
            }
        }
        // imgref rejects a zero stride, so zero-width images keep a stride of 1.
        let width = self.width as usize;
        ImgVec::new_stride(pixels, width, self.height as usize, width.max(1))
    }
}

impl fmt::Debug for Image<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image({}x{}, {})", self.width, self.height, self.format)
    }
}

// ---------------------------------------------------------------------------
// ImgRef / ImgRefMut → Image (zero-copy From impls)
// ---------------------------------------------------------------------------

macro_rules! impl_from_imgref {
    ($pixel:ty, $format:expr) => {
        impl<'a> From<ImgRef<'a, $pixel>> for Image<'a> {
            fn from(img: ImgRef<'a, $pixel>) -> Self {
                use rgb::ComponentBytes;
                let width = img.width() as u32;
                let height = img.height() as u32;
                let stride = img.stride() * core::mem::size_of::<$pixel>();
                let bytes = img.into_buf().as_bytes();
                Image::from_storage(Storage::Shared(bytes), width, height, stride, $format)
            }
        }
    };
}

/// Mutable views draw straight into the caller's frame.
macro_rules! impl_from_imgref_mut {
    ($pixel:ty, $format:expr) => {
        impl<'a> From<ImgRefMut<'a, $pixel>> for Image<'a> {
            fn from(img: ImgRefMut<'a, $pixel>) -> Self {
                use rgb::ComponentBytes;
                let width = img.width() as u32;
                let height = img.height() as u32;
                let stride = img.stride() * core::mem::size_of::<$pixel>();
                let buf = img.into_buf();
                let bytes = buf.as_bytes_mut();
                Image::from_storage(Storage::Exclusive(bytes), width, height, stride, $format)
            }
        }
    };
}

// Byte order in memory is the reverse of the MSB-first format name.
impl_from_imgref!(Rgba<u8>, ColorFormat::Abgr8);
impl_from_imgref!(BGRA<u8>, ColorFormat::Argb8);
impl_from_imgref!(Rgb<u8>, ColorFormat::Bgr8);
impl_from_imgref!(Gray<u8>, ColorFormat::L8);

impl_from_imgref_mut!(Rgba<u8>, ColorFormat::Abgr8);
impl_from_imgref_mut!(BGRA<u8>, ColorFormat::Argb8);
impl_from_imgref_mut!(Rgb<u8>, ColorFormat::Bgr8);
impl_from_imgref_mut!(Gray<u8>, ColorFormat::L8);

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// `width * bytes_per_pixel`, checked.
fn min_stride(width: u32, format: ColorFormat) -> Result<usize, ImageError> {
    (width as usize)
        .checked_mul(format.bytes_per_pixel())
        .ok_or(ImageError::InvalidLayout)
}

/// Check stride against the row size and, for caller buffers, the length.
///
/// A buffer needs `(height - 1) * stride + width * bytes_per_pixel` bytes;
/// the last row carries no padding.
fn validate(
    width: u32,
    height: u32,
    stride: usize,
    format: ColorFormat,
    len: Option<usize>,
) -> Result<(), ImageError> {
    let row = min_stride(width, format)?;
    if stride < row {
        log::warn!("stride {stride} is smaller than a {width}-pixel {format} row");
        return Err(ImageError::InvalidLayout);
    }
    if let Some(len) = len
        && width > 0
        && height > 0
    {
        let required = (height as usize - 1)
            .checked_mul(stride)
            .and_then(|preceding| preceding.checked_add(row))
            .ok_or(ImageError::InvalidLayout)?;
        if len < required {
            log::warn!("buffer of {len} bytes is smaller than the {required} required");
            return Err(ImageError::InvalidLayout);
        }
    }
    Ok(())
}

/// Read a little-endian packed value of `bytes.len()` bytes.
#[inline]
pub(crate) fn read_packed(bytes: &[u8]) -> u32 {
    match *bytes {
        [a] => u32::from(a),
        [a, b] => u32::from(u16::from_le_bytes([a, b])),
        [a, b, c] => u32::from_le_bytes([a, b, c, 0]),
        [a, b, c, d] => u32::from_le_bytes([a, b, c, d]),
        _ => 0,
    }
}

/// Write the low `bytes.len()` bytes of `value`, little-endian.
#[inline]
pub(crate) fn write_packed(bytes: &mut [u8], value: u32) {
    let le = value.to_le_bytes();
    let n = bytes.len().min(4);
    bytes[..n].copy_from_slice(&le[..n]);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn new_is_zeroed_and_tightly_packed() {
        let img = Image::new(10, 5, ColorFormat::Rgb565).unwrap();
        assert_eq!(img.width(), 10);
        assert_eq!(img.height(), 5);
        assert_eq!(img.stride(), 20);
        assert_eq!(img.depth(), 2);
        assert_eq!(img.as_bytes().len(), 100);
        assert!(img.as_bytes().iter().all(|&b| b == 0));
        assert!(img.is_owned());
        assert_eq!(img.palette_size(), 0);
    }

    #[test]
    fn native_uses_build_format() {
        let img = Image::native(3, 3).unwrap();
        assert_eq!(img.format(), NATIVE);
    }

    #[test]
    fn empty_images_are_valid() {
        let img = Image::new(0, 0, ColorFormat::Argb8).unwrap();
        assert!(img.is_empty());
        let img = Image::new(0, 7, ColorFormat::Rgb8).unwrap();
        assert!(img.is_empty());
        assert_eq!(img.get_pixel(0, 0), Err(ImageError::OutOfBounds));
        let img = Image::from_borrowed(4, 0, 16, ColorFormat::Argb8, &[]).unwrap();
        assert!(img.is_empty());
    }

    #[test]
    fn zero_width_rows_copy_and_convert() {
        let img = Image::from_borrowed(0, 3, 16, ColorFormat::L8, &[]).unwrap();
        assert_eq!(img.row(2), &[] as &[u8]);

        let owned = img.to_owned_image();
        assert_eq!((owned.width(), owned.height()), (0, 3));
        assert!(owned.as_bytes().is_empty());

        let converted = img.convert_to_format(ColorFormat::Argb8).unwrap();
        assert_eq!((converted.width(), converted.height()), (0, 3));

        let rgba = img.to_rgba_img();
        assert_eq!((rgba.width(), rgba.height()), (0, 3));
        assert!(rgba.buf().is_empty());
    }

    #[test]
    fn stride_smaller_than_row_is_rejected() {
        assert_eq!(
            Image::with_stride(10, 2, 39, ColorFormat::Xrgb8).unwrap_err(),
            ImageError::InvalidLayout
        );
        let img = Image::with_stride(10, 2, 48, ColorFormat::Xrgb8).unwrap();
        assert_eq!(img.stride(), 48);
        assert_eq!(img.as_bytes().len(), 96);
    }

    #[test]
    fn borrowed_buffer_must_cover_the_rows() {
        let data = [0u8; 30];
        // Two rows of stride 16 with an unpadded last row: 16 + 12 = 28 bytes.
        assert!(Image::from_borrowed(3, 2, 16, ColorFormat::Argb8, &data[..28]).is_ok());
        assert_eq!(
            Image::from_borrowed(3, 2, 16, ColorFormat::Argb8, &data[..27]).unwrap_err(),
            ImageError::InvalidLayout
        );
        assert_eq!(
            Image::from_vec(vec![0; 5], 2, 2, 4, ColorFormat::Rgb565).unwrap_err(),
            ImageError::InvalidLayout
        );
    }

    #[test]
    fn overflowing_layout_is_rejected() {
        assert_eq!(
            Image::with_stride(u32::MAX, u32::MAX, usize::MAX, ColorFormat::L8).unwrap_err(),
            ImageError::InvalidLayout
        );
    }

    #[test]
    fn raw_pixels_are_little_endian() {
        let mut img = Image::new(2, 2, ColorFormat::Rgb8).unwrap();
        img.set_pixel_raw(1, 1, 0x00AB_CDEF);
        assert_eq!(img.get_pixel_raw(1, 1), 0xAB_CDEF);
        assert_eq!(&img.as_bytes()[9..12], &[0xEF, 0xCD, 0xAB]);

        let mut img = Image::new(1, 1, ColorFormat::Bgr5).unwrap();
        img.set_pixel_raw(0, 0, 0x7C1F);
        assert_eq!(img.as_bytes(), &[0x1F, 0x7C]);
    }

    #[test]
    fn logical_pixels_convert_through_argb8() {
        let mut img = Image::new(2, 1, ColorFormat::Bgr5).unwrap();
        img.set_pixel(0, 0, 0xFFFF_0000).unwrap();
        assert_eq!(img.get_pixel_raw(0, 0), 0x001F);
        assert_eq!(img.get_pixel(0, 0), Ok(0xFFFF_0000));
        assert_eq!(img.get_pixel_as(0, 0, ColorFormat::Rgb565), Ok(0xF800));
        assert_eq!(
            img.get_pixel_as(0, 0, ColorFormat::Pal8),
            Err(ImageError::UnsupportedFormat)
        );
    }

    #[test]
    fn accessors_reject_out_of_bounds() {
        for (w, h) in [(1, 1), (3, 2), (16, 9)] {
            let mut img = Image::new(w, h, ColorFormat::Argb8).unwrap();
            for (x, y) in [(w, 0), (0, h), (w, h), (u32::MAX, 0), (0, u32::MAX)] {
                assert_eq!(img.get_pixel(x, y), Err(ImageError::OutOfBounds));
                assert_eq!(img.set_pixel(x, y, 0xFFFF_FFFF), Err(ImageError::OutOfBounds));
                assert_eq!(
                    img.get_pixel_as(x, y, ColorFormat::L8),
                    Err(ImageError::OutOfBounds)
                );
            }
            assert!(img.as_bytes().iter().all(|&b| b == 0));
        }
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn raw_access_panics_out_of_bounds() {
        let img = Image::new(2, 2, ColorFormat::L8).unwrap();
        img.get_pixel_raw(2, 0);
    }

    #[test]
    fn palette_resize_limits() {
        let mut img = Image::new(4, 4, ColorFormat::Pal8).unwrap();
        assert_eq!(
            img.set_palette_size(300),
            Err(ImageError::PaletteTooLarge { requested: 300 })
        );
        assert_eq!(img.palette_size(), 0);
        img.set_palette_size(256).unwrap();
        assert_eq!(img.palette_size(), 256);
        img.set_palette_size(2).unwrap();
        assert_eq!(img.palette(), &[0, 0]);
    }

    #[test]
    fn palette_entries_are_bounds_checked() {
        let mut img = Image::new(2, 2, ColorFormat::Pal8).unwrap();
        img.set_palette_size(2).unwrap();
        img.set_palette_entry(1, 0xFF00_FF00).unwrap();
        assert_eq!(
            img.set_palette_entry(2, 0xFFFF_FFFF),
            Err(ImageError::OutOfBounds)
        );
        assert_eq!(img.palette(), &[0, 0xFF00_FF00]);
    }

    #[test]
    fn palette_operations_on_direct_images_are_inert() {
        let mut img = Image::new(2, 2, ColorFormat::Xbgr8).unwrap();
        img.set_palette_size(16).unwrap();
        assert_eq!(img.palette_size(), 0);
        assert_eq!(img.set_palette_entry(0, 1), Err(ImageError::OutOfBounds));
        assert_eq!(
            img.set_palette_size(257),
            Err(ImageError::PaletteTooLarge { requested: 257 })
        );
    }

    #[test]
    fn paletted_pixels_resolve_and_quantize() {
        let mut img = Image::new(3, 1, ColorFormat::Pal8).unwrap();
        assert_eq!(
            img.set_pixel(0, 0, 0xFFFF_FFFF),
            Err(ImageError::UnsupportedFormat)
        );
        img.set_palette_size(3).unwrap();
        img.set_palette_entry(0, 0xFF00_0000).unwrap();
        img.set_palette_entry(1, 0xFFFF_0000).unwrap();
        img.set_palette_entry(2, 0x0000_0000).unwrap();

        img.set_pixel(0, 0, 0xFFF0_1010).unwrap();
        assert_eq!(img.get_pixel_raw(0, 0), 1);
        assert_eq!(img.get_pixel(0, 0), Ok(0xFFFF_0000));
        img.set_pixel(1, 0, 0x0501_0101).unwrap();
        assert_eq!(img.get_pixel_raw(1, 0), 2);

        // Indices beyond the palette read as transparent black.
        img.set_pixel_raw(2, 0, 200);
        assert_eq!(img.get_pixel(2, 0), Ok(0));
        assert_eq!(img.convert_color(1, ColorFormat::Rgb565), Ok(0xF800));
        assert_eq!(img.convert_color(1, ColorFormat::Pal8), Ok(1));
    }

    #[test]
    fn convert_to_format_copies() {
        let mut img = Image::new(2, 2, ColorFormat::Argb8).unwrap();
        img.set_pixel(1, 0, 0xFF00_FF00).unwrap();
        img.set_pixel(0, 1, 0x80FF_FFFF).unwrap();
        let out = img.convert_to_format(ColorFormat::Rgba5).unwrap();
        assert_eq!(out.format(), ColorFormat::Rgba5);
        assert_eq!(out.stride(), 4);
        assert_eq!(out.get_pixel_raw(0, 0), 0x0000);
        assert_eq!(out.get_pixel_raw(1, 0), 0x07C1);
        assert_eq!(out.get_pixel_raw(0, 1), 0xFFFF);
        assert_ne!(out.as_bytes().as_ptr(), img.as_bytes().as_ptr());

        img.set_pixel(1, 1, 0xFFFF_FFFF).unwrap();
        assert_eq!(out.get_pixel_raw(1, 1), 0);
    }

    #[test]
    fn convert_paletted_image_resolves_indices() {
        let mut img = Image::new(2, 1, ColorFormat::Pal8).unwrap();
        img.set_palette_size(2).unwrap();
        img.set_palette_entry(0, 0xFF00_00FF).unwrap();
        img.set_palette_entry(1, 0x8012_3456).unwrap();
        img.set_pixel_raw(1, 0, 1);
        let out = img.convert_to_format(ColorFormat::Argb8).unwrap();
        assert_eq!(out.get_pixel_raw(0, 0), 0xFF00_00FF);
        assert_eq!(out.get_pixel_raw(1, 0), 0x8012_3456);

        let copy = img.convert_to_format(ColorFormat::Pal8).unwrap();
        assert_eq!(copy.palette(), img.palette());
        assert_eq!(copy.get_pixel_raw(1, 0), 1);

        let direct = Image::new(1, 1, ColorFormat::L8).unwrap();
        assert_eq!(
            direct.convert_to_format(ColorFormat::Pal8).unwrap_err(),
            ImageError::UnsupportedFormat
        );
    }

    #[test]
    fn padded_stride_is_not_copied() {
        let mut data = vec![0xAAu8; 2 * 8];
        data[0] = 1;
        data[8] = 2;
        let img = Image::from_borrowed(2, 2, 8, ColorFormat::L8, &data).unwrap();
        let owned = img.to_owned_image();
        assert_eq!(owned.stride(), 2);
        assert_eq!(owned.as_bytes(), &[1, 0xAA, 2, 0xAA]);
    }

    #[test]
    fn shared_borrow_copies_on_write() {
        let data = [0u8; 4];
        let mut img = Image::from_borrowed(2, 2, 2, ColorFormat::L8, &data).unwrap();
        assert!(!img.is_owned());
        img.set_pixel_raw(1, 1, 0x7F);
        assert!(img.is_owned());
        assert_eq!(img.get_pixel_raw(1, 1), 0x7F);
        assert_eq!(data, [0; 4]);
        assert_eq!(img.release(), Some(vec![0, 0, 0, 0x7F]));
    }

    #[test]
    fn exclusive_borrow_writes_through() {
        let mut data = [0u8; 8];
        {
            let mut img =
                Image::from_borrowed_mut(2, 2, 4, ColorFormat::Rgb565, &mut data).unwrap();
            img.set_pixel(1, 0, 0xFF00_00FF).unwrap();
            assert!(!img.is_owned());
            assert_eq!(img.release(), None);
        }
        assert_eq!(data, [0, 0, 0x1F, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn imgref_views_share_memory() {
        let pixels = vec![
            Rgba {
                r: 0x11,
                g: 0x22,
                b: 0x33,
                a: 0x44,
            };
            6
        ];
        let img_ref = ImgRef::new(&pixels[..], 3, 2);
        let img = Image::from(img_ref);
        assert_eq!(img.format(), ColorFormat::Abgr8);
        assert_eq!(img.stride(), 12);
        assert_eq!(img.get_pixel(2, 1), Ok(0x4411_2233));
        assert_eq!(img.as_bytes().as_ptr(), pixels.as_ptr().cast::<u8>());

        let back = img.to_rgba_img();
        assert_eq!(back.buf(), &pixels);
    }

    #[test]
    fn mutable_imgref_draws_in_place() {
        let mut pixels = vec![Gray::new(0u8); 4];
        {
            let mut img = Image::from(ImgRefMut::new(&mut pixels[..], 2, 2));
            assert_eq!(img.format(), ColorFormat::L8);
            img.set_pixel(1, 1, 0xFFFF_FFFF).unwrap();
            assert!(!img.is_owned());
        }
        assert_eq!(pixels[3], Gray::new(0xFF));

        let mut frame = vec![
            Rgba {
                r: 0,
                g: 0,
                b: 0,
                a: 0
            };
            6
        ];
        {
            let mut img = Image::from(ImgRefMut::new_stride(&mut frame[..], 2, 2, 3));
            assert_eq!(img.stride(), 12);
            img.set_pixel(1, 1, 0x8011_2233).unwrap();
        }
        assert_eq!(
            frame[4],
            Rgba {
                r: 0x11,
                g: 0x22,
                b: 0x33,
                a: 0x80
            }
        );
    }

    #[test]
    fn bgra_and_gray_views() {
        let bgra = [BGRA {
            b: 1,
            g: 2,
            r: 3,
            a: 4,
        }];
        let img = Image::from(ImgRef::new(&bgra[..], 1, 1));
        assert_eq!(img.get_pixel_raw(0, 0), 0x0403_0201);
        assert_eq!(img.get_pixel(0, 0), Ok(0x0403_0201));

        let gray = [Gray::new(0x80u8), Gray::new(0x10u8)];
        let img = Image::from(ImgRef::new(&gray[..], 2, 1));
        assert_eq!(img.format(), ColorFormat::L8);
        assert_eq!(img.get_pixel(1, 0), Ok(0xFF10_1010));

        let rgb = [Rgb { r: 9, g: 8, b: 7 }];
        let img = Image::from(ImgRef::new(&rgb[..], 1, 1));
        assert_eq!(img.format(), ColorFormat::Bgr8);
        assert_eq!(img.get_pixel(0, 0), Ok(0xFF09_0807));
    }

    #[test]
    fn debug_format() {
        let img = Image::new(10, 5, ColorFormat::Rgb565).unwrap();
        assert_eq!(format!("{img:?}"), "Image(10x5, RGB565)");
    }

    #[test]
    fn error_display() {
        assert_eq!(
            format!("{}", ImageError::PaletteTooLarge { requested: 300 }),
            "palette of 300 entries exceeds limit 256"
        );
        assert_eq!(
            format!("{}", ImageError::OutOfBounds),
            "coordinate or index out of bounds"
        );
    }

    #[test]
    fn image_error_is_error() {
        fn assert_error<E: core::error::Error>(_: &E) {}
        assert_error(&ImageError::InvalidLayout);
    }
}
