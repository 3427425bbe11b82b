//! Packed pixel format model.
//!
//! [`ColorFormat`] names exactly one packed layout. [`ColorFormatSet`] is the
//! filter type: a bitset over the same bits, used where a caller accepts any
//! of several formats. Only the set has an "any" value; an image always has
//! exactly one format.
//!
//! Names list channels from the most significant bit down. `Xrgb8` is
//! `0xXXRRGGBB`, `Bgr5` keeps red in the low five bits, `Rgba5` keeps its
//! one-bit alpha in bit 0. Packed values are stored little-endian.

use core::fmt;

use crate::image::ImageError;

/// A single packed pixel encoding.
///
/// The discriminant is the format's bit in [`ColorFormatSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ColorFormat {
    /// 32-bit, red in the low byte, padding in the high byte.
    Xbgr8 = 0x00001,
    /// 32-bit, blue in the low byte, padding in the high byte.
    Xrgb8 = 0x00002,
    /// 32-bit, padding in the low byte, blue in the high byte.
    Bgrx8 = 0x00004,
    /// 32-bit, padding in the low byte, red in the high byte.
    Rgbx8 = 0x00008,
    /// 32-bit, red in the low byte, alpha in the high byte.
    Abgr8 = 0x00010,
    /// 32-bit, blue in the low byte, alpha in the high byte.
    Argb8 = 0x00020,
    /// 32-bit, alpha in the low byte, blue in the high byte.
    Bgra8 = 0x00040,
    /// 32-bit, alpha in the low byte, red in the high byte.
    Rgba8 = 0x00080,
    /// 16-bit 5-5-5, blue in the low bits, top bit unused.
    Rgb5 = 0x00100,
    /// 16-bit 5-5-5, red in the low bits, top bit unused. The GBA layout.
    Bgr5 = 0x00200,
    /// 16-bit 5-6-5, blue in the low bits.
    Rgb565 = 0x00400,
    /// 16-bit 5-6-5, red in the low bits.
    Bgr565 = 0x00800,
    /// 16-bit 1-5-5-5, alpha in the top bit, blue in the low bits.
    Argb5 = 0x01000,
    /// 16-bit 1-5-5-5, alpha in the top bit, red in the low bits.
    Abgr5 = 0x02000,
    /// 16-bit 5-5-5-1, alpha in bit 0, red in the top bits.
    Rgba5 = 0x04000,
    /// 16-bit 5-5-5-1, alpha in bit 0, blue in the top bits.
    Bgra5 = 0x08000,
    /// 24-bit, blue in the low byte.
    Rgb8 = 0x10000,
    /// 24-bit, red in the low byte.
    Bgr8 = 0x20000,
    /// 8-bit luminance.
    L8 = 0x40000,
    /// 8-bit index into a palette of up to 256 ARGB8 colors.
    Pal8 = 0x80000,
}

/// Position and width of one channel inside a packed value.
///
/// A width of zero means the channel is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Channel {
    pub(crate) shift: u32,
    pub(crate) bits: u32,
}

impl Channel {
    pub(crate) const NONE: Self = Self { shift: 0, bits: 0 };

    pub(crate) const fn new(shift: u32, bits: u32) -> Self {
        Self { shift, bits }
    }

    #[inline]
    pub(crate) const fn max(self) -> u32 {
        (1 << self.bits) - 1
    }

    #[cfg(test)]
    pub(crate) const fn mask(self) -> u32 {
        self.max() << self.shift
    }

    #[inline]
    pub(crate) const fn extract(self, value: u32) -> u32 {
        (value >> self.shift) & self.max()
    }

    #[inline]
    pub(crate) const fn is_present(self) -> bool {
        self.bits != 0
    }
}

/// How the bits of a format map to color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Layout {
    Direct {
        red: Channel,
        green: Channel,
        blue: Channel,
        alpha: Channel,
    },
    Luminance,
    Indexed,
}

const fn direct(red: (u32, u32), green: (u32, u32), blue: (u32, u32), alpha: Channel) -> Layout {
    Layout::Direct {
        red: Channel::new(red.0, red.1),
        green: Channel::new(green.0, green.1),
        blue: Channel::new(blue.0, blue.1),
        alpha,
    }
}

impl ColorFormat {
    /// Every concrete format, in bit order.
    pub const ALL: [ColorFormat; 20] = [
        Self::Xbgr8,
        Self::Xrgb8,
        Self::Bgrx8,
        Self::Rgbx8,
        Self::Abgr8,
        Self::Argb8,
        Self::Bgra8,
        Self::Rgba8,
        Self::Rgb5,
        Self::Bgr5,
        Self::Rgb565,
        Self::Bgr565,
        Self::Argb5,
        Self::Abgr5,
        Self::Rgba5,
        Self::Bgra5,
        Self::Rgb8,
        Self::Bgr8,
        Self::L8,
        Self::Pal8,
    ];

    /// The format's bit.
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Look up the format whose bit is `bits`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::UnsupportedFormat`] unless exactly one known bit
    /// is set. This rejects the all-ones "any" filter value.
    pub fn from_bits(bits: u32) -> Result<Self, ImageError> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.bits() == bits)
            .ok_or(ImageError::UnsupportedFormat)
    }

    /// Bytes occupied by one pixel: 1, 2, 3 or 4.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Xbgr8
            | Self::Xrgb8
            | Self::Bgrx8
            | Self::Rgbx8
            | Self::Abgr8
            | Self::Argb8
            | Self::Bgra8
            | Self::Rgba8 => 4,
            Self::Rgb5
            | Self::Bgr5
            | Self::Rgb565
            | Self::Bgr565
            | Self::Argb5
            | Self::Abgr5
            | Self::Rgba5
            | Self::Bgra5 => 2,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::L8 | Self::Pal8 => 1,
        }
    }

    /// Whether pixels of this format carry alpha.
    ///
    /// Paletted pixels count as alpha-capable because palette entries are
    /// ARGB8.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Abgr8
                | Self::Argb8
                | Self::Bgra8
                | Self::Rgba8
                | Self::Argb5
                | Self::Abgr5
                | Self::Rgba5
                | Self::Bgra5
                | Self::Pal8
        )
    }

    /// Whether pixels are palette indices.
    #[inline]
    pub const fn is_paletted(self) -> bool {
        matches!(self, Self::Pal8)
    }

    pub(crate) const fn layout(self) -> Layout {
        const A8_HIGH: Channel = Channel::new(24, 8);
        const A8_LOW: Channel = Channel::new(0, 8);
        const A1_HIGH: Channel = Channel::new(15, 1);
        const A1_LOW: Channel = Channel::new(0, 1);
        match self {
            Self::Xbgr8 => direct((0, 8), (8, 8), (16, 8), Channel::NONE),
            Self::Xrgb8 => direct((16, 8), (8, 8), (0, 8), Channel::NONE),
            Self::Bgrx8 => direct((8, 8), (16, 8), (24, 8), Channel::NONE),
            Self::Rgbx8 => direct((24, 8), (16, 8), (8, 8), Channel::NONE),
            Self::Abgr8 => direct((0, 8), (8, 8), (16, 8), A8_HIGH),
            Self::Argb8 => direct((16, 8), (8, 8), (0, 8), A8_HIGH),
            Self::Bgra8 => direct((8, 8), (16, 8), (24, 8), A8_LOW),
            Self::Rgba8 => direct((24, 8), (16, 8), (8, 8), A8_LOW),
            Self::Rgb5 => direct((10, 5), (5, 5), (0, 5), Channel::NONE),
            Self::Bgr5 => direct((0, 5), (5, 5), (10, 5), Channel::NONE),
            Self::Rgb565 => direct((11, 5), (5, 6), (0, 5), Channel::NONE),
            Self::Bgr565 => direct((0, 5), (5, 6), (11, 5), Channel::NONE),
            Self::Argb5 => direct((10, 5), (5, 5), (0, 5), A1_HIGH),
            Self::Abgr5 => direct((0, 5), (5, 5), (10, 5), A1_HIGH),
            Self::Rgba5 => direct((11, 5), (6, 5), (1, 5), A1_LOW),
            Self::Bgra5 => direct((1, 5), (6, 5), (11, 5), A1_LOW),
            Self::Rgb8 => direct((16, 8), (8, 8), (0, 8), Channel::NONE),
            Self::Bgr8 => direct((0, 8), (8, 8), (16, 8), Channel::NONE),
            Self::L8 => Layout::Luminance,
            Self::Pal8 => Layout::Indexed,
        }
    }

    /// Short upper-case name, e.g. `"RGB565"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Xbgr8 => "XBGR8",
            Self::Xrgb8 => "XRGB8",
            Self::Bgrx8 => "BGRX8",
            Self::Rgbx8 => "RGBX8",
            Self::Abgr8 => "ABGR8",
            Self::Argb8 => "ARGB8",
            Self::Bgra8 => "BGRA8",
            Self::Rgba8 => "RGBA8",
            Self::Rgb5 => "RGB5",
            Self::Bgr5 => "BGR5",
            Self::Rgb565 => "RGB565",
            Self::Bgr565 => "BGR565",
            Self::Argb5 => "ARGB5",
            Self::Abgr5 => "ABGR5",
            Self::Rgba5 => "RGBA5",
            Self::Bgra5 => "BGRA5",
            Self::Rgb8 => "RGB8",
            Self::Bgr8 => "BGR8",
            Self::L8 => "L8",
            Self::Pal8 => "PAL8",
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// A set of [`ColorFormat`]s, for filter parameters.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ColorFormatSet: u32 {
        const XBGR8 = 0x00001;
        const XRGB8 = 0x00002;
        const BGRX8 = 0x00004;
        const RGBX8 = 0x00008;
        const ABGR8 = 0x00010;
        const ARGB8 = 0x00020;
        const BGRA8 = 0x00040;
        const RGBA8 = 0x00080;
        const RGB5 = 0x00100;
        const BGR5 = 0x00200;
        const RGB565 = 0x00400;
        const BGR565 = 0x00800;
        const ARGB5 = 0x01000;
        const ABGR5 = 0x02000;
        const RGBA5 = 0x04000;
        const BGRA5 = 0x08000;
        const RGB8 = 0x10000;
        const BGR8 = 0x20000;
        const L8 = 0x40000;
        const PAL8 = 0x80000;

        /// Every format; the unspecified filter.
        const ANY = 0xFFFFF;
        /// All 32-bit direct formats.
        const DIRECT_32 = 0x000FF;
        /// All 16-bit formats.
        const PACKED_16 = 0x0FF00;
    }
}

impl ColorFormatSet {
    /// Whether `format` is a member.
    #[inline]
    pub const fn contains_format(self, format: ColorFormat) -> bool {
        self.bits() & format.bits() != 0
    }

    /// The member, if the set has exactly one.
    pub fn single(self) -> Option<ColorFormat> {
        if self.bits().count_ones() == 1 {
            ColorFormat::from_bits(self.bits()).ok()
        } else {
            None
        }
    }

    /// Members in bit order.
    pub fn formats(self) -> impl Iterator<Item = ColorFormat> {
        ColorFormat::ALL
            .into_iter()
            .filter(move |format| self.contains_format(*format))
    }

    /// Pixel width shared by every member.
    ///
    /// Returns 0 for an empty set or when members differ, so
    /// `ColorFormatSet::ANY.bytes_per_pixel()` is 0. Callers must guard.
    pub fn bytes_per_pixel(self) -> usize {
        let mut widths = self.formats().map(ColorFormat::bytes_per_pixel);
        match widths.next() {
            Some(first) if widths.all(|w| w == first) => first,
            _ => 0,
        }
    }

    /// Whether every member carries alpha. False for the empty set.
    pub fn has_alpha(self) -> bool {
        !self.is_empty() && self.formats().all(ColorFormat::has_alpha)
    }
}

impl From<ColorFormat> for ColorFormatSet {
    fn from(format: ColorFormat) -> Self {
        Self::from_bits_retain(format.bits())
    }
}
