//! Native pixel layout strategies.
//!
//! Exactly one native layout is active per build. It is the layout of
//! [`Image::native`](crate::Image::native) and the one compositing fast paths
//! blend in without converting. The default is [`Native32`]; the
//! `native-bgr5` and `native-rgb565` Cargo features select [`Native555`] or
//! [`Native565`] instead.
//!
//! Code that wants a specific layout regardless of the build can be generic
//! over [`NativeFormat`].

use core::fmt;

use crate::convert::{self, SpreadLayout, mix_channels};
use crate::format::{Channel, ColorFormat};

#[cfg(all(feature = "native-bgr5", feature = "native-rgb565"))]
compile_error!("features `native-bgr5` and `native-rgb565` are mutually exclusive");

/// A packed layout with specialized mixing.
pub trait NativeFormat: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// The packed layout.
    const FORMAT: ColorFormat;
    /// Full-scale red.
    const RED: u32;
    /// Full-scale green.
    const GREEN: u32;
    /// Full-scale blue.
    const BLUE: u32;
    /// Alpha bits, 0 when the layout has none.
    const ALPHA: u32;
    /// Full-scale white.
    const WHITE: u32;
    /// Weight scale used when compositing with a global alpha.
    ///
    /// Finer steps than this cannot change a channel of this layout.
    const MIX_SCALE: u32;

    /// Convert `0xRRGGBB` to this layout.
    fn from_rgb8(color: u32) -> u32 {
        convert::convert_unchecked(color, ColorFormat::Rgb8, Self::FORMAT)
    }

    /// Convert a 15-bit color with red in the low bits to this layout.
    fn from_bgr5(value: u16) -> u32;

    /// Rounded per-channel weighted mean; see [`mix_weighted`](crate::mix_weighted).
    fn mix_weighted(weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32;

    /// `(a * weight_a + b * weight_b) / 16` per channel, saturating.
    ///
    /// Weights are sixteenths; their sum may exceed 16 to brighten.
    fn mix_saturating(weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32;
}

/// 32-bit `Xbgr8`: red in the low byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Native32;

/// 16-bit `Bgr5`: the 15-bit layout of the GBA.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Native555;

/// 16-bit `Rgb565`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Native565;

const XBGR8_CHANNELS: [Channel; 3] = [Channel::new(0, 8), Channel::new(8, 8), Channel::new(16, 8)];

impl NativeFormat for Native32 {
    const FORMAT: ColorFormat = ColorFormat::Xbgr8;
    const RED: u32 = 0x0000_00FF;
    const GREEN: u32 = 0x0000_FF00;
    const BLUE: u32 = 0x00FF_0000;
    const ALPHA: u32 = 0xFF00_0000;
    const WHITE: u32 = 0x00FF_FFFF;
    const MIX_SCALE: u32 = 256;

    fn from_rgb8(color: u32) -> u32 {
        (color & 0x00FF00) | ((color & 0x0000FF) << 16) | ((color & 0xFF0000) >> 16)
    }

    fn from_bgr5(value: u16) -> u32 {
        let value = u32::from(value);
        let color = ((value & 0x1F) << 3) | ((value & 0x3E0) << 6) | ((value & 0x7C00) << 9);
        color | ((color >> 5) & 0x07_0707)
    }

    fn mix_weighted(weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32 {
        let divisor = weight_a.saturating_add(weight_b);
        if divisor == 0 {
            return color_a;
        }
        mix_channels(&XBGR8_CHANNELS, weight_a, color_a, weight_b, color_b, divisor, true)
    }

    fn mix_saturating(weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32 {
        mix_channels(&XBGR8_CHANNELS, weight_a, color_a, weight_b, color_b, 16, false)
    }
}

const BGR5_SPREAD: SpreadLayout = SpreadLayout {
    low: 0x7C1F,
    high: 0x03E0,
    lanes: [Channel::new(0, 5), Channel::new(21, 5), Channel::new(10, 5)],
    channels: [Channel::new(0, 5), Channel::new(5, 5), Channel::new(10, 5)],
};

impl NativeFormat for Native555 {
    const FORMAT: ColorFormat = ColorFormat::Bgr5;
    const RED: u32 = 0x001F;
    const GREEN: u32 = 0x03E0;
    const BLUE: u32 = 0x7C00;
    const ALPHA: u32 = 0;
    const WHITE: u32 = 0x7FFF;
    const MIX_SCALE: u32 = 16;

    fn from_bgr5(value: u16) -> u32 {
        u32::from(value) & 0x7FFF
    }

    fn mix_weighted(weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32 {
        BGR5_SPREAD.mix_weighted(weight_a, color_a, weight_b, color_b)
    }

    fn mix_saturating(weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32 {
        BGR5_SPREAD.mix_saturating(weight_a, color_a, weight_b, color_b)
    }
}

const RGB565_SPREAD: SpreadLayout = SpreadLayout {
    low: 0xF81F,
    high: 0x07E0,
    lanes: [Channel::new(0, 5), Channel::new(21, 6), Channel::new(11, 5)],
    channels: [Channel::new(0, 5), Channel::new(5, 6), Channel::new(11, 5)],
};

impl NativeFormat for Native565 {
    const FORMAT: ColorFormat = ColorFormat::Rgb565;
    const RED: u32 = 0xF800;
    const GREEN: u32 = 0x07E0;
    const BLUE: u32 = 0x001F;
    const ALPHA: u32 = 0;
    const WHITE: u32 = 0xFFFF;
    const MIX_SCALE: u32 = 16;

    fn from_bgr5(value: u16) -> u32 {
        let value = u32::from(value);
        let red = value & 0x1F;
        let green = (value >> 5) & 0x1F;
        let blue = (value >> 10) & 0x1F;
        // Five-bit green widens to six by replicating its top bit.
        (red << 11) | (((green << 1) | (green >> 4)) << 5) | blue
    }

    fn mix_weighted(weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32 {
        RGB565_SPREAD.mix_weighted(weight_a, color_a, weight_b, color_b)
    }

    fn mix_saturating(weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32 {
        RGB565_SPREAD.mix_saturating(weight_a, color_a, weight_b, color_b)
    }
}

/// The native layout selected for this build.
#[cfg(feature = "native-bgr5")]
pub type DefaultNative = Native555;
/// The native layout selected for this build.
#[cfg(feature = "native-rgb565")]
pub type DefaultNative = Native565;
/// The native layout selected for this build.
#[cfg(not(any(feature = "native-bgr5", feature = "native-rgb565")))]
pub type DefaultNative = Native32;

/// The native [`ColorFormat`] of this build.
pub const NATIVE: ColorFormat = DefaultNative::FORMAT;
