//! Bit-exact conversion and blending of packed color values.
//!
//! Every direct format is decomposed into an [`Rgba<u8>`] and re-packed.
//! Narrow channels are widened with the multiply-shift approximation used by
//! handheld LCD hardware (`(v5 * 0x21) >> 2`, `(v6 * 0x41) >> 4`), which is
//! the same as replicating the top bits into the new low bits. Widening then
//! narrowing again is lossless.
//!
//! Palette indices are not colors and are rejected here; [`Image`] resolves
//! them through its own palette first.
//!
//! [`Image`]: crate::Image

use rgb::Rgba;

use crate::format::{Channel, ColorFormat, Layout};
use crate::image::ImageError;

/// Convert one packed color from `from` to `to`.
///
/// Alpha passes through when both formats carry it, becomes opaque when
/// only `to` does, and is dropped otherwise. Padding bits are written as 0.
///
/// # Errors
///
/// Returns [`ImageError::UnsupportedFormat`] if either side is
/// [`ColorFormat::Pal8`] and the formats differ.
///
/// # Example
///
/// ```
/// use zenraster::{ColorFormat, convert};
///
/// // Full-scale 5-bit blue widens to full-scale 8-bit blue.
/// assert_eq!(convert(0x1F, ColorFormat::Rgb5, ColorFormat::Rgb8), Ok(0xFF));
/// ```
pub fn convert(color: u32, from: ColorFormat, to: ColorFormat) -> Result<u32, ImageError> {
    if from == to {
        return Ok(color);
    }
    if from.is_paletted() || to.is_paletted() {
        return Err(ImageError::UnsupportedFormat);
    }
    Ok(pack(unpack(color, from), to))
}

/// Infallible core of [`convert`] for callers that already resolved palettes.
///
/// Indexed formats decode as transparent black and encode as index 0.
#[inline]
pub(crate) fn convert_unchecked(color: u32, from: ColorFormat, to: ColorFormat) -> u32 {
    if from == to {
        color
    } else {
        pack(unpack(color, from), to)
    }
}

/// Widen an `bits`-wide channel value to 8 bits.
#[inline]
pub(crate) const fn expand(value: u32, bits: u32) -> u8 {
    match bits {
        8 => value as u8,
        6 => ((value * 0x41) >> 4) as u8,
        5 => ((value * 0x21) >> 2) as u8,
        1 => (value * 0xFF) as u8,
        0 => 0,
        _ => {
            // Replicate the top bits into the vacated low bits.
            let shifted = value << (8 - bits);
            (shifted | (shifted >> bits)) as u8
        }
    }
}

/// Narrow an 8-bit channel value to `bits` by dropping low bits.
#[inline]
pub(crate) const fn truncate(value: u8, bits: u32) -> u32 {
    if bits == 0 {
        0
    } else {
        (value as u32) >> (8 - bits)
    }
}

/// Decompose a packed value into 8-bit channels.
pub(crate) fn unpack(color: u32, format: ColorFormat) -> Rgba<u8> {
    match format.layout() {
        Layout::Direct {
            red,
            green,
            blue,
            alpha,
        } => Rgba {
            r: expand(red.extract(color), red.bits),
            g: expand(green.extract(color), green.bits),
            b: expand(blue.extract(color), blue.bits),
            a: if alpha.is_present() {
                expand(alpha.extract(color), alpha.bits)
            } else {
                0xFF
            },
        },
        Layout::Luminance => {
            let l = color as u8;
            Rgba {
                r: l,
                g: l,
                b: l,
                a: 0xFF,
            }
        }
        Layout::Indexed => Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        },
    }
}

/// Pack 8-bit channels into `format`.
pub(crate) fn pack(px: Rgba<u8>, format: ColorFormat) -> u32 {
    match format.layout() {
        Layout::Direct {
            red,
            green,
            blue,
            alpha,
        } => {
            let put = |value: u8, channel: Channel| truncate(value, channel.bits) << channel.shift;
            put(px.r, red) | put(px.g, green) | put(px.b, blue) | put(px.a, alpha)
        }
        Layout::Luminance => luminance(px) as u32,
        Layout::Indexed => 0,
    }
}

/// Integer Rec. 601 luma; exact for gray inputs.
#[inline]
pub(crate) fn luminance(px: Rgba<u8>) -> u8 {
    ((px.r as u32 * 77 + px.g as u32 * 150 + px.b as u32 * 29) >> 8) as u8
}

/// Channels of a direct format, alpha included when present.
pub(crate) fn channels(format: ColorFormat) -> Option<[Channel; 4]> {
    match format.layout() {
        Layout::Direct {
            red,
            green,
            blue,
            alpha,
        } => Some([red, green, blue, alpha]),
        Layout::Luminance => Some([Channel::new(0, 8), Channel::NONE, Channel::NONE, Channel::NONE]),
        Layout::Indexed => None,
    }
}

/// Per-channel weighted mean of two colors in `format`.
///
/// Each channel is `round((a * weight_a + b * weight_b) / (weight_a + weight_b))`.
/// Alpha is blended like any other channel; padding bits are 0. A zero
/// weight sum yields `color_a`.
///
/// # Errors
///
/// Returns [`ImageError::UnsupportedFormat`] for [`ColorFormat::Pal8`].
pub fn mix_weighted(
    format: ColorFormat,
    weight_a: u32,
    color_a: u32,
    weight_b: u32,
    color_b: u32,
) -> Result<u32, ImageError> {
    let channels = channels(format).ok_or(ImageError::UnsupportedFormat)?;
    let divisor = weight_a.saturating_add(weight_b);
    if divisor == 0 {
        return Ok(color_a);
    }
    Ok(mix_channels(
        &channels, weight_a, color_a, weight_b, color_b, divisor, true,
    ))
}

/// Blend each channel in isolation, saturating at the channel maximum.
pub(crate) fn mix_channels(
    channels: &[Channel],
    weight_a: u32,
    color_a: u32,
    weight_b: u32,
    color_b: u32,
    divisor: u32,
    round: bool,
) -> u32 {
    let divisor = u64::from(divisor.max(1));
    let bias = if round { divisor / 2 } else { 0 };
    channels
        .iter()
        .filter(|channel| channel.is_present())
        .fold(0, |out, channel| {
            let sum = u64::from(channel.extract(color_a)) * u64::from(weight_a)
                + u64::from(channel.extract(color_b)) * u64::from(weight_b);
            let value = ((sum + bias) / divisor).min(u64::from(channel.max())) as u32;
            out | (value << channel.shift)
        })
}

/// Three-channel 16-bit layout spread over a `u32` so that one multiply
/// blends every channel.
///
/// The channels in `low` stay in place; the channel in `high` moves up by
/// 16 bits, leaving a guard gap above each lane for the weighted sum.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SpreadLayout {
    pub(crate) low: u32,
    pub(crate) high: u32,
    /// Lane positions after spreading, in the same order as `channels`.
    pub(crate) lanes: [Channel; 3],
    pub(crate) channels: [Channel; 3],
}

impl SpreadLayout {
    /// Largest shift for which lane quotients never overlap the remainder
    /// bits of the lane above.
    pub(crate) const MAX_SHIFT: u32 = 4;
    /// Largest weight sum for which lane sums stay inside their guard gap.
    pub(crate) const MAX_WEIGHT_SUM: u32 = 32;

    #[inline]
    fn spread(&self, color: u32) -> u32 {
        (color & self.low) | ((color & self.high) << 16)
    }

    /// `(a * wa + b * wb) >> shift` per lane, saturated per channel.
    ///
    /// Callers guarantee `shift <= MAX_SHIFT` and
    /// `weight_a + weight_b <= MAX_WEIGHT_SUM`.
    pub(crate) fn mix(
        &self,
        weight_a: u32,
        color_a: u32,
        weight_b: u32,
        color_b: u32,
        shift: u32,
        round: bool,
    ) -> u32 {
        debug_assert!(shift <= Self::MAX_SHIFT);
        debug_assert!(weight_a + weight_b <= Self::MAX_WEIGHT_SUM);
        let mut sum = self.spread(color_a) * weight_a + self.spread(color_b) * weight_b;
        if round && shift > 0 {
            let half = 1 << (shift - 1);
            for lane in self.lanes {
                sum += half << lane.shift;
            }
        }
        let quotient = sum >> shift;
        self.lanes
            .iter()
            .zip(self.channels)
            .fold(0, |out, (lane, channel)| {
                // One extra bit catches the saturating overflow.
                let value = (quotient >> lane.shift) & ((1 << (lane.bits + 1)) - 1);
                out | (value.min(channel.max()) << channel.shift)
            })
    }

    /// Weighted mean, on the packed lanes when the weight sum is a small
    /// power of two.
    pub(crate) fn mix_weighted(&self, weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32 {
        let divisor = weight_a.saturating_add(weight_b);
        if divisor == 0 {
            return color_a;
        }
        if divisor.is_power_of_two() && divisor.trailing_zeros() <= Self::MAX_SHIFT {
            self.mix(
                weight_a,
                color_a,
                weight_b,
                color_b,
                divisor.trailing_zeros(),
                true,
            )
        } else {
            mix_channels(
                &self.channels,
                weight_a,
                color_a,
                weight_b,
                color_b,
                divisor,
                true,
            )
        }
    }

    /// `(a * wa + b * wb) / 16`, truncating and saturating.
    pub(crate) fn mix_saturating(&self, weight_a: u32, color_a: u32, weight_b: u32, color_b: u32) -> u32 {
        if weight_a <= 16 && weight_b <= 16 {
            self.mix(weight_a, color_a, weight_b, color_b, 4, false)
        } else {
            mix_channels(
                &self.channels,
                weight_a,
                color_a,
                weight_b,
                color_b,
                16,
                false,
            )
        }
    }
}

/// Composite ARGB8 `color_a` over ARGB8 `color_b` (straight alpha).
///
/// With `αa`, `αb` the alphas, the result alpha is
/// `(αa·255 + αb·(255 − αa)) / 255` and each channel is
/// `(ca·αa·255 + cb·αb·(255 − αa)) / (αa·255 + αb·(255 − αa))`, clamped.
/// A fully transparent `color_a` returns `color_b` untouched.
pub fn mix_alpha(color_a: u32, color_b: u32) -> u32 {
    let alpha_a = color_a >> 24;
    if alpha_a == 0 {
        return color_b;
    }
    let alpha_b = color_b >> 24;
    let weight_a = alpha_a * 0xFF;
    let weight_b = alpha_b * (0xFF - alpha_a);
    let total = weight_a + weight_b;

    let mut color = (total / 0xFF).min(0xFF) << 24;
    for shift in [0, 8, 16] {
        let a = (color_a >> shift) & 0xFF;
        let b = (color_b >> shift) & 0xFF;
        let value = ((a * weight_a + b * weight_b) / total).min(0xFF);
        color |= value << shift;
    }
    color
}

/// Replace the alpha of an ARGB8 color.
#[inline]
pub(crate) const fn with_alpha(color: u32, alpha: u32) -> u32 {
    (color & 0x00FF_FFFF) | ((alpha & 0xFF) << 24)
}

/// `round(a * b / 255)` for 8-bit operands.
#[inline]
pub(crate) const fn mul_div255(a: u32, b: u32) -> u32 {
    (a * b + 127) / 255
}
