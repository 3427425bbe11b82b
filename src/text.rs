//! Font collaborator and text alignment.
//!
//! The crate does not rasterize fonts. A [`Font`] implementation supplies
//! per-character coverage masks and metrics; [`Painter::draw_text`] lays the
//! masks out along a baseline.
//!
//! [`Painter::draw_text`]: crate::Painter::draw_text

use crate::image::Image;

/// A rasterizing font at a chosen pixel size.
///
/// Metrics are in pixels. `descent` is the distance *below* the baseline and
/// is normally positive.
pub trait Font {
    /// Current size in pixels.
    fn size(&self) -> u32;

    /// Change the size in pixels.
    fn set_size(&mut self, px: u32);

    /// Advance width of `text` laid out on one line.
    fn span_width(&mut self, text: &str) -> i32;

    /// Height of the tallest glyph above the baseline.
    fn ascent(&self) -> i32;

    /// Depth of the deepest glyph below the baseline.
    fn descent(&self) -> i32;

    /// Rasterize `ch`. `None` skips the character without advancing.
    fn glyph(&mut self, ch: char) -> Option<Glyph<'_>>;
}

/// A rasterized character.
#[derive(Debug)]
pub struct Glyph<'g> {
    /// Coverage mask: alpha for formats with alpha, luminance otherwise.
    pub mask: Image<'g>,
    /// Offset of the mask's left edge from the pen position.
    pub left: i32,
    /// Height of the mask's top edge above the baseline.
    pub top: i32,
    /// Pen advance after this glyph.
    pub advance: i32,
}

/// Horizontal text anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HorizontalAlign {
    /// `x` is the left edge.
    #[default]
    Left = 0x01,
    /// `x` is the center.
    Center = 0x02,
    /// `x` is the right edge.
    Right = 0x03,
}

/// Vertical text anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VerticalAlign {
    /// `y` is the top of the ascent.
    Top = 0x10,
    /// `y` is midway between ascent and descent.
    Center = 0x20,
    /// `y` is the bottom of the descent.
    Bottom = 0x30,
    /// `y` is the baseline.
    #[default]
    Baseline = 0x40,
}

/// Where a text anchor point sits relative to the laid-out text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Alignment {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

impl Alignment {
    const HORIZONTAL_MASK: u8 = 0x03;
    const VERTICAL_MASK: u8 = 0x70;

    pub const fn new(horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Packed form: horizontal in the low two bits, vertical in bits 4–6.
    pub const fn bits(self) -> u8 {
        self.horizontal as u8 | self.vertical as u8
    }

    /// Parse the packed form. Both halves must be present and no other bits
    /// may be set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !(Self::HORIZONTAL_MASK | Self::VERTICAL_MASK) != 0 {
            return None;
        }
        let horizontal = match bits & Self::HORIZONTAL_MASK {
            0x01 => HorizontalAlign::Left,
            0x02 => HorizontalAlign::Center,
            0x03 => HorizontalAlign::Right,
            _ => return None,
        };
        let vertical = match bits & Self::VERTICAL_MASK {
            0x10 => VerticalAlign::Top,
            0x20 => VerticalAlign::Center,
            0x30 => VerticalAlign::Bottom,
            0x40 => VerticalAlign::Baseline,
            _ => return None,
        };
        Some(Self::new(horizontal, vertical))
    }

    /// Offset from the anchor to the pen start on the baseline.
    pub(crate) fn origin_offset(self, width: i32, ascent: i32, descent: i32) -> (i32, i32) {
        let dx = match self.horizontal {
            HorizontalAlign::Left => 0,
            HorizontalAlign::Center => -width / 2,
            HorizontalAlign::Right => -width,
        };
        let dy = match self.vertical {
            VerticalAlign::Top => ascent,
            VerticalAlign::Center => (ascent - descent) / 2,
            VerticalAlign::Bottom => -descent,
            VerticalAlign::Baseline => 0,
        };
        (dx, dy)
    }
}
