//! Software painter: rectangles, lines, circles, coverage masks and text.
//!
//! Shapes are clipped to the backing image. Coordinates are signed so shapes
//! may start off-canvas.

use crate::composite::clip;
use crate::convert::{convert_unchecked, mix_alpha, mul_div255, with_alpha};
use crate::format::ColorFormat;
use crate::image::{Image, write_packed};
use crate::text::{Alignment, Font};

// ---------------------------------------------------------------------------
// PaintStyle
// ---------------------------------------------------------------------------

/// Drawing policy shared by all painter operations. Colors are ARGB8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PaintStyle {
    /// Alpha-blend onto existing pixels instead of overwriting them.
    pub blend: bool,
    /// Fill shape interiors with `fill_color`.
    pub fill: bool,
    /// Outline width in pixels; 0 disables outlines.
    pub stroke_width: u32,
    /// ARGB8 color of outlines, lines and unfilled masks.
    pub stroke_color: u32,
    /// ARGB8 color of shape interiors and filled masks.
    pub fill_color: u32,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintStyle {
    /// Opaque black 1-pixel outlines, no fill, no blending.
    pub const fn new() -> Self {
        Self {
            blend: false,
            fill: false,
            stroke_width: 1,
            stroke_color: 0xFF00_0000,
            fill_color: 0xFFFF_FFFF,
        }
    }

    /// Set whether drawing blends onto existing pixels.
    pub const fn with_blend(mut self, blend: bool) -> Self {
        self.blend = blend;
        self
    }

    /// Set whether shape interiors are filled.
    pub const fn with_fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }

    /// Set outline width in pixels.
    pub const fn with_stroke_width(mut self, width: u32) -> Self {
        self.stroke_width = width;
        self
    }

    /// Set the ARGB8 outline color.
    pub const fn with_stroke_color(mut self, color: u32) -> Self {
        self.stroke_color = color;
        self
    }

    /// Set the ARGB8 fill color.
    pub const fn with_fill_color(mut self, color: u32) -> Self {
        self.fill_color = color;
        self
    }
}

// ---------------------------------------------------------------------------
// Ink
// ---------------------------------------------------------------------------

/// A color prepared once per draw call for one backing image.
#[derive(Clone, Copy, Debug)]
struct Ink {
    argb: u32,
    /// Packed in the backing format; `None` if it cannot be represented.
    raw: Option<u32>,
    blend: bool,
}

impl Ink {
    fn new(image: &Image<'_>, color: u32, blend: bool) -> Self {
        let raw = image.encode_argb(color).ok();
        if raw.is_none() && !blend {
            log::warn!(
                "cannot represent {color:#010x} in {} backing image",
                image.format()
            );
        }
        Self {
            argb: color,
            raw,
            blend,
        }
    }

    fn put(self, image: &mut Image<'_>, x: u32, y: u32) {
        if self.blend {
            let dst = image.to_argb(image.get_pixel_raw(x, y));
            if let Ok(raw) = image.encode_argb(mix_alpha(self.argb, dst)) {
                image.set_pixel_raw(x, y, raw);
            }
        } else if let Some(raw) = self.raw {
            image.set_pixel_raw(x, y, raw);
        }
    }

    /// Paint the half-open rectangle `[x0, x1) × [y0, y1)`, clipped.
    fn fill_rect(self, image: &mut Image<'_>, x0: i64, y0: i64, x1: i64, y1: i64) {
        let (width, height) = (i64::from(image.width()), i64::from(image.height()));
        let (x0, x1) = (x0.clamp(0, width), x1.clamp(0, width));
        let (y0, y1) = (y0.clamp(0, height), y1.clamp(0, height));
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let (x0, x1, y0, y1) = (x0 as u32, x1 as u32, y0 as u32, y1 as u32);
        match (self.blend, self.raw) {
            (false, Some(raw)) => {
                let depth = image.depth();
                for y in y0..y1 {
                    for pixel in image.span_mut(x0, y, x1 - x0).chunks_exact_mut(depth) {
                        write_packed(pixel, raw);
                    }
                }
            }
            (false, None) => {}
            (true, _) => {
                for y in y0..y1 {
                    for x in x0..x1 {
                        self.put(image, x, y);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Painter
// ---------------------------------------------------------------------------

/// Draws shapes and text onto a borrowed backing image.
///
/// The backing image is never reallocated and nothing outside it is written.
pub struct Painter<'p, 'a> {
    backing: &'p mut Image<'a>,
    font: Option<&'p mut dyn Font>,
    style: PaintStyle,
}

impl<'p, 'a> Painter<'p, 'a> {
    /// A painter with the default [`PaintStyle`] and no font.
    pub fn new(backing: &'p mut Image<'a>) -> Self {
        Self {
            backing,
            font: None,
            style: PaintStyle::new(),
        }
    }

    /// Set the font used by [`draw_text`](Self::draw_text).
    pub fn with_font(mut self, font: &'p mut dyn Font) -> Self {
        self.font = Some(font);
        self
    }

    /// Set the drawing style.
    pub fn with_style(mut self, style: PaintStyle) -> Self {
        self.style = style;
        self
    }

    /// Current drawing style.
    pub fn style(&self) -> &PaintStyle {
        &self.style
    }

    /// Mutable access to the drawing style.
    pub fn style_mut(&mut self) -> &mut PaintStyle {
        &mut self.style
    }

    /// Replace the drawing style.
    pub fn set_style(&mut self, style: PaintStyle) {
        self.style = style;
    }

    /// Replace or clear the font.
    pub fn set_font(&mut self, font: Option<&'p mut dyn Font>) {
        self.font = font;
    }

    /// The image being drawn on.
    pub fn backing(&self) -> &Image<'a> {
        &*self.backing
    }

    fn ink(&self, color: u32) -> Ink {
        Ink::new(&*self.backing, color, self.style.blend)
    }

    /// Draw the `width`×`height` rectangle with its top-left corner at
    /// `(x, y)`.
    ///
    /// The interior, inset by the stroke width, takes the fill color when
    /// filling is on; the border bands take the stroke color.
    pub fn draw_rectangle(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        let (x0, y0) = (i64::from(x), i64::from(y));
        let (x1, y1) = (x0 + i64::from(width), y0 + i64::from(height));
        let stroke = i64::from(self.style.stroke_width);

        if self.style.fill {
            let ink = self.ink(self.style.fill_color);
            ink.fill_rect(self.backing, x0 + stroke, y0 + stroke, x1 - stroke, y1 - stroke);
        }
        if stroke == 0 {
            return;
        }
        let ink = self.ink(self.style.stroke_color);
        let top = (y0 + stroke).min(y1);
        let bottom = (y1 - stroke).max(top);
        let left = (x0 + stroke).min(x1);
        let right = (x1 - stroke).max(left);
        ink.fill_rect(self.backing, x0, y0, x1, top);
        ink.fill_rect(self.backing, x0, bottom, x1, y1);
        ink.fill_rect(self.backing, x0, top, left, bottom);
        ink.fill_rect(self.backing, right, top, x1, bottom);
    }

    /// Draw a line from `(x1, y1)` to `(x2, y2)`, both ends inclusive.
    ///
    /// Pixels are the ones Bresenham's algorithm visits. Wider strokes are
    /// spans perpendicular to the major axis, centered on each point. Only
    /// steps whose major coordinate falls inside the backing image are
    /// walked, so off-canvas length costs nothing.
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let width = i64::from(self.style.stroke_width);
        if width == 0 {
            return;
        }
        let (x1, y1, x2, y2) = (i64::from(x1), i64::from(y1), i64::from(x2), i64::from(y2));
        let (dx, dy) = ((x2 - x1).abs(), (y2 - y1).abs());
        let step_x = if x1 < x2 { 1 } else { -1 };
        let step_y = if y1 < y2 { 1 } else { -1 };
        let x_major = dx >= dy;
        let (major, minor) = if x_major {
            (Axis::new(x1, step_x, dx), Axis::new(y1, step_y, dy))
        } else {
            (Axis::new(y1, step_y, dy), Axis::new(x1, step_x, dx))
        };
        let extent = if x_major {
            self.backing.width()
        } else {
            self.backing.height()
        };
        let Some((first, last)) = major.visible_steps(i64::from(extent)) else {
            log::trace!("line misses the {} backing image", self.backing.format());
            return;
        };

        let ink = self.ink(self.style.stroke_color);
        let offset = width / 2;
        for k in first..=last {
            let along = major.start + major.step * k;
            let across = minor.start + minor.step * minor_steps(k, major.len, minor.len);
            if x_major {
                ink.fill_rect(self.backing, along, across - offset, along + 1, across - offset + width);
            } else {
                ink.fill_rect(self.backing, across - offset, along, across - offset + width, along + 1);
            }
        }
    }

    /// Draw a circle of `diameter` pixels centered on `(x, y)`.
    ///
    /// The outline is the ring between the circle and the circle inset by
    /// the stroke width; filling covers the inset circle. Only rows that
    /// cross the backing image are scanned.
    pub fn draw_circle(&mut self, x: i32, y: i32, diameter: i32) {
        if diameter <= 0 {
            return;
        }
        let d = i64::from(diameter);
        let (left, top) = (i64::from(x) - d / 2, i64::from(y) - d / 2);
        let rows = (-top).max(0)..(i64::from(self.backing.height()) - top).min(d);
        if rows.is_empty() {
            return;
        }
        let inner = d - 2 * i64::from(self.style.stroke_width);
        let stroke = (self.style.stroke_width > 0).then(|| self.ink(self.style.stroke_color));
        let fill = self.style.fill.then(|| self.ink(self.style.fill_color));

        for row in rows {
            let Some((outer_lo, outer_hi)) = circle_span(d, d, row) else {
                continue;
            };
            let inner_span = (inner > 0).then(|| circle_span(d, inner, row)).flatten();
            let py = top + row;
            if let Some(ink) = fill
                && let Some((lo, hi)) = inner_span
            {
                ink.fill_rect(self.backing, left + lo, py, left + hi, py + 1);
            }
            if let Some(ink) = stroke {
                match inner_span {
                    Some((lo, hi)) => {
                        ink.fill_rect(self.backing, left + outer_lo, py, left + lo, py + 1);
                        ink.fill_rect(self.backing, left + hi, py, left + outer_hi, py + 1);
                    }
                    None => {
                        ink.fill_rect(self.backing, left + outer_lo, py, left + outer_hi, py + 1);
                    }
                }
            }
        }
    }

    /// Blend the stroke color, or the fill color when filling, through a
    /// coverage mask placed at `(x, y)`.
    ///
    /// Coverage is the mask's alpha when its format has alpha (palette alpha
    /// for paletted masks) and its luminance otherwise. Always blends.
    pub fn draw_mask(&mut self, mask: &Image<'_>, x: i32, y: i32) {
        let color = if self.style.fill {
            self.style.fill_color
        } else {
            self.style.stroke_color
        };
        paint_mask(self.backing, color, mask, x, y);
    }

    /// Draw `text` anchored at `(x, y)`.
    ///
    /// Returns `false`, drawing nothing, when no font is set.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, alignment: Alignment) -> bool {
        let Some(font) = self.font.as_deref_mut() else {
            log::debug!("draw_text without a font");
            return false;
        };
        let color = if self.style.fill {
            self.style.fill_color
        } else {
            self.style.stroke_color
        };
        let width = font.span_width(text);
        let (dx, dy) = alignment.origin_offset(width, font.ascent(), font.descent());
        let mut pen_x = x.saturating_add(dx);
        let baseline = y.saturating_add(dy);
        for ch in text.chars() {
            if let Some(glyph) = font.glyph(ch) {
                paint_mask(
                    self.backing,
                    color,
                    &glyph.mask,
                    pen_x.saturating_add(glyph.left),
                    baseline.saturating_sub(glyph.top),
                );
                pen_x = pen_x.saturating_add(glyph.advance);
            }
        }
        true
    }
}

/// One axis of a line: start coordinate, direction and length in pixels.
#[derive(Clone, Copy, Debug)]
struct Axis {
    start: i64,
    step: i64,
    len: i64,
}

impl Axis {
    fn new(start: i64, step: i64, len: i64) -> Self {
        Self { start, step, len }
    }

    /// Inclusive range of steps `k` in `0..=len` with `start + step * k`
    /// inside `0..extent`.
    fn visible_steps(self, extent: i64) -> Option<(i64, i64)> {
        let (first, last) = if self.step > 0 {
            (-self.start, extent - 1 - self.start)
        } else {
            (self.start - extent + 1, self.start)
        };
        let (first, last) = (first.max(0), last.min(self.len));
        (first <= last).then_some((first, last))
    }
}

/// Minor-axis steps Bresenham has taken after `k` major-axis steps:
/// `floor((2·minor·k + major) / (2·major))`.
fn minor_steps(k: i64, major: i64, minor: i64) -> i64 {
    if major == 0 {
        return 0;
    }
    let numerator = 2 * i128::from(minor) * i128::from(k) + i128::from(major);
    (numerator / (2 * i128::from(major))) as i64
}

/// Half-open column span of row `row` inside a circle of `diameter` centered
/// in a `box_size` square, using pixel centers.
fn circle_span(box_size: i64, diameter: i64, row: i64) -> Option<(i64, i64)> {
    let dy = 2 * row + 1 - box_size;
    let room = diameter * diameter - dy * dy;
    if room < 0 {
        return None;
    }
    let reach = room.isqrt();
    let lo = (box_size - 1 - reach + 1).div_euclid(2);
    let hi = (box_size - 1 + reach).div_euclid(2) + 1;
    (lo < hi).then_some((lo, hi))
}

fn coverage(mask: &Image<'_>, raw: u32) -> u32 {
    let argb = mask.to_argb(raw);
    if mask.format().has_alpha() {
        argb >> 24
    } else {
        convert_unchecked(argb, ColorFormat::Argb8, ColorFormat::L8)
    }
}

fn paint_mask(image: &mut Image<'_>, color: u32, mask: &Image<'_>, x: i32, y: i32) {
    let Some(rect) = clip(image.width(), image.height(), mask.width(), mask.height(), x, y)
    else {
        return;
    };
    let alpha = color >> 24;
    for row in 0..rect.height {
        for col in 0..rect.width {
            let cover = coverage(mask, mask.get_pixel_raw(rect.src_x + col, rect.src_y + row));
            if cover == 0 {
                continue;
            }
            let (dx, dy) = (rect.dst_x + col, rect.dst_y + row);
            let dst = image.to_argb(image.get_pixel_raw(dx, dy));
            let mixed = mix_alpha(with_alpha(color, mul_div255(alpha, cover)), dst);
            if let Ok(raw) = image.encode_argb(mixed) {
                image.set_pixel_raw(dx, dy, raw);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{Glyph, HorizontalAlign, VerticalAlign};
    use alloc::vec;
    use alloc::vec::Vec;

    const GREEN: u32 = 0xFF00_FF00;
    const RED: u32 = 0xFFFF_0000;
    const BLUE: u32 = 0xFF00_00FF;

    fn canvas(width: u32, height: u32) -> Image<'static> {
        Image::new(width, height, ColorFormat::Argb8).unwrap()
    }

    fn painted(img: &Image<'_>) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in 0..img.height() {
            for x in 0..img.width() {
                if img.get_pixel_raw(x, y) != 0 {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn default_style() {
        let style = PaintStyle::default();
        assert!(!style.blend);
        assert!(!style.fill);
        assert_eq!(style.stroke_width, 1);
        assert_eq!(style.stroke_color, 0xFF00_0000);
        assert_eq!(style.fill_color, 0xFFFF_FFFF);

        let style = PaintStyle::new()
            .with_fill(true)
            .with_stroke_width(3)
            .with_fill_color(GREEN);
        assert!(style.fill);
        assert_eq!(style.stroke_width, 3);
        assert_eq!(style.fill_color, GREEN);
    }

    #[test]
    fn filled_rectangle_without_stroke() {
        let mut img = canvas(8, 8);
        let style = PaintStyle::new()
            .with_fill(true)
            .with_stroke_width(0)
            .with_fill_color(GREEN);
        Painter::new(&mut img).with_style(style).draw_rectangle(2, 2, 4, 4);
        for y in 0..8 {
            for x in 0..8 {
                let inside = (2..6).contains(&x) && (2..6).contains(&y);
                let expected = if inside { GREEN } else { 0 };
                assert_eq!(img.get_pixel_raw(x, y), expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn stroked_rectangle_border() {
        let mut img = canvas(7, 7);
        let style = PaintStyle::new().with_stroke_color(RED);
        Painter::new(&mut img).with_style(style).draw_rectangle(1, 1, 5, 5);
        let border = painted(&img);
        assert_eq!(border.len(), 16);
        assert!(border.iter().all(|&(x, y)| x == 1 || x == 5 || y == 1 || y == 5));
    }

    #[test]
    fn fill_is_inset_by_stroke() {
        let mut img = canvas(6, 6);
        let style = PaintStyle::new()
            .with_fill(true)
            .with_stroke_width(2)
            .with_stroke_color(RED)
            .with_fill_color(GREEN);
        Painter::new(&mut img).with_style(style).draw_rectangle(0, 0, 6, 6);
        assert_eq!(img.get_pixel_raw(1, 1), RED);
        assert_eq!(img.get_pixel_raw(2, 2), GREEN);
        assert_eq!(img.get_pixel_raw(3, 3), GREEN);
        assert_eq!(img.get_pixel_raw(4, 3), RED);
    }

    #[test]
    fn thick_stroke_bands_do_not_overlap() {
        let mut img = canvas(4, 4);
        let style = PaintStyle::new()
            .with_blend(true)
            .with_stroke_width(5)
            .with_stroke_color(0x8000_0000);
        Painter::new(&mut img).with_style(style).draw_rectangle(0, 0, 3, 3);
        // Each pixel blended exactly once over transparent black.
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(img.get_pixel_raw(x, y), 0x8000_0000, "at ({x}, {y})");
            }
        }
        assert_eq!(img.get_pixel_raw(3, 3), 0);
    }

    #[test]
    fn rectangles_clip_to_backing() {
        let mut img = canvas(4, 4);
        let style = PaintStyle::new().with_fill(true).with_fill_color(GREEN);
        let mut painter = Painter::new(&mut img).with_style(style);
        painter.draw_rectangle(-10, -10, 12, 12);
        painter.draw_rectangle(3, 3, i32::MAX, i32::MAX);
        painter.draw_rectangle(0, 0, 0, 5);
        painter.draw_rectangle(0, 0, 5, -1);
        assert_eq!(img.get_pixel_raw(0, 0), GREEN);
        assert_eq!(img.get_pixel_raw(1, 1), 0xFF00_0000);
        assert_eq!(img.get_pixel_raw(3, 3), 0xFF00_0000);
        assert_eq!(img.get_pixel_raw(2, 2), 0);
    }

    #[test]
    fn horizontal_and_diagonal_lines() {
        let mut img = canvas(6, 6);
        Painter::new(&mut img).draw_line(0, 1, 4, 1);
        assert_eq!(painted(&img), vec![(0, 1), (1, 1), (2, 1), (3, 1), (4, 1)]);

        let mut img = canvas(6, 6);
        Painter::new(&mut img).draw_line(3, 3, 0, 0);
        assert_eq!(painted(&img), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn steep_line_plots_one_pixel_per_row() {
        let mut img = canvas(6, 6);
        Painter::new(&mut img).draw_line(1, 0, 2, 5);
        let points = painted(&img);
        assert_eq!(points.len(), 6);
        for y in 0..6 {
            assert_eq!(points.iter().filter(|p| p.1 == y).count(), 1);
        }
    }

    #[test]
    fn zero_width_line_draws_nothing() {
        let mut img = canvas(4, 4);
        let style = PaintStyle::new().with_stroke_width(0);
        Painter::new(&mut img).with_style(style).draw_line(0, 0, 3, 3);
        assert!(painted(&img).is_empty());
    }

    #[test]
    fn wide_line_spans_perpendicular() {
        let mut img = canvas(6, 6);
        let style = PaintStyle::new().with_stroke_width(3);
        Painter::new(&mut img).with_style(style).draw_line(1, 2, 3, 2);
        let points = painted(&img);
        assert_eq!(points.len(), 9);
        assert!(points.iter().all(|&(x, y)| (1..4).contains(&x) && (1..4).contains(&y)));

        let mut img = canvas(6, 6);
        Painter::new(&mut img).with_style(style).draw_line(0, 0, 0, 5);
        // Vertical line at the left edge: the span clips at x = -1.
        let points = painted(&img);
        assert_eq!(points.len(), 12);
        assert!(points.iter().all(|&(x, _)| x < 2));
    }

    #[test]
    fn clipped_line_keeps_its_pixels() {
        let expected = vec![(0, 0), (1, 1), (2, 1), (3, 2), (4, 2)];
        let mut img = canvas(6, 6);
        Painter::new(&mut img).draw_line(0, 0, 4, 2);
        assert_eq!(painted(&img), expected);

        // Same slope, starting off-canvas: the visible part is unchanged.
        let mut img = canvas(6, 6);
        Painter::new(&mut img).draw_line(-4, -2, 4, 2);
        assert_eq!(painted(&img), expected);
    }

    #[test]
    fn giant_shapes_only_walk_the_canvas() {
        let mut img = canvas(4, 4);
        let mut painter = Painter::new(&mut img);
        painter.draw_line(-200_000_000, 1, 200_000_000, 1);
        painter.draw_line(i32::MIN, i32::MIN, i32::MAX, i32::MIN);
        painter.draw_circle(1_000_000_000, 0, 1_000_000_000);
        assert_eq!(painted(&img), vec![(0, 1), (1, 1), (2, 1), (3, 1)]);

        let mut img = canvas(4, 4);
        Painter::new(&mut img).draw_line(2, -300_000_000, 2, 300_000_000);
        assert_eq!(painted(&img), vec![(2, 0), (2, 1), (2, 2), (2, 3)]);

        let mut img = canvas(4, 4);
        let style = PaintStyle::new()
            .with_fill(true)
            .with_stroke_color(RED)
            .with_fill_color(GREEN);
        Painter::new(&mut img)
            .with_style(style)
            .draw_circle(0, 0, 400_000_000);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(img.get_pixel_raw(x, y), GREEN);
            }
        }
    }

    #[test]
    fn circle_pixels() {
        let mut img = canvas(8, 8);
        let style = PaintStyle::new()
            .with_fill(true)
            .with_stroke_width(1)
            .with_stroke_color(RED)
            .with_fill_color(GREEN);
        Painter::new(&mut img).with_style(style).draw_circle(4, 4, 4);

        // Box starts at (2, 2); corners stay empty.
        for (x, y) in [(2, 2), (5, 2), (2, 5), (5, 5)] {
            assert_eq!(img.get_pixel_raw(x, y), 0, "corner ({x}, {y})");
        }
        for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            assert_eq!(img.get_pixel_raw(x, y), GREEN, "inside ({x}, {y})");
        }
        for (x, y) in [(3, 2), (4, 2), (2, 3), (5, 3), (2, 4), (5, 4), (3, 5), (4, 5)] {
            assert_eq!(img.get_pixel_raw(x, y), RED, "ring ({x}, {y})");
        }
        assert_eq!(painted(&img).len(), 12);
    }

    #[test]
    fn circle_is_symmetric_and_clipped() {
        let mut img = canvas(16, 16);
        let style = PaintStyle::new().with_fill(true).with_stroke_width(0);
        Painter::new(&mut img).with_style(style).draw_circle(8, 8, 9);
        let points = painted(&img);
        assert!(points.contains(&(8, 8)));
        assert!(points.contains(&(4, 8)) && points.contains(&(12, 8)));
        assert!(!points.contains(&(4, 4)));
        for &(x, y) in &points {
            assert!(points.contains(&(16 - x, y)), "({x}, {y}) has no mirror");
            assert!(points.contains(&(x, 16 - y)), "({x}, {y}) has no mirror");
        }

        let mut small = canvas(3, 3);
        Painter::new(&mut small).with_style(style).draw_circle(0, 0, 9);
        Painter::new(&mut small).with_style(style).draw_circle(0, 0, 0);
        assert_eq!(painted(&small).len(), 9);
    }

    #[test]
    fn mask_coverage_from_luminance() {
        let coverage = [0xFF, 0x00, 0x80];
        let mask = Image::from_borrowed(3, 1, 3, ColorFormat::L8, &coverage).unwrap();
        let mut img = Image::new(3, 1, ColorFormat::Xrgb8).unwrap();
        for x in 0..3 {
            img.set_pixel(x, 0, BLUE).unwrap();
        }
        let style = PaintStyle::new().with_stroke_color(RED);
        Painter::new(&mut img).with_style(style).draw_mask(&mask, 0, 0);
        assert_eq!(img.get_pixel(0, 0), Ok(RED));
        assert_eq!(img.get_pixel(1, 0), Ok(BLUE));
        assert_eq!(img.get_pixel(2, 0), Ok(0xFF80_007F));
    }

    #[test]
    fn mask_coverage_from_alpha_uses_fill_color() {
        let mut mask = Image::new(2, 1, ColorFormat::Pal8).unwrap();
        mask.set_palette_size(2).unwrap();
        mask.set_palette_entry(1, 0xFF00_0000).unwrap();
        mask.set_pixel_raw(1, 0, 1);
        let mut img = canvas(3, 1);
        let style = PaintStyle::new().with_fill(true).with_fill_color(GREEN);
        Painter::new(&mut img).with_style(style).draw_mask(&mask, 1, 0);
        assert_eq!(img.get_pixel_raw(1, 0), 0);
        assert_eq!(img.get_pixel_raw(2, 0), GREEN);
    }

    #[test]
    fn blend_versus_overwrite() {
        let half_red = 0x80FF_0000;
        let mut img = canvas(1, 1);
        img.set_pixel(0, 0, BLUE).unwrap();
        let style = PaintStyle::new()
            .with_fill(true)
            .with_stroke_width(0)
            .with_fill_color(half_red);
        Painter::new(&mut img).with_style(style).draw_rectangle(0, 0, 1, 1);
        assert_eq!(img.get_pixel_raw(0, 0), half_red);

        img.set_pixel(0, 0, BLUE).unwrap();
        Painter::new(&mut img)
            .with_style(style.with_blend(true))
            .draw_rectangle(0, 0, 1, 1);
        assert_eq!(img.get_pixel_raw(0, 0), 0xFF80_007F);
    }

    #[test]
    fn painter_accessors() {
        let mut img = canvas(2, 3);
        let mut painter = Painter::new(&mut img);
        painter.style_mut().fill = true;
        assert!(painter.style().fill);
        painter.set_style(PaintStyle::new().with_stroke_width(4));
        assert_eq!(painter.style().stroke_width, 4);
        assert_eq!(painter.backing().height(), 3);
    }

    /// Every character is a solid 3×5 block sitting on the baseline.
    struct BlockFont {
        bitmap: [u8; 15],
        size: u32,
    }

    impl BlockFont {
        fn new() -> Self {
            Self {
                bitmap: [0xFF; 15],
                size: 5,
            }
        }
    }

    impl Font for BlockFont {
        fn size(&self) -> u32 {
            self.size
        }

        fn set_size(&mut self, px: u32) {
            self.size = px;
        }

        fn span_width(&mut self, text: &str) -> i32 {
            4 * text.chars().filter(|c| *c != ' ').count() as i32
        }

        fn ascent(&self) -> i32 {
            5
        }

        fn descent(&self) -> i32 {
            1
        }

        fn glyph(&mut self, ch: char) -> Option<Glyph<'_>> {
            if ch == ' ' {
                return None;
            }
            let mask = Image::from_borrowed(3, 5, 3, ColorFormat::L8, &self.bitmap).ok()?;
            Some(Glyph {
                mask,
                left: 0,
                top: 5,
                advance: 4,
            })
        }
    }

    #[test]
    fn text_requires_font() {
        let mut img = canvas(4, 4);
        let align = Alignment::default();
        assert!(!Painter::new(&mut img).draw_text("hi", 0, 0, align));
        assert!(painted(&img).is_empty());
    }

    #[test]
    fn text_top_left() {
        let mut img = canvas(10, 6);
        let mut font = BlockFont::new();
        let align = Alignment::new(HorizontalAlign::Left, VerticalAlign::Top);
        let style = PaintStyle::new().with_stroke_color(RED);
        assert!(
            Painter::new(&mut img)
                .with_font(&mut font)
                .with_style(style)
                .draw_text("ab", 1, 0, align)
        );
        for y in 0..6 {
            for x in 0..10 {
                let inside = y < 5 && ((1..4).contains(&x) || (5..8).contains(&x));
                let expected = if inside { RED } else { 0 };
                assert_eq!(img.get_pixel_raw(x, y), expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn text_right_bottom_and_skipped_glyphs() {
        let mut img = canvas(10, 6);
        let mut font = BlockFont::new();
        let align = Alignment::new(HorizontalAlign::Right, VerticalAlign::Bottom);
        Painter::new(&mut img)
            .with_font(&mut font)
            .draw_text(" a ", 8, 6, align);
        // Width 4, descent 1: pen starts at x 4 on baseline 5.
        let points = painted(&img);
        assert_eq!(points.len(), 15);
        assert!(points.iter().all(|&(x, y)| (4..7).contains(&x) && y < 5));
        assert_eq!(font.size(), 5);
        font.set_size(9);
        assert_eq!(font.size(), 9);
    }
}
