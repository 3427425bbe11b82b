//! Copying and alpha-blending one image onto another.
//!
//! Every operation clips the source rectangle to the destination; offsets may
//! be negative and the source may hang over any edge. Nothing outside the
//! destination is read or written, and a source entirely outside is a no-op.

use crate::convert::{mix_alpha, mul_div255, with_alpha};
use crate::image::{Image, read_packed, write_packed};
use crate::native::{DefaultNative, NATIVE, NativeFormat};

/// The overlap of a source placed at an offset inside a destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ClipRect {
    pub(crate) src_x: u32,
    pub(crate) src_y: u32,
    pub(crate) dst_x: u32,
    pub(crate) dst_y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Intersect a `src_w`×`src_h` source at `(x, y)` with a `dst_w`×`dst_h`
/// destination. `None` when nothing overlaps.
pub(crate) fn clip(
    dst_w: u32,
    dst_h: u32,
    src_w: u32,
    src_h: u32,
    x: i32,
    y: i32,
) -> Option<ClipRect> {
    let (src_x, dst_x, width) = clip_axis(dst_w, src_w, x)?;
    let (src_y, dst_y, height) = clip_axis(dst_h, src_h, y)?;
    Some(ClipRect {
        src_x,
        src_y,
        dst_x,
        dst_y,
        width,
        height,
    })
}

fn clip_axis(dst_len: u32, src_len: u32, offset: i32) -> Option<(u32, u32, u32)> {
    let start = i64::from(offset).max(0);
    let end = (i64::from(offset) + i64::from(src_len)).min(i64::from(dst_len));
    if end <= start {
        return None;
    }
    Some((
        (start - i64::from(offset)) as u32,
        start as u32,
        (end - start) as u32,
    ))
}

impl Image<'_> {
    fn clip_source(&self, source: &Image<'_>, x: i32, y: i32) -> Option<ClipRect> {
        let rect = clip(
            self.width(),
            self.height(),
            source.width(),
            source.height(),
            x,
            y,
        );
        if rect.is_none() {
            log::trace!(
                "{}x{} source at ({x}, {y}) misses {}x{} destination",
                source.width(),
                source.height(),
                self.width(),
                self.height()
            );
        }
        rect
    }

    /// Apply `blend(source_argb, dest_argb) -> argb` over the clipped overlap.
    ///
    /// Pixels the destination cannot represent, such as any color in a
    /// paletted image with an empty palette, are left unchanged.
    fn blend_from(
        &mut self,
        source: &Image<'_>,
        rect: ClipRect,
        blend: impl Fn(u32, u32) -> u32,
    ) {
        for row in 0..rect.height {
            for col in 0..rect.width {
                let (sx, sy) = (rect.src_x + col, rect.src_y + row);
                let (dx, dy) = (rect.dst_x + col, rect.dst_y + row);
                let src = source.to_argb(source.get_pixel_raw(sx, sy));
                let dst = self.to_argb(self.get_pixel_raw(dx, dy));
                if let Ok(raw) = self.encode_argb(blend(src, dst)) {
                    self.set_pixel_raw(dx, dy, raw);
                }
            }
        }
    }

    /// Copy `source` onto this image at `(x, y)`, replacing pixels.
    ///
    /// Rows are copied verbatim when both images share a format; otherwise
    /// each pixel is converted through ARGB8. Paletted sources resolve their
    /// palette and paletted destinations store the nearest entry.
    pub fn blit(&mut self, source: &Image<'_>, x: i32, y: i32) {
        let Some(rect) = self.clip_source(source, x, y) else {
            return;
        };
        if source.format() == self.format() {
            for row in 0..rect.height {
                let src = source.span(rect.src_x, rect.src_y + row, rect.width);
                self.span_mut(rect.dst_x, rect.dst_y + row, rect.width)
                    .copy_from_slice(src);
            }
        } else {
            self.blend_from(source, rect, |src, _| src);
        }
    }

    /// Alpha-blend `source` over this image at `(x, y)`.
    ///
    /// Sources without alpha are copied as by [`blit`](Self::blit).
    pub fn composite(&mut self, source: &Image<'_>, x: i32, y: i32) {
        if !source.format().has_alpha() {
            self.blit(source, x, y);
            return;
        }
        let Some(rect) = self.clip_source(source, x, y) else {
            return;
        };
        self.blend_from(source, rect, mix_alpha);
    }

    /// Alpha-blend `source` over this image with an extra global opacity.
    ///
    /// `alpha` is clamped to `[0, 1]`; `0` and NaN leave the image
    /// untouched, `1` is the same as [`composite`](Self::composite).
    pub fn composite_with_alpha(&mut self, source: &Image<'_>, x: i32, y: i32, alpha: f32) {
        if alpha.is_nan() || alpha <= 0.0 {
            return;
        }
        if alpha >= 1.0 {
            self.composite(source, x, y);
            return;
        }
        let Some(rect) = self.clip_source(source, x, y) else {
            return;
        };

        if source.format() == NATIVE && self.format() == NATIVE && !NATIVE.has_alpha() {
            let weight_a = (alpha * DefaultNative::MIX_SCALE as f32 + 0.5) as u32;
            let weight_b = DefaultNative::MIX_SCALE - weight_a;
            let depth = self.depth();
            for row in 0..rect.height {
                let src = source.span(rect.src_x, rect.src_y + row, rect.width);
                let dst = self.span_mut(rect.dst_x, rect.dst_y + row, rect.width);
                for (s, d) in src.chunks_exact(depth).zip(dst.chunks_exact_mut(depth)) {
                    let mixed =
                        DefaultNative::mix_weighted(weight_a, read_packed(s), weight_b, read_packed(d));
                    write_packed(d, mixed);
                }
            }
            return;
        }

        let scale = (alpha * 255.0 + 0.5) as u32;
        self.blend_from(source, rect, |src, dst| {
            mix_alpha(with_alpha(src, mul_div255(src >> 24, scale)), dst)
        });
    }
}
