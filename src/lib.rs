//! Packed pixel formats, compositing and software painting for emulator
//! frame buffers.
//!
//! - [`ColorFormat`] / [`ColorFormatSet`]: the 20 packed layouts and filter sets
//! - [`convert`] / [`mix_weighted`] / [`mix_alpha`]: bit-exact color arithmetic
//! - [`NativeFormat`] / [`DefaultNative`]: the build's native layout and its
//!   specialized mixing
//! - [`Image`]: strided pixel storage, owned or borrowed, with palettes
//! - [`Image::blit`] / [`Image::composite`]: clipped copying and blending
//! - [`Painter`] / [`PaintStyle`]: rectangles, lines, circles, masks and text
//! - [`Font`] / [`ImageCodec`] / [`ByteStream`]: seams for external font
//!   rasterizers and file codecs
//!
//! Packed values are little-endian in memory; format names list channels from
//! the most significant bit down, so [`ColorFormat::Xrgb8`] is `0xXXRRGGBB`.
//!
//! # Example
//!
//! ```
//! use zenraster::{ColorFormat, Image, PaintStyle, Painter};
//!
//! let mut frame = Image::new(240, 160, ColorFormat::Bgr5)?;
//! let style = PaintStyle::new()
//!     .with_fill(true)
//!     .with_stroke_width(0)
//!     .with_fill_color(0xFF00_FF00);
//! Painter::new(&mut frame).with_style(style).draw_rectangle(8, 8, 16, 16);
//! assert_eq!(frame.get_pixel_raw(8, 8), 0x03E0);
//! # Ok::<(), zenraster::ImageError>(())
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod codec;
mod composite;
mod convert;
mod format;
mod image;
mod limits;
mod native;
mod painter;
mod text;

pub use codec::{ByteStream, ImageCodec, ImageFormat, SeekFrom, StreamError};
pub use convert::{convert, mix_alpha, mix_weighted};
pub use format::{ColorFormat, ColorFormatSet};
pub use image::{Image, ImageError, MAX_PALETTE_SIZE};
pub use limits::{ImageLimits, LimitExceeded};
pub use native::{DefaultNative, NATIVE, Native32, Native555, Native565, NativeFormat};
pub use painter::{PaintStyle, Painter};
pub use text::{Alignment, Font, Glyph, HorizontalAlign, VerticalAlign};

// Re-exports for interop with imgref/rgb pixel buffers.
pub use imgref::{ImgRef, ImgRefMut, ImgVec};
pub use rgb;
pub use rgb::alt::BGRA as Bgra;
pub use rgb::{Gray, Rgb, Rgba};
