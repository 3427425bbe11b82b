//! Loading and saving images through an external codec.
//!
//! The crate contains no file-format code. A codec implements
//! [`ImageCodec`] against the object-safe [`ByteStream`] seam, and
//! [`Image::load`] / [`Image::save`] handle format hints and size limits
//! around it. Codecs see the caller's [`ImageLimits`] so they can refuse an
//! oversized image from its header, before allocating pixel storage.

use core::fmt;

use crate::image::{Image, ImageError};
use crate::limits::{ImageLimits, LimitExceeded};

// ---------------------------------------------------------------------------
// ByteStream
// ---------------------------------------------------------------------------

/// Errors reported by a [`ByteStream`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StreamError {
    /// The underlying device failed.
    Io,
    /// The stream ended before the requested bytes were available.
    UnexpectedEof,
    /// The stream does not support the operation, e.g. writing to a
    /// read-only source.
    Unsupported,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Io => "stream I/O failed",
            Self::UnexpectedEof => "unexpected end of stream",
            Self::Unsupported => "operation not supported by stream",
        })
    }
}

impl core::error::Error for StreamError {}

/// Seek origin for [`ByteStream::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekFrom {
    /// Absolute offset from the start.
    Start(u64),
    /// Offset from the end.
    End(i64),
    /// Offset from the current position.
    Current(i64),
}

/// A seekable source or sink of bytes.
///
/// This trait is object-safe; codecs receive `&mut dyn ByteStream`.
pub trait ByteStream {
    /// Read up to `buf.len()` bytes. `Ok(0)` means end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Write up to `buf.len()` bytes, returning how many were written.
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

    /// Move the cursor, returning the new position from the start.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError>;

    /// Fill `buf` completely.
    fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<(), StreamError> {
        while !buf.is_empty() {
            match self.read(buf)? {
                0 => return Err(StreamError::UnexpectedEof),
                n => buf = &mut buf[n..],
            }
        }
        Ok(())
    }

    /// Write all of `buf`.
    fn write_all(&mut self, mut buf: &[u8]) -> Result<(), StreamError> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => return Err(StreamError::Io),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ImageFormat
// ---------------------------------------------------------------------------

/// Container formats a codec may read or write.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Bmp,
    Gif,
    Jpeg,
    Pnm,
}

impl ImageFormat {
    /// Every known format.
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::Png,
        ImageFormat::Bmp,
        ImageFormat::Gif,
        ImageFormat::Jpeg,
        ImageFormat::Pnm,
    ];

    /// Bytes [`detect`](Self::detect) needs to recognize any format.
    pub const PROBE_BYTES: usize = 8;

    /// Detect format from magic bytes. Returns `None` if unrecognized.
    pub fn detect(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // GIF: "GIF87a" or "GIF89a"
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }

        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }

        // PNM family: P1-P7
        if let [b'P', b'1'..=b'7', ..] = data {
            return Some(ImageFormat::Pnm);
        }

        None
    }

    /// Detect the format of `stream` from its next bytes, then seek back.
    pub fn probe(stream: &mut dyn ByteStream) -> Result<Option<Self>, StreamError> {
        let start = stream.seek(SeekFrom::Current(0))?;
        let mut header = [0u8; Self::PROBE_BYTES];
        let mut filled = 0;
        while filled < header.len() {
            match stream.read(&mut header[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        stream.seek(SeekFrom::Start(start))?;
        Ok(Self::detect(&header[..filled]))
    }

    /// Format from a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Format from a caller hint: a name such as `"PNG"`, a MIME type, an
    /// extension, or a file name ending in an extension. Case-insensitive.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim();
        Self::ALL
            .into_iter()
            .find(|format| {
                format.name().eq_ignore_ascii_case(hint)
                    || format.mime_type().eq_ignore_ascii_case(hint)
            })
            .or_else(|| Self::from_extension(hint.rsplit('.').next().unwrap_or(hint)))
    }

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Bmp => "BMP",
            ImageFormat::Gif => "GIF",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Pnm => "PNM",
        }
    }

    /// MIME type string.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Pnm => "image/x-portable-anymap",
        }
    }

    /// Common file extensions.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Png => &["png"],
            ImageFormat::Bmp => &["bmp", "dib"],
            ImageFormat::Gif => &["gif"],
            ImageFormat::Jpeg => &["jpg", "jpeg", "jpe", "jfif"],
            ImageFormat::Pnm => &["pnm", "ppm", "pgm", "pbm", "pam"],
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ImageCodec
// ---------------------------------------------------------------------------

/// Decodes and encodes images in one or more container formats.
pub trait ImageCodec {
    /// Codec error; must absorb the crate's own error types.
    type Error: From<ImageError> + From<StreamError> + From<LimitExceeded>;

    /// Formats this codec can decode and encode.
    fn formats(&self) -> &'static [ImageFormat];

    /// Decode one image from `stream`.
    ///
    /// Implementations should call [`ImageLimits::check_allocation`] once
    /// the header gives the size, before allocating the image.
    fn decode(
        &self,
        stream: &mut dyn ByteStream,
        limits: &ImageLimits,
    ) -> Result<Image<'static>, Self::Error>;

    /// Encode `image` to `stream` as `format`.
    fn encode(
        &self,
        image: &Image<'_>,
        stream: &mut dyn ByteStream,
        format: ImageFormat,
    ) -> Result<(), Self::Error>;

    /// Whether `format` is in [`formats`](Self::formats).
    fn supports(&self, format: ImageFormat) -> bool {
        self.formats().contains(&format)
    }
}

impl Image<'static> {
    /// Decode an image with `codec`, rejecting it if it exceeds `limits`.
    ///
    /// The codec gets `limits` to reject early from the header; the decoded
    /// image is checked again in case the codec did not.
    pub fn load<C: ImageCodec + ?Sized>(
        codec: &C,
        stream: &mut dyn ByteStream,
        limits: &ImageLimits,
    ) -> Result<Self, C::Error> {
        let image = codec.decode(stream, limits)?;
        if let Err(err) = limits.check_image(&image) {
            log::warn!("rejecting decoded {image:?}: {err}");
            return Err(err.into());
        }
        log::debug!("loaded {image:?}");
        Ok(image)
    }
}

impl Image<'_> {
    /// Encode this image with `codec` in the format named by `hint`.
    ///
    /// # Errors
    ///
    /// [`ImageError::UnsupportedFormat`] when `hint` names no known format or
    /// one the codec cannot write; otherwise whatever the codec reports.
    pub fn save<C: ImageCodec + ?Sized>(
        &self,
        codec: &C,
        stream: &mut dyn ByteStream,
        hint: &str,
    ) -> Result<(), C::Error> {
        let Some(format) = ImageFormat::from_hint(hint).filter(|f| codec.supports(*f)) else {
            log::warn!("no codec format for hint {hint:?}");
            return Err(ImageError::UnsupportedFormat.into());
        };
        log::debug!("saving {self:?} as {format}");
        codec.encode(self, stream, format)
    }
}
