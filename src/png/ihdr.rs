use super::*;

/// The pixel formats a PNG can carry.
///
/// This combines a channel layout with a bit depth per channel.
///
/// * The grayscale (`V`) and indexed formats allow 1, 2, or 4 bits per
///   pixel. In that case pixels pack tightly into bytes, the leftmost pixel
///   in the highest bits.
/// * `BGR8`/`BGRA8` only occur in Apple `CgBI` files: same depth and
///   channel count as `RGB8`/`RGBA8`, but with the red and blue samples
///   swapped in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PixelFormat {
  V1,
  V2,
  V4,
  V8,
  V16,
  VA8,
  VA16,
  RGB8,
  RGB16,
  RGBA8,
  RGBA16,
  Indexed1,
  Indexed2,
  Indexed4,
  Indexed8,
  BGR8,
  BGRA8,
}

impl PixelFormat {
  /// Maps an `IHDR` (bit depth, color type) pair to a format.
  pub(crate) fn from_code(depth: u8, color_type: u8) -> Option<Self> {
    Some(match (depth, color_type) {
      (1, 0) => Self::V1,
      (2, 0) => Self::V2,
      (4, 0) => Self::V4,
      (8, 0) => Self::V8,
      (16, 0) => Self::V16,
      (8, 2) => Self::RGB8,
      (16, 2) => Self::RGB16,
      (1, 3) => Self::Indexed1,
      (2, 3) => Self::Indexed2,
      (4, 3) => Self::Indexed4,
      (8, 3) => Self::Indexed8,
      (8, 4) => Self::VA8,
      (16, 4) => Self::VA16,
      (8, 6) => Self::RGBA8,
      (16, 6) => Self::RGBA16,
      _ => return None,
    })
  }

  /// The `IHDR` (bit depth, color type) pair this format came from.
  pub(crate) const fn code(self) -> (u8, u8) {
    match self {
      Self::V1 => (1, 0),
      Self::V2 => (2, 0),
      Self::V4 => (4, 0),
      Self::V8 => (8, 0),
      Self::V16 => (16, 0),
      Self::RGB8 | Self::BGR8 => (8, 2),
      Self::RGB16 => (16, 2),
      Self::Indexed1 => (1, 3),
      Self::Indexed2 => (2, 3),
      Self::Indexed4 => (4, 3),
      Self::Indexed8 => (8, 3),
      Self::VA8 => (8, 4),
      Self::VA16 => (16, 4),
      Self::RGBA8 | Self::BGRA8 => (8, 6),
      Self::RGBA16 => (16, 6),
    }
  }

  /// Bits per sample: 1, 2, 4, 8, or 16.
  #[inline]
  #[must_use]
  pub const fn depth(self) -> u32 {
    match self {
      Self::V1 | Self::Indexed1 => 1,
      Self::V2 | Self::Indexed2 => 2,
      Self::V4 | Self::Indexed4 => 4,
      Self::V8
      | Self::Indexed8
      | Self::VA8
      | Self::RGB8
      | Self::RGBA8
      | Self::BGR8
      | Self::BGRA8 => 8,
      Self::V16 | Self::VA16 | Self::RGB16 | Self::RGBA16 => 16,
    }
  }

  /// Samples per pixel: 1 to 4.
  #[inline]
  #[must_use]
  pub const fn channels(self) -> u32 {
    match self {
      Self::V1
      | Self::V2
      | Self::V4
      | Self::V8
      | Self::V16
      | Self::Indexed1
      | Self::Indexed2
      | Self::Indexed4
      | Self::Indexed8 => 1,
      Self::VA8 | Self::VA16 => 2,
      Self::RGB8 | Self::RGB16 | Self::BGR8 => 3,
      Self::RGBA8 | Self::RGBA16 | Self::BGRA8 => 4,
    }
  }

  /// Whether the format stores color (as opposed to grayscale) samples.
  #[inline]
  #[must_use]
  pub const fn has_color(self) -> bool {
    !matches!(self, Self::V1 | Self::V2 | Self::V4 | Self::V8 | Self::V16 | Self::VA8 | Self::VA16)
  }

  /// Whether the format stores an alpha channel.
  #[inline]
  #[must_use]
  pub const fn has_alpha(self) -> bool {
    matches!(self, Self::VA8 | Self::VA16 | Self::RGBA8 | Self::RGBA16 | Self::BGRA8)
  }

  /// Whether samples are palette indices.
  #[inline]
  #[must_use]
  pub const fn is_indexed(self) -> bool {
    matches!(self, Self::Indexed1 | Self::Indexed2 | Self::Indexed4 | Self::Indexed8)
  }

  /// Bits per pixel.
  #[inline]
  #[must_use]
  pub const fn volume(self) -> u32 {
    self.depth() * self.channels()
  }

  /// Whole bytes per pixel, but never less than 1. The filters use this as
  /// the offset to a pixel's left neighbor.
  #[inline]
  #[must_use]
  pub const fn filter_delay(self) -> usize {
    let bytes = (self.volume() / 8) as usize;
    if bytes == 0 {
      1
    } else {
      bytes
    }
  }

  /// Bytes in a packed scanline of `width` pixels, without the leading
  /// filter byte.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(self, width: u32) -> usize {
    (width as usize * self.volume() as usize + 7) / 8
  }
}

/// `IHDR`: the image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  /// Width in pixels, 1 or more.
  pub width: u32,
  /// Height in pixels, 1 or more.
  pub height: u32,
  /// Format of the pixels.
  pub pixel: PixelFormat,
  /// Whether the pixel data is stored in Adam7 interlaced order.
  pub interlaced: bool,
}

impl Header {
  /// Parses the 13-byte `IHDR` payload.
  pub(crate) fn from_data(data: &[u8]) -> PngResult<Self> {
    if data.len() != 13 {
      return Err(ParsingError::InvalidChunkSize(ChunkType::IHDR, data.len()).into());
    }
    let width = u32::from_be_bytes(data[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(data[4..8].try_into().unwrap());
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
      return Err(ParsingError::InvalidDimensions(width, height).into());
    }
    let pixel = PixelFormat::from_code(data[8], data[9])
      .ok_or(ParsingError::InvalidPixelFormat(data[8], data[9]))?;
    if data[10] != 0 {
      return Err(ParsingError::InvalidCompressionMethod(data[10]).into());
    }
    if data[11] != 0 {
      return Err(ParsingError::InvalidFilterMethod(data[11]).into());
    }
    let interlaced = match data[12] {
      0 => false,
      1 => true,
      other => return Err(ParsingError::InvalidInterlaceMethod(other).into()),
    };
    Ok(Self { width, height, pixel, interlaced })
  }

  /// Re-reads the pixel format under the `CgBI` restriction: only rgb8 and
  /// rgba8 are allowed, and their samples are stored blue-first.
  pub(crate) fn apply_ios_standard(&mut self) -> PngResult<()> {
    self.pixel = match self.pixel {
      PixelFormat::RGB8 => PixelFormat::BGR8,
      PixelFormat::RGBA8 => PixelFormat::BGRA8,
      other => {
        let (depth, color_type) = other.code();
        return Err(ParsingError::InvalidPixelFormat(depth, color_type).into());
      }
    };
    Ok(())
  }

  /// Total bytes of the final bit-packed storage:
  /// `ceil(width * height * volume / 8)`.
  #[inline]
  #[must_use]
  pub fn storage_len(&self) -> usize {
    let bits = self.width as usize * self.height as usize * self.pixel.volume() as usize;
    (bits + 7) / 8
  }
}
