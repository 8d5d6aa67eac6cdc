use super::*;

/// `bKGD`: the suggested background color, validated against the pixel
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
  /// For grayscale formats.
  Gray {
    /// The background sample.
    v: u16,
  },
  /// For RGB and RGBA formats.
  Rgb {
    /// Red sample.
    r: u16,
    /// Green sample.
    g: u16,
    /// Blue sample.
    b: u16,
  },
  /// For indexed formats: an entry number within the palette.
  Index {
    /// The palette entry.
    i: u8,
  },
}

impl Background {
  /// Parses and validates a `bKGD` payload against the header's format and
  /// the palette seen so far.
  pub(crate) fn from_data(
    data: &[u8], pixel: PixelFormat, palette_len: Option<usize>,
  ) -> PngResult<Self> {
    if pixel.is_indexed() {
      return match data {
        [i] if (*i as usize) < palette_len.unwrap_or(0) => Ok(Self::Index { i: *i }),
        _ => Err(ParsingError::InvalidBackground.into()),
      };
    }
    match (pixel.has_color(), data) {
      (false, [v0, v1]) => Ok(Self::Gray { v: u16::from_be_bytes([*v0, *v1]) }),
      (true, [r0, r1, g0, g1, b0, b1]) => Ok(Self::Rgb {
        r: u16::from_be_bytes([*r0, *r1]),
        g: u16::from_be_bytes([*g0, *g1]),
        b: u16::from_be_bytes([*b0, *b1]),
      }),
      _ => Err(ParsingError::InvalidBackground.into()),
    }
  }
}
