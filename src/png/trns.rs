use super::*;

/// `tRNS`: transparency data.
///
/// What it means depends on the pixel format:
///
/// * Grayscale formats get a single 16-bit chroma key. Samples equal to the
///   key render fully transparent, everything else fully opaque.
/// * RGB formats get a three-sample chroma key with the same rule.
/// * Indexed formats get per-entry alpha values, at most one per palette
///   entry. Entries past the end of the list default to fully opaque.
///
/// Formats that already store alpha may not also carry a `tRNS` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transparency {
  /// Chroma key for a grayscale format.
  Gray {
    /// The key sample, stored as `u16` whatever the bit depth.
    v: u16,
  },
  /// Chroma key for an RGB format.
  Rgb {
    /// Red key sample.
    r: u16,
    /// Green key sample.
    g: u16,
    /// Blue key sample.
    b: u16,
  },
  /// Per-palette-entry alpha for an indexed format.
  Alpha {
    /// One alpha byte per leading palette entry.
    alpha: Vec<u8>,
  },
}

impl Transparency {
  /// Parses and validates a `tRNS` payload against the header's format and
  /// the palette seen so far.
  pub(crate) fn from_data(
    data: &[u8], pixel: PixelFormat, palette_len: Option<usize>,
  ) -> PngResult<Self> {
    if pixel.has_alpha() {
      return Err(ParsingError::InvalidTransparency.into());
    }
    if pixel.is_indexed() {
      let palette_len = palette_len.unwrap_or(0);
      if data.is_empty() || data.len() > palette_len {
        return Err(ParsingError::InvalidTransparency.into());
      }
      return Ok(Self::Alpha { alpha: data.to_vec() });
    }
    match (pixel.has_color(), data) {
      (false, [v0, v1]) => Ok(Self::Gray { v: u16::from_be_bytes([*v0, *v1]) }),
      (true, [r0, r1, g0, g1, b0, b1]) => Ok(Self::Rgb {
        r: u16::from_be_bytes([*r0, *r1]),
        g: u16::from_be_bytes([*g0, *g1]),
        b: u16::from_be_bytes([*b0, *b1]),
      }),
      _ => Err(ParsingError::InvalidTransparency.into()),
    }
  }
}
