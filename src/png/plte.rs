use super::*;

/// `PLTE`: the palette.
///
/// Mandatory for indexed formats (every sample is an entry number),
/// optional as a quantization hint for RGB formats, and forbidden for
/// grayscale ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
  entries: Vec<[u8; 3]>,
}

impl Palette {
  /// Parses and validates a `PLTE` payload against the header's format.
  pub(crate) fn from_data(data: &[u8], pixel: PixelFormat) -> PngResult<Self> {
    if !pixel.has_color() {
      return Err(ParsingError::UnexpectedPalette.into());
    }
    if data.len() % 3 != 0 {
      return Err(ParsingError::InvalidChunkSize(ChunkType::PLTE, data.len()).into());
    }
    let entries: &[[u8; 3]] = cast_slice(data);
    let max_entries = if pixel.is_indexed() { 1_usize << pixel.depth() } else { 256 };
    if entries.is_empty() || entries.len() > max_entries {
      return Err(ParsingError::InvalidPaletteCount(entries.len()).into());
    }
    Ok(Self { entries: entries.to_vec() })
  }

  /// The RGB entries.
  #[inline]
  #[must_use]
  pub fn entries(&self) -> &[[u8; 3]] {
    &self.entries
  }

  /// Entry count, 1 to 256.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Palettes are never empty, but clippy likes `len` to have this buddy.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
