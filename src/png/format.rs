use super::*;

/// Which dialect of PNG the stream uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Standard {
  /// Ordinary ISO PNG.
  #[default]
  Png,
  /// The Apple `CgBI` variant: BGR sample order and a bare DEFLATE stream
  /// in `IDAT` with no zlib header or Adler-32 trailer.
  Ios,
}

/// A `tRNS` chroma key. Samples that exactly equal the key unpack as fully
/// transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaKey {
  /// Key for grayscale formats.
  Gray {
    /// The key sample at the image's bit depth.
    v: u16,
  },
  /// Key for RGB formats.
  Rgb {
    /// Red key sample.
    r: u16,
    /// Green key sample.
    g: u16,
    /// Blue key sample.
    b: u16,
  },
}

/// The fully resolved color description of an image: the pixel format plus
/// whatever `PLTE`, `tRNS`, and `bKGD` contributed.
///
/// This is what the unpacker works from. For indexed formats the palette
/// already has its transparency folded in as RGBA entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
  /// The storage pixel format.
  pub pixel: PixelFormat,
  /// Which PNG dialect the samples follow.
  pub standard: Standard,
  /// The deindexing palette. Empty unless the format is indexed.
  pub palette: Vec<RGBA8>,
  /// The chroma key, for non-indexed formats without their own alpha.
  pub key: Option<ChromaKey>,
  /// The suggested background color, if the stream carried one.
  pub background: Option<Background>,
}

impl Format {
  /// Resolves the format at the moment the first `IDAT` arrives.
  ///
  /// An indexed header with no palette is the one fatal combination; a
  /// `tRNS` that survived parsing is guaranteed to fit the pixel format
  /// already.
  pub(crate) fn resolve(
    header: &Header, standard: Standard, palette: Option<&Palette>,
    transparency: Option<&Transparency>, background: Option<Background>,
  ) -> PngResult<Self> {
    let pixel = header.pixel;
    if pixel.is_indexed() && palette.is_none() {
      return Err(
        DecodingError::Required { missing: ChunkType::PLTE, before: ChunkType::IDAT }.into(),
      );
    }
    let palette = if pixel.is_indexed() {
      let entries = palette.map(Palette::entries).unwrap_or(&[]);
      let alpha = match transparency {
        Some(Transparency::Alpha { alpha }) => &alpha[..],
        _ => &[],
      };
      entries
        .iter()
        .enumerate()
        .map(|(i, &[r, g, b])| RGBA8 { r, g, b, a: alpha.get(i).copied().unwrap_or(255) })
        .collect()
    } else {
      Vec::new()
    };
    let key = match transparency {
      Some(Transparency::Gray { v }) => Some(ChromaKey::Gray { v: *v }),
      Some(Transparency::Rgb { r, g, b }) => Some(ChromaKey::Rgb { r: *r, g: *g, b: *b }),
      _ => None,
    };
    Ok(Self { pixel, standard, palette, key, background })
  }
}

/// A [`Format`] plus whether the stream stored it interlaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  /// The resolved color description.
  pub format: Format,
  /// Whether the pixel data went through Adam7.
  pub interlaced: bool,
}
