use super::*;

/// `cHRM`: primary chromaticities and white point.
///
/// Each value is the floating point coordinate times 100,000 (so 0.3127 is
/// stored as 31270).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Chromaticity {
  pub white_x: u32,
  pub white_y: u32,
  pub red_x: u32,
  pub red_y: u32,
  pub green_x: u32,
  pub green_y: u32,
  pub blue_x: u32,
  pub blue_y: u32,
}

/// `sRGB`: the ICC rendering intent the image should be displayed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingIntent {
  /// Adapt to the output gamut at the expense of accuracy (photos).
  Perceptual,
  /// Match color appearance relative to the output white point (logos).
  RelativeColorimetric,
  /// Preserve saturation at the expense of hue and lightness (charts).
  Saturation,
  /// Preserve absolute colorimetry (proofs).
  AbsoluteColorimetric,
}

/// `pHYs`: intended physical pixel size or aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalDimensions {
  /// Pixels per unit along x.
  pub ppu_x: u32,
  /// Pixels per unit along y.
  pub ppu_y: u32,
  /// When set the unit is the meter; otherwise the values only define an
  /// aspect ratio.
  pub is_meters: bool,
}

/// `tIME`: last modification time, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModificationTime {
  /// 4-digit year.
  pub year: u16,
  /// 1-12
  pub month: u8,
  /// 1-31
  pub day: u8,
  /// 0-23
  pub hour: u8,
  /// 0-59
  pub minute: u8,
  /// 0-60 (60 allows a leap second)
  pub second: u8,
}

/// An `sPLT` body, still borrowing the chunk data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawSuggestedPalette<'b> {
  pub name: &'b [u8],
  pub sample_depth: u8,
  pub entries: &'b [u8],
}

/// A parsed chunk, borrowing payload bytes from the lexer's buffer.
///
/// Context-free chunks parse fully here. Chunks whose meaning depends on
/// the pixel format or the palette (`PLTE`, `tRNS`, `bKGD`, `sBIT`,
/// `hIST`) stay raw; the decoder finishes them once it can.
#[derive(Debug, Clone, Copy)]
#[allow(nonstandard_style)]
pub(crate) enum PngChunk<'b> {
  CgBI,
  IHDR(Header),
  PLTE { data: &'b [u8] },
  IDAT { data: &'b [u8] },
  IEND,
  tRNS { data: &'b [u8] },
  bKGD { data: &'b [u8] },
  sBIT { data: &'b [u8] },
  hIST { data: &'b [u8] },
  cHRM(Chromaticity),
  gAMA { gamma: u32 },
  iCCP { name: &'b [u8], zlib_data: &'b [u8] },
  sRGB(RenderingIntent),
  pHYs(PhysicalDimensions),
  sPLT(RawSuggestedPalette<'b>),
  tIME(ModificationTime),
  tEXt { keyword: &'b [u8], text: &'b [u8] },
  zTXt { keyword: &'b [u8], zlib_data: &'b [u8] },
  iTXt { keyword: &'b [u8], compressed: bool, language: &'b [u8], translated: &'b str, text: &'b [u8] },
  Unknown { type_: ChunkType, data: &'b [u8] },
}

/// Checks the shape of a `tEXt`/`zTXt`/`iTXt` keyword: 1-79 printable
/// Latin-1 bytes, no leading/trailing/doubled spaces.
pub(crate) fn validate_keyword(keyword: &[u8]) -> PngResult<()> {
  if keyword.is_empty() || keyword.len() > 79 {
    return Err(TextError::InvalidKeyword.into());
  }
  if keyword[0] == b' ' || keyword[keyword.len() - 1] == b' ' {
    return Err(TextError::InvalidKeyword.into());
  }
  let mut previous = 0_u8;
  for b in keyword.iter().copied() {
    let printable = (32..=126).contains(&b) || (161..=255).contains(&b);
    if !printable || (b == b' ' && previous == b' ') {
      return Err(TextError::InvalidKeyword.into());
    }
    previous = b;
  }
  Ok(())
}

fn validate_language_tag(tag: &[u8]) -> PngResult<()> {
  // empty means "no language claimed"
  for b in tag.iter().copied() {
    if !b.is_ascii_alphanumeric() && b != b'-' {
      return Err(TextError::InvalidLanguageTag.into());
    }
  }
  Ok(())
}

fn split_nul(data: &[u8]) -> PngResult<(&[u8], &[u8])> {
  let mut it = data.splitn(2, |u| u == &0_u8);
  let head = it.next().ok_or(TextError::MissingSeparator)?;
  let tail = it.next().ok_or(TextError::MissingSeparator)?;
  Ok((head, tail))
}

impl<'b> TryFrom<RawChunk<'b>> for PngChunk<'b> {
  type Error = PngError;
  fn try_from(raw: RawChunk<'b>) -> PngResult<Self> {
    let RawChunk { type_, data } = raw;
    Ok(match type_ {
      ChunkType::CgBI => {
        if data.len() != 4 {
          return Err(ParsingError::InvalidChunkSize(type_, data.len()).into());
        }
        PngChunk::CgBI
      }
      ChunkType::IHDR => PngChunk::IHDR(Header::from_data(data)?),
      ChunkType::PLTE => PngChunk::PLTE { data },
      ChunkType::IDAT => PngChunk::IDAT { data },
      ChunkType::IEND => match data {
        [] => PngChunk::IEND,
        _ => return Err(ParsingError::InvalidChunkSize(type_, data.len()).into()),
      },
      ChunkType::tRNS => PngChunk::tRNS { data },
      ChunkType::bKGD => PngChunk::bKGD { data },
      ChunkType::sBIT => PngChunk::sBIT { data },
      ChunkType::hIST => {
        if data.len() % 2 != 0 {
          return Err(ParsingError::InvalidChunkSize(type_, data.len()).into());
        }
        PngChunk::hIST { data }
      }
      ChunkType::cHRM => {
        if data.len() != 4 * 8 {
          return Err(ParsingError::InvalidChunkSize(type_, data.len()).into());
        }
        PngChunk::cHRM(Chromaticity {
          white_x: u32::from_be_bytes(data[0..4].try_into().unwrap()),
          white_y: u32::from_be_bytes(data[4..8].try_into().unwrap()),
          red_x: u32::from_be_bytes(data[8..12].try_into().unwrap()),
          red_y: u32::from_be_bytes(data[12..16].try_into().unwrap()),
          green_x: u32::from_be_bytes(data[16..20].try_into().unwrap()),
          green_y: u32::from_be_bytes(data[20..24].try_into().unwrap()),
          blue_x: u32::from_be_bytes(data[24..28].try_into().unwrap()),
          blue_y: u32::from_be_bytes(data[28..32].try_into().unwrap()),
        })
      }
      ChunkType::gAMA => {
        if data.len() != 4 {
          return Err(ParsingError::InvalidChunkSize(type_, data.len()).into());
        }
        PngChunk::gAMA { gamma: u32::from_be_bytes(data.try_into().unwrap()) }
      }
      ChunkType::iCCP => {
        let (name, rest) = split_nul(data)?;
        validate_keyword(name)?;
        match rest {
          [0, zlib_data @ ..] => PngChunk::iCCP { name, zlib_data },
          [method, ..] => return Err(TextError::InvalidCompressionMethod(*method).into()),
          [] => return Err(ParsingError::InvalidChunkSize(type_, data.len()).into()),
        }
      }
      ChunkType::sRGB => PngChunk::sRGB(match data {
        [0] => RenderingIntent::Perceptual,
        [1] => RenderingIntent::RelativeColorimetric,
        [2] => RenderingIntent::Saturation,
        [3] => RenderingIntent::AbsoluteColorimetric,
        [other] => return Err(ParsingError::InvalidRenderingIntent(*other).into()),
        _ => return Err(ParsingError::InvalidChunkSize(type_, data.len()).into()),
      }),
      ChunkType::pHYs => {
        if data.len() != 9 {
          return Err(ParsingError::InvalidChunkSize(type_, data.len()).into());
        }
        if data[8] > 1 {
          return Err(ParsingError::InvalidDensityUnit(data[8]).into());
        }
        PngChunk::pHYs(PhysicalDimensions {
          ppu_x: u32::from_be_bytes(data[0..4].try_into().unwrap()),
          ppu_y: u32::from_be_bytes(data[4..8].try_into().unwrap()),
          is_meters: data[8] != 0,
        })
      }
      ChunkType::sPLT => {
        let (name, rest) = split_nul(data)?;
        validate_keyword(name)?;
        let (sample_depth, entries) = match rest {
          [8, entries @ ..] if entries.len() % 6 == 0 => (8, entries),
          [16, entries @ ..] if entries.len() % 10 == 0 => (16, entries),
          _ => return Err(ParsingError::InvalidSuggestedPalette.into()),
        };
        PngChunk::sPLT(RawSuggestedPalette { name, sample_depth, entries })
      }
      ChunkType::tIME => match *data {
        [y0, y1, month @ 1..=12, day @ 1..=31, hour @ 0..=23, minute @ 0..=59, second @ 0..=60] => {
          PngChunk::tIME(ModificationTime {
            year: u16::from_be_bytes([y0, y1]),
            month,
            day,
            hour,
            minute,
            second,
          })
        }
        [_, _, _, _, _, _, _] => return Err(ParsingError::InvalidModificationTime.into()),
        _ => return Err(ParsingError::InvalidChunkSize(type_, data.len()).into()),
      },
      ChunkType::tEXt => {
        let (keyword, text) = split_nul(data)?;
        validate_keyword(keyword)?;
        PngChunk::tEXt { keyword, text }
      }
      ChunkType::zTXt => {
        let (keyword, rest) = split_nul(data)?;
        validate_keyword(keyword)?;
        match rest {
          [0, zlib_data @ ..] => PngChunk::zTXt { keyword, zlib_data },
          [method, ..] => return Err(TextError::InvalidCompressionMethod(*method).into()),
          [] => return Err(TextError::MissingSeparator.into()),
        }
      }
      ChunkType::iTXt => {
        let (keyword, rest) = split_nul(data)?;
        validate_keyword(keyword)?;
        let (&flag, rest) = rest.split_first().ok_or(TextError::MissingSeparator)?;
        let compressed = match flag {
          0 => false,
          1 => true,
          other => return Err(TextError::InvalidCompressionFlag(other).into()),
        };
        let (&method, rest) = rest.split_first().ok_or(TextError::MissingSeparator)?;
        if method != 0 {
          return Err(TextError::InvalidCompressionMethod(method).into());
        }
        let (language, rest) = split_nul(rest)?;
        validate_language_tag(language)?;
        let (translated_raw, text) = split_nul(rest)?;
        let translated =
          core::str::from_utf8(translated_raw).map_err(|_| TextError::InvalidUtf8)?;
        if !compressed && core::str::from_utf8(text).is_err() {
          return Err(TextError::InvalidUtf8.into());
        }
        PngChunk::iTXt { keyword, compressed, language, translated, text }
      }
      other => PngChunk::Unknown { type_: other, data },
    })
  }
}
