use super::*;

/// `sBIT`: how many bits of each channel were significant in the original
/// image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignificantBits {
  /// For grayscale formats.
  V {
    /// Significant gray bits.
    v: u8,
  },
  /// For grayscale + alpha formats.
  VA {
    /// Significant gray bits.
    v: u8,
    /// Significant alpha bits.
    a: u8,
  },
  /// For RGB and indexed formats (indexed always counts against 8).
  Rgb {
    /// Significant red bits.
    r: u8,
    /// Significant green bits.
    g: u8,
    /// Significant blue bits.
    b: u8,
  },
  /// For RGBA formats.
  Rgba {
    /// Significant red bits.
    r: u8,
    /// Significant green bits.
    g: u8,
    /// Significant blue bits.
    b: u8,
    /// Significant alpha bits.
    a: u8,
  },
}

impl SignificantBits {
  /// Parses and validates an `sBIT` payload against the header's format.
  pub(crate) fn from_data(data: &[u8], pixel: PixelFormat) -> PngResult<Self> {
    let cap = if pixel.is_indexed() { 8 } else { pixel.depth() as u8 };
    let in_range = |counts: &[u8]| counts.iter().all(|&c| c >= 1 && c <= cap);
    match (pixel.is_indexed() || pixel.has_color(), pixel.has_alpha(), data) {
      (false, false, &[v]) if in_range(&[v]) => Ok(Self::V { v }),
      (false, true, &[v, a]) if in_range(&[v, a]) => Ok(Self::VA { v, a }),
      (true, false, &[r, g, b]) if in_range(&[r, g, b]) => Ok(Self::Rgb { r, g, b }),
      (true, true, &[r, g, b, a]) if in_range(&[r, g, b, a]) => Ok(Self::Rgba { r, g, b, a }),
      _ => Err(ParsingError::InvalidSignificantBits.into()),
    }
  }
}

/// `iCCP`: a named ICC color profile, already decompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorProfile {
  /// Latin-1 profile name.
  pub name: Vec<u8>,
  /// The inflated ICC profile bytes.
  pub data: Vec<u8>,
}

/// One `sPLT` chunk: a named palette the encoder suggests for quantized
/// display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedPalette {
  /// Latin-1 palette name.
  pub name: Vec<u8>,
  /// 8 or 16 bits per sample.
  pub sample_depth: u8,
  /// Raw entries: r, g, b, a samples at `sample_depth` plus a 16-bit
  /// frequency, per entry.
  pub entries: Vec<u8>,
}

/// One `tEXt`, `zTXt`, or `iTXt` chunk, with any compressed body already
/// decompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
  /// Latin-1 keyword, 1-79 bytes.
  pub keyword: Vec<u8>,
  /// `iTXt` language tag; `None` for the Latin-1 chunks.
  pub language: Option<Vec<u8>>,
  /// `iTXt` translated keyword; `None` for the Latin-1 chunks.
  pub translated: Option<String>,
  /// The text body. UTF-8 for `iTXt`, Latin-1 otherwise.
  pub text: Vec<u8>,
}

/// Everything a PNG can say about its image besides the pixels.
///
/// The at-most-once chunks are `Option`s; `sPLT`, the text chunks, and
/// unrecognized chunks can repeat freely and collect into `Vec`s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
  /// `tIME`
  pub time: Option<ModificationTime>,
  /// `cHRM`
  pub chromaticity: Option<Chromaticity>,
  /// `iCCP`
  pub profile: Option<ColorProfile>,
  /// `sRGB`
  pub intent: Option<RenderingIntent>,
  /// `gAMA`: gamma times 100,000.
  pub gamma: Option<u32>,
  /// `hIST`: one frequency per palette entry.
  pub histogram: Option<Vec<u16>>,
  /// `pHYs`
  pub dimensions: Option<PhysicalDimensions>,
  /// `sBIT`
  pub significant_bits: Option<SignificantBits>,
  /// Every `sPLT`, in stream order.
  pub suggested_palettes: Vec<SuggestedPalette>,
  /// Every text chunk, in stream order.
  pub texts: Vec<TextChunk>,
  /// Unrecognized-but-wellformed chunks, as raw bytes.
  pub unknown: Vec<(ChunkType, Vec<u8>)>,
}

/// The chunk ordering grammar.
///
/// Tracks where the stream is relative to `PLTE` and the `IDAT` run and
/// rejects anything the container format forbids:
///
/// * `PLTE` at most once, before `IDAT`, `bKGD`, `tRNS`, and `hIST`.
/// * `cHRM`/`gAMA`/`sRGB`/`iCCP`/`sBIT` before `PLTE` (and so before
///   `IDAT`).
/// * `hIST` only after `PLTE`.
/// * `IDAT` chunks contiguous; a second run is `Unexpected`.
/// * After the `IDAT` run only the text chunks, `tIME`, and unrecognized
///   chunks may appear.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ChunkOrdering {
  pub palette_seen: bool,
  pub idat_started: bool,
  pub idat_ended: bool,
  seen_trns: bool,
  seen_bkgd: bool,
  seen_hist: bool,
  seen_time: bool,
  seen_chrm: bool,
  seen_gama: bool,
  seen_srgb: bool,
  seen_iccp: bool,
  seen_sbit: bool,
  seen_phys: bool,
}

impl ChunkOrdering {
  /// Checks one chunk type against the grammar and advances the state.
  ///
  /// `IHDR` and `CgBI` never reach this point (the decoder consumes them
  /// while the stream starts), so seeing them again is itself an error.
  pub fn admit(&mut self, ty: ChunkType) -> PngResult<()> {
    use DecodingError::*;
    if self.idat_started && !self.idat_ended && ty != ChunkType::IDAT {
      self.idat_ended = true;
    }
    let mut once = |seen: &mut bool| -> PngResult<()> {
      if *seen {
        return Err(Duplicate(ty).into());
      }
      *seen = true;
      Ok(())
    };
    match ty {
      ChunkType::IHDR => return Err(Duplicate(ChunkType::IHDR).into()),
      ChunkType::CgBI => {
        return Err(Unexpected { chunk: ChunkType::CgBI, after: ChunkType::IHDR }.into())
      }
      ChunkType::IDAT => {
        if self.idat_ended {
          return Err(Unexpected { chunk: ChunkType::IDAT, after: ChunkType::IDAT }.into());
        }
        self.idat_started = true;
      }
      ChunkType::IEND => {
        if !self.idat_started {
          return Err(Required { missing: ChunkType::IDAT, before: ChunkType::IEND }.into());
        }
      }
      ChunkType::PLTE => {
        if self.palette_seen {
          return Err(Duplicate(ChunkType::PLTE).into());
        }
        let blockers = [
          (self.idat_started, ChunkType::IDAT),
          (self.seen_trns, ChunkType::tRNS),
          (self.seen_bkgd, ChunkType::bKGD),
          (self.seen_hist, ChunkType::hIST),
        ];
        for (seen, after) in blockers {
          if seen {
            return Err(Unexpected { chunk: ChunkType::PLTE, after }.into());
          }
        }
        self.palette_seen = true;
      }
      ChunkType::cHRM | ChunkType::gAMA | ChunkType::sRGB | ChunkType::iCCP | ChunkType::sBIT => {
        once(match ty {
          ChunkType::cHRM => &mut self.seen_chrm,
          ChunkType::gAMA => &mut self.seen_gama,
          ChunkType::sRGB => &mut self.seen_srgb,
          ChunkType::iCCP => &mut self.seen_iccp,
          _ => &mut self.seen_sbit,
        })?;
        if self.palette_seen {
          return Err(Unexpected { chunk: ty, after: ChunkType::PLTE }.into());
        }
        if self.idat_started {
          return Err(Unexpected { chunk: ty, after: ChunkType::IDAT }.into());
        }
      }
      ChunkType::hIST => {
        once(&mut self.seen_hist)?;
        if !self.palette_seen {
          return Err(Required { missing: ChunkType::PLTE, before: ChunkType::hIST }.into());
        }
        if self.idat_started {
          return Err(Unexpected { chunk: ChunkType::hIST, after: ChunkType::IDAT }.into());
        }
      }
      ChunkType::tRNS => {
        once(&mut self.seen_trns)?;
        if self.idat_started {
          return Err(Unexpected { chunk: ChunkType::tRNS, after: ChunkType::IDAT }.into());
        }
      }
      ChunkType::bKGD => {
        once(&mut self.seen_bkgd)?;
        if self.idat_started {
          return Err(Unexpected { chunk: ChunkType::bKGD, after: ChunkType::IDAT }.into());
        }
      }
      ChunkType::pHYs => {
        once(&mut self.seen_phys)?;
        if self.idat_started {
          return Err(Unexpected { chunk: ChunkType::pHYs, after: ChunkType::IDAT }.into());
        }
      }
      ChunkType::sPLT => {
        if self.idat_started {
          return Err(Unexpected { chunk: ChunkType::sPLT, after: ChunkType::IDAT }.into());
        }
      }
      ChunkType::tIME => once(&mut self.seen_time)?,
      // text chunks and unrecognized chunks go anywhere
      _ => {}
    }
    Ok(())
  }
}
