use crate::png::ChunkType;

/// An error while framing chunks out of the raw byte stream.
///
/// The lexer doesn't look inside chunk payloads at all, so everything here is
/// about the container level: the 8-byte signature, the
/// length/type/data/checksum framing, and the CRC-32 that seals each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexingError {
  /// The stream ended inside the 8-byte PNG signature.
  TruncatedSignature,
  /// The first 8 bytes were not the PNG signature.
  InvalidSignature([u8; 8]),
  /// The stream ended inside a chunk's length/type header.
  TruncatedChunkHeader,
  /// The stream ended inside a chunk's payload.
  TruncatedChunkBody,
  /// The stream ended inside a chunk's trailing CRC-32.
  TruncatedChunkChecksum,
  /// A chunk declared a length above the 2^31 - 1 cap.
  InvalidChunkLength(u32),
  /// A chunk type code was neither a known public code nor a well-formed
  /// private code (four ASCII letters with the reserved bit clear).
  InvalidChunkType([u8; 4]),
  /// The CRC-32 over `type ‖ payload` didn't match the declared value.
  InvalidChunkChecksum {
    /// The chunk that failed its checksum.
    chunk: ChunkType,
    /// The CRC-32 stored in the stream.
    declared: u32,
    /// The CRC-32 computed from the chunk content.
    computed: u32,
  },
}

/// An error in the content of an individual, correctly framed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingError {
  /// A chunk's payload had a size its type doesn't allow.
  InvalidChunkSize(ChunkType, usize),
  /// `IHDR` width or height was zero or above 2^31 - 1.
  InvalidDimensions(u32, u32),
  /// The (bit depth, color type) pair isn't one of the legal combinations,
  /// or isn't legal under the current [`Standard`](crate::Standard).
  InvalidPixelFormat(u8, u8),
  /// `IHDR` compression method wasn't 0.
  InvalidCompressionMethod(u8),
  /// `IHDR` filter method wasn't 0.
  InvalidFilterMethod(u8),
  /// `IHDR` interlace method wasn't 0 or 1.
  InvalidInterlaceMethod(u8),
  /// A scanline began with a filter type above 4.
  InvalidFilterType(u8),
  /// `PLTE` entry count was zero or above what the bit depth can index.
  InvalidPaletteCount(usize),
  /// A palette appeared for a grayscale pixel format.
  UnexpectedPalette,
  /// `tRNS` didn't fit the pixel format (wrong size, more entries than the
  /// palette, or present for a format that already has alpha).
  InvalidTransparency,
  /// `bKGD` didn't fit the pixel format, or named an index outside the
  /// palette.
  InvalidBackground,
  /// `hIST` entry count didn't match the palette entry count.
  InvalidHistogram,
  /// `sBIT` didn't match the pixel format's channel layout, or a count was
  /// zero or above the format's depth.
  InvalidSignificantBits,
  /// `pHYs` density unit byte was above 1.
  InvalidDensityUnit(u8),
  /// `sRGB` rendering intent byte wasn't 0-3.
  InvalidRenderingIntent(u8),
  /// `sPLT` sample depth byte wasn't 8 or 16, or the entry data wasn't a
  /// whole number of entries.
  InvalidSuggestedPalette,
  /// `tIME` had an out-of-range month/day/hour/minute/second field.
  InvalidModificationTime,
}

/// A violation of the chunk ordering grammar, or of the overall shape of the
/// image datastream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodingError {
  /// A chunk appeared without another chunk it depends on.
  Required {
    /// The chunk that should have appeared earlier.
    missing: ChunkType,
    /// The chunk that needed it.
    before: ChunkType,
  },
  /// An at-most-once chunk appeared a second time.
  Duplicate(ChunkType),
  /// A chunk appeared somewhere the grammar forbids.
  Unexpected {
    /// The offending chunk.
    chunk: ChunkType,
    /// The earlier chunk it may not follow. A non-contiguous `IDAT` run is
    /// reported as `IDAT` after `IDAT`.
    after: ChunkType,
  },
  /// The last `IDAT` went by without the zlib stream reaching its end.
  IncompleteImageDataCompressedDatastream,
  /// More compressed bytes arrived after the zlib stream already ended.
  ExtraneousImageDataCompressedData,
  /// The zlib stream decompressed to more bytes than the scanlines need.
  ExtraneousImageData,
}

/// An error inside the DEFLATE/zlib stream itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflationError {
  /// The 2-byte zlib header failed validation (method, window size, check
  /// bits, or a preset dictionary was requested).
  InvalidZlibHeader(u8, u8),
  /// A block used the reserved block type `11`.
  InvalidBlockType,
  /// A stored block's `NLEN` wasn't the complement of its `LEN`.
  InvalidStoredLengths {
    /// The declared length.
    len: u16,
    /// The declared complement.
    nlen: u16,
  },
  /// A code-length vector didn't describe a usable prefix code.
  InvalidHuffmanTable,
  /// A compressed sequence of bits matched no code in the current table.
  InvalidSymbol,
  /// A back-reference pointed farther back than the bytes emitted so far,
  /// or used one of the two reserved distance codes.
  InvalidDistance,
  /// The input ended before the stream did. The streaming
  /// [`Inflator`](crate::Inflator) never reports this itself (it just keeps
  /// waiting); this comes from one-shot inflation of an embedded stream.
  TruncatedStream,
  /// The Adler-32 trailer didn't match the decompressed bytes.
  ChecksumMismatch {
    /// The checksum stored in the stream.
    declared: u32,
    /// The checksum computed from the decompressed bytes.
    computed: u32,
  },
}

/// An error in a `tEXt`, `zTXt`, or `iTXt` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextError {
  /// A keyword was empty, over 79 bytes, not printable Latin-1, or had
  /// leading/trailing/consecutive spaces.
  InvalidKeyword,
  /// An `iTXt` language tag contained something other than ASCII letters,
  /// digits, and hyphens.
  InvalidLanguageTag,
  /// An `iTXt` compression flag byte wasn't 0 or 1.
  InvalidCompressionFlag(u8),
  /// A `zTXt`/`iTXt` compression method byte wasn't 0.
  InvalidCompressionMethod(u8),
  /// An `iTXt` translated keyword or text body wasn't UTF-8.
  InvalidUtf8,
  /// A required NUL separator was missing.
  MissingSeparator,
}

/// Any error the decoder can produce.
///
/// Every failure is fatal for the decoder instance that produced it; there
/// is no recovery or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngError {
  /// Container framing failed.
  Lexing(LexingError),
  /// A chunk's payload was malformed.
  Parsing(ParsingError),
  /// The datastream as a whole was malformed.
  Decoding(DecodingError),
  /// The compressed image data was malformed.
  Inflation(InflationError),
  /// A text chunk was malformed.
  Text(TextError),
}

/// Alias for the crate's `Result` type.
pub type PngResult<T> = Result<T, PngError>;

impl From<LexingError> for PngError {
  #[inline]
  fn from(e: LexingError) -> Self {
    Self::Lexing(e)
  }
}
impl From<ParsingError> for PngError {
  #[inline]
  fn from(e: ParsingError) -> Self {
    Self::Parsing(e)
  }
}
impl From<DecodingError> for PngError {
  #[inline]
  fn from(e: DecodingError) -> Self {
    Self::Decoding(e)
  }
}
impl From<InflationError> for PngError {
  #[inline]
  fn from(e: InflationError) -> Self {
    Self::Inflation(e)
  }
}
impl From<TextError> for PngError {
  #[inline]
  fn from(e: TextError) -> Self {
    Self::Text(e)
  }
}
