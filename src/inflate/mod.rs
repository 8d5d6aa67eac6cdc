#![forbid(unsafe_code)]

//! Streaming DEFLATE/zlib decompression.
//!
//! * [RFC 1950](https://www.rfc-editor.org/rfc/rfc1950) (zlib wrapper)
//! * [RFC 1951](https://www.rfc-editor.org/rfc/rfc1951) (DEFLATE)
//!
//! The one type you normally touch here is [`Inflator`]. It's built for the
//! way PNG hands you compressed data: in arbitrary slices, cut anywhere,
//! possibly one byte at a time. Each [`push`](Inflator::push) consumes as
//! much of the stream as it can and parks the partial bits of whatever
//! symbol got cut off; each [`pull`](Inflator::pull) hands back decompressed
//! bytes without ever waiting for more input.
//!
//! ```
//! use pngolin::{InflateFormat, InflateStatus, Inflator};
//!
//! // zlib stream for the bytes `hi` (one stored block)
//! let stream = [0x78, 0x01, 0x01, 0x02, 0x00, 0xFD, 0xFF, b'h', b'i', 0x01, 0x3B, 0x00, 0xD2];
//! let mut inflator = Inflator::new(InflateFormat::Zlib);
//! for byte in stream.iter() {
//!   inflator.push(core::slice::from_ref(byte)).unwrap();
//! }
//! assert!(inflator.is_complete());
//! assert_eq!(inflator.pull_all(), b"hi");
//! ```

use alloc::{vec, vec::Vec};

use crate::{DecodingError, InflationError, PngResult};

mod adler32;
mod bit_buffer;
mod code_length_alphabet;
mod dist_alphabet;
mod lit_len_alphabet;
mod tree_entry;

use adler32::Adler32;
use bit_buffer::BitBuffer;
use code_length_alphabet::CodeLengthAlphabet;
use dist_alphabet::DistAlphabet;
use lit_len_alphabet::LitLenAlphabet;
use tree_entry::{match_code, TreeEntry};

/// The two stream framings the inflator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateFormat {
  /// A full zlib stream: 2-byte header, DEFLATE blocks, Adler-32 trailer.
  Zlib,
  /// Bare DEFLATE blocks with no header and no trailer, as found in the
  /// `IDAT` chunks of Apple `CgBI` files.
  Ios,
}

/// What a [`push`](Inflator::push) accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateStatus {
  /// The stream hasn't ended yet; push more input when you have it.
  NeedMore,
  /// The stream has fully terminated (and, for zlib, the checksum passed).
  Complete,
}

/// DEFLATE back-references reach at most this far back.
const WINDOW_SIZE: usize = 32 * 1024;

/// Length symbol decode table: `(base, extra_bits)` for symbols 257-285.
const LENGTH_TABLE: [(u16, u32); 29] = [
  (3, 0),
  (4, 0),
  (5, 0),
  (6, 0),
  (7, 0),
  (8, 0),
  (9, 0),
  (10, 0),
  (11, 1),
  (13, 1),
  (15, 1),
  (17, 1),
  (19, 2),
  (23, 2),
  (27, 2),
  (31, 2),
  (35, 3),
  (43, 3),
  (51, 3),
  (59, 3),
  (67, 4),
  (83, 4),
  (99, 4),
  (115, 4),
  (131, 5),
  (163, 5),
  (195, 5),
  (227, 5),
  (258, 0),
];

/// Distance symbol decode table: `(base, extra_bits)` for symbols 0-29.
const DIST_TABLE: [(u16, u32); 30] = [
  (1, 0),
  (2, 0),
  (3, 0),
  (4, 0),
  (5, 1),
  (7, 1),
  (9, 2),
  (13, 2),
  (17, 3),
  (25, 3),
  (33, 4),
  (49, 4),
  (65, 5),
  (97, 5),
  (129, 6),
  (193, 6),
  (257, 7),
  (385, 7),
  (513, 8),
  (769, 8),
  (1025, 9),
  (1537, 9),
  (2049, 10),
  (3073, 10),
  (4097, 11),
  (6145, 11),
  (8193, 12),
  (12289, 12),
  (16385, 13),
  (24577, 13),
];

#[derive(Debug, Clone, Copy)]
enum Stage {
  ZlibHeader,
  BlockHeader,
  StoredLengths,
  StoredBody { remaining: u16 },
  DynamicTables,
  Symbols,
  Trailer,
  Done,
}

enum StepOutcome {
  /// The step committed; run another.
  Progress,
  /// The step couldn't finish on the input available; roll it back.
  Stalled,
  /// The stream has terminated.
  Finished,
}

/// A streaming DEFLATE/zlib decompressor.
///
/// Feed it with [`push`](Self::push), read from it with
/// [`pull`](Self::pull) / [`pull_all`](Self::pull_all). The two sides are
/// fully decoupled: pulling never consumes input, pushing never discards
/// decoded output.
///
/// The decompressor works in *steps*: one block header, one whole dynamic
/// table description, one symbol, or one stored-block run. If the input
/// runs out mid-step the step is rolled back and retried on the next push,
/// so it doesn't matter where the input slices are cut.
pub struct Inflator {
  format: InflateFormat,
  stage: Stage,
  final_block: bool,
  bits: BitBuffer,
  window: Vec<u8>,
  window_pos: usize,
  emitted: u64,
  lit_len: LitLenAlphabet,
  dist: DistAlphabet,
  output: Vec<u8>,
  taken: usize,
  mrc: Adler32,
}

impl core::fmt::Debug for Inflator {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Inflator")
      .field("format", &self.format)
      .field("stage", &self.stage)
      .field("emitted", &self.emitted)
      .field("available", &self.available())
      .finish()
  }
}

macro_rules! pull_bits {
  ($e:expr) => {
    match $e {
      Some(v) => v,
      None => return Ok(StepOutcome::Stalled),
    }
  };
}

impl Inflator {
  /// Makes an inflator for a stream in the given format.
  pub fn new(format: InflateFormat) -> Self {
    Self {
      format,
      stage: match format {
        InflateFormat::Zlib => Stage::ZlibHeader,
        InflateFormat::Ios => Stage::BlockHeader,
      },
      final_block: false,
      bits: BitBuffer::new(),
      window: vec![0; WINDOW_SIZE],
      window_pos: 0,
      emitted: 0,
      lit_len: LitLenAlphabet::default(),
      dist: DistAlphabet::default(),
      output: Vec::new(),
      taken: 0,
      mrc: Adler32::new(),
    }
  }

  /// Feeds a slice of the compressed stream.
  ///
  /// Decompresses as far as the accumulated input allows, then reports
  /// whether the stream has terminated. Feeding more bytes after
  /// [`InflateStatus::Complete`], or feeding bytes beyond the stream's end
  /// within one call, is an error.
  pub fn push(&mut self, bytes: &[u8]) -> PngResult<InflateStatus> {
    if let Stage::Done = self.stage {
      if !bytes.is_empty() {
        return Err(DecodingError::ExtraneousImageDataCompressedData.into());
      }
      return Ok(InflateStatus::Complete);
    }
    self.bits.compact();
    self.bits.extend_from_slice(bytes);
    loop {
      let mark = self.bits.mark();
      match self.step()? {
        StepOutcome::Progress => continue,
        StepOutcome::Stalled => {
          self.bits.restore(mark);
          return Ok(InflateStatus::NeedMore);
        }
        StepOutcome::Finished => {
          if self.bits.remaining_bytes() > 0 {
            return Err(DecodingError::ExtraneousImageDataCompressedData.into());
          }
          return Ok(InflateStatus::Complete);
        }
      }
    }
  }

  /// Takes exactly `count` decoded bytes, or `None` if that many aren't
  /// ready yet.
  pub fn pull(&mut self, count: usize) -> Option<Vec<u8>> {
    if self.available() < count {
      return None;
    }
    let out = self.output[self.taken..self.taken + count].to_vec();
    self.taken += count;
    self.compact_output();
    Some(out)
  }

  /// Drains every decoded byte currently ready.
  pub fn pull_all(&mut self) -> Vec<u8> {
    let out = self.output.split_off(self.taken);
    self.output.clear();
    self.taken = 0;
    out
  }

  /// Fills `buf` from the decoded bytes, or leaves everything untouched and
  /// returns `false` if `buf.len()` bytes aren't ready yet.
  pub(crate) fn pull_into(&mut self, buf: &mut [u8]) -> bool {
    if self.available() < buf.len() {
      return false;
    }
    buf.copy_from_slice(&self.output[self.taken..self.taken + buf.len()]);
    self.taken += buf.len();
    self.compact_output();
    true
  }

  /// How many decoded bytes are ready to pull.
  pub fn available(&self) -> usize {
    self.output.len() - self.taken
  }

  /// Whether the stream has fully terminated.
  pub fn is_complete(&self) -> bool {
    matches!(self.stage, Stage::Done)
  }

  fn compact_output(&mut self) {
    if self.taken >= WINDOW_SIZE && self.taken * 2 >= self.output.len() {
      self.output.drain(..self.taken);
      self.taken = 0;
    }
  }

  #[inline]
  fn emit(&mut self, byte: u8) {
    self.output.push(byte);
    self.window[self.window_pos] = byte;
    self.window_pos = (self.window_pos + 1) % WINDOW_SIZE;
    self.emitted += 1;
    self.mrc.push_byte(byte);
  }

  /// Where to go once the final block's data has been emitted.
  fn after_final_block(&self) -> Stage {
    match self.format {
      InflateFormat::Zlib => Stage::Trailer,
      InflateFormat::Ios => Stage::Done,
    }
  }

  /// Runs one atomic decode step. `Stalled` promises that the caller can
  /// roll the bit cursor back to where the step started.
  fn step(&mut self) -> PngResult<StepOutcome> {
    match self.stage {
      Stage::ZlibHeader => {
        let cmf = pull_bits!(self.bits.next_bits_lsb(8)) as u8;
        let flg = pull_bits!(self.bits.next_bits_lsb(8)) as u8;
        let method = cmf & 0x0F;
        let window_exp = cmf >> 4;
        let check = (u16::from(cmf) << 8) | u16::from(flg);
        let fdict = flg & 0x20;
        if method != 8 || window_exp > 7 || check % 31 != 0 || fdict != 0 {
          return Err(InflationError::InvalidZlibHeader(cmf, flg).into());
        }
        self.stage = Stage::BlockHeader;
        Ok(StepOutcome::Progress)
      }
      Stage::BlockHeader => {
        let bfinal = pull_bits!(self.bits.next_one_bit());
        let btype = pull_bits!(self.bits.next_bits_lsb(2));
        self.final_block = bfinal != 0;
        log::trace!("deflate block: final={} type={:02b}", self.final_block, btype);
        match btype {
          0b00 => {
            self.bits.align_to_byte();
            self.stage = Stage::StoredLengths;
          }
          0b01 => {
            self.lit_len = LitLenAlphabet::fixed();
            self.dist = DistAlphabet::fixed();
            self.stage = Stage::Symbols;
          }
          0b10 => self.stage = Stage::DynamicTables,
          _ => return Err(InflationError::InvalidBlockType.into()),
        }
        Ok(StepOutcome::Progress)
      }
      Stage::StoredLengths => {
        let len = pull_bits!(self.bits.next_bits_lsb(16)) as u16;
        let nlen = pull_bits!(self.bits.next_bits_lsb(16)) as u16;
        if len != !nlen {
          return Err(InflationError::InvalidStoredLengths { len, nlen }.into());
        }
        self.stage = Stage::StoredBody { remaining: len };
        Ok(StepOutcome::Progress)
      }
      Stage::StoredBody { remaining } => {
        // byte aligned here, so whole bytes can be counted and committed as
        // they're copied rather than rolling the run back
        let take = (remaining as usize).min(self.bits.remaining_bytes());
        for _ in 0..take {
          let byte = self.bits.next_bits_lsb(8).unwrap() as u8;
          self.emit(byte);
        }
        let remaining = remaining - take as u16;
        if remaining == 0 {
          self.stage =
            if self.final_block { self.after_final_block() } else { Stage::BlockHeader };
          Ok(StepOutcome::Progress)
        } else {
          self.stage = Stage::StoredBody { remaining };
          if take > 0 {
            Ok(StepOutcome::Progress)
          } else {
            Ok(StepOutcome::Stalled)
          }
        }
      }
      Stage::DynamicTables => {
        let hlit = pull_bits!(self.bits.next_bits_lsb(5)) as usize + 257;
        let hdist = pull_bits!(self.bits.next_bits_lsb(5)) as usize + 1;
        let hclen = pull_bits!(self.bits.next_bits_lsb(4)) as usize + 4;

        let mut meta = CodeLengthAlphabet::default();
        for position in CodeLengthAlphabet::STORAGE_ORDER.iter().copied().take(hclen) {
          meta.tree[position].len = pull_bits!(self.bits.next_bits_lsb(3)) as u16;
        }
        meta.refresh()?;

        // the run-length symbols flow across the literal/distance boundary,
        // so both vectors are read as one
        let mut lengths = [TreeEntry::default(); LitLenAlphabet::COUNT + DistAlphabet::COUNT];
        if meta.read_code_lengths(hlit + hdist, &mut lengths, &mut self.bits)?.is_none() {
          return Ok(StepOutcome::Stalled);
        }

        let mut lit_len = LitLenAlphabet::default();
        lit_len.tree[..hlit].copy_from_slice(&lengths[..hlit]);
        lit_len.refresh()?;
        let mut dist = DistAlphabet::default();
        dist.tree[..hdist].copy_from_slice(&lengths[hlit..hlit + hdist]);
        dist.refresh()?;

        self.lit_len = lit_len;
        self.dist = dist;
        self.stage = Stage::Symbols;
        Ok(StepOutcome::Progress)
      }
      Stage::Symbols => {
        let Some(symbol) = self.lit_len.pull_and_match(&mut self.bits)? else {
          return Ok(StepOutcome::Stalled);
        };
        if symbol < 256 {
          self.emit(symbol as u8);
          return Ok(StepOutcome::Progress);
        }
        if symbol == 256 {
          self.stage =
            if self.final_block { self.after_final_block() } else { Stage::BlockHeader };
          return Ok(StepOutcome::Progress);
        }
        if symbol > 285 {
          return Err(InflationError::InvalidSymbol.into());
        }
        let (len_base, len_extra) = LENGTH_TABLE[symbol - 257];
        let length = len_base as usize + pull_bits!(self.bits.next_bits_lsb(len_extra)) as usize;

        if self.dist.is_empty() {
          return Err(InflationError::InvalidDistance.into());
        }
        let Some(dist_symbol) = self.dist.pull_and_match(&mut self.bits)? else {
          return Ok(StepOutcome::Stalled);
        };
        if dist_symbol > 29 {
          return Err(InflationError::InvalidDistance.into());
        }
        let (dist_base, dist_extra) = DIST_TABLE[dist_symbol];
        let distance =
          dist_base as usize + pull_bits!(self.bits.next_bits_lsb(dist_extra)) as usize;
        if distance as u64 > self.emitted {
          return Err(InflationError::InvalidDistance.into());
        }

        for _ in 0..length {
          let byte = self.window[(self.window_pos + WINDOW_SIZE - distance) % WINDOW_SIZE];
          self.emit(byte);
        }
        Ok(StepOutcome::Progress)
      }
      Stage::Trailer => {
        self.bits.align_to_byte();
        let mut declared = 0_u32;
        for _ in 0..4 {
          declared = (declared << 8) | pull_bits!(self.bits.next_bits_lsb(8));
        }
        let computed = self.mrc.finish();
        if declared != computed {
          return Err(InflationError::ChecksumMismatch { declared, computed }.into());
        }
        log::trace!("zlib stream complete, {} bytes decoded", self.emitted);
        self.stage = Stage::Done;
        Ok(StepOutcome::Progress)
      }
      Stage::Done => Ok(StepOutcome::Finished),
    }
  }
}

/// Inflates one complete in-memory stream, mostly for the compressed
/// payloads of `iCCP`/`zTXt`/`iTXt` chunks.
pub(crate) fn inflate_all(bytes: &[u8], format: InflateFormat) -> PngResult<Vec<u8>> {
  let mut inflator = Inflator::new(format);
  match inflator.push(bytes)? {
    InflateStatus::Complete => Ok(inflator.pull_all()),
    InflateStatus::NeedMore => Err(InflationError::TruncatedStream.into()),
  }
}
