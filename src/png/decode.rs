use super::*;

/// The 8 bytes every PNG datastream starts with.
pub(crate) const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// What a [`Decoder::push`] accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
  /// The stream isn't finished; push more bytes when you have them.
  NeedMore,
  /// `IEND` went by and the [`Image`] is ready to take.
  Done,
}

/// A fully decoded PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
  /// Width in pixels.
  pub width: u32,
  /// Height in pixels.
  pub height: u32,
  /// The resolved color description plus interlacing flag.
  pub layout: Layout,
  /// Everything the ancillary chunks had to say.
  pub metadata: Metadata,
  /// The reconstructed samples: row-major from the top left, tightly
  /// bit-packed at the pixel volume, `ceil(width * height * volume / 8)`
  /// bytes.
  pub storage: Vec<u8>,
}

impl Image {
  /// Converts the storage into one pixel value per image position, top-left
  /// row major.
  ///
  /// Any [`ColorTarget`] works for any image: palette entries deindex,
  /// chroma keys become alpha, and bit depths requantize to the target.
  #[must_use]
  pub fn unpack<T: ColorTarget>(&self) -> Vec<T> {
    unpack_storage(&self.storage, &self.layout.format, self.width, self.height)
  }
}

/// Decodes a PNG that's fully in memory.
///
/// The one-shot version of [`Decoder`]: feeds everything, then either hands
/// back the [`Image`] or the first error the stream hit.
pub fn decode(bytes: &[u8]) -> PngResult<Image> {
  let mut decoder = Decoder::new();
  decoder.push(bytes)?;
  decoder.finish()
}

/// Buffers incoming bytes and frames chunks off the front.
#[derive(Debug, Default)]
struct ChunkBuffer {
  bytes: Vec<u8>,
  consumed: usize,
}

impl ChunkBuffer {
  fn extend(&mut self, more: &[u8]) {
    self.bytes.extend_from_slice(more);
  }

  fn rest(&self) -> &[u8] {
    &self.bytes[self.consumed..]
  }

  fn remaining(&self) -> usize {
    self.bytes.len() - self.consumed
  }

  /// Drops consumed bytes so the buffer only ever holds the partial tail.
  fn compact(&mut self) {
    if self.consumed > 0 {
      self.bytes.drain(..self.consumed);
      self.consumed = 0;
    }
  }

  /// Consumes the signature once 8 bytes are buffered.
  fn take_signature(&mut self) -> PngResult<Option<()>> {
    if self.remaining() < 8 {
      return Ok(None);
    }
    let signature: [u8; 8] = self.rest()[..8].try_into().unwrap();
    if signature != PNG_SIGNATURE {
      return Err(LexingError::InvalidSignature(signature).into());
    }
    self.consumed += 8;
    Ok(Some(()))
  }

  fn peek_chunk(&self) -> PngResult<Option<(RawChunk<'_>, usize)>> {
    next_chunk(self.rest())
  }

  fn advance(&mut self, used: usize) {
    self.consumed += used;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeStage {
  Signature,
  FirstChunk { cgbi_seen: bool },
  BeforeImageData,
  ImageData,
  AfterImageData,
  Finished,
}

/// A streaming PNG decoder.
///
/// Feed it byte slices, cut anywhere, with [`push`](Self::push); once it
/// reports [`DecodeStatus::Done`], collect the result with
/// [`finish`](Self::finish). Any error is fatal for this instance.
///
/// Scanlines decompress and unfilter as their bytes arrive, so the memory
/// high-water mark is the final storage plus the inflator's window, not a
/// second full copy of the filtered image.
#[derive(Debug)]
pub struct Decoder {
  lexer: ChunkBuffer,
  state: DecodeState,
}

impl Default for Decoder {
  fn default() -> Self {
    Self::new()
  }
}

impl Decoder {
  /// A decoder at the start of a stream, before the signature.
  #[must_use]
  pub fn new() -> Self {
    Self {
      lexer: ChunkBuffer::default(),
      state: DecodeState {
        stage: DecodeStage::Signature,
        standard: Standard::Png,
        ordering: ChunkOrdering::default(),
        header: None,
        metadata: Metadata::default(),
        palette: None,
        transparency: None,
        background: None,
        format: None,
        inflator: None,
        driver: None,
        storage: Vec::new(),
        image: None,
      },
    }
  }

  /// Feeds the next slice of the stream, decoding as far as it reaches.
  pub fn push(&mut self, bytes: &[u8]) -> PngResult<DecodeStatus> {
    self.lexer.extend(bytes);
    if let DecodeStage::Signature = self.state.stage {
      match self.lexer.take_signature()? {
        Some(()) => self.state.stage = DecodeStage::FirstChunk { cgbi_seen: false },
        None => return Ok(DecodeStatus::NeedMore),
      }
    }
    loop {
      let Decoder { lexer, state } = self;
      if let DecodeStage::Finished = state.stage {
        if lexer.remaining() == 0 {
          return Ok(DecodeStatus::Done);
        }
        // nothing may follow IEND; name the intruder if it frames cleanly
        return match lexer.peek_chunk()? {
          Some((raw, _)) => Err(
            DecodingError::Unexpected { chunk: raw.type_(), after: ChunkType::IEND }.into(),
          ),
          None => Ok(DecodeStatus::NeedMore),
        };
      }
      let step = lexer.peek_chunk()?;
      let used = match step {
        None => {
          lexer.compact();
          return Ok(DecodeStatus::NeedMore);
        }
        Some((raw, used)) => {
          state.process(raw)?;
          used
        }
      };
      self.lexer.advance(used);
    }
  }

  /// Declares the input over and takes the image.
  ///
  /// Reports the right truncation error if the stream wasn't actually
  /// finished.
  pub fn finish(mut self) -> PngResult<Image> {
    match self.state.stage {
      DecodeStage::Finished => {
        if self.lexer.remaining() > 0 {
          // a partial chunk was trailing after IEND
          return Err(truncation_kind(self.lexer.rest()).into());
        }
        // an image is always parked here once the stage is Finished
        Ok(self.state.image.take().unwrap())
      }
      DecodeStage::Signature => Err(LexingError::TruncatedSignature.into()),
      _ => Err(truncation_kind(self.lexer.rest()).into()),
    }
  }
}

#[derive(Debug)]
struct DecodeState {
  stage: DecodeStage,
  standard: Standard,
  ordering: ChunkOrdering,
  header: Option<Header>,
  metadata: Metadata,
  palette: Option<Palette>,
  transparency: Option<Transparency>,
  background: Option<Background>,
  format: Option<Format>,
  inflator: Option<Inflator>,
  driver: Option<ScanlineDriver>,
  storage: Vec<u8>,
  image: Option<Image>,
}

impl DecodeState {
  /// The header, once the stream is past the FirstChunk stage.
  fn header(&self) -> Header {
    self.header.unwrap()
  }

  fn process(&mut self, raw: RawChunk<'_>) -> PngResult<()> {
    log::trace!("chunk {:?}, {} data bytes", raw.type_(), raw.data().len());
    match self.stage {
      DecodeStage::FirstChunk { cgbi_seen } => match raw.type_() {
        ChunkType::CgBI if !cgbi_seen => {
          let _ = PngChunk::try_from(raw)?;
          self.standard = Standard::Ios;
          self.stage = DecodeStage::FirstChunk { cgbi_seen: true };
          Ok(())
        }
        ChunkType::IHDR => {
          let mut header = match PngChunk::try_from(raw)? {
            PngChunk::IHDR(header) => header,
            _ => unreachable!(),
          };
          if self.standard == Standard::Ios {
            header.apply_ios_standard()?;
          }
          log::debug!(
            "header: {}x{} {:?}, interlaced: {}",
            header.width,
            header.height,
            header.pixel,
            header.interlaced
          );
          self.header = Some(header);
          self.stage = DecodeStage::BeforeImageData;
          Ok(())
        }
        other => {
          Err(DecodingError::Required { missing: ChunkType::IHDR, before: other }.into())
        }
      },
      DecodeStage::BeforeImageData | DecodeStage::ImageData | DecodeStage::AfterImageData => {
        self.ordering.admit(raw.type_())?;
        if self.stage == DecodeStage::ImageData && raw.type_() != ChunkType::IDAT {
          // the IDAT run is over, but whether the compressed stream actually
          // finished isn't judged until IEND: a non-contiguous IDAT further
          // on should fail as Unexpected, not as an incomplete stream
          self.stage = DecodeStage::AfterImageData;
        }
        let chunk = PngChunk::try_from(raw)?;
        self.dispatch(chunk)
      }
      DecodeStage::Signature | DecodeStage::Finished => unreachable!(),
    }
  }

  fn dispatch(&mut self, chunk: PngChunk<'_>) -> PngResult<()> {
    let pixel = self.header().pixel;
    let palette_len = self.palette.as_ref().map(Palette::len);
    match chunk {
      // the ordering grammar already rejected these as Duplicate/Unexpected
      PngChunk::CgBI | PngChunk::IHDR(_) => unreachable!(),
      PngChunk::PLTE { data } => {
        self.palette = Some(Palette::from_data(data, pixel)?);
      }
      PngChunk::tRNS { data } => {
        if pixel.is_indexed() && palette_len.is_none() {
          return Err(
            DecodingError::Required { missing: ChunkType::PLTE, before: ChunkType::tRNS }.into(),
          );
        }
        self.transparency = Some(Transparency::from_data(data, pixel, palette_len)?);
      }
      PngChunk::bKGD { data } => {
        if pixel.is_indexed() && palette_len.is_none() {
          return Err(
            DecodingError::Required { missing: ChunkType::PLTE, before: ChunkType::bKGD }.into(),
          );
        }
        self.background = Some(Background::from_data(data, pixel, palette_len)?);
      }
      PngChunk::sBIT { data } => {
        self.metadata.significant_bits = Some(SignificantBits::from_data(data, pixel)?);
      }
      PngChunk::hIST { data } => {
        let entries: &[[u8; 2]] = cast_slice(data);
        if Some(entries.len()) != palette_len {
          return Err(ParsingError::InvalidHistogram.into());
        }
        self.metadata.histogram = Some(entries.iter().map(|&e| u16::from_be_bytes(e)).collect());
      }
      PngChunk::cHRM(chromaticity) => self.metadata.chromaticity = Some(chromaticity),
      PngChunk::gAMA { gamma } => self.metadata.gamma = Some(gamma),
      PngChunk::sRGB(intent) => self.metadata.intent = Some(intent),
      PngChunk::iCCP { name, zlib_data } => {
        let data = inflate_all(zlib_data, InflateFormat::Zlib)?;
        self.metadata.profile = Some(ColorProfile { name: name.to_vec(), data });
      }
      PngChunk::pHYs(dimensions) => self.metadata.dimensions = Some(dimensions),
      PngChunk::sPLT(raw) => self.metadata.suggested_palettes.push(SuggestedPalette {
        name: raw.name.to_vec(),
        sample_depth: raw.sample_depth,
        entries: raw.entries.to_vec(),
      }),
      PngChunk::tIME(time) => self.metadata.time = Some(time),
      PngChunk::tEXt { keyword, text } => self.metadata.texts.push(TextChunk {
        keyword: keyword.to_vec(),
        language: None,
        translated: None,
        text: text.to_vec(),
      }),
      PngChunk::zTXt { keyword, zlib_data } => {
        let text = inflate_all(zlib_data, InflateFormat::Zlib)?;
        self.metadata.texts.push(TextChunk {
          keyword: keyword.to_vec(),
          language: None,
          translated: None,
          text,
        });
      }
      PngChunk::iTXt { keyword, compressed, language, translated, text } => {
        let text = if compressed {
          let inflated = inflate_all(text, InflateFormat::Zlib)?;
          if core::str::from_utf8(&inflated).is_err() {
            return Err(TextError::InvalidUtf8.into());
          }
          inflated
        } else {
          text.to_vec()
        };
        self.metadata.texts.push(TextChunk {
          keyword: keyword.to_vec(),
          language: Some(language.to_vec()),
          translated: Some(String::from(translated)),
          text,
        });
      }
      PngChunk::IDAT { data } => self.feed_idat(data)?,
      PngChunk::IEND => {
        self.end_image_data()?;
        self.finish_stream();
      }
      PngChunk::Unknown { type_, data } => self.metadata.unknown.push((type_, data.to_vec())),
    }
    Ok(())
  }

  fn feed_idat(&mut self, data: &[u8]) -> PngResult<()> {
    if self.stage == DecodeStage::BeforeImageData {
      self.begin_image_data()?;
    }
    let (Some(inflator), Some(driver)) = (self.inflator.as_mut(), self.driver.as_mut()) else {
      unreachable!()
    };
    inflator.push(data)?;
    driver.drive(inflator, &mut self.storage)
  }

  /// First `IDAT`: lock in the color format and set up the image pipeline.
  fn begin_image_data(&mut self) -> PngResult<()> {
    let header = self.header();
    let format = Format::resolve(
      &header,
      self.standard,
      self.palette.as_ref(),
      self.transparency.as_ref(),
      self.background,
    )?;
    log::debug!("image data starts, format {:?} / {:?}", format.pixel, format.standard);
    self.storage = vec![0; header.storage_len()];
    self.driver = Some(ScanlineDriver::new(&header));
    self.inflator = Some(Inflator::new(match self.standard {
      Standard::Png => InflateFormat::Zlib,
      Standard::Ios => InflateFormat::Ios,
    }));
    self.format = Some(format);
    self.stage = DecodeStage::ImageData;
    Ok(())
  }

  /// The `IDAT` run is over: the compressed stream must have terminated,
  /// produced every scanline, and nothing more.
  fn end_image_data(&mut self) -> PngResult<()> {
    let (Some(inflator), Some(driver)) = (self.inflator.as_mut(), self.driver.as_mut()) else {
      unreachable!()
    };
    driver.drive(inflator, &mut self.storage)?;
    if !inflator.is_complete() || !driver.is_done() {
      return Err(DecodingError::IncompleteImageDataCompressedDatastream.into());
    }
    if inflator.available() > 0 {
      return Err(DecodingError::ExtraneousImageData.into());
    }
    Ok(())
  }

  fn finish_stream(&mut self) {
    let header = self.header();
    // IEND is only admitted after an IDAT run, which resolved the format
    let format = self.format.take().unwrap();
    let image = Image {
      width: header.width,
      height: header.height,
      layout: Layout { format, interlaced: header.interlaced },
      metadata: core::mem::take(&mut self.metadata),
      storage: core::mem::take(&mut self.storage),
    };
    log::debug!("decode complete: {} storage bytes", image.storage.len());
    self.image = Some(image);
    self.stage = DecodeStage::Finished;
  }
}

/// Pulls scanlines out of the inflator as they become available, unfilters
/// them against the previous line, and scatters the samples into storage.
///
/// The pass loop suspends wherever the data runs out: the current pass,
/// row, and previous line survive between [`drive`](Self::drive) calls.
#[derive(Debug)]
struct ScanlineDriver {
  width: u32,
  height: u32,
  pixel: PixelFormat,
  interlaced: bool,
  pass: usize,
  row: u32,
  prev: Vec<u8>,
  row_buf: Vec<u8>,
  done: bool,
}

impl ScanlineDriver {
  fn new(header: &Header) -> Self {
    let mut driver = Self {
      width: header.width,
      height: header.height,
      pixel: header.pixel,
      interlaced: header.interlaced,
      pass: 0,
      row: 0,
      prev: Vec::new(),
      row_buf: Vec::new(),
      done: false,
    };
    driver.enter_pass(0);
    driver
  }

  fn pass_count(&self) -> usize {
    if self.interlaced {
      7
    } else {
      1
    }
  }

  fn pass_dims(&self, pass: usize) -> (u32, u32) {
    if self.interlaced {
      pass_dimensions(pass, self.width, self.height)
    } else {
      (self.width, self.height)
    }
  }

  /// Moves to the first non-empty pass at or after `pass`, resetting the
  /// rolling previous-line buffer, or marks the driver done.
  fn enter_pass(&mut self, mut pass: usize) {
    while pass < self.pass_count() {
      let (w, h) = self.pass_dims(pass);
      if w > 0 && h > 0 {
        self.pass = pass;
        self.row = 0;
        let data_len = self.pixel.bytes_per_scanline(w);
        self.prev.clear();
        self.prev.resize(data_len, 0);
        self.row_buf.clear();
        self.row_buf.resize(data_len + 1, 0);
        return;
      }
      pass += 1;
    }
    self.done = true;
  }

  fn is_done(&self) -> bool {
    self.done
  }

  fn drive(&mut self, inflator: &mut Inflator, storage: &mut [u8]) -> PngResult<()> {
    while !self.done {
      if !inflator.pull_into(&mut self.row_buf) {
        return Ok(());
      }
      let (pass_width, pass_height) = self.pass_dims(self.pass);
      let (filter, data) = self.row_buf.split_at_mut(1);
      unfilter_row(filter[0], self.pixel.filter_delay(), &self.prev, data)?;
      deposit_row(
        storage,
        self.pixel,
        self.width,
        self.interlaced,
        self.pass,
        self.row,
        pass_width,
        data,
      );
      self.prev.copy_from_slice(data);
      self.row += 1;
      if self.row == pass_height {
        self.enter_pass(self.pass + 1);
      }
    }
    Ok(())
  }
}

/// Writes one reconstructed line's samples to their final positions.
///
/// Whole-byte pixels copy; sub-byte pixels scatter one at a time through
/// the per-depth shift masks, which an interlaced pass needs anyway because
/// its columns interleave at the bit level.
#[allow(clippy::too_many_arguments)]
fn deposit_row(
  storage: &mut [u8], pixel: PixelFormat, image_width: u32, interlaced: bool, pass: usize,
  row: u32, pass_width: u32, data: &[u8],
) {
  let volume = pixel.volume();
  if volume >= 8 {
    let bytes_per_pixel = (volume / 8) as usize;
    if interlaced {
      for reduced_x in 0..pass_width {
        let (x, y) = pass_position(pass, reduced_x, row);
        let dst = (y as usize * image_width as usize + x as usize) * bytes_per_pixel;
        let src = reduced_x as usize * bytes_per_pixel;
        storage[dst..dst + bytes_per_pixel].copy_from_slice(&data[src..src + bytes_per_pixel]);
      }
    } else {
      let dst = row as usize * image_width as usize * bytes_per_pixel;
      let line = pass_width as usize * bytes_per_pixel;
      storage[dst..dst + line].copy_from_slice(&data[..line]);
    }
  } else {
    for reduced_x in 0..pass_width {
      let sample = read_sample(data, reduced_x as usize, volume);
      let (x, y) =
        if interlaced { pass_position(pass, reduced_x, row) } else { (reduced_x, row) };
      let i = y as usize * image_width as usize + x as usize;
      deposit_packed(storage, i, volume, sample as u8);
    }
  }
}

/// Drops one sub-byte sample into bit-packed `storage` at pixel index `i`.
fn deposit_packed(storage: &mut [u8], i: usize, depth: u32, sample: u8) {
  match depth {
    1 => storage[i >> 3] |= (sample & 0b1) << ((!i) & 7),
    2 => storage[i >> 2] |= (sample & 0b11) << ((((!i) & 3) << 1) & 7),
    _ => storage[i >> 1] |= (sample & 0b1111) << ((((!i) & 1) << 2) & 7),
  }
}
