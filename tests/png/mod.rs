use pngolin::{
  decode, Background, ChromaKey, ChunkType, DecodeStatus, Decoder, DecodingError, InflationError,
  LexingError, PixelFormat, PngError, Standard, RGB8, RGBA8, Y8,
};

use super::{build_png, chunk, deflate_stored, ihdr, rand_bytes};

/// filter-0 scanlines, concatenated and wrapped in a zlib stream
fn idat_stored(rows: &[&[u8]]) -> Vec<u8> {
  let mut filtered = Vec::new();
  for row in rows {
    filtered.push(0);
    filtered.extend_from_slice(row);
  }
  chunk(b"IDAT", &deflate_stored(&filtered))
}

fn iend() -> Vec<u8> {
  chunk(b"IEND", &[])
}

#[test]
fn minimal_1x1_rgba8() {
  let png = build_png(&[ihdr(1, 1, 8, 6, 0), idat_stored(&[&[1, 2, 3, 4]]), iend()]);
  let image = decode(&png).unwrap();
  assert_eq!(image.width, 1);
  assert_eq!(image.height, 1);
  assert_eq!(image.storage, [1, 2, 3, 4]);
  assert_eq!(image.unpack::<RGBA8>(), [RGBA8 { r: 1, g: 2, b: 3, a: 4 }]);
}

#[test]
fn every_direct_pixel_format_decodes_a_single_pixel() {
  // one pixel per format; sub-byte rows keep the sample in the top bits so
  // the packed storage equals the packed row
  let cases: [(u8, u8, &[u8]); 10] = [
    (1, 0, &[0x80]),
    (2, 0, &[0x40]),
    (4, 0, &[0x70]),
    (8, 0, &[0x12]),
    (16, 0, &[0x12, 0x34]),
    (8, 2, &[1, 2, 3]),
    (16, 2, &[1, 2, 3, 4, 5, 6]),
    (8, 4, &[9, 8]),
    (16, 4, &[1, 2, 3, 4]),
    (8, 6, &[1, 2, 3, 4]),
  ];
  for (depth, color_type, row) in cases {
    let png = build_png(&[ihdr(1, 1, depth, color_type, 0), idat_stored(&[row]), iend()]);
    let image = decode(&png).unwrap_or_else(|e| panic!("depth {depth} color {color_type}: {e:?}"));
    assert_eq!(image.storage, row, "depth {depth} color {color_type}");
  }
}

#[test]
fn two_by_two_indexed1() {
  let palette = chunk(b"PLTE", &[0, 0, 0, 255, 255, 255]);
  let png = build_png(&[
    ihdr(2, 2, 1, 3, 0),
    palette,
    idat_stored(&[&[0b1000_0000], &[0b0100_0000]]),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  // samples 1,0,0,1 in row-major order, bit packed
  assert_eq!(image.storage, [0b1001_0000]);
  let black = RGBA8 { r: 0, g: 0, b: 0, a: 255 };
  let white = RGBA8 { r: 255, g: 255, b: 255, a: 255 };
  assert_eq!(image.unpack::<RGBA8>(), [white, black, black, white]);
}

#[test]
fn a_flipped_payload_bit_fails_the_chunk_checksum() {
  let mut png = build_png(&[ihdr(1, 1, 8, 0, 0), idat_stored(&[&[7]]), iend()]);
  // corrupt one bit inside the IHDR payload (byte 8 of the stream is the
  // length, 16 is the width)
  png[18] ^= 0x01;
  assert!(matches!(
    decode(&png),
    Err(PngError::Lexing(LexingError::InvalidChunkChecksum { chunk: ChunkType::IHDR, .. }))
  ));
}

#[test]
fn indexed_without_a_palette_is_missing_plte() {
  let png = build_png(&[ihdr(1, 1, 8, 3, 0), idat_stored(&[&[0]]), iend()]);
  assert_eq!(
    decode(&png),
    Err(PngError::Decoding(DecodingError::Required {
      missing: ChunkType::PLTE,
      before: ChunkType::IDAT
    }))
  );
}

#[test]
fn non_contiguous_idat_runs_are_rejected() {
  let stream = deflate_stored(&[0, 7]);
  let (first, second) = stream.split_at(4);
  let png = build_png(&[
    ihdr(1, 1, 8, 0, 0),
    chunk(b"IDAT", first),
    chunk(b"tEXt", b"Comment\0hello"),
    chunk(b"IDAT", second),
    iend(),
  ]);
  assert_eq!(
    decode(&png),
    Err(PngError::Decoding(DecodingError::Unexpected {
      chunk: ChunkType::IDAT,
      after: ChunkType::IDAT
    }))
  );
}

#[test]
fn idat_may_split_anywhere_even_byte_by_byte() {
  let stream = deflate_stored(&[0, 1, 2, 0, 3, 4]);
  let idats: Vec<Vec<u8>> =
    stream.iter().map(|byte| chunk(b"IDAT", core::slice::from_ref(byte))).collect();
  let mut chunks = vec![ihdr(2, 2, 8, 0, 0)];
  chunks.extend(idats);
  chunks.push(iend());
  let image = decode(&build_png(&chunks)).unwrap();
  assert_eq!(image.storage, [1, 2, 3, 4]);
}

#[test]
fn the_decoder_accepts_one_byte_at_a_time() {
  let png = build_png(&[
    ihdr(2, 2, 8, 0, 0),
    chunk(b"gAMA", &45_455_u32.to_be_bytes()),
    idat_stored(&[&[1, 2], &[3, 4]]),
    iend(),
  ]);
  let mut decoder = Decoder::new();
  let mut status = DecodeStatus::NeedMore;
  for byte in png.iter() {
    status = decoder.push(core::slice::from_ref(byte)).unwrap();
  }
  assert_eq!(status, DecodeStatus::Done);
  let image = decoder.finish().unwrap();
  assert_eq!(image.storage, [1, 2, 3, 4]);
  assert_eq!(image.metadata.gamma, Some(45_455));
  assert_eq!(decode(&png).unwrap(), image);
}

#[test]
fn ios_cgbi_stores_bgr_and_a_bare_deflate_stream() {
  // a red pixel, stored blue-first
  let filtered = [0, 0x00, 0x10, 0xFF];
  let raw = miniz_oxide::deflate::compress_to_vec(&filtered, 6);
  let png = build_png(&[
    chunk(b"CgBI", &[0x50, 0x00, 0x20, 0x06]),
    ihdr(1, 1, 8, 2, 0),
    chunk(b"IDAT", &raw),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  assert_eq!(image.layout.format.standard, Standard::Ios);
  assert_eq!(image.layout.format.pixel, PixelFormat::BGR8);
  assert_eq!(image.unpack::<RGBA8>(), [RGBA8 { r: 0xFF, g: 0x10, b: 0x00, a: 255 }]);
}

#[test]
fn ios_only_allows_rgb8_and_rgba8() {
  let png = build_png(&[
    chunk(b"CgBI", &[0x50, 0x00, 0x20, 0x02]),
    ihdr(1, 1, 8, 0, 0),
    idat_stored(&[&[9]]),
    iend(),
  ]);
  assert!(matches!(decode(&png), Err(PngError::Parsing(_))));
}

fn pack_bits(samples: &[u8], depth: u32) -> Vec<u8> {
  let per_byte = 8 / depth as usize;
  let mut out = Vec::new();
  for group in samples.chunks(per_byte) {
    let mut byte = 0_u8;
    for (i, &s) in group.iter().enumerate() {
      byte |= s << (8 - depth as usize * (i + 1));
    }
    out.push(byte);
  }
  out
}

const PASS_BASE: [(u32, u32); 7] = [(0, 0), (4, 0), (0, 4), (2, 0), (0, 2), (1, 0), (0, 1)];
const PASS_EXP: [(u32, u32); 7] = [(3, 3), (3, 3), (2, 3), (2, 2), (1, 2), (1, 1), (0, 1)];

/// Builds the filtered Adam7 representation of a single-channel image.
fn interlaced_rows(width: u32, height: u32, depth: u32, sample: impl Fn(u32, u32) -> u8) -> Vec<u8> {
  let mut out = Vec::new();
  for pass in 0..7 {
    let (bx, by) = PASS_BASE[pass];
    let (ex, ey) = PASS_EXP[pass];
    let w = (width + (1 << ex) - bx - 1) >> ex;
    let h = (height + (1 << ey) - by - 1) >> ey;
    if w == 0 || h == 0 {
      continue;
    }
    for ry in 0..h {
      let samples: Vec<u8> = (0..w).map(|rx| sample(bx + (rx << ex), by + (ry << ey))).collect();
      out.push(0);
      out.extend_from_slice(&pack_bits(&samples, depth));
    }
  }
  out
}

#[test]
fn interlaced_and_straight_decodes_agree() {
  // 5x3 means several Adam7 passes are empty
  let (width, height) = (5_u32, 3_u32);
  let sample = |x: u32, y: u32| (10 * x + y) as u8;
  let straight_rows: Vec<Vec<u8>> =
    (0..height).map(|y| (0..width).map(|x| sample(x, y)).collect()).collect();
  let straight_refs: Vec<&[u8]> = straight_rows.iter().map(|r| &r[..]).collect();
  let straight = decode(&build_png(&[
    ihdr(width, height, 8, 0, 0),
    idat_stored(&straight_refs),
    iend(),
  ]))
  .unwrap();

  let filtered = interlaced_rows(width, height, 8, sample);
  let interlaced = decode(&build_png(&[
    ihdr(width, height, 8, 0, 1),
    chunk(b"IDAT", &deflate_stored(&filtered)),
    iend(),
  ]))
  .unwrap();

  assert_eq!(straight.storage, interlaced.storage);
  assert_eq!(straight.unpack::<Y8>(), interlaced.unpack::<Y8>());
}

#[test]
fn interlaced_sub_byte_depths_scatter_correctly() {
  let (width, height) = (9_u32, 5_u32);
  let sample = |x: u32, y: u32| ((x + y) % 2) as u8;
  let straight_rows: Vec<Vec<u8>> = (0..height)
    .map(|y| pack_bits(&(0..width).map(|x| sample(x, y)).collect::<Vec<u8>>(), 1))
    .collect();
  let straight_refs: Vec<&[u8]> = straight_rows.iter().map(|r| &r[..]).collect();
  let straight = decode(&build_png(&[
    ihdr(width, height, 1, 0, 0),
    idat_stored(&straight_refs),
    iend(),
  ]))
  .unwrap();

  let filtered = interlaced_rows(width, height, 1, sample);
  let interlaced = decode(&build_png(&[
    ihdr(width, height, 1, 0, 1),
    chunk(b"IDAT", &deflate_stored(&filtered)),
    iend(),
  ]))
  .unwrap();

  assert_eq!(straight.storage, interlaced.storage);
  let expected: Vec<Y8> = (0..height)
    .flat_map(|y| (0..width).map(move |x| Y8 { y: sample(x, y) * 255 }))
    .collect();
  assert_eq!(interlaced.unpack::<Y8>(), expected);
}

#[test]
fn sub_byte_rows_ignore_their_padding_bits() {
  // width 3 at depth 1: each row byte has 5 junk-prone padding bits
  let png = build_png(&[
    ihdr(3, 2, 1, 0, 0),
    idat_stored(&[&[0b1010_0000], &[0b0110_0000]]),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  // storage packs rows back to back: 101 011 then two pad bits
  assert_eq!(image.storage, [0b1010_1100]);
  let on = Y8 { y: 255 };
  let off = Y8 { y: 0 };
  assert_eq!(image.unpack::<Y8>(), [on, off, on, off, on, on]);
}

#[test]
fn filters_reconstruct_against_previous_rows() {
  // row 0: filter 2 (Up) against an implied zero row; row 1: filter 4
  // (Paeth); row 2: filter 3 (Average)
  let filtered: Vec<u8> = [
    &[2, 10, 20, 30][..],
    &[4, 5, 5, 5][..],
    &[3, 8, 8, 8][..],
  ]
  .concat();
  let png = build_png(&[
    ihdr(3, 3, 8, 0, 0),
    chunk(b"IDAT", &deflate_stored(&filtered)),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  // row 0: 10 20 30
  // row 1 (paeth): 15, then a=15 b=20 c=10 -> +20 = 25, then a=25 b=30 c=20 -> +30 = 35
  // row 2 (average): 8+15/2=15, 8+(15+25)/2=28, 8+(28+35)/2=39
  assert_eq!(image.storage, [10, 20, 30, 15, 25, 35, 15, 28, 39]);
}

#[test]
fn palette_boundaries_and_last_entry_lookups() {
  // 256 entries, every pixel pointing at the last one
  let mut palette = Vec::new();
  for i in 0..=255_u8 {
    palette.extend_from_slice(&[i, i.wrapping_add(1), i.wrapping_add(2)]);
  }
  let png = build_png(&[
    ihdr(2, 1, 8, 3, 0),
    chunk(b"PLTE", &palette),
    idat_stored(&[&[255, 255]]),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  let expected = RGBA8 { r: 255, g: 0, b: 1, a: 255 };
  assert_eq!(image.unpack::<RGBA8>(), [expected, expected]);

  // a single-entry palette works too
  let png = build_png(&[
    ihdr(1, 1, 8, 3, 0),
    chunk(b"PLTE", &[9, 8, 7]),
    idat_stored(&[&[0]]),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  assert_eq!(image.unpack::<RGB8>(), [RGB8 { r: 9, g: 8, b: 7 }]);
}

#[test]
fn transparency_backgrounds_and_histograms_resolve() {
  let png = build_png(&[
    ihdr(2, 1, 8, 3, 0),
    chunk(b"PLTE", &[1, 2, 3, 4, 5, 6]),
    chunk(b"tRNS", &[0x80]),
    chunk(b"bKGD", &[1]),
    chunk(b"hIST", &[0, 3, 0, 9]),
    idat_stored(&[&[0, 1]]),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  assert_eq!(
    image.unpack::<RGBA8>(),
    [RGBA8 { r: 1, g: 2, b: 3, a: 0x80 }, RGBA8 { r: 4, g: 5, b: 6, a: 255 }]
  );
  assert_eq!(image.layout.format.background, Some(Background::Index { i: 1 }));
  assert_eq!(image.metadata.histogram, Some(vec![3, 9]));
}

#[test]
fn gray_chroma_key_becomes_transparency() {
  let png = build_png(&[
    ihdr(2, 1, 8, 0, 0),
    chunk(b"tRNS", &[0x00, 0x40]),
    idat_stored(&[&[0x40, 0x41]]),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  assert_eq!(image.layout.format.key, Some(ChromaKey::Gray { v: 0x40 }));
  let pixels = image.unpack::<RGBA8>();
  assert_eq!(pixels[0].a, 0);
  assert_eq!(pixels[1].a, 255);
}

#[test]
fn metadata_chunks_all_land() {
  let profile_bytes = b"fake icc profile data".to_vec();
  let png = build_png(&[
    ihdr(1, 1, 8, 0, 0),
    chunk(b"gAMA", &45_455_u32.to_be_bytes()),
    chunk(b"sRGB", &[0]),
    chunk(
      b"iCCP",
      &[b"profile\0\0".to_vec(), miniz_oxide::deflate::compress_to_vec_zlib(&profile_bytes, 6)]
        .concat(),
    ),
    chunk(b"pHYs", &[0, 0, 0x0B, 0x12, 0, 0, 0x0B, 0x12, 1]),
    idat_stored(&[&[0]]),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  assert_eq!(image.metadata.gamma, Some(45_455));
  assert_eq!(
    image.metadata.intent,
    Some(pngolin::png::RenderingIntent::Perceptual)
  );
  let profile = image.metadata.profile.as_ref().unwrap();
  assert_eq!(profile.name, b"profile");
  assert_eq!(profile.data, profile_bytes);
  let dims = image.metadata.dimensions.unwrap();
  assert_eq!((dims.ppu_x, dims.ppu_y, dims.is_meters), (2834, 2834, true));
}

#[test]
fn text_chunks_after_the_image_data_are_kept() {
  let ztxt_body = miniz_oxide::deflate::compress_to_vec_zlib(b"compressed text", 6);
  let png = build_png(&[
    ihdr(1, 1, 8, 0, 0),
    idat_stored(&[&[0]]),
    chunk(b"tEXt", b"Title\0plain text"),
    chunk(b"zTXt", &[b"Comment\0\0".to_vec(), ztxt_body].concat()),
    chunk(b"iTXt", b"Label\0\x00\x00en\0Etikett\0utf8 text"),
    chunk(b"tIME", &[0x07, 0xE7, 6, 15, 12, 30, 59]),
    chunk(b"prVt", &[1, 2, 3]),
    iend(),
  ]);
  let image = decode(&png).unwrap();
  let texts = &image.metadata.texts;
  assert_eq!(texts.len(), 3);
  assert_eq!(texts[0].keyword, b"Title");
  assert_eq!(texts[0].text, b"plain text");
  assert_eq!(texts[1].text, b"compressed text");
  assert_eq!(texts[2].language.as_deref(), Some(&b"en"[..]));
  assert_eq!(texts[2].translated.as_deref(), Some("Etikett"));
  assert_eq!(texts[2].text, b"utf8 text");
  assert_eq!(image.metadata.time.unwrap().year, 2023);
  assert_eq!(image.metadata.unknown, vec![(ChunkType(*b"prVt"), vec![1, 2, 3])]);
}

#[test]
fn ancillary_chunks_may_not_follow_idat_unless_allowed() {
  let png = build_png(&[
    ihdr(1, 1, 8, 0, 0),
    idat_stored(&[&[7]]),
    chunk(b"gAMA", &45_455_u32.to_be_bytes()),
    iend(),
  ]);
  assert_eq!(
    decode(&png),
    Err(PngError::Decoding(DecodingError::Unexpected {
      chunk: ChunkType::gAMA,
      after: ChunkType::IDAT
    }))
  );
}

#[test]
fn an_incomplete_compressed_stream_is_fatal() {
  // the zlib stream decodes to 1 byte, the 1x1 gray image needs 2
  let png = build_png(&[ihdr(1, 1, 8, 0, 0), chunk(b"IDAT", &deflate_stored(&[0])), iend()]);
  assert_eq!(
    decode(&png),
    Err(PngError::Decoding(DecodingError::IncompleteImageDataCompressedDatastream))
  );
}

#[test]
fn leftover_decompressed_bytes_are_fatal() {
  let png = build_png(&[
    ihdr(1, 1, 8, 0, 0),
    chunk(b"IDAT", &deflate_stored(&[0, 7, 99])),
    iend(),
  ]);
  assert_eq!(decode(&png), Err(PngError::Decoding(DecodingError::ExtraneousImageData)));
}

#[test]
fn a_corrupt_adler_trailer_is_fatal() {
  let mut stream = deflate_stored(&[0, 7]);
  let last = stream.len() - 1;
  stream[last] ^= 0xFF;
  let png = build_png(&[ihdr(1, 1, 8, 0, 0), chunk(b"IDAT", &stream), iend()]);
  assert!(matches!(
    decode(&png),
    Err(PngError::Inflation(InflationError::ChecksumMismatch { .. }))
  ));
}

#[test]
fn every_truncation_point_reports_an_error_not_a_panic() {
  let png = build_png(&[ihdr(1, 1, 8, 0, 0), idat_stored(&[&[7]]), iend()]);
  assert!(decode(&png).is_ok());
  for cut in 0..png.len() {
    let got = decode(&png[..cut]);
    assert!(got.is_err(), "cut at {cut} decoded anyway");
  }
  // signature truncation and corruption specifically
  assert_eq!(decode(&png[..4]), Err(PngError::Lexing(LexingError::TruncatedSignature)));
  let mut bad = png.clone();
  bad[0] = b'X';
  assert!(matches!(decode(&bad), Err(PngError::Lexing(LexingError::InvalidSignature(_)))));
}

#[test]
fn random_bytes_never_panic_the_decoder() {
  for _ in 0..20 {
    let mut garbage = rand_bytes(256);
    let _ = decode(&garbage);
    // same bytes behind a real signature
    let mut signed = vec![137, 80, 78, 71, 13, 10, 26, 10];
    signed.append(&mut garbage);
    let _ = decode(&signed);
  }
}

#[test]
fn nothing_may_follow_iend() {
  let mut png = build_png(&[ihdr(1, 1, 8, 0, 0), idat_stored(&[&[7]]), iend()]);
  let trailing = chunk(b"tEXt", b"Comment\0x");
  png.extend_from_slice(&trailing);
  let mut decoder = Decoder::new();
  let got = decoder.push(&png);
  assert_eq!(
    got,
    Err(PngError::Decoding(DecodingError::Unexpected {
      chunk: ChunkType::tEXt,
      after: ChunkType::IEND
    }))
  );
}

#[test]
fn storage_length_always_matches_the_header_formula() {
  let cases = [(3_u32, 2_u32, 1_u8, 0_u8), (5, 1, 2, 0), (3, 3, 4, 0), (2, 2, 16, 2)];
  for (w, h, depth, color) in cases {
    let channels: u32 = if color == 2 { 3 } else { 1 };
    let volume = depth as u32 * channels;
    let row_len = ((w * volume + 7) / 8) as usize;
    let rows: Vec<Vec<u8>> = (0..h).map(|_| vec![0x5A; row_len]).collect();
    let row_refs: Vec<&[u8]> = rows.iter().map(|r| &r[..]).collect();
    let png = build_png(&[ihdr(w, h, depth, color, 0), idat_stored(&row_refs), iend()]);
    let image = decode(&png).unwrap();
    let expected = ((w as usize * h as usize * volume as usize) + 7) / 8;
    assert_eq!(image.storage.len(), expected, "{w}x{h} depth {depth} color {color}");
  }
}
