use pngolin::{
  DecodingError, InflateFormat, InflateStatus, InflationError, Inflator, PngError,
};

use super::{deflate_stored, rand_bytes};

#[test]
fn stored_blocks_round_trip() {
  let data: Vec<u8> = (0..100_000_u32).map(|i| (i % 251) as u8).collect();
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  assert_eq!(inflator.push(&deflate_stored(&data)).unwrap(), InflateStatus::Complete);
  assert_eq!(inflator.pull_all(), data);
}

#[test]
fn the_empty_zlib_stream_decodes_to_nothing() {
  // fixed-huffman block holding only the end-of-block symbol
  let stream = [0x78, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01];
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  assert_eq!(inflator.push(&stream).unwrap(), InflateStatus::Complete);
  assert_eq!(inflator.pull_all(), Vec::<u8>::new());
}

#[test]
fn compressed_streams_round_trip() {
  // lots of redundancy, so the compressor leans on back-references
  let mut data = Vec::new();
  for i in 0..5_000_u32 {
    data.extend_from_slice(b"the quick brown fox ");
    data.push((i % 256) as u8);
  }
  for level in [1, 6, 10] {
    let stream = miniz_oxide::deflate::compress_to_vec_zlib(&data, level);
    let mut inflator = Inflator::new(InflateFormat::Zlib);
    assert_eq!(inflator.push(&stream).unwrap(), InflateStatus::Complete, "level {level}");
    assert_eq!(inflator.pull_all(), data, "level {level}");
  }
}

#[test]
fn single_byte_pushes_reach_the_same_answer() {
  let data: Vec<u8> = (0..4_096_u32).map(|i| (i * 7 % 256) as u8).collect();
  let stream = miniz_oxide::deflate::compress_to_vec_zlib(&data, 6);
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  let mut out = Vec::new();
  for (i, byte) in stream.iter().enumerate() {
    let status = inflator.push(core::slice::from_ref(byte)).unwrap();
    if i + 1 < stream.len() {
      assert_eq!(status, InflateStatus::NeedMore);
    } else {
      assert_eq!(status, InflateStatus::Complete);
    }
    out.extend_from_slice(&inflator.pull_all());
  }
  assert_eq!(out, data);
}

#[test]
fn pull_waits_for_enough_bytes() {
  let data = [7_u8; 10];
  let stream = deflate_stored(&data);
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  // just the zlib header and the stored-block header: nothing decoded yet
  assert_eq!(inflator.push(&stream[..7]).unwrap(), InflateStatus::NeedMore);
  assert_eq!(inflator.pull(1), None);
  // three stored bytes arrive
  inflator.push(&stream[7..10]).unwrap();
  assert_eq!(inflator.available(), 3);
  assert_eq!(inflator.pull(4), None);
  assert_eq!(inflator.pull(2), Some(vec![7, 7]));
  inflator.push(&stream[10..]).unwrap();
  assert!(inflator.is_complete());
  assert_eq!(inflator.pull_all(), [7; 8]);
}

#[test]
fn ios_streams_have_no_wrapper() {
  let data = b"bare deflate, no header, no trailer".to_vec();
  let stream = miniz_oxide::deflate::compress_to_vec(&data, 6);
  let mut inflator = Inflator::new(InflateFormat::Ios);
  assert_eq!(inflator.push(&stream).unwrap(), InflateStatus::Complete);
  assert_eq!(inflator.pull_all(), data);
}

#[test]
fn bad_zlib_headers_are_rejected() {
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  // compression method 7
  let got = inflator.push(&[0x77, 0x9C]);
  assert!(matches!(got, Err(PngError::Inflation(InflationError::InvalidZlibHeader(..)))));
  // bad check bits
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  let got = inflator.push(&[0x78, 0x02]);
  assert!(matches!(got, Err(PngError::Inflation(InflationError::InvalidZlibHeader(..)))));
  // preset dictionary requested (0x78 0x20 passes the mod-31 check)
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  let got = inflator.push(&[0x78, 0x20]);
  assert!(matches!(got, Err(PngError::Inflation(InflationError::InvalidZlibHeader(..)))));
}

#[test]
fn reserved_block_type_is_rejected() {
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  // valid header, then BFINAL=1 BTYPE=11
  let got = inflator.push(&[0x78, 0x01, 0b0000_0111]);
  assert_eq!(got, Err(PngError::Inflation(InflationError::InvalidBlockType)));
}

#[test]
fn stored_length_complement_is_checked() {
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  let got = inflator.push(&[0x78, 0x01, 0x01, 0x02, 0x00, 0x00, 0x00]);
  assert!(matches!(
    got,
    Err(PngError::Inflation(InflationError::InvalidStoredLengths { len: 2, .. }))
  ));
}

#[test]
fn a_back_reference_past_the_start_is_rejected() {
  // fixed block whose first symbol is a length/distance pair: nothing has
  // been emitted yet, so any distance is too far
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  let got = inflator.push(&[0x78, 0x01, 0x03, 0x02]);
  assert_eq!(got, Err(PngError::Inflation(InflationError::InvalidDistance)));
}

#[test]
fn adler_mismatch_is_fatal() {
  let mut stream = deflate_stored(b"payload");
  let last = stream.len() - 1;
  stream[last] ^= 0xFF;
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  let got = inflator.push(&stream);
  assert!(matches!(got, Err(PngError::Inflation(InflationError::ChecksumMismatch { .. }))));
}

#[test]
fn bytes_after_the_stream_end_are_extraneous() {
  let mut stream = deflate_stored(b"xyz");
  stream.push(0);
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  let got = inflator.push(&stream);
  assert_eq!(got, Err(PngError::Decoding(DecodingError::ExtraneousImageDataCompressedData)));

  // same thing split across two pushes
  let stream = deflate_stored(b"xyz");
  let mut inflator = Inflator::new(InflateFormat::Zlib);
  assert_eq!(inflator.push(&stream).unwrap(), InflateStatus::Complete);
  let got = inflator.push(&[0]);
  assert_eq!(got, Err(PngError::Decoding(DecodingError::ExtraneousImageDataCompressedData)));
}

#[test]
fn random_garbage_never_panics_the_inflator() {
  for _ in 0..20 {
    let garbage = rand_bytes(512);
    let mut inflator = Inflator::new(InflateFormat::Zlib);
    let _ = inflator.push(&garbage);
    let _ = inflator.pull_all();
  }
}
