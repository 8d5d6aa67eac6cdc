use super::*;
use bitfrob::u8_replicate_bits;
use bytemuck::{Pod, Zeroable};

/// An 8-bit grayscale pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub struct Y8 {
  /// Gray level.
  pub y: u8,
}
/// A 16-bit grayscale pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub struct Y16 {
  /// Gray level.
  pub y: u16,
}
/// An 8-bit grayscale + alpha pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
#[allow(missing_docs)]
pub struct YA8 {
  pub y: u8,
  pub a: u8,
}
/// A 16-bit grayscale + alpha pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
#[allow(missing_docs)]
pub struct YA16 {
  pub y: u16,
  pub a: u16,
}
/// An RGB pixel, 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}
/// An RGB pixel, 16 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB16 {
  pub r: u16,
  pub g: u16,
  pub b: u16,
}
/// An RGBA pixel, 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}
/// An RGBA pixel, 16 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA16 {
  pub r: u16,
  pub g: u16,
  pub b: u16,
  pub a: u16,
}

unsafe impl Zeroable for Y8 {}
unsafe impl Zeroable for Y16 {}
unsafe impl Zeroable for YA8 {}
unsafe impl Zeroable for YA16 {}
unsafe impl Zeroable for RGB8 {}
unsafe impl Zeroable for RGB16 {}
unsafe impl Zeroable for RGBA8 {}
unsafe impl Zeroable for RGBA16 {}
//
unsafe impl Pod for Y8 {}
unsafe impl Pod for Y16 {}
unsafe impl Pod for YA8 {}
unsafe impl Pod for YA16 {}
unsafe impl Pod for RGB8 {}
unsafe impl Pod for RGB16 {}
unsafe impl Pod for RGBA8 {}
unsafe impl Pod for RGBA16 {}

/// Widens or narrows one channel sample from `depth` bits to 8.
///
/// Going up replicates the bit pattern downward (exactly the
/// `max_target / max_source` quantum multiply); going down keeps the top
/// bits.
#[inline]
fn scale_to_8(v: u16, depth: u32) -> u8 {
  match depth {
    8 => v as u8,
    16 => (v >> 8) as u8,
    _ => u8_replicate_bits(depth, v as u8),
  }
}

/// Widens one channel sample from `depth` bits to 16.
#[inline]
fn scale_to_16(v: u16, depth: u32) -> u16 {
  match depth {
    16 => v,
    _ => v * (u16::MAX / ((1 << depth) - 1)),
  }
}

/// Integer Rec. 601 luma, for unpacking color sources into gray targets.
#[inline]
fn luma(r: u16, g: u16, b: u16) -> u16 {
  ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000) as u16
}

/// A pixel type that [`Image::unpack`](crate::Image::unpack) can produce.
///
/// Implementations exist for gray, gray+alpha, RGB, and RGBA at 8 and 16
/// bits per channel. Every target can unpack every PNG: color collapses to
/// gray through a luma weighting, gray spreads across RGB, missing alpha
/// reads as opaque, and bit depths requantize.
pub trait ColorTarget: Copy {
  /// Builds this value from an 8-bit RGBA palette entry.
  fn from_palette(entry: RGBA8) -> Self;
  /// Builds this value from raw samples at `depth` bits per channel.
  ///
  /// Gray sources pass their value in all three color channels. `a` is the
  /// raw alpha sample, or the depth's maximum when the source has none.
  fn from_raw(r: u16, g: u16, b: u16, a: u16, depth: u32) -> Self;
}

impl ColorTarget for Y8 {
  #[inline]
  fn from_palette(entry: RGBA8) -> Self {
    Y8 { y: luma(entry.r.into(), entry.g.into(), entry.b.into()) as u8 }
  }
  #[inline]
  fn from_raw(r: u16, g: u16, b: u16, _a: u16, depth: u32) -> Self {
    Y8 { y: scale_to_8(luma(r, g, b), depth) }
  }
}
impl ColorTarget for Y16 {
  #[inline]
  fn from_palette(entry: RGBA8) -> Self {
    Y16 { y: scale_to_16(luma(entry.r.into(), entry.g.into(), entry.b.into()), 8) }
  }
  #[inline]
  fn from_raw(r: u16, g: u16, b: u16, _a: u16, depth: u32) -> Self {
    Y16 { y: scale_to_16(luma(r, g, b), depth) }
  }
}
impl ColorTarget for YA8 {
  #[inline]
  fn from_palette(entry: RGBA8) -> Self {
    YA8 { y: Y8::from_palette(entry).y, a: entry.a }
  }
  #[inline]
  fn from_raw(r: u16, g: u16, b: u16, a: u16, depth: u32) -> Self {
    YA8 { y: scale_to_8(luma(r, g, b), depth), a: scale_to_8(a, depth) }
  }
}
impl ColorTarget for YA16 {
  #[inline]
  fn from_palette(entry: RGBA8) -> Self {
    YA16 { y: Y16::from_palette(entry).y, a: scale_to_16(entry.a.into(), 8) }
  }
  #[inline]
  fn from_raw(r: u16, g: u16, b: u16, a: u16, depth: u32) -> Self {
    YA16 { y: scale_to_16(luma(r, g, b), depth), a: scale_to_16(a, depth) }
  }
}
impl ColorTarget for RGB8 {
  #[inline]
  fn from_palette(entry: RGBA8) -> Self {
    RGB8 { r: entry.r, g: entry.g, b: entry.b }
  }
  #[inline]
  fn from_raw(r: u16, g: u16, b: u16, _a: u16, depth: u32) -> Self {
    RGB8 { r: scale_to_8(r, depth), g: scale_to_8(g, depth), b: scale_to_8(b, depth) }
  }
}
impl ColorTarget for RGB16 {
  #[inline]
  fn from_palette(entry: RGBA8) -> Self {
    Self::from_raw(entry.r.into(), entry.g.into(), entry.b.into(), 255, 8)
  }
  #[inline]
  fn from_raw(r: u16, g: u16, b: u16, _a: u16, depth: u32) -> Self {
    RGB16 { r: scale_to_16(r, depth), g: scale_to_16(g, depth), b: scale_to_16(b, depth) }
  }
}
impl ColorTarget for RGBA8 {
  #[inline]
  fn from_palette(entry: RGBA8) -> Self {
    entry
  }
  #[inline]
  fn from_raw(r: u16, g: u16, b: u16, a: u16, depth: u32) -> Self {
    RGBA8 {
      r: scale_to_8(r, depth),
      g: scale_to_8(g, depth),
      b: scale_to_8(b, depth),
      a: scale_to_8(a, depth),
    }
  }
}
impl ColorTarget for RGBA16 {
  #[inline]
  fn from_palette(entry: RGBA8) -> Self {
    Self::from_raw(entry.r.into(), entry.g.into(), entry.b.into(), entry.a.into(), 8)
  }
  #[inline]
  fn from_raw(r: u16, g: u16, b: u16, a: u16, depth: u32) -> Self {
    RGBA16 {
      r: scale_to_16(r, depth),
      g: scale_to_16(g, depth),
      b: scale_to_16(b, depth),
      a: scale_to_16(a, depth),
    }
  }
}

/// Reads the `i`th sample out of bit-packed `storage`.
///
/// Sub-byte samples pack most-significant-bits-first within each byte;
/// 16-bit samples are big-endian.
#[inline]
pub(crate) fn read_sample(storage: &[u8], i: usize, depth: u32) -> u16 {
  match depth {
    1 => u16::from((storage[i >> 3] >> ((!i) & 7)) & 0b1),
    2 => u16::from((storage[i >> 2] >> ((((!i) & 3) << 1) & 7)) & 0b11),
    4 => u16::from((storage[i >> 1] >> ((((!i) & 1) << 2) & 7)) & 0b1111),
    8 => u16::from(storage[i]),
    _ => u16::from_be_bytes([storage[i * 2], storage[i * 2 + 1]]),
  }
}

/// Turns the bit-packed storage into one pixel value per image position.
pub(crate) fn unpack_storage<T: ColorTarget>(
  storage: &[u8], format: &Format, width: u32, height: u32,
) -> Vec<T> {
  let pixel_count = width as usize * height as usize;
  let pixel = format.pixel;
  let depth = pixel.depth();
  let max = ((1_u32 << depth) - 1) as u16;
  let mut out = Vec::with_capacity(pixel_count);

  if pixel.is_indexed() {
    // deindex once, then the image is just lookups; out-of-palette entries
    // show up as transparent black
    let table: Vec<T> = format.palette.iter().map(|&entry| T::from_palette(entry)).collect();
    let fallback = T::from_palette(RGBA8 { r: 0, g: 0, b: 0, a: 0 });
    for i in 0..pixel_count {
      let index = read_sample(storage, i, depth) as usize;
      out.push(table.get(index).copied().unwrap_or(fallback));
    }
    return out;
  }

  let channels = pixel.channels() as usize;
  let bgr = matches!(pixel, PixelFormat::BGR8 | PixelFormat::BGRA8);
  for i in 0..pixel_count {
    let sample = |c: usize| read_sample(storage, i * channels + c, depth);
    let (r, g, b, a) = match channels {
      1 => {
        let v = sample(0);
        let a = match format.key {
          Some(ChromaKey::Gray { v: key }) if key == v => 0,
          _ => max,
        };
        (v, v, v, a)
      }
      2 => {
        let v = sample(0);
        (v, v, v, sample(1))
      }
      _ => {
        let (c0, c1, c2) = (sample(0), sample(1), sample(2));
        let (r, g, b) = if bgr { (c2, c1, c0) } else { (c0, c1, c2) };
        let a = if channels == 4 {
          sample(3)
        } else {
          match format.key {
            Some(ChromaKey::Rgb { r: kr, g: kg, b: kb }) if (kr, kg, kb) == (r, g, b) => 0,
            _ => max,
          }
        };
        (r, g, b, a)
      }
    };
    out.push(T::from_raw(r, g, b, a, depth));
  }
  out
}
