//! The PNG container layer: chunk framing, the ordering grammar, scanline
//! reconstruction, and pixel unpacking.
//!
//! * [Portable Network Graphics (PNG) Specification][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/png/
//!
//! The usual entry points are [`decode`] for in-memory data and [`Decoder`]
//! for data that arrives in pieces. The chunk-level types ([`ChunkType`],
//! [`RawChunk`]) are public for tooling that wants to look at a PNG without
//! decoding it.

use alloc::{string::String, vec, vec::Vec};
use bytemuck::cast_slice;
use core::fmt::{Debug, Write};

use crate::{
  inflate::{inflate_all, InflateFormat, Inflator},
  DecodingError, LexingError, ParsingError, PngError, PngResult, TextError,
};

mod adam7;
mod bkgd;
mod chunk;
mod crc32;
mod decode;
mod format;
mod ihdr;
mod metadata;
mod plte;
mod raw_chunk;
mod trns;
mod unfilter;
mod unpack;

use adam7::{pass_dimensions, pass_position};
use crc32::chunk_crc32;
use raw_chunk::{next_chunk, truncation_kind};
use unfilter::unfilter_row;
use unpack::{read_sample, unpack_storage};

pub use bkgd::Background;
pub use chunk::{Chromaticity, ModificationTime, PhysicalDimensions, RenderingIntent};
pub use decode::{decode, DecodeStatus, Decoder, Image};
pub use format::{ChromaKey, Format, Layout, Standard};
pub use ihdr::{Header, PixelFormat};
pub use metadata::{
  ColorProfile, Metadata, SignificantBits, SuggestedPalette, TextChunk,
};
pub use plte::Palette;
pub use raw_chunk::{ChunkType, RawChunk};
pub use trns::Transparency;
pub use unpack::{ColorTarget, RGB16, RGB8, RGBA16, RGBA8, Y16, Y8, YA16, YA8};

pub(crate) use chunk::PngChunk;
pub(crate) use metadata::ChunkOrdering;
