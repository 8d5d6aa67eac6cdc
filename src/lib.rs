#![no_std]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

//! A crate to decode PNG data into pixel buffers.
//!
//! * [Portable Network Graphics (PNG) Specification][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/png/
//!
//! The decoder is split into two layers that can also be used on their own:
//!
//! * [`Inflator`] is a streaming DEFLATE/zlib decompressor ([RFC 1950] /
//!   [RFC 1951]). You `push` input slices at it whenever they arrive and
//!   `pull` decompressed bytes back out whenever they're ready. Nothing ever
//!   blocks: if a symbol is cut off mid-byte the inflator simply remembers
//!   the partial bits until the next `push`.
//! * [`Decoder`] is the PNG container layer: signature check, chunk framing
//!   with CRC-32 verification, the chunk ordering grammar, metadata
//!   collection, filter reversal, and Adam7 deinterlacing. Feed it byte
//!   slices with [`Decoder::push`] until it reports [`DecodeStatus::Done`],
//!   then take the [`Image`].
//!
//! [RFC 1950]: https://www.rfc-editor.org/rfc/rfc1950
//! [RFC 1951]: https://www.rfc-editor.org/rfc/rfc1951
//!
//! For the common case where all the bytes are already in memory, call
//! [`decode`] and then unpack the image into whatever pixel type you want:
//!
//! ```no_run
//! # fn demo(png_bytes: &[u8]) -> pngolin::PngResult<()> {
//! let image = pngolin::decode(png_bytes)?;
//! let pixels: Vec<pngolin::RGBA8> = image.unpack();
//! # Ok(())
//! # }
//! ```
//!
//! The Apple `CgBI` variant (as produced by `pngcrush -iphone`) is handled
//! transparently: the decoder notices the marker chunk, switches the
//! inflator to the headerless stream format, and records that the color
//! channels are stored in BGR order so that unpacking still produces RGB.
//!
//! Unlike most PNG libraries this one treats both checksum systems as load
//! bearing: a chunk with a bad CRC-32 or a zlib stream with a bad Adler-32
//! fails the whole decode. Chunk ordering rules are enforced for the same
//! reason, because this decoder actually *is* a stream processor.
//!
//! This library uses the allocator but not the OS, so it works in `no_std`
//! builds that have `alloc` support.

extern crate alloc;

mod error;
pub use error::*;

pub mod inflate;
pub mod png;

pub use crate::inflate::{InflateFormat, InflateStatus, Inflator};
pub use crate::png::{
  decode, Background, ChromaKey, ChunkType, ColorTarget, DecodeStatus, Decoder, Format, Header,
  Image, Layout, Metadata, PixelFormat, Standard, RGB16, RGB8, RGBA16, RGBA8, Y16, Y8, YA16, YA8,
};
