use super::*;

/// The literal/length alphabet of a DEFLATE block (symbols 0-287).
///
/// Symbols 0-255 are literal bytes, 256 ends the block, and 257-285 start a
/// back-reference. 286 and 287 can be described by a dynamic header but may
/// never actually occur in the compressed data.
#[derive(Clone, Copy)]
pub(crate) struct LitLenAlphabet {
  pub tree: [TreeEntry; Self::COUNT],
  min_len: u16,
  max_len: u16,
}

impl LitLenAlphabet {
  pub(crate) const COUNT: usize = 288;

  /// Recomputes the code bit patterns after the `len` fields changed.
  ///
  /// Also checks that symbol 256 is coded at all; a block that can never
  /// end isn't a usable block.
  pub fn refresh(&mut self) -> PngResult<()> {
    TreeEntry::assign_codes(&mut self.tree)?;
    if self.tree[256].len == 0 {
      return Err(InflationError::InvalidHuffmanTable.into());
    }
    (self.min_len, self.max_len) = TreeEntry::len_bounds(&self.tree);
    Ok(())
  }

  /// The fixed-Huffman table from RFC 1951 §3.2.6: lengths 8/9/7/8 over the
  /// four symbol bands.
  pub fn fixed() -> Self {
    let mut alphabet = Self::default();
    for (i, te) in alphabet.tree.iter_mut().enumerate() {
      te.len = match i {
        0..=143 => 8,
        144..=255 => 9,
        256..=279 => 7,
        _ => 8,
      };
    }
    // the fixed table is complete, this can't fail
    alphabet.refresh().unwrap();
    alphabet
  }

  pub fn pull_and_match(&self, bits: &mut BitBuffer) -> PngResult<Option<usize>> {
    match_code(&self.tree, self.min_len, self.max_len, bits)
  }
}

impl Default for LitLenAlphabet {
  fn default() -> Self {
    Self { tree: [TreeEntry::default(); Self::COUNT], min_len: 0, max_len: 0 }
  }
}

impl core::fmt::Debug for LitLenAlphabet {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "LitLenAlphabet {{ tree: {:?} }}", &self.tree[..])
  }
}
