use super::*;

/// The distance alphabet of a DEFLATE block (symbols 0-31).
///
/// Symbols 30 and 31 are reserved: a dynamic header may assign them
/// lengths, but matching one in the compressed data is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DistAlphabet {
  pub tree: [TreeEntry; Self::COUNT],
  min_len: u16,
  max_len: u16,
}

impl Default for DistAlphabet {
  fn default() -> Self {
    Self { tree: [TreeEntry::default(); Self::COUNT], min_len: 0, max_len: 0 }
  }
}

impl DistAlphabet {
  pub(crate) const COUNT: usize = 32;

  /// Recomputes the code bit patterns after the `len` fields changed.
  pub fn refresh(&mut self) -> PngResult<()> {
    TreeEntry::assign_codes(&mut self.tree)?;
    (self.min_len, self.max_len) = TreeEntry::len_bounds(&self.tree);
    Ok(())
  }

  /// The fixed-Huffman distance table: all 32 symbols at 5 bits.
  pub fn fixed() -> Self {
    let mut alphabet = Self::default();
    for te in alphabet.tree.iter_mut() {
      te.len = 5;
    }
    // 32 five-bit codes are a complete table, this can't fail
    alphabet.refresh().unwrap();
    alphabet
  }

  /// True when no distance symbol is coded at all, which a block with no
  /// back-references is allowed to declare.
  pub fn is_empty(&self) -> bool {
    self.max_len == 0
  }

  pub fn pull_and_match(&self, bits: &mut BitBuffer) -> PngResult<Option<usize>> {
    match_code(&self.tree, self.min_len, self.max_len, bits)
  }
}
