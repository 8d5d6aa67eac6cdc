use super::*;

/// The meta-alphabet a dynamic block uses to describe its real code lengths
/// (RFC 1951 §3.2.7).
///
/// Symbols 0-15 are literal code lengths, 16 repeats the previous length,
/// and 17/18 are short/long runs of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CodeLengthAlphabet {
  pub tree: [TreeEntry; Self::COUNT],
  min_len: u16,
  max_len: u16,
}

impl Default for CodeLengthAlphabet {
  fn default() -> Self {
    Self { tree: [TreeEntry::default(); Self::COUNT], min_len: 0, max_len: 0 }
  }
}

impl CodeLengthAlphabet {
  pub(crate) const COUNT: usize = 19;

  /// The order the stream stores the 19 code-length code lengths in.
  pub(crate) const STORAGE_ORDER: [usize; Self::COUNT] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

  /// Recomputes the code bit patterns after the `len` fields changed.
  pub fn refresh(&mut self) -> PngResult<()> {
    TreeEntry::assign_codes(&mut self.tree)?;
    (self.min_len, self.max_len) = TreeEntry::len_bounds(&self.tree);
    Ok(())
  }

  fn pull_and_match(&self, bits: &mut BitBuffer) -> PngResult<Option<usize>> {
    match_code(&self.tree, self.min_len, self.max_len, bits)
  }

  /// Decodes `element_count` code lengths into the `len` fields of `tree`,
  /// expanding the run-length symbols as it goes.
  ///
  /// `Ok(None)` means the input stalled; the caller restores its mark and
  /// the whole vector is read again on the next push.
  pub fn read_code_lengths(
    &self, element_count: usize, tree: &mut [TreeEntry], bits: &mut BitBuffer,
  ) -> PngResult<Option<()>> {
    debug_assert!(element_count <= tree.len());
    let mut acquired = 0_usize;
    while acquired < element_count {
      let Some(symbol) = self.pull_and_match(bits)? else {
        return Ok(None);
      };
      match symbol as u16 {
        literal @ 0..=15 => {
          tree[acquired].len = literal;
          acquired += 1;
        }
        16 => {
          if acquired == 0 {
            return Err(InflationError::InvalidHuffmanTable.into());
          }
          let Some(extra) = bits.next_bits_lsb(2) else {
            return Ok(None);
          };
          let run = 3 + extra as usize;
          if acquired + run > element_count {
            return Err(InflationError::InvalidHuffmanTable.into());
          }
          let previous = tree[acquired - 1].len;
          for _ in 0..run {
            tree[acquired].len = previous;
            acquired += 1;
          }
        }
        17 => {
          let Some(extra) = bits.next_bits_lsb(3) else {
            return Ok(None);
          };
          let run = 3 + extra as usize;
          if acquired + run > element_count {
            return Err(InflationError::InvalidHuffmanTable.into());
          }
          for _ in 0..run {
            tree[acquired].len = 0;
            acquired += 1;
          }
        }
        18 => {
          let Some(extra) = bits.next_bits_lsb(7) else {
            return Ok(None);
          };
          let run = 11 + extra as usize;
          if acquired + run > element_count {
            return Err(InflationError::InvalidHuffmanTable.into());
          }
          for _ in 0..run {
            tree[acquired].len = 0;
            acquired += 1;
          }
        }
        _ => return Err(InflationError::InvalidSymbol.into()),
      }
    }
    Ok(Some(()))
  }
}
