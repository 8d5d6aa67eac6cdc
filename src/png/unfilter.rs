use super::*;

/// The Paeth predictor (filter type 4).
///
/// Picks whichever of left/up/up-left is closest to `a + b - c`, evaluated
/// in signed 16-bit arithmetic. The order of the tie-breaking comparisons
/// is normative; don't rearrange them.
pub(crate) const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i16;
  let b_ = b as i16;
  let c_ = c as i16;
  let p = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reverses one scanline's filter in place.
///
/// * `row` is the line's data bytes, with the filter byte already stripped.
/// * `previous` is the already-reconstructed line above, or all zeros for
///   the first line of a pass. Must be the same length as `row`.
/// * `delay` is the byte offset to a pixel's left neighbor (bytes per
///   pixel, but at least 1). Bytes in the first `delay` columns treat their
///   left and upper-left neighbors as zero.
pub(crate) fn unfilter_row(
  filter: u8, delay: usize, previous: &[u8], row: &mut [u8],
) -> PngResult<()> {
  debug_assert_eq!(previous.len(), row.len());
  match filter {
    0 => (),
    1 => {
      // Sub
      for i in delay..row.len() {
        row[i] = row[i].wrapping_add(row[i - delay]);
      }
    }
    2 => {
      // Up
      for (x, b) in row.iter_mut().zip(previous.iter().copied()) {
        *x = x.wrapping_add(b);
      }
    }
    3 => {
      // Average
      for i in 0..row.len() {
        let a = if i >= delay { row[i - delay] } else { 0 };
        let b = previous[i];
        row[i] = row[i].wrapping_add(((a as u16 + b as u16) / 2) as u8);
      }
    }
    4 => {
      // Paeth
      for i in 0..row.len() {
        let (a, c) = if i >= delay { (row[i - delay], previous[i - delay]) } else { (0, 0) };
        let b = previous[i];
        row[i] = row[i].wrapping_add(paeth_predict(a, b, c));
      }
    }
    other => return Err(ParsingError::InvalidFilterType(other).into()),
  }
  Ok(())
}
