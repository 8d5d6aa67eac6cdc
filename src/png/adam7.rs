// Adam7 pass geometry. Each pass samples the image on its own power-of-two
// lattice, anchored somewhere in the top-left 8x8 tile: pass 0 takes every
// 8th pixel both ways starting at the corner, passes 1-5 fill in columns
// and rows between the samples already taken at successively halved
// strides, and pass 6 finishes with every odd row. A pass is fully
// described by where its lattice starts and the log2 of its two strides,
// which is all the tables below store.

/// Per pass: the (x, y) of its first sample within each 8x8 tile.
const PASS_BASE: [(u32, u32); 7] =
  [(0, 0), (4, 0), (0, 4), (2, 0), (0, 2), (1, 0), (0, 1)];

/// Per pass: the log2 of its (x, y) sampling stride.
const PASS_EXPONENT: [(u32, u32); 7] =
  [(3, 3), (3, 3), (2, 3), (2, 2), (1, 2), (1, 1), (0, 1)];

/// The dimensions of one pass's reduced image, either of which can be zero
/// for narrow or short images.
#[inline]
#[must_use]
pub(crate) const fn pass_dimensions(pass: usize, width: u32, height: u32) -> (u32, u32) {
  let (base_x, base_y) = PASS_BASE[pass];
  let (exp_x, exp_y) = PASS_EXPONENT[pass];
  let reduced_w = (width + (1 << exp_x) - base_x - 1) >> exp_x;
  let reduced_h = (height + (1 << exp_y) - base_y - 1) >> exp_y;
  (reduced_w, reduced_h)
}

/// Converts a reduced-image position of one pass into the full-image
/// position it samples.
#[inline]
#[must_use]
pub(crate) const fn pass_position(pass: usize, reduced_x: u32, reduced_y: u32) -> (u32, u32) {
  let (base_x, base_y) = PASS_BASE[pass];
  let (exp_x, exp_y) = PASS_EXPONENT[pass];
  (base_x + (reduced_x << exp_x), base_y + (reduced_y << exp_y))
}
