//! Keyboard matrix mask encoding.
//!
//! The core samples the emulated 8x8 keyboard matrix from a 64-bit
//! mask, one bit per (row, col) crossing. Matrix codes pack the row in
//! the high nibble and the column in the low nibble — R is $21
//! (row 2, col 1), RETURN is $01 (row 0, col 1).

/// A key position in the 8x8 matrix, packed as $RC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixCode(pub u8);

impl MatrixCode {
    pub const RETURN: Self = Self(0x01);
    pub const R: Self = Self(0x21);
    pub const U: Self = Self(0x36);
    pub const N: Self = Self(0x47);

    /// Bit for this key in the 64-bit matrix mask.
    #[must_use]
    pub const fn mask(self) -> u64 {
        let row = ((self.0 >> 4) & 0x0F) as u64;
        let col = (self.0 & 0x0F) as u64;
        1u64 << (row * 8 + col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_bit_positions() {
        assert_eq!(MatrixCode::RETURN.mask(), 1 << 1);
        assert_eq!(MatrixCode::R.mask(), 1 << (2 * 8 + 1));
        assert_eq!(MatrixCode::U.mask(), 1 << (3 * 8 + 6));
        assert_eq!(MatrixCode::N.mask(), 1 << (4 * 8 + 7));
    }

    #[test]
    fn masks_are_single_bit_and_distinct() {
        let masks = [
            MatrixCode::R.mask(),
            MatrixCode::U.mask(),
            MatrixCode::N.mask(),
            MatrixCode::RETURN.mask(),
        ];
        for (i, m) in masks.iter().enumerate() {
            assert_eq!(m.count_ones(), 1);
            for other in &masks[i + 1..] {
                assert_ne!(m, other);
            }
        }
    }
}
