//! Bit-field packing helpers.
//!
//! Flags are stored one bit per position in fixed-width words: bit `i` lives
//! in word `i / width` at bit `i % width`, least significant bit first. Words
//! are held as `u16` regardless of width.

use crate::slot::ScalarKind;

/// Width of the words a bit-field is packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WordWidth {
    /// 8-bit words, as used for packed BOOL members.
    W8,
    /// 16-bit words, as used for status words of built-in types.
    #[default]
    W16,
}

impl WordWidth {
    pub const fn bits(self) -> usize {
        match self {
            WordWidth::W8 => 8,
            WordWidth::W16 => 16,
        }
    }

    pub const fn bytes(self) -> usize {
        self.bits() / 8
    }

    pub(crate) const fn scalar_kind(self) -> ScalarKind {
        match self {
            WordWidth::W8 => ScalarKind::U8,
            WordWidth::W16 => ScalarKind::U16,
        }
    }
}

/// Number of words needed for `bit_count` bits.
pub fn word_count(bit_count: usize, width: WordWidth) -> usize {
    bit_count.div_ceil(width.bits())
}

/// Returns `(word index, bit index within the word)` for bit position `bit`.
pub fn locate(bit: usize, width: WordWidth) -> (usize, usize) {
    (bit / width.bits(), bit % width.bits())
}

/// Reads bit `bit`. Positions past the end of `words` read as clear.
pub fn read_bit(words: &[u16], bit: usize, width: WordWidth) -> bool {
    let (word, shift) = locate(bit, width);
    words.get(word).is_some_and(|w| (w >> shift) & 1 != 0)
}

/// Sets bit `bit`. Positions past the end of `words` are ignored.
pub fn set_bit(words: &mut [u16], bit: usize, width: WordWidth) {
    let (word, shift) = locate(bit, width);
    if let Some(w) = words.get_mut(word) {
        *w |= 1 << shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(1, WordWidth::W8), 1);
        assert_eq!(word_count(8, WordWidth::W8), 1);
        assert_eq!(word_count(9, WordWidth::W8), 2);
        assert_eq!(word_count(16, WordWidth::W16), 1);
        assert_eq!(word_count(32, WordWidth::W16), 2);
        assert_eq!(word_count(33, WordWidth::W16), 3);
    }

    #[test]
    fn test_locate() {
        assert_eq!(locate(0, WordWidth::W16), (0, 0));
        assert_eq!(locate(15, WordWidth::W16), (0, 15));
        assert_eq!(locate(29, WordWidth::W16), (1, 13));
        assert_eq!(locate(9, WordWidth::W8), (1, 1));
    }

    #[test]
    fn test_read_bit_lsb_first() {
        let words = [0b0000_0000_0000_0101u16, 0x2000];
        assert!(read_bit(&words, 0, WordWidth::W16));
        assert!(!read_bit(&words, 1, WordWidth::W16));
        assert!(read_bit(&words, 2, WordWidth::W16));
        assert!(read_bit(&words, 29, WordWidth::W16));
        assert!(!read_bit(&words, 40, WordWidth::W16));
    }

    #[test]
    fn test_set_bit() {
        let mut words = [0u16; 2];
        set_bit(&mut words, 7, WordWidth::W8);
        set_bit(&mut words, 8, WordWidth::W8);
        assert_eq!(words, [0x80, 0x01]);
    }

    #[test]
    fn test_set_bit_out_of_range_ignored() {
        let mut words = [0u16; 1];
        set_bit(&mut words, 16, WordWidth::W16);
        assert_eq!(words, [0]);
    }
}
