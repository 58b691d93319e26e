use crate::chess::{Bitboard, Color, File, ParseFileError, ParseRankError, Rank};
use derive_more::{Display, Error, From};
use std::fmt::{self, Formatter};
use std::str::FromStr;

/// A square on the chess board.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct Square(#[cfg_attr(test, strategy(0u8..64))] u8);

#[rustfmt::skip]
impl Square {
    pub const A1: Self = Square(00); pub const B1: Self = Square(01); pub const C1: Self = Square(02); pub const D1: Self = Square(03);
    pub const E1: Self = Square(04); pub const F1: Self = Square(05); pub const G1: Self = Square(06); pub const H1: Self = Square(07);
    pub const A2: Self = Square(08); pub const B2: Self = Square(09); pub const C2: Self = Square(10); pub const D2: Self = Square(11);
    pub const E2: Self = Square(12); pub const F2: Self = Square(13); pub const G2: Self = Square(14); pub const H2: Self = Square(15);
    pub const A3: Self = Square(16); pub const B3: Self = Square(17); pub const C3: Self = Square(18); pub const D3: Self = Square(19);
    pub const E3: Self = Square(20); pub const F3: Self = Square(21); pub const G3: Self = Square(22); pub const H3: Self = Square(23);
    pub const A4: Self = Square(24); pub const B4: Self = Square(25); pub const C4: Self = Square(26); pub const D4: Self = Square(27);
    pub const E4: Self = Square(28); pub const F4: Self = Square(29); pub const G4: Self = Square(30); pub const H4: Self = Square(31);
    pub const A5: Self = Square(32); pub const B5: Self = Square(33); pub const C5: Self = Square(34); pub const D5: Self = Square(35);
    pub const E5: Self = Square(36); pub const F5: Self = Square(37); pub const G5: Self = Square(38); pub const H5: Self = Square(39);
    pub const A6: Self = Square(40); pub const B6: Self = Square(41); pub const C6: Self = Square(42); pub const D6: Self = Square(43);
    pub const E6: Self = Square(44); pub const F6: Self = Square(45); pub const G6: Self = Square(46); pub const H6: Self = Square(47);
    pub const A7: Self = Square(48); pub const B7: Self = Square(49); pub const C7: Self = Square(50); pub const D7: Self = Square(51);
    pub const E7: Self = Square(52); pub const F7: Self = Square(53); pub const G7: Self = Square(54); pub const H7: Self = Square(55);
    pub const A8: Self = Square(56); pub const B8: Self = Square(57); pub const C8: Self = Square(58); pub const D8: Self = Square(59);
    pub const E8: Self = Square(60); pub const F8: Self = Square(61); pub const G8: Self = Square(62); pub const H8: Self = Square(63);
}

impl Square {
    /// Constructs [`Square`] from a pair of [`File`] and [`Rank`].
    #[inline(always)]
    pub const fn new(f: File, r: Rank) -> Self {
        Square(f.get() | (r.get() << 3))
    }

    /// Constructs [`Square`] from its index.
    #[inline(always)]
    pub const fn from_index(idx: u8) -> Self {
        debug_assert!(idx < 64);
        Square(idx)
    }

    /// This square's index, a1 first and h8 last.
    #[inline(always)]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// This square's index as `usize`.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// An iterator over all squares.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..64).map(Square)
    }

    /// This square's [`File`].
    #[inline(always)]
    pub const fn file(self) -> File {
        File::new(self.0 & 0b111)
    }

    /// This square's [`Rank`].
    #[inline(always)]
    pub const fn rank(self) -> Rank {
        Rank::new(self.0 >> 3)
    }

    /// This square with its [`Rank`] flipped.
    #[inline(always)]
    pub const fn flip(self) -> Self {
        Square(self.0 ^ 0b111000)
    }

    /// This square as seen by `side`.
    #[inline(always)]
    pub const fn perspective(self, side: Color) -> Self {
        match side {
            Color::White => self,
            Color::Black => self.flip(),
        }
    }

    /// Returns a [`Bitboard`] that only contains this square.
    #[inline(always)]
    pub const fn bitboard(self) -> Bitboard {
        Bitboard::new(1 << self.0)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.file(), f)?;
        fmt::Display::fmt(&self.rank(), f)?;
        Ok(())
    }
}

/// The reason why parsing [`Square`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error, From)]
pub enum ParseSquareError {
    #[display("failed to parse square")]
    InvalidFile(ParseFileError),
    #[display("failed to parse square")]
    InvalidRank(ParseRankError),
}

impl FromStr for Square {
    type Err = ParseSquareError;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let i = s.char_indices().nth(1).map_or(s.len(), |(i, _)| i);
        Ok(Square::new(s[..i].parse()?, s[i..].parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn new_constructs_square_from_pair_of_file_and_rank(sq: Square) {
        assert_eq!(Square::new(sq.file(), sq.rank()), sq);
    }

    #[proptest]
    fn square_has_an_equivalent_bitboard(sq: Square) {
        assert_eq!(Vec::from_iter(sq.bitboard()), vec![sq]);
    }

    #[proptest]
    fn flipping_square_preserves_file_and_flips_rank(sq: Square) {
        assert_eq!(sq.flip(), Square::new(sq.file(), sq.rank().flip()));
    }

    #[proptest]
    fn parsing_printed_square_is_an_identity(sq: Square) {
        assert_eq!(sq.to_string().parse(), Ok(sq));
    }

    #[proptest]
    fn parsing_square_fails_if_file_invalid(
        #[filter(!('a'..='h').contains(&#c))] c: char,
        r: Rank,
    ) {
        assert_eq!(
            [c.to_string(), r.to_string()].concat().parse::<Square>(),
            Err(ParseSquareError::InvalidFile(ParseFileError))
        );
    }

    #[proptest]
    fn parsing_square_fails_if_rank_invalid(
        f: File,
        #[filter(!('1'..='8').contains(&#c))] c: char,
    ) {
        assert_eq!(
            [f.to_string(), c.to_string()].concat().parse::<Square>(),
            Err(ParseSquareError::InvalidRank(ParseRankError))
        );
    }
}
