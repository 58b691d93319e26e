use crate::chess::{Bitboard, Color};
use derive_more::{Display, Error};
use std::fmt::{self, Formatter, Write};
use std::str::FromStr;

/// A row on the chess board.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct Rank(#[cfg_attr(test, strategy(0u8..8))] u8);

impl Rank {
    pub const FIRST: Self = Rank(0);
    pub const SECOND: Self = Rank(1);
    pub const THIRD: Self = Rank(2);
    pub const FOURTH: Self = Rank(3);
    pub const FIFTH: Self = Rank(4);
    pub const SIXTH: Self = Rank(5);
    pub const SEVENTH: Self = Rank(6);
    pub const EIGHTH: Self = Rank(7);

    /// Constructs [`Rank`] from its index.
    #[inline(always)]
    pub const fn new(idx: u8) -> Self {
        debug_assert!(idx < 8);
        Rank(idx)
    }

    /// This rank's index, white's back rank first.
    #[inline(always)]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// An iterator over all ranks.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..8).map(Rank)
    }

    /// This rank from the opponent's perspective.
    #[inline(always)]
    pub const fn flip(self) -> Self {
        Rank(self.0 ^ 7)
    }

    /// This rank as seen by `side`.
    #[inline(always)]
    pub const fn perspective(self, side: Color) -> Self {
        match side {
            Color::White => self,
            Color::Black => self.flip(),
        }
    }

    /// Returns a [`Bitboard`] that only contains this rank.
    #[inline(always)]
    pub const fn bitboard(self) -> Bitboard {
        Bitboard::new(0xFF << (self.0 * 8))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char((b'1' + self.0).into())
    }
}

/// The reason why parsing [`Rank`] failed.
#[derive(Debug, Display, Default, Clone, Eq, PartialEq, Error)]
#[display("failed to parse rank")]
pub struct ParseRankError;

impl FromStr for Rank {
    type Err = ParseRankError;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            &[c @ b'1'..=b'8'] => Ok(Rank(c - b'1')),
            _ => Err(ParseRankError),
        }
    }
}
