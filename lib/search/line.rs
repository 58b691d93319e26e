use crate::chess::Move;
use crate::search::MAX_PLY;
use arrayvec::ArrayVec;
use derive_more::{Deref, IntoIterator};
use std::fmt::{self, Formatter};

/// A sequence of [`Move`]s.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Deref, IntoIterator)]
pub struct Line(ArrayVec<Move, MAX_PLY>);

impl Line {
    /// An empty sequence.
    #[inline(always)]
    pub fn empty() -> Self {
        Line::default()
    }

    /// A sequence of one [`Move`].
    #[inline(always)]
    pub fn singular(m: Move) -> Self {
        let mut line = Line::default();
        line.0.push(m);
        line
    }

    /// Prepends a [`Move`] to a sequence, truncating if necessary.
    #[inline(always)]
    pub fn cons(head: Move, tail: Line) -> Self {
        let mut line = Line::singular(head);
        line.0.extend(tail.0.into_iter().take(MAX_PLY - 1));
        line
    }

    /// The first [`Move`] in the sequence, if any.
    #[inline(always)]
    pub fn head(&self) -> Option<Move> {
        self.0.first().copied()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut moves = self.0.iter();

        if let Some(m) = moves.next() {
            write!(f, "{m}")?;
        }

        for m in moves {
            write!(f, " {m}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::Square;

    #[test]
    fn cons_prepends_a_move() {
        let m = Move::quiet(Square::E2, Square::E4);
        let n = Move::quiet(Square::E7, Square::E5);
        let line = Line::cons(m, Line::singular(n));

        assert_eq!(line.head(), Some(m));
        assert_eq!(Vec::from_iter(line), vec![m, n]);
    }

    #[test]
    fn lines_print_space_separated() {
        let m = Move::quiet(Square::E2, Square::E4);
        let n = Move::quiet(Square::E7, Square::E5);
        assert_eq!(Line::cons(m, Line::singular(n)).to_string(), "e2e4 e7e5");
        assert_eq!(Line::empty().to_string(), "");
    }
}
