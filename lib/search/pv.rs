use crate::chess::Move;
use crate::search::{Line, Score};
use derive_more::Constructor;
use std::cmp::Ordering;
use std::ops::Neg;

/// The principal variation: a score and the line of play that realizes it.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Constructor)]
pub struct Pv {
    score: Score,
    line: Line,
}

impl Pv {
    /// A principal variation with no moves.
    #[inline(always)]
    pub fn empty(score: Score) -> Self {
        Pv::new(score, Line::empty())
    }

    /// The score from the point of view of the side to move.
    #[inline(always)]
    pub fn score(&self) -> Score {
        self.score
    }

    /// The sequence of [`Move`]s in this principal variation.
    #[inline(always)]
    pub fn line(&self) -> &Line {
        &self.line
    }

    /// The first [`Move`] in this principal variation, if any.
    #[inline(always)]
    pub fn head(&self) -> Option<Move> {
        self.line.head()
    }

    /// Splices a [`Move`] onto the front of this principal variation.
    #[inline(always)]
    pub fn cons(self, head: Move) -> Self {
        Pv::new(self.score, Line::cons(head, self.line))
    }
}

impl Ord for Pv {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

impl PartialOrd for Pv {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Neg for Pv {
    type Output = Self;

    /// Negates the score, preserving the line.
    #[inline(always)]
    fn neg(mut self) -> Self::Output {
        self.score = -self.score;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::Square;

    #[test]
    fn negation_changes_the_score_but_not_the_line() {
        let m = Move::quiet(Square::E2, Square::E4);
        let pv = Pv::new(Score::new(7), Line::singular(m));
        let neg = -pv.clone();

        assert_eq!(neg.score(), Score::new(-7));
        assert_eq!(neg.line(), pv.line());
    }

    #[test]
    fn cons_prepends_the_head_move() {
        let m = Move::quiet(Square::E2, Square::E4);
        let pv = Pv::empty(Score::new(1)).cons(m);
        assert_eq!(pv.head(), Some(m));
        assert_eq!(pv.score(), Score::new(1));
    }

    #[test]
    fn pvs_compare_by_score() {
        assert!(Pv::empty(Score::new(1)) > Pv::empty(Score::new(0)));
    }
}
