use crate::search::{Line, Score};
use derive_more::Constructor;
use std::fmt::{self, Formatter};
use std::time::Duration;

/// Progress reported after each completed depth of the iterative deepening
/// loop.
#[derive(Debug, Clone, Eq, PartialEq, Constructor)]
pub struct Info {
    depth: u8,
    score: Score,
    time: Duration,
    nodes: u64,
    pv: Line,
}

impl Info {
    /// The depth completed.
    #[inline(always)]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// The score of the best line.
    #[inline(always)]
    pub fn score(&self) -> Score {
        self.score
    }

    /// The time searched so far.
    #[inline(always)]
    pub fn time(&self) -> Duration {
        self.time
    }

    /// The number of nodes expanded so far.
    #[inline(always)]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// The average number of nodes expanded per second.
    #[inline(always)]
    pub fn nps(&self) -> u64 {
        (self.nodes as f64 / self.time.as_secs_f64().max(f64::MIN_POSITIVE)) as u64
    }

    /// The principal variation.
    #[inline(always)]
    pub fn pv(&self) -> &Line {
        &self.pv
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "depth {} score {} time {} nodes {} nps {}",
            self.depth,
            self.score,
            self.time.as_millis(),
            self.nodes,
            self.nps()
        )?;

        if !self.pv.is_empty() {
            write!(f, " pv {}", self.pv)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{Move, Square};

    #[test]
    fn info_prints_one_progress_line() {
        let m = Move::quiet(Square::E2, Square::E4);
        let info = Info::new(
            3,
            Score::new(25),
            Duration::from_millis(20),
            1000,
            Line::singular(m),
        );

        assert_eq!(
            info.to_string(),
            "depth 3 score cp 25 time 20 nodes 1000 nps 50000 pv e2e4"
        );
    }
}
