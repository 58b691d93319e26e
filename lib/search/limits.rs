use crate::search::MAX_PLY;
use std::time::Duration;

/// The budget allotted to a search.
///
/// The search stops as soon as its budget is exhausted or an external stop
/// arrives, whichever comes first.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Limits {
    /// Search until stopped.
    #[default]
    None,

    /// Search to a fixed depth in plies.
    Depth(#[cfg_attr(test, strategy(1u8..=8))] u8),

    /// Search a fixed number of nodes.
    Nodes(u64),

    /// Search for a fixed wall-clock duration.
    Time(Duration),

    /// Manage a game clock.
    Clock {
        /// Time remaining on the clock.
        time: Duration,
        /// The increment gained per move.
        increment: Duration,
        /// Moves remaining until the next time control, if known.
        moves_to_go: Option<u32>,
    },
}

impl Limits {
    /// The maximum depth to search.
    #[inline(always)]
    pub fn max_depth(&self) -> u8 {
        match *self {
            Limits::Depth(d) => d.min(MAX_PLY as u8 - 1),
            _ => MAX_PLY as u8 - 1,
        }
    }

    /// The maximum number of nodes to search.
    #[inline(always)]
    pub fn max_nodes(&self) -> u64 {
        match *self {
            Limits::Nodes(n) => n,
            _ => u64::MAX,
        }
    }

    /// The wall-clock budget, if this limit imposes one.
    ///
    /// A game clock is apportioned across the moves expected to remain,
    /// leaning on the increment, and capped so a single move can never flag.
    #[inline(always)]
    pub fn budget(&self, fullmoves: u32) -> Option<Duration> {
        match *self {
            Limits::Time(time) => Some(time),
            Limits::Clock {
                time,
                increment,
                moves_to_go,
            } => {
                let moves_left = moves_to_go
                    .unwrap_or_else(|| 40u32.saturating_sub(fullmoves / 2).max(16))
                    .max(1);

                Some((time / moves_left + increment * 3 / 4).min(time / 2))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_search_has_no_budget() {
        assert_eq!(Limits::None.budget(1), None);
        assert_eq!(Limits::None.max_nodes(), u64::MAX);
        assert_eq!(Limits::None.max_depth(), MAX_PLY as u8 - 1);
    }

    #[test]
    fn depth_limit_caps_the_iteration_count() {
        assert_eq!(Limits::Depth(5).max_depth(), 5);
        assert_eq!(Limits::Depth(255).max_depth(), MAX_PLY as u8 - 1);
    }

    #[test]
    fn node_limit_caps_the_node_count() {
        assert_eq!(Limits::Nodes(42).max_nodes(), 42);
    }

    #[test]
    fn fixed_time_is_the_whole_budget() {
        let t = Duration::from_millis(350);
        assert_eq!(Limits::Time(t).budget(1), Some(t));
    }

    #[test]
    fn clock_budget_never_exceeds_half_the_remaining_time() {
        let limits = Limits::Clock {
            time: Duration::from_secs(10),
            increment: Duration::from_secs(60),
            moves_to_go: Some(1),
        };

        assert_eq!(limits.budget(1), Some(Duration::from_secs(5)));
    }

    #[test]
    fn clock_budget_shrinks_with_more_moves_to_go() {
        let clock = |mtg| Limits::Clock {
            time: Duration::from_secs(60),
            increment: Duration::ZERO,
            moves_to_go: Some(mtg),
        };

        assert!(clock(40).budget(1) < clock(10).budget(1));
    }
}
