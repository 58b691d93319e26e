use crate::chess::{Bitboard, Move, MoveList, NOISY_SCORE, Position};
use crate::eval;
use crate::search::*;
use arrayvec::ArrayVec;
use derive_more::{Display, Error};

/// The ordering score granted to killer moves.
const KILLER_SCORE: i16 = 15_000;

/// Indicates the search was interrupted.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
#[display("the search was interrupted")]
pub struct Interrupt;

/// A node's role in the search tree.
///
/// Principal nodes search the full window; all others are scouted with a
/// null window. The Cut/All tag of a scouted node is derived from its
/// parent's tag and only steers move ordering.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum NodeType {
    Pv,
    Cut,
    All,
}

impl NodeType {
    #[inline(always)]
    fn scout_child(self) -> Self {
        match self {
            NodeType::Cut => NodeType::All,
            _ => NodeType::Cut,
        }
    }
}

/// The state of one tree traversal, borrowing the engine's tables.
#[derive(Debug)]
struct Stack<'a> {
    tt: &'a mut TranspositionTable,
    history: &'a mut History,
    ctrl: &'a Control,
    killers: [Killers; MAX_PLY],
}

impl<'a> Stack<'a> {
    fn new(tt: &'a mut TranspositionTable, history: &'a mut History, ctrl: &'a Control) -> Self {
        Stack {
            tt,
            history,
            ctrl,
            killers: [Killers::default(); MAX_PLY],
        }
    }

    /// Rescores the generated moves for this node and promotes the hint.
    fn order(&self, pos: &Position, moves: &mut MoveList, hint: Option<Move>, ply: usize, node: NodeType) {
        let turn = pos.turn();

        for m in moves.iter_mut() {
            if hint == Some(*m) {
                m.set_score(i16::MAX);
            } else if m.is_quiet() {
                if node != NodeType::All && self.killers[ply].contains(*m) {
                    m.set_score(KILLER_SCORE);
                } else {
                    let score = m.score().saturating_add(self.history.get(turn, *m));
                    m.set_score(score);
                }
            }
        }
    }

    /// Updates the killer and history tables after a beta cutoff.
    fn cutoff(&mut self, pos: &Position, best: Move, tried: &[Move], depth: u8, ply: usize) {
        if best.is_quiet() {
            self.killers[ply].insert(best);
            self.history.reward(pos.turn(), best, depth);
        }

        for &m in tried {
            if m != best && m.is_quiet() {
                self.history.punish(pos.turn(), m, depth);
            }
        }
    }

    /// The capture-only extension of the search at depth zero.
    ///
    /// The static score stands as a lower bound on the assumption that some
    /// quiet move preserves it; only noisy moves are explored, so recursion
    /// terminates as captures run out.
    fn quiesce(
        &mut self,
        pos: &Position,
        mut alpha: Score,
        beta: Score,
        ply: usize,
    ) -> Result<Score, Interrupt> {
        if self.ctrl.check() == ControlFlow::Abort {
            return Err(Interrupt);
        }

        if pos.is_draw() {
            return Ok(Score::new(0));
        }

        let stand = Score::new(eval::score(pos));
        if stand >= beta || ply >= MAX_PLY {
            return Ok(stand);
        }

        alpha = alpha.max(stand);

        let mut moves: MoveList = pos
            .moves()
            .into_iter()
            .filter(|m| m.score() >= NOISY_SCORE)
            .collect();

        let mut best = stand;
        for idx in 0..moves.len() {
            let m = match moves.pick(idx) {
                Some(m) => m,
                None => break,
            };

            // Losing captures cannot beat the standing pat.
            if m.is_capture() && !m.is_promotion() && pos.see(m) < 0 {
                continue;
            }

            let next = pos.apply(m);
            let score = -self.quiesce(&next, -beta, -alpha, ply + 1)?;

            best = best.max(score);
            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }

        Ok(best)
    }

    /// The null-window search of a non-principal node.
    ///
    /// Searches the window `beta - 1..beta` and returns a fail-hard bound on
    /// the true score.
    fn scout(
        &mut self,
        pos: &Position,
        beta: Score,
        depth: u8,
        ply: usize,
        node: NodeType,
    ) -> Result<Score, Interrupt> {
        if self.ctrl.check() == ControlFlow::Abort {
            return Err(Interrupt);
        }

        if pos.is_draw() {
            return Ok(Score::new(0));
        }

        let alpha = beta - 1;
        let mut hint = None;
        if let Some(t) = self.tt.get(pos.zobrist()) {
            hint = t
                .best()
                .filter(|&m| pos.is_structurally_valid(m, Bitboard::full()));

            if t.depth() >= depth {
                let score = t.score().relative_to_ply(ply);
                match t.bound() {
                    Bound::Exact => return Ok(score),
                    Bound::Lower if score >= beta => return Ok(score),
                    Bound::Upper if score <= alpha => return Ok(score),
                    _ => {}
                }
            }
        }

        if depth == 0 {
            return self.quiesce(pos, alpha, beta, ply);
        }

        if ply >= MAX_PLY {
            return Ok(Score::new(eval::score(pos)));
        }

        let mut moves = pos.moves();
        if moves.is_empty() {
            return Ok(if pos.is_check() {
                Score::mated(ply)
            } else {
                Score::new(0)
            });
        }

        self.order(pos, &mut moves, hint, ply, node);

        let mut tried = ArrayVec::<Move, 256>::new();
        let mut best = Score::lower();
        let mut best_move = None;

        for idx in 0..moves.len() {
            let m = match moves.pick(idx) {
                Some(m) => m,
                None => break,
            };

            let next = pos.apply(m);
            tried.push(m);

            let score = -self.scout(&next, -alpha, depth - 1, ply + 1, node.scout_child())?;
            if score > best {
                best = score;
                best_move = Some(m);
            }

            if best >= beta {
                self.cutoff(pos, m, &tried, depth, ply);
                break;
            }
        }

        let bound = if best >= beta { Bound::Lower } else { Bound::Upper };
        let tpos = Transposition::new(bound, best.relative_to_root(ply), depth, best_move);
        self.tt.set(pos.zobrist(), tpos);

        Ok(best)
    }

    /// The full-window search of a principal node.
    fn pvs(
        &mut self,
        pos: &Position,
        alpha_in: Score,
        beta_in: Score,
        depth: u8,
        ply: usize,
    ) -> Result<Pv, Interrupt> {
        if self.ctrl.check() == ControlFlow::Abort {
            return Err(Interrupt);
        }

        if pos.is_draw() {
            return Ok(Pv::empty(Score::new(0)));
        }

        let (mut alpha, mut beta) = (alpha_in, beta_in);
        let mut hint = None;
        if let Some(t) = self.tt.get(pos.zobrist()) {
            hint = t
                .best()
                .filter(|&m| pos.is_structurally_valid(m, Bitboard::full()));

            if t.depth() >= depth {
                let score = t.score().relative_to_ply(ply);
                match t.bound() {
                    Bound::Exact => {
                        // The move enters the PV without generation, so it
                        // must pass the full legality check.
                        let line = hint
                            .filter(|&m| pos.is_legal(m))
                            .map_or_else(Line::empty, Line::singular);

                        return Ok(Pv::new(score, line));
                    }
                    Bound::Lower => alpha = alpha.max(score),
                    Bound::Upper => beta = beta.min(score),
                }

                if alpha >= beta {
                    return Ok(Pv::empty(score));
                }
            }
        }

        if depth == 0 {
            return Ok(Pv::empty(self.quiesce(pos, alpha, beta, ply)?));
        }

        if ply >= MAX_PLY {
            return Ok(Pv::empty(Score::new(eval::score(pos))));
        }

        let mut moves = pos.moves();
        if moves.is_empty() {
            return Ok(Pv::empty(if pos.is_check() {
                Score::mated(ply)
            } else {
                Score::new(0)
            }));
        }

        self.order(pos, &mut moves, hint, ply, NodeType::Pv);

        let mut tried = ArrayVec::<Move, 256>::new();
        let mut best = Pv::empty(Score::lower());
        let mut best_move = None;

        for idx in 0..moves.len() {
            let m = match moves.pick(idx) {
                Some(m) => m,
                None => break,
            };

            let next = pos.apply(m);
            tried.push(m);

            let pv = if idx == 0 {
                -self.pvs(&next, -beta, -alpha, depth - 1, ply + 1)?
            } else {
                let score = -self.scout(&next, -alpha, depth - 1, ply + 1, NodeType::Cut)?;
                if score > alpha && score < beta {
                    -self.pvs(&next, -beta, -alpha, depth - 1, ply + 1)?
                } else {
                    Pv::empty(score)
                }
            };

            if pv.score() > best.score() {
                best = pv.cons(m);
                best_move = Some(m);
            }

            alpha = alpha.max(best.score());
            if alpha >= beta {
                self.cutoff(pos, m, &tried, depth, ply);
                break;
            }
        }

        let bound = Bound::classify(best.score(), alpha_in, beta_in);
        let tpos = Transposition::new(bound, best.score().relative_to_root(ply), depth, best_move);
        self.tt.set(pos.zobrist(), tpos);

        Ok(best)
    }

    /// Searches the root moves at the given depth.
    ///
    /// The list is stable-sorted by the previous iteration's scores before
    /// searching, and each move's score is refreshed for the next iteration.
    fn root(
        &mut self,
        pos: &Position,
        moves: &mut MoveList,
        depth: u8,
        prev: Option<Move>,
    ) -> Result<Pv, Interrupt> {
        moves.sort();
        if let Some(m) = prev {
            moves.promote(m);
        }

        let (mut alpha, beta) = (Score::lower(), Score::upper());
        let mut best: Option<Pv> = None;

        for idx in 0..moves.len() {
            let m = moves[idx];
            let next = pos.apply(m);

            let pv = if idx == 0 {
                -self.pvs(&next, -beta, -alpha, depth - 1, 1)?
            } else {
                let score = -self.scout(&next, -alpha, depth - 1, 1, NodeType::Cut)?;
                if score > alpha {
                    -self.pvs(&next, -beta, -alpha, depth - 1, 1)?
                } else {
                    Pv::empty(score)
                }
            };

            moves[idx].set_score(pv.score().get());

            if best.as_ref().is_none_or(|b| pv.score() > b.score()) {
                alpha = alpha.max(pv.score());
                best = Some(pv.cons(m));
            }
        }

        let best = match best {
            Some(pv) => pv,
            None => unreachable!("the root has at least one move"),
        };

        let bound = Bound::classify(best.score(), Score::lower(), Score::upper());
        let tpos = Transposition::new(bound, best.score(), depth, best.head());
        self.tt.set(pos.zobrist(), tpos);

        Ok(best)
    }

    /// The iterative deepening driver.
    fn run(&mut self, pos: &Position, on_depth: &mut dyn FnMut(&Info)) -> Option<Move> {
        let mut moves = pos.moves();
        if moves.is_empty() {
            return None;
        }

        // Trust only completed depths; until one finishes, fall back to the
        // best move by static ordering.
        moves.sort();
        let mut best = moves.first().copied();
        let mut prev = None;

        for depth in 1..=self.ctrl.limits().max_depth() {
            match self.root(pos, &mut moves, depth, prev) {
                Err(Interrupt) => break,
                Ok(pv) => {
                    prev = pv.head();
                    best = pv.head().or(best);

                    let info = Info::new(
                        depth,
                        pv.score(),
                        self.ctrl.elapsed(),
                        self.ctrl.nodes(),
                        pv.line().clone(),
                    );

                    on_depth(&info);
                }
            }
        }

        best
    }
}

/// A chess search engine.
///
/// Owns the transposition and history tables, which are passed by reference
/// into each search; two concurrent searches therefore require two engines.
#[derive(Debug)]
pub struct Engine {
    tt: TranspositionTable,
    history: History,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Initializes the engine with the default [`Options`].
    pub fn new() -> Self {
        Self::with_options(&Options::default())
    }

    /// Initializes the engine with the given [`Options`].
    pub fn with_options(options: &Options) -> Self {
        Engine {
            tt: TranspositionTable::new(options.hash),
            history: History::default(),
        }
    }

    /// Clears all tables.
    ///
    /// Call between searches of unrelated root positions.
    pub fn reset(&mut self) {
        self.tt.clear();
        self.history.clear();
    }

    /// Searches a position within the budget enforced by `ctrl`.
    ///
    /// Reports progress after every completed depth and returns the best
    /// move, or `None` if the position is already final.
    pub fn search(
        &mut self,
        pos: &Position,
        ctrl: &Control,
        mut on_depth: impl FnMut(&Info),
    ) -> Option<Move> {
        Stack::new(&mut self.tt, &mut self.history, ctrl).run(pos, &mut on_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(fen: &str, limits: Limits) -> (Option<Move>, Vec<Info>) {
        let pos: Position = fen.parse().unwrap();
        let mut engine = Engine::with_options(&Options {
            hash: HashSize::from_mib(1),
        });

        let ctrl = Control::new(&pos, limits);
        let mut infos = Vec::new();
        let best = engine.search(&pos, &ctrl, |i| infos.push(i.clone()));
        (best, infos)
    }

    #[test]
    fn search_finds_the_back_rank_mate() {
        let (best, infos) = search("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1", Limits::Depth(3));
        assert_eq!(best.map(|m| m.to_string()), Some("e1e8".to_string()));
        assert_eq!(infos.last().map(|i| i.score()), Some(Score::mating(1)));
    }

    #[test]
    fn mate_scores_are_consistent_across_depths() {
        let (_, infos) = search("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1", Limits::Depth(6));
        for info in &infos[1..] {
            assert_eq!(info.score(), Score::mating(1));
        }
    }

    #[test]
    fn search_is_deterministic_with_a_fresh_engine() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3";
        let (a, infos_a) = search(fen, Limits::Depth(4));
        let (b, infos_b) = search(fen, Limits::Depth(4));

        assert_eq!(a, b);
        assert_eq!(
            infos_a.last().map(|i| i.score()),
            infos_b.last().map(|i| i.score())
        );
    }

    #[test]
    fn search_reports_progress_for_every_completed_depth() {
        let (_, infos) = search(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            Limits::Depth(4),
        );

        assert_eq!(
            infos.iter().map(|i| i.depth()).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );

        for info in &infos {
            assert!(info.pv().head().is_some());
        }
    }

    #[test]
    fn search_returns_none_for_final_positions() {
        // Stalemate.
        let (best, _) = search("k7/8/1Q6/8/8/8/8/K7 b - - 0 1", Limits::Depth(3));
        assert_eq!(best, None);

        // Checkmate.
        let (best, _) = search("7k/8/8/8/8/8/5PPP/r5K1 w - - 0 1", Limits::Depth(3));
        assert_eq!(best, None);
    }

    #[test]
    fn an_immediately_aborted_search_still_proposes_a_move() {
        let (best, infos) = search(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            Limits::Nodes(0),
        );

        assert!(best.is_some());
        assert!(infos.is_empty());
    }

    #[test]
    fn search_does_not_stalemate_when_winning() {
        // Qb6 would stalemate the bare king; any quiet continuation keeps
        // the queen advantage, so the search must score stalemate as zero
        // and steer clear of it.
        let pos: Position = "k7/8/2K5/8/8/8/8/6Q1 w - - 0 1".parse().unwrap();
        let mut engine = Engine::new();
        let ctrl = Control::new(&pos, Limits::Depth(4));
        let best = engine.search(&pos, &ctrl, |_| ());
        let next = pos.apply(best.unwrap());
        assert!(!next.is_stalemate());
    }

    #[test]
    fn the_principal_variation_is_a_playable_line() {
        let (_, infos) = search(
            "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
            Limits::Depth(5),
        );

        let info = infos.last().unwrap();
        let mut pos: Position = "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3"
            .parse()
            .unwrap();

        for m in info.pv().iter() {
            assert!(pos.moves().iter().any(|n| n == m), "{m} unplayable");
            pos = pos.apply(*m);
        }
    }
}
