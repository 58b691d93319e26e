use crate::chess::*;
use arrayvec::ArrayVec;
use derive_more::{Deref, DerefMut, IntoIterator};
use std::cmp::Reverse;

/// The ordering score of the least valuable capture.
///
/// Only moves scoring at least this much are considered noisy by the
/// quiescence search.
pub const NOISY_SCORE: i16 = 20_000;

const PROMOTION_SCORE: i16 = 25_000;
const CASTLE_SCORE: i16 = 50;

/// Most-valuable-victim/least-valuable-attacker ordering table.
#[rustfmt::skip]
const MVV_LVA: [[i16; 6]; 6] = [
    // attacker:  P    N    B    R    Q    K
    /* P */    [105, 104, 103, 102, 101, 100],
    /* N */    [205, 204, 203, 202, 201, 200],
    /* B */    [305, 304, 303, 302, 301, 300],
    /* R */    [405, 404, 403, 402, 401, 400],
    /* Q */    [505, 504, 503, 502, 501, 500],
    /* K */    [  0,   0,   0,   0,   0,   0],
];

#[inline(always)]
fn capture_score(attacker: Role, victim: Role) -> i16 {
    NOISY_SCORE + MVV_LVA[victim.index()][attacker.index()]
}

/// A bounded list of scored [`Move`]s generated fresh for one position.
#[derive(Debug, Default, Clone, Deref, DerefMut, IntoIterator)]
pub struct MoveList(ArrayVec<Move, 256>);

impl MoveList {
    /// Moves the given [`Move`] to the front, if present.
    ///
    /// Returns whether the hint was found.
    #[inline(always)]
    pub fn promote(&mut self, hint: Move) -> bool {
        match self.iter().position(|&m| m == hint) {
            None => false,
            Some(idx) => {
                self.0[..=idx].rotate_right(1);
                true
            }
        }
    }

    /// Sorts the list by descending ordering score.
    ///
    /// The sort is stable, so equally scored moves retain their order.
    #[inline(always)]
    pub fn sort(&mut self) {
        self.0.sort_by_key(|m| Reverse(m.score()));
    }

    /// Extracts the highest scored [`Move`] at or after `idx`.
    ///
    /// Swaps the extracted move into `idx`, so calling this with increasing
    /// indices yields the list highest first without sorting the tail.
    #[inline(always)]
    pub fn pick(&mut self, idx: usize) -> Option<Move> {
        let (offset, _) = self.0[idx..]
            .iter()
            .enumerate()
            .max_by_key(|(_, m)| m.score())?;

        self.0.swap(idx, idx + offset);
        Some(self.0[idx])
    }
}

impl FromIterator<Move> for MoveList {
    #[inline(always)]
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        MoveList(iter.into_iter().collect())
    }
}

impl Position {
    /// The legal moves that can be played in this position.
    ///
    /// Always returns a list, possibly empty; an empty list combined with
    /// [`Position::is_check`] distinguishes checkmate from stalemate.
    pub fn moves(&self) -> MoveList {
        let mut moves = MoveList::default();

        match self.checkers().len() {
            0 => self.generate(&mut moves),
            1 => self.generate_evasions(&mut moves),
            _ => self.generate_king_moves(&mut moves),
        }

        moves
    }

    #[inline(always)]
    fn push_pawn_move(&self, moves: &mut MoveList, wc: Square, wt: Square, victim: Option<Role>) {
        let eighth = Rank::EIGHTH.perspective(self.turn());

        if wt.rank() != eighth {
            let m = match victim {
                None => Move::quiet(wc, wt),
                Some(v) => {
                    let mut m = Move::capture(wc, wt);
                    m.set_score(capture_score(Role::Pawn, v));
                    m
                }
            };

            moves.push(m);
        } else {
            for role in [Role::Queen, Role::Rook, Role::Bishop, Role::Knight] {
                let mut m = Move::promotion(wc, wt, role, victim.is_some());
                let gain = match victim {
                    None => 0,
                    Some(v) => MVV_LVA[v.index()][Role::Pawn.index()],
                };

                m.set_score(PROMOTION_SCORE + role.value() as i16 / 10 + gain);
                moves.push(m);
            }
        }
    }

    fn generate_pawn_moves(&self, moves: &mut MoveList, targets: Bitboard) {
        let turn = self.turn();
        let ours = self.material(turn);
        let theirs = self.material(!turn);
        let occupied = ours | theirs;
        let king = self.king(turn);
        let piece = Piece::new(Role::Pawn, turn);
        let in_check = !self.checkers().is_empty();

        for wc in ours & self.by_role(Role::Pawn) {
            if in_check && self.pinned(turn).contains(wc) {
                continue;
            }

            let mut pushes = piece.moves(wc, ours, theirs);
            let mut captures = piece.attacks(wc, occupied) & theirs;
            if self.pinned(turn).contains(wc) {
                pushes &= Bitboard::line(king, wc);
                captures &= Bitboard::line(king, wc);
            }

            for wt in pushes & targets {
                self.push_pawn_move(moves, wc, wt, None);
            }

            for wt in captures & targets {
                let victim = self.role_on(wt).unwrap_or(Role::Pawn);
                self.push_pawn_move(moves, wc, wt, Some(victim));
            }

            if let Some(ep) = self.en_passant() {
                if piece.attacks(wc, occupied).contains(ep) {
                    let target = Square::new(ep.file(), wc.rank());
                    let resolves = targets.contains(ep) || targets.contains(target);

                    // Removing both pawns may expose the king along a rank.
                    let blockers = occupied.without(wc).without(target).with(ep);
                    if resolves && !self.is_threatened(king, !turn, blockers) {
                        let mut m = Move::en_passant(wc, ep);
                        m.set_score(capture_score(Role::Pawn, Role::Pawn));
                        moves.push(m);
                    }
                }
            }
        }
    }

    fn generate_piece_moves(&self, moves: &mut MoveList, targets: Bitboard) {
        let turn = self.turn();
        let ours = self.material(turn);
        let theirs = self.material(!turn);
        let king = self.king(turn);
        let in_check = !self.checkers().is_empty();

        for role in [Role::Knight, Role::Bishop, Role::Rook, Role::Queen] {
            let piece = Piece::new(role, turn);
            for wc in ours & self.by_role(role) {
                if self.pinned(turn).contains(wc) {
                    // A pinned piece can neither block nor capture a checker.
                    if in_check || role == Role::Knight {
                        continue;
                    }
                }

                let mut wts = piece.moves(wc, ours, theirs) & targets;
                if self.pinned(turn).contains(wc) {
                    wts &= Bitboard::line(king, wc);
                }

                for wt in wts {
                    let m = match self.role_on(wt) {
                        None => Move::quiet(wc, wt),
                        Some(victim) => {
                            let mut m = Move::capture(wc, wt);
                            m.set_score(capture_score(role, victim));
                            m
                        }
                    };

                    moves.push(m);
                }
            }
        }
    }

    fn generate_king_moves(&self, moves: &mut MoveList) {
        let turn = self.turn();
        let ours = self.material(turn);
        let theirs = self.material(!turn);
        let occupied = ours | theirs;
        let king = self.king(turn);
        let piece = Piece::new(Role::King, turn);

        let blockers = occupied.without(king);
        for wt in piece.moves(king, ours, theirs) {
            if !self.is_threatened(wt, !turn, blockers) {
                let m = match self.role_on(wt) {
                    None => Move::quiet(king, wt),
                    Some(victim) => {
                        let mut m = Move::capture(king, wt);
                        m.set_score(capture_score(Role::King, victim));
                        m
                    }
                };

                moves.push(m);
            }
        }
    }

    fn generate_castles(&self, moves: &mut MoveList) {
        let turn = self.turn();
        let occupied = self.occupied();
        let back = Rank::FIRST.perspective(turn);
        let king = self.king(turn);

        if self.castles().short(turn) {
            let f = Square::new(File::F, back);
            let g = Square::new(File::G, back);
            let path = f.bitboard().with(g);

            if (occupied & path).is_empty()
                && !path
                    .iter()
                    .any(|sq| self.is_threatened(sq, !turn, occupied))
            {
                let mut m = Move::castle(king, g);
                m.set_score(CASTLE_SCORE);
                moves.push(m);
            }
        }

        if self.castles().long(turn) {
            let b = Square::new(File::B, back);
            let c = Square::new(File::C, back);
            let d = Square::new(File::D, back);
            let path = c.bitboard().with(d);

            if (occupied & path.with(b)).is_empty()
                && !path
                    .iter()
                    .any(|sq| self.is_threatened(sq, !turn, occupied))
            {
                let mut m = Move::castle(king, c);
                m.set_score(CASTLE_SCORE);
                moves.push(m);
            }
        }
    }

    fn generate(&self, moves: &mut MoveList) {
        self.generate_pawn_moves(moves, Bitboard::full());
        self.generate_piece_moves(moves, Bitboard::full());
        self.generate_king_moves(moves);
        self.generate_castles(moves);
    }

    fn generate_evasions(&self, moves: &mut MoveList) {
        let turn = self.turn();
        let king = self.king(turn);
        let checker = match self.checkers().first() {
            None => return,
            Some(sq) => sq,
        };

        // Capture the checker or interpose on the ray towards the king.
        let targets = Bitboard::between(king, checker).with(checker);
        self.generate_pawn_moves(moves, targets);
        self.generate_piece_moves(moves, targets);
        self.generate_king_moves(moves);
    }
}
