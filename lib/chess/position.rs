use crate::chess::*;
use derive_more::{Debug, Display, Error, From};
use std::fmt::{self, Formatter};
use std::hash::{Hash, Hasher};
use std::num::NonZeroU64;
use std::str::FromStr;

#[cfg(test)]
use proptest::{prelude::*, sample::Selector};

/// The number of positions per side remembered for repetition detection.
const HISTORY: usize = 32;

/// The current position on the board.
///
/// This type guarantees that it only holds valid positions. A position is an
/// immutable snapshot: applying a move constructs the successor rather than
/// mutating in place, and each search recursion level owns its own copy.
#[derive(Debug, Clone, Eq)]
#[debug("Position({self})")]
pub struct Position {
    board: Board,
    zobrists: Zobrists,
    checkers: Bitboard,
    pinned: [Bitboard; 2],
    checks: [Bitboard; 6],
    history: [[Option<NonZeroU64>; HISTORY]; 2],
}

impl Default for Position {
    #[inline(always)]
    fn default() -> Self {
        let board = Board::default();
        let mut pos = Position {
            zobrists: board.zobrists(),
            checkers: Bitboard::empty(),
            pinned: [Bitboard::empty(); 2],
            checks: [Bitboard::empty(); 6],
            history: [[None; HISTORY]; 2],
            board,
        };

        pos.refresh();
        pos
    }
}

impl Hash for Position {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.board.hash(state);
    }
}

impl PartialEq for Position {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.board.eq(&other.board)
    }
}

#[cfg(test)]
impl Arbitrary for Position {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    /// Samples positions by playing random legal moves from the start.
    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (0..48usize, any::<Selector>())
            .prop_map(|(plies, selector)| {
                let mut pos = Position::default();

                for _ in 0..plies {
                    let moves = pos.moves();
                    if moves.is_empty() || pos.is_draw() {
                        break;
                    }

                    pos = pos.apply(*selector.select(moves.iter()));
                }

                pos
            })
            .no_shrink()
            .boxed()
    }
}

impl Position {
    /// The side to move.
    #[inline(always)]
    pub fn turn(&self) -> Color {
        self.board.turn
    }

    /// The number of halfmoves since the last capture or pawn advance.
    #[inline(always)]
    pub fn halfmoves(&self) -> u8 {
        self.board.halfmoves
    }

    /// The current move number since the start of the game.
    #[inline(always)]
    pub fn fullmoves(&self) -> u32 {
        self.board.fullmoves
    }

    /// The en passant square.
    #[inline(always)]
    pub fn en_passant(&self) -> Option<Square> {
        self.board.en_passant
    }

    /// The castle rights.
    #[inline(always)]
    pub fn castles(&self) -> Castles {
        self.board.castles
    }

    /// [`Square`]s occupied.
    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.board.occupied()
    }

    /// [`Square`]s occupied by pieces of a [`Color`].
    #[inline(always)]
    pub fn material(&self, side: Color) -> Bitboard {
        self.board.by_color(side)
    }

    /// [`Square`]s occupied by pieces of a [`Role`].
    #[inline(always)]
    pub fn by_role(&self, role: Role) -> Bitboard {
        self.board.by_role(role)
    }

    /// [`Square`]s occupied by a [`Piece`].
    #[inline(always)]
    pub fn by_piece(&self, piece: Piece) -> Bitboard {
        self.board.by_piece(piece)
    }

    /// The number of pieces of this kind on the board.
    #[inline(always)]
    pub fn count(&self, piece: Piece) -> usize {
        self.board.count(piece)
    }

    /// The [`Piece`] on the given [`Square`], if any.
    #[inline(always)]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board.piece_on(sq)
    }

    /// The [`Role`] of the piece on the given [`Square`], if any.
    #[inline(always)]
    pub fn role_on(&self, sq: Square) -> Option<Role> {
        self.board.role_on(sq)
    }

    /// [`Square`] occupied by the king of a [`Color`].
    #[inline(always)]
    pub fn king(&self, side: Color) -> Square {
        match self.board.king(side) {
            Some(sq) => sq,
            None => unreachable!("a position always has both kings"),
        }
    }

    /// The incremental placement sums.
    #[inline(always)]
    pub fn tabs(&self) -> Tabs {
        self.board.tabs()
    }

    /// An iterator over all pieces on the board.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = (Piece, Square)> + '_ {
        self.board.iter()
    }

    /// This position's [`Zobrist`] key.
    #[inline(always)]
    pub fn zobrist(&self) -> Zobrist {
        self.zobrists.hash
    }

    /// The [`Zobrist`] key of this position's pawn structure.
    #[inline(always)]
    pub fn pawn_zobrist(&self) -> Zobrist {
        self.zobrists.pawns
    }

    /// [`Square`]s occupied by pieces giving check to the side to move.
    #[inline(always)]
    pub fn checkers(&self) -> Bitboard {
        self.checkers
    }

    /// [`Square`]s occupied by pieces of a [`Color`] pinned to their own king.
    #[inline(always)]
    pub fn pinned(&self, side: Color) -> Bitboard {
        self.pinned[side.index()]
    }

    /// [`Square`]s from which a piece of the side to move of this [`Role`]
    /// would give check.
    #[inline(always)]
    pub fn check_squares(&self, role: Role) -> Bitboard {
        self.checks[role.index()]
    }

    /// Whether a [`Square`] is attacked by a piece of a [`Color`] under the
    /// given occupancy.
    #[inline(always)]
    pub fn is_threatened(&self, sq: Square, side: Color, occupied: Bitboard) -> bool {
        self.board.is_threatened(sq, side, occupied)
    }

    /// Whether the side to move is in check.
    #[inline(always)]
    pub fn is_check(&self) -> bool {
        !self.checkers.is_empty()
    }

    /// Whether the side to move is checkmated.
    #[inline(always)]
    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.moves().is_empty()
    }

    /// Whether the side to move is stalemated.
    #[inline(always)]
    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.moves().is_empty()
    }

    /// How many earlier positions in the game share this position's key.
    #[inline(always)]
    pub fn repetitions(&self) -> usize {
        match NonZeroU64::new(self.zobrists.hash.get()) {
            None => 0,
            hash => {
                let history = &self.history[self.turn().index()];
                history.iter().filter(|h| **h == hash).count()
            }
        }
    }

    /// Whether the game is drawn by repetition.
    #[inline(always)]
    pub fn is_draw_by_repetition(&self) -> bool {
        self.repetitions() > 0
    }

    /// Whether the game is drawn by the fifty-move rule.
    #[inline(always)]
    pub fn is_draw_by_fifty_moves(&self) -> bool {
        self.board.halfmoves >= 100
    }

    /// Whether neither side retains enough material to deliver mate.
    pub fn has_insufficient_material(&self) -> bool {
        let majors =
            self.by_role(Role::Pawn) | self.by_role(Role::Rook) | self.by_role(Role::Queen);

        if !majors.is_empty() {
            return false;
        }

        let knights = self.by_role(Role::Knight);
        let bishops = self.by_role(Role::Bishop);

        if bishops.is_empty() {
            let each = (knights & self.material(Color::White)).len() == 1
                && (knights & self.material(Color::Black)).len() == 1;
            return knights.len() <= 1 || each;
        }

        knights.is_empty()
            && ((bishops & Bitboard::light()).is_empty()
                || (bishops & Bitboard::dark()).is_empty())
    }

    /// Whether the game is drawn by rule.
    #[inline(always)]
    pub fn is_draw(&self) -> bool {
        self.is_draw_by_fifty_moves()
            || self.is_draw_by_repetition()
            || self.has_insufficient_material()
    }

    /// Recomputes checkers, pins, and check squares for the current board.
    ///
    /// Any move can create or resolve a pin or check anywhere, so these are
    /// refreshed wholesale after every move rather than patched.
    fn refresh(&mut self) {
        let turn = self.turn();
        let occupied = self.occupied();
        let ek = self.king(!turn);

        self.checkers = self.board.checkers(turn);
        self.pinned = [
            self.board.pins(Color::White),
            self.board.pins(Color::Black),
        ];

        let bishop = Piece::new(Role::Bishop, turn).attacks(ek, occupied);
        let rook = Piece::new(Role::Rook, turn).attacks(ek, occupied);
        self.checks = [
            Piece::new(Role::Pawn, !turn).attacks(ek, occupied),
            Piece::new(Role::Knight, turn).attacks(ek, occupied),
            bishop,
            rook,
            bishop | rook,
            Bitboard::empty(),
        ];
    }

    /// Applies a [`Move`], returning the resulting snapshot.
    ///
    /// The move must come from this position's legal move set.
    pub fn apply(&self, m: Move) -> Position {
        debug_assert!(self.moves().iter().any(|&n| n == m), "illegal move {m}");

        let mut next = self.clone();
        next.play(m);

        debug_assert!(next.board.checkers(!next.turn()).is_empty());
        next
    }

    fn play(&mut self, m: Move) {
        let turn = self.turn();
        let (wc, wt) = (m.whence(), m.whither());
        let role = match self.role_on(wc) {
            Some(r) => r,
            None => unreachable!("no piece to move"),
        };

        let victim = if m.is_en_passant() {
            Some((Role::Pawn, Square::new(wt.file(), wc.rank())))
        } else if m.is_capture() {
            self.role_on(wt).map(|r| (r, wt))
        } else {
            None
        };

        if turn == Color::Black {
            self.board.fullmoves += 1;
        }

        if role == Role::Pawn || victim.is_some() {
            self.board.halfmoves = 0;
            self.history = [[None; HISTORY]; 2];
        } else {
            self.board.halfmoves += 1;
            let history = &mut self.history[turn.index()];
            history.copy_within(..HISTORY - 1, 1);
            history[0] = NonZeroU64::new(self.zobrists.hash.get());
        }

        self.board.turn = !turn;
        self.zobrists.hash ^= ZobristNumbers::turn();

        if let Some(ep) = self.board.en_passant.take() {
            self.zobrists.hash ^= ZobristNumbers::en_passant(ep.file());
        }

        if let Some((r, target)) = victim {
            let piece = Piece::new(r, !turn);
            self.board.toggle(piece, target);
            self.zobrists.toggle(piece, target);
        }

        let piece = Piece::new(role, turn);
        self.board.toggle(piece, wc);
        self.board.toggle(piece, wt);
        self.zobrists.toggle(piece, wc);
        self.zobrists.toggle(piece, wt);

        if let Some(promotion) = m.promotion() {
            let pawn = Piece::new(Role::Pawn, turn);
            let promoted = Piece::new(promotion, turn);
            self.board.toggle(pawn, wt);
            self.board.toggle(promoted, wt);
            self.zobrists.toggle(pawn, wt);
            self.zobrists.toggle(promoted, wt);
        } else if role == Role::Pawn && (wt.get() as i8 - wc.get() as i8).abs() == 16 {
            let ep = Square::new(wc.file(), Rank::THIRD.perspective(turn));
            self.board.en_passant = Some(ep);
            self.zobrists.hash ^= ZobristNumbers::en_passant(ep.file());
        } else if m.is_castle() {
            let back = Rank::FIRST.perspective(turn);
            let (rf, rt) = if wt.file() == File::G {
                (Square::new(File::H, back), Square::new(File::F, back))
            } else {
                (Square::new(File::A, back), Square::new(File::D, back))
            };

            let rook = Piece::new(Role::Rook, turn);
            self.board.toggle(rook, rf);
            self.board.toggle(rook, rt);
            self.zobrists.toggle(rook, rf);
            self.zobrists.toggle(rook, rt);
        }

        let disrupted = Castles::disrupted(wc) | Castles::disrupted(wt);
        if self.castles() & disrupted != Castles::none() {
            self.zobrists.hash ^= ZobristNumbers::castling(self.castles());
            self.board.castles &= !disrupted;
            self.zobrists.hash ^= ZobristNumbers::castling(self.castles());
        }

        self.refresh();
    }

    /// Whether a speculative [`Move`] is plausible on this board.
    ///
    /// Validates the piece kind against the destination and the occupancy
    /// masked by `allowed`, independent of check status; used to vet a stored
    /// table move before moves are generated.
    pub fn is_structurally_valid(&self, m: Move, allowed: Bitboard) -> bool {
        let turn = self.turn();
        let (wc, wt) = (m.whence(), m.whither());

        let role = match self.piece_on(wc) {
            Some(p) if p.color() == turn => p.role(),
            _ => return false,
        };

        if !allowed.contains(wt) {
            return false;
        }

        let ours = self.material(turn);
        let theirs = self.material(!turn);
        let occupied = ours | theirs;
        let piece = Piece::new(role, turn);

        if m.is_en_passant() {
            return role == Role::Pawn
                && self.en_passant() == Some(wt)
                && piece.attacks(wc, occupied).contains(wt);
        }

        if m.is_capture() != theirs.contains(wt) || ours.contains(wt) {
            return false;
        }

        if m.is_promotion() {
            if role != Role::Pawn || wt.rank() != Rank::EIGHTH.perspective(turn) {
                return false;
            }
        } else if role == Role::Pawn && wt.rank() == Rank::EIGHTH.perspective(turn) {
            return false;
        }

        if m.is_castle() {
            if role != Role::King || wc != Square::new(File::E, Rank::FIRST.perspective(turn)) {
                return false;
            }

            let back = Rank::FIRST.perspective(turn);
            return if wt == Square::new(File::G, back) {
                let path = Square::new(File::F, back).bitboard().with(wt);
                self.castles().short(turn) && (occupied & path).is_empty()
            } else if wt == Square::new(File::C, back) {
                let path = wt.bitboard().with(Square::new(File::D, back));
                let b = Square::new(File::B, back);
                self.castles().long(turn) && (occupied & path.with(b)).is_empty()
            } else {
                false
            };
        }

        match role {
            Role::Pawn if m.is_capture() => piece.attacks(wc, occupied).contains(wt),
            Role::Pawn => piece.moves(wc, ours, theirs).contains(wt),
            _ => piece.attacks(wc, occupied).contains(wt),
        }
    }

    /// Whether a speculative [`Move`] is legal in this position.
    ///
    /// Cheap re-validation for a hint move coming from the transposition
    /// table or the principal variation; agrees exactly with the move
    /// generator's output set.
    pub fn is_legal(&self, m: Move) -> bool {
        if !self.is_structurally_valid(m, Bitboard::full()) {
            return false;
        }

        let turn = self.turn();
        let (wc, wt) = (m.whence(), m.whither());
        let king = self.king(turn);
        let occupied = self.occupied();

        if m.is_castle() {
            if self.is_check() {
                return false;
            }

            let back = Rank::FIRST.perspective(turn);
            let path = if wt.file() == File::G {
                Square::new(File::F, back).bitboard().with(wt)
            } else {
                Square::new(File::D, back).bitboard().with(wt)
            };

            return !path
                .iter()
                .any(|sq| self.is_threatened(sq, !turn, occupied));
        }

        if wc == king {
            return !self.is_threatened(wt, !turn, occupied.without(king));
        }

        match self.checkers().len() {
            0 => {}
            1 => {
                let checker = match self.checkers().first() {
                    Some(sq) => sq,
                    None => return false,
                };

                let blocks = Bitboard::between(king, checker).with(checker);
                let resolves = blocks.contains(wt)
                    || (m.is_en_passant() && Square::new(wt.file(), wc.rank()) == checker);

                if !resolves || self.pinned(turn).contains(wc) {
                    return false;
                }
            }
            _ => return false,
        }

        if self.pinned(turn).contains(wc) && !Bitboard::line(king, wc).contains(wt) {
            return false;
        }

        if m.is_en_passant() {
            let target = Square::new(wt.file(), wc.rank());
            let blockers = occupied.without(wc).without(target).with(wt);
            return !self.is_threatened(king, !turn, blockers);
        }

        true
    }

    /// Whether playing this [`Move`] gives check.
    ///
    /// O(1) via the precomputed check squares plus discovered-check
    /// detection; castling, promotion, and en passant are resolved exactly.
    pub fn gives_check(&self, m: Move) -> bool {
        let turn = self.turn();
        let ek = self.king(!turn);
        let (wc, wt) = (m.whence(), m.whither());
        let role = match self.role_on(wc) {
            Some(r) => r,
            None => return false,
        };

        if m.is_castle() {
            let back = Rank::FIRST.perspective(turn);
            let (rf, rt) = if wt.file() == File::G {
                (Square::new(File::H, back), Square::new(File::F, back))
            } else {
                (Square::new(File::A, back), Square::new(File::D, back))
            };

            let occupied = self.occupied().without(wc).without(rf).with(wt).with(rt);
            return Piece::new(Role::Rook, turn).attacks(rt, occupied).contains(ek);
        }

        match m.promotion() {
            None => {
                if self.check_squares(role).contains(wt) {
                    return true;
                }
            }
            Some(promotion) => {
                let occupied = self.occupied().without(wc).with(wt);
                if Piece::new(promotion, turn).attacks(wt, occupied).contains(ek) {
                    return true;
                }
            }
        }

        let mut occupied = self.occupied().without(wc).with(wt);
        if m.is_en_passant() {
            occupied = occupied.without(Square::new(wt.file(), wc.rank()));
        }

        !self.board.attackers(ek, turn, occupied).is_empty()
    }

    /// Statically evaluates the exchanges on this [`Move`]'s destination.
    ///
    /// Resolves successive captures in ascending attacker value order,
    /// re-admitting X-ray attackers as nearer pieces are removed, and folds
    /// the gain sequence into the net value of optimal mutual trading. The
    /// king may not capture while the square remains defended. Pins are
    /// ignored.
    pub fn see(&self, m: Move) -> i32 {
        let turn = self.turn();
        let wt = m.whither();

        let mut victim = match self.role_on(m.whence()) {
            Some(r) => r,
            None => return 0,
        };

        let mut occupied = self.occupied().without(m.whence());
        let mut gain = [0i32; 33];
        gain[0] = if m.is_en_passant() {
            occupied = occupied.without(Square::new(wt.file(), m.whence().rank()));
            Role::Pawn.value()
        } else {
            self.role_on(wt).map_or(0, Role::value)
        };

        let bishops = self.by_role(Role::Bishop) | self.by_role(Role::Queen);
        let rooks = self.by_role(Role::Rook) | self.by_role(Role::Queen);

        let mut side = !turn;
        let mut attackers = (self.board.attackers(wt, turn, occupied)
            | self.board.attackers(wt, !turn, occupied))
            & occupied;

        let mut d = 0;
        loop {
            let candidates = attackers & self.material(side);
            let Some((sq, role)) = Role::iter()
                .find_map(|r| (candidates & self.by_role(r)).first().map(|sq| (sq, r)))
            else {
                break;
            };

            if role == Role::King && !(attackers & self.material(!side)).is_empty() {
                break;
            }

            d += 1;
            gain[d] = victim.value() - gain[d - 1];
            victim = role;

            occupied = occupied.without(sq);
            attackers |= Piece::new(Role::Bishop, side).attacks(wt, occupied) & bishops;
            attackers |= Piece::new(Role::Rook, side).attacks(wt, occupied) & rooks;
            attackers &= occupied;
            side = !side;
        }

        while d > 0 {
            gain[d - 1] = -(-gain[d - 1]).max(gain[d]);
            d -= 1;
        }

        gain[0]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.board, f)
    }
}

/// The reason why parsing a [`Position`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error, From)]
pub enum ParsePositionError {
    #[display("failed to parse position")]
    InvalidFen(ParseFenError),
    #[display("illegal position")]
    IllegalPosition,
}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let board: Board = s.parse()?;

        for side in Color::iter() {
            if board.by_piece(Piece::new(Role::King, side)).len() != 1 {
                return Err(ParsePositionError::IllegalPosition);
            }
        }

        if !board.checkers(!board.turn).is_empty() {
            return Err(ParsePositionError::IllegalPosition);
        }

        let mut pos = Position {
            zobrists: board.zobrists(),
            checkers: Bitboard::empty(),
            pinned: [Bitboard::empty(); 2],
            checks: [Bitboard::empty(); 6],
            history: [[None; HISTORY]; 2],
            board,
        };

        pos.refresh();
        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn occupancy_equals_the_union_of_all_placement_bitboards(pos: Position) {
        let union = Role::iter().fold(Bitboard::empty(), |bb, r| bb | pos.by_role(r));
        assert_eq!(pos.occupied(), union);
        assert_eq!(
            pos.material(Color::White) & pos.material(Color::Black),
            Bitboard::empty()
        );
    }

    #[proptest]
    fn piece_lookup_is_the_exact_inverse_of_the_bitboards(pos: Position) {
        for sq in Square::iter() {
            match pos.piece_on(sq) {
                None => assert!(!pos.occupied().contains(sq)),
                Some(p) => assert!(pos.by_piece(p).contains(sq)),
            }
        }
    }

    #[proptest]
    fn each_side_has_exactly_one_king(pos: Position) {
        for side in Color::iter() {
            assert_eq!(pos.by_piece(Piece::new(Role::King, side)).len(), 1);
        }
    }

    #[proptest]
    fn incremental_keys_match_a_from_scratch_recomputation(pos: Position) {
        assert_eq!(pos.zobrist(), pos.board.zobrists().hash);
        assert_eq!(pos.pawn_zobrist(), pos.board.zobrists().pawns);
    }

    #[proptest]
    fn every_generated_move_is_legal_and_structurally_valid(pos: Position) {
        for &m in pos.moves().iter() {
            assert!(pos.is_structurally_valid(m, Bitboard::full()), "{m}");
            assert!(pos.is_legal(m), "{m}");
        }
    }

    #[proptest]
    fn every_legal_move_is_generated(pos: Position) {
        // Construct plausible moves exhaustively and compare the verdicts.
        let moves = pos.moves();
        for wc in pos.material(pos.turn()) {
            for wt in Square::iter() {
                for m in [
                    Move::quiet(wc, wt),
                    Move::capture(wc, wt),
                    Move::castle(wc, wt),
                    Move::en_passant(wc, wt),
                    Move::promotion(wc, wt, Role::Queen, false),
                    Move::promotion(wc, wt, Role::Queen, true),
                ] {
                    assert_eq!(
                        pos.is_legal(m),
                        moves.iter().any(|&n| n == m),
                        "{m} in {pos}"
                    );
                }
            }
        }
    }

    #[proptest]
    fn applying_a_legal_move_preserves_all_invariants(
        #[filter(!#pos.moves().is_empty())] pos: Position,
        selector: Selector,
    ) {
        let m = *selector.select(pos.moves().iter());
        let next = pos.apply(m);

        assert_ne!(next.turn(), pos.turn());
        assert_eq!(next.piece_on(m.whence()), None);
        assert_eq!(next.zobrist(), next.board.zobrists().hash);
        assert_eq!(next.pawn_zobrist(), next.board.zobrists().pawns);
        assert_eq!(next.checkers(), next.board.checkers(next.turn()));
        assert!(next.board.checkers(pos.turn()).is_empty());
    }

    #[proptest]
    fn fifty_move_counter_resets_exactly_on_pawn_moves_and_captures(
        #[filter(!#pos.moves().is_empty())] pos: Position,
        selector: Selector,
    ) {
        let m = *selector.select(pos.moves().iter());
        let pawn = pos.role_on(m.whence()) == Some(Role::Pawn);
        let next = pos.apply(m);

        if pawn || m.is_capture() {
            assert_eq!(next.halfmoves(), 0);
        } else {
            assert_eq!(next.halfmoves(), pos.halfmoves() + 1);
        }
    }

    #[proptest]
    fn gives_check_predicts_the_resulting_position(
        #[filter(!#pos.moves().is_empty())] pos: Position,
        selector: Selector,
    ) {
        let m = *selector.select(pos.moves().iter());
        assert_eq!(pos.gives_check(m), pos.apply(m).is_check(), "{m} in {pos}");
    }

    #[test]
    fn repetition_is_flagged_no_later_than_the_third_occurrence() {
        let mut pos = Position::default();

        // Shuffle knights back and forth until the start position repeats.
        for (wc, wt) in [
            (Square::G1, Square::F3),
            (Square::G8, Square::F6),
            (Square::F3, Square::G1),
            (Square::F6, Square::G8),
        ] {
            assert!(!pos.is_draw_by_repetition());
            pos = pos.apply(Move::quiet(wc, wt));
        }

        assert!(pos.is_draw_by_repetition());
    }

    #[test]
    fn pinned_pieces_may_not_leave_the_ray() {
        let pos: Position = "4k3/8/8/8/8/4r3/4R3/4K3 w - - 0 1".parse().unwrap();
        assert!(pos.pinned(Color::White).contains(Square::E2));
        assert!(pos.is_legal(Move::capture(Square::E2, Square::E3)));
        assert!(!pos.is_legal(Move::quiet(Square::E2, Square::A2)));
    }

    #[test]
    fn the_king_may_not_step_into_an_attacked_square() {
        let pos: Position = "4k3/8/8/8/8/8/r7/4K3 w - - 0 1".parse().unwrap();
        assert!(!pos.is_legal(Move::quiet(Square::E1, Square::D2)));
        assert!(pos.is_legal(Move::quiet(Square::E1, Square::F1)));
    }

    #[test]
    fn castling_through_check_is_rejected() {
        let pos: Position = "4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1".parse().unwrap();
        let short = Move::castle(Square::E1, Square::G1);
        let long = Move::castle(Square::E1, Square::C1);
        assert!(!pos.is_legal(short));
        assert!(pos.is_legal(long));
    }

    #[test]
    fn exchange_evaluation_matches_manual_arithmetic() {
        // A defended pawn captured by a knight loses knight for pawn.
        let pos: Position = "4k3/3p4/4p3/8/3N4/8/8/4K3 w - - 0 1".parse().unwrap();
        let m = Move::capture(Square::D4, Square::E6);
        assert_eq!(pos.see(m), Role::Pawn.value() - Role::Knight.value());

        // An undefended pawn is won outright.
        let pos: Position = "4k3/8/4p3/8/3N4/8/8/4K3 w - - 0 1".parse().unwrap();
        let m = Move::capture(Square::D4, Square::E6);
        assert_eq!(pos.see(m), Role::Pawn.value());
    }

    #[test]
    fn exchange_evaluation_readmits_xray_attackers() {
        // The white queen behind the rook keeps the capture sound.
        let pos: Position = "7k/3r4/8/3p4/8/3R4/3Q4/3K4 w - - 0 1".parse().unwrap();
        let m = Move::capture(Square::D3, Square::D5);
        assert_eq!(pos.see(m), Role::Pawn.value());

        // With a black queen stacked behind the rook the exchange turns sour:
        // after RxP rxR the fold stops, netting a pawn for a rook.
        let pos: Position = "3q3k/3r4/8/3p4/8/3R4/3Q4/3K4 w - - 0 1".parse().unwrap();
        let m = Move::capture(Square::D3, Square::D5);
        assert_eq!(pos.see(m), Role::Pawn.value() - Role::Rook.value());
    }

    #[test]
    fn the_king_may_not_recapture_a_defended_piece_in_exchanges() {
        // The black king would love to take back, but the pawn guards d5.
        let pos: Position = "8/8/3k4/3p4/4P3/3R4/8/4K3 w - - 0 1".parse().unwrap();
        let m = Move::capture(Square::D3, Square::D5);
        assert_eq!(pos.see(m), Role::Pawn.value());
    }

    #[test]
    fn insufficient_material_is_detected() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/2N1K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/2B1K3 w - - 0 1",
            "2b1k3/8/8/8/8/8/8/4KB2 w - - 0 1",
            "2n1k3/8/8/8/8/8/8/2N1K3 w - - 0 1",
        ] {
            let pos: Position = fen.parse().unwrap();
            assert!(pos.has_insufficient_material(), "{fen}");
        }

        for fen in [
            "4k3/8/8/8/8/8/8/3QK3 w - - 0 1",
            "4k3/8/8/8/8/8/8/1NN1K3 w - - 0 1",
            "1b2k3/8/8/8/8/8/8/4KB2 w - - 0 1",
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
        ] {
            let pos: Position = fen.parse().unwrap();
            assert!(!pos.has_insufficient_material(), "{fen}");
        }
    }

    #[proptest]
    fn printed_position_round_trips_through_the_parser(pos: Position) {
        assert_eq!(pos.to_string().parse(), Ok(pos.clone()));
    }

    #[test]
    fn parsing_rejects_positions_without_kings() {
        assert_eq!(
            "8/8/8/8/8/8/8/4K3 w - - 0 1".parse::<Position>(),
            Err(ParsePositionError::IllegalPosition)
        );
    }

    #[test]
    fn parsing_rejects_positions_with_a_capturable_king() {
        // White is in check with black to move.
        assert_eq!(
            "4k3/8/8/8/8/8/4r3/4K3 b - - 0 1".parse::<Position>().ok(),
            None
        );
    }
}
