use crate::chess::*;
use crate::eval;
use derive_more::{Display, Error};
use std::fmt::{self, Formatter, Write};
use std::str::FromStr;

/// A [`Position`]'s incrementally maintained [`Zobrist`] keys.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Zobrists {
    /// Hashes the entire position.
    pub hash: Zobrist,
    /// Hashes the pawn structure only.
    pub pawns: Zobrist,
}

impl Zobrists {
    /// Toggles a [`Piece`] on a [`Square`] in both keys.
    #[inline(always)]
    pub fn toggle(&mut self, p: Piece, sq: Square) {
        self.hash ^= ZobristNumbers::psq(p, sq);

        if p.role() == Role::Pawn {
            self.pawns ^= ZobristNumbers::psq(p, sq);
        }
    }
}

/// The chess board.
///
/// Holds the piece placement and the fields of state that are derived from it
/// incrementally as pieces are toggled on and off.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Board {
    roles: [Bitboard; 6],
    colors: [Bitboard; 2],
    pieces: [Option<Piece>; 64],
    counts: [u8; 12],
    tabs: Tabs,
    pub turn: Color,
    pub castles: Castles,
    pub en_passant: Option<Square>,
    pub halfmoves: u8,
    pub fullmoves: u32,
}

/// Incremental midgame/endgame piece-placement sums and the game phase.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Tabs {
    /// Midgame placement sum, white minus black.
    pub mg: i32,
    /// Endgame placement sum, white minus black.
    pub eg: i32,
    /// Remaining game phase, 24 at the starting position.
    pub phase: i32,
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            .parse()
            .expect("the starting position is a valid FEN")
    }
}

impl Board {
    /// An empty board with white to move.
    #[inline(always)]
    fn empty() -> Self {
        Board {
            roles: [Bitboard::empty(); 6],
            colors: [Bitboard::empty(); 2],
            pieces: [None; 64],
            counts: [0; 12],
            tabs: Tabs::default(),
            turn: Color::White,
            castles: Castles::none(),
            en_passant: None,
            halfmoves: 0,
            fullmoves: 1,
        }
    }

    /// [`Square`]s occupied.
    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.colors[Color::White.index()] ^ self.colors[Color::Black.index()]
    }

    /// [`Square`]s occupied by pieces of a [`Color`].
    #[inline(always)]
    pub fn by_color(&self, c: Color) -> Bitboard {
        self.colors[c.index()]
    }

    /// [`Square`]s occupied by pieces of a [`Role`].
    #[inline(always)]
    pub fn by_role(&self, r: Role) -> Bitboard {
        self.roles[r.index()]
    }

    /// [`Square`]s occupied by a [`Piece`].
    #[inline(always)]
    pub fn by_piece(&self, p: Piece) -> Bitboard {
        self.by_color(p.color()) & self.by_role(p.role())
    }

    /// The [`Piece`] on the given [`Square`], if any.
    #[inline(always)]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.pieces[sq.index()]
    }

    /// The [`Role`] of the piece on the given [`Square`], if any.
    #[inline(always)]
    pub fn role_on(&self, sq: Square) -> Option<Role> {
        self.piece_on(sq).map(Piece::role)
    }

    /// The number of pieces of this kind on the board.
    #[inline(always)]
    pub fn count(&self, p: Piece) -> usize {
        self.counts[p.index()] as usize
    }

    /// [`Square`] occupied by the king of a [`Color`].
    #[inline(always)]
    pub fn king(&self, side: Color) -> Option<Square> {
        self.by_piece(Piece::new(Role::King, side)).first()
    }

    /// The incremental placement sums.
    #[inline(always)]
    pub fn tabs(&self) -> Tabs {
        self.tabs
    }

    /// An iterator over all pieces on the board.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = (Piece, Square)> + '_ {
        Piece::iter().flat_map(|p| self.by_piece(p).into_iter().map(move |sq| (p, sq)))
    }

    /// Toggles a piece on a square.
    #[inline(always)]
    pub fn toggle(&mut self, p: Piece, sq: Square) {
        debug_assert!(self.piece_on(sq).is_none_or(|q| p == q));

        let bit = sq.bitboard();
        let gone = self.pieces[sq.index()].take().is_some();
        if !gone {
            self.pieces[sq.index()] = Some(p);
        }

        self.roles[p.role().index()] ^= bit;
        self.colors[p.color().index()] ^= bit;

        let sign = if gone { -1 } else { 1 };
        self.counts[p.index()] = (self.counts[p.index()] as i8 + sign as i8) as u8;

        let (mg, eg) = eval::weights(p, sq);
        self.tabs.mg += sign * mg;
        self.tabs.eg += sign * eg;
        self.tabs.phase += sign * eval::phase_weight(p.role());
    }

    /// Pieces of a [`Color`] attacking a [`Square`] under the given occupancy.
    #[inline(always)]
    pub fn attackers(&self, sq: Square, side: Color, occupied: Bitboard) -> Bitboard {
        let theirs = self.by_color(side);
        let queens = self.by_role(Role::Queen);

        let mut attackers = Piece::new(Role::Pawn, !side).attacks(sq, occupied)
            & theirs
            & self.by_role(Role::Pawn);

        attackers |= Piece::new(Role::Knight, side).attacks(sq, occupied)
            & theirs
            & self.by_role(Role::Knight);

        attackers |= Piece::new(Role::King, side).attacks(sq, occupied)
            & theirs
            & self.by_role(Role::King);

        attackers |= Piece::new(Role::Bishop, side).attacks(sq, occupied)
            & theirs
            & (queens | self.by_role(Role::Bishop));

        attackers |= Piece::new(Role::Rook, side).attacks(sq, occupied)
            & theirs
            & (queens | self.by_role(Role::Rook));

        attackers & occupied
    }

    /// Whether a [`Square`] is attacked by a piece of a [`Color`].
    #[inline(always)]
    pub fn is_threatened(&self, sq: Square, side: Color, occupied: Bitboard) -> bool {
        !self.attackers(sq, side, occupied).is_empty()
    }

    /// Enemy pieces giving check to the king of a [`Color`].
    #[inline(always)]
    pub fn checkers(&self, c: Color) -> Bitboard {
        match self.king(c) {
            None => Bitboard::empty(),
            Some(king) => self.attackers(king, !c, self.occupied()),
        }
    }

    /// Pieces of a [`Color`] pinned against that color's own king.
    ///
    /// A piece is pinned when it is the sole blocker between its king and an
    /// enemy slider.
    #[inline(always)]
    pub fn pins(&self, c: Color) -> Bitboard {
        let Some(king) = self.king(c) else {
            return Bitboard::empty();
        };

        let ours = self.by_color(c);
        let theirs = self.by_color(!c);
        let occupied = ours ^ theirs;
        let queens = self.by_role(Role::Queen);

        let mut pinned = Bitboard::empty();
        for role in [Role::Bishop, Role::Rook] {
            let slider = Piece::new(role, c);
            for wc in theirs & slider.attacks(king, theirs) & (queens | self.by_role(role)) {
                let blockers = occupied & Bitboard::between(king, wc);
                if blockers.len() == 1 {
                    pinned |= blockers & ours;
                }
            }
        }

        pinned
    }

    /// Computes both [`Zobrist`] keys from scratch.
    pub fn zobrists(&self) -> Zobrists {
        let mut zobrists = Zobrists {
            hash: ZobristNumbers::castling(self.castles),
            ..Default::default()
        };

        if self.turn == Color::Black {
            zobrists.hash ^= ZobristNumbers::turn();
        }

        if let Some(ep) = self.en_passant {
            zobrists.hash ^= ZobristNumbers::en_passant(ep.file());
        }

        for (p, sq) in self.iter() {
            zobrists.toggle(p, sq);
        }

        zobrists
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            let mut skip = 0;
            for file in File::iter() {
                match self.piece_on(Square::new(file, rank)) {
                    None => skip += 1,
                    Some(p) => {
                        if skip > 0 {
                            write!(f, "{skip}")?;
                            skip = 0;
                        }

                        write!(f, "{p}")?;
                    }
                }
            }

            if skip > 0 {
                write!(f, "{skip}")?;
            }

            f.write_char(if rank == Rank::FIRST { ' ' } else { '/' })?;
        }

        write!(f, "{} {} ", self.turn, self.castles)?;

        match self.en_passant {
            None => f.write_str("-")?,
            Some(ep) => write!(f, "{ep}")?,
        }

        write!(f, " {} {}", self.halfmoves, self.fullmoves)
    }
}

/// The reason why parsing the FEN string failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ParseFenError {
    #[display("failed to parse piece placement")]
    InvalidPlacement,
    #[display("failed to parse side to move")]
    InvalidSideToMove,
    #[display("failed to parse castling rights")]
    InvalidCastlingRights,
    #[display("failed to parse en passant square")]
    InvalidEnPassantSquare,
    #[display("failed to parse halfmove clock")]
    InvalidHalfmoveClock,
    #[display("failed to parse fullmove number")]
    InvalidFullmoveNumber,
    #[display("unspecified syntax error")]
    InvalidSyntax,
}

impl FromStr for Board {
    type Err = ParseFenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ParseFenError::*;

        let mut board = Board::empty();
        let tokens = &mut s.split_ascii_whitespace();
        let placement = tokens.next().ok_or(InvalidPlacement)?;
        if placement.split('/').count() != 8 {
            return Err(InvalidPlacement);
        }

        for (idx, segment) in placement.split('/').rev().enumerate() {
            let rank = Rank::new(u8::try_from(idx).ok().filter(|&r| r < 8).ok_or(InvalidPlacement)?);

            let mut file = 0u8;
            for c in segment.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else if file < 8 {
                    let mut buffer = [0; 4];
                    let p: Piece = c
                        .encode_utf8(&mut buffer)
                        .parse()
                        .map_err(|_| InvalidPlacement)?;

                    board.toggle(p, Square::new(File::new(file), rank));
                    file += 1;
                } else {
                    return Err(InvalidPlacement);
                }

                if file > 8 {
                    return Err(InvalidPlacement);
                }
            }

            if file != 8 {
                return Err(InvalidPlacement);
            }
        }

        board.turn = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or(InvalidSideToMove)?;

        board.castles = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or(InvalidCastlingRights)?;

        board.en_passant = match tokens.next() {
            None => return Err(InvalidEnPassantSquare),
            Some("-") => None,
            Some(t) => Some(t.parse().map_err(|_| InvalidEnPassantSquare)?),
        };

        board.halfmoves = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or(InvalidHalfmoveClock)?;

        board.fullmoves = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or(InvalidFullmoveNumber)?;

        if tokens.next().is_some() {
            return Err(InvalidSyntax);
        }

        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_board_is_the_starting_position() {
        let board = Board::default();
        assert_eq!(board.occupied().len(), 32);
        assert_eq!(board.turn, Color::White);
        assert_eq!(board.castles, Castles::all());
        assert_eq!(board.king(Color::White), Some(Square::E1));
        assert_eq!(board.king(Color::Black), Some(Square::E8));
        assert_eq!(board.count(Piece::WhitePawn), 8);
        assert_eq!(board.tabs().mg, 0);
        assert_eq!(board.tabs().eg, 0);
        assert_eq!(board.tabs().phase, 24);
    }

    #[test]
    fn occupancy_is_the_union_of_all_placement_bitboards() {
        let board = Board::default();
        let union = Role::iter().fold(Bitboard::empty(), |bb, r| bb | board.by_role(r));
        assert_eq!(board.occupied(), union);
    }

    #[test]
    fn piece_lookup_is_the_inverse_of_the_bitboards() {
        let board = Board::default();
        for sq in Square::iter() {
            match board.piece_on(sq) {
                None => assert!(!board.occupied().contains(sq)),
                Some(p) => assert!(board.by_piece(p).contains(sq)),
            }
        }
    }

    #[test]
    fn toggle_is_an_involution() {
        let mut board = Board::default();
        let before = board.clone();
        board.toggle(Piece::WhiteKnight, Square::E4);
        board.toggle(Piece::WhiteKnight, Square::E4);
        assert_eq!(board, before);
    }

    #[test]
    fn checkers_returns_pieces_giving_check() {
        let board: Board = "4k3/8/8/8/8/8/4r3/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(board.checkers(Color::White), Square::E2.bitboard());
        assert_eq!(board.checkers(Color::Black), Bitboard::empty());
    }

    #[test]
    fn pins_returns_the_sole_blocker_of_a_slider() {
        let board: Board = "4k3/8/8/8/8/4b3/4Q3/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(board.pins(Color::White), Square::E2.bitboard());
        assert_eq!(board.pins(Color::Black), Square::E3.bitboard());
    }

    #[test]
    fn parsing_the_kiwipete_fen_succeeds() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board: Board = fen.parse().unwrap();
        assert_eq!(board.to_string(), fen);
    }

    #[test]
    fn printed_board_round_trips_through_the_parser() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        ] {
            let board: Board = fen.parse().unwrap();
            assert_eq!(board.to_string(), fen);
        }
    }

    #[test]
    fn parsing_fails_for_malformed_fen() {
        assert!("".parse::<Board>().is_err());
        assert!("rnbqkbnr/pppppppp/8/8".parse::<Board>().is_err());
        assert!(
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
                .parse::<Board>()
                .is_err()
        );
        assert!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"
                .parse::<Board>()
                .is_err()
        );
        assert!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 extra"
                .parse::<Board>()
                .is_err()
        );
    }

    #[test]
    fn placement_sums_match_a_from_scratch_recomputation() {
        let board: Board = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
            .parse()
            .unwrap();

        let mut tabs = Tabs::default();
        for (p, sq) in board.iter() {
            let (mg, eg) = eval::weights(p, sq);
            tabs.mg += mg;
            tabs.eg += eg;
            tabs.phase += eval::phase_weight(p.role());
        }

        assert_eq!(board.tabs(), tabs);
    }
}
