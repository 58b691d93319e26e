use crate::chess::{Bitboard, Color, Magic, Rank, Role, Square, bitboard::fill};
use derive_more::{Display, Error};
use std::str::FromStr;
use std::sync::OnceLock;

/// Precomputed reachable-square bitboards for every piece kind.
///
/// Built once on first use and read-only afterwards; lookups are O(1).
struct AttackTables {
    forks: [[Bitboard; 64]; 2],
    jumps: [Bitboard; 64],
    steps: [Bitboard; 64],
    slides: Box<[Bitboard]>,
}

impl AttackTables {
    fn build() -> Self {
        let mut forks = [[Bitboard::empty(); 64]; 2];
        let mut jumps = [Bitboard::empty(); 64];
        let mut steps = [Bitboard::empty(); 64];

        for sq in Square::iter() {
            let one = sq.bitboard().get();

            let white = [(-1, 1), (1, 1)];
            let black = [(-1, -1), (1, -1)];
            forks[Color::White.index()][sq.index()] =
                Bitboard::new(fill(sq.index(), &white, u64::MAX) & !one);
            forks[Color::Black.index()][sq.index()] =
                Bitboard::new(fill(sq.index(), &black, u64::MAX) & !one);

            #[rustfmt::skip]
            let knight = [(-2, 1), (-1, 2), (1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1)];
            jumps[sq.index()] = Bitboard::new(fill(sq.index(), &knight, u64::MAX) & !one);

            #[rustfmt::skip]
            let king = [(-1, 0), (-1, 1), (0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1)];
            steps[sq.index()] = Bitboard::new(fill(sq.index(), &king, u64::MAX) & !one);
        }

        let mut slides = vec![Bitboard::empty(); Magic::TABLE_SIZE].into_boxed_slice();
        for sq in Square::iter() {
            let magic = Magic::bishop(sq);
            for bb in magic.mask().subsets() {
                let blockers = bb.get() | !magic.mask().get();
                let diagonals = [(-1, 1), (1, 1), (1, -1), (-1, -1)];
                let moves = fill(sq.index(), &diagonals, blockers) & !sq.bitboard().get();
                slides[magic.slot(bb, 55)] = Bitboard::new(moves);
            }

            let magic = Magic::rook(sq);
            for bb in magic.mask().subsets() {
                let blockers = bb.get() | !magic.mask().get();
                let orthogonals = [(-1, 0), (0, 1), (1, 0), (0, -1)];
                let moves = fill(sq.index(), &orthogonals, blockers) & !sq.bitboard().get();
                slides[magic.slot(bb, 52)] = Bitboard::new(moves);
            }
        }

        AttackTables {
            forks,
            jumps,
            steps,
            slides,
        }
    }

    #[inline(always)]
    fn get() -> &'static Self {
        static TABLES: OnceLock<AttackTables> = OnceLock::new();
        TABLES.get_or_init(Self::build)
    }
}

/// A chess [piece][`Role`] of a certain [`Color`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[repr(u8)]
pub enum Piece {
    WhitePawn,
    BlackPawn,
    WhiteKnight,
    BlackKnight,
    WhiteBishop,
    BlackBishop,
    WhiteRook,
    BlackRook,
    WhiteQueen,
    BlackQueen,
    WhiteKing,
    BlackKing,
}

impl Piece {
    /// Constructs [`Piece`] from a pair of [`Role`] and [`Color`].
    #[inline(always)]
    pub const fn new(r: Role, c: Color) -> Self {
        use Piece::*;

        #[rustfmt::skip]
        const PIECES: [Piece; 12] = [
            WhitePawn, BlackPawn, WhiteKnight, BlackKnight, WhiteBishop, BlackBishop,
            WhiteRook, BlackRook, WhiteQueen, BlackQueen, WhiteKing, BlackKing,
        ];

        PIECES[r.index() * 2 + c.index()]
    }

    /// An iterator over all pieces.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        Role::iter().flat_map(|r| Color::iter().map(move |c| Piece::new(r, c)))
    }

    /// This piece's index.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// This piece's [`Role`].
    #[inline(always)]
    pub const fn role(self) -> Role {
        Role::from_index(self as usize >> 1)
    }

    /// This piece's [`Color`].
    #[inline(always)]
    pub const fn color(self) -> Color {
        match self as usize & 1 {
            0 => Color::White,
            _ => Color::Black,
        }
    }

    /// The same piece of the opponent's color.
    #[inline(always)]
    pub const fn flip(self) -> Self {
        // `Not for Color` is not a const impl on stable, so flip the color
        // inline to keep `flip` usable in const context. Behavior is identical.
        let color = match self.color() {
            Color::White => Color::Black,
            Color::Black => Color::White,
        };

        Piece::new(self.role(), color)
    }

    /// This piece's possible attacks from a given square.
    #[inline(always)]
    pub fn attacks(self, wc: Square, occupied: Bitboard) -> Bitboard {
        let tables = AttackTables::get();

        match self.role() {
            Role::Pawn => tables.forks[self.color().index()][wc.index()],
            Role::Knight => tables.jumps[wc.index()],
            Role::King => tables.steps[wc.index()],
            Role::Bishop => tables.slides[Magic::bishop(wc).slot(occupied, 55)],
            Role::Rook => tables.slides[Magic::rook(wc).slot(occupied, 52)],
            Role::Queen => {
                tables.slides[Magic::bishop(wc).slot(occupied, 55)]
                    | tables.slides[Magic::rook(wc).slot(occupied, 52)]
            }
        }
    }

    /// This piece's possible moves from a given square.
    ///
    /// For pawns this returns advances only; captures come from [`Piece::attacks`].
    #[inline(always)]
    pub fn moves(self, wc: Square, ours: Bitboard, theirs: Bitboard) -> Bitboard {
        let occupied = ours | theirs;
        if self.role() != Role::Pawn {
            return self.attacks(wc, occupied) & !ours;
        }

        let empty = !occupied;
        match self.color() {
            Color::White => {
                let push = (wc.bitboard() << 8) & empty;
                push | (((push & Rank::THIRD.bitboard()) << 8) & empty)
            }
            Color::Black => {
                let push = (wc.bitboard() >> 8) & empty;
                push | (((push & Rank::SIXTH.bitboard()) >> 8) & empty)
            }
        }
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Piece::WhitePawn => "P",
            Piece::BlackPawn => "p",
            Piece::WhiteKnight => "N",
            Piece::BlackKnight => "n",
            Piece::WhiteBishop => "B",
            Piece::BlackBishop => "b",
            Piece::WhiteRook => "R",
            Piece::BlackRook => "r",
            Piece::WhiteQueen => "Q",
            Piece::BlackQueen => "q",
            Piece::WhiteKing => "K",
            Piece::BlackKing => "k",
        })
    }
}

/// The reason why parsing [`Piece`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse piece")]
pub struct ParsePieceError;

impl FromStr for Piece {
    type Err = ParsePieceError;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" => Ok(Piece::WhitePawn),
            "p" => Ok(Piece::BlackPawn),
            "N" => Ok(Piece::WhiteKnight),
            "n" => Ok(Piece::BlackKnight),
            "B" => Ok(Piece::WhiteBishop),
            "b" => Ok(Piece::BlackBishop),
            "R" => Ok(Piece::WhiteRook),
            "r" => Ok(Piece::BlackRook),
            "Q" => Ok(Piece::WhiteQueen),
            "q" => Ok(Piece::BlackQueen),
            "K" => Ok(Piece::WhiteKing),
            "k" => Ok(Piece::BlackKing),
            _ => Err(ParsePieceError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn piece_has_a_color(r: Role, c: Color) {
        assert_eq!(Piece::new(r, c).color(), c);
    }

    #[proptest]
    fn piece_has_a_role(r: Role, c: Color) {
        assert_eq!(Piece::new(r, c).role(), r);
    }

    #[proptest]
    fn flipping_piece_preserves_role_and_mirrors_color(p: Piece) {
        assert_eq!(p.flip().role(), p.role());
        assert_eq!(p.flip().color(), !p.color());
    }

    #[proptest]
    fn piece_cannot_attack_its_own_square(p: Piece, wc: Square, bb: Bitboard) {
        assert!(!p.attacks(wc, bb).contains(wc));
    }

    #[proptest]
    fn piece_can_only_move_to_empty_or_opponent_squares(
        p: Piece,
        wc: Square,
        a: Bitboard,
        b: Bitboard,
    ) {
        let (ours, theirs) = (a & !b, b & !a);
        for sq in p.moves(wc, ours, theirs) {
            assert!(!ours.contains(sq));
        }
    }

    #[proptest]
    fn slider_attacks_stop_at_blockers(sq: Square, occupied: Bitboard) {
        let occupied = occupied.with(sq);
        for p in [Piece::WhiteBishop, Piece::WhiteRook, Piece::WhiteQueen] {
            for wt in p.attacks(sq, occupied) {
                assert_eq!(Bitboard::between(sq, wt) & occupied, Bitboard::empty());
            }
        }
    }

    #[test]
    fn rook_attacks_span_rank_and_file_on_empty_board() {
        let attacks = Piece::WhiteRook.attacks(Square::D4, Bitboard::empty());
        assert_eq!(
            attacks,
            (Square::D4.file().bitboard() ^ Square::D4.rank().bitboard()).without(Square::D4)
        );
    }

    #[test]
    fn pawns_attack_diagonally_forward() {
        assert_eq!(
            Piece::WhitePawn.attacks(Square::E4, Bitboard::empty()),
            Square::D5.bitboard().with(Square::F5)
        );

        assert_eq!(
            Piece::BlackPawn.attacks(Square::E4, Bitboard::empty()),
            Square::D3.bitboard().with(Square::F3)
        );
    }

    #[proptest]
    fn parsing_printed_piece_is_an_identity(p: Piece) {
        assert_eq!(p.to_string().parse(), Ok(p));
    }

    #[proptest]
    fn parsing_piece_fails_if_not_one_of_pnbrqk(
        #[filter(!['p', 'n', 'b', 'r', 'q', 'k'].contains(&#c.to_ascii_lowercase()))] c: char,
    ) {
        assert_eq!(c.to_string().parse::<Piece>(), Err(ParsePieceError));
    }
}
