use crate::chess::{Color, Piece, Position, Role, Square};

/// The maximum magnitude [`score`] can return.
///
/// Stays well clear of the mate range of [`Score`][`crate::search::Score`].
pub const MAX: i16 = 8000;

const MATERIAL_MG: [i32; 6] = [100, 320, 330, 500, 900, 0];
const MATERIAL_EG: [i32; 6] = [100, 320, 330, 500, 900, 0];

const PHASE: [i32; 6] = [0, 1, 1, 2, 4, 0];

/// The total phase weight of the starting position.
const PHASE_TOTAL: i32 = 24;

#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     50,  50,  50,  50,  50,  50,  50,  50,
     10,  10,  20,  30,  30,  20,  10,  10,
      5,   5,  10,  25,  25,  10,   5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      5,  10,  10, -20, -20,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     80,  80,  80,  80,  80,  80,  80,  80,
     50,  50,  50,  50,  50,  50,  50,  50,
     30,  30,  30,  30,  30,  30,  30,  30,
     20,  20,  20,  20,  20,  20,  20,  20,
     10,  10,  10,  10,  10,  10,  10,  10,
     10,  10,  10,  10,  10,  10,  10,  10,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10,  10,  10,  10,  10,   5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      0,   0,   0,   5,   5,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,   5,   5,   5,   0, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
      0,   0,   5,   5,   5,   5,   0,  -5,
    -10,   5,   5,   5,   5,   5,   0, -10,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_MG: [i32; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
];

#[rustfmt::skip]
const KING_EG: [i32; 64] = [
    -50, -40, -30, -20, -20, -30, -40, -50,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -50, -30, -30, -30, -30, -30, -30, -50,
];

/// The placement tables are written rank 8 first, as seen on a diagram.
#[inline(always)]
fn table(r: Role, sq: Square) -> (i32, i32) {
    let idx = sq.flip().index();
    match r {
        Role::Pawn => (PAWN_MG[idx], PAWN_EG[idx]),
        Role::Knight => (KNIGHT[idx], KNIGHT[idx]),
        Role::Bishop => (BISHOP[idx], BISHOP[idx]),
        Role::Rook => (ROOK[idx], ROOK[idx]),
        Role::Queen => (QUEEN[idx], QUEEN[idx]),
        Role::King => (KING_MG[idx], KING_EG[idx]),
    }
}

/// A [`Piece`]'s signed midgame/endgame contribution on a [`Square`].
///
/// White contributes positively and black negatively, so that summing over
/// every piece on the board yields the placement balance from white's point
/// of view.
#[inline(always)]
pub(crate) fn weights(p: Piece, sq: Square) -> (i32, i32) {
    let (mg, eg) = table(p.role(), sq.perspective(p.color()));
    let (mg, eg) = (
        mg + MATERIAL_MG[p.role().index()],
        eg + MATERIAL_EG[p.role().index()],
    );

    match p.color() {
        Color::White => (mg, eg),
        Color::Black => (-mg, -eg),
    }
}

/// A [`Role`]'s contribution to the game phase.
#[inline(always)]
pub(crate) fn phase_weight(r: Role) -> i32 {
    PHASE[r.index()]
}

/// Statically scores a [`Position`] from the side to move's perspective.
///
/// Deterministic and free of search state; tapers the incremental placement
/// sums between their midgame and endgame values by the remaining phase.
#[inline(always)]
pub fn score(pos: &Position) -> i16 {
    let tabs = pos.tabs();
    let phase = tabs.phase.clamp(0, PHASE_TOTAL);
    let white = (tabs.mg * phase + tabs.eg * (PHASE_TOTAL - phase)) / PHASE_TOTAL;

    let value = match pos.turn() {
        Color::White => white,
        Color::Black => -white,
    };

    value.clamp(-MAX as i32, MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_antisymmetric_between_colors() {
        for r in Role::iter() {
            for sq in Square::iter() {
                let (wmg, weg) = weights(Piece::new(r, Color::White), sq);
                let (bmg, beg) = weights(Piece::new(r, Color::Black), sq.flip());
                assert_eq!(wmg, -bmg);
                assert_eq!(weg, -beg);
            }
        }
    }

    #[test]
    fn starting_position_is_balanced() {
        let pos = Position::default();
        assert_eq!(score(&pos), 0);
    }

    #[test]
    fn scoring_is_zero_sum_between_perspectives() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
        ] {
            let white: Position = fen.parse().unwrap();
            let black: Position = fen.replace(" w ", " b ").parse().unwrap();
            assert_eq!(score(&white), -score(&black));
        }
    }

    #[test]
    fn material_advantage_scores_positively_for_the_side_that_has_it() {
        let pos: Position = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1".parse().unwrap();
        assert!(score(&pos) > 0);

        let pos: Position = "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1".parse().unwrap();
        assert!(score(&pos) < 0);
    }
}
