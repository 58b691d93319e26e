use crate::chess::Position;
use std::num::NonZeroUsize;
use std::sync::{Barrier, Mutex};
use std::thread;

/// Counts the leaf nodes of the legal move tree to the given depth.
pub fn perft(pos: &Position, depth: u8) -> u64 {
    match depth {
        0 => 1,
        1 => pos.moves().len() as u64,
        _ => pos
            .moves()
            .into_iter()
            .map(|m| perft(&pos.apply(m), depth - 1))
            .sum(),
    }
}

/// Counts leaf nodes in parallel by splitting the tree at the root.
///
/// Workers claim root moves from a shared queue one at a time and explore
/// each subtree single-threadedly; a shared start signal keeps thread
/// startup cost out of the measured work. The result equals [`perft`].
pub fn parallel_perft(pos: &Position, depth: u8, threads: NonZeroUsize) -> u64 {
    if depth < 2 {
        return perft(pos, depth);
    }

    let moves = pos.moves();
    let next = Mutex::new(0usize);
    let counts = Mutex::new(Vec::with_capacity(moves.len()));
    let gate = Barrier::new(threads.get());

    thread::scope(|s| {
        for _ in 0..threads.get() {
            s.spawn(|| {
                gate.wait();

                loop {
                    let claimed = {
                        let mut idx = match next.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };

                        let claimed = *idx;
                        *idx += 1;
                        claimed
                    };

                    let Some(&m) = moves.get(claimed) else {
                        break;
                    };

                    let nodes = perft(&pos.apply(m), depth - 1);
                    match counts.lock() {
                        Ok(mut guard) => guard.push(nodes),
                        Err(poisoned) => poisoned.into_inner().push(nodes),
                    }
                }
            });
        }
    });

    counts.into_inner().unwrap_or_else(|p| p.into_inner()).iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn perft_counts_the_initial_position() {
        let pos = Position::default();
        assert_eq!(perft(&pos, 0), 1);
        assert_eq!(perft(&pos, 1), 20);
        assert_eq!(perft(&pos, 2), 400);
        assert_eq!(perft(&pos, 3), 8902);
        assert_eq!(perft(&pos, 4), 197_281);
    }

    #[test]
    #[ignore = "slow; run with --ignored"]
    fn perft_counts_the_initial_position_deeply() {
        let pos = Position::default();
        assert_eq!(perft(&pos, 5), 4_865_609);
        assert_eq!(perft(&pos, 6), 119_060_324);
    }

    #[test]
    fn perft_counts_reference_positions() {
        // Positions 2-5 of the chessprogramming wiki suite.
        for (fen, depth, count) in [
            (KIWIPETE, 3, 97_862),
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 4, 43_238),
            (
                "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
                3,
                9_467,
            ),
            (
                "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
                3,
                62_379,
            ),
        ] {
            let pos: Position = fen.parse().unwrap();
            assert_eq!(perft(&pos, depth), count, "{fen}");
        }
    }

    #[test]
    #[ignore = "slow; run with --ignored"]
    fn perft_counts_reference_positions_deeply() {
        for (fen, depth, count) in [
            (KIWIPETE, 4, 4_085_603),
            (KIWIPETE, 5, 193_690_690),
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 6, 11_030_083),
        ] {
            let pos: Position = fen.parse().unwrap();
            assert_eq!(perft(&pos, depth), count, "{fen}");
        }
    }

    #[test]
    fn parallel_perft_agrees_with_the_serial_count() {
        let pos: Position = KIWIPETE.parse().unwrap();
        let threads = NonZeroUsize::new(4).unwrap();
        assert_eq!(parallel_perft(&pos, 3, threads), perft(&pos, 3));

        let one = NonZeroUsize::new(1).unwrap();
        assert_eq!(parallel_perft(&pos, 2, one), perft(&pos, 2));
    }

    #[test]
    fn shallow_parallel_perft_falls_back_to_serial() {
        let pos = Position::default();
        let threads = NonZeroUsize::new(8).unwrap();
        assert_eq!(parallel_perft(&pos, 0, threads), 1);
        assert_eq!(parallel_perft(&pos, 1, threads), 20);
    }
}
