use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flint::chess::Position;
use flint::perft::{parallel_perft, perft};
use flint::search::{Control, Engine, HashSize, Limits, Options};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Parser)]
#[command(name = "flint", version, about = "A chess search engine core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Searches a position for the best move.
    Search {
        /// The position in FEN.
        #[arg(long, default_value = START_FEN)]
        fen: String,

        /// Moves to apply to the position, in coordinate notation.
        #[arg(long, num_args = 0.., value_name = "MOVE")]
        moves: Vec<String>,

        /// Maximum depth in plies.
        #[arg(long)]
        depth: Option<u8>,

        /// Time budget in milliseconds.
        #[arg(long)]
        movetime: Option<u64>,

        /// Node budget.
        #[arg(long)]
        nodes: Option<u64>,

        /// Remaining clock time in milliseconds.
        #[arg(long)]
        clock: Option<u64>,

        /// Clock increment in milliseconds.
        #[arg(long, default_value_t = 0)]
        increment: u64,

        /// Moves until the next time control.
        #[arg(long)]
        movestogo: Option<u32>,

        /// Transposition table size in mebibytes.
        #[arg(long, default_value_t = 16)]
        hash: usize,
    },

    /// Counts the leaf nodes of the legal move tree.
    Perft {
        /// The position in FEN.
        #[arg(long, default_value = START_FEN)]
        fen: String,

        /// The depth to count to.
        #[arg(long, default_value_t = 5)]
        depth: u8,

        /// Worker threads; one thread counts serially.
        #[arg(long, default_value_t = NonZeroUsize::MIN)]
        threads: NonZeroUsize,
    },
}

/// Applies a sequence of move tokens to a position.
///
/// A token absent from the current legal move set is an error; the position
/// reached so far is simply dropped, never corrupted.
fn apply_moves(mut pos: Position, tokens: &[String]) -> Result<Position> {
    for token in tokens {
        let moves = pos.moves();
        match moves.iter().find(|m| m.to_string() == *token) {
            Some(&m) => pos = pos.apply(m),
            None => bail!("illegal move `{token}` in `{pos}`"),
        }
    }

    Ok(pos)
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Search {
            fen,
            moves,
            depth,
            movetime,
            nodes,
            clock,
            increment,
            movestogo,
            hash,
        } => {
            let pos: Position = fen.parse().with_context(|| format!("invalid FEN `{fen}`"))?;
            let pos = apply_moves(pos, &moves)?;

            let limits = if let Some(d) = depth {
                Limits::Depth(d)
            } else if let Some(ms) = movetime {
                Limits::Time(Duration::from_millis(ms))
            } else if let Some(n) = nodes {
                Limits::Nodes(n)
            } else if let Some(ms) = clock {
                Limits::Clock {
                    time: Duration::from_millis(ms),
                    increment: Duration::from_millis(increment),
                    moves_to_go: movestogo,
                }
            } else {
                Limits::None
            };

            let mut engine = Engine::with_options(&Options {
                hash: HashSize::from_mib(hash),
            });

            let ctrl = Control::new(&pos, limits);
            let best = engine.search(&pos, &ctrl, |info| println!("info {info}"));

            match best {
                Some(m) => println!("bestmove {m}"),
                None => println!("bestmove (none)"),
            }
        }

        Command::Perft {
            fen,
            depth,
            threads,
        } => {
            let pos: Position = fen.parse().with_context(|| format!("invalid FEN `{fen}`"))?;

            let timestamp = Instant::now();
            let count = if threads.get() == 1 {
                perft(&pos, depth)
            } else {
                parallel_perft(&pos, depth, threads)
            };

            let elapsed = timestamp.elapsed();
            let nps = (count as f64 / elapsed.as_secs_f64().max(f64::MIN_POSITIVE)) as u64;
            println!(
                "perft({depth}) = {count} in {}ms ({nps} nodes/s)",
                elapsed.as_millis()
            );
        }
    }

    Ok(())
}
