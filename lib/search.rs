mod control;
mod engine;
mod history;
mod info;
mod killers;
mod limits;
mod line;
mod options;
mod pv;
mod score;
mod transposition;

pub use control::*;
pub use engine::*;
pub use history::*;
pub use info::*;
pub use killers::*;
pub use limits::*;
pub use line::*;
pub use options::*;
pub use pv::*;
pub use score::*;
pub use transposition::*;

/// The maximum number of plies the search can reach.
pub const MAX_PLY: usize = 64;
