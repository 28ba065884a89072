mod driver;
mod game;
mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use driver::TickDriver;
pub use game::{Frame, Game, GameCommand, Setup, WindowSettings};
pub use input::{InputSnapshot, Key};
pub use loop_runner::{run, run_game, AppError};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::FramePainter;
