pub mod pipeline;
pub mod runner;

pub use pipeline::{Pipeline, TickPhase, TickReport};
pub use runner::TickRunner;
