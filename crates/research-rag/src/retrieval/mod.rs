//! Question answering over a built index

mod engine;

pub use engine::{QueryEngine, DEFAULT_TOP_K};
