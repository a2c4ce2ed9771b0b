//! Evalog scoring utilities.

pub mod score;

pub use score::{factuality, relevance, ScoreCard};
