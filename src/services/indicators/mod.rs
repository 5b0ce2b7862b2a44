pub mod calculator;
pub mod classifier;
pub mod evaluator;
