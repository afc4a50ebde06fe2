pub mod aggregator;
pub mod baseline;
pub mod grid;
pub mod summarizer;
