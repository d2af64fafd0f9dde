pub mod aggregator;
pub mod combiner;
pub mod countdown;
pub mod selector;
pub mod trend;
pub mod weighting;
