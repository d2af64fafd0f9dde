pub mod error;
pub mod ranking;
pub mod snapshot;
