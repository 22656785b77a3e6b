pub mod config;
pub mod preset;
pub mod session;
pub mod stats;
pub mod streak;
