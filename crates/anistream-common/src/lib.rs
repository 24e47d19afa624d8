//! Shared plumbing for AniStream crates
//!
//! - [`logging`]: tracing subscriber setup honouring `-v/-q` flags and `RUST_LOG`
//! - [`config`]: figment-backed configuration loading

pub mod config;
pub mod error;
pub mod logging;

pub use config::ConfigLoader;
pub use error::ConfigurationError;
