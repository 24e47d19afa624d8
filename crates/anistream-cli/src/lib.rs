//! # AniStream CLI
//!
//! Command-line client for the AniStream catalog: sign in, browse and search
//! titles, manage favorites and watch progress.
//!
//! Credentials persist between runs in the platform data directory (or
//! `storage.data_dir` from the configuration file), and an expired session is
//! refreshed transparently by the SDK.

pub mod cli;
pub mod error;
pub mod output;

pub use cli::*;
pub use error::*;
