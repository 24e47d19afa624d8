//! Command handlers for the AniStream CLI

pub mod auth;
pub mod catalog;
pub mod config;
pub mod library;

use crate::error::{CliError, Result};
use anistream_sdk::{AniStreamClient, ClientBuilder, ClientConfig, FileBackend};
use std::sync::Arc;
use tracing::debug;

/// Build a client whose credential survives between runs
pub fn build_client(config: &ClientConfig) -> Result<AniStreamClient> {
    let mut builder = ClientBuilder::from_config(config);
    if config.storage.data_dir.is_none() {
        let backend = FileBackend::in_data_dir()?;
        debug!("Persisting credentials in {}", backend.dir().display());
        builder = builder.credential_backend(Arc::new(backend));
    }
    Ok(builder.build()?)
}

/// Fail early for commands that only make sense signed in
pub(crate) fn require_session(client: &AniStreamClient) -> Result<()> {
    match client.store().auth() {
        Some(_) => Ok(()),
        None => Err(CliError::NotSignedIn),
    }
}
