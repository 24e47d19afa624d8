//! Configuration command handlers

use crate::error::Result;
use crate::output::json_output;
use anistream_common::ConfigLoader;
use anistream_sdk::ClientConfig;

/// Handle `config show`
pub fn handle_show(config: &ClientConfig, json: bool) -> Result<()> {
    if json {
        return json_output(config);
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Handle `config example`
pub fn handle_example() -> Result<()> {
    print!("{}", <ClientConfig as ConfigLoader<ClientConfig>>::generate_example()?);
    Ok(())
}
