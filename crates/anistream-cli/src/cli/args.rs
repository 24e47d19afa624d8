use crate::cli::{
    commands::{Commands, ConfigAction},
    handlers,
};
use crate::error::Result;
use crate::output::print_error;
use anistream_sdk::ClientConfig;
use clap::Parser;
use clap_verbosity_flag::{OffLevel, Verbosity};
use std::path::PathBuf;
use tracing::debug;

/// AniStream CLI - browse the catalog and keep track of what you watch
#[derive(Parser, Debug)]
#[command(
    name = "anistream",
    author = "AniStream Team",
    version,
    about = "AniStream CLI - browse the catalog and keep track of what you watch",
    long_about = "Command-line client for the AniStream catalog.

ACCOUNT:
  anistream login <email>            # Sign in (password via --password or ANISTREAM_PASSWORD)
  anistream whoami                   # Show the signed-in user
  anistream logout                   # Sign out

CATALOG:
  anistream browse                   # List titles
  anistream search <query>           # Search by title
  anistream anime <id>               # Show one title
  anistream episodes <id>            # List episodes

LIBRARY:
  anistream favorites list           # List favorites
  anistream continue                 # Continue watching
  anistream progress <id> <episode>  # Record progress"
)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<OffLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config = ClientConfig::load(self.config.as_deref())?;
        debug!("Using API at {}", config.api.base_url);

        let client = handlers::build_client(&config)?;
        let _subscription = client.subscribe(|_| {
            print_error("Your session has expired. Run `anistream login` to sign in again.");
        });

        let json = self.json;
        let result = match self.command {
            Commands::Login { email, password } => {
                handlers::auth::handle_login(&client, &email, &password, json).await
            }
            Commands::Register { email, password } => {
                handlers::auth::handle_register(&client, &email, &password, json).await
            }
            Commands::Logout => handlers::auth::handle_logout(&client).await,
            Commands::Whoami => handlers::auth::handle_whoami(&client, json).await,

            Commands::Browse { page } => {
                handlers::catalog::handle_browse(&client, page.into(), json).await
            }
            Commands::Search { query, page } => {
                handlers::catalog::handle_search(&client, &query, page.into(), json).await
            }
            Commands::Anime { id } => handlers::catalog::handle_anime(&client, id, json).await,
            Commands::Episodes { anime_id } => {
                handlers::catalog::handle_episodes(&client, anime_id, json).await
            }

            Commands::Favorites { action } => {
                handlers::library::handle_favorites(&client, action, json).await
            }
            Commands::Continue => handlers::library::handle_continue(&client, json).await,
            Commands::Progress {
                anime_id,
                episode,
                position,
                percent,
            } => {
                handlers::library::handle_progress(
                    &client, anime_id, episode, position, percent, json,
                )
                .await
            }

            Commands::Config { action } => match action {
                ConfigAction::Show => handlers::config::handle_show(&config, json),
                ConfigAction::Example => handlers::config::handle_example(),
            },
        };

        // A refresh may have rotated the stored credential
        client.flush().await;
        result
    }
}
