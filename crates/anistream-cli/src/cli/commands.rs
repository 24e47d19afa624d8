use clap::Subcommand;
use uuid::Uuid;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, env = "ANISTREAM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, env = "ANISTREAM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and revoke the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Browse the catalog
    Browse {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Search the catalog by title
    Search {
        /// Title to look for (at least 2 characters)
        query: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one title
    Anime {
        /// Anime ID
        id: Uuid,
    },

    /// List the episodes of a title
    Episodes {
        /// Anime ID
        anime_id: Uuid,
    },

    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Titles to pick up where you left off
    Continue,

    /// Record playback progress for an episode
    Progress {
        /// Anime ID
        anime_id: Uuid,

        /// Episode number
        episode: u32,

        /// Position within the episode, in seconds
        #[arg(long)]
        position: Option<u32>,

        /// Completion percentage
        #[arg(long, value_parser = parse_percent)]
        percent: Option<f64>,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Pagination flags shared by listing commands
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Maximum number of results
    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Number of results to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

impl From<PageArgs> for anistream_sdk::Page {
    fn from(args: PageArgs) -> Self {
        Self {
            limit: args.limit,
            offset: args.offset,
        }
    }
}

/// Favorites subcommands
#[derive(Subcommand, Debug)]
pub enum FavoritesAction {
    /// List favorites
    List,

    /// Add a title to favorites
    Add {
        /// Anime ID
        anime_id: Uuid,
    },

    /// Remove a title from favorites
    Remove {
        /// Anime ID
        anime_id: Uuid,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print an example configuration file
    Example,
}

fn parse_percent(value: &str) -> Result<f64, String> {
    let percent: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=100.0).contains(&percent) {
        Ok(percent)
    } else {
        Err("percentage must be between 0 and 100".to_string())
    }
}
