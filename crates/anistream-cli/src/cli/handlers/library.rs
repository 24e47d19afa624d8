//! Favorites and watch-history handlers

use super::require_session;
use crate::cli::commands::FavoritesAction;
use crate::error::Result;
use crate::output::{json_output, print_info, print_success, table_output};
use anistream_sdk::{AniStreamClient, WatchProgressUpdate};
use uuid::Uuid;

/// Handle favorites subcommands
pub async fn handle_favorites(
    client: &AniStreamClient,
    action: FavoritesAction,
    json: bool,
) -> Result<()> {
    require_session(client)?;

    match action {
        FavoritesAction::List => {
            let favorites = client.list_favorites().await?;
            if json {
                return json_output(&favorites);
            }
            if favorites.is_empty() {
                print_info("No favorites yet");
            } else {
                table_output::display_favorites(&favorites);
            }
        }
        FavoritesAction::Add { anime_id } => {
            let favorite = client.add_favorite(anime_id).await?;
            if json {
                return json_output(&favorite);
            }
            print_success(&format!("Added {anime_id} to favorites"));
        }
        FavoritesAction::Remove { anime_id } => {
            client.remove_favorite(anime_id).await?;
            if !json {
                print_success(&format!("Removed {anime_id} from favorites"));
            }
        }
    }
    Ok(())
}

/// Handle continue command
pub async fn handle_continue(client: &AniStreamClient, json: bool) -> Result<()> {
    require_session(client)?;
    let entries = client.continue_watching().await?;
    if json {
        return json_output(&entries);
    }
    if entries.is_empty() {
        print_info("Nothing in progress");
    } else {
        table_output::display_progress(&entries);
    }
    Ok(())
}

/// Handle progress command
pub async fn handle_progress(
    client: &AniStreamClient,
    anime_id: Uuid,
    episode: u32,
    position_seconds: Option<u32>,
    progress_percent: Option<f64>,
    json: bool,
) -> Result<()> {
    require_session(client)?;
    let update = WatchProgressUpdate {
        anime_id,
        episode,
        position_seconds,
        progress_percent,
    };

    let progress = client.update_watch_progress(&update).await?;
    if json {
        return json_output(&progress);
    }
    print_success(&format!("Saved progress for episode {}", progress.episode));
    Ok(())
}
