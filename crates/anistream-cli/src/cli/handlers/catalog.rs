//! Catalog command handlers

use crate::error::Result;
use crate::output::{json_output, print_field, print_info, table_output};
use anistream_sdk::{AniStreamClient, AnimeListItem, Page};
use uuid::Uuid;

/// Handle browse command
pub async fn handle_browse(client: &AniStreamClient, page: Page, json: bool) -> Result<()> {
    let anime = client.list_anime(page).await?;
    print_listing(&anime, json)
}

/// Handle search command
pub async fn handle_search(
    client: &AniStreamClient,
    query: &str,
    page: Page,
    json: bool,
) -> Result<()> {
    let anime = client.search_anime(query, page).await?;
    if anime.is_empty() && !json {
        print_info(&format!("Nothing found for \"{query}\""));
        return Ok(());
    }
    print_listing(&anime, json)
}

/// Handle anime command
pub async fn handle_anime(client: &AniStreamClient, id: Uuid, json: bool) -> Result<()> {
    let anime = client.get_anime(id).await?;
    if json {
        return json_output(&anime);
    }

    println!("{}", console::style(&anime.title).bold());
    print_field("Original title", anime.title_original.as_deref());
    print_field("Year", anime.year.map(|y| y.to_string()).as_deref());
    print_field("Status", anime.status.as_deref());
    if let Some(description) = &anime.description {
        println!();
        println!("{description}");
    }
    Ok(())
}

/// Handle episodes command
pub async fn handle_episodes(client: &AniStreamClient, anime_id: Uuid, json: bool) -> Result<()> {
    let episodes = client.list_episodes(anime_id).await?;
    if json {
        return json_output(&episodes);
    }
    if episodes.is_empty() {
        print_info("No episodes yet");
        return Ok(());
    }

    table_output::display_episodes(&episodes);
    Ok(())
}

fn print_listing(anime: &[AnimeListItem], json: bool) -> Result<()> {
    if json {
        return json_output(&anime);
    }

    table_output::display_anime(anime);
    Ok(())
}
