//! Table formatting for CLI output

use anistream_sdk::{AnimeListItem, EpisodeListItem, Favorite, WatchProgress};
use tabled::{settings::Style, Table, Tabled};

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

/// Display catalog entries in table format
pub fn display_anime(anime: &[AnimeListItem]) {
    println!("{}", anime_table(anime));
}

fn anime_table(anime: &[AnimeListItem]) -> Table {
    #[derive(Tabled)]
    struct AnimeRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Year")]
        year: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<AnimeRow> = anime
        .iter()
        .map(|item| AnimeRow {
            id: item.id.to_string(),
            title: item.title.clone(),
            year: or_dash(item.year.map(|y| y.to_string())),
            status: or_dash(item.status.clone()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    table
}

/// Display the episodes of one title
pub fn display_episodes(episodes: &[EpisodeListItem]) {
    #[derive(Tabled)]
    struct EpisodeRow {
        #[tabled(rename = "#")]
        number: u32,
        #[tabled(rename = "Title")]
        title: String,
    }

    let rows: Vec<EpisodeRow> = episodes
        .iter()
        .map(|episode| EpisodeRow {
            number: episode.number,
            title: episode
                .title
                .clone()
                .unwrap_or_else(|| "Untitled".to_string()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

/// Display favorites in table format
pub fn display_favorites(favorites: &[Favorite]) {
    #[derive(Tabled)]
    struct FavoriteRow {
        #[tabled(rename = "Anime ID")]
        anime_id: String,
        #[tabled(rename = "Added")]
        added: String,
    }

    let rows: Vec<FavoriteRow> = favorites
        .iter()
        .map(|favorite| FavoriteRow {
            anime_id: favorite.anime_id.to_string(),
            added: favorite.created_at.format("%Y-%m-%d").to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

/// Display continue-watching entries
pub fn display_progress(entries: &[WatchProgress]) {
    println!("{}", progress_table(entries));
}

fn progress_table(entries: &[WatchProgress]) -> Table {
    #[derive(Tabled)]
    struct ProgressRow {
        #[tabled(rename = "Anime ID")]
        anime_id: String,
        #[tabled(rename = "Episode")]
        episode: u32,
        #[tabled(rename = "Progress")]
        progress: String,
        #[tabled(rename = "Last Watched")]
        last_watched: String,
    }

    let rows: Vec<ProgressRow> = entries
        .iter()
        .map(|entry| ProgressRow {
            anime_id: entry.anime_id.to_string(),
            episode: entry.episode,
            progress: or_dash(entry.progress_percent.map(|p| format!("{p:.0}%"))),
            last_watched: entry.last_watched_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    table
}
