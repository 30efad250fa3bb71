pub mod sitemap;

use std::collections::BTreeMap;

use colored::Colorize;
use serde::Serialize;

use crate::catalog::{FilterState, Game};
use crate::router::{RouteName, Router};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// Flattened game row for listings.
#[derive(Clone, Debug, Serialize)]
pub struct GameRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub url: String,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub thumbnail: String,
    pub mobile_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_added: Option<String>,
}

impl From<&Game> for GameRecord {
    fn from(game: &Game) -> Self {
        let params = BTreeMap::from([("slug".to_string(), game.slug.clone())]);
        GameRecord {
            id: game.id.clone(),
            slug: game.slug.clone(),
            title: game.title.clone(),
            url: format!("#{}", Router::build_url(RouteName::Game, &params)),
            genres: game.genres.clone(),
            tags: game.tags.clone(),
            thumbnail: game.thumbnail(),
            mobile_ready: game.is_mobile_ready(),
            date_added: game.date_added.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

pub fn build_records(games: &[&Game]) -> Vec<GameRecord> {
    games.iter().map(|g| GameRecord::from(*g)).collect()
}

#[derive(Clone, Debug, Serialize)]
pub struct Listing {
    pub state: FilterState,
    pub has_more: bool,
    pub games: Vec<GameRecord>,
}

pub fn render_text(records: &[GameRecord], no_color: bool) -> String {
    let mut out = String::new();
    for r in records {
        let genres = r.genres.join(", ");
        if no_color {
            out.push_str(&format!("{:<8} {:<40} [{}] {}\n", r.id, r.title, genres, r.url));
        } else {
            out.push_str(&format!(
                "{:<8} {:<40} [{}] {}\n",
                r.id.dimmed(),
                r.title.bold().white(),
                genres.cyan(),
                r.url.green()
            ));
        }
    }
    out
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode JSON output: {e}"))
}

pub(crate) fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
