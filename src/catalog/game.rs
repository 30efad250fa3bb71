use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::warn;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::sanitize::sanitize_url;

const PLACEHOLDER_COLORS: [&str; 5] = ["#ff6b35", "#4a90e2", "#9b59b6", "#e74c3c", "#2ecc71"];

/// A single catalog entry. Read-only once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Game {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub slug: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Vec<String>,
    #[serde(default, rename = "mobileReady", deserialize_with = "nullable")]
    pub mobile_ready: Vec<String>,
    #[serde(default, rename = "gameURL", skip_serializing_if = "Option::is_none")]
    pub game_url: Option<String>,
    /// Epoch milliseconds or an RFC 3339 / `YYYY-MM-DD` string in the feed.
    #[serde(
        default,
        rename = "dateAdded",
        deserialize_with = "deserialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_added: Option<DateTime<Utc>>,
}

impl Game {
    /// `category` is expected lower-cased.
    pub fn has_genre(&self, category: &str) -> bool {
        self.genres
            .iter()
            .any(|g| g.trim().to_lowercase() == category)
    }

    /// Case-insensitive substring match over title, description, genres and tags.
    /// `query` is expected lower-cased.
    pub fn matches_query(&self, query: &str) -> bool {
        std::iter::once(&self.title)
            .chain(std::iter::once(&self.description))
            .chain(self.genres.iter())
            .chain(self.tags.iter())
            .any(|field| field.to_lowercase().contains(query))
    }

    pub fn is_mobile_ready(&self) -> bool {
        !self.mobile_ready.is_empty()
    }

    /// False when the game carries no date.
    pub fn is_added_after(&self, cutoff: DateTime<Utc>) -> bool {
        self.date_added.map_or(false, |added| added > cutoff)
    }

    /// First image with a safe URL, or an inline SVG placeholder carrying
    /// the title's initial.
    pub fn thumbnail(&self) -> String {
        match self.images.first().and_then(|url| sanitize_url(url)) {
            Some(url) => url.to_string(),
            None => placeholder_image(&self.title),
        }
    }
}

pub fn placeholder_image(title: &str) -> String {
    let initial = title
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "G".to_string());
    let idx = title.bytes().map(usize::from).sum::<usize>() % PLACEHOLDER_COLORS.len();
    let color = PLACEHOLDER_COLORS[idx];
    let svg = format!(
        "<svg width=\"400\" height=\"300\" xmlns=\"http://www.w3.org/2000/svg\">\
<rect width=\"400\" height=\"300\" fill=\"{color}\"/>\
<text x=\"50%\" y=\"50%\" font-family=\"Arial\" font-size=\"120\" fill=\"white\" \
text-anchor=\"middle\" dy=\".3em\">{initial}</text></svg>"
    );
    format!("data:image/svg+xml,{}", urlencoding::encode(&svg))
}

/// Wire shape of the catalog document: `{ "segments": [ { "hits": [...] } ] }`.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(default, deserialize_with = "nullable")]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Segment {
    #[serde(default, deserialize_with = "nullable")]
    pub hits: Vec<serde_json::Value>,
}

impl CatalogDocument {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Flattens hits in segment order. Hits that do not decode into a [`Game`]
    /// or repeat an earlier id or slug are dropped.
    pub fn into_games(self) -> Vec<Game> {
        let decoded = self
            .segments
            .into_iter()
            .enumerate()
            .flat_map(|(segment_idx, segment)| {
                segment
                    .hits
                    .into_iter()
                    .enumerate()
                    .filter_map(move |(hit_idx, hit)| {
                        match serde_json::from_value::<Game>(hit) {
                            Ok(game) => Some(game),
                            Err(e) => {
                                warn!("skipping catalog hit {segment_idx}/{hit_idx}: {e}");
                                None
                            }
                        }
                    })
            });
        unique_games(decoded)
    }
}

/// Keeps the first game for every id and slug, dropping later repeats and
/// games with a blank slug.
pub fn unique_games(games: impl IntoIterator<Item = Game>) -> Vec<Game> {
    let mut out: Vec<Game> = Vec::new();
    let mut ids: HashSet<String> = HashSet::new();
    let mut slugs: HashSet<String> = HashSet::new();

    for game in games {
        if game.slug.trim().is_empty() {
            warn!("skipping game id={} with empty slug", game.id);
            continue;
        }
        if ids.contains(&game.id) {
            warn!("skipping duplicate game id={}", game.id);
            continue;
        }
        if slugs.contains(&game.slug) {
            warn!("skipping duplicate game slug={}", game.slug);
            continue;
        }
        ids.insert(game.id.clone());
        slugs.insert(game.slug.clone());
        out.push(game);
    }
    out
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ids arrive as numbers or strings depending on the feed; keep the string form
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("invalid game id: {other}"))),
    }
}

// unparseable dates are treated as absent rather than rejecting the hit
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        serde_json::Value::String(s) => parse_date(s.trim()),
        _ => None,
    };
    Ok(parsed)
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
