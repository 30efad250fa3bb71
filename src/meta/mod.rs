use serde::Serialize;

use crate::catalog::Game;
use crate::router::{ResolvedRoute, RouteName};

pub const SITE_NAME: &str = "Kloopik";
pub const MAX_DESCRIPTION_LEN: usize = 160;

/// Title, description and optional share image for one page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

pub fn page_meta(route: &ResolvedRoute) -> PageMeta {
    let (title, description) = match route.route {
        RouteName::Home => (
            format!("{SITE_NAME} - Free Online Games"),
            "Play 700+ free online games instantly in your browser!".to_string(),
        ),
        RouteName::Game => {
            let slug = route.param("slug").unwrap_or("game");
            (
                format!("{slug} - Play on {SITE_NAME}"),
                format!(
                    "Play {slug} for free on {SITE_NAME}. Start playing instantly in your browser!"
                ),
            )
        }
        RouteName::Favorites => (
            format!("My Favorites - {SITE_NAME}"),
            format!("Your favorite games on {SITE_NAME}"),
        ),
        RouteName::Recent => (
            format!("Recently Played - {SITE_NAME}"),
            format!("Games you recently played on {SITE_NAME}"),
        ),
        RouteName::Category => {
            let category = route.param("category").unwrap_or("games");
            (
                format!("{} Games - {SITE_NAME}", capitalize(category)),
                format!("Play the best {category} games on {SITE_NAME}"),
            )
        }
    };
    PageMeta {
        title,
        description,
        image: None,
    }
}

/// Metadata once the game record itself is known.
pub fn game_meta(game: &Game) -> PageMeta {
    let description = if game.description.trim().is_empty() {
        format!(
            "Play {} for free on {SITE_NAME}. Start playing instantly in your browser!",
            game.title
        )
    } else {
        game.description.chars().take(MAX_DESCRIPTION_LEN).collect()
    };
    PageMeta {
        title: format!("{} - Play Free on {SITE_NAME}", game.title),
        description,
        image: game.images.first().cloned(),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
