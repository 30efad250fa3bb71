use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{
    new_game_cutoff, CatalogSource, CatalogStore, FetchOptions, Game, LoadError,
    DEFAULT_NEW_GAME_DAYS, DEFAULT_PAGE_SIZE,
};
use crate::meta::{self, PageMeta};
use crate::router::{ResolvedRoute, RouteName, Router};

pub const DEFAULT_RELATED_LIMIT: usize = 10;

#[derive(Clone, Debug)]
pub struct Options {
    pub source: CatalogSource,
    pub page_size: usize,
    pub related_limit: usize,
    /// Games added within this many days count as new.
    pub new_game_days: i64,
    pub fetch: FetchOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: CatalogSource::default(),
            page_size: DEFAULT_PAGE_SIZE,
            related_limit: DEFAULT_RELATED_LIMIT,
            new_game_days: DEFAULT_NEW_GAME_DAYS,
            fetch: FetchOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("invalid page_size {value}, expected positive integer")]
    InvalidPageSize { value: usize },

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// What a view layer needs to draw one route.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View<'a> {
    Home {
        games: Vec<&'a Game>,
        total: usize,
        has_more: bool,
        recently_added: Vec<&'a Game>,
        new_count: usize,
    },
    Game {
        game: &'a Game,
        related: Vec<&'a Game>,
        meta: PageMeta,
    },
    GameNotFound {
        slug: String,
    },
    Favorites {
        games: Vec<&'a Game>,
    },
    Recent {
        games: Vec<&'a Game>,
    },
    Category {
        category: String,
        games: Vec<&'a Game>,
        total: usize,
        has_more: bool,
    },
}

/// One catalog and one router, wired together. Construct explicitly and
/// hand it to whatever needs it.
#[derive(Debug)]
pub struct Portal {
    options: Options,
    catalog: CatalogStore,
    router: Router,
}

impl Portal {
    pub fn new(options: Options) -> Result<Self, PortalError> {
        if options.page_size == 0 {
            return Err(PortalError::InvalidPageSize {
                value: options.page_size,
            });
        }
        let catalog = CatalogStore::new()
            .with_page_size(options.page_size)
            .with_fetch_options(options.fetch.clone());
        Ok(Self {
            options,
            catalog,
            router: Router::new(),
        })
    }

    /// Wraps an already populated store.
    pub fn with_catalog(options: Options, catalog: CatalogStore) -> Result<Self, PortalError> {
        let mut portal = Self::new(options)?;
        portal.catalog = catalog.with_page_size(portal.options.page_size);
        Ok(portal)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut CatalogStore {
        &mut self.catalog
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub async fn load(&mut self) -> Result<usize, PortalError> {
        let loaded = self.catalog.load(&self.options.source).await?;
        info!("portal ready with {loaded} games");
        Ok(loaded)
    }

    /// Resolves `fragment` and builds its view. `favorites` and `recent`
    /// are id lists owned by the caller.
    pub fn open<S: AsRef<str>>(&mut self, fragment: &str, favorites: &[S], recent: &[S]) -> (ResolvedRoute, View<'_>) {
        let resolved = self.router.resolve(fragment);
        let view = self.view_for(&resolved, favorites, recent);
        (resolved, view)
    }

    pub fn view_for<S: AsRef<str>>(
        &mut self,
        route: &ResolvedRoute,
        favorites: &[S],
        recent: &[S],
    ) -> View<'_> {
        match route.route {
            RouteName::Home => {
                self.catalog.reset();
                let catalog = &self.catalog;
                let cutoff = new_game_cutoff(self.options.new_game_days);
                View::Home {
                    games: catalog.current_page(),
                    total: catalog.total_count(),
                    has_more: catalog.has_more(),
                    recently_added: catalog.recently_added_games(cutoff, self.options.page_size),
                    new_count: catalog.new_games_count(cutoff),
                }
            }
            RouteName::Game => {
                let slug = route.param("slug").unwrap_or_default();
                let catalog = &self.catalog;
                match catalog.get_by_slug(slug) {
                    Some(game) => View::Game {
                        game,
                        related: catalog.related_games(&game.id, self.options.related_limit),
                        meta: meta::game_meta(game),
                    },
                    None => View::GameNotFound {
                        slug: slug.to_string(),
                    },
                }
            }
            RouteName::Favorites => View::Favorites {
                games: self.catalog.get_by_ids(favorites.iter().map(|s| s.as_ref())),
            },
            RouteName::Recent => View::Recent {
                games: self.catalog.get_by_ids(recent.iter().map(|s| s.as_ref())),
            },
            RouteName::Category => {
                let category = route.param("category").unwrap_or_default().to_string();
                self.catalog.filter_by_category(&category);
                let catalog = &self.catalog;
                View::Category {
                    category: catalog.category().to_string(),
                    games: catalog.current_page(),
                    total: catalog.total_count(),
                    has_more: catalog.has_more(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn portal() -> Portal {
        let games: Vec<Game> = serde_json::from_value(json!([
            {"id": 1, "slug": "block-drop", "title": "Block Drop", "genres": ["Puzzle"]},
            {"id": 2, "slug": "road-rage", "title": "Road Rage", "genres": ["Action"]},
            {"id": 3, "slug": "crate-smash", "title": "Crate Smash", "genres": ["Puzzle", "Action"]}
        ]))
        .unwrap();
        let options = Options {
            page_size: 2,
            ..Options::default()
        };
        Portal::with_catalog(options, CatalogStore::from_games(games)).unwrap()
    }

    fn ids(games: &[&Game]) -> Vec<String> {
        games.iter().map(|g| g.id.clone()).collect()
    }

    const NONE: &[&str] = &[];

    #[test]
    fn rejects_zero_page_size() {
        let err = Portal::new(Options {
            page_size: 0,
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(err, PortalError::InvalidPageSize { value: 0 }));
    }

    #[test]
    fn home_shows_first_page() {
        let mut portal = portal();
        let (route, view) = portal.open("", NONE, NONE);
        assert_eq!(route.route, RouteName::Home);
        match view {
            View::Home { games, total, has_more, recently_added, new_count } => {
                assert_eq!(ids(&games), vec!["1", "2"]);
                assert_eq!(total, 3);
                assert!(has_more);
                assert!(recently_added.is_empty());
                assert_eq!(new_count, 0);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn home_lists_games_added_inside_the_window() {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let games: Vec<Game> = serde_json::from_value(json!([
            {"id": 1, "slug": "old", "title": "Old", "dateAdded": "2001-06-01"},
            {"id": 2, "slug": "fresh", "title": "Fresh", "dateAdded": today},
            {"id": 3, "slug": "undated", "title": "Undated"}
        ]))
        .unwrap();
        let options = Options {
            new_game_days: 30,
            ..Options::default()
        };
        let mut portal = Portal::with_catalog(options, CatalogStore::from_games(games)).unwrap();
        match portal.open("#/", NONE, NONE).1 {
            View::Home { recently_added, new_count, total, .. } => {
                assert_eq!(ids(&recently_added), vec!["2"]);
                assert_eq!(new_count, 1);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn category_view_filters() {
        let mut portal = portal();
        match portal.open("#/category/puzzle", NONE, NONE).1 {
            View::Category { category, games, has_more, .. } => {
                assert_eq!(category, "puzzle");
                assert_eq!(ids(&games), vec!["1", "3"]);
                assert!(!has_more);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn game_view_and_missing_game() {
        let mut portal = portal();
        match portal.open("#/game/crate-smash", NONE, NONE).1 {
            View::Game { game, related, meta } => {
                assert_eq!(game.id, "3");
                assert_eq!(ids(&related), vec!["1", "2"]);
                assert_eq!(meta.title, "Crate Smash - Play Free on Kloopik");
            }
            other => panic!("unexpected view {other:?}"),
        }
        assert!(matches!(
            portal.open("#/game/gone", NONE, NONE).1,
            View::GameNotFound { slug } if slug == "gone"
        ));
    }

    #[test]
    fn favorites_and_recent_use_caller_ids() {
        let mut portal = portal();
        let favorites = ["3", "99", "1"];
        let recent = ["2"];
        match portal.open("#/favorites", &favorites, &recent).1 {
            View::Favorites { games } => assert_eq!(ids(&games), vec!["3", "1"]),
            other => panic!("unexpected view {other:?}"),
        }
        match portal.open("#/recent", &favorites, &recent).1 {
            View::Recent { games } => assert_eq!(ids(&games), vec!["2"]),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_failure_is_reported_once() {
        let mut portal = Portal::new(Options {
            source: CatalogSource::Inline("[not json".to_string()),
            ..Options::default()
        })
        .unwrap();
        let err = portal.load().await.unwrap_err();
        assert!(matches!(err, PortalError::Load(LoadError::Parse { .. })));
        assert!(portal.catalog().is_empty());
        let (route, _) = portal.open("#/category/puzzle", NONE, NONE);
        assert_eq!(route.route, RouteName::Category);
    }
}
