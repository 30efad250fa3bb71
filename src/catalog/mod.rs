pub mod game;
pub mod source;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use serde::Serialize;

pub use game::{CatalogDocument, Game};
pub use source::{CatalogSource, FetchOptions, LoadError};

/// Category sentinel meaning "no category filter".
pub const ALL_CATEGORY: &str = "all";
pub const DEFAULT_PAGE_SIZE: usize = 48;
/// Window used for "new" badges and the recently added listing.
pub const DEFAULT_NEW_GAME_DAYS: i64 = 7;

const SUGGESTION_MIN_QUERY: usize = 2;

/// Start of the "new game" window ending now. Negative windows count as zero.
pub fn new_game_cutoff(days: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::days(days.clamp(0, 36_500))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Load order.
    #[default]
    Default,
    NameAsc,
    NameDesc,
    Random,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "default" | "" => Some(Self::Default),
            "name-asc" | "name" | "az" => Some(Self::NameAsc),
            "name-desc" | "za" => Some(Self::NameDesc),
            "random" | "shuffle" => Some(Self::Random),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Empty,
    /// A load started and has not finished (or its future was dropped).
    Loading,
    Ready,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub category: String,
    pub search: String,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub displayed: usize,
    pub sort: SortOrder,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Suggestion {
    Game {
        text: String,
        game_id: String,
        slug: String,
    },
    Category {
        text: String,
    },
}

impl Suggestion {
    pub fn text(&self) -> &str {
        match self {
            Suggestion::Game { text, .. } | Suggestion::Category { text } => text,
        }
    }
}

/// In-memory game catalog with category/search filtering and incremental
/// reveal of the result set.
///
/// The result set is kept as indices into the full list, so every view
/// borrows from the single loaded copy.
#[derive(Clone, Debug)]
pub struct CatalogStore {
    games: Vec<Game>,
    categories: BTreeSet<String>,
    category: String,
    search: String,
    sort: SortOrder,
    results: Vec<usize>,
    page: usize,
    page_size: usize,
    state: LoadState,
    fetch_options: FetchOptions,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            games: Vec::new(),
            categories: BTreeSet::from([ALL_CATEGORY.to_string()]),
            category: ALL_CATEGORY.to_string(),
            search: String::new(),
            sort: SortOrder::Default,
            results: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            state: LoadState::Empty,
            fetch_options: FetchOptions::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Builds a ready store from already decoded games. Repeated ids or slugs
    /// keep their first occurrence.
    pub fn from_games(games: impl IntoIterator<Item = Game>) -> Self {
        let mut store = Self::new();
        store.install(game::unique_games(games));
        store
    }

    /// Fetches and installs the catalog document. On failure the store is
    /// left empty in the `Failed` state and the error is returned as-is.
    pub async fn load(&mut self, source: &CatalogSource) -> Result<usize, LoadError> {
        self.state = LoadState::Loading;
        self.games.clear();
        self.reset_view();
        info!("loading catalog from {}", source.describe());

        match source::fetch(source, &self.fetch_options).await {
            Ok(body) => self.load_document(&body),
            Err(e) => {
                warn!("catalog load failed: {e}");
                self.fail();
                Err(e)
            }
        }
    }

    /// Parses an already fetched catalog body and installs it.
    pub fn load_document(&mut self, body: &str) -> Result<usize, LoadError> {
        match CatalogDocument::parse(body) {
            Ok(doc) => {
                self.install(doc.into_games());
                info!(
                    "catalog ready: {} games, {} categories",
                    self.games.len(),
                    self.categories.len().saturating_sub(1)
                );
                Ok(self.games.len())
            }
            Err(e) => {
                warn!("catalog document is not valid JSON: {e}");
                self.fail();
                Err(LoadError::Parse { source: e })
            }
        }
    }

    fn install(&mut self, games: Vec<Game>) {
        self.games = games;
        self.derive_categories();
        self.category = ALL_CATEGORY.to_string();
        self.search.clear();
        self.sort = SortOrder::Default;
        self.reset_view();
        self.state = LoadState::Ready;
    }

    fn fail(&mut self) {
        self.games.clear();
        self.derive_categories();
        self.reset_view();
        self.state = LoadState::Failed;
    }

    fn reset_view(&mut self) {
        self.results = (0..self.games.len()).collect();
        self.page = 1;
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Ready
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Rebuilds the category vocabulary from every game's genres.
    pub fn derive_categories(&mut self) {
        let mut categories = BTreeSet::from([ALL_CATEGORY.to_string()]);
        for genre in self.games.iter().flat_map(|g| g.genres.iter()) {
            let label = genre.trim().to_lowercase();
            if !label.is_empty() {
                categories.insert(label);
            }
        }
        self.categories = categories;
    }

    /// Sorted category labels, `"all"` included.
    pub fn categories(&self) -> Vec<String> {
        self.categories.iter().cloned().collect()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn search_query(&self) -> &str {
        &self.search
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn filter_by_category(&mut self, category: &str) -> Vec<&Game> {
        self.category = category.trim().to_lowercase();
        if self.category.is_empty() {
            self.category = ALL_CATEGORY.to_string();
        }
        self.page = 1;
        self.apply_filters();
        self.current_page()
    }

    pub fn search(&mut self, query: &str) -> Vec<&Game> {
        self.search = query.trim().to_lowercase();
        self.page = 1;
        self.apply_filters();
        self.current_page()
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> Vec<&Game> {
        self.sort = order;
        self.page = 1;
        self.apply_filters();
        self.current_page()
    }

    fn apply_filters(&mut self) {
        let category = self.category.as_str();
        let search = self.search.as_str();
        self.results = self
            .games
            .iter()
            .enumerate()
            .filter(|(_, g)| category == ALL_CATEGORY || g.has_genre(category))
            .filter(|(_, g)| search.is_empty() || g.matches_query(search))
            .map(|(i, _)| i)
            .collect();
        self.apply_sorting();
        debug!(
            "filters applied: category={} search={:?} sort={} -> {} results",
            self.category,
            self.search,
            self.sort,
            self.results.len()
        );
    }

    fn apply_sorting(&mut self) {
        let games = &self.games;
        match self.sort {
            SortOrder::Default => {}
            SortOrder::NameAsc => self
                .results
                .sort_by_cached_key(|&i| games[i].title.to_lowercase()),
            SortOrder::NameDesc => self.results.sort_by(|&a, &b| {
                games[b]
                    .title
                    .to_lowercase()
                    .cmp(&games[a].title.to_lowercase())
            }),
            SortOrder::Random => self.results.shuffle(&mut rand::thread_rng()),
        }
    }

    /// Sets the page size and rewinds the visible prefix to nothing; the
    /// next [`load_more`](Self::load_more) reveals the first page.
    pub fn paginate(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 0;
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn load_more(&mut self) -> Vec<&Game> {
        if self.has_more() {
            self.page += 1;
        }
        self.current_page()
    }

    pub fn has_more(&self) -> bool {
        self.page.saturating_mul(self.page_size) < self.results.len()
    }

    fn visible_len(&self) -> usize {
        self.page
            .saturating_mul(self.page_size)
            .min(self.results.len())
    }

    /// The revealed prefix of the result set.
    pub fn current_page(&self) -> Vec<&Game> {
        self.results[..self.visible_len()]
            .iter()
            .map(|&i| &self.games[i])
            .collect()
    }

    pub fn results(&self) -> Vec<&Game> {
        self.results.iter().map(|&i| &self.games[i]).collect()
    }

    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    pub fn reset(&mut self) -> Vec<&Game> {
        self.category = ALL_CATEGORY.to_string();
        self.search.clear();
        self.sort = SortOrder::Default;
        self.reset_view();
        self.current_page()
    }

    pub fn filter_state(&self) -> FilterState {
        FilterState {
            category: self.category.clone(),
            search: self.search.clone(),
            page: self.page,
            page_size: self.page_size,
            total: self.results.len(),
            displayed: self.visible_len(),
            sort: self.sort,
        }
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.slug == slug)
    }

    /// Ids compare by string form, so `7` and `"7"` find the same game.
    pub fn get_by_id<I: fmt::Display>(&self, id: I) -> Option<&Game> {
        let id = id.to_string();
        self.games.iter().find(|g| g.id == id)
    }

    /// Resolves ids in the given order; unknown ids are skipped.
    pub fn get_by_ids<I>(&self, ids: I) -> Vec<&Game>
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        ids.into_iter().filter_map(|id| self.get_by_id(id)).collect()
    }

    pub fn games_by_genre(&self, genre: &str, limit: usize) -> Vec<&Game> {
        let genre = genre.trim().to_lowercase();
        self.games
            .iter()
            .filter(|g| g.has_genre(&genre))
            .take(limit)
            .collect()
    }

    /// Games added after `cutoff`, newest first. Undated games never qualify.
    pub fn recently_added_games(&self, cutoff: DateTime<Utc>, limit: usize) -> Vec<&Game> {
        let mut recent: Vec<&Game> = self
            .games
            .iter()
            .filter(|g| g.is_added_after(cutoff))
            .collect();
        recent.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        recent.truncate(limit);
        recent
    }

    pub fn new_games_count(&self, cutoff: DateTime<Utc>) -> usize {
        self.games.iter().filter(|g| g.is_added_after(cutoff)).count()
    }

    pub fn is_new_game<I: fmt::Display>(&self, id: I, cutoff: DateTime<Utc>) -> bool {
        self.get_by_id(id)
            .map_or(false, |game| game.is_added_after(cutoff))
    }

    pub fn mobile_ready_games(&self, limit: usize) -> Vec<&Game> {
        self.games
            .iter()
            .filter(|g| g.is_mobile_ready())
            .take(limit)
            .collect()
    }

    /// Up to `count` distinct games picked uniformly at random.
    pub fn random_games(&self, count: usize) -> Vec<&Game> {
        let mut indices: Vec<usize> = (0..self.games.len()).collect();
        let amount = count.min(indices.len());
        let (picked, _) = indices.partial_shuffle(&mut rand::thread_rng(), amount);
        picked.iter().map(|&i| &self.games[i]).collect()
    }

    /// Other games ranked by shared genres (weight 3) and shared tags
    /// (weight 2). Games sharing nothing are left out.
    pub fn related_games<I: fmt::Display>(&self, id: I, limit: usize) -> Vec<&Game> {
        let Some(game) = self.get_by_id(id) else {
            return Vec::new();
        };
        let genres: Vec<String> = game.genres.iter().map(|g| g.to_lowercase()).collect();
        let tags: Vec<String> = game.tags.iter().map(|t| t.to_lowercase()).collect();

        let mut scored: Vec<(usize, &Game)> = self
            .games
            .iter()
            .filter(|other| other.id != game.id)
            .map(|other| {
                let other_genres: Vec<String> =
                    other.genres.iter().map(|g| g.to_lowercase()).collect();
                let other_tags: Vec<String> = other.tags.iter().map(|t| t.to_lowercase()).collect();
                let genre_hits = genres.iter().filter(|g| other_genres.contains(g)).count();
                let tag_hits = tags.iter().filter(|t| other_tags.contains(t)).count();
                (genre_hits * 3 + tag_hits * 2, other)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, g)| g).collect()
    }

    /// Title matches first, then category labels, deduplicated by text.
    pub fn search_suggestions(&self, query: &str, limit: usize) -> Vec<Suggestion> {
        if query.chars().count() < SUGGESTION_MIN_QUERY {
            return Vec::new();
        }
        let needle = query.to_lowercase();

        let titles = self
            .games
            .iter()
            .filter(|g| g.title.to_lowercase().contains(&needle))
            .map(|g| Suggestion::Game {
                text: g.title.clone(),
                game_id: g.id.clone(),
                slug: g.slug.clone(),
            });
        let categories = self
            .categories
            .iter()
            .filter(|c| c.as_str() != ALL_CATEGORY && c.contains(&needle))
            .map(|c| Suggestion::Category { text: c.clone() });

        titles
            .chain(categories)
            .unique_by(|s| s.text().to_string())
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn game(id: u32, title: &str, genres: &[&str], tags: &[&str]) -> Game {
        serde_json::from_value(json!({
            "id": id,
            "slug": format!("game-{id}"),
            "title": title,
            "genres": genres,
            "tags": tags,
        }))
        .unwrap()
    }

    fn ids(games: &[&Game]) -> Vec<String> {
        games.iter().map(|g| g.id.clone()).collect()
    }

    fn three_games() -> CatalogStore {
        CatalogStore::from_games(vec![
            game(1, "Block Drop", &["Puzzle"], &[]),
            game(2, "Road Rage", &["Action"], &[]),
            game(3, "Crate Smash", &["Puzzle", "Action"], &[]),
        ])
    }

    #[test]
    fn category_filter_keeps_load_order() {
        let mut store = three_games();
        assert_eq!(ids(&store.filter_by_category("puzzle")), vec!["1", "3"]);
        assert_eq!(ids(&store.filter_by_category("PUZZLE")), vec!["1", "3"]);
    }

    #[test]
    fn search_intersects_with_category() {
        let mut store = three_games();
        store.filter_by_category("all");
        assert_eq!(ids(&store.search("action")), vec!["2", "3"]);
        store.filter_by_category("puzzle");
        assert_eq!(ids(&store.current_page()), vec!["3"]);
    }

    #[test]
    fn unknown_category_is_empty_not_error() {
        let mut store = three_games();
        assert!(store.filter_by_category("racing").is_empty());
        assert_eq!(store.total_count(), 0);
        assert!(!store.has_more());
    }

    #[test]
    fn categories_are_sorted_lowercase_and_include_all() {
        let mut store = CatalogStore::from_games(vec![
            game(1, "a", &[" Shooter ", "Action"], &[]),
            game(2, "b", &["action", "Board"], &[]),
        ]);
        assert_eq!(store.categories(), vec!["action", "all", "board", "shooter"]);
        store.derive_categories();
        assert_eq!(store.categories(), vec!["action", "all", "board", "shooter"]);
    }

    #[test]
    fn empty_store_has_only_all_category() {
        let store = CatalogStore::new();
        assert_eq!(store.categories(), vec!["all"]);
        assert_eq!(store.load_state(), LoadState::Empty);
    }

    #[test]
    fn clearing_search_and_category_matches_reset() {
        let mut store = three_games();
        store.filter_by_category("action");
        store.search("crate");
        store.search("");
        let cleared = ids(&store.filter_by_category("all"));
        let reset = ids(&store.reset());
        assert_eq!(cleared, vec!["1", "2", "3"]);
        assert_eq!(cleared, reset);
    }

    #[test]
    fn load_more_reveals_one_page_per_call() {
        let mut store = CatalogStore::from_games((1..=5).map(|i| game(i, "t", &[], &[])));
        store.paginate(2);
        assert_eq!(store.load_more().len(), 2);
        assert!(store.has_more());
        assert_eq!(store.load_more().len(), 4);
        assert!(store.has_more());
        assert_eq!(store.load_more().len(), 5);
        assert!(!store.has_more());
        assert_eq!(store.load_more().len(), 5);
    }

    #[test]
    fn filtering_shows_exactly_one_page() {
        let mut store =
            CatalogStore::from_games((1..=5).map(|i| game(i, "t", &[], &[]))).with_page_size(2);
        assert_eq!(store.filter_by_category("all").len(), 2);
        store.load_more();
        assert_eq!(store.search("").len(), 2);
        let state = store.filter_state();
        assert_eq!(state.page, 1);
        assert_eq!(state.displayed, 2);
        assert_eq!(state.total, 5);
    }

    #[test]
    fn lookups_scan_full_list_not_results() {
        let mut store = three_games();
        store.filter_by_category("action");
        assert_eq!(store.get_by_slug("game-1").map(|g| g.id.as_str()), Some("1"));
        assert_eq!(store.get_by_id(1).map(|g| g.slug.as_str()), Some("game-1"));
        assert_eq!(store.get_by_id("1").map(|g| g.slug.as_str()), Some("game-1"));
        assert!(store.get_by_id(99).is_none());
        assert!(store.get_by_slug("nope").is_none());
    }

    #[test]
    fn get_by_ids_keeps_order_and_drops_unknown() {
        let store = three_games();
        let found = store.get_by_ids(["3", "42", "1"]);
        assert_eq!(ids(&found), vec!["3", "1"]);
    }

    #[test]
    fn name_sort_orders_titles() {
        let mut store = three_games();
        let asc = store.set_sort_order(SortOrder::NameAsc);
        assert_eq!(ids(&asc), vec!["1", "3", "2"]);
        let desc = store.set_sort_order(SortOrder::NameDesc);
        assert_eq!(ids(&desc), vec!["2", "3", "1"]);
        assert_eq!(ids(&store.reset()), vec!["1", "2", "3"]);
    }

    #[test]
    fn random_sort_is_a_permutation() {
        let mut store = three_games();
        let mut shuffled = ids(&store.set_sort_order(SortOrder::Random));
        shuffled.sort();
        assert_eq!(shuffled, vec!["1", "2", "3"]);
    }

    #[test]
    fn random_games_are_distinct_and_bounded() {
        let store = three_games();
        assert_eq!(store.random_games(10).len(), 3);
        let picked = ids(&store.random_games(2));
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);
    }

    #[test]
    fn related_games_rank_by_shared_labels() {
        let store = CatalogStore::from_games(vec![
            game(1, "a", &["Puzzle", "Action"], &["physics"]),
            game(2, "b", &["Racing"], &["physics"]),
            game(3, "c", &["Puzzle", "Action"], &[]),
            game(4, "d", &["Sports"], &[]),
        ]);
        assert_eq!(ids(&store.related_games(1, 10)), vec!["3", "2"]);
        assert_eq!(ids(&store.related_games(1, 1)), vec!["3"]);
        assert!(store.related_games(404, 10).is_empty());
    }

    #[test]
    fn suggestions_need_two_chars_and_dedupe() {
        let store = CatalogStore::from_games(vec![
            game(1, "Puzzle Quest", &["Puzzle"], &[]),
            game(2, "puzzle", &["Puzzle"], &[]),
        ]);
        assert!(store.search_suggestions("p", 5).is_empty());
        let texts: Vec<String> = store
            .search_suggestions("puz", 5)
            .iter()
            .map(|s| s.text().to_string())
            .collect();
        assert_eq!(texts, vec!["Puzzle Quest", "puzzle"]);
        assert!(matches!(
            store.search_suggestions("puz", 5)[1],
            Suggestion::Game { .. }
        ));
    }

    #[test]
    fn games_by_genre_limits() {
        let store = three_games();
        assert_eq!(ids(&store.games_by_genre("Action", 1)), vec!["2"]);
    }

    fn dated_games() -> CatalogStore {
        let games: Vec<Game> = serde_json::from_value(json!([
            {"id": 1, "slug": "old", "dateAdded": "2024-01-01"},
            {"id": 2, "slug": "newer", "dateAdded": "2024-03-10"},
            {"id": 3, "slug": "undated"},
            {"id": 4, "slug": "newest", "dateAdded": "2024-03-12T08:00:00Z"},
            {"id": 5, "slug": "edge", "dateAdded": "2024-03-05"}
        ]))
        .unwrap();
        CatalogStore::from_games(games)
    }

    fn march_fifth() -> DateTime<Utc> {
        "2024-03-05T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn recently_added_are_newest_first_after_cutoff() {
        let store = dated_games();
        assert_eq!(ids(&store.recently_added_games(march_fifth(), 10)), vec!["4", "2"]);
        assert_eq!(ids(&store.recently_added_games(march_fifth(), 1)), vec!["4"]);
        assert_eq!(store.new_games_count(march_fifth()), 2);
    }

    #[test]
    fn is_new_game_needs_a_date_and_a_known_id() {
        let store = dated_games();
        assert!(store.is_new_game(2, march_fifth()));
        assert!(store.is_new_game("4", march_fifth()));
        assert!(!store.is_new_game(5, march_fifth()));
        assert!(!store.is_new_game(3, march_fifth()));
        assert!(!store.is_new_game(99, march_fifth()));
    }

    #[test]
    fn default_window_counts_games_added_today() {
        let today = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let games: Vec<Game> = serde_json::from_value(json!([
            {"id": 1, "slug": "fresh", "dateAdded": today},
            {"id": 2, "slug": "stale", "dateAdded": "2001-01-01"}
        ]))
        .unwrap();
        let store = CatalogStore::from_games(games);
        assert_eq!(store.new_games_count(new_game_cutoff(DEFAULT_NEW_GAME_DAYS)), 1);
        assert_eq!(store.new_games_count(new_game_cutoff(-3)), 0);
    }

    #[test]
    fn mobile_ready_games_need_a_platform() {
        let games: Vec<Game> = serde_json::from_value(json!([
            {"id": 1, "slug": "a", "mobileReady": ["ios"]},
            {"id": 2, "slug": "b", "mobileReady": []},
            {"id": 3, "slug": "c", "mobileReady": null},
            {"id": 4, "slug": "d", "mobileReady": ["android", "ios"]}
        ]))
        .unwrap();
        let store = CatalogStore::from_games(games);
        assert_eq!(ids(&store.mobile_ready_games(10)), vec!["1", "4"]);
        assert_eq!(ids(&store.mobile_ready_games(1)), vec!["1"]);
    }

    #[test]
    fn load_document_failure_empties_store() {
        let mut store = three_games();
        let err = store.load_document("{ nope").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(store.is_empty());
        assert_eq!(store.load_state(), LoadState::Failed);
        assert!(store.filter_by_category("all").is_empty());
    }

    #[tokio::test]
    async fn load_inline_document_flattens_segments() {
        let mut store = CatalogStore::new();
        let body = json!({"segments": [
            {"hits": [{"id": 1, "slug": "a", "genres": ["Puzzle"]}]},
            {"hits": [{"id": 2, "slug": "b", "genres": ["Action"]}]}
        ]})
        .to_string();
        let n = store.load(&CatalogSource::Inline(body)).await.unwrap();
        assert_eq!(n, 2);
        assert!(store.is_loaded());
        assert_eq!(store.categories(), vec!["action", "all", "puzzle"]);
        assert_eq!(ids(&store.results()), vec!["1", "2"]);
    }
}
