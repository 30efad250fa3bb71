use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::catalog::{CatalogSource, CatalogStore, Game, LoadError, LoadState, ALL_CATEGORY};
use crate::output::sitemap::SitemapBuilder;
use crate::portal::{Options, Portal, View};
use crate::router::{RouteName, Router};

fn document() -> serde_json::Value {
    json!({
        "segments": [
            {"hits": [
                {"id": 1, "slug": "block-drop", "title": "Block Drop", "genres": ["Puzzle"],
                 "tags": ["blocks"], "images": ["https://cdn.example.com/1.png"]},
                {"id": "2", "slug": "road-rage", "title": "Road Rage", "genres": [" Action "],
                 "description": "Race the clock", "mobileReady": ["android"]},
                {"id": 3, "slug": "crate-smash", "title": "Crate Smash", "genres": ["Puzzle", "Action"]}
            ]},
            {"hits": [
                {"id": 4, "slug": "zen-garden", "title": "Zen Garden", "genres": ["casual"], "tags": null},
                {"id": 5, "slug": "apple-toss", "title": "Apple Toss", "genres": ["Casual", "ACTION"]},
                {"id": 6, "title": "No Slug"},
                {"id": 1, "slug": "block-drop-2", "title": "Duplicate Id"}
            ]}
        ]
    })
}

fn ids(games: &[&Game]) -> Vec<String> {
    games.iter().map(|g| g.id.clone()).collect()
}

fn loaded_store() -> CatalogStore {
    let mut store = CatalogStore::new();
    store.load_document(&document().to_string()).unwrap();
    store
}

fn three_games() -> CatalogStore {
    let games: Vec<Game> = serde_json::from_value(json!([
        {"id": 1, "slug": "a", "genres": ["Puzzle"]},
        {"id": 2, "slug": "b", "genres": ["Action"]},
        {"id": 3, "slug": "c", "genres": ["Puzzle", "Action"]}
    ]))
    .unwrap();
    CatalogStore::from_games(games)
}

#[test]
fn document_hits_are_flattened_and_deduplicated() {
    let store = loaded_store();
    assert_eq!(store.load_state(), LoadState::Ready);
    assert_eq!(store.len(), 5);
    assert_eq!(
        ids(&store.results()),
        vec!["1", "2", "3", "4", "5"]
    );
    assert!(store.get_by_slug("block-drop-2").is_none());
}

#[test]
fn every_game_is_found_by_its_slug() {
    let store = loaded_store();
    for game in store.games() {
        assert_eq!(store.get_by_slug(&game.slug), Some(game));
    }
}

#[test]
fn category_filter_matches_genres_case_insensitively() {
    let mut store = loaded_store();
    let full = store.len();
    for category in store.categories() {
        let matched: Vec<Game> = store
            .filter_by_category(&category)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(store.total_count(), store.results().len());
        if category == ALL_CATEGORY {
            assert_eq!(store.total_count(), full);
            continue;
        }
        for game in store.results() {
            assert!(
                game.genres
                    .iter()
                    .any(|g| g.trim().eq_ignore_ascii_case(&category)),
                "{} should not be in {category}",
                game.slug
            );
        }
        assert!(matched.len() <= store.total_count());
    }
}

#[test]
fn clearing_search_and_category_equals_reset() {
    let mut store = loaded_store();
    store.filter_by_category("puzzle");
    store.search("crate");
    store.search("");
    let cleared = ids(&store.filter_by_category(ALL_CATEGORY));
    let cleared_results = ids(&store.results());
    let reset = ids(&store.reset());
    assert_eq!(cleared, reset);
    assert_eq!(cleared_results, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn three_game_catalog_filters_and_searches() {
    let mut store = three_games();
    store.filter_by_category("puzzle");
    assert_eq!(ids(&store.results()), vec!["1", "3"]);
    store.filter_by_category("all");
    store.search("action");
    assert_eq!(ids(&store.results()), vec!["2", "3"]);
}

#[test]
fn paging_reveals_two_then_four_then_five() {
    let mut store = loaded_store();
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
fn route_table_examples() {
    let mut router = Router::new();

    let route = router.resolve("#/category/puzzle");
    assert_eq!(route.route, RouteName::Category);
    assert_eq!(route.param("category"), Some("puzzle"));

    let route = router.resolve("#/game/my-cool-game");
    assert_eq!(route.route, RouteName::Game);
    assert_eq!(route.param("slug"), Some("my-cool-game"));

    assert_eq!(router.resolve("#/game/../../etc").route, RouteName::Home);
    assert_eq!(router.resolve("#/unknown/path/here").route, RouteName::Home);
    assert_eq!(router.location(), Some("#/"));
}

#[test]
fn portal_views_follow_navigation() {
    let seen: Rc<RefCell<Vec<RouteName>>> = Rc::new(RefCell::new(Vec::new()));
    let options = Options {
        page_size: 2,
        ..Options::default()
    };
    let mut portal = Portal::with_catalog(options, loaded_store()).unwrap();
    let sink = Rc::clone(&seen);
    portal
        .router_mut()
        .subscribe(move |route| sink.borrow_mut().push(route.route));

    match portal.open("#/category/action", &["1"], &["2"]).1 {
        View::Category { games, total, has_more, .. } => {
            assert_eq!(ids(&games), vec!["2", "3"]);
            assert_eq!(total, 3);
            assert!(has_more);
        }
        other => panic!("unexpected view {other:?}"),
    }
    match portal.open("#/favorites", &["1"], &["2"]).1 {
        View::Favorites { games } => assert_eq!(ids(&games), vec!["1"]),
        other => panic!("unexpected view {other:?}"),
    }
    match portal.open("", &["1"], &["2"]).1 {
        View::Home { total, .. } => assert_eq!(total, 5),
        other => panic!("unexpected view {other:?}"),
    }
    assert_eq!(
        *seen.borrow(),
        vec![RouteName::Category, RouteName::Favorites, RouteName::Home]
    );
}

#[tokio::test]
async fn portal_loads_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("games.json");
    std::fs::write(&path, document().to_string()).unwrap();

    let mut portal = Portal::new(Options {
        source: CatalogSource::FilePath(path),
        ..Options::default()
    })
    .unwrap();
    assert_eq!(portal.load().await.unwrap(), 5);
    assert_eq!(
        portal.catalog().categories(),
        vec!["action", "all", "casual", "puzzle"]
    );

    let sitemap = SitemapBuilder::new("https://example.com", "2024-05-01").build(portal.catalog());
    assert_eq!(sitemap.len(), 1 + 3 + 5);
}

#[tokio::test]
async fn missing_catalog_file_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = CatalogStore::new();
    let err = store
        .load(&CatalogSource::FilePath(dir.path().join("absent.json")))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert_eq!(store.load_state(), LoadState::Failed);
    assert!(store.is_empty());
    assert_eq!(store.categories(), vec![ALL_CATEGORY]);
}

#[tokio::test]
async fn reload_replaces_previous_catalog() {
    let mut store = loaded_store();
    let replacement = json!({"segments": [{"hits": [
        {"id": 9, "slug": "solo", "title": "Solo", "genres": ["Arcade"]}
    ]}]});
    let loaded = store
        .load(&CatalogSource::Inline(replacement.to_string()))
        .await
        .unwrap();
    assert_eq!(loaded, 1);
    assert!(store.get_by_slug("block-drop").is_none());
    assert_eq!(store.categories(), vec!["all", "arcade"]);
}

/// Serves one HTTP/1.1 response on an ephemeral local port and returns the
/// catalog URL pointing at it.
async fn serve_once(status: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    format!("http://{addr}/games.json")
}

#[tokio::test]
async fn catalog_loads_over_http() {
    let url = serve_once("200 OK", document().to_string()).await;
    let mut store = CatalogStore::new();
    let loaded = store.load(&CatalogSource::parse(&url)).await.unwrap();
    assert_eq!(loaded, 5);
    assert_eq!(store.load_state(), LoadState::Ready);
    assert!(store.get_by_slug("road-rage").is_some());
}

#[tokio::test]
async fn http_error_status_fails_load() {
    let url = serve_once("404 Not Found", "{}".to_string()).await;
    let mut store = CatalogStore::new();
    let err = store.load(&CatalogSource::Url(url.clone())).await.unwrap_err();
    match err {
        LoadError::Status { status, url: failed } => {
            assert_eq!(status, 404);
            assert_eq!(failed, url);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(store.is_empty());
    assert_eq!(store.load_state(), LoadState::Failed);
    assert_eq!(store.categories(), vec![ALL_CATEGORY]);
}

#[test]
fn empty_document_loads_zero_games() {
    let mut store = CatalogStore::new();
    assert_eq!(store.load_document("{}").unwrap(), 0);
    assert_eq!(store.load_state(), LoadState::Ready);
    assert_eq!(store.categories(), vec![ALL_CATEGORY]);
}
