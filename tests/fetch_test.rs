//! Catalog fetcher and poster cache against a mocked TMDB.

mod common;

use std::sync::Arc;

use common::{listing_page, TmdbMock, API_KEY};
use postergrid::catalog::{fetch_content, PosterCache, TmdbClient};
use postergrid::report::Stage;
use postergrid_common::{CatalogKind, Error};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn popular_sends_key_and_maps_titles() {
    let mock = TmdbMock::start(5).await;
    let client = TmdbClient::new(&mock.tmdb_config()).unwrap();

    let movies = client.popular(CatalogKind::Movie, 1).await.unwrap();
    assert_eq!(movies.len(), 5);
    assert_eq!(movies[0].title, "movie 0");
    assert_eq!(movies[0].poster_path.as_deref(), Some("/movie-0.png"));

    let series = client.popular(CatalogKind::Tv, 2).await.unwrap();
    assert_eq!(series[0].id, 5);
    assert_eq!(series[0].title, "tv 5");
    assert_eq!(series[0].kind, CatalogKind::Tv);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut config = TmdbMock::start(1).await.tmdb_config();
    config.base_url = format!("{}/3", server.uri());
    let client = TmdbClient::new(&config).unwrap();

    match client.popular(CatalogKind::Movie, 1).await {
        Err(Error::Status { status, url }) => {
            assert_eq!(status, 401);
            assert!(!url.contains(API_KEY));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_pages_until_quota() {
    let mock = TmdbMock::start(4).await;
    let client = TmdbClient::new(&mock.tmdb_config()).unwrap();

    let content = fetch_content(&client, 10).await;
    assert_eq!(content.movies, 5);
    assert_eq!(content.series, 5);
    assert_eq!(content.items.len(), 10);
    assert!(content.skips.is_empty());

    let requests = mock.server.received_requests().await.unwrap();
    // Two pages of four items per kind cover a quota of five.
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn failing_page_is_recorded_and_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    for page in 2..=3u64 {
        Mock::given(method("GET"))
            .and(path("/3/movie/popular"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_page("movie", page, 3)))
            .mount(&server)
            .await;
    }
    for page in 1..=3u64 {
        Mock::given(method("GET"))
            .and(path("/3/tv/popular"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_page("tv", page, 3)))
            .mount(&server)
            .await;
    }

    let mut config = TmdbMock::start(1).await.tmdb_config();
    config.base_url = format!("{}/3", server.uri());
    let client = TmdbClient::new(&config).unwrap();

    let content = fetch_content(&client, 12).await;
    assert_eq!(content.skips.len(), 1);
    assert_eq!(content.skips[0].stage, Stage::ListingPage);
    assert_eq!(content.movies, 6);
    assert_eq!(content.series, 6);
}

#[tokio::test]
async fn cache_drops_missing_and_broken_posters() {
    let server = MockServer::start().await;
    let movies = serde_json::json!({
        "results": [
            {"id": 1, "title": "Has Poster", "poster_path": "/ok.png"},
            {"id": 2, "title": "No Poster", "poster_path": null},
            {"id": 3, "title": "Gone", "poster_path": "/gone.png"},
            {"id": 4, "title": "Garbage", "poster_path": "/garbage.png"}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movies))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/tv/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/ok.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::poster_png(1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/garbage.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"definitely not a png".to_vec()))
        .mount(&server)
        .await;

    let mut config = TmdbMock::start(1).await.tmdb_config();
    config.base_url = format!("{}/3", server.uri());
    config.image_base_url = format!("{}/img", server.uri());
    let cache = PosterCache::new(Arc::new(TmdbClient::new(&config).unwrap()), 5);

    let (posters, report) = cache.get_or_fetch(8).await;
    assert_eq!(posters.len(), 1);
    assert_eq!(report.posters_cached, 1);
    assert_eq!(report.movies, 4);
    assert_eq!(report.series, 0);

    let stage_of = |title: &str| {
        report
            .skips
            .iter()
            .find(|s| s.subject == title)
            .map(|s| s.stage)
    };
    assert_eq!(stage_of("No Poster"), Some(Stage::MissingPoster));
    assert_eq!(stage_of("Gone"), Some(Stage::PosterDownload));
    assert_eq!(stage_of("Garbage"), Some(Stage::PosterDecode));
}
