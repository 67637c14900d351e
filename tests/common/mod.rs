//! Shared test harness for integration tests.
//!
//! Provides [`TmdbMock`], a wiremock server answering the two popular
//! listings and serving generated PNG posters, plus helpers to build a
//! [`Config`] pointed at it.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use postergrid::config::{Config, TmdbConfig};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-key";

/// A small solid-colour poster encoded as PNG.
pub fn poster_png(seed: u64) -> Vec<u8> {
    let shade = (seed * 37 % 200) as u8;
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_fn(40, 60, |x, y| {
        Rgb([shade, (x * 4) as u8, (y * 4) as u8])
    })
    .write_to(&mut buf, ImageFormat::Png)
    .expect("encode poster fixture");
    buf.into_inner()
}

/// One listing page in TMDB's response shape. Series use `name`.
pub fn listing_page(kind: &str, page: u64, per_page: u64) -> serde_json::Value {
    let start = (page - 1) * per_page;
    let results: Vec<serde_json::Value> = (start..start + per_page)
        .map(|id| {
            let title_field = if kind == "movie" { "title" } else { "name" };
            let mut item = json!({
                "id": id,
                "poster_path": format!("/{kind}-{id}.png"),
            });
            item[title_field] = json!(format!("{kind} {id}"));
            item
        })
        .collect();
    json!({ "page": page, "results": results, "total_pages": 500 })
}

pub struct TmdbMock {
    pub server: MockServer,
}

impl TmdbMock {
    /// Start a server whose listings return `per_page` items on each of
    /// pages 1-3 and whose image CDN serves a poster for every path.
    pub async fn start(per_page: u64) -> Self {
        let server = MockServer::start().await;

        for kind in ["movie", "tv"] {
            for page in 1..=3u64 {
                Mock::given(method("GET"))
                    .and(path(format!("/3/{kind}/popular")))
                    .and(query_param("api_key", API_KEY))
                    .and(query_param("page", page.to_string()))
                    .respond_with(
                        ResponseTemplate::new(200).set_body_json(listing_page(kind, page, per_page)),
                    )
                    .mount(&server)
                    .await;
            }
        }

        Mock::given(method("GET"))
            .and(path_regex(r"^/t/p/w500/.+\.png$"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(poster_png(7)))
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn tmdb_config(&self) -> TmdbConfig {
        TmdbConfig {
            api_key: API_KEY.to_string(),
            base_url: format!("{}/3", self.server.uri()),
            image_base_url: format!("{}/t/p/w500", self.server.uri()),
            ..TmdbConfig::default()
        }
    }

    /// Config with local output under `dir` and `poster_count` posters.
    pub fn config(&self, dir: &Path, poster_count: usize) -> Config {
        let mut config = Config::default();
        config.tmdb = self.tmdb_config();
        config.output.dir = dir.to_path_buf();
        config.output.poster_count = poster_count;
        config
    }
}
