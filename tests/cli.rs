use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

const SEARCH_JSON: &str = r#"{"page": 1, "results": [{"id": 27205, "title": "Inception", "release_date": "2010-07-15"}], "total_results": 1}"#;

const DETAILS_JSON: &str = r#"{
    "id": 27205,
    "title": "Inception",
    "tagline": "Your mind is the scene of the crime.",
    "overview": "Cobb steals secrets from dreams.",
    "release_date": "2010-07-15",
    "runtime": 148,
    "vote_average": 8.4,
    "genres": [{"id": 28, "name": "Action"}],
    "imdb_id": "tt1375666",
    "poster_path": "/inception.jpg"
}"#;

const CREDITS_JSON: &str = r#"{
    "id": 27205,
    "cast": [{"name": "Leonardo DiCaprio", "order": 0}],
    "crew": [{"name": "Christopher Nolan", "job": "Director"}]
}"#;

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.yaml");
    let contents = format!(
        "tmdb:\n  api_key: test-key\n  rate_limit_delay_ms: 0\nretry:\n  max_attempts: 2\n  initial_backoff_ms: 1\ncache:\n  path: {}\n",
        dir.join("cache.db").display()
    );
    fs::write(&path, contents).expect("failed to write config");
    path
}

fn reelscan(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("reelscan"));
    cmd.arg("--config")
        .arg(config)
        .env_remove("REELSCAN_CONFIG")
        .env_remove("REELSCAN_API_KEY")
        .env_remove("REELSCAN_API_HOST")
        .env_remove("REELSCAN_NO_CACHE")
        .env_remove("REELSCAN_REFRESH")
        .env_remove("REELSCAN_FORMAT")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn version_prints_package_version() {
    Command::new(assert_cmd::cargo::cargo_bin!("reelscan"))
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cache_path_follows_config() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config = write_config(temp.path());

    reelscan(&config)
        .args(["cache", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache.db"));

    Ok(())
}

#[test]
fn movie_without_api_key_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("config.yaml");
    fs::write(&config, "tmdb:\n  language: en-US\n")?;

    reelscan(&config)
        .args(["movie", "--title", "Inception"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));

    Ok(())
}

#[test]
fn movie_lookup_is_cached_between_runs() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let search = server
        .mock("GET", "/3/search/movie")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(SEARCH_JSON)
        .expect(1)
        .create();
    let details = server
        .mock("GET", "/3/movie/27205")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(DETAILS_JSON)
        .expect(1)
        .create();
    let credits = server
        .mock("GET", "/3/movie/27205/credits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(CREDITS_JSON)
        .expect(1)
        .create();

    let temp = tempdir()?;
    let config = write_config(temp.path());

    for _ in 0..2 {
        reelscan(&config)
            .args(["--format", "json", "movie", "--title", "Inception", "--year", "2010"])
            .env("REELSCAN_API_HOST", server.url())
            .assert()
            .success()
            .stdout(predicate::str::contains("Christopher Nolan"))
            .stdout(predicate::str::contains("\"tmdb_id\": 27205"));
    }

    search.assert();
    details.assert();
    credits.assert();

    reelscan(&config)
        .args(["--format", "json", "cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_entries\": 3"));

    Ok(())
}

#[test]
fn movie_downloads_poster() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _details = server
        .mock("GET", "/3/movie/27205")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(DETAILS_JSON)
        .create();
    let _credits = server
        .mock("GET", "/3/movie/27205/credits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(CREDITS_JSON)
        .create();
    let poster = server
        .mock("GET", "/t/p/w500/inception.jpg")
        .with_status(200)
        .with_body("jpeg-bytes")
        .expect(1)
        .create();

    let temp = tempdir()?;
    let config = write_config(temp.path());
    let destination = temp.path().join("out").join("poster.jpg");

    reelscan(&config)
        .arg("--no-cache")
        .args(["movie", "--id", "27205", "--poster"])
        .arg(&destination)
        .env("REELSCAN_API_HOST", server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("Inception (2010)"));

    poster.assert();
    assert_eq!(fs::read(&destination)?, b"jpeg-bytes");

    Ok(())
}

#[test]
fn image_copies_local_source() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config = write_config(temp.path());
    let source = temp.path().join("folder.jpg");
    fs::write(&source, b"local-art")?;
    let destination = temp.path().join("copy").join("poster.jpg");

    reelscan(&config)
        .args(["image", "--source"])
        .arg(&source)
        .arg("--out")
        .arg(&destination)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 9 bytes"));

    assert_eq!(fs::read(&destination)?, b"local-art");

    Ok(())
}

#[test]
fn cache_clear_on_empty_cache() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config = write_config(temp.path());

    reelscan(&config)
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already empty"));

    Ok(())
}
