//! TMDB metadata client
//!
//! Every sub-request goes through the same path: cache lookup, then a
//! throttled and retried HTTP call, then a cache write of the raw body.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use super::models::{Credits, MovieDetails, MovieRecord, MovieSummary, SearchResponse};
use super::retry::RetryPolicy;
use super::throttle::{DEFAULT_RATE_LIMIT_DELAY, RequestThrottle, ThrottlePermit};
use crate::cache::{DEFAULT_TTL, ResponseCache, cache_key};
use crate::config::{Config, DEFAULT_API_BASE_URL, DEFAULT_IMAGE_BASE_URL};
use crate::error::{ApiError, ConfigError, Error, Result};
use crate::images;

/// Default HTTP timeout per request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Image sizes served by the TMDB CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageKind {
    Poster,
    Backdrop,
}

impl ImageKind {
    /// Size token inserted into the image URL
    pub fn size(self) -> &'static str {
        match self {
            ImageKind::Poster => "w500",
            ImageKind::Backdrop => "w1280",
        }
    }
}

/// Settings for [`MetadataClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_key: String,
    pub language: String,
    pub timeout: Duration,
    pub rate_limit_delay: Duration,
    pub retry: RetryPolicy,
    pub cache_ttl: Duration,
    /// Skip cache reads; fresh responses are still written back
    pub force_refresh: bool,
    pub api_base_url: String,
    pub image_base_url: String,
}

impl ClientOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            language: "en-US".to_string(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
            retry: RetryPolicy::default(),
            cache_ttl: DEFAULT_TTL,
            force_refresh: false,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }

    /// Build options from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .tmdb
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            language: config.tmdb.language.clone(),
            timeout: config.tmdb.timeout(),
            rate_limit_delay: config.tmdb.rate_limit_delay(),
            retry: RetryPolicy::new(
                config.retry.max_attempts,
                config.retry.initial_backoff(),
            ),
            cache_ttl: config.cache.ttl(),
            force_refresh: config.force_refresh,
            api_base_url: config.tmdb.api_base_url().to_string(),
            image_base_url: config.tmdb.image_base_url().to_string(),
        })
    }
}

/// Client for the TMDB movie catalog
pub struct MetadataClient {
    http: HttpClient,
    options: ClientOptions,
    throttle: RequestThrottle,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl MetadataClient {
    /// Create a client. Passing `None` for the cache disables caching.
    pub fn new(options: ClientOptions, cache: Option<Arc<dyn ResponseCache>>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(options.timeout)
            .user_agent(concat!("reelscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            throttle: RequestThrottle::new(options.rate_limit_delay),
            options,
            cache,
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The attached cache, if any
    pub fn cache(&self) -> Option<&Arc<dyn ResponseCache>> {
        self.cache.as_ref()
    }

    /// Find the best match for a title, optionally narrowed to a release year.
    ///
    /// `year <= 0` searches all years.
    pub async fn search_movie(&self, title: &str, year: i32) -> Result<MovieSummary> {
        const OPERATION: &str = "search_movie";
        let year_param = year.to_string();
        let key = cache_key(
            OPERATION,
            &[
                ("title", title),
                ("year", &year_param),
                ("language", &self.options.language),
            ],
        );

        if let Some(response) = self.cached::<SearchResponse>(&key, OPERATION)
            && let Some(first) = response.results.into_iter().next()
        {
            return Ok(first);
        }

        let mut params = vec![("query", title.to_string())];
        if year > 0 {
            params.push(("year", year_param));
        }

        let resource = describe_search(title, year);
        let body = self
            .get_api(OPERATION, "/search/movie", &params, &resource)
            .await?;
        let response: SearchResponse = decode(OPERATION, &body)?;

        // Empty result lists are not cached so newly added titles show up
        let first = response
            .results
            .into_iter()
            .next()
            .ok_or(ApiError::EmptyResult(resource))?;
        self.store(&key, &body, OPERATION);

        Ok(first)
    }

    /// Fetch `/movie/{id}`
    pub async fn get_movie_details(&self, id: u64) -> Result<MovieDetails> {
        self.fetch_cached(
            "get_movie_details",
            &format!("/movie/{}", id),
            id,
            &format!("movie id {}", id),
        )
        .await
    }

    /// Fetch `/movie/{id}/credits`
    pub async fn get_credits(&self, id: u64) -> Result<Credits> {
        self.fetch_cached(
            "get_credits",
            &format!("/movie/{}/credits", id),
            id,
            &format!("credits for movie id {}", id),
        )
        .await
    }

    /// Search by title/year, then assemble the full record for the first hit.
    pub async fn get_full_movie_data(&self, title: &str, year: i32) -> Result<MovieRecord> {
        let summary = self.search_movie(title, year).await?;
        debug!(
            "Resolved '{}' to TMDB id {} ({})",
            title, summary.id, summary.title
        );
        self.assemble(summary.id).await
    }

    /// Assemble a record from a trusted TMDB id, skipping search.
    ///
    /// Only a 404 on the details request yields an error for which
    /// [`Error::is_not_found`] is true. Once details resolve the id is valid,
    /// so a 404 on credits surfaces as a plain status error.
    pub async fn get_movie_by_id(&self, id: u64) -> Result<MovieRecord> {
        let details = self.get_movie_details(id).await?;
        let credits = self.get_credits(id).await.map_err(|err| match err {
            Error::Api(ApiError::NotFound(resource)) => {
                warn!("Movie id {} resolved but {} is missing", id, resource);
                Error::Api(ApiError::Status(404))
            }
            other => other,
        })?;
        Ok(MovieRecord::assemble(details, &credits, Utc::now()))
    }

    /// Resolve a movie preferring an id, falling back to title search when
    /// the id is unknown to the catalog.
    pub async fn resolve_movie(
        &self,
        id: Option<u64>,
        title: &str,
        year: i32,
    ) -> Result<MovieRecord> {
        if let Some(id) = id {
            match self.get_movie_by_id(id).await {
                Err(err) if err.is_not_found() && !title.trim().is_empty() => {
                    info!(
                        "TMDB id {} not found, falling back to search for '{}'",
                        id, title
                    );
                }
                other => return other,
            }
        }

        if title.trim().is_empty() {
            return Err(Error::Other(
                "Nothing to look up: a TMDB id or a title is required".to_string(),
            ));
        }
        self.get_full_movie_data(title, year).await
    }

    /// Download a TMDB image fragment (e.g. `/abc.jpg`) to `destination`.
    pub async fn download_image(
        &self,
        path_fragment: &str,
        destination: &Path,
        kind: ImageKind,
    ) -> Result<u64> {
        if path_fragment.trim().is_empty() {
            return Err(Error::Other(format!(
                "No {:?} image path to download",
                kind
            )));
        }

        let url = self.image_url(path_fragment, kind);
        self.download(&url, destination).await
    }

    /// Download from an http(s) URL, or copy when `source` is a local path.
    ///
    /// Local copies bypass throttling and retries.
    pub async fn download_image_from_url(&self, source: &str, destination: &Path) -> Result<u64> {
        if is_remote(source) {
            return self.download(source, destination).await;
        }

        let local = source.strip_prefix("file://").unwrap_or(source);
        images::copy_local(Path::new(local), destination).await
    }

    /// Full CDN URL for an image fragment
    pub fn image_url(&self, path_fragment: &str, kind: ImageKind) -> String {
        let base = self.options.image_base_url.trim_end_matches('/');
        if path_fragment.starts_with('/') {
            format!("{}/{}{}", base, kind.size(), path_fragment)
        } else {
            format!("{}/{}/{}", base, kind.size(), path_fragment)
        }
    }

    async fn assemble(&self, id: u64) -> Result<MovieRecord> {
        let details = self.get_movie_details(id).await?;
        let credits = self.get_credits(id).await?;
        Ok(MovieRecord::assemble(details, &credits, Utc::now()))
    }

    /// Cache lookup, network fetch on miss, write-back on success
    async fn fetch_cached<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        id: u64,
        resource: &str,
    ) -> Result<T> {
        let id_param = id.to_string();
        let key = cache_key(
            operation,
            &[("id", &id_param), ("language", &self.options.language)],
        );

        if let Some(value) = self.cached(&key, operation) {
            return Ok(value);
        }

        let body = self.get_api(operation, path, &[], resource).await?;
        let value = decode(operation, &body)?;
        self.store(&key, &body, operation);
        Ok(value)
    }

    /// Read and decode a cached response. Storage failures and undecodable
    /// payloads are treated as misses.
    fn cached<T: DeserializeOwned>(&self, key: &str, operation: &str) -> Option<T> {
        if self.options.force_refresh {
            return None;
        }
        let cache = self.cache.as_ref()?;

        match cache.get(key) {
            Ok(Some(payload)) => match serde_json::from_slice(&payload) {
                Ok(value) => {
                    debug!("Cache hit: {}", operation);
                    Some(value)
                }
                Err(e) => {
                    warn!("Discarding unreadable cached response for {}: {}", operation, e);
                    if let Err(e) = cache.discard(key) {
                        warn!("Cache discard failed for {}: {}", operation, e);
                    }
                    None
                }
            },
            Ok(None) => {
                debug!("Cache miss: {}", operation);
                None
            }
            Err(e) => {
                warn!("Cache read failed for {}, continuing without cache: {}", operation, e);
                None
            }
        }
    }

    fn store(&self, key: &str, payload: &[u8], operation: &str) {
        if let Some(cache) = &self.cache
            && let Err(e) = cache.set(key, payload, self.options.cache_ttl)
        {
            warn!("Cache write failed for {}: {}", operation, e);
        }
    }

    /// Retried GET against the catalog API, returning the raw body
    async fn get_api(
        &self,
        operation: &str,
        path: &str,
        params: &[(&str, String)],
        resource: &str,
    ) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.options.api_base_url.trim_end_matches('/'), path);
        let url = url.as_str();

        self.options
            .retry
            .run(|| self.send_api_request(url, params, resource))
            .await
            .map_err(|e| {
                warn!("{} failed: {}", operation, e);
                e.into()
            })
    }

    async fn send_api_request(
        &self,
        url: &str,
        params: &[(&str, String)],
        resource: &str,
    ) -> std::result::Result<Vec<u8>, ApiError> {
        let _permit = self.throttle.acquire().await;
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .query(&[
                ("api_key", self.options.api_key.as_str()),
                ("language", self.options.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), resource));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        let (response, permit) = self
            .options
            .retry
            .run(|| self.send_image_request(url))
            .await
            .map_err(|e| {
                warn!("Image download from {} failed: {}", url, e);
                Error::from(e)
            })?;

        // The call completes once the body is on disk
        let written = images::save_response(response, destination).await;
        drop(permit);
        written
    }

    async fn send_image_request(
        &self,
        url: &str,
    ) -> std::result::Result<(reqwest::Response, ThrottlePermit<'_>), ApiError> {
        let permit = self.throttle.acquire().await;
        debug!("GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), url));
        }
        Ok((response, permit))
    }
}

fn decode<T: DeserializeOwned>(operation: &str, body: &[u8]) -> std::result::Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", operation, e)))
}

fn describe_search(title: &str, year: i32) -> String {
    if year > 0 {
        format!("'{}' ({})", title, year)
    } else {
        format!("'{}'", title)
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
