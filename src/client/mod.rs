//! TMDB API client
//!
//! [`MetadataClient`] resolves titles and ids to [`MovieRecord`]s and fetches
//! artwork. Remote calls share one [`RequestThrottle`] and one
//! [`RetryPolicy`]; responses are cached through an optional
//! [`ResponseCache`](crate::cache::ResponseCache).

pub mod models;
pub mod retry;
pub mod throttle;
pub mod tmdb;

pub use models::{Credits, MovieDetails, MovieRecord, MovieSummary, SearchResponse};
pub use retry::{Attempt, RetryObserver, RetryOutcome, RetryPolicy, Verdict, classify, retry};
pub use throttle::RequestThrottle;
pub use tmdb::{ClientOptions, ImageKind, MetadataClient};
