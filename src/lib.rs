//! reelscan - movie metadata acquisition for media libraries
//!
//! Looks movies up on TMDB, assembles a [`MovieRecord`](client::MovieRecord)
//! per title and downloads poster/backdrop artwork. Responses are kept in a
//! local TTL cache so repeated scans stay within the API quota.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod images;

pub use error::{Error, Result};
