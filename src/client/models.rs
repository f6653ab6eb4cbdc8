//! TMDB response shapes and the assembled movie record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of cast members carried into a record
pub const MAX_CAST: usize = 5;

/// Search endpoint envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: u32,

    #[serde(default)]
    pub results: Vec<MovieSummary>,

    #[serde(default)]
    pub total_results: u32,
}

/// One search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    /// TMDB movie ID
    pub id: u64,

    pub title: String,

    #[serde(default)]
    pub original_title: Option<String>,

    #[serde(default)]
    pub overview: Option<String>,

    /// Release date (YYYY-MM-DD, may be empty)
    #[serde(default)]
    pub release_date: Option<String>,

    #[serde(default)]
    pub vote_average: f64,

    #[serde(default)]
    pub poster_path: Option<String>,

    #[serde(default)]
    pub backdrop_path: Option<String>,
}

/// Genre tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// Full movie details from `/movie/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: u64,

    pub title: String,

    #[serde(default)]
    pub original_title: Option<String>,

    #[serde(default)]
    pub tagline: Option<String>,

    #[serde(default)]
    pub overview: Option<String>,

    #[serde(default)]
    pub release_date: Option<String>,

    /// Runtime in minutes
    #[serde(default)]
    pub runtime: Option<u32>,

    #[serde(default)]
    pub vote_average: f64,

    #[serde(default)]
    pub vote_count: u64,

    #[serde(default)]
    pub genres: Vec<Genre>,

    /// IMDb identifier (tt...)
    #[serde(default)]
    pub imdb_id: Option<String>,

    #[serde(default)]
    pub poster_path: Option<String>,

    #[serde(default)]
    pub backdrop_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,

    #[serde(default)]
    pub character: Option<String>,

    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,

    #[serde(default)]
    pub job: String,

    #[serde(default)]
    pub department: Option<String>,
}

/// Credits from `/movie/{id}/credits`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub id: u64,

    #[serde(default)]
    pub cast: Vec<CastMember>,

    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

impl Credits {
    /// Every crew member credited as "Director", joined in API order
    pub fn directors(&self) -> String {
        self.crew
            .iter()
            .filter(|member| member.job == "Director")
            .map(|member| member.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Names of the first [`MAX_CAST`] billed cast members
    pub fn top_cast(&self) -> Vec<String> {
        self.cast
            .iter()
            .take(MAX_CAST)
            .map(|member| member.name.clone())
            .collect()
    }
}

/// Everything the document writer needs for one movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,

    pub synopsis: String,

    pub rating: f64,

    /// Four-digit release year, 0 when unknown
    pub year: i32,

    pub release_date: String,

    /// Runtime in minutes, 0 when unknown
    pub runtime: u32,

    pub genres: Vec<String>,

    pub director: String,

    pub cast: Vec<String>,

    pub tmdb_id: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,

    pub fetched_at: DateTime<Utc>,
}

impl MovieRecord {
    /// Merge details and credits into a record stamped at `fetched_at`
    pub fn assemble(details: MovieDetails, credits: &Credits, fetched_at: DateTime<Utc>) -> Self {
        let release_date = details.release_date.unwrap_or_default();

        Self {
            title: details.title,
            original_title: details.original_title,
            tagline: details.tagline.filter(|t| !t.is_empty()),
            synopsis: details.overview.unwrap_or_default(),
            rating: details.vote_average,
            year: release_year(&release_date),
            release_date,
            runtime: details.runtime.unwrap_or(0),
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            director: credits.directors(),
            cast: credits.top_cast(),
            tmdb_id: details.id,
            imdb_id: details.imdb_id.filter(|id| !id.is_empty()),
            poster_path: details.poster_path,
            backdrop_path: details.backdrop_path,
            fetched_at,
        }
    }
}

/// Year from the first four characters of a release date, 0 if unavailable
pub fn release_year(release_date: &str) -> i32 {
    release_date
        .get(..4)
        .filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|year| year.parse().ok())
        .unwrap_or(0)
}
