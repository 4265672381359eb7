//! review-enrich library interface
//!
//! Enriches scraped album reviews with MusicBrainz metadata, aggregates
//! per-artist genre profiles and imputes missing album genres.
//!
//! Exposes the pipeline pieces for the binary and for integration testing.

pub mod artist_profiles;
pub mod genre_imputer;
pub mod genre_rules;
pub mod pipeline;
pub mod rate_limiter;
pub mod services;
pub mod store_writer;

pub use artist_profiles::{build_profiles, ArtistProfile};
pub use genre_imputer::{impute, ImputeStats};
pub use genre_rules::GenreRules;
pub use pipeline::RunSummary;
pub use rate_limiter::RateLimiter;
pub use services::{FetchOutcome, FetchResult, MusicBrainzClient, NotFoundReason};
pub use store_writer::{merge, MergeMode};
