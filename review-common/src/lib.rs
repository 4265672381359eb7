//! # Review Common Library
//!
//! Shared code for the review enrichment tools including:
//! - Review and metadata record models
//! - Error types
//! - Configuration loading and path resolution
//! - Line-oriented JSON (JSONL) reading and atomic writes

pub mod config;
pub mod error;
pub mod jsonl;
pub mod models;

pub use error::{Error, Result};
pub use models::{ArtistKey, MetadataRecord, ReviewRecord};
