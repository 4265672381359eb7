//! Review and metadata record models
//!
//! `ReviewRecord` is the scraper's output and is read-only here.
//! `MetadataRecord` is one line of the metadata store, the single source
//! of truth for everything derived downstream (artist profiles, imputed
//! genres).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A scraped album review
///
/// Only the identity and matching fields are modelled; the review text,
/// ratings and tracklist are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Stable review id (the scraper emits it as `id`)
    #[serde(alias = "id")]
    pub review_id: i64,
    pub artist: String,
    pub album: String,
}

/// Provider metadata for a single review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Foreign key to [`ReviewRecord::review_id`], unique within the store
    pub review_id: i64,
    /// Artist as written in the review
    pub artist: String,
    /// Album as written in the review
    pub album: String,
    /// Controlled-vocabulary genres, deduplicated (may be empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<String>,
    /// MusicBrainz artist id of the first credited artist
    #[serde(default)]
    pub artist_mbid: Option<String>,
    /// MusicBrainz release-group id of the matched album
    #[serde(default, alias = "mbid")]
    pub release_mbid: Option<String>,
    /// True when `genres` was filled from the artist profile
    #[serde(default)]
    pub genres_inferred_from_artist: bool,
    /// Release-group title as MusicBrainz spells it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mb_title: Option<String>,
    /// Normalized provider tags before genre mapping
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub raw_tags: Vec<String>,

    // Artist-level metadata from the MusicBrainz artist entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_country: Option<String>,
    /// "Group", "Person", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_disambiguation: Option<String>,
    /// Artist tags as returned by the provider (lowercased, unmapped)
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub artist_tags: Vec<String>,
    /// Band member names, sorted
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub artist_members: Vec<String>,

    /// Fields this version does not model, kept so a store rewrite
    /// preserves them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `null` reads as an empty list
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl MetadataRecord {
    /// Create an empty record for a review (no genres, no identifiers)
    pub fn new(review_id: i64, artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            review_id,
            artist: artist.into(),
            album: album.into(),
            genres: Vec::new(),
            artist_mbid: None,
            release_mbid: None,
            genres_inferred_from_artist: false,
            mb_title: None,
            raw_tags: Vec::new(),
            artist_country: None,
            artist_type: None,
            artist_disambiguation: None,
            artist_tags: Vec::new(),
            artist_members: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Builder-style genre setter
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style artist MBID setter
    pub fn with_artist_mbid(mut self, mbid: impl Into<String>) -> Self {
        self.artist_mbid = Some(mbid.into());
        self
    }

    pub fn has_genres(&self) -> bool {
        !self.genres.is_empty()
    }

    /// Grouping identity of this record's artist, if it has one
    pub fn artist_key(&self) -> Option<ArtistKey> {
        ArtistKey::for_artist(&self.artist, self.artist_mbid.as_deref())
    }
}

/// Grouping identity for artist-level genre aggregation
///
/// The MBID wins when the record carries one; otherwise the normalized
/// artist name is used. An artist seen both with and without an MBID
/// therefore ends up under two keys. This is a known limitation: records
/// are only grouped by what they carry themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtistKey {
    Mbid(String),
    Name(String),
}

impl ArtistKey {
    /// Derive the key from a record's artist fields
    ///
    /// Returns `None` when there is neither an MBID nor a usable name.
    pub fn for_artist(artist: &str, artist_mbid: Option<&str>) -> Option<Self> {
        if let Some(mbid) = artist_mbid.map(str::trim).filter(|m| !m.is_empty()) {
            return Some(ArtistKey::Mbid(mbid.to_string()));
        }

        let name = Self::normalize_name(artist);
        if name.is_empty() {
            None
        } else {
            Some(ArtistKey::Name(name))
        }
    }

    /// Case-fold and collapse whitespace runs
    pub fn normalize_name(artist: &str) -> String {
        artist
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ArtistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtistKey::Mbid(mbid) => write!(f, "mbid:{}", mbid),
            ArtistKey::Name(name) => write!(f, "name:{}", name),
        }
    }
}
