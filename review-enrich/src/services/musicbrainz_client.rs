//! MusicBrainz API client
//!
//! Resolves an (artist, album) pair from a review to a MusicBrainz
//! release group and maps its tags onto the controlled genre vocabulary.
//!
//! # Flow
//! 1. Search release groups by artist + album
//! 2. Pick the candidate with the highest provider score (first on ties)
//! 3. Look up that release group with tags and artist credits
//! 4. Map tags to genres via [`GenreRules`]
//! 5. Look up the credited artist for country, type, tags and band members
//!    (best effort: a failure here keeps the album match)
//!
//! # API Reference
//! - Search: https://musicbrainz.org/ws/2/release-group?query=...
//! - Lookup: https://musicbrainz.org/ws/2/release-group/{mbid}?inc=tags+artist-credits
//! - Artist: https://musicbrainz.org/ws/2/artist/{mbid}?inc=aliases+tags+artist-rels
//! - Rate Limit: 1 request/second (as per MusicBrainz Terms of Service)
//!
//! Transient failures (transport errors, 5xx, 429) are retried with bounded
//! exponential backoff. Everything that still fails ends up as
//! [`FetchOutcome::NotFound`]; a single pair never aborts a batch.

use crate::genre_rules::GenreRules;
use crate::rate_limiter::RateLimiter;
use review_common::config::{MusicBrainzConfig, RetryConfig};
use review_common::MetadataRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// MusicBrainz request errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, timeout or body transfer failure
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body is not the JSON shape we expect
    #[error("Parse error: {0}")]
    Decode(String),

    #[error("HTTP client setup failed: {0}")]
    ClientBuild(String),
}

impl ProviderError {
    /// Worth retrying after a backoff
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Decode(_) | ProviderError::ClientBuild(_) => false,
        }
    }
}

/// Why a pair produced no metadata record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Provider returned zero candidates
    NoCandidates,
    /// Transient failures outlasted the retry budget
    RetriesExhausted,
    /// Provider refused the request (4xx other than 404/429)
    Rejected(String),
    /// Response could not be decoded
    Malformed(String),
}

/// Result of a single metadata fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(MetadataRecord),
    NotFound(NotFoundReason),
}

/// Fetch outcome plus the number of retries it took
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub outcome: FetchOutcome,
    /// Extra attempts beyond the first, across all requests of this fetch
    pub retries: u32,
}

impl FetchResult {
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Found(_))
    }
}

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    search_limit: u32,
    retry: RetryConfig,
    artist_info: bool,
    rules: GenreRules,
    rate_limiter: RateLimiter,
}

impl MusicBrainzClient {
    /// Build a client from configuration with the built-in genre rules
    pub fn new(config: &MusicBrainzConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_limit: config.search_limit,
            retry: config.retry.clone(),
            artist_info: config.artist_info,
            rules: GenreRules::builtin().map_err(|e| ProviderError::ClientBuild(e.to_string()))?,
            rate_limiter: RateLimiter::new("musicbrainz", config.min_interval()),
        })
    }

    /// Replace the tag → genre rules
    pub fn with_rules(mut self, rules: GenreRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn rules(&self) -> &GenreRules {
        &self.rules
    }

    /// Fetch metadata for one review
    ///
    /// Never fails: provider trouble is reported as
    /// [`FetchOutcome::NotFound`] with a reason.
    pub async fn fetch_metadata(&self, review_id: i64, artist: &str, album: &str) -> FetchResult {
        let mut retries = 0;
        let outcome = self
            .fetch_outcome(review_id, artist, album, &mut retries)
            .await;
        FetchResult { outcome, retries }
    }

    async fn fetch_outcome(
        &self,
        review_id: i64,
        artist: &str,
        album: &str,
        retries: &mut u32,
    ) -> FetchOutcome {
        let candidates = match self.search_release_groups(artist, album, retries).await {
            Ok(candidates) => candidates,
            Err(ProviderError::Status { status: 404, .. }) => Vec::new(),
            Err(e) => return self.give_up(review_id, artist, album, e),
        };

        let Some(best) = select_best_candidate(&candidates) else {
            info!(review_id, artist = %artist, album = %album, "No release group found");
            return FetchOutcome::NotFound(NotFoundReason::NoCandidates);
        };

        let detail = match self.lookup_release_group(&best.id, retries).await {
            Ok(detail) => detail,
            Err(e) => return self.give_up(review_id, artist, album, e),
        };

        let raw_tags = extract_tag_names(&detail.tags);
        let genres = self.rules.map_tags(&raw_tags);
        let artist_mbid = first_artist_id(&detail.artist_credit)
            .or_else(|| first_artist_id(&best.artist_credit));
        let title = if detail.title.is_empty() {
            best.title.clone()
        } else {
            detail.title
        };

        debug!(
            review_id,
            release_mbid = %best.id,
            score = ?best.score,
            tags = raw_tags.len(),
            genres = ?genres,
            "MusicBrainz match complete"
        );

        let mut record = MetadataRecord::new(review_id, artist, album);
        record.genres = genres;
        record.artist_mbid = artist_mbid;
        record.release_mbid = Some(best.id.clone());
        record.mb_title = Some(title).filter(|t| !t.is_empty());
        record.raw_tags = raw_tags;

        if self.artist_info {
            let known_mbid = record.artist_mbid.clone();
            if let Some(info) = self.fetch_artist(known_mbid.as_deref(), artist, retries).await {
                info.apply_to(&mut record);
            }
        }

        FetchOutcome::Found(record)
    }

    /// Artist details for a matched album, `None` when unavailable
    async fn fetch_artist(
        &self,
        known_mbid: Option<&str>,
        name: &str,
        retries: &mut u32,
    ) -> Option<ArtistInfo> {
        match self.resolve_artist(known_mbid, name, retries).await {
            Ok(info) => info,
            Err(e) => {
                warn!(artist = %name, error = %e, "Artist lookup failed, keeping album match");
                None
            }
        }
    }

    async fn resolve_artist(
        &self,
        known_mbid: Option<&str>,
        name: &str,
        retries: &mut u32,
    ) -> Result<Option<ArtistInfo>, ProviderError> {
        let (mbid, candidate) = match known_mbid {
            Some(id) => (id.to_string(), None),
            None => {
                let candidates = self.search_artists(name, retries).await?;
                let Some(best) = select_best_by_score(&candidates, |c| c.score) else {
                    debug!(artist = %name, "No artist found");
                    return Ok(None);
                };
                (best.id.clone(), Some(best.clone()))
            }
        };

        let detail = self.lookup_artist(&mbid, retries).await?;
        let info = ArtistInfo::from_lookup(mbid, candidate.as_ref(), detail);
        debug!(
            artist = %name,
            artist_mbid = %info.mbid,
            tags = info.tags.len(),
            members = info.members.len(),
            "Artist lookup complete"
        );
        Ok(Some(info))
    }

    fn give_up(&self, review_id: i64, artist: &str, album: &str, error: ProviderError) -> FetchOutcome {
        let reason = if error.is_transient() {
            NotFoundReason::RetriesExhausted
        } else {
            match error {
                ProviderError::Decode(msg) => NotFoundReason::Malformed(msg),
                other => NotFoundReason::Rejected(other.to_string()),
            }
        };

        warn!(
            review_id,
            artist = %artist,
            album = %album,
            reason = ?reason,
            "MusicBrainz lookup failed, skipping pair"
        );
        FetchOutcome::NotFound(reason)
    }

    /// Search release groups by artist and album title
    async fn search_release_groups(
        &self,
        artist: &str,
        album: &str,
        retries: &mut u32,
    ) -> Result<Vec<ReleaseGroupCandidate>, ProviderError> {
        let url = format!("{}/release-group", self.base_url);
        let query = [
            ("query", build_search_query(artist, album)),
            ("fmt", "json".to_string()),
            ("limit", self.search_limit.to_string()),
        ];

        let response: SearchResponse = self.get_json(&url, &query, retries).await?;
        Ok(response.release_groups)
    }

    /// Lookup a release group by MBID including tags and artist credits
    async fn lookup_release_group(
        &self,
        mbid: &str,
        retries: &mut u32,
    ) -> Result<ReleaseGroupDetail, ProviderError> {
        let url = format!("{}/release-group/{}", self.base_url, mbid);
        let query = [
            ("inc", "tags+artist-credits".to_string()),
            ("fmt", "json".to_string()),
        ];

        self.get_json(&url, &query, retries).await
    }

    /// Search artists by name
    async fn search_artists(
        &self,
        name: &str,
        retries: &mut u32,
    ) -> Result<Vec<ArtistCandidate>, ProviderError> {
        let url = format!("{}/artist", self.base_url);
        let query = [
            ("query", format!("artist:\"{}\"", escape_phrase(name))),
            ("fmt", "json".to_string()),
            ("limit", self.search_limit.to_string()),
        ];

        let response: ArtistSearchResponse = self.get_json(&url, &query, retries).await?;
        Ok(response.artists)
    }

    /// Lookup an artist by MBID including tags and artist relations
    async fn lookup_artist(&self, mbid: &str, retries: &mut u32) -> Result<ArtistDetail, ProviderError> {
        let url = format!("{}/artist/{}", self.base_url, mbid);
        let query = [
            ("inc", "aliases+tags+artist-rels".to_string()),
            ("fmt", "json".to_string()),
        ];

        self.get_json(&url, &query, retries).await
    }

    /// Rate-limited GET with bounded exponential backoff
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        retries: &mut u32,
    ) -> Result<T, ProviderError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            self.rate_limiter.acquire().await;

            match self.get_once(url, query).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient MusicBrainz failure, retrying"
                    );
                    *retries += 1;
                    attempt += 1;
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        debug!(url = %url, "Querying MusicBrainz API");

        let response = self.http_client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// Lucene query for a release-group search
pub fn build_search_query(artist: &str, album: &str) -> String {
    format!(
        "artist:\"{}\" AND releasegroup:\"{}\"",
        escape_phrase(artist),
        escape_phrase(album)
    )
}

/// Escape characters that would end a quoted Lucene phrase
fn escape_phrase(term: &str) -> String {
    term.trim().replace('\\', "\\\\").replace('"', "\\\"")
}

/// Highest provider score wins; ties and missing scores keep response order
pub fn select_best_candidate(candidates: &[ReleaseGroupCandidate]) -> Option<&ReleaseGroupCandidate> {
    select_best_by_score(candidates, |c| c.score)
}

fn select_best_by_score<T>(items: &[T], score: impl Fn(&T) -> Option<u32>) -> Option<&T> {
    let mut best: Option<&T> = None;
    for item in items {
        match best {
            Some(current) if score(item).unwrap_or(0) <= score(current).unwrap_or(0) => {}
            _ => best = Some(item),
        }
    }
    best
}

/// Names of band members, sorted and deduplicated
///
/// Only "member of band" relations pointing at an artist count, and only
/// in the backward direction (person → this band) or with no direction.
fn band_members(relations: &[Relation]) -> Vec<String> {
    let names: BTreeSet<String> = relations
        .iter()
        .filter(|r| r.relation_type.as_deref() == Some("member of band"))
        .filter(|r| r.target_type.as_deref() == Some("artist"))
        .filter(|r| matches!(r.direction.as_deref(), None | Some("backward")))
        .filter_map(|r| r.artist.as_ref())
        .map(|artist| artist.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    names.into_iter().collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed, lowercased, non-empty tag names
fn extract_tag_names(tags: &[Tag]) -> Vec<String> {
    tags.iter()
        .filter_map(|tag| tag.name.as_deref())
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

fn first_artist_id(credits: &[ArtistCredit]) -> Option<String> {
    credits
        .iter()
        .filter_map(|credit| credit.artist.as_ref())
        .map(|artist| artist.id.trim())
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============================================================================
// MusicBrainz API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "release-groups", default)]
    release_groups: Vec<ReleaseGroupCandidate>,
}

/// Release group as returned by a search
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseGroupCandidate {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Provider relevance, 0-100 (sent as a number or a numeric string)
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<u32>,
    #[serde(rename = "primary-type", default)]
    pub primary_type: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
}

#[derive(Debug, Deserialize)]
struct ReleaseGroupDetail {
    #[serde(default)]
    title: String,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistCredit {
    #[serde(default)]
    pub name: String,
    pub artist: Option<CreditedArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditedArtist {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Artist-level details attached to a matched album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistInfo {
    pub mbid: String,
    pub country: Option<String>,
    pub artist_type: Option<String>,
    pub disambiguation: Option<String>,
    pub tags: Vec<String>,
    pub members: Vec<String>,
}

impl ArtistInfo {
    /// Lookup fields first, search candidate fields as fallback
    fn from_lookup(mbid: String, candidate: Option<&ArtistCandidate>, detail: ArtistDetail) -> Self {
        Self {
            country: non_blank(detail.country)
                .or_else(|| candidate.and_then(|c| non_blank(c.country.clone()))),
            artist_type: non_blank(detail.artist_type)
                .or_else(|| candidate.and_then(|c| non_blank(c.artist_type.clone()))),
            disambiguation: non_blank(detail.disambiguation)
                .or_else(|| candidate.and_then(|c| non_blank(c.disambiguation.clone()))),
            tags: extract_tag_names(&detail.tags),
            members: band_members(&detail.relations),
            mbid,
        }
    }

    /// Fill the artist fields of `record`, keeping an existing artist MBID
    pub fn apply_to(self, record: &mut MetadataRecord) {
        if record.artist_mbid.is_none() {
            record.artist_mbid = Some(self.mbid);
        }
        record.artist_country = self.country;
        record.artist_type = self.artist_type;
        record.artist_disambiguation = self.disambiguation;
        record.artist_tags = self.tags;
        record.artist_members = self.members;
    }
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<ArtistCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtistCandidate {
    id: String,
    #[serde(default, deserialize_with = "lenient_score")]
    score: Option<u32>,
    country: Option<String>,
    #[serde(rename = "type")]
    artist_type: Option<String>,
    disambiguation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistDetail {
    country: Option<String>,
    #[serde(rename = "type")]
    artist_type: Option<String>,
    disambiguation: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    relations: Vec<Relation>,
}

#[derive(Debug, Deserialize)]
struct Relation {
    #[serde(rename = "type")]
    relation_type: Option<String>,
    #[serde(rename = "target-type")]
    target_type: Option<String>,
    direction: Option<String>,
    artist: Option<RelatedArtist>,
}

#[derive(Debug, Deserialize)]
struct RelatedArtist {
    #[serde(default)]
    name: String,
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().map(|v| v.min(u32::MAX as u64) as u32),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: Option<u32>) -> ReleaseGroupCandidate {
        ReleaseGroupCandidate {
            id: id.to_string(),
            title: format!("Title {}", id),
            score,
            primary_type: Some("Album".to_string()),
            artist_credit: Vec::new(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = MusicBrainzClient::new(&MusicBrainzConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = MusicBrainzConfig {
            base_url: "http://localhost:9999/ws/2/".to_string(),
            ..MusicBrainzConfig::default()
        };
        let client = MusicBrainzClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/ws/2");
    }

    #[test]
    fn test_rate_limiter_uses_configured_interval() {
        let client = MusicBrainzClient::new(&MusicBrainzConfig::default()).unwrap();
        assert_eq!(client.rate_limiter().min_interval().as_millis(), 1000);
    }

    #[test]
    fn test_select_highest_score() {
        let candidates = vec![candidate("a", Some(80)), candidate("b", Some(100)), candidate("c", Some(95))];
        assert_eq!(select_best_candidate(&candidates).unwrap().id, "b");
    }

    #[test]
    fn test_select_first_on_tie() {
        let candidates = vec![candidate("a", Some(90)), candidate("b", Some(100)), candidate("c", Some(100))];
        assert_eq!(select_best_candidate(&candidates).unwrap().id, "b");
    }

    #[test]
    fn test_select_first_without_scores() {
        let candidates = vec![candidate("a", None), candidate("b", None)];
        assert_eq!(select_best_candidate(&candidates).unwrap().id, "a");
    }

    #[test]
    fn test_select_none_for_empty() {
        assert!(select_best_candidate(&[]).is_none());
    }

    #[test]
    fn test_score_accepts_string() {
        let json = r#"{"release-groups": [{"id": "x", "score": "87"}, {"id": "y", "score": 91}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.release_groups[0].score, Some(87));
        assert_eq!(response.release_groups[1].score, Some(91));
    }

    #[test]
    fn test_search_query_escapes_quotes() {
        let query = build_search_query("The \"Band\"", " Album ");
        assert_eq!(query, r#"artist:"The \"Band\"" AND releasegroup:"Album""#);
    }

    #[test]
    fn test_transient_classification() {
        let status = |code| ProviderError::Status {
            status: code,
            body: String::new(),
        };
        assert!(status(503).is_transient());
        assert!(status(500).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(404).is_transient());
        assert!(!ProviderError::Decode("x".into()).is_transient());
    }

    #[tokio::test]
    async fn test_transport_classification() {
        let refused = reqwest::Client::new()
            .get("http://127.0.0.1:1/release-group")
            .send()
            .await
            .unwrap_err();
        assert!(ProviderError::Transport(refused).is_transient());

        let bad_url = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();
        assert!(bad_url.is_builder());
        assert!(!ProviderError::Transport(bad_url).is_transient());
    }

    fn relation(kind: &str, direction: Option<&str>, name: &str) -> Relation {
        Relation {
            relation_type: Some(kind.to_string()),
            target_type: Some("artist".to_string()),
            direction: direction.map(str::to_string),
            artist: Some(RelatedArtist { name: name.to_string() }),
        }
    }

    #[test]
    fn test_band_members_filters_relations() {
        let relations = vec![
            relation("member of band", Some("backward"), "Rachel Goswell"),
            relation("member of band", None, "Neil Halstead"),
            relation("member of band", Some("backward"), "Neil Halstead"),
            relation("member of band", Some("forward"), "Other Band"),
            relation("collaboration", Some("backward"), "Guest"),
            relation("member of band", Some("backward"), "  "),
            Relation {
                target_type: Some("label".to_string()),
                ..relation("member of band", Some("backward"), "Creation")
            },
        ];
        assert_eq!(band_members(&relations), vec!["Neil Halstead", "Rachel Goswell"]);
    }

    #[test]
    fn test_artist_info_prefers_lookup_fields() {
        let candidate: ArtistCandidate = serde_json::from_str(
            r#"{"id": "a-1", "score": 100, "country": "GB", "type": "Group", "disambiguation": "shoegaze band"}"#,
        )
        .unwrap();
        let detail: ArtistDetail = serde_json::from_str(
            r#"{"country": "", "type": "Group", "tags": [{"name": " Dream Pop "}]}"#,
        )
        .unwrap();

        let info = ArtistInfo::from_lookup("a-1".into(), Some(&candidate), detail);

        assert_eq!(info.country.as_deref(), Some("GB"));
        assert_eq!(info.artist_type.as_deref(), Some("Group"));
        assert_eq!(info.disambiguation.as_deref(), Some("shoegaze band"));
        assert_eq!(info.tags, vec!["dream pop"]);
        assert!(info.members.is_empty());
    }

    #[test]
    fn test_artist_info_keeps_credited_mbid() {
        let mut record = MetadataRecord::new(1, "A", "B");
        record.artist_mbid = Some("credited".to_string());
        let info = ArtistInfo {
            mbid: "searched".to_string(),
            country: Some("US".to_string()),
            artist_type: None,
            disambiguation: None,
            tags: vec!["rock".to_string()],
            members: Vec::new(),
        };

        info.apply_to(&mut record);

        assert_eq!(record.artist_mbid.as_deref(), Some("credited"));
        assert_eq!(record.artist_country.as_deref(), Some("US"));
        assert_eq!(record.artist_tags, vec!["rock"]);
    }

    #[test]
    fn test_extract_tag_names_normalizes() {
        let tags = vec![
            Tag { name: Some("  Indie Rock ".into()) },
            Tag { name: None },
            Tag { name: Some("   ".into()) },
        ];
        assert_eq!(extract_tag_names(&tags), vec!["indie rock"]);
    }

    #[test]
    fn test_first_artist_id_skips_missing() {
        let credits = vec![
            ArtistCredit { name: "feat".into(), artist: None },
            ArtistCredit {
                name: "Main".into(),
                artist: Some(CreditedArtist { id: "mbid-1".into(), name: "Main".into() }),
            },
        ];
        assert_eq!(first_artist_id(&credits), Some("mbid-1".to_string()));
    }
}
