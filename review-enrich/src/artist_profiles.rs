//! Artist genre profiles
//!
//! Aggregates album-level genres into one profile per artist so that
//! albums without genres can borrow their artist's main genres.

use review_common::config::GenrePolicy;
use review_common::jsonl::write_json_atomic;
use review_common::{ArtistKey, MetadataRecord, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Genre evidence for one artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistProfile {
    /// Grouping key, `mbid:<id>` or `name:<normalized name>`
    pub artist_key: String,
    /// Artist name as first seen in the metadata
    pub artist_name: String,
    pub artist_mbid: Option<String>,
    /// Albums that carry at least one genre
    pub total_albums: usize,
    /// Albums per genre (each album counts a genre once)
    pub genre_counts: BTreeMap<String, usize>,
    /// Dominant genres, most frequent first
    pub main_genres: Vec<String>,
}

#[derive(Debug)]
struct GroupTally {
    artist_name: String,
    artist_mbid: Option<String>,
    total_albums: usize,
    genre_counts: BTreeMap<String, usize>,
}

/// Build profiles keyed by the display form of [`ArtistKey`]
///
/// Artists without genre evidence (or with fewer than
/// `policy.min_artist_albums` albums carrying genres) get no profile.
pub fn build_profiles(
    metadata: &[MetadataRecord],
    policy: &GenrePolicy,
) -> BTreeMap<String, ArtistProfile> {
    let mut groups: BTreeMap<ArtistKey, GroupTally> = BTreeMap::new();

    for record in metadata {
        let Some(key) = record.artist_key() else {
            debug!(review_id = record.review_id, "Record has no artist identity, skipping");
            continue;
        };

        let tally = groups.entry(key).or_insert_with(|| GroupTally {
            artist_name: record.artist.trim().to_string(),
            artist_mbid: record.artist_mbid.clone(),
            total_albums: 0,
            genre_counts: BTreeMap::new(),
        });

        let album_genres: BTreeSet<&str> = record
            .genres
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .collect();
        if album_genres.is_empty() {
            continue;
        }

        tally.total_albums += 1;
        for genre in album_genres {
            *tally.genre_counts.entry(genre.to_string()).or_insert(0) += 1;
        }
    }

    let group_count = groups.len();
    let min_albums = policy.min_artist_albums.max(1);

    let profiles: BTreeMap<String, ArtistProfile> = groups
        .into_iter()
        .filter(|(_, tally)| tally.total_albums >= min_albums)
        .map(|(key, tally)| {
            let main_genres = select_main_genres(&tally.genre_counts, tally.total_albums, policy);
            let artist_key = key.to_string();
            let profile = ArtistProfile {
                artist_key: artist_key.clone(),
                artist_name: tally.artist_name,
                artist_mbid: tally.artist_mbid,
                total_albums: tally.total_albums,
                genre_counts: tally.genre_counts,
                main_genres,
            };
            (artist_key, profile)
        })
        .collect();

    info!(
        artists = group_count,
        profiles = profiles.len(),
        "Built artist genre profiles"
    );
    profiles
}

/// Genres whose album count reaches the policy threshold
///
/// Ordered by descending count, then name. Falls back to the single most
/// frequent genre when none reaches the threshold, so any evidence yields
/// at least one main genre.
pub fn select_main_genres(
    genre_counts: &BTreeMap<String, usize>,
    total_albums: usize,
    policy: &GenrePolicy,
) -> Vec<String> {
    let mut ranked: Vec<(&String, usize)> = genre_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(genre, &count)| (genre, count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let threshold = policy.threshold(total_albums);
    let main: Vec<String> = ranked
        .iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(genre, _)| (*genre).clone())
        .collect();

    if !main.is_empty() {
        return main;
    }

    ranked
        .first()
        .map(|(genre, _)| vec![(*genre).clone()])
        .unwrap_or_default()
}

/// Profile for a record's artist, if one was built
pub fn profile_for<'a>(
    profiles: &'a BTreeMap<String, ArtistProfile>,
    record: &MetadataRecord,
) -> Option<&'a ArtistProfile> {
    let key = record.artist_key()?;
    profiles.get(&key.to_string())
}

/// Atomically write profiles as a pretty-printed JSON object
pub fn save_profiles(path: &Path, profiles: &BTreeMap<String, ArtistProfile>) -> Result<()> {
    write_json_atomic(path, profiles)?;
    info!(path = %path.display(), profiles = profiles.len(), "Wrote artist profiles");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn record(id: i64, artist: &str, genres: &[&str]) -> MetadataRecord {
        MetadataRecord::new(id, artist, format!("Album {}", id)).with_genres(genres.iter().copied())
    }

    #[test]
    fn test_artist_x_profile() {
        let metadata = vec![
            record(1, "Artist X", &["rock"]),
            record(2, "Artist X", &["rock", "indie"]),
            record(3, "Artist X", &[]),
        ];

        let profiles = build_profiles(&metadata, &GenrePolicy::default());
        let profile = &profiles["name:artist x"];

        assert_eq!(profile.total_albums, 2);
        assert_eq!(profile.genre_counts.get("rock"), Some(&2));
        assert_eq!(profile.genre_counts.get("indie"), Some(&1));
        assert_eq!(profile.main_genres, vec!["rock"]);
        assert_eq!(profile.artist_name, "Artist X");
    }

    #[test]
    fn test_no_profile_without_evidence() {
        let metadata = vec![record(1, "Silent", &[]), record(2, "Silent", &[])];
        assert!(build_profiles(&metadata, &GenrePolicy::default()).is_empty());
    }

    #[test]
    fn test_min_artist_albums_drops_thin_artists() {
        let policy = GenrePolicy {
            min_artist_albums: 2,
            ..GenrePolicy::default()
        };
        let metadata = vec![
            record(1, "Once", &["jazz"]),
            record(2, "Twice", &["pop"]),
            record(3, "Twice", &["pop"]),
        ];

        let profiles = build_profiles(&metadata, &policy);
        assert!(!profiles.contains_key("name:once"));
        assert!(profiles.contains_key("name:twice"));
    }

    #[test]
    fn test_genre_counted_once_per_album() {
        let metadata = vec![record(1, "Echo", &["rock", "rock", " rock "])];
        let profiles = build_profiles(&metadata, &GenrePolicy::default());
        assert_eq!(profiles["name:echo"].genre_counts.get("rock"), Some(&1));
    }

    #[test]
    fn test_main_genres_never_empty_with_evidence() {
        // Five albums, five different genres: nothing reaches 60%
        let metadata: Vec<_> = ["pop", "jazz", "folk", "blues", "metal"]
            .iter()
            .enumerate()
            .map(|(i, g)| record(i as i64, "Scattered", &[*g]))
            .collect();

        let profiles = build_profiles(&metadata, &GenrePolicy::default());
        // lexicographic tie-break among equal counts
        assert_eq!(profiles["name:scattered"].main_genres, vec!["blues"]);
    }

    proptest! {
        #[test]
        fn test_every_artist_with_evidence_gets_main_genres(
            albums in proptest::collection::vec(
                (0usize..4, proptest::collection::vec("[a-e]{1,3}", 0..4)),
                0..25,
            ),
            share in 0.0f64..=1.0,
        ) {
            let metadata: Vec<MetadataRecord> = albums
                .iter()
                .enumerate()
                .map(|(i, (artist, genres))| {
                    MetadataRecord::new(i as i64, format!("Artist {}", artist), format!("Album {}", i))
                        .with_genres(genres.iter().cloned())
                })
                .collect();
            let policy = GenrePolicy {
                min_genre_share: share,
                ..GenrePolicy::default()
            };

            let profiles = build_profiles(&metadata, &policy);

            let with_evidence: BTreeSet<usize> = albums
                .iter()
                .filter(|(_, genres)| !genres.is_empty())
                .map(|(artist, _)| *artist)
                .collect();
            prop_assert_eq!(profiles.len(), with_evidence.len());
            for profile in profiles.values() {
                prop_assert!(!profile.main_genres.is_empty());
                for genre in &profile.main_genres {
                    prop_assert!(profile.genre_counts.contains_key(genre));
                }
            }
        }
    }

    #[test]
    fn test_main_genres_ordered_by_count_then_name() {
        let policy = GenrePolicy {
            min_genre_share: 0.3,
            ..GenrePolicy::default()
        };
        let mut counts = BTreeMap::new();
        counts.insert("rock".to_string(), 2);
        counts.insert("indie_rock".to_string(), 3);
        counts.insert("emo".to_string(), 2);
        counts.insert("pop".to_string(), 1);

        let main = select_main_genres(&counts, 4, &policy);
        assert_eq!(main, vec!["indie_rock", "emo", "rock"]);
    }

    #[test]
    fn test_mbid_and_name_keys_stay_separate() {
        let metadata = vec![
            record(1, "Split", &["rock"]).with_artist_mbid("mbid-split"),
            record(2, "Split", &["pop"]),
        ];

        let profiles = build_profiles(&metadata, &GenrePolicy::default());
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles["mbid:mbid-split"].main_genres, vec!["rock"]);
        assert_eq!(profiles["mbid:mbid-split"].artist_mbid.as_deref(), Some("mbid-split"));
        assert_eq!(profiles["name:split"].main_genres, vec!["pop"]);
    }

    #[test]
    fn test_name_grouping_is_case_and_space_insensitive() {
        let metadata = vec![
            record(1, "The  Band", &["rock"]),
            record(2, "the band", &["rock"]),
        ];
        let profiles = build_profiles(&metadata, &GenrePolicy::default());
        assert_eq!(profiles["name:the band"].total_albums, 2);
    }

    #[test]
    fn test_save_profiles_writes_json_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artist_profiles.json");
        let profiles = build_profiles(&[record(1, "Solo", &["folk"])], &GenrePolicy::default());

        save_profiles(&path, &profiles).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["name:solo"]["main_genres"][0], "folk");
        assert_eq!(value["name:solo"]["total_albums"], 1);
    }
}
