//! Genre imputation from artist profiles
//!
//! Records without genres inherit their artist's main genres. A record
//! with empty genres adds nothing to its artist's profile, so the profile
//! built over the full set already excludes the record being filled.

use crate::artist_profiles::{profile_for, ArtistProfile};
use review_common::MetadataRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Counters for one imputation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImputeStats {
    pub total: usize,
    pub imputed: usize,
    /// Empty-genre records whose artist had no usable profile
    pub without_evidence: usize,
}

/// Fill empty genres from artist profiles
///
/// Returns a new record set in input order; `metadata` is not modified.
/// Records that already carry genres are copied unchanged.
pub fn impute(
    metadata: &[MetadataRecord],
    profiles: &BTreeMap<String, ArtistProfile>,
) -> (Vec<MetadataRecord>, ImputeStats) {
    let mut stats = ImputeStats {
        total: metadata.len(),
        ..ImputeStats::default()
    };

    let output = metadata
        .iter()
        .map(|record| {
            if record.has_genres() {
                return record.clone();
            }

            let main_genres = profile_for(profiles, record)
                .map(|profile| profile.main_genres.as_slice())
                .filter(|genres| !genres.is_empty());

            match main_genres {
                Some(genres) => {
                    stats.imputed += 1;
                    let mut filled = record.clone();
                    filled.genres = genres.to_vec();
                    filled.genres_inferred_from_artist = true;
                    filled
                }
                None => {
                    debug!(
                        review_id = record.review_id,
                        artist = %record.artist,
                        "No artist evidence, leaving genres empty"
                    );
                    stats.without_evidence += 1;
                    record.clone()
                }
            }
        })
        .collect();

    info!(
        total = stats.total,
        imputed = stats.imputed,
        without_evidence = stats.without_evidence,
        "Genre imputation complete"
    );
    (output, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artist_profiles::build_profiles;
    use review_common::config::GenrePolicy;

    fn record(id: i64, artist: &str, genres: &[&str]) -> MetadataRecord {
        MetadataRecord::new(id, artist, format!("Album {}", id)).with_genres(genres.iter().copied())
    }

    fn artist_x() -> Vec<MetadataRecord> {
        vec![
            record(1, "artist-x", &["rock"]),
            record(2, "artist-x", &["rock", "indie"]),
            record(3, "artist-x", &[]),
        ]
    }

    #[test]
    fn test_artist_x_imputation() {
        let metadata = artist_x();
        let profiles = build_profiles(&metadata, &GenrePolicy::default());

        let (imputed, stats) = impute(&metadata, &profiles);

        assert_eq!(imputed[0], metadata[0]);
        assert_eq!(imputed[1], metadata[1]);
        assert_eq!(imputed[2].genres, vec!["rock"]);
        assert!(imputed[2].genres_inferred_from_artist);
        assert_eq!(
            stats,
            ImputeStats {
                total: 3,
                imputed: 1,
                without_evidence: 0
            }
        );
    }

    #[test]
    fn test_records_with_genres_never_change() {
        let mut metadata = artist_x();
        metadata.push(record(4, "other", &["jazz"]));
        let profiles = build_profiles(&metadata, &GenrePolicy::default());

        let (imputed, _) = impute(&metadata, &profiles);

        for (before, after) in metadata.iter().zip(&imputed) {
            if before.has_genres() {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_impute_is_pure() {
        let metadata = artist_x();
        let snapshot = metadata.clone();
        let profiles = build_profiles(&metadata, &GenrePolicy::default());

        let first = impute(&metadata, &profiles);
        let second = impute(&metadata, &profiles);

        assert_eq!(first, second);
        assert_eq!(metadata, snapshot);
    }

    #[test]
    fn test_full_set_profile_equals_leave_one_out() {
        let metadata = artist_x();
        let full = build_profiles(&metadata, &GenrePolicy::default());

        for (pos, target) in metadata.iter().enumerate().filter(|(_, r)| !r.has_genres()) {
            let others: Vec<_> = metadata
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != pos)
                .map(|(_, r)| r.clone())
                .collect();
            let loo = build_profiles(&others, &GenrePolicy::default());

            assert_eq!(profile_for(&full, target), profile_for(&loo, target));
        }
    }

    #[test]
    fn test_no_evidence_leaves_record_empty() {
        let metadata = vec![record(1, "unknown", &[]), record(2, "unknown", &[])];
        let profiles = build_profiles(&metadata, &GenrePolicy::default());

        let (imputed, stats) = impute(&metadata, &profiles);

        assert_eq!(imputed, metadata);
        assert_eq!(stats.imputed, 0);
        assert_eq!(stats.without_evidence, 2);
    }

    #[test]
    fn test_imputation_follows_artist_key() {
        // Evidence sits under the MBID key; the name-only record cannot see it
        let metadata = vec![
            record(1, "Split", &["rock"]).with_artist_mbid("mbid-split"),
            record(2, "Split", &[]).with_artist_mbid("mbid-split"),
            record(3, "Split", &[]),
        ];
        let profiles = build_profiles(&metadata, &GenrePolicy::default());

        let (imputed, _) = impute(&metadata, &profiles);

        assert_eq!(imputed[1].genres, vec!["rock"]);
        assert!(imputed[2].genres.is_empty());
        assert!(!imputed[2].genres_inferred_from_artist);
    }
}
