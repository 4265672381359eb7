//! External service clients

pub mod musicbrainz_client;

pub use musicbrainz_client::{
    ArtistInfo, FetchOutcome, FetchResult, MusicBrainzClient, NotFoundReason, ProviderError,
};
