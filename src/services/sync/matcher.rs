use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use tracing::instrument;

use crate::ports::ServiceError;
use crate::ports::source::SourceTrack;
use crate::ports::target::{MediaType, TargetCatalogEntry, TargetServiceClient};

/// Maximum number of catalog candidates considered per track.
pub const SEARCH_LIMIT: usize = 25;

// Target catalogs usually leave featured artists out of the title
static FEATURE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\((?:feat\.|ft\.|with) [^)]*\)").expect("feature clause regex is valid")
});

/// Which tie-break rule selected a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchRule {
    Isrc,
    ArtistSubstring,
    FirstResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackMatch {
    pub entry: TargetCatalogEntry,
    pub rule: MatchRule,
}

/// Strips `(feat. ...)`, `(ft. ...)` and `(with ...)` clauses, leaving surrounding whitespace.
pub fn clean_title(title: &str) -> String {
    FEATURE_CLAUSE.replace_all(title, "").into_owned()
}

/// `"<first artist> - <cleaned title>"`, or just the cleaned title for artist-less tracks.
pub fn search_term(track: &SourceTrack) -> String {
    let title = clean_title(&track.title);
    match track.artists.first() {
        Some(artist) => format!("{} - {}", artist, title),
        None => title,
    }
}

/// Applies the tie-break rules to the candidates in search-result order.
pub fn pick_candidate(
    track: &SourceTrack,
    candidates: Vec<TargetCatalogEntry>,
) -> Option<TrackMatch> {
    if let Some(isrc) = track.isrc.as_deref().filter(|isrc| !isrc.is_empty()) {
        if let Some(entry) = candidates.iter().find(|c| c.isrc.as_deref() == Some(isrc)) {
            return Some(TrackMatch {
                entry: entry.clone(),
                rule: MatchRule::Isrc,
            });
        }
    }

    let artists = track.joined_artists();
    if let Some(entry) = candidates
        .iter()
        .find(|c| !c.artist_name.is_empty() && artists.contains(&c.artist_name))
    {
        return Some(TrackMatch {
            entry: entry.clone(),
            rule: MatchRule::ArtistSubstring,
        });
    }

    candidates.into_iter().next().map(|entry| TrackMatch {
        entry,
        rule: MatchRule::FirstResult,
    })
}

/// Finds the target catalog entry for a source track.
pub struct TrackMatcher<T: TargetServiceClient> {
    target: Arc<T>,
}

impl<T: TargetServiceClient> TrackMatcher<T> {
    pub fn new(target: Arc<T>) -> Self {
        Self { target }
    }

    /// Returns `Ok(None)` when the catalog has nothing for the track. Only a failing search is an
    /// error.
    #[instrument(skip_all, fields(track_id = %track.id))]
    pub async fn find_match(&self, track: &SourceTrack) -> Result<Option<TrackMatch>, ServiceError> {
        let term = search_term(track);
        tracing::debug!("Searching target catalog for: {}", term);

        let candidates = match self
            .target
            .search_catalog(&term, MediaType::Songs, SEARCH_LIMIT, 0)
            .await
        {
            Ok(candidates) => candidates,
            Err(ServiceError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let found = pick_candidate(track, candidates);
        if let Some(found) = &found {
            tracing::debug!(
                rule = ?found.rule,
                "Matched {} - {}",
                found.entry.artist_name,
                found.entry.title
            );
        }
        Ok(found)
    }
}
