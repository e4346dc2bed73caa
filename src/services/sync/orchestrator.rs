use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::ports::source::{SourcePlaylist, SourceServiceClient, SourceTrack};
use crate::ports::target::TargetServiceClient;
use crate::services::sync::error::{
    SyncError, SyncStep, validate_playlist_id, validate_track_id,
};
use crate::services::sync::matcher::{TrackMatch, TrackMatcher};
use crate::services::sync::mirror::{MirrorNaming, MirroredPlaylist};
use crate::services::sync::pagination::fetch_all_pages;
use crate::services::sync::state_store::{GlobalSyncState, SyncStateStore};
use crate::services::sync::status::{StatusBroadcaster, StatusMessage};

pub const SOURCE_TRACKS_PAGE_SIZE: usize = 100;
pub const SOURCE_PLAYLISTS_PAGE_SIZE: usize = 50;
pub const TARGET_PLAYLISTS_PAGE_SIZE: usize = 100;

/// Outcome of one successful playlist sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub playlist_id: String,
    pub mirror_playlist_id: String,
    pub mirror_created: bool,
    /// Tracks added to the source playlist since the previous sync.
    pub new_tracks: usize,
    pub tracks_added: usize,
    /// `"<artists> - <title>"` of new tracks the target catalog had no match for.
    pub unmatched: Vec<String>,
    pub synced_at: DateTime<Utc>,
}

/// Mirrors one source playlist into the target library.
///
/// A run sets the global syncing flag, fetches the source playlist and its tracks, finds or
/// creates the mirror, matches every track added since the last sync and appends the matches.
/// The flag is cleared again on every exit path. Tracks added before a later failure stay added.
pub struct PlaylistSyncOrchestrator<S: SourceServiceClient, T: TargetServiceClient> {
    source: Arc<S>,
    target: Arc<T>,
    matcher: TrackMatcher<T>,
    state: SyncStateStore,
    broadcaster: Arc<StatusBroadcaster>,
    naming: MirrorNaming,
}

impl<S: SourceServiceClient, T: TargetServiceClient> PlaylistSyncOrchestrator<S, T> {
    pub fn new(
        source: Arc<S>,
        target: Arc<T>,
        state: SyncStateStore,
        broadcaster: Arc<StatusBroadcaster>,
        naming: MirrorNaming,
    ) -> Self {
        Self {
            matcher: TrackMatcher::new(target.clone()),
            source,
            target,
            state,
            broadcaster,
            naming,
        }
    }

    pub fn state_store(&self) -> &SyncStateStore {
        &self.state
    }

    #[instrument(skip(self))]
    pub async fn sync_playlist(&self, playlist_id: &str) -> Result<SyncReport, SyncError> {
        validate_playlist_id(playlist_id)?;
        tracing::info!("Starting sync of playlist {}", playlist_id);

        let mut state = self.state.read().await?;
        state.syncing = true;
        self.state.write(&state).await?;
        self.broadcaster.publish(StatusMessage { syncing: true });

        let result = self.run_steps(playlist_id, &mut state).await;
        let cleared = self.finish(state).await;

        match result {
            Ok(report) => {
                cleared?;
                tracing::info!(
                    "Synced playlist {}: {} new, {} added, {} unmatched",
                    playlist_id,
                    report.new_tracks,
                    report.tracks_added,
                    report.unmatched.len()
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(clear_err) = cleared {
                    tracing::error!("Failed to clear syncing flag: {}", clear_err);
                }
                tracing::error!("Sync of playlist {} failed: {}", playlist_id, e);
                Err(e)
            }
        }
    }

    async fn run_steps(
        &self,
        playlist_id: &str,
        state: &mut GlobalSyncState,
    ) -> Result<SyncReport, SyncError> {
        let playlist = self
            .source
            .get_playlist(playlist_id)
            .await
            .map_err(SyncError::at(SyncStep::FetchPlaylist))?;
        tracing::debug!("Found source playlist: {}", playlist.title);

        let tracks = self.fetch_tracks(playlist_id).await?;
        tracing::debug!("Fetched {} source tracks", tracks.len());

        let (mirror, mirror_created) = self.resolve_mirror(&playlist).await?;

        let since = state.last_sync_date(playlist_id);
        let mut entry_ids = Vec::new();
        let mut unmatched = Vec::new();
        let mut new_tracks = 0;
        for track in &tracks {
            if track.added_at <= since {
                tracing::debug!(
                    "Skipping {} - {}: added before last sync",
                    track.joined_artists(),
                    track.title
                );
                continue;
            }
            new_tracks += 1;

            match self
                .matcher
                .find_match(track)
                .await
                .map_err(SyncError::at(SyncStep::MatchTracks))?
            {
                Some(found) => entry_ids.push(found.entry.id),
                None => {
                    let name = format!("{} - {}", track.joined_artists(), track.title);
                    tracing::warn!("Could not find track in target catalog: {}", name);
                    unmatched.push(name);
                }
            }
        }

        if !entry_ids.is_empty() {
            self.target
                .add_tracks_to_playlist(&mirror.target_id, &entry_ids)
                .await
                .map_err(SyncError::at(SyncStep::AddTracks))?;
            tracing::debug!("Added {} tracks to {}", entry_ids.len(), mirror.title);
        }

        let synced_at = Utc::now();
        state.record_sync(playlist_id, synced_at);
        self.state.write(state).await?;

        Ok(SyncReport {
            playlist_id: playlist_id.to_string(),
            mirror_playlist_id: mirror.target_id,
            mirror_created,
            new_tracks,
            tracks_added: entry_ids.len(),
            unmatched,
            synced_at: state.last_sync_date(playlist_id),
        })
    }

    async fn fetch_tracks(&self, playlist_id: &str) -> Result<Vec<SourceTrack>, SyncError> {
        let source = &self.source;
        fetch_all_pages(SOURCE_TRACKS_PAGE_SIZE, |offset, limit| {
            source.playlist_tracks_page(playlist_id, offset, limit)
        })
        .await
        .map_err(SyncError::at(SyncStep::FetchTracks))
    }

    /// Broadcasts the end of the run and persists the cleared flag.
    async fn finish(&self, mut state: GlobalSyncState) -> Result<(), SyncError> {
        self.broadcaster.publish(StatusMessage { syncing: false });
        state.syncing = false;
        self.state.write(&state).await
    }

    async fn resolve_mirror(
        &self,
        playlist: &SourcePlaylist,
    ) -> Result<(MirroredPlaylist, bool), SyncError> {
        if let Some(mirror) = self.find_mirror(&playlist.id).await? {
            tracing::debug!("Mirror playlist already exists: {}", mirror.title);
            return Ok((mirror, false));
        }

        let title = self.naming.title(&playlist.title);
        let description = self.naming.description(&playlist.title, &playlist.id);
        let created = self
            .target
            .create_playlist(&title, &description)
            .await
            .map_err(SyncError::at(SyncStep::CreateMirror))?;
        tracing::info!("Created mirror playlist: {}", created.title);

        Ok((
            MirroredPlaylist {
                target_id: created.id,
                title: created.title,
                embedded_source_id: playlist.id.clone(),
            },
            true,
        ))
    }

    /// Looks the mirror up by the source id embedded in its description, never by title.
    async fn find_mirror(&self, playlist_id: &str) -> Result<Option<MirroredPlaylist>, SyncError> {
        let mut matching = self
            .list_mirrors()
            .await?
            .into_iter()
            .filter(|m| m.embedded_source_id == playlist_id);
        let found = matching.next();
        if let Some(duplicate) = matching.next() {
            tracing::warn!(
                "Multiple mirrors embed source id {}; ignoring {}",
                playlist_id,
                duplicate.target_id
            );
        }
        Ok(found)
    }

    /// Every playlist in the source user's library.
    pub async fn source_playlists(&self) -> Result<Vec<SourcePlaylist>, SyncError> {
        let source = &self.source;
        fetch_all_pages(SOURCE_PLAYLISTS_PAGE_SIZE, |offset, limit| {
            source.user_playlists_page(offset, limit)
        })
        .await
        .map_err(SyncError::at(SyncStep::ListSourcePlaylists))
    }

    /// All tracks of a source playlist. Leaves the sync state alone.
    pub async fn source_playlist_tracks(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<SourceTrack>, SyncError> {
        validate_playlist_id(playlist_id)?;
        self.fetch_tracks(playlist_id).await
    }

    /// Looks a single source track up in the target catalog.
    #[instrument(skip(self))]
    pub async fn match_source_track(
        &self,
        track_id: &str,
    ) -> Result<Option<TrackMatch>, SyncError> {
        validate_track_id(track_id)?;
        let track = self
            .source
            .get_track(track_id)
            .await
            .map_err(SyncError::at(SyncStep::FetchTrack))?;
        self.matcher
            .find_match(&track)
            .await
            .map_err(SyncError::at(SyncStep::MatchTracks))
    }

    /// Every playlist in the target library that carries a source id marker.
    pub async fn list_mirrors(&self) -> Result<Vec<MirroredPlaylist>, SyncError> {
        let target = &self.target;
        let playlists = fetch_all_pages(TARGET_PLAYLISTS_PAGE_SIZE, |offset, limit| {
            target.library_playlists_page(offset, limit)
        })
        .await
        .map_err(SyncError::at(SyncStep::ListMirrors))?;

        Ok(playlists
            .into_iter()
            .filter_map(MirroredPlaylist::from_library_playlist)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::source::{MockSourceServiceClient, SourceTrack};
    use crate::ports::target::{MockTargetServiceClient, TargetLibraryPlaylist};
    use crate::ports::{Page, ServiceError};
    use crate::services::storage::memory::MemoryStore;
    use crate::services::sync::error::ErrorKind;
    use crate::test_utils::{catalog_entry, date, source_track};
    use tokio::sync::mpsc;

    const PLAYLIST_ID: &str = "P1";

    struct Harness {
        state: SyncStateStore,
        broadcaster: Arc<StatusBroadcaster>,
        status: mpsc::Receiver<StatusMessage>,
    }

    impl Harness {
        fn new() -> Self {
            let broadcaster = Arc::new(StatusBroadcaster::new());
            let (_id, status) = broadcaster.subscribe("test");
            Self {
                state: SyncStateStore::new(Arc::new(MemoryStore::new())),
                broadcaster,
                status,
            }
        }

        async fn with_last_sync(self, playlist_id: &str, at: &str) -> Self {
            let mut state = GlobalSyncState::default();
            state.record_sync(playlist_id, date(at));
            self.state.write(&state).await.unwrap();
            self
        }

        fn orchestrator(
            &self,
            source: MockSourceServiceClient,
            target: MockTargetServiceClient,
        ) -> PlaylistSyncOrchestrator<MockSourceServiceClient, MockTargetServiceClient> {
            PlaylistSyncOrchestrator::new(
                Arc::new(source),
                Arc::new(target),
                self.state.clone(),
                self.broadcaster.clone(),
                MirrorNaming {
                    prefix: "Spotify -".into(),
                    tool_name: "playlist-mirror".into(),
                },
            )
        }

        fn drain_status(&mut self) -> Vec<StatusMessage> {
            let mut messages = Vec::new();
            while let Ok(message) = self.status.try_recv() {
                messages.push(message);
            }
            messages
        }
    }

    fn source_with(tracks: Vec<SourceTrack>) -> MockSourceServiceClient {
        let mut source = MockSourceServiceClient::new();
        source.expect_get_playlist().returning(|id| {
            Ok(SourcePlaylist {
                id: id.to_string(),
                title: "Road Trip".into(),
            })
        });
        source
            .expect_playlist_tracks_page()
            .returning(move |_, offset, limit| {
                Ok(Page::new(
                    tracks.iter().skip(offset).take(limit).cloned().collect(),
                    Some(tracks.len()),
                ))
            });
        source
    }

    fn existing_mirror() -> TargetLibraryPlaylist {
        TargetLibraryPlaylist {
            id: "p.mirror".into(),
            title: "Spotify - Road Trip".into(),
            description: Some("Road Trip. Synced with playlist-mirror. (ID: P1)".into()),
        }
    }

    fn library_with(playlists: Vec<TargetLibraryPlaylist>) -> MockTargetServiceClient {
        let mut target = MockTargetServiceClient::new();
        target
            .expect_library_playlists_page()
            .returning(move |_, _| {
                Ok(Page::new(playlists.clone(), Some(playlists.len())))
            });
        target
    }

    #[tokio::test]
    async fn test_only_tracks_added_after_last_sync_are_matched() {
        let mut harness = Harness::new()
            .with_last_sync(PLAYLIST_ID, "2024-01-01T00:00:00Z")
            .await;
        let source = source_with(vec![
            source_track("t1", "Old One", &["Artist A"], "2023-12-01"),
            source_track("t2", "Old Two", &["Artist C"], "2023-12-01"),
            source_track("t3", "Song B (feat. X)", &["Artist A"], "2024-01-05"),
        ]);
        let mut target = library_with(vec![existing_mirror()]);
        target
            .expect_search_catalog()
            .withf(|term, _, _, _| term == "Artist A - Song B ")
            .times(1)
            .returning(|_, _, _, _| Ok(vec![catalog_entry("am3", "Song B", "Artist A", None)]));
        target
            .expect_add_tracks_to_playlist()
            .withf(|playlist_id, ids| playlist_id == "p.mirror" && ids == ["am3".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));
        target.expect_create_playlist().never();

        let report = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap();

        assert_eq!(report.new_tracks, 1);
        assert_eq!(report.tracks_added, 1);
        assert!(!report.mirror_created);
        assert_eq!(
            harness.drain_status(),
            vec![
                StatusMessage { syncing: true },
                StatusMessage { syncing: false }
            ]
        );
    }

    #[tokio::test]
    async fn test_creates_mirror_and_adds_matches_in_source_order() {
        let harness = Harness::new();
        let source = source_with(vec![
            source_track("t1", "First", &["Artist A"], "2024-01-01"),
            source_track("t2", "Second", &["Artist B"], "2024-01-02"),
        ]);
        let mut target = library_with(vec![]);
        target
            .expect_create_playlist()
            .withf(|title, description| {
                title == "Spotify - Road Trip"
                    && description == "Road Trip. Synced with playlist-mirror. (ID: P1)"
            })
            .times(1)
            .returning(|title, _| {
                Ok(TargetLibraryPlaylist {
                    id: "p.new".into(),
                    title: title.to_string(),
                    description: None,
                })
            });
        target.expect_search_catalog().returning(|term, _, _, _| {
            let id = if term.starts_with("Artist A") { "am1" } else { "am2" };
            Ok(vec![catalog_entry(id, "x", "y", None)])
        });
        target
            .expect_add_tracks_to_playlist()
            .withf(|playlist_id, ids| {
                playlist_id == "p.new" && ids == ["am1".to_string(), "am2".to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let report = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap();

        assert!(report.mirror_created);
        assert_eq!(report.mirror_playlist_id, "p.new");
        assert_eq!(report.tracks_added, 2);
    }

    #[tokio::test]
    async fn test_rerun_without_new_tracks_adds_nothing() {
        let harness = Harness::new();
        let tracks = vec![source_track("t1", "Song", &["Artist A"], "2024-01-01")];

        let mut target = library_with(vec![existing_mirror()]);
        target
            .expect_search_catalog()
            .times(1)
            .returning(|_, _, _, _| Ok(vec![catalog_entry("am1", "Song", "Artist A", None)]));
        target
            .expect_add_tracks_to_playlist()
            .times(1)
            .returning(|_, _| Ok(()));
        harness
            .orchestrator(source_with(tracks.clone()), target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap();

        let mut target = library_with(vec![existing_mirror()]);
        target.expect_search_catalog().never();
        target.expect_add_tracks_to_playlist().never();
        let report = harness
            .orchestrator(source_with(tracks), target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap();

        assert_eq!(report.new_tracks, 0);
        assert_eq!(report.tracks_added, 0);
    }

    #[tokio::test]
    async fn test_unmatched_track_is_skipped_and_sync_date_advances() {
        let harness = Harness::new()
            .with_last_sync(PLAYLIST_ID, "2024-01-01T00:00:00Z")
            .await;
        let source = source_with(vec![source_track(
            "t1",
            "Obscure",
            &["Nobody"],
            "2024-02-01",
        )]);
        let mut target = library_with(vec![existing_mirror()]);
        target
            .expect_search_catalog()
            .returning(|_, _, _, _| Ok(vec![]));
        target.expect_add_tracks_to_playlist().never();

        let report = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap();

        assert_eq!(report.unmatched, vec!["Nobody - Obscure".to_string()]);
        let state = harness.state.read().await.unwrap();
        assert!(state.last_sync_date(PLAYLIST_ID) > date("2024-02-01"));
        assert!(!state.syncing);
    }

    #[tokio::test]
    async fn test_mirror_lookup_ignores_title_collisions() {
        let harness = Harness::new();
        let source = source_with(vec![]);
        let mut target = library_with(vec![
            TargetLibraryPlaylist {
                id: "p.other".into(),
                title: "Spotify - Road Trip".into(),
                description: Some("Road Trip. Synced with playlist-mirror. (ID: P2)".into()),
            },
            TargetLibraryPlaylist {
                id: "p.mine".into(),
                title: "Renamed by user".into(),
                description: Some("Road Trip. Synced with playlist-mirror. (ID: P1)".into()),
            },
        ]);
        target.expect_create_playlist().never();

        let report = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap();

        assert_eq!(report.mirror_playlist_id, "p.mine");
    }

    #[tokio::test]
    async fn test_same_title_different_id_creates_new_mirror() {
        let harness = Harness::new();
        let source = source_with(vec![]);
        let mut target = library_with(vec![TargetLibraryPlaylist {
            id: "p.other".into(),
            title: "Spotify - Road Trip".into(),
            description: Some("Road Trip. Synced with playlist-mirror. (ID: P2)".into()),
        }]);
        target.expect_create_playlist().times(1).returning(|title, _| {
            Ok(TargetLibraryPlaylist {
                id: "p.new".into(),
                title: title.to_string(),
                description: None,
            })
        });

        let report = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap();

        assert!(report.mirror_created);
        assert_eq!(report.mirror_playlist_id, "p.new");
    }

    #[tokio::test]
    async fn test_track_fetch_failure_still_clears_flag() {
        let mut harness = Harness::new();
        let mut source = MockSourceServiceClient::new();
        source.expect_get_playlist().returning(|id| {
            Ok(SourcePlaylist {
                id: id.to_string(),
                title: "Road Trip".into(),
            })
        });
        source
            .expect_playlist_tracks_page()
            .returning(|_, _, _| Err(ServiceError::transient("spotify", "connection reset")));
        let mut target = MockTargetServiceClient::new();
        target.expect_library_playlists_page().never();

        let err = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(SyncStep::FetchTracks));
        assert_eq!(err.kind(), ErrorKind::TransientService);
        let state = harness.state.read().await.unwrap();
        assert!(!state.syncing);
        assert!(state.playlists.get(PLAYLIST_ID).is_none());
        assert_eq!(
            harness.drain_status().last(),
            Some(&StatusMessage { syncing: false })
        );
    }

    #[tokio::test]
    async fn test_missing_source_playlist_is_not_found() {
        let harness = Harness::new();
        let mut source = MockSourceServiceClient::new();
        source.expect_get_playlist().returning(|_| {
            Err(ServiceError::NotFound {
                service: "spotify",
                what: "playlist".into(),
            })
        });

        let err = harness
            .orchestrator(source, MockTargetServiceClient::new())
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.step(), Some(SyncStep::FetchPlaylist));
    }

    #[tokio::test]
    async fn test_matcher_failure_aborts_before_adding() {
        let harness = Harness::new();
        let source = source_with(vec![
            source_track("t1", "One", &["Artist A"], "2024-01-01"),
            source_track("t2", "Two", &["Artist A"], "2024-01-02"),
        ]);
        let mut target = library_with(vec![existing_mirror()]);
        target
            .expect_search_catalog()
            .times(1)
            .returning(|_, _, _, _| Err(ServiceError::transient("apple-music", "502")));
        target.expect_add_tracks_to_playlist().never();

        let err = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(SyncStep::MatchTracks));
        let state = harness.state.read().await.unwrap();
        assert!(!state.syncing);
        assert!(state.playlists.get(PLAYLIST_ID).is_none());
    }

    #[tokio::test]
    async fn test_add_failure_keeps_previous_sync_date() {
        let harness = Harness::new()
            .with_last_sync(PLAYLIST_ID, "2024-01-01T00:00:00Z")
            .await;
        let source = source_with(vec![source_track("t1", "One", &["Artist A"], "2024-03-01")]);
        let mut target = library_with(vec![existing_mirror()]);
        target
            .expect_search_catalog()
            .returning(|_, _, _, _| Ok(vec![catalog_entry("am1", "One", "Artist A", None)]));
        target
            .expect_add_tracks_to_playlist()
            .returning(|_, _| Err(ServiceError::transient("apple-music", "500")));

        let err = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(SyncStep::AddTracks));
        let state = harness.state.read().await.unwrap();
        assert_eq!(
            state.last_sync_date(PLAYLIST_ID),
            date("2024-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_library_listing_failure_still_clears_flag() {
        let mut harness = Harness::new();
        let source = source_with(vec![source_track("t1", "One", &["Artist A"], "2024-01-01")]);
        let mut target = MockTargetServiceClient::new();
        target
            .expect_library_playlists_page()
            .returning(|_, _| Err(ServiceError::transient("apple-music", "503")));
        target.expect_create_playlist().never();
        target.expect_search_catalog().never();

        let err = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(SyncStep::ListMirrors));
        let state = harness.state.read().await.unwrap();
        assert!(!state.syncing);
        assert!(state.playlists.get(PLAYLIST_ID).is_none());
        assert_eq!(
            harness.drain_status(),
            vec![
                StatusMessage { syncing: true },
                StatusMessage { syncing: false }
            ]
        );
    }

    #[tokio::test]
    async fn test_mirror_creation_failure_still_clears_flag() {
        let mut harness = Harness::new();
        let source = source_with(vec![source_track("t1", "One", &["Artist A"], "2024-01-01")]);
        let mut target = library_with(vec![]);
        target.expect_create_playlist().times(1).returning(|_, _| {
            Err(ServiceError::Transient {
                service: "apple-music",
                status: Some(403),
                message: "forbidden".into(),
            })
        });
        target.expect_search_catalog().never();
        target.expect_add_tracks_to_playlist().never();

        let err = harness
            .orchestrator(source, target)
            .sync_playlist(PLAYLIST_ID)
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(SyncStep::CreateMirror));
        assert_eq!(err.kind(), ErrorKind::TransientService);
        let state = harness.state.read().await.unwrap();
        assert!(!state.syncing);
        assert!(state.playlists.get(PLAYLIST_ID).is_none());
        assert_eq!(
            harness.drain_status().last(),
            Some(&StatusMessage { syncing: false })
        );
    }

    #[tokio::test]
    async fn test_sync_date_persist_failure_still_clears_flag() {
        use crate::ports::kv_store::{MockKeyValueStore, StoreError};
        use mockall::Sequence;
        use std::sync::Mutex;

        let cleared = Arc::new(Mutex::new(None::<Vec<u8>>));
        let mut seq = Sequence::new();
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(StoreError::Io(std::io::Error::other("disk full"))));
        let written = cleared.clone();
        store
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, value| {
                *written.lock().unwrap() = Some(value);
                Ok(())
            });

        let broadcaster = Arc::new(StatusBroadcaster::new());
        let (_id, mut status) = broadcaster.subscribe("test");
        let mut target = library_with(vec![existing_mirror()]);
        target
            .expect_search_catalog()
            .returning(|_, _, _, _| Ok(vec![catalog_entry("am1", "One", "Artist A", None)]));
        target
            .expect_add_tracks_to_playlist()
            .times(1)
            .returning(|_, _| Ok(()));
        let orchestrator = PlaylistSyncOrchestrator::new(
            Arc::new(source_with(vec![source_track(
                "t1",
                "One",
                &["Artist A"],
                "2024-01-01",
            )])),
            Arc::new(target),
            SyncStateStore::new(Arc::new(store)),
            broadcaster,
            MirrorNaming {
                prefix: "Spotify -".into(),
                tool_name: "playlist-mirror".into(),
            },
        );

        let err = orchestrator.sync_playlist(PLAYLIST_ID).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(err.step(), None);
        let blob = cleared.lock().unwrap().take().unwrap();
        let state: GlobalSyncState = serde_json::from_slice(&blob).unwrap();
        assert!(!state.syncing);
        let mut messages = Vec::new();
        while let Ok(message) = status.try_recv() {
            messages.push(message);
        }
        assert_eq!(messages.last(), Some(&StatusMessage { syncing: false }));
    }

    #[tokio::test]
    async fn test_source_playlists_are_paged_past_null_entries() {
        let harness = Harness::new();
        let mut source = MockSourceServiceClient::new();
        source
            .expect_user_playlists_page()
            .withf(|_, limit| *limit == SOURCE_PLAYLISTS_PAGE_SIZE)
            .returning(|offset, _| {
                let items = if offset == 0 {
                    vec![]
                } else {
                    vec![SourcePlaylist {
                        id: "P9".into(),
                        title: "Late Find".into(),
                    }]
                };
                let fetched = if offset == 0 { 50 } else { 1 };
                Ok(Page::with_fetched(items, Some(51), fetched))
            });

        let playlists = harness
            .orchestrator(source, MockTargetServiceClient::new())
            .source_playlists()
            .await
            .unwrap();

        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].id, "P9");
    }

    #[tokio::test]
    async fn test_source_playlist_tracks_leave_state_alone() {
        let mut harness = Harness::new();
        let source = source_with(vec![
            source_track("t1", "One", &["Artist A"], "2024-01-01"),
            source_track("t2", "Two", &["Artist B"], "2024-01-02"),
        ]);

        let tracks = harness
            .orchestrator(source, MockTargetServiceClient::new())
            .source_playlist_tracks(PLAYLIST_ID)
            .await
            .unwrap();

        assert_eq!(tracks.len(), 2);
        assert!(harness.drain_status().is_empty());
        assert_eq!(
            harness.state.read().await.unwrap(),
            GlobalSyncState::default()
        );
    }

    #[tokio::test]
    async fn test_match_source_track_prefers_isrc() {
        let harness = Harness::new();
        let mut source = MockSourceServiceClient::new();
        source.expect_get_track().returning(|id| {
            let mut track = source_track(id, "Song B (feat. X)", &["Artist A"], "1970-01-01");
            track.isrc = Some("USAAA2400001".into());
            Ok(track)
        });
        let mut target = MockTargetServiceClient::new();
        target
            .expect_search_catalog()
            .withf(|term, _, _, _| term == "Artist A - Song B ")
            .returning(|_, _, _, _| {
                Ok(vec![
                    catalog_entry("am1", "Song B", "Artist A", None),
                    catalog_entry("am2", "Song B", "Someone", Some("USAAA2400001")),
                ])
            });

        let found = harness
            .orchestrator(source, target)
            .match_source_track("t1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.entry.id, "am2");
        assert_eq!(found.rule, crate::services::sync::matcher::MatchRule::Isrc);
    }

    #[tokio::test]
    async fn test_match_source_track_missing_track() {
        let harness = Harness::new();
        let mut source = MockSourceServiceClient::new();
        source.expect_get_track().returning(|_| {
            Err(ServiceError::NotFound {
                service: "spotify",
                what: "track".into(),
            })
        });
        let mut target = MockTargetServiceClient::new();
        target.expect_search_catalog().never();

        let err = harness
            .orchestrator(source, target)
            .match_source_track("t1")
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(SyncStep::FetchTrack));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected_before_any_call() {
        let mut harness = Harness::new();
        let mut source = MockSourceServiceClient::new();
        source.expect_get_playlist().never();

        let err = harness
            .orchestrator(source, MockTargetServiceClient::new())
            .sync_playlist("not a playlist")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(harness.drain_status().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_state_fails_without_touching_services() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(crate::services::sync::state_store::SYNC_STATE_KEY, b"[1, 2".to_vec());
        let broadcaster = Arc::new(StatusBroadcaster::new());
        let mut source = MockSourceServiceClient::new();
        source.expect_get_playlist().never();
        let orchestrator = PlaylistSyncOrchestrator::new(
            Arc::new(source),
            Arc::new(MockTargetServiceClient::new()),
            SyncStateStore::new(store),
            broadcaster,
            MirrorNaming {
                prefix: "Spotify -".into(),
                tool_name: "playlist-mirror".into(),
            },
        );

        let err = orchestrator.sync_playlist(PLAYLIST_ID).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateCorruption);
    }
}
