use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::ports::target::TargetLibraryPlaylist;

static ID_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(ID: (.*?)\)").expect("id marker regex is valid"));

/// A target library playlist that mirrors a source playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredPlaylist {
    pub target_id: String,
    pub title: String,
    pub embedded_source_id: String,
}

impl MirroredPlaylist {
    /// Recovers the source id from the `(ID: <sourceId>)` marker in the description.
    /// Playlists without a marker are not mirrors.
    ///
    /// The marker is written last, so the last one wins over any copied from the source title.
    pub fn from_library_playlist(playlist: TargetLibraryPlaylist) -> Option<Self> {
        let description = playlist.description.as_deref()?;
        let source_id = ID_MARKER
            .captures_iter(description)
            .last()?
            .get(1)?
            .as_str()
            .trim();
        if source_id.is_empty() {
            return None;
        }
        Some(Self {
            embedded_source_id: source_id.to_string(),
            target_id: playlist.id,
            title: playlist.title,
        })
    }
}

/// How newly created mirrors are named.
#[derive(Debug, Clone)]
pub struct MirrorNaming {
    pub prefix: String,
    pub tool_name: String,
}

impl MirrorNaming {
    pub fn title(&self, source_title: &str) -> String {
        format!("{} {}", self.prefix, source_title)
    }

    pub fn description(&self, source_title: &str, source_id: &str) -> String {
        format!(
            "{}. Synced with {}. (ID: {})",
            source_title, self.tool_name, source_id
        )
    }
}
