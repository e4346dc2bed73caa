use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::Database as SeaDatabase;

use crate::database::Database;
use crate::ports::source::SourceTrack;
use crate::ports::target::TargetCatalogEntry;

pub async fn test_db() -> Arc<Database> {
    let conn = SeaDatabase::connect("sqlite::memory:?mode=rwc").await.unwrap();
    Arc::new(Database::from_connection(conn).await.unwrap())
}

/// Parses either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn date(value: &str) -> DateTime<Utc> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.with_timezone(&Utc);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn source_track(id: &str, title: &str, artists: &[&str], added_at: &str) -> SourceTrack {
    SourceTrack {
        id: id.to_string(),
        title: title.to_string(),
        artists: artists.iter().map(|a| a.to_string()).collect(),
        isrc: None,
        added_at: date(added_at),
    }
}

pub fn catalog_entry(id: &str, title: &str, artist: &str, isrc: Option<&str>) -> TargetCatalogEntry {
    TargetCatalogEntry {
        id: id.to_string(),
        title: title.to_string(),
        artist_name: artist.to_string(),
        isrc: isrc.map(str::to_string),
    }
}
