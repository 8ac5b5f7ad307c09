//! On-disk layout of the link database: a JSON array of flat objects.

use serde::{Deserialize, Serialize};

use crate::domain::track::Track;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTrack {
    #[serde(rename = "track title")]
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "itemurl", default, deserialize_with = "null_as_empty")]
    pub link: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<Track> for StoredTrack {
    fn from(t: Track) -> Self {
        Self {
            title: t.title,
            artist: t.artist,
            album: t.album,
            label: t.label,
            link: t.link,
        }
    }
}

impl From<StoredTrack> for Track {
    fn from(s: StoredTrack) -> Self {
        Self {
            artist: s.artist,
            title: s.title,
            album: s.album,
            label: s.label,
            link: s.link,
        }
    }
}
