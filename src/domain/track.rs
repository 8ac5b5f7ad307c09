use std::fmt::Display;

/// Identity of a track for lookups: artist and title, compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey {
    pub artist: String,
    pub title: String,
}

impl TrackKey {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

impl Display for TrackKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Represent a played track
///
/// `album` and `label` are informational only. An empty `link` means
/// the track has no resolved link (yet).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Track {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub label: String,
    pub link: String,
}

impl Track {
    pub fn key(&self) -> TrackKey {
        TrackKey::new(self.artist.clone(), self.title.clone())
    }

    pub fn has_link(&self) -> bool {
        !self.link.is_empty()
    }
}
