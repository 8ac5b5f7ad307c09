//! Finding purchase links for tracks that are not cached yet

pub mod bandcamp;
pub mod error;

/// Outcome of a single search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    /// Searched, nothing usable came back.
    Unresolved,
}

impl Resolution {
    /// The value stored for this outcome. `Unresolved` is stored as an empty link.
    pub fn into_link(self) -> String {
        match self {
            Resolution::Found(link) => link,
            Resolution::Unresolved => String::new(),
        }
    }
}

/// Looks up a link for one track.
///
/// Implementations must not fail: every error is reported as [`Resolution::Unresolved`].
pub trait LinkResolver {
    fn resolve(&self, artist: &str, title: &str) -> Resolution;
}
