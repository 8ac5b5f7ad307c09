//! Reading DJ software history exports

pub mod error;
pub mod locate;
pub mod parse;

use std::path::Path;

use crate::{domain::track::Track, history::error::HistoryError};

/// Reads and parses a history file. The header record is kept as the first element.
pub fn read_tracks(path: &Path) -> Result<Vec<Track>, HistoryError> {
    let bytes = std::fs::read(path)?;
    let text = parse::decode_utf16(&bytes)?;
    let tracks = parse::parse_lines(text.lines())?;
    log::info!("parsed {} records from {}", tracks.len(), path.display());
    Ok(tracks)
}
