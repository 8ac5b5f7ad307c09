use std::{
    collections::HashMap,
    ffi::OsString,
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{
    domain::track::{Track, TrackKey},
    storage::{error::StoreError, schema::StoredTrack},
};

/// How many `_new` suffixes are tried before giving up on a fresh store name.
pub const MAX_NAME_ATTEMPTS: usize = 32;

const NEW_SUFFIX: &str = "_new";

/// Persistent cache of resolved links, keyed by artist and title.
///
/// An empty link is a valid cached value: the track was searched for and
/// nothing was found.
#[derive(Debug)]
pub struct LinkStore {
    path: PathBuf,
    records: Vec<Track>,
    index: HashMap<TrackKey, usize>,
}

impl LinkStore {
    /// An empty store that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Reads an existing store. A missing or unparsable file is an error, never an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let unavailable = |reason: String| StoreError::StoreUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => unavailable("file does not exist".into()),
            _ => unavailable(e.to_string()),
        })?;
        let stored: Vec<StoredTrack> =
            serde_json::from_str(&contents).map_err(|e| unavailable(e.to_string()))?;

        let mut store = Self::empty(path);
        let mut duplicates = 0;
        for record in stored {
            let track = Track::from(record);
            if store.index.contains_key(&track.key()) {
                duplicates += 1;
                continue;
            }
            store.push(track);
        }

        if duplicates > 0 {
            log::warn!(
                "{} duplicate records in {} ignored, first occurrence kept",
                duplicates,
                path.display()
            );
        }
        log::info!("loaded {} records from {}", store.len(), path.display());
        Ok(store)
    }

    /// Like [`LinkStore::load`], but starts empty when the file does not exist and `create_if_missing` is set.
    pub fn load_or_create(path: &Path, create_if_missing: bool) -> Result<Self, StoreError> {
        if create_if_missing && !path.exists() {
            log::warn!("link store {} does not exist, starting empty", path.display());
            return Ok(Self::empty(path));
        }
        Self::load(path)
    }

    /// Writes a brand-new store without touching any existing file.
    ///
    /// If `path` is taken, `_new` is appended to the file stem until a free
    /// name is found.
    pub fn create_new(path: &Path, tracks: Vec<Track>) -> Result<Self, StoreError> {
        let free = next_available_path(path)?;
        let mut store = Self::empty(free);
        for track in tracks {
            store.upsert(track);
        }
        store.save()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Track] {
        &self.records
    }

    /// `None` means the key was never searched for. `Some("")` means it was, without result.
    pub fn lookup(&self, artist: &str, title: &str) -> Option<&str> {
        self.index
            .get(&TrackKey::new(artist, title))
            .map(|&i| self.records[i].link.as_str())
    }

    /// Inserts the track, or overwrites the stored link if the key exists.
    ///
    /// Returns `true` when a new record was added.
    pub fn upsert(&mut self, track: Track) -> bool {
        match self.index.get(&track.key()) {
            Some(&i) => {
                self.records[i].link = track.link;
                false
            }
            None => {
                self.push(track);
                true
            }
        }
    }

    fn push(&mut self, track: Track) {
        self.index.insert(track.key(), self.records.len());
        self.records.push(track);
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.save_to(&self.path)
    }

    /// Serializes into a temporary file next to `path`, then renames it over `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let stored: Vec<StoredTrack> = self.records.iter().cloned().map(Into::into).collect();

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, &stored)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Fs(e.error))?;

        log::info!("saved {} records to {}", stored.len(), path.display());
        Ok(())
    }
}

/// First of `path`, `<stem>_new.<ext>`, `<stem>_new_new.<ext>`, ... that does not exist.
pub fn next_available_path(path: &Path) -> Result<PathBuf, StoreError> {
    let mut candidate = path.to_path_buf();
    for _ in 0..MAX_NAME_ATTEMPTS {
        if !candidate.exists() {
            return Ok(candidate);
        }
        candidate = with_new_suffix(&candidate);
    }
    Err(StoreError::NamesExhausted {
        path: path.to_path_buf(),
        attempts: MAX_NAME_ATTEMPTS,
    })
}

fn with_new_suffix(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_stem().unwrap_or_default().to_os_string();
    name.push(NEW_SUFFIX);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}
