//! Module to find history exports in the file system

use walkdir::WalkDir;

use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use crate::history::error::HistoryError;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HistoryFile {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Returns the most recently modified regular file directly inside `dir`.
///
/// Entries that cannot be read are logged and skipped.
pub fn most_recent(dir: &Path) -> Result<HistoryFile, HistoryError> {
    let dir_str = dir.to_string_lossy();

    let candidates = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("error while scanning dir {dir_str}, skipping an entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let modified = e
                .metadata()
                .map_err(std::io::Error::from)
                .and_then(|m| m.modified());
            (e.into_path(), modified)
        });

    newest(candidates).ok_or_else(|| HistoryError::NoHistoryFilesFound {
        dir: dir.to_path_buf(),
    })
}

fn newest<I>(candidates: I) -> Option<HistoryFile>
where
    I: IntoIterator<Item = (PathBuf, std::io::Result<SystemTime>)>,
{
    candidates
        .into_iter()
        .filter_map(|(path, modified)| match modified {
            Ok(modified) => Some(HistoryFile { path, modified }),
            Err(err) => {
                log::warn!("cannot read modification time of {}, skipping: {err}", path.display());
                None
            }
        })
        .max_by_key(|f| f.modified)
}

/// Joins bare file names onto the history directory, leaves anything with a directory part alone.
pub fn resolve_name(dir: Option<&Path>, name: &Path) -> PathBuf {
    match dir {
        Some(dir) if name.parent().is_none_or(|p| p.as_os_str().is_empty()) => dir.join(name),
        _ => name.to_path_buf(),
    }
}
