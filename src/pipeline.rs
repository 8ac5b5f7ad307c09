//! Resolve-and-cache pass over a parsed history

use crate::{
    domain::track::Track,
    resolver::{LinkResolver, Resolution},
    storage::{error::StoreError, store::LinkStore},
};

/// Result of one pass: the enriched tracks, header excluded, plus counters.
#[derive(Debug, Default)]
pub struct RunReport {
    pub tracks: Vec<Track>,
    /// answered by the store, including cached "not found" entries
    pub cached: usize,
    /// sent to the resolver
    pub searched: usize,
    /// searches that produced a link
    pub found: usize,
}

impl RunReport {
    pub fn not_found(&self) -> usize {
        self.searched - self.found
    }
}

/// Runs tracks through the store and the resolver, one at a time.
pub struct ResolutionPipeline<'a, R: LinkResolver + ?Sized> {
    resolver: &'a R,
    save_every: usize,
}

impl<'a, R: LinkResolver + ?Sized> ResolutionPipeline<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self {
            resolver,
            save_every: 0,
        }
    }

    /// Also save the store after every `n` searches. 0 disables intermediate saves.
    pub fn save_every(mut self, n: usize) -> Self {
        self.save_every = n;
        self
    }

    /// Enriches `tracks` (first record is the header and is dropped) and saves the store.
    ///
    /// Keys already in the store are never searched again, even when their
    /// cached link is empty. The store is only written after a completed
    /// upsert, so every save sees a consistent snapshot.
    pub fn run(&self, tracks: Vec<Track>, store: &mut LinkStore) -> Result<RunReport, StoreError> {
        let mut report = RunReport::default();

        for mut track in tracks.into_iter().skip(1) {
            if let Some(link) = store.lookup(&track.artist, &track.title) {
                log::debug!("cached: {} -> {:?}", track.key(), link);
                track.link = link.to_string();
                report.cached += 1;
                report.tracks.push(track);
                continue;
            }

            println!("Searching:  {} - {}", track.artist, track.title);
            let resolution = self.resolver.resolve(&track.artist, &track.title);
            match &resolution {
                Resolution::Found(link) => {
                    println!("    link found: {link}");
                    report.found += 1;
                }
                Resolution::Unresolved => println!("    (no link found)"),
            }
            report.searched += 1;

            track.link = resolution.into_link();
            store.upsert(track.clone());
            report.tracks.push(track);

            if self.save_every > 0 && report.searched % self.save_every == 0 {
                store.save()?;
            }
        }

        store.save()?;
        log::info!(
            "{} tracks: {} cached, {} searched, {} found",
            report.tracks.len(),
            report.cached,
            report.searched,
            report.found
        );
        Ok(report)
    }
}

/// Fills links from the store only. Tracks the store does not know keep an empty link.
pub fn enrich_from_store(tracks: Vec<Track>, store: &LinkStore) -> Vec<Track> {
    tracks
        .into_iter()
        .skip(1)
        .map(|mut track| {
            if let Some(link) = store.lookup(&track.artist, &track.title) {
                track.link = link.to_string();
            }
            track
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap, fs, path::Path};

    use tempfile::tempdir;

    use crate::{
        domain::track::{Track, TrackKey},
        history::{self, error::HistoryError, parse::parse_lines},
        pipeline::{ResolutionPipeline, enrich_from_store},
        resolver::{LinkResolver, Resolution},
        storage::store::LinkStore,
    };

    const HEADER: &str = "#\tArtwork\tTrack Title\tArtist\tAlbum\tLabel";

    /// Resolver answering from a fixed table and recording every call
    #[derive(Default)]
    struct MockResolver {
        links: HashMap<TrackKey, String>,
        calls: RefCell<Vec<TrackKey>>,
    }

    impl MockResolver {
        fn with_link(mut self, artist: &str, title: &str, link: &str) -> Self {
            self.links.insert(TrackKey::new(artist, title), link.to_string());
            self
        }

        fn calls(&self) -> Vec<TrackKey> {
            self.calls.borrow().clone()
        }
    }

    impl LinkResolver for MockResolver {
        fn resolve(&self, artist: &str, title: &str) -> Resolution {
            let key = TrackKey::new(artist, title);
            self.calls.borrow_mut().push(key.clone());
            match self.links.get(&key) {
                Some(link) => Resolution::Found(link.clone()),
                None => Resolution::Unresolved,
            }
        }
    }

    fn history(rows: &[&str]) -> Vec<Track> {
        let lines = std::iter::once(HEADER).chain(rows.iter().copied());
        parse_lines(lines).unwrap()
    }

    fn stored(artist: &str, title: &str, link: &str) -> Track {
        Track {
            artist: artist.into(),
            title: title.into(),
            link: link.into(),
            ..Track::default()
        }
    }

    fn write_utf16(path: &Path, text: &str) {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn cached_link_is_used_without_resolving() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let mut store = LinkStore::empty(tmp.path().join("db.json"));
        store.upsert(stored(
            "Four Tet",
            "Parallel",
            "https://x.bandcamp.com/track/parallel",
        ));
        let resolver = MockResolver::default();

        let report = ResolutionPipeline::new(&resolver)
            .run(history(&["1\t\tParallel\tFour Tet\tParallel\tText"]), &mut store)?;

        assert!(resolver.calls().is_empty());
        assert_eq!(report.tracks.len(), 1);
        assert_eq!(report.tracks[0].link, "https://x.bandcamp.com/track/parallel");
        assert_eq!(report.tracks[0].album, "Parallel");
        assert_eq!(report.cached, 1);
        assert_eq!(report.searched, 0);
        Ok(())
    }

    #[test]
    fn unresolved_is_cached_and_not_searched_again() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let db = tmp.path().join("db.json");
        let rows = ["1\t\tUntitled\tUnknown Artist\t\t"];

        let resolver = MockResolver::default();
        let mut store = LinkStore::empty(&db);
        let report = ResolutionPipeline::new(&resolver).run(history(&rows), &mut store)?;

        assert_eq!(resolver.calls(), vec![TrackKey::new("Unknown Artist", "Untitled")]);
        assert_eq!(report.not_found(), 1);

        let mut reloaded = LinkStore::load(&db)?;
        assert_eq!(reloaded.lookup("Unknown Artist", "Untitled"), Some(""));

        let second = MockResolver::default();
        let report = ResolutionPipeline::new(&second).run(history(&rows), &mut reloaded)?;

        assert!(second.calls().is_empty());
        assert_eq!(report.cached, 1);
        assert_eq!(report.tracks[0].link, "");
        Ok(())
    }

    #[test]
    fn header_is_never_resolved_or_returned() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let mut store = LinkStore::empty(tmp.path().join("db.json"));
        let resolver = MockResolver::default();

        let report = ResolutionPipeline::new(&resolver)
            .run(history(&["1\t\tTitle\tArtist\tAlbum\tLabel"]), &mut store)?;

        assert_eq!(resolver.calls(), vec![TrackKey::new("Artist", "Title")]);
        assert!(report.tracks.iter().all(|t| t.title != "Track Title"));
        assert_eq!(store.lookup("Artist", "Track Title"), None);
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn repeated_track_is_searched_once() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let mut store = LinkStore::empty(tmp.path().join("db.json"));
        let resolver =
            MockResolver::default().with_link("A", "B", "https://a.bandcamp.com/track/b");

        let report = ResolutionPipeline::new(&resolver).run(
            history(&["1\t\tB\tA\t\t", "2\t\tC\tA\t\t", "3\t\tB\tA\t\t"]),
            &mut store,
        )?;

        assert_eq!(resolver.calls().len(), 2);
        assert_eq!(report.tracks.len(), 3);
        assert_eq!(report.tracks[2].link, "https://a.bandcamp.com/track/b");
        assert_eq!(store.len(), 2);
        Ok(())
    }

    #[test]
    fn second_run_on_warm_store_is_idempotent() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let db = tmp.path().join("db.json");
        let rows = ["1\t\tParallel\tFour Tet\t\t", "2\t\tUntitled\tUnknown Artist\t\t"];
        let resolver = MockResolver::default().with_link(
            "Four Tet",
            "Parallel",
            "https://x.bandcamp.com/track/parallel",
        );

        let mut store = LinkStore::empty(&db);
        let first = ResolutionPipeline::new(&resolver).run(history(&rows), &mut store)?;
        let saved = fs::read_to_string(&db)?;

        let mut store = LinkStore::load(&db)?;
        let again = MockResolver::default();
        let second = ResolutionPipeline::new(&again).run(history(&rows), &mut store)?;

        assert!(again.calls().is_empty());
        assert_eq!(first.tracks, second.tracks);
        assert_eq!(fs::read_to_string(&db)?, saved);
        Ok(())
    }

    #[test]
    fn intermediate_saves_persist_progress() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let db = tmp.path().join("db.json");

        /// Checks the store file after every call
        struct PeekingResolver<'a> {
            db: &'a Path,
            seen: RefCell<Vec<usize>>,
        }

        impl LinkResolver for PeekingResolver<'_> {
            fn resolve(&self, _artist: &str, _title: &str) -> Resolution {
                let on_disk = LinkStore::load(self.db).map(|s| s.len()).unwrap_or(0);
                self.seen.borrow_mut().push(on_disk);
                Resolution::Unresolved
            }
        }

        let resolver = PeekingResolver {
            db: &db,
            seen: RefCell::new(vec![]),
        };
        let mut store = LinkStore::empty(&db);
        ResolutionPipeline::new(&resolver)
            .save_every(2)
            .run(history(&["1\t\tA\tX\t\t", "2\t\tB\tX\t\t", "3\t\tC\tX\t\t"]), &mut store)?;

        assert_eq!(*resolver.seen.borrow(), vec![0, 0, 2]);
        assert_eq!(LinkStore::load(&db)?.len(), 3);
        Ok(())
    }

    #[test]
    fn malformed_history_leaves_store_untouched() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let db = tmp.path().join("db.json");
        let mut store = LinkStore::empty(&db);
        store.upsert(stored("A", "B", "https://a.bandcamp.com/track/b"));
        store.save()?;
        let before = fs::read_to_string(&db)?;

        let file = tmp.path().join("HISTORY.txt");
        write_utf16(
            &file,
            &format!("{HEADER}\r\n1\t\tTitle\tArtist\tAlbum\tLabel\r\n2\t\tShort\tRow\r\n"),
        );

        let err = history::read_tracks(&file).unwrap_err();

        assert!(matches!(err, HistoryError::MalformedRecord { line: 3, found: 4, .. }));
        assert_eq!(fs::read_to_string(&db)?, before);
        Ok(())
    }

    #[test]
    fn utf16_history_file_end_to_end() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let file = tmp.path().join("HISTORY.txt");
        write_utf16(
            &file,
            &format!("{HEADER}\r\n1\t\tJoga\tBjörk\tHomogenic\tOne Little Indian\r\n"),
        );
        let resolver =
            MockResolver::default().with_link("Björk", "Joga", "https://bjork.bandcamp.com/track/joga");
        let mut store = LinkStore::empty(tmp.path().join("db.json"));

        let tracks = history::read_tracks(&file)?;
        let report = ResolutionPipeline::new(&resolver).run(tracks, &mut store)?;

        assert_eq!(report.tracks.len(), 1);
        assert_eq!(report.tracks[0].label, "One Little Indian");
        assert_eq!(report.found, 1);
        Ok(())
    }

    #[test]
    fn enrich_from_store_does_not_resolve() {
        let mut store = LinkStore::empty("unused.json");
        store.upsert(stored("A", "B", "https://a.bandcamp.com/track/b"));

        let tracks = enrich_from_store(history(&["1\t\tB\tA\t\t", "2\t\tC\tA\t\t"]), &store);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].link, "https://a.bandcamp.com/track/b");
        assert_eq!(tracks[1].link, "");
    }
}
