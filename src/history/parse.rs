use crate::{domain::track::Track, history::error::HistoryError};

const TITLE: usize = 2;
const ARTIST: usize = 3;
const ALBUM: usize = 4;
const LABEL: usize = 5;

pub const MIN_FIELDS: usize = LABEL + 1;

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

/// Decodes a UTF-16 export. Little-endian is assumed when there is no byte order mark.
pub fn decode_utf16(bytes: &[u8]) -> Result<String, HistoryError> {
    let (body, big_endian) = match bytes {
        [a, b, rest @ ..] if [*a, *b] == BOM_LE => (rest, false),
        [a, b, rest @ ..] if [*a, *b] == BOM_BE => (rest, true),
        _ => (bytes, false),
    };

    if body.len() % 2 != 0 {
        return Err(HistoryError::Encoding(format!(
            "odd number of bytes ({})",
            body.len()
        )));
    }

    let units = body.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });

    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| HistoryError::Encoding(e.to_string()))
}

/// Parses one tab-separated record. `line` is 1-based and only used for errors.
pub fn parse_record(line: usize, raw: &str) -> Result<Track, HistoryError> {
    let raw = raw.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = raw.split('\t').collect();

    if fields.len() < MIN_FIELDS {
        return Err(HistoryError::MalformedRecord {
            line,
            found: fields.len(),
            expected: MIN_FIELDS,
        });
    }

    Ok(Track {
        title: fields[TITLE].to_string(),
        artist: fields[ARTIST].to_string(),
        album: fields[ALBUM].to_string(),
        label: fields[LABEL].to_string(),
        link: String::new(),
    })
}

/// Parses every line, failing on the first malformed one.
///
/// The first record is the export's header row. It is returned like any other
/// record; callers skip it before resolving.
pub fn parse_lines<'a, I>(lines: I) -> Result<Vec<Track>, HistoryError>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| parse_record(idx + 1, raw))
        .collect()
}
