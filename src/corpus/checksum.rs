//! Corpus staleness checksums and segmented-text de-duplication.

use lazy_static::lazy_static;
use regex::Regex;

use crate::corpus::provider::CorpusFileMeta;

lazy_static! {
    /// Matches segment markers in filenames, e.g. `vergilius.aeneid.part.1`.
    static ref PART_MARKER: Regex = Regex::new(r"(?i)[._\- ]part[._\- ]?\d+").unwrap();
}

/// Checksum over a corpus manifest.
///
/// Computed from the sorted set of `(filename, size, mtime)` tuples, so any
/// added, removed, resized, or touched text changes the value. Used by the
/// frequency caches to detect staleness; there is no dirty flag.
pub fn corpus_checksum(files: &[CorpusFileMeta]) -> u32 {
    let mut sorted: Vec<&CorpusFileMeta> = files.iter().collect();
    sorted.sort_by(|a, b| a.filename.cmp(&b.filename));

    let mut hasher = crc32fast::Hasher::new();
    for file in sorted {
        hasher.update(file.filename.as_bytes());
        hasher.update(&file.size.to_le_bytes());
        hasher.update(&file.mtime.to_le_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}

/// Drop segmented ("part N") versions of a text when the whole-text
/// counterpart is also present, so segmented texts are not double-counted.
pub fn dedup_segmented(files: Vec<CorpusFileMeta>) -> Vec<CorpusFileMeta> {
    let stems: Vec<String> = files.iter().map(|f| stem_of(&f.filename)).collect();

    files
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            let stem = &stems[*idx];
            let stripped = PART_MARKER.replace_all(stem, "").to_string();
            if stripped == *stem {
                return true;
            }
            // Keep the part only when no whole-text counterpart exists.
            !stems
                .iter()
                .enumerate()
                .any(|(other, s)| other != *idx && *s == stripped)
        })
        .map(|(_, f)| f.clone())
        .collect()
}

fn stem_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _ext)) => stem.to_string(),
        None => filename.to_string(),
    }
}
