//! Lemma → location posting store for corpus-scale lookup.
//!
//! One physical store per language, holding two tables:
//!
//! - `texts.json` — `(text_id, filename, author, title, line_count)`
//! - `postings.jsonl` — one `(lemma, text_id, unit_ref, positions)` record
//!   per line
//!
//! Postings are append-only at indexing time and read-only during search.
//! Indexing is idempotent per text: re-indexing an already-indexed filename
//! is a no-op, and single texts can be added incrementally without a full
//! rebuild. The handle has an explicit open/commit lifecycle and is owned by
//! [`CorpusIndexService`](crate::corpus::CorpusIndexService).

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::corpus::frequency::{load_json, store_json};
use crate::error::{IntertextError, Result};
use crate::language::Language;
use crate::unit::TextUnit;

/// Metadata for one indexed text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEntry {
    /// Index-local text identifier.
    pub text_id: u32,
    /// Corpus filename the text was indexed from.
    pub filename: String,
    /// Author, derived from the filename or supplied by the caller.
    pub author: String,
    /// Work title.
    pub title: String,
    /// Number of units indexed.
    pub line_count: u32,
}

/// One posting: the locations of a lemma within one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLocation {
    /// Text the unit belongs to.
    pub text_id: u32,
    /// Locus reference of the unit.
    pub unit_ref: String,
    /// Token positions of the lemma within the unit.
    pub positions: Vec<u32>,
}

/// Serialized posting line in `postings.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PostingRecord {
    lemma: String,
    text_id: u32,
    unit_ref: String,
    positions: Vec<u32>,
}

/// Result of a single-lemma lookup.
///
/// Locations found through spelling-variant expansion are reported under the
/// canonical queried lemma.
#[derive(Debug, Clone)]
pub struct LemmaHits {
    /// The normalized query lemma.
    pub lemma: String,
    /// Every location attesting the lemma or one of its variants.
    pub locations: Vec<PostingLocation>,
}

/// One location satisfying a multi-lemma co-occurrence query.
#[derive(Debug, Clone)]
pub struct CoOccurrence {
    /// Text the unit belongs to.
    pub text_id: u32,
    /// Locus reference of the unit.
    pub unit_ref: String,
    /// Canonical matched lemmas and their positions.
    pub matched: BTreeMap<String, Vec<u32>>,
    /// Span over all matched positions.
    pub span: u32,
}

/// An open per-language inverted index.
pub struct IndexHandle {
    dir: PathBuf,
    language: Language,
    texts: Vec<TextEntry>,
    by_filename: AHashMap<String, u32>,
    postings: AHashMap<String, Vec<PostingLocation>>,
    dirty: bool,
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("dir", &self.dir)
            .field("language", &self.language)
            .field("texts", &self.texts.len())
            .field("lemmas", &self.postings.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl IndexHandle {
    /// Open (or create) the index stored under `dir`.
    ///
    /// Malformed posting lines are skipped with a warning rather than
    /// failing the open, so a partially written store degrades to a smaller
    /// index instead of an unusable one.
    pub fn open(dir: impl Into<PathBuf>, language: Language) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let texts: Vec<TextEntry> = load_json(&dir.join("texts.json")).unwrap_or_default();
        let by_filename = texts
            .iter()
            .map(|t| (t.filename.clone(), t.text_id))
            .collect();

        let mut postings: AHashMap<String, Vec<PostingLocation>> = AHashMap::new();
        let postings_path = dir.join("postings.jsonl");
        if postings_path.is_file() {
            let reader = BufReader::new(fs::File::open(&postings_path)?);
            for (line_number, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<PostingRecord>(&line) {
                    Ok(record) => {
                        postings
                            .entry(record.lemma)
                            .or_default()
                            .push(PostingLocation {
                                text_id: record.text_id,
                                unit_ref: record.unit_ref,
                                positions: record.positions,
                            });
                    }
                    Err(e) => warn!(
                        "{}:{}: skipping malformed posting: {e}",
                        postings_path.display(),
                        line_number + 1
                    ),
                }
            }
        }

        debug!(
            "index opened for {}: {} texts, {} lemmas",
            language,
            texts.len(),
            postings.len()
        );

        Ok(IndexHandle {
            dir,
            language,
            texts,
            by_filename,
            postings,
            dirty: false,
        })
    }

    /// Index one text incrementally.
    ///
    /// Returns the text's id. If `filename` is already indexed this is a
    /// no-op returning the existing id.
    pub fn add_text(
        &mut self,
        filename: &str,
        author: &str,
        title: &str,
        units: &[TextUnit],
    ) -> Result<u32> {
        if let Some(&existing) = self.by_filename.get(filename) {
            debug!("{filename} already indexed as text {existing}; skipping");
            return Ok(existing);
        }

        let text_id = self
            .texts
            .iter()
            .map(|t| t.text_id + 1)
            .max()
            .unwrap_or(0);

        for unit in units {
            for (lemma, positions) in unit.lemma_features(self.language) {
                self.postings
                    .entry(lemma)
                    .or_default()
                    .push(PostingLocation {
                        text_id,
                        unit_ref: unit.locus.clone(),
                        positions: positions.iter().map(|p| *p as u32).collect(),
                    });
            }
        }

        self.texts.push(TextEntry {
            text_id,
            filename: filename.to_string(),
            author: author.to_string(),
            title: title.to_string(),
            line_count: units.len() as u32,
        });
        self.by_filename.insert(filename.to_string(), text_id);
        self.dirty = true;

        info!(
            "indexed {} as text {} ({} units)",
            filename,
            text_id,
            units.len()
        );
        Ok(text_id)
    }

    /// Persist both tables if anything changed since the last commit.
    pub fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        store_json(&self.dir.join("texts.json"), &self.texts)?;

        let postings_path = self.dir.join("postings.jsonl");
        let tmp = postings_path.with_extension("jsonl.tmp");
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            // Deterministic file order keeps commits reproducible.
            let mut lemmas: Vec<&String> = self.postings.keys().collect();
            lemmas.sort();
            for lemma in lemmas {
                for location in &self.postings[lemma] {
                    let record = PostingRecord {
                        lemma: lemma.clone(),
                        text_id: location.text_id,
                        unit_ref: location.unit_ref.clone(),
                        positions: location.positions.clone(),
                    };
                    serde_json::to_writer(&mut writer, &record)?;
                    writer.write_all(b"\n")?;
                }
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &postings_path)?;

        self.dirty = false;
        Ok(())
    }

    /// Whether a filename has already been indexed.
    pub fn contains_text(&self, filename: &str) -> bool {
        self.by_filename.contains_key(filename)
    }

    /// The indexed text entries.
    pub fn texts(&self) -> &[TextEntry] {
        &self.texts
    }

    /// Metadata for one text id.
    pub fn text(&self, text_id: u32) -> Option<&TextEntry> {
        self.texts.iter().find(|t| t.text_id == text_id)
    }

    /// Number of distinct lemmas with postings.
    pub fn lemma_count(&self) -> usize {
        self.postings.len()
    }

    /// Look up one lemma.
    ///
    /// The query is normalized and expanded through the language's spelling
    /// variants (Latin u/v, i/j); all hits are reported under the canonical
    /// normalized form.
    pub fn lookup(&self, lemma: &str) -> LemmaHits {
        let canonical = self.language.normalize(lemma);
        let mut locations: Vec<PostingLocation> = Vec::new();
        for variant in self.language.query_variants(&canonical) {
            if let Some(found) = self.postings.get(&variant) {
                locations.extend(found.iter().cloned());
            }
        }
        locations.sort_by(|a, b| {
            a.text_id
                .cmp(&b.text_id)
                .then_with(|| a.unit_ref.cmp(&b.unit_ref))
        });
        locations.dedup();
        LemmaHits {
            lemma: canonical,
            locations,
        }
    }

    /// Find locations where at least `min_matched` of the queried lemmas
    /// co-occur, optionally constrained to a maximum span over all matched
    /// positions.
    pub fn co_occurrences(
        &self,
        lemmas: &[&str],
        min_matched: usize,
        max_span: Option<u32>,
    ) -> Result<Vec<CoOccurrence>> {
        if min_matched == 0 {
            return Err(IntertextError::invalid_argument(
                "co-occurrence query requires min_matched >= 1",
            ));
        }

        // (text_id, unit_ref) -> canonical lemma -> positions
        let mut grouped: AHashMap<(u32, String), BTreeMap<String, Vec<u32>>> = AHashMap::new();
        for lemma in lemmas {
            let hits = self.lookup(lemma);
            for location in hits.locations {
                grouped
                    .entry((location.text_id, location.unit_ref))
                    .or_default()
                    .entry(hits.lemma.clone())
                    .or_default()
                    .extend(location.positions);
            }
        }

        let mut results: Vec<CoOccurrence> = grouped
            .into_iter()
            .filter(|(_, matched)| matched.len() >= min_matched)
            .map(|((text_id, unit_ref), matched)| {
                let all: Vec<u32> = matched.values().flatten().copied().collect();
                let span = match (all.iter().min(), all.iter().max()) {
                    (Some(min), Some(max)) if all.len() >= 2 => (max - min).max(1),
                    _ => 1,
                };
                CoOccurrence {
                    text_id,
                    unit_ref,
                    matched,
                    span,
                }
            })
            .filter(|c| max_span.is_none_or(|limit| c.span <= limit))
            .collect();

        results.sort_by(|a, b| {
            a.text_id
                .cmp(&b.text_id)
                .then_with(|| a.unit_ref.cmp(&b.unit_ref))
        });
        Ok(results)
    }
}

/// Location of an index for one language under a data directory.
pub fn index_dir(data_dir: &Path, language: Language) -> PathBuf {
    data_dir.join("index").join(language.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(locus: &str, lemmas: &[&str]) -> TextUnit {
        TextUnit::from_tokens(
            locus,
            lemmas.iter().map(|s| s.to_string()).collect(),
            Language::Latin,
        )
    }

    fn sample_index(dir: &Path) -> IndexHandle {
        let mut index = IndexHandle::open(dir, Language::Latin).unwrap();
        index
            .add_text(
                "vergilius.aeneid.txt",
                "vergilius",
                "aeneid",
                &[
                    unit("1.1", &["arma", "uir", "cano"]),
                    unit("1.2", &["troia", "arma"]),
                ],
            )
            .unwrap();
        index
            .add_text(
                "lucanus.pharsalia.txt",
                "lucanus",
                "pharsalia",
                &[unit("1.1", &["bellum", "arma", "uir"])],
            )
            .unwrap();
        index
    }

    #[test]
    fn test_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample_index(dir.path());
        let hits = index.lookup("arma");
        assert_eq!(hits.lemma, "arma");
        assert_eq!(hits.locations.len(), 3);
    }

    #[test]
    fn test_lookup_variant_expansion() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = IndexHandle::open(dir.path(), Language::Latin).unwrap();
        // A text annotated with v-spelling lemmas.
        let raw = TextUnit::new(
            "1.1",
            vec!["virum".to_string()],
            vec!["vir".to_string()],
            None,
        )
        .unwrap();
        // Bypass normalization on purpose: postings carry what the
        // annotator wrote.
        index.postings.insert(
            "vir".to_string(),
            vec![PostingLocation {
                text_id: 0,
                unit_ref: raw.locus.clone(),
                positions: vec![0],
            }],
        );

        let hits = index.lookup("uir");
        assert_eq!(hits.lemma, "uir");
        assert_eq!(hits.locations.len(), 1);
    }

    #[test]
    fn test_add_text_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = sample_index(dir.path());
        let before = index.lookup("arma").locations.len();
        let id = index
            .add_text(
                "vergilius.aeneid.txt",
                "vergilius",
                "aeneid",
                &[unit("9.9", &["arma"])],
            )
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(index.lookup("arma").locations.len(), before);
    }

    #[test]
    fn test_commit_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut index = sample_index(dir.path());
            index.commit().unwrap();
        }
        let index = IndexHandle::open(dir.path(), Language::Latin).unwrap();
        assert_eq!(index.texts().len(), 2);
        assert_eq!(index.lookup("arma").locations.len(), 3);
        // Incremental add continues from the persisted id space.
        let mut index = index;
        let id = index
            .add_text("ovidius.met.txt", "ovidius", "met", &[unit("1.1", &["forma"])])
            .unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn test_co_occurrences() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample_index(dir.path());
        let results = index.co_occurrences(&["arma", "uir"], 2, None).unwrap();
        let refs: Vec<(u32, &str)> = results
            .iter()
            .map(|c| (c.text_id, c.unit_ref.as_str()))
            .collect();
        assert_eq!(refs, vec![(0, "1.1"), (1, "1.1")]);
        assert!(results.iter().all(|c| c.matched.len() == 2));
    }

    #[test]
    fn test_co_occurrence_span_constraint() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = IndexHandle::open(dir.path(), Language::Latin).unwrap();
        index
            .add_text(
                "t.txt",
                "",
                "t",
                &[unit(
                    "1.1",
                    &["arma", "x", "x", "x", "x", "x", "x", "uir"],
                )],
            )
            .unwrap();
        let within = index.co_occurrences(&["arma", "uir"], 2, Some(10)).unwrap();
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].span, 7);
        let outside = index.co_occurrences(&["arma", "uir"], 2, Some(3)).unwrap();
        assert!(outside.is_empty());
    }

    #[test]
    fn test_malformed_posting_line_skipped() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut index = sample_index(dir.path());
            index.commit().unwrap();
        }
        // Append garbage to the postings file.
        let path = dir.path().join("postings.jsonl");
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{ not a posting\n");
        fs::write(&path, content).unwrap();

        let index = IndexHandle::open(dir.path(), Language::Latin).unwrap();
        assert_eq!(index.lookup("arma").locations.len(), 3);
    }
}
