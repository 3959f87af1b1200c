//! The corpus provider contract and a directory-backed implementation.
//!
//! Text ingestion and lemmatization live upstream of this crate; a
//! [`CorpusProvider`] only has to enumerate a language's texts (with enough
//! metadata to checksum them) and hand back their annotated units.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{IntertextError, Result};
use crate::language::Language;
use crate::unit::TextUnit;

/// Identity of one corpus text file, used for staleness checksums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusFileMeta {
    /// File name within the language directory.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in seconds since the epoch.
    pub mtime: i64,
}

/// Supplies annotated texts for a corpus, one directory of texts per
/// language.
pub trait CorpusProvider: Send + Sync {
    /// Enumerate the texts available for a language.
    fn manifest(&self, language: Language) -> Result<Vec<CorpusFileMeta>>;

    /// Read the annotated units of one text.
    fn read_units(&self, language: Language, filename: &str) -> Result<Vec<TextUnit>>;
}

/// A corpus rooted at a directory with one subdirectory per language.
///
/// Text files are plain UTF-8, one unit per line:
///
/// ```text
/// <locus>\t<word> <word> ...
/// ```
///
/// A word written as `surface:lemma` carries an explicit lemma annotation;
/// a bare word lemmatizes to its own normalized form. Lines without a tab
/// take their line number as the locus.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
}

impl DirectoryCorpus {
    /// Create a provider over `root`, which holds one subdirectory per
    /// language (`latin/`, `greek/`, …).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryCorpus { root: root.into() }
    }

    fn language_dir(&self, language: Language) -> PathBuf {
        self.root.join(language.name())
    }

    fn parse_line(line: &str, line_number: usize, language: Language) -> Option<TextUnit> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (locus, body) = match line.split_once('\t') {
            Some((locus, body)) => (locus.trim().to_string(), body),
            None => (format!("{line_number}"), line),
        };

        let mut tokens = Vec::new();
        let mut lemmas = Vec::new();
        for word in body.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric() && c != ':');
            if word.is_empty() {
                continue;
            }
            match word.split_once(':') {
                Some((surface, lemma)) if !surface.is_empty() => {
                    tokens.push(surface.to_string());
                    lemmas.push(language.normalize(lemma));
                }
                _ => {
                    let surface = word.trim_matches(':');
                    if surface.is_empty() {
                        continue;
                    }
                    tokens.push(surface.to_string());
                    lemmas.push(language.normalize(surface));
                }
            }
        }

        if tokens.is_empty() {
            return None;
        }
        Some(TextUnit {
            locus,
            tokens,
            lemmas,
            pos_tags: None,
        })
    }
}

impl CorpusProvider for DirectoryCorpus {
    fn manifest(&self, language: Language) -> Result<Vec<CorpusFileMeta>> {
        let dir = self.language_dir(language);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let metadata = entry.metadata()?;
            let mtime = metadata
                .modified()?
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            files.push(CorpusFileMeta {
                filename: filename.to_string(),
                size: metadata.len(),
                mtime,
            });
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    fn read_units(&self, language: Language, filename: &str) -> Result<Vec<TextUnit>> {
        let path = self.language_dir(language).join(filename);
        let content = fs::read_to_string(&path).map_err(|e| {
            IntertextError::corpus(format!("cannot read {}: {e}", path.display()))
        })?;

        let mut units = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            match Self::parse_line(line, line_number + 1, language) {
                Some(unit) => units.push(unit),
                None if line.trim().is_empty() => {}
                None => warn!("{filename}:{}: skipping malformed line", line_number + 1),
            }
        }
        Ok(units)
    }
}

/// Derive `(author, title)` from a corpus filename such as
/// `vergilius.aeneid.tess`.
pub fn author_title_from_filename(filename: &str) -> (String, String) {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    match stem.split_once('.') {
        Some((author, title)) => (author.to_string(), title.to_string()),
        None => (String::new(), stem.to_string()),
    }
}
