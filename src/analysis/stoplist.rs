//! Stoplist construction with automatic Zipf elbow detection.
//!
//! A stoplist is the set of high-frequency features excluded from
//! contributing to a match. It is derived per request from a frequency
//! counter over one of four bases (source text, target text, both, or the
//! whole corpus), cut automatically at the elbow of the rank/frequency
//! curve, then unioned with the built-in per-language list and any
//! caller-supplied custom stopwords.

use std::collections::HashSet;

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::corpus::FrequencyTable;
use crate::language::Language;
use crate::unit::TextUnit;

/// Which body of text the frequency counter is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoplistBasis {
    /// The source units only.
    Source,
    /// The target units only.
    Target,
    /// Source and target units combined.
    SourceTarget,
    /// The corpus-wide frequency table.
    #[default]
    Corpus,
}

/// Elbow search window for lemma features.
const LEMMA_MIN_STOPWORDS: usize = 10;
const LEMMA_MAX_STOPWORDS: usize = 50;

/// Elbow search window for surface-token features. Tokens fragment frequency
/// across inflected forms more than lemmas do, so the window is wider and a
/// flat high-frequency floor is unioned in.
const TOKEN_MIN_STOPWORDS: usize = 50;
const TOKEN_MAX_STOPWORDS: usize = 120;
const TOKEN_FREQUENCY_FLOOR: u64 = 40;

/// A resolved stoplist: the excluded feature set plus the size the
/// frequency-derived cut contributed (before base/custom unions).
#[derive(Debug, Clone, Default)]
pub struct Stoplist {
    words: HashSet<String>,
    declared_size: usize,
}

impl Stoplist {
    /// An empty stoplist.
    pub fn empty() -> Self {
        Stoplist::default()
    }

    /// Whether a normalized feature is stoplisted.
    pub fn contains(&self, feature: &str) -> bool {
        self.words.contains(feature)
    }

    /// Size of the frequency-derived cut (excluding base and custom words).
    pub fn declared_size(&self) -> usize {
        self.declared_size
    }

    /// Total number of excluded features.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the stoplist excludes nothing.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Builds per-request stoplists.
#[derive(Debug, Clone, Copy)]
pub struct StoplistBuilder {
    language: Language,
    /// Whether matching is on surface tokens (exact match) rather than lemmas.
    exact: bool,
}

impl StoplistBuilder {
    /// Create a builder for the given language and feature kind.
    pub fn new(language: Language, exact: bool) -> Self {
        StoplistBuilder { language, exact }
    }

    /// Build a stoplist.
    ///
    /// `size` follows the request convention: `0` selects the automatic
    /// elbow cut, a positive value is a fixed top-`size` cutoff, and `-1`
    /// disables the frequency-derived portion entirely (the built-in base
    /// list and `custom` words still apply).
    pub fn build(
        &self,
        basis: StoplistBasis,
        size: i64,
        source: &[TextUnit],
        target: &[TextUnit],
        corpus: Option<&FrequencyTable>,
        custom: &[String],
    ) -> Stoplist {
        let mut words: HashSet<String> = HashSet::new();
        let mut declared_size = 0;

        if size >= 0 {
            let counts = self.basis_counts(basis, source, target, corpus);
            let ranked = rank_features(&counts);

            let cut = if size > 0 {
                (size as usize).min(ranked.len())
            } else {
                self.automatic_cut(&ranked)
            };
            declared_size = cut;
            words.extend(ranked.iter().take(cut).map(|(f, _)| f.clone()));

            // Surface-token frequency is fragmented across inflected forms,
            // so a flat floor catches forms the elbow ranks too low.
            if self.exact {
                words.extend(
                    ranked
                        .iter()
                        .filter(|(_, count)| *count >= TOKEN_FREQUENCY_FLOOR)
                        .map(|(f, _)| f.clone()),
                );
            }
        }

        words.extend(self.language.base_stopwords().iter().cloned());
        words.extend(custom.iter().map(|w| self.language.normalize(w)));

        debug!(
            "stoplist built: basis {:?}, cut {}, total {} words",
            basis,
            declared_size,
            words.len()
        );

        Stoplist {
            words,
            declared_size,
        }
    }

    fn basis_counts(
        &self,
        basis: StoplistBasis,
        source: &[TextUnit],
        target: &[TextUnit],
        corpus: Option<&FrequencyTable>,
    ) -> AHashMap<String, u64> {
        match basis {
            StoplistBasis::Source => self.unit_counts(source),
            StoplistBasis::Target => self.unit_counts(target),
            StoplistBasis::SourceTarget => {
                let mut counts = self.unit_counts(source);
                for (feature, count) in self.unit_counts(target) {
                    *counts.entry(feature).or_insert(0) += count;
                }
                counts
            }
            StoplistBasis::Corpus => match corpus {
                Some(table) => table
                    .features()
                    .iter()
                    .map(|(f, c)| (f.clone(), *c))
                    .collect(),
                // No corpus table available; fall back to the request texts.
                None => {
                    debug!("corpus stoplist basis requested without a frequency table; falling back to source+target");
                    self.basis_counts(StoplistBasis::SourceTarget, source, target, None)
                }
            },
        }
    }

    fn unit_counts(&self, units: &[TextUnit]) -> AHashMap<String, u64> {
        let mut counts: AHashMap<String, u64> = AHashMap::new();
        for unit in units {
            let features = if self.exact {
                unit.token_features(self.language)
            } else {
                unit.lemma_features(self.language)
            };
            for (feature, positions) in features {
                *counts.entry(feature).or_insert(0) += positions.len() as u64;
            }
        }
        counts
    }

    fn automatic_cut(&self, ranked: &[(String, u64)]) -> usize {
        let (min_stopwords, max_stopwords) = if self.exact {
            (TOKEN_MIN_STOPWORDS, TOKEN_MAX_STOPWORDS)
        } else {
            (LEMMA_MIN_STOPWORDS, LEMMA_MAX_STOPWORDS)
        };
        zipf_elbow(ranked, min_stopwords, max_stopwords)
    }
}

/// Sort features by descending count; ties break lexicographically so the
/// ranking (and therefore the stoplist) is deterministic.
fn rank_features(counts: &AHashMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = counts
        .iter()
        .map(|(f, c)| (f.clone(), *c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Find the elbow of the rank/frequency curve.
///
/// Works on `(log(rank), log(freq))` points for features with nonzero
/// frequency. A reference line is drawn from the first point to the point at
/// index `min(len − 1, max_stopwords · 2)`; the elbow is the candidate index
/// in `[min_stopwords, min(end, max_stopwords))` with the greatest
/// perpendicular distance from that line, clamped into
/// `[min_stopwords, max_stopwords]`.
///
/// Returns the number of leading ranked features to treat as stopwords. When
/// the vocabulary is smaller than `min_stopwords` the whole vocabulary is
/// returned.
fn zipf_elbow(ranked: &[(String, u64)], min_stopwords: usize, max_stopwords: usize) -> usize {
    let points: Vec<(f64, f64)> = ranked
        .iter()
        .enumerate()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(rank, (_, count))| (((rank + 1) as f64).ln(), (*count as f64).ln()))
        .collect();

    if points.len() < min_stopwords {
        return points.len();
    }

    let end_idx = (points.len() - 1).min(max_stopwords * 2);
    let (ax, ay) = points[0];
    let (bx, by) = points[end_idx];
    let (dx, dy) = (bx - ax, by - ay);
    let line_len = (dx * dx + dy * dy).sqrt();
    if line_len == 0.0 {
        return min_stopwords.min(points.len());
    }
    let (ux, uy) = (dx / line_len, dy / line_len);

    let mut best_idx = min_stopwords;
    let mut best_distance = f64::NEG_INFINITY;
    for idx in min_stopwords..end_idx.min(max_stopwords) {
        let (px, py) = (points[idx].0 - ax, points[idx].1 - ay);
        // Perpendicular distance via vector projection onto the line.
        let along = px * ux + py * uy;
        let (rx, ry) = (px - along * ux, py - along * uy);
        let distance = (rx * rx + ry * ry).sqrt();
        if distance > best_distance {
            best_distance = distance;
            best_idx = idx;
        }
    }

    best_idx.clamp(min_stopwords, max_stopwords)
}
