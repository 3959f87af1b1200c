//! Language-specific orthographic normalization and base stopword lists.
//!
//! Every feature string that enters the engine (lemmas, surface tokens,
//! stopwords, index queries) passes through [`Language::normalize`] first, so
//! matching and frequency lookup are insensitive to orthographic variation:
//!
//! - Latin: lowercased, `v` folded to `u`, `j` folded to `i`
//! - Greek: lowercased, diacritics stripped (NFD), final sigma folded
//! - English: lowercased

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{IntertextError, Result};

/// Supported corpus languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Classical Latin.
    #[default]
    Latin,
    /// Ancient Greek.
    Greek,
    /// English.
    English,
}

impl Language {
    /// Parse a language from its lowercase name.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "latin" | "la" => Ok(Language::Latin),
            "greek" | "grc" => Ok(Language::Greek),
            "english" | "en" => Ok(Language::English),
            other => Err(IntertextError::invalid_argument(format!(
                "Unknown language: {other}"
            ))),
        }
    }

    /// Directory / cache-file name for this language.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Latin => "latin",
            Language::Greek => "greek",
            Language::English => "english",
        }
    }

    /// Normalize a feature string for this language.
    pub fn normalize(&self, raw: &str) -> String {
        match self {
            Language::Latin => raw
                .to_lowercase()
                .chars()
                .map(|c| match c {
                    'v' => 'u',
                    'j' => 'i',
                    c => c,
                })
                .collect(),
            Language::Greek => raw
                .to_lowercase()
                .nfd()
                .filter(|c| !is_combining_mark(*c))
                .map(|c| if c == 'ς' { 'σ' } else { c })
                .collect(),
            Language::English => raw.to_lowercase(),
        }
    }

    /// Spelling variants of a normalized query feature.
    ///
    /// Index postings may carry lemmas from lemmatizers that prefer `v`/`j`
    /// spellings, so a Latin lookup expands the canonical `u`/`i` form by
    /// substituting each foldable position independently. The canonical form
    /// is always first; the expansion is capped to keep pathological inputs
    /// bounded.
    pub fn query_variants(&self, normalized: &str) -> Vec<String> {
        const MAX_VARIANTS: usize = 16;

        if *self != Language::Latin {
            return vec![normalized.to_string()];
        }

        let mut variants: Vec<String> = vec![String::new()];
        for c in normalized.chars() {
            let alternative = match c {
                'u' => Some('v'),
                'i' => Some('j'),
                _ => None,
            };
            let mut next = Vec::with_capacity(variants.len() * 2);
            for prefix in &variants {
                let mut with_canonical = prefix.clone();
                with_canonical.push(c);
                next.push(with_canonical);
                if let Some(alt) = alternative {
                    if next.len() < MAX_VARIANTS {
                        let mut with_alt = prefix.clone();
                        with_alt.push(alt);
                        next.push(with_alt);
                    }
                }
            }
            next.truncate(MAX_VARIANTS);
            variants = next;
        }
        variants
    }

    /// The built-in base stopword list for this language, already normalized.
    pub fn base_stopwords(&self) -> &'static HashSet<String> {
        match self {
            Language::Latin => &LATIN_STOPWORDS,
            Language::Greek => &GREEK_STOPWORDS,
            Language::English => &ENGLISH_STOPWORDS,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn normalized_set(language: Language, words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| language.normalize(w)).collect()
}

lazy_static! {
    static ref LATIN_STOPWORDS: HashSet<String> = normalized_set(
        Language::Latin,
        &[
            "qui", "quis", "et", "sum", "in", "is", "non", "hic", "ego", "ut", "cum", "a", "ab",
            "si", "ad", "ille", "tu", "ne", "sed", "nos", "atque", "de", "ex", "per", "quod",
        ],
    );
    static ref GREEK_STOPWORDS: HashSet<String> = normalized_set(
        Language::Greek,
        &[
            "ὁ", "καί", "δέ", "τίς", "τις", "εἰμί", "ὅς", "ἐν", "ἐπί", "αὐτός", "οὐ", "γάρ",
            "τε", "μέν", "οὗτος", "ἀλλά", "εἰς", "σύ", "ἐγώ", "πρός", "ἐκ", "ἄν",
        ],
    );
    static ref ENGLISH_STOPWORDS: HashSet<String> = normalized_set(
        Language::English,
        &[
            "the", "of", "and", "a", "an", "to", "in", "is", "it", "that", "was", "he", "she",
            "for", "on", "are", "as", "with", "his", "her", "they", "at", "be", "this", "have",
            "from", "or", "had", "by", "not", "but",
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Language::parse("latin").unwrap(), Language::Latin);
        assert_eq!(Language::parse("GRC").unwrap(), Language::Greek);
        assert!(Language::parse("klingon").is_err());
    }

    #[test]
    fn test_latin_normalization() {
        assert_eq!(Language::Latin.normalize("Vergilius"), "uergilius");
        assert_eq!(Language::Latin.normalize("Iuppiter"), "iuppiter");
        assert_eq!(Language::Latin.normalize("jam"), "iam");
    }

    #[test]
    fn test_greek_normalization() {
        assert_eq!(Language::Greek.normalize("μῆνιν"), "μηνιν");
        assert_eq!(Language::Greek.normalize("ἄειδε"), "αειδε");
        // Final sigma folds to medial sigma.
        assert_eq!(Language::Greek.normalize("θεός"), "θεοσ");
    }

    #[test]
    fn test_latin_query_variants() {
        let variants = Language::Latin.query_variants("uirtus");
        assert_eq!(variants[0], "uirtus");
        assert!(variants.contains(&"virtus".to_string()));
        assert!(variants.contains(&"ujrtus".to_string()));
        // No u or i means no expansion.
        assert_eq!(Language::Latin.query_variants("arma").len(), 1);
    }

    #[test]
    fn test_base_stopwords_normalized() {
        assert!(Language::Latin.base_stopwords().contains("et"));
        // Greek entries are stored without diacritics.
        assert!(Language::Greek.base_stopwords().contains("και"));
        assert!(!Language::Greek.base_stopwords().contains("καί"));
    }
}
