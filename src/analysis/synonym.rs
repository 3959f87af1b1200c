//! Synonym expansion for synonym-basis matching.

use std::io::Read;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::language::Language;

/// A directed synonym table mapping a headword to its expansion set.
///
/// Both headwords and expansions are normalized on insertion so lookups can
/// use any orthographic variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynonymMap {
    language: Language,
    map: AHashMap<String, Vec<String>>,
}

impl SynonymMap {
    /// Create an empty map for a language.
    pub fn new(language: Language) -> Self {
        SynonymMap {
            language,
            map: AHashMap::new(),
        }
    }

    /// Build a map from `(headword, synonyms)` pairs.
    pub fn from_entries<I, S>(language: Language, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let mut map = SynonymMap::new(language);
        for (headword, synonyms) in entries {
            map.insert(headword, synonyms);
        }
        map
    }

    /// Load a map from a JSON document of shape `{"headword": ["syn", …]}`.
    pub fn from_reader<R: Read>(language: Language, reader: R) -> Result<Self> {
        let raw: AHashMap<String, Vec<String>> = serde_json::from_reader(reader)?;
        Ok(SynonymMap::from_entries(
            language,
            raw.into_iter()
                .map(|(k, v)| (k, v.into_iter().collect::<Vec<_>>())),
        ))
    }

    /// Insert a headword and its synonyms.
    pub fn insert<S: Into<String>>(&mut self, headword: S, synonyms: Vec<S>) {
        let headword = self.language.normalize(&headword.into());
        let entry = self.map.entry(headword).or_default();
        for synonym in synonyms {
            let normalized = self.language.normalize(&synonym.into());
            if !normalized.is_empty() && !entry.contains(&normalized) {
                entry.push(normalized);
            }
        }
    }

    /// The feature itself plus every synonym registered for it.
    pub fn expand<'a>(&'a self, feature: &'a str) -> impl Iterator<Item = &'a str> {
        std::iter::once(feature).chain(
            self.map
                .get(feature)
                .into_iter()
                .flat_map(|synonyms| synonyms.iter().map(|s| s.as_str())),
        )
    }

    /// Number of headwords with registered synonyms.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the map holds no synonyms.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_includes_self() {
        let map = SynonymMap::from_entries(
            Language::Latin,
            [("ensis", vec!["gladius", "ferrum"])],
        );
        let expanded: Vec<&str> = map.expand("ensis").collect();
        assert_eq!(expanded, vec!["ensis", "gladius", "ferrum"]);
    }

    #[test]
    fn test_unknown_feature_expands_to_itself() {
        let map = SynonymMap::new(Language::Latin);
        let expanded: Vec<&str> = map.expand("arma").collect();
        assert_eq!(expanded, vec!["arma"]);
    }

    #[test]
    fn test_entries_normalized() {
        let mut map = SynonymMap::new(Language::Latin);
        map.insert("Ensis", vec!["Gladius", "gladius"]);
        let expanded: Vec<&str> = map.expand("ensis").collect();
        // Duplicate after normalization collapses.
        assert_eq!(expanded, vec!["ensis", "gladius"]);
    }

    #[test]
    fn test_from_reader() {
        let json = r#"{"ensis": ["gladius"]}"#;
        let map = SynonymMap::from_reader(Language::Latin, json.as_bytes()).unwrap();
        assert_eq!(map.len(), 1);
        let expanded: Vec<&str> = map.expand("ensis").collect();
        assert!(expanded.contains(&"gladius"));
    }
}
