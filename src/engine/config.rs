//! The typed search configuration record.

use serde::{Deserialize, Serialize};

use crate::analysis::StoplistBasis;
use crate::error::{IntertextError, Result};
use crate::language::Language;
use crate::matching::MatchBasis;

/// Which frequency table feeds the IDF formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FreqBasis {
    /// Request-local counts over the two texts being searched.
    #[default]
    Texts,
    /// The corpus-wide frequency table.
    Corpus,
}

/// Immutable per-request settings with documented defaults.
///
/// Validated once at the engine boundary ([`SearchConfig::validate`]); the
/// matchers and scorers assume a valid record and never re-check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Match strategy.
    pub match_type: MatchBasis,
    /// Minimum number of shared features per candidate. Default `2`.
    pub min_matches: usize,
    /// Maximum span of matched positions within either unit. Default `999`.
    pub max_distance: usize,
    /// Maximum number of results returned. Default `500`.
    pub max_results: usize,
    /// Body of text the stoplist is derived from. Default corpus.
    pub stoplist_basis: StoplistBasis,
    /// Stoplist size: `0` = automatic elbow detection, `> 0` = fixed top-N
    /// cutoff, `-1` = disabled. Default `0`.
    pub stoplist_size: i64,
    /// Additional caller-supplied stopwords.
    pub custom_stopwords: Vec<String>,
    /// Corpus language.
    pub language: Language,
    /// Frequency basis for scoring. Default request-local.
    pub freq_basis: FreqBasis,

    /// Enable the POS agreement signal.
    pub use_pos: bool,
    /// Enable the matched-token edit-distance signal.
    pub use_edit_distance: bool,
    /// Enable the unit sound-similarity signal.
    pub use_sound: bool,
    /// Enable the external metrical signal.
    pub use_meter: bool,
    /// Enable the external syntactic signal.
    pub use_syntax: bool,

    /// Enable the bigram rarity bonus.
    pub bigram_boost: bool,
    /// Weight of each qualifying rare pair. Default `0.5`.
    pub bigram_weight: f64,
    /// Maximum intervening words between the members of a shared pair.
    /// Default `2`.
    pub bigram_window: usize,

    /// Minimum trigram Jaccard similarity for sound candidates. Default
    /// `0.4`.
    pub sound_floor: f64,
    /// Sound candidates kept per source unit. Default `10`.
    pub sound_top_n: usize,
    /// Minimum Levenshtein ratio for a fuzzy token pair. Default `0.7`.
    pub edit_min_ratio: f64,
    /// Minimum cosine similarity for semantic candidates. Default `0.5`.
    pub semantic_floor: f64,
    /// Semantic candidates kept per source unit. Default `10`.
    pub semantic_top_n: usize,
    /// Token-pair comparison ceiling for edit-distance matching. Default
    /// `5,000,000`.
    pub max_comparisons: u64,

    /// POS signal weight. Default `0.2`.
    pub pos_weight: f64,
    /// Minimum POS agreement before the signal contributes. Default `0.5`.
    pub pos_min_agreement: f64,
    /// Edit-distance signal weight. Default `0.2`.
    pub edit_weight: f64,
    /// Minimum matched-token similarity before the signal contributes.
    /// Default `0.5`.
    pub edit_min_similarity: f64,
    /// Sound signal weight. Default `0.2`.
    pub sound_weight: f64,
    /// Minimum sound similarity before the signal contributes. Default
    /// `0.4`.
    pub sound_min_similarity: f64,
    /// Metrical signal weight. Default `0.3`.
    pub meter_weight: f64,
    /// Syntactic signal weight. Default `0.3`.
    pub syntax_weight: f64,
    /// Minimum external-signal score before it contributes. Default `0.5`.
    pub external_min_score: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            match_type: MatchBasis::Lemma,
            min_matches: 2,
            max_distance: 999,
            max_results: 500,
            stoplist_basis: StoplistBasis::Corpus,
            stoplist_size: 0,
            custom_stopwords: Vec::new(),
            language: Language::Latin,
            freq_basis: FreqBasis::Texts,
            use_pos: false,
            use_edit_distance: false,
            use_sound: false,
            use_meter: false,
            use_syntax: false,
            bigram_boost: false,
            bigram_weight: 0.5,
            bigram_window: 2,
            sound_floor: 0.4,
            sound_top_n: 10,
            edit_min_ratio: 0.7,
            semantic_floor: 0.5,
            semantic_top_n: 10,
            max_comparisons: 5_000_000,
            pos_weight: 0.2,
            pos_min_agreement: 0.5,
            edit_weight: 0.2,
            edit_min_similarity: 0.5,
            sound_weight: 0.2,
            sound_min_similarity: 0.4,
            meter_weight: 0.3,
            syntax_weight: 0.3,
            external_min_score: 0.5,
        }
    }
}

impl SearchConfig {
    /// Start building a configuration.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Check the record for inconsistencies.
    pub fn validate(&self) -> Result<()> {
        if self.min_matches == 0 {
            return Err(IntertextError::invalid_config("min_matches must be >= 1"));
        }
        if self.max_distance == 0 {
            return Err(IntertextError::invalid_config("max_distance must be >= 1"));
        }
        if self.max_results == 0 {
            return Err(IntertextError::invalid_config("max_results must be >= 1"));
        }
        if self.stoplist_size < -1 {
            return Err(IntertextError::invalid_config(
                "stoplist_size must be -1 (disabled), 0 (automatic), or positive",
            ));
        }
        if self.max_comparisons == 0 {
            return Err(IntertextError::invalid_config(
                "max_comparisons must be >= 1",
            ));
        }
        for (name, value) in [
            ("sound_floor", self.sound_floor),
            ("edit_min_ratio", self.edit_min_ratio),
            ("semantic_floor", self.semantic_floor),
            ("pos_min_agreement", self.pos_min_agreement),
            ("edit_min_similarity", self.edit_min_similarity),
            ("sound_min_similarity", self.sound_min_similarity),
            ("external_min_score", self.external_min_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(IntertextError::invalid_config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        for (name, value) in [
            ("bigram_weight", self.bigram_weight),
            ("pos_weight", self.pos_weight),
            ("edit_weight", self.edit_weight),
            ("sound_weight", self.sound_weight),
            ("meter_weight", self.meter_weight),
            ("syntax_weight", self.syntax_weight),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(IntertextError::invalid_config(format!(
                    "{name} must be a finite non-negative weight, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the match strategy.
    pub fn match_type(mut self, match_type: MatchBasis) -> Self {
        self.config.match_type = match_type;
        self
    }

    /// Set the corpus language.
    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    /// Set the minimum shared-feature count.
    pub fn min_matches(mut self, min_matches: usize) -> Self {
        self.config.min_matches = min_matches;
        self
    }

    /// Set the maximum matched-position span.
    pub fn max_distance(mut self, max_distance: usize) -> Self {
        self.config.max_distance = max_distance;
        self
    }

    /// Set the result limit.
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.config.max_results = max_results;
        self
    }

    /// Set the stoplist basis.
    pub fn stoplist_basis(mut self, basis: StoplistBasis) -> Self {
        self.config.stoplist_basis = basis;
        self
    }

    /// Set the stoplist size convention (`0` automatic, `-1` disabled).
    pub fn stoplist_size(mut self, size: i64) -> Self {
        self.config.stoplist_size = size;
        self
    }

    /// Add caller-supplied stopwords.
    pub fn custom_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.custom_stopwords = words.into_iter().map(Into::into).collect();
        self
    }

    /// Set the scoring frequency basis.
    pub fn freq_basis(mut self, basis: FreqBasis) -> Self {
        self.config.freq_basis = basis;
        self
    }

    /// Toggle the POS agreement signal.
    pub fn use_pos(mut self, enabled: bool) -> Self {
        self.config.use_pos = enabled;
        self
    }

    /// Toggle the matched-token edit-distance signal.
    pub fn use_edit_distance(mut self, enabled: bool) -> Self {
        self.config.use_edit_distance = enabled;
        self
    }

    /// Toggle the sound-similarity signal.
    pub fn use_sound(mut self, enabled: bool) -> Self {
        self.config.use_sound = enabled;
        self
    }

    /// Toggle the external metrical signal.
    pub fn use_meter(mut self, enabled: bool) -> Self {
        self.config.use_meter = enabled;
        self
    }

    /// Toggle the external syntactic signal.
    pub fn use_syntax(mut self, enabled: bool) -> Self {
        self.config.use_syntax = enabled;
        self
    }

    /// Toggle the bigram rarity bonus.
    pub fn bigram_boost(mut self, enabled: bool) -> Self {
        self.config.bigram_boost = enabled;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<SearchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.match_type, MatchBasis::Lemma);
        assert_eq!(config.min_matches, 2);
        assert_eq!(config.max_distance, 999);
        assert_eq!(config.max_results, 500);
        assert_eq!(config.stoplist_size, 0);
        assert_eq!(config.max_comparisons, 5_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validates() {
        let err = SearchConfig::builder().min_matches(0).build();
        assert!(err.is_err());

        let config = SearchConfig::builder()
            .match_type(MatchBasis::Exact)
            .language(Language::Greek)
            .min_matches(3)
            .stoplist_size(-1)
            .custom_stopwords(["μηνιν"])
            .build()
            .unwrap();
        assert_eq!(config.match_type, MatchBasis::Exact);
        assert_eq!(config.min_matches, 3);
        assert_eq!(config.custom_stopwords, vec!["μηνιν".to_string()]);
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let mut config = SearchConfig::default();
        config.sound_floor = 1.5;
        assert!(config.validate().is_err());
        config.sound_floor = 0.4;
        config.meter_weight = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = SearchConfig::builder()
            .match_type(MatchBasis::Sound)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.match_type, MatchBasis::Sound);
        assert_eq!(back.max_results, config.max_results);
    }
}
