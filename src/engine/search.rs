//! The top-level search pipeline.

use std::cmp::Ordering;
use std::sync::Arc;

use log::debug;

use crate::analysis::{StoplistBasis, StoplistBuilder, SynonymMap};
use crate::corpus::frequency::{
    FeatureFrequencies, FeatureKind, FrequencyTable, LocalFrequencies,
};
use crate::corpus::CorpusIndexService;
use crate::embedding::UnitEmbedder;
use crate::engine::config::{FreqBasis, SearchConfig};
use crate::engine::CancelToken;
use crate::error::{IntertextError, Result};
use crate::matching::{find_candidates, MatchBasis, MatchContext};
use crate::scoring::{FeatureScorer, ScoredResult, Scorer};
use crate::scoring::features::ExternalScorer;
use crate::unit::TextUnit;

/// Finds and ranks intertextual parallels between two unit sequences.
///
/// The searcher itself is stateless between calls; corpus-backed state
/// (frequency tables, bigram tables, index handles) lives in the optional
/// [`CorpusIndexService`]. Without a service the engine still runs with
/// request-local frequencies, which also serves isolated testing.
#[derive(Default)]
pub struct ParallelSearcher {
    service: Option<Arc<CorpusIndexService>>,
    synonyms: Option<SynonymMap>,
    embedder: Option<Arc<dyn UnitEmbedder>>,
    meter: Option<Arc<dyn ExternalScorer>>,
    syntax: Option<Arc<dyn ExternalScorer>>,
}

impl std::fmt::Debug for ParallelSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelSearcher")
            .field("has_service", &self.service.is_some())
            .field("has_synonyms", &self.synonyms.is_some())
            .field("has_embedder", &self.embedder.is_some())
            .finish()
    }
}

impl ParallelSearcher {
    /// Create a searcher with no corpus backing.
    pub fn new() -> Self {
        ParallelSearcher::default()
    }

    /// Attach a corpus service for corpus-basis stoplists, corpus
    /// frequencies, and bigram tables.
    pub fn with_service(mut self, service: Arc<CorpusIndexService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Attach a synonym table for synonym-basis matching.
    pub fn with_synonyms(mut self, synonyms: SynonymMap) -> Self {
        self.synonyms = Some(synonyms);
        self
    }

    /// Attach an embedding provider for semantic matching.
    pub fn with_embedder(mut self, embedder: Arc<dyn UnitEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Attach an external metrical scorer.
    pub fn with_meter_scorer(mut self, scorer: Arc<dyn ExternalScorer>) -> Self {
        self.meter = Some(scorer);
        self
    }

    /// Attach an external syntactic scorer.
    pub fn with_syntax_scorer(mut self, scorer: Arc<dyn ExternalScorer>) -> Self {
        self.syntax = Some(scorer);
        self
    }

    /// Run a search to completion.
    pub fn search(
        &self,
        source: &[TextUnit],
        target: &[TextUnit],
        config: &SearchConfig,
    ) -> Result<Vec<ScoredResult>> {
        self.search_cancellable(source, target, config, &CancelToken::new())
    }

    /// Run a search that can be aborted through `cancel`.
    pub fn search_cancellable(
        &self,
        source: &[TextUnit],
        target: &[TextUnit],
        config: &SearchConfig,
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredResult>> {
        config.validate()?;
        let language = config.language;
        let exact = config.match_type == MatchBasis::Exact;
        let kind = if exact {
            FeatureKind::Token
        } else {
            FeatureKind::Lemma
        };

        // Corpus table, fetched once when anything downstream needs it.
        let needs_corpus = config.stoplist_basis == StoplistBasis::Corpus
            || config.freq_basis == FreqBasis::Corpus;
        let corpus_table: Option<Arc<FrequencyTable>> = match &self.service {
            Some(service) if needs_corpus => Some(service.frequencies(language, kind)?),
            _ => None,
        };

        let stoplist = StoplistBuilder::new(language, exact).build(
            config.stoplist_basis,
            config.stoplist_size,
            source,
            target,
            corpus_table.as_deref(),
            &config.custom_stopwords,
        );
        debug!(
            "search: {} basis, stoplist of {} words over {}x{} units",
            config.match_type.name(),
            stoplist.len(),
            source.len(),
            target.len()
        );

        let ctx = MatchContext {
            config,
            stoplist: &stoplist,
            synonyms: self.synonyms.as_ref(),
            embedder: self.embedder.as_deref(),
            cancel,
        };
        let candidates = find_candidates(source, target, &ctx)?;

        let corpus_for_scoring = if config.freq_basis == FreqBasis::Corpus {
            if corpus_table.is_none() {
                debug!("corpus frequency basis requested without a corpus service; using request-local counts");
            }
            corpus_table.clone()
        } else {
            None
        };
        let local_freqs;
        let frequencies: &dyn FeatureFrequencies = match &corpus_for_scoring {
            Some(table) => table.as_ref(),
            None => {
                local_freqs = LocalFrequencies::build(kind, language, source, target);
                &local_freqs
            }
        };

        let bigram_table = match (&self.service, config.bigram_boost) {
            (Some(service), true) if config.match_type.is_vocabulary() => {
                Some(service.bigram_frequencies(language)?)
            }
            _ => None,
        };

        let feature_scorer =
            FeatureScorer::new(config, self.meter.as_deref(), self.syntax.as_deref());
        let scorer = Scorer::new(
            config,
            frequencies,
            bigram_table.as_deref(),
            feature_scorer,
        );

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if cancel.is_cancelled() {
                return Err(IntertextError::Cancelled);
            }
            let (Some(source_unit), Some(target_unit)) = (
                source.get(candidate.source_idx),
                target.get(candidate.target_idx),
            ) else {
                continue;
            };
            if let Some(result) = scorer.score(candidate, source_unit, target_unit) {
                results.push(result);
            }
        }

        results.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.source_ref.cmp(&b.source_ref))
                .then_with(|| a.target_ref.cmp(&b.target_ref))
        });
        results.truncate(config.max_results);

        debug!(
            "search complete: {} candidates scored into {} results",
            candidates.len(),
            results.len()
        );
        Ok(results)
    }
}
