//! Search pipeline benchmarks over a synthetic corpus.

use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use intertext::{Language, MatchBasis, ParallelSearcher, SearchConfig, TextUnit};

/// Deterministic pseudo-Latin text: Zipf-ish draws from a fixed vocabulary.
fn synthetic_units(count: usize, seed: u64) -> Vec<TextUnit> {
    let vocabulary: Vec<String> = (0..400).map(|i| format!("uerbum{i:03}")).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let words: Vec<String> = (0..8)
                .map(|_| {
                    let rank = rng.random_range(0.0f64..1.0).powi(2);
                    let idx = (rank * (vocabulary.len() - 1) as f64) as usize;
                    vocabulary[idx].clone()
                })
                .collect();
            TextUnit::from_tokens(format!("1.{i}"), words, Language::Latin)
        })
        .collect()
}

fn bench_lemma_search(c: &mut Criterion) {
    let source = synthetic_units(200, 1);
    let target = synthetic_units(200, 2);
    let config = SearchConfig::builder().stoplist_size(-1).build().unwrap();
    let searcher = ParallelSearcher::new();

    c.bench_function("lemma_search_200x200", |b| {
        b.iter(|| searcher.search(&source, &target, &config).unwrap())
    });
}

fn bench_sound_search(c: &mut Criterion) {
    let source = synthetic_units(50, 3);
    let target = synthetic_units(50, 4);
    let config = SearchConfig::builder()
        .match_type(MatchBasis::Sound)
        .stoplist_size(-1)
        .build()
        .unwrap();
    let searcher = ParallelSearcher::new();

    c.bench_function("sound_search_50x50", |b| {
        b.iter(|| searcher.search(&source, &target, &config).unwrap())
    });
}

criterion_group!(benches, bench_lemma_search, bench_sound_search);
criterion_main!(benches);
