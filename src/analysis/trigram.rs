//! Character trigram extraction for sound matching.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::language::Language;
use crate::unit::TextUnit;

/// Boundary marker padded onto each token before windowing.
const BOUNDARY: &str = "#";

/// The set of character trigrams for one token.
///
/// Tokens are normalized, padded with a boundary marker on each side, and
/// windowed over grapheme clusters, so `"arma"` yields
/// `{"#ar", "arm", "rma", "ma#"}` and accented Greek folds before windowing.
pub fn token_trigrams(token: &str, language: Language) -> HashSet<String> {
    let normalized = language.normalize(token);
    if normalized.is_empty() {
        return HashSet::new();
    }

    let mut graphemes: Vec<&str> = vec![BOUNDARY];
    graphemes.extend(normalized.graphemes(true));
    graphemes.push(BOUNDARY);

    graphemes.windows(3).map(|w| w.concat()).collect()
}

/// The combined trigram set over every token of a unit.
pub fn unit_trigrams(unit: &TextUnit, language: Language) -> HashSet<String> {
    let mut trigrams = HashSet::new();
    for token in &unit.tokens {
        trigrams.extend(token_trigrams(token, language));
    }
    trigrams
}

/// Jaccard similarity of two trigram sets.
///
/// An empty union yields `0.0` rather than a division by zero.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_trigrams() {
        let trigrams = token_trigrams("arma", Language::Latin);
        let expected: HashSet<String> = ["#ar", "arm", "rma", "ma#"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(trigrams, expected);
    }

    #[test]
    fn test_short_token() {
        // A single character still produces one padded trigram.
        let trigrams = token_trigrams("a", Language::Latin);
        assert_eq!(trigrams.len(), 1);
        assert!(trigrams.contains("#a#"));
    }

    #[test]
    fn test_jaccard_bounds() {
        let a = token_trigrams("arma", Language::Latin);
        let b = token_trigrams("armis", Language::Latin);
        let sim = jaccard(&a, &b);
        assert!(sim > 0.0 && sim < 1.0);
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }

    #[test]
    fn test_unit_trigrams_union() {
        let unit = TextUnit::from_tokens(
            "1.1",
            vec!["arma".to_string(), "uirum".to_string()],
            Language::Latin,
        );
        let trigrams = unit_trigrams(&unit, Language::Latin);
        assert!(trigrams.contains("arm"));
        assert!(trigrams.contains("iru"));
    }
}
