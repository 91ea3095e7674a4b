//! # Select Module
//!
//! Non-repeating random selection of loading words.
//!
//! Policy:
//! - Pick uniformly among candidates whose term is not in the exclusion set.
//! - If every candidate was shown recently, clear the set and pick among all.
//! - Record the chosen term.
//!
//! History keywords, when there are any, are the only candidates; the static
//! table is used only when history has no non-blank keyword. The two pools
//! are never blended.

use crate::exclusion::ExclusionSet;
use crate::word::{HistoryKeyword, Language, LoadingWord, static_words};
use rand::Rng;
use rand::seq::SliceRandom;

/// Choose one candidate, honoring and updating `exclusion`.
///
/// Returns `None` only for an empty candidate slice.
pub fn select_candidate<'a, T, R>(
    candidates: &'a [T],
    term_of: impl Fn(&T) -> &str,
    exclusion: &mut ExclusionSet,
    rng: &mut R,
) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    if candidates.is_empty() {
        return None;
    }

    let fresh: Vec<&T> = candidates
        .iter()
        .filter(|c| !exclusion.contains(term_of(*c)))
        .collect();

    let chosen = if fresh.is_empty() {
        exclusion.clear();
        candidates.choose(rng)?
    } else {
        *fresh.choose(rng)?
    };

    exclusion.insert(term_of(chosen));
    Some(chosen)
}

/// Pick a word from the user's history keywords.
///
/// Keywords are compared by their trimmed term; blank keywords are skipped.
pub fn pick_history_word<R>(
    keywords: &[HistoryKeyword],
    language: Language,
    exclusion: &mut ExclusionSet,
    rng: &mut R,
) -> Option<LoadingWord>
where
    R: Rng + ?Sized,
{
    let usable: Vec<&HistoryKeyword> = keywords
        .iter()
        .filter(|k| !k.keyword.trim().is_empty())
        .collect();

    select_candidate(&usable, |k| k.keyword.trim(), exclusion, rng)
        .map(|k| LoadingWord::from_history(k, language))
}

/// Pick a word from the built-in table.
pub fn pick_static_word<R>(
    language: Language,
    exclusion: &mut ExclusionSet,
    rng: &mut R,
) -> Option<LoadingWord>
where
    R: Rng + ?Sized,
{
    select_candidate(static_words(), |w| w.term, exclusion, rng)
        .map(|w| LoadingWord::from_static(w, language))
}

/// Pick from history when it has a usable keyword, otherwise from the static
/// table.
pub fn pick_word<R>(
    history: &[HistoryKeyword],
    language: Language,
    exclusion: &mut ExclusionSet,
    rng: &mut R,
) -> Option<LoadingWord>
where
    R: Rng + ?Sized,
{
    pick_history_word(history, language, exclusion, rng)
        .or_else(|| pick_static_word(language, exclusion, rng))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::WordSource;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    fn keywords(terms: &[&str]) -> Vec<HistoryKeyword> {
        terms.iter().map(|t| HistoryKeyword::new(*t)).collect()
    }

    #[test]
    fn empty_candidates_select_nothing() {
        let mut exclusion = ExclusionSet::default();
        let mut rng = StdRng::seed_from_u64(1);
        let empty: [&str; 0] = [];
        assert!(select_candidate(&empty, |s| *s, &mut exclusion, &mut rng).is_none());
    }

    #[test]
    fn exhausting_candidates_resets_exclusion() {
        let mut exclusion = ExclusionSet::default();
        let mut rng = StdRng::seed_from_u64(7);
        let pool = ["a", "b", "c"];

        let mut seen = BTreeSet::new();
        for _ in 0..3 {
            let chosen = select_candidate(&pool, |s| *s, &mut exclusion, &mut rng).unwrap();
            seen.insert(*chosen);
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(exclusion.len(), 3);

        // Fourth pick clears and starts over
        select_candidate(&pool, |s| *s, &mut exclusion, &mut rng).unwrap();
        assert_eq!(exclusion.len(), 1);
    }

    #[test]
    fn history_is_never_blended_with_static() {
        let mut exclusion = ExclusionSet::default();
        let mut rng = StdRng::seed_from_u64(3);
        let history = keywords(&["Gradient"]);

        for _ in 0..10 {
            let word = pick_word(&history, Language::En, &mut exclusion, &mut rng).unwrap();
            assert_eq!(word.source, WordSource::History);
            assert_eq!(word.term, "Gradient");
        }
    }

    #[test]
    fn empty_history_falls_back_to_static() {
        let mut exclusion = ExclusionSet::default();
        let mut rng = StdRng::seed_from_u64(3);
        let word = pick_word(&[], Language::Ko, &mut exclusion, &mut rng).unwrap();
        assert_eq!(word.source, WordSource::Local);
    }

    #[test]
    fn padded_keywords_count_as_one_term() {
        let history = keywords(&[" Gradient ", "Gradient", "Tensor"]);

        for seed in 0..32 {
            let mut exclusion = ExclusionSet::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let first = pick_word(&history, Language::En, &mut exclusion, &mut rng).unwrap();
            let second = pick_word(&history, Language::En, &mut exclusion, &mut rng).unwrap();

            assert_ne!(first.term, second.term, "seed {}", seed);
            assert_eq!(first.term, first.term.trim());
        }
    }

    #[test]
    fn blank_keywords_are_never_shown() {
        let mut exclusion = ExclusionSet::default();
        let mut rng = StdRng::seed_from_u64(0);

        let only_blank = keywords(&["   "]);
        let word = pick_word(&only_blank, Language::En, &mut exclusion, &mut rng).unwrap();
        assert_eq!(word.source, WordSource::Local);
        assert!(!word.term.is_empty());

        let mixed = keywords(&["", "  ", "Tensor"]);
        for _ in 0..5 {
            let word = pick_word(&mixed, Language::En, &mut exclusion, &mut rng).unwrap();
            assert_eq!(word.term, "Tensor");
        }
    }

    #[test]
    fn exclusion_is_case_insensitive() {
        let mut exclusion = ExclusionSet::default();
        exclusion.insert("ALPHA");
        let mut rng = StdRng::seed_from_u64(11);
        let history = keywords(&["alpha", "Beta"]);

        let word = pick_history_word(&history, Language::En, &mut exclusion, &mut rng).unwrap();
        assert_eq!(word.term, "Beta");
    }

    proptest! {
        #[test]
        fn no_repeat_while_unshown_remain(seed in any::<u64>(), n in 1usize..40) {
            let terms: Vec<String> = (0..n).map(|i| format!("term{}", i)).collect();
            let history: Vec<HistoryKeyword> = terms.iter().map(HistoryKeyword::new).collect();
            let mut exclusion = ExclusionSet::default();
            let mut rng = StdRng::seed_from_u64(seed);

            let mut shown = BTreeSet::new();
            for _ in 0..n {
                let word = pick_word(&history, Language::En, &mut exclusion, &mut rng).unwrap();
                prop_assert!(shown.insert(word.term));
            }
        }

        #[test]
        fn exclusion_stays_bounded_over_long_runs(seed in any::<u64>(), picks in 1usize..400) {
            let history: Vec<HistoryKeyword> =
                (0..120).map(|i| HistoryKeyword::new(format!("k{}", i))).collect();
            let mut exclusion = ExclusionSet::default();
            let mut rng = StdRng::seed_from_u64(seed);

            for _ in 0..picks {
                pick_word(&history, Language::En, &mut exclusion, &mut rng);
                prop_assert!(exclusion.len() <= crate::exclusion::DEFAULT_EXCLUSION_CAPACITY);
            }
        }
    }
}
