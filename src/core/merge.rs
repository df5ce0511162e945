// src/core/merge.rs
//! Merge engine: folds every contribution for a canonical identifier into the
//! first-seen [`Word`].
//!
//! Sources are appended in encounter order and never deduplicated, so an
//! identical attestation ingested twice shows up twice. Tags are unioned.
//! Categories and languages follow from [`Word::add_source`], which runs once
//! per appended source.

use crate::core::types::Word;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// What happened to an incoming word when it met a keyed collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Merged,
}

/// Appends all of `incoming`'s sources to `existing` and unions its tags and
/// synthesis groups. Both words are expected to share a canonical identifier.
pub fn merge(existing: &mut Word, incoming: Word) {
    debug_assert_eq!(existing.normalized(), incoming.normalized());
    let (sources, tags, groups) = incoming.into_contributions();
    for source in sources {
        existing.add_source(source);
    }
    existing.tags.extend(tags);
    existing.synthesis_groups.extend(groups);
}

/// [`merge`] for a borrowed contribution; only the appended parts are cloned.
pub fn merge_ref(existing: &mut Word, incoming: &Word) {
    debug_assert_eq!(existing.normalized(), incoming.normalized());
    for source in incoming.sources() {
        existing.add_source(source.clone());
    }
    existing.tags.extend(incoming.tags.iter().cloned());
    existing
        .synthesis_groups
        .extend(incoming.synthesis_groups.iter().cloned());
}

/// A map keyed by canonical identifier that words can be merged into.
pub trait WordPool {
    fn word_mut(&mut self, normalized: &str) -> Option<&mut Word>;

    fn insert_word(&mut self, word: Word);

    fn merge_word(&mut self, word: Word) -> MergeOutcome {
        match self.word_mut(word.normalized()) {
            Some(existing) => {
                merge(existing, word);
                MergeOutcome::Merged
            }
            None => {
                self.insert_word(word);
                MergeOutcome::Inserted
            }
        }
    }
}

impl WordPool for BTreeMap<String, Word> {
    fn word_mut(&mut self, normalized: &str) -> Option<&mut Word> {
        self.get_mut(normalized)
    }

    fn insert_word(&mut self, word: Word) {
        self.insert(word.normalized().to_string(), word);
    }
}

impl<S: BuildHasher> WordPool for HashMap<String, Word, S> {
    fn word_mut(&mut self, normalized: &str) -> Option<&mut Word> {
        self.get_mut(normalized)
    }

    fn insert_word(&mut self, word: Word) {
        self.insert(word.normalized().to_string(), word);
    }
}

/// Merges `word` into `pool`, keeping the first-seen entity for its identifier.
pub fn merge_into<P: WordPool + ?Sized>(pool: &mut P, word: Word) -> MergeOutcome {
    pool.merge_word(word)
}

/// Clone-and-combine path for multi-language views.
///
/// The first contribution is deep-copied into the pool, so later merges
/// mutate the copy and never the caller's per-language word. Later
/// contributions only have their sources, tags and groups copied.
pub fn combine_into<P: WordPool + ?Sized>(pool: &mut P, word: &Word) -> MergeOutcome {
    match pool.word_mut(word.normalized()) {
        Some(existing) => {
            merge_ref(existing, word);
            MergeOutcome::Merged
        }
        None => {
            pool.insert_word(word.clone());
            MergeOutcome::Inserted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::tests::{source, word};
    use crate::core::types::Source;
    use std::collections::BTreeSet;

    fn source_set(w: &Word) -> BTreeSet<Source> {
        w.sources().iter().cloned().collect()
    }

    fn sorted_sources(w: &Word) -> Vec<Source> {
        let mut v = w.sources().to_vec();
        v.sort();
        v
    }

    #[test]
    fn merge_appends_sources_and_unions_tags() {
        let mut en = word("care", "en", "standard");
        let mut tr = Word::new("care", source("tr", "urban", "çare"));
        tr.tags.insert("loan".into());
        tr.add_source(source("tr", "standard", "Çare"));

        merge(&mut en, tr);

        assert_eq!(en.sources().len(), 3);
        assert_eq!(en.sources()[0].language, "en");
        assert_eq!(en.sources()[1].original_form, "çare");
        assert_eq!(en.languages().iter().collect::<Vec<_>>(), ["en", "tr"]);
        assert_eq!(en.categories().iter().collect::<Vec<_>>(), ["standard", "urban"]);
        assert!(en.tags.contains("loan"));
    }

    #[test]
    fn merge_unions_synthesis_groups() {
        let mut pooled = word("care", "en", "standard");
        pooled.synthesis_groups.insert("clean".into());
        let mut saved = Word::new("care", source("tr", "standard", "çare"));
        saved.synthesis_groups.insert("en_tr".into());

        merge(&mut pooled, saved.clone());
        assert_eq!(pooled.synthesis_groups.iter().collect::<Vec<_>>(), ["clean", "en_tr"]);

        let mut other = word("care", "de", "standard");
        merge_ref(&mut other, &saved);
        assert!(other.synthesis_groups.contains("en_tr"));
        assert_eq!(other.sources().len(), 2);
    }

    #[test]
    fn identical_sources_are_kept() {
        let mut a = word("care", "en", "standard");
        let b = a.clone();
        merge(&mut a, b);
        assert_eq!(a.sources().len(), 2);
        assert_eq!(a.sources()[0], a.sources()[1]);
        assert_eq!(a.languages().len(), 1);
    }

    #[test]
    fn merge_order_only_changes_source_order() {
        let a = word("care", "en", "standard");
        let b = Word::new("care", source("tr", "standard", "çare"));
        let mut c = Word::new("care", source("de", "urban", "care"));
        c.tags.insert("c".into());

        let orders = [[0, 1, 2], [2, 0, 1], [1, 2, 0], [2, 1, 0]];
        let inputs = [a, b, c];
        let results: Vec<Word> = orders
            .iter()
            .map(|order| {
                let mut pool: BTreeMap<String, Word> = BTreeMap::new();
                for &i in order {
                    merge_into(&mut pool, inputs[i].clone());
                }
                pool.remove("care").unwrap()
            })
            .collect();

        for r in &results[1..] {
            assert_eq!(sorted_sources(r), sorted_sources(&results[0]));
            assert_eq!(r.languages(), results[0].languages());
            assert_eq!(r.categories(), results[0].categories());
            assert_eq!(r.tags, results[0].tags);
        }
        assert_eq!(results[0].sources().len(), 3);
    }

    #[test]
    fn first_seen_entity_is_retained() {
        let mut pool: HashMap<String, Word> = HashMap::new();
        let mut first = word("care", "en", "standard");
        first.ipa = Some("kɛə".into());
        assert_eq!(merge_into(&mut pool, first), MergeOutcome::Inserted);
        let mut second = Word::new("care", source("tr", "standard", "çare"));
        second.ipa = Some("dʒaɾe".into());
        assert_eq!(merge_into(&mut pool, second), MergeOutcome::Merged);

        let kept = &pool["care"];
        assert_eq!(kept.ipa.as_deref(), Some("kɛə"));
        assert_eq!(kept.sources()[0].language, "en");
    }

    #[test]
    fn combine_never_touches_the_original() {
        let en = word("care", "en", "standard");
        let tr = Word::new("care", source("tr", "standard", "çare"));
        let mut combined: BTreeMap<String, Word> = BTreeMap::new();

        combine_into(&mut combined, &en);
        combine_into(&mut combined, &tr);

        assert_eq!(en.sources().len(), 1);
        assert_eq!(en.languages().len(), 1);
        assert_eq!(combined["care"].languages().len(), 2);
        assert_eq!(source_set(&combined["care"]).len(), 2);
        assert_eq!(tr.sources().len(), 1);
    }

    #[test]
    fn combine_merges_tags_and_keeps_first_ipa() {
        let mut en = word("care", "en", "standard");
        en.ipa = Some("kɛə".into());
        let mut tr = Word::new("care", source("tr", "standard", "çare"));
        tr.tags.insert("loan".into());
        tr.ipa = Some("tʃaɾe".into());
        let mut combined: BTreeMap<String, Word> = BTreeMap::new();

        assert_eq!(combine_into(&mut combined, &en), MergeOutcome::Inserted);
        assert_eq!(combine_into(&mut combined, &tr), MergeOutcome::Merged);

        let care = &combined["care"];
        assert_eq!(care.ipa.as_deref(), Some("kɛə"));
        assert!(care.tags.contains("loan"));
        assert!(en.tags.is_empty());
    }
}
