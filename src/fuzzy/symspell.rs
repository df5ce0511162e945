// File: src/fuzzy/symspell.rs
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Position of an identifier in the owning index.
pub type TermId = u32;

/// Symmetric Delete candidate generator. Every indexed term is stored under
/// all of its delete variants up to `max_edit_distance`, so a lookup only has
/// to generate the query's own deletes. Candidates still need a real
/// distance check.
#[derive(Clone, Serialize, Deserialize)]
pub struct SymSpell {
    deletes: HashMap<String, HashSet<TermId>>,
    max_edit_distance: usize,
}

impl SymSpell {
    pub fn new(max_edit_distance: usize) -> Self {
        Self {
            deletes: HashMap::new(),
            max_edit_distance,
        }
    }

    pub fn max_edit_distance(&self) -> usize {
        self.max_edit_distance
    }

    pub fn add_term(&mut self, term: &str, id: TermId) {
        for edit in self.generate_edits(term) {
            self.deletes.entry(edit).or_default().insert(id);
        }
    }

    pub fn candidates(&self, input: &str) -> HashSet<TermId> {
        let mut candidates = HashSet::new();
        for edit in self.generate_edits(input) {
            if let Some(ids) = self.deletes.get(&edit) {
                candidates.extend(ids.iter().copied());
            }
        }
        candidates
    }

    /// The term itself plus every variant with up to `max_edit_distance`
    /// characters removed.
    fn generate_edits(&self, term: &str) -> HashSet<String> {
        let mut edits = HashSet::new();
        edits.insert(term.to_string());

        let mut current: Vec<Vec<char>> = vec![term.chars().collect()];
        for _ in 0..self.max_edit_distance {
            let mut next = Vec::new();
            for edit in &current {
                for i in 0..edit.len() {
                    let mut variant = edit.clone();
                    variant.remove(i);
                    if edits.insert(variant.iter().collect()) {
                        next.push(variant);
                    }
                }
            }
            current = next;
        }
        edits
    }
}
