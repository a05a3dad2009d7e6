//! Ground-kernel store: the set of ground rules produced by grounding.
//!
//! Set semantics with merge-on-duplicate: inserting a rule whose identity
//! already exists increments the existing rule's multiplicity instead.
//! Iteration order is insertion order, so deterministic stores yield
//! reproducible rule sequences.

use indexmap::IndexMap;

use crate::groundrule::{GroundRule, GroundRuleKey};

/// Outcome of a merge-or-insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The candidate was new and was added.
    Inserted,
    /// An equal rule existed; its multiplicity was incremented.
    Merged,
}

/// Collection of ground rules keyed by signed-literal multiset.
///
/// Ground rules are never removed by the grounder; the store only grows and
/// merges.
#[derive(Debug, Default)]
pub struct GroundRuleStore {
    rules: IndexMap<GroundRuleKey, GroundRule>,
    change_notifications: u64,
}

impl GroundRuleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a rule equal to `candidate`, if present.
    #[must_use]
    pub fn get(&self, candidate: &GroundRule) -> Option<&GroundRule> {
        self.rules.get(&candidate.key())
    }

    /// Adds a rule assumed to be new. Returns false (and leaves the store
    /// unchanged) if an equal rule already exists; prefer
    /// [`merge_or_insert`](Self::merge_or_insert) when duplicates are
    /// expected.
    pub fn add(&mut self, rule: GroundRule) -> bool {
        let key = rule.key();
        if self.rules.contains_key(&key) {
            return false;
        }
        self.rules.insert(key, rule);
        true
    }

    /// Records that an existing rule was mutated (multiplicity increment).
    pub fn notify_changed(&mut self, _key: &GroundRuleKey) {
        self.change_notifications += 1;
    }

    /// Inserts `candidate`, or merges it into an equal existing rule by
    /// incrementing that rule's multiplicity and recording the change.
    pub fn merge_or_insert(&mut self, candidate: GroundRule) -> MergeOutcome {
        let key = candidate.key();
        if let Some(existing) = self.rules.get_mut(&key) {
            existing.increase_groundings();
            self.notify_changed(&key);
            MergeOutcome::Merged
        } else {
            self.rules.insert(key, candidate);
            MergeOutcome::Inserted
        }
    }

    /// Number of distinct ground rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// How many merge notifications have been recorded.
    #[must_use]
    pub const fn change_notifications(&self) -> u64 {
        self.change_notifications
    }

    /// Iterates rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GroundRule> {
        self.rules.values()
    }
}

impl<'a> IntoIterator for &'a GroundRuleStore {
    type Item = &'a GroundRule;
    type IntoIter = indexmap::map::Values<'a, GroundRuleKey, GroundRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.values()
    }
}
