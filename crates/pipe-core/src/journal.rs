// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Undo-journaled ordered map with nested checkpoints.
//!
//! Writes made while at least one checkpoint is open are recorded as
//! `(key, previous value)` pairs. [`Journaled::revert`] replays those pairs in
//! reverse down to the most recent checkpoint; [`Journaled::commit`] folds the
//! checkpoint into its parent (or drops the journal entirely at depth zero).
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub(crate) struct Journaled<K, V> {
    entries: BTreeMap<K, V>,
    journal: Vec<(K, Option<V>)>,
    marks: Vec<usize>,
}

impl<K, V> Default for Journaled<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            journal: Vec::new(),
            marks: Vec::new(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> Journaled<K, V> {
    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Sets (`Some`) or clears (`None`) `key`, journaling the prior value when
    /// a checkpoint is open.
    pub(crate) fn set(&mut self, key: K, value: Option<V>) {
        let previous = match value {
            Some(v) => self.entries.insert(key.clone(), v),
            None => self.entries.remove(&key),
        };
        if !self.marks.is_empty() {
            self.journal.push((key, previous));
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn depth(&self) -> usize {
        self.marks.len()
    }

    pub(crate) fn checkpoint(&mut self) {
        self.marks.push(self.journal.len());
    }

    /// Keeps every write since the innermost checkpoint. No-op without one.
    pub(crate) fn commit(&mut self) {
        if self.marks.pop().is_some() && self.marks.is_empty() {
            self.journal.clear();
        }
    }

    /// Undoes every write since the innermost checkpoint. No-op without one.
    pub(crate) fn revert(&mut self) {
        let Some(mark) = self.marks.pop() else {
            return;
        };
        while self.journal.len() > mark {
            let Some((key, previous)) = self.journal.pop() else {
                break;
            };
            match previous {
                Some(v) => {
                    self.entries.insert(key, v);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_restores_prior_values_and_absence() {
        let mut map = Journaled::<u8, u32>::default();
        map.set(1, Some(10));
        map.checkpoint();
        map.set(1, Some(11));
        map.set(2, Some(20));
        map.set(1, None);
        map.revert();
        assert_eq!(map.get(&1), Some(&10));
        assert_eq!(map.get(&2), None);
        assert_eq!(map.depth(), 0);
    }

    #[test]
    fn nested_commit_is_undone_by_outer_revert() {
        let mut map = Journaled::<u8, u32>::default();
        map.checkpoint();
        map.checkpoint();
        map.set(7, Some(70));
        map.commit();
        assert_eq!(map.get(&7), Some(&70));
        map.revert();
        assert_eq!(map.get(&7), None);
    }

    #[test]
    fn writes_outside_checkpoints_are_not_journaled() {
        let mut map = Journaled::<u8, u32>::default();
        map.set(1, Some(1));
        map.revert();
        assert_eq!(map.get(&1), Some(&1));
        assert_eq!(map.len(), 1);
    }
}
