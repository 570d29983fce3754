use std::collections::HashMap;

use crate::model::{FactorRecord, IdentityKey, UnifiedFactorEntry};

/// What happened to a record handed to [`MergeTable::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Merged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    pub inserted: usize,
    pub merged: usize,
}

/// Merged factors in first-seen order, with a position index keyed by identity.
///
/// `index[k] == i` iff `entries[i].identity() == k`. Entries are only ever
/// appended, so positions never move.
#[derive(Debug, Default)]
pub struct MergeTable {
    entries: Vec<UnifiedFactorEntry>,
    index: HashMap<IdentityKey, usize>,
}

impl MergeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, record: FactorRecord) -> MergeOutcome {
        let key = record.identity();
        match self.index.get(&key) {
            Some(&pos) => {
                self.entries[pos].measurements.push(record.measurement);
                MergeOutcome::Merged
            }
            None => {
                self.entries.push(record.into());
                self.index.insert(key, self.entries.len() - 1);
                MergeOutcome::Inserted
            }
        }
    }

    /// Merge one dataset's records in order.
    pub fn merge_all<I>(&mut self, records: I) -> MergeCounts
    where
        I: IntoIterator<Item = FactorRecord>,
    {
        let mut counts = MergeCounts::default();
        for record in records {
            match self.merge(record) {
                MergeOutcome::Inserted => counts.inserted += 1,
                MergeOutcome::Merged => counts.merged += 1,
            }
        }
        counts
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&UnifiedFactorEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn entries(&self) -> &[UnifiedFactorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn measurement_count(&self) -> usize {
        self.entries.iter().map(|e| e.measurements.len()).sum()
    }

    pub fn into_entries(self) -> Vec<UnifiedFactorEntry> {
        self.entries
    }
}
