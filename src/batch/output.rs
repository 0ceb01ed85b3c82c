//! Aggregated batch results.

use bytes::Bytes;
use serde::Serialize;

/// One slot per input item, in input order.
///
/// A `None` slot marks an item whose encode failed. The reducers here do
/// not depend on slot order, so they give the same answer whichever order
/// the items finished in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutput {
    slots: Vec<Option<Bytes>>,
}

impl BatchOutput {
    pub fn new(slots: Vec<Option<Bytes>>) -> Self {
        Self { slots }
    }

    /// Number of slots; always equals the number of input items.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<Bytes>] {
        &self.slots
    }

    /// Payload for the item at `index`, if it succeeded.
    pub fn get(&self, index: usize) -> Option<&Bytes> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Successful payloads, skipping failed slots.
    pub fn successes(&self) -> impl Iterator<Item = &Bytes> {
        self.slots.iter().flatten()
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    /// Indices of items that produced no payload.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Sum of all successful payload sizes.
    pub fn total_bytes(&self) -> u64 {
        self.successes().map(|data| data.len() as u64).sum()
    }

    pub fn summary(&self) -> BatchSummary {
        let succeeded = self.success_count();
        BatchSummary {
            items: self.len(),
            succeeded,
            failed: self.len() - succeeded,
            total_bytes: self.total_bytes(),
        }
    }

    pub fn into_inner(self) -> Vec<Option<Bytes>> {
        self.slots
    }

    /// Drop failed slots and keep the payloads.
    pub fn into_successes(self) -> Vec<Bytes> {
        self.slots.into_iter().flatten().collect()
    }
}

impl From<Vec<Option<Bytes>>> for BatchOutput {
    fn from(slots: Vec<Option<Bytes>>) -> Self {
        Self::new(slots)
    }
}

impl IntoIterator for BatchOutput {
    type Item = Option<Bytes>;
    type IntoIter = std::vec::IntoIter<Option<Bytes>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

/// Counts for reporting a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub items: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_bytes: u64,
}
