//! Merge strategies for the activity timeline.
//!
//! Both strategies receive one list per requested kind, in kind order, each
//! already newest-first, and return the `[offset, offset + limit)` slice of
//! the merged newest-first sequence. Records with equal timestamps keep
//! source order, then their order inside the source.
//!
//! Cost model: the sources are always loaded in full (O(matching rows) I/O).
//! `MaterializeAll` then sorts every row; `KWayMerge` only pops
//! `offset + limit` rows off a heap of source heads.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::ActivityRecord;

pub trait MergeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn merge_page(
        &self,
        sources: Vec<Vec<ActivityRecord>>,
        offset: usize,
        limit: usize,
    ) -> Vec<ActivityRecord>;
}

/// Concatenate, stable sort, slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeAll;

impl MergeStrategy for MaterializeAll {
    fn name(&self) -> &'static str {
        "materialize"
    }

    fn merge_page(
        &self,
        sources: Vec<Vec<ActivityRecord>>,
        offset: usize,
        limit: usize,
    ) -> Vec<ActivityRecord> {
        let mut merged: Vec<ActivityRecord> = sources.into_iter().flatten().collect();
        // sort_by is stable: equal timestamps keep concatenation order
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        merged.into_iter().skip(offset).take(limit).collect()
    }
}

/// Heap-based merge of the per-source lists, stopping once the page is full.
#[derive(Debug, Clone, Copy, Default)]
pub struct KWayMerge;

// The heap holds at most one record per source; the next record of a source
// is pushed only after its predecessor is popped, which keeps in-source order.
struct HeapEntry {
    record: ActivityRecord,
    source: usize,
}

impl Ord for HeapEntry {
    // Max-heap: newest first, then lowest source index
    fn cmp(&self, other: &Self) -> Ordering {
        self.record
            .created_at
            .cmp(&other.record.created_at)
            .then_with(|| other.source.cmp(&self.source))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl MergeStrategy for KWayMerge {
    fn name(&self) -> &'static str {
        "kway"
    }

    fn merge_page(
        &self,
        sources: Vec<Vec<ActivityRecord>>,
        offset: usize,
        limit: usize,
    ) -> Vec<ActivityRecord> {
        let needed = offset.saturating_add(limit);
        let mut iters: Vec<_> = sources.into_iter().map(Vec::into_iter).collect();
        let mut heap = BinaryHeap::with_capacity(iters.len());

        for (source, iter) in iters.iter_mut().enumerate() {
            if let Some(record) = iter.next() {
                heap.push(HeapEntry { record, source });
            }
        }

        // `limit` comes straight from the request; size by rows actually held
        let available = heap.len() + iters.iter().map(|i| i.len()).sum::<usize>();
        let mut page = Vec::with_capacity(limit.min(available.saturating_sub(offset)));
        let mut emitted = 0usize;
        while emitted < needed {
            let Some(head) = heap.pop() else {
                break;
            };
            if let Some(next) = iters[head.source].next() {
                heap.push(HeapEntry {
                    record: next,
                    source: head.source,
                });
            }
            if emitted >= offset {
                page.push(head.record);
            }
            emitted += 1;
        }

        page
    }
}

/// Strategy selector used by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategyKind {
    #[default]
    Materialize,
    KWay,
}

impl MergeStrategyKind {
    pub fn build(self) -> Arc<dyn MergeStrategy> {
        match self {
            MergeStrategyKind::Materialize => Arc::new(MaterializeAll),
            MergeStrategyKind::KWay => Arc::new(KWayMerge),
        }
    }
}

impl FromStr for MergeStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "materialize" | "materialize_all" => Ok(MergeStrategyKind::Materialize),
            "kway" | "k_way" | "k-way" => Ok(MergeStrategyKind::KWay),
            other => Err(format!("unknown merge strategy: {}", other)),
        }
    }
}
