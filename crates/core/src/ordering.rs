//! Section ordering.
//!
//! Sibling sections of a site carry a positive `order` that must stay
//! exactly contiguous 1..N. Reorder and insert are planned as pure
//! write-sets here and executed through an injected all-or-nothing batch
//! writer, so a partial failure can never leave a gap.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

/// A sibling section as the ordering engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSlot {
    pub id: i64,
    pub order: i32,
}

/// One row update in the atomic write-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderWrite {
    pub section_id: i64,
    pub order: i32,
}

/// Rejection reasons for a reorder payload. All of them surface to callers
/// as the retryable `INVALID_ORDER_PAYLOAD` rejection, with zero writes
/// performed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderingError {
    #[error("order payload has {got} ids but the site has {expected} sections")]
    LengthMismatch { expected: usize, got: usize },
    #[error("order payload contains section id {0} more than once")]
    DuplicateId(i64),
    #[error("order payload references section id {0} which is not in the site")]
    UnknownId(i64),
}

/// Failure of the backing store's atomic multi-row update.
#[derive(Debug, Error)]
#[error("atomic batch write failed: {0}")]
pub struct BatchWriteError(pub String);

#[derive(Debug, Error)]
pub enum ReorderError {
    #[error(transparent)]
    InvalidPayload(#[from] OrderingError),
    #[error(transparent)]
    Write(#[from] BatchWriteError),
}

/// All-or-nothing multi-row update capability, provided by the store.
#[async_trait]
pub trait SectionBatchWriter {
    async fn apply_all(&self, writes: &[OrderWrite]) -> Result<(), BatchWriteError>;
}

/// Validate a requested ordering against the current sibling set: same
/// length, no duplicates, identical id sets.
fn validate_payload(sections: &[SectionSlot], requested: &[i64]) -> Result<(), OrderingError> {
    if requested.len() != sections.len() {
        return Err(OrderingError::LengthMismatch {
            expected: sections.len(),
            got: requested.len(),
        });
    }

    let existing: HashSet<i64> = sections.iter().map(|section| section.id).collect();
    let mut seen = HashSet::with_capacity(requested.len());
    for &id in requested {
        if !seen.insert(id) {
            return Err(OrderingError::DuplicateId(id));
        }
        if !existing.contains(&id) {
            return Err(OrderingError::UnknownId(id));
        }
    }

    Ok(())
}

/// The healing pass: reassign contiguous 1..N over the siblings ordered by
/// (current order, id). Idempotent on an already-contiguous sequence, and
/// repairs drift from out-of-band inserts. Emits only rows whose order
/// actually changes.
pub fn plan_normalize(sections: &[SectionSlot]) -> Vec<OrderWrite> {
    let mut ordered: Vec<SectionSlot> = sections.to_vec();
    ordered.sort_by_key(|section| (section.order, section.id));

    ordered
        .iter()
        .enumerate()
        .filter_map(|(index, section)| {
            let order = index as i32 + 1;
            (section.order != order).then_some(OrderWrite {
                section_id: section.id,
                order,
            })
        })
        .collect()
}

/// Plan a full reorder: the requested sequence becomes orders 1..N, followed
/// by the unconditional healing pass. Returns the combined write-set, or an
/// error (and zero writes) on any payload violation.
pub fn plan_reorder(
    sections: &[SectionSlot],
    requested: &[i64],
) -> Result<Vec<OrderWrite>, OrderingError> {
    validate_payload(sections, requested)?;

    let writes: Vec<OrderWrite> = requested
        .iter()
        .enumerate()
        .map(|(index, &id)| OrderWrite {
            section_id: id,
            order: index as i32 + 1,
        })
        .collect();

    // Healing runs unconditionally over the post-reorder state; it is a
    // no-op on the contiguous assignment above.
    let assigned: Vec<SectionSlot> = writes
        .iter()
        .map(|write| SectionSlot {
            id: write.section_id,
            order: write.order,
        })
        .collect();
    let mut combined = writes;
    combined.extend(plan_normalize(&assigned));

    Ok(combined)
}

/// The order for a newly appended section: one past the current count. The
/// healing pass run in the same transaction absorbs any drift afterwards.
pub fn append_order(sections: &[SectionSlot]) -> i32 {
    sections.len() as i32 + 1
}

/// Ordering operations bound to a store's atomic batch writer. Both phases
/// of every operation go through a single `apply_all` call.
pub struct OrderingEngine<W> {
    writer: W,
}

impl<W: SectionBatchWriter> OrderingEngine<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Apply a requested ordering. Zero writes are performed on a payload
    /// violation.
    pub async fn reorder(
        &self,
        sections: &[SectionSlot],
        requested: &[i64],
    ) -> Result<(), ReorderError> {
        let writes = plan_reorder(sections, requested)?;
        tracing::debug!(sections = sections.len(), writes = writes.len(), "applying reorder");
        self.writer.apply_all(&writes).await?;
        Ok(())
    }

    /// Re-establish contiguity over the current siblings, e.g. after an
    /// insert landed in the same transaction.
    pub async fn normalize(&self, sections: &[SectionSlot]) -> Result<(), BatchWriteError> {
        let writes = plan_normalize(sections);
        if writes.is_empty() {
            return Ok(());
        }
        tracing::debug!(writes = writes.len(), "healing section order drift");
        self.writer.apply_all(&writes).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// In-memory stand-in for the store's transactional batch update.
    #[derive(Default)]
    struct MemoryStore {
        sections: Mutex<Vec<SectionSlot>>,
        batches: Mutex<usize>,
    }

    impl MemoryStore {
        fn with_sections(sections: Vec<SectionSlot>) -> Self {
            Self {
                sections: Mutex::new(sections),
                batches: Mutex::new(0),
            }
        }

        fn snapshot(&self) -> Vec<SectionSlot> {
            self.sections.lock().unwrap().clone()
        }

        fn batch_count(&self) -> usize {
            *self.batches.lock().unwrap()
        }

        fn insert(&self, id: i64) {
            let order = append_order(&self.snapshot());
            self.sections.lock().unwrap().push(SectionSlot { id, order });
        }
    }

    #[async_trait]
    impl SectionBatchWriter for &MemoryStore {
        async fn apply_all(&self, writes: &[OrderWrite]) -> Result<(), BatchWriteError> {
            *self.batches.lock().unwrap() += 1;
            let mut sections = self.sections.lock().unwrap();
            for write in writes {
                let section = sections
                    .iter_mut()
                    .find(|section| section.id == write.section_id)
                    .ok_or_else(|| BatchWriteError(format!("no row {}", write.section_id)))?;
                section.order = write.order;
            }
            Ok(())
        }
    }

    fn orders_of(mut sections: Vec<SectionSlot>) -> Vec<(i64, i32)> {
        sections.sort_by_key(|section| section.order);
        sections.into_iter().map(|section| (section.id, section.order)).collect()
    }

    fn assert_contiguous(sections: &[SectionSlot]) {
        let mut orders: Vec<i32> = sections.iter().map(|section| section.order).collect();
        orders.sort_unstable();
        let expected: Vec<i32> = (1..=sections.len() as i32).collect();
        assert_eq!(orders, expected);
    }

    #[tokio::test]
    async fn reorder_matches_requested_sequence() {
        // a=1, b=2, c=3 reordered to [c, a, b].
        let (a, b, c) = (10, 11, 12);
        let store = MemoryStore::with_sections(vec![
            SectionSlot { id: a, order: 1 },
            SectionSlot { id: b, order: 2 },
            SectionSlot { id: c, order: 3 },
        ]);
        let engine = OrderingEngine::new(&store);

        engine.reorder(&store.snapshot(), &[c, a, b]).await.unwrap();

        assert_eq!(orders_of(store.snapshot()), vec![(c, 1), (a, 2), (b, 3)]);
    }

    #[tokio::test]
    async fn rejected_payloads_perform_zero_writes() {
        let sections = vec![
            SectionSlot { id: 1, order: 1 },
            SectionSlot { id: 2, order: 2 },
            SectionSlot { id: 3, order: 3 },
        ];
        let store = MemoryStore::with_sections(sections.clone());
        let engine = OrderingEngine::new(&store);

        let cases: Vec<(Vec<i64>, OrderingError)> = vec![
            (
                vec![1, 2],
                OrderingError::LengthMismatch { expected: 3, got: 2 },
            ),
            (vec![1, 2, 2], OrderingError::DuplicateId(2)),
            (vec![1, 2, 99], OrderingError::UnknownId(99)),
        ];

        for (payload, expected) in cases {
            let err = engine.reorder(&sections, &payload).await.unwrap_err();
            match err {
                ReorderError::InvalidPayload(inner) => assert_eq!(inner, expected),
                other => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(store.batch_count(), 0);
        assert_eq!(store.snapshot(), sections);
    }

    #[tokio::test]
    async fn normalize_heals_gaps_and_duplicates() {
        // Drifted orders from out-of-band writes: duplicate 2s and a gap.
        let store = MemoryStore::with_sections(vec![
            SectionSlot { id: 7, order: 2 },
            SectionSlot { id: 3, order: 2 },
            SectionSlot { id: 9, order: 5 },
        ]);
        let engine = OrderingEngine::new(&store);

        engine.normalize(&store.snapshot()).await.unwrap();

        // Ties broken by id, then contiguous.
        assert_eq!(orders_of(store.snapshot()), vec![(3, 1), (7, 2), (9, 3)]);
    }

    #[tokio::test]
    async fn normalize_is_idempotent_on_contiguous_input() {
        let store = MemoryStore::with_sections(vec![
            SectionSlot { id: 1, order: 1 },
            SectionSlot { id: 2, order: 2 },
        ]);
        let engine = OrderingEngine::new(&store);

        engine.normalize(&store.snapshot()).await.unwrap();
        // Already contiguous: the engine skips the batch entirely.
        assert_eq!(store.batch_count(), 0);
        assert_eq!(
            orders_of(store.snapshot()),
            vec![(1, 1), (2, 2)]
        );
    }

    #[tokio::test]
    async fn contiguity_holds_across_insert_and_reorder_sequences() {
        let store = MemoryStore::with_sections(Vec::new());
        let engine = OrderingEngine::new(&store);

        // Deterministic mixed workload: appends interleaved with rotations.
        for id in 1..=6 {
            store.insert(id);
            engine.normalize(&store.snapshot()).await.unwrap();
            assert_contiguous(&store.snapshot());

            let mut ids: Vec<i64> = {
                let mut snapshot = store.snapshot();
                snapshot.sort_by_key(|section| (section.order, section.id));
                snapshot.iter().map(|section| section.id).collect()
            };
            ids.rotate_left(1);
            engine.reorder(&store.snapshot(), &ids).await.unwrap();
            assert_contiguous(&store.snapshot());
        }

        assert_eq!(store.snapshot().len(), 6);
    }

    #[test]
    fn append_order_is_one_past_count() {
        assert_eq!(append_order(&[]), 1);
        let sections = vec![
            SectionSlot { id: 1, order: 1 },
            SectionSlot { id: 2, order: 2 },
        ];
        assert_eq!(append_order(&sections), 3);
    }
}
