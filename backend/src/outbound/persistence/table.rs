//! Shared storage and write rules for the in-memory repositories.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::RecordError;

/// Record rows keyed by aggregate id.
#[derive(Debug)]
pub(super) struct Table<R> {
    rows: Mutex<HashMap<Uuid, R>>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }
}

impl<R> Table<R> {
    /// Lock the rows, mapping a poisoned lock through `query`.
    pub(super) fn lock<E, Q>(&self, query: Q) -> Result<MutexGuard<'_, HashMap<Uuid, R>>, E>
    where
        Q: FnOnce(String) -> E,
    {
        self.rows
            .lock()
            .map_err(|_| query("store lock poisoned".to_owned()))
    }
}

/// Outcome of comparing a supplied version against the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WritePlan {
    /// No row yet; store at the supplied version.
    Insert,
    /// Row matches; store at `next`.
    Update { next: u64 },
}

/// Reasons a conditional write is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WriteConflict {
    /// An aggregate past version 0 has no stored row.
    Missing,
    Stale { expected: u64, actual: u64 },
}

/// Decide how to write an aggregate carrying `supplied`.
pub(super) fn plan_write(stored: Option<u64>, supplied: u64) -> Result<WritePlan, WriteConflict> {
    match stored {
        None if supplied == 0 => Ok(WritePlan::Insert),
        None => Err(WriteConflict::Missing),
        Some(actual) if actual == supplied => Ok(WritePlan::Update {
            next: supplied + 1,
        }),
        Some(actual) => Err(WriteConflict::Stale {
            expected: supplied,
            actual,
        }),
    }
}

/// Rebuild an aggregate from its record, reporting corrupt rows via `query`.
pub(super) fn decode<T, R, E, Q>(record: R, query: Q) -> Result<T, E>
where
    T: TryFrom<R, Error = RecordError>,
    Q: FnOnce(String) -> E,
{
    T::try_from(record).map_err(|err| query(format!("corrupt row: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 0, Ok(WritePlan::Insert))]
    #[case(None, 3, Err(WriteConflict::Missing))]
    #[case(Some(0), 0, Ok(WritePlan::Update { next: 1 }))]
    #[case(Some(4), 4, Ok(WritePlan::Update { next: 5 }))]
    #[case(Some(5), 4, Err(WriteConflict::Stale { expected: 4, actual: 5 }))]
    fn plans_conditional_writes(
        #[case] stored: Option<u64>,
        #[case] supplied: u64,
        #[case] expected: Result<WritePlan, WriteConflict>,
    ) {
        assert_eq!(plan_write(stored, supplied), expected);
    }
}
