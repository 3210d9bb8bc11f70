#![forbid(unsafe_code)]

//! Rollback and batch rules for optimistic writes.
//!
//! An optimistic write puts the new value into the store before its persist
//! call resolves. The rules here decide what happens when persistence
//! fails, under the assumption that other writes to the same field may have
//! started in the meantime.

use tracing::debug;

/// Decide whether a failed optimistic write should roll back.
///
/// `attempted` is the value this write put into the store; `previous` is
/// what it replaced. The store is reverted only if the field *still* holds
/// `attempted` — if a later write already changed it, rolling back would
/// stomp that newer action with stale data. Returns the value to restore,
/// or `None` to leave the store alone.
#[must_use]
pub fn resolve_failed_write<V>(current: &V, attempted: &V, previous: &V) -> Option<V>
where
    V: PartialEq + Clone,
{
    if current == attempted {
        Some(previous.clone())
    } else {
        debug!("skipping rollback, field was overwritten by a newer action");
        None
    }
}

/// Outcome of an aborted batch write.
#[derive(Debug)]
pub struct BatchAbort<E> {
    /// Writes that had already succeeded when the batch stopped.
    pub written: usize,
    /// The failure that stopped it.
    pub error: E,
}

/// Write a batch one item at a time, aborting on the first failure.
///
/// Items already written stay written — there is no compensating rollback;
/// the caller is expected to trigger a reload so partial success becomes
/// visible. Returns the number of items written.
pub fn write_each<I, E>(
    items: impl IntoIterator<Item = I>,
    mut write: impl FnMut(&I) -> Result<(), E>,
) -> Result<usize, BatchAbort<E>> {
    let mut written = 0;
    for item in items {
        match write(&item) {
            Ok(()) => written += 1,
            Err(error) => return Err(BatchAbort { written, error }),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_write_rolls_back_when_untouched() {
        // Toggle false -> true, save fails, nothing else wrote the field.
        assert_eq!(resolve_failed_write(&true, &true, &false), Some(false));
    }

    #[test]
    fn failed_write_keeps_newer_value() {
        // Toggle false -> true, then true -> false before the first failure
        // arrives: the field no longer holds the attempted value.
        assert_eq!(resolve_failed_write(&false, &true, &false), None);
    }

    #[test]
    fn batch_stops_at_first_failure() {
        let items = ["a", "b", "c", "d"];
        let result = write_each(items, |item| if *item == "c" { Err(*item) } else { Ok(()) });
        let abort = result.unwrap_err();
        assert_eq!(abort.written, 2);
        assert_eq!(abort.error, "c");
    }

    #[test]
    fn batch_counts_full_success() {
        let items = [1, 2, 3];
        let result: Result<usize, BatchAbort<()>> = write_each(items, |_| Ok(()));
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn empty_batch_is_a_trivial_success() {
        let result: Result<usize, BatchAbort<()>> = write_each(Vec::<u8>::new(), |_| Ok(()));
        assert_eq!(result.unwrap(), 0);
    }
}
