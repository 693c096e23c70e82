use std::{collections::HashSet, fmt, hash::Hash};

/// Candidates split against the keys already stored.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDiff<R> {
    /// Rows to insert, in input order.
    pub fresh: Vec<R>,
    /// Candidates whose key is already stored.
    pub already_stored: usize,
    /// Candidates repeating a key seen earlier in the same batch.
    pub repeated: usize,
}

impl<R> BatchDiff<R> {
    /// True if nothing needs to be written.
    pub fn is_noop(&self) -> bool {
        self.fresh.is_empty()
    }
}

impl<R> fmt::Display for BatchDiff<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return write!(f, "No changes ({} already stored)", self.already_stored);
        }
        write!(
            f,
            "+ {} new, {} already stored, {} repeated in batch",
            self.fresh.len(),
            self.already_stored,
            self.repeated
        )
    }
}

/// Keeps the candidates whose key is not in `existing`, preserving order.
///
/// A key repeated inside `rows` is kept once (first occurrence), so one batch
/// never inserts the same key twice.
pub fn missing_rows<R, K, F>(rows: Vec<R>, existing: &HashSet<K>, key: F) -> BatchDiff<R>
where
    K: Eq + Hash,
    F: Fn(&R) -> K,
{
    let mut seen = HashSet::with_capacity(rows.len());
    let mut diff = BatchDiff {
        fresh: Vec::with_capacity(rows.len()),
        already_stored: 0,
        repeated: 0,
    };

    for row in rows {
        let k = key(&row);
        if existing.contains(&k) {
            diff.already_stored += 1;
        } else if !seen.insert(k) {
            diff.repeated += 1;
        } else {
            diff.fresh.push(row);
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn drops_stored_keys_and_keeps_order() {
        let existing = HashSet::from([2, 4]);
        let d = missing_rows(vec![5, 4, 3, 2, 1], &existing, |r| *r);
        assert_eq!(d.fresh, vec![5, 3, 1]);
        assert_eq!(d.already_stored, 2);
        assert_eq!(d.to_string(), "+ 3 new, 2 already stored, 0 repeated in batch");
    }

    #[test]
    fn collapses_repeats_within_batch() {
        let rows = vec![("a", 1), ("b", 2), ("a", 3)];
        let d = missing_rows(rows, &HashSet::new(), |r| r.0);
        assert_eq!(d.fresh, vec![("a", 1), ("b", 2)]);
        assert_eq!(d.repeated, 1);
    }

    #[test]
    fn everything_stored_is_noop() {
        let d = missing_rows(vec![1, 2], &HashSet::from([1, 2]), |r| *r);
        assert!(d.is_noop());
        assert_eq!(d.to_string(), "No changes (2 already stored)");
    }

    proptest! {
        #[test]
        fn fresh_keys_are_unique_and_unstored(
            rows in proptest::collection::vec(0u8..40, 0..200),
            stored in proptest::collection::hash_set(0u8..40, 0..20),
        ) {
            let n = rows.len();
            let d = missing_rows(rows, &stored, |r| *r);
            let fresh: HashSet<u8> = d.fresh.iter().copied().collect();
            prop_assert_eq!(fresh.len(), d.fresh.len());
            prop_assert!(fresh.is_disjoint(&stored));
            prop_assert_eq!(d.fresh.len() + d.already_stored + d.repeated, n);
        }
    }
}
