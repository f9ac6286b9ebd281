//! Helpers for working within SQLite limits.

/// Parent rows per `IN (...)` query.
///
/// Stays well below SQLITE_MAX_VARIABLE_NUMBER so a query can carry a few
/// more bound parameters next to the list.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Split `items` into slices small enough for one `IN (...)` query.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_for_sqlite() {
        let empty: Vec<i64> = vec![];
        assert_eq!(chunk_for_sqlite(&empty).count(), 0);

        let items: Vec<i64> = (0..1_200).collect();
        let sizes: Vec<usize> = chunk_for_sqlite(&items).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![500, 500, 200]);
    }
}
