//! Buffers parsed rows and flushes them in bounded, atomic upsert batches.

use sqlx::PgPool;
use std::collections::HashSet;

use stockroom_core::importer::{clamp_chunk_size, ProductRow};
use stockroom_db::repositories::ProductRepo;

/// Accumulates [`ProductRow`]s and writes them through
/// [`ProductRepo::bulk_upsert`] whenever the buffer reaches capacity.
///
/// Flush counts report rows consumed from the file, duplicates included, so
/// callers can use them directly for progress bookkeeping.
pub struct UpsertBatcher<'a> {
    pool: &'a PgPool,
    capacity: usize,
    buffer: Vec<ProductRow>,
}

impl<'a> UpsertBatcher<'a> {
    /// Create a batcher flushing every `capacity` rows.
    ///
    /// The capacity is clamped into `1..=MAX_CHUNK_SIZE`; the chunk size
    /// comes in through the task payload and a too-large batch would blow
    /// the statement bind-parameter limit on flush.
    pub fn new(pool: &'a PgPool, capacity: usize) -> Self {
        Self {
            pool,
            capacity: clamp_chunk_size(capacity),
            buffer: Vec::new(),
        }
    }

    /// Number of rows currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffer a row, flushing automatically when the buffer is full.
    ///
    /// Returns the number of rows flushed: 0 means the row was only
    /// buffered.
    pub async fn add(&mut self, row: ProductRow) -> Result<usize, sqlx::Error> {
        self.buffer.push(row);
        if self.buffer.len() >= self.capacity {
            self.flush().await
        } else {
            Ok(0)
        }
    }

    /// Flush the buffer in one atomic upsert statement. No-op on an empty
    /// buffer. Returns the number of buffered rows consumed.
    ///
    /// The buffer is de-duplicated by `sku_lower` first, keeping the last
    /// occurrence: Postgres rejects an `ON CONFLICT DO UPDATE` that touches
    /// the same row twice within one statement, and last-wins matches the
    /// file-order outcome of replaying the rows one by one.
    pub async fn flush(&mut self) -> Result<usize, sqlx::Error> {
        if self.buffer.is_empty() {
            return Ok(0);
        }
        let consumed = self.buffer.len();
        let rows = dedupe_last_wins(std::mem::take(&mut self.buffer));
        ProductRepo::bulk_upsert(self.pool, &rows).await?;
        Ok(consumed)
    }
}

/// Keep only the last occurrence of each `sku_lower`, preserving relative
/// order of the survivors.
fn dedupe_last_wins(rows: Vec<ProductRow>) -> Vec<ProductRow> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut unique: Vec<ProductRow> = Vec::with_capacity(rows.len());
    for row in rows.into_iter().rev() {
        if seen.insert(row.sku_lower.clone()) {
            unique.push(row);
        }
    }
    unique.reverse();
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sku: &str, name: &str) -> ProductRow {
        ProductRow {
            sku: sku.to_string(),
            sku_lower: sku.to_lowercase(),
            name: name.to_string(),
            description: String::new(),
            price: None,
            active: true,
        }
    }

    #[test]
    fn test_dedupe_keeps_last_occurrence() {
        let rows = vec![row("A1", "first"), row("B2", "only"), row("a1", "last")];
        let deduped = dedupe_last_wins(rows);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].sku_lower, "b2");
        assert_eq!(deduped[1].sku_lower, "a1");
        assert_eq!(deduped[1].name, "last");
    }

    #[test]
    fn test_dedupe_no_duplicates_is_identity() {
        let rows = vec![row("A1", "a"), row("B2", "b"), row("C3", "c")];
        let deduped = dedupe_last_wins(rows);
        let keys: Vec<_> = deduped.iter().map(|r| r.sku_lower.as_str()).collect();
        assert_eq!(keys, ["a1", "b2", "c3"]);
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe_last_wins(Vec::new()).is_empty());
    }
}
