use crate::row::RowTuple;

/// Maximum number of rows accumulated before a batch is flushed (§3).
pub const MAX_BATCH_SIZE: usize = 1000;

/// Reference chunk size the tail loop pulls from the tailer per turn (§4.6).
pub const TAIL_CHUNK_SIZE: usize = 1000;

/// An ordered, ephemeral accumulator of row tuples destined for the same
/// target table. Carries no identity of its own.
#[derive(Debug, Default)]
pub struct Batch {
    rows: Vec<RowTuple>,
}

impl Batch {
    pub fn new() -> Self {
        Batch { rows: Vec::with_capacity(MAX_BATCH_SIZE) }
    }

    pub fn push(&mut self, row: RowTuple) {
        self.rows.push(row);
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= MAX_BATCH_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn take(&mut self) -> Vec<RowTuple> {
        std::mem::take(&mut self.rows)
    }

    pub fn rows(&self) -> &[RowTuple] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn fills_and_drains() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());
        batch.push(RowTuple::new(vec![Value::Int(1)]));
        assert_eq!(batch.len(), 1);
        let drained = batch.take();
        assert_eq!(drained.len(), 1);
        assert!(batch.is_empty());
    }
}
