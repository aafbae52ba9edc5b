//! Chunking of selected ids into delete transactions

use std::num::NonZeroUsize;

/// One contiguous slice of the selection, deleted as a single transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 1-based position of the chunk within the run
    pub ordinal: usize,
    pub ids: &'a [String],
}

impl Chunk<'_> {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Split `ids` into consecutive chunks of at most `batch_size` elements.
///
/// Order is preserved and every id lands in exactly one chunk.
pub fn partition(ids: &[String], batch_size: NonZeroUsize) -> Vec<Chunk<'_>> {
    ids.chunks(batch_size.get())
        .enumerate()
        .map(|(idx, ids)| Chunk {
            ordinal: idx + 1,
            ids,
        })
        .collect()
}

/// Number of chunks `partition` produces for `len` ids
pub fn chunk_count(len: usize, batch_size: NonZeroUsize) -> usize {
    len.div_ceil(batch_size.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("doc-{}", i)).collect()
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_twenty_five_by_ten() {
        let ids = ids(25);
        let chunks = partition(&ids, size(10));

        let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(
            chunks.iter().map(|c| c.ordinal).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(chunks[2].ids[0], "doc-20");
    }

    #[test]
    fn test_partition_is_lossless_and_ordered() {
        for n in 0..40 {
            for b in 1..12 {
                let ids = ids(n);
                let chunks = partition(&ids, size(b));

                assert_eq!(chunks.len(), n.div_ceil(b), "n={} b={}", n, b);
                assert_eq!(chunks.len(), chunk_count(n, size(b)));
                assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= b));

                let rejoined: Vec<String> = chunks
                    .iter()
                    .flat_map(|c| c.ids.iter().cloned())
                    .collect();
                assert_eq!(rejoined, ids);
            }
        }
    }

    #[test]
    fn test_empty_selection_has_no_chunks() {
        assert!(partition(&[], size(10)).is_empty());
        assert_eq!(chunk_count(0, size(3)), 0);
    }

    #[test]
    fn test_batch_larger_than_selection() {
        let ids = ids(3);
        let chunks = partition(&ids, size(100));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].ids, &ids[..]);
    }
}
