//! Radix priority queue ("reap", component S, spec.md §4.S). No teacher
//! counterpart; grounded on `examples/original_source/src/reap.c`'s bucketed
//! monotone structure, used by `eliminator` to schedule candidates by
//! increasing occurrence-sum cost instead of a full binary heap.
const NUM_BUCKETS: usize = 33;

/// Bucketed min-priority queue over `u32` keys, monotonic in the value of
/// the last key popped (spec.md §3 "Lifetimes" style monotonic structures,
/// §4.S "monotonic in the `last_deleted` value").
#[derive(Debug)]
pub struct Reap {
    buckets: Vec<Vec<(u32, u32)>>,
    last_deleted: u32,
    len: usize,
}

fn bucket_of(key: u32, last_deleted: u32) -> usize {
    let x = key ^ last_deleted;
    if x == 0 {
        0
    } else {
        (32 - x.leading_zeros()) as usize
    }
}

impl Reap {
    pub fn new() -> Reap {
        Reap {
            buckets: vec![Vec::new(); NUM_BUCKETS],
            last_deleted: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `item` keyed by `key` (spec.md §4.S "bucket i holds keys k
    /// with 32 - clz(k XOR last_deleted) = i").
    pub fn push(&mut self, key: u32, item: u32) {
        let b = bucket_of(key, self.last_deleted);
        self.buckets[b].push((key, item));
        self.len += 1;
    }

    /// Scan the lowest non-empty bucket, redistribute its survivors into
    /// buckets relative to the new `last_deleted`, and return the minimum
    /// key's item (spec.md §4.S `pop`).
    pub fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        let b = self.buckets.iter().position(|b| !b.is_empty())?;
        if b == 0 {
            let (_, item) = self.buckets[0].pop().unwrap();
            self.len -= 1;
            return Some(item);
        }
        let entries = std::mem::take(&mut self.buckets[b]);
        let min_idx = entries
            .iter()
            .enumerate()
            .min_by_key(|(_, &(k, _))| k)
            .map(|(i, _)| i)
            .unwrap();
        let (min_key, min_item) = entries[min_idx];
        self.last_deleted = min_key;
        for (i, (key, item)) in entries.into_iter().enumerate() {
            if i == min_idx {
                continue;
            }
            let nb = bucket_of(key, self.last_deleted);
            self.buckets[nb].push((key, item));
        }
        self.len -= 1;
        Some(min_item)
    }
}

impl Default for Reap {
    fn default() -> Reap {
        Reap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_increasing_key_order() {
        let mut reap = Reap::new();
        reap.push(10, 100);
        reap.push(3, 30);
        reap.push(7, 70);
        let mut out = Vec::new();
        while let Some(item) = reap.pop() {
            out.push(item);
        }
        assert_eq!(out, vec![30, 70, 100]);
    }

    #[test]
    fn len_tracks_pending_items() {
        let mut reap = Reap::new();
        assert!(reap.is_empty());
        reap.push(1, 1);
        reap.push(2, 2);
        assert_eq!(reap.len(), 2);
        reap.pop();
        assert_eq!(reap.len(), 1);
    }
}
