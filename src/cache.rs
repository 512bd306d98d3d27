//! Assignment cache (component M, spec.md §4.M). No teacher counterpart
//! (splr has no phase cache); grounded on `examples/original_source/src/nonces.c`
//! for the rolling-nonce signature and on `examples/original_source/src/cache.c`
//! for the largest-`unsatisfied`-then-oldest eviction rule, expressed with
//! the plain-struct-plus-methods idiom `cdb::reduce` already establishes.
use crate::types::Random;

const NUM_NONCES: usize = 32;

/// Rolling table of odd 64-bit nonces, seeded once at solver construction
/// from the shared LCG (spec.md §9 "Randomness").
#[derive(Debug, Clone)]
pub struct NonceTable {
    nonces: [u64; NUM_NONCES],
}

impl NonceTable {
    pub fn new(seed: u64) -> NonceTable {
        let mut rng = Random::new(seed);
        let mut nonces = [0u64; NUM_NONCES];
        for n in nonces.iter_mut() {
            *n = rng.next_u64() | 1;
        }
        NonceTable { nonces }
    }

    /// `signature(saved) = sum +-(idx+1) * nonce[i mod N]` (spec.md §4.M).
    pub fn signature(&self, saved: &[bool]) -> u64 {
        let mut sig = 0u64;
        for (i, &phase) in saved.iter().enumerate() {
            let term = ((i as u64) + 1).wrapping_mul(self.nonces[i % NUM_NONCES]);
            sig = if phase { sig.wrapping_add(term) } else { sig.wrapping_sub(term) };
        }
        sig
    }
}

#[derive(Debug, Clone)]
struct Line {
    bits: Vec<bool>,
    signature: u64,
    unsatisfied: u32,
    inserted: u64,
}

/// LRU-ish store of full assignments, sized to `ceil(log2(inserted+1))`
/// lines as spec.md §3 "Cache line" prescribes.
#[derive(Debug)]
pub struct Cache {
    nonces: NonceTable,
    lines: Vec<Line>,
    inserted: u64,
    rng: Random,
}

impl Cache {
    pub fn new(seed: u64) -> Cache {
        Cache {
            nonces: NonceTable::new(seed),
            lines: Vec::new(),
            inserted: 0,
            rng: Random::new(seed ^ 0x5bd1_e995),
        }
    }

    fn target_capacity(&self) -> usize {
        (64 - (self.inserted + 1).leading_zeros()) as usize
    }

    /// Insert a fresh snapshot, evicting the worst line if the cache is
    /// already at its size bound (spec.md §4.M `insert`).
    pub fn insert(&mut self, saved: &[bool], unsatisfied: u32) {
        let signature = self.nonces.signature(saved);
        if self.lines.iter().any(|l| l.signature == signature) {
            return;
        }
        self.inserted += 1;
        let cap = self.target_capacity().max(1);
        if self.lines.len() < cap {
            self.lines.push(Line {
                bits: saved.to_vec(),
                signature,
                unsatisfied,
                inserted: self.inserted,
            });
            return;
        }
        let (worst, _) = self
            .lines
            .iter()
            .enumerate()
            .max_by_key(|(_, l)| (l.unsatisfied, std::cmp::Reverse(l.inserted)))
            .unwrap();
        if self.lines[worst].unsatisfied > unsatisfied {
            self.lines[worst] = Line {
                bits: saved.to_vec(),
                signature,
                unsatisfied,
                inserted: self.inserted,
            };
        }
    }

    /// Return a candidate snapshot, uniform-random by default or
    /// weighted by `1/(1+unsatisfied)` when `cachesample` is enabled
    /// (spec.md §4.M `lookup`).
    pub fn lookup(&mut self, weighted: bool) -> Option<&[bool]> {
        if self.lines.is_empty() {
            return None;
        }
        let idx = if !weighted {
            self.rng.next_below(self.lines.len())
        } else {
            let weights: Vec<f64> = self.lines.iter().map(|l| 1.0 / (1.0 + l.unsatisfied as f64)).collect();
            let total: f64 = weights.iter().sum();
            let mut pick = self.rng.next_f64() * total;
            let mut chosen = 0;
            for (i, w) in weights.iter().enumerate() {
                if pick < *w {
                    chosen = i;
                    break;
                }
                pick -= w;
            }
            chosen
        };
        Some(&self.lines[idx].bits)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_sign_sensitive() {
        let table = NonceTable::new(7);
        let a = table.signature(&[true, false, true]);
        let b = table.signature(&[false, false, true]);
        assert_ne!(a, b);
    }

    #[test]
    fn eviction_prefers_largest_unsatisfied() {
        let mut cache = Cache::new(1);
        cache.insert(&[true, true, true], 5);
        cache.insert(&[true, true, false], 3);
        cache.insert(&[true, false, true], 7);
        // the cache is now at capacity; the worst line (unsatisfied == 7)
        // must be the one replaced by a strictly better incoming snapshot.
        cache.insert(&[true, false, false], 1);
        assert!(cache.lines.iter().all(|l| l.unsatisfied != 7));
        assert!(cache.lines.iter().any(|l| l.unsatisfied == 1));
    }

    #[test]
    fn duplicate_signature_is_ignored() {
        let mut cache = Cache::new(3);
        cache.insert(&[true, true], 2);
        cache.insert(&[true, true], 0);
        assert_eq!(cache.len(), 1);
    }
}
