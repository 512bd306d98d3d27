//! Clause database: arena allocation (component A), the watch lists it owns
//! (component B) and reduction/tiering (component J, in the `reduce`
//! submodule). Grounded on the teacher's `cdb::ClauseDB` concept (a single
//! owner of both the allocator and its watch lists) but reworked to the
//! word-arena storage spec.md §3/§9 requires instead of the teacher's
//! `Vec<Box<Clause>>`.
pub mod clause;
pub mod reduce;
pub mod watch;

use std::collections::HashMap;

use crate::error::SolverError;
use crate::types::{ClauseFlag, ClauseRef, Lit, INVALID_REF};
use clause::{ceil_to_word, ClauseHeader, ClauseView};
use watch::WatchLists;

/// `2^31` words (spec.md §3 "Arena"); exhausting it is fatal.
pub const MAX_ARENA: usize = 1 << 31;

#[derive(Debug, Default, Clone, Copy)]
pub struct ClauseDbStats {
    pub num_irredundant: usize,
    pub num_redundant: usize,
    pub num_garbage: usize,
    pub num_compactions: usize,
}

/// Owner of the clause arena and the watch lists that index into it.
#[derive(Debug)]
pub struct ClauseDb {
    arena: Vec<u32>,
    pub watches: WatchLists,
    pub stats: ClauseDbStats,
    /// Running tick counter, charged per clause-body word touched (spec.md
    /// §4.F / §5 "Suspension points").
    pub ticks: u64,
}

impl ClauseDb {
    pub fn new(num_vars: usize) -> ClauseDb {
        ClauseDb {
            arena: Vec::new(),
            watches: WatchLists::new(num_vars),
            stats: ClauseDbStats::default(),
            ticks: 0,
        }
    }

    pub fn ensure_vars(&mut self, num_vars: usize) {
        self.watches.ensure_vars(num_vars);
    }

    /// Allocate a clause in the arena and attach its watches. Binary clauses
    /// never reach here; callers register them directly in the watch lists
    /// (spec.md §9).
    pub fn new_clause(
        &mut self,
        lits: &[Lit],
        redundant: bool,
        glue: u32,
    ) -> Result<ClauseRef, SolverError> {
        debug_assert!(lits.len() >= 3, "binary/unit clauses are not arena-allocated");
        let header = ClauseHeader {
            flags: if redundant {
                ClauseFlag::REDUNDANT
            } else {
                ClauseFlag::empty()
            },
            glue,
            size: lits.len(),
        };
        let cref = self.allocate(&header, lits)?;
        let view = self.view(cref);
        let l0 = view.lits()[0];
        let l1 = view.lits()[1];
        self.watches.push_large(l0, cref, l1);
        self.watches.push_large(l1, cref, l0);
        if redundant {
            self.stats.num_redundant += 1;
        } else {
            self.stats.num_irredundant += 1;
        }
        Ok(cref)
    }

    fn allocate(&mut self, header: &ClauseHeader, lits: &[Lit]) -> Result<ClauseRef, SolverError> {
        let words_needed = ceil_to_word(header.size);
        if self.arena.len() + words_needed > MAX_ARENA {
            return Err(SolverError::ArenaExhausted);
        }
        let cref = self.arena.len() as ClauseRef;
        self.arena.push(header.pack());
        if header.header_words() == 2 {
            self.arena.push(header.size as u32);
        }
        for &l in lits {
            self.arena.push(l.index() as u32);
        }
        Ok(cref)
    }

    pub fn view(&self, cref: ClauseRef) -> ClauseView<'_> {
        ClauseView::from_words(&self.arena[cref as usize..])
    }

    pub fn lits(&self, cref: ClauseRef) -> &[Lit] {
        self.view(cref).lits()
    }

    pub fn lit_at(&self, cref: ClauseRef, i: usize) -> Lit {
        self.lits(cref)[i]
    }

    fn header_at(&self, cref: ClauseRef) -> ClauseHeader {
        self.view(cref).header
    }

    fn body_offset(&self, cref: ClauseRef) -> usize {
        cref as usize + self.header_at(cref).header_words()
    }

    /// Swap the literals at body positions `i`/`j`, keeping the physical
    /// `lits[0..2]` pair authoritative for "which two literals are
    /// watched" (spec.md §3 "Clause" invariant, §4.F "move that literal to
    /// position 1 and rewatch").
    pub fn swap_lits(&mut self, cref: ClauseRef, i: usize, j: usize) {
        let offset = self.body_offset(cref);
        self.arena.swap(offset + i, offset + j);
    }

    fn set_header(&mut self, cref: ClauseRef, header: ClauseHeader) {
        self.arena[cref as usize] = header.pack();
    }

    pub fn mark_garbage(&mut self, cref: ClauseRef) {
        let mut header = self.header_at(cref);
        if !header.flags.contains(ClauseFlag::GARBAGE) {
            header.flags.insert(ClauseFlag::GARBAGE);
            self.set_header(cref, header);
            self.stats.num_garbage += 1;
            if header.flags.contains(ClauseFlag::REDUNDANT) {
                self.stats.num_redundant -= 1;
            } else {
                self.stats.num_irredundant -= 1;
            }
        }
    }

    pub fn set_flag(&mut self, cref: ClauseRef, flag: ClauseFlag, on: bool) {
        let mut header = self.header_at(cref);
        if on {
            header.flags.insert(flag);
        } else {
            header.flags.remove(flag);
        }
        self.set_header(cref, header);
    }

    pub fn set_glue(&mut self, cref: ClauseRef, glue: u32) {
        let mut header = self.header_at(cref);
        header.glue = glue;
        self.set_header(cref, header);
    }

    pub fn is_garbage(&self, cref: ClauseRef) -> bool {
        self.header_at(cref).flags.contains(ClauseFlag::GARBAGE)
    }

    pub fn live_fraction(&self) -> f64 {
        if self.arena.is_empty() {
            1.0
        } else {
            let live_words: usize = self
                .iter_live_refs()
                .map(|cref| ceil_to_word(self.header_at(cref).size))
                .sum();
            live_words as f64 / self.arena.len() as f64
        }
    }

    /// Iterate over every clause reference still holding a valid header,
    /// garbage or not. Used internally for accounting and by `shrink` to
    /// enumerate what to copy forward.
    fn iter_live_refs(&self) -> impl Iterator<Item = ClauseRef> + '_ {
        let mut refs = Vec::new();
        let mut at = 0usize;
        while at < self.arena.len() {
            let header = ClauseHeader::unpack(
                self.arena[at],
                if self.arena[at] & 0xff == 0xff {
                    Some(self.arena[at + 1])
                } else {
                    None
                },
            );
            let words = ceil_to_word(header.size);
            if !header.flags.contains(ClauseFlag::GARBAGE) {
                refs.push(at as ClauseRef);
            }
            at += words;
        }
        refs.into_iter()
    }

    /// Compact the arena when the live fraction drops below 25% (spec.md
    /// §4.A). Returns a remap of every surviving `ClauseRef` so callers
    /// (watch lists already rewritten here, but reasons and the learnt
    /// queue live outside this module) can fix up their own references.
    pub fn shrink(&mut self) -> Option<HashMap<ClauseRef, ClauseRef>> {
        if self.arena.is_empty() || self.live_fraction() >= 0.25 {
            return None;
        }
        let live: Vec<ClauseRef> = self.iter_live_refs().collect();
        let mut new_arena = Vec::with_capacity(self.arena.len());
        let mut remap = HashMap::with_capacity(live.len());
        for cref in live {
            let header = self.header_at(cref);
            let words = ceil_to_word(header.size);
            let new_cref = new_arena.len() as ClauseRef;
            new_arena.extend_from_slice(&self.arena[cref as usize..cref as usize + words]);
            remap.insert(cref, new_cref);
        }
        self.arena = new_arena;
        self.stats.num_compactions += 1;
        self.stats.num_garbage = 0;
        self.rewrite_watches();
        Some(remap)
    }

    /// Watch lists are keyed by literal, not by clause; rebuild them from
    /// scratch off the (already compacted) arena rather than patch each
    /// packed word in place.
    fn rewrite_watches(&mut self) {
        self.watches.clear_all();
        let mut at = 0usize;
        while at < self.arena.len() {
            let cref = at as ClauseRef;
            let header = self.header_at(cref);
            let words = ceil_to_word(header.size);
            if !header.flags.contains(ClauseFlag::GARBAGE) {
                let lits = self.lits(cref).to_vec();
                self.watches.push_large(lits[0], cref, lits[1]);
                self.watches.push_large(lits[1], cref, lits[0]);
            }
            at += words;
        }
    }

    pub fn defrag_watches_if_needed(&mut self, defraglim: u32) {
        if self.watches.garbage_fraction() * 100.0 >= (100 - defraglim.min(100)) as f64 {
            self.watches.defrag();
        }
    }

    /// Every live (non-garbage) arena-allocated clause, `(redundant, lits)`
    /// pairs. Binary clauses are never arena-allocated (spec.md §9) so
    /// callers that need the whole current clause set (`walk`, `validator`)
    /// must still merge this with the binary watch lists separately.
    pub fn live_large_clauses(&self) -> Vec<(bool, Vec<Lit>)> {
        self.iter_live_refs()
            .map(|cref| {
                let view = self.view(cref);
                (view.is_redundant(), view.lits().to_vec())
            })
            .collect()
    }

    /// Redundant, non-`KEEP` (tier 2/3) clause refs: the candidate pool
    /// `cdb::reduce::reduce` sorts and trims (spec.md §4.J). Excludes
    /// tier-1 clauses, which `reduce` never discards. Callers must still
    /// exclude any ref currently locked as an assignment's reason -- this
    /// module has no view of `AssignStack` to do that itself.
    pub fn reducible_refs(&self) -> Vec<ClauseRef> {
        self.iter_live_refs()
            .filter(|&cref| {
                let view = self.view(cref);
                view.is_redundant() && !view.header.flags.contains(ClauseFlag::KEEP)
            })
            .collect()
    }
}

pub const NULL_CREF: ClauseRef = INVALID_REF;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Lit;

    fn lits(xs: &[i32]) -> Vec<Lit> {
        xs.iter().map(|&x| Lit::from_dimacs(x)).collect()
    }

    #[test]
    fn allocate_and_read_back_clause() {
        let mut cdb = ClauseDb::new(8);
        let cref = cdb.new_clause(&lits(&[1, -2, 3]), false, 0).unwrap();
        assert_eq!(cdb.lits(cref), lits(&[1, -2, 3]).as_slice());
        assert!(!cdb.is_garbage(cref));
    }

    #[test]
    fn marking_garbage_updates_stats() {
        let mut cdb = ClauseDb::new(8);
        let cref = cdb.new_clause(&lits(&[1, 2, 3]), false, 0).unwrap();
        assert_eq!(cdb.stats.num_irredundant, 1);
        cdb.mark_garbage(cref);
        assert!(cdb.is_garbage(cref));
        assert_eq!(cdb.stats.num_irredundant, 0);
        assert_eq!(cdb.stats.num_garbage, 1);
    }

    #[test]
    fn shrink_compacts_when_mostly_garbage() {
        let mut cdb = ClauseDb::new(8);
        let mut refs = Vec::new();
        for _ in 0..8 {
            refs.push(cdb.new_clause(&lits(&[1, 2, 3]), false, 0).unwrap());
        }
        for &cref in &refs[..7] {
            cdb.mark_garbage(cref);
        }
        let remap = cdb.shrink();
        assert!(remap.is_some());
        assert!(cdb.live_fraction() > 0.99);
    }
}
