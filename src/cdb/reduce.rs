//! Reduction and tiering (component J, spec.md §4.G step 8 / §4.J).
//!
//! Every learned clause is tiered by glue at creation time and re-tiered on
//! reuse; `reduce` itself only decides which tier-3 clauses to discard. This
//! mirrors the teacher's `cdb::check_and_reduce` / `convert_to_permanent`
//! split between "classification" (done inline during conflict analysis)
//! and "collection" (done periodically here).
use super::{ClauseDb, NULL_CREF};
use crate::types::{ClauseFlag, ClauseRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    One,
    Two,
    Three,
}

/// Classify a freshly learned (or re-derived) clause by its glue, per
/// spec.md §4.G step 8. `keep` clauses (tier 1) are never discarded by
/// `reduce`; tier 2/3 carry a `used` counter of 2/1 respectively that
/// `promote` can only lower, never raise.
pub fn tier_of(glue: u32, tier1: u32, tier2: u32) -> Tier {
    if glue <= tier1 {
        Tier::One
    } else if glue <= tier2 {
        Tier::Two
    } else {
        Tier::Three
    }
}

pub fn apply_tier(cdb: &mut ClauseDb, cref: ClauseRef, tier: Tier) {
    match tier {
        Tier::One => {
            cdb.set_flag(cref, ClauseFlag::KEEP, true);
            cdb.set_flag(cref, ClauseFlag::USED2, false);
            cdb.set_flag(cref, ClauseFlag::USED1, false);
        }
        Tier::Two => {
            cdb.set_flag(cref, ClauseFlag::KEEP, false);
            cdb.set_flag(cref, ClauseFlag::USED2, true);
            cdb.set_flag(cref, ClauseFlag::USED1, false);
        }
        Tier::Three => {
            cdb.set_flag(cref, ClauseFlag::KEEP, false);
            cdb.set_flag(cref, ClauseFlag::USED2, false);
            cdb.set_flag(cref, ClauseFlag::USED1, true);
        }
    }
}

/// Promotion on reuse: a tier-2/3 clause that appears in a later conflict
/// has its glue recomputed; if the new glue is lower, its tier can improve
/// but never get worse (spec.md §4.G step 8 "Promotion on later reuse can
/// only lower glue/tier").
pub fn promote(cdb: &mut ClauseDb, cref: ClauseRef, recomputed_glue: u32, tier1: u32, tier2: u32) {
    if recomputed_glue < cdb.view(cref).glue() {
        cdb.set_glue(cref, recomputed_glue);
        let tier = tier_of(recomputed_glue, tier1, tier2);
        apply_tier(cdb, cref, tier);
    }
}

/// One reduction pass: of all non-`keep` redundant clauses not currently
/// locked (used as a reason, `locked` ref supplied by the caller), keep the
/// `reducefraction`% with the smallest glue, ties broken by larger `used`
/// then by insertion order (newest first), and mark the rest garbage.
pub fn reduce(cdb: &mut ClauseDb, candidates: &[ClauseRef], reducefraction: u32) -> usize {
    let mut scored: Vec<(ClauseRef, u32, u8)> = candidates
        .iter()
        .map(|&cref| {
            let view = cdb.view(cref);
            let used = if view.header.flags.contains(ClauseFlag::USED2) {
                2
            } else {
                1
            };
            (cref, view.glue(), used)
        })
        .collect();
    // stable sort: smallest glue first; among ties, larger `used` first,
    // then later allocation (larger ref, i.e. newer) first -- achieved by
    // reversing the slice before a stable sort on (glue, -used).
    scored.reverse();
    scored.sort_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)));

    let keep_count = (scored.len() * reducefraction as usize) / 100;
    let mut discarded = 0;
    for &(cref, _, _) in scored.iter().skip(keep_count) {
        if cref != NULL_CREF {
            cdb.mark_garbage(cref);
            discarded += 1;
        }
    }
    discarded
}

/// The reduce interval itself scales with `log2` of the irredundant clause
/// count, per spec.md §4.J "scaled by log² of irredundant-clause count".
pub fn next_reduce_limit(conflicts_now: u64, reduceint: u64, num_irredundant: usize) -> u64 {
    let n = (num_irredundant.max(1) as f64).log2();
    conflicts_now + reduceint.max(1) + (reduceint as f64 * n * n) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Lit;

    fn lits(xs: &[i32]) -> Vec<Lit> {
        xs.iter().map(|&x| Lit::from_dimacs(x)).collect()
    }

    #[test]
    fn reduce_keeps_lowest_glue_fraction() {
        let mut cdb = ClauseDb::new(8);
        let mut refs = Vec::new();
        for g in 0..10u32 {
            let cref = cdb.new_clause(&lits(&[1, 2, 3]), true, g).unwrap();
            refs.push(cref);
        }
        let discarded = reduce(&mut cdb, &refs, 50);
        assert_eq!(discarded, 5);
        // the 5 highest-glue clauses should be the ones marked garbage.
        for &cref in &refs[5..] {
            assert!(cdb.is_garbage(cref));
        }
        for &cref in &refs[..5] {
            assert!(!cdb.is_garbage(cref));
        }
    }

    #[test]
    fn tier_classification_matches_bounds() {
        assert_eq!(tier_of(1, 2, 6), Tier::One);
        assert_eq!(tier_of(2, 2, 6), Tier::One);
        assert_eq!(tier_of(3, 2, 6), Tier::Two);
        assert_eq!(tier_of(7, 2, 6), Tier::Three);
    }
}
