//! Unit propagation over watched literals (component F, spec.md §4.F).
//! Grounded on the teacher's `AssignIF::propagate`, adapted to the packed
//! `Watch` representation of `cdb::watch` and the arena-backed `ClauseDb`.
use crate::assign::AssignStack;
use crate::cdb::watch::Watch;
use crate::cdb::ClauseDb;
use crate::types::{AssignReason, ClauseRef, Lit};

/// Outcome of a BCP round: either everything propagated cleanly, or a
/// conflict clause/binary pair was found (spec.md §4.F "Failure").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Binary(Lit, Lit),
    Large(ClauseRef),
}

/// Drains `trail[propagated..]`, as spec.md §4.C mandates, returning the
/// first conflict encountered (if any).
pub fn propagate(asg: &mut AssignStack, cdb: &mut ClauseDb) -> Option<Conflict> {
    while let Some(lit) = asg.next_to_propagate() {
        if let Some(conflict) = propagate_literal(asg, cdb, lit) {
            return Some(conflict);
        }
    }
    None
}

/// Process every watch on `NOT lit` (the literal that just became false).
/// Binary watches resolve in O(1); large-clause watches may relocate to a
/// fresh literal, in which case the clause's own `lits[0..2]` pair -- never
/// the cached `blocker` -- is the ground truth for "which two literals are
/// currently watched" (spec.md §9 "first two literals are the watched
/// literals"). `blocker` is only ever used as a pre-check to skip loading
/// the clause body; a stale blocker costs extra ticks, never correctness.
fn propagate_literal(asg: &mut AssignStack, cdb: &mut ClauseDb, lit: Lit) -> Option<Conflict> {
    let not_lit = !lit;
    let level = asg.level(lit.var());
    let mut i = 0;
    while i < cdb.watches.list(not_lit).len() {
        let word = cdb.watches.list(not_lit)[i];
        match Watch::unpack(word) {
            Watch::Binary { other, .. } => match asg.value(other) {
                Some(true) => i += 1,
                Some(false) => return Some(Conflict::Binary(not_lit, other)),
                None => {
                    asg.assign(other, level, AssignReason::Binary(not_lit));
                    i += 1;
                }
            },
            Watch::Large { cref, blocker } => {
                if asg.is_true(blocker) {
                    i += 1;
                    continue;
                }
                cdb.ticks += 1;
                ensure_watched_at_position1(cdb, cref, not_lit);
                let other = cdb.lit_at(cref, 0);
                if asg.is_true(other) {
                    cdb.watches
                        .set_word_at(not_lit, i, (Watch::Large { cref, blocker: other }).pack());
                    i += 1;
                    continue;
                }
                match find_replacement(asg, cdb, cref) {
                    Some(new_lit) => {
                        cdb.swap_lits(cref, 1, position_of(cdb, cref, new_lit));
                        cdb.watches.push_large(new_lit, cref, other);
                        cdb.watches.remove_at(not_lit, i);
                        // the swap-remove brought a different entry into
                        // slot `i`; re-examine it without advancing.
                    }
                    None => {
                        if asg.is_false(other) {
                            return Some(Conflict::Large(cref));
                        }
                        asg.assign(other, level, AssignReason::Large(cref));
                        cdb.watches
                            .set_word_at(not_lit, i, (Watch::Large { cref, blocker: other }).pack());
                        i += 1;
                    }
                }
            }
        }
    }
    None
}

/// Ensure `not_lit` sits at body position 1, swapping with position 0 if
/// needed, so position 0 always holds "the other watched literal" after
/// this call (spec.md §4.F "if first watch is NOT lit, swap to position 1").
fn ensure_watched_at_position1(cdb: &mut ClauseDb, cref: ClauseRef, not_lit: Lit) {
    if cdb.lit_at(cref, 0) == not_lit {
        cdb.swap_lits(cref, 0, 1);
    }
}

/// Search positions `2..size` for a literal that is not false.
fn find_replacement(asg: &AssignStack, cdb: &ClauseDb, cref: ClauseRef) -> Option<Lit> {
    let lits = cdb.lits(cref);
    lits[2..].iter().copied().find(|&l| !asg.is_false(l))
}

fn position_of(cdb: &ClauseDb, cref: ClauseRef, target: Lit) -> usize {
    cdb.lits(cref).iter().position(|&l| l == target).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssignReason, Lit};

    fn lit(x: i32) -> Lit {
        Lit::from_dimacs(x)
    }

    #[test]
    fn binary_clause_propagates_unit() {
        let mut asg = AssignStack::new(4);
        let mut cdb = ClauseDb::new(4);
        cdb.watches.push_binary(lit(-1), lit(2), false);
        cdb.watches.push_binary(lit(-2), lit(1), false);
        asg.new_decision_level();
        asg.assign(lit(1), 1, AssignReason::Decision);
        let conflict = propagate(&mut asg, &mut cdb);
        assert!(conflict.is_none());
        assert_eq!(asg.value(lit(2)), Some(true));
    }

    #[test]
    fn binary_clause_conflict_detected() {
        let mut asg = AssignStack::new(4);
        let mut cdb = ClauseDb::new(4);
        cdb.watches.push_binary(lit(-1), lit(2), false);
        cdb.watches.push_binary(lit(-2), lit(1), false);
        asg.new_decision_level();
        asg.assign(lit(1), 1, AssignReason::Decision);
        asg.assign(lit(-2), 1, AssignReason::Decision);
        let conflict = propagate(&mut asg, &mut cdb);
        assert!(conflict.is_some());
    }

    #[test]
    fn large_clause_unit_propagates() {
        let mut asg = AssignStack::new(4);
        let mut cdb = ClauseDb::new(4);
        cdb.new_clause(&[lit(1), lit(2), lit(3)], false, 0).unwrap();
        asg.new_decision_level();
        asg.assign(lit(-1), 1, AssignReason::Decision);
        asg.assign(lit(-3), 1, AssignReason::Decision);
        let conflict = propagate(&mut asg, &mut cdb);
        assert!(conflict.is_none());
        assert_eq!(asg.value(lit(2)), Some(true));
    }

    #[test]
    fn large_clause_rewatches_away_from_falsified_literal() {
        let mut asg = AssignStack::new(5);
        let mut cdb = ClauseDb::new(5);
        cdb.new_clause(&[lit(1), lit(2), lit(3), lit(4)], false, 0).unwrap();
        asg.new_decision_level();
        asg.assign(lit(-1), 1, AssignReason::Decision);
        assert!(propagate(&mut asg, &mut cdb).is_none());
        // clause should now watch two of {2,3,4}; falsifying a second
        // original watch (2) must not lose track of the clause.
        asg.new_decision_level();
        asg.assign(lit(-2), 2, AssignReason::Decision);
        assert!(propagate(&mut asg, &mut cdb).is_none());
        asg.new_decision_level();
        asg.assign(lit(-3), 3, AssignReason::Decision);
        let conflict = propagate(&mut asg, &mut cdb);
        assert!(conflict.is_none());
        assert_eq!(asg.value(lit(4)), Some(true));
    }
}
