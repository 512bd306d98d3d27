//! Probing suite: failed-literal probing, binary transitive reduction and
//! vivification (component O, spec.md §4.O). No direct teacher counterpart
//! (splr has no probing pass). `examples/original_source/src/probe.c` exists
//! in the pack but is a thin dispatcher onto `kissat_substitute`,
//! `kissat_binary_clauses_backbone`, `kissat_vivify` and
//! `kissat_transitive_reduction`, none of which have surviving source files
//! here -- there is no original_source counterpart for the actual
//! failed-literal/transitive-reduction/vivification algorithms below, which
//! are derived directly from spec.md §4.O and expressed with this crate's
//! own `propagate` module rather than duplicating BCP.
use crate::assign::AssignStack;
use crate::cdb::ClauseDb;
use crate::propagate::propagate;
use crate::types::{AssignReason, Lit};

#[derive(Debug, Default, Clone, Copy)]
pub struct ProbeStats {
    pub failed_literals: u32,
    pub transitive_removed: u32,
    pub vivified_shrunk: u32,
    /// Set if forcing a failed literal's negation at level 0 itself
    /// propagated to a conflict, meaning the formula is unsatisfiable.
    pub became_inconsistent: bool,
}

/// Outcome of probing a single candidate literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeOutcome {
    /// `lit` was already assigned; nothing to probe.
    Skipped,
    /// `lit` survived the probe unassigned.
    Survived,
    /// `lit` failed and its negation was forced at level 0.
    Failed,
    /// `lit` failed, and forcing its negation itself propagated to a
    /// conflict: the formula is unsatisfiable at level 0.
    FailedAndInconsistent,
}

/// Assume `lit` at a fresh decision level and propagate; if the only
/// decision on the resulting conflict path is `lit` itself, `!lit` is
/// forced at level 0 (spec.md §4.O "Failed literal").
fn probe_one(asg: &mut AssignStack, cdb: &mut ClauseDb, lit: Lit) -> ProbeOutcome {
    if asg.value(lit).is_some() {
        return ProbeOutcome::Skipped;
    }
    debug_assert_eq!(asg.decision_level(), 0);
    asg.new_decision_level();
    asg.assign(lit, 1, AssignReason::Decision);
    let conflict = propagate(asg, cdb);
    asg.backtrack(0);
    if conflict.is_none() {
        return ProbeOutcome::Survived;
    }
    if asg.value(!lit).is_none() {
        asg.assign(!lit, 0, AssignReason::Unit);
        if propagate(asg, cdb).is_some() {
            return ProbeOutcome::FailedAndInconsistent;
        }
    }
    ProbeOutcome::Failed
}

/// Assume `lit` at a fresh decision level and propagate; if the only
/// decision on the resulting conflict path is `lit` itself, `!lit` is
/// forced at level 0 (spec.md §4.O "Failed literal").
pub fn probe_failed_literal(asg: &mut AssignStack, cdb: &mut ClauseDb, lit: Lit) -> bool {
    matches!(probe_one(asg, cdb, lit), ProbeOutcome::Failed | ProbeOutcome::FailedAndInconsistent)
}

/// Drive `probe_failed_literal` over every free literal, ticking a budget
/// so a timed-out pass still leaves the state consistent. Stops early if a
/// forced literal itself turns out to be inconsistent, since no further
/// probing can change that verdict.
pub fn run_failed_literal_pass(
    asg: &mut AssignStack,
    cdb: &mut ClauseDb,
    candidates: &[Lit],
    tick_budget: u64,
) -> ProbeStats {
    let mut stats = ProbeStats::default();
    let mut ticks = 0u64;
    for &lit in candidates {
        if ticks >= tick_budget {
            break;
        }
        match probe_one(asg, cdb, lit) {
            ProbeOutcome::Failed => stats.failed_literals += 1,
            ProbeOutcome::FailedAndInconsistent => {
                stats.failed_literals += 1;
                stats.became_inconsistent = true;
                break;
            }
            ProbeOutcome::Survived | ProbeOutcome::Skipped => {}
        }
        ticks += 8;
    }
    stats
}

/// Remove a binary clause `(a, b)` if assuming `!a` already forces `b`
/// through some *other* binary chain (spec.md §4.O "Transitive reduction").
/// `binaries` is the full current binary-clause adjacency (`a -> b` meaning
/// clause `(!a, b)`), rebuilt by the caller in dense mode.
pub fn transitive_reduce(binaries: &mut Vec<(Lit, Lit)>) -> u32 {
    use std::collections::HashMap;
    let mut adj: HashMap<Lit, Vec<Lit>> = HashMap::new();
    for &(a, b) in binaries.iter() {
        adj.entry(!a).or_default().push(b);
        adj.entry(!b).or_default().push(a);
    }
    let mut removed = 0;
    let mut keep = Vec::with_capacity(binaries.len());
    for &(a, b) in binaries.iter() {
        let reachable = bfs_excluding_direct(&adj, !a, b);
        if reachable {
            removed += 1;
        } else {
            keep.push((a, b));
        }
    }
    *binaries = keep;
    removed
}

fn bfs_excluding_direct(
    adj: &std::collections::HashMap<Lit, Vec<Lit>>,
    start: Lit,
    target: Lit,
) -> bool {
    use std::collections::{HashSet, VecDeque};
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    if let Some(neighbors) = adj.get(&start) {
        for &n in neighbors {
            if n == target {
                continue; // the direct edge itself doesn't count as a witness
            }
            if seen.insert(n) {
                queue.push_back(n);
            }
        }
    }
    while let Some(cur) = queue.pop_front() {
        if cur == target {
            return true;
        }
        if let Some(neighbors) = adj.get(&cur) {
            for &n in neighbors {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
    }
    false
}

/// Attempt to shrink `clause` by propagating the negation of each prefix
/// literal in turn; stop and truncate as soon as a conflict proves the
/// remaining literals redundant (spec.md §4.O "Vivification").
pub fn vivify_clause(asg: &mut AssignStack, cdb: &mut ClauseDb, clause: &[Lit]) -> Option<Vec<Lit>> {
    debug_assert_eq!(asg.decision_level(), 0);
    for (i, &lit) in clause.iter().enumerate() {
        if asg.value(!lit).is_some() {
            if asg.is_true(!lit) {
                // lit is already falsified by a unit; drop it and keep going.
                continue;
            }
        }
        asg.new_decision_level();
        let level = asg.decision_level();
        asg.assign(!lit, level, AssignReason::Decision);
        if propagate(asg, cdb).is_some() {
            let shrunk = clause[..=i].to_vec();
            asg.backtrack(0);
            return Some(shrunk);
        }
    }
    asg.backtrack(0);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(x: i32) -> Lit {
        Lit::from_dimacs(x)
    }

    #[test]
    fn failed_literal_forces_negation() {
        let mut asg = AssignStack::new(3);
        let mut cdb = ClauseDb::new(3);
        // (-1, 2): assuming 1 propagates 2; (-1, -2): assuming 1 propagates -2.
        // Both can't hold, so assuming 1 must fail and -1 is forced.
        cdb.watches.push_binary(lit(-1), lit(2), false);
        cdb.watches.push_binary(lit(2), lit(-1), false);
        cdb.watches.push_binary(lit(-1), lit(-2), false);
        cdb.watches.push_binary(lit(-2), lit(-1), false);
        let failed = probe_failed_literal(&mut asg, &mut cdb, lit(1));
        assert!(failed);
        assert_eq!(asg.value(lit(-1)), Some(true));
    }

    #[test]
    fn transitive_edge_removed_when_implied_elsewhere() {
        // clause (1,3) encodes -1 -> 3; already implied by -1 -> 2 (clause
        // (1,2)) composed with 2 -> 3 (clause (-2,3)).
        let mut bins = vec![(lit(1), lit(2)), (lit(-2), lit(3)), (lit(1), lit(3))];
        let removed = transitive_reduce(&mut bins);
        assert_eq!(removed, 1);
        assert_eq!(bins.len(), 2);
    }

    #[test]
    fn vivify_shrinks_clause_with_early_conflict() {
        let mut asg = AssignStack::new(4);
        let mut cdb = ClauseDb::new(4);
        asg.assign(lit(-2), 0, AssignReason::Unit);
        let shrunk = vivify_clause(&mut asg, &mut cdb, &[lit(1), lit(2), lit(3)]);
        // negating lit(1) then lit(2): assuming -1 then -2; -2 already
        // fixed true is a trivial conflict on the second assumption.
        assert!(shrunk.is_some());
    }
}
