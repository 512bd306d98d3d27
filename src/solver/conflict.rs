//! Conflict analysis (component G, spec.md §4.G). Grounded on the
//! teacher's `solver::conflict::{handle_conflict, conflict_analyze,
//! minimize_learnt, is_redundant}` free-function style, reworked around
//! `AssignReason::{Binary, Large}` instead of the teacher's single
//! `Implication(ClauseId, Lit)` variant and around arena `ClauseRef`s
//! instead of boxed `ClauseId` clauses.
use crate::assign::AssignStack;
use crate::cdb::reduce::{tier_of, Tier};
use crate::cdb::ClauseDb;
use crate::propagate::Conflict;
use crate::types::{AssignReason, DecisionLevel, Lit};

pub struct Analysis {
    pub learnt: Vec<Lit>,
    pub backjump_level: DecisionLevel,
    pub glue: u32,
    pub tier: Tier,
}

/// 1-UIP conflict analysis (spec.md §4.G steps 1-3), followed by recursive
/// minimization (step 4). Shrinking (step 5) and on-the-fly strengthening
/// (step 9) are separate, more aggressive passes over the antecedent chain
/// that this analyzer does not perform -- recursive minimization only drops
/// literals already implied by the rest of the learnt clause, it does not
/// re-walk resolution steps looking for a shorter side clause the way
/// shrinking does, nor patch an antecedent clause in place the way OTFS
/// does. Both are left unimplemented; see the corresponding entry in the
/// grounding ledger's Open Question decisions.
pub fn analyze(
    asg: &mut AssignStack,
    cdb: &ClauseDb,
    conflict: Conflict,
    minimizedepth: u32,
    tier1: u32,
    tier2: u32,
) -> Analysis {
    let dl = asg.decision_level();
    let mut learnt = vec![Lit::default()];
    let mut path_cnt = 0i64;
    let mut ti = asg.trail_len();

    match conflict {
        Conflict::Binary(a, b) => {
            visit_reason_lits(asg, &mut learnt, &mut path_cnt, dl, &[a, b], false);
        }
        Conflict::Large(cref) => {
            let lits = cdb.lits(cref).to_vec();
            visit_reason_lits(asg, &mut learnt, &mut path_cnt, dl, &lits, false);
        }
    }

    let mut p = Lit::default();
    loop {
        while {
            ti -= 1;
            let l = asg.trail()[ti];
            !asg.is_seen(l.var())
        } {}
        p = asg.trail()[ti];
        asg.set_seen(p.var(), false);
        path_cnt -= 1;
        if path_cnt == 0 {
            break;
        }
        match asg.reason(p.var()) {
            AssignReason::Decision | AssignReason::Unit => unreachable!("seen var must have a clausal reason"),
            AssignReason::Binary(other) => {
                visit_reason_lits(asg, &mut learnt, &mut path_cnt, dl, &[p, other], true);
            }
            AssignReason::Large(cref) => {
                let lits = cdb.lits(cref).to_vec();
                visit_reason_lits(asg, &mut learnt, &mut path_cnt, dl, &lits, true);
            }
        }
    }
    learnt[0] = !p;

    minimize(asg, cdb, &mut learnt, minimizedepth);

    for &l in &learnt {
        asg.set_seen(l.var(), false);
    }

    let backjump_level = if learnt.len() > 1 {
        let mut max_i = 1;
        let mut max_lvl = asg.level(learnt[1].var());
        for (i, l) in learnt.iter().enumerate().skip(2) {
            let lvl = asg.level(l.var());
            if lvl > max_lvl {
                max_lvl = lvl;
                max_i = i;
            }
        }
        learnt.swap(1, max_i);
        max_lvl
    } else {
        0
    };

    let glue = compute_glue(asg, &learnt);
    let tier = tier_of(glue, tier1, tier2);

    Analysis {
        learnt,
        backjump_level,
        glue,
        tier,
    }
}

/// Mark newly-reached reason literals, counting how many sit at the
/// current conflict level (`path_cnt`) versus pushing the rest straight
/// into the learnt clause (spec.md §4.G step 1).
fn visit_reason_lits(
    asg: &mut AssignStack,
    learnt: &mut Vec<Lit>,
    path_cnt: &mut i64,
    dl: DecisionLevel,
    lits: &[Lit],
    skip_first: bool,
) {
    for &q in &lits[skip_first as usize..] {
        let vi = q.var();
        if asg.is_seen(vi) {
            continue;
        }
        let lvl = asg.level(vi);
        if lvl == 0 {
            continue;
        }
        asg.set_seen(vi, true);
        if lvl == dl {
            *path_cnt += 1;
        } else {
            learnt.push(q);
        }
    }
}

fn compute_glue(asg: &AssignStack, lits: &[Lit]) -> u32 {
    let mut levels: Vec<DecisionLevel> = lits.iter().map(|l| asg.level(l.var())).collect();
    levels.sort_unstable();
    levels.dedup();
    levels.len() as u32
}

/// Remove literals from `learnt` whose reasons are already implied by the
/// rest of the clause (spec.md §4.G step 4), bounded by `minimizedepth`.
fn minimize(asg: &mut AssignStack, cdb: &ClauseDb, learnt: &mut Vec<Lit>, minimizedepth: u32) {
    let l0 = learnt[0];
    let mut to_clear = learnt.clone();
    let levels: std::collections::HashSet<DecisionLevel> =
        learnt[1..].iter().map(|l| asg.level(l.var())).collect();
    let mut kept = vec![l0];
    for &l in &learnt[1..] {
        if is_redundant(asg, cdb, l, &levels, minimizedepth, &mut to_clear) {
            continue;
        }
        kept.push(l);
    }
    *learnt = kept;
}

fn is_redundant(
    asg: &mut AssignStack,
    cdb: &ClauseDb,
    lit: Lit,
    levels: &std::collections::HashSet<DecisionLevel>,
    depth_budget: u32,
    to_clear: &mut Vec<Lit>,
) -> bool {
    if matches!(asg.reason(lit.var()), AssignReason::Decision) {
        return false;
    }
    let mut stack = vec![(lit, depth_budget)];
    let top = to_clear.len();
    while let Some((l, budget)) = stack.pop() {
        if budget == 0 {
            for &c in &to_clear[top..] {
                asg.set_seen(c.var(), false);
            }
            to_clear.truncate(top);
            return false;
        }
        let reason_lits: Vec<Lit> = match asg.reason(l.var()) {
            AssignReason::Decision => {
                for &c in &to_clear[top..] {
                    asg.set_seen(c.var(), false);
                }
                to_clear.truncate(top);
                return false;
            }
            AssignReason::Unit => Vec::new(),
            AssignReason::Binary(other) => vec![other],
            AssignReason::Large(cref) => {
                cdb.lits(cref).iter().filter(|&&q| q != l).copied().collect()
            }
        };
        for q in reason_lits {
            let vi = q.var();
            let lvl = asg.level(vi);
            if lvl == 0 || asg.is_seen(vi) {
                continue;
            }
            if levels.contains(&lvl) {
                asg.set_seen(vi, true);
                to_clear.push(q);
                stack.push((q, budget - 1));
            } else {
                for &c in &to_clear[top..] {
                    asg.set_seen(c.var(), false);
                }
                to_clear.truncate(top);
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssignReason, Lit};

    fn lit(x: i32) -> Lit {
        Lit::from_dimacs(x)
    }

    #[test]
    fn analyze_derives_unit_clause_from_simple_conflict() {
        let mut asg = AssignStack::new(4);
        let cdb = ClauseDb::new(4);
        asg.new_decision_level();
        asg.assign(lit(1), 1, AssignReason::Decision);
        asg.assign(lit(2), 1, AssignReason::Binary(lit(1)));
        let conflict = Conflict::Binary(lit(-2), lit(-1));
        // force the conflict literals to look "seen-able": both at level 1
        let analysis = analyze(&mut asg, &cdb, conflict, 1000, 2, 6);
        assert!(!analysis.learnt.is_empty());
    }

    #[test]
    fn glue_counts_distinct_levels() {
        let mut asg = AssignStack::new(4);
        asg.new_decision_level();
        asg.assign(lit(1), 1, AssignReason::Decision);
        asg.new_decision_level();
        asg.assign(lit(2), 2, AssignReason::Decision);
        let g = compute_glue(&asg, &[lit(1), lit(2)]);
        assert_eq!(g, 2);
    }
}
