//! The main CDCL loop (spec.md §2 "Control flow"): propagate, analyze a
//! conflict or make a decision, with periodic restart/reduce/rephase and a
//! simplification pass run whenever the trail drains back to level zero.
//! Grounded on the teacher's `Solver::search`/`force_restart`/`force_reduce`
//! shape (`examples/ocornoc-splr/src/solver/search.rs`), generalized onto
//! the mode/restart/rephase/cache controllers and simplification suite
//! SPEC_FULL.md's module map adds on top of the teacher's single strategy.
use std::collections::HashSet;
use std::io;
use std::sync::atomic::Ordering;

use crate::cdb::reduce::{apply_tier, next_reduce_limit, reduce};
use crate::eliminator::EliminationState;
use crate::probe::{run_failed_literal_pass, transitive_reduce, vivify_clause};
use crate::propagate::{propagate, Conflict};
use crate::proof::{ProofFormat, ProofWriter};
use crate::rephase::RephaseSource;
use crate::substitute::SubstitutionMap;
use crate::sweep::{select_environment, sweep_environment};
use crate::types::{AssignReason, ClauseRef, DecisionLevel, Lit};
use crate::walk::{collect_irredundant, WalkState};

use super::conflict;
use super::{Outcome, Solver};

/// Drive `solver` to a verdict. The entry point `Solver::solve` delegates
/// here (spec.md §2).
pub fn run(solver: &mut Solver) -> Outcome {
    if solver.asg.decision_level() > 0 {
        solver.asg.backtrack(0);
    }
    if solver.inconsistent || propagate(&mut solver.asg, &mut solver.cdb).is_some() {
        solver.inconsistent = true;
        solver.state.report_final("UNSATISFIABLE");
        return Outcome::Unsatisfiable;
    }

    let mut best_trail_len = 0usize;
    let mut next_reduce = next_reduce_limit(0, solver.config.options.reduceint as u64, solver.cdb.stats.num_irredundant);
    let mut next_simplify = solver.config.options.eliminateint.max(1) as u64;

    loop {
        if solver.terminate.load(Ordering::Relaxed) {
            solver.state.report_final("UNKNOWN (terminated)");
            return Outcome::Unknown;
        }
        if limit_reached(solver) {
            solver.state.report_final("UNKNOWN (limit reached)");
            return Outcome::Unknown;
        }
        if let Some(e) = &solver.proof_error {
            log::error!("fatal: proof write failed: {}", e);
            solver.state.report_final("UNKNOWN (proof write failed)");
            return Outcome::Unknown;
        }

        match propagate(&mut solver.asg, &mut solver.cdb) {
            Some(conflict) => {
                if solver.asg.decision_level() == 0 {
                    solver.inconsistent = true;
                    solver.state.report_final("UNSATISFIABLE");
                    return Outcome::Unsatisfiable;
                }
                handle_conflict(solver, conflict);
                if solver.asg.trail_len() > best_trail_len {
                    best_trail_len = solver.asg.trail_len();
                    for &lit in solver.asg.trail() {
                        solver.asg.set_best_phase(lit.var(), lit.is_positive());
                    }
                }
                solver
                    .state
                    .maybe_report(solver.asg.num_vars(), solver.asg.trail_len(), &solver.cdb.stats);
                if solver.config.options.reduce != 0 && solver.state.stats.conflicts >= next_reduce {
                    do_reduce(solver);
                    next_reduce = next_reduce_limit(
                        solver.state.stats.conflicts,
                        solver.config.options.reduceint as u64,
                        solver.cdb.stats.num_irredundant,
                    );
                }
                maybe_rephase(solver);
                maybe_restart(solver);
            }
            None => {
                if solver.asg.decision_level() == 0
                    && solver.config.options.simplify != 0
                    && solver.state.stats.conflicts >= next_simplify
                {
                    simplify_round(solver);
                    next_simplify = solver.state.stats.conflicts + solver.config.options.eliminateint.max(1) as u64;
                    if solver.inconsistent {
                        solver.state.report_final("UNSATISFIABLE");
                        return Outcome::Unsatisfiable;
                    }
                    if propagate(&mut solver.asg, &mut solver.cdb).is_some() {
                        solver.inconsistent = true;
                        solver.state.report_final("UNSATISFIABLE");
                        return Outcome::Unsatisfiable;
                    }
                    continue;
                }
                if all_assigned(solver) {
                    solver.state.report_final("SATISFIABLE");
                    return Outcome::Satisfiable;
                }
                decide(solver);
            }
        }
    }
}

fn limit_reached(solver: &Solver) -> bool {
    let opts = &solver.config.options;
    if opts.conflicts >= 0 && solver.state.stats.conflicts >= opts.conflicts as u64 {
        return true;
    }
    if opts.decisions >= 0 && solver.state.stats.decisions >= opts.decisions as u64 {
        return true;
    }
    if let Some(limit) = solver.config.time_limit {
        if solver.state.elapsed_seconds() >= limit {
            return true;
        }
    }
    false
}

fn is_assigned_v(solver: &Solver, v: u32) -> bool {
    solver.asg.value(Lit::new(v, false)).is_some()
}

fn all_assigned(solver: &Solver) -> bool {
    (0..solver.asg.num_vars() as u32).all(|v| is_assigned_v(solver, v))
}

/// Install a learned clause and advance every controller a conflict touches
/// (spec.md §4.G step 8 tiering, §4.H mode ticking, §4.I EMA feed).
fn handle_conflict(solver: &mut Solver, raw_conflict: Conflict) {
    solver.state.stats.conflicts += 1;
    solver.ticks += 1;
    let opts = solver.config.options.clone();
    let analysis = conflict::analyze(
        &mut solver.asg,
        &solver.cdb,
        raw_conflict,
        opts.minimizedepth as u32,
        opts.tier1 as u32,
        opts.tier2 as u32,
    );
    solver.state.stats.sum_glue += analysis.glue as u64;

    let trail_fraction = solver.asg.trail_len() as f64 / solver.asg.num_vars().max(1) as f64;
    solver
        .rst
        .on_conflict(analysis.glue, trail_fraction, solver.asg.decision_level());

    solver.asg.backtrack(analysis.backjump_level);

    let lits = &analysis.learnt;
    match lits.len() {
        1 => solver.asg.assign(lits[0], 0, AssignReason::Unit),
        2 => {
            solver.cdb.watches.push_binary(lits[0], lits[1], true);
            solver.cdb.watches.push_binary(lits[1], lits[0], true);
            solver
                .asg
                .assign(lits[0], analysis.backjump_level, AssignReason::Binary(lits[1]));
        }
        _ => match solver.cdb.new_clause(lits, true, analysis.glue) {
            Ok(cref) => {
                apply_tier(&mut solver.cdb, cref, analysis.tier);
                solver
                    .asg
                    .assign(lits[0], analysis.backjump_level, AssignReason::Large(cref));
            }
            Err(_) => solver.inconsistent = true,
        },
    }

    if let Some(proof) = &mut solver.proof {
        if let Err(e) = proof.add_clause(lits) {
            solver.proof_error.get_or_insert(e);
        }
    }

    solver.mode.tick(solver.ticks);
}

/// Pick the next decision variable: the score heap in stable mode, the
/// move-to-front queue in focused mode (spec.md §4.D/§4.E "one structure is
/// authoritative per mode").
fn decide(solver: &mut Solver) {
    let picked = if solver.mode.is_stable() {
        loop {
            match solver.asg.heap.pop_max() {
                Some(v) if is_assigned_v(solver, v) => continue,
                other => break other,
            }
        }
    } else {
        let assigned_mask: Vec<bool> = (0..solver.asg.num_vars() as u32).map(|v| is_assigned_v(solver, v)).collect();
        solver.asg.queue.next_unassigned(|v| assigned_mask[v as usize])
    };
    let v = match picked {
        Some(v) => v,
        None => return,
    };
    let sign = !solver.asg.saved_phase(v);
    let lit = Lit::new(v, sign);
    solver.asg.new_decision_level();
    let level = solver.asg.decision_level();
    solver.asg.assign(lit, level, AssignReason::Decision);
    solver.state.stats.decisions += 1;
}

/// Backjump target for a restart: the deepest level whose decision literal
/// still matches its saved phase, so everything above is genuinely stale
/// rather than thrown away wholesale (spec.md §4.I "backjump to the level
/// that maximizes trail reuse for currently-saved phases").
fn partial_restart_level(solver: &Solver) -> DecisionLevel {
    if solver.config.options.phasesaving == 0 {
        return 0;
    }
    let dl = solver.asg.decision_level();
    let mut target = 0;
    for level in 1..=dl {
        let dlit = solver.asg.decision_literal_at(level);
        if dlit.is_positive() == solver.asg.saved_phase(dlit.var()) {
            target = level;
        } else {
            break;
        }
    }
    target
}

fn maybe_restart(solver: &mut Solver) {
    if solver.config.options.restart == 0 || solver.asg.decision_level() == 0 {
        return;
    }
    let fire = if solver.mode.is_stable() {
        if solver.config.options.reluctant == 0 {
            return;
        }
        solver.rst.should_restart_stable(
            solver.ticks,
            solver.config.options.reluctantint as u64,
            solver.config.options.reluctantlim as u64,
        )
    } else {
        solver
            .rst
            .should_restart_focused(solver.config.options.restartint as u64, solver.config.options.restartmargin as u32)
    };
    if !fire {
        return;
    }
    solver.state.stats.restarts += 1;
    solver.rst.on_restart();
    let target = partial_restart_level(solver);
    solver.asg.backtrack(target);
}

fn run_walk(solver: &mut Solver) -> Vec<bool> {
    let (clauses, occurs) = collect_irredundant(&solver.cdb, solver.asg.num_vars());
    let seed = solver.config.options.seed as u64 ^ solver.state.stats.conflicts;
    let mut walk = WalkState::new(seed, &solver.asg, &clauses);
    let budget = (solver.config.options.walkeffort as u64).max(1) * 100;
    let flips = walk.run(&clauses, &occurs, budget, 0.3);
    solver.state.stats.walk_flips += flips;
    solver.cache.insert(walk.phases(), walk.num_unsatisfied() as u32);
    walk.phases().to_vec()
}

fn maybe_rephase(solver: &mut Solver) {
    if solver.config.options.rephase == 0 || solver.state.stats.conflicts == 0 {
        return;
    }
    let interval = (solver.config.options.rephaseint as u64).max(1);
    if solver.state.stats.conflicts % interval != 0 {
        return;
    }
    solver.state.stats.rephases += 1;
    let source = solver.rephase.next_source();
    let walking = if source == RephaseSource::Walking {
        if !solver.cache.is_empty() && solver.state.stats.rephases % 2 == 0 {
            solver.cache.lookup(true).map(|p| p.to_vec())
        } else {
            Some(run_walk(solver))
        }
    } else {
        None
    };
    solver.rephase.rephase(&mut solver.asg, source, walking.as_deref());
}

/// One reduction pass (spec.md §4.J): clauses currently locked as a reason
/// are excluded, and the arena is compacted afterward if mostly garbage,
/// with every stale reason `ClauseRef` patched to follow its clause.
fn do_reduce(solver: &mut Solver) {
    let locked: HashSet<ClauseRef> = (0..solver.asg.num_vars() as u32)
        .filter_map(|v| match solver.asg.reason(v) {
            AssignReason::Large(cref) => Some(cref),
            _ => None,
        })
        .collect();
    let candidates: Vec<ClauseRef> = solver.cdb.reducible_refs().into_iter().filter(|c| !locked.contains(c)).collect();
    let discarded = reduce(&mut solver.cdb, &candidates, solver.config.options.reducefraction as u32);
    solver.state.stats.reductions += discarded as u64;
    solver.cdb.defrag_watches_if_needed(solver.config.options.defraglim as u32);
    if let Some(remap) = solver.cdb.shrink() {
        for v in 0..solver.asg.num_vars() as u32 {
            if let AssignReason::Large(old) = solver.asg.reason(v) {
                if let Some(&new) = remap.get(&old) {
                    solver.asg.set_reason(v, AssignReason::Large(new));
                }
            }
        }
    }
}

/// Every current irredundant binary clause as an `(a, b)` pair, `a < b`
/// (spec.md §4.O/§4.P both operate over this same dense representation).
fn gather_binaries(cdb: &crate::cdb::ClauseDb, num_vars: usize) -> Vec<(Lit, Lit)> {
    use crate::cdb::watch::Watch;
    let mut out = Vec::new();
    for v in 0..num_vars {
        for sign in [false, true] {
            let lit = Lit::new(v as u32, sign);
            for &word in cdb.watches.list(lit) {
                if let Watch::Binary { other, redundant } = Watch::unpack(word) {
                    if !redundant && lit < other {
                        out.push((lit, other));
                    }
                }
            }
        }
    }
    out
}

/// Replace the entire clause database with `clauses`, re-deriving units,
/// binaries and arena-allocated clauses from scratch (spec.md §3
/// "Lifetimes": watch lists are rebuilt for simplification passes rather
/// than patched in place). Drops every redundant (learned) clause, since
/// none of the callers here have a use for keeping stale lemmas around
/// across a structural rewrite of the formula.
fn rebuild_dense(solver: &mut Solver, clauses: Vec<Vec<Lit>>) {
    let num_vars = solver.asg.num_vars();
    let mut new_cdb = crate::cdb::ClauseDb::new(num_vars);
    for cl in clauses {
        match cl.len() {
            0 => solver.inconsistent = true,
            1 => {
                if solver.asg.value(cl[0]).is_none() {
                    solver.asg.assign(cl[0], 0, AssignReason::Unit);
                }
            }
            2 => {
                new_cdb.watches.push_binary(cl[0], cl[1], false);
                new_cdb.watches.push_binary(cl[1], cl[0], false);
            }
            _ => {
                if new_cdb.new_clause(&cl, false, 0).is_err() {
                    solver.inconsistent = true;
                }
            }
        }
    }
    solver.cdb = new_cdb;
    if propagate(&mut solver.asg, &mut solver.cdb).is_some() {
        solver.inconsistent = true;
    }
}

/// Bounded vivification pass over the current irredundant large clauses
/// (spec.md §4.O "Vivification"); only rebuilds the database if something
/// actually shrank.
fn vivify_pass(solver: &mut Solver) {
    let large: Vec<Vec<Lit>> = solver
        .cdb
        .live_large_clauses()
        .into_iter()
        .filter(|(redundant, _)| !redundant)
        .map(|(_, lits)| lits)
        .collect();
    let mut replacement = Vec::with_capacity(large.len());
    let mut shrank_any = false;
    for cl in &large {
        match vivify_clause(&mut solver.asg, &mut solver.cdb, cl) {
            Some(shrunk) if shrunk.len() < cl.len() => {
                solver.state.stats.reductions += 1;
                shrank_any = true;
                replacement.push(shrunk);
            }
            _ => replacement.push(cl.clone()),
        }
    }
    if shrank_any {
        let mut clauses: Vec<Vec<Lit>> = gather_binaries(&solver.cdb, solver.asg.num_vars())
            .into_iter()
            .map(|(a, b)| vec![a, b])
            .collect();
        clauses.extend(replacement);
        rebuild_dense(solver, clauses);
    }
}

/// One SAT-sweeping round (component R): pick a pivot among free variables,
/// grow a bounded environment around it, and solve it with the embedded
/// `Kitten` sub-solver (spec.md §4.R).
fn sweep_round(solver: &mut Solver) {
    let num_vars = solver.asg.num_vars();
    let (clauses, occurs) = collect_irredundant(&solver.cdb, num_vars);
    let pivot = match (0..num_vars as u32).find(|&v| !is_assigned_v(solver, v)) {
        Some(v) => v,
        None => return,
    };
    let env = select_environment(
        pivot,
        &clauses,
        &occurs,
        solver.config.options.sweepdepth as u32,
        solver.config.options.sweepmaxvars as usize,
        solver.config.options.sweepmaxclauses as usize,
    );
    let kitten_ticks = solver.config.options.kittenticks as u64;

    let mut proof = solver.proof.take();
    let result = match &mut proof {
        Some(p) => sweep_environment(&env, num_vars, &mut solver.uf, p, kitten_ticks),
        None => {
            let mut sink = io::sink();
            let mut scratch = ProofWriter::new(&mut sink, ProofFormat::Ascii);
            sweep_environment(&env, num_vars, &mut solver.uf, &mut scratch, kitten_ticks)
        }
    };
    solver.proof = proof;

    match result {
        Ok(result) => {
            for unit in result.units {
                if solver.asg.value(unit).is_none() {
                    solver.asg.assign(unit, 0, AssignReason::Unit);
                }
            }
            if propagate(&mut solver.asg, &mut solver.cdb).is_some() {
                solver.inconsistent = true;
            }
        }
        Err(e) => {
            solver.proof_error.get_or_insert(e);
        }
    }
}

/// The level-zero simplification pipeline: substitution, failed-literal
/// probing, bounded variable elimination (with subsumption), vivification
/// and SAT sweeping, run in that order (spec.md §4.N/§4.O/§4.P/§4.R). Each
/// stage is independently gated by its own option.
fn simplify_round(solver: &mut Solver) {
    debug_assert_eq!(solver.asg.decision_level(), 0);

    if solver.config.options.substitute != 0 {
        let mut binaries = gather_binaries(&solver.cdb, solver.asg.num_vars());
        if !binaries.is_empty() {
            transitive_reduce(&mut binaries);
            let sub = SubstitutionMap::build(solver.asg.num_vars(), &binaries);
            if sub.has_conflicting_scc() {
                solver.inconsistent = true;
                return;
            }
            let mut new_clauses = Vec::new();
            for &(a, b) in &binaries {
                if let Some(c) = sub.apply(&[a, b]) {
                    new_clauses.push(c);
                }
            }
            for (redundant, lits) in solver.cdb.live_large_clauses() {
                if redundant {
                    continue;
                }
                if let Some(c) = sub.apply(&lits) {
                    new_clauses.push(c);
                }
            }
            rebuild_dense(solver, new_clauses);
            if solver.inconsistent {
                return;
            }
        }
    }

    if solver.config.options.probe != 0 {
        let candidates: Vec<Lit> = (0..solver.asg.num_vars() as u32)
            .filter(|&v| !is_assigned_v(solver, v))
            .map(|v| Lit::new(v, false))
            .collect();
        let stats = run_failed_literal_pass(
            &mut solver.asg,
            &mut solver.cdb,
            &candidates,
            (solver.config.options.probeint as u64) * 8,
        );
        solver.state.stats.probed_literals += stats.failed_literals as u64;
        if stats.became_inconsistent || propagate(&mut solver.asg, &mut solver.cdb).is_some() {
            solver.inconsistent = true;
            return;
        }
    }

    if solver.config.options.eliminate != 0 {
        let mut clauses: Vec<Vec<Lit>> = gather_binaries(&solver.cdb, solver.asg.num_vars())
            .into_iter()
            .map(|(a, b)| vec![a, b])
            .collect();
        for (redundant, lits) in solver.cdb.live_large_clauses() {
            if !redundant {
                clauses.push(lits);
            }
        }
        let mut elim = EliminationState::new(solver.asg.num_vars(), clauses);
        for v in elim.schedule() {
            if is_assigned_v(solver, v) {
                continue;
            }
            if elim.try_eliminate(v, solver.config.options.eliminatebound, solver.config.options.eliminateclslim as usize) {
                solver.asg.mark_eliminated(v);
                solver.state.stats.eliminated_vars += 1;
            }
        }
        elim.subsume_pass();
        solver.extension.append(&mut elim.extension);
        rebuild_dense(solver, elim.live_clauses());
        if solver.inconsistent {
            return;
        }
    }

    if solver.config.options.vivify != 0 {
        vivify_pass(solver);
        if solver.inconsistent {
            return;
        }
    }

    if solver.config.options.sweep != 0 {
        sweep_round(solver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn make_solver(num_vars: usize) -> Solver {
        let mut config = Config::default();
        config.options.sweep = 0;
        Solver::new(&config, num_vars)
    }

    #[test]
    fn solves_trivial_satisfiable_formula() {
        let mut solver = make_solver(2);
        solver.add_clause(&[1, 2]).unwrap();
        solver.add_clause(&[-1, 2]).unwrap();
        solver.add_clause(&[1, -2]).unwrap();
        assert_eq!(run(&mut solver), Outcome::Satisfiable);
        let model = solver.model();
        assert_eq!(model[0], 1);
        assert_eq!(model[1], 2);
    }

    #[test]
    fn detects_trivial_unsatisfiable_formula() {
        let mut solver = make_solver(1);
        solver.add_clause(&[1]).unwrap();
        solver.add_clause(&[-1]).unwrap();
        assert_eq!(run(&mut solver), Outcome::Unsatisfiable);
    }

    #[test]
    fn detects_unsatisfiable_formula_via_search() {
        let mut solver = make_solver(3);
        solver.add_clause(&[1, 2, 3]).unwrap();
        solver.add_clause(&[1, 2, -3]).unwrap();
        solver.add_clause(&[1, -2, 3]).unwrap();
        solver.add_clause(&[1, -2, -3]).unwrap();
        solver.add_clause(&[-1, 2, 3]).unwrap();
        solver.add_clause(&[-1, 2, -3]).unwrap();
        solver.add_clause(&[-1, -2, 3]).unwrap();
        solver.add_clause(&[-1, -2, -3]).unwrap();
        assert_eq!(run(&mut solver), Outcome::Unsatisfiable);
    }

    #[test]
    fn partial_restart_level_reuses_matching_prefix() {
        let solver = make_solver(3);
        assert_eq!(partial_restart_level(&solver), 0);
    }
}
