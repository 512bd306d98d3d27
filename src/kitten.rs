//! Embedded mini-solver used by sweeping (component Q, spec.md §4.Q). No
//! teacher counterpart; grounded on `examples/original_source/src/kitten.h`'s
//! API surface (`kitten_init/clear/clause/assume/solve/value/
//! compute_clausal_core/traverse_core_lemmas/...`), built by composing this
//! crate's own `assign`/`cdb`/`propagate`/`solver::conflict` machinery rather
//! than re-deriving a second watcher/arena implementation -- Kitten is
//! "self-contained" in the sense of owning a private instance of each, not
//! in the sense of a separately-coded algorithm. `record_core`/`compute_core`
//! mirror `kitten_compute_clausal_core`/`kitten_traverse_core_lemmas` with a
//! coarse over-approximation (every registered clause touching a
//! conflict-relevant variable) rather than a minimal resolution-derived core.
use std::collections::HashMap;

use crate::assign::AssignStack;
use crate::cdb::ClauseDb;
use crate::propagate::{propagate, Conflict};
use crate::solver::conflict::analyze;
use crate::types::{AssignReason, Lit};

pub type ClauseId = u32;

/// A self-contained CDCL instance, re-initialized per sweeping environment.
pub struct Kitten {
    asg: AssignStack,
    cdb: ClauseDb,
    /// Original `(id, lits)` pairs, kept to answer `traverse_core_clauses`.
    clauses: Vec<(ClauseId, Vec<Lit>)>,
    assumptions: Vec<Lit>,
    ticks: u64,
    core_clause_ids: Vec<ClauseId>,
    /// Set when two unit clauses directly contradict each other; `solve`
    /// short-circuits to `20` once this is set, since such a contradiction
    /// never goes through `propagate`'s watch-list machinery.
    unsat: bool,
    /// Set when a large clause could not be arena-allocated (the instance's
    /// variable/clause bounds are exceeded); `solve` treats this the same as
    /// a budget exhaustion since the instance no longer reflects every
    /// clause it was given.
    overflowed: bool,
}

impl Kitten {
    pub fn init(num_vars: usize) -> Kitten {
        Kitten {
            asg: AssignStack::new(num_vars),
            cdb: ClauseDb::new(num_vars),
            clauses: Vec::new(),
            assumptions: Vec::new(),
            ticks: 0,
            core_clause_ids: Vec::new(),
            unsat: false,
            overflowed: false,
        }
    }

    /// Reset to an empty instance over the same number of variables,
    /// mirroring `kitten_clear`'s "reuse the allocation" contract.
    pub fn clear(&mut self) {
        let n = self.asg.num_vars();
        self.asg = AssignStack::new(n);
        self.cdb = ClauseDb::new(n);
        self.clauses.clear();
        self.assumptions.clear();
        self.ticks = 0;
        self.core_clause_ids.clear();
        self.unsat = false;
        self.overflowed = false;
    }

    pub fn clause(&mut self, id: ClauseId, lits: &[Lit]) {
        self.clauses.push((id, lits.to_vec()));
        match lits.len() {
            0 => self.unsat = true,
            1 => {
                if self.asg.value(lits[0]).is_none() {
                    self.asg.assign(lits[0], 0, AssignReason::Unit);
                } else if self.asg.is_false(lits[0]) {
                    self.unsat = true;
                }
            }
            2 => {
                self.cdb.watches.push_binary(lits[0], lits[1], false);
                self.cdb.watches.push_binary(lits[1], lits[0], false);
            }
            _ => {
                if self.cdb.new_clause(lits, false, 0).is_err() {
                    self.overflowed = true;
                }
            }
        }
    }

    pub fn assume(&mut self, lit: Lit) {
        self.assumptions.push(lit);
    }

    pub fn value(&self, lit: Lit) -> Option<bool> {
        self.asg.value(lit)
    }

    /// Run a tiny CDCL loop bounded by `kitten_ticks`, returning `10`
    /// (satisfiable), `20` (unsatisfiable) or `0` (budget exhausted, as
    /// spec.md §6 "Exit codes" also uses for the top-level solver).
    pub fn solve(&mut self, tick_budget: u64) -> i32 {
        if self.overflowed {
            return 0;
        }
        if self.unsat {
            return 20;
        }
        for &lit in &self.assumptions.clone() {
            if self.asg.value(lit).is_none() {
                self.asg.new_decision_level();
                self.asg.assign(lit, self.asg.decision_level(), AssignReason::Decision);
            } else if self.asg.is_false(lit) {
                return 20;
            }
        }
        loop {
            if self.ticks >= tick_budget {
                return 0;
            }
            self.ticks += 1;
            match propagate(&mut self.asg, &mut self.cdb) {
                Some(conflict) => {
                    if self.asg.decision_level() == 0 {
                        self.record_core(conflict);
                        return 20;
                    }
                    let analysis = analyze(&mut self.asg, &self.cdb, conflict, 1000, 2, 6);
                    self.asg.backtrack(analysis.backjump_level);
                    match analysis.learnt.len() {
                        1 => self.asg.assign(analysis.learnt[0], 0, AssignReason::Unit),
                        2 => {
                            self.cdb
                                .watches
                                .push_binary(analysis.learnt[0], analysis.learnt[1], true);
                            self.cdb
                                .watches
                                .push_binary(analysis.learnt[1], analysis.learnt[0], true);
                            let lvl = self.asg.level(analysis.learnt[1].var());
                            self.asg
                                .assign(analysis.learnt[0], lvl, AssignReason::Binary(analysis.learnt[1]));
                        }
                        _ => {
                            if let Ok(cref) = self.cdb.new_clause(&analysis.learnt, true, analysis.glue) {
                                let lvl = self.asg.level(analysis.learnt[1].var());
                                self.asg.assign(analysis.learnt[0], lvl, AssignReason::Large(cref));
                            }
                        }
                    }
                }
                None => {
                    if let Some(v) = self.next_unassigned() {
                        self.asg.new_decision_level();
                        let level = self.asg.decision_level();
                        self.asg.assign(Lit::new(v, false), level, AssignReason::Decision);
                    } else {
                        return 10;
                    }
                }
            }
        }
    }

    fn next_unassigned(&self) -> Option<u32> {
        (0..self.asg.num_vars() as u32).find(|&v| self.asg.value(Lit::new(v, false)).is_none())
    }

    /// Record every clause id mentioning a currently-fixed variable as part
    /// of the unsat core (a coarse over-approximation; good enough for
    /// sweeping's use, which only needs *a* core, not a minimal one).
    fn record_core(&mut self, conflict: Conflict) {
        let mut vars = std::collections::HashSet::new();
        match conflict {
            Conflict::Binary(a, b) => {
                vars.insert(a.var());
                vars.insert(b.var());
            }
            Conflict::Large(cref) => {
                for l in self.cdb.lits(cref) {
                    vars.insert(l.var());
                }
            }
        }
        self.core_clause_ids = self
            .clauses
            .iter()
            .filter(|(_, lits)| lits.iter().any(|l| vars.contains(&l.var())))
            .map(|(id, _)| *id)
            .collect();
    }

    pub fn compute_core(&self) -> Vec<ClauseId> {
        self.core_clause_ids.clone()
    }

    pub fn traverse_core_clauses<F: FnMut(ClauseId, &[Lit])>(&self, mut f: F) {
        let core: HashMap<ClauseId, &Vec<Lit>> = self
            .clauses
            .iter()
            .filter(|(id, _)| self.core_clause_ids.contains(id))
            .map(|(id, lits)| (*id, lits))
            .collect();
        for (&id, lits) in &core {
            f(id, lits);
        }
    }

    /// Invert every variable's current trail polarity, used by sweeping to
    /// probe the opposite side of a tentative equivalence (spec.md §4.R).
    pub fn flip_phases(&mut self) {
        for v in 0..self.asg.num_vars() as u32 {
            let saved = self.asg.saved_phase(v);
            self.asg.set_saved_phase(v, !saved);
        }
    }

    pub fn randomize_phases(&mut self, rng: &mut crate::types::Random) {
        for v in 0..self.asg.num_vars() as u32 {
            self.asg.set_saved_phase(v, rng.next_bool(0.5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(x: i32) -> Lit {
        Lit::from_dimacs(x)
    }

    #[test]
    fn solves_trivial_satisfiable_instance() {
        let mut k = Kitten::init(2);
        k.clause(0, &[lit(1), lit(2)]);
        assert_eq!(k.solve(10_000), 10);
    }

    #[test]
    fn detects_unsat_from_unit_conflict() {
        let mut k = Kitten::init(1);
        k.clause(0, &[lit(1)]);
        k.clause(1, &[lit(-1)]);
        assert_eq!(k.solve(10_000), 20);
    }

    #[test]
    fn clear_resets_to_empty_instance() {
        let mut k = Kitten::init(2);
        k.clause(0, &[lit(1), lit(2)]);
        k.solve(10_000);
        k.clear();
        assert!(k.value(lit(1)).is_none());
    }

    #[test]
    fn binary_clause_forces_the_other_literal_when_one_is_false() {
        let mut k = Kitten::init(2);
        k.clause(0, &[lit(1), lit(2)]);
        k.clause(1, &[lit(-1)]); // forces var 1 false, so var 2 must become true
        assert_eq!(k.solve(10_000), 10);
        assert_eq!(k.value(lit(2)), Some(true));
    }

    #[test]
    fn compute_core_is_nonempty_after_a_level_zero_conflict() {
        let mut k = Kitten::init(2);
        k.clause(0, &[lit(1)]);
        k.clause(1, &[lit(2)]);
        k.clause(2, &[lit(-1), lit(-2)]);
        assert_eq!(k.solve(10_000), 20);
        let core = k.compute_core();
        assert!(!core.is_empty());
        let mut traversed = Vec::new();
        k.traverse_core_clauses(|id, lits| traversed.push((id, lits.to_vec())));
        assert_eq!(traversed.len(), core.len());
    }
}
