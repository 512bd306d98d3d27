//! Crate `solver` provides the top-level API as a SAT solver. Grounded on
//! the teacher's `solver::build::Solver` field layout (`asg`/`cdb`/`elim`/
//! `rst`/`state`), extended with this crate's own mode controller, rephase
//! controller, assignment cache and cooperative termination flag -- the
//! components SPEC_FULL.md's module map adds beyond what the teacher's
//! single-strategy solver tracks.
pub mod build;
pub mod conflict;
pub mod mode;
pub mod search;

use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::assign::AssignStack;
use crate::cdb::ClauseDb;
use crate::config::Config;
use crate::eliminator::ExtensionRule;
use crate::error::SolverError;
use crate::propagate::propagate;
use crate::proof::{ProofFormat, ProofWriter};
use crate::rephase::RephaseController;
use crate::restart::RestartState;
use crate::state::SolverState;
use crate::sweep::UnionFind;
use crate::types::{AssignReason, Lit, MaybeInconsistent};
use mode::ModeController;

/// Final verdict of a `solve()` call (spec.md §6 "Exit codes": `SATISFIABLE`
/// maps to 10, `UNSATISFIABLE` to 20, `UNKNOWN` to 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

/// Owner of every solver substructure: the trail/watch/arena engine
/// (`asg`/`cdb`), the mode/restart/rephase/cache controllers that steer it,
/// running statistics, and (optionally) a DRAT proof sink.
pub struct Solver {
    pub(crate) asg: AssignStack,
    pub(crate) cdb: ClauseDb,
    pub(crate) mode: ModeController,
    pub(crate) rst: RestartState,
    pub(crate) rephase: RephaseController,
    pub(crate) cache: crate::cache::Cache,
    pub(crate) uf: UnionFind,
    pub(crate) state: SolverState,
    pub(crate) config: Config,
    pub(crate) proof: Option<ProofWriter<Box<dyn Write>>>,
    pub(crate) terminate: Arc<AtomicBool>,
    pub(crate) inconsistent: bool,
    /// Set if a write to the attached DRAT proof sink ever fails; checked by
    /// `search::run` once per iteration, since an unwritable proof makes any
    /// verdict this solver reaches unverifiable (spec.md §7 "I/O errors on
    /// the proof sink are fatal, not best-effort").
    pub(crate) proof_error: Option<std::io::Error>,
    pub(crate) pos_occ: Vec<u32>,
    pub(crate) neg_occ: Vec<u32>,
    pub(crate) extension: Vec<ExtensionRule>,
    /// Running tick counter driving the mode controller's episode budgets
    /// (spec.md §4.H); incremented once per conflict.
    pub(crate) ticks: u64,
}

impl Solver {
    /// Build an empty solver over `num_vars` variables, ready to receive
    /// clauses via [`add_clause`](Solver::add_clause). Mirrors the teacher's
    /// `Instantiate for Solver` (config + variable count, no clauses yet).
    pub fn new(config: &Config, num_vars: usize) -> Solver {
        let seed = config.options.seed as u64;
        Solver {
            asg: AssignStack::new(num_vars),
            cdb: ClauseDb::new(num_vars),
            mode: ModeController::new(config.options.modeinit as u64),
            rst: RestartState::new(config.options.emafast as f64, config.options.emaslow as f64),
            rephase: RephaseController::new(seed ^ 0x9e37_79b9_7f4a_7c15),
            cache: crate::cache::Cache::new(seed ^ 0xc2b2_ae3d_27d4_eb4f),
            uf: UnionFind::new(num_vars),
            state: SolverState::new(&config.cnf_filename.to_string_lossy(), 10_000),
            config: config.clone(),
            proof: None,
            terminate: Arc::new(AtomicBool::new(false)),
            inconsistent: false,
            proof_error: None,
            pos_occ: vec![0; num_vars],
            neg_occ: vec![0; num_vars],
            extension: Vec::new(),
            ticks: 0,
        }
    }

    /// Attach a DRAT proof sink; every learned/deleted clause from this
    /// point on is recorded (spec.md §6 "DRAT proof output").
    pub fn attach_proof<W: Write + 'static>(&mut self, out: W, format: ProofFormat) {
        self.proof = Some(ProofWriter::new(Box::new(out), format));
    }

    /// Share a termination flag with the caller, so an external thread (the
    /// CLI's `ctrlc` handler, typically) can request a cooperative stop
    /// (spec.md §5 "Cancellation").
    pub fn terminate_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminate)
    }

    pub fn set_terminate_flag(&mut self, flag: Arc<AtomicBool>) {
        self.terminate = flag;
    }

    pub fn num_vars(&self) -> usize {
        self.asg.num_vars()
    }

    pub fn stats(&self) -> &crate::state::Stats {
        &self.state.stats
    }

    /// The first I/O error encountered while writing to the attached proof
    /// sink, if any. `solve()` aborts with [`Outcome::Unknown`] as soon as
    /// this becomes set, since a verdict backed by a broken proof is not
    /// trustworthy (spec.md §7).
    pub fn proof_error(&self) -> Option<&std::io::Error> {
        self.proof_error.as_ref()
    }

    /// Add one clause, given as signed DIMACS literals (spec.md §4.N/§9:
    /// `MaybeInconsistent` is the sole fallible result -- adding a clause
    /// can only fail by proving the whole instance unsatisfiable). Grounded
    /// on the teacher's `SatSolverBuildIF::solver_add_unchecked_clause`,
    /// reworked around plain `i32` literals rather than an already-`Lit`
    /// vector, and the tautology/unit/binary/long-clause split it performs.
    pub fn add_clause(&mut self, dimacs_lits: &[i32]) -> MaybeInconsistent {
        if self.inconsistent {
            return Err(SolverError::Inconsistent);
        }
        // Incremental use adds clauses between `solve()` calls, and a prior
        // call may have left the trail at a decision level above zero
        // (spec.md §8 "fuzz sequences of add/solve/add/solve"); unwind back
        // to the level-0 fixed assignments before extending the formula.
        if self.asg.decision_level() > 0 {
            self.asg.backtrack(0);
        }

        let mut lits: Vec<Lit> = dimacs_lits.iter().map(|&x| Lit::from_dimacs(x)).collect();
        lits.sort_unstable();
        lits.dedup();
        for i in 0..lits.len().saturating_sub(1) {
            if lits[i] == !lits[i + 1] {
                return Ok(()); // tautological clause, trivially satisfied
            }
        }

        for &l in &lits {
            if l.is_positive() {
                self.pos_occ[l.var() as usize] += 1;
            } else {
                self.neg_occ[l.var() as usize] += 1;
            }
        }

        let mut filtered = Vec::with_capacity(lits.len());
        for &l in &lits {
            match self.asg.value(l) {
                Some(true) => return Ok(()), // already satisfied by a unit
                Some(false) => continue,     // already falsified, drop it
                None => filtered.push(l),
            }
        }

        match filtered.len() {
            0 => {
                self.inconsistent = true;
                Err(SolverError::Inconsistent)
            }
            1 => {
                self.asg.assign(filtered[0], 0, AssignReason::Unit);
                if propagate(&mut self.asg, &mut self.cdb).is_some() {
                    self.inconsistent = true;
                    return Err(SolverError::Inconsistent);
                }
                Ok(())
            }
            2 => {
                self.cdb.watches.push_binary(filtered[0], filtered[1], false);
                self.cdb.watches.push_binary(filtered[1], filtered[0], false);
                Ok(())
            }
            _ => self.cdb.new_clause(&filtered, false, 0).map(|_| ()).map_err(|e| {
                self.inconsistent = true;
                e
            }),
        }
    }

    /// Reconstruct a full model from the current trail plus every recorded
    /// elimination extension rule, applied in reverse (spec.md §4.N "Model
    /// reconstruction"): most-recently-eliminated variable first.
    pub fn model(&self) -> Vec<i32> {
        let mut vals: Vec<bool> = (0..self.asg.num_vars())
            .map(|v| self.asg.is_true(Lit::new(v as u32, false)))
            .collect();
        for rule in self.extension.iter().rev() {
            let all_satisfied = rule.clauses.iter().all(|clause| {
                clause
                    .iter()
                    .any(|&l| l.var() != rule.pivot.var() && vals[l.var() as usize] == l.is_positive())
            });
            vals[rule.pivot.var() as usize] = if all_satisfied { !rule.fallback } else { rule.fallback };
        }
        vals.iter()
            .enumerate()
            .map(|(v, &b)| if b { (v + 1) as i32 } else { -((v + 1) as i32) })
            .collect()
    }

    /// Run the search to a verdict (spec.md §2 "Control flow").
    pub fn solve(&mut self) -> Outcome {
        search::run(self)
    }
}

impl Ord for Outcome {
    fn cmp(&self, other: &Outcome) -> std::cmp::Ordering {
        fn rank(o: &Outcome) -> u8 {
            match o {
                Outcome::Unknown => 0,
                Outcome::Satisfiable => 1,
                Outcome::Unsatisfiable => 2,
            }
        }
        rank(self).cmp(&rank(other))
    }
}

impl PartialOrd for Outcome {
    fn partial_cmp(&self, other: &Outcome) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_clause_detects_empty_clause_as_inconsistent() {
        let config = Config::default();
        let mut solver = Solver::new(&config, 2);
        assert!(solver.add_clause(&[1]).is_ok());
        assert!(solver.add_clause(&[-1]).is_err());
    }

    #[test]
    fn add_clause_drops_tautology() {
        let config = Config::default();
        let mut solver = Solver::new(&config, 2);
        assert!(solver.add_clause(&[1, -1]).is_ok());
        assert!(!solver.inconsistent);
    }

    #[test]
    fn model_reconstructs_eliminated_variable() {
        let config = Config::default();
        let mut solver = Solver::new(&config, 2);
        solver.asg.assign(Lit::new(1, false), 0, AssignReason::Unit);
        solver.extension.push(ExtensionRule {
            pivot: Lit::new(0, false),
            clauses: vec![vec![Lit::new(0, false), Lit::new(1, false)]],
            fallback: true,
        });
        let model = solver.model();
        assert_eq!(model[1], 2);
        assert_eq!(model[0], -1); // clause already satisfied by var 1, so pivot takes !fallback
    }

    #[test]
    fn model_needs_every_clause_satisfied_before_freeing_pivot() {
        let config = Config::default();
        let mut solver = Solver::new(&config, 3);
        // var 1 true, var 2 false: clause (0,1) is satisfied by var 1, but
        // clause (0,2) is not satisfied by var 2, so the pivot must still
        // take its fallback value rather than being freed.
        solver.asg.assign(Lit::new(1, false), 0, AssignReason::Unit);
        solver.asg.assign(Lit::new(2, true), 0, AssignReason::Unit);
        solver.extension.push(ExtensionRule {
            pivot: Lit::new(0, false),
            clauses: vec![
                vec![Lit::new(0, false), Lit::new(1, false)],
                vec![Lit::new(0, false), Lit::new(2, false)],
            ],
            fallback: true,
        });
        let model = solver.model();
        assert_eq!(model[0], 1); // not every clause satisfied, so pivot keeps fallback
    }
}
