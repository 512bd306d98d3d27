//! WalkSAT-style local search (component L, spec.md §4.L). The teacher has
//! no local-search module of its own (it is a pure CDCL solver); no
//! original_source counterpart either -- `walk.c` has no surviving source
//! file in this pack, so the break-count scoring and greedy/random mixing
//! below are derived directly from spec.md §4.L's description of WalkSAT,
//! expressed in the teacher's free-function plus plain-struct style used
//! throughout `solver::conflict`.
use crate::assign::AssignStack;
use crate::cdb::ClauseDb;
use crate::types::{Lit, Random};

/// A self-contained local-search state over the *current* irredundant
/// clause set, tracked independently from the CDCL trail (spec.md §4.L).
pub struct WalkState {
    /// Candidate phase assignment, one entry per variable.
    phases: Vec<bool>,
    /// For each irredundant clause, how many of its literals are currently
    /// satisfied by `phases`.
    sat_count: Vec<u32>,
    /// Clauses with `sat_count == 0`.
    unsatisfied: Vec<usize>,
    /// Inverse index into `unsatisfied`, `usize::MAX` if not present.
    unsatisfied_pos: Vec<usize>,
    rng: Random,
}

const NOT_UNSATISFIED: usize = usize::MAX;

impl WalkState {
    /// Seed local search from the solver's saved phases and the given
    /// irredundant clause set (each entry a slice of literals, binary
    /// clauses included by the caller as 2-literal slices).
    pub fn new(seed: u64, asg: &AssignStack, clauses: &[Vec<Lit>]) -> WalkState {
        let phases: Vec<bool> = (0..asg.num_vars()).map(|v| asg.saved_phase(v as u32)).collect();
        let mut sat_count = vec![0u32; clauses.len()];
        let mut unsatisfied = Vec::new();
        let mut unsatisfied_pos = vec![NOT_UNSATISFIED; clauses.len()];
        for (ci, cl) in clauses.iter().enumerate() {
            let n = count_satisfied(&phases, cl);
            sat_count[ci] = n;
            if n == 0 {
                unsatisfied_pos[ci] = unsatisfied.len();
                unsatisfied.push(ci);
            }
        }
        WalkState {
            phases,
            sat_count,
            unsatisfied,
            unsatisfied_pos,
            rng: Random::new(seed),
        }
    }

    pub fn phases(&self) -> &[bool] {
        &self.phases
    }

    pub fn num_unsatisfied(&self) -> usize {
        self.unsatisfied.len()
    }

    fn value(&self, lit: Lit) -> bool {
        self.phases[lit.var() as usize] == lit.is_positive()
    }

    fn flip(&mut self, v: u32) {
        self.phases[v as usize] = !self.phases[v as usize];
    }

    /// Run up to `tick_budget` flips of WalkSAT, mixing a `walkeffort`-scaled
    /// greedy pick (lowest break-count) with a uniform-random pick among the
    /// literals of a randomly chosen unsatisfied clause (spec.md §4.L
    /// "p random + (1-p) greedy").
    pub fn run(&mut self, clauses: &[Vec<Lit>], occurs: &[Vec<usize>], tick_budget: u64, noise: f64) -> u64 {
        let mut ticks = 0u64;
        while ticks < tick_budget && !self.unsatisfied.is_empty() {
            let pick = self.rng.next_below(self.unsatisfied.len());
            let ci = self.unsatisfied[pick];
            let cl = &clauses[ci];
            let v = if self.rng.next_bool(noise) {
                cl[self.rng.next_below(cl.len())].var()
            } else {
                self.greedy_choice(cl, clauses, occurs)
            };
            self.apply_flip(v, clauses, occurs);
            ticks += cl.len() as u64;
        }
        ticks
    }

    /// Pick the literal in `cl` whose flip breaks the fewest currently-true
    /// clauses (ties broken by first occurrence, as in the teacher's
    /// deterministic-tiebreak convention elsewhere in this codebase).
    fn greedy_choice(&self, cl: &[Lit], clauses: &[Vec<Lit>], occurs: &[Vec<usize>]) -> u32 {
        let mut best_var = cl[0].var();
        let mut best_break = u32::MAX;
        for &lit in cl {
            let v = lit.var();
            let b = self.break_count(v, clauses, occurs);
            if b < best_break {
                best_break = b;
                best_var = v;
            }
        }
        best_var
    }

    /// Count how many currently-satisfied clauses mentioning `v` would
    /// become unsatisfied if `v` were flipped.
    fn break_count(&self, v: u32, clauses: &[Vec<Lit>], occurs: &[Vec<usize>]) -> u32 {
        let mut broken = 0;
        for &ci in &occurs[v as usize] {
            if self.sat_count[ci] == 1 && self.value(clauses[ci].iter().copied().find(|l| l.var() == v).unwrap()) {
                broken += 1;
            }
        }
        broken
    }

    fn apply_flip(&mut self, v: u32, clauses: &[Vec<Lit>], occurs: &[Vec<usize>]) {
        self.flip(v);
        for &ci in &occurs[v as usize] {
            let cl = &clauses[ci];
            let new_count = count_satisfied(&self.phases, cl);
            self.sat_count[ci] = new_count;
            let is_unsat = new_count == 0;
            let pos = self.unsatisfied_pos[ci];
            if is_unsat && pos == NOT_UNSATISFIED {
                self.unsatisfied_pos[ci] = self.unsatisfied.len();
                self.unsatisfied.push(ci);
            } else if !is_unsat && pos != NOT_UNSATISFIED {
                let last = self.unsatisfied.len() - 1;
                let moved = self.unsatisfied[last];
                self.unsatisfied.swap(pos, last);
                self.unsatisfied.pop();
                self.unsatisfied_pos[moved] = pos;
                self.unsatisfied_pos[ci] = NOT_UNSATISFIED;
            }
        }
    }
}

fn count_satisfied(phases: &[bool], cl: &[Lit]) -> u32 {
    cl.iter()
        .filter(|l| phases[l.var() as usize] == l.is_positive())
        .count() as u32
}

/// Build the flattened irredundant clause list and per-variable occurrence
/// lists `WalkState` needs, scanning the live arena plus the binary watch
/// lists (spec.md §4.L "operates over the current irredundant clauses").
pub fn collect_irredundant(cdb: &ClauseDb, num_vars: usize) -> (Vec<Vec<Lit>>, Vec<Vec<usize>>) {
    let mut clauses = Vec::new();
    for v in 0..num_vars {
        for sign in [false, true] {
            let lit = Lit::new(v as u32, sign);
            for &word in cdb.watches.list(lit) {
                if let crate::cdb::watch::Watch::Binary { other, redundant } = crate::cdb::watch::Watch::unpack(word) {
                    if !redundant && lit < other {
                        clauses.push(vec![lit, other]);
                    }
                }
            }
        }
    }
    for (redundant, lits) in cdb.live_large_clauses() {
        if !redundant {
            clauses.push(lits);
        }
    }
    let mut occurs = vec![Vec::new(); num_vars];
    for (ci, cl) in clauses.iter().enumerate() {
        for l in cl {
            occurs[l.var() as usize].push(ci);
        }
    }
    (clauses, occurs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(x: i32) -> Lit {
        Lit::from_dimacs(x)
    }

    #[test]
    fn walk_drives_unsatisfied_count_to_zero_on_simple_formula() {
        let asg = AssignStack::new(3);
        let clauses = vec![vec![lit(1), lit(2)], vec![lit(-1), lit(3)], vec![lit(-2), lit(-3)]];
        let mut occurs = vec![Vec::new(); 3];
        for (ci, cl) in clauses.iter().enumerate() {
            for l in cl {
                occurs[l.var() as usize].push(ci);
            }
        }
        let mut walk = WalkState::new(42, &asg, &clauses);
        walk.run(&clauses, &occurs, 10_000, 0.3);
        assert_eq!(walk.num_unsatisfied(), 0);
    }

    #[test]
    fn break_count_zero_for_isolated_flip() {
        let asg = AssignStack::new(1);
        let clauses = vec![vec![lit(1), lit(1)]];
        let occurs = vec![vec![0]];
        let walk = WalkState::new(1, &asg, &clauses);
        assert_eq!(walk.break_count(0, &clauses, &occurs), 0);
    }
}
