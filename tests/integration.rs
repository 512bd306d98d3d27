//! End-to-end scenarios (spec.md §8 "End-to-end scenarios (seed the test
//! suite)"), exercised through the public `Solver` API rather than the CLI
//! binary, in the style of `examples/ocornoc-splr/tests/test_eliminator.rs`'s
//! from-scratch `Solver::instantiate` + manual clause injection -- but driven
//! to a verdict with `solve()` instead of poking at internal clause-database
//! state directly.
use std::fs;
use std::io::Read;

use kissat_rs::config::Config;
use kissat_rs::proof::ProofFormat;
use kissat_rs::solver::{Outcome, Solver};

fn make_solver(num_vars: usize) -> Solver {
    let mut config = Config::default();
    // Keep these runs small and deterministic; sweeping pulls in the Kitten
    // sub-solver's own tick budget, which is unnecessary noise for formulas
    // this size.
    config.options.sweep = 0;
    Solver::new(&config, num_vars)
}

fn add_all(solver: &mut Solver, clauses: &[&[i32]]) {
    for &clause in clauses {
        solver.add_clause(clause).unwrap();
    }
}

#[test]
fn scenario_small_satisfiable_formula() {
    let mut solver = make_solver(3);
    add_all(
        &mut solver,
        &[&[1, 2], &[-1, 2], &[1, 2, 3], &[1, 2, -3]],
    );
    assert_eq!(solver.solve(), Outcome::Satisfiable);
    let model = solver.model();
    assert_eq!(model[0], 1);
    assert_eq!(model[1], 2);
}

#[test]
fn scenario_unsat_with_drat_proof_recorded() {
    let proof_path = tempfile_path();
    let mut solver = make_solver(2);
    let file = fs::File::create(&proof_path).unwrap();
    solver.attach_proof(file, ProofFormat::Ascii);
    add_all(&mut solver, &[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
    assert_eq!(solver.solve(), Outcome::Unsatisfiable);

    let mut recorded = String::new();
    fs::File::open(&proof_path).unwrap().read_to_string(&mut recorded).unwrap();
    assert!(!recorded.is_empty(), "an UNSAT run must emit at least one learned clause to the proof");
    fs::remove_file(&proof_path).ok();
}

/// PHP(5,4): five pigeons, four holes, no hole shared -- unsatisfiable, and
/// a standard stress test for resolution depth.
#[test]
fn scenario_pigeonhole_php_5_4_is_unsat() {
    const PIGEONS: i32 = 5;
    const HOLES: i32 = 4;
    let var = |pigeon: i32, hole: i32| (pigeon - 1) * HOLES + hole;

    let mut solver = make_solver((PIGEONS * HOLES) as usize);
    for pigeon in 1..=PIGEONS {
        let at_least_one: Vec<i32> = (1..=HOLES).map(|hole| var(pigeon, hole)).collect();
        solver.add_clause(&at_least_one).unwrap();
    }
    for hole in 1..=HOLES {
        for p1 in 1..=PIGEONS {
            for p2 in (p1 + 1)..=PIGEONS {
                solver.add_clause(&[-var(p1, hole), -var(p2, hole)]).unwrap();
            }
        }
    }
    assert_eq!(solver.solve(), Outcome::Unsatisfiable);
}

/// Random 3-SAT at the classic hardness ratio (4.25 clauses/var) must reach
/// the same verdict across independent solver instances for a fixed seed
/// (spec.md §8 "deterministic SAT/UNSAT across runs with fixed seed").
#[test]
fn scenario_random_3sat_is_deterministic_for_fixed_seed() {
    let clauses = random_3sat_clauses(100, 425, 0xC0FF_EE42);

    let mut first = make_solver(100);
    for clause in &clauses {
        first.add_clause(clause).unwrap();
    }
    let first_outcome = first.solve();

    let mut second = make_solver(100);
    for clause in &clauses {
        second.add_clause(clause).unwrap();
    }
    let second_outcome = second.solve();

    assert_eq!(first_outcome, second_outcome);
}

#[test]
fn scenario_single_huge_clause_is_satisfiable_without_arena_storm() {
    let n = 100_000usize;
    let mut solver = make_solver(n);
    let clause: Vec<i32> = (1..=n as i32).collect();
    solver.add_clause(&clause).unwrap();
    assert_eq!(solver.solve(), Outcome::Satisfiable);
}

#[test]
fn empty_formula_is_satisfiable_with_empty_witness() {
    let mut solver = make_solver(0);
    assert_eq!(solver.solve(), Outcome::Satisfiable);
    assert!(solver.model().is_empty());
}

#[test]
fn lone_empty_clause_is_unsatisfiable() {
    let mut solver = make_solver(1);
    assert!(solver.add_clause(&[]).is_err());
}

#[test]
fn single_unit_literal_is_satisfiable() {
    let mut solver = make_solver(1);
    solver.add_clause(&[1]).unwrap();
    assert_eq!(solver.solve(), Outcome::Satisfiable);
    assert_eq!(solver.model()[0], 1);
}

/// Fuzzes add/solve/add/solve sequences: the verdict after each incremental
/// batch of clauses must equal a from-scratch solve over everything added
/// so far (spec.md §8 "the final SAT/UNSAT must equal a from-scratch solve
/// on the accumulated formula").
#[test]
fn incremental_add_solve_matches_from_scratch_solve() {
    let batches: &[&[&[i32]]] = &[
        &[&[1, 2], &[-1, 3]],
        &[&[-2, -3], &[2, 3]],
        &[&[1, -2, 3]],
    ];

    let mut incremental = make_solver(3);
    let mut accumulated: Vec<Vec<i32>> = Vec::new();
    for batch in batches {
        for &clause in *batch {
            incremental.add_clause(clause).unwrap();
            accumulated.push(clause.to_vec());
        }
        let incremental_outcome = incremental.solve();

        let mut from_scratch = make_solver(3);
        for clause in &accumulated {
            if from_scratch.add_clause(clause).is_err() {
                break;
            }
        }
        let from_scratch_outcome = from_scratch.solve();

        assert_eq!(incremental_outcome, from_scratch_outcome);
    }
}

fn tempfile_path() -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("kissat-rs-test-proof-{}.drat", std::process::id()));
    path
}

/// A tiny xorshift generator, independent of the solver's own RNG, so that
/// the formula's content is fixed across test runs regardless of solver
/// internals.
fn random_3sat_clauses(num_vars: i32, num_clauses: usize, mut state: u64) -> Vec<Vec<i32>> {
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    let mut clauses = Vec::with_capacity(num_clauses);
    for _ in 0..num_clauses {
        let mut clause = Vec::with_capacity(3);
        while clause.len() < 3 {
            let var = (next() % num_vars as u64) as i32 + 1;
            let signed = if next() % 2 == 0 { var } else { -var };
            if !clause.iter().any(|&l: &i32| l.abs() == signed.abs()) {
                clause.push(signed);
            }
        }
        clauses.push(clause);
    }
    clauses
}
