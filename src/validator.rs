//! Model checker, kept from `examples/ocornoc-splr/src/validator.rs`'s
//! `ValidatorIF` trait but adapted from the teacher's in-solver assignment
//! injection to a standalone checker over an external model and clause set,
//! since this crate's `-e`/witness-checking path (spec.md §6 "Exit codes")
//! validates a DIMACS-literal witness against the original clauses rather
//! than re-running the solver.
use crate::types::Lit;

/// A satisfying assignment as produced on the CLI: signed DIMACS literals,
/// one per assigned variable.
pub type Model = Vec<i32>;

/// Validate `model` against `clauses`. Returns `None` if every clause is
/// satisfied (a genuine model of the problem); otherwise returns the first
/// violated clause, in DIMACS literal form, for diagnostics.
pub fn validate(clauses: &[Vec<Lit>], model: &[i32]) -> Option<Vec<i32>> {
    let assignment = build_lookup(model);
    for clause in clauses {
        if !satisfies(&assignment, clause) {
            return Some(clause.iter().map(|l| l.to_dimacs()).collect());
        }
    }
    None
}

/// Like [`validate`], but over the crate's own boolean phase vector rather
/// than a signed-literal model, for validating straight out of the solver's
/// internal state before it is ever rendered as DIMACS output.
pub fn validate_phases(clauses: &[Vec<Lit>], phases: &[bool]) -> Option<Vec<Lit>> {
    for clause in clauses {
        if !clause
            .iter()
            .any(|&l| phases[l.var() as usize] == l.is_positive())
        {
            return Some(clause.clone());
        }
    }
    None
}

fn build_lookup(model: &[i32]) -> std::collections::HashMap<i32, bool> {
    let mut map = std::collections::HashMap::with_capacity(model.len());
    for &x in model {
        map.insert(x.abs(), x > 0);
    }
    map
}

fn satisfies(assignment: &std::collections::HashMap<i32, bool>, clause: &[Lit]) -> bool {
    clause.iter().any(|&l| {
        let dimacs = l.to_dimacs();
        assignment.get(&dimacs.abs()) == Some(&(dimacs > 0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(x: i32) -> Lit {
        Lit::from_dimacs(x)
    }

    #[test]
    fn accepts_a_genuine_model() {
        let clauses = vec![vec![lit(1), lit(-2)], vec![lit(2), lit(3)]];
        let model = vec![1, -2, 3];
        assert!(validate(&clauses, &model).is_none());
    }

    #[test]
    fn reports_the_first_violated_clause() {
        let clauses = vec![vec![lit(1), lit(2)], vec![lit(-1), lit(-2)]];
        let model = vec![1, 2];
        let violated = validate(&clauses, &model).unwrap();
        assert_eq!(violated, vec![-1, -2]);
    }

    #[test]
    fn validate_phases_matches_validate() {
        let clauses = vec![vec![lit(1), lit(-2)]];
        let phases = vec![true, true]; // var0=true, var1=true -> lit(-2) false, lit(1) true: satisfied
        assert!(validate_phases(&clauses, &phases).is_none());
    }
}
