//! Building a `Solver` from a DIMACS file (or stdin) plus an optional proof
//! sink. Grounded on the teacher's `SatSolverBuildIF::solver_build` /
//! `Solver::inject` pipeline (`examples/ocornoc-splr/src/solver/build.rs`):
//! parse, feed every clause through the incremental add path, then hand
//! back a solver ready to search.
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::Path;

use crate::config::Config;
use crate::dimacs;
use crate::error::CliError;
use crate::proof::ProofFormat;
use crate::rephase::warmup;

use super::Solver;

impl Solver {
    /// Parse `config.cnf_filename` (stdin if empty or `-`), load every
    /// clause, run the phase warm-up pass, and attach a proof writer if
    /// `config.proof_filename` is set (spec.md §6 "CLI surface").
    pub fn build(config: &Config) -> Result<Solver, CliError> {
        let path_display = config.cnf_filename.to_string_lossy().to_string();
        let cnf = if config.cnf_filename.as_os_str().is_empty() || config.cnf_filename == Path::new("-") {
            let stdin = std::io::stdin();
            dimacs::parse(stdin.lock(), "<stdin>", config.strictness)?
        } else {
            let file = File::open(&config.cnf_filename).map_err(|e| CliError::Io {
                path: path_display.clone(),
                source: e,
            })?;
            dimacs::parse(BufReader::new(file), &path_display, config.strictness)?
        };

        let mut solver = Solver::new(config, cnf.description.num_of_variables);
        for clause in &cnf.clauses {
            let dimacs_lits: Vec<i32> = clause.iter().map(|l| l.to_dimacs()).collect();
            if solver.add_clause(&dimacs_lits).is_err() {
                break; // inconsistency already recorded on solver.inconsistent
            }
        }
        warmup(&mut solver.asg, &solver.pos_occ, &solver.neg_occ);

        if let Some(proof_path) = config.proof_filename.clone() {
            if proof_path.exists() && !config.force_overwrite_proof {
                return Err(CliError::ProofExists(proof_path.to_string_lossy().to_string()));
            }
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&proof_path)
                .map_err(|e| CliError::ProofIo {
                    path: proof_path.to_string_lossy().to_string(),
                    source: e,
                })?;
            let format = if config.binary_proof {
                ProofFormat::Binary
            } else {
                ProofFormat::Ascii
            };
            solver.attach_proof(file, format);
        }

        Ok(solver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn build_loads_clauses_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "p cnf 2 2\n1 2 0\n-1 -2 0").unwrap();
        let mut config = Config::from(file.path());
        config.options.sweep = 0;
        let solver = Solver::build(&config).unwrap();
        assert_eq!(solver.num_vars(), 2);
        assert!(!solver.inconsistent);
    }

    #[test]
    fn build_refuses_to_overwrite_existing_proof_without_force() {
        let mut cnf_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(cnf_file, "p cnf 1 1\n1 0").unwrap();
        let proof_file = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::from(cnf_file.path());
        config.proof_filename = Some(proof_file.path().to_path_buf());
        let err = Solver::build(&config).unwrap_err();
        assert!(matches!(err, CliError::ProofExists(_)));
    }
}
