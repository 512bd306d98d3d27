//! A pure-Rust CDCL SAT solver in the style of kissat.
//!
//! Splits the engine into the same per-concern modules the teacher crate
//! uses (`assign`, `cdb`, `config`, `state`, `types`...), but the search
//! itself follows kissat's design: a word-arena clause store with watched
//! literals, a focused/stable mode switch alternating a score heap and a
//! move-to-front queue, glue-tiered clause reduction, and a simplification
//! pipeline (elimination, substitution, vivification, SAT sweeping through
//! the embedded `kitten` sub-solver) run at decision level zero between
//! search rounds.
//!
//! ```
//! use kissat_rs::config::Config;
//! use kissat_rs::solver::Solver;
//!
//! let mut config = Config::default();
//! config.options.sweep = 0;
//! let mut solver = Solver::new(&config, 2);
//! solver.add_clause(&[1, 2]).unwrap();
//! solver.add_clause(&[-1, 2]).unwrap();
//! solver.add_clause(&[1, -2]).unwrap();
//! assert_eq!(solver.solve(), kissat_rs::solver::Outcome::Satisfiable);
//! ```
pub mod assign;
pub mod cache;
pub mod cdb;
pub mod config;
pub mod dimacs;
pub mod eliminator;
pub mod error;
pub mod kitten;
pub mod probe;
pub mod propagate;
pub mod proof;
pub mod reap;
pub mod rephase;
pub mod restart;
pub mod solver;
pub mod state;
pub mod substitute;
pub mod sweep;
pub mod types;
pub mod validator;
pub mod walk;

#[macro_use]
extern crate bitflags;
