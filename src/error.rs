//! Error taxonomy (spec.md §7). Internal solver-state errors are a tight
//! hand-rolled enum on the hot path (cheap to construct/match, as in
//! splr's `AssignReason`); the outward-facing CLI/IO error type uses
//! `thiserror` since it only appears on cold paths (argument parsing, file
//! IO) and benefits from derived `Display`/`source` chaining.
use std::fmt;
use thiserror::Error;

/// Solver-internal errors: only ever raised when the instance itself turns
/// out to be unsatisfiable or a resource limit is hit during solving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverError {
    /// Conflict analysis produced the empty clause: the formula is UNSAT.
    Inconsistent,
    /// A learnt clause would be empty at decision level 0.
    NullLearnt,
    /// The arena could not be grown past `MAX_ARENA` (spec.md §3).
    ArenaExhausted,
    /// A variable index was out of the configured `MAX_VAR` range.
    TooManyVariables,
    /// The external termination flag was observed (spec.md §5).
    Terminated,
    /// A resource/time limit was hit; the search must report `UNKNOWN`.
    LimitReached,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolverError::Inconsistent => write!(f, "formula is unsatisfiable"),
            SolverError::NullLearnt => write!(f, "empty learnt clause derived at level 0"),
            SolverError::ArenaExhausted => write!(f, "clause arena exceeded MAX_ARENA"),
            SolverError::TooManyVariables => write!(f, "variable index exceeds MAX_VAR"),
            SolverError::Terminated => write!(f, "search was cooperatively terminated"),
            SolverError::LimitReached => write!(f, "a configured resource limit was reached"),
        }
    }
}

impl std::error::Error for SolverError {}

/// Errors surfaced to the CLI driver: malformed options, unreadable CNF,
/// unwritable proof files (spec.md §7 "User errors", exit code 1).
#[derive(Error, Debug)]
pub enum CliError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("could not read input file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write proof file {path}: {source}")]
    ProofIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to overwrite existing proof file {0} (use -f/--force)")]
    ProofExists(String),

    #[error(transparent)]
    Solver(#[from] SolverError),
}
