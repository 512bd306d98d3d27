//! Command-line driver (spec.md §6 "CLI surface"). Grounded on
//! `examples/mishun-minisat-rust/src/main.rs`'s shape -- parse arguments,
//! initialize a logger keyed off verbosity, load the CNF, solve, print the
//! outcome and witness -- generalized onto this crate's `structopt`-derived
//! `CliArgs` and `Outcome` enum instead of that teacher's hand-rolled `clap`
//! parser and `PartialResult`.
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use structopt::StructOpt;

use kissat_rs::config::{CliArgs, Config};
use kissat_rs::error::CliError;
use kissat_rs::solver::{Outcome, Solver};

fn main() {
    let args = CliArgs::from_args();
    init_logger(args.quiet, args.verbose);

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("kissat: {}", err);
            std::process::exit(1);
        }
    }
}

/// `env_logger` wired to the `-q`/`-v` flags, in the style of
/// `examples/mishun-minisat-rust/src/main.rs`'s verbosity-to-filter mapping,
/// but through `env_logger::Builder` (0.7) rather than that teacher's
/// long-deprecated `LogBuilder`, and with module paths stripped from the
/// format the way progress lines in `state.rs` expect to stand on their own.
fn init_logger(quiet: bool, verbose: u8) {
    let level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn run(args: CliArgs) -> Result<i32, CliError> {
    let decompressed = args
        .cnf_filename
        .as_ref()
        .map(|p| maybe_decompress(p))
        .transpose()?;

    let config = {
        let mut args = args;
        if let Some(tmp) = &decompressed {
            args.cnf_filename = Some(tmp.path().to_path_buf());
        }
        args.into_config()
    };
    let mut solver = Solver::build(&config)?;

    let terminate = solver.terminate_flag();
    install_terminate_handler(Arc::clone(&terminate));

    let outcome = solver.solve();
    // `decompressed` must outlive the build+solve above (its path is what
    // `config.cnf_filename` points at); drop it only now that parsing is done.
    drop(decompressed);

    if let Some(e) = solver.proof_error() {
        return Err(CliError::ProofIo {
            path: config.proof_filename.as_ref().map_or_else(|| "<proof>".to_string(), |p| p.display().to_string()),
            source: io::Error::new(e.kind(), e.to_string()),
        });
    }

    report(&config, &solver, outcome)?;

    Ok(match outcome {
        Outcome::Satisfiable => 10,
        Outcome::Unsatisfiable => 20,
        Outcome::Unknown => 0,
    })
}

/// Forward `SIGINT`/`SIGTERM` into the solver's cooperative termination flag
/// (spec.md §5 "the one true concurrency boundary is a termination flag...
/// set from an external signal handler"), rather than killing the process
/// outright.
fn install_terminate_handler(flag: Arc<std::sync::atomic::AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    }) {
        log::warn!("could not install SIGINT/SIGTERM handler: {}", e);
    }
}

fn report(config: &Config, solver: &Solver, outcome: Outcome) -> Result<(), CliError> {
    let verdict = match outcome {
        Outcome::Satisfiable => "s SATISFIABLE",
        Outcome::Unsatisfiable => "s UNSATISFIABLE",
        Outcome::Unknown => "s UNKNOWN",
    };
    println!("{}", verdict);

    if outcome == Outcome::Satisfiable && !config.no_witness {
        print_witness(&solver.model())?;
    }
    Ok(())
}

/// `v <lit> <lit> ... 0` witness lines, chunked the way DIMACS output
/// conventionally wraps long lines.
fn print_witness(model: &[i32]) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for chunk in model.chunks(16) {
        write!(out, "v").map_err(io_err)?;
        for lit in chunk {
            write!(out, " {}", lit).map_err(io_err)?;
        }
        writeln!(out).map_err(io_err)?;
    }
    writeln!(out, "v 0").map_err(io_err)?;
    Ok(())
}

fn io_err(source: io::Error) -> CliError {
    CliError::Io {
        path: "<stdout>".to_string(),
        source,
    }
}

/// If `path` carries a recognized compression suffix, pipe it through the
/// matching external tool resolved from `PATH` (spec.md §6 "Environment")
/// and return a temp file holding the decompressed CNF; otherwise `path` is
/// used as-is and nothing is spawned.
fn maybe_decompress(path: &Path) -> Result<Option<tempfile::NamedTempFile>, CliError> {
    let tool = match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => Some(("gzip", vec!["-d", "-c"])),
        Some("bz2") => Some(("bzip2", vec!["-d", "-c"])),
        Some("xz") => Some(("xz", vec!["-d", "-c"])),
        Some("lzma") => Some(("lzma", vec!["-d", "-c"])),
        Some("7z") => Some(("7z", vec!["x", "-so"])),
        _ => None,
    };
    let (program, flags) = match tool {
        Some(t) => t,
        None => return Ok(None),
    };

    let input = File::open(path).map_err(|e| CliError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let mut cmd = Command::new(program);
    cmd.args(&flags).stdin(Stdio::piped()).stdout(Stdio::piped());
    if program == "7z" {
        cmd.arg(path);
        cmd.stdin(Stdio::null());
    } else {
        cmd.stdin(Stdio::from(input));
    }
    let mut child = cmd.spawn().map_err(|e| CliError::Usage(format!("could not run '{}' (needed to decompress {}): {}", program, path.display(), e)))?;

    let mut tmp = tempfile::NamedTempFile::new().map_err(|e| CliError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    io::copy(&mut child.stdout.take().unwrap(), tmp.as_file_mut()).map_err(|e| CliError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let status = child.wait().map_err(|e| CliError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    if !status.success() {
        return Err(CliError::Usage(format!("'{}' exited with {} while decompressing {}", program, status, path.display())));
    }
    Ok(Some(tmp))
}
