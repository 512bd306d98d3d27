//! Crate `config` provides the solver's configuration and CLI surface
//! (spec.md §6 "Option value grammar", §9 "Open questions").
//!
//! Values are stored as `i64` the way `examples/original_source/src/options.h`
//! keeps every tunable as a bounded `int`, rather than splr's per-field
//! typed `Config` struct. Each option is `(name, default, low, high)`; out
//! of range values are clamped to the nearest bound rather than rejected,
//! per spec.md §6.
use std::path::PathBuf;
use structopt::StructOpt;

/// Splr-derived version string kept for the progress banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One row of the option table: `(name, default, low, high, description)`,
/// mirroring `OPTION(name, default, low, high, description)` rows of
/// `examples/original_source/src/options.h`.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: i64,
    pub low: i64,
    pub high: i64,
    pub description: &'static str,
}

macro_rules! options_table {
    ( $( ($field:ident, $default:expr, $low:expr, $high:expr, $doc:expr) ),* $(,)? ) => {
        /// Numeric solver options, clamped to `[low, high]` (spec.md §6).
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct Options {
            $( pub $field: i64, )*
        }

        impl Default for Options {
            fn default() -> Options {
                Options { $( $field: $default, )* }
            }
        }

        pub const OPTION_SPECS: &[OptionSpec] = &[
            $( OptionSpec { name: stringify!($field), default: $default, low: $low, high: $high, description: $doc }, )*
        ];

        impl Options {
            /// Set an option by name, clamping the value into its bounds.
            /// Returns `false` if `name` is not a known option.
            pub fn set(&mut self, name: &str, value: i64) -> bool {
                $(
                    if name == stringify!($field) {
                        let spec = OPTION_SPECS.iter().find(|s| s.name == stringify!($field)).unwrap();
                        self.$field = value.max(spec.low).min(spec.high);
                        return true;
                    }
                )*
                false
            }

            pub fn get(&self, name: &str) -> Option<i64> {
                $(
                    if name == stringify!($field) {
                        return Some(self.$field);
                    }
                )*
                None
            }
        }
    };
}

options_table! {
    (bump, 1, 0, 1, "enable variable bumping"),
    (chrono, 1, 0, 1, "allow chronological backtracking"),
    (chronolevels, 100, 0, i64::max_value(), "maximum jumped over levels"),
    (compact, 1, 0, 1, "enable compacting garbage collection"),
    (compactlim, 10, 0, 100, "compact inactive limit (in percent)"),
    (decay, 50, 1, 200, "per mille score decay"),
    (defraglim, 75, 50, 100, "usable defragmentation limit in percent"),
    (eliminate, 1, 0, 1, "bounded variable elimination (BVE)"),
    (eliminatebound, 16, 0, 1 << 13, "maximum elimination bound"),
    (eliminateclslim, 100, 1, i64::max_value(), "elimination clause size limit"),
    (eliminateint, 500, 10, i64::max_value(), "base elimination interval"),
    (eliminaterounds, 2, 1, 10_000, "elimination rounds limit"),
    (emafast, 33, 10, 1_000_000, "fast exponential moving average window"),
    (emaslow, 100_000, 100, 1_000_000, "slow exponential moving average window"),
    (minimize, 1, 0, 1, "learned clause minimization"),
    (minimizedepth, 1_000, 1, 1_000_000, "minimization depth"),
    (modeinit, 1_000, 10, 100_000_000, "initial focused conflicts limit"),
    (phasesaving, 1, 0, 1, "enable phase saving"),
    (probe, 1, 0, 1, "enable probing"),
    (probeint, 100, 2, i64::max_value(), "probing interval"),
    (reduce, 1, 0, 1, "learned clause reduction"),
    (reducefraction, 75, 10, 100, "reduce fraction in percent"),
    (reduceint, 1_000, 2, 100_000, "base reduce interval"),
    (reluctant, 1, 0, 1, "stable reluctant doubling restarting"),
    (reluctantint, 1 << 10, 2, 1 << 15, "reluctant interval"),
    (reluctantlim, 1 << 20, 0, 1 << 30, "reluctant limit (0=unlimited)"),
    (rephase, 1, 0, 1, "reinitialization of decision phases"),
    (rephaseint, 1_000, 10, 100_000, "base rephase interval"),
    (restart, 1, 0, 1, "enable restarts"),
    (restartint, 1, 1, 10_000, "base restart interval"),
    (restartmargin, 10, 0, 25, "fast/slow margin in percent"),
    (seed, 0, 0, i64::max_value(), "random seed"),
    (simplify, 1, 0, 1, "enable probing and elimination"),
    (stable, 1, 0, 2, "enable stable search mode"),
    (substitute, 1, 0, 1, "equivalent literal substitution"),
    (substituterounds, 2, 1, 100, "maximum substitution rounds"),
    (subsumeclslim, 1_000, 1, i64::max_value(), "subsumption clause size limit"),
    (sweep, 1, 0, 1, "enable SAT sweeping"),
    (sweepdepth, 1, 0, i64::max_value(), "environment BFS depth"),
    (sweepmaxclauses, 4_096, 2, i64::max_value(), "maximum environment clauses"),
    (sweepmaxvars, 128, 2, i64::max_value(), "maximum environment variables"),
    (target, 1, 0, 2, "target phases (1=stable,2=focused)"),
    (tier1, 2, 1, 100, "learned clause tier one glue limit"),
    (tier2, 6, 1, 1_000, "learned clause tier two glue limit"),
    (vivify, 1, 0, 1, "vivify clauses"),
    (walkeffort, 50, 0, 1_000_000, "walk ticks budget in per mille of a search round"),
    (kittenticks, 1_000_000, 0, i64::max_value(), "kitten tick budget per sweep call"),
    (conflicts, -1, -1, i64::max_value(), "conflict limit (-1 = unlimited)"),
    (decisions, -1, -1, i64::max_value(), "decision limit (-1 = unlimited)"),
}

/// Named configuration presets, mirroring kissat's `default|sat|unsat`
/// groups (spec.md §6 "Configurations").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Default,
    Sat,
    Unsat,
}

impl Options {
    pub fn from_preset(preset: Preset) -> Options {
        let mut o = Options::default();
        match preset {
            Preset::Default => {}
            Preset::Sat => {
                o.restartint = 50;
                o.target = 2;
            }
            Preset::Unsat => {
                o.stable = 0;
            }
        }
        o
    }
}

/// DIMACS parsing strictness (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Relaxed,
    Normal,
    Pedantic,
}

/// Full solver configuration: the clamped numeric `Options` table plus the
/// I/O-level settings that are not "options" in the kissat sense (paths,
/// verbosity, proof format), in splr's `Config` style.
#[derive(Debug, Clone)]
pub struct Config {
    pub cnf_filename: PathBuf,
    pub proof_filename: Option<PathBuf>,
    pub force_overwrite_proof: bool,
    pub no_witness: bool,
    pub partial_witness: bool,
    pub binary_proof: bool,
    pub quiet: bool,
    pub verbosity: u8,
    pub strictness: Strictness,
    pub time_limit: Option<f64>,
    pub options: Options,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            cnf_filename: PathBuf::new(),
            proof_filename: None,
            force_overwrite_proof: false,
            no_witness: false,
            partial_witness: false,
            binary_proof: true,
            quiet: false,
            verbosity: 0,
            strictness: Strictness::Normal,
            time_limit: None,
            options: Options::default(),
        }
    }
}

impl<T> From<T> for Config
where
    PathBuf: From<T>,
{
    fn from(path: T) -> Config {
        let mut config = Config::default();
        config.cnf_filename = PathBuf::from(path);
        config
    }
}

impl Config {
    /// Parse a `--name=value` long option per spec.md §6's value grammar:
    /// `N`, `-N`, `N e K` (`N*10^K`), `B ^ E` (`B^E`), or a boolean literal.
    pub fn apply_long_option(&mut self, name: &str, raw: &str) -> bool {
        if let Some(v) = parse_option_value(raw) {
            self.options.set(name, v)
        } else {
            false
        }
    }
}

/// Parses the option value grammar of spec.md §6.
pub fn parse_option_value(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    match raw {
        "true" => return Some(1),
        "false" => return Some(0),
        _ => {}
    }
    if let Some(pos) = raw.find(['e', 'E'].as_ref()) {
        let (base, exp) = raw.split_at(pos);
        let base: i64 = base.parse().ok()?;
        let exp: i64 = exp[1..].parse().ok()?;
        return Some(base * 10i64.pow(exp as u32));
    }
    if let Some(pos) = raw.find('^') {
        let (base, exp) = raw.split_at(pos);
        let base: i64 = base.parse().ok()?;
        let exp: u32 = exp[1..].parse().ok()?;
        return Some(base.pow(exp));
    }
    raw.parse().ok()
}

/// Command-line surface (spec.md §6 "CLI surface"). `structopt` derives the
/// parser; option bounds/clamping is still re-applied through `Options::set`
/// so that out-of-range CLI values clamp rather than error, as spec.md
/// requires.
#[derive(StructOpt, Debug)]
#[structopt(name = "kissat", about = "A pure-Rust CDCL SAT solver")]
pub struct CliArgs {
    /// Disable all messages.
    #[structopt(short = "q", long = "quiet")]
    pub quiet: bool,

    /// Increase verbosity (repeatable).
    #[structopt(short = "v", parse(from_occurrences))]
    pub verbose: u8,

    /// Print only the solver's internal statistics, no search output.
    #[structopt(short = "s", long = "statistics")]
    pub statistics: bool,

    /// Do not print a satisfying assignment.
    #[structopt(short = "n", long = "no-witness")]
    pub no_witness: bool,

    /// Force writing the proof even if the output file already exists.
    #[structopt(short = "f", long = "force")]
    pub force: bool,

    /// Emit only the clauses needed for the refutation (partial proof).
    #[structopt(long = "partial")]
    pub partial: bool,

    /// Write the DRAT proof in ASCII instead of binary.
    #[structopt(long = "no-binary")]
    pub no_binary: bool,

    /// Use relaxed DIMACS header parsing.
    #[structopt(long = "relaxed")]
    pub relaxed: bool,

    /// Use pedantic DIMACS header parsing.
    #[structopt(long = "strict")]
    pub strict: bool,

    /// Conflict limit.
    #[structopt(long = "conflicts")]
    pub conflicts: Option<i64>,

    /// Decision limit.
    #[structopt(long = "decisions")]
    pub decisions: Option<i64>,

    /// Wall-clock time limit in seconds.
    #[structopt(long = "time")]
    pub time: Option<f64>,

    /// Named configuration preset.
    #[structopt(long = "config")]
    pub config: Option<String>,

    /// Generic `--name=value` long options, collected and applied after the
    /// typed flags above (anything not recognized by `structopt` as a
    /// dedicated flag).
    #[structopt(long = "set", number_of_values = 1)]
    pub raw_options: Vec<String>,

    /// Input DIMACS file; `-` or omitted means stdin.
    #[structopt(parse(from_os_str))]
    pub cnf_filename: Option<PathBuf>,

    /// Output DRAT proof file.
    #[structopt(parse(from_os_str))]
    pub proof_filename: Option<PathBuf>,
}

impl CliArgs {
    pub fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(preset) = &self.config {
            config.options = match preset.as_str() {
                "sat" => Options::from_preset(Preset::Sat),
                "unsat" => Options::from_preset(Preset::Unsat),
                _ => Options::from_preset(Preset::Default),
            };
        }
        config.quiet = self.quiet;
        config.verbosity = self.verbose;
        config.no_witness = self.no_witness;
        config.partial_witness = self.partial;
        config.binary_proof = !self.no_binary;
        config.force_overwrite_proof = self.force;
        config.strictness = if self.relaxed {
            Strictness::Relaxed
        } else if self.strict {
            Strictness::Pedantic
        } else {
            Strictness::Normal
        };
        config.time_limit = self.time;
        if let Some(c) = self.conflicts {
            config.options.set("conflicts", c);
        }
        if let Some(d) = self.decisions {
            config.options.set("decisions", d);
        }
        if let Some(path) = self.cnf_filename {
            config.cnf_filename = path;
        }
        config.proof_filename = self.proof_filename;
        for kv in &self.raw_options {
            if let Some(eq) = kv.find('=') {
                let (name, value) = kv.split_at(eq);
                config.apply_long_option(name, &value[1..]);
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        let mut o = Options::default();
        assert!(o.set("decay", 9999));
        assert_eq!(o.decay, 200);
        assert!(o.set("decay", -10));
        assert_eq!(o.decay, 1);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut o = Options::default();
        assert!(!o.set("not_an_option", 5));
    }

    #[test]
    fn value_grammar_parses_exponent_and_power() {
        assert_eq!(parse_option_value("3e2"), Some(300));
        assert_eq!(parse_option_value("2^10"), Some(1024));
        assert_eq!(parse_option_value("true"), Some(1));
        assert_eq!(parse_option_value("-5"), Some(-5));
    }
}
