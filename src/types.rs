//! Basic types shared across the solver: literals, variable ids, decision
//! levels, lifted booleans, exponential moving averages and the internal
//! pseudo-random generator.
use std::fmt;
use std::ops::Not;

/// Variable index. Zero-based, unlike the external DIMACS numbering.
pub type VarId = u32;

/// Decision level. Level 0 holds only root assignments (units, known facts).
pub type DecisionLevel = u32;

/// A reference into the clause arena: a word offset from its base.
pub type ClauseRef = u32;

/// Offset reserved for "no clause" (never a valid allocation, since the
/// header itself occupies word 0).
pub const INVALID_REF: ClauseRef = ClauseRef::max_value();

/// Literal encoded as `2*idx + sign`, sign 0 meaning positive.
///
/// # Examples
/// ```
/// use kissat_rs::types::Lit;
/// let p = Lit::new(3, false);
/// let n = Lit::new(3, true);
/// assert_eq!(p.var(), 3);
/// assert_eq!(!p, n);
/// assert_eq!(p.sign(), false);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Lit(u32);

/// Sentinel literal used as a placeholder where "no literal" is required.
pub const INVALID_LIT: Lit = Lit(u32::max_value());

impl Lit {
    #[inline]
    pub fn new(vi: VarId, sign: bool) -> Lit {
        Lit((vi << 1) | (sign as u32))
    }

    #[inline]
    pub fn var(self) -> VarId {
        self.0 >> 1
    }

    /// `true` when the literal is negative.
    #[inline]
    pub fn sign(self) -> bool {
        (self.0 & 1) != 0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        !self.sign()
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Inverse of [`index`](Lit::index): reconstruct a literal from its
    /// `2*idx + sign` packed form.
    #[inline]
    pub fn from_index(packed: u32) -> Lit {
        Lit(packed)
    }

    /// Convert from a signed DIMACS literal (1-based, `-k`/`k`, `k != 0`).
    pub fn from_dimacs(x: i32) -> Lit {
        debug_assert_ne!(x, 0);
        let vi = (x.abs() - 1) as VarId;
        Lit::new(vi, x < 0)
    }

    /// Convert back to a signed DIMACS literal, given the external variable
    /// index is `self.var() + 1`.
    pub fn to_dimacs(self) -> i32 {
        let v = (self.var() + 1) as i32;
        if self.sign() {
            -v
        } else {
            v
        }
    }
}

impl Not for Lit {
    type Output = Lit;
    #[inline]
    fn not(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Lifted boolean: `None` means unassigned.
pub type Lbool = Option<bool>;

/// Result type for operations that can only fail by making the whole
/// instance unsatisfiable (mirrors splr's `MaybeInconsistent`).
pub type MaybeInconsistent = Result<(), crate::error::SolverError>;

/// Reason for an assignment, tagged per spec.md §3/§9: a decision, a
/// top-level unit, a binary-clause implication (the antecedent literal is
/// inlined so no clause lookup is needed on the hot path) or a large-clause
/// implication identified by an arena reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignReason {
    Decision,
    Unit,
    Binary(Lit),
    Large(ClauseRef),
}

impl Default for AssignReason {
    fn default() -> AssignReason {
        AssignReason::Decision
    }
}

/// Data about the problem as read from the DIMACS header (or synthesized
/// for a programmatically built instance).
#[derive(Debug, Clone, Default)]
pub struct CNFDescription {
    pub num_of_variables: usize,
    pub num_of_clauses: usize,
    pub pathname: String,
}

impl fmt::Display for CNFDescription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CNF({}, {}, {})",
            self.num_of_variables, self.num_of_clauses, self.pathname
        )
    }
}

/// Common constructor contract for solver substructures, mirroring splr's
/// `Instantiate` trait: build from a `Config` and the parsed CNF header.
pub trait Instantiate {
    fn instantiate(config: &crate::config::Config, cnf: &CNFDescription) -> Self;
}

/// Trait for exporting a handful of statistics as a tuple, mirroring
/// splr's `Export` trait used by the progress printer.
pub trait Export<T> {
    fn exports(&self) -> T;
}

/// Exponential moving average with a calibration factor so that the early
/// samples (before the window has filled up) are not under-weighted.
#[derive(Debug, Clone)]
pub struct Ema {
    val: f64,
    cal: f64,
    sca: f64,
}

impl Ema {
    pub fn new(window: f64) -> Ema {
        Ema {
            val: 0.0,
            cal: 0.0,
            sca: 1.0 / window,
        }
    }
    pub fn get(&self) -> f64 {
        if self.cal == 0.0 {
            0.0
        } else {
            self.val / self.cal
        }
    }
    pub fn update(&mut self, x: f64) {
        self.val = self.sca * x + (1.0 - self.sca) * self.val;
        self.cal = self.sca + (1.0 - self.sca) * self.cal;
    }
}

/// A fast/slow pair of EMAs, used for the Glucose-style blocking/forcing
/// restart tests (spec.md §4.I).
#[derive(Debug, Clone)]
pub struct Ema2 {
    fast: Ema,
    slow: Ema,
}

impl Ema2 {
    pub fn new(fast_window: f64, slow_window: f64) -> Ema2 {
        Ema2 {
            fast: Ema::new(fast_window),
            slow: Ema::new(slow_window),
        }
    }
    pub fn update(&mut self, x: f64) {
        self.fast.update(x);
        self.slow.update(x);
    }
    pub fn fast(&self) -> f64 {
        self.fast.get()
    }
    pub fn slow(&self) -> f64 {
        self.slow.get()
    }
}

/// Single 64-bit linear-congruential generator, shared by walk, rephase's
/// random phase and cache sampling (spec.md §9 "Randomness").
///
/// Grounded on `kissat_next_random64` (`examples/original_source/src/random.c`
/// conventions, as referenced from `nonces.c`): a multiplicative LCG with odd
/// increment so that the full period is achieved over `u64`.
#[derive(Debug, Clone)]
pub struct Random {
    state: u64,
}

const LCG_MUL: u64 = 6364136223846793005;
const LCG_INC: u64 = 1442695040888963407;

impl Random {
    pub fn new(seed: u64) -> Random {
        Random {
            state: seed ^ LCG_INC,
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        // xorshift finalizer so low bits are not degenerate, as in common
        // LCG post-processing steps.
        let mut x = self.state;
        x ^= x >> 33;
        x
    }

    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform integer in `[0, bound)`.
    pub fn next_below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            0
        } else {
            (self.next_u64() % bound as u64) as usize
        }
    }

    pub fn next_bool(&mut self, true_probability: f64) -> bool {
        self.next_f64() < true_probability
    }
}

bitflags! {
    /// Per-variable status flags.
    #[derive(Default)]
    pub struct VarFlag: u32 {
        const ELIMINATED   = 0b0000_0001;
        const FIXED        = 0b0000_0010;
        const SEEN         = 0b0000_0100;
        const POLARITY     = 0b0000_1000;
        const SUBSTITUTED  = 0b0001_0000;
    }
}

bitflags! {
    /// Per-clause status/role flags, packed alongside `size` and `glue` in
    /// the arena header (spec.md §3 "Clause").
    #[derive(Default)]
    pub struct ClauseFlag: u32 {
        const REDUNDANT = 0b0000_0001;
        const GARBAGE   = 0b0000_0010;
        const KEEP      = 0b0000_0100;
        const SHRUNKEN  = 0b0000_1000;
        const USED1     = 0b0001_0000;
        const USED2     = 0b0010_0000;
        const VIVIFIED  = 0b0100_0000;
        const HYPER     = 0b1000_0000;
        const SWEEPED   = 0b0001_0000_0000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_roundtrip() {
        for x in &[1, -1, 2, -2, 1000, -1000] {
            let l = Lit::from_dimacs(*x);
            assert_eq!(l.to_dimacs(), *x);
        }
    }

    #[test]
    fn literal_negation_is_involution() {
        let l = Lit::new(5, false);
        assert_eq!(!!l, l);
        assert_ne!(!l, l);
    }

    #[test]
    fn ema_converges_to_constant_input() {
        let mut e = Ema::new(10.0);
        for _ in 0..1000 {
            e.update(3.0);
        }
        assert!((e.get() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn random_is_deterministic_for_fixed_seed() {
        let mut a = Random::new(42);
        let mut b = Random::new(42);
        let xs: Vec<u64> = (0..10).map(|_| a.next_u64()).collect();
        let ys: Vec<u64> = (0..10).map(|_| b.next_u64()).collect();
        assert_eq!(xs, ys);
    }
}
