//! Binary-implication-graph substitution (component P, spec.md §4.P). No
//! teacher counterpart. `examples/original_source/src/probe.c` dispatches to
//! a `kissat_substitute` that has no surviving source file in this pack, so
//! there is no original_source counterpart for the Tarjan-SCC approach
//! below; it is derived directly from spec.md §4.P and implemented with the
//! standard iterative Tarjan algorithm in the plain-struct idiom this crate
//! uses throughout (`cdb::reduce`, `eliminator`).
use std::collections::HashMap;

use crate::types::Lit;

/// Maps every literal to the representative literal of its strongly
/// connected component in the binary-implication graph.
pub struct SubstitutionMap {
    representative: HashMap<Lit, Lit>,
}

impl SubstitutionMap {
    /// Build the implication graph from `binaries` (each `(a, b)` a binary
    /// clause, contributing edges `!a -> b` and `!b -> a`), find SCCs via
    /// Tarjan's algorithm, and pick the literal-order-minimal member of each
    /// SCC as its representative. A literal and its negation landing in the
    /// same SCC means the formula is unsatisfiable under unit propagation
    /// alone; callers should treat that as an immediate top-level conflict.
    pub fn build(num_vars: usize, binaries: &[(Lit, Lit)]) -> SubstitutionMap {
        let mut adj: HashMap<Lit, Vec<Lit>> = HashMap::new();
        for &(a, b) in binaries {
            adj.entry(!a).or_default().push(b);
            adj.entry(!b).or_default().push(a);
        }
        let all_lits: Vec<Lit> = (0..num_vars as u32)
            .flat_map(|v| [Lit::new(v, false), Lit::new(v, true)])
            .collect();
        let sccs = tarjan_scc(&all_lits, &adj);

        let mut representative = HashMap::with_capacity(all_lits.len());
        for scc in &sccs {
            let rep = *scc.iter().min().unwrap();
            for &l in scc {
                representative.insert(l, rep);
            }
        }
        SubstitutionMap { representative }
    }

    pub fn representative(&self, lit: Lit) -> Lit {
        self.representative[&lit]
    }

    /// Whether any variable's two polarities collapsed into the same SCC,
    /// i.e. the binary-clause closure alone is already unsatisfiable.
    pub fn has_conflicting_scc(&self) -> bool {
        self.representative
            .keys()
            .any(|&l| self.representative(l) == self.representative(!l))
    }

    /// Rewrite `clause` under the substitution, returning `None` if it
    /// becomes tautological (contains both a literal and its negation after
    /// substitution) and deduplicating otherwise (spec.md §4.P "substitute
    /// all occurrences... possibly creating units").
    pub fn apply(&self, clause: &[Lit]) -> Option<Vec<Lit>> {
        let mut out: Vec<Lit> = Vec::with_capacity(clause.len());
        for &l in clause {
            let r = self.representative(l);
            if out.contains(&!r) {
                return None;
            }
            if !out.contains(&r) {
                out.push(r);
            }
        }
        Some(out)
    }
}

/// Iterative (explicit-stack) Tarjan SCC, avoiding recursion depth limits on
/// large implication graphs. Each call-stack frame remembers which neighbor
/// index it is currently exploring, simulating the classic recursive
/// algorithm without relying on the native call stack.
struct CallFrame {
    v: Lit,
    neighbor_idx: usize,
}

fn tarjan_scc(nodes: &[Lit], adj: &HashMap<Lit, Vec<Lit>>) -> Vec<Vec<Lit>> {
    let empty: Vec<Lit> = Vec::new();
    let mut index_of: HashMap<Lit, usize> = HashMap::new();
    let mut lowlink: HashMap<Lit, usize> = HashMap::new();
    let mut on_stack: HashMap<Lit, bool> = HashMap::new();
    let mut stack: Vec<Lit> = Vec::new();
    let mut next_index = 0usize;
    let mut sccs = Vec::new();

    for &start in nodes {
        if index_of.contains_key(&start) {
            continue;
        }
        let mut call_stack = vec![CallFrame { v: start, neighbor_idx: 0 }];
        index_of.insert(start, next_index);
        lowlink.insert(start, next_index);
        next_index += 1;
        stack.push(start);
        on_stack.insert(start, true);

        while let Some(frame) = call_stack.last_mut() {
            let v = frame.v;
            let neighbors = adj.get(&v).unwrap_or(&empty);
            if frame.neighbor_idx < neighbors.len() {
                let w = neighbors[frame.neighbor_idx];
                frame.neighbor_idx += 1;
                if !index_of.contains_key(&w) {
                    index_of.insert(w, next_index);
                    lowlink.insert(w, next_index);
                    next_index += 1;
                    stack.push(w);
                    on_stack.insert(w, true);
                    call_stack.push(CallFrame { v: w, neighbor_idx: 0 });
                } else if *on_stack.get(&w).unwrap_or(&false) {
                    let wi = index_of[&w];
                    let vl = lowlink[&v];
                    lowlink.insert(v, vl.min(wi));
                }
            } else {
                // all of v's neighbors explored; close it off and, if v is
                // a root, pop its whole SCC off the Tarjan stack.
                call_stack.pop();
                if let Some(parent) = call_stack.last() {
                    let pv = parent.v;
                    let vl = lowlink[&v];
                    let pl = lowlink[&pv];
                    lowlink.insert(pv, pl.min(vl));
                }
                if lowlink[&v] == index_of[&v] {
                    let mut scc = Vec::new();
                    loop {
                        let w = stack.pop().unwrap();
                        on_stack.insert(w, false);
                        let done = w == v;
                        scc.push(w);
                        if done {
                            break;
                        }
                    }
                    sccs.push(scc);
                }
            }
        }
    }
    sccs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(x: i32) -> Lit {
        Lit::from_dimacs(x)
    }

    #[test]
    fn equivalent_literals_share_representative() {
        // (1,-2) and (-1,2): clauses encoding 1 <-> 2.
        let bins = vec![(lit(1), lit(-2)), (lit(-1), lit(2))];
        let sub = SubstitutionMap::build(2, &bins);
        assert_eq!(sub.representative(lit(1)), sub.representative(lit(2)));
        assert!(!sub.has_conflicting_scc());
    }

    #[test]
    fn apply_drops_tautological_clause() {
        let bins = vec![(lit(1), lit(-2)), (lit(-1), lit(2))];
        let sub = SubstitutionMap::build(2, &bins);
        // after substitution 1 and 2 collapse; (1, -2) becomes (r, -r).
        let result = sub.apply(&[lit(1), lit(-2)]);
        assert!(result.is_none());
    }
}
