//! SAT sweeping (component R, spec.md §4.R). No teacher counterpart;
//! grounded on `examples/original_source/src/sweep.c`'s environment-selection
//! plus backbone/equivalence discovery via the embedded sub-solver, wired
//! here to this crate's own `kitten::Kitten` and `proof::ProofWriter`.
use std::io::Write as IoWrite;

use crate::kitten::Kitten;
use crate::proof::ProofWriter;
use crate::types::Lit;

/// Union-find over variables, used to merge equivalence classes discovered
/// by sweeping before handing them to `substitute` (spec.md §4.R "merge via
/// union-find, and apply substitution later").
#[derive(Debug)]
pub struct UnionFind {
    parent: Vec<u32>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(num_vars: usize) -> UnionFind {
        UnionFind {
            parent: (0..num_vars as u32).collect(),
            rank: vec![0; num_vars],
        }
    }

    pub fn find(&mut self, v: u32) -> u32 {
        if self.parent[v as usize] != v {
            let root = self.find(self.parent[v as usize]);
            self.parent[v as usize] = root;
        }
        self.parent[v as usize]
    }

    pub fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        if self.rank[ra as usize] < self.rank[rb as usize] {
            self.parent[ra as usize] = rb;
        } else if self.rank[ra as usize] > self.rank[rb as usize] {
            self.parent[rb as usize] = ra;
        } else {
            self.parent[rb as usize] = ra;
            self.rank[ra as usize] += 1;
        }
    }
}

/// A candidate environment: the clauses reachable from a pivot variable
/// within `sweepdepth` BFS hops, bounded by `sweepmaxvars`/`sweepmaxclauses`
/// (spec.md §4.R "Pick an environment").
pub struct Environment {
    pub vars: Vec<u32>,
    pub clauses: Vec<(u32, Vec<Lit>)>,
}

/// BFS outward from `pivot` over `occurs` (per-variable clause-index lists)
/// and `clauses` (flattened clause bodies), stopping at the configured
/// bounds.
pub fn select_environment(
    pivot: u32,
    clauses: &[Vec<Lit>],
    occurs: &[Vec<usize>],
    sweepdepth: u32,
    sweepmaxvars: usize,
    sweepmaxclauses: usize,
) -> Environment {
    use std::collections::{HashSet, VecDeque};
    let mut seen_vars = HashSet::new();
    let mut seen_clauses = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back((pivot, 0u32));
    seen_vars.insert(pivot);
    while let Some((v, depth)) = queue.pop_front() {
        if depth >= sweepdepth || seen_vars.len() >= sweepmaxvars || seen_clauses.len() >= sweepmaxclauses {
            continue;
        }
        for &ci in &occurs[v as usize] {
            if seen_clauses.len() >= sweepmaxclauses {
                break;
            }
            if seen_clauses.insert(ci) {
                for l in &clauses[ci] {
                    if seen_vars.len() >= sweepmaxvars {
                        break;
                    }
                    if seen_vars.insert(l.var()) {
                        queue.push_back((l.var(), depth + 1));
                    }
                }
            }
        }
    }
    let clause_list: Vec<(u32, Vec<Lit>)> = seen_clauses
        .into_iter()
        .map(|ci| (ci as u32, clauses[ci].clone()))
        .collect();
    Environment {
        vars: seen_vars.into_iter().collect(),
        clauses: clause_list,
    }
}

/// Outcome of sweeping one environment: global units proved and equivalence
/// pairs merged (already folded into `uf`).
#[derive(Debug, Default)]
pub struct SweepResult {
    pub units: Vec<Lit>,
}

/// Solve `env` with a fresh `Kitten`, read off backbone/equivalence
/// candidates from the model, then re-solve under flipped phases to refine
/// them before proving each survivor (spec.md §4.R). Kitten ticks are
/// bounded by `kitten_ticks`; this function returns early (no proved
/// results) if the budget runs out before a verdict.
pub fn sweep_environment<W: IoWrite>(
    env: &Environment,
    num_vars: usize,
    uf: &mut UnionFind,
    proof: &mut ProofWriter<W>,
    kitten_ticks: u64,
) -> std::io::Result<SweepResult> {
    let mut kitten = Kitten::init(num_vars);
    for (id, lits) in &env.clauses {
        kitten.clause(*id, lits);
    }
    if kitten.solve(kitten_ticks) != 10 {
        return Ok(SweepResult::default());
    }
    let model: Vec<Option<bool>> = env.vars.iter().map(|&v| kitten.value(Lit::new(v, false))).collect();

    kitten.flip_phases();
    let mut kitten2 = Kitten::init(num_vars);
    for (id, lits) in &env.clauses {
        kitten2.clause(*id, lits);
    }
    if kitten2.solve(kitten_ticks) != 10 {
        return Ok(SweepResult::default());
    }
    let model2: Vec<Option<bool>> = env.vars.iter().map(|&v| kitten2.value(Lit::new(v, false))).collect();

    let mut backbone = Vec::new();
    for (i, &v) in env.vars.iter().enumerate() {
        if model[i].is_some() && model[i] == model2[i] {
            backbone.push((v, model[i].unwrap()));
        }
    }

    let mut result = SweepResult::default();
    for &(v, sign) in &backbone {
        // `sign` is true when the positive literal holds in both models;
        // assume its negation and check that it is refuted.
        let opposite = Lit::new(v, sign);
        let mut probe = Kitten::init(num_vars);
        for (id, lits) in &env.clauses {
            probe.clause(*id, lits);
        }
        probe.assume(opposite);
        if probe.solve(kitten_ticks) == 20 {
            let global_unit = Lit::new(v, !sign);
            let core = core_clauses(&probe);
            add_core(proof, &core)?;
            proof.add_clause(&[global_unit])?;
            delete_core(proof, &core)?;
            result.units.push(global_unit);
        }
    }

    for i in 0..backbone.len() {
        for j in (i + 1)..backbone.len() {
            let (va, sa) = backbone[i];
            let (vb, sb) = backbone[j];
            if sa != sb {
                continue; // only same-polarity peaks are candidate equivalences
            }
            let a = Lit::new(va, false);
            let b = Lit::new(vb, false);
            if let Some((core1, core2)) = prove_equivalent(&env.clauses, num_vars, a, b, kitten_ticks) {
                add_core(proof, &core1)?;
                proof.add_clause(&[!a, b])?;
                delete_core(proof, &core1)?;
                add_core(proof, &core2)?;
                proof.add_clause(&[a, !b])?;
                delete_core(proof, &core2)?;
                uf.union(va, vb);
            }
        }
    }
    proof.flush()?;
    Ok(result)
}

/// Antecedent clauses Kitten needed to reach its last `20` verdict, read off
/// via `compute_core`/`traverse_core_clauses` (spec.md §4.R "derived clauses
/// must be backed by their antecedent core"). Mirrors
/// `examples/original_source/src/sweep.c`'s `add_core`/`delete_core` pair,
/// which pushes each antecedent into the proof before the derived unit or
/// equivalence clause and retracts them again once it has been recorded.
fn core_clauses(kitten: &Kitten) -> Vec<Vec<Lit>> {
    if kitten.compute_core().is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    kitten.traverse_core_clauses(|_, lits| out.push(lits.to_vec()));
    out
}

fn add_core<W: IoWrite>(proof: &mut ProofWriter<W>, core: &[Vec<Lit>]) -> std::io::Result<()> {
    for lits in core {
        proof.add_clause(lits)?;
    }
    Ok(())
}

fn delete_core<W: IoWrite>(proof: &mut ProofWriter<W>, core: &[Vec<Lit>]) -> std::io::Result<()> {
    for lits in core {
        proof.delete_clause(lits)?;
    }
    Ok(())
}

/// Two Kitten calls proving `a <-> b`: assuming `a` and `!b` must be UNSAT,
/// and assuming `!a` and `b` must be UNSAT (spec.md §4.R "For each surviving
/// equivalence pair... do two Kitten calls; on double UNSAT emit..."). On
/// success, returns each call's antecedent core so the caller can add it to
/// the proof before the derived equivalence clause it backs.
fn prove_equivalent(
    clauses: &[(u32, Vec<Lit>)],
    num_vars: usize,
    a: Lit,
    b: Lit,
    kitten_ticks: u64,
) -> Option<(Vec<Vec<Lit>>, Vec<Vec<Lit>>)> {
    let mut k1 = Kitten::init(num_vars);
    for (id, lits) in clauses {
        k1.clause(*id, lits);
    }
    k1.assume(a);
    k1.assume(!b);
    if k1.solve(kitten_ticks) != 20 {
        return None;
    }
    let core1 = core_clauses(&k1);

    let mut k2 = Kitten::init(num_vars);
    for (id, lits) in clauses {
        k2.clause(*id, lits);
    }
    k2.assume(!a);
    k2.assume(b);
    if k2.solve(kitten_ticks) != 20 {
        return None;
    }
    let core2 = core_clauses(&k2);
    Some((core1, core2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(x: i32) -> Lit {
        Lit::from_dimacs(x)
    }

    #[test]
    fn environment_stops_at_depth_and_var_bounds() {
        let clauses = vec![vec![lit(1), lit(2)], vec![lit(2), lit(3)], vec![lit(3), lit(4)]];
        let mut occurs = vec![Vec::new(); 4];
        for (ci, cl) in clauses.iter().enumerate() {
            for l in cl {
                occurs[l.var() as usize].push(ci);
            }
        }
        let env = select_environment(0, &clauses, &occurs, 1, 10, 10);
        assert!(env.vars.contains(&0));
        assert!(env.vars.contains(&1));
        assert!(!env.vars.contains(&3));
    }

    #[test]
    fn union_find_merges_and_finds_common_root() {
        let mut uf = UnionFind::new(4);
        uf.union(0, 1);
        uf.union(1, 2);
        assert_eq!(uf.find(0), uf.find(2));
        assert_ne!(uf.find(0), uf.find(3));
    }

    #[test]
    fn sweep_discovers_unit_backbone() {
        let clauses = vec![(0, vec![lit(1)])];
        let env = Environment {
            vars: vec![0],
            clauses: clauses.clone(),
        };
        let mut uf = UnionFind::new(1);
        let mut buf = Vec::new();
        let mut proof = ProofWriter::new(&mut buf, crate::proof::ProofFormat::Ascii);
        let result = sweep_environment(&env, 1, &mut uf, &mut proof, 10_000).unwrap();
        assert_eq!(result.units, vec![lit(1)]);
    }
}
