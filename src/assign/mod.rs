//! Trail, value store and phase tracking (component C, spec.md §3
//! "Assigned record" / §4.C), plus the two decision-variable selection
//! structures it owns: the score heap (component D) and the move-to-front
//! queue (component E). Grounded on the teacher's `AssignStack`, reworked
//! around the `AssignReason` shape SPEC_FULL settled on in `types.rs`
//! instead of the teacher's `Implication(ClauseId, Lit)` pair.
pub mod heap;
pub mod queue;

use crate::types::{AssignReason, DecisionLevel, Lbool, Lit, VarFlag, VarId};
use heap::ScoreHeap;
use queue::McfQueue;

#[derive(Debug, Clone, Copy, Default)]
struct VarRecord {
    level: DecisionLevel,
    reason: AssignReason,
    flags: VarFlag,
    /// Trail position, used by conflict analysis to walk the trail in
    /// reverse order without a linear scan (spec.md §3 "Assigned record").
    trail_pos: u32,
    saved: bool,
    target: bool,
    best: bool,
}

/// Trail, value array and phase bookkeeping for every variable, plus the
/// two decision heuristics (score heap / move-to-front queue) that sit on
/// top of it.
#[derive(Debug)]
pub struct AssignStack {
    value: Vec<Lbool>,
    vars: Vec<VarRecord>,
    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
    propagated: usize,
    pub heap: ScoreHeap,
    pub queue: McfQueue,
    pub num_assigned_at_level0: usize,
}

impl AssignStack {
    pub fn new(num_vars: usize) -> AssignStack {
        AssignStack {
            value: vec![None; 2 * num_vars],
            vars: vec![VarRecord::default(); num_vars],
            trail: Vec::with_capacity(num_vars),
            trail_lim: Vec::new(),
            propagated: 0,
            heap: ScoreHeap::new(num_vars),
            queue: McfQueue::new(num_vars),
            num_assigned_at_level0: 0,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn value(&self, lit: Lit) -> Lbool {
        self.value[lit.index()]
    }

    #[inline]
    pub fn is_true(&self, lit: Lit) -> bool {
        self.value(lit) == Some(true)
    }

    #[inline]
    pub fn is_false(&self, lit: Lit) -> bool {
        self.value(lit) == Some(false)
    }

    pub fn level(&self, v: VarId) -> DecisionLevel {
        self.vars[v as usize].level
    }

    pub fn reason(&self, v: VarId) -> AssignReason {
        self.vars[v as usize].reason
    }

    /// Patch a variable's recorded reason in place, without touching its
    /// trail position or level. Used after `ClauseDb::shrink` compacts the
    /// arena: every reason pointing at a relocated clause must follow it to
    /// its new `ClauseRef`, or the next conflict analysis would read
    /// garbage (spec.md §4.A "Returns a remap... callers... fix up their
    /// own references").
    pub fn set_reason(&mut self, v: VarId, reason: AssignReason) {
        self.vars[v as usize].reason = reason;
    }

    pub fn trail_pos(&self, v: VarId) -> u32 {
        self.vars[v as usize].trail_pos
    }

    pub fn decision_level(&self) -> DecisionLevel {
        self.trail_lim.len() as DecisionLevel
    }

    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn propagated(&self) -> usize {
        self.propagated
    }

    pub fn has_pending_propagations(&self) -> bool {
        self.propagated < self.trail.len()
    }

    /// Pop the next unpropagated literal and advance the cursor; BCP drains
    /// `trail[propagated..]` (spec.md §4.C).
    pub fn next_to_propagate(&mut self) -> Option<Lit> {
        if self.propagated < self.trail.len() {
            let l = self.trail[self.propagated];
            self.propagated += 1;
            Some(l)
        } else {
            None
        }
    }

    pub fn is_seen(&self, v: VarId) -> bool {
        self.vars[v as usize].flags.contains(VarFlag::SEEN)
    }

    pub fn set_seen(&mut self, v: VarId, on: bool) {
        if on {
            self.vars[v as usize].flags.insert(VarFlag::SEEN);
        } else {
            self.vars[v as usize].flags.remove(VarFlag::SEEN);
        }
    }

    pub fn is_eliminated(&self, v: VarId) -> bool {
        self.vars[v as usize].flags.contains(VarFlag::ELIMINATED)
    }

    pub fn mark_eliminated(&mut self, v: VarId) {
        self.vars[v as usize].flags.insert(VarFlag::ELIMINATED);
    }

    pub fn saved_phase(&self, v: VarId) -> bool {
        self.vars[v as usize].saved
    }

    pub fn set_saved_phase(&mut self, v: VarId, sign: bool) {
        self.vars[v as usize].saved = sign;
    }

    pub fn target_phase(&self, v: VarId) -> bool {
        self.vars[v as usize].target
    }

    pub fn set_target_phase(&mut self, v: VarId, sign: bool) {
        self.vars[v as usize].target = sign;
    }

    pub fn best_phase(&self, v: VarId) -> bool {
        self.vars[v as usize].best
    }

    pub fn set_best_phase(&mut self, v: VarId, sign: bool) {
        self.vars[v as usize].best = sign;
    }

    /// Record an assignment on the trail (spec.md §4.C `assign`). Does not
    /// perform any consistency checking; the caller (propagate / decide)
    /// is responsible for ensuring `lit` was unassigned.
    pub fn assign(&mut self, lit: Lit, level: DecisionLevel, reason: AssignReason) {
        let v = lit.var();
        self.value[lit.index()] = Some(true);
        self.value[(!lit).index()] = Some(false);
        self.vars[v as usize].level = level;
        self.vars[v as usize].reason = reason;
        self.vars[v as usize].trail_pos = self.trail.len() as u32;
        if level == 0 {
            self.vars[v as usize].flags.insert(VarFlag::FIXED);
            self.num_assigned_at_level0 += 1;
        }
        self.trail.push(lit);
    }

    pub fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    /// The decision literal that opened level `level` (`1 <= level <=
    /// decision_level()`); every `trail_lim` entry is, by construction, the
    /// trail position of a fresh decision (spec.md §4.I "backjump to the
    /// level that maximizes trail reuse for currently-saved phases").
    pub fn decision_literal_at(&self, level: DecisionLevel) -> Lit {
        self.trail[self.trail_lim[(level - 1) as usize]]
    }

    /// Backtrack until every assignment above `target_level` is undone,
    /// phase-saving each unassigned variable (spec.md §4.C `backtrack`).
    pub fn backtrack(&mut self, target_level: DecisionLevel) {
        if self.decision_level() <= target_level {
            return;
        }
        let bound = self.trail_lim[target_level as usize];
        while self.trail.len() > bound {
            let lit = self.trail.pop().unwrap();
            let v = lit.var();
            self.vars[v as usize].saved = lit.is_positive();
            self.value[lit.index()] = None;
            self.value[(!lit).index()] = None;
            self.heap.insert(v);
            self.queue.on_unassign(v);
        }
        self.trail_lim.truncate(target_level as usize);
        self.propagated = self.propagated.min(self.trail.len());
    }

    pub fn verify_value_complement(&self) -> bool {
        (0..self.vars.len()).all(|v| {
            let p = Lit::new(v as VarId, false);
            let n = !p;
            match (self.value(p), self.value(n)) {
                (None, None) => true,
                (Some(a), Some(b)) => a != b,
                _ => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Lit;

    #[test]
    fn assign_and_backtrack_restores_unassigned() {
        let mut asg = AssignStack::new(4);
        asg.new_decision_level();
        asg.assign(Lit::new(0, false), 1, AssignReason::Decision);
        asg.new_decision_level();
        asg.assign(Lit::new(1, true), 2, AssignReason::Decision);
        assert_eq!(asg.trail_len(), 2);
        asg.backtrack(1);
        assert_eq!(asg.trail_len(), 1);
        assert_eq!(asg.value(Lit::new(1, true)), None);
        assert_eq!(asg.value(Lit::new(0, false)), Some(true));
    }

    #[test]
    fn value_complement_invariant_holds() {
        let mut asg = AssignStack::new(4);
        asg.new_decision_level();
        asg.assign(Lit::new(2, false), 1, AssignReason::Decision);
        assert!(asg.verify_value_complement());
    }

    #[test]
    fn level_zero_assignment_marks_fixed_and_no_trail_lim() {
        let mut asg = AssignStack::new(2);
        asg.assign(Lit::new(0, false), 0, AssignReason::Unit);
        assert_eq!(asg.decision_level(), 0);
        assert_eq!(asg.num_assigned_at_level0, 1);
    }
}
