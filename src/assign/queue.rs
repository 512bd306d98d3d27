//! Move-to-front variable queue (component E, spec.md §4.E), used for
//! decision-variable selection while the solver is in focused mode.
//! Grounded on the teacher's doubly-linked `var_order`/`next_reset` bump
//! scheme in `assign.rs`, but kept as its own module since SPEC_FULL splits
//! the heap (stable mode) and the queue (focused mode) the way kissat does.
use crate::types::VarId;

const DISCONNECTED: VarId = VarId::max_value();

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: VarId,
    next: VarId,
    stamp: u64,
}

#[derive(Debug)]
pub struct McfQueue {
    links: Vec<Link>,
    head: VarId,
    tail: VarId,
    /// cursor used by decision-variable search: the most recently
    /// considered variable, walked backwards towards `head` by `next_unassigned`.
    pub search: VarId,
    stamp: u64,
}

impl McfQueue {
    pub fn new(num_vars: usize) -> McfQueue {
        let links = vec![
            Link {
                prev: DISCONNECTED,
                next: DISCONNECTED,
                stamp: 0,
            };
            num_vars
        ];
        let mut q = McfQueue {
            links,
            head: DISCONNECTED,
            tail: DISCONNECTED,
            search: DISCONNECTED,
            stamp: 0,
        };
        for v in 0..num_vars as VarId {
            q.enqueue(v);
        }
        q
    }

    fn unlink(&mut self, v: VarId) {
        let Link { prev, next, .. } = self.links[v as usize];
        if prev != DISCONNECTED {
            self.links[prev as usize].next = next;
        } else {
            self.head = next;
        }
        if next != DISCONNECTED {
            self.links[next as usize].prev = prev;
        } else {
            self.tail = prev;
        }
        self.links[v as usize] = Link {
            prev: DISCONNECTED,
            next: DISCONNECTED,
            stamp: self.links[v as usize].stamp,
        };
    }

    /// Insert `v` at the tail with a fresh stamp (spec.md §4.E `enqueue`).
    pub fn enqueue(&mut self, v: VarId) {
        self.stamp += 1;
        let link = Link {
            prev: self.tail,
            next: DISCONNECTED,
            stamp: self.stamp,
        };
        self.links[v as usize] = link;
        if self.tail != DISCONNECTED {
            self.links[self.tail as usize].next = v;
        } else {
            self.head = v;
        }
        self.tail = v;
        if self.stamp == u64::max_value() {
            self.reassign_stamps();
        }
    }

    /// Unlink `v` and re-enqueue it at the tail (spec.md §4.E
    /// `move_to_front`).
    pub fn move_to_front(&mut self, v: VarId) {
        self.unlink(v);
        self.enqueue(v);
    }

    fn reassign_stamps(&mut self) {
        let mut stamp = 0u64;
        let mut at = self.head;
        while at != DISCONNECTED {
            stamp += 1;
            self.links[at as usize].stamp = stamp;
            at = self.links[at as usize].next;
        }
        self.stamp = stamp;
    }

    /// Advance the search cursor towards `head`, skipping assigned
    /// variables, and return the first unassigned one found (or `None` if
    /// the whole queue is exhausted). `is_assigned` is supplied by the
    /// caller since the queue does not itself track the value array.
    pub fn next_unassigned(&mut self, is_assigned: impl Fn(VarId) -> bool) -> Option<VarId> {
        let mut at = if self.search == DISCONNECTED {
            self.tail
        } else {
            self.search
        };
        while at != DISCONNECTED && is_assigned(at) {
            at = self.links[at as usize].prev;
        }
        self.search = at;
        if at == DISCONNECTED {
            None
        } else {
            Some(at)
        }
    }

    /// Called when a variable is unassigned by backtracking: the search
    /// cursor may move forward again past it (spec.md §4.E).
    pub fn on_unassign(&mut self, v: VarId) {
        if self.search == DISCONNECTED || self.links[v as usize].stamp > self.links[self.search as usize].stamp {
            self.search = v;
        }
    }

    pub fn verify_stamps_monotonic(&self) -> bool {
        let mut at = self.head;
        let mut last = 0u64;
        while at != DISCONNECTED {
            let s = self.links[at as usize].stamp;
            if s < last {
                return false;
            }
            last = s;
            at = self.links[at as usize].next;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_to_front_reorders_to_tail() {
        let mut q = McfQueue::new(4);
        q.move_to_front(1);
        assert_eq!(q.tail, 1);
        assert!(q.verify_stamps_monotonic());
    }

    #[test]
    fn next_unassigned_skips_assigned_vars() {
        let mut q = McfQueue::new(4);
        let assigned = |v: VarId| v == 3 || v == 2;
        let found = q.next_unassigned(assigned);
        assert_eq!(found, Some(1));
    }
}
