use crate::types::{to_lit, Lit, Var};

/// Hands out fresh variables, never reusing one.
///
/// A single allocator is meant to be shared by every constraint of one
/// formula so auxiliary variables of different networks cannot collide.
/// It is not synchronized; callers building constraints from several
/// threads have to lock around it.
#[derive(Clone, Debug)]
pub struct VarAllocator {
    next: Var,
}

impl VarAllocator {
    pub fn new(start_at: Var) -> Self {
        assert!(start_at >= 1, "variables start at 1");
        Self { next: start_at }
    }

    /// Allocator for a formula whose highest variable is `max_var`.
    pub fn after(max_var: usize) -> Self {
        Self::new(max_var + 1)
    }

    pub fn alloc(&mut self) -> Var {
        let var = self.next;
        self.next += 1;
        var
    }

    pub fn alloc_lit(&mut self) -> Lit {
        to_lit(self.alloc())
    }

    pub fn peek(&self) -> Var {
        self.next
    }

    /// Highest variable handed out so far (or reserved before the allocator was created).
    pub fn max_var(&self) -> usize {
        self.next - 1
    }
}
