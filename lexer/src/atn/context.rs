use rustc_hash::FxHashMap;

use crate::hashcons::Interner;

/// Return-state number standing for "no caller" inside a context node.
/// Sorts after every real state number.
pub const EMPTY_RETURN_STATE: u32 = u32::MAX;

/// Handle to an immutable call-context in the arena. Contexts are
/// hash-consed: equal stacks share one handle, and "mutating" a config's
/// context means swapping its handle, never touching shared structure.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CtxRef(u32);

impl CtxRef {
    /// The empty stack. Under local (wildcard) semantics it matches any
    /// caller during merge.
    pub const EMPTY: CtxRef = CtxRef(0);

    pub fn is_empty(self) -> bool {
        self == CtxRef::EMPTY
    }
}

/// One context node: pending return states, each with the context that
/// was current below it. Parallel vectors sorted by return state; a
/// singleton is a node of size one.
#[derive(Clone, PartialEq, Eq, Hash)]
struct CtxNode {
    return_states: Vec<u32>,
    parents: Vec<CtxRef>,
}

pub struct ContextArena {
    nodes: Interner<CtxNode>,
    /// Memoizes pairwise merges; the same pair of stacks recurs across
    /// many configurations within one closure step, and without the
    /// cache merge cost is quadratic in closure size.
    merge_cache: FxHashMap<(CtxRef, CtxRef), CtxRef>,
    merge_cache_hits: usize,
}

impl ContextArena {
    pub fn new() -> Self {
        let mut nodes = Interner::new();
        let empty = nodes.intern(CtxNode {
            return_states: vec![EMPTY_RETURN_STATE],
            parents: vec![CtxRef::EMPTY],
        });
        assert!(empty == 0);
        ContextArena {
            nodes,
            merge_cache: FxHashMap::default(),
            merge_cache_hits: 0,
        }
    }

    /// Push a pending return state onto `parent`.
    pub fn push(&mut self, parent: CtxRef, return_state: u32) -> CtxRef {
        assert!(return_state != EMPTY_RETURN_STATE);
        CtxRef(self.nodes.intern(CtxNode {
            return_states: vec![return_state],
            parents: vec![parent],
        }))
    }

    /// The (return_state, below-context) components of `ctx`. The empty
    /// context yields its single "no caller" component.
    pub fn entries(&self, ctx: CtxRef) -> Vec<(u32, CtxRef)> {
        let node = self.nodes.get(ctx.0);
        node.return_states
            .iter()
            .copied()
            .zip(node.parents.iter().copied())
            .collect()
    }

    /// True when some component of `ctx` is the empty stack.
    pub fn has_empty_path(&self, ctx: CtxRef) -> bool {
        let node = self.nodes.get(ctx.0);
        *node.return_states.last().unwrap() == EMPTY_RETURN_STATE
    }

    pub fn num_contexts(&self) -> usize {
        self.nodes.len()
    }

    pub fn merge_cache_hits(&self) -> usize {
        self.merge_cache_hits
    }

    /// Combine two call stacks for configurations that are otherwise the
    /// same automaton position. With `root_is_wildcard` (local-context
    /// semantics) an empty stack absorbs the other side; otherwise the
    /// empty path is kept as a distinct component.
    pub fn merge(&mut self, a: CtxRef, b: CtxRef, root_is_wildcard: bool) -> CtxRef {
        if a == b {
            return a;
        }
        if let Some(&m) = self.merge_cache.get(&(a, b)) {
            self.merge_cache_hits += 1;
            return m;
        }
        if let Some(&m) = self.merge_cache.get(&(b, a)) {
            self.merge_cache_hits += 1;
            return m;
        }
        let merged = self.merge_uncached(a, b, root_is_wildcard);
        self.merge_cache.insert((a, b), merged);
        merged
    }

    fn merge_uncached(&mut self, a: CtxRef, b: CtxRef, root_is_wildcard: bool) -> CtxRef {
        if root_is_wildcard && (a.is_empty() || b.is_empty()) {
            return CtxRef::EMPTY;
        }
        // merge-sort the two component lists; equal return states merge
        // their parents recursively
        let na = self.nodes.get(a.0).clone();
        let nb = self.nodes.get(b.0).clone();
        let mut return_states = Vec::with_capacity(na.return_states.len() + nb.return_states.len());
        let mut parents = Vec::with_capacity(return_states.capacity());
        let (mut i, mut j) = (0usize, 0usize);
        while i < na.return_states.len() && j < nb.return_states.len() {
            let ra = na.return_states[i];
            let rb = nb.return_states[j];
            if ra == rb {
                let pa = na.parents[i];
                let pb = nb.parents[j];
                let parent = if pa == pb {
                    pa
                } else {
                    self.merge(pa, pb, root_is_wildcard)
                };
                return_states.push(ra);
                parents.push(parent);
                i += 1;
                j += 1;
            } else if ra < rb {
                return_states.push(ra);
                parents.push(na.parents[i]);
                i += 1;
            } else {
                return_states.push(rb);
                parents.push(nb.parents[j]);
                j += 1;
            }
        }
        while i < na.return_states.len() {
            return_states.push(na.return_states[i]);
            parents.push(na.parents[i]);
            i += 1;
        }
        while j < nb.return_states.len() {
            return_states.push(nb.return_states[j]);
            parents.push(nb.parents[j]);
            j += 1;
        }
        let node = CtxNode {
            return_states,
            parents,
        };
        if node == na {
            return a;
        }
        if node == nb {
            return b;
        }
        CtxRef(self.nodes.intern(node))
    }
}

impl Default for ContextArena {
    fn default() -> Self {
        Self::new()
    }
}
