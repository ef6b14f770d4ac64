use rustc_hash::FxHashMap;

use crate::bitset::BitSet;

use super::context::{ContextArena, CtxRef};
use super::network::{Network, RuleIdx, StateIdx, StateKind};

/// Semantic guard on a configuration. `None` participates in position
/// identity like any other value, so predicated and unpredicated threads
/// at the same state/alt stay distinct.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SemPred {
    None,
    Pred { rule: RuleIdx, index: u32 },
}

impl SemPred {
    pub fn is_none(&self) -> bool {
        matches!(self, SemPred::None)
    }
}

/// One simulation thread: an automaton position plus the call history
/// that led there. Two configurations are the same position iff
/// (state, alt, sem_pred) agree; context differences are merged, not
/// kept as distinct entries.
#[derive(Clone, Debug)]
pub struct Config {
    pub state: StateIdx,
    pub alt: u32,
    pub ctx: CtxRef,
    pub sem_pred: SemPred,
    pub reaches_into_outer_context: u32,
}

impl Config {
    pub fn new(state: StateIdx, alt: u32, ctx: CtxRef) -> Self {
        Config {
            state,
            alt,
            ctx,
            sem_pred: SemPred::None,
            reaches_into_outer_context: 0,
        }
    }

    pub fn at_state(&self, state: StateIdx) -> Self {
        let mut c = self.clone();
        c.state = state;
        c
    }

    pub fn with_ctx(&self, state: StateIdx, ctx: CtxRef) -> Self {
        let mut c = self.clone();
        c.state = state;
        c.ctx = ctx;
        c
    }

    pub fn with_pred(&self, state: StateIdx, pred: SemPred) -> Self {
        let mut c = self.clone();
        c.state = state;
        c.sem_pred = pred;
        c
    }

    fn position_key(&self) -> (StateIdx, u32, SemPred) {
        (self.state, self.alt, self.sem_pred)
    }
}

/// Content identity of a frozen configuration set, including contexts
/// and insertion order. Used to hash-cons decision states.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConfigSetKey(Vec<(u32, u32, CtxRef, SemPred)>);

/// Deduplicated, insertion-ordered collection of configurations with
/// merge-on-insert. Once frozen for reuse as a decision state's
/// identity, any further mutation is a programming error.
#[derive(Clone)]
pub struct ConfigSet {
    configs: Vec<Config>,
    lookup: FxHashMap<(StateIdx, u32, SemPred), usize>,
    pub unique_alt: Option<u32>,
    pub conflicting_alts: BitSet,
    pub has_semantic_context: bool,
    pub dips_into_outer_context: bool,
    full_ctx: bool,
    readonly: bool,
}

impl ConfigSet {
    pub fn new(full_ctx: bool) -> Self {
        ConfigSet {
            configs: vec![],
            lookup: FxHashMap::default(),
            unique_alt: None,
            conflicting_alts: BitSet::new(),
            has_semantic_context: false,
            dips_into_outer_context: false,
            full_ctx,
            readonly: false,
        }
    }

    /// Insert or merge. A collision on (state, alt, sem_pred) is the
    /// same position reached via a different call history: the contexts
    /// are merged and the surviving entry's handle replaced. Returns
    /// true when a new entry was created.
    pub fn add(&mut self, config: Config, ctxs: &mut ContextArena) -> bool {
        assert!(!self.readonly, "cannot add to a frozen config set");
        if !config.sem_pred.is_none() {
            self.has_semantic_context = true;
        }
        if config.reaches_into_outer_context > 0 {
            self.dips_into_outer_context = true;
        }
        let key = config.position_key();
        if let Some(&idx) = self.lookup.get(&key) {
            let root_is_wildcard = !self.full_ctx;
            let existing = &mut self.configs[idx];
            let merged = ctxs.merge(existing.ctx, config.ctx, root_is_wildcard);
            existing.reaches_into_outer_context = existing
                .reaches_into_outer_context
                .max(config.reaches_into_outer_context);
            existing.ctx = merged;
            return false;
        }
        self.lookup.insert(key, self.configs.len());
        self.configs.push(config);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Config> {
        self.configs.iter()
    }

    pub fn get(&self, idx: usize) -> &Config {
        &self.configs[idx]
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn is_full_ctx(&self) -> bool {
        self.full_ctx
    }

    /// Compute summary fields and mark the set read-only so it can serve
    /// as a cached decision state's identity.
    pub fn freeze(&mut self, atn: &Network) {
        let mut alts = BitSet::new();
        for c in &self.configs {
            alts.set(c.alt as usize, true);
        }
        self.unique_alt = if alts.num_set() == 1 {
            alts.min_set().map(|a| a as u32)
        } else {
            None
        };
        let mut accepting = BitSet::new();
        for c in &self.configs {
            if atn.state(c.state).kind == StateKind::RuleStop {
                accepting.set(c.alt as usize, true);
            }
        }
        if accepting.num_set() > 1 {
            self.conflicting_alts = accepting;
        }
        self.readonly = true;
    }

    /// Content key for hash-consing; valid only once frozen (the key
    /// must not go stale under later mutation).
    pub fn dedup_key(&self) -> ConfigSetKey {
        assert!(self.readonly, "config set must be frozen before keying");
        ConfigSetKey(
            self.configs
                .iter()
                .map(|c| (c.state.as_u32(), c.alt, c.ctx, c.sem_pred))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atn::builder::NetworkBuilder;

    fn arena() -> ContextArena {
        ContextArena::new()
    }

    #[test]
    fn add_is_idempotent() {
        let mut ctxs = arena();
        let mut set = ConfigSet::new(false);
        let c = Config::new(StateIdx::new(3), 1, CtxRef::EMPTY);
        assert!(set.add(c.clone(), &mut ctxs));
        assert!(!set.add(c, &mut ctxs));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn context_collision_merges() {
        let mut ctxs = arena();
        let mut set = ConfigSet::new(false);
        let ctx_a = ctxs.push(CtxRef::EMPTY, 10);
        let ctx_b = ctxs.push(CtxRef::EMPTY, 20);
        let mut first = Config::new(StateIdx::new(3), 1, ctx_a);
        first.reaches_into_outer_context = 1;
        set.add(first, &mut ctxs);
        set.add(Config::new(StateIdx::new(3), 1, ctx_b), &mut ctxs);
        assert_eq!(set.len(), 1);
        let merged = set.get(0);
        assert_ne!(merged.ctx, ctx_a);
        assert_eq!(ctxs.entries(merged.ctx).len(), 2);
        assert_eq!(merged.reaches_into_outer_context, 1);
    }

    #[test]
    fn predicate_distinguishes_positions() {
        let mut ctxs = arena();
        let mut set = ConfigSet::new(false);
        set.add(Config::new(StateIdx::new(3), 1, CtxRef::EMPTY), &mut ctxs);
        let pred = SemPred::Pred {
            rule: RuleIdx::new(0),
            index: 0,
        };
        set.add(
            Config::new(StateIdx::new(3), 1, CtxRef::EMPTY).with_pred(StateIdx::new(3), pred),
            &mut ctxs,
        );
        assert_eq!(set.len(), 2);
        assert!(set.has_semantic_context);
    }

    #[test]
    fn freeze_computes_summaries() {
        let mut b = NetworkBuilder::new();
        let m = b.add_mode("DEFAULT");
        let r1 = b.literal_rule(m, "A", "a", 1);
        let r2 = b.literal_rule(m, "B", "b", 2);
        let atn = b.build().unwrap();
        let mut ctxs = arena();
        let mut set = ConfigSet::new(false);
        set.add(Config::new(atn.rule(r1).stop, 1, CtxRef::EMPTY), &mut ctxs);
        set.add(Config::new(atn.rule(r2).stop, 2, CtxRef::EMPTY), &mut ctxs);
        set.freeze(&atn);
        assert_eq!(set.unique_alt, None);
        assert_eq!(set.conflicting_alts.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert!(set.is_readonly());
    }

    #[test]
    #[should_panic(expected = "frozen")]
    fn frozen_set_rejects_mutation() {
        let mut b = NetworkBuilder::new();
        let m = b.add_mode("DEFAULT");
        b.literal_rule(m, "A", "a", 1);
        let atn = b.build().unwrap();
        let mut ctxs = arena();
        let mut set = ConfigSet::new(false);
        set.add(Config::new(StateIdx::new(0), 1, CtxRef::EMPTY), &mut ctxs);
        set.freeze(&atn);
        set.add(Config::new(StateIdx::new(1), 1, CtxRef::EMPTY), &mut ctxs);
    }
}
