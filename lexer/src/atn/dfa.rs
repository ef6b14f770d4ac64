use rustc_hash::FxHashMap;
use std::fmt::Write;

use crate::stream::Symbol;

use super::config::{ConfigSet, ConfigSetKey, SemPred};
use super::network::RuleIdx;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DfaStateId(u32);

impl DfaStateId {
    /// Sentinel target caching a known no-viable-alternative edge, so a
    /// repeated failure on the same symbol is O(1).
    pub const ERROR: DfaStateId = DfaStateId(u32::MAX);

    pub fn new(idx: usize) -> Self {
        DfaStateId(idx as u32)
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    pub fn is_error(&self) -> bool {
        *self == DfaStateId::ERROR
    }
}

/// One (guard, alternative) entry of an accepting state. Entries are in
/// alternative order; the first whose guard is absent or passes wins.
#[derive(Clone, Debug)]
pub struct PredPrediction {
    pub pred: SemPred,
    pub alt: u32,
    pub rule: RuleIdx,
}

#[derive(Clone, Debug)]
pub struct AcceptInfo {
    /// Winning alternative when the accept is unconditional.
    pub prediction: u32,
    pub rule: RuleIdx,
    /// Guard list for predicate-involved accepts; empty when the lowest
    /// accepting alternative carries no predicate.
    pub predicates: Vec<PredPrediction>,
}

/// A node of the lazily-built deterministic automaton. Identity is the
/// frozen configuration set; edges grow as new input symbols are
/// observed.
pub struct DfaState {
    pub id: DfaStateId,
    pub configs: ConfigSet,
    pub edges: FxHashMap<Symbol, DfaStateId>,
    pub accept: Option<AcceptInfo>,
}

/// Per-mode decision cache: the reachable decision states plus the
/// hash-consing table mapping configuration-set content to an existing
/// state. Append-only; discarded wholesale when the caller wants memory
/// back.
pub struct Dfa {
    pub mode: usize,
    states: Vec<DfaState>,
    by_key: FxHashMap<ConfigSetKey, DfaStateId>,
    pub s0: Option<DfaStateId>,
}

impl Dfa {
    pub fn new(mode: usize) -> Self {
        Dfa {
            mode,
            states: vec![],
            by_key: FxHashMap::default(),
            s0: None,
        }
    }

    pub fn state(&self, id: DfaStateId) -> &DfaState {
        &self.states[id.as_usize()]
    }

    pub fn state_mut(&mut self, id: DfaStateId) -> &mut DfaState {
        &mut self.states[id.as_usize()]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_edges(&self) -> usize {
        self.states.iter().map(|s| s.edges.len()).sum()
    }

    pub fn lookup(&self, key: &ConfigSetKey) -> Option<DfaStateId> {
        self.by_key.get(key).copied()
    }

    pub fn add_state(
        &mut self,
        key: ConfigSetKey,
        configs: ConfigSet,
        accept: Option<AcceptInfo>,
    ) -> DfaStateId {
        let id = DfaStateId::new(self.states.len());
        self.states.push(DfaState {
            id,
            configs,
            edges: FxHashMap::default(),
            accept,
        });
        self.by_key.insert(key, id);
        id
    }

    /// Text dump for debugging; one line per state.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for s in &self.states {
            write!(out, "s{}", s.id.as_usize()).unwrap();
            if let Some(acc) = &s.accept {
                if acc.predicates.is_empty() {
                    write!(out, " => alt {} (rule {})", acc.prediction, acc.rule.as_usize()).unwrap();
                } else {
                    let preds: Vec<String> = acc
                        .predicates
                        .iter()
                        .map(|p| format!("({:?}, {})", p.pred, p.alt))
                        .collect();
                    write!(out, " => [{}]", preds.join(", ")).unwrap();
                }
            }
            let mut edges: Vec<(&Symbol, &DfaStateId)> = s.edges.iter().collect();
            edges.sort_by_key(|(sym, _)| match sym {
                Symbol::Eof => -1i64,
                Symbol::Char(c) => *c as i64,
            });
            for (sym, target) in edges {
                let t = if target.is_error() {
                    "error".to_string()
                } else {
                    format!("s{}", target.as_usize())
                };
                write!(out, "\n  {} -> {}", sym.error_display(), t).unwrap();
            }
            out.push('\n');
        }
        out
    }
}
