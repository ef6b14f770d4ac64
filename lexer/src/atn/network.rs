use crate::interval::{Interval, IntervalSet};
use crate::stream::Symbol;

/// Index of a state in the transition network. Stable for the network's
/// lifetime.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StateIdx(u32);

impl StateIdx {
    pub fn new(idx: usize) -> Self {
        StateIdx(idx as u32)
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Index of a token rule.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct RuleIdx(u32);

impl RuleIdx {
    pub fn new(idx: usize) -> Self {
        RuleIdx(idx as u32)
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Basic,
    /// Entry of a token rule; targets of mode-start alternatives.
    RuleStart,
    /// Terminal state of a rule; a configuration here is an accept.
    RuleStop,
    /// Decision point with more than one way forward.
    BlockStart,
    BlockEnd,
    LoopEntry,
    LoopBack,
    LoopEnd,
    /// Per-mode start state; its outgoing epsilon transitions enumerate
    /// the mode's rules in declaration order.
    TokenStart,
}

/// Directive attached to a token rule, executed when the rule wins a
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerCommand {
    Skip,
    More,
    SetType(i32),
    SetChannel(usize),
    SetMode(usize),
    PushMode(usize),
    PopMode,
}

/// Typed edge between two states. Epsilon-ness decides whether the edge
/// is followed during closure (no input) or during reach (consumes one
/// symbol).
#[derive(Debug, Clone)]
pub enum Transition {
    Epsilon {
        target: StateIdx,
    },
    Atom {
        target: StateIdx,
        symbol: char,
    },
    Range {
        target: StateIdx,
        range: Interval,
    },
    Set {
        target: StateIdx,
        set: IntervalSet,
        negated: bool,
    },
    /// Invoke another rule: jump to its start state, remembering
    /// `follow` as the return position on the call context.
    Rule {
        target: StateIdx,
        rule: RuleIdx,
        follow: StateIdx,
    },
    /// Viable only if the predicate evaluates true at match time.
    Predicate {
        target: StateIdx,
        rule: RuleIdx,
        pred_index: u32,
    },
    /// Side-effecting edge; epsilon for simulation purposes. The effect
    /// itself is carried by the owning rule's command list and runs when
    /// the rule wins.
    Action {
        target: StateIdx,
        action_index: u32,
    },
}

impl Transition {
    pub fn target(&self) -> StateIdx {
        match self {
            Transition::Epsilon { target }
            | Transition::Atom { target, .. }
            | Transition::Range { target, .. }
            | Transition::Set { target, .. }
            | Transition::Rule { target, .. }
            | Transition::Predicate { target, .. }
            | Transition::Action { target, .. } => *target,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        !matches!(
            self,
            Transition::Atom { .. } | Transition::Range { .. } | Transition::Set { .. }
        )
    }

    /// Does this edge consume `sym`? End-of-input matches nothing.
    pub fn matches(&self, sym: Symbol) -> bool {
        let c = match sym {
            Symbol::Eof => return false,
            Symbol::Char(c) => c as i32,
        };
        match self {
            Transition::Atom { symbol, .. } => *symbol as i32 == c,
            Transition::Range { range, .. } => range.contains(c),
            Transition::Set { set, negated, .. } => set.contains(c) != *negated,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct State {
    pub kind: StateKind,
    pub rule: RuleIdx,
    pub transitions: Vec<Transition>,
    /// True when every outgoing transition is epsilon. A state mixing
    /// epsilon and consuming edges is demoted (flag false) at
    /// construction time, with a warning.
    pub epsilon_only: bool,
}

#[derive(Debug, Clone)]
pub struct RuleInfo {
    pub name: String,
    pub mode: usize,
    pub start: StateIdx,
    pub stop: StateIdx,
    pub token_type: i32,
    pub channel: usize,
    pub commands: Vec<LexerCommand>,
}

#[derive(Debug, Clone)]
pub struct ModeInfo {
    pub name: String,
    pub start: StateIdx,
}

/// The immutable transition network walked by the simulator. Built once
/// by `NetworkBuilder`, then shared read-only; recognizers never mutate
/// it.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) states: Vec<State>,
    pub(crate) rules: Vec<RuleInfo>,
    pub(crate) modes: Vec<ModeInfo>,
    /// Construction-time diagnostics (epsilon-homogeneity demotions).
    pub(crate) warnings: Vec<String>,
}

impl Network {
    pub fn state(&self, idx: StateIdx) -> &State {
        &self.states[idx.as_usize()]
    }

    pub fn rule(&self, idx: RuleIdx) -> &RuleInfo {
        &self.rules[idx.as_usize()]
    }

    pub fn mode(&self, mode: usize) -> &ModeInfo {
        &self.modes[mode]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    pub fn num_modes(&self) -> usize {
        self.modes.len()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
