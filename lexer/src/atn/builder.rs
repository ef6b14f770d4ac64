use anyhow::{ensure, Result};

use crate::interval::{Interval, IntervalSet};
use crate::logging::Logger;
use crate::token::DEFAULT_CHANNEL;

use super::network::{
    LexerCommand, ModeInfo, Network, RuleIdx, RuleInfo, State, StateIdx, StateKind, Transition,
};

/// Programmatic assembly of a transition network. The builder enforces
/// the construction-time invariants the simulator relies on, in
/// particular epsilon-homogeneity of each state's outgoing edges: a
/// violation is not fatal (recognition degrades conservatively) but is
/// logged and recorded on the finished network.
pub struct NetworkBuilder {
    states: Vec<State>,
    rules: Vec<RuleInfo>,
    modes: Vec<ModeInfo>,
    warnings: Vec<String>,
    logger: Logger,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        NetworkBuilder {
            states: vec![],
            rules: vec![],
            modes: vec![],
            warnings: vec![],
            logger: Logger::buffering(),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn add_mode(&mut self, name: &str) -> usize {
        let mode = self.modes.len();
        let start = self.push_state(StateKind::TokenStart, RuleIdx::new(0));
        self.modes.push(ModeInfo {
            name: name.to_string(),
            start,
        });
        mode
    }

    /// Open a token rule in `mode`. Creates the rule's start and stop
    /// states and wires the mode start to it; declaration order defines
    /// alternative numbering and thus tie-breaking precedence.
    pub fn add_rule(&mut self, mode: usize, name: &str, token_type: i32) -> RuleIdx {
        assert!(mode < self.modes.len(), "unknown mode {}", mode);
        let rule = RuleIdx::new(self.rules.len());
        let start = self.push_state(StateKind::RuleStart, rule);
        let stop = self.push_state(StateKind::RuleStop, rule);
        self.rules.push(RuleInfo {
            name: name.to_string(),
            mode,
            start,
            stop,
            token_type,
            channel: DEFAULT_CHANNEL,
            commands: vec![],
        });
        let mode_start = self.modes[mode].start;
        self.add_transition(mode_start, Transition::Epsilon { target: start });
        rule
    }

    pub fn rule_start(&self, rule: RuleIdx) -> StateIdx {
        self.rules[rule.as_usize()].start
    }

    pub fn rule_stop(&self, rule: RuleIdx) -> StateIdx {
        self.rules[rule.as_usize()].stop
    }

    pub fn set_channel(&mut self, rule: RuleIdx, channel: usize) {
        self.rules[rule.as_usize()].channel = channel;
    }

    pub fn set_commands(&mut self, rule: RuleIdx, commands: Vec<LexerCommand>) {
        self.rules[rule.as_usize()].commands = commands;
    }

    pub fn add_state(&mut self, rule: RuleIdx, kind: StateKind) -> StateIdx {
        self.push_state(kind, rule)
    }

    pub fn basic_state(&mut self, rule: RuleIdx) -> StateIdx {
        self.push_state(StateKind::Basic, rule)
    }

    pub fn epsilon(&mut self, from: StateIdx, to: StateIdx) {
        self.add_transition(from, Transition::Epsilon { target: to });
    }

    pub fn atom(&mut self, from: StateIdx, to: StateIdx, symbol: char) {
        self.add_transition(from, Transition::Atom { target: to, symbol });
    }

    pub fn range(&mut self, from: StateIdx, to: StateIdx, lo: char, hi: char) {
        self.add_transition(
            from,
            Transition::Range {
                target: to,
                range: Interval::of(lo as i32, hi as i32),
            },
        );
    }

    pub fn set(&mut self, from: StateIdx, to: StateIdx, set: IntervalSet, negated: bool) {
        self.add_transition(
            from,
            Transition::Set {
                target: to,
                set,
                negated,
            },
        );
    }

    pub fn call(&mut self, from: StateIdx, rule: RuleIdx, follow: StateIdx) {
        let target = self.rule_start(rule);
        self.add_transition(
            from,
            Transition::Rule {
                target,
                rule,
                follow,
            },
        );
    }

    pub fn predicate(&mut self, from: StateIdx, to: StateIdx, rule: RuleIdx, pred_index: u32) {
        self.add_transition(
            from,
            Transition::Predicate {
                target: to,
                rule,
                pred_index,
            },
        );
    }

    pub fn action(&mut self, from: StateIdx, to: StateIdx, action_index: u32) {
        self.add_transition(
            from,
            Transition::Action {
                target: to,
                action_index,
            },
        );
    }

    /// Convenience: a rule matching one literal string.
    pub fn literal_rule(&mut self, mode: usize, name: &str, literal: &str, token_type: i32) -> RuleIdx {
        let rule = self.add_rule(mode, name, token_type);
        let mut cur = self.rule_start(rule);
        for ch in literal.chars() {
            let next = self.basic_state(rule);
            self.atom(cur, next, ch);
            cur = next;
        }
        let stop = self.rule_stop(rule);
        self.epsilon(cur, stop);
        rule
    }

    pub fn add_transition(&mut self, from: StateIdx, t: Transition) {
        assert!(t.target().as_usize() < self.states.len(), "transition target out of range");
        let state = &mut self.states[from.as_usize()];
        if state.transitions.is_empty() {
            state.epsilon_only = t.is_epsilon();
        } else if state.epsilon_only != t.is_epsilon() {
            let msg = format!(
                "state {} has both epsilon and non-epsilon transitions",
                from.as_usize()
            );
            self.logger.warn(&msg);
            self.warnings.push(msg);
            state.epsilon_only = false;
        }
        state.transitions.push(t);
    }

    /// Validate and freeze. The network is immutable from here on.
    pub fn build(self) -> Result<Network> {
        ensure!(!self.modes.is_empty(), "network has no modes");
        for (i, mode) in self.modes.iter().enumerate() {
            let start = &self.states[mode.start.as_usize()];
            ensure!(
                !start.transitions.is_empty(),
                "mode {} ({}) has no rules",
                i,
                mode.name
            );
        }
        for rule in &self.rules {
            ensure!(
                !self.states[rule.start.as_usize()].transitions.is_empty(),
                "rule {} has an empty body",
                rule.name
            );
        }
        // A rule whose start reaches its stop without consuming a symbol
        // would let the driving loop emit zero-width tokens forever.
        let mut nullable = vec![false; self.rules.len()];
        loop {
            let mut changed = false;
            for (i, rule) in self.rules.iter().enumerate() {
                if !nullable[i] && self.epsilon_reaches(rule.start, rule.stop, &nullable) {
                    nullable[i] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        for (i, rule) in self.rules.iter().enumerate() {
            ensure!(!nullable[i], "rule {} can match the empty string", rule.name);
        }
        Ok(Network {
            states: self.states,
            rules: self.rules,
            modes: self.modes,
            warnings: self.warnings,
        })
    }

    /// Can `to` be reached from `from` over non-consuming edges alone?
    /// Rule calls are traversed (into the follow state) only when the
    /// callee is already known nullable.
    fn epsilon_reaches(&self, from: StateIdx, to: StateIdx, nullable: &[bool]) -> bool {
        let mut seen = vec![false; self.states.len()];
        let mut stack = vec![from];
        while let Some(s) = stack.pop() {
            if s == to {
                return true;
            }
            if std::mem::replace(&mut seen[s.as_usize()], true) {
                continue;
            }
            for t in &self.states[s.as_usize()].transitions {
                match t {
                    Transition::Epsilon { target }
                    | Transition::Predicate { target, .. }
                    | Transition::Action { target, .. } => stack.push(*target),
                    Transition::Rule { rule, follow, .. } => {
                        if nullable[rule.as_usize()] {
                            stack.push(*follow);
                        }
                    }
                    _ => {}
                }
            }
        }
        false
    }

    fn push_state(&mut self, kind: StateKind, rule: RuleIdx) -> StateIdx {
        let idx = StateIdx::new(self.states.len());
        self.states.push(State {
            kind,
            rule,
            transitions: vec![],
            epsilon_only: true,
        });
        idx
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
