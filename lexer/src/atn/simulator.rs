use anyhow::{ensure, Result};
use rustc_hash::FxHashSet;
use std::sync::Arc;

use crate::api::LexerLimits;
use crate::stream::{CharStream, Symbol};

use super::config::{Config, ConfigSet, SemPred};
use super::context::{ContextArena, CtxRef, EMPTY_RETURN_STATE};
use super::dfa::{AcceptInfo, Dfa, DfaStateId, PredPrediction};
use super::network::{Network, RuleIdx, StateIdx, StateKind, Transition};

/// Result of one match attempt. A recognition failure is data, not an
/// error; `Err` from the simulator always means a construction defect or
/// an exhausted resource limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOutcome {
    Accept { rule: RuleIdx, alt: u32 },
    /// End-of-input with nothing consumed in this attempt.
    Eof,
    NoViableAlt,
}

/// Marker of the most recent accepting state seen during a scan, so
/// maximal munch can roll the input back after overshooting.
#[derive(Clone, Copy, Default)]
struct SimState {
    index: usize,
    line: usize,
    column: usize,
    dfa_state: Option<DfaStateId>,
}

/// Predicate hook; consulted at match time for predicate-guarded
/// accepts.
pub type PredicateFn<'a> = &'a mut dyn FnMut(RuleIdx, u32) -> bool;

/// Adaptive simulator: walks the transition network one symbol at a
/// time, building the per-mode deterministic caches on demand. One
/// simulator per recognizer instance; the caches are private to it and
/// never mutated concurrently.
pub struct Simulator {
    atn: Arc<Network>,
    dfas: Vec<Dfa>,
    ctxs: ContextArena,
    limits: LexerLimits,
    /// With the cache disabled every step recomputes the reach closure;
    /// matching outcomes are identical, only timing differs.
    cache_enabled: bool,
    line: usize,
    column: usize,
    start_index: usize,
    prev_accept: SimState,
    num_closure_calls: usize,
}

impl Simulator {
    pub fn new(atn: Arc<Network>, limits: LexerLimits) -> Self {
        let dfas = (0..atn.num_modes()).map(Dfa::new).collect();
        Simulator {
            atn,
            dfas,
            ctxs: ContextArena::new(),
            limits,
            cache_enabled: true,
            line: 1,
            column: 0,
            start_index: 0,
            prev_accept: SimState::default(),
            num_closure_calls: 0,
        }
    }

    pub fn atn(&self) -> &Network {
        &self.atn
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn set_position(&mut self, line: usize, column: usize) {
        self.line = line;
        self.column = column;
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// Clear per-scan state. Deliberately keeps the decision caches:
    /// reuse across resets is the point of building them.
    pub fn reset(&mut self) {
        self.line = 1;
        self.column = 0;
        self.start_index = 0;
        self.prev_accept = SimState::default();
    }

    /// Throw away every cached decision state and context. The explicit
    /// escape hatch for long-lived recognizers; growth is otherwise
    /// monotonic.
    pub fn discard_cache(&mut self) {
        self.dfas = (0..self.atn.num_modes()).map(Dfa::new).collect();
        self.ctxs = ContextArena::new();
    }

    pub fn num_dfa_states(&self) -> usize {
        self.dfas.iter().map(|d| d.num_states()).sum()
    }

    pub fn num_dfa_edges(&self) -> usize {
        self.dfas.iter().map(|d| d.num_edges()).sum()
    }

    pub fn num_closure_calls(&self) -> usize {
        self.num_closure_calls
    }

    pub fn merge_cache_hits(&self) -> usize {
        self.ctxs.merge_cache_hits()
    }

    pub fn describe_dfa(&self, mode: usize) -> String {
        self.dfas[mode].describe()
    }

    /// Advance one symbol, tracking line/column.
    pub fn consume(&mut self, input: &mut dyn CharStream) {
        if input.lookahead(1) == Symbol::Char('\n') {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        input.consume();
    }

    /// Match one token starting at the current input position, under
    /// `mode`. On `Accept` the input is positioned just past the
    /// longest match; on `NoViableAlt` it is left where simulation
    /// stopped, for the driving loop's recovery to deal with.
    pub fn match_token(
        &mut self,
        input: &mut dyn CharStream,
        mode: usize,
        sempred: PredicateFn<'_>,
    ) -> Result<SimOutcome> {
        assert!(mode < self.dfas.len(), "unknown mode {}", mode);
        self.start_index = input.index();
        self.prev_accept = SimState::default();
        let s0 = self.start_state(mode)?;
        self.exec(input, mode, s0, sempred)
    }

    fn start_state(&mut self, mode: usize) -> Result<DfaStateId> {
        if self.cache_enabled {
            if let Some(s0) = self.dfas[mode].s0 {
                return Ok(s0);
            }
        }
        let atn = self.atn.clone();
        let start = atn.mode(mode).start;
        let mut configs = ConfigSet::new(false);
        for (i, tr) in atn.state(start).transitions.iter().enumerate() {
            let config = Config::new(tr.target(), (i + 1) as u32, CtxRef::EMPTY);
            let mut visited = FxHashSet::default();
            self.closure(config, &mut configs, &mut visited, 0)?;
        }
        let id = self.add_dfa_state(mode, configs)?;
        if self.cache_enabled {
            self.dfas[mode].s0 = Some(id);
        }
        Ok(id)
    }

    fn exec(
        &mut self,
        input: &mut dyn CharStream,
        mode: usize,
        s0: DfaStateId,
        sempred: PredicateFn<'_>,
    ) -> Result<SimOutcome> {
        let mut s = s0;
        if self.dfas[mode].state(s).accept.is_some() {
            self.capture(input, s);
        }
        let mut t = input.lookahead(1);
        loop {
            let target = self.next_state(mode, s, t)?;
            if target.is_error() {
                break;
            }
            if !t.is_eof() {
                self.consume(input);
            }
            if self.dfas[mode].state(target).accept.is_some() {
                self.capture(input, target);
            }
            if t.is_eof() {
                break;
            }
            s = target;
            t = input.lookahead(1);
        }
        self.fail_or_accept(input, mode, t, sempred)
    }

    /// One deterministic step: cached edge if present, freshly computed
    /// reach set otherwise.
    fn next_state(&mut self, mode: usize, s: DfaStateId, t: Symbol) -> Result<DfaStateId> {
        if self.cache_enabled {
            if let Some(&target) = self.dfas[mode].state(s).edges.get(&t) {
                return Ok(target);
            }
        }
        self.compute_target(mode, s, t)
    }

    /// Subset-construction step: advance every configuration whose
    /// outgoing transition consumes `t`, epsilon-close the results, and
    /// install the canonicalized set as the edge target.
    fn compute_target(&mut self, mode: usize, s: DfaStateId, t: Symbol) -> Result<DfaStateId> {
        let atn = self.atn.clone();
        let source: Vec<Config> = self.dfas[mode].state(s).configs.iter().cloned().collect();
        let mut reach = ConfigSet::new(false);
        for c in &source {
            for tr in &atn.state(c.state).transitions {
                if tr.matches(t) {
                    let mut visited = FxHashSet::default();
                    self.closure(c.at_state(tr.target()), &mut reach, &mut visited, 0)?;
                }
            }
        }
        let target = if reach.is_empty() {
            DfaStateId::ERROR
        } else {
            self.add_dfa_state(mode, reach)?
        };
        if self.cache_enabled {
            self.dfas[mode].state_mut(s).edges.insert(t, target);
        }
        Ok(target)
    }

    /// Epsilon-transitive expansion of one configuration into `configs`.
    /// `visited` bounds plain cycles within this closure call; the depth
    /// limit catches context stacks growing without bound, which is an
    /// automaton-construction defect.
    fn closure(
        &mut self,
        config: Config,
        configs: &mut ConfigSet,
        visited: &mut FxHashSet<(StateIdx, CtxRef, SemPred)>,
        depth: usize,
    ) -> Result<()> {
        self.num_closure_calls += 1;
        ensure!(
            depth < self.limits.max_closure_depth,
            "epsilon closure exceeded depth {} at state {}; automaton has an unbounded epsilon cycle",
            self.limits.max_closure_depth,
            config.state.as_usize()
        );
        if !visited.insert((config.state, config.ctx, config.sem_pred)) {
            return Ok(());
        }
        let atn = self.atn.clone();
        let state = atn.state(config.state);

        if state.kind == StateKind::RuleStop {
            if config.ctx.is_empty() {
                configs.add(config, &mut self.ctxs);
                return Ok(());
            }
            if self.ctxs.has_empty_path(config.ctx) {
                // part of this thread escapes the rule with no caller
                let mut escaped = config.with_ctx(config.state, CtxRef::EMPTY);
                escaped.reaches_into_outer_context = config.reaches_into_outer_context + 1;
                configs.add(escaped, &mut self.ctxs);
            }
            for (ret, parent) in self.ctxs.entries(config.ctx) {
                if ret == EMPTY_RETURN_STATE {
                    continue;
                }
                let returned = config.with_ctx(StateIdx::new(ret as usize), parent);
                self.closure(returned, configs, visited, depth + 1)?;
            }
            return Ok(());
        }

        if !state.epsilon_only {
            configs.add(config.clone(), &mut self.ctxs);
        }

        for tr in &state.transitions {
            match tr {
                Transition::Epsilon { target } | Transition::Action { target, .. } => {
                    self.closure(config.at_state(*target), configs, visited, depth + 1)?;
                }
                Transition::Rule { target, follow, .. } => {
                    let ctx = self.ctxs.push(config.ctx, follow.as_u32());
                    self.closure(config.with_ctx(*target, ctx), configs, visited, depth + 1)?;
                }
                Transition::Predicate {
                    target,
                    rule,
                    pred_index,
                } => {
                    let guarded = config.with_pred(
                        *target,
                        SemPred::Pred {
                            rule: *rule,
                            index: *pred_index,
                        },
                    );
                    self.closure(guarded, configs, visited, depth + 1)?;
                }
                _ => {} // consuming transitions belong to the reach step
            }
        }
        Ok(())
    }

    /// Canonicalize `configs` through the per-mode hash-consing table,
    /// allocating (and accept-annotating) a decision state only for a
    /// previously-unseen set.
    fn add_dfa_state(&mut self, mode: usize, mut configs: ConfigSet) -> Result<DfaStateId> {
        let atn = self.atn.clone();
        configs.freeze(&atn);
        let key = configs.dedup_key();
        if let Some(id) = self.dfas[mode].lookup(&key) {
            return Ok(id);
        }
        ensure!(
            self.dfas[mode].num_states() < self.limits.max_dfa_states,
            "too many decision states: {} >= {}",
            self.dfas[mode].num_states(),
            self.limits.max_dfa_states
        );
        let accept = Self::compute_accept(&atn, &configs);
        Ok(self.dfas[mode].add_state(key, configs, accept))
    }

    /// Accept status of a fresh decision state. Lowest accepting
    /// alternative wins, consistent with first-declared-wins precedence;
    /// predicate-guarded entries ahead of the first unconditional one
    /// are kept for match-time evaluation.
    fn compute_accept(atn: &Network, configs: &ConfigSet) -> Option<AcceptInfo> {
        let mut accepting: Vec<&Config> = configs
            .iter()
            .filter(|c| atn.state(c.state).kind == StateKind::RuleStop)
            .collect();
        if accepting.is_empty() {
            return None;
        }
        accepting.sort_by_key(|c| c.alt);
        let first = accepting[0];
        let first_rule = atn.state(first.state).rule;
        if first.sem_pred.is_none() {
            return Some(AcceptInfo {
                prediction: first.alt,
                rule: first_rule,
                predicates: vec![],
            });
        }
        let mut predicates = vec![];
        for c in accepting {
            let rule = atn.state(c.state).rule;
            predicates.push(PredPrediction {
                pred: c.sem_pred,
                alt: c.alt,
                rule,
            });
            if c.sem_pred.is_none() {
                break; // unconditional fallback; later entries can't win
            }
        }
        let first = &predicates[0];
        Some(AcceptInfo {
            prediction: first.alt,
            rule: first.rule,
            predicates,
        })
    }

    fn capture(&mut self, input: &dyn CharStream, s: DfaStateId) {
        self.prev_accept = SimState {
            index: input.index(),
            line: self.line,
            column: self.column,
            dfa_state: Some(s),
        };
    }

    /// Resolve the scan: roll back to the last accepting position if
    /// one was seen, otherwise classify the failure. On `NoViableAlt`
    /// the input stays where simulation stopped; the text between
    /// `start_index` and here is what the recovery path reports.
    fn fail_or_accept(
        &mut self,
        input: &mut dyn CharStream,
        mode: usize,
        t: Symbol,
        sempred: PredicateFn<'_>,
    ) -> Result<SimOutcome> {
        if let Some(dfa_state) = self.prev_accept.dfa_state {
            let accept = self.dfas[mode]
                .state(dfa_state)
                .accept
                .clone()
                .expect("captured state has accept info");
            let winner = Self::evaluate_accept(&accept, sempred);
            if let Some((rule, alt)) = winner {
                let marker = self.prev_accept;
                input.seek(marker.index);
                self.line = marker.line;
                self.column = marker.column;
                return Ok(SimOutcome::Accept { rule, alt });
            }
            // every guard failed; fall through to the failure cases
        }
        if t.is_eof() && input.index() == self.start_index {
            return Ok(SimOutcome::Eof);
        }
        Ok(SimOutcome::NoViableAlt)
    }

    /// Pick the winning alternative of an accepting state, consulting
    /// guards in alternative order. The entry list ends at the first
    /// unconditional alternative, so the scan terminates.
    fn evaluate_accept(
        accept: &AcceptInfo,
        sempred: PredicateFn<'_>,
    ) -> Option<(RuleIdx, u32)> {
        if accept.predicates.is_empty() {
            return Some((accept.rule, accept.prediction));
        }
        for p in &accept.predicates {
            match p.pred {
                SemPred::None => return Some((p.rule, p.alt)),
                SemPred::Pred { rule, index } => {
                    if sempred(rule, index) {
                        return Some((p.rule, p.alt));
                    }
                }
            }
        }
        None
    }
}
