use anyhow::{bail, Result};
use instant::Instant;
use std::sync::Arc;

use crate::api::{LexerLimits, LexerStats};
use crate::interval::Interval;
use crate::listener::{ConsoleErrorListener, ErrorListener};
use crate::stream::CharStream;
use crate::token::{CommonTokenFactory, Token, TokenFactory, TokenSource, TOKEN_EOF};

use super::network::{LexerCommand, Network, RuleIdx};
use super::simulator::{SimOutcome, Simulator};

pub const DEFAULT_MODE: usize = 0;

fn escape_for_error(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
}

/// The tokenizing driver: owns the character stream, the simulator and
/// the mode stack, and turns match outcomes into a token sequence.
/// Recognition errors are reported to listeners and recovered from by
/// dropping one character; the scan itself never fails on bad input.
pub struct Lexer {
    atn: Arc<Network>,
    sim: Simulator,
    input: Box<dyn CharStream>,
    factory: Box<dyn TokenFactory>,
    listeners: Vec<Box<dyn ErrorListener>>,
    sempred: Box<dyn FnMut(RuleIdx, u32) -> bool>,
    mode: usize,
    mode_stack: Vec<usize>,
    hit_eof: bool,
    token_start_index: usize,
    token_start_line: usize,
    token_start_column: usize,
    num_emitted: usize,
    stats: LexerStats,
}

impl Lexer {
    pub fn new(atn: Arc<Network>, input: Box<dyn CharStream>) -> Self {
        Self::with_limits(atn, input, LexerLimits::default())
    }

    pub fn with_limits(atn: Arc<Network>, input: Box<dyn CharStream>, limits: LexerLimits) -> Self {
        let sim = Simulator::new(atn.clone(), limits);
        Lexer {
            atn,
            sim,
            input,
            factory: Box::new(CommonTokenFactory::new()),
            listeners: vec![Box::new(ConsoleErrorListener)],
            sempred: Box::new(|_, _| true),
            mode: DEFAULT_MODE,
            mode_stack: vec![],
            hit_eof: false,
            token_start_index: 0,
            token_start_line: 1,
            token_start_column: 0,
            num_emitted: 0,
            stats: LexerStats::default(),
        }
    }

    pub fn set_factory(&mut self, factory: Box<dyn TokenFactory>) {
        self.factory = factory;
    }

    /// Install the semantic predicate hook. The default accepts every
    /// predicate.
    pub fn set_sempred_hook(&mut self, hook: Box<dyn FnMut(RuleIdx, u32) -> bool>) {
        self.sempred = hook;
    }

    pub fn add_error_listener(&mut self, listener: Box<dyn ErrorListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_error_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn mode(&self) -> usize {
        self.mode
    }

    pub fn set_mode(&mut self, mode: usize) {
        assert!(mode < self.atn.num_modes(), "unknown mode {}", mode);
        self.mode = mode;
    }

    pub fn push_mode(&mut self, mode: usize) {
        assert!(mode < self.atn.num_modes(), "unknown mode {}", mode);
        self.mode_stack.push(self.mode);
        self.mode = mode;
    }

    pub fn pop_mode(&mut self) -> Result<usize> {
        match self.mode_stack.pop() {
            Some(m) => {
                self.mode = m;
                Ok(m)
            }
            None => bail!("cannot pop from an empty mode stack"),
        }
    }

    pub fn mode_stack_depth(&self) -> usize {
        self.mode_stack.len()
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.sim.set_cache_enabled(enabled);
    }

    pub fn discard_cache(&mut self) {
        self.sim.discard_cache();
    }

    pub fn describe_dfa(&self, mode: usize) -> String {
        self.sim.describe_dfa(mode)
    }

    pub fn line(&self) -> usize {
        self.sim.line()
    }

    pub fn column(&self) -> usize {
        self.sim.column()
    }

    pub fn input(&self) -> &dyn CharStream {
        &*self.input
    }

    /// Token text, materialized or cut from the stream.
    pub fn text_of(&self, token: &Token) -> String {
        token.text_from(&*self.input)
    }

    /// Cumulative counters; decision-cache sizes reflect the current
    /// cache, the rest only ever grow.
    pub fn stats(&self) -> LexerStats {
        let mut s = self.stats.clone();
        s.dfa_states = self.sim.num_dfa_states();
        s.dfa_edges = self.sim.num_dfa_edges();
        s.closure_calls = self.sim.num_closure_calls();
        s.merge_cache_hits = self.sim.merge_cache_hits();
        s
    }

    /// Rewind to the start of the input. The decision cache survives;
    /// a re-scan of the same input rides it.
    pub fn reset(&mut self) {
        self.input.seek(0);
        self.sim.reset();
        self.mode = DEFAULT_MODE;
        self.mode_stack.clear();
        self.hit_eof = false;
        self.num_emitted = 0;
    }

    /// Produce the next token. Skip rules loop internally; at
    /// end-of-input every call returns the same EOF token.
    pub fn next_token(&mut self) -> Result<Token> {
        let t0 = Instant::now();
        let marker = self.input.mark();
        let result = self.next_token_inner();
        self.input.release(marker);
        self.stats.compute_time_us += t0.elapsed().as_micros() as u64;
        result
    }

    fn next_token_inner(&mut self) -> Result<Token> {
        'outer: loop {
            if self.hit_eof {
                return Ok(self.emit_eof());
            }
            self.token_start_index = self.input.index();
            self.token_start_line = self.sim.line();
            self.token_start_column = self.sim.column();
            let mut ttype_override: Option<i32> = None;
            let mut channel_override: Option<usize> = None;
            loop {
                let outcome = self
                    .sim
                    .match_token(&mut *self.input, self.mode, &mut *self.sempred)?;
                match outcome {
                    SimOutcome::Eof => {
                        self.hit_eof = true;
                        return Ok(self.emit_eof());
                    }
                    SimOutcome::NoViableAlt => {
                        self.notify_error();
                        self.recover();
                        continue 'outer;
                    }
                    SimOutcome::Accept { rule, .. } => {
                        let atn = self.atn.clone();
                        let info = atn.rule(rule);
                        let mut skip = false;
                        let mut more = false;
                        for cmd in &info.commands {
                            match cmd {
                                LexerCommand::Skip => skip = true,
                                LexerCommand::More => more = true,
                                LexerCommand::SetType(t) => ttype_override = Some(*t),
                                LexerCommand::SetChannel(c) => channel_override = Some(*c),
                                LexerCommand::SetMode(m) => self.set_mode(*m),
                                LexerCommand::PushMode(m) => self.push_mode(*m),
                                LexerCommand::PopMode => {
                                    self.pop_mode()?;
                                }
                            }
                        }
                        if skip {
                            continue 'outer;
                        }
                        if more {
                            // keep accumulating from the same start
                            continue;
                        }
                        let ttype = ttype_override.unwrap_or(info.token_type);
                        let channel = channel_override.unwrap_or(info.channel);
                        return Ok(self.emit(ttype, channel));
                    }
                }
            }
        }
    }

    /// Exhaust the input, returning every emitted token with the closing
    /// EOF last.
    pub fn all_tokens(&mut self) -> Result<Vec<Token>> {
        let mut tokens = vec![];
        loop {
            let t = self.next_token()?;
            let eof = t.is_eof();
            tokens.push(t);
            if eof {
                return Ok(tokens);
            }
        }
    }

    fn emit(&mut self, ttype: i32, channel: usize) -> Token {
        let span = Interval::of(
            self.token_start_index as i32,
            self.input.index() as i32 - 1,
        );
        let source = TokenSource {
            name: self.input.source_name(),
            input: Some(&*self.input),
        };
        let mut t = self.factory.create(
            &source,
            ttype,
            None,
            channel,
            span,
            self.token_start_line,
            self.token_start_column,
        );
        t.index = self.num_emitted as i64;
        self.num_emitted += 1;
        self.stats.tokens += 1;
        t
    }

    fn emit_eof(&mut self) -> Token {
        let pos = self.input.index() as i32;
        let source = TokenSource {
            name: self.input.source_name(),
            input: Some(&*self.input),
        };
        let mut t = self.factory.create(
            &source,
            TOKEN_EOF,
            None,
            crate::token::DEFAULT_CHANNEL,
            Interval::of(pos, pos - 1),
            self.sim.line(),
            self.sim.column(),
        );
        t.index = self.num_emitted as i64;
        t
    }

    fn notify_error(&mut self) {
        self.stats.syntax_errors += 1;
        let span = Interval::of(self.token_start_index as i32, self.input.index() as i32);
        let text = escape_for_error(&self.input.text(span));
        let msg = format!("token recognition error at: '{}'", text);
        let offending = Some(self.input.lookahead(1));
        for l in &self.listeners {
            l.syntax_error(
                self.input.source_name(),
                offending,
                self.token_start_line,
                self.token_start_column,
                &msg,
            );
        }
    }

    /// Drop one character and try again from the next position. Keeps
    /// the scan alive on arbitrary garbage.
    fn recover(&mut self) {
        if !self.input.lookahead(1).is_eof() {
            self.sim.consume(&mut *self.input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atn::builder::NetworkBuilder;
    use crate::stream::{StringCharStream, Symbol};
    use std::sync::Mutex;

    fn two_rule_lexer(text: &str) -> Lexer {
        let mut b = NetworkBuilder::new();
        let m = b.add_mode("DEFAULT");
        b.literal_rule(m, "AB", "ab", 1);
        let ws = b.literal_rule(m, "WS", " ", 2);
        b.set_commands(ws, vec![LexerCommand::Skip]);
        let atn = Arc::new(b.build().unwrap());
        Lexer::new(atn, Box::new(StringCharStream::new(text)))
    }

    #[test]
    fn skip_rules_produce_no_tokens() {
        let mut lx = two_rule_lexer("ab ab");
        let tokens = lx.all_tokens().unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].ttype, 1);
        assert_eq!(tokens[1].ttype, 1);
        assert_eq!(tokens[1].span, Interval::of(3, 4));
        assert!(tokens[2].is_eof());
        assert_eq!(lx.stats().tokens, 2);
    }

    #[test]
    fn eof_is_idempotent() {
        let mut lx = two_rule_lexer("ab");
        let tokens = lx.all_tokens().unwrap();
        let eof = tokens.last().unwrap();
        let again = lx.next_token().unwrap();
        assert!(again.is_eof());
        assert_eq!(again.index, eof.index);
        assert_eq!(again.span, eof.span);
    }

    struct Collector(Arc<Mutex<Vec<String>>>);

    impl ErrorListener for Collector {
        fn syntax_error(
            &self,
            _source_name: &str,
            _offending: Option<Symbol>,
            _line: usize,
            _column: usize,
            msg: &str,
        ) {
            self.0.lock().unwrap().push(msg.to_string());
        }
    }

    #[test]
    fn recovery_consumes_one_char() {
        let mut b = NetworkBuilder::new();
        let m = b.add_mode("DEFAULT");
        b.literal_rule(m, "A", "a", 1);
        let atn = Arc::new(b.build().unwrap());
        let mut lx = Lexer::new(atn, Box::new(StringCharStream::new("a!a")));
        lx.remove_error_listeners();
        let msgs = Arc::new(Mutex::new(vec![]));
        lx.add_error_listener(Box::new(Collector(msgs.clone())));
        let tokens = lx.all_tokens().unwrap();
        assert_eq!(tokens.len(), 3); // two 'a' tokens plus EOF
        assert_eq!(lx.stats().syntax_errors, 1);
        let msgs = msgs.lock().unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0], "token recognition error at: '!'");
    }

    #[test]
    fn more_accumulates_into_next_token() {
        // PRE: 'x' -> more; A: 'a'; the emitted token spans "xa"
        let mut b = NetworkBuilder::new();
        let m = b.add_mode("DEFAULT");
        let pre = b.literal_rule(m, "PRE", "x", 3);
        b.set_commands(pre, vec![LexerCommand::More]);
        b.literal_rule(m, "A", "a", 1);
        let atn = Arc::new(b.build().unwrap());
        let mut lx = Lexer::new(atn, Box::new(StringCharStream::new("xa")));
        let t = lx.next_token().unwrap();
        assert_eq!(t.ttype, 1);
        assert_eq!(t.span, Interval::of(0, 1));
        assert_eq!(lx.text_of(&t), "xa");
    }

    #[test]
    fn mode_stack_discipline() {
        // '[' pushes ISLAND, ']' pops back; 'i' only exists inside
        let mut b = NetworkBuilder::new();
        let dflt = b.add_mode("DEFAULT");
        let open = b.literal_rule(dflt, "OPEN", "[", 1);
        b.literal_rule(dflt, "A", "a", 2);
        let island = b.add_mode("ISLAND");
        let close = b.literal_rule(island, "CLOSE", "]", 3);
        b.literal_rule(island, "I", "i", 4);
        b.set_commands(open, vec![LexerCommand::PushMode(1)]);
        b.set_commands(close, vec![LexerCommand::PopMode]);
        let atn = Arc::new(b.build().unwrap());
        let mut lx = Lexer::new(atn, Box::new(StringCharStream::new("a[i]a")));
        let types: Vec<i32> = lx.all_tokens().unwrap().iter().map(|t| t.ttype).collect();
        assert_eq!(types, vec![2, 1, 4, 3, 2, TOKEN_EOF]);
        assert_eq!(lx.mode(), DEFAULT_MODE);
        assert_eq!(lx.mode_stack_depth(), 0);
        assert!(lx.pop_mode().is_err());
    }

    #[test]
    fn line_and_column_tracking() {
        let mut b = NetworkBuilder::new();
        let m = b.add_mode("DEFAULT");
        b.literal_rule(m, "A", "a", 1);
        let nl = b.literal_rule(m, "NL", "\n", 2);
        b.set_commands(nl, vec![LexerCommand::Skip]);
        let atn = Arc::new(b.build().unwrap());
        let mut lx = Lexer::new(atn, Box::new(StringCharStream::new("a\na")));
        let tokens = lx.all_tokens().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 0));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 0));
    }

    #[test]
    fn reset_reuses_cache() {
        let mut lx = two_rule_lexer("ab ab");
        let first = lx.all_tokens().unwrap();
        let states = lx.stats().dfa_states;
        lx.reset();
        let second = lx.all_tokens().unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(
            first.iter().map(|t| t.ttype).collect::<Vec<_>>(),
            second.iter().map(|t| t.ttype).collect::<Vec<_>>()
        );
        assert_eq!(lx.stats().dfa_states, states);
    }
}
