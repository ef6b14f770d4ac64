//! Adaptive lexer engine: a grammar is compiled into a transition
//! network once, then recognizers simulate it against character streams,
//! caching each decision as a deterministic state so hot paths run at
//! DFA speed.
//!
//! Construction happens through [`NetworkBuilder`]; tokenizing through
//! [`Lexer`], which owns a [`CharStream`] and yields [`Token`]s until
//! EOF. The lower-level [`Simulator`] is public for callers that want
//! raw match outcomes without the driving loop.

mod api;
pub mod atn;
mod bitset;
mod hashcons;
mod interval;
mod listener;
mod logging;
mod stream;
mod token;

pub use api::{LexerLimits, LexerStats};
pub use atn::{
    Lexer, LexerCommand, Network, NetworkBuilder, RuleIdx, SimOutcome, Simulator, StateIdx,
    StateKind, DEFAULT_MODE,
};
pub use interval::{Interval, IntervalSet};
pub use listener::{ConsoleErrorListener, ErrorListener};
pub use logging::Logger;
pub use stream::{CharStream, StringCharStream, Symbol};
pub use token::{
    CommonTokenFactory, Token, TokenFactory, TokenSource, DEFAULT_CHANNEL, HIDDEN_CHANNEL,
    TOKEN_EOF, TOKEN_INVALID_TYPE,
};
