mod builder;
mod config;
mod context;
mod dfa;
mod lexer;
mod network;
mod simulator;

pub use builder::NetworkBuilder;
pub use config::{Config, ConfigSet, ConfigSetKey, SemPred};
pub use context::{ContextArena, CtxRef, EMPTY_RETURN_STATE};
pub use dfa::{AcceptInfo, Dfa, DfaState, DfaStateId, PredPrediction};
pub use lexer::{Lexer, DEFAULT_MODE};
pub use network::{
    LexerCommand, ModeInfo, Network, RuleIdx, RuleInfo, State, StateIdx, StateKind, Transition,
};
pub use simulator::{SimOutcome, Simulator};
