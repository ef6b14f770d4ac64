//! Hand-built demo grammars exercising the engine end to end, shared by
//! the CLI and the integration tests.

use std::sync::Arc;

use atnlex::atn::{LexerCommand, NetworkBuilder, RuleIdx};
use atnlex::{Interval, IntervalSet, Lexer, Network, StringCharStream, Token, HIDDEN_CHANNEL};

pub const ID: i32 = 1;
pub const INT: i32 = 2;
pub const WS: i32 = 3;
pub const LBRACK: i32 = 4;
pub const RBRACK: i32 = 5;
pub const INNER: i32 = 6;
pub const COMMENT: i32 = 7;
pub const KEY: i32 = 8;

pub const AS: i32 = 20;
pub const AB: i32 = 21;
pub const ABC: i32 = 22;

/// `lo..hi` one or more times. The loop goes through dedicated states so
/// every state keeps homogeneous outgoing edges.
pub fn plus_range_rule(
    b: &mut NetworkBuilder,
    mode: usize,
    name: &str,
    lo: char,
    hi: char,
    ttype: i32,
) -> RuleIdx {
    let r = b.add_rule(mode, name, ttype);
    let start = b.rule_start(r);
    let stop = b.rule_stop(r);
    let body = b.basic_state(r);
    let back = b.basic_state(r);
    b.range(start, body, lo, hi);
    b.epsilon(body, back);
    b.epsilon(body, stop);
    b.range(back, body, lo, hi);
    r
}

fn plus_set_rule(
    b: &mut NetworkBuilder,
    mode: usize,
    name: &str,
    set: IntervalSet,
    ttype: i32,
) -> RuleIdx {
    let r = b.add_rule(mode, name, ttype);
    let start = b.rule_start(r);
    let stop = b.rule_stop(r);
    let body = b.basic_state(r);
    let back = b.basic_state(r);
    b.set(start, body, set.clone(), false);
    b.epsilon(body, back);
    b.epsilon(body, stop);
    b.set(back, body, set, false);
    r
}

/// Overlapping rules used throughout the tests: `AS: 'a'+` declared
/// before `AB: 'ab'` and `ABC: 'abc'`. Runs of 'a' go to AS; "ab" and
/// "abc" win over the shorter one-char AS match by maximal munch.
pub fn ambiguous_grammar() -> Arc<Network> {
    let mut b = NetworkBuilder::new();
    let m = b.add_mode("DEFAULT");
    plus_range_rule(&mut b, m, "AS", 'a', 'a', AS);
    b.literal_rule(m, "AB", "ab", AB);
    b.literal_rule(m, "ABC", "abc", ABC);
    Arc::new(b.build().unwrap())
}

/// `AS: 'a'+` and `ABC: 'abc'` with no two-char rule in between: an
/// input like "abd" overshoots down the ABC path and has to seek back
/// to the one-char AS accept.
pub fn rollback_grammar() -> Arc<Network> {
    let mut b = NetworkBuilder::new();
    let m = b.add_mode("DEFAULT");
    plus_range_rule(&mut b, m, "AS", 'a', 'a', AS);
    b.literal_rule(m, "ABC", "abc", ABC);
    Arc::new(b.build().unwrap())
}

/// A small but representative token grammar:
///
/// ```text
/// KEY     : 'key' {pred 0}? ;
/// ID      : [a-z]+ ;
/// INT     : [0-9]+ ;
/// WS      : [ \t\r\n]+ -> skip ;
/// COMMENT : '#' ~[\n]* -> channel(HIDDEN) ;
/// LBRACK  : '[' -> pushMode(ISLAND) ;
///
/// mode ISLAND:
/// RBRACK  : ']' -> popMode ;
/// INNER   : [a-z0-9]+ ;
/// ```
pub fn demo_grammar() -> Arc<Network> {
    let mut b = NetworkBuilder::new();
    let dflt = b.add_mode("DEFAULT");

    // KEY precedes ID; with the predicate off, "key" falls through to ID
    let key = b.add_rule(dflt, "KEY", KEY);
    let mut cur = b.rule_start(key);
    for ch in "key".chars() {
        let next = b.basic_state(key);
        b.atom(cur, next, ch);
        cur = next;
    }
    let guarded = b.add_state(key, atnlex::StateKind::Basic);
    b.predicate(cur, guarded, key, 0);
    b.epsilon(guarded, b.rule_stop(key));

    plus_range_rule(&mut b, dflt, "ID", 'a', 'z', ID);
    plus_range_rule(&mut b, dflt, "INT", '0', '9', INT);

    let mut ws_set = IntervalSet::new();
    for ch in [' ', '\t', '\r', '\n'] {
        ws_set.add(Interval::point(ch as i32));
    }
    let ws = plus_set_rule(&mut b, dflt, "WS", ws_set, WS);
    b.set_commands(ws, vec![LexerCommand::Skip]);

    // COMMENT : '#' ~[\n]*
    let comment = b.add_rule(dflt, "COMMENT", COMMENT);
    let c_start = b.rule_start(comment);
    let c_stop = b.rule_stop(comment);
    let c_body = b.basic_state(comment);
    let c_back = b.basic_state(comment);
    b.atom(c_start, c_body, '#');
    b.epsilon(c_body, c_back);
    b.epsilon(c_body, c_stop);
    b.set(c_back, c_body, IntervalSet::of('\n' as i32, '\n' as i32), true);
    b.set_channel(comment, HIDDEN_CHANNEL);

    let lbrack = b.literal_rule(dflt, "LBRACK", "[", LBRACK);
    b.set_commands(lbrack, vec![LexerCommand::PushMode(1)]);

    let island = b.add_mode("ISLAND");
    let rbrack = b.literal_rule(island, "RBRACK", "]", RBRACK);
    b.set_commands(rbrack, vec![LexerCommand::PopMode]);
    let mut inner_set = IntervalSet::of('a' as i32, 'z' as i32);
    inner_set.add(Interval::of('0' as i32, '9' as i32));
    plus_set_rule(&mut b, island, "INNER", inner_set, INNER);

    Arc::new(b.build().unwrap())
}

pub fn lexer_for(atn: Arc<Network>, text: &str) -> Lexer {
    Lexer::new(atn, Box::new(StringCharStream::new(text)))
}

/// (type, text) pairs of the non-EOF tokens, text cut from the stream.
pub fn token_summaries(lx: &mut Lexer) -> anyhow::Result<Vec<(i32, String)>> {
    let tokens = lx.all_tokens()?;
    Ok(tokens
        .iter()
        .filter(|t| !t.is_eof())
        .map(|t| (t.ttype, lx.text_of(t)))
        .collect())
}

pub fn token_types(tokens: &[Token]) -> Vec<i32> {
    tokens.iter().map(|t| t.ttype).collect()
}
