use std::sync::{Arc, Mutex};

use atnlex::{
    ErrorListener, Interval, Lexer, StringCharStream, Symbol, DEFAULT_CHANNEL, HIDDEN_CHANNEL,
    TOKEN_EOF,
};
use sample_lexer::{
    ambiguous_grammar, demo_grammar, lexer_for, rollback_grammar, token_summaries, token_types, AB,
    ABC, AS, COMMENT, ID, INNER, INT, KEY, LBRACK, RBRACK,
};

#[test]
fn longest_match_wins_over_declaration_order() {
    // "ab" satisfies AS after one char, but AB covers both
    let mut lx = lexer_for(ambiguous_grammar(), "ab");
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![AB, TOKEN_EOF]);
    assert_eq!(tokens[0].span, Interval::of(0, 1));

    let mut lx = lexer_for(ambiguous_grammar(), "abcaa");
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![ABC, AS, TOKEN_EOF]);
    assert_eq!(lx.text_of(&tokens[1]), "aa");
}

#[test]
fn overshoot_rolls_back_to_last_accept() {
    // on "abd" the scan runs two chars down the ABC path before dying on
    // 'd'; the token is the one-char AS accept, and the 'b' and 'd' left
    // behind are recognition errors
    let mut lx = lexer_for(rollback_grammar(), "abd");
    lx.remove_error_listeners();
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![AS, TOKEN_EOF]);
    assert_eq!(tokens[0].span, Interval::of(0, 0));
    assert_eq!(lx.text_of(&tokens[0]), "a");
    assert_eq!(lx.stats().syntax_errors, 2);
}

#[test]
fn intermediate_accept_shortens_the_rollback() {
    // with AB declared as well, the same "abd" input rolls back only to
    // the two-char accept; just the 'd' is left over
    let mut lx = lexer_for(ambiguous_grammar(), "abd");
    lx.remove_error_listeners();
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![AB, TOKEN_EOF]);
    assert_eq!(tokens[0].span, Interval::of(0, 1));
    assert_eq!(lx.text_of(&tokens[0]), "ab");
    assert_eq!(lx.stats().syntax_errors, 1);
}

#[test]
fn greedy_repetition_beats_later_alternatives() {
    // "aab": the repetition accepts through "aa"; AB never becomes
    // viable at position 0, and the trailing 'b' is an error
    let mut lx = lexer_for(ambiguous_grammar(), "aab");
    lx.remove_error_listeners();
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![AS, TOKEN_EOF]);
    assert_eq!(lx.text_of(&tokens[0]), "aa");
    assert_eq!(lx.stats().syntax_errors, 1);
}

#[test]
fn determinism_across_resets() {
    let mut lx = lexer_for(demo_grammar(), "foo 12 [ab1] bar # trailing");
    let first = lx.all_tokens().unwrap();
    let states_after_first = lx.stats().dfa_states;
    for _ in 0..3 {
        lx.reset();
        let again = lx.all_tokens().unwrap();
        assert_eq!(token_types(&first), token_types(&again));
        assert_eq!(
            first.iter().map(|t| t.span).collect::<Vec<_>>(),
            again.iter().map(|t| t.span).collect::<Vec<_>>()
        );
    }
    // later passes ride the cache, no growth
    assert_eq!(lx.stats().dfa_states, states_after_first);
}

#[test]
fn cache_disabled_is_observationally_equivalent() {
    let text = "foo 12 [ab1] bar";
    let mut cached = lexer_for(demo_grammar(), text);
    let mut uncached = lexer_for(demo_grammar(), text);
    uncached.set_cache_enabled(false);
    let a = cached.all_tokens().unwrap();
    let b = uncached.all_tokens().unwrap();
    assert_eq!(token_types(&a), token_types(&b));
    assert_eq!(
        a.iter().map(|t| (t.span, t.line, t.column)).collect::<Vec<_>>(),
        b.iter().map(|t| (t.span, t.line, t.column)).collect::<Vec<_>>()
    );
}

struct CountingListener(Arc<Mutex<Vec<(usize, usize, String)>>>);

impl ErrorListener for CountingListener {
    fn syntax_error(
        &self,
        _source_name: &str,
        _offending: Option<Symbol>,
        line: usize,
        column: usize,
        msg: &str,
    ) {
        self.0.lock().unwrap().push((line, column, msg.to_string()));
    }
}

#[test]
fn recovery_keeps_the_scan_alive() {
    let mut lx = lexer_for(demo_grammar(), "foo ! bar");
    lx.remove_error_listeners();
    let errors = Arc::new(Mutex::new(vec![]));
    lx.add_error_listener(Box::new(CountingListener(errors.clone())));
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![ID, ID, TOKEN_EOF]);
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, 1);
    assert_eq!(errors[0].2, "token recognition error at: '!'");
    assert_eq!(lx.stats().syntax_errors, 1);
}

#[test]
fn garbage_only_input_terminates() {
    let mut lx = lexer_for(demo_grammar(), "!!!");
    lx.remove_error_listeners();
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![TOKEN_EOF]);
    assert_eq!(lx.stats().syntax_errors, 3);
}

#[test]
fn mode_stack_push_pop_balance() {
    let mut lx = lexer_for(demo_grammar(), "[ab][12][z9]");
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(
        token_types(&tokens),
        vec![LBRACK, INNER, RBRACK, LBRACK, INNER, RBRACK, LBRACK, INNER, RBRACK, TOKEN_EOF]
    );
    assert_eq!(lx.mode_stack_depth(), 0);
    // N pushes saw N pops; one more is a discipline fault
    assert!(lx.pop_mode().is_err());
}

#[test]
fn eof_is_idempotent() {
    let mut lx = lexer_for(demo_grammar(), "x");
    let tokens = lx.all_tokens().unwrap();
    let eof = tokens.last().unwrap();
    for _ in 0..3 {
        let again = lx.next_token().unwrap();
        assert!(again.is_eof());
        assert_eq!(again.span, eof.span);
        assert_eq!(again.index, eof.index);
    }
}

#[test]
fn skip_and_hidden_channel() {
    let mut lx = lexer_for(demo_grammar(), "foo # note\nbar");
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![ID, COMMENT, ID, TOKEN_EOF]);
    assert_eq!(tokens[0].channel, DEFAULT_CHANNEL);
    assert_eq!(tokens[1].channel, HIDDEN_CHANNEL);
    assert_eq!(lx.text_of(&tokens[1]), "# note");
    // the newline was skipped, bar starts line 2
    assert_eq!((tokens[2].line, tokens[2].column), (2, 0));
}

#[test]
fn predicate_gates_keyword_against_identifier() {
    let atn = demo_grammar();
    let mut on = lexer_for(atn.clone(), "key keys");
    on.set_sempred_hook(Box::new(|_, _| true));
    let summaries = token_summaries(&mut on).unwrap();
    // exact "key" is the keyword; "keys" munches further into ID
    assert_eq!(summaries, vec![(KEY, "key".into()), (ID, "keys".into())]);

    let mut off = lexer_for(atn, "key keys");
    off.set_sempred_hook(Box::new(|_, _| false));
    let summaries = token_summaries(&mut off).unwrap();
    assert_eq!(summaries, vec![(ID, "key".into()), (ID, "keys".into())]);
}

#[test]
fn tokens_carry_positions_and_indices() {
    let mut lx = lexer_for(demo_grammar(), "ab 12\ncd");
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![ID, INT, ID, TOKEN_EOF]);
    assert_eq!(tokens[0].index, 0);
    assert_eq!(tokens[1].index, 1);
    assert_eq!(tokens[2].index, 2);
    assert_eq!((tokens[1].line, tokens[1].column), (1, 3));
    assert_eq!((tokens[2].line, tokens[2].column), (2, 0));
    assert_eq!(tokens[2].span, Interval::of(6, 7));
}

#[test]
fn stats_report_counts_and_cache_sizes() {
    let mut lx = lexer_for(demo_grammar(), "foo 12 bar");
    lx.all_tokens().unwrap();
    let stats = lx.stats();
    assert_eq!(stats.tokens, 3);
    assert_eq!(stats.syntax_errors, 0);
    assert!(stats.dfa_states > 0);
    assert!(stats.dfa_edges > 0);
    assert!(stats.closure_calls > 0);
    let json = stats.to_json();
    assert!(json.contains("\"tokens\":3"));
    assert!(json.contains("dfa_states"));
}

#[test]
fn discard_cache_then_rescan() {
    let mut lx = lexer_for(demo_grammar(), "foo bar");
    let first = lx.all_tokens().unwrap();
    lx.discard_cache();
    assert_eq!(lx.stats().dfa_states, 0);
    lx.reset();
    let second = lx.all_tokens().unwrap();
    assert_eq!(token_types(&first), token_types(&second));
    assert!(lx.stats().dfa_states > 0);
}

#[test]
fn shared_network_supports_independent_lexers() {
    let atn = demo_grammar();
    let mut a = lexer_for(atn.clone(), "foo");
    let mut b = lexer_for(atn, "12");
    let ta = a.all_tokens().unwrap();
    let tb = b.all_tokens().unwrap();
    assert_eq!(token_types(&ta), vec![ID, TOKEN_EOF]);
    assert_eq!(token_types(&tb), vec![INT, TOKEN_EOF]);
}

#[test]
fn token_display_format() {
    let mut lx = lexer_for(demo_grammar(), "foo");
    let tokens = lx.all_tokens().unwrap();
    let mut t = tokens[0].clone();
    t.set_text(lx.text_of(&t));
    assert_eq!(t.to_string(), "[@0,0:2='foo',<1>,1:0]");
    let mut hidden = t.clone();
    hidden.channel = HIDDEN_CHANNEL;
    assert_eq!(hidden.to_string(), "[@0,0:2='foo',<1>,channel=1,1:0]");
}

#[test]
fn unterminated_input_still_emits_partial_tokens() {
    // '[' pushes ISLAND and input ends inside it; EOF arrives under the
    // island mode and the stack is left unbalanced for the caller to see
    let mut lx = lexer_for(demo_grammar(), "foo [ab");
    let tokens = lx.all_tokens().unwrap();
    assert_eq!(token_types(&tokens), vec![ID, LBRACK, INNER, TOKEN_EOF]);
    assert_eq!(lx.mode_stack_depth(), 1);
}

#[test]
fn cache_is_shared_across_inputs_of_one_lexer() {
    let atn = ambiguous_grammar();
    let mut lx = Lexer::new(atn, Box::new(StringCharStream::new("aab aab")));
    lx.remove_error_listeners(); // the space is a recognition error here
    lx.all_tokens().unwrap();
    let stats1 = lx.stats();
    lx.reset();
    lx.all_tokens().unwrap();
    let stats2 = lx.stats();
    assert_eq!(stats1.dfa_states, stats2.dfa_states);
    assert_eq!(stats1.closure_calls, stats2.closure_calls);
}
