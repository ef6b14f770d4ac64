use serde::{Deserialize, Serialize};

/// Hard bounds on engine resource usage. The decision cache is append-only
/// with no eviction, so exceeding a bound is a hard error rather than a
/// trigger for reclamation; callers needing bounded memory discard the
/// recognizer (or its cache) and rebuild.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct LexerLimits {
    /// Maximum recursion depth of one epsilon-closure call. An automaton
    /// whose call context grows without bound (self-recursive epsilon
    /// loop) hits this and is reported as a construction defect.
    pub max_closure_depth: usize,
    /// Maximum number of cached decision states per recognizer.
    pub max_dfa_states: usize,
}

impl Default for LexerLimits {
    fn default() -> Self {
        Self {
            max_closure_depth: 2_000,
            max_dfa_states: 10_000,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct LexerStats {
    pub tokens: usize,
    pub syntax_errors: usize,
    pub dfa_states: usize,
    pub dfa_edges: usize,
    pub closure_calls: usize,
    pub merge_cache_hits: usize,
    pub compute_time_us: u64,
}

impl LexerStats {
    pub fn delta(&self, previous: &LexerStats) -> LexerStats {
        LexerStats {
            tokens: self.tokens - previous.tokens,
            syntax_errors: self.syntax_errors - previous.syntax_errors,
            dfa_states: self.dfa_states - previous.dfa_states,
            dfa_edges: self.dfa_edges - previous.dfa_edges,
            closure_calls: self.closure_calls - previous.closure_calls,
            merge_cache_hits: self.merge_cache_hits - previous.merge_cache_hits,
            compute_time_us: self.compute_time_us - previous.compute_time_us,
        }
    }

    pub fn max(&self, other: &LexerStats) -> LexerStats {
        LexerStats {
            tokens: self.tokens.max(other.tokens),
            syntax_errors: self.syntax_errors.max(other.syntax_errors),
            dfa_states: self.dfa_states.max(other.dfa_states),
            dfa_edges: self.dfa_edges.max(other.dfa_edges),
            closure_calls: self.closure_calls.max(other.closure_calls),
            merge_cache_hits: self.merge_cache_hits.max(other.merge_cache_hits),
            compute_time_us: self.compute_time_us.max(other.compute_time_us),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}
