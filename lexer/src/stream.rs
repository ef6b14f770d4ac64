use crate::interval::Interval;

/// One unit of input. End-of-input is a dedicated variant, never a code
/// point or a shifted index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Symbol {
    Eof,
    Char(char),
}

impl Symbol {
    pub fn is_eof(&self) -> bool {
        matches!(self, Symbol::Eof)
    }

    /// Readable rendering for error messages.
    pub fn error_display(&self) -> String {
        match self {
            Symbol::Eof => "<EOF>".to_string(),
            Symbol::Char('\n') => "\\n".to_string(),
            Symbol::Char('\t') => "\\t".to_string(),
            Symbol::Char('\r') => "\\r".to_string(),
            Symbol::Char(c) => c.to_string(),
        }
    }
}

/// Character source the recognizer pulls from. Offsets are in symbols,
/// not bytes. At least one outstanding mark must be supported so token
/// text stays recoverable on unbuffered implementations.
pub trait CharStream {
    /// Symbol `k` ahead of the cursor; `k = 1` is the next unconsumed one.
    fn lookahead(&mut self, k: usize) -> Symbol;

    /// Advance past one symbol. Calling this at end-of-input is a
    /// programming error.
    fn consume(&mut self);

    /// Offset of the next symbol to be consumed.
    fn index(&self) -> usize;

    /// Total number of symbols, if known.
    fn size(&self) -> usize;

    /// Open a rewind region; `release` closes it. Buffered streams may
    /// treat these as no-ops.
    fn mark(&mut self) -> i32;

    fn release(&mut self, marker: i32);

    /// Absolute repositioning; used by `reset` and maximal-munch rollback.
    fn seek(&mut self, pos: usize);

    /// Text covered by the inclusive interval.
    fn text(&self, interval: Interval) -> String;

    fn source_name(&self) -> &str {
        "<unknown>"
    }
}

/// In-memory implementation over a decoded string.
pub struct StringCharStream {
    chars: Vec<char>,
    pos: usize,
    name: String,
    last_marker: i32,
}

impl StringCharStream {
    pub fn new(text: &str) -> Self {
        Self::named(text, "<string>")
    }

    pub fn named(text: &str, name: &str) -> Self {
        StringCharStream {
            chars: text.chars().collect(),
            pos: 0,
            name: name.to_string(),
            last_marker: 0,
        }
    }
}

impl CharStream for StringCharStream {
    fn lookahead(&mut self, k: usize) -> Symbol {
        assert!(k >= 1, "lookahead distance must be at least 1");
        let idx = self.pos + k - 1;
        if idx >= self.chars.len() {
            Symbol::Eof
        } else {
            Symbol::Char(self.chars[idx])
        }
    }

    fn consume(&mut self) {
        assert!(self.pos < self.chars.len(), "cannot consume past end-of-input");
        self.pos += 1;
    }

    fn index(&self) -> usize {
        self.pos
    }

    fn size(&self) -> usize {
        self.chars.len()
    }

    fn mark(&mut self) -> i32 {
        // fully buffered; markers only tracked for release() pairing
        self.last_marker += 1;
        self.last_marker
    }

    fn release(&mut self, _marker: i32) {}

    fn seek(&mut self, pos: usize) {
        assert!(pos <= self.chars.len());
        self.pos = pos;
    }

    fn text(&self, interval: Interval) -> String {
        if interval.is_empty() {
            return String::new();
        }
        let start = interval.a.max(0) as usize;
        let stop = (interval.b as usize).min(self.chars.len().saturating_sub(1));
        if start > stop {
            return String::new();
        }
        self.chars[start..=stop].iter().collect()
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_and_consume() {
        let mut s = StringCharStream::new("ab");
        assert_eq!(s.lookahead(1), Symbol::Char('a'));
        assert_eq!(s.lookahead(2), Symbol::Char('b'));
        assert_eq!(s.lookahead(3), Symbol::Eof);
        s.consume();
        assert_eq!(s.index(), 1);
        s.consume();
        assert_eq!(s.lookahead(1), Symbol::Eof);
        s.seek(0);
        assert_eq!(s.lookahead(1), Symbol::Char('a'));
    }

    #[test]
    fn text_extraction() {
        let s = StringCharStream::new("hello");
        assert_eq!(s.text(Interval::of(1, 3)), "ell");
        assert_eq!(s.text(Interval::of(0, 99)), "hello");
        assert_eq!(s.text(Interval::INVALID), "");
    }
}
