use std::fmt::{self, Display};
use std::sync::Arc;

use crate::interval::Interval;
use crate::stream::CharStream;

pub const TOKEN_INVALID_TYPE: i32 = 0;
pub const TOKEN_EOF: i32 = -1;

pub const DEFAULT_CHANNEL: usize = 0;
pub const HIDDEN_CHANNEL: usize = 1;

/// Emitted symbol. `span` is the inclusive character interval in the
/// originating stream; `text` is materialized only if the factory chose
/// to copy it, otherwise it is derived on demand from the stream.
#[derive(Clone, Debug)]
pub struct Token {
    pub ttype: i32,
    pub channel: usize,
    pub span: Interval,
    pub line: usize,
    pub column: usize,
    pub index: i64,
    pub source_name: Arc<str>,
    text: Option<String>,
}

impl Token {
    pub fn with_full_fields(
        source_name: Arc<str>,
        ttype: i32,
        text: Option<String>,
        channel: usize,
        span: Interval,
        line: usize,
        column: usize,
    ) -> Self {
        Token {
            ttype,
            channel,
            span,
            line,
            column,
            index: -1,
            source_name,
            text,
        }
    }

    pub fn with_type_and_text(ttype: i32, text: &str) -> Self {
        Token {
            ttype,
            channel: DEFAULT_CHANNEL,
            span: Interval::INVALID,
            line: 0,
            column: 0,
            index: -1,
            source_name: Arc::from("<none>"),
            text: Some(text.to_string()),
        }
    }

    pub fn from_prior(prior: &Token) -> Self {
        prior.clone()
    }

    pub fn is_eof(&self) -> bool {
        self.ttype == TOKEN_EOF
    }

    /// Materialized text, if the factory copied it.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    /// Token text, pulling it from `input` when not materialized.
    pub fn text_from(&self, input: &dyn CharStream) -> String {
        match &self.text {
            Some(t) => t.clone(),
            None if self.ttype == TOKEN_EOF => "<EOF>".to_string(),
            None => input.text(self.span),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txt = match &self.text {
            Some(t) => t
                .replace('\n', "\\n")
                .replace('\r', "\\r")
                .replace('\t', "\\t"),
            None => "<no text>".to_string(),
        };
        let channel_str = if self.channel > 0 {
            format!(",channel={}", self.channel)
        } else {
            String::new()
        };
        write!(
            f,
            "[@{},{}:{}='{}',<{}>{},{}:{}]",
            self.index, self.span.a, self.span.b, txt, self.ttype, channel_str, self.line, self.column
        )
    }
}

/// Where a token came from: the stream it was cut out of, if any.
/// Factories use this to derive text lazily.
pub struct TokenSource<'a> {
    pub name: &'a str,
    pub input: Option<&'a dyn CharStream>,
}

pub trait TokenFactory {
    fn create(
        &self,
        source: &TokenSource<'_>,
        ttype: i32,
        text: Option<String>,
        channel: usize,
        span: Interval,
        line: usize,
        column: usize,
    ) -> Token;
}

/// Default factory. With `copy_text` the token text is cut out of the
/// stream eagerly at creation; otherwise text stays lazy and is derived
/// from the span when asked for.
#[derive(Clone, Default)]
pub struct CommonTokenFactory {
    copy_text: bool,
}

impl CommonTokenFactory {
    pub fn new() -> Self {
        CommonTokenFactory { copy_text: false }
    }

    pub fn with_copy_text() -> Self {
        CommonTokenFactory { copy_text: true }
    }
}

impl TokenFactory for CommonTokenFactory {
    fn create(
        &self,
        source: &TokenSource<'_>,
        ttype: i32,
        text: Option<String>,
        channel: usize,
        span: Interval,
        line: usize,
        column: usize,
    ) -> Token {
        let text = match text {
            Some(t) => Some(t),
            None if self.copy_text => source.input.map(|input| input.text(span)),
            None => None,
        };
        Token::with_full_fields(
            Arc::from(source.name),
            ttype,
            text,
            channel,
            span,
            line,
            column,
        )
    }
}
