use crate::stream::Symbol;

/// Callback for recognition failures. Listeners fan out in registration
/// order; reporting never aborts the scan.
pub trait ErrorListener {
    fn syntax_error(
        &self,
        source_name: &str,
        offending: Option<Symbol>,
        line: usize,
        column: usize,
        msg: &str,
    );
}

/// Default listener, installed on every recognizer until explicitly
/// cleared.
pub struct ConsoleErrorListener;

impl ErrorListener for ConsoleErrorListener {
    fn syntax_error(
        &self,
        _source_name: &str,
        _offending: Option<Symbol>,
        line: usize,
        column: usize,
        msg: &str,
    ) {
        eprintln!("line {}:{} {}", line, column, msg);
    }
}
