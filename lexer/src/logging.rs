use std::fmt::Write;

/// Leveled logger writing to an in-memory buffer and/or stderr.
/// Level 0 is silent, 1 warnings, 2 info. Construction warnings from the
/// network builder go through this, so tests can assert on the buffer
/// instead of scraping stderr. Recognition errors do not; they reach
/// callers through the error listeners.
pub struct Logger {
    buffer_level: u32,
    stderr_level: u32,
    buffer: String,
    num_warnings: usize,
}

impl Clone for Logger {
    fn clone(&self) -> Self {
        Self {
            buffer_level: self.buffer_level,
            stderr_level: self.stderr_level,
            buffer: String::new(), // clean logs on clone
            num_warnings: 0,
        }
    }
}

impl Logger {
    pub fn new(buffer_level: u32, stderr_level: u32) -> Self {
        Self {
            buffer_level,
            stderr_level,
            buffer: String::new(),
            num_warnings: 0,
        }
    }

    /// Buffer warnings, keep stderr quiet.
    pub fn buffering() -> Self {
        Self::new(1, 0)
    }

    pub fn warn(&mut self, s: &str) {
        self.num_warnings += 1;
        if self.level_enabled(1) {
            self.write_str("Warning: ").unwrap();
            self.write_str(s).unwrap();
            self.write_str("\n").unwrap();
        }
    }

    pub fn info(&mut self, s: &str) {
        if self.level_enabled(2) {
            self.write_str(s).unwrap();
            self.write_str("\n").unwrap();
        }
    }

    #[inline(always)]
    pub fn level_enabled(&self, level: u32) -> bool {
        level <= std::cmp::max(self.buffer_level, self.stderr_level)
    }

    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }

    pub fn get_buffer(&self) -> &str {
        &self.buffer
    }

    pub fn get_and_clear_logs(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

impl Write for Logger {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        if self.buffer_level > 0 {
            self.buffer.push_str(s);
        }
        if self.stderr_level > 0 {
            eprint!("{}", s);
        }
        Ok(())
    }
}
