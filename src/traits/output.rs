/// Terminal output behind a trait so command runs can be asserted on in tests
pub trait Output: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);

    fn warning(&self, message: &str);

    /// Progress line, e.g. one per imported resource
    fn info(&self, message: &str);

    fn section(&self, title: &str);

    fn subsection(&self, title: &str);

    fn key_value(&self, key: &str, value: &str);

    /// Key-value pair whose value should stand out, such as a failure count
    fn key_value_highlight(&self, key: &str, value: &str);

    fn dimmed(&self, message: &str);

    fn blank(&self);
}

/// Writes to the terminal through the `output` module
pub struct TerminalOutput;

impl Output for TerminalOutput {
    fn success(&self, message: &str) {
        crate::output::success(message);
    }

    fn error(&self, message: &str) {
        crate::output::error(message);
    }

    fn warning(&self, message: &str) {
        crate::output::warning(message);
    }

    fn info(&self, message: &str) {
        crate::output::info(message);
    }

    fn section(&self, title: &str) {
        crate::output::section(title);
    }

    fn subsection(&self, title: &str) {
        crate::output::subsection(title);
    }

    fn key_value(&self, key: &str, value: &str) {
        crate::output::key_value(key, value);
    }

    fn key_value_highlight(&self, key: &str, value: &str) {
        crate::output::key_value_highlight(key, value);
    }

    fn dimmed(&self, message: &str) {
        crate::output::dimmed(message);
    }

    fn blank(&self) {
        crate::output::blank();
    }
}

#[cfg(test)]
pub use mock::{MockOutput, OutputMessage};
