//! Incremental classifier for the synthesizer's stderr stream.
//!
//! Lines are decoded lossily since the synthesizer is C code that may emit
//! arbitrary bytes. Known chatter is dropped, everything else is logged,
//! and the most recent line that reads like a fatal diagnostic is kept so
//! it can be attached to a `ProcessDied` error once the stream ends.

use tracing::{trace, warn};
use voxpipe_core::{ProcessExit, SynthError};

/// Longest partial line kept while waiting for its newline.
const MAX_PARTIAL: usize = 4096;

/// Stateful line splitter and filter for stderr.
#[derive(Debug, Default)]
pub struct ErrorStreamClassifier {
    partial: Vec<u8>,
    diagnostic: Option<String>,
    pid: u32,
}

impl ErrorStreamClassifier {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            ..Self::default()
        }
    }

    /// Consume a chunk read from stderr.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.partial.extend_from_slice(bytes);

        while let Some(newline) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=newline).collect();
            self.classify_line(&line[..newline]);
        }

        // The trailing fragment may be a diagnostic printed right before
        // the process exits without a newline.
        if !self.partial.is_empty() {
            let fragment = decode(&self.partial);
            if looks_terminal(&fragment) {
                self.diagnostic = Some(fragment);
            }
        }

        if self.partial.len() > MAX_PARTIAL {
            let line = std::mem::take(&mut self.partial);
            self.classify_line(&line);
        }
    }

    /// Flush the unterminated fragment at end of stream.
    pub fn finish(&mut self) {
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.classify_line(&line);
        }
    }

    /// The retained terminal diagnostic, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Build the error for a process that has gone away.
    pub fn died(&mut self, exit: ProcessExit) -> SynthError {
        self.finish();
        SynthError::ProcessDied {
            exit,
            message: self.diagnostic.take(),
        }
    }

    fn classify_line(&mut self, raw: &[u8]) {
        let line = decode(raw);
        if is_benign(&line) {
            trace!(pid = self.pid, %line, "Synthesizer notice");
            return;
        }
        warn!(pid = self.pid, %line, "Synthesizer stderr");
        if looks_terminal(&line) {
            self.diagnostic = Some(line);
        }
    }
}

fn decode(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.trim_end_matches(['\r', '\n']).trim().to_string()
}

/// Notices the synthesizer prints on every flush or reset.
const NOTICES: [&str; 2] = ["Got a reset signal", "Input Flush Signal"];

/// Blank lines and the synthesizer's flush/reset notices.
pub fn is_benign(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || NOTICES.iter().any(|notice| line.starts_with(notice))
}

/// Whether text reads like a fatal error report.
pub fn looks_terminal(text: &str) -> bool {
    let text = text.trim_start();
    ["Fatal", "FATAL", "Error", "error", "ERROR"]
        .iter()
        .any(|prefix| text.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_lines_are_filtered() {
        assert!(is_benign(""));
        assert!(is_benign("   "));
        assert!(is_benign("Input Flush Signal"));
        assert!(is_benign("Got a reset signal"));
        assert!(is_benign("Got a reset signal\r"));
        assert!(!is_benign("Warning: unknown diphone x-y"));
        assert!(!is_benign("Flush"));
        assert!(!is_benign("Warning: Reset of the synthesis engine"));
    }

    #[test]
    fn terminal_fragment_is_retained() {
        let mut classifier = ErrorStreamClassifier::new(1);
        classifier.feed(b"Warning: dropped frame\nFatal error: ");
        assert_eq!(classifier.diagnostic(), Some("Fatal error:"));
        classifier.feed(b"database corrupt");
        assert_eq!(classifier.diagnostic(), Some("Fatal error: database corrupt"));
    }

    #[test]
    fn lines_split_across_chunks() {
        let mut classifier = ErrorStreamClassifier::new(1);
        classifier.feed(b"Err");
        classifier.feed(b"or in line 3\nInput Flush Signal\n");
        assert_eq!(classifier.diagnostic(), Some("Error in line 3"));
    }

    #[test]
    fn non_terminal_lines_do_not_replace_diagnostic() {
        let mut classifier = ErrorStreamClassifier::new(1);
        classifier.feed(b"Error: first\nWarning: second\n");
        assert_eq!(classifier.diagnostic(), Some("Error: first"));
    }

    #[test]
    fn died_carries_diagnostic() {
        let mut classifier = ErrorStreamClassifier::new(1);
        classifier.feed(b"Fatal error: cannot open database");
        let err = classifier.died(ProcessExit::Exited(1));
        match err {
            SynthError::ProcessDied { exit, message } => {
                assert_eq!(exit, ProcessExit::Exited(1));
                assert_eq!(message.as_deref(), Some("Fatal error: cannot open database"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn died_without_output_has_no_message() {
        let mut classifier = ErrorStreamClassifier::new(1);
        classifier.feed(b"\n\nInput Flush Signal\nGot a reset signal\n");
        assert!(matches!(
            classifier.died(ProcessExit::Signaled(9)),
            SynthError::ProcessDied { message: None, .. }
        ));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut classifier = ErrorStreamClassifier::new(1);
        classifier.feed(b"Error: bad byte \xff\n");
        assert_eq!(classifier.diagnostic(), Some("Error: bad byte \u{fffd}"));
    }
}
