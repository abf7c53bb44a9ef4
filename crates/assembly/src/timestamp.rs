//! Timestamp line recognition and time-mode inference.
//!
//! History transcripts embedded in flattened prompts render every message
//! as `<time>, <speaker>: <content>`. This module recognizes those lines,
//! recognizes the structural markers that travel with them (image blocks,
//! session headers), and infers which of the two time renderings the
//! prompt used so reconstruction can match it.

use regex_lite::Regex;
use turnguard_core::TimeMode;

/// A full history line: optional bracketed tag, then a time expression,
/// then `", "` and content.
const TIMESTAMPED_LINE: &str = r"^\s*(?:\[[^\]]+\])?(?:just now|\d+ seconds? ago|\d+ minutes? ago|\d+ hours? ago|\d+ days? ago|\d{1,2}:\d{2}(?::\d{2})?|\d{1,2}-\d{1,2}\s+\d{1,2}:\d{2}(?::\d{2})?),\s+.+";

/// Relative-time phrase anywhere in a prompt.
const RELATIVE_PROBE: &str = r"(?:seconds? ago|minutes? ago|hours? ago|days? ago),\s";

/// Bare clock time anywhere in a prompt.
const ABSOLUTE_PROBE: &str = r"\d{1,2}:\d{2}(?::\d{2})?,\s";

const IMAGE_HEADER: &str = "image info:";
const IMAGE_LINE_PREFIX: &str = "[image";
const IMAGE_LINE_MARKER: &str = "] content:";
const SESSION_HEADER_PREFIX: &str = "history starts at:";

/// Recognizes history-style lines and infers the prompt's time rendering.
///
/// Patterns are compiled once at construction; create one and reuse it.
pub struct TimestampClassifier {
    timestamped_line: Regex,
    relative_probe: Regex,
    absolute_probe: Regex,
}

impl TimestampClassifier {
    pub fn new() -> Self {
        Self {
            timestamped_line: Regex::new(TIMESTAMPED_LINE)
                .expect("timestamped line pattern compiles"),
            relative_probe: Regex::new(RELATIVE_PROBE).expect("relative probe pattern compiles"),
            absolute_probe: Regex::new(ABSOLUTE_PROBE).expect("absolute probe pattern compiles"),
        }
    }

    /// Whether `line` looks like a rendered history message.
    pub fn is_timestamped_line(&self, line: &str) -> bool {
        self.timestamped_line.is_match(line)
    }

    /// Whether `line` belongs to a history region.
    ///
    /// Timestamped lines and the structural markers around them qualify;
    /// blank lines qualify only while a history run is already open, so
    /// embedded blank lines don't terminate a run prematurely.
    pub fn is_history_like_line(&self, line: &str, has_open_block: bool) -> bool {
        let stripped = line.trim();
        if stripped.is_empty() {
            return has_open_block;
        }
        if self.is_timestamped_line(line) {
            return true;
        }
        if stripped == IMAGE_HEADER {
            return true;
        }
        if stripped.starts_with(IMAGE_LINE_PREFIX) && stripped.contains(IMAGE_LINE_MARKER) {
            return true;
        }
        stripped.starts_with(SESSION_HEADER_PREFIX)
    }

    /// Which time rendering the flattened prompt used.
    ///
    /// Relative phrases win over clock times; a prompt with neither
    /// defaults to relative.
    pub fn infer_time_mode(&self, prompt: &str) -> TimeMode {
        if self.relative_probe.is_match(prompt) {
            return TimeMode::Relative;
        }
        if self.absolute_probe.is_match(prompt) {
            return TimeMode::AbsoluteNoYear;
        }
        TimeMode::Relative
    }
}

impl Default for TimestampClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_relative_lines() {
        let c = TimestampClassifier::new();
        assert!(c.is_timestamped_line("just now, alice: hi"));
        assert!(c.is_timestamped_line("3 minutes ago, bob: hello"));
        assert!(c.is_timestamped_line("1 second ago, bob: quick"));
        assert!(c.is_timestamped_line("2 days ago, carol: back then"));
    }

    #[test]
    fn recognizes_absolute_lines() {
        let c = TimestampClassifier::new();
        assert!(c.is_timestamped_line("14:05, alice: hi"));
        assert!(c.is_timestamped_line("14:05:33, alice: hi"));
        assert!(c.is_timestamped_line("06-12 14:05:33, alice: hi"));
    }

    #[test]
    fn recognizes_tagged_lines() {
        let c = TimestampClassifier::new();
        assert!(c.is_timestamped_line("[group] 14:05, alice: hi"));
        assert!(c.is_timestamped_line("  [x] just now, bob: indented"));
    }

    #[test]
    fn rejects_non_history_lines() {
        let c = TimestampClassifier::new();
        assert!(!c.is_timestamped_line("hello there"));
        assert!(!c.is_timestamped_line("now answer the question"));
        // time expression without the ", " separator
        assert!(!c.is_timestamped_line("14:05 alice: hi"));
        // separator without trailing content
        assert!(!c.is_timestamped_line("just now, "));
    }

    #[test]
    fn structural_markers_are_history_like() {
        let c = TimestampClassifier::new();
        assert!(c.is_history_like_line("image info:", false));
        assert!(c.is_history_like_line("[image 1] content: a cat photo", false));
        assert!(c.is_history_like_line("history starts at: 06-10 09:00", false));
        assert!(!c.is_history_like_line("unrelated prose", false));
    }

    #[test]
    fn blank_lines_only_extend_open_runs() {
        let c = TimestampClassifier::new();
        assert!(c.is_history_like_line("", true));
        assert!(c.is_history_like_line("   ", true));
        assert!(!c.is_history_like_line("", false));
    }

    #[test]
    fn infers_relative_mode() {
        let c = TimestampClassifier::new();
        assert_eq!(
            c.infer_time_mode("intro\n3 minutes ago, a: hi\noutro"),
            TimeMode::Relative
        );
    }

    #[test]
    fn infers_absolute_mode() {
        let c = TimestampClassifier::new();
        assert_eq!(
            c.infer_time_mode("intro\n14:05, a: hi\noutro"),
            TimeMode::AbsoluteNoYear
        );
    }

    #[test]
    fn relative_wins_over_absolute() {
        let c = TimestampClassifier::new();
        assert_eq!(
            c.infer_time_mode("14:05, a: hi\n3 minutes ago, b: yo"),
            TimeMode::Relative
        );
    }

    #[test]
    fn defaults_to_relative() {
        let c = TimestampClassifier::new();
        assert_eq!(c.infer_time_mode("no times here at all"), TimeMode::Relative);
    }
}
