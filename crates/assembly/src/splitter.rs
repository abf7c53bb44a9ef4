//! Boundary detection — recovering prefix/history/suffix edges from a
//! flattened prompt.
//!
//! Three strategies run in a fixed order, first success wins:
//!
//! 1. **Time anchor** — the prompt's "current time:" line marks where
//!    history begins.
//! 2. **Header anchor** — a transcript header phrase marks where history
//!    begins.
//! 3. **Timeline scan** — no anchor at all; find the longest run of
//!    history-like lines and treat it as the history region.
//!
//! Only the prefix and suffix matter downstream: the history text between
//! them is re-rendered from the message store, never parsed back out of
//! the prompt.

use turnguard_core::PromptSplit;

use crate::timestamp::TimestampClassifier;

/// Start of the line that carries the prompt's own clock reading.
const TIME_ANCHOR: &str = "current time:";

/// Transcript header phrases, matched by containment.
const HEADER_ANCHORS: [&str; 2] = [
    "here is what's being discussed in the group",
    "here is what you discussed earlier",
];

/// Line starts that introduce the trailing instruction segment.
const SUFFIX_MARKERS: [&str; 7] = [
    "now",
    "you now want to add",
    "you are currently",
    "now please rewrite",
    "based on the chat",
    "the rewritten reply",
    "your name is",
];

type Strategy = fn(&[&str], &TimestampClassifier) -> Option<PromptSplit>;

const STRATEGIES: [Strategy; 3] = [
    split_by_time_anchor,
    split_by_header_anchor,
    split_by_timeline_scan,
];

/// Locate the system prefix and suffix surrounding the history region.
/// `None` when every strategy fails; the caller falls back to the
/// flattened prompt.
pub fn split_prompt(prompt: &str, classifier: &TimestampClassifier) -> Option<PromptSplit> {
    let lines: Vec<&str> = prompt.split('\n').collect();
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(&lines, classifier))
}

// ── Strategies ────────────────────────────────────────────────────────────

fn split_by_time_anchor(lines: &[&str], _classifier: &TimestampClassifier) -> Option<PromptSplit> {
    let anchor = lines
        .iter()
        .position(|l| l.trim().starts_with(TIME_ANCHOR))?;
    let history_start = anchor + 1;
    let history_end = find_suffix_start(lines, history_start);
    segments(lines, history_start, history_end)
}

fn split_by_header_anchor(
    lines: &[&str],
    _classifier: &TimestampClassifier,
) -> Option<PromptSplit> {
    let header = lines
        .iter()
        .position(|l| HEADER_ANCHORS.iter().any(|h| l.contains(h)))?;

    // History starts at the first non-blank line after the header
    let mut history_start = header + 1;
    while history_start < lines.len() && lines[history_start].trim().is_empty() {
        history_start += 1;
    }

    let history_end = find_suffix_start(lines, history_start);
    segments(lines, history_start, history_end)
}

fn split_by_timeline_scan(lines: &[&str], classifier: &TimestampClassifier) -> Option<PromptSplit> {
    let mut best: Option<(usize, usize)> = None;
    let mut best_len = 0usize;
    let mut run_start: Option<usize> = None;
    let mut timestamp_count = 0usize;

    // One virtual line past the end forces the final run to close.
    for idx in 0..=lines.len() {
        if let Some(line) = lines.get(idx) {
            if classifier.is_history_like_line(line, run_start.is_some()) {
                if run_start.is_none() {
                    run_start = Some(idx);
                }
                if classifier.is_timestamped_line(line) {
                    timestamp_count += 1;
                }
                continue;
            }
        }

        if let Some(start) = run_start.take() {
            let run_len = idx - start;
            // Strictly greater: equal-length runs keep the earliest
            if timestamp_count >= 1 && run_len > best_len {
                best_len = run_len;
                best = Some((start, idx));
            }
            timestamp_count = 0;
        }
    }

    let (start, end) = best?;
    segments(lines, start, end)
}

// ── Helpers ───────────────────────────────────────────────────────────────

/// First line at or after `from` that starts the trailing instruction
/// segment; `lines.len()` when none does.
fn find_suffix_start(lines: &[&str], from: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| {
            let trimmed = line.trim();
            SUFFIX_MARKERS.iter().any(|m| trimmed.starts_with(m))
        })
        .map_or(lines.len(), |(idx, _)| idx)
}

fn segments(lines: &[&str], history_start: usize, history_end: usize) -> Option<PromptSplit> {
    let history_start = history_start.min(lines.len());
    let split = PromptSplit {
        system_prefix: lines[..history_start].join("\n").trim().to_string(),
        system_suffix: lines[history_end..].join("\n").trim().to_string(),
    };
    split.has_content().then_some(split)
}
