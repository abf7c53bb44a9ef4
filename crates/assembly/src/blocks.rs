//! History block building — one rendered line per message, consecutive
//! same-speaker messages merged into shared blocks.

use regex_lite::Regex;
use tracing::debug;

use turnguard_core::{
    Directory, HistoryMessage, MergedHistoryBlock, Normalizer, Role, TimeMode, TimeRenderer,
};

/// Raw inline image-id token, collapsed to a readable placeholder.
const PICID_PATTERN: &str = r"\[picid:[^\]]+\]";

/// Renders an ordered message list into merged history blocks.
///
/// Borrows its collaborator seams for the duration of one build; the
/// assembler constructs one per invocation with the inferred time mode.
pub struct HistoryBlockBuilder<'a> {
    directory: &'a dyn Directory,
    normalizer: &'a dyn Normalizer,
    renderer: &'a dyn TimeRenderer,
    mode: TimeMode,
    merge_consecutive: bool,
    picid: Regex,
}

impl<'a> HistoryBlockBuilder<'a> {
    pub fn new(
        directory: &'a dyn Directory,
        normalizer: &'a dyn Normalizer,
        renderer: &'a dyn TimeRenderer,
        mode: TimeMode,
    ) -> Self {
        Self {
            directory,
            normalizer,
            renderer,
            mode,
            merge_consecutive: true,
            picid: Regex::new(PICID_PATTERN).expect("picid pattern compiles"),
        }
    }

    /// Disable or re-enable consecutive-speaker merging.
    pub fn with_merge(mut self, merge_consecutive: bool) -> Self {
        self.merge_consecutive = merge_consecutive;
        self
    }

    /// Build blocks in original message order. Messages whose content
    /// normalizes to nothing are skipped entirely. `now` substitutes for
    /// missing or non-positive timestamps.
    pub fn build(&self, messages: &[HistoryMessage], now: f64) -> Vec<MergedHistoryBlock> {
        let mut blocks: Vec<MergedHistoryBlock> = Vec::new();

        for message in messages {
            let Some(content) = self.normalize_content(message) else {
                continue;
            };

            let role = if message.from_bot {
                Role::Assistant
            } else {
                Role::User
            };
            let timestamp = if message.timestamp > 0.0 {
                message.timestamp
            } else {
                now
            };
            let time = self.renderer.render(timestamp, self.mode);
            let speaker = self.resolve_speaker(message);
            let line = format!("{time}, {speaker}: {content}");
            let speaker_key = format!("{}:{}:{}", message.platform, message.user_id, role);

            match blocks.last_mut() {
                Some(last) if self.merge_consecutive && last.speaker_key == speaker_key => {
                    last.lines.push(line);
                }
                _ => blocks.push(MergedHistoryBlock {
                    role,
                    speaker_key,
                    lines: vec![line],
                }),
            }
        }

        blocks
    }

    /// Display text preferred, plain text as fallback; mention tokens
    /// rewritten, raw image ids collapsed. `None` means skip the message.
    fn normalize_content(&self, message: &HistoryMessage) -> Option<String> {
        let raw = if !message.display_text.is_empty() {
            &message.display_text
        } else {
            &message.plain_text
        };
        if raw.trim().is_empty() {
            return None;
        }

        let rewritten = self.normalizer.normalize(raw, &message.platform, true);
        let content = self.picid.replace_all(&rewritten, "[image]").trim().to_string();
        (!content.is_empty()).then_some(content)
    }

    /// Speaker naming priority: bot gets `"<nickname>(you)"`; everyone
    /// else tries the persisted display name, then message-carried
    /// nickname, card name, raw user id, and finally "someone".
    fn resolve_speaker(&self, message: &HistoryMessage) -> String {
        if message.from_bot {
            return format!("{}(you)", self.directory.bot_nickname());
        }

        match self
            .directory
            .display_name(&message.platform, &message.user_id)
        {
            Ok(Some(name)) if !name.is_empty() => return name,
            Ok(_) => {}
            Err(e) => {
                debug!(user = %message.user_id, error = %e, "Display name lookup failed, using fallback");
            }
        }

        for candidate in [&message.nickname, &message.card_name, &message.user_id] {
            if !candidate.is_empty() {
                return candidate.clone();
            }
        }
        "someone".into()
    }
}
