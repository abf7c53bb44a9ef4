//! Reference normalization — rewriting mention/reply tokens to display form.
//!
//! Host platforms embed machine-readable reference tokens inside message
//! text (`@<name:id>` mentions, `[reply=<name:id>]` markers). Before a
//! message becomes a history line those tokens must read like what a human
//! saw on screen.

use regex_lite::{Captures, Regex};

/// Rewrites embedded reference tokens before history lines are rendered.
pub trait Normalizer: Send + Sync {
    /// `replace_bot_name` controls whether references to the bot itself get
    /// the `(you)` annotation used elsewhere for the bot's own lines.
    fn normalize(&self, text: &str, platform: &str, replace_bot_name: bool) -> String;
}

const MENTION_PATTERN: &str = r"@<([^:>]+):[^>]+>";
const REPLY_PATTERN: &str = r"\[reply=<([^:>]+):[^>]+>\]";

/// Regex-based normalizer for the `@<name:id>` / `[reply=<name:id>]` token
/// grammar. Text without tokens passes through untouched.
pub struct MentionNormalizer {
    mention_re: Regex,
    reply_re: Regex,
    bot_nickname: Option<String>,
}

impl MentionNormalizer {
    pub fn new() -> Self {
        Self {
            mention_re: Regex::new(MENTION_PATTERN).expect("mention pattern compiles"),
            reply_re: Regex::new(REPLY_PATTERN).expect("reply pattern compiles"),
            bot_nickname: None,
        }
    }

    /// Teach the normalizer the bot's nickname so bot references can be
    /// annotated when `replace_bot_name` is set.
    pub fn with_bot_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.bot_nickname = Some(nickname.into());
        self
    }

    fn render_name(&self, name: &str, replace_bot_name: bool) -> String {
        match &self.bot_nickname {
            Some(bot) if replace_bot_name && name == bot => format!("@{name}(you)"),
            _ => format!("@{name}"),
        }
    }
}

impl Default for MentionNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for MentionNormalizer {
    fn normalize(&self, text: &str, _platform: &str, replace_bot_name: bool) -> String {
        let mentions = self
            .mention_re
            .replace_all(text, |caps: &Captures<'_>| {
                self.render_name(&caps[1], replace_bot_name)
            });
        self.reply_re
            .replace_all(&mentions, |caps: &Captures<'_>| {
                self.render_name(&caps[1], replace_bot_name)
            })
            .into_owned()
    }
}
