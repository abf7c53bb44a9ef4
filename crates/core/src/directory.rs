//! Identity seam — who is the bot, and what do we call everyone else.
//!
//! The host usually backs this with its person/profile database. Whoever
//! materializes `HistoryMessage` records uses `is_bot` to stamp `from_bot`;
//! line rendering later uses `display_name` as the top-priority speaker
//! naming source.

use std::collections::HashMap;

use crate::error::DirectoryError;

/// Identity lookups used while rendering history lines.
pub trait Directory: Send + Sync {
    /// Whether this sender is the bot's own identity.
    fn is_bot(&self, platform: &str, user_id: &str) -> bool;

    /// Best-effort persisted display name. `Ok(None)` when unknown; errors
    /// degrade to the caller's next naming fallback instead of aborting.
    fn display_name(
        &self,
        platform: &str,
        user_id: &str,
    ) -> Result<Option<String>, DirectoryError>;

    /// The bot's own nickname, rendered as `"<nickname>(you)"` in lines.
    fn bot_nickname(&self) -> &str;
}

/// A fixed roster: one bot identity plus an in-memory name table.
#[derive(Debug, Clone)]
pub struct StaticRoster {
    bot_user_id: String,
    bot_nickname: String,
    names: HashMap<(String, String), String>,
}

impl StaticRoster {
    pub fn new(bot_user_id: impl Into<String>, bot_nickname: impl Into<String>) -> Self {
        Self {
            bot_user_id: bot_user_id.into(),
            bot_nickname: bot_nickname.into(),
            names: HashMap::new(),
        }
    }

    /// Add a persisted display name for a platform user.
    pub fn with_name(mut self, platform: &str, user_id: &str, name: &str) -> Self {
        self.names
            .insert((platform.to_string(), user_id.to_string()), name.to_string());
        self
    }
}

impl Directory for StaticRoster {
    fn is_bot(&self, _platform: &str, user_id: &str) -> bool {
        user_id == self.bot_user_id
    }

    fn display_name(
        &self,
        platform: &str,
        user_id: &str,
    ) -> Result<Option<String>, DirectoryError> {
        Ok(self
            .names
            .get(&(platform.to_string(), user_id.to_string()))
            .cloned())
    }

    fn bot_nickname(&self) -> &str {
        &self.bot_nickname
    }
}
