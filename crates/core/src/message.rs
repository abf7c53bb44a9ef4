//! Turn and history-message domain types.
//!
//! These are the value objects that flow through the whole pipeline:
//! the host hands over a flattened prompt plus raw history records, the
//! assembly layer recovers its boundaries, and the result comes back as
//! an ordered list of role-tagged turns.

use serde::{Deserialize, Serialize};

/// The role of a structured turn sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (prompt prefix / suffix)
    System,
    /// A human participant
    User,
    /// The bot itself
    Assistant,
}

impl Role {
    /// Lowercase wire name, also used inside speaker keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message in a structured chat request.
///
/// This is the unit handed back to the caller in place of the flattened
/// prompt blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredTurn {
    /// Who speaks this turn
    pub role: Role,

    /// The text content
    pub text: String,
}

impl StructuredTurn {
    /// Create a system turn.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// The two system-authored segments surrounding the history region of a
/// flattened prompt.
///
/// Invariant: at least one of the two is non-empty whenever a split is
/// reported successful. Produced once per prompt and consumed immediately,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptSplit {
    /// Lines before the history region, joined and trimmed
    pub system_prefix: String,

    /// Lines after the history region, joined and trimmed
    pub system_suffix: String,
}

impl PromptSplit {
    /// Whether at least one segment carries text.
    pub fn has_content(&self) -> bool {
        !self.system_prefix.is_empty() || !self.system_suffix.is_empty()
    }
}

/// A raw history record as supplied by the host's message store.
///
/// Read-only to this crate: records are rendered into lines, never mutated
/// or written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Platform the message arrived on (e.g. "qq", "telegram")
    pub platform: String,

    /// Sender id on that platform
    pub user_id: String,

    /// Sender nickname
    #[serde(default)]
    pub nickname: String,

    /// Per-chat card / display name, when the platform has one
    #[serde(default)]
    pub card_name: String,

    /// Display rendering of the content (preferred)
    #[serde(default)]
    pub display_text: String,

    /// Plain-text fallback rendering
    #[serde(default)]
    pub plain_text: String,

    /// Unix seconds. Non-positive values are treated as "now".
    #[serde(default)]
    pub timestamp: f64,

    /// Whether the sender is the bot identity itself
    #[serde(default)]
    pub from_bot: bool,
}

/// One maximal run of consecutive history messages sharing a speaker key.
///
/// Invariants: `lines` is never empty; blocks are ordered by original
/// message order; when merging is enabled, adjacent blocks never share a
/// `speaker_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedHistoryBlock {
    /// `Assistant` for the bot's own messages, `User` for everyone else
    pub role: Role,

    /// `platform:user_id:role` — merge grouping only, never displayed
    pub speaker_key: String,

    /// Rendered `"<time>, <speaker>: <content>"` lines, one per message
    pub lines: Vec<String>,
}

impl MergedHistoryBlock {
    /// Collapse the block into a single turn, one source message per line.
    pub fn into_turn(self) -> StructuredTurn {
        StructuredTurn {
            role: self.role,
            text: self.lines.join("\n"),
        }
    }
}

/// Which kind of chat a prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    /// Multi-party group chat
    Group,
    /// One-on-one conversation
    Private,
}

/// Call context for one interception: which conversation the flattened
/// prompt was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    /// Host-side conversation/stream identifier. Empty means the host could
    /// not tell us, and assembly declines.
    pub stream_id: String,

    /// Group or private chat
    pub kind: ChatKind,
}

impl ChatContext {
    /// Context for a group chat stream.
    pub fn group(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            kind: ChatKind::Group,
        }
    }

    /// Context for a private chat stream.
    pub fn private(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            kind: ChatKind::Private,
        }
    }
}
