//! # Turnguard Core
//!
//! Domain types, collaborator traits, and error definitions for turning
//! flattened LLM prompts back into structured chat turns.
//!
//! ## Design Philosophy
//!
//! The assembly algorithms only ever touch host systems through the traits
//! defined here — the history store, the identity directory, the reference
//! normalizer, and the time renderer. Each seam ships with a small
//! in-memory reference implementation so the whole pipeline runs standalone
//! in tests and in hosts that don't bring their own backends.

pub mod directory;
pub mod error;
pub mod message;
pub mod normalize;
pub mod store;
pub mod timefmt;

// Re-export key types at crate root for ergonomics
pub use directory::{Directory, StaticRoster};
pub use error::{AssembleError, DirectoryError, HookError, SkipReason, StoreError};
pub use message::{
    ChatContext, ChatKind, HistoryMessage, MergedHistoryBlock, PromptSplit, Role, StructuredTurn,
};
pub use normalize::{MentionNormalizer, Normalizer};
pub use store::{HistoryStore, MemoryHistoryStore, Visibility};
pub use timefmt::{LocalClock, TimeMode, TimeRenderer, unix_now};
