//! Error types for the Turnguard domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Soft skip conditions
//! (the assembler declining to produce turns) are modeled separately from
//! real collaborator failures, because callers treat them differently:
//! a skip always falls back to the flattened prompt, a store failure only
//! falls back when configured to.

use thiserror::Error;

/// Conditions under which assembly declines to produce structured turns.
///
/// All of these are soft: the caller keeps the original flattened-prompt
/// request path. None of them is fatal to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no prefix/suffix boundary found in prompt")]
    NoBoundary,

    #[error("call context carries no stream identifier")]
    MissingStreamId,

    #[error("history store returned no messages")]
    EmptyHistory,

    #[error("no history blocks survived normalization")]
    EmptyBlocks,

    #[error("fewer than two turns assembled")]
    TooFewTurns,
}

/// History store failures — the one mandatory collaborator call.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("history query failed: {0}")]
    QueryFailed(String),
}

/// Best-effort display-name lookup failures.
///
/// Callers degrade to the next naming fallback instead of propagating.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("directory lookup failed: {0}")]
    LookupFailed(String),
}

/// Outcome of a failed assembly attempt.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("assembly skipped: {0}")]
    Skipped(#[from] SkipReason),

    #[error("history store error: {0}")]
    Store(#[from] StoreError),
}

impl AssembleError {
    /// The skip reason, when this is a soft decline rather than a failure.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            AssembleError::Skipped(reason) => Some(*reason),
            AssembleError::Store(_) => None,
        }
    }
}

/// Errors surfaced through the interception hook.
///
/// Only produced when fallback-to-original is disabled; with fallback on,
/// every failure turns into a passthrough decision instead.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("structured build failed: {0}")]
    BuildFailed(#[from] AssembleError),
}
