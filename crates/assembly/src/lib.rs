//! Turnguard Assembly - boundary recovery and history re-rendering.
//!
//! This crate turns one flattened prompt back into structured turns:
//!
//! - **timestamp**: classifies lines as history-like and infers the
//!   prompt's timestamp convention
//! - **splitter**: locates the prefix / history / suffix boundaries,
//!   trying anchor markers first and a timeline scan last
//! - **blocks**: renders stored messages into merged speaker blocks
//! - **assembler**: orchestrates the pipeline per intercepted prompt
//!
//! Everything here is deterministic given the prompt, the stored
//! messages, and the clock seam; nothing talks to the network.

pub mod assembler;
pub mod blocks;
pub mod splitter;
pub mod timestamp;

pub use assembler::{Assembler, DEFAULT_HISTORY_WINDOW};
pub use blocks::HistoryBlockBuilder;
pub use splitter::split_prompt;
pub use timestamp::TimestampClassifier;
