//! The full reconstruction pipeline, one call per intercepted prompt.
//!
//! Order of operations:
//! 1. Split the flattened prompt into prefix / suffix around its history
//!    region.
//! 2. Query the history store for the recent window of this stream.
//! 3. Render messages into merged speaker blocks, matching the prompt's
//!    timestamp convention.
//! 4. Compose `[prefix?] + blocks + [suffix?]` into role-tagged turns.
//!
//! Any step that cannot proceed declines with a [`SkipReason`]; only the
//! store query can fail hard.

use std::sync::Arc;

use tracing::debug;

use turnguard_core::{
    AssembleError, ChatContext, Directory, HistoryStore, MergedHistoryBlock, Normalizer,
    PromptSplit, SkipReason, StructuredTurn, TimeRenderer, Visibility, unix_now,
};

use crate::blocks::HistoryBlockBuilder;
use crate::splitter::split_prompt;
use crate::timestamp::TimestampClassifier;

/// History window used when the host supplies no override.
pub const DEFAULT_HISTORY_WINDOW: usize = 30;

/// Rebuilds structured turns from a flattened prompt and stored history.
///
/// One instance serves all streams; per-call state lives on the stack.
pub struct Assembler {
    store: Arc<dyn HistoryStore>,
    directory: Arc<dyn Directory>,
    normalizer: Arc<dyn Normalizer>,
    renderer: Arc<dyn TimeRenderer>,
    classifier: TimestampClassifier,
    history_window: usize,
    window_override: usize,
    merge_consecutive: bool,
}

impl Assembler {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        directory: Arc<dyn Directory>,
        normalizer: Arc<dyn Normalizer>,
        renderer: Arc<dyn TimeRenderer>,
    ) -> Self {
        Self {
            store,
            directory,
            normalizer,
            renderer,
            classifier: TimestampClassifier::new(),
            history_window: DEFAULT_HISTORY_WINDOW,
            window_override: 0,
            merge_consecutive: true,
        }
    }

    /// Change the window used when no override is set.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Force a window size. Zero means "use the default".
    pub fn with_window_override(mut self, window: usize) -> Self {
        self.window_override = window;
        self
    }

    /// Enable or disable consecutive-speaker merging.
    pub fn with_merge(mut self, merge_consecutive: bool) -> Self {
        self.merge_consecutive = merge_consecutive;
        self
    }

    /// Reconstruct structured turns for one flattened prompt.
    pub async fn assemble(
        &self,
        ctx: &ChatContext,
        prompt: &str,
    ) -> Result<Vec<StructuredTurn>, AssembleError> {
        let split = split_prompt(prompt, &self.classifier).ok_or(SkipReason::NoBoundary)?;

        if ctx.stream_id.is_empty() {
            return Err(SkipReason::MissingStreamId.into());
        }

        let window = if self.window_override > 0 {
            self.window_override
        } else {
            self.history_window
        };
        let now = unix_now();
        let messages = self
            .store
            .messages_before(&ctx.stream_id, now, window, Visibility::Base)
            .await?;
        if messages.is_empty() {
            return Err(SkipReason::EmptyHistory.into());
        }

        let mode = self.classifier.infer_time_mode(prompt);
        let blocks = HistoryBlockBuilder::new(
            self.directory.as_ref(),
            self.normalizer.as_ref(),
            self.renderer.as_ref(),
            mode,
        )
        .with_merge(self.merge_consecutive)
        .build(&messages, now);
        if blocks.is_empty() {
            return Err(SkipReason::EmptyBlocks.into());
        }

        let turns = compose_turns(split, blocks);
        if turns.len() < 2 {
            return Err(SkipReason::TooFewTurns.into());
        }

        debug!(
            stream = %ctx.stream_id,
            turns = turns.len(),
            mode = ?mode,
            window,
            "Assembled structured turns"
        );
        Ok(turns)
    }
}

/// `[prefix?] + history blocks + [suffix?]`, empty affixes omitted.
fn compose_turns(split: PromptSplit, blocks: Vec<MergedHistoryBlock>) -> Vec<StructuredTurn> {
    let mut turns = Vec::with_capacity(blocks.len() + 2);
    if !split.system_prefix.is_empty() {
        turns.push(StructuredTurn::system(split.system_prefix));
    }
    turns.extend(blocks.into_iter().map(MergedHistoryBlock::into_turn));
    if !split.system_suffix.is_empty() {
        turns.push(StructuredTurn::system(split.system_suffix));
    }
    turns
}
