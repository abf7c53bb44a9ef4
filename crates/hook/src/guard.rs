//! The bundled generation hook: config gates first, then the assembly
//! pipeline, with every failure mode mapped to an explicit decision.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use turnguard_assembly::Assembler;
use turnguard_config::GuardConfig;
use turnguard_core::{
    ChatContext, Directory, HistoryStore, HookError, Normalizer, StructuredTurn, TimeRenderer,
};

use crate::policy;
use crate::registry::{GenerationHook, HookDecision, PassthroughReason};

/// Rebuilds flattened prompts into structured turns, or explicitly
/// declines. One instance serves all streams.
pub struct MessageGuard {
    config: GuardConfig,
    assembler: Assembler,
}

impl MessageGuard {
    /// Wire a guard from its collaborator seams and a loaded config.
    ///
    /// The config is owned and read-only from here on; reloading means
    /// constructing a new guard and re-registering it.
    pub fn new(
        config: GuardConfig,
        store: Arc<dyn HistoryStore>,
        directory: Arc<dyn Directory>,
        normalizer: Arc<dyn Normalizer>,
        renderer: Arc<dyn TimeRenderer>,
    ) -> Self {
        let assembler = Assembler::new(store, directory, normalizer, renderer)
            .with_window_override(config.runtime.history_window_override as usize)
            .with_merge(config.runtime.merge_consecutive);
        Self { config, assembler }
    }

    /// Set the window used when the config carries no override.
    pub fn with_host_window(mut self, window: usize) -> Self {
        self.assembler = self.assembler.with_history_window(window);
        self
    }

    fn log_passthrough(&self, ctx: &ChatContext, reason: &PassthroughReason) {
        if self.config.log.verbose {
            info!(stream = %ctx.stream_id, ?reason, "Passing request through unchanged");
        } else {
            debug!(stream = %ctx.stream_id, ?reason, "Passing request through unchanged");
        }
    }

    fn pass(&self, ctx: &ChatContext, reason: PassthroughReason) -> HookDecision {
        self.log_passthrough(ctx, &reason);
        HookDecision::Passthrough(reason)
    }
}

#[async_trait]
impl GenerationHook for MessageGuard {
    fn name(&self) -> &str {
        "message_guard"
    }

    async fn intercept(
        &self,
        ctx: &ChatContext,
        prompt: &str,
    ) -> Result<HookDecision, HookError> {
        if !self.config.enabled {
            return Ok(self.pass(ctx, PassthroughReason::Disabled));
        }

        if !policy::applies_to(ctx.kind, &self.config) {
            return Ok(self.pass(ctx, PassthroughReason::ChatKindExcluded));
        }

        if policy::is_rewrite_prompt(prompt) && !self.config.runtime.apply_rewrite {
            return Ok(self.pass(ctx, PassthroughReason::RewriteExcluded));
        }

        match self.assembler.assemble(ctx, prompt).await {
            Ok(turns) => {
                let turns: Vec<StructuredTurn> = turns
                    .into_iter()
                    .map(|t| StructuredTurn {
                        role: t.role,
                        text: t.text.trim().to_string(),
                    })
                    .filter(|t| !t.text.is_empty())
                    .collect();
                if self.config.log.verbose {
                    info!(stream = %ctx.stream_id, turns = turns.len(), "Structured request assembled");
                } else {
                    debug!(stream = %ctx.stream_id, turns = turns.len(), "Structured request assembled");
                }
                Ok(HookDecision::Structured(turns))
            }
            // Soft skips always pass through; only store failures consult
            // the fallback switch.
            Err(e) => match e.skip_reason() {
                Some(reason) => Ok(self.pass(ctx, PassthroughReason::Skipped(reason))),
                None => {
                    warn!(stream = %ctx.stream_id, error = %e, "Structured build failed");
                    if self.config.runtime.fallback_to_original {
                        Ok(self.pass(ctx, PassthroughReason::StoreFailed(e.to_string())))
                    } else {
                        Err(e.into())
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnguard_core::{
        HistoryMessage, MemoryHistoryStore, MentionNormalizer, Role, SkipReason, StaticRoster,
        StoreError, TimeMode, Visibility,
    };

    struct FixedFormat;

    impl TimeRenderer for FixedFormat {
        fn render(&self, timestamp: f64, _mode: TimeMode) -> String {
            format!("T{}", timestamp as i64)
        }
    }

    struct FailingStore;

    #[async_trait]
    impl HistoryStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn messages_before(
            &self,
            _stream_id: &str,
            _before: f64,
            _limit: usize,
            _visibility: Visibility,
        ) -> Result<Vec<HistoryMessage>, StoreError> {
            Err(StoreError::QueryFailed("backend offline".into()))
        }
    }

    fn msg(user_id: &str, text: &str, timestamp: f64) -> HistoryMessage {
        HistoryMessage {
            platform: "qq".into(),
            user_id: user_id.into(),
            nickname: user_id.into(),
            card_name: String::new(),
            display_text: text.into(),
            plain_text: text.into(),
            timestamp,
            from_bot: false,
        }
    }

    fn guard_with(config: GuardConfig, store: Arc<dyn HistoryStore>) -> MessageGuard {
        MessageGuard::new(
            config,
            store,
            Arc::new(StaticRoster::new("bot-1", "Mika").with_name("qq", "u1", "Alice")),
            Arc::new(MentionNormalizer::new()),
            Arc::new(FixedFormat),
        )
    }

    const PROMPT: &str = "current time: 14:00\n14:01, a: hi\nnow reply briefly";

    #[tokio::test]
    async fn disabled_guard_passes_through() {
        let mut config = GuardConfig::default();
        config.enabled = false;
        let guard = guard_with(config, Arc::new(MemoryHistoryStore::new()));

        let decision = guard
            .intercept(&ChatContext::group("s1"), PROMPT)
            .await
            .unwrap();
        assert_eq!(
            decision,
            HookDecision::Passthrough(PassthroughReason::Disabled)
        );
    }

    #[tokio::test]
    async fn excluded_chat_kind_passes_through() {
        let mut config = GuardConfig::default();
        config.runtime.apply_private = false;
        let store = MemoryHistoryStore::new();
        store.insert("s1", msg("u1", "hi", 1.0)).await;
        let guard = guard_with(config, Arc::new(store));

        let decision = guard
            .intercept(&ChatContext::private("s1"), PROMPT)
            .await
            .unwrap();
        assert_eq!(
            decision,
            HookDecision::Passthrough(PassthroughReason::ChatKindExcluded)
        );
    }

    #[tokio::test]
    async fn rewrite_prompts_respect_the_gate() {
        let rewrite_prompt =
            "current time: 14:00\n14:01, a: hi\nnow please rewrite your earlier reply";

        let mut config = GuardConfig::default();
        config.runtime.apply_rewrite = false;
        let store = MemoryHistoryStore::new();
        store.insert("s1", msg("u1", "hi", 1.0)).await;
        let guard = guard_with(config, Arc::new(store));

        let decision = guard
            .intercept(&ChatContext::group("s1"), rewrite_prompt)
            .await
            .unwrap();
        assert_eq!(
            decision,
            HookDecision::Passthrough(PassthroughReason::RewriteExcluded)
        );

        // Gate open: the rewrite prompt is intercepted like any other.
        let store = MemoryHistoryStore::new();
        store.insert("s1", msg("u1", "hi", 1.0)).await;
        let guard = guard_with(GuardConfig::default(), Arc::new(store));
        let decision = guard
            .intercept(&ChatContext::group("s1"), rewrite_prompt)
            .await
            .unwrap();
        assert!(matches!(decision, HookDecision::Structured(_)));
    }

    #[tokio::test]
    async fn soft_skip_passes_through_even_without_fallback() {
        let mut config = GuardConfig::default();
        config.runtime.fallback_to_original = false;
        let guard = guard_with(config, Arc::new(MemoryHistoryStore::new()));

        let decision = guard
            .intercept(&ChatContext::group("s1"), PROMPT)
            .await
            .unwrap();
        assert_eq!(
            decision,
            HookDecision::Passthrough(PassthroughReason::Skipped(SkipReason::EmptyHistory))
        );
    }

    #[tokio::test]
    async fn store_failure_falls_back_when_configured() {
        let guard = guard_with(GuardConfig::default(), Arc::new(FailingStore));

        let decision = guard
            .intercept(&ChatContext::group("s1"), PROMPT)
            .await
            .unwrap();
        match decision {
            HookDecision::Passthrough(PassthroughReason::StoreFailed(detail)) => {
                assert!(detail.contains("backend offline"));
            }
            other => panic!("expected StoreFailed passthrough, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn store_failure_errors_when_fallback_is_off() {
        let mut config = GuardConfig::default();
        config.runtime.fallback_to_original = false;
        let guard = guard_with(config, Arc::new(FailingStore));

        let err = guard
            .intercept(&ChatContext::group("s1"), PROMPT)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("backend offline"));
    }

    #[tokio::test]
    async fn successful_interception_returns_structured_turns() {
        let store = MemoryHistoryStore::new();
        store.insert("s1", msg("u1", "hi", 1.0)).await;
        let guard = guard_with(GuardConfig::default(), Arc::new(store));

        let decision = guard
            .intercept(&ChatContext::group("s1"), PROMPT)
            .await
            .unwrap();
        let HookDecision::Structured(turns) = decision else {
            panic!("expected a structured decision");
        };
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1], StructuredTurn::user("T1, Alice: hi"));
        assert_eq!(turns[2], StructuredTurn::system("now reply briefly"));
    }

    #[tokio::test]
    async fn config_override_shrinks_the_window() {
        let store = MemoryHistoryStore::new();
        for i in 0..4 {
            store
                .insert("s1", msg("u1", &format!("m{i}"), (i + 1) as f64))
                .await;
        }
        let mut config = GuardConfig::default();
        config.runtime.history_window_override = 2;
        let guard = guard_with(config, Arc::new(store));

        let decision = guard
            .intercept(&ChatContext::group("s1"), PROMPT)
            .await
            .unwrap();
        let HookDecision::Structured(turns) = decision else {
            panic!("expected a structured decision");
        };
        assert_eq!(turns[1].text, "T3, u1: m2\nT4, u1: m3");
    }
}
