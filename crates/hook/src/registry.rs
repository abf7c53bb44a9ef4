//! Hook registry — the explicit install/remove seam for prompt interception.
//!
//! Hosts register hooks at startup and look them up per outgoing request;
//! unregistering restores the original call path without a restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use turnguard_core::{ChatContext, HookError, SkipReason, StructuredTurn};

/// Outcome of one interception.
#[derive(Debug, Clone, PartialEq)]
pub enum HookDecision {
    /// Replace the flattened prompt with these turns
    Structured(Vec<StructuredTurn>),
    /// Keep the original request untouched
    Passthrough(PassthroughReason),
}

/// Why an interception left the request untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum PassthroughReason {
    /// The guard is switched off by configuration
    Disabled,
    /// This chat kind is excluded by configuration
    ChatKindExcluded,
    /// Rewrite-style prompt with rewrite interception off
    RewriteExcluded,
    /// Assembly declined softly
    Skipped(SkipReason),
    /// The history store failed and fallback is configured
    StoreFailed(String),
}

/// A single prompt interceptor.
///
/// `intercept` must never panic on malformed prompts; anything it cannot
/// handle becomes a passthrough decision.
#[async_trait]
pub trait GenerationHook: Send + Sync {
    /// Stable name used for registration and logs.
    fn name(&self) -> &str;

    /// Decide what happens to one outgoing prompt.
    async fn intercept(&self, ctx: &ChatContext, prompt: &str) -> Result<HookDecision, HookError>;
}

/// Central registry holding installed generation hooks.
pub struct HookRegistry {
    hooks: HashMap<String, Arc<dyn GenerationHook>>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    /// Install a hook under its own name.
    pub fn register(&mut self, hook: Arc<dyn GenerationHook>) {
        let name = hook.name().to_string();
        info!(hook = %name, "Registered generation hook");
        self.hooks.insert(name, hook);
    }

    /// Remove a hook by name, returning it when it was installed.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn GenerationHook>> {
        let removed = self.hooks.remove(name);
        match removed {
            Some(_) => info!(hook = %name, "Unregistered generation hook"),
            None => warn!(hook = %name, "No such hook to unregister"),
        }
        removed
    }

    /// Get a hook by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn GenerationHook>> {
        self.hooks.get(name)
    }

    /// List all installed hook names.
    pub fn list(&self) -> Vec<String> {
        self.hooks.keys().cloned().collect()
    }

    /// Number of installed hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockHook {
        name: String,
        calls: AtomicUsize,
    }

    impl MockHook {
        fn new(name: &str) -> Self {
            Self {
                name: name.into(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationHook for MockHook {
        fn name(&self) -> &str {
            &self.name
        }

        async fn intercept(
            &self,
            _ctx: &ChatContext,
            _prompt: &str,
        ) -> Result<HookDecision, HookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HookDecision::Passthrough(PassthroughReason::Disabled))
        }
    }

    #[test]
    fn empty_registry() {
        let reg = HookRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn register_and_list() {
        let mut reg = HookRegistry::new();
        reg.register(Arc::new(MockHook::new("guard_a")));
        reg.register(Arc::new(MockHook::new("guard_b")));

        assert_eq!(reg.len(), 2);
        assert!(reg.list().contains(&"guard_a".to_string()));
        assert!(reg.list().contains(&"guard_b".to_string()));
    }

    #[test]
    fn get_hook() {
        let mut reg = HookRegistry::new();
        reg.register(Arc::new(MockHook::new("guard")));

        assert!(reg.get("guard").is_some());
        assert!(reg.get("other").is_none());
    }

    #[test]
    fn unregister_removes_the_hook() {
        let mut reg = HookRegistry::new();
        reg.register(Arc::new(MockHook::new("guard")));

        assert!(reg.unregister("guard").is_some());
        assert!(reg.is_empty());
        assert!(reg.unregister("guard").is_none());
    }

    #[tokio::test]
    async fn intercept_through_registry_entry() {
        let mut reg = HookRegistry::new();
        let hook = Arc::new(MockHook::new("guard"));
        reg.register(hook.clone());

        let installed = reg.get("guard").unwrap();
        let decision = installed
            .intercept(&ChatContext::group("s1"), "prompt")
            .await
            .unwrap();
        assert_eq!(
            decision,
            HookDecision::Passthrough(PassthroughReason::Disabled)
        );
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
    }
}
