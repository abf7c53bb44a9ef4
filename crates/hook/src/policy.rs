//! Interception policy — which chats and prompt styles get intercepted.

use turnguard_config::GuardConfig;
use turnguard_core::ChatKind;

/// Phrases identifying a rewrite-style prompt, matched by substring.
const REWRITE_MARKERS: [&str; 3] = [
    "now please rewrite",
    "the rewritten reply",
    "you now want to add to what you just said",
];

/// Whether the prompt asks to rewrite an earlier reply rather than
/// produce a fresh one.
pub fn is_rewrite_prompt(prompt: &str) -> bool {
    REWRITE_MARKERS.iter().any(|marker| prompt.contains(marker))
}

/// Whether this chat kind is intercepted under the current configuration.
pub fn applies_to(kind: ChatKind, config: &GuardConfig) -> bool {
    match kind {
        ChatKind::Group => config.runtime.apply_group,
        ChatKind::Private => config.runtime.apply_private,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rewrite_prompts() {
        assert!(is_rewrite_prompt("now please rewrite this reply to be shorter"));
        assert!(is_rewrite_prompt("the rewritten reply should keep the meaning"));
        assert!(is_rewrite_prompt(
            "you now want to add to what you just said a moment ago"
        ));
        assert!(!is_rewrite_prompt("current time: 14:00\nnow answer"));
    }

    #[test]
    fn chat_kind_gating_follows_config() {
        let mut config = GuardConfig::default();
        assert!(applies_to(ChatKind::Group, &config));
        assert!(applies_to(ChatKind::Private, &config));

        config.runtime.apply_private = false;
        assert!(applies_to(ChatKind::Group, &config));
        assert!(!applies_to(ChatKind::Private, &config));

        config.runtime.apply_group = false;
        assert!(!applies_to(ChatKind::Group, &config));
    }
}
