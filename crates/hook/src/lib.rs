//! Turnguard Hook - the host-facing interception seam.
//!
//! - **registry**: the `GenerationHook` trait, decision types, and the
//!   install/remove registry that replaces in-place patching
//! - **policy**: which chat kinds and prompt styles get intercepted
//! - **guard**: `MessageGuard`, the bundled hook wiring config, policy,
//!   and the assembly pipeline together
//!
//! A host calls `registry.get("message_guard")` on each outgoing request
//! and acts on the returned [`HookDecision`]: send the structured turns,
//! or keep its original flattened request.

pub mod guard;
pub mod policy;
pub mod registry;

pub use guard::MessageGuard;
pub use registry::{GenerationHook, HookDecision, HookRegistry, PassthroughReason};
