//! Keeps the host's injection target in sync with the active chat. Runs on
//! every chat switch and after every save of the active chat, so nothing in
//! here may panic or return an error to the host's event hooks.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::host::{ChatChanged, HostContext, InjectionPosition, InjectionRole};

/// Fixed key for the one fragment this crate owns. Repeated writes under this
/// key overwrite rather than accumulate.
pub const INJECTION_KEY: &str = "custom_prompt";

/// Maximum depth pins the fragment at the oldest position in the history.
pub const INJECTION_DEPTH: u32 = u32::MAX;

/// Push the active chat's stored prompt into the injection target, or clear
/// the slot when the chat has none. Reads the host's live metadata, never the
/// cache, so a just-saved value or a freshly switched chat is always
/// reflected. No-op when no chat is loaded.
pub fn apply_or_clear_active_prompt(host: &dyn HostContext) {
    if host.active_chat_id().is_none() {
        return;
    }
    let text = host
        .active_metadata()
        .map(|meta| meta.prompt().to_string())
        .unwrap_or_default();
    // Trim decides set-vs-clear only; the injected value stays untrimmed.
    let value = if text.trim().is_empty() {
        String::new()
    } else {
        text
    };
    if let Err(e) = host.set_prompt_fragment(
        INJECTION_KEY,
        &value,
        InjectionPosition::InChatHistory,
        INJECTION_DEPTH,
        false,
        InjectionRole::System,
    ) {
        tracing::warn!("failed to update injected chat prompt: {}", e);
    }
}

/// Apply once at startup, then re-apply on every chat-change event for the
/// process lifetime. Returns when the host drops its event sender.
pub async fn run_event_loop(
    host: Arc<dyn HostContext>,
    mut events: broadcast::Receiver<ChatChanged>,
) {
    apply_or_clear_active_prompt(host.as_ref());
    loop {
        match events.recv().await {
            Ok(_) => apply_or_clear_active_prompt(host.as_ref()),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Only the latest state matters; re-apply and move on.
                tracing::debug!("chat-change events lagged by {}", skipped);
                apply_or_clear_active_prompt(host.as_ref());
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
