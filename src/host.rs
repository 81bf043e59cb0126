//! Seams into the embedding host application. The host owns the live chat,
//! its metadata persistence, the prompt-assembly pipeline, and the toast UI;
//! this crate only ever reaches them through `HostContext`.

use serde_json::{Map, Value};

use crate::prompt_manager::types::{ChatMetadata, OwnerRef};

/// Where an injected fragment lands in the assembled prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPosition {
    RelativeToPrompt,
    InChatHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionRole {
    System,
    User,
    Assistant,
}

/// Severity for user-facing transient notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Fired by the host whenever the active chat switches.
#[derive(Debug, Clone)]
pub struct ChatChanged {
    pub chat_id: Option<String>,
}

pub trait HostContext: Send + Sync {
    /// Normalized id of the chat currently loaded in the host's main view,
    /// or `None` when no chat is loaded.
    fn active_chat_id(&self) -> Option<String>;

    /// Character or group the active chat belongs to.
    fn active_owner(&self) -> Option<OwnerRef>;

    fn active_display_name(&self) -> Option<String>;

    /// Live metadata of the active chat. This is the host's in-memory copy,
    /// not anything cached by this crate.
    fn active_metadata(&self) -> Option<ChatMetadata>;

    /// Message sequence of the active chat, passed through opaquely.
    fn active_messages(&self) -> Vec<Value>;

    /// Merge `partial` into the active chat's in-memory metadata. The host
    /// schedules its own persistence.
    fn update_active_metadata(&self, partial: Map<String, Value>) -> Result<(), String>;

    /// Sole write path to the injection target. Repeated calls with the same
    /// `key` overwrite; an empty `text` retracts the fragment.
    fn set_prompt_fragment(
        &self,
        key: &str,
        text: &str,
        position: InjectionPosition,
        depth: u32,
        scannable: bool,
        role: InjectionRole,
    ) -> Result<(), String>;

    /// Transient user-facing notification (toast).
    fn notify(&self, level: NoticeLevel, message: &str);
}
