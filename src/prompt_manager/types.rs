use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key under which this crate stores its sub-record inside a chat's
/// metadata. Every other key belongs to the host and is passed through.
pub const PROMPT_KEY: &str = "custom_prompt";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomPromptData {
    #[serde(default)]
    pub prompt: String,
}

/// A chat's metadata: one strongly-typed reserved field plus an open
/// side-channel for whatever else the host keeps in there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<CustomPromptData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMetadata {
    pub fn prompt(&self) -> &str {
        self.custom_prompt
            .as_ref()
            .map(|p| p.prompt.as_str())
            .unwrap_or("")
    }

    pub fn set_prompt(&mut self, text: String) {
        match self.custom_prompt.as_mut() {
            Some(data) => data.prompt = text,
            None => self.custom_prompt = Some(CustomPromptData { prompt: text }),
        }
    }
}

/// Character or group a set of chats belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OwnerRef {
    Character { id: String, avatar: String },
    Group { id: String },
}

impl OwnerRef {
    pub fn is_group(&self) -> bool {
        matches!(self, OwnerRef::Group { .. })
    }
}

/// One cached chat: metadata plus the full message sequence, which is
/// required to re-save the record without losing messages.
#[derive(Debug, Clone)]
pub struct ChatRecord {
    pub id: String,
    pub display_name: String,
    pub metadata: ChatMetadata,
    pub messages: Vec<Value>,
    pub owner: OwnerRef,
}

impl ChatRecord {
    /// Whether the record carries a non-empty stored prompt. Trimming here is
    /// for the emptiness check only; the stored text itself stays untouched.
    pub fn has_prompt(&self) -> bool {
        !self.metadata.prompt().trim().is_empty()
    }
}
