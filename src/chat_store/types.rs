use serde::Deserialize;
use serde_json::Value;

use crate::prompt_manager::types::ChatMetadata;

/// One entry from the server's chat listing. `file_name` is raw, storage
/// suffix included.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatListEntry {
    pub file_name: String,
}

/// A chat record as fetched from the server, already split into its metadata
/// envelope and opaque message sequence.
#[derive(Debug, Clone)]
pub struct FetchedChat {
    pub metadata: ChatMetadata,
    pub messages: Vec<Value>,
}
