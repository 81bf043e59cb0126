//! Client for the host server's chat storage endpoints. Pure
//! request/response; all caching lives in `prompt_manager`.

pub mod http;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;
use crate::prompt_manager::types::OwnerRef;
use self::types::{ChatListEntry, FetchedChat};

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// All chat files stored for the given character or group.
    async fn list_chats(&self, owner: &OwnerRef) -> Result<Vec<ChatListEntry>, Error>;

    /// One chat's full record, or `None` if the server has no such chat.
    async fn get_chat(&self, owner: &OwnerRef, chat_id: &str)
        -> Result<Option<FetchedChat>, Error>;

    /// Persist a full record payload wholesale. The payload's first element
    /// is the metadata envelope, the rest are the messages in order.
    async fn save_chat(
        &self,
        owner: &OwnerRef,
        chat_id: &str,
        payload: Vec<Value>,
    ) -> Result<(), Error>;
}
