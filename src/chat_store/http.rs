use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use super::types::{ChatListEntry, FetchedChat};
use super::ChatStore;
use crate::error::Error;
use crate::prompt_manager::types::OwnerRef;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpChatStoreConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// `ChatStore` over the host server's REST endpoints.
pub struct HttpChatStore {
    client: reqwest::Client,
    config: HttpChatStoreConfig,
}

impl HttpChatStore {
    pub fn new(config: HttpChatStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response, Error> {
        let mut request = self.client.post(self.endpoint(path)).json(&body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }
}

pub(crate) fn list_request(owner: &OwnerRef) -> (&'static str, Value) {
    match owner {
        OwnerRef::Character { avatar, .. } => {
            ("api/characters/chats", json!({ "avatar_url": avatar }))
        }
        OwnerRef::Group { id } => ("api/chats/group/all", json!({ "id": id })),
    }
}

pub(crate) fn get_request(owner: &OwnerRef, chat_id: &str) -> (&'static str, Value) {
    match owner {
        OwnerRef::Character { avatar, .. } => (
            "api/chats/get",
            json!({ "avatar_url": avatar, "file_name": chat_id }),
        ),
        OwnerRef::Group { id } => (
            "api/chats/group/get",
            json!({ "id": id, "chat_id": chat_id }),
        ),
    }
}

pub(crate) fn save_request(owner: &OwnerRef, chat_id: &str, payload: Vec<Value>) -> (&'static str, Value) {
    match owner {
        OwnerRef::Character { avatar, .. } => (
            "api/chats/save",
            json!({ "avatar_url": avatar, "file_name": chat_id, "chat": payload }),
        ),
        OwnerRef::Group { id } => (
            "api/chats/group/save",
            json!({ "id": id, "chat_id": chat_id, "chat": payload }),
        ),
    }
}

/// Split a raw record payload into its metadata envelope and messages. The
/// envelope's `chat_metadata` field carries the full metadata object; a chat
/// saved before any metadata existed may lack it.
pub(crate) fn parse_chat_payload(payload: Vec<Value>) -> Result<Option<FetchedChat>, Error> {
    let Some((envelope, messages)) = payload.split_first() else {
        return Ok(None);
    };
    let metadata = match envelope.get("chat_metadata") {
        Some(value) => serde_json::from_value(value.clone())?,
        None => Default::default(),
    };
    Ok(Some(FetchedChat {
        metadata,
        messages: messages.to_vec(),
    }))
}

#[async_trait::async_trait]
impl ChatStore for HttpChatStore {
    async fn list_chats(&self, owner: &OwnerRef) -> Result<Vec<ChatListEntry>, Error> {
        let (path, body) = list_request(owner);
        let response = self.post(path, body).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let entries = response.error_for_status()?.json().await?;
        Ok(entries)
    }

    async fn get_chat(
        &self,
        owner: &OwnerRef,
        chat_id: &str,
    ) -> Result<Option<FetchedChat>, Error> {
        let (path, body) = get_request(owner, chat_id);
        let response = self.post(path, body).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let payload: Vec<Value> = response.error_for_status()?.json().await?;
        parse_chat_payload(payload)
    }

    async fn save_chat(
        &self,
        owner: &OwnerRef,
        chat_id: &str,
        payload: Vec<Value>,
    ) -> Result<(), Error> {
        let (path, body) = save_request(owner, chat_id, payload);
        let response = self.post(path, body).await?;
        response.error_for_status()?;
        Ok(())
    }
}
