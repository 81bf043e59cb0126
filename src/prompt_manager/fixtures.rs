//! In-memory stand-ins for the host and its chat store, shared by the
//! cache, injection, and controller tests.

use std::collections::HashSet;
use std::sync::Mutex;

use serde_json::{json, Map, Value};

use crate::chat_store::types::{ChatListEntry, FetchedChat};
use crate::chat_store::ChatStore;
use crate::error::Error;
use crate::host::{HostContext, InjectionPosition, InjectionRole, NoticeLevel};

use super::types::{ChatMetadata, ChatRecord, OwnerRef};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn record(id: &str, prompt: &str, owner: OwnerRef) -> ChatRecord {
    let mut metadata = ChatMetadata::default();
    if !prompt.is_empty() {
        metadata.set_prompt(prompt.to_string());
    }
    ChatRecord {
        id: id.to_string(),
        display_name: id.to_string(),
        metadata,
        messages: vec![json!({ "mes": format!("message in {}", id) })],
        owner,
    }
}

#[derive(Default)]
pub struct MockChatStore {
    chats: Mutex<Vec<(String, FetchedChat)>>,
    failing: Mutex<HashSet<String>>,
    fetched: Mutex<Vec<String>>,
    saved: Mutex<Vec<(String, Vec<Value>)>>,
    fail_saves: Mutex<bool>,
    fail_listing: Mutex<bool>,
}

impl MockChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chat(&self, id: &str, prompt: &str) {
        self.add_chat_with_messages(id, prompt, vec![json!({ "mes": format!("hi from {}", id) })]);
    }

    pub fn add_chat_with_messages(&self, id: &str, prompt: &str, messages: Vec<Value>) {
        let mut metadata = ChatMetadata::default();
        if !prompt.is_empty() {
            metadata.set_prompt(prompt.to_string());
        }
        self.chats
            .lock()
            .unwrap()
            .push((id.to_string(), FetchedChat { metadata, messages }));
    }

    pub fn fail_chat(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }

    pub fn fail_listing(&self) {
        *self.fail_listing.lock().unwrap() = true;
    }

    pub fn fetched_ids(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn saved(&self) -> Vec<(String, Vec<Value>)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatStore for MockChatStore {
    async fn list_chats(&self, _owner: &OwnerRef) -> Result<Vec<ChatListEntry>, Error> {
        if *self.fail_listing.lock().unwrap() {
            return Err(Error::Host("simulated listing failure".to_string()));
        }
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| ChatListEntry {
                file_name: format!("{}.jsonl", id),
            })
            .collect())
    }

    async fn get_chat(
        &self,
        _owner: &OwnerRef,
        chat_id: &str,
    ) -> Result<Option<FetchedChat>, Error> {
        self.fetched.lock().unwrap().push(chat_id.to_string());
        if self.failing.lock().unwrap().contains(chat_id) {
            return Err(Error::Host("simulated fetch failure".to_string()));
        }
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == chat_id)
            .map(|(_, chat)| chat.clone()))
    }

    async fn save_chat(
        &self,
        _owner: &OwnerRef,
        chat_id: &str,
        payload: Vec<Value>,
    ) -> Result<(), Error> {
        if *self.fail_saves.lock().unwrap() {
            return Err(Error::Host("simulated save failure".to_string()));
        }
        self.saved
            .lock()
            .unwrap()
            .push((chat_id.to_string(), payload));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Injection {
    pub key: String,
    pub text: String,
    pub position: InjectionPosition,
    pub depth: u32,
    pub scannable: bool,
    pub role: InjectionRole,
}

#[derive(Default)]
struct HostState {
    chat_id: Option<String>,
    owner: Option<OwnerRef>,
    display_name: Option<String>,
    metadata: ChatMetadata,
    messages: Vec<Value>,
    injection: Option<Injection>,
    notices: Vec<(NoticeLevel, String)>,
    fail_injection: bool,
    read_delay_ms: Option<u64>,
}

pub struct MockHost {
    state: Mutex<HostState>,
}

impl MockHost {
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(HostState::default()),
        }
    }

    pub fn with_active_chat(id: &str) -> Self {
        let host = Self::empty();
        host.switch_active_chat(id);
        host
    }

    /// Load a different chat, dropping the previous chat's metadata the way
    /// the host would.
    pub fn switch_active_chat(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.chat_id = Some(id.to_string());
        state.display_name = Some(id.to_string());
        state.owner = Some(OwnerRef::Character {
            id: "char-1".to_string(),
            avatar: "char-1.png".to_string(),
        });
        state.metadata = ChatMetadata::default();
        state.messages = vec![json!({ "mes": format!("active message in {}", id) })];
    }

    pub fn set_active_prompt(&self, text: &str) {
        self.state
            .lock()
            .unwrap()
            .metadata
            .set_prompt(text.to_string());
    }

    pub fn fail_injection(&self) {
        self.state.lock().unwrap().fail_injection = true;
    }

    /// Slow down every state read, widening race windows between the
    /// controller and concurrently running tasks.
    pub fn delay_reads(&self, ms: u64) {
        self.state.lock().unwrap().read_delay_ms = Some(ms);
    }

    fn maybe_sleep(&self) {
        let delay = self.state.lock().unwrap().read_delay_ms;
        if let Some(ms) = delay {
            std::thread::sleep(std::time::Duration::from_millis(ms));
        }
    }

    pub fn last_injection(&self) -> Option<Injection> {
        self.state.lock().unwrap().injection.clone()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.state.lock().unwrap().notices.clone()
    }

    pub fn metadata(&self) -> ChatMetadata {
        self.state.lock().unwrap().metadata.clone()
    }
}

impl HostContext for MockHost {
    fn active_chat_id(&self) -> Option<String> {
        self.maybe_sleep();
        self.state.lock().unwrap().chat_id.clone()
    }

    fn active_owner(&self) -> Option<OwnerRef> {
        self.state.lock().unwrap().owner.clone()
    }

    fn active_display_name(&self) -> Option<String> {
        self.state.lock().unwrap().display_name.clone()
    }

    fn active_metadata(&self) -> Option<ChatMetadata> {
        let state = self.state.lock().unwrap();
        state.chat_id.as_ref().map(|_| state.metadata.clone())
    }

    fn active_messages(&self) -> Vec<Value> {
        self.state.lock().unwrap().messages.clone()
    }

    fn update_active_metadata(&self, partial: Map<String, Value>) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        if state.chat_id.is_none() {
            return Err("no active chat".to_string());
        }
        let mut merged = serde_json::to_value(&state.metadata)
            .map_err(|e| e.to_string())?
            .as_object()
            .cloned()
            .unwrap_or_default();
        merged.extend(partial);
        state.metadata =
            serde_json::from_value(Value::Object(merged)).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn set_prompt_fragment(
        &self,
        key: &str,
        text: &str,
        position: InjectionPosition,
        depth: u32,
        scannable: bool,
        role: InjectionRole,
    ) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_injection {
            return Err("injection pipeline unavailable".to_string());
        }
        state.injection = Some(Injection {
            key: key.to_string(),
            text: text.to_string(),
            position,
            depth,
            scannable,
            role,
        });
        Ok(())
    }

    fn notify(&self, level: NoticeLevel, message: &str) {
        self.state.lock().unwrap().notices.push((level, message.to_string()));
    }
}
