//! Orchestrates the editing surface: which chat is shown, when the cache is
//! populated, and how edits are committed. The host renders the returned view
//! models; all markup stays on its side of the seam.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::chat_store::ChatStore;
use crate::error::Error;
use crate::host::{HostContext, NoticeLevel};

use super::cache::RecordCache;
use super::injection;
use super::types::{ChatRecord, CustomPromptData, PROMPT_KEY};

/// One entry of the navigable chat list.
#[derive(Debug, Clone)]
pub struct ChatListItem {
    pub id: String,
    pub display_name: String,
    pub has_prompt: bool,
    pub is_active: bool,
    pub is_viewing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorPane {
    /// No chat loaded in the host at all.
    Empty,
    /// The viewed chat's record is still being fetched; the host should
    /// re-invoke `show_chat` once the sweep settles.
    Loading { id: String },
    /// The server has no record of the viewed chat. Terminal: the host keeps
    /// this pane until the user picks another list entry.
    Missing { id: String },
    Editing { id: String, prompt: String },
}

#[derive(Debug, Clone)]
pub struct EditorRender {
    pub list: Vec<ChatListItem>,
    pub pane: EditorPane,
}

pub struct EditorController {
    store: Arc<dyn ChatStore>,
    host: Arc<dyn HostContext>,
    cache: RecordCache,
    viewing_id: Option<String>,
}

impl EditorController {
    pub fn new(store: Arc<dyn ChatStore>, host: Arc<dyn HostContext>) -> Self {
        Self {
            store,
            host,
            cache: RecordCache::new(),
            viewing_id: None,
        }
    }

    pub fn viewing_id(&self) -> Option<&str> {
        self.viewing_id.as_deref()
    }

    /// Whether the background sweep is still writing records.
    pub fn sweep_in_flight(&self) -> bool {
        self.cache.is_loading_others()
    }

    /// Open the editing surface: reset all session state, make the active
    /// chat editable immediately, and kick off the background sweep for every
    /// other chat of the owner context without blocking the first render.
    pub async fn open(&mut self) -> EditorRender {
        let token = self.cache.reset();
        self.viewing_id = None;

        // The active record must be in the cache before the sweep starts
        // writing, or a fast sweep would make the first render miss it and
        // fall through to a network fetch.
        self.cache.synthesize_active(self.host.as_ref());

        if let (Some(active_id), Some(owner)) =
            (self.host.active_chat_id(), self.host.active_owner())
        {
            let cache = self.cache.clone();
            let store = self.store.clone();
            tokio::spawn(async move {
                cache.populate_all(store, owner, active_id, token).await;
            });
        }

        self.show_chat(None).await
    }

    /// Point the editor at a chat. With an empty cache this always lands on
    /// the active chat (synthesized from live host state), whatever was
    /// requested; afterwards the requested id wins, defaulting to the active
    /// chat when none is given.
    pub async fn show_chat(&mut self, id: Option<&str>) -> EditorRender {
        let active_id = self.host.active_chat_id();

        if self.cache.is_empty() {
            self.cache.synthesize_active(self.host.as_ref());
            self.viewing_id = active_id.clone();
        } else {
            self.viewing_id = id.map(str::to_string).or_else(|| active_id.clone());
        }

        let pane = match self.viewing_id.clone() {
            None => EditorPane::Empty,
            Some(vid) => self.pane_for(&vid).await,
        };

        EditorRender {
            list: self.render_list(active_id.as_deref()),
            pane,
        }
    }

    async fn pane_for(&self, vid: &str) -> EditorPane {
        if let Some(record) = self.cache.get(vid) {
            return EditorPane::Editing {
                id: vid.to_string(),
                prompt: record.metadata.prompt().to_string(),
            };
        }
        // Cache miss. While the sweep is writing we must not start a second
        // fetch for the same id; show a loading state and let the host retry.
        if self.cache.is_loading_others() {
            return EditorPane::Loading {
                id: vid.to_string(),
            };
        }
        let Some(owner) = self.host.active_owner() else {
            return EditorPane::Empty;
        };
        match self.cache.populate_one(self.store.as_ref(), &owner, vid).await {
            Ok(Some(record)) => EditorPane::Editing {
                id: vid.to_string(),
                prompt: record.metadata.prompt().to_string(),
            },
            Ok(None) => {
                self.host
                    .notify(NoticeLevel::Warning, &format!("Chat {} not found", vid));
                EditorPane::Missing {
                    id: vid.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!("failed to load chat {}: {}", vid, e);
                self.host
                    .notify(NoticeLevel::Error, &format!("Failed to load chat: {}", e));
                EditorPane::Loading {
                    id: vid.to_string(),
                }
            }
        }
    }

    /// Chats worth listing: everything with a stored prompt, plus the active
    /// chat even without one. Active first, the rest by id.
    fn render_list(&self, active_id: Option<&str>) -> Vec<ChatListItem> {
        self.cache
            .all(active_id)
            .into_iter()
            .filter(|r| r.has_prompt() || Some(r.id.as_str()) == active_id)
            .map(|r| ChatListItem {
                has_prompt: r.has_prompt(),
                is_active: Some(r.id.as_str()) == active_id,
                is_viewing: Some(r.id.as_str()) == self.viewing_id.as_deref(),
                display_name: r.display_name,
                id: r.id,
            })
            .collect()
    }

    /// Commit an edited prompt. The cache reflects the edit whether or not
    /// the commit succeeds, so the user's text survives a failed save.
    pub async fn save(&mut self, id: &str, text: &str) -> Result<(), Error> {
        let Some(mut record) = self.cache.get(id) else {
            tracing::warn!("save target missing from cache: {}", id);
            self.host
                .notify(NoticeLevel::Error, &format!("Chat {} is not loaded", id));
            return Err(Error::CacheMiss(id.to_string()));
        };
        record.metadata.set_prompt(text.to_string());
        self.cache.replace(record.clone());

        let is_active = self.host.active_chat_id().as_deref() == Some(id);
        let result = if is_active {
            self.save_active(text)
        } else {
            self.save_remote(&record).await
        };

        if let Err(e) = &result {
            self.host
                .notify(NoticeLevel::Error, &format!("Failed to save prompt: {}", e));
        }
        result
    }

    /// Active chat: the host's live metadata is the source of truth, so edits
    /// go through its incremental update, then injection runs synchronously
    /// so the very next generation already carries the new value.
    fn save_active(&self, text: &str) -> Result<(), Error> {
        let mut partial = Map::new();
        partial.insert(
            PROMPT_KEY.to_string(),
            serde_json::to_value(CustomPromptData {
                prompt: text.to_string(),
            })?,
        );
        self.host.update_active_metadata(partial).map_err(Error::Host)?;
        injection::apply_or_clear_active_prompt(self.host.as_ref());
        Ok(())
    }

    async fn save_remote(&self, record: &ChatRecord) -> Result<(), Error> {
        let payload = build_save_payload(record)?;
        self.store
            .save_chat(&record.owner, &record.id, payload)
            .await
    }
}

/// Re-pack a record for wholesale persistence: the envelope duplicates the
/// metadata at top level and under `chat_metadata`, followed by the cached
/// message sequence exactly as it was loaded.
pub(crate) fn build_save_payload(record: &ChatRecord) -> Result<Vec<Value>, Error> {
    let meta = serde_json::to_value(&record.metadata)?;
    let mut envelope = match &meta {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    envelope.insert("chat_metadata".to_string(), meta);

    let mut payload = Vec::with_capacity(record.messages.len() + 1);
    payload.push(Value::Object(envelope));
    payload.extend(record.messages.iter().cloned());
    Ok(payload)
}
