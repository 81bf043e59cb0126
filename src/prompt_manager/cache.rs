//! Session-scoped record cache. The active chat's record is synthesized from
//! live host state so the editor is interactive immediately; every other chat
//! is pulled in by a single background sweep that never blocks the editor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::chat_store::ChatStore;
use crate::error::Error;
use crate::host::HostContext;
use crate::utils::normalize_chat_id;

use super::types::{ChatRecord, OwnerRef};

#[derive(Clone)]
pub struct RecordCache {
    inner: Arc<Mutex<CacheInner>>,
}

struct CacheInner {
    records: HashMap<String, ChatRecord>,
    loading_others: bool,
    // Bumped on every editor open; sweep completions carrying an older token
    // are discarded instead of contaminating the new session.
    generation: u64,
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                records: HashMap::new(),
                loading_others: false,
                generation: 0,
            })),
        }
    }

    /// Drop all records and flags and start a new session generation.
    /// Returns the new token; population paths must present it back.
    pub fn reset(&self) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        inner.records.clear();
        inner.loading_others = false;
        inner.generation += 1;
        inner.generation
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().unwrap().generation
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().records.is_empty()
    }

    pub fn is_loading_others(&self) -> bool {
        self.inner.lock().unwrap().loading_others
    }

    pub fn get(&self, id: &str) -> Option<ChatRecord> {
        self.inner.lock().unwrap().records.get(id).cloned()
    }

    /// First writer wins: inserting an id that already exists is a no-op, so
    /// a late fetch can never clobber a record the user is already editing.
    /// Returns whether the record was inserted.
    pub fn upsert_if_absent(&self, record: ChatRecord) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.records.contains_key(&record.id) {
            return false;
        }
        inner.records.insert(record.id.clone(), record);
        true
    }

    /// Overwrite an existing record's metadata/messages in place. Used by the
    /// save path, which has just committed an edit the cache must reflect.
    pub fn replace(&self, record: ChatRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.records.insert(record.id.clone(), record);
    }

    /// All records in display order: the active chat first, the rest by
    /// ascending id.
    pub fn all(&self, active_id: Option<&str>) -> Vec<ChatRecord> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<ChatRecord> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| {
            let a_active = Some(a.id.as_str()) == active_id;
            let b_active = Some(b.id.as_str()) == active_id;
            b_active.cmp(&a_active).then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    /// Build the active chat's record from already-in-memory host state. No
    /// network involved, so the editor opens instantly. Returns the cached
    /// record, or `None` when no chat is loaded.
    pub fn synthesize_active(&self, host: &dyn HostContext) -> Option<ChatRecord> {
        let id = host.active_chat_id()?;
        let owner = host.active_owner()?;
        let record = ChatRecord {
            display_name: host.active_display_name().unwrap_or_else(|| id.clone()),
            metadata: host.active_metadata().unwrap_or_default(),
            messages: host.active_messages(),
            owner,
            id: id.clone(),
        };
        self.upsert_if_absent(record);
        self.get(&id)
    }

    /// Fetch one chat on demand and cache it. Callers must not invoke this
    /// while the background sweep is writing; they show a loading state and
    /// retry instead, so at most one fetch per id is ever outstanding.
    pub async fn populate_one(
        &self,
        store: &dyn ChatStore,
        owner: &OwnerRef,
        id: &str,
    ) -> Result<Option<ChatRecord>, Error> {
        if let Some(existing) = self.get(id) {
            return Ok(Some(existing));
        }
        let token = self.generation();
        let fetched = store.get_chat(owner, id).await?;
        if self.generation() != token {
            // The editor was reopened while we were in flight.
            tracing::debug!("discarding stale fetch for chat {}", id);
            return Ok(None);
        }
        let Some(fetched) = fetched else {
            return Ok(None);
        };
        self.upsert_if_absent(ChatRecord {
            id: id.to_string(),
            display_name: id.to_string(),
            metadata: fetched.metadata,
            messages: fetched.messages,
            owner: owner.clone(),
        });
        Ok(self.get(id))
    }

    /// One-shot background sweep: list every chat of the owner context and
    /// cache each one except `exclude_id` (the active chat, which was already
    /// synthesized). Individual fetch failures are skipped, never fatal; the
    /// `loading_others` flag always clears for the session that set it.
    /// Re-entrant calls while a sweep is active are no-ops.
    pub async fn populate_all(
        &self,
        store: Arc<dyn ChatStore>,
        owner: OwnerRef,
        exclude_id: String,
        token: u64,
    ) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.loading_others || inner.generation != token {
                return;
            }
            inner.loading_others = true;
        }

        let entries = match store.list_chats(&owner).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("chat listing failed, skipping sweep: {}", e);
                self.finish_sweep(token);
                return;
            }
        };

        for entry in entries {
            let id = normalize_chat_id(&entry.file_name);
            if id == exclude_id || self.get(&id).is_some() {
                continue;
            }
            match store.get_chat(&owner, &id).await {
                Ok(Some(fetched)) => {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.generation != token {
                        tracing::debug!("sweep superseded, discarding remaining fetches");
                        return;
                    }
                    inner.records.entry(id.clone()).or_insert(ChatRecord {
                        id: id.clone(),
                        display_name: id.clone(),
                        metadata: fetched.metadata,
                        messages: fetched.messages,
                        owner: owner.clone(),
                    });
                }
                Ok(None) => {
                    tracing::debug!("chat {} vanished during sweep", id);
                }
                Err(e) => {
                    tracing::debug!("skipping chat {} during sweep: {}", id, e);
                }
            }
        }

        self.finish_sweep(token);
    }

    fn finish_sweep(&self, token: u64) {
        let mut inner = self.inner.lock().unwrap();
        if inner.generation == token {
            inner.loading_others = false;
        }
    }

    #[cfg(test)]
    pub(crate) fn set_loading_others(&self, value: bool) {
        self.inner.lock().unwrap().loading_others = value;
    }
}
