use crate::domain::{BookId, UserId, WaitlistEntry, WaitlistEntryId};
use crate::ports::StoreError;
use crate::ports::waitlist_store::{Result, WaitlistStore as WaitlistStoreTrait};
use async_trait::async_trait;
use std::sync::Mutex;

/// WaitlistStoreのインメモリ実装
pub struct WaitlistStore {
    entries: Mutex<Vec<WaitlistEntry>>,
}

impl WaitlistStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// 保存されている全エントリ
    pub fn all(&self) -> Vec<WaitlistEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl Default for WaitlistStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WaitlistStoreTrait for WaitlistStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<WaitlistEntry>> {
        let mut entries: Vec<WaitlistEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<WaitlistEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.user_id == user_id && e.book_id == book_id)
            .cloned())
    }

    async fn insert(&self, entry: &WaitlistEntry) -> Result<WaitlistEntry> {
        let mut entries = self.entries.lock().unwrap();
        if entries
            .iter()
            .any(|e| e.user_id == entry.user_id && e.book_id == entry.book_id)
        {
            return Err(StoreError::Conflict("waitlist_user_book_key".to_string()));
        }
        entries.push(entry.clone());
        Ok(entry.clone())
    }

    async fn delete(&self, entry_id: WaitlistEntryId, user_id: UserId) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .retain(|e| !(e.id == entry_id && e.user_id == user_id));
        Ok(())
    }
}
