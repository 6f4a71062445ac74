use crate::domain::{BookId, Favorite, FavoriteId, UserId};
use crate::ports::StoreError;
use crate::ports::favorite_store::{FavoriteStore as FavoriteStoreTrait, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// FavoriteStoreのインメモリ実装
///
/// 利用者・書籍の組の一意制約を `insert` で検査する。
pub struct FavoriteStore {
    favorites: Mutex<Vec<Favorite>>,
}

impl FavoriteStore {
    pub fn new() -> Self {
        Self {
            favorites: Mutex::new(Vec::new()),
        }
    }

    /// 保存されている全お気に入り
    pub fn all(&self) -> Vec<Favorite> {
        self.favorites.lock().unwrap().clone()
    }
}

impl Default for FavoriteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FavoriteStoreTrait for FavoriteStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Favorite>> {
        let mut favorites: Vec<Favorite> = self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }

    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<Favorite>> {
        Ok(self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.user_id == user_id && f.book_id == book_id)
            .cloned())
    }

    async fn insert(&self, favorite: &Favorite) -> Result<Favorite> {
        let mut favorites = self.favorites.lock().unwrap();
        if favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.book_id == favorite.book_id)
        {
            return Err(StoreError::Conflict("favorites_user_book_key".to_string()));
        }
        favorites.push(favorite.clone());
        Ok(favorite.clone())
    }

    async fn delete(&self, favorite_id: FavoriteId) -> Result<()> {
        self.favorites
            .lock()
            .unwrap()
            .retain(|f| f.id != favorite_id);
        Ok(())
    }
}
