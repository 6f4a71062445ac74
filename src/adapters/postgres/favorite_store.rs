use crate::domain::{BookId, Favorite, FavoriteId, UserId};
use crate::ports::favorite_store::{FavoriteStore as FavoriteStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_favorite(row: &PgRow) -> Favorite {
    Favorite {
        id: FavoriteId::from_uuid(row.get("id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: BookId::new(row.get("book_id")),
        created_at: row.get("created_at"),
    }
}

/// FavoriteStoreのPostgreSQL実装
pub struct FavoriteStore {
    pool: PgPool,
}

impl FavoriteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteStoreTrait for FavoriteStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Favorite>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, created_at
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_favorite).collect())
    }

    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<Favorite>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, created_at
            FROM favorites
            WHERE user_id = $1 AND book_id = $2
            "#,
        )
        .bind(user_id.value())
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_favorite))
    }

    /// 一意制約 `favorites_user_book_key` に違反した場合は Conflict
    async fn insert(&self, favorite: &Favorite) -> Result<Favorite> {
        let row = sqlx::query(
            r#"
            INSERT INTO favorites (id, user_id, book_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, book_id, created_at
            "#,
        )
        .bind(favorite.id.value())
        .bind(favorite.user_id.value())
        .bind(favorite.book_id.value())
        .bind(favorite.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_row_to_favorite(&row))
    }

    async fn delete(&self, favorite_id: FavoriteId) -> Result<()> {
        sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(favorite_id.value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
