use crate::domain::{BookId, UserId, WaitlistEntry, WaitlistEntryId};
use crate::ports::waitlist_store::{Result, WaitlistStore as WaitlistStoreTrait};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_entry(row: &PgRow) -> WaitlistEntry {
    WaitlistEntry {
        id: WaitlistEntryId::from_uuid(row.get("id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: BookId::new(row.get("book_id")),
        created_at: row.get("created_at"),
    }
}

/// WaitlistStoreのPostgreSQL実装
pub struct WaitlistStore {
    pool: PgPool,
}

impl WaitlistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WaitlistStoreTrait for WaitlistStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<WaitlistEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, created_at
            FROM waitlist
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_entry).collect())
    }

    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<WaitlistEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, created_at
            FROM waitlist
            WHERE user_id = $1 AND book_id = $2
            "#,
        )
        .bind(user_id.value())
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_entry))
    }

    async fn insert(&self, entry: &WaitlistEntry) -> Result<WaitlistEntry> {
        let row = sqlx::query(
            r#"
            INSERT INTO waitlist (id, user_id, book_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, book_id, created_at
            "#,
        )
        .bind(entry.id.value())
        .bind(entry.user_id.value())
        .bind(entry.book_id.value())
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_row_to_entry(&row))
    }

    async fn delete(&self, entry_id: WaitlistEntryId, user_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM waitlist WHERE id = $1 AND user_id = $2")
            .bind(entry_id.value())
            .bind(user_id.value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
