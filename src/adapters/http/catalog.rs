use crate::domain::{Book, BookId, BookPage, CatalogQuery};
use crate::ports::catalog::{Catalog as CatalogTrait, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Catalog client for a Gutendex-compatible HTTP API
///
/// `GET {base}/books` for searches and `GET {base}/books/{id}` for lookups.
pub struct Catalog {
    client: reqwest::Client,
    base_url: String,
}

impl Catalog {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CatalogTrait for Catalog {
    async fn search(&self, query: &CatalogQuery) -> Result<BookPage> {
        let pairs = query.to_query_pairs();
        tracing::debug!(?pairs, "Searching catalog");

        let page = self
            .client
            .get(format!("{}/books", self.base_url))
            .query(&pairs)
            .send()
            .await?
            .error_for_status()?
            .json::<BookPage>()
            .await?;

        Ok(page)
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let response = self
            .client
            .get(format!("{}/books/{}", self.base_url, book_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let book = response.error_for_status()?.json::<Book>().await?;
        Ok(Some(book))
    }
}
