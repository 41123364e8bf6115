//! Data-access contract for books and its two backends.

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use bookshelf_db::DbError;

use super::models::{Book, NewBook};

pub use memory::MemoryBookStore;
pub use sqlite::SqliteBookStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("book {0} not found")]
    NotFound(i64),

    #[error("invalid book: {0}")]
    Validation(String),

    #[error(transparent)]
    Backend(#[from] DbError),
}

/// Persistence for books.
///
/// Listing and search results are always ordered by id ascending.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a book and return it with its assigned id
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Every book; empty when the store is empty
    async fn get_all(&self) -> Result<Vec<Book>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Book, StoreError>;

    async fn update_rating(&self, id: i64, rating: i64) -> Result<Book, StoreError>;

    /// Remove a book permanently. Deleting a missing id is `NotFound`.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Books whose title contains `needle`, ignoring case
    async fn search_by_title(&self, needle: &str) -> Result<Vec<Book>, StoreError>;
}

pub type SharedStore = Arc<dyn BookStore>;
