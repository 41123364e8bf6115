use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use bookshelf_db::{Database, UNICODE_LOWER};

use super::{BookStore, StoreError};
use crate::modules::books::models::{validate_rating, Book, NewBook};

/// Books kept in the `books` table.
///
/// Expects the `books` module migrations to have been applied.
#[derive(Clone)]
pub struct SqliteBookStore {
    db: Database,
}

impl SqliteBookStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get("id")?,
        title: row.get("title")?,
        author: row.get("author")?,
        rating: row.get("rating")?,
    })
}

/// `LIKE` pattern matching `needle` anywhere, with wildcards taken literally
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let id = self
            .db
            .call({
                let book = book.clone();
                move |conn| {
                    conn.execute(
                        "INSERT INTO books (title, author, rating) VALUES (?1, ?2, ?3)",
                        params![book.title(), book.author(), book.rating()],
                    )?;
                    Ok(conn.last_insert_rowid())
                }
            })
            .await?;

        Ok(book.into_book(id))
    }

    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        let books = self
            .db
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, title, author, rating FROM books ORDER BY id")?;
                let books = stmt
                    .query_map([], book_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(books)
            })
            .await?;
        Ok(books)
    }

    async fn get_by_id(&self, id: i64) -> Result<Book, StoreError> {
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, title, author, rating FROM books WHERE id = ?1",
                    params![id],
                    book_from_row,
                )
                .optional()
            })
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_rating(&self, id: i64, rating: i64) -> Result<Book, StoreError> {
        validate_rating(rating)?;

        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let changed = tx.execute(
                    "UPDATE books SET rating = ?2 WHERE id = ?1",
                    params![id, rating],
                )?;
                if changed == 0 {
                    return Ok(None);
                }
                let book = tx.query_row(
                    "SELECT id, title, author, rating FROM books WHERE id = ?1",
                    params![id],
                    book_from_row,
                )?;
                tx.commit()?;
                Ok(Some(book))
            })
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let removed = self
            .db
            .call(move |conn| conn.execute("DELETE FROM books WHERE id = ?1", params![id]))
            .await?;

        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn search_by_title(&self, needle: &str) -> Result<Vec<Book>, StoreError> {
        // Both sides folded with Unicode rules; LIKE alone only folds ASCII.
        let pattern = contains_pattern(&needle.to_lowercase());

        let books = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT id, title, author, rating FROM books
                     WHERE {UNICODE_LOWER}(title) LIKE ?1 ESCAPE '\\'
                     ORDER BY id"
                ))?;
                let books = stmt
                    .query_map(params![pattern], book_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(books)
            })
            .await?;
        Ok(books)
    }
}
