use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookStore, StoreError};
use crate::modules::books::models::{validate_rating, Book, NewBook};

/// Process-local store, used by the `memory` backend.
#[derive(Default)]
pub struct MemoryBookStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    last_id: i64,
    books: BTreeMap<i64, Book>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let book = book.into_book(state.last_id);
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.state.read().await.books.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Book, StoreError> {
        self.state
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_rating(&self, id: i64, rating: i64) -> Result<Book, StoreError> {
        validate_rating(rating)?;
        let mut state = self.state.write().await;
        let book = state.books.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        book.rating = rating;
        Ok(book.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn search_by_title(&self, needle: &str) -> Result<Vec<Book>, StoreError> {
        let needle = needle.to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .books
            .values()
            .filter(|book| book.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, rating: i64) -> NewBook {
        NewBook::new(title, "J.R.R. Tolkien", rating).unwrap()
    }

    #[tokio::test]
    async fn ids_increase_and_are_not_reused() {
        let store = MemoryBookStore::new();
        let first = store.create(book("The Hobbit", 5)).await.unwrap();
        let second = store.create(book("The Silmarillion", 3)).await.unwrap();
        assert!(second.id > first.id);

        store.delete(second.id).await.unwrap();
        let third = store.create(book("Unfinished Tales", 4)).await.unwrap();
        assert!(third.id > second.id);
    }

    #[tokio::test]
    async fn update_checks_existence_and_range() {
        let store = MemoryBookStore::new();
        let created = store.create(book("The Hobbit", 2)).await.unwrap();

        assert!(matches!(
            store.update_rating(99, 3).await,
            Err(StoreError::NotFound(99))
        ));
        assert!(matches!(
            store.update_rating(created.id, 9).await,
            Err(StoreError::Validation(_))
        ));

        let updated = store.update_rating(created.id, 5).await.unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(store.get_by_id(created.id).await.unwrap().rating, 5);
    }

    #[tokio::test]
    async fn search_ignores_case() {
        let store = MemoryBookStore::new();
        store.create(book("The Two Towers", 4)).await.unwrap();
        store.create(book("The Hobbit", 5)).await.unwrap();

        let found = store.search_by_title("TOWERS").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "The Two Towers");
        assert!(store.search_by_title("dune").await.unwrap().is_empty());
    }
}
