use serde::{Deserialize, Serialize};

use super::store::StoreError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Assigned by the store on creation, never reused
    pub id: i64,
    pub title: String,
    pub author: String,
    /// 1 to 5
    pub rating: i64,
}

/// A validated book that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    title: String,
    author: String,
    rating: i64,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        rating: i64,
    ) -> Result<Self, StoreError> {
        let title = title.into();
        let author = author.into();

        if title.trim().is_empty() {
            return Err(StoreError::Validation("title must not be empty".into()));
        }
        if author.trim().is_empty() {
            return Err(StoreError::Validation("author must not be empty".into()));
        }
        validate_rating(rating)?;

        Ok(Self {
            title,
            author,
            rating,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn rating(&self) -> i64 {
        self.rating
    }

    pub(crate) fn into_book(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            rating: self.rating,
        }
    }
}

pub fn validate_rating(rating: i64) -> Result<(), StoreError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "rating {rating} is outside {MIN_RATING}..={MAX_RATING}"
        )))
    }
}

/// Body of `POST /books`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub rating: i64,
}

/// Body of `PATCH /books/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingUpdate {
    pub rating: i64,
}

/// Body of `POST /books/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct TitleSearch {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookPage {
    pub success: bool,
    pub books: Vec<Book>,
    pub total_books: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookCreated {
    pub success: bool,
    pub created: i64,
    pub books: Vec<Book>,
    pub total_books: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookDeleted {
    pub success: bool,
    pub deleted: i64,
    pub books: Vec<Book>,
    pub total_books: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingUpdated {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TitlesFound {
    pub success: bool,
    pub books_found: usize,
    pub titles_found: Vec<String>,
}
