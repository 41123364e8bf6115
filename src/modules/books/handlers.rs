//! Request handlers for the books routes.
//!
//! Each handler maps store errors to statuses itself; the mapping differs
//! per route (a failed rating update is a 400, a failed create is a 422).

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use bookshelf_http::AppError;

use super::models::{
    BookCreated, BookDeleted, BookPage, CreateBook, NewBook, RatingUpdate, RatingUpdated,
    TitleSearch, TitlesFound,
};
use super::pagination::{paginate, PageQuery};
use super::store::{SharedStore, StoreError};

fn internal(err: StoreError) -> AppError {
    AppError::Internal(err.into())
}

fn unprocessable(err: StoreError) -> AppError {
    AppError::unprocessable(err.to_string())
}

/// Look a book up for a mutation; a missing id is a 404.
async fn require_book(store: &SharedStore, id: i64) -> Result<(), AppError> {
    match store.get_by_id(id).await {
        Ok(_) => Ok(()),
        Err(err @ StoreError::NotFound(_)) => Err(AppError::not_found(err.to_string())),
        Err(err) => Err(internal(err)),
    }
}

fn book_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::not_found(rejection.body_text()))
}

/// `GET /books?page=N`
pub async fn list_books(
    State(store): State<SharedStore>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<BookPage>, AppError> {
    let page = query.map(|Query(q)| q.page()).unwrap_or(1);

    let books = store.get_all().await.map_err(internal)?;
    if books.is_empty() {
        return Err(AppError::not_found("no books on the shelf"));
    }

    Ok(Json(BookPage {
        success: true,
        books: paginate(&books, page).to_vec(),
        total_books: books.len(),
    }))
}

/// `POST /books`
pub async fn create_book(
    State(store): State<SharedStore>,
    body: Result<Json<CreateBook>, JsonRejection>,
) -> Result<Json<BookCreated>, AppError> {
    let Json(request) = body.map_err(|rejection| AppError::unprocessable(rejection.body_text()))?;

    let new_book =
        NewBook::new(request.title, request.author, request.rating).map_err(unprocessable)?;
    let book = store.create(new_book).await.map_err(unprocessable)?;
    let books = store.get_all().await.map_err(unprocessable)?;

    tracing::info!(book_id = book.id, title = %book.title, "book created");

    Ok(Json(BookCreated {
        success: true,
        created: book.id,
        total_books: books.len(),
        books,
    }))
}

/// `PATCH /books/{id}`
pub async fn update_rating(
    State(store): State<SharedStore>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<RatingUpdate>, JsonRejection>,
) -> Result<Json<RatingUpdated>, AppError> {
    let id = book_id(path)?;
    require_book(&store, id).await?;

    let Json(request) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let book = store
        .update_rating(id, request.rating)
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    tracing::info!(book_id = book.id, rating = book.rating, "rating updated");

    Ok(Json(RatingUpdated { success: true }))
}

/// `DELETE /books/{id}`
pub async fn delete_book(
    State(store): State<SharedStore>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<BookDeleted>, AppError> {
    let id = book_id(path)?;
    require_book(&store, id).await?;

    store.delete(id).await.map_err(|err| match err {
        StoreError::NotFound(_) => AppError::not_found(err.to_string()),
        other => unprocessable(other),
    })?;
    let books = store.get_all().await.map_err(unprocessable)?;

    tracing::info!(book_id = id, "book deleted");

    Ok(Json(BookDeleted {
        success: true,
        deleted: id,
        total_books: books.len(),
        books,
    }))
}

/// `POST /books/search`
pub async fn search_books(
    State(store): State<SharedStore>,
    body: Result<Json<TitleSearch>, JsonRejection>,
) -> Result<Json<TitlesFound>, AppError> {
    let Json(request) = body.map_err(|rejection| AppError::unprocessable(rejection.body_text()))?;

    let books = store
        .search_by_title(&request.title)
        .await
        .map_err(unprocessable)?;
    if books.is_empty() {
        return Err(AppError::not_found(format!(
            "no titles contain '{}'",
            request.title
        )));
    }

    Ok(Json(TitlesFound {
        success: true,
        books_found: books.len(),
        titles_found: books.into_iter().map(|book| book.title).collect(),
    }))
}
