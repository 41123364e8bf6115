pub mod handlers;
pub mod models;
pub mod pagination;
pub mod store;

use async_trait::async_trait;
use axum::{
    routing::{get, patch, post},
    Router,
};
use serde_json::json;

use bookshelf_kernel::{InitCtx, Migration, Module};

use store::SharedStore;

/// Books module: CRUD, pagination and title search over the book store
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

/// Schema for the `books` table
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_create_books",
        up: r#"
            CREATE TABLE IF NOT EXISTS books (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                title  TEXT    NOT NULL CHECK (title  <> ''),
                author TEXT    NOT NULL CHECK (author <> ''),
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5)
            );
            "#,
    }]
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.database.backend,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/books",
                get(handlers::list_books).post(handlers::create_book),
            )
            .route("/books/search", post(handlers::search_books))
            .route(
                "/books/{id}",
                patch(handlers::update_rating).delete(handlers::delete_book),
            )
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let total_books = self.store.get_all().await?.len();
        tracing::info!(module = self.name(), total_books, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn json_body(schema: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn openapi() -> serde_json::Value {
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    });

    json!({
        "paths": {
            "/books": {
                "get": {
                    "summary": "List books, eight per page",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "page",
                        "in": "query",
                        "required": false,
                        "schema": { "type": "integer", "default": 1 }
                    }],
                    "responses": {
                        "200": json_response("Page of books", "BookPage"),
                        "404": error_response("The shelf is empty")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": json_body("CreateBook"),
                    "responses": {
                        "200": json_response("Book created", "BookCreated"),
                        "422": error_response("Missing or invalid fields")
                    }
                }
            },
            "/books/{id}": {
                "patch": {
                    "summary": "Update a book's rating",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "requestBody": json_body("RatingUpdate"),
                    "responses": {
                        "200": json_response("Rating updated", "RatingUpdated"),
                        "400": error_response("Missing or invalid rating"),
                        "404": error_response("No book with this id")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": json_response("Book deleted", "BookDeleted"),
                        "404": error_response("No book with this id"),
                        "422": error_response("Storage failed during delete")
                    }
                }
            },
            "/books/search": {
                "post": {
                    "summary": "Search titles, ignoring case",
                    "tags": ["Books"],
                    "requestBody": json_body("TitleSearch"),
                    "responses": {
                        "200": json_response("Matching titles", "TitlesFound"),
                        "404": error_response("No title matches"),
                        "422": error_response("Missing search title")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "rating": { "type": "integer", "minimum": 1, "maximum": 5 }
                    },
                    "required": ["id", "title", "author", "rating"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "rating": { "type": "integer", "minimum": 1, "maximum": 5 }
                    },
                    "required": ["title", "author", "rating"]
                },
                "RatingUpdate": {
                    "type": "object",
                    "properties": {
                        "rating": { "type": "integer", "minimum": 1, "maximum": 5 }
                    },
                    "required": ["rating"]
                },
                "TitleSearch": {
                    "type": "object",
                    "properties": { "title": { "type": "string" } },
                    "required": ["title"]
                },
                "BookPage": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                        "total_books": { "type": "integer" }
                    }
                },
                "BookCreated": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "created": { "type": "integer", "format": "int64" },
                        "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                        "total_books": { "type": "integer" }
                    }
                },
                "BookDeleted": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "deleted": { "type": "integer", "format": "int64" },
                        "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                        "total_books": { "type": "integer" }
                    }
                },
                "RatingUpdated": {
                    "type": "object",
                    "properties": { "success": { "type": "boolean" } }
                },
                "TitlesFound": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "books_found": { "type": "integer" },
                        "titles_found": { "type": "array", "items": { "type": "string" } }
                    }
                }
            }
        }
    })
}

/// Create the books module over `store`
pub fn create_module(store: SharedStore) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_every_route() {
        let doc = openapi();
        let paths = doc["paths"].as_object().unwrap();

        assert!(paths["/books"]["get"].is_object());
        assert!(paths["/books"]["post"].is_object());
        assert!(paths["/books/{id}"]["patch"].is_object());
        assert!(paths["/books/{id}"]["delete"].is_object());
        assert!(paths["/books/search"]["post"].is_object());
    }
}
