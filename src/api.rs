// Bookshelf - REST API with Axum
//
// Maps catalog/registry outcomes onto HTTP statuses. Message texts match what
// existing clients of the service already expect.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::accounts::AccountRegistry;
use crate::catalog::{Catalog, SeedBook};
use crate::error::CatalogError;
use crate::mirror::{MirroredCatalog, RemoteCatalog};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    catalog: Arc<RwLock<Catalog>>,
    accounts: AccountRegistry,
    mirror: Option<Arc<dyn RemoteCatalog>>,
}

impl AppState {
    pub fn new(catalog: Catalog, accounts: AccountRegistry) -> Self {
        AppState {
            catalog: Arc::new(RwLock::new(catalog)),
            accounts,
            mirror: None,
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn RemoteCatalog>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    fn mirrored(&self) -> MirroredCatalog<'_, RwLock<Catalog>> {
        MirroredCatalog::new(&*self.catalog, self.mirror.as_deref())
    }

    fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn catalog_mut(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Serialize)]
struct Message {
    message: String,
}

fn message(status: StatusCode, text: &str) -> Response {
    (
        status,
        Json(Message {
            message: text.to_string(),
        }),
    )
        .into_response()
}

// Missing or null fields read as empty strings and are rejected downstream

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Deserialize)]
pub struct ReviewerQuery {
    #[serde(default)]
    pub username: Option<String>,
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET / - All books as pretty-printed text
async fn list_books(State(state): State<AppState>) -> Response {
    let books = state.mirrored().get_all();

    let listing: IndexMap<String, SeedBook> = books
        .into_iter()
        .map(|book| (book.isbn.clone(), book.to_seed()))
        .collect();

    match serde_json::to_string_pretty(&listing) {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to format book listing");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Error listing books")
        }
    }
}

/// GET /isbn/:isbn - Book details
async fn book_by_isbn(State(state): State<AppState>, Path(isbn): Path<String>) -> Response {
    match state.mirrored().get_by_id(&isbn) {
        Ok(book) => Json(book).into_response(),
        Err(_) => message(StatusCode::NOT_FOUND, "Book not found"),
    }
}

/// GET /author/:author - Books by author
async fn books_by_author(State(state): State<AppState>, Path(author): Path<String>) -> Response {
    let books = state.catalog().find_by_author(&author);
    if books.is_empty() {
        return message(StatusCode::NOT_FOUND, "No books found for the given author");
    }
    Json(books).into_response()
}

/// GET /title/:title - Books by title
async fn books_by_title(State(state): State<AppState>, Path(title): Path<String>) -> Response {
    let books = state.catalog().find_by_title(&title);
    if books.is_empty() {
        return message(StatusCode::NOT_FOUND, "No books found for the given title");
    }
    Json(books).into_response()
}

/// GET /review/:isbn - Reviews of a book
async fn book_reviews(State(state): State<AppState>, Path(isbn): Path<String>) -> Response {
    match state.catalog().get_reviews(&isbn) {
        Ok(reviews) if reviews.is_empty() => {
            message(StatusCode::OK, "No reviews available for this book.")
        }
        Ok(reviews) => Json(reviews).into_response(),
        Err(_) => message(StatusCode::NOT_FOUND, "Book not found"),
    }
}

/// PUT /review/:isbn - Add or replace the caller's review
async fn put_review(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response {
    let username = field(&request.username);
    if !state.accounts.contains(username) {
        return message(StatusCode::FORBIDDEN, "User not registered");
    }

    let result = state
        .catalog_mut()
        .put_review(&isbn, username, field(&request.review));

    match result {
        Ok(None) => {
            info!(isbn = %isbn, user = %username, "review added");
            message(StatusCode::OK, "Review added")
        }
        Ok(Some(_)) => {
            info!(isbn = %isbn, user = %username, "review updated");
            message(StatusCode::OK, "Review updated")
        }
        Err(CatalogError::NotFound(_)) => message(StatusCode::NOT_FOUND, "Book not found"),
        Err(_) => message(StatusCode::BAD_REQUEST, "Review text is required"),
    }
}

/// DELETE /review/:isbn?username= - Remove a review
async fn delete_review(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    Query(query): Query<ReviewerQuery>,
) -> Response {
    let username = field(&query.username);
    if !state.accounts.contains(username) {
        return message(StatusCode::FORBIDDEN, "User not registered");
    }

    let result = state.catalog_mut().remove_review(&isbn, username);

    match result {
        Ok(_) => {
            info!(isbn = %isbn, user = %username, "review deleted");
            message(StatusCode::OK, "Review deleted")
        }
        Err(_) => message(StatusCode::NOT_FOUND, "Review not found"),
    }
}

/// POST /register - Register a new account
async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Response {
    let username = field(&request.username);
    match state.accounts.register(username, field(&request.password)) {
        Ok(()) => {
            info!(user = %username, "account registered");
            message(StatusCode::OK, "User successfully registered. Now you can login")
        }
        Err(CatalogError::AlreadyExists(_)) => message(StatusCode::CONFLICT, "User already exists!"),
        Err(_) => message(StatusCode::BAD_REQUEST, "Unable to register user."),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_books))
        .route("/health", get(health_check))
        .route("/isbn/:isbn", get(book_by_isbn))
        .route("/author/:author", get(books_by_author))
        .route("/title/:title", get(books_by_title))
        .route(
            "/review/:isbn",
            get(book_reviews).put(put_review).delete(delete_review),
        )
        .route("/register", post(register))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
