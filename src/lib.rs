use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use std::error::Error;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::assets::serve_static;
use crate::handler::{
    AppState, add_book, add_book_page, delete_book, edit_book, healthcheck, list_books, show_cover,
    update_book, upload_cover,
};

pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod handler;
pub mod model;
pub mod views;

/// Multipart bodies above this size are rejected unless configured otherwise.
pub const DEFAULT_UPLOAD_LIMIT: usize = 10 << 20;

pub fn router(state: AppState, upload_limit: usize) -> Router {
    Router::new()
        .route("/", get(list_books).post(add_book))
        .route("/add", get(add_book_page))
        .route("/delete/:id", get(delete_book))
        .route("/cover/:id", get(show_cover).post(upload_cover))
        .route("/edit/:id", get(edit_book).post(update_book))
        .route("/healthz", get(healthcheck))
        .route("/static/*path", get(serve_static))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
