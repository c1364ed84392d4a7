use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Multipart, Path, State},
    http::{header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};

use tracing::info;

use crate::db::Database;
use crate::error::AppError;
use crate::form::BookForm;
use crate::model::{CoverUpdate, EditView, FALLBACK_COVER_MIME, is_raster_mime};
use crate::views;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

/// A book id taken from the path. Only digit sequences that fit an `i64`
/// match; anything else is answered with 404 as if the route did not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for BookId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::not_found("no such route"))?;

        parse_book_id(&raw)
            .map(BookId)
            .ok_or_else(|| AppError::not_found(format!("no such route: {raw}")))
    }
}

pub fn parse_book_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn book_not_found(id: i64) -> AppError {
    AppError::not_found(format!("book {id} does not exist"))
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    "ok"
}

pub async fn list_books(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let books = state.db.store().await?.list_books().await?;
    info!(count = books.len(), "listed books");
    views::render_list(&books)
}

pub async fn add_book_page() -> Result<Html<String>, AppError> {
    views::render_add()
}

pub async fn add_book(State(state): State<AppState>, multipart: Multipart) -> Result<Redirect, AppError> {
    let form = BookForm::from_multipart(multipart).await?;
    let fields = form.fields()?;

    let id = state
        .db
        .store()
        .await?
        .insert_book(&fields, form.cover.as_ref())
        .await?;

    info!(book_id = id, title = %fields.title, has_cover = form.cover.is_some(), "added book");
    Ok(Redirect::to("/"))
}

pub async fn edit_book(State(state): State<AppState>, BookId(id): BookId) -> Result<Html<String>, AppError> {
    let book = state
        .db
        .store()
        .await?
        .get_book(id)
        .await?
        .ok_or_else(|| book_not_found(id))?;

    views::render_edit(&EditView::from(book))
}

pub async fn update_book(
    State(state): State<AppState>,
    BookId(id): BookId,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let form = BookForm::from_multipart(multipart).await?;
    form.check_id(id)?;
    let fields = form.fields()?;
    let cover = CoverUpdate::resolve(form.cover, form.keep_cover);
    let cover_action = match &cover {
        CoverUpdate::Replace(_) => "replace",
        CoverUpdate::Keep => "keep",
        CoverUpdate::Clear => "clear",
    };

    let updated = state.db.store().await?.update_book(id, &fields, cover).await?;
    if !updated {
        return Err(book_not_found(id));
    }

    info!(book_id = id, cover = cover_action, "updated book");
    Ok(Redirect::to(&format!("/#book-{id}")))
}

pub async fn delete_book(State(state): State<AppState>, BookId(id): BookId) -> Result<Redirect, AppError> {
    let deleted = state.db.store().await?.delete_book(id).await?;
    if !deleted {
        return Err(book_not_found(id));
    }

    info!(book_id = id, "deleted book");
    Ok(Redirect::to("/"))
}

pub async fn show_cover(State(state): State<AppState>, BookId(id): BookId) -> Result<Response, AppError> {
    let cover = state
        .db
        .store()
        .await?
        .get_cover(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("book {id} has no cover")))?;

    let mime = if is_raster_mime(&cover.mime) {
        cover.mime
    } else {
        FALLBACK_COVER_MIME.to_string()
    };

    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        cover.bytes,
    )
        .into_response())
}

pub async fn upload_cover(
    State(state): State<AppState>,
    BookId(id): BookId,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let form = BookForm::from_multipart(multipart).await?;
    let cover = form
        .cover
        .ok_or_else(|| AppError::bad_request("missing field: cover"))?;

    let updated = state.db.store().await?.update_cover(id, &cover).await?;
    if !updated {
        return Err(book_not_found(id));
    }

    info!(book_id = id, bytes = cover.bytes.len(), mime = %cover.mime, "uploaded cover");
    Ok(Redirect::to("/"))
}
