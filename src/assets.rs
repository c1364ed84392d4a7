use std::borrow::Cow;

use axum::{
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;

use crate::error::AppError;

#[derive(Embed)]
#[folder = "web/templates"]
pub struct Templates;

#[derive(Embed)]
#[folder = "web/static"]
pub struct Static;

/// Loads an embedded template as text.
pub fn template(name: &str) -> Result<Cow<'static, str>, AppError> {
    let file = Templates::get(name)
        .ok_or_else(|| anyhow::anyhow!("template {name} is not embedded"))?;

    match file.data {
        Cow::Borrowed(bytes) => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("template {name} is not utf-8: {e}"))),
        Cow::Owned(bytes) => String::from_utf8(bytes)
            .map(Cow::Owned)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("template {name} is not utf-8: {e}"))),
    }
}

pub async fn serve_static(Path(path): Path<String>) -> Response {
    match Static::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
