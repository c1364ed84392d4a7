use axum::extract::Multipart;

use crate::error::AppError;
use crate::model::{BookFields, Cover};

/// A decoded book form. Text fields are kept raw until `fields()` validates
/// them so the error can name the offending field.
#[derive(Debug, Default)]
pub struct BookForm {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
    pub publisher: Option<String>,
    pub copies: Option<String>,
    pub cover: Option<Cover>,
    pub keep_cover: bool,
}

impl BookForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = BookForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "cover" => {
                    let file_name = field.file_name().map(str::to_owned);
                    let content_type = field.content_type().map(str::to_owned);
                    let data = field.bytes().await?;

                    // Browsers send an empty part when no file was picked.
                    if data.is_empty() {
                        continue;
                    }

                    tracing::debug!(bytes = data.len(), file_name = ?file_name, "received cover upload");
                    form.cover = Some(Cover::from_upload(
                        data.to_vec(),
                        content_type.as_deref(),
                        file_name.as_deref(),
                    ));
                }
                "keep_cover" => form.keep_cover = is_checked(&field.text().await?),
                "id" => form.id = Some(field.text().await?),
                "title" => form.title = Some(field.text().await?),
                "author" => form.author = Some(field.text().await?),
                "year" => form.year = Some(field.text().await?),
                "publisher" => form.publisher = Some(field.text().await?),
                "copies" => form.copies = Some(field.text().await?),
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Validates the scalar fields. All five are required; `year` and
    /// `copies` must be whole numbers.
    pub fn fields(&self) -> Result<BookFields, AppError> {
        Ok(BookFields {
            title: required("title", &self.title)?.to_string(),
            author: required("author", &self.author)?.to_string(),
            year: whole_number("year", &self.year)?,
            publisher: required("publisher", &self.publisher)?.to_string(),
            copies: whole_number("copies", &self.copies)?,
        })
    }

    /// Checks the hidden `id` field of the edit form against the id in the
    /// path. A form without one is accepted.
    pub fn check_id(&self, path_id: i64) -> Result<(), AppError> {
        let Some(raw) = &self.id else {
            return Ok(());
        };

        match raw.trim().parse::<i64>() {
            Ok(id) if id == path_id => Ok(()),
            Ok(id) => Err(AppError::bad_request(format!(
                "form id {id} does not match book {path_id}"
            ))),
            Err(_) => Err(AppError::bad_request("id must be a whole number")),
        }
    }
}

fn required<'a>(name: &str, value: &'a Option<String>) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .ok_or_else(|| AppError::bad_request(format!("missing field: {name}")))
}

fn whole_number(name: &str, value: &Option<String>) -> Result<i64, AppError> {
    required(name, value)?
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::bad_request(format!("{name} must be a whole number")))
}

fn is_checked(value: &str) -> bool {
    matches!(value.trim(), "on" | "true" | "1")
}
