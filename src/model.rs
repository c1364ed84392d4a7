pub const DEFAULT_COVER_MIME: &str = "image/jpeg";
pub const FALLBACK_COVER_MIME: &str = "application/octet-stream";

/// Cover types served back inline. Scriptable formats such as SVG are not on
/// the list.
const RASTER_COVER_MIMES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

pub fn is_raster_mime(mime: &str) -> bool {
    RASTER_COVER_MIMES.contains(&mime)
}

/// A catalog entry as read back from the store. Cover bytes are never loaded
/// with the record; `has_cover` tells the views whether `/cover/{id}` has
/// anything to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i64,
    pub publisher: String,
    pub copies: i64,
    pub has_cover: bool,
}

/// The operator-supplied scalar fields. Every insert and update writes all of
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub publisher: String,
    pub copies: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Cover {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Picks the MIME type to record for an uploaded cover: the declared
    /// content type, then a guess from the file name, then JPEG. Anything
    /// that is not a raster image is stored as an opaque octet stream.
    pub fn from_upload(bytes: Vec<u8>, content_type: Option<&str>, file_name: Option<&str>) -> Self {
        let declared = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty() && ct != FALLBACK_COVER_MIME);
        let guessed = || {
            file_name
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|mime| mime.essence_str().to_owned())
        };

        let mime = declared
            .or_else(guessed)
            .unwrap_or_else(|| DEFAULT_COVER_MIME.to_owned());

        if is_raster_mime(&mime) {
            Cover::new(bytes, mime)
        } else {
            Cover::new(bytes, FALLBACK_COVER_MIME)
        }
    }
}

/// What an update does with the stored cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverUpdate {
    Replace(Cover),
    Keep,
    Clear,
}

impl CoverUpdate {
    /// A freshly uploaded file wins, then the keep directive; otherwise the
    /// cover is cleared.
    pub fn resolve(upload: Option<Cover>, keep_existing: bool) -> Self {
        match (upload, keep_existing) {
            (Some(cover), _) => CoverUpdate::Replace(cover),
            (None, true) => CoverUpdate::Keep,
            (None, false) => CoverUpdate::Clear,
        }
    }
}

/// Data handed to the edit view.
#[derive(Debug, Clone)]
pub struct EditView {
    pub book: Book,
    pub keep_existing_cover: bool,
}

impl From<Book> for EditView {
    fn from(book: Book) -> Self {
        EditView {
            book,
            keep_existing_cover: true,
        }
    }
}

/// Header counters on the list page: titles with at least one copy in stock
/// and the total number of those copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockSummary {
    pub titles: usize,
    pub copies: i64,
}

impl StockSummary {
    pub fn from_books(books: &[Book]) -> Self {
        books
            .iter()
            .filter(|book| book.copies > 0)
            .fold(StockSummary::default(), |acc, book| StockSummary {
                titles: acc.titles + 1,
                copies: acc.copies.saturating_add(book.copies),
            })
    }
}
