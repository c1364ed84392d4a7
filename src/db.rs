use crate::model::*;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;

const SCHEMA: &str = include_str!("sql/schema.sql");
const BUSY_TIMEOUT_MS: u32 = 5_000;

const BOOK_COLUMNS: &str = r#"
    id,
    title,
    author,
    year,
    publisher,
    copies,
    CASE WHEN cover IS NOT NULL AND length(cover) > 0 THEN 1 ELSE 0 END AS has_cover
"#;

pub struct Database {
    db: LibsqlDatabase,
}

impl Database {
    /// Opens (or creates) the database file and makes sure the `books` table
    /// exists.
    pub async fn open(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| anyhow::anyhow!("failed to open database {}: {e}", path.display()))?;

        let conn = db.connect()?;
        pragma(&conn, "PRAGMA journal_mode = WAL").await?;
        conn.execute_batch(SCHEMA)
            .await
            .map_err(|e| anyhow::anyhow!("failed to create books table: {e}"))?;
        ensure_cover_mime_column(&conn).await?;

        tracing::info!(path = %path.display(), "[db] books table ready");
        Ok(Database { db })
    }

    /// A fresh connection for the lifetime of one request.
    pub async fn store(&self) -> Result<BookStore> {
        let conn = self.db.connect()?;
        pragma(&conn, &format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}")).await?;
        Ok(BookStore { conn })
    }
}

/// Tables created before covers carried a MIME type lack `cover_mime`; add it
/// in place so those files stay usable.
async fn ensure_cover_mime_column(conn: &Connection) -> Result<()> {
    let mut rows = conn.query("PRAGMA table_info(books)", ()).await?;
    let mut present = false;
    while let Some(row) = rows.next().await? {
        let name: String = row.get(1)?;
        if name == "cover_mime" {
            present = true;
        }
    }

    if !present {
        tracing::info!("[db] adding cover_mime column to books");
        conn.execute("ALTER TABLE books ADD COLUMN cover_mime TEXT", ())
            .await
            .map_err(|e| anyhow::anyhow!("failed to add cover_mime column: {e}"))?;
    }
    Ok(())
}

async fn pragma(conn: &Connection, sql: &str) -> Result<()> {
    let mut rows = conn.query(sql, ()).await?;
    while rows.next().await?.is_some() {}
    Ok(())
}

pub struct BookStore {
    conn: Connection,
}

impl BookStore {
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY title");
        let mut rows = self.conn.query(&query, ()).await?;

        let mut books = Vec::new();
        while let Some(row) = rows.next().await? {
            books.push(row_to_book(&row)?);
        }
        Ok(books)
    }

    pub async fn list_books_page(&self, limit: i64, offset: i64) -> Result<Vec<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY title LIMIT ? OFFSET ?");
        let mut rows = self
            .conn
            .query(&query, libsql::params![limit.max(0), offset.max(0)])
            .await?;

        let mut books = Vec::new();
        while let Some(row) = rows.next().await? {
            books.push(row_to_book(&row)?);
        }
        Ok(books)
    }

    pub async fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row_to_book(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn insert_book(&self, fields: &BookFields, cover: Option<&Cover>) -> Result<i64> {
        let query = r#"
            INSERT INTO books (title, author, year, publisher, copies, cover, cover_mime)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
        "#;

        let cover_bytes = cover.map(|c| c.bytes.clone());
        let cover_mime = cover.map(|c| c.mime.clone());

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![
                    fields.title.as_str(),
                    fields.author.as_str(),
                    fields.year,
                    fields.publisher.as_str(),
                    fields.copies,
                    cover_bytes,
                    cover_mime
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(row.get(0)?)
        } else {
            anyhow::bail!("Failed to create book: {}", fields.title)
        }
    }

    /// Overwrites every scalar field of the book. Returns `false` when no row
    /// has this id.
    pub async fn update_book(&self, id: i64, fields: &BookFields, cover: CoverUpdate) -> Result<bool> {
        let affected = match cover {
            CoverUpdate::Replace(cover) => {
                self.conn
                    .execute(
                        r#"
                        UPDATE books
                        SET title = ?, author = ?, year = ?, publisher = ?, copies = ?, cover = ?, cover_mime = ?
                        WHERE id = ?
                        "#,
                        libsql::params![
                            fields.title.as_str(),
                            fields.author.as_str(),
                            fields.year,
                            fields.publisher.as_str(),
                            fields.copies,
                            cover.bytes,
                            cover.mime,
                            id
                        ],
                    )
                    .await?
            }
            CoverUpdate::Keep => {
                self.conn
                    .execute(
                        r#"
                        UPDATE books
                        SET title = ?, author = ?, year = ?, publisher = ?, copies = ?
                        WHERE id = ?
                        "#,
                        libsql::params![
                            fields.title.as_str(),
                            fields.author.as_str(),
                            fields.year,
                            fields.publisher.as_str(),
                            fields.copies,
                            id
                        ],
                    )
                    .await?
            }
            CoverUpdate::Clear => {
                self.conn
                    .execute(
                        r#"
                        UPDATE books
                        SET title = ?, author = ?, year = ?, publisher = ?, copies = ?, cover = NULL, cover_mime = NULL
                        WHERE id = ?
                        "#,
                        libsql::params![
                            fields.title.as_str(),
                            fields.author.as_str(),
                            fields.year,
                            fields.publisher.as_str(),
                            fields.copies,
                            id
                        ],
                    )
                    .await?
            }
        };

        Ok(affected > 0)
    }

    pub async fn delete_book(&self, id: i64) -> Result<bool> {
        let result = self
            .conn
            .execute("DELETE FROM books WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }

    /// `None` when the book does not exist or has no cover stored.
    pub async fn get_cover(&self, id: i64) -> Result<Option<Cover>> {
        let mut rows = self
            .conn
            .query("SELECT cover, cover_mime FROM books WHERE id = ?", libsql::params![id])
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let bytes = row.get::<Option<Vec<u8>>>(0)?.unwrap_or_default();
        if bytes.is_empty() {
            return Ok(None);
        }

        let mime = match row.get::<Option<String>>(1)?.filter(|m| !m.is_empty()) {
            None => DEFAULT_COVER_MIME.to_string(),
            Some(m) if is_raster_mime(&m) => m,
            Some(_) => FALLBACK_COVER_MIME.to_string(),
        };

        Ok(Some(Cover { bytes, mime }))
    }

    pub async fn update_cover(&self, id: i64, cover: &Cover) -> Result<bool> {
        let result = self
            .conn
            .execute(
                "UPDATE books SET cover = ?, cover_mime = ? WHERE id = ?",
                libsql::params![cover.bytes.clone(), cover.mime.as_str(), id],
            )
            .await?;
        Ok(result > 0)
    }
}

fn row_to_book(row: &libsql::Row) -> Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get::<Option<String>>(1)?.unwrap_or_default(),
        author: row.get::<Option<String>>(2)?.unwrap_or_default(),
        year: row.get::<Option<i64>>(3)?.unwrap_or(0),
        publisher: row.get::<Option<String>>(4)?.unwrap_or_default(),
        copies: row.get::<Option<i64>>(5)?.unwrap_or(0),
        has_cover: row.get::<i64>(6)? != 0,
    })
}
