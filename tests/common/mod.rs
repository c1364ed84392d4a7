//! Shared harness for the route tests: a router over a throwaway database and
//! a small multipart body builder.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use bookshop::db::Database;
use bookshop::handler::AppState;
use bookshop::model::{Book, BookFields, Cover};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----bookshop-test-boundary";

pub struct TestApp {
    _dir: TempDir,
    pub db: Arc<Database>,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_upload_limit(bookshop::DEFAULT_UPLOAD_LIMIT).await
    }

    pub async fn with_upload_limit(limit: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open(&dir.path().join("books.sqlite")).await.unwrap());
        let router = bookshop::router(AppState { db: db.clone() }, limit);
        TestApp { _dir: dir, db, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, form: Multipart) -> Response<Body> {
        self.send(form.into_request(uri)).await
    }

    pub async fn seed(&self, title: &str, cover: Option<Cover>) -> i64 {
        let fields = BookFields {
            title: title.to_string(),
            author: "Seeded Author".to_string(),
            year: 1990,
            publisher: "Seed Press".to_string(),
            copies: 1,
        };
        self.db
            .store()
            .await
            .unwrap()
            .insert_book(&fields, cover.as_ref())
            .await
            .unwrap()
    }

    pub async fn books(&self) -> Vec<Book> {
        self.db.store().await.unwrap().list_books().await.unwrap()
    }

    pub async fn cover(&self, id: i64) -> Option<Cover> {
        self.db.store().await.unwrap().get_cover(id).await.unwrap()
    }
}

#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    /// A complete add/edit form with the given title.
    pub fn book(title: &str) -> Self {
        Self::new()
            .text("title", title)
            .text("author", "Test Author")
            .text("year", "2020")
            .text("publisher", "Test Press")
            .text("copies", "2")
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// What a browser sends for a file input left empty.
    pub fn empty_file(self, name: &str) -> Self {
        self.file(name, "", "application/octet-stream", b"")
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn assert_redirect(response: &Response<Body>, location: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        location
    );
}
