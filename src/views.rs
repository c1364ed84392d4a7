use axum::response::Html;

use crate::assets::template;
use crate::error::AppError;
use crate::model::{Book, EditView, StockSummary};

pub fn render_list(books: &[Book]) -> Result<Html<String>, AppError> {
    let row_template = template("book_row.html")?;
    let summary = StockSummary::from_books(books);

    let mut rows = String::new();
    for book in books {
        let mut vars = book_vars(book);
        vars.push(("cover", cover_markup(book)));
        rows.push_str(&fill(&row_template, &vars));
    }

    let page = template("list.html")?;
    Ok(Html(fill(
        &page,
        &[
            ("rows", rows),
            ("titles", summary.titles.to_string()),
            ("copies", summary.copies.to_string()),
        ],
    )))
}

pub fn render_edit(view: &EditView) -> Result<Html<String>, AppError> {
    let page = template("edit.html")?;
    let mut vars = book_vars(&view.book);
    let checked = if view.keep_existing_cover { " checked" } else { "" };
    vars.push(("keep_cover", checked.to_string()));
    Ok(Html(fill(&page, &vars)))
}

pub fn render_add() -> Result<Html<String>, AppError> {
    Ok(Html(template("add.html")?.into_owned()))
}

fn book_vars(book: &Book) -> Vec<(&'static str, String)> {
    vec![
        ("id", book.id.to_string()),
        ("title", escape_html(&book.title)),
        ("author", escape_html(&book.author)),
        ("year", book.year.to_string()),
        ("publisher", escape_html(&book.publisher)),
        ("copies", book.copies.to_string()),
    ]
}

fn cover_markup(book: &Book) -> String {
    if book.has_cover {
        format!(
            r#"<img src="/cover/{id}" alt="{title} Cover" width="100" class="book-cover" data-book-id="{id}">"#,
            id = book.id,
            title = escape_html(&book.title),
        )
    } else {
        r#"<span class="no-cover">No cover</span>"#.to_string()
    }
}

/// Replaces `{{name}}` placeholders in one pass. Values are inserted as given,
/// so callers escape them first; unknown placeholders are left untouched.
fn fill(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after[..end].trim();
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
