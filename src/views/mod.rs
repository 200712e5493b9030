//! Server-rendered HTML pages
//!
//! Pages are plain strings wrapped in [`Html`]; every interpolated value goes
//! through [`escape`].

pub mod categories;
pub mod items;

use axum::response::Html;
use chrono::{DateTime, Utc};

use crate::constants::FORM_TOKEN_FIELD;
use crate::models::ValidationErrors;

/// Whether a form creates a new record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(u64),
}

impl FormMode {
    fn heading(self) -> &'static str {
        match self {
            FormMode::Create => "Create",
            FormMode::Edit(_) => "Edit",
        }
    }

    fn action(self, section: &str) -> String {
        match self {
            FormMode::Create => format!("/{}/Create", section),
            FormMode::Edit(id) => format!("/{}/Edit/{}", section, id),
        }
    }
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Wrap page content in the shared document layout
pub fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - ToDoList</title>
</head>
<body>
<nav><a href="/Items">Items</a> | <a href="/Categories">Categories</a></nav>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        body = body,
    ))
}

/// Generic error page used by the error handler
pub fn error_page(title: &str, message: &str) -> Html<String> {
    layout(
        title,
        &format!("<h1>{}</h1>\n<p>{}</p>", escape(title), escape(message)),
    )
}

fn token_input(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        FORM_TOKEN_FIELD,
        escape(token)
    )
}

fn field_error(errors: &ValidationErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|message| {
            format!(
                r#"<span class="field-validation-error" data-field="{}">{}</span>"#,
                field,
                escape(message)
            )
        })
        .unwrap_or_default()
}

fn hidden_input(name: &str, value: Option<&str>) -> String {
    value
        .map(|v| format!(r#"<input type="hidden" name="{}" value="{}">"#, name, escape(v)))
        .unwrap_or_default()
}
