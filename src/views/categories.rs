use axum::response::Html;

use super::{escape, field_error, hidden_input, layout, timestamp_to_rfc3339, token_input, FormMode};
use crate::models::{Category, CategoryForm, Item, ValidationErrors};

pub fn index(categories: &[Category]) -> Html<String> {
    let mut rows = String::new();
    for c in categories {
        rows.push_str(&format!(
            r#"<tr><td>{title}</td><td><a href="/Categories/Edit/{id}">Edit</a> | <a href="/Categories/Details/{id}">Details</a> | <a href="/Categories/Delete/{id}">Delete</a></td></tr>
"#,
            title = escape(&c.title),
            id = c.id,
        ));
    }

    layout(
        "Categories",
        &format!(
            r#"<h1>Categories</h1>
<p><a href="/Categories/Create">Create New</a></p>
<table>
<thead><tr><th>Title</th><th></th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
        ),
    )
}

pub fn details(category: &Category, items: &[Item]) -> Html<String> {
    let mut list = String::new();
    for item in items {
        list.push_str(&format!(
            r#"<li><a href="/Items/Details/{}">{}</a>{}</li>
"#,
            item.id,
            escape(&item.title),
            if item.is_complete { " (done)" } else { "" },
        ));
    }

    layout(
        "Category Details",
        &format!(
            r#"<h1>Details</h1>
<dl>
<dt>Title</dt><dd>{title}</dd>
<dt>Created</dt><dd>{created}</dd>
<dt>Updated</dt><dd>{updated}</dd>
</dl>
<h2>Items</h2>
<ul>
{list}</ul>
<p><a href="/Categories/Edit/{id}">Edit</a> | <a href="/Categories">Back to List</a></p>"#,
            title = escape(&category.title),
            created = timestamp_to_rfc3339(category.created_at),
            updated = timestamp_to_rfc3339(category.updated_at),
            id = category.id,
        ),
    )
}

/// Create or edit form, echoing submitted values and field errors
pub fn form(
    mode: FormMode,
    form: &CategoryForm,
    errors: &ValidationErrors,
    token: &str,
) -> Html<String> {
    let hidden = match mode {
        FormMode::Create => String::new(),
        FormMode::Edit(_) => format!(
            "{}{}",
            hidden_input("id", form.id.as_deref()),
            hidden_input("version", form.version.as_deref())
        ),
    };

    layout(
        &format!("{} Category", mode.heading()),
        &format!(
            r#"<h1>{heading}</h1>
<h4>Category</h4>
<form method="post" action="{action}">
{token}
{hidden}
<div>
<label for="title">Title</label>
<input id="title" name="title" value="{title}">
{title_error}
</div>
<div><input type="submit" value="{submit}"></div>
</form>
<p><a href="/Categories">Back to List</a></p>"#,
            heading = mode.heading(),
            action = mode.action("Categories"),
            token = token_input(token),
            title = escape(&form.title),
            title_error = field_error(errors, "title"),
            submit = if mode == FormMode::Create { "Create" } else { "Save" },
        ),
    )
}

/// Confirmation page; the cascade count warns how many items go with it
pub fn delete_confirm(category: &Category, item_count: usize, token: &str) -> Html<String> {
    layout(
        "Delete Category",
        &format!(
            r#"<h1>Delete</h1>
<h3>Are you sure you want to delete this?</h3>
<dl>
<dt>Title</dt><dd>{title}</dd>
</dl>
<p>This will also delete {count} item(s) in this category.</p>
<form method="post" action="/Categories/Delete/{id}">
{token}
<input type="submit" value="Delete"> | <a href="/Categories">Back to List</a>
</form>"#,
            title = escape(&category.title),
            count = item_count,
            id = category.id,
            token = token_input(token),
        ),
    )
}
