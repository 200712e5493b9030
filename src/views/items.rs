use axum::response::Html;

use super::{escape, field_error, hidden_input, layout, timestamp_to_rfc3339, token_input, FormMode};
use crate::models::{Item, ItemForm, SelectOption, ValidationErrors};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub fn index(items: &[Item]) -> Html<String> {
    let mut rows = String::new();
    for item in items {
        rows.push_str(&format!(
            r#"<tr><td>{title}</td><td>{complete}</td><td>{category}</td><td><a href="/Items/Edit/{id}">Edit</a> | <a href="/Items/Details/{id}">Details</a> | <a href="/Items/Delete/{id}">Delete</a></td></tr>
"#,
            title = escape(&item.title),
            complete = yes_no(item.is_complete),
            category = escape(item.category_title()),
            id = item.id,
        ));
    }

    layout(
        "Items",
        &format!(
            r#"<h1>To Do Items</h1>
<p><a href="/Items/Create">Create New</a></p>
<table>
<thead><tr><th>Title</th><th>Is Complete</th><th>Category</th><th></th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
        ),
    )
}

pub fn details(item: &Item) -> Html<String> {
    layout(
        "Item Details",
        &format!(
            r#"<h1>Details</h1>
<dl>
<dt>Title</dt><dd>{title}</dd>
<dt>Is Complete</dt><dd>{complete}</dd>
<dt>Category</dt><dd><a href="/Categories/Details/{category_id}">{category}</a></dd>
<dt>Created</dt><dd>{created}</dd>
<dt>Updated</dt><dd>{updated}</dd>
</dl>
<p><a href="/Items/Edit/{id}">Edit</a> | <a href="/Items">Back to List</a></p>"#,
            title = escape(&item.title),
            complete = yes_no(item.is_complete),
            category_id = item.category_id,
            category = escape(item.category_title()),
            created = timestamp_to_rfc3339(item.created_at),
            updated = timestamp_to_rfc3339(item.updated_at),
            id = item.id,
        ),
    )
}

fn select(options: &[SelectOption]) -> String {
    let mut out = String::from(r#"<select id="category_id" name="category_id">"#);
    for option in options {
        out.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            option.value,
            if option.selected { " selected" } else { "" },
            escape(&option.text)
        ));
    }
    out.push_str("</select>");
    out
}

/// Create or edit form with the category drop-down
pub fn form(
    mode: FormMode,
    form: &ItemForm,
    options: &[SelectOption],
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
        &format!("{} Item", mode.heading()),
        &format!(
            r#"<h1>{heading}</h1>
<h4>ToDoItem</h4>
<form method="post" action="{action}">
{token}
{hidden}
<div>
<label for="title">Title</label>
<input id="title" name="title" value="{title}">
{title_error}
</div>
<div>
<label><input type="checkbox" name="is_complete" value="true"{checked}> Is Complete</label>
</div>
<div>
<label for="category_id">Category</label>
{select}
{category_error}
</div>
<div><input type="submit" value="{submit}"></div>
</form>
<p><a href="/Items">Back to List</a></p>"#,
            heading = mode.heading(),
            action = mode.action("Items"),
            token = token_input(token),
            title = escape(&form.title),
            title_error = field_error(errors, "title"),
            checked = if form.is_checked() { " checked" } else { "" },
            select = select(options),
            category_error = field_error(errors, "category_id"),
            submit = if mode == FormMode::Create { "Create" } else { "Save" },
        ),
    )
}

pub fn delete_confirm(item: &Item, token: &str) -> Html<String> {
    layout(
        "Delete Item",
        &format!(
            r#"<h1>Delete</h1>
<h3>Are you sure you want to delete this?</h3>
<dl>
<dt>Title</dt><dd>{title}</dd>
<dt>Is Complete</dt><dd>{complete}</dd>
<dt>Category</dt><dd>{category}</dd>
</dl>
<form method="post" action="/Items/Delete/{id}">
{token}
<input type="submit" value="Delete"> | <a href="/Items">Back to List</a>
</form>"#,
            title = escape(&item.title),
            complete = yes_no(item.is_complete),
            category = escape(item.category_title()),
            id = item.id,
            token = token_input(token),
        ),
    )
}
