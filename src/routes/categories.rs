use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};

use super::{unprocessable, HtmlForm, Session};
use crate::db::TodoStore;
use crate::error::{AppError, Result};
use crate::models::{
    parse_id, Category, CategoryFilter, CategoryForm, ItemFilter, NewCategory, ValidationErrors,
};
use crate::views::{self, FormMode};
use crate::AppState;

const LIST_PATH: &str = "/Categories";

/// Load a category visible to `owner_id`; anything else is not found
async fn load_owned(store: &dyn TodoStore, id: u64, owner_id: &str) -> Result<Category> {
    store
        .get_category(id)
        .await?
        .filter(|c| c.is_owned_by(owner_id))
        .ok_or(AppError::NotFound)
}

/// GET /Categories
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Html<String>> {
    let categories = state
        .store
        .list_categories(CategoryFilter::owned_by(&session.owner_id))
        .await?;
    Ok(views::categories::index(&categories))
}

/// GET /Categories/Details/{id}
pub async fn details(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let category = load_owned(&*state.store, id, &session.owner_id).await?;
    let items = state
        .store
        .list_items(false, ItemFilter::default().in_category(id))
        .await?;
    Ok(views::categories::details(&category, &items))
}

/// GET /Categories/Create
pub async fn create_form(session: Session) -> Html<String> {
    views::categories::form(
        FormMode::Create,
        &CategoryForm::default(),
        &ValidationErrors::new(),
        &session.form_token,
    )
}

/// POST /Categories/Create
///
/// The owner is bound from the session, never from the submitted form.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    HtmlForm(form): HtmlForm<CategoryForm>,
) -> Result<Response> {
    session.verify_form(&state.config, &form.token)?;

    let title = match form.validate() {
        Ok(title) => title,
        Err(errors) => {
            return Ok(unprocessable(views::categories::form(
                FormMode::Create,
                &form,
                &errors,
                &session.form_token,
            )))
        }
    };

    let category = state
        .store
        .insert_category(NewCategory {
            title,
            owner_id: session.owner_id.clone(),
        })
        .await?;
    tracing::info!("Category {} created by {}", category.id, session.owner_id);

    Ok(Redirect::to(LIST_PATH).into_response())
}

/// GET /Categories/Edit/{id}
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let category = load_owned(&*state.store, id, &session.owner_id).await?;
    Ok(views::categories::form(
        FormMode::Edit(id),
        &CategoryForm::from_category(&category),
        &ValidationErrors::new(),
        &session.form_token,
    ))
}

/// POST /Categories/Edit/{id}
///
/// A conflicting concurrent update is not retried: if the category is gone
/// the caller gets not-found, otherwise the conflict propagates.
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    HtmlForm(form): HtmlForm<CategoryForm>,
) -> Result<Response> {
    session.verify_form(&state.config, &form.token)?;

    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    if form.body_id() != Some(id) {
        return Err(AppError::NotFound);
    }
    // Without the loaded version there is no record to update against
    let version = form.version().ok_or(AppError::NotFound)?;

    let existing = load_owned(&*state.store, id, &session.owner_id).await?;

    let title = match form.validate() {
        Ok(title) => title,
        Err(errors) => {
            return Ok(unprocessable(views::categories::form(
                FormMode::Edit(id),
                &form,
                &errors,
                &session.form_token,
            )))
        }
    };

    let edited = Category {
        title,
        version,
        ..existing
    };

    match state.store.update_category(edited).await {
        Ok(updated) => {
            tracing::info!("Category {} updated to version {}", id, updated.version);
        }
        Err(AppError::Conflict) => {
            if !state.store.category_exists(id).await? {
                return Err(AppError::NotFound);
            }
            tracing::warn!("Concurrent update of category {}", id);
            return Err(AppError::Conflict);
        }
        Err(e) => return Err(e),
    }

    Ok(Redirect::to(LIST_PATH).into_response())
}

/// GET /Categories/Delete/{id}
pub async fn delete_confirm(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let category = load_owned(&*state.store, id, &session.owner_id).await?;
    let item_count = state
        .store
        .list_items(false, ItemFilter::default().in_category(id))
        .await?
        .len();
    Ok(views::categories::delete_confirm(
        &category,
        item_count,
        &session.form_token,
    ))
}

/// POST /Categories/Delete/{id}
///
/// Removes the category and its items. Already-gone ids redirect without error.
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    HtmlForm(form): HtmlForm<CategoryForm>,
) -> Result<Redirect> {
    session.verify_form(&state.config, &form.token)?;

    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(LIST_PATH));
    };

    match load_owned(&*state.store, id, &session.owner_id).await {
        Ok(_) => {
            if state.store.delete_category(id).await? {
                tracing::info!("Category {} deleted by {}", id, session.owner_id);
            }
        }
        Err(AppError::NotFound) => {
            tracing::debug!("Delete of missing category {} ignored", id);
        }
        Err(e) => return Err(e),
    }

    Ok(Redirect::to(LIST_PATH))
}
