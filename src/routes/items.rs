use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};

use super::{unprocessable, HtmlForm, Session};
use crate::constants::err_category_unknown;
use crate::db::TodoStore;
use crate::error::{AppError, Result};
use crate::models::{
    category_select_list, parse_id, Category, CategoryFilter, Item, ItemFilter, ItemForm,
    ValidItem, ValidationErrors,
};
use crate::views::{self, FormMode};
use crate::AppState;

const LIST_PATH: &str = "/Items";

/// Load an item whose category belongs to `owner_id`
async fn load_owned(store: &dyn TodoStore, id: u64, owner_id: &str) -> Result<Item> {
    store
        .get_item(id, true)
        .await?
        .filter(|item| item.is_owned_by(owner_id))
        .ok_or(AppError::NotFound)
}

async fn owned_categories(store: &dyn TodoStore, owner_id: &str) -> Result<Vec<Category>> {
    store
        .list_categories(CategoryFilter::owned_by(owner_id))
        .await
}

/// Validate a submitted item form against the categories the user may pick
///
/// A category id outside `categories` is reported as nonexistent, whether it
/// was never created or belongs to someone else.
pub fn check_form(
    form: &ItemForm,
    categories: &[Category],
) -> std::result::Result<ValidItem, ValidationErrors> {
    let valid = form.validate()?;
    if categories.iter().any(|c| c.id == valid.category_id) {
        Ok(valid)
    } else {
        let mut errors = ValidationErrors::new();
        errors.add("category_id", err_category_unknown(valid.category_id));
        Err(errors)
    }
}

/// Re-render a rejected form with a freshly built category list
fn invalid_form(
    mode: FormMode,
    form: &ItemForm,
    categories: &[Category],
    errors: &ValidationErrors,
    session: &Session,
) -> Response {
    let options = category_select_list(categories, form.selected_category());
    unprocessable(views::items::form(
        mode,
        form,
        &options,
        errors,
        &session.form_token,
    ))
}

/// GET /Items
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Html<String>> {
    let items = state
        .store
        .list_items(true, ItemFilter::owned_by(&session.owner_id))
        .await?;
    Ok(views::items::index(&items))
}

/// GET /Items/Details/{id}
pub async fn details(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let item = load_owned(&*state.store, id, &session.owner_id).await?;
    Ok(views::items::details(&item))
}

/// GET /Items/Create
pub async fn create_form(State(state): State<AppState>, session: Session) -> Result<Html<String>> {
    let categories = owned_categories(&*state.store, &session.owner_id).await?;
    Ok(views::items::form(
        FormMode::Create,
        &ItemForm::default(),
        &category_select_list(&categories, None),
        &ValidationErrors::new(),
        &session.form_token,
    ))
}

/// POST /Items/Create
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    HtmlForm(form): HtmlForm<ItemForm>,
) -> Result<Response> {
    session.verify_form(&state.config, &form.token)?;

    let categories = owned_categories(&*state.store, &session.owner_id).await?;
    let valid = match check_form(&form, &categories) {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(invalid_form(
                FormMode::Create,
                &form,
                &categories,
                &errors,
                &session,
            ))
        }
    };

    match state.store.insert_item(valid.into()).await {
        Ok(item) => {
            tracing::info!("Item {} created in category {}", item.id, item.category_id);
        }
        Err(AppError::CategoryNotFound(category_id)) => {
            // Category was deleted between validation and insert
            let mut errors = ValidationErrors::new();
            errors.add("category_id", err_category_unknown(category_id));
            let categories = owned_categories(&*state.store, &session.owner_id).await?;
            return Ok(invalid_form(
                FormMode::Create,
                &form,
                &categories,
                &errors,
                &session,
            ));
        }
        Err(e) => return Err(e),
    }

    Ok(Redirect::to(LIST_PATH).into_response())
}

/// GET /Items/Edit/{id}
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let item = load_owned(&*state.store, id, &session.owner_id).await?;
    let categories = owned_categories(&*state.store, &session.owner_id).await?;

    Ok(views::items::form(
        FormMode::Edit(id),
        &ItemForm::from_item(&item),
        &category_select_list(&categories, Some(item.category_id)),
        &ValidationErrors::new(),
        &session.form_token,
    ))
}

/// POST /Items/Edit/{id}
///
/// Same conflict policy as categories: re-check existence, then fail loudly.
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    HtmlForm(form): HtmlForm<ItemForm>,
) -> Result<Response> {
    session.verify_form(&state.config, &form.token)?;

    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    if form.body_id() != Some(id) {
        return Err(AppError::NotFound);
    }
    // Without the loaded version there is no record to update against
    let version = form.version().ok_or(AppError::NotFound)?;

    let existing = load_owned(&*state.store, id, &session.owner_id).await?;
    let categories = owned_categories(&*state.store, &session.owner_id).await?;

    let valid = match check_form(&form, &categories) {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(invalid_form(
                FormMode::Edit(id),
                &form,
                &categories,
                &errors,
                &session,
            ))
        }
    };

    let edited = Item {
        title: valid.title,
        is_complete: valid.is_complete,
        category_id: valid.category_id,
        version,
        ..existing
    };

    match state.store.update_item(edited).await {
        Ok(updated) => {
            tracing::info!("Item {} updated to version {}", id, updated.version);
        }
        Err(AppError::Conflict) => {
            if !state.store.item_exists(id).await? {
                return Err(AppError::NotFound);
            }
            tracing::warn!("Concurrent update of item {}", id);
            return Err(AppError::Conflict);
        }
        Err(AppError::CategoryNotFound(category_id)) => {
            let mut errors = ValidationErrors::new();
            errors.add("category_id", err_category_unknown(category_id));
            let categories = owned_categories(&*state.store, &session.owner_id).await?;
            return Ok(invalid_form(
                FormMode::Edit(id),
                &form,
                &categories,
                &errors,
                &session,
            ));
        }
        Err(e) => return Err(e),
    }

    Ok(Redirect::to(LIST_PATH).into_response())
}

/// GET /Items/Delete/{id}
pub async fn delete_confirm(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let item = load_owned(&*state.store, id, &session.owner_id).await?;
    Ok(views::items::delete_confirm(&item, &session.form_token))
}

/// POST /Items/Delete/{id}
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    HtmlForm(form): HtmlForm<ItemForm>,
) -> Result<Redirect> {
    session.verify_form(&state.config, &form.token)?;

    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(LIST_PATH));
    };

    match load_owned(&*state.store, id, &session.owner_id).await {
        Ok(_) => {
            if state.store.delete_item(id).await? {
                tracing::info!("Item {} deleted by {}", id, session.owner_id);
            }
        }
        Err(AppError::NotFound) => {
            tracing::debug!("Delete of missing item {} ignored", id);
        }
        Err(e) => return Err(e),
    }

    Ok(Redirect::to(LIST_PATH))
}
