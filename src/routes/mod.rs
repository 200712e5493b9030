pub mod categories;
pub mod form;
pub mod health;
pub mod items;
pub mod session;

pub use form::HtmlForm;
pub use health::health_check;
pub use session::Session;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::AppState;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let log_requests = state.config.log_requests;

    let router = Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/Categories", get(categories::index))
        .route("/Categories/Details/{id}", get(categories::details))
        .route(
            "/Categories/Create",
            get(categories::create_form).post(categories::create),
        )
        .route(
            "/Categories/Edit/{id}",
            get(categories::edit_form).post(categories::edit),
        )
        .route(
            "/Categories/Delete/{id}",
            get(categories::delete_confirm).post(categories::delete),
        )
        .route("/Items", get(items::index))
        .route("/Items/Details/{id}", get(items::details))
        .route("/Items/Create", get(items::create_form).post(items::create))
        .route("/Items/Edit/{id}", get(items::edit_form).post(items::edit))
        .route(
            "/Items/Delete/{id}",
            get(items::delete_confirm).post(items::delete),
        )
        .fallback(not_found)
        .with_state(state);

    if log_requests {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

async fn home() -> Redirect {
    Redirect::to("/Items")
}

/// Unknown paths, including detail/edit/delete routes without an id
async fn not_found() -> AppError {
    AppError::NotFound
}

/// Re-rendered form after failed validation
pub(crate) fn unprocessable(page: Html<String>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}
