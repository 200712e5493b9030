//! Integration tests for the ToDoList server
//!
//! These tests drive the full router: identity header, anti-forgery token,
//! form handling, rendering and the redb store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use todo_list_server::{
    build_router, open_database,
    models::{Category, CategoryFilter, Item, ItemFilter, NewCategory, NewItem},
    security::form_token,
    AppError, AppState, Config, Db, Store, TodoStore,
};
use tower::ServiceExt;

// Test configuration constants
const TEST_SECRET: &str = "test-secret-key";
const IDENTITY_HEADER: &str = "x-forwarded-user";
const ALICE: &str = "alice";
const BOB: &str = "bob";

// =============================================================================
// Test Helpers
// =============================================================================

/// Create a test configuration
fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_path: "".to_string(), // Set per test via the temp dir
        environment: "test".to_string(),
        app_secret_key: TEST_SECRET.to_string(),
        identity_header: IDENTITY_HEADER.to_string(),
        log_requests: false,
    }
}

/// Create a test database in a temporary directory
fn create_test_db(temp_dir: &TempDir) -> Db {
    open_database(temp_dir.path().join("test.db")).expect("Failed to create test database")
}

/// Create a test app router
fn create_test_app(db: Db) -> Router {
    build_router(AppState::new(db, test_config()))
}

fn token(user: &str) -> String {
    form_token(user, TEST_SECRET).unwrap()
}

/// Create a GET request on behalf of `user`
fn make_get_request(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(IDENTITY_HEADER, user)
        .body(Body::empty())
        .unwrap()
}

/// Create a form POST on behalf of `user`, appending that user's token
fn make_form_request(uri: &str, user: &str, fields: &str) -> Request<Body> {
    let body = if fields.is_empty() {
        format!("__RequestVerificationToken={}", token(user))
    } else {
        format!("{}&__RequestVerificationToken={}", fields, token(user))
    };
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(IDENTITY_HEADER, user)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// Send a request and return status, Location header and body text
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, location, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn create_category(app: &Router, user: &str, title: &str) {
    let (status, location, _) = send(
        app,
        make_form_request("/Categories/Create", user, &format!("title={}", title)),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/Categories"));
}

async fn create_item(app: &Router, user: &str, title: &str, category_id: u64) {
    let (status, location, _) = send(
        app,
        make_form_request(
            "/Items/Create",
            user,
            &format!("title={}&category_id={}", title, category_id),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/Items"));
}

// =============================================================================
// Health & Identity Tests
// =============================================================================

#[tokio::test]
async fn test_health_check_returns_healthy() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    let request = Request::builder()
        .uri("/Categories")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, make_get_request("/Items", "   ")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_home_redirects_to_items() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    let (status, location, _) = send(&app, make_get_request("/", ALICE)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/Items"));
}

#[tokio::test]
async fn test_write_without_valid_token_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/Categories/Create")
        .header(IDENTITY_HEADER, ALICE)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("title=Work&__RequestVerificationToken=deadbeef"))
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A token issued to another user does not work either
    let request = Request::builder()
        .method("POST")
        .uri("/Categories/Create")
        .header(IDENTITY_HEADER, ALICE)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "title=Work&__RequestVerificationToken={}",
            token(BOB)
        )))
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let store = Store::new(db);
    assert!(store
        .list_categories(CategoryFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_forms_embed_token() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    let (status, _, body) = send(&app, make_get_request("/Categories/Create", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&token(ALICE)));
}

// =============================================================================
// Category Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_create_category_empty_title_rerenders_form() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    let (status, _, body) = send(
        &app,
        make_form_request("/Categories/Create", ALICE, "title="),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("The Title field is required."));
    assert!(body.contains(r#"name="title" value="""#));

    let store = Store::new(db);
    assert!(store
        .list_categories(CategoryFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_create_category_binds_owner_from_session() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    // A forged owner field in the body is ignored
    let (status, _, _) = send(
        &app,
        make_form_request("/Categories/Create", ALICE, "title=Work&owner_id=bob"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let store = Store::new(db);
    let category = store.get_category(1).await.unwrap().unwrap();
    assert_eq!(category.owner_id, ALICE);
    assert_eq!(category.title, "Work");
}

#[tokio::test]
async fn test_category_list_and_detail_are_user_scoped() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;
    create_category(&app, BOB, "Garden").await;

    let (status, _, body) = send(&app, make_get_request("/Categories", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Work"));
    assert!(!body.contains("Garden"));

    let (_, _, body) = send(&app, make_get_request("/Categories", BOB)).await;
    assert!(body.contains("Garden"));
    assert!(!body.contains("Work"));

    let (status, _, body) = send(&app, make_get_request("/Categories/Details/1", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Work"));

    let (status, _, _) = send(&app, make_get_request("/Categories/Details/1", BOB)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, make_get_request("/Categories/Edit/1", BOB)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_or_malformed_ids_are_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;

    for uri in [
        "/Categories/Details/2",
        "/Categories/Details/abc",
        "/Categories/Details/-1",
        "/Categories/Details",
        "/Categories/Edit/99",
        "/Categories/Delete/x",
        "/Items/Details/1",
        "/Items/Edit/",
    ] {
        let (status, _, _) = send(&app, make_get_request(uri, ALICE)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_edit_category_updates_title() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;

    let (status, _, body) = send(&app, make_get_request("/Categories/Edit/1", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="version" value="1""#));

    let (status, location, _) = send(
        &app,
        make_form_request("/Categories/Edit/1", ALICE, "id=1&title=Office&version=1"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/Categories"));

    let (_, _, body) = send(&app, make_get_request("/Categories/Details/1", ALICE)).await;
    assert!(body.contains("Office"));
}

#[tokio::test]
async fn test_edit_category_id_mismatch_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;
    create_category(&app, ALICE, "Home").await;

    for fields in [
        "id=2&title=Office&version=1",
        "id=abc&title=Office&version=1",
        "title=Office&version=1",
        "id=2&title=&version=1",
    ] {
        let (status, _, _) = send(
            &app,
            make_form_request("/Categories/Edit/1", ALICE, fields),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", fields);
    }

    let (_, _, body) = send(&app, make_get_request("/Categories", ALICE)).await;
    assert!(!body.contains("Office"));
}

#[tokio::test]
async fn test_edit_category_validation_failure_rerenders() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;

    let (status, _, body) = send(
        &app,
        make_form_request("/Categories/Edit/1", ALICE, "id=1&title=&version=1"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("The Title field is required."));
    assert!(body.contains(r#"action="/Categories/Edit/1""#));
}

#[tokio::test]
async fn test_edit_category_stale_version_is_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;

    // Two editors loaded version 1; the first save wins
    let (status, _, _) = send(
        &app,
        make_form_request("/Categories/Edit/1", ALICE, "id=1&title=Office&version=1"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (status, _, _) = send(
        &app,
        make_form_request("/Categories/Edit/1", ALICE, "id=1&title=Job&version=1"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, _, body) = send(&app, make_get_request("/Categories/Details/1", ALICE)).await;
    assert!(body.contains("Office"));
    assert!(!body.contains("Job"));
}

#[tokio::test]
async fn test_delete_category_cascades_to_items() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    create_category(&app, ALICE, "Work").await;
    create_category(&app, ALICE, "Home").await;
    create_item(&app, ALICE, "Write+spec", 1).await;
    create_item(&app, ALICE, "Review+spec", 1).await;
    create_item(&app, ALICE, "Dishes", 2).await;

    let (status, _, body) = send(&app, make_get_request("/Categories/Delete/1", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("This will also delete 2 item(s)"));

    let (status, location, _) =
        send(&app, make_form_request("/Categories/Delete/1", ALICE, "")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/Categories"));

    let store = Store::new(db);
    assert!(store.get_category(1).await.unwrap().is_none());
    let remaining = store.list_items(true, ItemFilter::default()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Dishes");
}

#[tokio::test]
async fn test_delete_missing_category_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    for uri in ["/Categories/Delete/1", "/Categories/Delete/abc"] {
        let (status, location, _) = send(&app, make_form_request(uri, ALICE, "")).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location.as_deref(), Some("/Categories"));
    }
}

#[tokio::test]
async fn test_delete_other_users_category_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    create_category(&app, ALICE, "Work").await;

    let (status, _, _) = send(&app, make_form_request("/Categories/Delete/1", BOB, "")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let store = Store::new(db);
    assert!(store.category_exists(1).await.unwrap());
}

// =============================================================================
// Item Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_item_lifecycle_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());
    let store = Store::new(db);

    create_category(&app, ALICE, "Work").await;
    assert_eq!(store.get_category(1).await.unwrap().unwrap().title, "Work");

    create_item(&app, ALICE, "Write+spec", 1).await;
    let item = store.get_item(1, false).await.unwrap().unwrap();
    assert_eq!(item.title, "Write spec");
    assert!(!item.is_complete);

    // Joined list shows exactly one entry with its category title
    let items = store
        .list_items(true, ItemFilter::owned_by(ALICE))
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].category_title(), "Work");

    let (status, _, body) = send(&app, make_get_request("/Items", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<td>Write spec</td><td>No</td><td>Work</td>"));

    // Mark complete
    let (status, location, _) = send(
        &app,
        make_form_request(
            "/Items/Edit/1",
            ALICE,
            "id=1&title=Write+spec&is_complete=true&category_id=1&version=1",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/Items"));

    let (status, _, body) = send(&app, make_get_request("/Items/Details/1", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<dt>Is Complete</dt><dd>Yes</dd>"));

    // Delete, then the detail page is gone
    let (status, _, body) = send(&app, make_get_request("/Items/Delete/1", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Are you sure you want to delete this?"));

    let (status, location, _) = send(&app, make_form_request("/Items/Delete/1", ALICE, "")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/Items"));

    let (status, _, _) = send(&app, make_get_request("/Items/Details/1", ALICE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_item_unknown_category_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    create_category(&app, ALICE, "Work").await;

    let (status, _, body) = send(
        &app,
        make_form_request("/Items/Create", ALICE, "title=Orphan&category_id=42"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Category 42 does not exist."));
    // The select list is rebuilt for the re-rendered form
    assert!(body.contains(r#"<option value="1">Work</option>"#));
    assert!(body.contains(r#"value="Orphan""#));

    let store = Store::new(db);
    assert!(store
        .list_items(false, ItemFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_create_item_in_other_users_category_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    create_category(&app, ALICE, "Work").await;

    let (status, _, body) = send(
        &app,
        make_form_request("/Items/Create", BOB, "title=Sneaky&category_id=1"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Category 1 does not exist."));
    // Bob's drop-down does not leak Alice's category
    assert!(!body.contains("Work"));

    let store = Store::new(db);
    assert!(store
        .list_items(false, ItemFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_create_item_missing_fields_rerenders() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;

    let (status, _, body) = send(&app, make_form_request("/Items/Create", ALICE, "title=")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("The Title field is required."));
    assert!(body.contains("The Category field is required."));
    assert!(body.contains(r#"<option value="1">Work</option>"#));
}

#[tokio::test]
async fn test_item_edit_form_preselects_category() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;
    create_category(&app, ALICE, "Home").await;
    create_item(&app, ALICE, "Dishes", 2).await;

    let (status, _, body) = send(&app, make_get_request("/Items/Edit/1", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<option value="1">Work</option>"#));
    assert!(body.contains(r#"<option value="2" selected>Home</option>"#));
}

#[tokio::test]
async fn test_item_edit_moves_category() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    create_category(&app, ALICE, "Work").await;
    create_category(&app, ALICE, "Home").await;
    create_item(&app, ALICE, "Dishes", 1).await;

    let (status, _, _) = send(
        &app,
        make_form_request(
            "/Items/Edit/1",
            ALICE,
            "id=1&title=Dishes&category_id=2&version=1",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    // Deleting the old category leaves the moved item alone
    send(&app, make_form_request("/Categories/Delete/1", ALICE, "")).await;

    let store = Store::new(db);
    let item = store.get_item(1, true).await.unwrap().unwrap();
    assert_eq!(item.category_id, 2);
    assert_eq!(item.category_title(), "Home");
}

#[tokio::test]
async fn test_item_edit_id_mismatch_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;
    create_item(&app, ALICE, "Dishes", 1).await;

    let (status, _, _) = send(
        &app,
        make_form_request(
            "/Items/Edit/1",
            ALICE,
            "id=7&title=Dishes&category_id=1&version=1",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_edit_stale_version_is_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    create_category(&app, ALICE, "Work").await;
    create_item(&app, ALICE, "Dishes", 1).await;

    let fields = "id=1&title=Dishes&is_complete=true&category_id=1&version=1";
    let (status, _, _) = send(&app, make_form_request("/Items/Edit/1", ALICE, fields)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (status, _, body) = send(&app, make_form_request("/Items/Edit/1", ALICE, fields)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("changed by another request"));
}

#[tokio::test]
async fn test_items_are_user_scoped() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    create_category(&app, ALICE, "Work").await;
    create_item(&app, ALICE, "Write+spec", 1).await;

    let (status, _, body) = send(&app, make_get_request("/Items", BOB)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("Write spec"));

    for uri in ["/Items/Details/1", "/Items/Edit/1", "/Items/Delete/1"] {
        let (status, _, _) = send(&app, make_get_request(uri, BOB)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }

    // Bob's delete is a silent no-op
    let (status, _, _) = send(&app, make_form_request("/Items/Delete/1", BOB, "")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let store = Store::new(db);
    assert!(store.item_exists(1).await.unwrap());
}

#[tokio::test]
async fn test_delete_missing_item_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    let (status, location, _) = send(&app, make_form_request("/Items/Delete/5", ALICE, "")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/Items"));
}

#[tokio::test]
async fn test_titles_are_escaped_in_pages() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());

    let store = Store::new(db);
    store
        .insert_category(NewCategory {
            title: "<script>x</script>".to_string(),
            owner_id: ALICE.to_string(),
        })
        .await
        .unwrap();

    let (_, _, body) = send(&app, make_get_request("/Categories", ALICE)).await;
    assert!(body.contains("&lt;script&gt;x&lt;/script&gt;"));
    assert!(!body.contains("<script>"));
}

// =============================================================================
// Edit Races & Malformed Submissions
// =============================================================================

/// Store that behaves as if every record vanished while it was being edited
///
/// Updates report a version conflict and existence checks report the record
/// gone; everything else reads through to a real store.
struct VanishingStore {
    inner: Store,
}

#[async_trait]
impl TodoStore for VanishingStore {
    async fn check_health(&self) -> todo_list_server::Result<()> {
        self.inner.check_health().await
    }

    async fn list_categories(
        &self,
        filter: CategoryFilter,
    ) -> todo_list_server::Result<Vec<Category>> {
        self.inner.list_categories(filter).await
    }

    async fn get_category(&self, id: u64) -> todo_list_server::Result<Option<Category>> {
        self.inner.get_category(id).await
    }

    async fn insert_category(&self, new: NewCategory) -> todo_list_server::Result<Category> {
        self.inner.insert_category(new).await
    }

    async fn update_category(&self, _category: Category) -> todo_list_server::Result<Category> {
        Err(AppError::Conflict)
    }

    async fn delete_category(&self, id: u64) -> todo_list_server::Result<bool> {
        self.inner.delete_category(id).await
    }

    async fn list_items(
        &self,
        join: bool,
        filter: ItemFilter,
    ) -> todo_list_server::Result<Vec<Item>> {
        self.inner.list_items(join, filter).await
    }

    async fn get_item(&self, id: u64, join: bool) -> todo_list_server::Result<Option<Item>> {
        self.inner.get_item(id, join).await
    }

    async fn insert_item(&self, new: NewItem) -> todo_list_server::Result<Item> {
        self.inner.insert_item(new).await
    }

    async fn update_item(&self, _item: Item) -> todo_list_server::Result<Item> {
        Err(AppError::Conflict)
    }

    async fn delete_item(&self, id: u64) -> todo_list_server::Result<bool> {
        self.inner.delete_item(id).await
    }

    async fn category_exists(&self, _id: u64) -> todo_list_server::Result<bool> {
        Ok(false)
    }

    async fn item_exists(&self, _id: u64) -> todo_list_server::Result<bool> {
        Ok(false)
    }
}

fn create_vanishing_app(db: Db) -> Router {
    let store = Arc::new(VanishingStore {
        inner: Store::new(db),
    });
    build_router(AppState::with_store(store, test_config()))
}

#[tokio::test]
async fn test_edit_category_deleted_during_save_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    create_category(&create_test_app(db.clone()), ALICE, "Work").await;

    let app = create_vanishing_app(db);
    let (status, _, body) = send(
        &app,
        make_form_request("/Categories/Edit/1", ALICE, "id=1&title=Office&version=1"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("does not exist"));
}

#[tokio::test]
async fn test_edit_item_deleted_during_save_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());
    create_category(&app, ALICE, "Work").await;
    create_item(&app, ALICE, "Dishes", 1).await;

    let app = create_vanishing_app(db);
    let (status, _, body) = send(
        &app,
        make_form_request(
            "/Items/Edit/1",
            ALICE,
            "id=1&title=Dishes&is_complete=true&category_id=1&version=1",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("does not exist"));
}

#[tokio::test]
async fn test_edit_without_usable_version_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir);
    let app = create_test_app(db.clone());
    create_category(&app, ALICE, "Work").await;
    create_item(&app, ALICE, "Dishes", 1).await;

    for fields in [
        "id=1&title=Office",
        "id=1&title=Office&version=",
        "id=1&title=Office&version=v1",
    ] {
        let (status, _, _) = send(
            &app,
            make_form_request("/Categories/Edit/1", ALICE, fields),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", fields);
    }

    for fields in [
        "id=1&title=Rinse&category_id=1",
        "id=1&title=Rinse&category_id=1&version=-1",
    ] {
        let (status, _, _) = send(&app, make_form_request("/Items/Edit/1", ALICE, fields)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", fields);
    }

    let store = Store::new(db);
    assert_eq!(store.get_category(1).await.unwrap().unwrap().title, "Work");
    assert_eq!(store.get_item(1, false).await.unwrap().unwrap().title, "Dishes");
}

#[tokio::test]
async fn test_malformed_form_renders_error_page() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(create_test_db(&temp_dir));

    // Form body without the form content type
    let request = Request::builder()
        .method("POST")
        .uri("/Categories/Create")
        .header(IDENTITY_HEADER, ALICE)
        .body(Body::from(format!(
            "title=Work&__RequestVerificationToken={}",
            token(ALICE)
        )))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body.contains("<h1>Unsupported Media Type</h1>"));

    let (_, _, body) = send(&app, make_get_request("/Categories", ALICE)).await;
    assert!(!body.contains("Work"));
}
