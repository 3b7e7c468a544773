//! Integration tests for the HTTP surface.
//!
//! Each test builds the full router over an in-memory database and drives
//! it with `tower::ServiceExt::oneshot`, so routing, extractors, and
//! status-code mapping are all exercised.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use taskcrew::api::{AppState, build_router};
use taskcrew::auth::AuthKeys;
use taskcrew::db::Database;
use taskcrew::notify::LogNotifier;
use tower::ServiceExt;

const ADMIN_KEY: &str = "TEST_ADMIN_KEY";

fn test_app() -> (Router, AppState) {
    let state = AppState {
        db: Database::open_in_memory().expect("in-memory db"),
        keys: Arc::new(AuthKeys::new("test-secret")),
        notifier: Arc::new(LogNotifier),
        admin_registration_key: ADMIN_KEY.to_string(),
        frontend_url: "http://localhost:5174".to_string(),
    };
    (build_router(state.clone()), state)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register an admin and return a bearer token.
async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register/admin",
        None,
        Some(json!({
            "firstName": "Admin",
            "email": "admin@me.com",
            "password": "supersecret",
            "adminKey": ADMIN_KEY,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

/// Register an employee and return (token, id).
async fn employee_token(app: &Router, name: &str, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register/employee",
        None,
        Some(json!({
            "firstName": name,
            "email": email,
            "password": "123456",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

mod auth_flow {
    use super::*;

    #[tokio::test]
    async fn login_requires_both_fields() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "x@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email and password are required");
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let (app, _) = test_app();
        employee_token(&app, "Sneha", "sneha@example.com").await;

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "sneha@example.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_returns_tasks_for_employees() {
        let (app, _) = test_app();
        employee_token(&app, "Sneha", "sneha@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "sneha@example.com", "password": "123456"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "employee");
        assert!(body["user"]["tasks"].is_array());
        assert!(body["token"].is_string());
    }

    #[tokio::test]
    async fn admin_registration_needs_the_right_key() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/auth/register/admin",
            None,
            Some(json!({
                "firstName": "Mallory",
                "email": "mallory@example.com",
                "password": "supersecret",
                "adminKey": "WRONG",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid admin registration key");
    }

    #[tokio::test]
    async fn short_passwords_are_rejected() {
        let (app, _) = test_app();

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register/employee",
            None,
            Some(json!({"firstName": "A", "email": "a@example.com", "password": "12345"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register/admin",
            None,
            Some(json!({
                "firstName": "A",
                "email": "a2@example.com",
                "password": "1234567",
                "adminKey": ADMIN_KEY,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (app, _) = test_app();
        employee_token(&app, "Sneha", "sneha@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/register/employee",
            None,
            Some(json!({"firstName": "Again", "email": "sneha@example.com", "password": "123456"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists");
    }
}

mod password_reset {
    use super::*;
    use taskcrew::db::now_ms;
    use taskcrew::types::Role;

    #[tokio::test]
    async fn forgot_password_does_not_reveal_account_existence() {
        let (app, _) = test_app();
        employee_token(&app, "Sneha", "sneha@example.com").await;

        let (known_status, known_body) = send(
            &app,
            "POST",
            "/auth/forgot-password",
            None,
            Some(json!({"email": "sneha@example.com"})),
        )
        .await;
        let (unknown_status, unknown_body) = send(
            &app,
            "POST",
            "/auth/forgot-password",
            None,
            Some(json!({"email": "nobody@example.com"})),
        )
        .await;

        assert_eq!(known_status, StatusCode::OK);
        assert_eq!(unknown_status, StatusCode::OK);
        assert_eq!(known_body["message"], unknown_body["message"]);
    }

    #[tokio::test]
    async fn reset_password_with_expired_token_fails() {
        let (app, state) = test_app();
        let (_, employee_id) = employee_token(&app, "Sneha", "sneha@example.com").await;

        state
            .db
            .set_reset_token(Role::Employee, &employee_id, "expired-tok", now_ms() - 1000)
            .unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/auth/reset-password",
            None,
            Some(json!({"token": "expired-tok", "newPassword": "freshpass"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Password reset token is invalid or has expired"
        );
    }

    #[tokio::test]
    async fn reset_password_happy_path_consumes_the_token() {
        let (app, state) = test_app();
        let (_, employee_id) = employee_token(&app, "Sneha", "sneha@example.com").await;

        state
            .db
            .set_reset_token(Role::Employee, &employee_id, "valid-tok", now_ms() + 60_000)
            .unwrap();

        let (status, _) = send(
            &app,
            "POST",
            "/auth/reset-password",
            None,
            Some(json!({"token": "valid-tok", "newPassword": "freshpass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // New password works
        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "sneha@example.com", "password": "freshpass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Token is single-use
        let (status, _) = send(
            &app,
            "POST",
            "/auth/reset-password",
            None,
            Some(json!({"token": "valid-tok", "newPassword": "anotherpass"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod task_flow {
    use super::*;

    #[tokio::test]
    async fn assign_then_update_then_repair() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;

        // Admin creates the employee
        let (status, employee) = send(
            &app,
            "POST",
            "/admin/employees",
            Some(&admin),
            Some(json!({"firstName": "Sneha", "email": "employee2@example.com", "password": "123456"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let employee_id = employee["id"].as_str().unwrap().to_string();

        // Assigning a task makes it newTask with counts following
        let (status, task) = send(
            &app,
            "POST",
            &format!("/admin/employees/{}/tasks", employee_id),
            Some(&admin),
            Some(json!({
                "title": "DB tuning",
                "description": "Optimize queries for better performance",
                "date": "2024-10-11",
                "category": "Database",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["newTask"], true);
        assert_eq!(task["active"], false);
        let task_id = task["id"].as_str().unwrap().to_string();

        let (_, employees) = send(&app, "GET", "/admin/employees", Some(&admin), None).await;
        assert_eq!(employees[0]["taskCounts"]["newTask"], 1);

        // Admin flips the task to active
        let (status, task) = send(
            &app,
            "PUT",
            &format!("/admin/tasks/{}", task_id),
            Some(&admin),
            Some(json!({"taskStatus": "active"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["active"], true);
        assert_eq!(task["newTask"], false);

        let (_, employees) = send(&app, "GET", "/admin/employees", Some(&admin), None).await;
        assert_eq!(employees[0]["taskCounts"]["active"], 1);
        assert_eq!(employees[0]["taskCounts"]["newTask"], 0);

        // Unrecognized status names fall back to newTask
        let (_, task) = send(
            &app,
            "PUT",
            &format!("/admin/tasks/{}", task_id),
            Some(&admin),
            Some(json!({"taskStatus": "bogus"})),
        )
        .await;
        assert_eq!(task["newTask"], true);

        // A clean database has nothing to migrate
        let (status, body) = send(&app, "POST", "/admin/migrate-tasks", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updatedCount"], 0);
    }

    #[tokio::test]
    async fn employee_updates_own_task_only() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;
        let (alice_token, alice_id) = employee_token(&app, "Alice", "alice@example.com").await;
        let (_bob_token, bob_id) = employee_token(&app, "Bob", "bob@example.com").await;

        let (_, alice_task) = send(
            &app,
            "POST",
            &format!("/admin/employees/{}/tasks", alice_id),
            Some(&admin),
            Some(json!({"title": "a", "description": "d", "date": "2024-01-01", "category": "c"})),
        )
        .await;
        let (_, bob_task) = send(
            &app,
            "POST",
            &format!("/admin/employees/{}/tasks", bob_id),
            Some(&admin),
            Some(json!({"title": "b", "description": "d", "date": "2024-01-01", "category": "c"})),
        )
        .await;

        // Alice completes her own task
        let (status, task) = send(
            &app,
            "PUT",
            &format!("/employee/task/{}", alice_task["id"].as_str().unwrap()),
            Some(&alice_token),
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["completed"], true);

        // Alice cannot reference Bob's task
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/employee/task/{}", bob_task["id"].as_str().unwrap()),
            Some(&alice_token),
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Bob's task is untouched
        let (_, all_tasks) = send(&app, "GET", "/admin/tasks", Some(&admin), None).await;
        let bobs = all_tasks
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["assignedToEmail"] == "bob@example.com")
            .unwrap();
        assert_eq!(bobs["taskStatus"], "newTask");
    }

    #[tokio::test]
    async fn intent_priority_prefers_active_over_completed() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;
        let (token, employee_id) = employee_token(&app, "Sneha", "s@example.com").await;

        let (_, task) = send(
            &app,
            "POST",
            &format!("/admin/employees/{}/tasks", employee_id),
            Some(&admin),
            Some(json!({"title": "t", "description": "d", "date": "2024-01-01", "category": "c"})),
        )
        .await;

        let (_, task) = send(
            &app,
            "PUT",
            &format!("/employee/task/{}", task["id"].as_str().unwrap()),
            Some(&token),
            Some(json!({"active": true, "completed": true})),
        )
        .await;
        assert_eq!(task["active"], true);
        assert_eq!(task["completed"], false);
    }

    #[tokio::test]
    async fn profile_returns_counts_and_tasks() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;
        let (token, employee_id) = employee_token(&app, "Sneha", "s@example.com").await;

        send(
            &app,
            "POST",
            &format!("/admin/employees/{}/tasks", employee_id),
            Some(&admin),
            Some(json!({"title": "t", "description": "d", "date": "2024-01-01", "category": "c"})),
        )
        .await;

        let (status, profile) = send(&app, "GET", "/employee/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["firstName"], "Sneha");
        assert_eq!(profile["taskCounts"]["newTask"], 1);
        assert_eq!(profile["tasks"].as_array().unwrap().len(), 1);
        assert!(profile.get("passwordHash").is_none());
        assert!(profile.get("password").is_none());
    }

    #[tokio::test]
    async fn dashboard_aggregates() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;
        let (_, employee_id) = employee_token(&app, "Sneha", "s@example.com").await;

        let (_, task) = send(
            &app,
            "POST",
            &format!("/admin/employees/{}/tasks", employee_id),
            Some(&admin),
            Some(json!({"title": "t", "description": "d", "date": "2024-01-01", "category": "c"})),
        )
        .await;
        send(
            &app,
            "PUT",
            &format!("/admin/tasks/{}", task["id"].as_str().unwrap()),
            Some(&admin),
            Some(json!({"taskStatus": "completed"})),
        )
        .await;

        let (status, stats) = send(&app, "GET", "/admin/dashboard", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalEmployees"], 1);
        assert_eq!(stats["completedTasks"], 1);
        assert_eq!(stats["totalTasks"], 1);
    }

    #[tokio::test]
    async fn deleting_a_task_updates_counts() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;
        let (_, employee_id) = employee_token(&app, "Sneha", "s@example.com").await;

        let (_, task) = send(
            &app,
            "POST",
            &format!("/admin/employees/{}/tasks", employee_id),
            Some(&admin),
            Some(json!({"title": "t", "description": "d", "date": "2024-01-01", "category": "c"})),
        )
        .await;

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/admin/tasks/{}", task["id"].as_str().unwrap()),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, employees) = send(&app, "GET", "/admin/employees", Some(&admin), None).await;
        assert_eq!(employees[0]["taskCounts"]["newTask"], 0);
        assert_eq!(employees[0]["tasks"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_task_fields_are_rejected() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;
        let (_, employee_id) = employee_token(&app, "Sneha", "s@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/admin/employees/{}/tasks", employee_id),
            Some(&admin),
            Some(json!({"title": "t", "description": "d"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "All task fields are required");
    }

    #[tokio::test]
    async fn assigning_to_unknown_employee_is_404() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;

        let (status, _) = send(
            &app,
            "POST",
            "/admin/employees/no-such-id/tasks",
            Some(&admin),
            Some(json!({"title": "t", "description": "d", "date": "2024-01-01", "category": "c"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod access_control {
    use super::*;

    #[tokio::test]
    async fn admin_routes_reject_anonymous_callers() {
        let (app, _) = test_app();
        let (status, _) = send(&app, "GET", "/admin/employees", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_routes_reject_employee_tokens() {
        let (app, _) = test_app();
        let (token, _) = employee_token(&app, "Sneha", "s@example.com").await;

        let (status, _) = send(&app, "GET", "/admin/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn garbage_tokens_are_unauthorized() {
        let (app, _) = test_app();
        let (status, _) = send(
            &app,
            "GET",
            "/employee/profile",
            Some("not-a-jwt"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deleting_unknown_employee_is_404() {
        let (app, _) = test_app();
        let admin = admin_token(&app).await;
        let (status, _) = send(
            &app,
            "DELETE",
            "/admin/employees/no-such-id",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
