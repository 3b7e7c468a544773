//! Admin endpoints: employee management, task assignment, the dashboard,
//! and the status repair migration.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{AppState, MessageResponse};
use crate::auth::{AdminUser, hash_password};
use crate::error::{ApiError, ApiResult};
use crate::lifecycle::TaskStatus;
use crate::types::{AssignedTaskView, DashboardStats, EmployeeView, NewTaskInput, TaskView};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskStatusRequest {
    pub task_status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResponse {
    pub message: String,
    pub updated_count: i64,
}

/// `GET /admin/employees` — every employee with counts and tasks inline.
pub async fn list_employees(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<EmployeeView>>> {
    let employees = state.db.list_employees()?;
    let mut views = Vec::with_capacity(employees.len());
    for employee in &employees {
        let tasks = state.db.list_tasks_for(&employee.id)?;
        views.push(EmployeeView::new(employee, &tasks));
    }
    Ok(Json(views))
}

/// `POST /admin/employees` — create an employee account.
pub async fn create_employee(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateEmployeeRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(first_name), Some(email), Some(password)) =
        (req.first_name, req.email, req.password)
    else {
        return Err(ApiError::invalid_value("All fields are required"));
    };

    let password_hash = hash_password(&password)?;
    let employee = state.db.create_employee(&first_name, &email, &password_hash)?;
    info!(email = %employee.email, "Employee created by admin");

    Ok((
        StatusCode::CREATED,
        Json(EmployeeView::new(&employee, &[])),
    ))
}

/// `DELETE /admin/employees/{employee_id}` — remove an employee and all
/// their tasks.
pub async fn delete_employee(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(employee_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.db.delete_employee(&employee_id)? {
        return Err(ApiError::employee_not_found());
    }
    info!(employee_id = %employee_id, "Employee deleted");
    Ok(MessageResponse::new("Employee deleted successfully"))
}

/// `POST /admin/employees/{employee_id}/tasks` — assign a new task. All
/// four task fields are required.
pub async fn assign_task(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(employee_id): Path<String>,
    Json(input): Json<NewTaskInput>,
) -> ApiResult<impl IntoResponse> {
    let (Some(title), Some(description), Some(date), Some(category)) =
        (input.title, input.description, input.date, input.category)
    else {
        return Err(ApiError::invalid_value("All task fields are required"));
    };

    let task = state
        .db
        .assign_task(&employee_id, &title, &description, &date, &category)?;
    info!(employee_id = %employee_id, task_id = %task.id, "Task assigned");

    Ok((StatusCode::CREATED, Json(TaskView::from(&task))))
}

/// `GET /admin/dashboard` — aggregate counts across all employees.
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.db.get_dashboard_stats()?))
}

/// `GET /admin/tasks` — all tasks across all employees, annotated with
/// their owner.
pub async fn list_all_tasks(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<AssignedTaskView>>> {
    Ok(Json(state.db.list_all_tasks()?))
}

/// `PUT /admin/tasks/{task_id}` — set a task's status by name. Unrecognized
/// (or missing) names fall back to `newTask`.
pub async fn update_task_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateTaskStatusRequest>,
) -> ApiResult<Json<TaskView>> {
    let status = TaskStatus::parse_or_default(req.task_status.as_deref().unwrap_or(""));
    let task = state.db.set_task_status(&task_id, status)?;
    info!(task_id = %task_id, status = status.as_str(), "Task status updated by admin");

    Ok(Json(TaskView::from(&task)))
}

/// `DELETE /admin/tasks/{task_id}`.
pub async fn delete_task(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.db.delete_task(&task_id)? {
        return Err(ApiError::task_not_found());
    }
    info!(task_id = %task_id, "Task deleted");
    Ok(MessageResponse::new("Task deleted successfully"))
}

/// `POST /admin/migrate-tasks` — repair any task rows violating the
/// one-status invariant. Safe to run repeatedly.
pub async fn migrate_tasks(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<MigrationResponse>> {
    let updated_count = state.db.repair_task_statuses()?;
    info!(updated_count, "Task status migration completed");

    Ok(Json(MigrationResponse {
        message: format!("Migration completed. Updated {} employees.", updated_count),
        updated_count,
    }))
}
