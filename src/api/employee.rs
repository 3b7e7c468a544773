//! Endpoints for the authenticated employee: own profile and own tasks.

use axum::Json;
use axum::extract::{Path, State};

use super::AppState;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::lifecycle::StatusIntent;
use crate::types::{EmployeeView, TaskView};

/// `GET /employee/profile` — the caller's record, without the password
/// hash.
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<EmployeeView>> {
    let employee = state
        .db
        .get_employee(&user.id)?
        .ok_or_else(ApiError::employee_not_found)?;
    let tasks = state.db.list_tasks_for(&employee.id)?;

    Ok(Json(EmployeeView::new(&employee, &tasks)))
}

/// `PUT /employee/task/{task_id}` — update the status of one of the
/// caller's own tasks.
///
/// The lookup is scoped to the caller, so a task id owned by a different
/// employee is a plain 404 — this endpoint can never mutate another
/// employee's data.
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    Json(intent): Json<StatusIntent>,
) -> ApiResult<Json<TaskView>> {
    let status = intent.apply();
    let task = state.db.set_own_task_status(&user.id, &task_id, status)?;

    Ok(Json(TaskView::from(&task)))
}
