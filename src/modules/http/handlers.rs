use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use log::info;
use serde_json::{json, Value};

use super::AppState;
use crate::modules::accounts::error::AccountError;
use crate::modules::accounts::model::ReviewAction;
use crate::modules::accounts::service::{
    CompleteInput, LoginInput, RegisterInput, ReviewInput, StatusInput, StudentInput,
};
use crate::modules::auth::CurrentAccount;

type Payload<T> = Result<Json<T>, JsonRejection>;
type Reply = Result<(StatusCode, Json<Value>), AccountError>;

pub async fn register(State(state): State<AppState>, payload: Payload<RegisterInput>) -> Reply {
    let Json(input) = payload?;
    let user = state.service.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User Registered Successfully!", "user": user })),
    ))
}

pub async fn login(State(state): State<AppState>, payload: Payload<LoginInput>) -> Reply {
    let Json(input) = payload?;
    let summary = state.service.login(input).await?;
    Ok((StatusCode::OK, Json(json!(summary))))
}

pub async fn add_student(
    State(state): State<AppState>,
    CurrentAccount(admin): CurrentAccount,
    payload: Payload<StudentInput>,
) -> Reply {
    let Json(input) = payload?;
    let student = state.service.admin_add_student(input).await?;
    info!("Student {} added by admin {}", student.id, admin.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Student Added", "student": student })),
    ))
}

pub async fn request_registration(
    State(state): State<AppState>,
    payload: Payload<StudentInput>,
) -> Reply {
    let Json(input) = payload?;
    state.service.self_request_registration(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Request Sent. We will contact you shortly" })),
    ))
}

pub async fn review_student(
    State(state): State<AppState>,
    CurrentAccount(admin): CurrentAccount,
    payload: Payload<ReviewInput>,
) -> Reply {
    let Json(input) = payload?;
    let outcome = state.service.review_student(input).await?;
    info!(
        "Student {} reviewed by admin {}: {:?}",
        outcome.student.id, admin.id, outcome.action
    );

    let message = match outcome.action {
        ReviewAction::Confirm => "Student confirmed and email sent.",
        ReviewAction::Reject => "Student was rejected!",
    };
    Ok((
        StatusCode::OK,
        Json(json!({ "message": message, "student": outcome.student })),
    ))
}

pub async fn complete_registration(
    State(state): State<AppState>,
    payload: Payload<CompleteInput>,
) -> Reply {
    let Json(input) = payload?;
    state.service.complete_registration(input).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Registration completed successfully." })),
    ))
}

pub async fn update_student_status(
    State(state): State<AppState>,
    CurrentAccount(admin): CurrentAccount,
    payload: Payload<StatusInput>,
) -> Reply {
    let Json(input) = payload?;
    let change = state.service.update_student_status(input).await?;
    info!(
        "Student {} status {} -> {} by admin {}",
        change.student.id, change.previous, change.student.status, admin.id
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("Student status updated to {}", change.student.status),
            "student": change.student,
        })),
    ))
}

pub async fn not_found() -> AccountError {
    AccountError::NotFound("Not Found".to_string())
}
