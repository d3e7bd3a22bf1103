use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::cookies;
use super::extractor::AuthUser;
use super::state::GateState;
use crate::error::AccessError;
use crate::plan::PlanStatus;
use crate::services::LimitCheck;
use crate::store::{Document, NewDocument};
use crate::traits::DocumentStoreDyn;
use crate::types::ResourceKind;

/// Create the resource API router.
///
/// Every handler authenticates through [`AuthUser`] (bearer header, then the
/// session cookie) and creation goes through the usage limiter.
pub fn api_routes(state: GateState) -> Router {
    let api_path = state.settings.api_path.clone();

    Router::new()
        .route(&format!("{api_path}/notes"), post(create_note))
        .route(&format!("{api_path}/tasks"), post(create_task))
        .route(&format!("{api_path}/subscription"), get(subscription))
        .route(&format!("{api_path}/usage"), get(usage))
        .route(&format!("{api_path}/auth/logout"), post(logout))
        .with_state(state)
}

// ── Create ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NoteInput {
    title: Option<String>,
    content: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskInput {
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    #[serde(default)]
    completed: bool,
}

async fn create_note(
    State(state): State<GateState>,
    user: AuthUser,
    body: Result<Json<NoteInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), AccessError> {
    let Json(input) = body.map_err(|e| AccessError::Validation(e.body_text()))?;
    let title = required("title", input.title)?;
    let content = required("content", input.content)?;

    let data = json!({
        "title": title,
        "content": content,
        "tags": input.tags,
    });
    create_resource(&state, &user, ResourceKind::Notes, data).await
}

async fn create_task(
    State(state): State<GateState>,
    user: AuthUser,
    body: Result<Json<TaskInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), AccessError> {
    let Json(input) = body.map_err(|e| AccessError::Validation(e.body_text()))?;
    let title = required("title", input.title)?;

    if let Some(due) = &input.due_date {
        OffsetDateTime::parse(due, &Rfc3339).map_err(|_| {
            AccessError::Validation("dueDate must be an RFC 3339 timestamp".into())
        })?;
    }

    let data = json!({
        "title": title,
        "description": input.description,
        "dueDate": input.due_date,
        "completed": input.completed,
    });
    create_resource(&state, &user, ResourceKind::Tasks, data).await
}

async fn create_resource(
    state: &GateState,
    user: &AuthUser,
    kind: ResourceKind,
    data: JsonValue,
) -> Result<(StatusCode, Json<Document>), AccessError> {
    let check = state.limiter().check(&user.user_id, kind).await?;
    if check.reached_limit {
        tracing::info!(
            user_id = %user.user_id,
            kind = %kind,
            count = ?check.count,
            "Free plan limit reached"
        );
    }
    check.ensure_within_limit()?;

    let document = state
        .resolver()
        .store()
        .insert_dyn(kind.collection(), NewDocument::new(user.user_id.clone(), data))
        .await
        .map_err(|e| AccessError::Upstream(format!("inserting into {kind}: {e}")))?;

    tracing::info!(user_id = %user.user_id, kind = %kind, id = %document.id, "Resource created");
    Ok((StatusCode::CREATED, Json(document)))
}

fn required(field: &str, value: Option<String>) -> Result<String, AccessError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AccessError::Validation(format!("{field} is required"))),
    }
}

// ── Plan & usage ───────────────────────────────────────────────────

async fn subscription(
    State(state): State<GateState>,
    user: AuthUser,
) -> Result<Json<PlanStatus>, AccessError> {
    Ok(Json(state.resolver().resolve(&user.user_id).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UsageResponse {
    is_pro: bool,
    notes: LimitCheck,
    tasks: LimitCheck,
}

async fn usage(
    State(state): State<GateState>,
    user: AuthUser,
) -> Result<Json<UsageResponse>, AccessError> {
    let plan = state.resolver().resolve(&user.user_id).await?;
    let limiter = state.limiter();

    let notes = limiter
        .check_with_plan(&user.user_id, ResourceKind::Notes, plan)
        .await?;
    let tasks = limiter
        .check_with_plan(&user.user_id, ResourceKind::Tasks, plan)
        .await?;

    Ok(Json(UsageResponse {
        is_pro: plan.is_pro,
        notes,
        tasks,
    }))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(State(state): State<GateState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let clear_cookie = cookies::clear_session_cookie(&state.settings.session_cookie_name);
    (jar.add(clear_cookie), Redirect::to(&state.settings.login_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert_eq!(required("title", Some("Groceries".into())).unwrap(), "Groceries");

        for value in [None, Some(String::new()), Some("   ".into())] {
            let err = required("title", value).unwrap_err();
            assert_eq!(err.public_message(), "title is required");
        }
    }
}
