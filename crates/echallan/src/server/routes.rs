use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, LoginRequest};
use crate::error::Error;
use crate::memo::{MemoReceipt, MemoRequest};
use crate::records::FaceDescriptor;

use super::{ApiError, AppState};

type ApiResult<T> = Result<T, ApiError>;

pub async fn login_handler(
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let officer = auth::authenticate(request)?;
    Ok(Json(json!({ "success": true, "officer": officer })))
}

pub async fn violations_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let violations = state.with_storage(|s| s.violations()).await?;
    Ok(Json(violations))
}

pub async fn driver_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let lookup = id.clone();
    let driver = state
        .with_storage(move |s| s.get_driver(&lookup))
        .await?
        .ok_or_else(|| Error::not_found("Driver", id))?;
    Ok(Json(driver))
}

pub async fn drivers_basic_handler(
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let drivers = state.with_storage(|s| s.driver_summaries()).await?;
    Ok(Json(drivers))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    descriptor: FaceDescriptor,
    demo_driver_id: Option<String>,
}

pub async fn match_handler(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;

    let expected = state.config.matching.descriptor_len;
    if request.descriptor.len() != expected {
        return Err(Error::validation(format!(
            "descriptor must have {expected} components, got {}",
            request.descriptor.len()
        ))
        .into());
    }

    let response = match state
        .matcher
        .find_best_match(&request.descriptor, request.demo_driver_id.as_deref())
    {
        Some(hit) => Json(hit).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No match" })),
        )
            .into_response(),
    };
    Ok(response)
}

pub async fn create_memo_handler(
    State(state): State<AppState>,
    payload: Result<Json<MemoRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let new_memo = request.validate()?;

    let memo = state
        .with_storage(move |s| s.create_memo(new_memo, Utc::now()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Memo generated successfully",
        "memo": MemoReceipt::from(&memo),
    })))
}

pub async fn driver_memos_handler(
    State(state): State<AppState>,
    Path(driver_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let memos = state
        .with_storage(move |s| s.memos_for_driver(&driver_id))
        .await?;
    Ok(Json(memos))
}

pub async fn locations_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let locations = state.with_storage(|s| s.locations()).await?;
    Ok(Json(locations))
}

pub async fn cameras_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let cameras = state.with_storage(|s| s.camera_directory()).await?;
    Ok(Json(cameras))
}

pub async fn analytics_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let snapshot = state.with_storage(|s| s.analytics(Utc::now())).await?;
    Ok(Json(snapshot))
}

pub async fn analytics_refresh_handler(
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let snapshot = state
        .with_storage(|s| s.refresh_analytics(Utc::now()))
        .await?;
    Ok(Json(snapshot))
}
