//! Admin gateway handlers. Translation only; decisions live in the engine.

use crate::error::ApiError;
use crate::{run_engine, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use hwlock_license::api::{
    format_date, ActionResponse, IssueRequest, IssueResponse, LicenseRef, LicenseView,
    ListResponse, SetActiveRequest,
};
use hwlock_license::LicenseError;

pub async fn issue(
    State(state): State<AppState>,
    payload: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let Json(req) = payload?;
    let issued = run_engine(&state, move |engine| {
        let expiry = req.expiry(engine.config().default_duration_days)?;
        engine.issue(expiry, req.description)
    })
    .await?;

    let expires_at = issued.record.expires_at;
    Ok(Json(IssueResponse {
        success: true,
        id: issued.record.id,
        license_key: issued.token,
        expiry_date: expires_at.map(format_date),
        expires_at,
    }))
}

pub async fn remove(
    State(state): State<AppState>,
    payload: Result<Json<LicenseRef>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(target) = payload?;
    run_engine(&state, move |engine| {
        let id = target.resolve(engine)?;
        engine.remove(id)
    })
    .await?;
    Ok(Json(ActionResponse::ok("license removed")))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let records = run_engine(&state, |engine| engine.list()).await?;
    let now = Utc::now();
    Ok(Json(ListResponse {
        success: true,
        licenses: records
            .iter()
            .map(|r| LicenseView::from_record(r, now))
            .collect(),
    }))
}

pub async fn unbind(
    State(state): State<AppState>,
    payload: Result<Json<LicenseRef>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(target) = payload?;
    run_engine(&state, move |engine| {
        let id = target.resolve(engine)?;
        engine.unbind(id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_active(
    State(state): State<AppState>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(req) = payload?;
    let active = req
        .active
        .ok_or_else(|| LicenseError::Validation("active is required".into()))?;
    let record = run_engine(&state, move |engine| {
        let id = req.target.resolve(engine)?;
        engine.set_active(id, active)
    })
    .await?;
    let verb = if record.active { "enabled" } else { "disabled" };
    Ok(Json(ActionResponse::ok(format!("license {} {verb}", record.id))))
}
