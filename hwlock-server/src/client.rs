//! Client verification endpoint. The raw token is the caller's credential.

use crate::error::ClientError;
use crate::{run_engine, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use hwlock_license::api::{ActivateResponse, ClientRequest, VerifyResponse};

pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<ClientRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ClientError> {
    let Json(req) = payload?;
    let (token, hwid) = req.fields()?;
    let (token, hwid) = (token.to_string(), hwid.to_string());

    let verification = run_engine(&state, move |engine| engine.verify(&token, &hwid)).await?;
    Ok(Json(VerifyResponse {
        status: verification.status,
        message: verification.status.message().to_string(),
        expires_at: verification.expires_at,
    }))
}

pub async fn activate(
    State(state): State<AppState>,
    payload: Result<Json<ClientRequest>, JsonRejection>,
) -> Result<Json<ActivateResponse>, ClientError> {
    let Json(req) = payload?;
    let (token, hwid) = req.fields()?;
    let (token, hwid) = (token.to_string(), hwid.to_string());

    let activation = run_engine(&state, move |engine| engine.activate(&token, &hwid)).await?;
    Ok(Json(ActivateResponse {
        status: activation.status,
        message: activation.status.message().to_string(),
        expiry_date: activation.expires_at,
    }))
}
