//! HTTP front end of the hwlock license server.
//!
//! Two surfaces share one engine: the admin gateway under `/api/v1/admin`,
//! guarded by the admin credential, and the client endpoints `verify` and
//! `activate`, which take the license key itself as the credential.

pub mod admin;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use hwlock_license::{open_store, LicenseEngine, LicenseError, LicenseResult};
use std::sync::Arc;

pub use config::{AdminCredentials, Backend, ServerArgs, ServerConfig};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LicenseEngine>,
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    #[must_use]
    pub fn new(engine: LicenseEngine, admin: AdminCredentials) -> Self {
        Self {
            engine: Arc::new(engine),
            admin: Arc::new(admin),
        }
    }

    /// Opens the configured store and builds the engine on top of it.
    pub fn from_config(config: &ServerConfig) -> LicenseResult<Self> {
        let store = open_store(&config.store)?;
        Ok(Self::new(
            LicenseEngine::new(store, config.engine.clone()),
            config.admin.clone(),
        ))
    }
}

/// Runs a blocking engine call off the async runtime.
pub(crate) async fn run_engine<T, F>(state: &AppState, f: F) -> LicenseResult<T>
where
    F: FnOnce(&LicenseEngine) -> LicenseResult<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = Arc::clone(&state.engine);
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| LicenseError::StoreUnavailable(format!("engine task failed: {e}")))?
}

async fn home() -> &'static str {
    concat!("hwlock license server ", env!("CARGO_PKG_VERSION"))
}

/// Build the HTTP router with the given state.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/issue", post(admin::issue))
        .route("/remove", post(admin::remove))
        .route("/list", get(admin::list))
        .route("/unbind", post(admin::unbind))
        .route("/set_active", post(admin::set_active))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/", get(home))
        .route("/api/v1/verify", post(client::verify))
        .route("/api/v1/activate", post(client::activate))
        .nest("/api/v1/admin", admin)
        .with_state(state)
}
