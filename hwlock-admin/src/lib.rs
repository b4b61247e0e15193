//! Admin client for the hwlock license server.
//!
//! Wraps the `/api/v1/admin` endpoints and renders their results for the
//! `hwlock-admin` command line tool.

use hwlock_license::api::{
    ActionResponse, IssueRequest, IssueResponse, LicenseRef, LicenseView, ListResponse,
    SetActiveRequest, ADMIN_KEY_HEADER,
};
use hwlock_license::{LicenseError, LicenseId, LicenseResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::debug;

/// Default server address used when none is configured.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Authenticated client for the admin endpoints.
pub struct AdminClient {
    base_url: String,
    admin_key: String,
    client: Client,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, admin_key: impl Into<String>) -> LicenseResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LicenseError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_key: admin_key.into(),
            client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/api/v1/admin{}", self.base_url, path))
            .header(ADMIN_KEY_HEADER, &self.admin_key)
    }

    /// Sends the request and maps failure statuses onto license errors.
    async fn send(&self, request: RequestBuilder) -> LicenseResult<Response> {
        let resp = request
            .send()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))?;
        let status = resp.status();
        debug!("admin request -> {status}");
        if status.is_success() {
            return Ok(resp);
        }

        let message = resp
            .json::<ActionResponse>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());
        Err(match status {
            StatusCode::UNAUTHORIZED => LicenseError::Unauthorized,
            StatusCode::NOT_FOUND => LicenseError::NotFound(message),
            StatusCode::BAD_REQUEST => LicenseError::Validation(message),
            _ => LicenseError::Network(format!("server returned {status}: {message}")),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> LicenseResult<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| LicenseError::Network(format!("invalid response from server: {e}")))
    }

    /// Issues a new license.
    pub async fn generate(&self, req: &IssueRequest) -> LicenseResult<IssueResponse> {
        self.send_json(self.request(reqwest::Method::POST, "/issue").json(req))
            .await
    }

    /// Deletes a license permanently.
    pub async fn remove(&self, target: &LicenseRef) -> LicenseResult<ActionResponse> {
        self.send_json(self.request(reqwest::Method::POST, "/remove").json(target))
            .await
    }

    /// Returns every license, newest first.
    pub async fn list(&self) -> LicenseResult<Vec<LicenseView>> {
        let list: ListResponse = self
            .send_json(self.request(reqwest::Method::GET, "/list"))
            .await?;
        Ok(list.licenses)
    }

    /// Releases a license from its device.
    pub async fn reset(&self, target: &LicenseRef) -> LicenseResult<()> {
        self.send(self.request(reqwest::Method::POST, "/unbind").json(target))
            .await?;
        Ok(())
    }

    /// Enables or disables a license.
    pub async fn set_active(&self, target: LicenseRef, active: bool) -> LicenseResult<ActionResponse> {
        let body = SetActiveRequest {
            target,
            active: Some(active),
        };
        self.send_json(self.request(reqwest::Method::POST, "/set_active").json(&body))
            .await
    }
}

/// Interprets a `--license` argument: a license id as shown by `list`, or a
/// raw license key.
#[must_use]
pub fn parse_target(arg: &str) -> LicenseRef {
    match LicenseId::parse(arg) {
        Ok(id) => LicenseRef::by_id(id),
        Err(_) => LicenseRef::by_key(arg.trim()),
    }
}

/// Renders a freshly issued license.
#[must_use]
pub fn render_issued(issued: &IssueResponse) -> String {
    format!(
        "License key: {}\nExpires:     {}\n",
        issued.license_key,
        issued.expiry_date.as_deref().unwrap_or("never")
    )
}

/// Renders the license listing. `detail` adds description and timestamps.
#[must_use]
pub fn render_list(licenses: &[LicenseView], detail: bool) -> String {
    if licenses.is_empty() {
        return "No licenses.\n".to_string();
    }
    let mut out = String::new();
    for view in licenses {
        let _ = writeln!(out, "Key: {}", view.key);
        let _ = writeln!(out, "  Status:   {}", view.status);
        let _ = writeln!(
            out,
            "  HWID:     {}",
            view.hwid.as_deref().unwrap_or("not activated")
        );
        let _ = writeln!(out, "  Duration: {}", view.duration);
        if detail {
            let _ = writeln!(out, "  Created:  {}", view.created);
            let _ = writeln!(
                out,
                "  Expires:  {}",
                view.expires.as_deref().unwrap_or("never")
            );
            let _ = writeln!(out, "  Active:   {}", if view.active { "yes" } else { "no" });
            if let Some(description) = &view.description {
                let _ = writeln!(out, "  Note:     {description}");
            }
        }
        out.push_str(&"-".repeat(40));
        out.push('\n');
    }
    out
}
