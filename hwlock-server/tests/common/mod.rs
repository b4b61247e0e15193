//! Shared helpers for server tests.

#![allow(dead_code)]

use hwlock_license::{EngineConfig, JsonFileLicenseStore, LicenseEngine};
use hwlock_server::{build_router, AdminCredentials, AppState};
use serde_json::Value;
use std::sync::Arc;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_KEY: &str = "test-admin-key";

pub struct TestServer {
    pub base: String,
    pub http: reqwest::Client,
}

/// Spin up the HTTP server on an OS-assigned port over a volatile store.
pub async fn spawn_test_server() -> TestServer {
    let engine = LicenseEngine::new(
        Arc::new(JsonFileLicenseStore::in_memory()),
        EngineConfig::default(),
    );
    let state = AppState::new(
        engine,
        AdminCredentials {
            user: ADMIN_USER.to_string(),
            key: ADMIN_KEY.to_string(),
        },
    );
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        http: reqwest::Client::new(),
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// POSTs an admin request carrying the admin key header.
    pub async fn admin_post(&self, path: &str, body: Value) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .header("X-Admin-Key", ADMIN_KEY)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn admin_get(&self, path: &str) -> reqwest::Response {
        self.http
            .get(self.url(path))
            .header("X-Admin-Key", ADMIN_KEY)
            .send()
            .await
            .unwrap()
    }

    pub async fn client_post(&self, path: &str, body: Value) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Issues a license and returns `(id, license_key)`.
    pub async fn issue(&self, body: Value) -> (String, String) {
        let resp = self.admin_post("/api/v1/admin/issue", body).await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        (
            body["id"].as_str().unwrap().to_string(),
            body["license_key"].as_str().unwrap().to_string(),
        )
    }

    pub async fn verify(&self, key: &str, hwid: &str) -> Value {
        let resp = self
            .client_post(
                "/api/v1/verify",
                serde_json::json!({ "token": key, "hwid": hwid }),
            )
            .await;
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    pub async fn activate(&self, key: &str, hwid: &str) -> Value {
        let resp = self
            .client_post(
                "/api/v1/activate",
                serde_json::json!({ "token": key, "hwid": hwid }),
            )
            .await;
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }
}
