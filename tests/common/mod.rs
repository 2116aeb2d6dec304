#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_reports_api::app::{app, AppState};
use storefront_reports_api::auth::{Claims, JwtKeys};
use storefront_reports_api::configuration::{ConfigStore, StoreOptions};
use storefront_reports_api::crypto::{ConfigCipher, ServerSecret};
use storefront_reports_api::database::MemoryPersistence;

const TEST_SECRET: &[u8] = b"integration-secret-at-least-32-bytes";
const TEST_JWT_SECRET: &[u8] = b"integration-jwt-secret";

/// One in-process server per test; no port or database needed
pub struct TestApp {
    pub router: Router,
    pub persistence: Arc<MemoryPersistence>,
    pub jwt: Arc<JwtKeys>,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let persistence = Arc::new(MemoryPersistence::new());
        let cipher = ConfigCipher::new(ServerSecret::new(TEST_SECRET.to_vec())?);
        let store = ConfigStore::new(persistence.clone(), cipher, StoreOptions::default());
        let jwt = Arc::new(JwtKeys::new(TEST_JWT_SECRET));

        let state = AppState {
            store: Arc::new(store),
            persistence: persistence.clone(),
            jwt: jwt.clone(),
            max_rows: 100,
            persistence_timeout: Duration::from_secs(5),
        };

        Ok(Self {
            router: app(state),
            persistence,
            jwt,
        })
    }

    /// Register a user row and mint a token for it
    pub async fn login(&self, access: &str, company: &str, store: Option<&str>) -> Result<(Uuid, String)> {
        let user_id = Uuid::new_v4();
        self.persistence.add_user(user_id).await;
        let token = self.token_for(user_id, access, company, store)?;
        Ok((user_id, token))
    }

    pub fn token_for(&self, user_id: Uuid, access: &str, company: &str, store: Option<&str>) -> Result<String> {
        Ok(self.jwt.generate(&Claims::new(user_id, access, company, store, 1))?)
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => request.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, json))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, uri, Some(token), None).await
    }
}
