//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - In-memory store seeded with a two-conference fixture
//! - JWT token generation
//! - Request helpers returning status and JSON body

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hamayesh_api::app::{build_router, AppState};
use hamayesh_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use hamayesh_shared::auth::jwt::{create_token, Claims, TokenType};
use hamayesh_shared::models::category::{Category, CreateCategory};
use hamayesh_shared::models::conference::Conference;
use hamayesh_shared::models::person::{CreatePerson, Person};
use hamayesh_shared::models::task::{CreateTask, Task};
use hamayesh_shared::store::memory::MemoryStore;
use serde_json::Value;
use std::sync::Arc;
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
    pub config: Config,
    pub jwt_token: String,
}

/// Conferences X and Y with their tasks, a VIP category in X and two members
pub struct Fixture {
    pub conf_x: Conference,
    pub conf_y: Conference,
    pub task_a: Task,
    pub task_b: Task,
    pub task_c: Task,
    pub vip: Category,
    pub alice: Person,
    pub bob: Person,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://localhost/hamayesh_test".to_string(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_seconds: 1,
            idle_timeout_seconds: None,
            max_lifetime_seconds: None,
            run_migrations: false,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

impl TestContext {
    /// Creates a new test context backed by an empty in-memory store
    pub fn new() -> anyhow::Result<Self> {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());

        let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        let jwt_token = create_token(&claims, &config.jwt.secret)?;

        let state = AppState::new(store.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            store,
            app,
            config,
            jwt_token,
        })
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Seeds the two-conference fixture
    pub async fn seed(&self) -> Fixture {
        let conf_x = self.store.create_conference("Conference X").await;
        let conf_y = self.store.create_conference("Conference Y").await;

        let task_a = self.store.create_task(CreateTask::new(conf_x.id, "Check-in")).await;
        let task_b = self.store.create_task(CreateTask::new(conf_x.id, "Badge pickup")).await;
        let task_c = self.store.create_task(CreateTask::new(conf_y.id, "Workshop")).await;

        let vip = self
            .store
            .create_category(
                CreateCategory {
                    conference_id: conf_x.id,
                    name: "VIP".to_string(),
                    description: None,
                },
                vec![task_a.id],
            )
            .await;

        let alice = self.person(&conf_x, Some(vip.id), "ATT-0001", "Alice").await;
        let bob = self.person(&conf_x, Some(vip.id), "ATT-0002", "Bob").await;

        Fixture {
            conf_x,
            conf_y,
            task_a,
            task_b,
            task_c,
            vip,
            alice,
            bob,
        }
    }

    /// Registers a person
    pub async fn person(
        &self,
        conference: &Conference,
        category_id: Option<Uuid>,
        code: &str,
        first_name: &str,
    ) -> Person {
        self.store
            .create_person(CreatePerson {
                conference_id: conference.id,
                category_id,
                unique_code: code.to_string(),
                first_name: first_name.to_string(),
                last_name: "Tester".to_string(),
                email: None,
                telephone: "+100000000".to_string(),
            })
            .await
    }

    /// Sends an authenticated request and returns status and JSON body
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", self.auth_header());
        self.dispatch(builder, body).await
    }

    /// Sends an authenticated request with a literal body and optional content type
    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", self.auth_header());
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }

        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.call(request).await
    }

    /// Sends a request without credentials
    pub async fn send_anonymous(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        self.dispatch(builder, None).await
    }

    async fn dispatch(
        &self,
        builder: axum::http::request::Builder,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }
}

/// Parses a JSON array of UUID strings
pub fn uuids(value: &Value) -> Vec<Uuid> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(|s| Uuid::parse_str(s).ok())
                .collect()
        })
        .unwrap_or_default()
}
