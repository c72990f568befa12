//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use enrollhub_api::{AppState, build_app};
use enrollhub_core::config::AppConfig;
use enrollhub_database::MemoryStore;

/// A caller identity sent through the actor headers.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub id: Uuid,
    pub role: &'static str,
}

impl Caller {
    pub fn parent() -> Self {
        Self {
            id: Uuid::now_v7(),
            role: "parent",
        }
    }

    pub fn tutor() -> Self {
        Self {
            id: Uuid::now_v7(),
            role: "tutor",
        }
    }

    pub fn admin() -> Self {
        Self {
            id: Uuid::now_v7(),
            role: "admin",
        }
    }

    pub fn system() -> Self {
        Self {
            id: Uuid::now_v7(),
            role: "system",
        }
    }
}

/// Response captured from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The machine-readable code of an error body.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Test application over a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        Self {
            router: build_app(state.clone()),
            state,
        }
    }

    /// Send a request through a clone of the router.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        caller: Option<Caller>,
    ) -> TestResponse {
        send(self.router.clone(), method, path, body, caller).await
    }

    /// Register a program owned by `tutor` and return its ID.
    pub async fn program(&self, tutor: Caller) -> Uuid {
        let response = self
            .request(
                "POST",
                "/api/programs",
                Some(json!({ "title": "Robotics for Kids" })),
                Some(tutor),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        id_of(response.data())
    }

    /// Create a weekend batch with `max_students` seats and return its ID.
    pub async fn batch(&self, tutor: Caller, program_id: Uuid, max_students: i32) -> Uuid {
        let response = self
            .request(
                "POST",
                "/api/batches",
                Some(batch_body(program_id, max_students)),
                Some(tutor),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        id_of(response.data())
    }

    /// Register a student for `parent` and return its ID.
    pub async fn student(&self, parent: Caller, first_name: &str) -> Uuid {
        let response = self
            .request(
                "POST",
                "/api/students",
                Some(json!({ "first_name": first_name, "last_name": "Sharma" })),
                Some(parent),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        id_of(response.data())
    }

    /// Attempt a booking and return the raw response.
    pub async fn book(
        &self,
        parent: Caller,
        student_id: Uuid,
        program_id: Uuid,
        batch_id: Uuid,
    ) -> TestResponse {
        self.request(
            "POST",
            "/api/bookings",
            Some(booking_body(student_id, program_id, batch_id)),
            Some(parent),
        )
        .await
    }

    /// Fetch a batch's availability summary.
    pub async fn availability(&self, batch_id: Uuid) -> Value {
        let response = self
            .request(
                "GET",
                &format!("/api/batches/{batch_id}/availability"),
                None,
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.data().clone()
    }
}

/// Send one request into `router`.
pub async fn send(
    router: Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    caller: Option<Caller>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(caller) = caller {
        builder = builder
            .header("x-actor-id", caller.id.to_string())
            .header("x-actor-role", caller.role);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse { status, body }
}

pub fn batch_body(program_id: Uuid, max_students: i32) -> Value {
    json!({
        "program_id": program_id,
        "name": "Weekend Batch",
        "start_date": "2026-01-05",
        "end_date": "2026-03-06",
        "days": ["saturday", "sunday"],
        "start_time": "10:00:00",
        "end_time": "11:30:00",
        "max_students": max_students,
    })
}

pub fn booking_body(student_id: Uuid, program_id: Uuid, batch_id: Uuid) -> Value {
    json!({
        "student_id": student_id,
        "program_id": program_id,
        "batch_id": batch_id,
        "amount_cents": 12_000,
    })
}

/// Parse the `id` field of a returned entity.
pub fn id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("no id in {value}"))
}
