#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use taskdeck_api::app::{router, AppState};
use taskdeck_api::auth::{generate_jwt, Claims};
use taskdeck_api::config;
use taskdeck_api::database::models::User;
use taskdeck_api::database::{IdentityStore, MemoryStore};
use taskdeck_api::services::{LogNotifier, ServiceContext};

/// The full router over a fresh in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> Result<Uuid> {
        let raw = self.data()["id"].as_str().context("response has no data.id")?;
        Ok(Uuid::parse_str(raw)?)
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let cfg = config::config();
        let services = ServiceContext::new(
            store.clone(),
            store.clone(),
            Arc::new(LogNotifier),
            cfg.generation.clone(),
        );
        let router = router(AppState::new(services), cfg);
        Self { router, store }
    }

    pub async fn user(&self, email: &str) -> Result<TestUser> {
        self.insert_user(User::new(email, email.split('@').next().unwrap_or(email))).await
    }

    pub async fn super_admin(&self, email: &str) -> Result<TestUser> {
        let mut user = User::new(email, "Platform Admin");
        user.is_super_admin = true;
        self.insert_user(user).await
    }

    async fn insert_user(&self, user: User) -> Result<TestUser> {
        self.store.insert_user(&user).await?;
        let token = generate_jwt(&Claims::for_user(&user))?;
        Ok(TestUser { user, token })
    }

    pub async fn send(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<Reply> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {:?}", bytes))?
        };
        Ok(Reply { status, body })
    }

    pub async fn get(&self, path: &str, who: &TestUser) -> Result<Reply> {
        self.send(Method::GET, path, Some(&who.token), None).await
    }

    pub async fn post(&self, path: &str, who: &TestUser, body: Value) -> Result<Reply> {
        self.send(Method::POST, path, Some(&who.token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, who: &TestUser, body: Value) -> Result<Reply> {
        self.send(Method::PATCH, path, Some(&who.token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, who: &TestUser) -> Result<Reply> {
        self.send(Method::DELETE, path, Some(&who.token), None).await
    }

    /// Create a workspace and return its id
    pub async fn workspace(&self, owner: &TestUser, name: &str) -> Result<Uuid> {
        let reply = self.post("/api/workspaces", owner, serde_json::json!({ "name": name })).await?;
        anyhow::ensure!(reply.status == StatusCode::CREATED, "workspace create failed: {}", reply.body);
        reply.id()
    }

    /// Invite `who` into `workspace_id` with `role`, as `by`
    pub async fn join(&self, workspace_id: Uuid, by: &TestUser, who: &TestUser, role: &str) -> Result<()> {
        let reply = self
            .post(
                &format!("/api/workspaces/{}/members", workspace_id),
                by,
                serde_json::json!({ "email": who.user.email, "role": role }),
            )
            .await?;
        anyhow::ensure!(reply.status == StatusCode::CREATED, "invite failed: {}", reply.body);
        Ok(())
    }

    pub async fn project(&self, workspace_id: Uuid, by: &TestUser, name: &str) -> Result<Reply> {
        self.post(
            &format!("/api/workspaces/{}/projects", workspace_id),
            by,
            serde_json::json!({ "name": name }),
        )
        .await
    }
}
