//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use todo_service::config::{AppConfig, Environment, StoreBackend};
use todo_service::error::{ApiError, ApiResult};
use todo_service::http::{build_router, AppState, HttpServer};
use todo_service::lifecycle::Shutdown;
use todo_service::store::{MemoryTodoStore, TodoStore};
use todo_service::todos::{NewTodo, Todo, TodoGateway, TodoId, TodoPatch};

pub const PREFIX: &str = "/api/v1";

/// Config for tests: in-memory store, test environment.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.environment = Environment::Test;
    config.database.backend = StoreBackend::Memory;
    config
}

/// Router over a fresh in-memory store.
pub fn test_app(config: AppConfig) -> Router {
    app_with_store(config, Arc::new(MemoryTodoStore::new()))
}

pub fn app_with_store(config: AppConfig, store: Arc<dyn TodoStore>) -> Router {
    build_router(AppState::new(config, TodoGateway::new(store)))
}

pub fn todos_uri(suffix: &str) -> String {
    format!("{PREFIX}/todos{suffix}")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> axum::body::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// A running server on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_server(config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let gateway = TodoGateway::new(Arc::new(MemoryTodoStore::new()));
    let server = HttpServer::new(config, gateway);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A store whose every operation fails with the given error.
pub struct FailingStore(pub ApiError);

#[async_trait]
impl TodoStore for FailingStore {
    async fn list(&self, _limit: u32) -> ApiResult<Vec<Todo>> {
        Err(self.0.clone())
    }

    async fn get(&self, _id: &TodoId) -> ApiResult<Todo> {
        Err(self.0.clone())
    }

    async fn create(&self, _todo: NewTodo) -> ApiResult<Todo> {
        Err(self.0.clone())
    }

    async fn update(&self, _id: &TodoId, _patch: TodoPatch) -> ApiResult<Todo> {
        Err(self.0.clone())
    }

    async fn update_completion(&self, _id: &TodoId, _completed: bool) -> ApiResult<Todo> {
        Err(self.0.clone())
    }

    async fn delete(&self, _id: &TodoId) -> ApiResult<bool> {
        Err(self.0.clone())
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

/// A store that never answers within a test's patience.
pub struct StalledStore;

#[async_trait]
impl TodoStore for StalledStore {
    async fn list(&self, _limit: u32) -> ApiResult<Vec<Todo>> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn get(&self, id: &TodoId) -> ApiResult<Todo> {
        Err(ApiError::not_found(id.to_string()))
    }

    async fn create(&self, _todo: NewTodo) -> ApiResult<Todo> {
        Err(ApiError::Internal("unused".into()))
    }

    async fn update(&self, _id: &TodoId, _patch: TodoPatch) -> ApiResult<Todo> {
        Err(ApiError::Internal("unused".into()))
    }

    async fn update_completion(&self, _id: &TodoId, _completed: bool) -> ApiResult<Todo> {
        Err(ApiError::Internal("unused".into()))
    }

    async fn delete(&self, _id: &TodoId) -> ApiResult<bool> {
        Err(ApiError::Internal("unused".into()))
    }

    fn backend(&self) -> &'static str {
        "stalled"
    }
}
