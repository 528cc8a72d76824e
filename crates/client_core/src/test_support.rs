//! In-process fake of the wallet API for controller and gateway tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use serde_json::Value;
use storage::MemoryStore;
use tokio::net::TcpListener;

use crate::{HttpGateway, Session, WalletContext};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeInner {
    routes: HashMap<(Method, String), (StatusCode, String)>,
    requests: Vec<Recorded>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeApi {
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) -> &Self {
        self.respond_raw(method, path, status, body.to_string())
    }

    pub fn respond_raw(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        body: impl Into<String>,
    ) -> &Self {
        self.inner
            .lock()
            .expect("fake api lock")
            .routes
            .insert((method, path.to_string()), (status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().expect("fake api lock").requests.clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.path == path)
            .and_then(|r| r.body)
    }
}

async fn handle(
    State(api): State<FakeApi>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    let mut inner = api.inner.lock().expect("fake api lock");
    inner.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });
    let (status, body) = inner
        .routes
        .get(&(method, path))
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, r#"{"message":"not found"}"#.to_string()));
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

pub async fn spawn_fake_api() -> (String, FakeApi) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let api = FakeApi::default();
    let app = Router::new().fallback(handle).with_state(api.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), api)
}

/// Context talking to `base_url`, with a session restored from `store`.
pub async fn context_for(base_url: &str, store: Arc<MemoryStore>) -> WalletContext {
    let gateway = HttpGateway::new(base_url).expect("gateway");
    let session = Session::restore(store).await.expect("session");
    WalletContext::new(Arc::new(gateway), Arc::new(session))
}

/// Fake API plus a context already holding token `abc`.
pub async fn signed_in() -> (FakeApi, WalletContext, Arc<MemoryStore>) {
    let (url, api) = spawn_fake_api().await;
    let store = Arc::new(MemoryStore::with_token("abc"));
    let ctx = context_for(&url, store.clone()).await;
    (api, ctx, store)
}

/// Fake API plus a context without any stored token.
pub async fn signed_out() -> (FakeApi, WalletContext, Arc<MemoryStore>) {
    let (url, api) = spawn_fake_api().await;
    let store = Arc::new(MemoryStore::new());
    let ctx = context_for(&url, store.clone()).await;
    (api, ctx, store)
}

pub fn sample_plans() -> Value {
    serde_json::json!([
        { "id": 3, "name": "Airtime 100", "type": "airtime", "value": 100, "price": "1.00" },
        { "id": 7, "name": "Pass 1GB", "type": "data", "value": 1024, "price": 2.5 }
    ])
}
