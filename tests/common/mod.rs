//! Fake geolocation API shared by the integration tests
#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeApi {
    answers: HashMap<String, (StatusCode, String)>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `ip` with a JSON body carrying the given location
    pub fn location(mut self, ip: &str, country: &str, city: &str, region: &str) -> Self {
        let body = serde_json::json!({
            "ip": ip,
            "country": country,
            "city": city,
            "region": region,
        })
        .to_string();
        self.answers.insert(ip.to_string(), (StatusCode::OK, body));
        self
    }

    /// Answer `ip` with an arbitrary status and body
    pub fn raw(mut self, ip: &str, status: StatusCode, body: &str) -> Self {
        self.answers
            .insert(ip.to_string(), (status, body.to_string()));
        self
    }
}

async fn answer(State(api): State<Arc<FakeApi>>, Path(ip): Path<String>) -> Response {
    api.requests.lock().unwrap().push(ip.clone());
    match api.answers.get(&ip) {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "unknown address").into_response(),
    }
}

/// Serve `api` on an ephemeral port and return its base URL
pub async fn spawn(api: Arc<FakeApi>) -> String {
    let app = Router::new()
        .route("/{ip}/json", get(answer))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
