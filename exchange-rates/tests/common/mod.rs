//! Scripted upstream for provider tests.
//!
//! An axum router bound to `127.0.0.1:0` that answers every request with the
//! next queued response (or the fallback once the queue is empty) and records
//! the path and query of each request it sees.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{Router, extract::State, http::StatusCode, http::Uri};

#[derive(Default)]
struct Script {
    queue: Mutex<VecDeque<(StatusCode, String)>>,
    fallback: Mutex<Option<(StatusCode, String)>>,
    requests: Mutex<Vec<String>>,
}

pub struct Upstream {
    pub base_url: String,
    script: Arc<Script>,
}

async fn respond(State(script): State<Arc<Script>>, uri: Uri) -> (StatusCode, String) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    script.requests.lock().unwrap().push(target);

    if let Some(next) = script.queue.lock().unwrap().pop_front() {
        return next;
    }
    script
        .fallback
        .lock()
        .unwrap()
        .clone()
        .unwrap_or((StatusCode::NOT_FOUND, "no scripted response".to_string()))
}

impl Upstream {
    pub async fn start() -> Self {
        let script = Arc::new(Script::default());
        let app = Router::new().fallback(respond).with_state(script.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            script,
        }
    }

    /// Queues one response.
    pub fn push(&self, status: u16, body: impl Into<String>) -> &Self {
        self.script
            .queue
            .lock()
            .unwrap()
            .push_back((StatusCode::from_u16(status).unwrap(), body.into()));
        self
    }

    /// Response served once the queue is drained.
    pub fn always(&self, status: u16, body: impl Into<String>) -> &Self {
        *self.script.fallback.lock().unwrap() =
            Some((StatusCode::from_u16(status).unwrap(), body.into()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.script.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.requests.lock().unwrap().len()
    }
}
