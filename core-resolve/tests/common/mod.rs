//! Shared test support: a scripted HTTP client standing in for the network.
//!
//! Replies are served in FIFO order, one per `execute` call, and every
//! request is recorded so tests can assert on URLs, headers, and call counts.

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

enum Reply {
    Response {
        status: u16,
        final_url: Option<String>,
        body: Bytes,
    },
    Error(String),
}

pub struct ScriptedHttpClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a JSON body with the given status. The final URL echoes the
    /// request URL.
    pub fn push_json(&self, status: u16, body: &str) {
        self.replies.lock().unwrap().push_back(Reply::Response {
            status,
            final_url: None,
            body: Bytes::from(body.to_string()),
        });
    }

    /// Queue an empty-bodied reply with the given status.
    pub fn push_status(&self, status: u16) {
        self.replies.lock().unwrap().push_back(Reply::Response {
            status,
            final_url: None,
            body: Bytes::new(),
        });
    }

    /// Queue a reply whose redirect chain landed on `final_url`.
    pub fn push_redirected(&self, status: u16, final_url: &str) {
        self.replies.lock().unwrap().push_back(Reply::Response {
            status,
            final_url: Some(final_url.to_string()),
            body: Bytes::new(),
        });
    }

    /// Queue a transport-level failure.
    pub fn push_error(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Error(message.to_string()));
    }

    /// Every request executed so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted client ran out of replies");

        match reply {
            Reply::Response {
                status,
                final_url,
                body,
            } => Ok(HttpResponse {
                status,
                final_url: final_url.unwrap_or(request.url),
                headers: HashMap::new(),
                body,
            }),
            Reply::Error(message) => Err(BridgeError::OperationFailed(message)),
        }
    }
}
