#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use zanata_client::{
    ByteStream, ClientError, KeyFileAuthorizer, KeyFileCredentials, RawResponse, Request, Result,
    Session, Transport,
};

pub const DOMAIN: &str = "test_server";

pub const STORE: &str = "\
[servers]
test_server.url=http://zanata.test/
test_server.username=alice
test_server.key=secret-key
";

/// Canned behavior for one route
#[derive(Clone)]
pub enum Reply {
    /// Respond with a status and body
    Body(u16, String),
    /// Respond 200 with a body delivered in chunks that then stalls forever
    StallingBody(Vec<&'static str>),
    /// Never respond; acknowledge cancellation with `Cancelled`
    Pending,
    /// Wait for cancellation, then respond anyway
    IgnoresCancel(u16, String),
    /// Fail at the network level
    Fail(String),
    /// Respond with a status whose body breaks off with a network error
    BrokenBody(u16),
}

/// Transport that records requests and answers from a route table
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<Request>>,
    dispatched: Notify,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a reply for `"METHOD /path"`
    pub fn route(&self, key: &str, reply: Reply) {
        self.routes.lock().unwrap().insert(key.to_string(), reply);
    }

    pub fn json(&self, key: &str, body: serde_json::Value) {
        self.route(key, Reply::Body(200, body.to_string()));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Wait until a request has reached the transport
    pub async fn wait_dispatched(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.dispatched.notified())
            .await
            .expect("request was never dispatched");
    }
}

fn body(status: u16, body: String) -> RawResponse {
    RawResponse::from_bytes(status, body)
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: Request, cancel: &CancellationToken) -> Result<RawResponse> {
        let key = format!("{} {}", request.method, request.path());
        self.requests.lock().unwrap().push(request);
        self.dispatched.notify_one();

        let reply = self.routes.lock().unwrap().get(&key).cloned();
        match reply {
            None => Ok(body(404, format!("no route for {}", key))),
            Some(Reply::Body(status, text)) => Ok(body(status, text)),
            Some(Reply::StallingBody(chunks)) => {
                let chunks = stream::iter(
                    chunks
                        .into_iter()
                        .map(|c| Ok(Bytes::from_static(c.as_bytes()))),
                )
                .chain(stream::pending());
                let stream: ByteStream = Box::pin(chunks);
                Ok(RawResponse {
                    status: 200,
                    headers: Default::default(),
                    body: stream,
                })
            }
            Some(Reply::Pending) => {
                cancel.cancelled().await;
                Err(ClientError::Cancelled)
            }
            Some(Reply::IgnoresCancel(status, text)) => {
                cancel.cancelled().await;
                Ok(body(status, text))
            }
            Some(Reply::Fail(message)) => Err(ClientError::transport(message)),
            Some(Reply::BrokenBody(status)) => {
                let chunks = stream::iter(vec![
                    Ok(Bytes::from_static(b"partial")),
                    Err(ClientError::transport("connection reset")),
                ]);
                let stream: ByteStream = Box::pin(chunks);
                Ok(RawResponse {
                    status,
                    headers: Default::default(),
                    body: stream,
                })
            }
        }
    }
}

/// Session wired to `transport` with the test credential store
pub fn session(transport: &Arc<StubTransport>) -> Session {
    let credentials = KeyFileCredentials::from_ini_str(STORE).expect("valid store");
    Session::builder(KeyFileAuthorizer::new(credentials), DOMAIN)
        .shared_transport(transport.clone())
        .build()
        .expect("session")
}
