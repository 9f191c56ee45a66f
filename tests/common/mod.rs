#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use courier::{CourierError, PreparedRequest, RawResponse, Result, Transport};

type Reply = Box<dyn Fn() -> Result<RawResponse> + Send + Sync>;

/// In-memory transport that records every prepared request it receives.
pub struct MockTransport {
    pub sends: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<PreparedRequest>>>,
    reply: Reply,
}

impl MockTransport {
    pub fn ok(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::with_reply(move || {
            Ok(RawResponse::full(
                status,
                vec![("content-type".to_string(), "text/plain".to_string())],
                body.clone(),
            ))
        })
    }

    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> CourierError + Send + Sync + 'static,
    {
        Self::with_reply(move || Err(make_error()))
    }

    pub fn with_reply<F>(reply: F) -> Self
    where
        F: Fn() -> Result<RawResponse> + Send + Sync + 'static,
    {
        MockTransport {
            sends: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
            reply: Box::new(reply),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        (self.reply)()
    }
}
