//! HTTP response surface.

use std::fmt;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::http::request::PreparedRequest;
use crate::transport::{RawBody, RawResponse};

/// A response as returned to the caller: status, ordered headers, body,
/// and the originating prepared request for diagnostics.
///
/// The body is eagerly materialized when the request ran with `prefetch`
/// on; otherwise it streams from the transport on first access.
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    stream: Option<BoxStream<'static, Result<Bytes>>>,
    content: Option<Bytes>,
    request: PreparedRequest,
}

impl Response {
    pub(crate) fn new(raw: RawResponse, request: PreparedRequest) -> Self {
        let (stream, content) = match raw.body {
            RawBody::Full(bytes) => (None, Some(bytes)),
            RawBody::Stream(stream) => (Some(stream), None),
        };
        Response {
            status: raw.status,
            headers: raw.headers,
            stream,
            content,
            request,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// True below the client/server error range.
    pub fn ok(&self) -> bool {
        self.status < 400
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The request this response answers. Diagnostics context only; the
    /// session keeps no alias.
    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    /// Body bytes when already materialized; `None` while still pending.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Drain the transport stream into memory. No-op when already loaded.
    pub async fn load(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            let mut buf = Vec::new();
            while let Some(chunk) = stream.next().await {
                buf.extend_from_slice(&chunk?);
            }
            self.content = Some(Bytes::from(buf));
        }
        Ok(())
    }

    pub async fn bytes(&mut self) -> Result<Bytes> {
        self.load().await?;
        Ok(self.content.clone().unwrap_or_default())
    }

    pub async fn text(&mut self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("url", &self.request.url().as_str())
            .field("headers", &self.headers.len())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
