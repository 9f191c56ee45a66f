//! Transport capability: the external collaborator that performs the
//! actual network send.
//!
//! The session layer only ever talks to the [`Transport`] trait.
//! [`ReqwestTransport`] is the production implementation; tests substitute
//! in-memory transports.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};

use crate::config::{ClientCert, Verify};
use crate::error::{CourierError, Result};
use crate::http::request::{Body, PreparedRequest};

/// Response body handed back by a transport.
pub enum RawBody {
    Full(Bytes),
    Stream(BoxStream<'static, Result<Bytes>>),
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawBody::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            RawBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Transport-level response: status, ordered headers, body handle.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: RawBody,
}

impl RawResponse {
    /// Eagerly-bodied response, mainly for tests and mock transports.
    pub fn full(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        RawResponse {
            status,
            headers,
            body: RawBody::Full(body.into()),
        }
    }
}

/// Accepts a prepared request and returns a raw response, or fails with a
/// transport-level error (connection, TLS, timeout and friends).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse>;

    /// Release pooled resources held by the transport.
    async fn close(&self) {}
}

/// Production transport backed by reqwest.
///
/// A client is configured per send from the prepared request's redirect
/// policy, proxies and TLS options; connection reuse is therefore scoped
/// to a single send and its redirect chain.
#[derive(Debug, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        ReqwestTransport
    }

    fn client_for(&self, request: &PreparedRequest) -> Result<reqwest::Client> {
        let config = request.config();
        let mut builder = reqwest::Client::builder().redirect(if request.allow_redirects() {
            reqwest::redirect::Policy::limited(request.max_redirects() as usize)
        } else {
            reqwest::redirect::Policy::none()
        });

        if let Some(max) = config.pool_maxsize {
            builder = builder.pool_max_idle_per_host(max);
        }
        if config.keep_alive == Some(false) {
            builder = builder.pool_max_idle_per_host(0);
        }
        // no_proxy() clears explicit proxies as well, so it must precede
        // the proxy loop.
        if config.trust_env == Some(false) {
            builder = builder.no_proxy();
        }

        for (scheme, target) in request.proxies() {
            let proxy = match scheme.as_str() {
                "http" => reqwest::Proxy::http(target),
                "https" => reqwest::Proxy::https(target),
                _ => reqwest::Proxy::all(target),
            }
            .map_err(|e| CourierError::Proxy(format!("invalid proxy {}: {}", target, e)))?;
            builder = builder.proxy(proxy);
        }

        match request.verify() {
            Verify::Enabled => {}
            Verify::Disabled => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            Verify::CaBundle(path) => {
                let pem = std::fs::read(path)?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    CourierError::Ssl(format!("invalid CA bundle {}: {}", path.display(), e))
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        if let Some(cert) = request.cert() {
            let pem = match cert {
                ClientCert::Pem(path) => std::fs::read(path)?,
                ClientCert::PemPair { cert, key } => {
                    let mut buf = std::fs::read(cert)?;
                    buf.extend(std::fs::read(key)?);
                    buf
                }
            };
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| CourierError::Ssl(format!("invalid client certificate: {}", e)))?;
            builder = builder.identity(identity);
        }

        builder
            .build()
            .map_err(|e| CourierError::Connection(format!("failed to build client: {}", e)))
    }

    async fn apply_body(
        request: &PreparedRequest,
        mut rb: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder> {
        if !request.files().is_empty() {
            let mut form = reqwest::multipart::Form::new();
            if let Some(Body::Form(fields)) = request.body() {
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
            }
            for part in request.files() {
                let bytes = tokio::fs::read(&part.path).await?;
                let file_name = part
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "file".to_string());
                form = form.part(
                    part.field.clone(),
                    reqwest::multipart::Part::bytes(bytes).file_name(file_name),
                );
            }
            return Ok(rb.multipart(form));
        }

        if let Some(body) = request.body() {
            rb = match body {
                Body::Bytes(bytes) => rb.body(bytes.clone()),
                Body::Text(text) => rb.body(text.clone()),
                Body::Form(fields) => rb.form(fields),
                Body::Json(value) => rb.json(value),
            };
        }
        Ok(rb)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse> {
        let client = self.client_for(request)?;
        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|e| CourierError::Connection(format!("invalid method: {}", e)))?;

        let mut rb = client.request(method, request.url().clone());
        for (name, value) in request.headers() {
            rb = rb.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout() {
            rb = rb.timeout(timeout);
        }
        rb = Self::apply_body(request, rb).await?;

        log::debug!("{} {}", request.method(), request.url());
        let response = rb.send().await.map_err(|e| classify(e, request))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = if request.prefetch() {
            RawBody::Full(response.bytes().await.map_err(classify_body)?)
        } else {
            RawBody::Stream(response.bytes_stream().map_err(classify_body).boxed())
        };

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Map a reqwest send error onto the transport error taxonomy.
fn classify(err: reqwest::Error, request: &PreparedRequest) -> CourierError {
    let url = request.url();
    if err.is_timeout() {
        return CourierError::Timeout(format!("{}: {}", url, err));
    }
    if err.is_redirect() {
        return CourierError::TooManyRedirects(request.max_redirects() as usize);
    }
    if chain_contains(&err, "proxy") {
        return CourierError::Proxy(format!("{}: {}", url, err));
    }
    if chain_contains(&err, "certificate")
        || chain_contains(&err, "tls")
        || chain_contains(&err, "ssl")
    {
        return CourierError::Ssl(format!("{}: {}", url, err));
    }
    if err.is_decode() {
        return CourierError::ContentDecoding(format!("{}: {}", url, err));
    }
    CourierError::Connection(format!("{}: {}", url, err))
}

/// Map a body-read error onto the taxonomy.
fn classify_body(err: reqwest::Error) -> CourierError {
    if err.is_timeout() {
        return CourierError::Timeout(err.to_string());
    }
    if chain_contains(&err, "chunk") {
        return CourierError::ChunkedEncoding(err.to_string());
    }
    if err.is_decode() {
        return CourierError::ContentDecoding(err.to_string());
    }
    CourierError::Connection(err.to_string())
}

fn chain_contains(err: &reqwest::Error, needle: &str) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if e.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }
        current = e.source();
    }
    false
}
