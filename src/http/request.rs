//! Request assembly: the mutable pre-build request and its frozen wire
//! form.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::config::{ClientCert, RequestConfig, Verify, SUPPORTED_SCHEMES};
use crate::cookies::CookieStore;
use crate::error::{CourierError, Result};
use crate::http::auth::Auth;
use crate::merge::{BagValue, SettingsBag};

/// Request body, encoded by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Bytes(Vec<u8>),
    Text(String),
    /// URL-encoded form fields.
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

/// One file destined for a multipart upload. Encoding is delegated to the
/// transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub path: PathBuf,
}

impl FilePart {
    pub fn new(field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        FilePart {
            field: field.into(),
            path: path.into(),
        }
    }
}

/// The mutable request value assembled from session defaults and per-call
/// overrides. This is what `args` hooks observe and mutate; building it
/// produces the immutable [`PreparedRequest`].
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub params: SettingsBag,
    pub headers: SettingsBag,
    /// Working jar for this one request, already merged and purged.
    pub cookies: CookieStore,
    pub data: Option<Body>,
    pub files: Vec<FilePart>,
    pub auth: Option<Auth>,
    pub timeout: Option<Duration>,
    pub allow_redirects: bool,
    pub proxies: SettingsBag,
    pub config: RequestConfig,
    pub prefetch: bool,
    pub verify: Verify,
    pub cert: Option<ClientCert>,
}

/// Fully resolved, wire-ready request.
///
/// Built without side effects; no I/O happens until a transport accepts
/// it. Registered `pre_request` hooks get the last look at the header set
/// before the send; the session keeps no mutable alias once the transport
/// has it.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: String,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    files: Vec<FilePart>,
    timeout: Option<Duration>,
    allow_redirects: bool,
    max_redirects: u32,
    proxies: Vec<(String, String)>,
    verify: Verify,
    cert: Option<ClientCert>,
    prefetch: bool,
    config: RequestConfig,
}

impl PreparedRequest {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
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

    /// Insert or replace a header, preserving its position when replacing.
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = value,
            None => self.headers.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn allow_redirects(&self) -> bool {
        self.allow_redirects
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    pub fn proxies(&self) -> &[(String, String)] {
        &self.proxies
    }

    pub fn proxy_for(&self, scheme: &str) -> Option<&str> {
        self.proxies
            .iter()
            .find(|(k, _)| k == scheme)
            .map(|(_, v)| v.as_str())
    }

    pub fn verify(&self) -> &Verify {
        &self.verify
    }

    pub fn cert(&self) -> Option<&ClientCert> {
        self.cert.as_ref()
    }

    pub fn prefetch(&self) -> bool {
        self.prefetch
    }

    /// Advisory configuration for the transport (pool sizing, keep-alive,
    /// environment trust).
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }
}

/// Builds a [`PreparedRequest`] from a merged [`Request`].
pub struct RequestBuilder;

impl RequestBuilder {
    /// Validate and freeze a request. Never performs I/O.
    pub fn build(request: &Request) -> Result<PreparedRequest> {
        let method = request.method.trim().to_ascii_uppercase();
        let url = Self::parse_url(&request.url)?;
        let url = Self::encode_params(url, &request.params);

        let mut prepared = PreparedRequest {
            method,
            url,
            headers: Self::expand_headers(&request.headers),
            body: request.data.clone(),
            files: request.files.clone(),
            timeout: request.timeout,
            allow_redirects: request.allow_redirects,
            max_redirects: request.config.max_redirects_or_default(),
            proxies: request
                .proxies
                .iter()
                .filter_map(|(k, v)| v.expand().map(|v| (k.to_string(), v)))
                .collect(),
            verify: request.verify.clone(),
            cert: request.cert.clone(),
            prefetch: request.prefetch,
            config: request.config.clone(),
        };

        if let Some(auth) = &request.auth {
            prepared.insert_header("authorization", auth.header_value());
        }

        Self::resolve_cookie_header(&mut prepared, &request.cookies);

        Ok(prepared)
    }

    fn parse_url(input: &str) -> Result<Url> {
        if input.trim().is_empty() {
            return Err(CourierError::UrlRequired);
        }
        if !input.contains("://") {
            return Err(CourierError::MissingSchema(input.to_string()));
        }
        let url = Url::parse(input)
            .map_err(|e| CourierError::InvalidUrl(format!("{}: {}", input, e)))?;
        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(CourierError::InvalidSchema(url.scheme().to_string()));
        }
        Ok(url)
    }

    /// Append query parameters; a multi-valued entry contributes one pair
    /// per element.
    fn encode_params(mut url: Url, params: &SettingsBag) -> Url {
        if params.is_empty() {
            return url;
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params.iter() {
                match value {
                    BagValue::One(v) => {
                        pairs.append_pair(key, v);
                    }
                    BagValue::Many(vs) => {
                        for v in vs {
                            pairs.append_pair(key, v);
                        }
                    }
                    BagValue::Unset => {}
                }
            }
        }
        url
    }

    /// Expand the header bag to its ordered wire form, skipping unset
    /// sentinels that survived merging.
    fn expand_headers(headers: &SettingsBag) -> Vec<(String, String)> {
        headers
            .iter()
            .filter_map(|(k, v)| v.expand().map(|v| (k.to_string(), v)))
            .collect()
    }

    /// Merge the working jar into the `Cookie` header, respecting an
    /// explicitly supplied one.
    fn resolve_cookie_header(prepared: &mut PreparedRequest, jar: &CookieStore) {
        let Some(jar_value) = jar.cookie_header() else {
            return;
        };
        let value = match prepared.header("cookie") {
            Some(existing) => format!("{}; {}", existing, jar_value),
            None => jar_value,
        };
        prepared.insert_header("cookie", value);
    }
}
