//! HTTP session module
//!
//! This module provides the [`Session`] object that manages and persists
//! settings across requests (headers, cookies, auth, proxies), and the
//! per-call [`PendingRequest`] builder its verb methods return.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::{default_headers, ClientCert, RequestConfig, Verify};
use crate::cookies::{request_jar, Cookie, CookieStore};
use crate::error::Result;
use crate::hooks::{HookMode, HookPipeline, HookResult};
use crate::merge::{merge_bags, merge_scalar, SettingsBag};
use crate::transport::{ReqwestTransport, Transport};

pub mod auth;
pub mod request;
pub mod response;

use auth::Auth;
use request::{Body, FilePart, PreparedRequest, Request, RequestBuilder};
use response::Response;

/// Long-lived holder of cross-request defaults, persistent cookies, and
/// the transport handle.
///
/// Verb methods return a [`PendingRequest`]; nothing touches the network
/// until its `send` is awaited. A session can serve concurrent requests:
/// the cookie store sits behind a read-mostly lock, and a request only
/// ever reads it. Per-request working jars are request-local; only the
/// explicit cookie-management calls write.
pub struct Session {
    headers: SettingsBag,
    cookies: RwLock<CookieStore>,
    auth: Option<Auth>,
    timeout: Option<Duration>,
    proxies: SettingsBag,
    params: SettingsBag,
    hooks: HookPipeline,
    config: RequestConfig,
    prefetch: bool,
    verify: Verify,
    cert: Option<ClientCert>,
    transport: Arc<dyn Transport>,
}

impl Session {
    /// Session with library defaults and the reqwest-backed transport.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Generic request entry point; the verb methods delegate here.
    pub fn request(&self, method: impl Into<String>, url: impl Into<String>) -> PendingRequest<'_> {
        PendingRequest::new(self, method.into(), url.into(), true)
    }

    pub fn get(&self, url: impl Into<String>) -> PendingRequest<'_> {
        PendingRequest::new(self, "GET".to_string(), url.into(), true)
    }

    pub fn options(&self, url: impl Into<String>) -> PendingRequest<'_> {
        PendingRequest::new(self, "OPTIONS".to_string(), url.into(), true)
    }

    /// HEAD requests do not follow redirects unless asked to.
    pub fn head(&self, url: impl Into<String>) -> PendingRequest<'_> {
        PendingRequest::new(self, "HEAD".to_string(), url.into(), false)
    }

    pub fn post(&self, url: impl Into<String>) -> PendingRequest<'_> {
        PendingRequest::new(self, "POST".to_string(), url.into(), true)
    }

    pub fn put(&self, url: impl Into<String>) -> PendingRequest<'_> {
        PendingRequest::new(self, "PUT".to_string(), url.into(), true)
    }

    pub fn patch(&self, url: impl Into<String>) -> PendingRequest<'_> {
        PendingRequest::new(self, "PATCH".to_string(), url.into(), true)
    }

    pub fn delete(&self, url: impl Into<String>) -> PendingRequest<'_> {
        PendingRequest::new(self, "DELETE".to_string(), url.into(), true)
    }

    /// Session-wide default headers.
    pub fn headers(&self) -> &SettingsBag {
        &self.headers
    }

    /// Snapshot of the session cookie store.
    pub fn cookies(&self) -> CookieStore {
        self.read_cookies().clone()
    }

    /// Add or replace a session cookie.
    pub fn add_cookie(&self, cookie: Cookie) {
        self.write_cookies().set(cookie);
    }

    /// Remove all session cookies with the given name.
    pub fn remove_cookie(&self, name: &str) {
        self.write_cookies().remove_by_name(name);
    }

    pub fn clear_cookies(&self) {
        self.write_cookies().clear();
    }

    /// Release transport resources. Dropping the session releases them on
    /// all exit paths as well; this is the explicit form.
    pub async fn close(&self) {
        self.transport.close().await;
    }

    fn read_cookies(&self) -> std::sync::RwLockReadGuard<'_, CookieStore> {
        self.cookies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_cookies(&self) -> std::sync::RwLockWriteGuard<'_, CookieStore> {
        self.cookies.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("headers", &self.headers.len())
            .field("cookies", &self.read_cookies().len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for [`Session`]. New sessions start from the library base
/// headers; `no_default_headers` drops them.
pub struct SessionBuilder {
    headers: SettingsBag,
    cookies: CookieStore,
    auth: Option<Auth>,
    timeout: Option<Duration>,
    proxies: SettingsBag,
    params: SettingsBag,
    hooks: HookPipeline,
    config: RequestConfig,
    prefetch: bool,
    verify: Verify,
    cert: Option<ClientCert>,
    transport: Option<Arc<dyn Transport>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        SessionBuilder {
            headers: default_headers(),
            cookies: CookieStore::new(),
            auth: None,
            timeout: None,
            proxies: SettingsBag::new(),
            params: SettingsBag::new(),
            hooks: HookPipeline::new(),
            config: RequestConfig::default(),
            prefetch: true,
            verify: Verify::Enabled,
            cert: None,
            transport: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<crate::merge::BagValue>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn no_default_headers(mut self) -> Self {
        self.headers = SettingsBag::for_headers();
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.set(Cookie::new(name, value));
        self
    }

    pub fn cookies(mut self, store: CookieStore) -> Self {
        self.cookies = store;
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(Auth::basic(username, password))
    }

    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.auth(Auth::bearer(token))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn proxy(mut self, scheme: &str, url: impl Into<String>) -> Self {
        self.proxies.set(scheme, url.into());
        self
    }

    pub fn param(mut self, name: &str, value: impl Into<crate::merge::BagValue>) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    pub fn verify(mut self, verify: Verify) -> Self {
        self.verify = verify;
        self
    }

    pub fn cert(mut self, cert: ClientCert) -> Self {
        self.cert = Some(cert);
        self
    }

    pub fn on_args<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Request) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_args(hook);
        self
    }

    pub fn on_pre_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PreparedRequest) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_pre_request(hook);
        self
    }

    pub fn on_post_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PreparedRequest) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_post_request(hook);
        self
    }

    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Response) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_response(hook);
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Session {
        Session {
            headers: self.headers,
            cookies: RwLock::new(self.cookies),
            auth: self.auth,
            timeout: self.timeout,
            proxies: self.proxies,
            params: self.params,
            hooks: self.hooks,
            config: self.config,
            prefetch: self.prefetch,
            verify: self.verify,
            cert: self.cert,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call overrides for one request, collected builder-style and merged
/// against the session defaults on `send` or `prepare`.
pub struct PendingRequest<'a> {
    session: &'a Session,
    method: String,
    url: String,
    params: SettingsBag,
    headers: SettingsBag,
    cookie_pairs: Vec<(String, Option<String>)>,
    cookie_jar: Option<CookieStore>,
    data: Option<Body>,
    files: Vec<FilePart>,
    auth: Option<Auth>,
    timeout: Option<Duration>,
    allow_redirects: Option<bool>,
    redirect_default: bool,
    proxies: SettingsBag,
    hooks: HookPipeline,
    hook_mode: HookMode,
    config: RequestConfig,
    prefetch: Option<bool>,
    verify: Option<Verify>,
    cert: Option<ClientCert>,
}

impl<'a> PendingRequest<'a> {
    fn new(session: &'a Session, method: String, url: String, redirect_default: bool) -> Self {
        PendingRequest {
            session,
            method,
            url,
            params: SettingsBag::new(),
            headers: SettingsBag::for_headers(),
            cookie_pairs: Vec::new(),
            cookie_jar: None,
            data: None,
            files: Vec::new(),
            auth: None,
            timeout: None,
            allow_redirects: None,
            redirect_default,
            proxies: SettingsBag::new(),
            hooks: HookPipeline::new(),
            hook_mode: HookMode::Append,
            config: RequestConfig::default(),
            prefetch: None,
            verify: None,
            cert: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<crate::merge::BagValue>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Remove a session-default header from this request.
    pub fn unset_header(mut self, name: &str) -> Self {
        self.headers.unset(name);
        self
    }

    pub fn param(mut self, name: &str, value: impl Into<crate::merge::BagValue>) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn unset_param(mut self, name: &str) -> Self {
        self.params.unset(name);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookie_pairs.push((name.into(), Some(value.into())));
        self
    }

    /// Keep a session cookie out of this one request.
    pub fn clear_cookie(mut self, name: impl Into<String>) -> Self {
        self.cookie_pairs.push((name.into(), None));
        self
    }

    pub fn cookies(mut self, store: CookieStore) -> Self {
        self.cookie_jar = Some(store);
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.data = Some(body.into());
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.data = Some(Body::Form(fields));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.data = Some(Body::Json(value));
        self
    }

    pub fn file(mut self, field: impl Into<String>, path: impl Into<std::path::PathBuf>) -> Self {
        self.files.push(FilePart::new(field, path));
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(Auth::basic(username, password))
    }

    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.auth(Auth::bearer(token))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }

    pub fn proxy(mut self, scheme: &str, url: impl Into<String>) -> Self {
        self.proxies.set(scheme, url.into());
        self
    }

    pub fn unset_proxy(mut self, scheme: &str) -> Self {
        self.proxies.unset(scheme);
        self
    }

    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = Some(prefetch);
        self
    }

    pub fn verify(mut self, verify: Verify) -> Self {
        self.verify = Some(verify);
        self
    }

    pub fn cert(mut self, cert: ClientCert) -> Self {
        self.cert = Some(cert);
        self
    }

    pub fn on_args<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Request) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_args(hook);
        self
    }

    pub fn on_pre_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PreparedRequest) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_pre_request(hook);
        self
    }

    pub fn on_post_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PreparedRequest) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_post_request(hook);
        self
    }

    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Response) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.on_response(hook);
        self
    }

    /// Substitute the per-call hook chains for the session chains instead
    /// of appending after them.
    pub fn replace_hooks(mut self) -> Self {
        self.hook_mode = HookMode::Replace;
        self
    }

    /// Merge, run `args` hooks, and build, without sending. The returned
    /// value is ready for a later transport hand-off and can be inspected
    /// for method, URL and headers.
    pub fn prepare(self) -> Result<PreparedRequest> {
        let (prepared, _hooks) = self.assemble()?;
        Ok(prepared)
    }

    /// Run the full request lifecycle and return the hook-processed
    /// response.
    pub async fn send(self) -> Result<Response> {
        let session = self.session;
        let (mut prepared, hooks) = self.assemble()?;

        hooks.run_pre_request(&mut prepared)?;

        log::debug!("{} {}", prepared.method(), prepared.url());
        let raw = session.transport.send(&prepared).await?;
        log::debug!(
            "{} {} -> {}",
            prepared.method(),
            prepared.url(),
            raw.status
        );

        hooks.run_post_request(&mut prepared)?;

        let mut response = Response::new(raw, prepared);
        if response.request().prefetch() {
            response.load().await?;
        }
        hooks.run_response(&mut response)?;
        Ok(response)
    }

    /// Options merging, `args` hooks, and the build step. Construction
    /// failures surface here and never reach the transport.
    fn assemble(self) -> Result<(PreparedRequest, HookPipeline)> {
        let session = self.session;

        let hooks = match self.hook_mode {
            HookMode::Replace => self.hooks,
            HookMode::Append => {
                let mut merged = session.hooks.clone();
                merged.extend(&self.hooks);
                merged
            }
        };

        let mut call_jar = self.cookie_jar.unwrap_or_default();
        let mut dead_names = Vec::new();
        for (name, value) in self.cookie_pairs {
            match value {
                Some(value) => call_jar.set(Cookie::new(name, value)),
                None => dead_names.push(name),
            }
        }
        let cookies = {
            let session_jar = session.read_cookies();
            request_jar(&call_jar, &dead_names, &session_jar)
        };

        let mut request = Request {
            method: self.method,
            url: self.url,
            params: merge_bags(&self.params, &session.params),
            headers: merge_bags(&self.headers, &session.headers),
            cookies,
            data: self.data,
            files: self.files,
            auth: merge_scalar(self.auth, session.auth.clone()),
            timeout: merge_scalar(self.timeout, session.timeout),
            allow_redirects: self.allow_redirects.unwrap_or(self.redirect_default),
            proxies: merge_bags(&self.proxies, &session.proxies),
            config: RequestConfig::merge(&self.config, &session.config),
            prefetch: self.prefetch.unwrap_or(session.prefetch),
            verify: self.verify.unwrap_or_else(|| session.verify.clone()),
            cert: merge_scalar(self.cert, session.cert.clone()),
        };

        hooks.run_args(&mut request)?;

        let prepared = RequestBuilder::build(&request)?;
        Ok((prepared, hooks))
    }
}
