//! Request/response hook pipeline.
//!
//! Four fixed hook points observe and mutate data in flight:
//!
//! - `args`: the merged [`Request`] before it is built
//! - `pre_request`: the [`PreparedRequest`] directly before sending
//! - `post_request`: the [`PreparedRequest`] directly after sending
//! - `response`: the [`Response`] before it is returned to the caller
//!
//! Registration is typed per point, so there is no way to register a
//! callback under an unknown hook name. Dispatch is a strict left-to-right
//! fold: each callback observes exactly the state the previous one left
//! behind, and a callback that mutates nothing passes the value through
//! unchanged. A failing callback aborts the request; later callbacks in
//! that chain never run.

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, CourierError, Result};
use crate::http::request::{PreparedRequest, Request};
use crate::http::response::Response;

/// Outcome of a single hook callback.
pub type HookResult = std::result::Result<(), BoxError>;

/// The fixed set of hook points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    Args,
    PreRequest,
    PostRequest,
    Response,
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookPoint::Args => "args",
            HookPoint::PreRequest => "pre_request",
            HookPoint::PostRequest => "post_request",
            HookPoint::Response => "response",
        };
        write!(f, "{}", name)
    }
}

/// How per-call hooks combine with session hooks.
///
/// The default appends per-call chains after the session chains; full
/// replacement is an explicit opt-in, never silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookMode {
    #[default]
    Append,
    Replace,
}

type Chain<T> = Vec<Arc<dyn Fn(&mut T) -> HookResult + Send + Sync>>;

/// Ordered callback chains for the four hook points.
#[derive(Clone, Default)]
pub struct HookPipeline {
    args: Chain<Request>,
    pre_request: Chain<PreparedRequest>,
    post_request: Chain<PreparedRequest>,
    response: Chain<Response>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_args<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut Request) -> HookResult + Send + Sync + 'static,
    {
        self.args.push(Arc::new(hook));
        self
    }

    pub fn on_pre_request<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut PreparedRequest) -> HookResult + Send + Sync + 'static,
    {
        self.pre_request.push(Arc::new(hook));
        self
    }

    pub fn on_post_request<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut PreparedRequest) -> HookResult + Send + Sync + 'static,
    {
        self.post_request.push(Arc::new(hook));
        self
    }

    pub fn on_response<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut Response) -> HookResult + Send + Sync + 'static,
    {
        self.response.push(Arc::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
            && self.pre_request.is_empty()
            && self.post_request.is_empty()
            && self.response.is_empty()
    }

    /// Append every chain of `other` after the corresponding chain of
    /// `self`. Session hooks run first, per-call hooks after.
    pub(crate) fn extend(&mut self, other: &HookPipeline) {
        self.args.extend(other.args.iter().cloned());
        self.pre_request.extend(other.pre_request.iter().cloned());
        self.post_request.extend(other.post_request.iter().cloned());
        self.response.extend(other.response.iter().cloned());
    }

    pub(crate) fn run_args(&self, request: &mut Request) -> Result<()> {
        fold(HookPoint::Args, &self.args, request)
    }

    pub(crate) fn run_pre_request(&self, prepared: &mut PreparedRequest) -> Result<()> {
        fold(HookPoint::PreRequest, &self.pre_request, prepared)
    }

    pub(crate) fn run_post_request(&self, prepared: &mut PreparedRequest) -> Result<()> {
        fold(HookPoint::PostRequest, &self.post_request, prepared)
    }

    pub(crate) fn run_response(&self, response: &mut Response) -> Result<()> {
        fold(HookPoint::Response, &self.response, response)
    }
}

impl fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPipeline")
            .field("args", &self.args.len())
            .field("pre_request", &self.pre_request.len())
            .field("post_request", &self.post_request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

fn fold<T>(point: HookPoint, chain: &Chain<T>, value: &mut T) -> Result<()> {
    for hook in chain {
        hook(value).map_err(|source| CourierError::Hook { point, source })?;
    }
    Ok(())
}
