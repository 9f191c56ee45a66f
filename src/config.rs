//! Session and request configuration surface.

use std::path::PathBuf;

use crate::merge::{merge_scalar, SettingsBag};

/// URL schemes the request builder accepts.
pub const SUPPORTED_SCHEMES: &[&str] = &["http", "https"];

pub(crate) const DEFAULT_MAX_REDIRECTS: u32 = 30;

/// TLS server-certificate verification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Verify {
    #[default]
    Enabled,
    Disabled,
    /// Verify against a custom CA bundle.
    CaBundle(PathBuf),
}

/// TLS client certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCert {
    /// Combined cert + key PEM file.
    Pem(PathBuf),
    /// Separate cert and key PEM files.
    PemPair { cert: PathBuf, key: PathBuf },
}

/// Tunable request behavior, merged field-by-field with local-wins
/// semantics. Pool sizing, keep-alive and trust-env are advisory data for
/// the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConfig {
    pub max_redirects: Option<u32>,
    pub keep_alive: Option<bool>,
    pub trust_env: Option<bool>,
    pub pool_connections: Option<usize>,
    pub pool_maxsize: Option<usize>,
}

impl RequestConfig {
    /// Field-wise merge; each field is a scalar setting where the local
    /// value wins outright.
    pub fn merge(local: &RequestConfig, default: &RequestConfig) -> RequestConfig {
        RequestConfig {
            max_redirects: merge_scalar(local.max_redirects, default.max_redirects),
            keep_alive: merge_scalar(local.keep_alive, default.keep_alive),
            trust_env: merge_scalar(local.trust_env, default.trust_env),
            pool_connections: merge_scalar(local.pool_connections, default.pool_connections),
            pool_maxsize: merge_scalar(local.pool_maxsize, default.pool_maxsize),
        }
    }

    pub(crate) fn max_redirects_or_default(&self) -> u32 {
        self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS)
    }
}

/// Headers every new session starts from. Removable per key through the
/// unset sentinel.
pub fn default_headers() -> SettingsBag {
    let mut headers = SettingsBag::for_headers();
    headers.set("User-Agent", format!("courier/{}", crate::VERSION));
    headers.set("Accept-Encoding", vec!["gzip", "deflate", "br"]);
    headers.set("Accept", "*/*");
    headers
}
