//! courier - a session-oriented HTTP client layer
//!
//! This crate provides a [`Session`] that persists settings across
//! requests (headers, cookies, auth, proxies, timeouts), merges them
//! deterministically with per-call overrides, and lets callers observe
//! and mutate requests and responses through an ordered hook pipeline.
//! The network itself is behind the [`Transport`] trait; a reqwest-backed
//! implementation is the default.
//!
//! ```no_run
//! use courier::Session;
//!
//! # async fn run() -> courier::Result<()> {
//! let session = Session::builder()
//!     .header("X-Api-Key", "secret")
//!     .cookie("tracking", "off")
//!     .build();
//!
//! let mut response = session
//!     .get("https://example.com/items")
//!     .param("page", "2")
//!     .send()
//!     .await?;
//! println!("{}", response.text().await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cookies;
pub mod error;
pub mod hooks;
pub mod http;
pub mod logging;
pub mod merge;
pub mod transport;

pub use config::{ClientCert, RequestConfig, Verify};
pub use cookies::{Cookie, CookieStore};
pub use error::{BoxError, CourierError, Result};
pub use hooks::{HookMode, HookPipeline, HookPoint, HookResult};
pub use http::auth::Auth;
pub use http::request::{Body, FilePart, PreparedRequest, Request, RequestBuilder};
pub use http::response::Response;
pub use http::{PendingRequest, Session, SessionBuilder};
pub use merge::{merge_bags, merge_scalar, BagValue, SettingsBag};
pub use transport::{RawBody, RawResponse, ReqwestTransport, Transport};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
