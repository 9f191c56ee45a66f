//! HTTP authentication

use base64::Engine;

use crate::error::{CourierError, Result};

/// Request authentication, rendered as an `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Auth::Bearer {
            token: token.into(),
        }
    }

    /// Parse curl-style `user:password` input.
    pub fn parse_user_pass(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.splitn(2, ':').collect();
        match parts.as_slice() {
            [user, pass] => Ok(Auth::basic(*user, *pass)),
            [user] => Ok(Auth::basic(*user, "")),
            _ => Err(CourierError::InvalidUrl(
                "invalid user:password format".to_string(),
            )),
        }
    }

    /// `Authorization` header value.
    pub fn header_value(&self) -> String {
        match self {
            Auth::Basic { username, password } => {
                let credentials = format!("{}:{}", username, password);
                let encoded =
                    base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
                format!("Basic {}", encoded)
            }
            Auth::Bearer { token } => format!("Bearer {}", token),
        }
    }
}
