//! Cookie records and the per-session cookie store.
//!
//! Policy attributes (domain, path, expiry, secure) are carried opaquely;
//! this layer never evaluates them. A store owns its cookies and copies
//! them when merging into another store.

use std::fmt;
use std::time::SystemTime;

/// A single cookie record.
///
/// Uniqueness within a store is keyed on (name, domain, path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub expires: Option<SystemTime>,
}

impl Cookie {
    /// Session-scoped cookie: empty domain, root path.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Cookie {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            secure: false,
            expires: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    fn key(&self) -> (&str, &str, &str) {
        (&self.name, &self.domain, &self.path)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Ordered collection of cookies with name-based removal.
///
/// No two cookies share an identical (name, domain, path); on collision
/// the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieStore {
    cookies: Vec<Cookie>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a plain name/value mapping. Each entry becomes
    /// one session-scoped cookie.
    pub fn from_mapping<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut store = CookieStore::new();
        for (name, value) in pairs {
            store.set(Cookie::new(name, value));
        }
        store
    }

    /// Insert a cookie, replacing any existing cookie with the same
    /// (name, domain, path).
    pub fn set(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.key() == cookie.key()) {
            Some(slot) => *slot = cookie,
            None => self.cookies.push(cookie),
        }
    }

    /// Copy every cookie from `source` into this store, overwriting on
    /// key collision. `source` is left unchanged.
    pub fn merge_from(&mut self, source: &CookieStore) {
        for cookie in &source.cookies {
            self.set(cookie.clone());
        }
    }

    /// Delete all cookies with the given name. Silent no-op when absent.
    pub fn remove_by_name(&mut self, name: &str) {
        self.cookies.retain(|c| c.name != name);
    }

    /// First cookie with the given name, in store order.
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cookie> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// `Cookie` header value in store order, `None` when empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl<'a> IntoIterator for &'a CookieStore {
    type Item = &'a Cookie;
    type IntoIter = std::slice::Iter<'a, Cookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Build the working jar for a single request.
///
/// The jar starts as a copy of the session store, the per-call jar is
/// merged over it (per-call cookies win on collision, session cookies fill
/// gaps), and every dead name is purged from the working jar only. The
/// session store is never touched.
pub(crate) fn request_jar(
    call: &CookieStore,
    dead_names: &[String],
    session: &CookieStore,
) -> CookieStore {
    let mut jar = session.clone();
    jar.merge_from(call);
    for name in dead_names {
        jar.remove_by_name(name);
    }
    jar
}

#[cfg(test)]
mod tests;
