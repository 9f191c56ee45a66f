//! Settings bags and the option-merging rules used on every request.
//!
//! A [`SettingsBag`] is an ordered key/value collection holding per-session
//! or per-call options (headers, proxies, query params). Merging is
//! left-biased: the local bag overrides the default bag, and a key set to
//! the [`BagValue::Unset`] sentinel deletes that key from the merged result
//! even when the default bag supplied a value.

use indexmap::IndexMap;

/// A single settings value.
///
/// `Unset` is an explicit removal marker, distinct from the key simply
/// being absent from the bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BagValue {
    One(String),
    Many(Vec<String>),
    Unset,
}

impl BagValue {
    /// Canonical wire form: multi-valued entries join with `", "`.
    pub fn expand(&self) -> Option<String> {
        match self {
            BagValue::One(v) => Some(v.clone()),
            BagValue::Many(vs) => Some(vs.join(", ")),
            BagValue::Unset => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, BagValue::Unset)
    }
}

impl From<&str> for BagValue {
    fn from(v: &str) -> Self {
        BagValue::One(v.to_string())
    }
}

impl From<String> for BagValue {
    fn from(v: String) -> Self {
        BagValue::One(v)
    }
}

impl From<Vec<String>> for BagValue {
    fn from(vs: Vec<String>) -> Self {
        BagValue::Many(vs)
    }
}

impl From<Vec<&str>> for BagValue {
    fn from(vs: Vec<&str>) -> Self {
        BagValue::Many(vs.into_iter().map(str::to_string).collect())
    }
}

/// Ordered mapping from string key to [`BagValue`].
///
/// Header-mode bags compare keys case-insensitively; bags for proxies,
/// params and the like are case-sensitive. Insertion order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsBag {
    entries: IndexMap<String, BagValue>,
    case_insensitive: bool,
}

impl SettingsBag {
    /// Case-sensitive bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive bag for HTTP headers.
    pub fn for_headers() -> Self {
        SettingsBag {
            entries: IndexMap::new(),
            case_insensitive: true,
        }
    }

    fn canonical(&self, key: &str) -> String {
        if self.case_insensitive {
            key.to_ascii_lowercase()
        } else {
            key.to_string()
        }
    }

    /// Insert or overwrite a key.
    pub fn set(&mut self, key: &str, value: impl Into<BagValue>) {
        self.entries.insert(self.canonical(key), value.into());
    }

    /// Mark a key for removal during merge.
    pub fn unset(&mut self, key: &str) {
        self.entries.insert(self.canonical(key), BagValue::Unset);
    }

    /// Delete a key outright.
    pub fn remove(&mut self, key: &str) {
        self.entries.shift_remove(&self.canonical(key));
    }

    pub fn get(&self, key: &str) -> Option<&BagValue> {
        self.entries.get(&self.canonical(key))
    }

    /// Single-valued lookup in canonical wire form.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(BagValue::expand)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&self.canonical(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BagValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut bag = SettingsBag::new();
        for (k, v) in pairs {
            bag.set(k, v);
        }
        bag
    }
}

/// Merge two settings bags, left-biased.
///
/// An absent side is represented by an empty bag. When the default side is
/// empty the local bag is returned unchanged (unset sentinels included;
/// consumers skip them when emitting). Otherwise the result starts from
/// the default bag, every local key overwrites, and every key whose local
/// value is `Unset` is deleted, even if it originated from the default.
/// Neither input is mutated.
pub fn merge_bags(local: &SettingsBag, default: &SettingsBag) -> SettingsBag {
    if default.is_empty() {
        return local.clone();
    }
    if local.is_empty() {
        return default.clone();
    }

    let mut merged = default.clone();
    for (key, value) in local.iter() {
        merged.set(key, value.clone());
    }
    for (key, value) in local.iter() {
        if value.is_unset() {
            merged.remove(key);
        }
    }
    merged
}

/// Merge a non-mapping setting: the local value wins outright when present.
///
/// This is the typed counterpart of bag merging for scalar options such as
/// timeout or auth, which are replaced rather than merged key-by-key.
pub fn merge_scalar<T>(local: Option<T>, default: Option<T>) -> Option<T> {
    local.or(default)
}
