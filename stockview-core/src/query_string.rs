use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

/// Separator between the values of one list parameter
pub const LIST_SEPARATOR: char = ',';

/// Escaped inside a single list entry so the separator stays unambiguous
const ENTRY: &AsciiSet = &CONTROLS.add(b'%').add(b',');

/// Escaped when a whole parameter value is written to the address bar
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Query-string parameters as the routing layer hands them over: keys mapped
/// to already percent-decoded values. A key is either absent or non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (with or without the leading `?`).
    ///
    /// Each value is percent-decoded as a whole here, before anybody splits
    /// it into list entries. Keys without a value are dropped.
    pub fn parse(raw: &str) -> Self {
        let mut params = BTreeMap::new();

        for pair in raw.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            let value = decode_component(value);
            if key.is_empty() || value.is_empty() {
                continue;
            }
            params.insert(key, value);
        }

        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Store a decoded value; an empty value removes the key instead
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.params.remove(&key);
        } else {
            self.params.insert(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render as `key=value&...` without the leading `?`
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, COMPONENT),
                    utf8_percent_encode(v, COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Join list entries into one parameter value. Returns `None` when no
/// non-empty entry is left, meaning the key must not be written at all.
pub fn join_values<S: AsRef<str>>(values: &[S]) -> Option<String> {
    let entries: Vec<String> = values
        .iter()
        .map(AsRef::as_ref)
        .filter(|v| !v.is_empty())
        .map(|v| utf8_percent_encode(v, ENTRY).to_string())
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries.join(&LIST_SEPARATOR.to_string()))
    }
}

/// Split a decoded parameter value into its entries, dropping empty tokens
pub fn split_values(joined: &str) -> Vec<String> {
    joined
        .split(LIST_SEPARATOR)
        .filter(|token| !token.is_empty())
        .map(|token| percent_decode_str(token).decode_utf8_lossy().into_owned())
        .collect()
}

/// Write one named filter's values; nothing to write removes the key
pub fn encode_values<S: AsRef<str>>(params: &mut QueryParams, name: &str, values: &[S]) {
    match join_values(values) {
        Some(joined) => params.set(name, joined),
        None => {
            params.remove(name);
        }
    }
}

/// Read one named filter's values; `None` when the key is absent or holds no entries
pub fn decode_values(params: &QueryParams, name: &str) -> Option<Vec<String>> {
    let values = split_values(params.get(name)?);
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// A batch of parameter writes applied to the URL in one replace.
///
/// The last write to a key wins; a write with no values is a removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryUpdate {
    ops: BTreeMap<String, Option<String>>,
}

impl QueryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_values<S: AsRef<str>>(&mut self, name: &str, values: &[S]) -> &mut Self {
        self.ops.insert(name.to_string(), join_values(values));
        self
    }

    pub fn set_raw(&mut self, name: &str, value: &str) -> &mut Self {
        let value = (!value.is_empty()).then(|| value.to_string());
        self.ops.insert(name.to_string(), value);
        self
    }

    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.ops.insert(name.to_string(), None);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Produce the next parameter set in one step, leaving `params` untouched
    pub fn apply_to(&self, params: &QueryParams) -> QueryParams {
        let mut next = params.clone();
        for (name, value) in &self.ops {
            match value {
                Some(value) => next.set(name.as_str(), value.as_str()),
                None => {
                    next.remove(name);
                }
            }
        }
        next
    }
}
