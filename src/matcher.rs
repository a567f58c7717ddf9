//! Request matching logic.
//!
//! Matches an inbound request against the repository's ordered records.
//! Evaluation is first-match-wins: records are tried in declaration order and
//! the earliest fully-matching one is selected, with no specificity scoring.
//! Declaration order is therefore part of a contract set's semantics.

use crate::stub::{StubHttpLifecycle, StubRequest};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Inbound request descriptor, as handed over by the HTTP listener.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// HTTP verb, any case.
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Decoded query parameters. Ordered so url normalization is
    /// deterministic regardless of how the listener collected them.
    pub query: BTreeMap<String, String>,
    /// Header name to value. Names are looked up case-insensitively.
    pub headers: HashMap<String, String>,
    /// Request body, if any.
    pub body: Option<String>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        InboundRequest {
            method: method.into(),
            path: path.into(),
            ..InboundRequest::default()
        }
    }

    /// Build a descriptor from a request target such as `/hello?name=bob`,
    /// splitting off and decoding the query string.
    pub fn parse(method: impl Into<String>, target: &str) -> Self {
        let (path, query_string) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let mut request = InboundRequest::new(method, path);
        if let Some(query) = query_string {
            request.query = parse_query_string(query);
        }
        request
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The normalized path+query that url predicates are matched against.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }

    /// Case-insensitive header lookup.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Find the first record in repository order whose predicate matches.
///
/// `None` signals "no configured contract matches"; the caller decides what
/// not-found response to emit.
pub fn find_match<'a>(
    inbound: &InboundRequest,
    records: &'a [Arc<StubHttpLifecycle>],
) -> Option<&'a Arc<StubHttpLifecycle>> {
    records
        .iter()
        .find(|record| matches(record.request(), inbound))
}

/// Whether one predicate accepts the inbound request. All declared parts must
/// hold; absent parts auto-pass.
pub fn matches(predicate: &StubRequest, inbound: &InboundRequest) -> bool {
    matches_method(predicate, inbound)
        && matches_url(predicate, inbound)
        && matches_headers(predicate, inbound)
        && matches_body(predicate, inbound)
}

fn matches_method(predicate: &StubRequest, inbound: &InboundRequest) -> bool {
    if predicate.method.is_empty() {
        return true;
    }
    predicate
        .method
        .iter()
        .any(|method| method.eq_ignore_ascii_case(&inbound.method))
}

fn matches_url(predicate: &StubRequest, inbound: &InboundRequest) -> bool {
    match &predicate.url {
        Some(matcher) => matcher.matches(&inbound.full_url()),
        None => true,
    }
}

fn matches_headers(predicate: &StubRequest, inbound: &InboundRequest) -> bool {
    // Subset containment: every predicate header must match, extra inbound
    // headers are ignored.
    predicate.headers.iter().all(|(name, matcher)| {
        inbound
            .header(name)
            .map(|value| matcher.matches(value))
            .unwrap_or(false)
    })
}

fn matches_body(predicate: &StubRequest, inbound: &InboundRequest) -> bool {
    match &predicate.post_body {
        Some(matcher) => matcher.matches(inbound.body.as_deref().unwrap_or("")),
        None => true,
    }
}

/// Parse a query string into decoded key-value pairs.
fn parse_query_string(query: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();

    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            params.insert(urlencoding_decode(key), urlencoding_decode(value));
        } else {
            params.insert(urlencoding_decode(part), String::new());
        }
    }

    params
}

/// Simple URL decoding.
fn urlencoding_decode(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    result.push(byte as char);
                    continue;
                }
            }
            result.push('%');
            result.push_str(&hex);
        } else if ch == '+' {
            result.push(' ');
        } else {
            result.push(ch);
        }
    }

    result
}
