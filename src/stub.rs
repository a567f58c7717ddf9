//! Stub data model: request predicates, responses and the lifecycle record
//! that pairs them.
//!
//! A [`StubHttpLifecycle`] is the unit the repository stores: one request
//! predicate plus either a single response or an ordered sequence of
//! responses that the record cycles through across successive matches.

use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Matches one string value: either a literal or a compiled regex pattern.
///
/// Patterns are anchored at compile time so they must cover the entire
/// candidate, never a substring.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    Exact(String),
    Pattern { raw: String, regex: Regex },
}

impl ValueMatcher {
    /// Build an exact-match predicate.
    pub fn exact(value: impl Into<String>) -> Self {
        ValueMatcher::Exact(value.into())
    }

    /// Compile a pattern predicate. Invalid regexes are rejected here so a
    /// malformed contract never enters the repository.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        let regex =
            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(ValueMatcher::Pattern {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Whether the candidate satisfies this predicate.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            ValueMatcher::Exact(value) => value == candidate,
            ValueMatcher::Pattern { regex, .. } => regex.is_match(candidate),
        }
    }

    /// The literal value or the pattern source as declared.
    pub fn as_declared(&self) -> &str {
        match self {
            ValueMatcher::Exact(value) => value,
            ValueMatcher::Pattern { raw, .. } => raw,
        }
    }
}

impl PartialEq for ValueMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueMatcher::Exact(a), ValueMatcher::Exact(b)) => a == b,
            (ValueMatcher::Pattern { raw: a, .. }, ValueMatcher::Pattern { raw: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for ValueMatcher {}

impl fmt::Display for ValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_declared())
    }
}

/// The predicate side of a contract.
///
/// A predicate with every field absent matches every request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StubRequest {
    /// Accepted HTTP verbs, uppercase. Empty matches any method.
    pub method: Vec<String>,
    /// Matched against the normalized path+query. `None` matches any url.
    pub url: Option<ValueMatcher>,
    /// Matched against the request body. `None` accepts any body.
    pub post_body: Option<ValueMatcher>,
    /// Header name (lowercase) to expected value. Subset containment: every
    /// entry here must match, extra inbound headers are ignored.
    pub headers: HashMap<String, ValueMatcher>,
}

impl StubRequest {
    /// Predicate matching a literal url and nothing else.
    pub fn for_url(url: impl Into<String>) -> Self {
        StubRequest {
            url: Some(ValueMatcher::exact(url)),
            ..StubRequest::default()
        }
    }
}

/// One concrete response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl Default for StubResponse {
    fn default() -> Self {
        StubResponse {
            status: 200,
            body: String::new(),
            headers: HashMap::new(),
        }
    }
}

impl StubResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        StubResponse {
            status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// The response side of a contract: a fixed response, or an ordered sequence
/// cycled through across successive matching calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubResponses {
    Single(StubResponse),
    Sequence(Vec<StubResponse>),
}

/// Which side of a lifecycle a field lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubSide {
    Request,
    Response,
}

/// Closed enumeration of the fields exposed for display/debug tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelector {
    RequestMethod,
    RequestUrl,
    RequestPost,
    RequestHeaders,
    ResponseStatus,
    ResponseBody,
    ResponseHeaders,
}

impl FieldSelector {
    /// Resolve a stringly field name coming from an admin surface. Unknown
    /// names yield `None` rather than panicking into UI code paths.
    pub fn parse(side: StubSide, name: &str) -> Option<Self> {
        match (side, name) {
            (StubSide::Request, "method") => Some(FieldSelector::RequestMethod),
            (StubSide::Request, "url") => Some(FieldSelector::RequestUrl),
            (StubSide::Request, "post") => Some(FieldSelector::RequestPost),
            (StubSide::Request, "headers") => Some(FieldSelector::RequestHeaders),
            (StubSide::Response, "status") => Some(FieldSelector::ResponseStatus),
            (StubSide::Response, "body") => Some(FieldSelector::ResponseBody),
            (StubSide::Response, "headers") => Some(FieldSelector::ResponseHeaders),
            _ => None,
        }
    }
}

/// One contract: a request predicate plus its responses and the per-record
/// sequence cursor.
///
/// The cursor sits behind its own mutex so two requests hitting the same
/// sequenced contract get exactly one exclusive advance each, while
/// unrelated contracts never contend.
#[derive(Debug)]
pub struct StubHttpLifecycle {
    request: StubRequest,
    responses: StubResponses,
    cursor: Mutex<usize>,
}

impl StubHttpLifecycle {
    pub fn new(request: StubRequest, responses: StubResponses) -> Self {
        StubHttpLifecycle {
            request,
            responses,
            cursor: Mutex::new(0),
        }
    }

    /// Contract with a single fixed response.
    pub fn single(request: StubRequest, response: StubResponse) -> Self {
        StubHttpLifecycle::new(request, StubResponses::Single(response))
    }

    /// Contract cycling through the given responses in order.
    pub fn sequenced(request: StubRequest, responses: Vec<StubResponse>) -> Self {
        StubHttpLifecycle::new(request, StubResponses::Sequence(responses))
    }

    pub fn request(&self) -> &StubRequest {
        &self.request
    }

    pub fn responses(&self) -> &StubResponses {
        &self.responses
    }

    fn lock_cursor(&self) -> MutexGuard<'_, usize> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the response to return for the current call and advance the
    /// sequence cursor.
    ///
    /// Single responses are returned as-is and leave the cursor at 0. For a
    /// sequence of length N the element at the cursor is returned and the
    /// cursor moves to `(cursor + 1) % N`; after retrieving the last element
    /// the cursor therefore reads 0 again, so the sequence cycles forever.
    /// An empty sequence falls back to the default `200`/empty-body response
    /// without touching the cursor.
    pub fn next_response(&self) -> StubResponse {
        match &self.responses {
            StubResponses::Single(response) => response.clone(),
            StubResponses::Sequence(responses) => {
                if responses.is_empty() {
                    return StubResponse::default();
                }
                let mut cursor = self.lock_cursor();
                let response = responses[*cursor].clone();
                *cursor = (*cursor + 1) % responses.len();
                response
            }
        }
    }

    /// Cursor position of the next sequenced response. Always 0 for the
    /// single variant. Read-only: inspecting the cursor never advances it.
    pub fn next_sequenced_response_id(&self) -> usize {
        *self.lock_cursor()
    }

    /// The response the cursor currently points at, without advancing.
    fn current_response(&self) -> StubResponse {
        match &self.responses {
            StubResponses::Single(response) => response.clone(),
            StubResponses::Sequence(responses) => {
                if responses.is_empty() {
                    return StubResponse::default();
                }
                responses[*self.lock_cursor()].clone()
            }
        }
    }

    /// Raw string value of one field, for admin display tooling.
    pub fn field_content(&self, selector: FieldSelector) -> String {
        match selector {
            FieldSelector::RequestMethod => self.request.method.join(","),
            FieldSelector::RequestUrl => self
                .request
                .url
                .as_ref()
                .map(|m| m.as_declared().to_string())
                .unwrap_or_default(),
            FieldSelector::RequestPost => self
                .request
                .post_body
                .as_ref()
                .map(|m| m.as_declared().to_string())
                .unwrap_or_default(),
            FieldSelector::RequestHeaders => {
                let mut pairs: Vec<String> = self
                    .request
                    .headers
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect();
                pairs.sort();
                pairs.join(", ")
            }
            FieldSelector::ResponseStatus => self.current_response().status.to_string(),
            FieldSelector::ResponseBody => self.current_response().body,
            FieldSelector::ResponseHeaders => {
                let mut pairs: Vec<String> = self
                    .current_response()
                    .headers
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect();
                pairs.sort();
                pairs.join(", ")
            }
        }
    }

    /// Stringly-named variant of [`field_content`](Self::field_content), the
    /// shape admin UI callers speak. Unknown field names yield `None`.
    pub fn field_content_named(&self, side: StubSide, name: &str) -> Option<String> {
        FieldSelector::parse(side, name).map(|selector| self.field_content(selector))
    }
}

// Cursor state is transient, so equality covers contract content only.
impl PartialEq for StubHttpLifecycle {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request && self.responses == other.responses
    }
}

impl Eq for StubHttpLifecycle {}

impl Clone for StubHttpLifecycle {
    fn clone(&self) -> Self {
        // A clone is a fresh record: its cursor starts over.
        StubHttpLifecycle::new(self.request.clone(), self.responses.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_equals_itself() {
        let lifecycle = StubHttpLifecycle::single(StubRequest::default(), StubResponse::default());
        assert_eq!(lifecycle, lifecycle);
    }

    #[test]
    fn lifecycle_equality_ignores_cursor() {
        let a = StubHttpLifecycle::sequenced(
            StubRequest::for_url("/a"),
            vec![StubResponse::new(200, "one"), StubResponse::new(200, "two")],
        );
        let b = a.clone();

        a.next_response();
        assert_ne!(
            a.next_sequenced_response_id(),
            b.next_sequenced_response_id()
        );
        assert_eq!(a, b);
    }

    #[test]
    fn lifecycles_with_different_content_are_not_equal() {
        let a = StubHttpLifecycle::single(StubRequest::for_url("/a"), StubResponse::default());
        let b = StubHttpLifecycle::single(StubRequest::for_url("/b"), StubResponse::default());
        assert_ne!(a, b);
    }

    #[test]
    fn single_response_is_stable() {
        let response = StubResponse::new(201, "SELF");
        let lifecycle = StubHttpLifecycle::single(StubRequest::default(), response.clone());

        for _ in 0..5 {
            assert_eq!(lifecycle.next_response(), response);
            assert_eq!(lifecycle.next_sequenced_response_id(), 0);
        }
    }

    #[test]
    fn empty_sequence_falls_back_to_default_response() {
        let lifecycle = StubHttpLifecycle::sequenced(StubRequest::default(), Vec::new());

        let response = lifecycle.next_response();
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
        assert_eq!(lifecycle.next_sequenced_response_id(), 0);
    }

    #[test]
    fn one_element_sequence_wraps_to_zero() {
        let lifecycle = StubHttpLifecycle::sequenced(
            StubRequest::default(),
            vec![StubResponse::new(200, "This is a sequence response #1")],
        );

        let response = lifecycle.next_response();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "This is a sequence response #1");
        assert_eq!(lifecycle.next_sequenced_response_id(), 0);
    }

    #[test]
    fn two_element_sequence_cursor_reads_zero_after_second_call() {
        let lifecycle = StubHttpLifecycle::sequenced(
            StubRequest::default(),
            vec![
                StubResponse::new(200, "This is a sequence response #1"),
                StubResponse::new(500, "This is a sequence response #2"),
            ],
        );

        let first = lifecycle.next_response();
        assert_eq!(first.body, "This is a sequence response #1");
        assert_eq!(lifecycle.next_sequenced_response_id(), 1);

        let second = lifecycle.next_response();
        assert_eq!(second.status, 500);
        assert_eq!(second.body, "This is a sequence response #2");
        // Advancement happens after the read, so retrieving the last element
        // leaves the cursor wrapped back at the start.
        assert_eq!(lifecycle.next_sequenced_response_id(), 0);
    }

    #[test]
    fn sequence_cycles_after_full_pass() {
        let responses: Vec<StubResponse> = (0..4)
            .map(|i| StubResponse::new(200, format!("response #{i}")))
            .collect();
        let lifecycle =
            StubHttpLifecycle::sequenced(StubRequest::default(), responses.clone());

        let first = lifecycle.next_response();
        for _ in 0..3 {
            lifecycle.next_response();
        }
        // Call N+1 repeats call 1.
        assert_eq!(lifecycle.next_response(), first);
    }

    #[test]
    fn reading_cursor_does_not_advance_it() {
        let lifecycle = StubHttpLifecycle::sequenced(
            StubRequest::default(),
            vec![StubResponse::new(200, "a"), StubResponse::new(200, "b")],
        );

        assert_eq!(lifecycle.next_sequenced_response_id(), 0);
        assert_eq!(lifecycle.next_sequenced_response_id(), 0);
        assert_eq!(lifecycle.next_response().body, "a");
    }

    #[test]
    fn field_content_for_request_post() {
        let request = StubRequest {
            url: Some(ValueMatcher::exact("/some/resource/uri")),
            post_body: Some(ValueMatcher::exact("this is a POST")),
            ..StubRequest::default()
        };
        let lifecycle = StubHttpLifecycle::single(request, StubResponse::default());

        assert_eq!(
            lifecycle.field_content_named(StubSide::Request, "post"),
            Some("this is a POST".to_string())
        );
    }

    #[test]
    fn field_content_for_response_body() {
        let lifecycle = StubHttpLifecycle::single(
            StubRequest::default(),
            StubResponse::new(201, "this is a response body"),
        );

        assert_eq!(
            lifecycle.field_content_named(StubSide::Response, "body"),
            Some("this is a response body".to_string())
        );
        assert_eq!(
            lifecycle.field_content_named(StubSide::Response, "status"),
            Some("201".to_string())
        );
    }

    #[test]
    fn unknown_field_name_is_not_recognized() {
        let lifecycle = StubHttpLifecycle::single(StubRequest::default(), StubResponse::default());
        assert_eq!(lifecycle.field_content_named(StubSide::Request, "cookie"), None);
        assert_eq!(lifecycle.field_content_named(StubSide::Response, "post"), None);
    }

    #[test]
    fn response_field_content_follows_the_cursor() {
        let lifecycle = StubHttpLifecycle::sequenced(
            StubRequest::default(),
            vec![StubResponse::new(200, "first"), StubResponse::new(200, "second")],
        );

        assert_eq!(
            lifecycle.field_content(FieldSelector::ResponseBody),
            "first"
        );
        lifecycle.next_response();
        assert_eq!(
            lifecycle.field_content(FieldSelector::ResponseBody),
            "second"
        );
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = ValueMatcher::pattern("[unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn pattern_matcher_requires_full_match() {
        let matcher = ValueMatcher::pattern("/items/[0-9]+").unwrap();
        assert!(matcher.matches("/items/42"));
        assert!(!matcher.matches("/items/42/extra"));
        assert!(!matcher.matches("prefix/items/42"));
    }
}
