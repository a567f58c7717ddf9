//! Programmatic stub construction for tests and embedded use.
//!
//! An explicit accumulating builder: `when_*` calls describe the request
//! predicate, `then_*` calls the response, and [`build`](StubBuilder::build)
//! is the single finalize step that validates and produces a record. A
//! build with no url predicate, or with both a single response and
//! sequence entries, is rejected rather than yielding a partial object.

use crate::error::ConfigError;
use crate::stub::{StubHttpLifecycle, StubRequest, StubResponse, StubResponses, ValueMatcher};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct StubBuilder {
    method: Vec<String>,
    url: Option<MatchSpec>,
    post: Option<MatchSpec>,
    request_headers: HashMap<String, MatchSpec>,
    status: Option<u16>,
    body: Option<String>,
    response_headers: HashMap<String, String>,
    sequence: Vec<StubResponse>,
}

#[derive(Debug, Clone)]
enum MatchSpec {
    Literal(String),
    Pattern(String),
}

impl MatchSpec {
    fn compile(&self) -> Result<ValueMatcher, ConfigError> {
        match self {
            MatchSpec::Literal(value) => Ok(ValueMatcher::exact(value.clone())),
            MatchSpec::Pattern(pattern) => ValueMatcher::pattern(pattern),
        }
    }
}

impl StubBuilder {
    pub fn new() -> Self {
        StubBuilder::default()
    }

    /// Accept the given HTTP verb. May be called repeatedly to accept
    /// several verbs; never calling it accepts any verb.
    pub fn when_method(mut self, method: impl Into<String>) -> Self {
        self.method.push(method.into().to_uppercase());
        self
    }

    /// Require this exact url (path+query). Required before `build`.
    pub fn when_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(MatchSpec::Literal(url.into()));
        self
    }

    /// Require the url to match this pattern in full. Compiled at build
    /// time so an invalid pattern fails the build, not the request path.
    pub fn when_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.url = Some(MatchSpec::Pattern(pattern.into()));
        self
    }

    /// Require this exact request body.
    pub fn when_post(mut self, body: impl Into<String>) -> Self {
        self.post = Some(MatchSpec::Literal(body.into()));
        self
    }

    /// Require the request body to match this pattern in full.
    pub fn when_post_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.post = Some(MatchSpec::Pattern(pattern.into()));
        self
    }

    /// Require this header to carry exactly this value.
    pub fn when_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers
            .insert(name.into().to_lowercase(), MatchSpec::Literal(value.into()));
        self
    }

    pub fn then_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn then_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn then_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response_headers.insert(name.into(), value.into());
        self
    }

    /// Append one entry to a sequenced response. Mutually exclusive with
    /// `then_status`/`then_body`/`then_header`.
    pub fn then_sequence_response(mut self, response: StubResponse) -> Self {
        self.sequence.push(response);
        self
    }

    /// Validate the accumulated fields and produce the finished record.
    pub fn build(self) -> Result<StubHttpLifecycle, ConfigError> {
        let url = match &self.url {
            Some(spec) => Some(spec.compile()?),
            None => return Err(ConfigError::MissingUrl),
        };

        let post_body = self.post.as_ref().map(|spec| spec.compile()).transpose()?;

        let mut headers = HashMap::new();
        for (name, spec) in &self.request_headers {
            headers.insert(name.clone(), spec.compile()?);
        }

        let request = StubRequest {
            method: self.method,
            url,
            post_body,
            headers,
        };

        let has_single_fields = self.status.is_some()
            || self.body.is_some()
            || !self.response_headers.is_empty();

        let responses = if !self.sequence.is_empty() {
            if has_single_fields {
                return Err(ConfigError::AmbiguousResponse);
            }
            StubResponses::Sequence(self.sequence)
        } else {
            let status = self.status.unwrap_or(200);
            if !(100..=599).contains(&status) {
                return Err(ConfigError::InvalidStatus(status));
            }
            StubResponses::Single(StubResponse {
                status,
                body: self.body.unwrap_or_default(),
                headers: self.response_headers,
            })
        };

        Ok(StubHttpLifecycle::new(request, responses))
    }
}
