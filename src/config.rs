//! Contract declarations, as loaded from YAML.
//!
//! The loader owns the serialization format; the engine only ever sees
//! already-validated [`StubHttpLifecycle`] records. Malformed declarations
//! (invalid regex, empty response sequence, out-of-range status) are
//! rejected here, before anything enters the repository.

use crate::error::ConfigError;
use crate::stub::{StubHttpLifecycle, StubRequest, StubResponse, StubResponses, ValueMatcher};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Top-level configuration: an ordered list of contracts. Declaration order
/// is the matching order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StubConfig {
    #[serde(default)]
    pub stubs: Vec<StubDeclaration>,
}

impl StubConfig {
    /// Load and validate a configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every declaration without building records.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, stub) in self.stubs.iter().enumerate() {
            stub.compile().map_err(|e| e.at_index(index))?;
        }
        Ok(())
    }

    /// Build the typed, ready-to-serve records. All-or-nothing: the first
    /// malformed declaration fails the whole load.
    pub fn into_lifecycles(self) -> Result<Vec<StubHttpLifecycle>, ConfigError> {
        self.stubs
            .iter()
            .enumerate()
            .map(|(index, stub)| stub.compile().map_err(|e| e.at_index(index)))
            .collect()
    }
}

/// A single declared contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StubDeclaration {
    pub request: RequestDeclaration,
    pub response: ResponseDeclaration,
}

impl StubDeclaration {
    /// Compile this declaration into a serving record, validating patterns,
    /// status codes and sequence shape along the way.
    pub fn compile(&self) -> Result<StubHttpLifecycle, ConfigError> {
        let request = self.request.compile()?;
        let responses = self.response.compile()?;
        Ok(StubHttpLifecycle::new(request, responses))
    }
}

/// The request-predicate side of a declaration. Every field is optional; a
/// fully empty predicate matches any request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RequestDeclaration {
    /// Accepted verbs, e.g. `[GET, POST]`. Empty matches any.
    #[serde(default)]
    pub method: Vec<String>,

    /// Literal url or `{ pattern: ... }` matched against path+query.
    #[serde(default)]
    pub url: Option<MatchDeclaration>,

    /// Literal or pattern matched against the request body.
    #[serde(default)]
    pub post: Option<MatchDeclaration>,

    /// Header name to literal or pattern. Subset containment.
    #[serde(default)]
    pub headers: HashMap<String, MatchDeclaration>,
}

impl RequestDeclaration {
    fn compile(&self) -> Result<StubRequest, ConfigError> {
        let url = self.url.as_ref().map(MatchDeclaration::compile).transpose()?;
        let post_body = self
            .post
            .as_ref()
            .map(MatchDeclaration::compile)
            .transpose()?;

        let mut headers = HashMap::new();
        for (name, declaration) in &self.headers {
            headers.insert(name.to_lowercase(), declaration.compile()?);
        }

        Ok(StubRequest {
            method: self.method.iter().map(|m| m.to_uppercase()).collect(),
            url,
            post_body,
            headers,
        })
    }
}

/// A literal value or an explicit regex pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchDeclaration {
    Literal(String),
    Pattern { pattern: String },
}

impl MatchDeclaration {
    fn compile(&self) -> Result<ValueMatcher, ConfigError> {
        match self {
            MatchDeclaration::Literal(value) => Ok(ValueMatcher::exact(value.clone())),
            MatchDeclaration::Pattern { pattern } => ValueMatcher::pattern(pattern),
        }
    }
}

/// One response mapping, or a list of them for a sequenced contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseDeclaration {
    Sequence(Vec<ResponseFields>),
    Single(ResponseFields),
}

impl ResponseDeclaration {
    fn compile(&self) -> Result<StubResponses, ConfigError> {
        match self {
            ResponseDeclaration::Single(fields) => Ok(StubResponses::Single(fields.compile()?)),
            ResponseDeclaration::Sequence(sequence) => {
                if sequence.is_empty() {
                    return Err(ConfigError::EmptySequence);
                }
                let responses = sequence
                    .iter()
                    .map(ResponseFields::compile)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(StubResponses::Sequence(responses))
            }
        }
    }
}

/// The concrete fields of one response. Unset status defaults to 200, unset
/// body to the empty string.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ResponseFields {
    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_status() -> u16 {
    200
}

impl ResponseFields {
    fn compile(&self) -> Result<StubResponse, ConfigError> {
        if !(100..=599).contains(&self.status) {
            return Err(ConfigError::InvalidStatus(self.status));
        }
        Ok(StubResponse {
            status: self.status,
            body: self.body.clone(),
            headers: self.headers.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubSide;

    #[test]
    fn parse_simple_stub() {
        let yaml = r#"
stubs:
  - request:
      method: [GET]
      url: /hello
    response:
      status: 200
      body: "Hello, World!"
"#;
        let config = StubConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.stubs.len(), 1);

        let records = config.into_lifecycles().unwrap();
        let response = records[0].next_response();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Hello, World!");
    }

    #[test]
    fn parse_sequenced_stub() {
        let yaml = r#"
stubs:
  - request:
      method: [GET]
      url: /uri/with/sequenced/responses
    response:
      - status: 201
        body: "one"
      - status: 201
        body: "two"
      - status: 500
        body: "three"
"#;
        let records = StubConfig::from_yaml(yaml)
            .unwrap()
            .into_lifecycles()
            .unwrap();

        assert_eq!(records[0].next_response().body, "one");
        assert_eq!(records[0].next_response().body, "two");
        assert_eq!(records[0].next_response().status, 500);
        assert_eq!(records[0].next_sequenced_response_id(), 0);
    }

    #[test]
    fn parse_pattern_url_and_headers() {
        let yaml = r#"
stubs:
  - request:
      url:
        pattern: "/users/[0-9]+"
      headers:
        Content-Type: application/json
        Authorization:
          pattern: "Bearer .+"
    response:
      status: 200
"#;
        let records = StubConfig::from_yaml(yaml)
            .unwrap()
            .into_lifecycles()
            .unwrap();

        // Header names are normalized to lowercase at compile time.
        assert_eq!(
            records[0].field_content_named(StubSide::Request, "url"),
            Some("/users/[0-9]+".to_string())
        );
        assert!(records[0].request().headers.contains_key("content-type"));
        assert!(records[0].request().headers.contains_key("authorization"));
    }

    #[test]
    fn status_and_body_default_when_unset() {
        let yaml = r#"
stubs:
  - request:
      url: /defaults
    response: {}
"#;
        let records = StubConfig::from_yaml(yaml)
            .unwrap()
            .into_lifecycles()
            .unwrap();

        let response = records[0].next_response();
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[test]
    fn invalid_regex_is_rejected_with_its_index() {
        let yaml = r#"
stubs:
  - request:
      url: /fine
    response:
      status: 200
  - request:
      url:
        pattern: "[unclosed"
    response:
      status: 200
"#;
        let err = StubConfig::from_yaml(yaml).unwrap_err();
        match err {
            ConfigError::Declaration { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, ConfigError::InvalidPattern { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_response_sequence_is_rejected() {
        let yaml = r#"
stubs:
  - request:
      url: /seq
    response: []
"#;
        let err = StubConfig::from_yaml(yaml).unwrap_err();
        match err {
            ConfigError::Declaration { source, .. } => {
                assert!(matches!(*source, ConfigError::EmptySequence));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_status_is_rejected() {
        let yaml = r#"
stubs:
  - request:
      url: /bad
    response:
      status: 42
"#;
        assert!(StubConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn methods_are_normalized_to_uppercase() {
        let yaml = r#"
stubs:
  - request:
      method: [get, Post]
      url: /verbs
    response:
      status: 200
"#;
        let records = StubConfig::from_yaml(yaml)
            .unwrap()
            .into_lifecycles()
            .unwrap();
        assert_eq!(records[0].request().method, vec!["GET", "POST"]);
    }
}
