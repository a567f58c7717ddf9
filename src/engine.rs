//! The serving facade: matching, sequenced-response resolution and the
//! admin mutation surface, tied together over one repository.

use crate::config::StubConfig;
use crate::error::{AdminError, ConfigError};
use crate::matcher::{self, InboundRequest};
use crate::repository::{Snapshot, StubRepository};
use crate::stub::{StubHttpLifecycle, StubResponse};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of resolving one inbound request.
///
/// `NoMatch` is a distinct result, not an error and not a record with an
/// error response; the transport layer maps it to its not-found reply,
/// typically via [`StubEngine::not_found_response`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched {
        /// The contract that answered, for logging and admin display.
        stub: Arc<StubHttpLifecycle>,
        /// The concrete response for this call.
        response: StubResponse,
    },
    NoMatch,
}

impl Resolution {
    pub fn is_match(&self) -> bool {
        matches!(self, Resolution::Matched { .. })
    }
}

/// Stub serving engine.
///
/// Holds the repository plus request counters. Safe to share across worker
/// threads: matching passes read an immutable snapshot, reloads swap a
/// single reference, and each record guards its own sequence cursor.
#[derive(Debug, Default)]
pub struct StubEngine {
    repository: StubRepository,
    /// Total requests resolved.
    requests_served: AtomicU64,
    /// Requests that matched a contract.
    requests_matched: AtomicU64,
    /// Requests no contract matched.
    requests_unmatched: AtomicU64,
}

impl StubEngine {
    pub fn new() -> Self {
        StubEngine::default()
    }

    /// Engine pre-loaded with the given records.
    pub fn with_stubs(records: Vec<StubHttpLifecycle>) -> Self {
        let engine = StubEngine::new();
        engine.replace_all(records);
        engine
    }

    /// Build an engine from a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let records = StubConfig::from_file(path)?.into_lifecycles()?;
        info!(path = ?path, stubs = records.len(), "loaded stub configuration");
        Ok(StubEngine::with_stubs(records))
    }

    /// Hot reload from a file. The replacement collection is fully built
    /// before it becomes visible; on any error the previous collection
    /// stays authoritative and the error is returned to the caller.
    pub fn reload_file(&self, path: &Path) -> Result<usize, ConfigError> {
        let records = StubConfig::from_file(path)?.into_lifecycles()?;
        let count = records.len();
        self.repository.replace_all(records);
        info!(path = ?path, stubs = count, "reloaded stub configuration");
        Ok(count)
    }

    /// Resolve an inbound request: snapshot the repository, select the first
    /// matching contract, and retrieve that contract's next response
    /// (advancing its sequence cursor as the one observable side effect).
    pub fn resolve(&self, inbound: &InboundRequest) -> Resolution {
        self.requests_served.fetch_add(1, Ordering::Relaxed);

        let snapshot = self.repository.snapshot();
        match matcher::find_match(inbound, &snapshot) {
            Some(stub) => {
                self.requests_matched.fetch_add(1, Ordering::Relaxed);
                let response = stub.next_response();
                info!(
                    method = %inbound.method,
                    url = %inbound.full_url(),
                    status = response.status,
                    "request matched stub"
                );
                Resolution::Matched {
                    stub: Arc::clone(stub),
                    response,
                }
            }
            None => {
                self.requests_unmatched.fetch_add(1, Ordering::Relaxed);
                warn!(
                    method = %inbound.method,
                    url = %inbound.full_url(),
                    "no matching stub found"
                );
                Resolution::NoMatch
            }
        }
    }

    /// Deterministic not-found reply for a request no contract matched,
    /// with a diagnostic body describing what was searched.
    pub fn not_found_response(&self, inbound: &InboundRequest) -> StubResponse {
        let body = serde_json::json!({
            "error": "not_found",
            "message": "No matching stub found",
            "method": inbound.method,
            "url": inbound.full_url(),
            "stubs_searched": self.repository.len(),
        });
        StubResponse::new(404, body.to_string())
            .with_header("Content-Type", "application/json")
    }

    // Admin mutation surface. Point mutations can race a reload; a target
    // index that no longer exists comes back as a structured failure.

    pub fn add_stub(&self, record: StubHttpLifecycle) {
        self.repository.add(record);
    }

    pub fn replace_all(&self, records: Vec<StubHttpLifecycle>) {
        self.repository.replace_all(records);
    }

    pub fn update_stub(&self, index: usize, record: StubHttpLifecycle) -> Result<(), AdminError> {
        self.repository.update(index, record)
    }

    pub fn remove_stub(&self, index: usize) -> Result<Arc<StubHttpLifecycle>, AdminError> {
        self.repository.remove(index)
    }

    /// Current ordered view, for admin listings.
    pub fn stubs(&self) -> Snapshot {
        self.repository.snapshot()
    }

    pub fn stub_count(&self) -> usize {
        self.repository.len()
    }

    pub fn total_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn total_matched(&self) -> u64 {
        self.requests_matched.load(Ordering::Relaxed)
    }

    pub fn total_unmatched(&self) -> u64 {
        self.requests_unmatched.load(Ordering::Relaxed)
    }
}
