//! Stubforge
//!
//! An HTTP stub server engine: declare request/response contracts, then ask
//! the engine which contract an inbound request hits and what response to
//! emit. The surrounding HTTP listener, file watcher and admin transport
//! stay outside this crate; they hand over request descriptors and typed
//! contract records and get back concrete responses.
//!
//! # Features
//!
//! - **Request Matching**: match by url (literal or regex), method, headers
//!   and post body, first-match-wins in declaration order
//! - **Sequenced Responses**: a contract can cycle through an ordered list
//!   of responses, one per matching call, wrapping back to the start
//! - **Hot Reload**: the contract collection is swapped atomically, so
//!   in-flight requests never observe a half-built set
//! - **Admin Mutations**: add, replace-all, update and remove-by-index with
//!   structured failures
//!
//! # Example Configuration
//!
//! ```yaml
//! stubs:
//!   - request:
//!       method: [GET]
//!       url: /hello
//!     response:
//!       - status: 200
//!         body: "Hi"
//!       - status: 200
//!         body: "Bye"
//! ```
//!
//! # Example
//!
//! ```
//! use stubforge::{InboundRequest, Resolution, StubBuilder, StubEngine};
//!
//! let stub = StubBuilder::new()
//!     .when_method("GET")
//!     .when_url("/hello")
//!     .then_body("Hi")
//!     .build()
//!     .unwrap();
//! let engine = StubEngine::with_stubs(vec![stub]);
//!
//! match engine.resolve(&InboundRequest::new("GET", "/hello")) {
//!     Resolution::Matched { response, .. } => assert_eq!(response.body, "Hi"),
//!     Resolution::NoMatch => unreachable!(),
//! }
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod repository;
pub mod stub;

pub use builder::StubBuilder;
pub use config::StubConfig;
pub use engine::{Resolution, StubEngine};
pub use error::{AdminError, ConfigError};
pub use matcher::InboundRequest;
pub use repository::StubRepository;
pub use stub::{StubHttpLifecycle, StubRequest, StubResponse, StubResponses, StubSide};
