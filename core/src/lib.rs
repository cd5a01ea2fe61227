//! Request construction and response normalization over an HTTP transport.
//!
//! # Overview
//! A `RequestConfig` describes one request. The builder turns it into a
//! plain-data `HttpRequest`, a `Transport` executes it, and the response
//! pipeline validates the status, decodes headers and body into caller types,
//! and folds every failure into one `NetworkError` shape.
//!
//! # Design
//! - `NetworkManager` carries no per-request state; decode settings such as
//!   the date strategy travel with each `RequestConfig`.
//! - Request building and response processing are pure functions over plain
//!   data, so the whole pipeline is testable without sockets.
//! - Results are delivered on a configurable Tokio runtime handle.
//! - A fixture-backed stub provider can stand in for the network in tests.

pub mod builder;
pub mod client;
pub mod config;
pub mod date;
pub mod error;
pub mod http;
pub mod stub;
pub mod transport;

pub use client::{process_response, NetworkManager, NoHeader, Response};
pub use config::{Provider, RequestConfig, RequestConfigBuilder};
pub use date::{DateDecodeStrategy, Timestamp};
pub use error::{validate_status, Cause, ConfigError, ErrorKind, NetworkError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ParamValue, ParameterEncoding, Parameters};
pub use stub::{load_fixture, FixtureBundle, StubProvider};
pub use transport::{ReqwestTransport, Transport, TransportError};
