//! Transport seam between the pipeline and the network.
//!
//! # Design
//! The pipeline never performs I/O itself: it hands an `HttpRequest` to a
//! `Transport` and receives an `HttpResponse` or a `TransportError`. The
//! default implementation is backed by `reqwest`; tests substitute their own.

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::http::{HttpRequest, HttpResponse};

/// Failure signals raised by a transport before any HTTP status is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// An established connection dropped mid-exchange.
    #[error("the network connection was lost")]
    ConnectionLost,

    /// The host could not be reached at all.
    #[error("not connected to the network")]
    NotConnected,

    /// The transport completed but did not produce an HTTP response.
    #[error("the response was not an HTTP response")]
    NotHttp,

    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Classify the signal into the error taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            TransportError::ConnectionLost => ErrorKind::ConnectionLost,
            TransportError::NotConnected => ErrorKind::NotConnected,
            TransportError::NotHttp => ErrorKind::UnknownFailure,
            TransportError::Other(_) => ErrorKind::RequestFailure,
        }
    }
}

/// Executes built requests. Implementations own all socket I/O.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}

/// `Transport` backed by a `reqwest::Client` with its default settings.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::Other(e.to_string()))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(classify)?;

        debug!("{} {} -> {status} ({} bytes)", request.method, request.url, body.len());

        Ok(HttpResponse {
            status,
            headers,
            body: Some(body.to_vec()),
        })
    }
}

/// Map a `reqwest` failure to a transport signal.
///
/// Connect failures mean the host was never reached. Resets, aborts, a peer
/// that hangs up before answering and truncated bodies on an established
/// connection count as a lost connection.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        warn!("connect failed: {err}");
        return TransportError::NotConnected;
    }
    if err.is_body() || caused_by(&err, is_dropped_connection) {
        warn!("connection lost: {err}");
        return TransportError::ConnectionLost;
    }
    warn!("request failed: {err}");
    TransportError::Other(err.to_string())
}

fn is_dropped_connection(cause: &(dyn StdError + 'static)) -> bool {
    if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
        return hyper_err.is_incomplete_message();
    }
    cause.downcast_ref::<io::Error>().is_some_and(|io_err| {
        matches!(
            io_err.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
        )
    })
}

/// Whether `err` or anything in its source chain satisfies `pred`.
fn caused_by(err: &(dyn StdError + 'static), pred: fn(&(dyn StdError + 'static)) -> bool) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(current) = source {
        if pred(current) {
            return true;
        }
        source = current.source();
    }
    false
}
