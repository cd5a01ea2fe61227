//! Response pipeline and the `NetworkManager` entry point.
//!
//! # Design
//! `NetworkManager` holds a transport and an optional execution context. A
//! request walks a fixed sequence: build, send, validate status, decode
//! headers (best-effort), require a body, decode the body. Every failure is
//! normalized into a `NetworkError` before it reaches the caller.
//!
//! [`process_response`] is the I/O-free half of the pipeline; it takes the
//! transport outcome as data so it can be exercised without a network.

use std::sync::Arc;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::builder;
use crate::config::{Provider, RequestConfig};
use crate::date;
use crate::error::{validate_status, Cause, ErrorKind, NetworkError};
use crate::http::{HttpRequest, HttpResponse};
use crate::stub::StubProvider;
use crate::transport::{ReqwestTransport, Transport, TransportError};

/// Header type for callers that ignore response headers.
pub type NoHeader = IgnoredAny;

/// A successfully decoded response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T, H = NoHeader> {
    pub object: T,
    /// `None` when the headers did not decode into `H`.
    pub header: Option<H>,
}

/// Entry point for issuing requests described by a `RequestConfig`.
#[derive(Clone)]
pub struct NetworkManager {
    transport: Arc<dyn Transport>,
    context: Option<Handle>,
}

impl Default for NetworkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NetworkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkManager")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl NetworkManager {
    /// A manager backed by a default `reqwest` client.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            context: None,
        }
    }

    /// Deliver results on `handle` for every request issued after this call.
    pub fn receive_on(mut self, handle: Handle) -> Self {
        self.context = Some(handle);
        self
    }

    pub fn execution_context(&self) -> Option<&Handle> {
        self.context.as_ref()
    }

    /// Perform the request and decode the body into `T` and headers into `H`.
    ///
    /// With an execution context configured the pipeline runs on that
    /// runtime and the result is handed back from there; otherwise it runs on
    /// the calling task.
    pub async fn request<T, H>(&self, config: &RequestConfig) -> Result<Response<T, H>, NetworkError>
    where
        T: DeserializeOwned + Send + 'static,
        H: DeserializeOwned + Send + 'static,
    {
        let Some(handle) = &self.context else {
            return perform(self.transport.as_ref(), config).await;
        };
        let transport = Arc::clone(&self.transport);
        let config = config.clone();
        handle
            .spawn(async move { perform(transport.as_ref(), &config).await })
            .await
            .unwrap_or_else(|e| Err(NetworkError::normalize(None, None, Cause::Other(e.to_string()))))
    }

    /// Callback form of [`NetworkManager::request`].
    ///
    /// `on_complete` runs on the configured execution context, or on the
    /// ambient Tokio runtime when none is set. Aborting the returned handle
    /// cancels the request. Without either runtime nothing is spawned and an
    /// `UnknownFailure` error is returned instead.
    pub fn request_with<T, H, F>(&self, config: RequestConfig, on_complete: F) -> Result<JoinHandle<()>, NetworkError>
    where
        T: DeserializeOwned + Send + 'static,
        H: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<Response<T, H>, NetworkError>) + Send + 'static,
    {
        let handle = match &self.context {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|e| {
                warn!("no runtime to run the request on: {e}");
                NetworkError::normalize(None, None, Cause::Other(e.to_string()))
            })?,
        };
        let transport = Arc::clone(&self.transport);
        Ok(handle.spawn(async move {
            let result = perform(transport.as_ref(), &config).await;
            on_complete(result);
        }))
    }
}

async fn perform<T, H>(transport: &dyn Transport, config: &RequestConfig) -> Result<Response<T, H>, NetworkError>
where
    T: DeserializeOwned,
    H: DeserializeOwned,
{
    match config.provider() {
        Provider::Network => network_request(transport, config).await,
        Provider::Stub => stub_request(config),
    }
}

async fn network_request<T, H>(transport: &dyn Transport, config: &RequestConfig) -> Result<Response<T, H>, NetworkError>
where
    T: DeserializeOwned,
    H: DeserializeOwned,
{
    let Some(request) = builder::build(config) else {
        dump(config, "MalformedUrl", config.path(), None, None);
        return Err(NetworkError::normalize(None, None, ErrorKind::MalformedUrl));
    };
    debug!("{} {}", request.method, request.url);
    let outcome = transport.execute(request.clone()).await;
    process_response(&request, outcome, config)
}

/// Validate and decode a transport outcome for `request`.
pub fn process_response<T, H>(
    request: &HttpRequest,
    outcome: Result<HttpResponse, TransportError>,
    config: &RequestConfig,
) -> Result<Response<T, H>, NetworkError>
where
    T: DeserializeOwned,
    H: DeserializeOwned,
{
    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            dump(config, "TransportError", &request.url, None, Some(request));
            return Err(NetworkError::normalize(None, None, err));
        }
    };
    let status = response.status;
    let body = response.body.as_deref();

    if let Err(kind) = validate_status(status) {
        dump(config, &format!("{kind:?}"), &request.url, body, Some(request));
        return Err(NetworkError::normalize(Some(status), body, kind));
    }

    let strategy = config.date_decode_strategy();
    let header = date::with_strategy(strategy, || decode_header::<H>(&response.headers));

    let Some(body) = body else {
        dump(config, "NoData", &request.url, None, Some(request));
        return Err(NetworkError::normalize(Some(status), None, ErrorKind::NoData));
    };

    match date::with_strategy(strategy, || decode_body::<T>(body)) {
        Ok(object) => {
            dump(config, "Decoding", &request.url, Some(body), Some(request));
            Ok(Response { object, header })
        }
        Err(err) => {
            dump(config, "DecoderFailure", &request.url, Some(body), Some(request));
            Err(NetworkError::normalize(Some(status), Some(body), err))
        }
    }
}

fn stub_request<T, H>(config: &RequestConfig) -> Result<Response<T, H>, NetworkError>
where
    T: DeserializeOwned,
{
    let payload = match (config.sample_data(), config.bundle()) {
        (Some(data), _) => data.to_vec(),
        (None, Some(bundle)) => StubProvider::json(config.path(), bundle.clone())
            .load()
            .map_err(|kind| {
                dump(config, "File not found", config.path(), None, None);
                NetworkError::normalize(None, None, kind)
            })?,
        (None, None) => return Err(NetworkError::normalize(None, None, ErrorKind::MalformedUrl)),
    };

    match date::with_strategy(config.date_decode_strategy(), || decode_body::<T>(&payload)) {
        Ok(object) => {
            dump(config, "Decoding Stub", config.path(), Some(&payload), None);
            Ok(Response { object, header: None })
        }
        Err(err) => {
            dump(config, "DecoderFailure", config.path(), None, None);
            Err(NetworkError::normalize(None, None, err))
        }
    }
}

/// Decode the body, reading an empty payload as `{}`.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    let bytes = if body.is_empty() { &b"{}"[..] } else { body };
    serde_json::from_slice(bytes)
}

/// Decode response headers, presented as a JSON object of string values.
/// Repeated names are joined with `", "`.
pub fn decode_header<H: DeserializeOwned>(headers: &[(String, String)]) -> Option<H> {
    let mut object = Map::new();
    for (name, value) in headers {
        match object.get_mut(name) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            _ => {
                object.insert(name.clone(), Value::String(value.clone()));
            }
        }
    }
    match serde_json::from_value(Value::Object(object)) {
        Ok(header) => Some(header),
        Err(err) => {
            debug!("response headers did not decode: {err}");
            None
        }
    }
}

fn dump(config: &RequestConfig, title: &str, url: &str, body: Option<&[u8]>, request: Option<&HttpRequest>) {
    if !config.debug_mode() {
        return;
    }
    let body = body.map_or_else(|| "No Data passed".to_string(), |b| String::from_utf8_lossy(b).into_owned());
    let curl = request.map_or_else(|| "No curl command passed".to_string(), HttpRequest::curl_string);
    debug!(target: "netlayer::debug", title, url, body = %body, curl = %curl);
}
