//! Request descriptors.
//!
//! A `RequestConfig` describes everything needed to build and decode one
//! request. It is assembled through `RequestConfigBuilder` and immutable
//! afterwards. A stub-provider descriptor without a fixture bundle cannot be
//! constructed.

use std::collections::BTreeMap;

use crate::date::DateDecodeStrategy;
use crate::error::ConfigError;
use crate::http::{HttpMethod, ParamValue, ParameterEncoding, Parameters};
use crate::stub::FixtureBundle;

/// Where response data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Network,
    /// Local fixtures from a `FixtureBundle`.
    Stub,
}

#[derive(Debug, Clone)]
pub struct RequestConfig {
    scheme: String,
    host: String,
    path: String,
    port: Option<u16>,
    method: HttpMethod,
    parameters: Parameters,
    headers: BTreeMap<String, String>,
    date_decode_strategy: Option<DateDecodeStrategy>,
    parameters_encoding: ParameterEncoding,
    sample_data: Option<Vec<u8>>,
    debug_mode: bool,
    provider: Provider,
    bundle: Option<FixtureBundle>,
}

impl RequestConfig {
    /// Start a descriptor for `path` on `host` with the defaults: `https`,
    /// `GET`, URL encoding, network provider and debug mode on.
    pub fn builder(host: impl Into<String>, path: impl Into<String>) -> RequestConfigBuilder {
        RequestConfigBuilder {
            config: RequestConfig {
                scheme: "https".to_string(),
                host: host.into(),
                path: path.into(),
                port: None,
                method: HttpMethod::Get,
                parameters: Parameters::new(),
                headers: BTreeMap::new(),
                date_decode_strategy: None,
                parameters_encoding: ParameterEncoding::Url,
                sample_data: None,
                debug_mode: true,
                provider: Provider::Network,
                bundle: None,
            },
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn date_decode_strategy(&self) -> Option<&DateDecodeStrategy> {
        self.date_decode_strategy.as_ref()
    }

    pub fn parameters_encoding(&self) -> ParameterEncoding {
        self.parameters_encoding
    }

    /// Payload served instead of a fixture file by the stub provider.
    pub fn sample_data(&self) -> Option<&[u8]> {
        self.sample_data.as_deref()
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn bundle(&self) -> Option<&FixtureBundle> {
        self.bundle.as_ref()
    }
}

/// Builder for [`RequestConfig`].
#[derive(Debug, Clone)]
pub struct RequestConfigBuilder {
    config: RequestConfig,
}

impl RequestConfigBuilder {
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.config.method = method;
        self
    }

    pub fn encoding(mut self, encoding: ParameterEncoding) -> Self {
        self.config.parameters_encoding = encoding;
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.config.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.config.parameters = parameters;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.config.headers = headers;
        self
    }

    pub fn date_decode_strategy(mut self, strategy: DateDecodeStrategy) -> Self {
        self.config.date_decode_strategy = Some(strategy);
        self
    }

    pub fn sample_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.config.sample_data = Some(data.into());
        self
    }

    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.config.debug_mode = enabled;
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn bundle(mut self, bundle: FixtureBundle) -> Self {
        self.config.bundle = Some(bundle);
        self
    }

    /// Finish the descriptor.
    ///
    /// Fails with `ConfigError::MissingBundle` when the stub provider is
    /// selected without a bundle.
    pub fn build(self) -> Result<RequestConfig, ConfigError> {
        if self.config.provider == Provider::Stub && self.config.bundle.is_none() {
            return Err(ConfigError::MissingBundle);
        }
        Ok(self.config)
    }
}
