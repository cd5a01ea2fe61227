//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! builder produces `HttpRequest` values and the response pipeline consumes
//! `HttpResponse` values; only a `Transport` implementation ever touches the
//! network. This keeps request construction and response normalization
//! deterministic and easy to test.
//!
//! Parameter values are a closed tagged variant (`ParamValue`) instead of an
//! untyped map, so the URL stringification rule for every value shape is
//! spelled out in one place.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method for a request. Serialized as its uppercase verb name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Connect,
    Delete,
    #[default]
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where request parameters are transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterEncoding {
    /// `www-form-urlencoded` query items with a `utf-8` charset.
    #[default]
    Url,
    /// A JSON object in the request body.
    Body,
}

/// A single request parameter value.
///
/// Serializes to the matching JSON value for body encoding. For URL encoding
/// see [`ParamValue::to_query_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Stringify the value for use as a URL query item.
    ///
    /// - `Null` becomes the empty string.
    /// - `Bool` becomes `true` / `false`.
    /// - Numbers use their shortest decimal form (`2.0` renders as `2`).
    /// - `String` is used verbatim; percent-encoding happens in the builder.
    /// - `Map` is rendered as compact JSON.
    pub fn to_query_value(&self) -> String {
        match self {
            ParamValue::Null => String::new(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Int(n) => n.to_string(),
            ParamValue::Float(n) => n.to_string(),
            ParamValue::String(s) => s.clone(),
            ParamValue::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<BTreeMap<String, ParamValue>> for ParamValue {
    fn from(value: BTreeMap<String, ParamValue>) -> Self {
        ParamValue::Map(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParamValue::Null, Into::into)
    }
}

/// Request parameters, ordered by name so built requests are deterministic.
pub type Parameters = BTreeMap<String, ParamValue>;

/// An HTTP request described as plain data.
///
/// Produced by [`crate::builder::build`]. A `Transport` executes it and hands
/// back the corresponding `HttpResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Render an equivalent `curl` invocation for manual reproduction.
    pub fn curl_string(&self) -> String {
        let mut parts = vec![
            "curl".to_string(),
            "-X".to_string(),
            self.method.to_string(),
            shell_quote(&self.url),
        ];
        for (name, value) in &self.headers {
            parts.push("-H".to_string());
            parts.push(shell_quote(&format!("{name}: {value}")));
        }
        if let Some(body) = &self.body {
            parts.push("-d".to_string());
            parts.push(shell_quote(&String::from_utf8_lossy(body)));
        }
        parts.join(" ")
    }
}

fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

/// An HTTP response described as plain data.
///
/// `body` is `None` only when the transport delivered no payload at all; an
/// empty payload is `Some(vec![])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}
