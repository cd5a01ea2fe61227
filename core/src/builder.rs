//! Turns a `RequestConfig` into a transport-ready `HttpRequest`.
//!
//! Pure: no I/O, and the same descriptor always yields the same request.

use reqwest::Url;

use crate::config::RequestConfig;
use crate::http::{HttpRequest, ParameterEncoding};

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Build the request described by `config`.
///
/// Returns `None` when scheme, host, port and path do not form a valid URL;
/// the pipeline reports that as `ErrorKind::MalformedUrl`.
pub fn build(config: &RequestConfig) -> Option<HttpRequest> {
    let mut url = compose_url(config)?;
    let mut headers = Vec::new();
    let mut body = None;

    if !config.parameters().is_empty() {
        match config.parameters_encoding() {
            ParameterEncoding::Url => {
                {
                    let mut query = url.query_pairs_mut();
                    for (name, value) in config.parameters() {
                        query.append_pair(name, &value.to_query_value());
                    }
                }
                set_header(&mut headers, "Content-Type", FORM_URLENCODED);
            }
            ParameterEncoding::Body => {
                body = serde_json::to_vec(config.parameters()).ok();
                set_header(&mut headers, "Accept", APPLICATION_JSON);
                set_header(&mut headers, "Content-Type", APPLICATION_JSON);
            }
        }
    }

    for (name, value) in config.headers() {
        set_header(&mut headers, name, value);
    }

    Some(HttpRequest {
        method: config.method(),
        url: url.to_string(),
        headers,
        body,
    })
}

fn compose_url(config: &RequestConfig) -> Option<Url> {
    let path = config.path();
    if config.scheme().is_empty() || config.host().is_empty() {
        return None;
    }
    if !path.is_empty() && !path.starts_with('/') {
        return None;
    }

    let mut url = Url::parse(&format!("{}://{}", config.scheme(), config.host())).ok()?;
    // The host must be a bare host: no credentials, port, path, query or fragment.
    if url.cannot_be_a_base()
        || url.host_str().is_none()
        || !url.username().is_empty()
        || url.port().is_some()
        || !matches!(url.path(), "" | "/")
        || url.query().is_some()
        || url.fragment().is_some()
    {
        return None;
    }

    url.set_port(config.port()).ok()?;
    url.set_path(path);
    Some(url)
}

/// Insert or replace a header, matching names case-insensitively.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}
