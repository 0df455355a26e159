use crate::metadata::ParameterLocation;
use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use std::collections::HashMap;

/// Raw request values a parameter can be read from.
#[derive(Debug, Default, Clone)]
pub struct RequestSources {
    path: HashMap<String, String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    cookies: HashMap<String, String>,
    body: Bytes,
}

impl RequestSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.path
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Query pairs in request order; repeated keys are kept.
    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    /// Headers; cookies are parsed from every `Cookie` header.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.cookies = parse_cookies(&headers);
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// All raw values for `name` in `location`.
    pub fn lookup(&self, location: ParameterLocation, name: &str) -> Vec<&str> {
        match location {
            ParameterLocation::Path => self.path.get(name).map(String::as_str).into_iter().collect(),
            ParameterLocation::Query => self
                .query
                .iter()
                .filter(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
                .collect(),
            ParameterLocation::Header => self
                .headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect(),
            ParameterLocation::Cookie => self
                .cookies
                .get(name)
                .map(String::as_str)
                .into_iter()
                .collect(),
        }
    }
}

/// Parse `name=value` pairs out of every `Cookie` header. The first
/// occurrence of a name wins, and surrounding double quotes are stripped.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in headers.get_all(COOKIE).iter() {
        let Ok(header) = header.to_str() else {
            continue;
        };
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches('"');
            cookies
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    cookies
}
