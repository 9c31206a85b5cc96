use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// HTTP verbs understood by the call-plane.
///
/// Mirrors the subset of methods the original reference client supports;
/// `CONNECT` and `TRACE` have no RPC-style use case and are intentionally
/// absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("unknown HTTP method: {other}")),
        }
    }
}

/// A single scalar or list-of-scalars query/path value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl ParamValue {
    /// `doseq`-style rendering: a list becomes repeated `(key, value)` pairs,
    /// a scalar becomes a single pair.
    pub fn doseq_pairs(&self, key: &str) -> Vec<(String, String)> {
        match self {
            ParamValue::Scalar(v) => vec![(key.to_string(), v.clone())],
            ParamValue::List(values) => values
                .iter()
                .map(|v| (key.to_string(), v.clone()))
                .collect(),
        }
    }
}

/// A fully-built HTTP request ready to be handed to the transport.
///
/// `url` starts out as the route's pattern (e.g. `/users/{username}`); the
/// final substituted URL is only materialized by [`HttpRequest::resolved_url`]
/// once all `path` variables are known to be present.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub path: HashMap<String, String>,
    pub query: HashMap<String, ParamValue>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url_pattern: impl Into<String>) -> Self {
        Self {
            method,
            url: url_pattern.into(),
            path: HashMap::new(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    /// Substitutes every `{name}` placeholder in `url` with the
    /// percent-encoded value of `path[name]`.
    ///
    /// Fails if a placeholder has no corresponding entry in `path`.
    pub fn resolved_url(&self) -> Result<String, MissingPathVariable> {
        let mut out = String::with_capacity(self.url.len());
        let bytes = self.url.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'{' {
                if let Some(end) = self.url[i..].find('}') {
                    let name = &self.url[i + 1..i + end];
                    let value = self
                        .path
                        .get(name)
                        .ok_or_else(|| MissingPathVariable(name.to_string()))?;
                    out.push_str(&percent_encode(value));
                    i += end + 1;
                    continue;
                }
            }
            let ch = self.url[i..].chars().next().unwrap();
            out.push(ch);
            i += ch.len_utf8();
        }
        Ok(out)
    }

    /// Renders the query string using `doseq` semantics (repeated keys for
    /// list values), sorted by key for determinism.
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .query
            .iter()
            .flat_map(|(k, v)| v.doseq_pairs(k))
            .collect();
        pairs.sort();
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    }
}

/// RFC 3986 percent-encoding for a path segment value. Deliberately not
/// `form_urlencoded::byte_serialize`, which escapes the
/// `application/x-www-form-urlencoded` way (space as `+`) rather than the
/// path way (space as `%20`).
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPathVariable(pub String);

impl fmt::Display for MissingPathVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing path variable: {}", self.0)
    }
}

impl std::error::Error for MissingPathVariable {}

/// A single `Link` header relation (RFC 8288), e.g. `rel="next"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub extra: HashMap<String, String>,
}

/// `rel -> Link` map parsed from a response's `Link` header.
pub type Links = HashMap<String, Link>;

/// Parses a `Link` header value of the form
/// `<https://a/b?page=2>; rel="next", <https://a/b?page=1>; rel="prev"`.
pub fn parse_link_header(value: &str) -> Links {
    let mut links = Links::new();
    for entry in value.split(',') {
        let entry = entry.trim();
        let Some(href_end) = entry.find('>') else {
            continue;
        };
        let Some(href) = entry.strip_prefix('<').map(|s| &s[..href_end - 1]) else {
            continue;
        };
        let mut rel = None;
        let mut extra = HashMap::new();
        for param in entry[href_end + 1..].split(';').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((k, v)) = param.split_once('=') {
                let v = v.trim().trim_matches('"').to_string();
                if k.trim() == "rel" {
                    rel = Some(v);
                } else {
                    extra.insert(k.trim().to_string(), v);
                }
            }
        }
        if let Some(rel) = rel {
            links.insert(
                rel.clone(),
                Link {
                    href: href.to_string(),
                    rel,
                    extra,
                },
            );
        }
    }
    links
}

/// Case-insensitive response header map, with a parsed JSON body and
/// derived `Link` relations.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    headers: HashMap<String, String>,
    pub json: serde_json::Value,
    pub links: Links,
}

impl HttpResponse {
    pub fn new(status: u16, headers: HashMap<String, String>, json: serde_json::Value) -> Self {
        let links = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("link"))
            .map(|(_, v)| parse_link_header(v))
            .unwrap_or_default();
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            json,
            links,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Total/connect timeout pair, defaulting to 30s total / 15s connect as
/// specified. Equality is component-wise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpTimeout {
    pub total: f64,
    pub connect: f64,
}

impl Default for HttpTimeout {
    fn default() -> Self {
        Self {
            total: 30.0,
            connect: 15.0,
        }
    }
}

impl HttpTimeout {
    pub fn new(total: f64, connect: f64) -> Self {
        Self { total, connect }
    }

    /// A scalar timeout sets `total` only; `connect` keeps the default.
    pub fn from_total(total: f64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }
}
