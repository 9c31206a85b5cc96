use crate::error::ConfigurationError;
use crate::types::{HttpMethod, HttpRequest, Links, ParamValue};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Where a request field is placed on the wire. Every field of a
/// [`RequestSchema`] is tagged with exactly one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
}

/// Static descriptor for one field of a request schema, mirroring the
/// original's `pydantic.Field` partials (`PathInfoField`, `QueryStringField`,
/// `HeaderField`, `PostBodyField`) that attach `location` metadata per field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// The field's name as it appears in the struct's `Serialize` output.
    pub name: &'static str,
    /// Wire name, if it differs from `name`.
    pub alias: Option<&'static str>,
    pub location: Location,
}

impl FieldSpec {
    pub const fn path(name: &'static str) -> Self {
        Self { name, alias: None, location: Location::Path }
    }
    pub const fn query(name: &'static str) -> Self {
        Self { name, alias: None, location: Location::Query }
    }
    pub const fn header(name: &'static str) -> Self {
        Self { name, alias: None, location: Location::Header }
    }
    pub const fn body(name: &'static str) -> Self {
        Self { name, alias: None, location: Location::Body }
    }
    pub const fn with_alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn wire_name(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }
}

/// A typed request parameter object. Implementors declare where each of
/// their `Serialize`d fields lands on the wire via [`RequestSchema::fields`].
pub trait RequestSchema: Serialize {
    fn fields() -> &'static [FieldSpec]
    where
        Self: Sized;
}

/// Wraps a value that must never leak in logs or `Debug` output, but is
/// unwrapped to its plain string form at serialization time (spec.md §4.1).
#[derive(Clone)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(******)")
    }
}

impl<T: Serialize> Serialize for Secret<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Unwrapped to its plain value on the wire — never the redacted form.
        self.0.serialize(serializer)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn value_to_param(value: &Value) -> ParamValue {
    match value {
        Value::Array(items) => ParamValue::List(items.iter().map(value_to_string).collect()),
        other => ParamValue::Scalar(value_to_string(other)),
    }
}

/// Partitions `req`'s serialized fields by [`Location`] and builds an
/// [`HttpRequest`]. `url_pattern` should already be `endpoint + route path`.
///
/// - `path` fields are included even when `null` (`exclude_none=false`).
/// - `query`/`header` fields with a `null` value become an empty string
///   rather than being dropped, per spec.md §4.1's `exclude_unset=false`
///   merge semantics.
/// - `body` fields are handed to whichever [`crate::serializer::BodySerializer`]
///   matches the request's own resolved Content-Type: a schema-declared
///   `Content-Type` header field wins, then the caller-supplied
///   `content_type` default, then `application/json`. A declared header is
///   never overwritten.
pub fn serialize_request<R: RequestSchema>(
    req: &R,
    method: HttpMethod,
    url_pattern: &str,
    content_type: Option<&str>,
    serializers: &crate::serializer::SerializerRegistry,
) -> Result<HttpRequest, ConfigurationError> {
    let value = serde_json::to_value(req)
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
    let obj = value.as_object().cloned().unwrap_or_default();

    let mut http_req = HttpRequest::new(method, url_pattern.to_string());
    let mut body_fields = serde_json::Map::new();

    for field in R::fields() {
        let wire_name = field.wire_name();
        let raw = obj.get(field.name).cloned().unwrap_or(Value::Null);
        match field.location {
            Location::Path => {
                http_req.path.insert(wire_name.to_string(), value_to_string(&raw));
            }
            Location::Query => {
                http_req.query.insert(wire_name.to_string(), value_to_param(&raw));
            }
            Location::Header => {
                http_req.headers.insert(wire_name.to_string(), value_to_string(&raw));
            }
            Location::Body => {
                body_fields.insert(wire_name.to_string(), raw);
            }
        }
    }

    if !body_fields.is_empty() {
        // A schema-declared `Content-Type` header field wins over the
        // caller-supplied default — mirrors `serialize_body` selecting its
        // serializer from the request's own Content-Type header rather than
        // imposing one (original's `request_serializer.py`).
        let declared_ct = http_req
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone());
        let ct = declared_ct
            .clone()
            .or_else(|| content_type.map(str::to_string))
            .unwrap_or_else(|| "application/json".to_string());
        let serializer = serializers
            .get(&ct)
            .ok_or_else(|| ConfigurationError::UnregisteredContentType(ct.clone()))?;
        http_req.body = serializer.serialize(&body_fields);
        if declared_ct.is_none() {
            http_req.headers.insert("Content-Type".to_string(), ct);
        }
    }

    Ok(http_req)
}

/// Metadata accompanying a parsed collection response.
#[derive(Debug, Clone)]
pub struct CollectionMeta {
    pub count: usize,
    pub total_count: Option<u64>,
    pub links: Links,
}

/// Splits a collection [`crate::types::HttpResponse`] into metadata plus an
/// ordered list of raw JSON items. Per-item schema parsing happens lazily,
/// one [`crate::route_proxy::CollectionIterator`] step at a time — this
/// trait only does the eager, transport-adjacent work.
pub trait CollectionParser: Send + Sync {
    fn parse(&self, response: &crate::types::HttpResponse) -> (CollectionMeta, Vec<Value>);
}

/// The built-in parser: expects the response body to be a JSON array, with
/// an optional `Total-Count` response header.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCollectionParser;

impl CollectionParser for DefaultCollectionParser {
    fn parse(&self, response: &crate::types::HttpResponse) -> (CollectionMeta, Vec<Value>) {
        let items = response.json.as_array().cloned().unwrap_or_default();
        let total_count = response
            .header("total-count")
            .and_then(|s| s.parse::<u64>().ok());
        let meta = CollectionMeta {
            count: items.len(),
            total_count,
            links: response.links.clone(),
        };
        (meta, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::SerializerRegistry;
    use serde::Serialize;

    #[derive(Serialize)]
    struct UserReq {
        username: String,
        #[serde(rename = "X-Trace-Id")]
        trace_id: String,
        tags: Vec<String>,
        password: Secret<String>,
    }

    impl RequestSchema for UserReq {
        fn fields() -> &'static [FieldSpec] {
            &[
                FieldSpec::path("username"),
                FieldSpec::header("X-Trace-Id"),
                FieldSpec::query("tags"),
                FieldSpec::body("password"),
            ]
        }
    }

    #[test]
    fn partitions_fields_by_location() {
        let req = UserReq {
            username: "alice".into(),
            trace_id: "t-1".into(),
            tags: vec!["a".into(), "b".into()],
            password: Secret::new("hunter2".into()),
        };
        let serializers = SerializerRegistry::default();
        let http_req =
            serialize_request(&req, HttpMethod::Get, "/users/{username}", None, &serializers)
                .unwrap();
        assert_eq!(http_req.path.get("username"), Some(&"alice".to_string()));
        assert_eq!(http_req.headers.get("X-Trace-Id"), Some(&"t-1".to_string()));
        assert_eq!(
            http_req.query.get("tags"),
            Some(&ParamValue::List(vec!["a".into(), "b".into()]))
        );
        assert!(http_req.body.contains("hunter2"));
    }

    #[test]
    fn secret_field_serializes_unwrapped() {
        let req = UserReq {
            username: "bob".into(),
            trace_id: "t-2".into(),
            tags: vec![],
            password: Secret::new("s3cr3t".into()),
        };
        let serializers = SerializerRegistry::default();
        let http_req =
            serialize_request(&req, HttpMethod::Post, "/users", None, &serializers).unwrap();
        assert!(http_req.body.contains("s3cr3t"));
        assert!(!http_req.body.contains("******"));
    }

    #[derive(Serialize)]
    struct FormReq {
        #[serde(rename = "Content-Type")]
        content_type: String,
        username: String,
    }

    impl RequestSchema for FormReq {
        fn fields() -> &'static [FieldSpec] {
            &[
                FieldSpec::header("Content-Type"),
                FieldSpec::body("username"),
            ]
        }
    }

    #[test]
    fn schema_declared_content_type_selects_form_urlencoded_serializer() {
        let req = FormReq {
            content_type: "application/x-www-form-urlencoded".to_string(),
            username: "alice".to_string(),
        };
        let serializers = SerializerRegistry::default();
        let http_req = serialize_request(&req, HttpMethod::Post, "/users", None, &serializers).unwrap();
        assert_eq!(http_req.body, "username=alice");
        assert_eq!(
            http_req.headers.get("Content-Type"),
            Some(&"application/x-www-form-urlencoded".to_string())
        );
    }

    #[test]
    fn default_collection_parser_reads_total_count_header() {
        use std::collections::HashMap;
        let mut headers = HashMap::new();
        headers.insert("Total-Count".to_string(), "10".to_string());
        let resp = crate::types::HttpResponse::new(
            200,
            headers,
            serde_json::json!([{"name": "alice"}, {"name": "bob"}]),
        );
        let (meta, items) = DefaultCollectionParser.parse(&resp);
        assert_eq!(meta.count, 2);
        assert_eq!(meta.total_count, Some(10));
        assert_eq!(items.len(), 2);
    }
}
