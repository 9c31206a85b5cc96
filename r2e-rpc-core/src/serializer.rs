use serde_json::{Map, Value};

/// Converts a set of body-located fields into a wire payload for one
/// content type.
pub trait BodySerializer: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn serialize(&self, fields: &Map<String, Value>) -> String;
}

/// Default JSON body serializer. Timestamps serialize via `chrono`'s serde
/// support (RFC 3339) since request schemas bring their own `Serialize`;
/// [`crate::schema::Secret`] fields are already unwrapped to plain values by
/// the time they reach this serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodySerializer;

impl BodySerializer for JsonBodySerializer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize(&self, fields: &Map<String, Value>) -> String {
        serde_json::to_string(fields).unwrap_or_default()
    }
}

/// `application/x-www-form-urlencoded` body serializer with `doseq`
/// semantics: array-valued fields become repeated keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormUrlencodedBodySerializer;

impl BodySerializer for FormUrlencodedBodySerializer {
    fn content_type(&self) -> &'static str {
        "application/x-www-form-urlencoded"
    }

    fn serialize(&self, fields: &Map<String, Value>) -> String {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (key, value) in fields {
            match value {
                Value::Array(items) => {
                    for item in items {
                        pairs.push((key.clone(), scalar_to_string(item)));
                    }
                }
                other => pairs.push((key.clone(), scalar_to_string(other))),
            }
        }
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Ordered list of serializers, most-recently-registered first, so user
/// extensions shadow the built-ins (spec.md §4.1, §9 design note).
pub struct SerializerRegistry {
    serializers: Vec<Box<dyn BodySerializer>>,
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self {
            serializers: vec![
                Box::new(JsonBodySerializer),
                Box::new(FormUrlencodedBodySerializer),
            ],
        }
    }
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `serializer` so it is tried before any already-registered
    /// serializer, including the built-ins.
    pub fn register(&mut self, serializer: impl BodySerializer + 'static) {
        self.serializers.insert(0, Box::new(serializer));
    }

    pub fn get(&self, content_type: &str) -> Option<&dyn BodySerializer> {
        self.serializers
            .iter()
            .find(|s| s.content_type().eq_ignore_ascii_case(content_type))
            .map(|s| s.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_with_no_content_type_is_empty_string() {
        let fields = Map::new();
        let s = JsonBodySerializer.serialize(&fields);
        assert_eq!(s, "{}");
    }

    #[test]
    fn form_urlencoded_doseq_repeats_keys() {
        let mut fields = Map::new();
        fields.insert(
            "tag".to_string(),
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())]),
        );
        let s = FormUrlencodedBodySerializer.serialize(&fields);
        assert_eq!(s, "tag=a&tag=b");
    }

    #[test]
    fn registering_a_serializer_prepends_and_shadows_builtins() {
        struct CustomJson;
        impl BodySerializer for CustomJson {
            fn content_type(&self) -> &'static str {
                "application/json"
            }
            fn serialize(&self, _fields: &Map<String, Value>) -> String {
                "custom".to_string()
            }
        }
        let mut registry = SerializerRegistry::new();
        registry.register(CustomJson);
        let picked = registry.get("application/json").unwrap();
        assert_eq!(picked.serialize(&Map::new()), "custom");
    }

    #[test]
    fn unknown_content_type_is_not_found() {
        let registry = SerializerRegistry::new();
        assert!(registry.get("application/xml").is_none());
    }
}
