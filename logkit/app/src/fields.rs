use serde::Serialize;
use serde_json::Value;

/// Ordered key/value pairs attached to a record.
pub type Fields = serde_json::Map<String, Value>;

pub const SERVICE_NAME: &str = "service.name";
pub const SERVICE_VERSION: &str = "service.version";
pub const UNKNOWN: &str = "unknown";

/// Build a [`Fields`] map from `key => value` pairs.
///
/// ```
/// let fields = logkit::fields! { "user_id" => "12345", "retry_count" => 3 };
/// assert_eq!(fields["retry_count"], 3);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert(
                ::std::string::String::from($key),
                $crate::fields::to_value($value),
            );
        )+
        fields
    }};
}

/// Serialize a value into a field value. Values that fail to serialize
/// become `null` rather than aborting the log call.
pub fn to_value<V: Serialize>(value: V) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Constant fields for a new logger: `service.name` and `service.version`
/// come first and fall back to `"unknown"`, the remaining keys follow in
/// their original order.
pub fn with_service_defaults(initial: &Fields) -> Fields {
    let mut fields = Fields::with_capacity(initial.len() + 2);
    for key in [SERVICE_NAME, SERVICE_VERSION] {
        let value = initial.get(key);
        let value = if is_blank(value) {
            Value::String(UNKNOWN.to_string())
        } else {
            value.cloned().unwrap_or(Value::Null)
        };
        fields.insert(key.to_string(), value);
    }
    for (key, value) in initial {
        if key != SERVICE_NAME && key != SERVICE_VERSION {
            fields.insert(key.clone(), value.clone());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_service_keys_become_unknown() {
        let fields = with_service_defaults(&Fields::new());
        assert_eq!(fields[SERVICE_NAME], json!("unknown"));
        assert_eq!(fields[SERVICE_VERSION], json!("unknown"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_partial_service_keys() {
        let initial = crate::fields! { SERVICE_NAME => "partial-demo-service" };
        let fields = with_service_defaults(&initial);
        assert_eq!(fields[SERVICE_NAME], json!("partial-demo-service"));
        assert_eq!(fields[SERVICE_VERSION], json!("unknown"));
    }

    #[test]
    fn test_blank_and_null_values_are_replaced() {
        let initial = crate::fields! { SERVICE_NAME => "", SERVICE_VERSION => Value::Null };
        let fields = with_service_defaults(&initial);
        assert_eq!(fields[SERVICE_NAME], json!("unknown"));
        assert_eq!(fields[SERVICE_VERSION], json!("unknown"));
    }

    #[test]
    fn test_custom_values_and_order_are_kept() {
        let initial = crate::fields! {
            "team" => "platform",
            SERVICE_VERSION => "custom-version",
            SERVICE_NAME => "custom-service",
            "port" => 8080,
        };
        let fields = with_service_defaults(&initial);
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![SERVICE_NAME, SERVICE_VERSION, "team", "port"]);
        assert_eq!(fields[SERVICE_NAME], json!("custom-service"));
        assert_eq!(fields["port"], json!(8080));
    }

    #[test]
    fn test_fields_macro_accepts_owned_keys_and_nested_values() {
        let key = String::from("headers");
        let fields = crate::fields! {
            key => json!({ "content-type": "application/json" }),
            "tags" => vec!["primary", "email"],
        };
        assert_eq!(fields["headers"]["content-type"], json!("application/json"));
        assert_eq!(fields["tags"], json!(["primary", "email"]));
    }
}
