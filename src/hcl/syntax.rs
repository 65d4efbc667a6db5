use serde_json::Value;

/// Whether `name` can be written bare as an HCL identifier or attribute key
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Quote and escape a string literal
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');

    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            // Template sequences must not be interpreted
            '$' | '%' if chars.peek() == Some(&'{') => {
                quoted.push(c);
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }

    quoted.push('"');
    quoted
}

/// Key of an object or map entry, quoted unless it is a plain identifier
pub fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Render a JSON scalar as an HCL literal
pub fn scalar_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

/// Render any JSON value as an HCL expression at the given indent level
pub fn json_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) if items.iter().all(|i| !i.is_array() && !i.is_object()) => format!(
            "[{}]",
            items.iter().map(scalar_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Array(items) => {
            let mut text = "[\n".to_string();
            for item in items {
                text.push_str(&format!(
                    "{}{},\n",
                    pad(indent + 1),
                    json_value(item, indent + 1)
                ));
            }
            text.push_str(&format!("{}]", pad(indent)));
            text
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let mut text = "{\n".to_string();
            for (key, item) in map {
                text.push_str(&format!(
                    "{}{} = {}\n",
                    pad(indent + 1),
                    object_key(key),
                    json_value(item, indent + 1)
                ));
            }
            text.push_str(&format!("{}}}", pad(indent)));
            text
        }
        scalar => scalar_literal(scalar),
    }
}

/// Two spaces per indent level
pub fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("Name"));
        assert!(is_identifier("my_bucket-1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("aws:cloudformation:stack-name"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(quote("${var}"), "\"$${var}\"");
        assert_eq!(quote("100%{x}"), "\"100%%{x}\"");
        assert_eq!(quote("cost $5"), "\"cost $5\"");
    }

    #[test]
    fn test_scalar_literals() {
        assert_eq!(scalar_literal(&json!(null)), "null");
        assert_eq!(scalar_literal(&json!(false)), "false");
        assert_eq!(scalar_literal(&json!(300)), "300");
        assert_eq!(scalar_literal(&json!("t3.medium")), "\"t3.medium\"");
    }

    #[test]
    fn test_json_value_nesting() {
        let value = json!({"us-east-1:x": {"AMI": "ami-1", "Zones": ["a", "b"]}});
        assert_eq!(
            json_value(&value, 1),
            "{\n    \"us-east-1:x\" = {\n      AMI = \"ami-1\"\n      Zones = [\"a\", \"b\"]\n    }\n  }"
        );
        assert_eq!(json_value(&json!([]), 0), "[]");
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("Name"), "Name");
        assert_eq!(object_key("kubernetes.io/role"), "\"kubernetes.io/role\"");
    }
}
