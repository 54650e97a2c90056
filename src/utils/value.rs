use serde_json::Value;

/// Render a JSON value from an error payload as a single line of text.
/// Strings are used as-is, everything else is serialized.
pub fn value_to_string(value: Value) -> String {
    let raw = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    strip_control_chars(raw)
}

fn strip_control_chars(s: String) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_are_unquoted() {
        assert_eq!(value_to_string(json!("bad credentials")), "bad credentials");
    }

    #[test]
    fn null_is_empty() {
        assert_eq!(value_to_string(Value::Null), "");
    }

    #[test]
    fn control_characters_are_removed() {
        assert_eq!(value_to_string(json!("line\nbreak")), "linebreak");
    }
}
