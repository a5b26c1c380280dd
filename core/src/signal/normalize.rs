use serde_json::Value;

const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];
const FALSY: [&str; 4] = ["false", "0", "no", "off"];

/// Reads a detection flag. `None` means the token carries no usable signal.
pub fn normalize_token(raw: &str) -> Option<bool> {
    let token = raw.trim().to_ascii_lowercase();
    if TRUTHY.contains(&token.as_str()) {
        return Some(true);
    }
    if FALSY.contains(&token.as_str()) {
        return Some(false);
    }
    // NaN compares false, infinity true.
    token.parse::<f64>().ok().map(|number| number > 0.0)
}

pub fn normalize_leaf(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n > 0.0),
        Value::String(text) => normalize_token(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognized_tokens_ignore_case_and_padding() {
        assert_eq!(normalize_token("On"), Some(true));
        assert_eq!(normalize_token(" YES "), Some(true));
        assert_eq!(normalize_token("0"), Some(false));
        assert_eq!(normalize_token("Off"), Some(false));
    }

    #[test]
    fn numbers_are_positive_or_not() {
        assert_eq!(normalize_token("2.5"), Some(true));
        assert_eq!(normalize_token("-3"), Some(false));
        assert_eq!(normalize_token("0.0"), Some(false));
    }

    #[test]
    fn unparsable_tokens_are_skipped() {
        assert_eq!(normalize_token("maybe"), None);
        assert_eq!(normalize_token(""), None);
    }

    #[test]
    fn non_finite_numbers_follow_the_sign_rule() {
        assert_eq!(normalize_token("NaN"), Some(false));
        assert_eq!(normalize_token("inf"), Some(true));
        assert_eq!(normalize_token("-Infinity"), Some(false));
    }

    #[test]
    fn json_scalars_normalize_directly() {
        assert_eq!(normalize_leaf(&json!(true)), Some(true));
        assert_eq!(normalize_leaf(&json!(0)), Some(false));
        assert_eq!(normalize_leaf(&json!(4)), Some(true));
        assert_eq!(normalize_leaf(&json!("on")), Some(true));
        assert_eq!(normalize_leaf(&json!({"Value": "on"})), None);
        assert_eq!(normalize_leaf(&Value::Null), None);
    }
}
