use colored::Colorize;
use serde_json::Value;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a JSON document, pretty-printed
pub fn json(value: &Value) {
    println!("{}", pretty_json(value).cyan());
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pretty_json_keeps_key_order() {
        let value = json!({"zeta": 1, "alpha": {"nested": [1, 2]}});
        assert_eq!(
            pretty_json(&value),
            "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"nested\": [\n      1,\n      2\n    ]\n  }\n}"
        );
    }

    #[test]
    fn test_pretty_json_scalar() {
        assert_eq!(pretty_json(&json!("done")), "\"done\"");
    }
}
