use serde_json::Value;

/// A capability that conditionally rewrites the value bound to a key
///
/// Rules have no error channel: a rule that does not recognise `key`, or
/// cannot handle `value`, returns `value` unchanged.
///
/// Any `Fn(&str, Value) -> Value` closure is a rule:
///
/// ```
/// use polylog::RedactionRule;
/// use serde_json::{json, Value};
///
/// let token_rule = |key: &str, value: Value| {
///     if key == "token" { json!("<hidden>") } else { value }
/// };
/// assert_eq!(token_rule.mask("token", json!("abc")), json!("<hidden>"));
/// assert_eq!(token_rule.mask("user", json!("abc")), json!("abc"));
/// ```
pub trait RedactionRule: Send + Sync {
    /// Return the value to log in place of `value`
    fn mask(&self, key: &str, value: Value) -> Value;
}

impl<F> RedactionRule for F
where
    F: Fn(&str, Value) -> Value + Send + Sync,
{
    fn mask(&self, key: &str, value: Value) -> Value {
        self(key, value)
    }
}
