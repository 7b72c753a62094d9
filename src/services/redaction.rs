use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::warn;

use crate::domain::ports::RedactionRule;

/// Ordered set of redaction rules applied to flattened key/value arguments
///
/// Every rule sees every string-keyed pair, in registration order, and
/// receives the value produced by the rules before it. Registration takes
/// the write side of the lock, processing the read side, so events can be
/// processed concurrently while new rules are added.
#[derive(Default)]
pub struct RedactionPipeline {
    rules: RwLock<Vec<Arc<dyn RedactionRule>>>,
}

impl RedactionPipeline {
    /// Create a pipeline with an initial rule set
    pub fn new(rules: impl IntoIterator<Item = Arc<dyn RedactionRule>>) -> Self {
        Self {
            rules: RwLock::new(rules.into_iter().collect()),
        }
    }

    /// Append rules after the existing ones
    pub fn register(&self, rules: impl IntoIterator<Item = Arc<dyn RedactionRule>>) {
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(rules);
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mask every key/value pair of `args`
    ///
    /// Keys sit at even indices. Pairs with a non-string key are left
    /// alone, and so is a trailing entry without a value. Length and order
    /// are always preserved.
    pub fn process(&self, mut args: Vec<Value>) -> Vec<Value> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        if rules.is_empty() {
            return args;
        }

        for pair in args.chunks_exact_mut(2) {
            let [key, value] = pair else { continue };
            let Value::String(key) = key else { continue };
            for rule in rules.iter() {
                *value = apply_rule(rule.as_ref(), key, std::mem::take(value));
            }
        }

        args
    }
}

/// Run one rule, keeping the original value if the rule panics
fn apply_rule(rule: &dyn RedactionRule, key: &str, value: Value) -> Value {
    let original = value.clone();
    match catch_unwind(AssertUnwindSafe(|| rule.mask(key, value))) {
        Ok(masked) => masked,
        Err(_) => {
            warn!(key, "redaction rule panicked, value left unchanged");
            original
        }
    }
}

impl fmt::Debug for RedactionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionPipeline")
            .field("rules", &self.len())
            .finish()
    }
}

/// Placeholder written in place of a password
pub const PASSWORD_PLACEHOLDER: &str = "[****]";

/// Masks `password` and `pwd` fields entirely
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordMask;

impl RedactionRule for PasswordMask {
    fn mask(&self, key: &str, value: Value) -> Value {
        if key == "password" || key == "pwd" {
            Value::String(PASSWORD_PLACEHOLDER.to_string())
        } else {
            value
        }
    }
}

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{3})\d{4}(\d{4})").expect("valid phone pattern"));

/// Hides the middle four digits of phone numbers under the `phone` key
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneMask;

impl RedactionRule for PhoneMask {
    fn mask(&self, key: &str, value: Value) -> Value {
        match value {
            Value::String(s) if key == "phone" => {
                Value::String(PHONE_PATTERN.replace_all(&s, "$1****$2").into_owned())
            }
            other => other,
        }
    }
}

/// Keeps the first four characters of an `address` value
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressMask;

impl RedactionRule for AddressMask {
    fn mask(&self, key: &str, value: Value) -> Value {
        match value {
            Value::String(s) if key == "address" => {
                let visible: String = s.chars().take(4).collect();
                if s.chars().count() > 4 {
                    Value::String(format!("{visible}****"))
                } else {
                    Value::String("****".to_string())
                }
            }
            other => other,
        }
    }
}

/// Scrubs credentials embedded in any string value, whatever its key
///
/// Catches API keys, `Authorization: Bearer` tokens and
/// `token=`/`secret=`/`api_key=` assignments.
#[derive(Clone)]
pub struct SecretPatternMask {
    api_key_pattern: Regex,
    token_pattern: Regex,
    bearer_pattern: Regex,
}

impl SecretPatternMask {
    pub fn new() -> Self {
        Self {
            api_key_pattern: Regex::new(r"sk-[a-zA-Z0-9_-]{20,}").expect("valid api key pattern"),
            token_pattern: Regex::new(
                r#"(?i)\b(api_key|apikey|token|secret)(["']?\s*[:=]\s*["']?)[a-zA-Z0-9_.-]{8,}"#,
            )
            .expect("valid token pattern"),
            bearer_pattern: Regex::new(r"Bearer\s+[a-zA-Z0-9_.-]+").expect("valid bearer pattern"),
        }
    }

    /// Scrub one string
    pub fn scrub(&self, text: &str) -> String {
        let scrubbed = self.api_key_pattern.replace_all(text, "[API_KEY_REDACTED]");
        let scrubbed = self
            .bearer_pattern
            .replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        self.token_pattern
            .replace_all(&scrubbed, "$1$2[REDACTED]")
            .into_owned()
    }
}

impl Default for SecretPatternMask {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecretPatternMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPatternMask").finish()
    }
}

impl RedactionRule for SecretPatternMask {
    fn mask(&self, _key: &str, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.scrub(&s)),
            other => other,
        }
    }
}

/// Rules installed whenever redaction is enabled
pub fn builtin_rules() -> Vec<Arc<dyn RedactionRule>> {
    vec![Arc::new(PasswordMask), Arc::new(PhoneMask)]
}

/// Resolve a built-in rule by name (`password`, `phone`, `address`, `secrets`)
pub fn rule_by_name(name: &str) -> Option<Arc<dyn RedactionRule>> {
    match name.trim().to_lowercase().as_str() {
        "password" => Some(Arc::new(PasswordMask)),
        "phone" => Some(Arc::new(PhoneMask)),
        "address" => Some(Arc::new(AddressMask)),
        "secrets" => Some(Arc::new(SecretPatternMask::new())),
        _ => None,
    }
}
