use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::env::EnvMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\([{}])|\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("valid placeholder regex")
});

/// Replaces `{NAME}` with a value from `env`, falling back to the process environment.
///
/// `\{` and `\}` produce literal braces. Every unresolved name is reported in one error.
pub fn expand_placeholders(input: &str, env: &EnvMap) -> Result<String> {
    let mut missing: Vec<String> = Vec::new();
    let rendered = PLACEHOLDER.replace_all(input, |caps: &Captures<'_>| {
        if let Some(brace) = caps.get(1) {
            return brace.as_str().to_string();
        }
        let key = &caps[2];
        match env.get(key).cloned().or_else(|| std::env::var(key).ok()) {
            Some(value) => value,
            None => {
                missing.push(key.to_string());
                caps[0].to_string()
            }
        }
    });

    if !missing.is_empty() {
        bail!("Missing template variable: {}", missing.join(", "));
    }
    Ok(rendered.into_owned())
}

/// Expands placeholders in every string leaf of a JSON value.
pub fn expand_value(value: &Value, env: &EnvMap) -> Result<Value> {
    Ok(match value {
        Value::String(text) => Value::String(expand_placeholders(text, env)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| expand_value(item, env))
                .collect::<Result<_>>()?,
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, item)| Ok((key.clone(), expand_value(item, env)?)))
                .collect::<Result<_>>()?,
        ),
        other => other.clone(),
    })
}
