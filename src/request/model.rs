use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;

use crate::env::{expand_placeholders, expand_value, EnvMap};

/// What a caller submits: one request plus how often to fire it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestData {
    pub url: String,
    pub method: String,
    pub header: BTreeMap<String, String>,
    /// JSON, XML or plain-text payload depending on the declared content type.
    pub body: Option<Value>,
    pub form: BTreeMap<String, String>,
    /// Multipart attachments, field name to file path.
    pub files: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub frequency: usize,
    /// Seconds; absent or zero means the configured default.
    pub timeout: Option<u64>,
}

impl RequestData {
    /// Case-insensitive lookup in the caller's headers.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn expand(&self, env: &EnvMap) -> Result<RequestData> {
        Ok(RequestData {
            url: expand_placeholders(&self.url, env).context("expanding url")?,
            method: self.method.clone(),
            header: expand_map(&self.header, env).context("expanding headers")?,
            body: self
                .body
                .as_ref()
                .map(|body| expand_value(body, env))
                .transpose()
                .context("expanding body")?,
            form: expand_map(&self.form, env).context("expanding form fields")?,
            files: expand_map(&self.files, env).context("expanding file paths")?,
            params: expand_map(&self.params, env).context("expanding query parameters")?,
            frequency: self.frequency,
            timeout: self.timeout,
        })
    }
}

fn expand_map(map: &BTreeMap<String, String>, env: &EnvMap) -> Result<BTreeMap<String, String>> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), expand_placeholders(value, env)?)))
        .collect()
}

pub async fn load_request_data(path: &Path) -> Result<RequestData> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading request description {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing request description {}", path.display()))
}
