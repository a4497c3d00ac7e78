use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Method,
};
use url::Url;

use crate::engine::{RequestBody, RequestTemplate};

use super::{encode::encode_body, model::RequestData};

/// Inputs to template construction that come from configuration rather than the description.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Relative attachment paths resolve here.
    pub base_dir: &'a Path,
    /// Applied before the caller's headers, which win on conflict.
    pub default_headers: &'a BTreeMap<String, String>,
}

pub async fn build_template(data: &RequestData, context: &BuildContext<'_>) -> Result<RequestTemplate> {
    let method = parse_method(&data.method)?;
    let mut url = Url::parse(data.url.trim())
        .with_context(|| format!("invalid request URL {}", data.url))?;

    let encoded = encode_body(data, context.base_dir).await?;

    let mut headers = HeaderMap::new();
    insert_headers(&mut headers, context.default_headers)?;
    insert_headers(&mut headers, &data.header)?;
    if let Some(encoded) = &encoded {
        if !headers.contains_key(CONTENT_TYPE) {
            let value = HeaderValue::from_str(&encoded.content_type)
                .context("derived content type is not a valid header value")?;
            headers.insert(CONTENT_TYPE, value);
        }
    }

    merge_params(&mut url, &data.params);

    let mut template = RequestTemplate::new(method, url).with_headers(headers);
    if let Some(encoded) = encoded {
        template = template.with_body(RequestBody::buffered(encoded.bytes));
    }
    Ok(template)
}

fn parse_method(raw: &str) -> Result<Method> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(trimmed.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method {raw}"))
}

fn insert_headers(headers: &mut HeaderMap, source: &BTreeMap<String, String>) -> Result<()> {
    for (name, value) in source {
        let header_name = HeaderName::from_bytes(name.trim().as_bytes())
            .with_context(|| format!("invalid header name {name}"))?;
        let header_value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("invalid value for header {name}"))?;
        headers.insert(header_name, header_value);
    }
    Ok(())
}

/// Sets each parameter on the query, replacing earlier values for the same key, and
/// re-encodes the whole query sorted by key.
fn merge_params(url: &mut Url, params: &BTreeMap<String, String>) {
    if params.is_empty() {
        return;
    }

    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        merged
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    for (key, value) in params {
        merged.insert(key.clone(), vec![value.clone()]);
    }

    let mut query = url.query_pairs_mut();
    query.clear();
    for (key, values) in &merged {
        for value in values {
            query.append_pair(key, value);
        }
    }
}
