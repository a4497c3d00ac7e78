use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use url::form_urlencoded;

use super::{model::RequestData, multipart::encode_multipart};

pub const JSON: &str = "application/json";
pub const XML: &str = "application/xml";
pub const TEXT: &str = "text/plain";
pub const FORM: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Picks exactly one body strategy: files, then form fields, then the structured body.
///
/// Relative file paths resolve against `base_dir`.
pub async fn encode_body(data: &RequestData, base_dir: &Path) -> Result<Option<EncodedBody>> {
    if !data.files.is_empty() {
        return encode_multipart(&data.form, &data.files, base_dir).await.map(Some);
    }

    if !data.form.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(data.form.iter())
            .finish();
        return Ok(Some(EncodedBody {
            bytes: encoded.into_bytes(),
            content_type: FORM.to_string(),
        }));
    }

    match &data.body {
        None | Some(Value::Null) => Ok(None),
        Some(body) => {
            let declared = data
                .header_value("Content-Type")
                .unwrap_or_default()
                .to_ascii_lowercase();
            encode_structured(body, &declared).map(Some)
        }
    }
}

fn encode_structured(body: &Value, declared: &str) -> Result<EncodedBody> {
    if declared.contains("xml") {
        let Value::String(text) = body else {
            bail!("XML request body must be a string");
        };
        return Ok(EncodedBody {
            bytes: text.clone().into_bytes(),
            content_type: XML.to_string(),
        });
    }

    if declared.contains("plain") {
        let Value::String(text) = body else {
            bail!("Plain-text request body must be a string");
        };
        return Ok(EncodedBody {
            bytes: text.clone().into_bytes(),
            content_type: TEXT.to_string(),
        });
    }

    let bytes = serde_json::to_vec(body).context("encoding JSON request body")?;
    Ok(EncodedBody {
        bytes,
        content_type: JSON.to_string(),
    })
}
