use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use tokio::fs;
use uuid::Uuid;

use super::encode::EncodedBody;

/// Encodes form fields followed by file parts into one buffered `multipart/form-data` body.
///
/// Files are read once here, so every copy of the resulting template replays the same bytes.
pub(super) async fn encode_multipart(
    fields: &BTreeMap<String, String>,
    files: &BTreeMap<String, String>,
    base_dir: &Path,
) -> Result<EncodedBody> {
    let boundary = format!("burstpit-{}", Uuid::new_v4().simple());
    let mut out = Vec::new();

    for (name, value) in fields {
        open_part(&mut out, &boundary);
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                escape_quotes(name)
            )
            .as_bytes(),
        );
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    for (field, raw_path) in files {
        let path = base_dir.join(raw_path);
        let contents = fs::read(&path)
            .await
            .with_context(|| format!("reading attachment {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| raw_path.clone());

        open_part(&mut out, &boundary);
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quotes(field),
                escape_quotes(&filename)
            )
            .as_bytes(),
        );
        out.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        out.extend_from_slice(&contents);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Ok(EncodedBody {
        bytes: out,
        content_type: format!("multipart/form-data; boundary={boundary}"),
    })
}

fn open_part(out: &mut Vec<u8>, boundary: &str) {
    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
