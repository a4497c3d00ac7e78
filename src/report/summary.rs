use std::fmt::Write as _;

use crate::engine::{RequestTemplate, RunReport};

/// Tracing target for per-run audit summaries.
pub const AUDIT_TARGET: &str = "burstpit::audit";

pub fn render_summary(template: &RequestTemplate, report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "===== run summary =====");
    let _ = writeln!(out, "method: {}", template.method());
    let _ = writeln!(out, "url: {}", template.url());

    let headers = template
        .headers()
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "headers: [{headers}]");

    if let Some(bytes) = template.body().and_then(|body| body.peek()) {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                let _ = writeln!(out, "body: {text}");
            }
            Err(_) => {
                let _ = writeln!(out, "body: <{} bytes>", bytes.len());
            }
        }
    }

    let _ = writeln!(out, "total: {}", report.total);
    let _ = writeln!(out, "success: {}, fail: {}", report.success, report.fail);
    let _ = writeln!(out, "unique results:");
    for result in &report.unique_results {
        if result.error.is_empty() {
            let status = result.status_code.unwrap_or_default();
            let _ = writeln!(out, "  status: {}, body: {}", status, result.body);
        } else {
            let _ = writeln!(out, "  error: {}", result.error);
        }
    }
    let _ = write!(out, "===== end of summary =====");
    out
}

/// Emits the summary on the audit channel.
pub fn log_summary(template: &RequestTemplate, report: &RunReport) {
    tracing::info!(target: AUDIT_TARGET, "{}", render_summary(template, report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{aggregate, ExecutionResult, RequestBody};
    use reqwest::{
        header::{HeaderMap, HeaderValue, CONTENT_TYPE},
        Method,
    };
    use url::Url;

    fn template() -> RequestTemplate {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        RequestTemplate::new(Method::POST, Url::parse("http://localhost/items").unwrap())
            .with_headers(headers)
            .with_body(RequestBody::buffered(r#"{"a":1}"#))
    }

    #[test]
    fn summary_lists_request_and_unique_results() {
        let report = aggregate(vec![
            ExecutionResult {
                status_code: Some(200),
                body: "ok".to_string(),
                error: String::new(),
            },
            ExecutionResult {
                status_code: None,
                body: String::new(),
                error: "timeout: no response within 1s".to_string(),
            },
            ExecutionResult {
                status_code: Some(200),
                body: "ok".to_string(),
                error: String::new(),
            },
        ]);

        let summary = render_summary(&template(), &report);
        assert!(summary.contains("method: POST"));
        assert!(summary.contains("url: http://localhost/items"));
        assert!(summary.contains("content-type: application/json"));
        assert!(summary.contains(r#"body: {"a":1}"#));
        assert!(summary.contains("total: 3"));
        assert!(summary.contains("success: 2, fail: 1"));
        assert!(summary.contains("  status: 200, body: ok"));
        assert!(summary.contains("  error: timeout: no response within 1s"));
        assert_eq!(summary.matches("status: 200").count(), 1);
    }

    #[test]
    fn one_shot_bodies_are_not_consumed_by_the_summary() {
        let template = RequestTemplate::new(Method::PUT, Url::parse("http://localhost").unwrap())
            .with_body(RequestBody::one_shot("secret"));

        let summary = render_summary(&template, &RunReport::default());
        assert!(!summary.contains("body:"));
        assert!(template.replicate().is_ok());
    }
}
