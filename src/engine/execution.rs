use std::time::Duration;

use reqwest::{Client, Response};
use tokio::time::{timeout_at, Instant};

use super::{
    error::{describe, FailureKind, TemplateError},
    models::ExecutionResult,
    template::RequestCopy,
};

/// Sends one copy of the template and folds every outcome into an [`ExecutionResult`].
///
/// The deadline starts here, not when the copy was queued, and it bounds both the wait for
/// response headers and every body chunk read. The response is dropped on each return path,
/// which hands its connection back to the client pool.
pub async fn execute(
    client: &Client,
    copy: Result<RequestCopy, TemplateError>,
    timeout: Duration,
) -> ExecutionResult {
    let deadline = deadline_after(timeout);

    let copy = match copy {
        Ok(copy) => copy,
        Err(err) => return ExecutionResult::failed(FailureKind::Template, err.to_string()),
    };

    let request = match copy.into_request(client) {
        Ok(request) => request,
        Err(err) => return ExecutionResult::failed(FailureKind::Request, describe(&err)),
    };

    let response = match timeout_at(deadline, client.execute(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => return ExecutionResult::failed(FailureKind::classify(&err), describe(&err)),
        Err(_) => {
            return ExecutionResult::failed(
                FailureKind::Timeout,
                format!("no response within {}", format_timeout(timeout)),
            )
        }
    };

    read_response(response, deadline, timeout).await
}

async fn read_response(mut response: Response, deadline: Instant, timeout: Duration) -> ExecutionResult {
    let status = response.status().as_u16();
    let mut body = Vec::new();

    loop {
        match timeout_at(deadline, response.chunk()).await {
            Ok(Ok(Some(chunk))) => body.extend_from_slice(&chunk),
            Ok(Ok(None)) => return ExecutionResult::completed(status, &body),
            Ok(Err(err)) => {
                return ExecutionResult::interrupted(status, &body, FailureKind::Read, describe(&err))
            }
            Err(_) => {
                return ExecutionResult::interrupted(
                    status,
                    &body,
                    FailureKind::Timeout,
                    format!("body not received within {}", format_timeout(timeout)),
                )
            }
        }
    }
}

/// Saturates at roughly thirty years, the same horizon `tokio::time::timeout` uses.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}
