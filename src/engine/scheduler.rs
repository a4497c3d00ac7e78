use std::{sync::Arc, time::Duration};

use futures_util::future::join_all;
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{
    aggregate::aggregate,
    error::{FailureKind, RunError},
    execution::execute,
    models::{ExecutionResult, RunReport},
    template::RequestTemplate,
};

pub const DEFAULT_CONCURRENCY: usize = 200;

/// How many times to fire the template and how long each attempt may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub repetitions: usize,
    pub timeout: Duration,
}

/// Hooks into the lifecycle of each execution.
///
/// `admitted` fires once the execution holds a permit, `finished` fires before the permit is
/// returned, so the number of executions between the two never exceeds the concurrency cap.
pub trait RunObserver: Send + Sync {
    fn admitted(&self, _index: usize) {}
    fn finished(&self, _index: usize, _result: &ExecutionResult) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

#[derive(Debug, Clone)]
pub struct Engine {
    client: Client,
    concurrency: usize,
}

impl Engine {
    pub fn new(client: Client, concurrency: usize) -> Result<Self, RunError> {
        if concurrency == 0 {
            return Err(RunError::ZeroConcurrency);
        }
        Ok(Self {
            client,
            concurrency: concurrency.min(Semaphore::MAX_PERMITS),
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn run(
        &self,
        template: Arc<RequestTemplate>,
        plan: RunPlan,
    ) -> Result<RunReport, RunError> {
        self.run_observed(template, plan, Arc::new(NoopObserver))
            .await
    }

    pub async fn run_observed(
        &self,
        template: Arc<RequestTemplate>,
        plan: RunPlan,
        observer: Arc<dyn RunObserver>,
    ) -> Result<RunReport, RunError> {
        let results = self.collect(template, plan, observer).await?;
        let report = aggregate(results);
        info!(
            total = report.total,
            success = report.success,
            fail = report.fail,
            unique = report.unique_results.len(),
            "run finished"
        );
        Ok(report)
    }

    /// Runs every execution and returns the result set in slot order.
    pub async fn collect(
        &self,
        template: Arc<RequestTemplate>,
        plan: RunPlan,
        observer: Arc<dyn RunObserver>,
    ) -> Result<Vec<ExecutionResult>, RunError> {
        let requested = plan.repetitions;
        if requested == 0 {
            debug!("no executions requested");
            return Ok(Vec::new());
        }

        let mut slots: Vec<ExecutionResult> = Vec::new();
        slots
            .try_reserve_exact(requested)
            .map_err(|source| RunError::Allocation { requested, source })?;
        let mut handles = Vec::new();
        handles
            .try_reserve_exact(requested)
            .map_err(|source| RunError::Allocation { requested, source })?;

        info!(
            repetitions = requested,
            concurrency = self.concurrency,
            timeout_ms = plan.timeout.as_millis() as u64,
            method = %template.method(),
            url = %template.url(),
            "starting run"
        );

        let permits = Arc::new(Semaphore::new(self.concurrency.min(requested)));
        for index in 0..requested {
            let permits = Arc::clone(&permits);
            let template = Arc::clone(&template);
            let observer = Arc::clone(&observer);
            let client = self.client.clone();
            let timeout = plan.timeout;

            handles.push(tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ExecutionResult::failed(FailureKind::Aborted, "permit pool closed")
                    }
                };
                observer.admitted(index);

                let result = execute(&client, template.replicate(), timeout).await;
                if !result.error.is_empty() {
                    debug!(index, error = %result.error, "execution failed");
                }

                observer.finished(index, &result);
                result
            }));
        }

        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            let result = joined.unwrap_or_else(|err| {
                warn!(index, error = %err, "execution task did not complete");
                ExecutionResult::failed(FailureKind::Aborted, err.to_string())
            });
            slots.push(result);
        }

        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    #[derive(Default)]
    struct Counting {
        admitted: AtomicUsize,
        finished: AtomicUsize,
    }

    impl RunObserver for Counting {
        fn admitted(&self, _index: usize) {
            self.admitted.fetch_add(1, Ordering::SeqCst);
        }

        fn finished(&self, _index: usize, _result: &ExecutionResult) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn unreachable_template() -> Arc<RequestTemplate> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Arc::new(RequestTemplate::new(
            Method::GET,
            Url::parse(&format!("http://{addr}/")).unwrap(),
        ))
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = Engine::new(Client::new(), 0).unwrap_err();
        assert!(matches!(err, RunError::ZeroConcurrency));
    }

    #[test]
    fn concurrency_is_clamped_to_the_permit_limit() {
        let engine = Engine::new(Client::new(), usize::MAX).unwrap();
        assert_eq!(engine.concurrency(), Semaphore::MAX_PERMITS);
        assert_eq!(Engine::new(Client::new(), 7).unwrap().concurrency(), 7);
    }

    #[tokio::test]
    async fn zero_repetitions_launch_nothing() {
        let engine = Engine::new(Client::new(), 4).unwrap();
        let observer = Arc::new(Counting::default());
        let plan = RunPlan {
            repetitions: 0,
            timeout: Duration::from_secs(1),
        };

        let report = engine
            .run_observed(unreachable_template(), plan, observer.clone())
            .await
            .unwrap();

        assert_eq!(report, RunReport::default());
        assert_eq!(observer.admitted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn every_slot_is_filled_even_when_all_fail() {
        let engine = Engine::new(Client::new(), 2).unwrap();
        let observer = Arc::new(Counting::default());
        let plan = RunPlan {
            repetitions: 7,
            timeout: Duration::from_secs(2),
        };

        let results = engine
            .collect(unreachable_template(), plan, observer.clone())
            .await
            .unwrap();

        assert_eq!(results.len(), 7);
        assert!(results.iter().all(|r| r.status_code.is_none()));
        assert_eq!(observer.admitted.load(Ordering::SeqCst), 7);
        assert_eq!(observer.finished.load(Ordering::SeqCst), 7);
    }
}
