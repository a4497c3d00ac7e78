//! Replicates one request template N times under a concurrency cap and aggregates the outcomes.

mod aggregate;
mod error;
mod execution;
mod models;
mod scheduler;
mod template;

pub use aggregate::aggregate;
pub use error::{FailureKind, RunError, TemplateError};
pub use execution::execute;
pub use models::{ExecutionResult, RunReport};
pub use scheduler::{Engine, NoopObserver, RunObserver, RunPlan, DEFAULT_CONCURRENCY};
pub use template::{BodyStream, RequestBody, RequestCopy, RequestTemplate};
