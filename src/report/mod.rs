#[cfg(feature = "cli")]
mod printer;
#[cfg(feature = "cli")]
mod progress;
mod summary;

#[cfg(feature = "cli")]
pub use printer::print_report;
#[cfg(feature = "cli")]
pub use progress::ProgressObserver;
pub use summary::{log_summary, render_summary, AUDIT_TARGET};
