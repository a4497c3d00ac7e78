use std::collections::HashSet;

use super::models::{ExecutionResult, RunReport};

/// Reduces a completed result set into counts plus one representative per signature.
///
/// Representatives keep the order in which their signature first appears, so the lowest slot
/// index wins ties.
pub fn aggregate(results: Vec<ExecutionResult>) -> RunReport {
    let success = results.iter().filter(|r| r.is_success()).count();

    let unique_results = {
        let mut seen = HashSet::with_capacity(results.len());
        results
            .iter()
            .filter(|r| seen.insert(r.signature()))
            .cloned()
            .collect::<Vec<_>>()
    };

    RunReport {
        total: results.len(),
        success,
        fail: results.len() - success,
        unique_results,
        all_results: results,
    }
}
