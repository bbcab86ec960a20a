//! Task group failure counters from the job summary.

use crate::models::Job;

use super::{Finding, FindingKind};

/// Report every task group whose summary counts failed allocations.
///
/// The counters are cumulative over the job's lifetime, so this is only
/// run when explicitly enabled.
pub fn failed_task_groups(job: &Job) -> Vec<Finding> {
    let Some(summary) = &job.job_summary else {
        return Vec::new();
    };

    summary
        .summary
        .iter()
        .filter(|(_, counts)| counts.failed != 0)
        .map(|(group, counts)| {
            Finding::new(
                FindingKind::FailedTaskGroup,
                format!(
                    "{}.{group} has {} failed allocations",
                    job.name, counts.failed
                ),
            )
        })
        .collect()
}
