//! Dead and stuck allocation detection.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Allocation, ClientStatus, DesiredStatus, Job, TaskStatus};

use super::{Finding, FindingKind};

/// Inspect one allocation; at most one finding per allocation.
pub fn analyze_allocation(
    job: &Job,
    alloc: &Allocation,
    now: DateTime<Utc>,
    pending_threshold: Duration,
    client_pending_threshold: Duration,
) -> Option<Finding> {
    if alloc.desired_status != DesiredStatus::Run {
        return None;
    }
    // Completed batch work is a success, whatever its tasks look like.
    if job.job_type.runs_to_completion() && alloc.client_status == ClientStatus::Complete {
        return None;
    }

    let Some(task_states) = &alloc.task_states else {
        if alloc.client_status != ClientStatus::Pending {
            return None;
        }
        let age = now - alloc.created_at();
        return (age > client_pending_threshold).then(|| {
            Finding::new(
                FindingKind::ClientPendingAllocation,
                format!(
                    "allocation {} is pending on client since {} seconds",
                    alloc.name,
                    age.num_seconds()
                ),
            )
        });
    };

    for task in task_states.values() {
        match task.state {
            TaskStatus::Dead => {
                return Some(Finding::new(
                    FindingKind::DeadAllocation,
                    format!("allocation {} is dead but desired status is run", alloc.name),
                ));
            }
            TaskStatus::Pending => {
                // A task without events was only just created.
                let age = task
                    .last_event()
                    .map_or_else(Duration::zero, |event| now - event.at());
                if age > pending_threshold {
                    return Some(Finding::new(
                        FindingKind::PendingAllocation,
                        format!(
                            "allocation {} is pending since {} seconds",
                            alloc.name,
                            age.num_seconds()
                        ),
                    ));
                }
            }
            TaskStatus::Running | TaskStatus::Other => {}
        }
    }

    None
}

/// Report dead or stuck allocations of `job`.
pub fn analyze_allocations(
    job: &Job,
    allocations: &[Allocation],
    now: DateTime<Utc>,
    pending_threshold: Duration,
    client_pending_threshold: Duration,
) -> Vec<Finding> {
    allocations
        .iter()
        .filter_map(|alloc| {
            analyze_allocation(job, alloc, now, pending_threshold, client_pending_threshold)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{alloc, event, job, nanos_ago, now, task};
    use crate::models::JobType;

    fn pending() -> Duration {
        Duration::seconds(300)
    }

    fn client_pending() -> Duration {
        Duration::seconds(600)
    }

    fn analyze(job: &Job, allocs: &[Allocation]) -> Vec<Finding> {
        analyze_allocations(job, allocs, now(), pending(), client_pending())
    }

    #[test]
    fn test_dead_task_reports_once_per_allocation() {
        let job = job("web", JobType::Service, "running");
        let allocs = vec![alloc(
            "web.app[0]",
            ClientStatus::Running,
            Some(vec![
                ("a", task(TaskStatus::Dead, vec![event("Terminated", 50)])),
                ("b", task(TaskStatus::Dead, vec![event("Terminated", 50)])),
            ]),
        )];

        let findings = analyze(&job, &allocs);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DeadAllocation);
        assert_eq!(
            findings[0].message,
            "allocation web.app[0] is dead but desired status is run"
        );
    }

    #[test]
    fn test_pending_task_threshold_boundary() {
        let job = job("web", JobType::Service, "running");
        let stale = vec![alloc(
            "web.app[0]",
            ClientStatus::Pending,
            Some(vec![("app", task(TaskStatus::Pending, vec![event("Received", 301)]))]),
        )];
        let fresh = vec![alloc(
            "web.app[1]",
            ClientStatus::Pending,
            Some(vec![("app", task(TaskStatus::Pending, vec![event("Received", 299)]))]),
        )];

        let findings = analyze(&job, &stale);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "allocation web.app[0] is pending since 301 seconds"
        );
        assert!(analyze(&job, &fresh).is_empty());
    }

    #[test]
    fn test_pending_age_uses_most_recent_event() {
        let job = job("web", JobType::Service, "running");
        let allocs = vec![alloc(
            "web.app[0]",
            ClientStatus::Pending,
            Some(vec![(
                "app",
                task(
                    TaskStatus::Pending,
                    vec![event("Received", 4000), event("Driver", 10)],
                ),
            )]),
        )];

        assert!(analyze(&job, &allocs).is_empty());
    }

    #[test]
    fn test_pending_task_without_events_is_not_stale() {
        let job = job("web", JobType::Service, "running");
        let allocs = vec![alloc(
            "web.app[0]",
            ClientStatus::Pending,
            Some(vec![("app", task(TaskStatus::Pending, Vec::new()))]),
        )];

        assert!(analyze(&job, &allocs).is_empty());
    }

    #[test]
    fn test_completed_batch_allocation_is_never_flagged() {
        let job = job("report", JobType::Batch, "dead");
        let allocs = vec![alloc(
            "report.run[0]",
            ClientStatus::Complete,
            Some(vec![
                ("extract", task(TaskStatus::Dead, vec![event("Terminated", 9000)])),
                ("load", task(TaskStatus::Pending, vec![event("Received", 9000)])),
            ]),
        )];

        assert!(analyze(&job, &allocs).is_empty());
    }

    #[test]
    fn test_completed_service_allocation_with_dead_task_is_flagged() {
        let job = job("web", JobType::Service, "running");
        let allocs = vec![alloc(
            "web.app[0]",
            ClientStatus::Complete,
            Some(vec![("app", task(TaskStatus::Dead, vec![event("Terminated", 5)]))]),
        )];

        assert_eq!(analyze(&job, &allocs).len(), 1);
    }

    #[test]
    fn test_allocation_not_desired_running_is_skipped() {
        let job = job("web", JobType::Service, "running");
        let mut stopped = alloc(
            "web.app[0]",
            ClientStatus::Complete,
            Some(vec![("app", task(TaskStatus::Dead, vec![event("Killed", 5)]))]),
        );
        stopped.desired_status = DesiredStatus::Stop;

        assert!(analyze(&job, &[stopped]).is_empty());
    }

    #[test]
    fn test_unplaced_allocation_pending_on_client() {
        let job = job("web", JobType::Service, "pending");
        let mut stuck = alloc("web.app[0]", ClientStatus::Pending, None);
        stuck.create_time = nanos_ago(601);
        let mut recent = alloc("web.app[1]", ClientStatus::Pending, None);
        recent.create_time = nanos_ago(599);

        let findings = analyze(&job, &[stuck, recent]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::ClientPendingAllocation);
        assert_eq!(
            findings[0].message,
            "allocation web.app[0] is pending on client since 601 seconds"
        );
    }

    #[test]
    fn test_unplaced_allocation_not_pending_is_quiet() {
        let job = job("web", JobType::Service, "running");
        let mut alloc = alloc("web.app[0]", ClientStatus::Running, None);
        alloc.create_time = nanos_ago(10_000);

        assert!(analyze(&job, &[alloc]).is_empty());
    }
}
