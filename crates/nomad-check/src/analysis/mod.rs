//! Health analyzers.
//!
//! Each analyzer is a pure function over one job's snapshot that returns the
//! findings it detected. Analyzers do not depend on each other; the
//! evaluator runs all of them per job and concatenates their output.

pub mod allocations;
pub mod evaluations;
pub mod job_state;
pub mod restarts;
pub mod summary;

use std::fmt;

use serde::Serialize;

pub use allocations::{analyze_allocation, analyze_allocations};
pub use evaluations::{analyze_evaluations, last_failed_evaluation, root_causes};
pub use job_state::validate_job_state;
pub use restarts::detect_restarts;
pub use summary::failed_task_groups;

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A task group could not be placed on any node.
    PlacementFailure,
    /// A task is dead while the allocation should be running.
    DeadAllocation,
    /// A task has been pending longer than the threshold.
    PendingAllocation,
    /// The allocation was never picked up by a client.
    ClientPendingAllocation,
    /// A task restarted too often inside the restart window.
    RestartStorm,
    /// A long-running job is not in the running state.
    JobStatus,
    /// The job summary counts failed allocations for a task group.
    FailedTaskGroup,
}

/// A single problem detected by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Shared builders for analyzer tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Duration, Utc};

    use crate::models::{
        Allocation, ClientStatus, DesiredStatus, Job, JobType, TaskEvent, TaskState, TaskStatus,
    };

    pub fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    pub fn nanos_ago(secs: i64) -> i64 {
        (now() - Duration::seconds(secs))
            .timestamp_nanos_opt()
            .unwrap()
    }

    pub fn job(id: &str, job_type: JobType, status: &str) -> Job {
        Job {
            id: id.to_string(),
            name: id.to_string(),
            job_type,
            status: status.to_string(),
            job_summary: None,
        }
    }

    pub fn event(event_type: &str, secs_ago: i64) -> TaskEvent {
        TaskEvent {
            event_type: event_type.to_string(),
            time: nanos_ago(secs_ago),
        }
    }

    pub fn task(state: TaskStatus, events: Vec<TaskEvent>) -> TaskState {
        TaskState {
            state,
            events: Some(events),
        }
    }

    pub fn alloc(
        name: &str,
        client_status: ClientStatus,
        tasks: Option<Vec<(&str, TaskState)>>,
    ) -> Allocation {
        Allocation {
            id: format!("{name}-id"),
            name: name.to_string(),
            desired_status: DesiredStatus::Run,
            client_status,
            create_time: nanos_ago(10),
            task_states: tasks.map(|tasks| {
                tasks
                    .into_iter()
                    .map(|(name, state)| (name.to_string(), state))
                    .collect::<BTreeMap<_, _>>()
            }),
        }
    }
}
