//! Restart storm detection.
//!
//! Nomad's per-task restart counter never resets, so only `Restarting`
//! events inside the trailing window are counted.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Allocation, ClientStatus};

use super::{Finding, FindingKind};

/// Report every task of a live allocation that restarted at least `limit`
/// times within `window` before `now`.
pub fn detect_restarts(
    allocations: &[Allocation],
    now: DateTime<Utc>,
    window: Duration,
    limit: u32,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for alloc in allocations {
        if !matches!(
            alloc.client_status,
            ClientStatus::Running | ClientStatus::Pending
        ) {
            continue;
        }
        let Some(task_states) = &alloc.task_states else {
            continue;
        };

        for task in task_states.values() {
            let Some(events) = &task.events else {
                continue;
            };
            let restarts = events
                .iter()
                .filter(|event| event.is_restart() && now - event.at() < window)
                .count();

            if restarts >= limit as usize {
                findings.push(Finding::new(
                    FindingKind::RestartStorm,
                    format!("allocation {} restarted {restarts} times", alloc.name),
                ));
            }
        }
    }

    findings
}
