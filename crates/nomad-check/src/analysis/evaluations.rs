//! Placement failure detection from job evaluations.
//!
//! A job is reported when its most recent failed evaluation still matters:
//! either the scheduler has a `blocked` evaluation waiting for capacity, or
//! the job is placed by the system scheduler, which never blocks and would
//! otherwise hide its placement failures.

use crate::models::{Evaluation, Job, PlacementMetrics};

use super::{Finding, FindingKind};

/// Most recent evaluation that carries placement failures.
///
/// On equal `CreateIndex` the later evaluation in list order wins.
pub fn last_failed_evaluation(evaluations: &[Evaluation]) -> Option<&Evaluation> {
    evaluations
        .iter()
        .filter(|eval| !eval.failed_tg_allocs.is_empty())
        .max_by_key(|eval| eval.create_index)
}

/// Human-readable reasons nodes were excluded while placing a task group.
pub fn root_causes(metrics: &PlacementMetrics) -> Vec<String> {
    let mut causes = Vec::new();

    for (class, count) in &metrics.class_filtered {
        causes.push(format!("class {class} filtered {count} nodes"));
    }
    for (constraint, count) in &metrics.constraint_filtered {
        causes.push(format!("constraint {constraint} filtered {count} nodes"));
    }
    if metrics.nodes_exhausted > 0 {
        causes.push(format!(
            "resources exhausted on {} nodes",
            metrics.nodes_exhausted
        ));
    }
    for (class, count) in &metrics.class_exhausted {
        causes.push(format!("class {class} exhausted on {count} nodes"));
    }
    for (dimension, count) in &metrics.dimension_exhausted {
        causes.push(format!("{dimension} exhausted on {count} nodes"));
    }

    causes
}

/// Report a placement failure for `job`, if any.
pub fn analyze_evaluations(job: &Job, evaluations: &[Evaluation]) -> Vec<Finding> {
    let blocked = evaluations.iter().any(Evaluation::is_blocked);
    if !blocked && !job.job_type.uses_system_scheduler() {
        return Vec::new();
    }

    let Some(failed) = last_failed_evaluation(evaluations) else {
        return Vec::new();
    };

    let causes: Vec<String> = failed
        .failed_tg_allocs
        .values()
        .flat_map(root_causes)
        .collect();

    vec![Finding::new(
        FindingKind::PlacementFailure,
        format!("{}: placement failure [{}]", job.id, causes.join(", ")),
    )]
}
