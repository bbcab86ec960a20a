//! Health evaluation pass.
//!
//! Fetches every job together with its evaluations and allocations, runs
//! the analyzers on each job's snapshot and reduces the findings to a
//! single [`Report`]. Any API failure aborts the whole pass.

use chrono::{DateTime, Duration, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::analysis::{
    analyze_allocations, analyze_evaluations, detect_restarts, failed_task_groups,
    validate_job_state, Finding,
};
use crate::client::NomadApi;
use crate::error::NomadError;
use crate::models::{Allocation, Evaluation, Job};
use crate::report::{aggregate, Report, Severity};

/// Message reported when Nomad has no registered jobs.
pub const NO_JOBS_MESSAGE: &str = "No jobs found in Nomad.";

/// Age and rate limits applied by the analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Seconds a task may stay pending since its last event
    pub pending_secs: u64,
    /// Seconds an allocation may wait for a client to pick it up
    pub client_pending_secs: u64,
    /// Restarts within the window that make a restart storm
    pub restart_limit: u32,
    /// Length of the trailing restart window in seconds
    pub restart_window_secs: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pending_secs: 300,
            client_pending_secs: 600,
            restart_limit: 3,
            restart_window_secs: 3600,
        }
    }
}

/// Configuration of an evaluation pass.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub thresholds: Thresholds,
    /// Maximum number of jobs fetched concurrently
    pub concurrency: usize,
    /// Also report task groups with failed allocations in the job summary
    pub summary_failures: bool,
    /// Treat a cluster without jobs as healthy
    pub allow_empty: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            concurrency: 8,
            summary_failures: false,
            allow_empty: false,
        }
    }
}

/// Point-in-time state of one job.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub job: Job,
    pub evaluations: Vec<Evaluation>,
    pub allocations: Vec<Allocation>,
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1_000))
}

/// Run every analyzer on one job.
pub fn inspect_job(
    snapshot: &JobSnapshot,
    now: DateTime<Utc>,
    config: &EvaluatorConfig,
) -> Vec<Finding> {
    let JobSnapshot {
        job,
        evaluations,
        allocations,
    } = snapshot;
    let limits = &config.thresholds;

    let mut findings = analyze_evaluations(job, evaluations);
    findings.extend(analyze_allocations(
        job,
        allocations,
        now,
        seconds(limits.pending_secs),
        seconds(limits.client_pending_secs),
    ));
    findings.extend(detect_restarts(
        allocations,
        now,
        seconds(limits.restart_window_secs),
        limits.restart_limit,
    ));
    findings.extend(validate_job_state(job));
    if config.summary_failures {
        findings.extend(failed_task_groups(job));
    }

    findings
}

/// Evaluates the health of all jobs known to a Nomad cluster.
pub struct Evaluator<C> {
    client: C,
    config: EvaluatorConfig,
}

impl<C: NomadApi> Evaluator<C> {
    pub fn new(client: C, config: EvaluatorConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    async fn fetch_job(&self, job: Job) -> Result<JobSnapshot, NomadError> {
        debug!(job = %job.id, "Fetching evaluations and allocations");
        let (evaluations, allocations) = tokio::try_join!(
            self.client.list_evaluations(&job.id),
            self.client.list_allocations(&job.id),
        )?;

        Ok(JobSnapshot {
            job,
            evaluations,
            allocations,
        })
    }

    /// Fetch a snapshot of every job, at most `concurrency` jobs at a time.
    ///
    /// Snapshots keep the order of the job list.
    pub async fn fetch(&self) -> Result<Vec<JobSnapshot>, NomadError> {
        let jobs = self.client.list_jobs().await?;
        debug!(count = jobs.len(), "Listed jobs");

        stream::iter(jobs)
            .map(|job| self.fetch_job(job))
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await
    }

    /// Evaluate the cluster as of `now`.
    pub async fn evaluate_at(&self, now: DateTime<Utc>) -> Result<Report, NomadError> {
        let snapshots = self.fetch().await?;

        if snapshots.is_empty() && !self.config.allow_empty {
            return Ok(Report::status(Severity::Critical, NO_JOBS_MESSAGE));
        }

        let mut findings = Vec::new();
        for snapshot in &snapshots {
            let job_findings = inspect_job(snapshot, now, &self.config);
            debug!(job = %snapshot.job.id, findings = job_findings.len(), "Inspected job");
            findings.extend(job_findings);
        }

        let report = aggregate(findings, snapshots.len());
        info!(
            jobs = report.jobs_checked,
            findings = report.findings.len(),
            severity = %report.severity,
            "Nomad health pass complete"
        );
        Ok(report)
    }

    /// Evaluate the cluster as of the current time.
    pub async fn evaluate(&self) -> Result<Report, NomadError> {
        self.evaluate_at(Utc::now()).await
    }

    /// Evaluate the cluster within `timeout`, turning failures into a report.
    ///
    /// A pass that errors or runs out of time yields no partial findings.
    pub async fn check(&self, timeout: std::time::Duration) -> Report {
        match tokio::time::timeout(timeout, self.evaluate()).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(error = %e, "Nomad health pass failed");
                Report::status(Severity::Critical, e.check_message())
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs_f64(), "Nomad health pass timed out");
                Report::status(Severity::Unknown, timed_out_message(timeout))
            }
        }
    }
}

/// Whole seconds print without a fraction, sub-second limits keep it.
fn timed_out_message(timeout: std::time::Duration) -> String {
    format!("Nomad check timed out after {} seconds", timeout.as_secs_f64())
}
