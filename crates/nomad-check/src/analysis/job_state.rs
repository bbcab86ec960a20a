//! Job status validation.

use crate::models::Job;

use super::{Finding, FindingKind};

/// Long-running jobs must be `running`; batch jobs may legitimately be done.
pub fn validate_job_state(job: &Job) -> Vec<Finding> {
    if job.job_type.runs_to_completion() || job.status == "running" {
        return Vec::new();
    }

    vec![Finding::new(
        FindingKind::JobStatus,
        format!(
            "the {} job {} status is {}",
            job.job_type, job.name, job.status
        ),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::job;
    use crate::models::JobType;

    #[test]
    fn test_dead_service_job() {
        let findings = validate_job_state(&job("web", JobType::Service, "dead"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "the service job web status is dead");
    }

    #[test]
    fn test_pending_system_job() {
        let findings = validate_job_state(&job("fluentd", JobType::System, "pending"));
        assert_eq!(findings[0].message, "the system job fluentd status is pending");
    }

    #[test]
    fn test_running_jobs_and_batch_jobs_pass() {
        assert!(validate_job_state(&job("web", JobType::Service, "running")).is_empty());
        assert!(validate_job_state(&job("backup", JobType::Batch, "dead")).is_empty());
        assert!(validate_job_state(&job("gc", JobType::SysBatch, "dead")).is_empty());
    }
}
