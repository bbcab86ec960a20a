//! Check report and severity.

use std::fmt;

use serde::Serialize;

use crate::analysis::Finding;

/// Separator between findings in the report message.
const FINDING_SEPARATOR: &str = ", ";

/// Monitoring severity, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    /// Process exit code used by monitoring supervisors (Sensu/Nagios).
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Outcome of a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub severity: Severity,
    pub message: String,
    /// Number of jobs inspected (0 when the pass aborted).
    pub jobs_checked: usize,
    pub findings: Vec<Finding>,
}

impl Report {
    /// A report that carries no findings, e.g. a failed pass.
    pub fn status(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            jobs_checked: 0,
            findings: Vec::new(),
        }
    }
}

/// Reduce all findings of a pass to a severity and message.
///
/// Findings are kept as-is, in order, without deduplication.
pub fn aggregate(findings: Vec<Finding>, jobs_checked: usize) -> Report {
    if findings.is_empty() {
        return Report {
            severity: Severity::Ok,
            message: format!("{jobs_checked} jobs running"),
            jobs_checked,
            findings,
        };
    }

    let joined = findings
        .iter()
        .map(|finding| finding.message.as_str())
        .collect::<Vec<_>>()
        .join(FINDING_SEPARATOR);

    Report {
        severity: Severity::Critical,
        message: format!("{} failed jobs: {joined}", findings.len()),
        jobs_checked,
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FindingKind;

    #[test]
    fn test_no_findings_is_ok() {
        let report = aggregate(Vec::new(), 4);
        assert_eq!(report.severity, Severity::Ok);
        assert_eq!(report.message, "4 jobs running");
        assert_eq!(report.jobs_checked, 4);
    }

    #[test]
    fn test_findings_are_critical_and_not_deduplicated() {
        let findings = vec![
            Finding::new(FindingKind::JobStatus, "the service job web status is dead"),
            Finding::new(FindingKind::RestartStorm, "allocation web.app[0] restarted 3 times"),
            Finding::new(FindingKind::RestartStorm, "allocation web.app[0] restarted 3 times"),
        ];

        let report = aggregate(findings, 2);
        assert_eq!(report.severity, Severity::Critical);
        assert_eq!(
            report.message,
            "3 failed jobs: the service job web status is dead, \
             allocation web.app[0] restarted 3 times, \
             allocation web.app[0] restarted 3 times"
        );
        assert_eq!(report.findings.len(), 3);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
        assert_eq!(Severity::Unknown.exit_code(), 3);
        assert!(Severity::Critical > Severity::Warning);
    }

    #[test]
    fn test_report_serializes_lowercase_severity() {
        let report = aggregate(Vec::new(), 0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["severity"], "ok");
        assert_eq!(json["message"], "0 jobs running");
    }
}
