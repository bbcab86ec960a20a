//! Nomad workload health check.
//!
//! Reads jobs, evaluations and allocations from the Nomad HTTP API and
//! classifies anomalies into findings:
//! - placement failures with their root causes
//! - dead or stuck allocations
//! - restart storms within a trailing window
//! - long-running jobs that are not running
//!
//! The findings of all jobs are reduced to a single [`Report`] whose
//! [`Severity`] maps onto the usual monitoring exit codes.

pub mod analysis;
pub mod client;
pub mod error;
pub mod evaluator;
pub mod leader;
pub mod models;
pub mod report;

pub use analysis::{Finding, FindingKind};
pub use client::{NomadApi, NomadClient, NomadConfig};
pub use error::NomadError;
pub use evaluator::{Evaluator, EvaluatorConfig, JobSnapshot, Thresholds};
pub use leader::check_leader;
pub use report::{aggregate, Report, Severity};
