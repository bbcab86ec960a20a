//! Read-only access to the Nomad HTTP API.
//!
//! The evaluator talks to Nomad through the [`NomadApi`] trait; the
//! [`NomadClient`] implementation issues the actual HTTP requests.

mod http;

pub use http::{NomadClient, NomadConfig, DEFAULT_NOMAD_URL};

use async_trait::async_trait;

use crate::error::NomadError;
use crate::models::{Allocation, Evaluation, Job};

/// Read operations the health check needs from Nomad.
#[async_trait]
pub trait NomadApi: Send + Sync {
    /// List every registered job.
    async fn list_jobs(&self) -> Result<Vec<Job>, NomadError>;

    /// List the evaluations of a job.
    async fn list_evaluations(&self, job_id: &str) -> Result<Vec<Evaluation>, NomadError>;

    /// List the allocations of a job.
    async fn list_allocations(&self, job_id: &str) -> Result<Vec<Allocation>, NomadError>;

    /// Address of the current cluster leader, empty when none is elected.
    async fn leader(&self) -> Result<String, NomadError>;
}
