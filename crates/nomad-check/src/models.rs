//! Nomad API response models.
//!
//! Only the fields the health analyzers look at are decoded; everything else
//! in the payload is ignored. Nomad serializes nil maps and slices as
//! `null`, so every collection either decodes `null` as empty or keeps the
//! absence visible as `None` where the analyzers treat it differently.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` (or a missing field, with `#[serde(default)]`) as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Convert a Nomad nanosecond epoch timestamp.
pub fn from_nanos(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

// ============================================================================
// Jobs
// ============================================================================

/// Scheduler type of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Service,
    Batch,
    System,
    #[serde(rename = "sysbatch")]
    SysBatch,
}

impl JobType {
    /// Jobs that finish on their own, so `dead`/`complete` is success.
    pub fn runs_to_completion(self) -> bool {
        match self {
            Self::Batch | Self::SysBatch => true,
            Self::Service | Self::System => false,
        }
    }

    /// Jobs placed by the system scheduler never produce a `blocked` evaluation.
    pub fn uses_system_scheduler(self) -> bool {
        match self {
            Self::System | Self::SysBatch => true,
            Self::Service | Self::Batch => false,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Batch => write!(f, "batch"),
            Self::System => write!(f, "system"),
            Self::SysBatch => write!(f, "sysbatch"),
        }
    }
}

/// Job stub as returned by `/v1/jobs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub job_type: JobType,
    /// Lifecycle status: "pending", "running" or "dead".
    pub status: String,
    #[serde(default)]
    pub job_summary: Option<JobSummary>,
}

/// Per task group allocation counters of a job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: BTreeMap<String, TaskGroupSummary>,
}

/// Allocation counters for one task group.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskGroupSummary {
    pub queued: u64,
    pub complete: u64,
    pub failed: u64,
    pub running: u64,
    pub starting: u64,
    pub lost: u64,
}

// ============================================================================
// Evaluations
// ============================================================================

/// A scheduler evaluation of a job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Evaluation {
    #[serde(rename = "ID")]
    pub id: String,
    /// "blocked", "complete", "failed", "pending", "canceled".
    pub status: String,
    pub create_index: u64,
    /// Placement metrics per task group that could not be placed.
    #[serde(
        rename = "FailedTGAllocs",
        default,
        deserialize_with = "null_as_default"
    )]
    pub failed_tg_allocs: BTreeMap<String, PlacementMetrics>,
}

impl Evaluation {
    pub fn is_blocked(&self) -> bool {
        self.status == "blocked"
    }
}

/// Why nodes were excluded while placing a task group.
///
/// Absent keys mean zero for that category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlacementMetrics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes_exhausted: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_filtered: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub constraint_filtered: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_exhausted: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dimension_exhausted: BTreeMap<String, u64>,
}

// ============================================================================
// Allocations
// ============================================================================

/// Status the scheduler wants an allocation to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredStatus {
    Run,
    Stop,
    Evict,
    #[serde(other)]
    Other,
}

/// Status reported by the client node running the allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Lost,
    #[serde(other)]
    Other,
}

/// Allocation stub as returned by `/v1/job/:id/allocations`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Allocation {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub desired_status: DesiredStatus,
    pub client_status: ClientStatus,
    /// Placement time, nanoseconds since the epoch.
    pub create_time: i64,
    /// `None` until a client has picked the allocation up.
    #[serde(default)]
    pub task_states: Option<BTreeMap<String, TaskState>>,
}

impl Allocation {
    pub fn created_at(&self) -> DateTime<Utc> {
        from_nanos(self.create_time)
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Dead,
    #[serde(other)]
    Other,
}

/// State of one task inside an allocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskState {
    pub state: TaskStatus,
    /// Chronological, most recent last.
    #[serde(default)]
    pub events: Option<Vec<TaskEvent>>,
}

impl TaskState {
    pub fn last_event(&self) -> Option<&TaskEvent> {
        self.events.as_deref().and_then(<[TaskEvent]>::last)
    }
}

/// A task lifecycle event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskEvent {
    #[serde(rename = "Type")]
    pub event_type: String,
    /// Nanoseconds since the epoch.
    pub time: i64,
}

impl TaskEvent {
    pub fn is_restart(&self) -> bool {
        self.event_type == "Restarting"
    }

    pub fn at(&self) -> DateTime<Utc> {
        from_nanos(self.time)
    }
}
