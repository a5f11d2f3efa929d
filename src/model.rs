use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

pub const PROJECT_TAG: &str = "Project";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    pub instance_type: String,
    pub availability_zone: String,
    pub state: String,
    /// Empty when the instance has no public address.
    pub public_dns_name: String,
    pub tags: BTreeMap<String, String>,
}

impl Instance {
    pub fn project(&self) -> Option<&str> {
        self.tags.get(PROJECT_TAG).map(String::as_str)
    }

    /// An absent or empty project selects every instance.
    pub fn matches_project(&self, project: Option<&str>) -> bool {
        match project {
            Some(p) if !p.is_empty() => self.project() == Some(p),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    pub instance_id: String,
    pub state: String,
    pub size_gib: i32,
    pub encrypted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotState {
    Pending,
    Completed,
    Error,
    Other(String),
}

impl SnapshotState {
    pub fn as_str(&self) -> &str {
        match self {
            SnapshotState::Pending => "pending",
            SnapshotState::Completed => "completed",
            SnapshotState::Error => "error",
            SnapshotState::Other(s) => s,
        }
    }
}

impl From<&str> for SnapshotState {
    fn from(s: &str) -> Self {
        match s {
            "pending" => SnapshotState::Pending,
            "completed" => SnapshotState::Completed,
            "error" => SnapshotState::Error,
            other => SnapshotState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub state: SnapshotState,
    pub progress: String,
    pub start_time: Option<DateTime<Utc>>,
    pub description: String,
}

/// Orders snapshots newest first. Snapshots without a start time go last.
pub fn sort_newest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| b.start_time.cmp(&a.start_time));
}
