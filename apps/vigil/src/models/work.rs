//! Work-item schema consumed by the completion gate.
//!
//! Items are read from JSON or YAML, either as a bare list or wrapped in an
//! object under `todos` (or `items`). Unknown priorities and statuses are
//! tolerated; they count toward totals but not toward any tier.

use crate::error::VigilError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl Priority {
    pub const TIERS: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Unspecified => "unspecified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
/// One tracked task. Only `priority` and `status` matter to the gate.
pub struct WorkItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
}

impl WorkItem {
    pub fn new(priority: Priority, status: Status) -> Self {
        WorkItem {
            id: None,
            content: None,
            priority,
            status,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkList {
    Bare(Vec<WorkItem>),
    Todos { todos: Vec<WorkItem> },
    Items { items: Vec<WorkItem> },
}

impl WorkList {
    fn into_items(self) -> Vec<WorkItem> {
        match self {
            WorkList::Bare(v) => v,
            WorkList::Todos { todos } => todos,
            WorkList::Items { items } => items,
        }
    }
}

/// Parse work items from JSON text.
pub fn parse_json(s: &str) -> Result<Vec<WorkItem>, VigilError> {
    Ok(serde_json::from_str::<WorkList>(s)?.into_items())
}

/// Load work items from a `.json`, `.yaml`, or `.yml` file.
pub fn load_work_items(path: &Path) -> Result<Vec<WorkItem>, VigilError> {
    let s = fs::read_to_string(path).map_err(|e| VigilError::io(path, e))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        let list: WorkList = serde_yaml::from_str(&s).map_err(|e| VigilError::Yaml {
            path: PathBuf::from(path),
            source: e,
        })?;
        Ok(list.into_items())
    } else {
        parse_json(&s)
    }
}
