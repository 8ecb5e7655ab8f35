use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub key: String,
    pub status: DeleteStatus,
}

impl DeleteOutcome {
    pub fn deleted(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: DeleteStatus::Deleted,
        }
    }

    pub fn failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: DeleteStatus::Failed {
                message: message.into(),
            },
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.status, DeleteStatus::Deleted)
    }
}

/// Result of one sweep. Built once every issued delete has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub cutoff: DateTime<Utc>,
    pub pages: usize,
    pub listed: usize,
    pub retained: usize,
    pub undated: usize,
    pub outside_prefix: usize,
    pub outcomes: Vec<DeleteOutcome>,
}

impl SweepReport {
    pub fn issued_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_deleted()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.issued_count() - self.deleted_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.status {
            DeleteStatus::Failed { message } => Some((outcome.key.as_str(), message.as_str())),
            DeleteStatus::Deleted => None,
        })
    }
}
