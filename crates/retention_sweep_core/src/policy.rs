use chrono::{DateTime, TimeDelta, Utc};

use crate::contract::{StorageObject, ValidationError};

/// Objects of one enumeration, split by the retention decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    pub cutoff: DateTime<Utc>,
    pub expired: Vec<StorageObject>,
    pub retained: Vec<StorageObject>,
    /// Keys the backend returned without a creation timestamp. Never deleted.
    pub undated: Vec<String>,
    /// Count of listed keys that fell outside the configured prefix.
    pub outside_prefix: usize,
}

pub fn compute_cutoff(
    now: DateTime<Utc>,
    retention_window: TimeDelta,
) -> Result<DateTime<Utc>, ValidationError> {
    now.checked_sub_signed(retention_window).ok_or_else(|| {
        ValidationError::new(format!(
            "retention window of {} seconds underflows the clock at {}",
            retention_window.num_seconds(),
            now.to_rfc3339()
        ))
    })
}

/// Strictly older than the cutoff; an object created exactly at the cutoff is kept.
pub fn is_expired(created_at: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
    created_at < cutoff
}

pub fn plan_retention(
    objects: impl IntoIterator<Item = StorageObject>,
    prefix: &str,
    cutoff: DateTime<Utc>,
) -> RetentionPlan {
    let mut plan = RetentionPlan {
        cutoff,
        ..RetentionPlan::default()
    };

    for object in objects {
        if !object.key.starts_with(prefix) {
            plan.outside_prefix += 1;
            continue;
        }

        match object.created_at {
            Some(created_at) if is_expired(created_at, cutoff) => plan.expired.push(object),
            Some(_) => plan.retained.push(object),
            None => plan.undated.push(object.key),
        }
    }

    plan
}
