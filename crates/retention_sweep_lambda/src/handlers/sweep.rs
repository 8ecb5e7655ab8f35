use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use retention_sweep_core::contract::{RetentionConfig, StorageObject, ValidationError};
use retention_sweep_core::policy::{compute_cutoff, plan_retention};
use retention_sweep_core::report::{DeleteOutcome, SweepReport};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::adapters::object_store::{ObjectStore, StoreError};

const COMPONENT: &str = "retention_sweeper";

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("enumeration failed, nothing was deleted: {0}")]
    Enumeration(#[from] StoreError),

    #[error("listing under '{prefix}' returned continuation token '{token}' more than once")]
    PaginationStalled { prefix: String, token: String },

    #[error("invalid cutoff: {0}")]
    Cutoff(#[from] ValidationError),

    #[error("{failed} of {issued} deletes failed")]
    DeleteFailures { failed: usize, issued: usize },
}

/// Enumerates every page under `prefix`.
///
/// Fails without side effects if any page fetch fails.
pub async fn list_all_objects<S>(
    store: &S,
    prefix: &str,
) -> Result<(Vec<StorageObject>, usize), SweepError>
where
    S: ObjectStore + ?Sized,
{
    let mut objects = Vec::new();
    let mut pages = 0usize;
    let mut continuation: Option<String> = None;
    let mut seen_tokens = HashSet::new();

    loop {
        let page = store.list_page(prefix, continuation.take()).await?;
        pages += 1;
        objects.extend(page.objects);

        let Some(token) = page.next_token else {
            break;
        };
        // Any repeat means the backend is cycling, not just stuck on one page.
        if !seen_tokens.insert(token.clone()) {
            return Err(SweepError::PaginationStalled {
                prefix: prefix.to_string(),
                token,
            });
        }
        continuation = Some(token);
    }

    Ok((objects, pages))
}

/// One list-filter-delete cycle.
///
/// Every expired key gets exactly one delete call. Deletes run concurrently and
/// each settles into its own [`DeleteOutcome`], so a failure never hides the fate
/// of the rest of the batch. The report is only built after all of them finish.
pub async fn run_sweep<S>(
    store: &S,
    config: &RetentionConfig,
    now: DateTime<Utc>,
) -> Result<SweepReport, SweepError>
where
    S: ObjectStore + ?Sized,
{
    let cutoff = compute_cutoff(now, config.retention_window())?;
    let (objects, pages) = list_all_objects(store, config.prefix()).await?;
    let listed = objects.len();
    let plan = plan_retention(objects, config.prefix(), cutoff);

    info!(
        component = COMPONENT,
        event = "listing_completed",
        bucket = config.bucket(),
        prefix = config.prefix(),
        cutoff = %cutoff.to_rfc3339(),
        pages,
        listed,
        expired = plan.expired.len(),
        retained = plan.retained.len(),
    );

    if plan.outside_prefix > 0 {
        warn!(
            component = COMPONENT,
            event = "keys_outside_prefix_ignored",
            prefix = config.prefix(),
            count = plan.outside_prefix,
        );
    }
    for key in &plan.undated {
        warn!(
            component = COMPONENT,
            event = "object_without_timestamp_retained",
            key = key.as_str(),
        );
    }

    let deletes = plan.expired.iter().map(|object| async move {
        info!(
            component = COMPONENT,
            event = "deleting_expired_object",
            key = object.key.as_str(),
        );
        match store.delete_object(&object.key).await {
            Ok(()) => DeleteOutcome::deleted(&object.key),
            Err(store_error) => {
                error!(
                    component = COMPONENT,
                    event = "delete_failed",
                    key = object.key.as_str(),
                    error = %store_error,
                );
                DeleteOutcome::failed(&object.key, store_error.to_string())
            }
        }
    });
    let outcomes = join_all(deletes).await;

    Ok(SweepReport {
        cutoff,
        pages,
        listed,
        retained: plan.retained.len(),
        undated: plan.undated.len(),
        outside_prefix: plan.outside_prefix,
        outcomes,
    })
}
