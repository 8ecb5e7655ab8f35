use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use chrono::{DateTime, Utc};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use retention_sweep_core::contract::{ListPage, RetentionConfig, StorageObject};
use retention_sweep_lambda::adapters::object_store::{ObjectStore, StoreError};
use retention_sweep_lambda::config::load_config_from_env;
use retention_sweep_lambda::handlers::scheduled::{handle_scheduled_event, SweepResponse};
use retention_sweep_lambda::logging::init_tracing;
use serde_json::Value;
use tracing::{error, info};

struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError> {
        let output = self
            .s3_client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|error| StoreError::List {
                prefix: prefix.to_string(),
                message: DisplayErrorContext(&error).to_string(),
            })?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|object| {
                let key = object.key()?;
                Some(StorageObject {
                    key: key.to_string(),
                    created_at: object.last_modified().and_then(to_utc),
                })
            })
            .collect();

        let next_token = next_page_token(
            prefix,
            output.is_truncated(),
            output.next_continuation_token(),
        )?;

        Ok(ListPage {
            objects,
            next_token,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| StoreError::Delete {
                key: key.to_string(),
                message: DisplayErrorContext(&error).to_string(),
            })
    }
}

/// A truncated page without a token would end paging on a partial listing.
fn next_page_token(
    prefix: &str,
    is_truncated: Option<bool>,
    continuation_token: Option<&str>,
) -> Result<Option<String>, StoreError> {
    match (is_truncated.unwrap_or(false), continuation_token) {
        (false, _) => Ok(None),
        (true, Some(token)) if !token.is_empty() => Ok(Some(token.to_string())),
        (true, _) => Err(StoreError::List {
            prefix: prefix.to_string(),
            message: "listing is truncated but carries no continuation token".to_string(),
        }),
    }
}

/// S3 objects are immutable, so `LastModified` is the creation time of the
/// current object.
fn to_utc(timestamp: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

struct RuntimeDependencies {
    config: RetentionConfig,
    store: S3ObjectStore,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<SweepResponse, Error> {
    handle_scheduled_event(event.payload, &deps.config, &deps.store, Utc::now())
        .await
        .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = load_config_from_env().map_err(|config_error| {
        error!(
            component = "retention_lambda",
            event = "invalid_configuration",
            error = %config_error,
        );
        Error::from(config_error)
    })?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        store: S3ObjectStore {
            bucket: config.bucket().to_string(),
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
        config,
    };
    info!(
        component = "retention_lambda",
        event = "cold_start",
        bucket = deps.config.bucket(),
        prefix = deps.config.prefix(),
    );

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}
