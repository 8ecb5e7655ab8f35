use chrono::{DateTime, Utc};
use retention_sweep_core::contract::RetentionConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::object_store::ObjectStore;
use crate::handlers::sweep::{run_sweep, SweepError};

const COMPONENT: &str = "scheduled_handler";

/// Correlation fields of an EventBridge scheduled event. All optional: the sweep
/// does not depend on the trigger payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleTrigger {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "detail-type")]
    pub detail_type: Option<String>,
}

/// Totals of a sweep that completed with every delete succeeding. Failed runs
/// return an error instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepResponse {
    pub bucket: String,
    pub prefix: String,
    pub cutoff: String,
    pub pages: usize,
    pub listed: usize,
    pub retained: usize,
    pub deleted: usize,
}

pub fn parse_trigger(event: &Value) -> ScheduleTrigger {
    match event {
        Value::Object(_) => serde_json::from_value(event.clone()).unwrap_or_default(),
        _ => ScheduleTrigger::default(),
    }
}

pub async fn handle_scheduled_event<S>(
    event: Value,
    config: &RetentionConfig,
    store: &S,
    now: DateTime<Utc>,
) -> Result<SweepResponse, SweepError>
where
    S: ObjectStore + ?Sized,
{
    let trigger = parse_trigger(&event);
    info!(
        component = COMPONENT,
        event = "sweep_started",
        trigger_id = trigger.id.as_deref(),
        scheduled_time = trigger.time.as_deref(),
        source = trigger.source.as_deref(),
        detail_type = trigger.detail_type.as_deref(),
        bucket = config.bucket(),
        prefix = config.prefix(),
        retention_days = config.retention_window().num_days(),
    );

    let report = match run_sweep(store, config, now).await {
        Ok(report) => report,
        Err(sweep_error) => {
            error!(
                component = COMPONENT,
                event = "sweep_aborted",
                trigger_id = trigger.id.as_deref(),
                error = %sweep_error,
            );
            return Err(sweep_error);
        }
    };

    let deleted = report.deleted_count();
    let failed = report.failed_count();
    info!(
        component = COMPONENT,
        event = "sweep_completed",
        trigger_id = trigger.id.as_deref(),
        deleted,
        failed,
        retained = report.retained,
        "Successfully deleted {deleted} old images."
    );

    if failed > 0 {
        return Err(SweepError::DeleteFailures {
            failed,
            issued: report.issued_count(),
        });
    }

    Ok(SweepResponse {
        bucket: config.bucket().to_string(),
        prefix: config.prefix().to_string(),
        cutoff: report.cutoff.to_rfc3339(),
        pages: report.pages,
        listed: report.listed,
        retained: report.retained,
        deleted,
    })
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use retention_sweep_core::contract::{ListPage, StorageObject};
    use serde_json::json;

    use crate::adapters::object_store::StoreError;

    use super::*;

    struct FixedStore {
        objects: Vec<StorageObject>,
        deny_deletes: bool,
        delete_calls: Mutex<usize>,
    }

    #[async_trait]
    impl ObjectStore for FixedStore {
        async fn list_page(
            &self,
            _prefix: &str,
            _continuation: Option<String>,
        ) -> Result<ListPage, StoreError> {
            Ok(ListPage {
                objects: self.objects.clone(),
                next_token: None,
            })
        }

        async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
            *self.delete_calls.lock().expect("poisoned mutex") += 1;
            if self.deny_deletes {
                return Err(StoreError::Delete {
                    key: key.to_string(),
                    message: "throttled".to_string(),
                });
            }
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn store(deny_deletes: bool) -> FixedStore {
        FixedStore {
            objects: vec![
                StorageObject::new("chat_images/old.jpg", now() - TimeDelta::days(40)),
                StorageObject::new("chat_images/new.jpg", now() - TimeDelta::days(1)),
            ],
            deny_deletes,
            delete_calls: Mutex::new(0),
        }
    }

    #[test]
    fn parses_eventbridge_scheduled_event() {
        let event = json!({
            "version": "0",
            "id": "53dc4d37-cffa-4f76-80c9-8b7d4a4d2eaa",
            "detail-type": "Scheduled Event",
            "source": "aws.events",
            "account": "123456789012",
            "time": "2026-07-01T00:00:00Z",
            "region": "us-east-1",
            "resources": ["arn:aws:events:us-east-1:123456789012:rule/retention-daily"],
            "detail": {}
        });

        let trigger = parse_trigger(&event);
        assert_eq!(
            trigger.id.as_deref(),
            Some("53dc4d37-cffa-4f76-80c9-8b7d4a4d2eaa")
        );
        assert_eq!(trigger.detail_type.as_deref(), Some("Scheduled Event"));
        assert_eq!(trigger.source.as_deref(), Some("aws.events"));
        assert_eq!(trigger.time.as_deref(), Some("2026-07-01T00:00:00Z"));
    }

    #[test]
    fn tolerates_missing_or_odd_payloads() {
        assert_eq!(parse_trigger(&Value::Null), ScheduleTrigger::default());
        assert_eq!(parse_trigger(&json!([1, 2])), ScheduleTrigger::default());
        assert_eq!(parse_trigger(&json!({"id": 42})), ScheduleTrigger::default());
        assert_eq!(parse_trigger(&json!({})), ScheduleTrigger::default());
    }

    #[tokio::test]
    async fn responds_with_sweep_totals() {
        let config = RetentionConfig::chat_images("chat-media-test").expect("config");
        let store = store(false);

        let response = handle_scheduled_event(json!({}), &config, &store, now())
            .await
            .expect("handler should succeed");

        assert_eq!(response.bucket, "chat-media-test");
        assert_eq!(response.prefix, "chat_images/");
        assert_eq!(response.listed, 2);
        assert_eq!(response.deleted, 1);
        assert_eq!(response.retained, 1);
        assert_eq!(response.cutoff, "2026-06-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn reports_invocation_failure_after_batch_settles() {
        let config = RetentionConfig::chat_images("chat-media-test").expect("config");
        let store = store(true);

        let error = handle_scheduled_event(Value::Null, &config, &store, now())
            .await
            .expect_err("handler should surface delete failures");

        assert!(matches!(
            error,
            SweepError::DeleteFailures {
                failed: 1,
                issued: 1
            }
        ));
        assert_eq!(*store.delete_calls.lock().expect("poisoned mutex"), 1);
    }

    #[tokio::test]
    async fn response_carries_only_sweep_totals() {
        let config = RetentionConfig::chat_images("chat-media-test").expect("config");

        let response = handle_scheduled_event(json!({}), &config, &store(false), now())
            .await
            .expect("handler should succeed");
        let value = serde_json::to_value(&response).expect("response should serialize");

        let mut fields: Vec<_> = value
            .as_object()
            .expect("response should be an object")
            .keys()
            .cloned()
            .collect();
        fields.sort();
        assert_eq!(
            fields,
            vec!["bucket", "cutoff", "deleted", "listed", "pages", "prefix", "retained"]
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("poisoned mutex").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn start_log_carries_trigger_correlation_fields() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let config = RetentionConfig::chat_images("chat-media-test").expect("config");
        let event = json!({
            "id": "run-42",
            "time": "2026-07-01T00:00:00Z",
            "source": "aws.events",
            "detail-type": "Scheduled Event",
        });
        handle_scheduled_event(event, &config, &store(false), now())
            .await
            .expect("handler should succeed");

        let output = String::from_utf8(logs.0.lock().expect("poisoned mutex").clone())
            .expect("logs should be utf-8");
        let started = output
            .lines()
            .find(|line| line.contains("\"sweep_started\""))
            .expect("sweep_started should be logged");
        assert!(started.contains("\"trigger_id\":\"run-42\""));
        assert!(started.contains("\"source\":\"aws.events\""));
        assert!(started.contains("\"detail_type\":\"Scheduled Event\""));
    }
}
