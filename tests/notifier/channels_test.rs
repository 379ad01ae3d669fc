use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use balance_sentinel::config::{NtfySettings, PushoverSettings, UptimeKumaSettings};
use balance_sentinel::services::notifier::{
    AlertMessage, AlertNotifier, HealthReport, HealthReporter, NtfyNotifier, PushoverNotifier,
    UptimeKumaNotifier,
};
use balance_sentinel::services::retry::RetryPolicy;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::common::{dec, spawn_mock_server};

// =============================================================================
// CHANNEL TESTS (in-process mock endpoints)
// =============================================================================

type Captured<T> = Arc<Mutex<Vec<T>>>;

fn instant_retry(retry_count: u32) -> RetryPolicy {
    RetryPolicy::new(retry_count, Duration::ZERO)
}

fn alert() -> AlertMessage {
    AlertMessage::new(
        "USDT Balance Change Alert",
        "Previous: 100.0 USDT\nCurrent: 150.0 USDT\nChange: 50.0 USDT\nTime: 2024-05-01 08:00:00",
    )
}

async fn ntfy_server(status: StatusCode) -> (String, Captured<(HeaderMap, String)>) {
    let captured: Captured<(HeaderMap, String)> = Arc::default();

    async fn handler(
        State((captured, status)): State<(Captured<(HeaderMap, String)>, StatusCode)>,
        headers: HeaderMap,
        body: String,
    ) -> StatusCode {
        captured.lock().unwrap().push((headers, body));
        status
    }

    let router = Router::new()
        .route("/alerts", post(handler))
        .with_state((captured.clone(), status));
    (spawn_mock_server(router).await, captured)
}

#[tokio::test]
async fn test_ntfy_publishes_title_priority_and_body() {
    let (base, captured) = ntfy_server(StatusCode::OK).await;
    let notifier = NtfyNotifier::new(&NtfySettings {
        server: base,
        topic_id: "alerts".to_string(),
        retry: instant_retry(3),
        ..NtfySettings::default()
    });

    let report = notifier.deliver(&alert()).await;

    assert!(report.is_success());
    assert_eq!(report.recipients[0].attempts, 1);

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (headers, body) = &requests[0];
    assert_eq!(headers["title"], "USDT Balance Change Alert");
    assert_eq!(headers["priority"], "default");
    assert!(body.contains("Change: 50.0 USDT"));
}

#[tokio::test]
async fn test_ntfy_retries_until_budget_spent() {
    let (base, captured) = ntfy_server(StatusCode::INTERNAL_SERVER_ERROR).await;
    let notifier = NtfyNotifier::new(&NtfySettings {
        server: base,
        topic_id: "alerts".to_string(),
        retry: instant_retry(2),
        ..NtfySettings::default()
    });

    let report = notifier.deliver(&alert()).await;

    assert!(!report.is_success());
    assert_eq!(captured.lock().unwrap().len(), 3);
    assert_eq!(report.recipients[0].attempts, 3);
    assert_eq!(report.recipients[0].error.as_deref(), Some("Status code: 500"));
}

async fn pushover_server() -> (String, Captured<HashMap<String, String>>) {
    let captured: Captured<HashMap<String, String>> = Arc::default();

    async fn handler(
        State(captured): State<Captured<HashMap<String, String>>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let rejected = form.get("user").map(String::as_str) == Some("bad_user_key");
        captured.lock().unwrap().push(form);

        if rejected {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "user": "invalid",
                    "errors": ["user identifier is invalid"],
                    "status": 0
                })),
            )
        } else {
            (StatusCode::OK, Json(json!({ "status": 1, "request": "5042853c" })))
        }
    }

    let router = Router::new()
        .route("/1/messages.json", post(handler))
        .with_state(captured.clone());
    (spawn_mock_server(router).await, captured)
}

#[tokio::test]
async fn test_pushover_sends_one_request_per_user() {
    let (base, captured) = pushover_server().await;
    let notifier = PushoverNotifier::new(&PushoverSettings {
        api_url: format!("{}/1/messages.json", base),
        app_token: "app_token_123".to_string(),
        user_keys: vec!["user_key_one".to_string(), "user_key_two".to_string()],
        priority: 1,
        retry: instant_retry(3),
        ..PushoverSettings::default()
    });

    let report = notifier.deliver(&alert()).await;

    assert!(report.is_success());
    assert_eq!(report.delivered_count(), 2);
    assert_eq!(report.recipients[0].recipient, "user_...");

    let forms = captured.lock().unwrap();
    assert_eq!(forms.len(), 2);
    assert_eq!(forms[0]["user"], "user_key_one");
    assert_eq!(forms[1]["user"], "user_key_two");
    assert_eq!(forms[0]["token"], "app_token_123");
    assert_eq!(forms[0]["priority"], "1");
    assert_eq!(forms[0]["title"], "USDT Balance Change Alert");
}

#[tokio::test]
async fn test_pushover_budget_is_per_user() {
    let (base, captured) = pushover_server().await;
    let notifier = PushoverNotifier::new(&PushoverSettings {
        api_url: format!("{}/1/messages.json", base),
        app_token: "app_token_123".to_string(),
        user_keys: vec!["bad_user_key".to_string(), "good_user_key".to_string()],
        retry: instant_retry(2),
        ..PushoverSettings::default()
    });

    let report = notifier.deliver(&alert()).await;

    assert!(!report.is_success());
    assert_eq!(report.delivered_count(), 1);
    assert_eq!(report.recipients[0].attempts, 3);
    assert_eq!(
        report.recipients[0].error.as_deref(),
        Some("Rejected: user identifier is invalid")
    );
    assert!(report.recipients[1].is_delivered());
    assert_eq!(report.recipients[1].attempts, 1);

    // Three tries for the bad key, one for the good key
    let forms = captured.lock().unwrap();
    assert_eq!(forms.len(), 4);
    assert_eq!(forms[3]["user"], "good_user_key");
}

async fn kuma_server(ok: bool) -> (String, Captured<HashMap<String, String>>) {
    let captured: Captured<HashMap<String, String>> = Arc::default();

    async fn handler(
        State((captured, ok)): State<(Captured<HashMap<String, String>>, bool)>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        captured.lock().unwrap().push(query);
        if ok {
            Json(json!({ "ok": true }))
        } else {
            Json(json!({ "ok": false, "msg": "Monitor not found or not active." }))
        }
    }

    let router = Router::new()
        .route("/api/push/abc123", get(handler))
        .with_state((captured.clone(), ok));
    (spawn_mock_server(router).await, captured)
}

#[tokio::test]
async fn test_uptime_kuma_up_ping() {
    let (base, captured) = kuma_server(true).await;
    let notifier = UptimeKumaNotifier::new(&UptimeKumaSettings {
        push_url: format!("{}/api/push/abc123?status=up&msg=OK&ping=", base),
        retry: instant_retry(1),
        ..UptimeKumaSettings::default()
    })
    .unwrap();

    let report = notifier.report(&HealthReport::up(dec("150.0"))).await;

    assert!(report.is_success());
    let queries = captured.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["status"], "up");
    assert_eq!(queries[0]["msg"], "Balance check successful");
    assert_eq!(queries[0]["ping"], "150.0");
}

#[tokio::test]
async fn test_uptime_kuma_down_ping_and_rejection() {
    let (base, captured) = kuma_server(false).await;
    let notifier = UptimeKumaNotifier::new(&UptimeKumaSettings {
        push_url: format!("{}/api/push/abc123", base),
        retry: instant_retry(1),
        ..UptimeKumaSettings::default()
    })
    .unwrap();

    let report = notifier
        .report(&HealthReport::down("Network error: connection reset"))
        .await;

    assert!(!report.is_success());
    assert_eq!(
        report.recipients[0].error.as_deref(),
        Some("Rejected: Monitor not found or not active.")
    );

    let queries = captured.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0]["status"], "down");
    assert_eq!(queries[0]["ping"], "0");
    assert_eq!(
        queries[0]["msg"],
        "Balance check failed: Network error: connection reset"
    );
}
