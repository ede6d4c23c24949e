// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP-level gateway tests over the mock pipeline.

use std::sync::Arc;

use vigil_core::PluginAdapter;
use vigil_gateway::{AuthConfig, GatewayState, serve};
use vigil_storage::queries::findings;
use vigil_test_utils::TestPipeline;

async fn spawn_gateway(h: &TestPipeline, bearer_token: Option<String>) -> String {
    let state = GatewayState {
        pipeline: h.pipeline_arc(),
        adapters: vec![
            h.provider.clone() as Arc<dyn PluginAdapter>,
            h.notifier.clone() as Arc<dyn PluginAdapter>,
        ],
        auth: AuthConfig { bearer_token },
        start_time: std::time::Instant::now(),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(listener, state).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_is_public_and_reports_adapters() {
    let h = TestPipeline::new().await;
    let base = spawn_gateway(&h, Some("secret".into())).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    let adapters = body["adapters"].as_array().unwrap();
    assert!(adapters.iter().any(|a| a["name"] == "mock-provider"));
    assert!(adapters.iter().all(|a| a["status"] == "healthy"));
}

#[tokio::test]
async fn v1_routes_require_bearer_token() {
    let h = TestPipeline::new().await;
    let base = spawn_gateway(&h, Some("secret".into())).await;
    let client = reqwest::Client::new();

    let unauthorized = client
        .post(format!("{base}/v1/scan"))
        .json(&serde_json::json!({"subject_id": "s1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), 401);

    let wrong = client
        .post(format!("{base}/v1/scan"))
        .bearer_auth("wrong")
        .json(&serde_json::json!({"subject_id": "s1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    let authorized = client
        .post(format!("{base}/v1/scan"))
        .bearer_auth("secret")
        .json(&serde_json::json!({"subject_id": "s1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(authorized.status(), 200);
}

#[tokio::test]
async fn scan_reports_skip_reason_for_unknown_subject() {
    let h = TestPipeline::new().await;
    let base = spawn_gateway(&h, None).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{base}/v1/scan"))
        .json(&serde_json::json!({"subject_id": "ghost", "force": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["skipped"], "unknown subject");
}

#[tokio::test]
async fn ingest_to_finding_through_http() {
    let h = TestPipeline::new().await;
    h.seed_subject("s1", Some(2013), true).await;

    // Tier-1 escalates, Tier-2 alerts.
    h.provider
        .push_response(
            r#"{"messages": [{"message_id": "m1", "risk_score": 80,
                "risk_codes": ["meetup"], "escalate": true}], "escalate": true}"#,
        )
        .await;
    h.provider
        .push_response(
            r#"{"final_risk_score": 85, "threat_type": "grooming", "confidence": 0.9,
                "action": "alert", "key_reasons": ["location solicitation"],
                "evidence_message_ids": ["m1"]}"#,
        )
        .await;

    let base = spawn_gateway(&h, None).await;
    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{base}/v1/ingest"))
        .json(&serde_json::json!({
            "messages": [{
                "id": "m1",
                "chat_id": "c1",
                "subject_id": "s1",
                "sender_role": "contact",
                "text": "where do you live? i could pick you up"
            }]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["accepted"], 1);
    assert_eq!(body["immediate"], 1);
    assert_eq!(body["escalated_chats"], 1);

    let stored = findings::list_findings_for_subject(&h.db, "s1").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(h.notifier.notices().await.len(), 1);
}
