//! Integration tests for the onboarding REST routes and the tool endpoint.
//!
//! Each test spins up an Axum server on a random port over a fresh JSON
//! store and exercises the real HTTP contract with reqwest.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::timeout;

use helpdesk_assist::knowledge::{KnowledgeBase, ToolMetrics};
use helpdesk_assist::onboarding::OnboardingManager;
use helpdesk_assist::server::{AppState, router};
use helpdesk_assist::store::JsonFileBackend;
use helpdesk_assist::tools::ToolRegistry;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Start a server over a temp data dir, return (base url, data dir).
async fn start_server() -> (String, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("acronyms.json"),
        r#"[{"key": "BTP", "value": "Business Technology Platform"}]"#,
    )
    .unwrap();

    let backend = Arc::new(JsonFileBackend::new(dir.path().join("onboarding.json")));
    let manager = Arc::new(OnboardingManager::new(backend));
    let metrics = Arc::new(ToolMetrics::default());
    let knowledge = Arc::new(KnowledgeBase::new(dir.path(), Arc::clone(&metrics)));
    let mut tools = ToolRegistry::new();
    tools.register_onboarding_tools(Arc::clone(&manager));
    tools.register_knowledge_tools(knowledge);
    let tools = Arc::new(tools);

    let app = router(AppState {
        manager,
        tools,
        metrics,
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), dir)
}

#[tokio::test]
async fn health_reports_store_and_tools() {
    timeout(TEST_TIMEOUT, async {
        let (base, _dir) = start_server().await;

        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["store"], "json");
        assert_eq!(body["tool_calls"], 0);
        assert_eq!(body["tools"].as_array().unwrap().len(), 10);
        assert_eq!(body["features"][0], "Onboarding");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn fresh_checklist_is_created_and_persisted() {
    timeout(TEST_TIMEOUT, async {
        let (base, dir) = start_server().await;

        let resp = reqwest::get(format!("{base}/api/onboarding/alice/checklist"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["total"], 8);
        assert_eq!(body["completed"], 0);
        assert_eq!(body["items"][0]["id"], "d1-setup");
        assert!(
            body["text"]
                .as_str()
                .unwrap()
                .ends_with("Progress: 0/8 completed")
        );

        let raw = std::fs::read_to_string(dir.path().join("onboarding.json")).unwrap();
        assert!(raw.contains("\"alice\""));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn mark_step_then_unmark() {
    timeout(TEST_TIMEOUT, async {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/api/onboarding/alice/steps/sandbox"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "marked");
        assert_eq!(body["text"], "✅ Step 'Request sandbox access' marked done.");

        let resp = client
            .post(format!("{base}/api/onboarding/alice/steps/sandbox"))
            .json(&json!({"done": "no"}))
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["step"]["done"], false);

        let history: Value = reqwest::get(format!("{base}/api/onboarding/alice/history"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let events = history["history"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["action"], "step_toggle");
        assert_eq!(events[1]["done"], false);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_step_is_404_with_available_ids() {
    timeout(TEST_TIMEOUT, async {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/api/onboarding/alice/steps/bogus-id"))
            .json(&json!({"done": true}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("❌ Step 'bogus-id' not found.")
        );
        assert_eq!(body["available"].as_array().unwrap().len(), 8);

        let history: Value = reqwest::get(format!("{base}/api/onboarding/alice/history"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(history["history"].as_array().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn side_requests_issue_distinct_ids() {
    timeout(TEST_TIMEOUT, async {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let first: Value = client
            .post(format!("{base}/api/onboarding/bob/sandbox"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let second: Value = client
            .post(format!("{base}/api/onboarding/bob/sandbox"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_ne!(first["ticket_id"], second["ticket_id"]);

        let dummy: Value = client
            .post(format!("{base}/api/onboarding/bob/dummy-data"))
            .json(&json!({"dataset": "customers"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(dummy["dataset"], "customers");
        assert_eq!(dummy["size"], "small");
        assert!(dummy["request_id"].as_str().unwrap().starts_with("DUMMY-"));

        let history: Value = reqwest::get(format!("{base}/api/onboarding/bob/history"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let actions: Vec<&str> = history["history"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["action"].as_str().unwrap())
            .collect();
        assert_eq!(actions, ["sandbox_request", "sandbox_request", "dummy_data"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn tool_endpoint_dispatches_and_counts_hits() {
    timeout(TEST_TIMEOUT, async {
        let (base, _dir) = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/api/tools/acronym_meaning"))
            .json(&json!({"key": "btp"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["text"], "BTP = Business Technology Platform");

        let resp = client
            .post(format!("{base}/api/tools/get_onboarding_checklist"))
            .header("x-user-id", "carol")
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["user_id"], "carol");

        let resp = client
            .post(format!("{base}/api/tools/no_such_tool"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let health: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["tool_calls"], 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn help_and_feedback() {
    timeout(TEST_TIMEOUT, async {
        let (base, _dir) = start_server().await;

        let help: Value = reqwest::get(format!("{base}/api/help"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(help["features"]["Acronyms"].is_string());
        assert!(help["text"].as_str().unwrap().starts_with("Here's what I can do:"));

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/feedback"))
            .json(&json!({"rating": 1, "message": "great", "session_id": "s1"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Thank you for your feedback!");

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/feedback"))
            .header("content-type", "application/json")
            .body("{rating: oops")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Thank you for your feedback!");
        assert!(body["id"].is_string());
    })
    .await
    .expect("test timed out");
}
