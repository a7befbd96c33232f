//! Concurrency properties of the onboarding store, checked against every
//! backend: no lost updates, one event per successful call, and unique
//! request ids.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;

use helpdesk_assist::onboarding::OnboardingManager;
use helpdesk_assist::onboarding::model::{DEFAULT_CHECKLIST, HistoryKind};
use helpdesk_assist::store::{JsonFileBackend, LibSqlBackend, MemoryBackend, ProgressBackend};

const TEST_TIMEOUT: Duration = Duration::from_secs(20);

async fn backends(dir: &tempfile::TempDir) -> Vec<Arc<dyn ProgressBackend>> {
    vec![
        Arc::new(MemoryBackend::new()),
        Arc::new(JsonFileBackend::new(dir.path().join("onboarding.json"))),
        Arc::new(
            LibSqlBackend::new_local(&dir.path().join("onboarding.db"))
                .await
                .unwrap(),
        ),
    ]
}

#[tokio::test]
async fn concurrent_marks_on_one_user_are_all_applied() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        for backend in backends(&dir).await {
            let name = backend.name();
            let manager = Arc::new(OnboardingManager::new(backend));

            let calls = DEFAULT_CHECKLIST.iter().map(|(id, _)| {
                let manager = Arc::clone(&manager);
                async move { manager.mark_step("alice", id, true).await }
            });
            for result in join_all(calls).await {
                assert!(result.unwrap().is_marked(), "{name}");
            }

            let view = manager.get_checklist("alice").await.unwrap();
            assert_eq!(view.completed(), DEFAULT_CHECKLIST.len(), "{name}");

            let history = manager.history("alice").await.unwrap();
            assert_eq!(history.len(), DEFAULT_CHECKLIST.len(), "{name}");
            let toggled: HashSet<String> = history
                .iter()
                .filter_map(|e| match &e.kind {
                    HistoryKind::StepToggle { step, done: true } => Some(step.clone()),
                    _ => None,
                })
                .collect();
            assert_eq!(toggled.len(), DEFAULT_CHECKLIST.len(), "{name}");
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn concurrent_side_requests_get_unique_ids_and_events() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        for backend in backends(&dir).await {
            let name = backend.name();
            let manager = Arc::new(OnboardingManager::new(backend));

            let sandbox = (0..10).map(|_| {
                let manager = Arc::clone(&manager);
                async move { manager.request_sandbox_access("bob").await.unwrap().ticket_id }
            });
            let dummy = (0..10).map(|_| {
                let manager = Arc::clone(&manager);
                async move {
                    manager
                        .request_dummy_data("bob", None, None)
                        .await
                        .unwrap()
                        .request_id
                }
            });
            let (tickets, requests) = tokio::join!(join_all(sandbox), join_all(dummy));

            let unique: HashSet<&String> = tickets.iter().chain(requests.iter()).collect();
            assert_eq!(unique.len(), 20, "{name}");

            let history = manager.history("bob").await.unwrap();
            assert_eq!(history.len(), 20, "{name}");
            // Lazy creation happened exactly once: the checklist is intact.
            let view = manager.get_checklist("bob").await.unwrap();
            assert_eq!(view.total(), DEFAULT_CHECKLIST.len(), "{name}");
            assert_eq!(manager.users().await.unwrap(), vec!["bob"], "{name}");
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn users_do_not_interfere() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        for backend in backends(&dir).await {
            let name = backend.name();
            let manager = Arc::new(OnboardingManager::new(backend));

            let calls = ["u1", "u2", "u3", "u4"].into_iter().map(|user| {
                let manager = Arc::clone(&manager);
                async move { manager.mark_step(user, "demo", true).await.unwrap() }
            });
            join_all(calls).await;

            for user in ["u1", "u2", "u3", "u4"] {
                let view = manager.get_checklist(user).await.unwrap();
                assert_eq!(view.completed(), 1, "{name}/{user}");
                assert_eq!(manager.history(user).await.unwrap().len(), 1, "{name}/{user}");
            }
        }
    })
    .await
    .expect("test timed out");
}
