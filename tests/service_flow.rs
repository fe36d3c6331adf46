mod common;

use common::{fields, test_config, MemoryBackend};
use outreach_tracker::errors::{self, ErrorClass, Notice};
use outreach_tracker::health::HealthStatus;
use outreach_tracker::model::{HookTemplate, ResponseStatus, UserProfile};
use outreach_tracker::service::{Gate, OutreachService, QueryState};
use outreach_tracker::session::{self, SessionSources};

#[tokio::test]
async fn created_entry_is_listed_exactly_once() {
    let backend = MemoryBackend::default();
    let service = backend.service();

    let before = service.list_entries().await.into_result().unwrap();
    assert!(before.is_empty());

    let created = service
        .create_entry(&fields("Makers", "https://g.test/makers", "2026-10-17"))
        .await
        .unwrap();
    assert!(created.id > 0);
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);

    let after = service.list_entries().await.into_result().unwrap();
    let matching: Vec<_> = after.iter().filter(|e| e.id == created.id).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0], &created);
    assert_eq!(backend.calls_to("listEntries").await, 2);
}

#[tokio::test]
async fn queries_are_cached_until_a_mutation() {
    let backend = MemoryBackend::default();
    let service = backend.service();

    service.list_entries().await.into_result().unwrap();
    service.list_entries().await.into_result().unwrap();
    assert_eq!(backend.calls_to("listEntries").await, 1);

    // Hook saves do not touch the outreach namespace.
    let mut hooks = service.hook_templates().await.into_result().unwrap();
    hooks
        .set(0, HookTemplate { title: "Q".into(), content: "Ever tried soap making?".into() })
        .unwrap();
    service.save_hook_templates(&hooks).await.unwrap();
    service.list_entries().await.into_result().unwrap();
    assert_eq!(backend.calls_to("listEntries").await, 1);
    let reloaded = service.hook_templates().await.into_result().unwrap();
    assert_eq!(reloaded.copyable_content(0).unwrap(), "Ever tried soap making?");
    assert_eq!(backend.calls_to("getHookTemplatesForCaller").await, 2);

    let entry = backend.seed(&fields("Makers", "https://g.test/makers", "2026-10-10")).await;
    service.delete_entry(entry.id).await.unwrap();
    service.list_entries().await.into_result().unwrap();
    assert_eq!(backend.calls_to("listEntries").await, 2);
}

#[tokio::test]
async fn profile_mutation_invalidates_user_queries() {
    let backend = MemoryBackend::default();
    let service = backend.service();

    assert_eq!(service.caller_profile().await.into_result().unwrap(), None);
    service
        .save_caller_profile(&UserProfile { name: "Dana".into() })
        .await
        .unwrap();
    let profile = service.caller_profile().await.into_result().unwrap();
    assert_eq!(profile.map(|p| p.name), Some("Dana".to_string()));
    assert_eq!(backend.calls_to("getCallerUserProfile").await, 2);
}

#[tokio::test(start_paused = true)]
async fn unavailable_backend_disables_queries_until_retry_succeeds() {
    let backend = MemoryBackend::default();
    backend
        .script_health(vec![Err("Connection refused".into()); 8])
        .await;
    let service = backend.service();

    let snapshot = service.load_dashboard().await;
    assert!(matches!(snapshot.health, HealthStatus::Unavailable(_)));
    assert!(matches!(
        snapshot.entries,
        QueryState::Disabled(Gate::Health(HealthStatus::Unavailable(_)))
    ));
    assert!(snapshot.follow_ups.is_disabled());
    assert!(snapshot.group_summary.is_disabled());
    assert!(snapshot.inquiry_summary.is_disabled());
    assert_eq!(backend.calls_to("health").await, 4);
    assert_eq!(backend.calls().await.iter().filter(|m| **m != "health").count(), 0);

    let err = snapshot.entries.into_result().unwrap_err();
    assert_eq!(errors::classify(&err), ErrorClass::ServiceUnavailable);
    assert!(matches!(errors::notice_for(&err), Notice::RetryBanner(_)));

    // Retry while still down: probe only.
    let snapshot = service.retry().await;
    assert!(!snapshot.health.is_healthy());
    assert_eq!(backend.calls_to("health").await, 8);
    assert_eq!(backend.calls_to("listEntries").await, 0);

    // Backend is back.
    let snapshot = service.retry().await;
    assert_eq!(snapshot.health, HealthStatus::Healthy);
    assert!(snapshot.entries.ready().is_some());
    assert!(snapshot.follow_ups.ready().is_some());
    assert!(snapshot.group_summary.ready().is_some());
    assert_eq!(backend.calls_to("health").await, 9);
    assert_eq!(backend.calls_to("listEntries").await, 1);
    assert_eq!(backend.calls_to("getFollowUpToday").await, 1);
    assert_eq!(backend.calls_to("getGroupResponseSummary").await, 1);
}

#[tokio::test]
async fn query_errors_are_not_retried() {
    let backend = MemoryBackend::default();
    backend.fail("listEntries", "Unauthorized: caller is not a user").await;
    let service = backend.service();

    let state = service.list_entries().await;
    let err = match state {
        QueryState::Error(err) => err,
        other => panic!("expected error, got {:?}", other),
    };
    assert_eq!(errors::classify(&err), ErrorClass::Authorization);
    assert_eq!(backend.calls_to("listEntries").await, 1);
}

#[tokio::test]
async fn dashboard_derives_views_from_fetched_lists() {
    let backend = MemoryBackend::default();
    let mut hot = fields("Makers", "https://g.test/makers", "2026-10-15");
    hot.num_comments = 12;
    hot.response_status = ResponseStatus::LeadsGenerated;
    backend.seed(&hot).await;
    let mut due = fields("Crafters", "https://g.test/crafters", "2026-10-18");
    due.response_status = ResponseStatus::ActiveDiscussion;
    backend.seed(&due).await;
    let service = backend.service();

    let snapshot = service.load_dashboard().await;
    let follow_ups = snapshot.follow_ups.ready().unwrap();
    assert_eq!(follow_ups.len(), 1);
    assert_eq!(follow_ups[0].group_name, "Crafters");

    let entries = snapshot.entries.ready().unwrap();
    let winners = outreach_tracker::views::winning_posts(entries);
    assert_eq!(winners.len(), 1);
    let days = outreach_tracker::views::days_since_last_post(entries, service.today());
    assert_eq!(days[0].group_name, "Crafters");
    assert_eq!(days[1].days_since, 3);

    let bars = outreach_tracker::views::success_rate_bars(snapshot.group_summary.ready().unwrap());
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].percent, 100.0);

    let ranking = outreach_tracker::views::rank_event_types(snapshot.inquiry_summary.ready().unwrap());
    assert!(!ranking.has_data);
}

#[tokio::test]
async fn initializing_session_has_no_actor() {
    let resolved = session::resolve(&SessionSources::initializing());
    let service = OutreachService::new(resolved, &test_config());

    assert!(matches!(
        service.list_entries().await,
        QueryState::Disabled(Gate::SessionNotReady)
    ));
    let err = service
        .create_entry(&fields("Makers", "https://g.test/makers", "2026-10-17"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Actor not available"));
}

#[tokio::test]
async fn switching_identity_does_not_reuse_cached_results() {
    let first = MemoryBackend::default();
    first.seed(&fields("Makers", "https://g.test/makers", "2026-10-17")).await;
    let second = MemoryBackend::default();
    let mut service = first.service();
    assert_eq!(service.list_entries().await.into_result().unwrap().len(), 1);

    let mut sources = SessionSources::initializing();
    sources.identity = session::IdentityState::Resolved(Some(
        outreach_tracker::model::Principal::new("user-b"),
    ));
    sources.authenticated = session::SourceState::Ready(second.actor());
    sources.anonymous = session::SourceState::Ready(second.actor());
    let resolved = session::resolve(&sources);
    assert_eq!(resolved.cache_key, "authenticated:user-b");
    service.set_session(resolved).await;
    assert!(service.cache().is_empty().await);

    assert!(service.list_entries().await.into_result().unwrap().is_empty());
    assert_eq!(second.calls_to("listEntries").await, 1);
}

#[tokio::test]
async fn blank_group_url_disables_notes_query() {
    let backend = MemoryBackend::default();
    let service = backend.service();
    assert!(matches!(
        service.group_notes("   ").await,
        QueryState::Disabled(Gate::MissingInput(_))
    ));
    assert!(backend.calls().await.is_empty());
}
