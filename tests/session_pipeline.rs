/// Session pipeline tests
///
/// Drive the coordinator end to end against in-memory registry and
/// presentation fakes, with tokio time paused so delays are deterministic.
mod common;

use common::{coordinator, Failure, FakeRegistry, FakeVerifier};
use ens_attest::{
    config::AppConfig,
    presentation::CredentialTemplate,
    registry::TextKey,
    report::VerificationReport,
    session::{SessionId, SessionStatus, Slot},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test(start_paused = true)]
async fn test_domico_end_to_end() {
    let registry = FakeRegistry::default()
        .with("domico.eth", TextKey::Twitter, "alice")
        .with("domico.eth", TextKey::Verifications, r#"["https://verify/abc"]"#);
    let verifier = Arc::new(FakeVerifier::default().with(
        "https://verify/abc",
        json!([{ "type": ["ENS"], "credentialSubject": { "ethAddress": "0xabc" } }]),
    ));
    let coordinator = coordinator(registry, verifier, TIMEOUT);

    let session = coordinator.resolve("domico.eth").await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Resolved);
    assert_eq!(session.twitter.value().map(String::as_str), Some("alice"));
    assert_eq!(session.instagram, Slot::Resolved(None));

    let index = session.credentials.resolved().unwrap();
    assert!(index.find_by_template(CredentialTemplate::Ens).is_some());
    assert!(index.find_social_match(CredentialTemplate::X, "alice").is_none());

    let report = VerificationReport::from_session(&session, &AppConfig::default().display);
    assert!(report.ens_verified);
    assert!(!report.twitter_verified);
    assert_eq!(report.twitter_handle.as_deref(), Some("alice"));
    assert_eq!(report.verification_url.as_deref(), Some("https://verify/abc"));
    assert!(report.notes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_case_folded_input_resolves_same_name() {
    let registry = FakeRegistry::default().with("domico.eth", TextKey::Twitter, "alice");
    let coordinator = coordinator(registry, Arc::new(FakeVerifier::default()), TIMEOUT);

    let session = coordinator.resolve("  Domico.ETH ").await.unwrap().unwrap();
    let identity = session.identity.as_ref().unwrap();
    assert_eq!(identity.canonical_name, "domico.eth");
    assert_eq!(identity.raw_input, "  Domico.ETH ");
    assert_eq!(session.twitter.value().map(String::as_str), Some("alice"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_presentation_result_is_discarded() {
    let registry = FakeRegistry::default()
        .with("slow.eth", TextKey::Twitter, "slow_handle")
        .with("slow.eth", TextKey::Verifications, r#"["https://verify/slow"]"#)
        .with("fast.eth", TextKey::Twitter, "fast_handle")
        .with("fast.eth", TextKey::Verifications, r#"["https://verify/fast"]"#);
    let verifier = Arc::new(
        FakeVerifier::default()
            .slow(
                "https://verify/slow",
                json!([{ "type": ["ENS"], "credentialSubject": { "ethAddress": "0xslow" } }]),
                Duration::from_secs(5),
            )
            .with(
                "https://verify/fast",
                json!([{ "type": ["Personhood"], "credentialSubject": {} }]),
            ),
    );
    let coordinator = coordinator(registry, verifier.clone(), TIMEOUT);

    let a = coordinator.begin("slow.eth").unwrap();
    // Let A reach its presentation fetch
    sleep(Duration::from_millis(100)).await;
    assert_eq!(verifier.calls().len(), 1);

    let b = coordinator.begin("fast.eth").unwrap();
    b.finished().await;
    a.finished().await;

    let current = coordinator.current();
    assert_eq!(current.id, SessionId(2));
    assert_eq!(current.canonical_name(), Some("fast.eth"));
    assert_eq!(current.twitter.value().map(String::as_str), Some("fast_handle"));

    let index = current.credentials.resolved().unwrap();
    assert_eq!(index.len(), 1);
    assert!(index.find_by_template(CredentialTemplate::Ens).is_none());
    assert!(index.find_by_template(CredentialTemplate::Personhood).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_stale_text_results_never_reach_new_session() {
    let registry = FakeRegistry::default()
        .slow("old.eth", TextKey::Twitter, "old_handle", Duration::from_secs(3))
        .slow("old.eth", TextKey::Instagram, "old_ig", Duration::from_secs(3));
    let coordinator = coordinator(registry, Arc::new(FakeVerifier::default()), TIMEOUT);

    let old = coordinator.begin("old.eth").unwrap();
    let new = coordinator.resolve("new.eth").await.unwrap().unwrap();
    assert_eq!(new.twitter, Slot::Resolved(None));
    old.finished().await;

    let current = coordinator.current();
    assert_eq!(current.canonical_name(), Some("new.eth"));
    assert_eq!(current.twitter, Slot::Resolved(None));
    assert_eq!(current.instagram, Slot::Resolved(None));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_resolve_returns_none() {
    let registry = FakeRegistry::default().slow("first.eth", TextKey::Twitter, "x", Duration::from_secs(2));
    let coordinator = coordinator(registry, Arc::new(FakeVerifier::default()), TIMEOUT);

    let other = coordinator.clone();
    let first = tokio::spawn(async move { other.resolve("first.eth").await });
    sleep(Duration::from_millis(10)).await;
    coordinator.begin("second.eth").unwrap().finished().await;

    assert!(first.await.unwrap().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_fetch_waits_for_verifications_but_not_handles() {
    let registry = FakeRegistry::default()
        .with("alice.eth", TextKey::Twitter, "alice")
        .slow(
            "alice.eth",
            TextKey::Verifications,
            r#"["https://verify/alice"]"#,
            Duration::from_millis(300),
        );
    let verifier = Arc::new(FakeVerifier::default().slow(
        "https://verify/alice",
        json!([{ "type": ["X"], "credentialSubject": { "username": "alice" } }]),
        Duration::from_secs(1),
    ));
    let coordinator = coordinator(registry, verifier.clone(), TIMEOUT);

    let started = tokio::time::Instant::now();
    let handle = coordinator.begin("alice.eth").unwrap();

    sleep(Duration::from_millis(100)).await;
    let early = coordinator.current();
    assert_eq!(early.status, SessionStatus::Resolving);
    assert_eq!(early.twitter.value().map(String::as_str), Some("alice"));
    assert_eq!(early.verifications, Slot::Pending);
    assert!(verifier.calls().is_empty());

    sleep(Duration::from_millis(400)).await;
    let mid = coordinator.current();
    assert!(mid.presentation_url.is_resolved());
    assert_eq!(mid.credentials, Slot::Pending);

    handle.finished().await;
    let calls = verifier.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1 - started >= Duration::from_millis(300));

    let session = coordinator.current();
    let report = VerificationReport::from_session(&session, &AppConfig::default().display);
    assert!(report.twitter_verified);
}

#[tokio::test(start_paused = true)]
async fn test_sibling_lookup_failure_is_isolated() {
    let registry = FakeRegistry::default()
        .failing("alice.eth", TextKey::Twitter, "connection reset")
        .with("alice.eth", TextKey::Instagram, "alice_ig")
        .with("alice.eth", TextKey::Verifications, r#"["https://verify/alice"]"#);
    let verifier = Arc::new(FakeVerifier::default().with(
        "https://verify/alice",
        json!([{ "type": ["ENS"], "credentialSubject": { "ethAddress": "0x1" } }]),
    ));
    let coordinator = coordinator(registry, verifier, TIMEOUT);

    let session = coordinator.resolve("alice.eth").await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Resolved);
    assert_eq!(session.twitter, Slot::Resolved(None));
    assert_eq!(session.instagram.value().map(String::as_str), Some("alice_ig"));
    assert_eq!(session.credentials.resolved().unwrap().len(), 1);
    assert_eq!(session.notes.len(), 1);
    assert!(session.notes[0].contains("com.twitter"));
    assert!(session.notes[0].contains("connection reset"));
}

#[tokio::test(start_paused = true)]
async fn test_hung_lookup_is_bounded_by_timeout() {
    let registry = FakeRegistry::default()
        .hung("alice.eth", TextKey::Instagram)
        .with("alice.eth", TextKey::Twitter, "alice");
    let coordinator = coordinator(registry, Arc::new(FakeVerifier::default()), Duration::from_secs(2));

    let session = coordinator.resolve("alice.eth").await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Resolved);
    assert_eq!(session.instagram, Slot::Resolved(None));
    assert_eq!(session.twitter.value().map(String::as_str), Some("alice"));
    assert!(session.notes.iter().any(|n| n.contains("timed out")));
}

#[tokio::test(start_paused = true)]
async fn test_missing_or_malformed_verifications_skip_fetch() {
    let registry = FakeRegistry::default().with("broken.eth", TextKey::Verifications, "not json");
    let verifier = Arc::new(FakeVerifier::default());
    let coordinator = coordinator(registry, verifier.clone(), TIMEOUT);

    for name in ["nobody.eth", "broken.eth"] {
        let session = coordinator.resolve(name).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Resolved);
        assert_eq!(session.presentation_url, Slot::Resolved(None));
        assert!(session.credentials.resolved().unwrap().is_empty());
        assert!(session.notes.is_empty());
    }
    assert!(verifier.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_presentation_soft_failure_yields_empty_index() {
    let registry = FakeRegistry::default()
        .with("alice.eth", TextKey::Verifications, r#"["https://verify/empty"]"#);
    let verifier = Arc::new(FakeVerifier::default().failing("https://verify/empty", Failure::NoData));
    let coordinator = coordinator(registry, verifier, TIMEOUT);

    let session = coordinator.resolve("alice.eth").await.unwrap().unwrap();
    assert!(session.credentials.resolved().unwrap().is_empty());
    assert_eq!(session.notes.len(), 1);
    assert!(session.notes[0].contains("returned no data"));

    let report = VerificationReport::from_session(&session, &AppConfig::default().display);
    assert!(!report.ens_verified && !report.personhood_verified && !report.twitter_verified);
}

#[tokio::test(start_paused = true)]
async fn test_presentation_network_failure_yields_empty_index() {
    let registry = FakeRegistry::default()
        .with("alice.eth", TextKey::Verifications, r#"["https://verify/down"]"#);
    let verifier = Arc::new(FakeVerifier::default().failing("https://verify/down", Failure::Network("503")));
    let coordinator = coordinator(registry, verifier, TIMEOUT);

    let session = coordinator.resolve("alice.eth").await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Resolved);
    assert!(session.credentials.resolved().unwrap().is_empty());
    assert!(session.notes[0].contains("503"));
}
