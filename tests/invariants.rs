//! Property-style invariant checks: confidence/score bounds, URL
//! non-emptiness, per-user dedup, and progress monotonicity.

use chrono::Utc;
use leadscout_core::core::types::{
    ContactInfo, ExtractionMethod, Lead, LeadPriority, LeadSourceType, LeadStatus, Qualification,
};
use leadscout_core::progress_bus::ProgressBus;
use leadscout_core::store::memory::MemoryStore;
use leadscout_core::store::traits::{LeadRepository, LeadSourceRepository};
use uuid::Uuid;

fn base_lead(user_id: Uuid, url: &str, confidence: u8, score: u8) -> Lead {
    Lead {
        id: Uuid::new_v4(),
        user_id,
        lead_source_id: Uuid::new_v4(),
        title: "Some Project".to_string(),
        description: None,
        url: url.to_string(),
        company: "Acme".to_string(),
        contact_info: ContactInfo::default(),
        project_type: None,
        location: None,
        budget: None,
        timeline: None,
        industry_type: None,
        keywords: vec![],
        status: LeadStatus::New,
        priority: LeadPriority::Medium,
        custom_fields: Default::default(),
        confidence,
        extraction_method: ExtractionMethod::Manual,
        score,
        qualification: Qualification::Unqualified,
        published_at: Utc::now(),
        scraped_at: Utc::now(),
        notes: None,
    }
}

#[test]
fn confidence_above_100_violates_invariant() {
    let lead = base_lead(Uuid::new_v4(), "https://example.com/a", 101, 0);
    assert!(lead.check_invariants().is_err());
}

#[test]
fn score_above_100_violates_invariant() {
    let lead = base_lead(Uuid::new_v4(), "https://example.com/a", 0, 101);
    assert!(lead.check_invariants().is_err());
}

#[test]
fn empty_url_violates_invariant() {
    let lead = base_lead(Uuid::new_v4(), "", 0, 0);
    assert!(lead.check_invariants().is_err());
}

#[test]
fn unparseable_url_violates_invariant() {
    let lead = base_lead(Uuid::new_v4(), "not a url", 0, 0);
    assert!(lead.check_invariants().is_err());
}

#[test]
fn valid_lead_bounds_pass() {
    let lead = base_lead(Uuid::new_v4(), "https://example.com/a", 80, 50);
    assert!(lead.check_invariants().is_ok());
}

#[tokio::test]
async fn lead_dedup_is_scoped_per_user() {
    let store = MemoryStore::new();
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    let lead = base_lead(user_a, "https://example.com/shared-article", 50, 0);
    store.insert_lead(lead).await;

    assert!(
        store
            .find_by_normalized_url(user_a, "https://example.com/shared-article")
            .await
            .is_some()
    );
    assert!(
        store
            .find_by_normalized_url(user_b, "https://example.com/shared-article")
            .await
            .is_none()
    );
}

#[tokio::test]
async fn lead_source_find_or_create_is_idempotent_by_name() {
    let store = MemoryStore::new();
    let a = store.find_or_create("Industry Wire", "https://a.test", LeadSourceType::RssFeed).await;
    let b = store.find_or_create("Industry Wire", "https://a.test", LeadSourceType::RssFeed).await;
    assert_eq!(a.id, b.id);
}

#[tokio::test]
async fn progress_events_never_exceed_their_declared_total() {
    let bus = ProgressBus::new();
    let mut rx = bus.subscribe("job-x").await;
    for i in 1..=5u64 {
        bus.publish("job-x", "saving", i, 5, "step").await;
    }
    for _ in 0..5 {
        let event = rx.recv().await.unwrap();
        assert!(event.progress <= event.total);
        assert!(event.percentage <= 100);
    }
}
