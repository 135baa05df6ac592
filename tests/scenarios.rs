//! End-to-end scenario tests exercising the dispatcher-free portion of the
//! pipeline (dedup, enrichment-text handling, hybrid extraction, and
//! persistence) against synthetic hits, avoiding live network calls.

use std::collections::HashMap;

use chrono::Utc;
use leadscout_core::core::config::{LeadscoutFileConfig, RuntimeConfig};
use leadscout_core::core::types::{Column, ColumnDataType, EnrichedHit, RawHit};
use leadscout_core::dedup::dedupe_hits;
use leadscout_core::extractor::extract_hybrid;
use leadscout_core::persister::{persist_one, PersistOutcome};
use leadscout_core::store::memory::MemoryStore;
use uuid::Uuid;

fn runtime_config(llm_api_key: Option<&str>, llm_base_url: &str) -> RuntimeConfig {
    LeadscoutFileConfig {
        llm_api_key: llm_api_key.map(|s| s.to_string()),
        llm_base_url: Some(llm_base_url.to_string()),
        ..Default::default()
    }
    .into_runtime()
}

fn rss_hit(title: &str, url: &str, snippet: &str) -> RawHit {
    RawHit {
        title: title.to_string(),
        url: url.to_string(),
        snippet: snippet.to_string(),
        source: "Industry Wire".to_string(),
        published_date: Utc::now(),
        engine: "rss".to_string(),
        url_verified: true,
        author: None,
        image_url: None,
        api_source: None,
    }
}

/// Scenario 1: a single RSS hit with a rich snippet flows through dedup,
/// hybrid pattern extraction, and persistence into a saved lead.
#[tokio::test]
async fn single_source_rss_hit_is_saved_as_a_lead() {
    let hit = rss_hit(
        "Marriott International Announces Downtown Hotel",
        "https://example-industry-wire.test/articles/marriott-downtown",
        "Marriott International announces a new 220-room hotel in Miami, FL valued at $50 million, \
         expected to break ground Q2 2027. Contact Jane Smith, Director of Development at jane@example.com.",
    );
    let (deduped, dropped) = dedupe_hits(vec![hit]);
    assert_eq!(dropped, 0);
    assert_eq!(deduped.len(), 1);

    let enriched = EnrichedHit {
        article_text: String::new(),
        extracted_at: Utc::now(),
        hit: deduped[0].clone(),
    };
    let cfg = runtime_config(None, "https://api.deepseek.com/v1");
    let client = reqwest::Client::new();
    let extracted = extract_hybrid(
        &client,
        &cfg,
        &enriched.hit.snippet,
        &["hotel".to_string()],
        &[],
        false,
        false,
    )
    .await;
    assert_eq!(extracted.company.as_deref(), Some("Marriott International"));
    assert_eq!(extracted.budget, Some(50_000_000));

    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    store.register_user(user_id).await;

    match persist_one(store.as_ref(), user_id, &enriched, extracted, &[], &["hotel".to_string()]).await {
        PersistOutcome::Saved(lead) => {
            assert_eq!(lead.company, "Marriott International");
            assert!(lead.check_invariants().is_ok());
        }
        _ => panic!("expected Saved, got a different outcome"),
    }
}

/// Scenario 2: the same story reported by two different source adapters
/// (different query params, same canonical URL) collapses to one hit.
#[tokio::test]
async fn duplicate_hits_across_adapters_collapse_to_one() {
    let hits = vec![
        rss_hit(
            "Hyatt Breaks Ground on New Resort",
            "https://example-biz-journal.test/news/hyatt-resort?utm_source=rss",
            "short",
        ),
        RawHit {
            source: "DuckDuckGo HTML Search".to_string(),
            engine: "html_search".to_string(),
            ..rss_hit(
                "Hyatt Breaks Ground on New Resort",
                "https://example-biz-journal.test/news/hyatt-resort?utm_source=search",
                "short",
            )
        },
    ];
    let (deduped, dropped) = dedupe_hits(hits);
    assert_eq!(deduped.len(), 1);
    assert_eq!(dropped, 1);
}

/// Scenario 3: low pattern confidence with AI disabled stays pattern-only —
/// no LLM call is attempted and `ai_used` stays false.
#[tokio::test]
async fn low_confidence_without_ai_flag_stays_pattern_only() {
    let cfg = runtime_config(Some("fake-key"), "https://api.deepseek.com/v1");
    let client = reqwest::Client::new();
    let extracted = extract_hybrid(&client, &cfg, "Nothing useful in this sentence.", &[], &[], false, false).await;
    assert!(!extracted.ai_used);
}

/// Scenario 4: the LLM endpoint is unreachable — extraction degrades to the
/// pattern-only result instead of failing the whole hit.
#[tokio::test]
async fn llm_failure_falls_back_to_pattern_result() {
    let cfg = runtime_config(Some("fake-key"), "http://127.0.0.1:1");
    let client = reqwest::Client::new();
    let text = "Hilton announces a new hotel in Miami, FL valued at $10 million.";
    let extracted = extract_hybrid(&client, &cfg, text, &[], &[], true, false).await;
    assert!(!extracted.ai_used);
    assert_eq!(extracted.company.as_deref(), Some("Hilton"));
}

/// Scenario 5: a provider returning repeated blocked responses is disabled
/// by the health monitor after the configured failure threshold.
#[tokio::test]
async fn blocked_provider_is_disabled_after_threshold() {
    use leadscout_core::health_monitor::{EngineStatusKind, HealthMonitor};

    let health = HealthMonitor::new(3, 50);
    for _ in 0..3 {
        health.record_failure("bing_news", "403 forbidden").await;
    }
    let status = health.engine_status("bing_news").await.unwrap();
    assert_eq!(status.status, EngineStatusKind::Disabled);
}

/// Scenario 6: a custom "n/a" field is dropped while a well-formed numeric
/// custom field is coerced and persisted.
#[tokio::test]
async fn custom_column_coercion_drops_na_and_keeps_numeric() {
    let user_id = Uuid::new_v4();
    let columns = vec![
        Column {
            id: Uuid::new_v4(),
            user_id,
            field_key: "room_count".to_string(),
            data_type: ColumnDataType::Number,
            description: "Room Count".to_string(),
            is_visible: true,
        },
        Column {
            id: Uuid::new_v4(),
            user_id,
            field_key: "valet_parking".to_string(),
            data_type: ColumnDataType::Text,
            description: "Valet Parking".to_string(),
            is_visible: true,
        },
    ];

    let mut custom_fields = HashMap::new();
    custom_fields.insert(
        "room_count".to_string(),
        leadscout_core::core::types::ExtractedValue::Str("220 rooms".to_string()),
    );
    custom_fields.insert(
        "valet_parking".to_string(),
        leadscout_core::core::types::ExtractedValue::Str("n/a".to_string()),
    );

    let extracted = leadscout_core::core::types::ExtractedData {
        custom_fields,
        ..Default::default()
    };

    let hit = rss_hit("Generic Hotel Opening", "https://example-industry-wire.test/a/b", "text");
    let enriched = EnrichedHit {
        article_text: String::new(),
        extracted_at: Utc::now(),
        hit,
    };

    let store = MemoryStore::new();
    store.register_user(user_id).await;

    match persist_one(store.as_ref(), user_id, &enriched, extracted, &columns, &[]).await {
        PersistOutcome::Saved(lead) => {
            assert!(!lead.custom_fields.contains_key("valet_parking"));
            assert_eq!(
                lead.custom_fields.get("room_count"),
                Some(&leadscout_core::core::types::ExtractedValue::Number(220.0))
            );
        }
        _ => panic!("expected Saved outcome"),
    }
}
