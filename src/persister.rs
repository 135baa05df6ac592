//! Persister (C8): find-or-create `LeadSource`, duplicate detection, enum
//! mapping, tag/contact attachment, and progress emission.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::core::types::{
    Column, Contact, ContactType, EnrichedHit, ExtractedData, Lead, LeadPriority, LeadSourceType, LeadStatus,
    Qualification,
};
use crate::dedup::{jaccard, path_prefix, tokenize};
use crate::extractor::coerce;
use crate::progress_bus::ProgressBus;
use crate::store::traits::{ContactRepository, LeadRepository, LeadSourceRepository, TagRepository};
use crate::url_validator::{extract_domain, normalize};

/// Title-similarity fallback threshold (§4.8 step 2).
const TITLE_SIMILARITY_THRESHOLD: f64 = 0.8;
/// Leading characters compared before the similarity check runs at all.
const TITLE_PREFIX_LEN: usize = 20;

type UserUrlKey = (Uuid, String);

/// Per-`(user_id, normalized_url)` critical section bracketing the
/// duplicate check and the insert, so two concurrent jobs for the same user
/// can't both pass the check before either inserts (§5).
static USER_URL_LOCKS: OnceLock<std::sync::Mutex<HashMap<UserUrlKey, Arc<AsyncMutex<()>>>>> = OnceLock::new();

async fn lock_user_url(user_id: Uuid, normalized_url: &str) -> OwnedMutexGuard<()> {
    let registry = USER_URL_LOCKS.get_or_init(|| std::sync::Mutex::new(HashMap::new()));
    let entry = {
        let mut map = registry.lock().expect("user/url lock registry poisoned");
        map.entry((user_id, normalized_url.to_string()))
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    };
    entry.lock_owned().await
}

/// True if `candidate` duplicates any of `existing` by title similarity
/// (shared 20-char prefix, Jaccard ≥0.8) or by same-host/same-first-segment
/// URL prefix — the two fallback checks behind the exact-URL match (§4.8).
fn matches_existing_lead(candidate_title: &str, candidate_normalized_url: &str, existing: &[Lead]) -> bool {
    let candidate_prefix: String = candidate_title.to_ascii_lowercase().chars().take(TITLE_PREFIX_LEN).collect();
    let candidate_tokens = tokenize(candidate_title);
    let candidate_domain = extract_domain(candidate_normalized_url);
    let candidate_path_prefix = path_prefix(candidate_normalized_url);

    existing.iter().any(|lead| {
        let lead_prefix: String = lead.title.to_ascii_lowercase().chars().take(TITLE_PREFIX_LEN).collect();
        let title_match = !candidate_prefix.is_empty()
            && candidate_prefix == lead_prefix
            && jaccard(&candidate_tokens, &tokenize(&lead.title)) >= TITLE_SIMILARITY_THRESHOLD;

        let url_match = normalize(&lead.url).is_some_and(|lead_normalized| {
            candidate_domain.is_some()
                && candidate_domain == extract_domain(&lead_normalized)
                && candidate_path_prefix == path_prefix(&lead_normalized)
        });

        title_match || url_match
    })
}

fn derive_source_type(source_name: &str, url: &str) -> LeadSourceType {
    let lower_name = source_name.to_ascii_lowercase();
    let host = extract_domain(url).unwrap_or_default();

    if lower_name.contains("rss") || lower_name.contains("feed") {
        LeadSourceType::RssFeed
    } else if lower_name.contains("news") {
        LeadSourceType::NewsSite
    } else if host.contains("facebook") || host.contains("twitter") || host.contains("x.com") || host.contains("linkedin") {
        LeadSourceType::SocialMedia
    } else if host.contains("indeed") || host.contains("linkedin.com/jobs") || lower_name.contains("job") {
        LeadSourceType::JobBoard
    } else if host.contains("api.") || lower_name.contains("api") {
        LeadSourceType::Api
    } else if lower_name.is_empty() {
        LeadSourceType::Other
    } else {
        LeadSourceType::Website
    }
}

fn map_status(extracted_status: Option<&str>) -> LeadStatus {
    match extracted_status.map(|s| s.to_ascii_lowercase()) {
        Some(s) if matches!(s.as_str(), "proposed" | "planning" | "announced") => LeadStatus::New,
        Some(s) if matches!(s.as_str(), "under_construction" | "in_progress") => LeadStatus::Qualified,
        Some(s) if s == "completed" => LeadStatus::Won,
        Some(s) if matches!(s.as_str(), "cancelled" | "on_hold") => LeadStatus::Lost,
        _ => LeadStatus::New,
    }
}

fn map_priority(extracted_priority: Option<&str>) -> LeadPriority {
    match extracted_priority.map(|s| s.to_ascii_lowercase()) {
        Some(s) if s == "low" => LeadPriority::Low,
        Some(s) if s == "high" => LeadPriority::High,
        Some(s) if s == "urgent" => LeadPriority::Urgent,
        _ => LeadPriority::Medium,
    }
}

pub enum PersistOutcome {
    Saved(Lead),
    Duplicate,
    ValidationError(String),
}

/// Persist one enriched+extracted hit. Never propagates an error upward — a
/// validation failure is logged and the job continues with the next hit.
#[allow(clippy::too_many_arguments)]
pub async fn persist_one<S>(
    store: &S,
    user_id: Uuid,
    hit: &EnrichedHit,
    extracted: ExtractedData,
    columns: &[Column],
    config_keywords: &[String],
) -> PersistOutcome
where
    S: LeadRepository + LeadSourceRepository + TagRepository + ContactRepository + Send + Sync,
{
    let source_type = derive_source_type(&hit.hit.source, &hit.hit.url);
    let lead_source = store
        .find_or_create(&hit.hit.source, &hit.hit.url, source_type)
        .await;

    let Some(normalized_url) = normalize(&hit.hit.url) else {
        return PersistOutcome::ValidationError(format!("url does not normalize: {}", hit.hit.url));
    };

    let _lock = lock_user_url(user_id, &normalized_url).await;

    if store.find_by_normalized_url(user_id, &normalized_url).await.is_some() {
        return PersistOutcome::Duplicate;
    }

    let existing = store.find_by_user(user_id).await;
    if matches_existing_lead(&hit.hit.title, &normalized_url, &existing) {
        return PersistOutcome::Duplicate;
    }

    let mut custom_fields = std::collections::HashMap::new();
    for column in columns {
        if let Some(raw) = extracted.custom_fields.get(&column.field_key).and_then(|v| v.as_str()) {
            if let Some(coerced) = coerce(raw, column.data_type) {
                custom_fields.insert(column.field_key.clone(), coerced);
            }
        }
    }

    let company = extracted
        .company
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| {
            hit.hit
                .title
                .split_whitespace()
                .next()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Unknown".to_string())
        });

    let mut keywords: Vec<String> = config_keywords
        .iter()
        .cloned()
        .chain(extracted.keywords.iter().cloned())
        .collect();
    keywords.sort();
    keywords.dedup();

    let extraction_method = if extracted.ai_used {
        crate::core::types::ExtractionMethod::Ai
    } else {
        crate::core::types::ExtractionMethod::Manual
    };

    let lead = Lead {
        id: Uuid::new_v4(),
        user_id,
        lead_source_id: lead_source.id,
        title: hit.hit.title.clone(),
        description: extracted.description.clone(),
        url: hit.hit.url.clone(),
        company,
        contact_info: extracted.contact_info.clone(),
        project_type: extracted.project_type.clone(),
        location: extracted.location.clone(),
        budget: extracted.budget,
        timeline: extracted.timeline.clone(),
        industry_type: extracted.industry_type.clone(),
        keywords,
        status: map_status(extracted.status.as_deref()),
        priority: map_priority(extracted.priority.as_deref()),
        custom_fields,
        confidence: extracted.confidence.min(100),
        extraction_method,
        score: 0,
        qualification: Qualification::default(),
        published_at: hit.hit.published_date,
        scraped_at: hit.extracted_at,
        notes: None,
    };

    if let Err(e) = lead.check_invariants() {
        return PersistOutcome::ValidationError(e);
    }

    let lead = store.insert_lead(lead).await;

    let mut tag_names: HashSet<String> = lead.keywords.iter().map(|k| k.to_ascii_lowercase()).collect();
    for name in tag_names.drain().take(5) {
        store.find_or_create_by_name(&name, crate::core::types::TagCategory::Custom).await;
    }

    if !extracted.contact_info.is_empty() {
        let contact = Contact {
            id: Uuid::new_v4(),
            lead_id: lead.id,
            name: extracted.contact_info.name.clone(),
            title: extracted.contact_info.title.clone(),
            email: extracted.contact_info.email.clone(),
            phone: extracted.contact_info.phone.clone(),
            company: extracted.contact_info.company.clone(),
            contact_type: ContactType::Primary,
        };
        store.bulk_create_from_extraction(vec![contact]).await;
    }
    for extra in extracted.contacts.iter().filter(|c| !c.is_empty()) {
        let contact = Contact {
            id: Uuid::new_v4(),
            lead_id: lead.id,
            name: extra.name.clone(),
            title: extra.title.clone(),
            email: extra.email.clone(),
            phone: extra.phone.clone(),
            company: extra.company.clone(),
            contact_type: ContactType::Secondary,
        };
        store.bulk_create_from_extraction(vec![contact]).await;
    }

    PersistOutcome::Saved(lead)
}

/// Persist every enriched+extracted hit in sequence, publishing a
/// `stage=saving` progress event per hit.
pub async fn persist_all<S>(
    store: Arc<S>,
    user_id: Uuid,
    items: Vec<(EnrichedHit, ExtractedData)>,
    columns: &[Column],
    config_keywords: &[String],
    progress: &ProgressBus,
    job_id: &str,
) -> (Vec<Lead>, Vec<crate::core::types::JobErrorEntry>)
where
    S: LeadRepository + LeadSourceRepository + TagRepository + ContactRepository + Send + Sync,
{
    let total = items.len() as u64;
    let mut saved = Vec::new();
    let mut errors = Vec::new();

    for (i, (hit, extracted)) in items.into_iter().enumerate() {
        let source = hit.hit.source.clone();
        match persist_one(store.as_ref(), user_id, &hit, extracted, columns, config_keywords).await {
            PersistOutcome::Saved(lead) => saved.push(lead),
            PersistOutcome::Duplicate => {}
            PersistOutcome::ValidationError(e) => {
                errors.push(crate::core::types::JobErrorEntry { source, error: e });
            }
        }
        progress
            .publish(job_id, "saving", (i + 1) as u64, total.max(1), "lead processed")
            .await;
    }

    (saved, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RawHit;
    use crate::store::memory::MemoryStore;

    fn hit(title: &str, url: &str) -> EnrichedHit {
        EnrichedHit {
            hit: RawHit {
                title: title.to_string(),
                url: url.to_string(),
                snippet: String::new(),
                source: "test".to_string(),
                published_date: chrono::Utc::now(),
                engine: "test".to_string(),
                url_verified: true,
                author: None,
                image_url: None,
                api_source: None,
            },
            article_text: String::new(),
            extracted_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn title_similarity_fallback_catches_reworded_duplicate() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let first = hit("Hotel Downtown Announces Major Expansion Project", "https://site-a.tld/articles/a");
        let outcome = persist_one(store.as_ref(), user_id, &first, ExtractedData::default(), &[], &[]).await;
        assert!(matches!(outcome, PersistOutcome::Saved(_)));

        let second = hit("Hotel Downtown Announces Major Expansion", "https://site-b.tld/news/x");
        let outcome = persist_one(store.as_ref(), user_id, &second, ExtractedData::default(), &[], &[]).await;
        assert!(matches!(outcome, PersistOutcome::Duplicate));
    }

    #[tokio::test]
    async fn url_prefix_fallback_catches_same_section_duplicate() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let first = hit("Completely Unrelated Headline About Finance", "https://site.tld/articles/a");
        let outcome = persist_one(store.as_ref(), user_id, &first, ExtractedData::default(), &[], &[]).await;
        assert!(matches!(outcome, PersistOutcome::Saved(_)));

        let second = hit("A Totally Different Story About Real Estate", "https://site.tld/articles/b");
        let outcome = persist_one(store.as_ref(), user_id, &second, ExtractedData::default(), &[], &[]).await;
        assert!(matches!(outcome, PersistOutcome::Duplicate));
    }

    #[tokio::test]
    async fn concurrent_persist_same_url_inserts_exactly_once() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let a = hit("Hotel X Opens Downtown", "https://site.tld/articles/a");
        let b = a.clone();

        let store_a = store.clone();
        let store_b = store.clone();
        let (r1, r2) = tokio::join!(
            persist_one(store_a.as_ref(), user_id, &a, ExtractedData::default(), &[], &[]),
            persist_one(store_b.as_ref(), user_id, &b, ExtractedData::default(), &[], &[])
        );

        let saved_count = [&r1, &r2]
            .iter()
            .filter(|o| matches!(o, PersistOutcome::Saved(_)))
            .count();
        assert_eq!(saved_count, 1);
        assert_eq!(store.leads.read().await.len(), 1);
    }

    #[test]
    fn maps_announced_to_new() {
        assert_eq!(map_status(Some("announced")), LeadStatus::New);
    }

    #[test]
    fn maps_in_progress_to_qualified() {
        assert_eq!(map_status(Some("in_progress")), LeadStatus::Qualified);
    }

    #[test]
    fn maps_completed_to_won() {
        assert_eq!(map_status(Some("completed")), LeadStatus::Won);
    }

    #[test]
    fn maps_unknown_to_new_default() {
        assert_eq!(map_status(None), LeadStatus::New);
    }

    #[test]
    fn derives_rss_feed_type_from_source_name() {
        assert_eq!(derive_source_type("Industry RSS", "https://e.test/feed"), LeadSourceType::RssFeed);
    }

    #[test]
    fn derives_website_as_default() {
        assert_eq!(derive_source_type("Some Source", "https://example.com/a"), LeadSourceType::Website);
    }
}
