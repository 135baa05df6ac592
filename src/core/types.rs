use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Config (input)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default = "default_max_results")]
    pub max_results_per_run: usize,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub extraction_rules: HashMap<String, String>,
    #[serde(default)]
    pub frequency_hint: Option<String>,
    #[serde(default)]
    pub use_ai: bool,
    #[serde(default)]
    pub smart_mode: bool,
}

fn default_max_results() -> usize {
    100
}

impl Config {
    /// Validate keyword-count bounds per spec §8 boundary behaviors.
    /// Returns the FatalConfig reason when invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.keywords.is_empty() {
            return Err("no keywords provided".to_string());
        }
        if self.keywords.len() > 20 {
            return Err("too many keywords (max 20)".to_string());
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err("empty keyword in keyword list".to_string());
        }
        if self.max_results_per_run == 0 || self.max_results_per_run > 1000 {
            return Err("max_results_per_run must be in 1..=1000".to_string());
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RawHit / EnrichedHit
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
    pub published_date: DateTime<Utc>,
    pub engine: String,
    pub url_verified: bool,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub api_source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedHit {
    pub hit: RawHit,
    pub article_text: String,
    pub extracted_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ExtractedValue — open map value union (Design Notes §9)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExtractedValue {
    Str(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    List(Vec<String>),
}

impl ExtractedValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExtractedValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ExtractedValue::Str(s) if s.eq_ignore_ascii_case("unknown") || s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedData {
    pub company: Option<String>,
    pub location: Option<String>,
    pub project_type: Option<String>,
    pub budget: Option<i64>,
    pub timeline: Option<String>,
    pub industry_type: Option<String>,
    pub description: Option<String>,
    pub room_count: Option<i64>,
    pub square_footage: Option<i64>,
    pub employees: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub keywords: Vec<String>,
    pub contact_info: ContactInfo,
    pub contacts: Vec<ContactInfo>,
    pub confidence: u8,
    pub ai_used: bool,
    /// Custom-column field-keys, added dynamically per user's `Column` set.
    pub custom_fields: HashMap<String, ExtractedValue>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Lead / Contact / LeadSource / Column / Tag (persistent)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Won,
    Lost,
    Archived,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Ai,
    Manual,
    Template,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualification {
    #[default]
    Unqualified,
    Qualified,
    HighlyQualified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub lead_source_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub company: String,
    pub contact_info: ContactInfo,
    pub project_type: Option<String>,
    pub location: Option<String>,
    pub budget: Option<i64>,
    pub timeline: Option<String>,
    pub industry_type: Option<String>,
    pub keywords: Vec<String>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub custom_fields: HashMap<String, ExtractedValue>,
    pub confidence: u8,
    pub extraction_method: ExtractionMethod,
    pub score: u8,
    pub qualification: Qualification,
    pub published_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Lead {
    /// Spec §3 invariants, checked eagerly at construction time.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.confidence > 100 {
            return Err("confidence must be 0..=100".to_string());
        }
        if self.score > 100 {
            return Err("score must be 0..=100".to_string());
        }
        if self.url.is_empty() {
            return Err("url must be non-empty".to_string());
        }
        if url::Url::parse(&self.url).is_err() {
            return Err(format!("url does not parse: {}", self.url));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: uuid::Uuid,
    pub lead_id: uuid::Uuid,
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub contact_type: ContactType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSourceType {
    Website,
    SocialMedia,
    NewsSite,
    JobBoard,
    RssFeed,
    Api,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSource {
    pub id: uuid::Uuid,
    pub name: String,
    pub url: String,
    pub source_type: LeadSourceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDataType {
    Text,
    Email,
    Phone,
    Url,
    Number,
    Currency,
    Boolean,
    Date,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub field_key: String,
    pub data_type: ColumnDataType,
    pub description: String,
    pub is_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    Industry,
    Status,
    Priority,
    Location,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: uuid::Uuid,
    pub name: String,
    pub category: TagCategory,
    pub usage_count: u64,
    pub is_system: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Job result / errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobErrorEntry {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub total_results: usize,
    pub saved_leads: usize,
    pub leads: Vec<Lead>,
    pub errors: Vec<JobErrorEntry>,
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: String,
    pub stage: String,
    pub progress: u64,
    pub total: u64,
    pub percentage: u8,
    pub message: String,
}
