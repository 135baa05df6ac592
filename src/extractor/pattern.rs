//! Deterministic pattern/dictionary extraction pass (C7 step 1).
//!
//! Generalized from the teacher's `extract.rs` regex toolkit
//! (`extract_emails`, `extract_phones`, `extract_price`,
//! `extract_date_from_content`, `extract_number_near_keyword`,
//! `extract_text_near_keyword`) onto the spec's field set.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::types::{ContactInfo, ExtractedData};

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap())
}

fn price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\$\s?([\d,.]+)\s*(thousand|million|billion|k|m|b)?").unwrap()
    })
}

fn company_action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Z][A-Za-z&'.]+(?: [A-Z][A-Za-z&'.]+){0,3}) (?:announces|plans|develops|unveils|breaks ground on)").unwrap()
    })
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:in|at|near) ([A-Z][a-zA-Z]+(?: [A-Z][a-zA-Z]+)*)|([A-Z][a-zA-Z]+(?: [A-Z][a-zA-Z]+)*), ([A-Z]{2})\b").unwrap()
    })
}

fn timeline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bQ[1-4]\s+\d{4}\b|\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4}\b|\b(20\d{2})\b").unwrap())
}

fn contact_name_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Z][a-z]+ [A-Z][a-z]+),\s+([A-Z][A-Za-z ]{2,30})").unwrap()
    })
}

const STOP_WORDS: &[&str] = &["the", "new", "first", "major", "a", "an"];

const KNOWN_CHAINS: &[&str] = &["Marriott", "Hilton", "Hyatt", "Wyndham", "IHG", "Accor"];

const LARGE_CITIES: &[&str] = &[
    "New York", "Los Angeles", "Chicago", "Miami", "Houston", "Phoenix", "Dallas", "Atlanta",
];

fn number_near_keyword(text: &str, keyword: &str) -> Option<i64> {
    let re = Regex::new(&format!(r"(?i)(\d[\d,]*)\s*(?:{})", regex::escape(keyword))).ok()?;
    let caps = re.captures(text)?;
    caps.get(1)?.as_str().replace(',', "").parse().ok()
}

fn extract_company(text: &str) -> Option<String> {
    if let Some(caps) = company_action_re().captures(text) {
        let candidate = caps.get(1)?.as_str().trim();
        if !STOP_WORDS.contains(&candidate.to_ascii_lowercase().as_str()) {
            return Some(candidate.to_string());
        }
    }
    for chain in KNOWN_CHAINS {
        if text.contains(chain) {
            return Some(chain.to_string());
        }
    }
    None
}

fn extract_location(text: &str) -> Option<String> {
    if let Some(caps) = location_re().captures(text) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            return Some(m.as_str().to_string());
        }
    }
    for city in LARGE_CITIES {
        if text.contains(city) {
            return Some(city.to_string());
        }
    }
    None
}

fn parse_price_to_dollars(amount: &str, suffix: Option<&str>) -> Option<i64> {
    let cleaned: String = amount.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let base: f64 = cleaned.parse().ok()?;
    let multiplier = match suffix.map(|s| s.to_ascii_lowercase()) {
        Some(s) if s == "k" || s == "thousand" => 1_000.0,
        Some(s) if s == "m" || s == "million" => 1_000_000.0,
        Some(s) if s == "b" || s == "billion" => 1_000_000_000.0,
        _ => 1.0,
    };
    Some((base * multiplier) as i64)
}

fn extract_budget(text: &str) -> Option<i64> {
    let caps = price_re().captures(text)?;
    let amount = caps.get(1)?.as_str();
    let suffix = caps.get(2).map(|m| m.as_str());
    parse_price_to_dollars(amount, suffix)
}

fn extract_timeline(text: &str) -> Option<String> {
    timeline_re().find(text).map(|m| m.as_str().to_string())
}

fn extract_contact_info(text: &str) -> ContactInfo {
    let email = email_re().find(text).map(|m| m.as_str().to_string());
    let phone = phone_re().find(text).map(|m| m.as_str().to_string());
    let (name, title) = contact_name_title_re()
        .captures(text)
        .map(|c| (Some(c[1].to_string()), Some(c[2].trim().to_string())))
        .unwrap_or((None, None));

    ContactInfo {
        name,
        email,
        phone,
        title,
        company: None,
    }
}

/// Up to N=3 distinct contact dicts (distinct email/phone pairs), extracted
/// independently of which field pass produced the primary contact.
fn extract_contacts(text: &str, max_n: usize) -> Vec<ContactInfo> {
    let emails: Vec<&str> = email_re().find_iter(text).map(|m| m.as_str()).collect();
    let phones: Vec<&str> = phone_re().find_iter(text).map(|m| m.as_str()).collect();

    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let max_len = emails.len().max(phones.len());
    for i in 0..max_len {
        if out.len() >= max_n {
            break;
        }
        let email = emails.get(i).map(|s| s.to_string());
        let phone = phones.get(i).map(|s| s.to_string());
        if email.is_none() && phone.is_none() {
            continue;
        }
        let key = (email.clone(), phone.clone());
        if !seen.insert(key) {
            continue;
        }
        out.push(ContactInfo {
            name: None,
            email,
            phone,
            title: None,
            company: None,
        });
    }
    out
}

/// Run the full pattern pass over `text`, scoring confidence by how many
/// expected fields were populated with a non-"Unknown" value.
pub fn extract(text: &str, input_keywords: &[String]) -> ExtractedData {
    let company = extract_company(text);
    let location = extract_location(text);
    let budget = extract_budget(text);
    let timeline = extract_timeline(text);
    let project_type = keyword_field(text, &["hotel", "resort", "office", "retail", "residential", "mixed-use"]);
    let room_count = number_near_keyword(text, "rooms");
    let square_footage = number_near_keyword(text, "square feet").or_else(|| number_near_keyword(text, "sq ft"));
    let employees = number_near_keyword(text, "employees");
    let contact_info = extract_contact_info(text);
    let contacts = extract_contacts(text, 3);

    let matched_keywords: Vec<String> = input_keywords
        .iter()
        .filter(|k| text.to_ascii_lowercase().contains(&k.to_ascii_lowercase()))
        .cloned()
        .collect();

    let populated = [
        company.is_some(),
        location.is_some(),
        budget.is_some(),
        timeline.is_some(),
        project_type.is_some(),
        !contact_info.is_empty(),
    ];
    let confidence = (populated.iter().filter(|b| **b).count() as f64 / populated.len() as f64 * 100.0) as u8;

    ExtractedData {
        company,
        location,
        project_type,
        budget,
        timeline,
        industry_type: None,
        description: None,
        room_count,
        square_footage,
        employees,
        status: None,
        priority: None,
        keywords: matched_keywords,
        contact_info,
        contacts,
        confidence,
        ai_used: false,
        custom_fields: Default::default(),
    }
}

fn keyword_field(text: &str, candidates: &[&str]) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    candidates.iter().find(|c| lower.contains(**c)).map(|c| c.to_string())
}
