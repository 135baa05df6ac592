//! In-memory repository implementations: back the test suite and the
//! demonstration binary. A real deployment wires its own SQL-backed
//! implementation of the `store::traits` interfaces outside this crate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::types::{Column, ColumnDataType, Contact, Lead, LeadSource, LeadSourceType, Tag, TagCategory};
use crate::url_validator::normalize;

use super::traits::{ColumnStore, ContactRepository, LeadRepository, LeadSourceRepository, TagRepository, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    pub users: RwLock<std::collections::HashSet<Uuid>>,
    pub columns: RwLock<HashMap<Uuid, Vec<Column>>>,
    pub leads: RwLock<Vec<Lead>>,
    pub contacts: RwLock<Vec<Contact>>,
    pub tags: RwLock<HashMap<String, Tag>>,
    pub lead_sources: RwLock<HashMap<String, LeadSource>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn register_user(&self, user_id: Uuid) {
        self.users.write().await.insert(user_id);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_exists(&self, user_id: Uuid) -> bool {
        self.users.read().await.contains(&user_id)
    }
}

#[async_trait]
impl ColumnStore for MemoryStore {
    async fn find_visible_by_user(&self, user_id: Uuid) -> Vec<Column> {
        self.columns
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.is_visible)
            .collect()
    }

    async fn create_default_columns(&self, user_id: Uuid) -> Vec<Column> {
        let defaults = vec![
            Column {
                id: Uuid::new_v4(),
                user_id,
                field_key: "contact_name".to_string(),
                data_type: ColumnDataType::Text,
                description: "Contact Name".to_string(),
                is_visible: true,
            },
            Column {
                id: Uuid::new_v4(),
                user_id,
                field_key: "contact_email".to_string(),
                data_type: ColumnDataType::Email,
                description: "Contact Email".to_string(),
                is_visible: true,
            },
            Column {
                id: Uuid::new_v4(),
                user_id,
                field_key: "contact_phone".to_string(),
                data_type: ColumnDataType::Phone,
                description: "Contact Phone".to_string(),
                is_visible: true,
            },
        ];
        self.columns.write().await.insert(user_id, defaults.clone());
        defaults
    }
}

#[async_trait]
impl LeadRepository for MemoryStore {
    async fn find_by_normalized_url(&self, user_id: Uuid, normalized_url: &str) -> Option<Lead> {
        self.leads
            .read()
            .await
            .iter()
            .find(|l| l.user_id == user_id && normalize(&l.url).as_deref() == Some(normalized_url))
            .cloned()
    }

    async fn find_by_user(&self, user_id: Uuid) -> Vec<Lead> {
        self.leads.read().await.iter().filter(|l| l.user_id == user_id).cloned().collect()
    }

    async fn insert_lead(&self, lead: Lead) -> Lead {
        self.leads.write().await.push(lead.clone());
        lead
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn bulk_create_from_extraction(&self, contacts: Vec<Contact>) -> Vec<Contact> {
        self.contacts.write().await.extend(contacts.clone());
        contacts
    }
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn find_or_create_by_name(&self, name: &str, category: TagCategory) -> Tag {
        let key = name.to_ascii_lowercase();
        let mut tags = self.tags.write().await;
        if let Some(existing) = tags.get_mut(&key) {
            existing.usage_count += 1;
            return existing.clone();
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: key.clone(),
            category,
            usage_count: 1,
            is_system: false,
        };
        tags.insert(key, tag.clone());
        tag
    }
}

#[async_trait]
impl LeadSourceRepository for MemoryStore {
    async fn find_or_create(&self, name: &str, url: &str, source_type: LeadSourceType) -> LeadSource {
        let mut sources = self.lead_sources.write().await;
        if let Some(existing) = sources.get(name) {
            return existing.clone();
        }
        let source = LeadSource {
            id: Uuid::new_v4(),
            name: name.to_string(),
            url: url.to_string(),
            source_type,
        };
        sources.insert(name.to_string(), source.clone());
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_or_create_tag_is_idempotent_by_name() {
        let store = MemoryStore::new();
        let a = store.find_or_create_by_name("Hotel", TagCategory::Industry).await;
        let b = store.find_or_create_by_name("hotel", TagCategory::Industry).await;
        assert_eq!(a.id, b.id);
        assert_eq!(b.usage_count, 2);
    }

    #[tokio::test]
    async fn default_columns_seed_contact_fields() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let cols = store.create_default_columns(user_id).await;
        assert_eq!(cols.len(), 3);
    }
}
