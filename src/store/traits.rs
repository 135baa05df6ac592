//! Repository interfaces (Design Notes §9): replace the Sequelize-style ORM
//! models with explicit traits exposing only the operations the core needs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::types::{Column, Contact, Lead, LeadSource, LeadSourceType, Tag};

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn find_config(&self, user_id: Uuid) -> Option<crate::core::types::Config>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> bool;
}

#[async_trait]
pub trait ColumnStore: Send + Sync {
    async fn find_visible_by_user(&self, user_id: Uuid) -> Vec<Column>;
    async fn create_default_columns(&self, user_id: Uuid) -> Vec<Column>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn find_by_normalized_url(&self, user_id: Uuid, normalized_url: &str) -> Option<Lead>;
    /// Every lead owned by `user_id`, for the title-similarity and
    /// URL-prefix duplicate fallback checks (§4.8 step 2).
    async fn find_by_user(&self, user_id: Uuid) -> Vec<Lead>;
    async fn insert_lead(&self, lead: Lead) -> Lead;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn bulk_create_from_extraction(&self, contacts: Vec<Contact>) -> Vec<Contact>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_or_create_by_name(&self, name: &str, category: crate::core::types::TagCategory) -> Tag;
}

#[async_trait]
pub trait LeadSourceRepository: Send + Sync {
    async fn find_or_create(&self, name: &str, url: &str, source_type: LeadSourceType) -> LeadSource;
}
