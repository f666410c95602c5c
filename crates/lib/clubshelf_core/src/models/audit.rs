// @awa-component: AUD-AdminAction
//
//! Administrative audit records.
//!
//! Records are append-only. They are created exactly once per successful
//! administrative command and never edited afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the administrator did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Edit,
    Delete,
    Publish,
    Unpublish,
}

/// Which aggregate the action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Material,
    Category,
    Tag,
    Subscription,
    Loyalty,
    Referral,
}

impl EntityKind {
    /// Content entities managed by the external CRUD surface.
    pub fn is_content(self) -> bool {
        matches!(self, Self::Material | Self::Category | Self::Tag)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
        };
        f.write_str(s)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Material => "material",
            Self::Category => "category",
            Self::Tag => "tag",
            Self::Subscription => "subscription",
            Self::Loyalty => "loyalty",
            Self::Referral => "referral",
        };
        f.write_str(s)
    }
}

/// The administrator performing a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
}

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAction {
    /// UUIDv7, so ids sort by creation time.
    pub id: Uuid,
    pub actor: Actor,
    pub action: ActionKind,
    pub entity: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_title: Option<String>,
    #[serde(default)]
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl AdminAction {
    pub fn new(
        actor: Actor,
        action: ActionKind,
        entity: EntityKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor,
            action,
            entity,
            entity_id: None,
            entity_title: None,
            details: String::new(),
            created_at,
        }
    }

    pub fn with_entity(mut self, id: Option<i64>, title: Option<String>) -> Self {
        self.entity_id = id;
        self.entity_title = title;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// Sort audit entries for display: newest first, id as tie-breaker.
pub fn newest_first(actions: &mut [AdminAction]) {
    actions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
