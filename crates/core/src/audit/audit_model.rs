//! Audit domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::diff::ChangeRecord;

/// One audited mutation: who did what to which entity, with the
/// field-level changes the structural diff detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub changes: Vec<ChangeRecord>,
    pub user_id: String,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        ctx: &RequestContext,
        entity_type: &str,
        entity_id: &str,
        action: &str,
        changes: Vec<ChangeRecord>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            action: action.to_string(),
            changes,
            user_id: ctx.user_id.clone(),
            user_name: ctx.user_name.clone(),
            timestamp,
        }
    }
}
