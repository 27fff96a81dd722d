//! Database models for roles.

use crate::types::{ActorId, RoleId, Status};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Database request for creating a role
#[derive(Debug, Clone)]
pub struct RoleCreateDBRequest {
    pub role_name: String,
    pub role_details: Value,
    pub created_by: Option<ActorId>,
}

impl RoleCreateDBRequest {
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            role_details: Value::Array(vec![]),
            created_by: None,
        }
    }
}

/// Database response for a role
#[derive(Debug, Clone, PartialEq)]
pub struct RoleDBResponse {
    pub role_id: RoleId,
    pub role_name: String,
    pub role_details: Value,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}
