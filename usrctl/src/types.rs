//! Common type definitions shared by the API and database layers.
//!
//! # ID Types
//!
//! Entities carry two identifiers:
//!
//! - an **external id** (UUID) generated at creation time and used in every API surface:
//!   [`ProfileId`], [`RoleId`], [`CredentialId`]
//! - a **surrogate key** (`SERIAL`) assigned by PostgreSQL and used only for joins and
//!   foreign keys: [`ProfileNo`], [`RoleNo`]
//!
//! Surrogate keys never leave the database layer.
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

// External identifiers
pub type ProfileId = Uuid;
pub type RoleId = Uuid;
pub type CredentialId = Uuid;

// Store-assigned surrogate keys
pub type ProfileNo = i32;
pub type RoleNo = i32;

/// Actor identifier recorded in `created_by` / `updated_by`
pub type ActorId = i32;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Lifecycle status of roles, profiles and credentials.
///
/// Stored as the single-letter `status_enum` PostgreSQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_enum")]
pub enum Status {
    #[sqlx(rename = "A")]
    #[serde(rename = "A")]
    Active,
    #[sqlx(rename = "I")]
    #[serde(rename = "I")]
    Inactive,
    #[sqlx(rename = "D")]
    #[serde(rename = "D")]
    Deleted,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "A",
            Status::Inactive => "I",
            Status::Deleted => "D",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Status::Active),
            "I" => Ok(Status::Inactive),
            "D" => Ok(Status::Deleted),
            other => Err(format!("Invalid status '{other}', expected one of A, I, D")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("A".parse::<Status>().unwrap(), Status::Active);
        assert_eq!(" i ".parse::<Status>().unwrap(), Status::Inactive);
        assert_eq!("d".parse::<Status>().unwrap(), Status::Deleted);
        assert!("X".parse::<Status>().is_err());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_serde_uses_single_letter() {
        assert_eq!(serde_json::to_string(&Status::Active).unwrap(), "\"A\"");
        let parsed: Status = serde_json::from_str("\"D\"").unwrap();
        assert_eq!(parsed, Status::Deleted);
    }
}
