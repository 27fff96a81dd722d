//! Database models for profiles and their credentials.
//!
//! The request records here also decide which of their optional fields are *present* and
//! turn them into a sparse [`FieldSet`]. Presence rules:
//!
//! - text: present iff non-empty after trimming (the trimmed value is written)
//! - date: present iff set
//! - role reference: present iff set and not the nil UUID
//! - address blob: present iff not null and not an empty object, array or string
//! - status: present iff set

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::api::models::profiles::{ProfileCreate, ProfileUpdate};
use crate::db::errors::{DbError, Result};
use crate::db::field_set::{CredentialColumn, FieldSet, FieldValue, ProfileColumn};
use crate::types::{ActorId, CredentialId, ProfileId, ProfileNo, RoleId, RoleNo, Status};

/// Database request for creating a profile together with its credential
#[derive(Debug, Clone)]
pub struct ProfileCreateDBRequest {
    pub role_id: RoleId,
    pub full_name: String,
    pub email: String,
    pub username: String,
    /// Plaintext secret; hashed inside the create transaction, never stored as given
    pub password: String,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub mobile_no: Option<String>,
    pub address: Option<Value>,
    pub status: Option<Status>,
    pub created_by: Option<ActorId>,
}

impl From<ProfileCreate> for ProfileCreateDBRequest {
    fn from(api: ProfileCreate) -> Self {
        Self {
            role_id: api.role_id,
            full_name: api.full_name,
            email: api.email,
            username: api.username,
            password: api.password,
            gender: api.gender,
            dob: api.dob,
            mobile_no: api.mobile_no,
            address: api.address,
            status: api.status,
            created_by: api.created_by,
        }
    }
}

impl ProfileCreateDBRequest {
    /// The role reference to resolve, if one was supplied
    pub fn role_reference(&self) -> Option<RoleId> {
        present_role(Some(self.role_id))
    }

    /// Build the profile row's field set.
    ///
    /// Always injects the new external id and the creation timestamp.
    pub fn profile_fields(&self, profile_id: ProfileId, role_no: Option<RoleNo>, created_at: DateTime<Utc>) -> FieldSet<ProfileColumn> {
        let mut fields = FieldSet::new();
        fields
            .set_opt(ProfileColumn::FullName, present_text(Some(&self.full_name)))
            .set_opt(ProfileColumn::RoleNo, role_no.map(FieldValue::Int))
            .set_opt(ProfileColumn::Email, present_text(Some(&self.email)))
            .set_opt(ProfileColumn::Gender, present_text(self.gender.as_ref()))
            .set_opt(ProfileColumn::Dob, self.dob.map(FieldValue::Date))
            .set_opt(ProfileColumn::MobileNo, present_text(self.mobile_no.as_ref()))
            .set_opt(ProfileColumn::Address, present_json(self.address.as_ref()))
            .set_opt(ProfileColumn::Status, self.status.map(FieldValue::Status))
            .set_opt(ProfileColumn::CreatedBy, self.created_by.map(FieldValue::Int))
            .set(ProfileColumn::ProfileId, FieldValue::Uuid(profile_id))
            .set(ProfileColumn::CreatedAt, FieldValue::Timestamp(created_at));
        fields
    }

    /// Build the credential row's field set, keyed by the profile's surrogate key.
    pub fn credential_fields(
        &self,
        credential_id: CredentialId,
        profile_no: ProfileNo,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> FieldSet<CredentialColumn> {
        let mut fields = FieldSet::new();
        fields
            .set(CredentialColumn::CredentialId, FieldValue::Uuid(credential_id))
            .set(CredentialColumn::ProfileNo, FieldValue::Int(profile_no))
            .set(CredentialColumn::Username, FieldValue::Text(self.username.trim().to_string()))
            .set(CredentialColumn::PasswordHash, FieldValue::Text(password_hash))
            .set(CredentialColumn::CreatedAt, FieldValue::Timestamp(created_at))
            .set_opt(CredentialColumn::CreatedBy, self.created_by.map(FieldValue::Int));
        fields
    }
}

/// Database request for a partial profile update
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateDBRequest {
    pub role_id: Option<RoleId>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub mobile_no: Option<String>,
    pub address: Option<Value>,
    pub status: Option<Status>,
    pub updated_by: Option<ActorId>,
}

impl From<ProfileUpdate> for ProfileUpdateDBRequest {
    fn from(api: ProfileUpdate) -> Self {
        Self {
            role_id: api.role_id,
            full_name: api.full_name,
            email: api.email,
            gender: api.gender,
            dob: api.dob,
            mobile_no: api.mobile_no,
            address: api.address,
            status: api.status,
            updated_by: api.updated_by,
        }
    }
}

impl ProfileUpdateDBRequest {
    /// The role reference to resolve, if one was supplied
    pub fn role_reference(&self) -> Option<RoleId> {
        present_role(self.role_id)
    }

    /// Whether any field would be written. Audit fields do not count.
    pub fn has_effective_fields(&self) -> bool {
        self.role_reference().is_some() || !self.effective_fields(None).is_empty()
    }

    fn effective_fields(&self, role_no: Option<RoleNo>) -> FieldSet<ProfileColumn> {
        let mut fields = FieldSet::new();
        fields
            .set_opt(ProfileColumn::FullName, present_text(self.full_name.as_ref()))
            .set_opt(ProfileColumn::RoleNo, role_no.map(FieldValue::Int))
            .set_opt(ProfileColumn::Email, present_text(self.email.as_ref()))
            .set_opt(ProfileColumn::Gender, present_text(self.gender.as_ref()))
            .set_opt(ProfileColumn::Dob, self.dob.map(FieldValue::Date))
            .set_opt(ProfileColumn::MobileNo, present_text(self.mobile_no.as_ref()))
            .set_opt(ProfileColumn::Address, present_json(self.address.as_ref()))
            .set_opt(ProfileColumn::Status, self.status.map(FieldValue::Status));
        fields
    }

    /// Build the SET clause field set, with the audit fields forced in.
    ///
    /// Fails with [`DbError::NoFieldsToUpdate`] when nothing effective is present.
    pub fn update_fields(&self, role_no: Option<RoleNo>, updated_at: DateTime<Utc>) -> Result<FieldSet<ProfileColumn>> {
        let mut fields = self.effective_fields(role_no);
        if fields.is_empty() {
            return Err(DbError::NoFieldsToUpdate);
        }
        fields
            .set(ProfileColumn::UpdatedAt, FieldValue::Timestamp(updated_at))
            .set_opt(ProfileColumn::UpdatedBy, self.updated_by.map(FieldValue::Int));
        Ok(fields)
    }
}

/// Database response for a profile joined with its role
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDBResponse {
    pub profile_id: ProfileId,
    pub role_id: RoleId,
    pub role_name: String,
    pub full_name: String,
    pub email: String,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub mobile_no: Option<String>,
    pub address: Value,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<ActorId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<ActorId>,
}

fn present_text(value: Option<&String>) -> Option<FieldValue> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| FieldValue::Text(s.to_string()))
}

fn present_json(value: Option<&Value>) -> Option<FieldValue> {
    let value = value?;
    let empty = match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    (!empty).then(|| FieldValue::Json(value.clone()))
}

fn present_role(role_id: Option<RoleId>) -> Option<RoleId> {
    role_id.filter(|id| !id.is_nil())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn create_request() -> ProfileCreateDBRequest {
        ProfileCreateDBRequest {
            role_id: Uuid::new_v4(),
            full_name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            username: "ann".to_string(),
            password: "pw123".to_string(),
            gender: Some("   ".to_string()),
            dob: None,
            mobile_no: Some(" 5550100 ".to_string()),
            address: Some(json!({})),
            status: None,
            created_by: None,
        }
    }

    #[test]
    fn test_create_fields_apply_presence_rules_and_inject_identity() {
        let request = create_request();
        let profile_id = Uuid::new_v4();
        let now = Utc::now();

        let fields = request.profile_fields(profile_id, Some(1), now);

        assert_eq!(fields.get(ProfileColumn::FullName), Some(&FieldValue::Text("Ann".to_string())));
        assert_eq!(fields.get(ProfileColumn::RoleNo), Some(&FieldValue::Int(1)));
        assert_eq!(fields.get(ProfileColumn::MobileNo), Some(&FieldValue::Text("5550100".to_string())));
        assert_eq!(fields.get(ProfileColumn::ProfileId), Some(&FieldValue::Uuid(profile_id)));
        assert_eq!(fields.get(ProfileColumn::CreatedAt), Some(&FieldValue::Timestamp(now)));
        // Blank gender, missing dob and empty address are absent, not null
        assert!(!fields.contains(ProfileColumn::Gender));
        assert!(!fields.contains(ProfileColumn::Dob));
        assert!(!fields.contains(ProfileColumn::Address));
        assert!(!fields.contains(ProfileColumn::Status));
    }

    #[test]
    fn test_credential_fields_reference_profile_surrogate_key() {
        let request = create_request();
        let credential_id = Uuid::new_v4();
        let now = Utc::now();

        let fields = request.credential_fields(credential_id, 42, "$argon2id$hash".to_string(), now);

        assert_eq!(fields.get(CredentialColumn::ProfileNo), Some(&FieldValue::Int(42)));
        assert_eq!(fields.get(CredentialColumn::Username), Some(&FieldValue::Text("ann".to_string())));
        assert_eq!(
            fields.get(CredentialColumn::PasswordHash),
            Some(&FieldValue::Text("$argon2id$hash".to_string()))
        );
        assert!(!fields.contains(CredentialColumn::CreatedBy));
    }

    #[test]
    fn test_nil_role_is_not_a_reference() {
        let mut request = create_request();
        request.role_id = Uuid::nil();
        assert_eq!(request.role_reference(), None);

        let update = ProfileUpdateDBRequest {
            role_id: Some(Uuid::nil()),
            ..Default::default()
        };
        assert_eq!(update.role_reference(), None);
        assert!(!update.has_effective_fields());
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let update = ProfileUpdateDBRequest {
            full_name: Some("".to_string()),
            gender: Some("  ".to_string()),
            address: Some(Value::Null),
            updated_by: Some(7),
            ..Default::default()
        };

        assert!(!update.has_effective_fields());
        assert!(matches!(update.update_fields(None, Utc::now()), Err(DbError::NoFieldsToUpdate)));
    }

    #[test]
    fn test_update_forces_audit_fields() {
        let update = ProfileUpdateDBRequest {
            status: Some(Status::Inactive),
            updated_by: Some(7),
            ..Default::default()
        };
        let now = Utc::now();

        assert!(update.has_effective_fields());
        let fields = update.update_fields(None, now).unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get(ProfileColumn::Status), Some(&FieldValue::Status(Status::Inactive)));
        assert_eq!(fields.get(ProfileColumn::UpdatedAt), Some(&FieldValue::Timestamp(now)));
        assert_eq!(fields.get(ProfileColumn::UpdatedBy), Some(&FieldValue::Int(7)));
    }

    #[test]
    fn test_role_only_update_counts_as_effective() {
        let update = ProfileUpdateDBRequest {
            role_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(update.has_effective_fields());

        let fields = update.update_fields(Some(3), Utc::now()).unwrap();
        assert_eq!(fields.get(ProfileColumn::RoleNo), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn test_json_presence() {
        assert!(present_json(Some(&json!({"city": "Pune"}))).is_some());
        assert!(present_json(Some(&json!(["line 1"]))).is_some());
        assert!(present_json(Some(&json!([]))).is_none());
        assert!(present_json(Some(&json!(""))).is_none());
        assert!(present_json(Some(&Value::Null)).is_none());
        assert!(present_json(None).is_none());
    }
}
