//! API request/response models for profiles.

use super::pagination::PageParams;
use crate::db::handlers::profiles::{ProfileFilter, SortColumn, SortOrder};
use crate::db::models::profiles::ProfileDBResponse;
use crate::errors::Error;
use crate::types::{ActorId, ProfileId, RoleId, Status};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Column widths of the `profiles` and `credentials` tables
const MAX_TEXT_LEN: usize = 65;
const MAX_MOBILE_LEN: usize = 15;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

// Profile request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileCreate {
    #[schema(value_type = String, format = "uuid")]
    pub role_id: RoleId,
    pub full_name: String,
    pub email: String,
    /// Login name for the profile's credential
    pub username: String,
    /// Plaintext secret; only its hash is stored
    pub password: String,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub mobile_no: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub address: Option<Value>,
    /// Initial lifecycle status (default: A)
    pub status: Option<Status>,
    pub created_by: Option<ActorId>,
}

impl ProfileCreate {
    /// Check required fields and the email shape.
    pub fn validate(&self) -> Result<(), Error> {
        let required = [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("username", &self.username),
            ("password", &self.password),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::BadRequest {
                    message: format!("{field} is required"),
                });
            }
        }

        if self.role_id.is_nil() {
            return Err(Error::BadRequest {
                message: "role_id is required".to_string(),
            });
        }

        check_length("full_name", Some(&self.full_name), MAX_TEXT_LEN)?;
        check_length("email", Some(&self.email), MAX_TEXT_LEN)?;
        check_length("username", Some(&self.username), MAX_TEXT_LEN)?;
        check_length("gender", self.gender.as_ref(), MAX_TEXT_LEN)?;
        check_length("mobile_no", self.mobile_no.as_ref(), MAX_MOBILE_LEN)?;

        if !EMAIL_SHAPE.is_match(self.email.trim()) {
            return Err(Error::BadRequest {
                message: format!("'{}' is not a valid email address", self.email.trim()),
            });
        }

        Ok(())
    }
}

/// Reject a value longer than its column once trimmed, as the store would.
fn check_length(field: &str, value: Option<&String>, max: usize) -> Result<(), Error> {
    match value.map(|v| v.trim().chars().count()) {
        Some(len) if len > max => Err(Error::BadRequest {
            message: format!("{field} must be at most {max} characters"),
        }),
        _ => Ok(()),
    }
}

/// Partial profile update: absent or blank fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub role_id: Option<RoleId>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub mobile_no: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub address: Option<Value>,
    pub status: Option<Status>,
    pub updated_by: Option<ActorId>,
}

impl ProfileUpdate {
    /// Reject overlong fields and a malformed email when they are supplied.
    pub fn validate(&self) -> Result<(), Error> {
        check_length("full_name", self.full_name.as_ref(), MAX_TEXT_LEN)?;
        check_length("email", self.email.as_ref(), MAX_TEXT_LEN)?;
        check_length("gender", self.gender.as_ref(), MAX_TEXT_LEN)?;
        check_length("mobile_no", self.mobile_no.as_ref(), MAX_MOBILE_LEN)?;

        match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() && !EMAIL_SHAPE.is_match(email) => Err(Error::BadRequest {
                message: format!("'{email}' is not a valid email address"),
            }),
            _ => Ok(()),
        }
    }
}

// Profile response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileCreated {
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
    #[schema(value_type = String, format = "uuid")]
    pub role_id: RoleId,
    pub role_name: String,
    pub full_name: String,
    pub email: String,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub mobile_no: Option<String>,
    #[schema(value_type = Object)]
    pub address: Value,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<ActorId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<ActorId>,
}

impl From<ProfileDBResponse> for ProfileResponse {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            profile_id: db.profile_id,
            role_id: db.role_id,
            role_name: db.role_name,
            full_name: db.full_name,
            email: db.email,
            gender: db.gender,
            dob: db.dob,
            mobile_no: db.mobile_no,
            address: db.address,
            status: db.status,
            created_at: db.created_at,
            created_by: db.created_by,
            updated_at: db.updated_at,
            updated_by: db.updated_by,
        }
    }
}

/// Query parameters for listing profiles
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListProfilesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PageParams,

    /// Case-insensitive substring match on full name or email
    pub search: Option<String>,

    /// Lifecycle status filter: A, I or D
    pub status: Option<String>,

    /// Sort column: full_name (default), email, status, dob, created_at, updated_at, role_name
    pub sort_by: Option<String>,

    /// Sort direction: asc (default) or desc
    pub order: Option<String>,
}

impl ListProfilesQuery {
    /// Build the repository filter, rejecting unknown sort columns and statuses.
    pub fn to_filter(&self) -> Result<ProfileFilter, Error> {
        let mut filter = ProfileFilter::new(self.pagination.offset(), self.pagination.size());

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.with_search(search);
        }

        if let Some(status) = self.status.as_deref().filter(|s| !s.trim().is_empty()) {
            let status = status.parse::<Status>().map_err(|message| Error::BadRequest { message })?;
            filter = filter.with_status(status);
        }

        let sort = match self.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(column) => column.parse::<SortColumn>().map_err(|message| Error::BadRequest { message })?,
            None => SortColumn::default(),
        };
        let order = self.order.as_deref().map(SortOrder::parse_lenient).unwrap_or_default();

        Ok(filter.with_sort(sort, order))
    }
}
