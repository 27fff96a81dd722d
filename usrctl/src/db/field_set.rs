//! Sparse field sets and their encoding into parameterized SQL.
//!
//! A [`FieldSet`] holds only the columns an operation intends to write. Absence means
//! "leave this column alone", never "write NULL". Columns are closed enums
//! ([`ProfileColumn`], [`CredentialColumn`]) so the only text that reaches the query
//! string is a fixed column name; every value travels as a bound parameter.
//!
//! [`FieldSet::encode`] produces three parallel sequences: column names, positional
//! placeholders (`$1`, `$2`, ...) and arguments. Index `i` of each refers to the same
//! field. The rendered statements and the bound [`PgArguments`] are both built from that
//! one encoding so the correspondence cannot drift.
//!
//! ```ignore
//! let mut fields = FieldSet::new();
//! fields.set(ProfileColumn::FullName, FieldValue::Text("Ann".into()));
//! fields.set(ProfileColumn::Email, FieldValue::Text("ann@x.com".into()));
//!
//! let encoded = fields.encode();
//! let sql = encoded.insert_sql("profiles", Some("profile_no"));
//! // INSERT INTO profiles (full_name, email) VALUES ($1, $2) RETURNING profile_no
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::error::BoxDynError;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;
use uuid::Uuid;

use crate::db::errors::{DbError, Result};
use crate::types::Status;

/// A column that may appear in a [`FieldSet`].
pub trait Column: Copy + PartialEq + std::fmt::Debug {
    /// The column name exactly as it appears in the table
    fn name(&self) -> &'static str;
}

/// Writable columns of the `profiles` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileColumn {
    ProfileId,
    RoleNo,
    FullName,
    Email,
    Gender,
    Dob,
    MobileNo,
    Address,
    Status,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
}

impl Column for ProfileColumn {
    fn name(&self) -> &'static str {
        match self {
            ProfileColumn::ProfileId => "profile_id",
            ProfileColumn::RoleNo => "role_no",
            ProfileColumn::FullName => "full_name",
            ProfileColumn::Email => "email",
            ProfileColumn::Gender => "gender",
            ProfileColumn::Dob => "dob",
            ProfileColumn::MobileNo => "mobile_no",
            ProfileColumn::Address => "address",
            ProfileColumn::Status => "status",
            ProfileColumn::CreatedAt => "created_at",
            ProfileColumn::CreatedBy => "created_by",
            ProfileColumn::UpdatedAt => "updated_at",
            ProfileColumn::UpdatedBy => "updated_by",
        }
    }
}

/// Writable columns of the `credentials` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialColumn {
    CredentialId,
    ProfileNo,
    Username,
    PasswordHash,
    CreatedAt,
    CreatedBy,
}

impl Column for CredentialColumn {
    fn name(&self) -> &'static str {
        match self {
            CredentialColumn::CredentialId => "credential_id",
            CredentialColumn::ProfileNo => "profile_no",
            CredentialColumn::Username => "username",
            CredentialColumn::PasswordHash => "password_hash",
            CredentialColumn::CreatedAt => "created_at",
            CredentialColumn::CreatedBy => "created_by",
        }
    }
}

/// A typed value destined for one placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Uuid(Uuid),
    Int(i32),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    Status(Status),
}

impl FieldValue {
    fn add_to(self, args: &mut PgArguments) -> std::result::Result<(), BoxDynError> {
        match self {
            FieldValue::Text(v) => args.add(v),
            FieldValue::Uuid(v) => args.add(v),
            FieldValue::Int(v) => args.add(v),
            FieldValue::Date(v) => args.add(v),
            FieldValue::Timestamp(v) => args.add(v),
            FieldValue::Json(v) => args.add(v),
            FieldValue::Status(v) => args.add(v),
        }
    }
}

/// An ordered, duplicate-free set of column assignments
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet<C: Column> {
    fields: Vec<(C, FieldValue)>,
}

impl<C: Column> Default for FieldSet<C> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<C: Column> FieldSet<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a column, replacing any earlier value for the same column in place.
    pub fn set(&mut self, column: C, value: FieldValue) -> &mut Self {
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    /// Assign a column only when a value is present.
    pub fn set_opt(&mut self, column: C, value: Option<FieldValue>) -> &mut Self {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    pub fn contains(&self, column: C) -> bool {
        self.fields.iter().any(|(c, _)| *c == column)
    }

    pub fn get(&self, column: C) -> Option<&FieldValue> {
        self.fields.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode with placeholders numbered from `$1`.
    pub fn encode(self) -> EncodedFields {
        self.encode_from(1)
    }

    /// Encode with placeholders numbered from `$first`.
    pub fn encode_from(self, first: usize) -> EncodedFields {
        let mut columns = Vec::with_capacity(self.fields.len());
        let mut placeholders = Vec::with_capacity(self.fields.len());
        let mut args = Vec::with_capacity(self.fields.len());

        for (i, (column, value)) in self.fields.into_iter().enumerate() {
            columns.push(column.name());
            placeholders.push(format!("${}", first + i));
            args.push(value);
        }

        EncodedFields {
            columns,
            placeholders,
            args,
            first,
        }
    }
}

/// Parallel column / placeholder / argument sequences produced by [`FieldSet::encode`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFields {
    pub columns: Vec<&'static str>,
    pub placeholders: Vec<String>,
    pub args: Vec<FieldValue>,
    first: usize,
}

impl EncodedFields {
    /// `INSERT INTO table (c1, c2) VALUES ($1, $2) [RETURNING col]`
    pub fn insert_sql(&self, table: &str, returning: Option<&str>) -> String {
        let mut sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            self.columns.join(", "),
            self.placeholders.join(", ")
        );
        if let Some(col) = returning {
            sql.push_str(" RETURNING ");
            sql.push_str(col);
        }
        sql
    }

    /// `UPDATE table SET c1 = $1, c2 = $2 WHERE key = $3`
    ///
    /// The key placeholder follows the last assignment; bind the key after the field
    /// arguments.
    pub fn update_sql(&self, table: &str, key_column: &str) -> String {
        let assignments: Vec<String> = self
            .columns
            .iter()
            .zip(&self.placeholders)
            .map(|(col, ph)| format!("{col} = {ph}"))
            .collect();
        let key_placeholder = self.next_placeholder();
        format!("UPDATE {table} SET {} WHERE {key_column} = {key_placeholder}", assignments.join(", "))
    }

    /// The placeholder that follows the encoded fields
    pub fn next_placeholder(&self) -> String {
        format!("${}", self.first + self.placeholders.len())
    }

    /// Bind the arguments, in placeholder order, into a fresh argument buffer.
    pub fn into_arguments(self) -> Result<PgArguments> {
        let mut args = PgArguments::default();
        for value in self.args {
            value
                .add_to(&mut args)
                .map_err(|e| DbError::Other(anyhow::anyhow!("failed to encode query argument: {e}")))?;
        }
        Ok(args)
    }
}
