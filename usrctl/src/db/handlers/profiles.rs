//! Database repository for profiles and their credentials.
//!
//! Writes are transactional. `create` inserts the profile and its credential in one unit,
//! `update` applies a sparse field set in one UPDATE. Both open their transaction on the
//! borrowed connection and only reach `commit()` on the success path; every other exit
//! drops the [`sqlx::Transaction`], which rolls it back.
//!
//! Reads compose a page query and a count query from the same filter predicate.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{Arguments, Connection, FromRow, PgConnection, Postgres, QueryBuilder};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::auth::password::{self, Argon2Params};
use crate::db::{
    errors::{DbError, Result},
    handlers::{repository::Repository, roles::Roles},
    models::profiles::{ProfileCreateDBRequest, ProfileDBResponse, ProfileUpdateDBRequest},
};
use crate::types::{ActorId, ProfileId, ProfileNo, RoleId, Status, abbrev_uuid};

const PROFILES_TABLE: &str = "profiles";
const CREDENTIALS_TABLE: &str = "credentials";

const PROFILE_SELECT: &str = r#"
    SELECT
        profile.profile_id,
        role.role_id,
        role.role_name,
        profile.full_name,
        profile.email,
        profile.gender,
        profile.dob,
        profile.mobile_no,
        profile.address,
        profile.status,
        profile.created_at,
        profile.created_by,
        profile.updated_at,
        profile.updated_by
    FROM profiles AS profile
    INNER JOIN roles AS role ON role.role_no = profile.role_no
"#;

const PROFILE_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM profiles AS profile
    INNER JOIN roles AS role ON role.role_no = profile.role_no
"#;

/// Columns a profile listing may be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    FullName,
    Email,
    Status,
    Dob,
    CreatedAt,
    UpdatedAt,
    RoleName,
}

impl SortColumn {
    fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::FullName => "profile.full_name",
            SortColumn::Email => "profile.email",
            SortColumn::Status => "profile.status",
            SortColumn::Dob => "profile.dob",
            SortColumn::CreatedAt => "profile.created_at",
            SortColumn::UpdatedAt => "profile.updated_at",
            SortColumn::RoleName => "role.role_name",
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full_name" | "user_full_name" => Ok(SortColumn::FullName),
            "email" => Ok(SortColumn::Email),
            "status" => Ok(SortColumn::Status),
            "dob" => Ok(SortColumn::Dob),
            "created_at" => Ok(SortColumn::CreatedAt),
            "updated_at" => Ok(SortColumn::UpdatedAt),
            "role_name" => Ok(SortColumn::RoleName),
            other => Err(format!(
                "Invalid sort column '{other}', expected one of full_name, email, status, dob, created_at, updated_at, role_name"
            )),
        }
    }
}

/// Sort direction for profile listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` in any case is descending; anything else is ascending.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter for listing profiles
#[derive(Debug, Clone)]
pub struct ProfileFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub status: Option<Status>,
    pub sort: SortColumn,
    pub order: SortOrder,
}

impl ProfileFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            search: None,
            status: None,
            sort: SortColumn::default(),
            order: SortOrder::default(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_sort(mut self, sort: SortColumn, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }
}

/// A `LIKE` pattern matching `term` literally anywhere in the value.
fn substring_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Append the filter predicate shared by the page and count queries.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProfileFilter) {
    query.push(" WHERE 1=1");

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = substring_pattern(term);
        query.push(" AND (profile.full_name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" ESCAPE '\\' OR profile.email ILIKE ");
        query.push_bind(pattern);
        query.push(" ESCAPE '\\')");
    }

    if let Some(status) = filter.status {
        query.push(" AND profile.status = ");
        query.push_bind(status);
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct ProfileRow {
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

impl From<ProfileRow> for ProfileDBResponse {
    fn from(row: ProfileRow) -> Self {
        Self {
            profile_id: row.profile_id,
            role_id: row.role_id,
            role_name: row.role_name,
            full_name: row.full_name,
            email: row.email,
            gender: row.gender,
            dob: row.dob,
            mobile_no: row.mobile_no,
            address: row.address,
            status: row.status,
            created_at: row.created_at,
            created_by: row.created_by,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        }
    }
}

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
    deadline: Option<Duration>,
    hash_params: Option<Argon2Params>,
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self {
            db,
            deadline: None,
            hash_params: None,
        }
    }

    /// Bound every write transaction, from begin to commit, by `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Hash new secrets with these parameters instead of the defaults.
    pub fn with_hash_params(mut self, params: Argon2Params) -> Self {
        self.hash_params = Some(params);
        self
    }

    /// Count and fetch one page of matching profiles from a single snapshot.
    ///
    /// Both statements run in one read-only `REPEATABLE READ` transaction, so writes that
    /// commit in between cannot make the total disagree with the page.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn search(&mut self, filter: &ProfileFilter) -> Result<(i64, Vec<ProfileDBResponse>)> {
        let mut tx = self.db.begin().await.map_err(DbError::Unavailable)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total = count_matching(&mut tx, filter).await?;
        let profiles = list_matching(&mut tx, filter).await?;

        tx.commit().await?;
        Ok((total, profiles))
    }

    /// Check a login name and secret, returning the owning profile when they match.
    ///
    /// Only active profiles can be verified.
    #[instrument(skip(self, password), err)]
    pub async fn verify_credentials(&mut self, username: &str, password: &str) -> Result<Option<ProfileId>> {
        let row: Option<(ProfileId, String)> = sqlx::query_as(
            r#"
            SELECT profile.profile_id, credential.password_hash
            FROM credentials AS credential
            INNER JOIN profiles AS profile ON profile.profile_no = credential.profile_no
            WHERE credential.username = $1 AND profile.status = $2
            "#,
        )
        .bind(username.trim())
        .bind(Status::Active)
        .fetch_optional(&mut *self.db)
        .await?;

        let Some((profile_id, password_hash)) = row else {
            return Ok(None);
        };

        let secret = password.to_string();
        let valid = tokio::task::spawn_blocking(move || password::verify_string(&secret, &password_hash))
            .await
            .map_err(|e| DbError::Other(anyhow::anyhow!("credential verification task failed: {e}")))?
            .map_err(|e| DbError::Other(anyhow::anyhow!("{e}")))?;

        Ok(valid.then_some(profile_id))
    }
}

/// Run `operation` to completion, or fail with [`DbError::TimedOut`] once `deadline` passes.
///
/// On expiry the operation's future is dropped, and with it any open transaction.
async fn within_deadline<T>(deadline: Option<Duration>, operation: impl Future<Output = Result<T>>) -> Result<T> {
    let Some(timeout) = deadline else {
        return operation.await;
    };

    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?timeout, "Transaction deadline exceeded, rolling back");
            Err(DbError::TimedOut { timeout })
        }
    }
}

async fn create_in_transaction(
    db: &mut PgConnection,
    request: &ProfileCreateDBRequest,
    hash_params: Option<Argon2Params>,
) -> Result<ProfileId> {
    let profile_id = Uuid::new_v4();
    let created_at = Utc::now();

    let mut tx = db.begin().await.map_err(DbError::Unavailable)?;

    let role_no = match request.role_reference() {
        Some(role_id) => Some(Roles::new(&mut tx).resolve(role_id).await?),
        None => None,
    };

    let encoded = request.profile_fields(profile_id, role_no, created_at).encode();
    let sql = encoded.insert_sql(PROFILES_TABLE, Some("profile_no"));
    let profile_no: ProfileNo = sqlx::query_scalar_with::<_, ProfileNo, _>(&sql, encoded.into_arguments()?)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::insert_failed(PROFILES_TABLE, e))?;

    let secret = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&secret, hash_params))
        .await
        .map_err(|e| DbError::CredentialPreparation { message: e.to_string() })?
        .map_err(|e| DbError::CredentialPreparation { message: e.to_string() })?;

    let encoded = request
        .credential_fields(Uuid::new_v4(), profile_no, password_hash, created_at)
        .encode();
    let sql = encoded.insert_sql(CREDENTIALS_TABLE, None);
    sqlx::query_with(&sql, encoded.into_arguments()?)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::insert_failed(CREDENTIALS_TABLE, e))?;

    tx.commit().await.map_err(|e| {
        error!(
            profile_id = %abbrev_uuid(&profile_id),
            error = %e,
            "Commit failed while creating profile, outcome is indeterminate"
        );
        DbError::CommitFailed(e)
    })?;

    Ok(profile_id)
}

async fn update_in_transaction(db: &mut PgConnection, id: ProfileId, request: &ProfileUpdateDBRequest) -> Result<()> {
    let mut tx = db.begin().await.map_err(DbError::Unavailable)?;

    let role_no = match request.role_reference() {
        Some(role_id) => Some(Roles::new(&mut tx).resolve(role_id).await?),
        None => None,
    };

    let encoded = request.update_fields(role_no, Utc::now())?.encode();
    let sql = encoded.update_sql(PROFILES_TABLE, "profile_id");
    let mut args = encoded.into_arguments()?;
    args.add(id)
        .map_err(|e| DbError::Other(anyhow::anyhow!("failed to encode query argument: {e}")))?;

    let result = sqlx::query_with(&sql, args).execute(&mut *tx).await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    tx.commit().await.map_err(|e| {
        error!(
            profile_id = %abbrev_uuid(&id),
            error = %e,
            "Commit failed while updating profile, outcome is indeterminate"
        );
        DbError::CommitFailed(e)
    })?;

    Ok(())
}

async fn list_matching(db: &mut PgConnection, filter: &ProfileFilter) -> Result<Vec<ProfileDBResponse>> {
    let mut query = QueryBuilder::new(PROFILE_SELECT);
    push_filters(&mut query, filter);

    // profile_no breaks ties so pages never overlap
    let order = filter.order.as_sql();
    query.push(format!(
        " ORDER BY {} {order}, profile.profile_no {order} LIMIT ",
        filter.sort.as_sql()
    ));
    query.push_bind(filter.limit);
    query.push(" OFFSET ");
    query.push_bind(filter.skip);

    let profiles = query.build_query_as::<ProfileRow>().fetch_all(&mut *db).await?;

    Ok(profiles.into_iter().map(ProfileDBResponse::from).collect())
}

async fn count_matching(db: &mut PgConnection, filter: &ProfileFilter) -> Result<i64> {
    let mut query = QueryBuilder::new(PROFILE_COUNT);
    push_filters(&mut query, filter);

    let count = query.build_query_scalar::<i64>().fetch_one(&mut *db).await?;
    Ok(count)
}

#[async_trait::async_trait]
impl<'c> Repository for Profiles<'c> {
    type CreateRequest = ProfileCreateDBRequest;
    type UpdateRequest = ProfileUpdateDBRequest;
    type Response = ProfileDBResponse;
    type Id = ProfileId;
    type Filter = ProfileFilter;

    #[instrument(skip(self, request), fields(role_id = %abbrev_uuid(&request.role_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Id> {
        let profile_id = within_deadline(self.deadline, create_in_transaction(self.db, request, self.hash_params)).await?;
        debug!(profile_id = %abbrev_uuid(&profile_id), "Created profile");
        Ok(profile_id)
    }

    #[instrument(skip(self), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new(PROFILE_SELECT);
        query.push(" WHERE profile.profile_id = ");
        query.push_bind(id);

        let profile = query.build_query_as::<ProfileRow>().fetch_optional(&mut *self.db).await?;

        Ok(profile.map(ProfileDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        list_matching(self.db, filter).await
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        count_matching(self.db, filter).await
    }

    #[instrument(skip(self, request), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<()> {
        // Rejected before a transaction is opened
        if !request.has_effective_fields() {
            return Err(DbError::NoFieldsToUpdate);
        }

        within_deadline(self.deadline, update_in_transaction(self.db, id, request)).await
    }
}
