//! Database repository for roles.

use crate::db::{
    errors::{DbError, Result},
    models::roles::{RoleCreateDBRequest, RoleDBResponse},
};
use crate::types::{RoleId, RoleNo, Status, abbrev_uuid};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Role {
    pub role_id: RoleId,
    pub role_name: String,
    pub role_details: Value,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl From<Role> for RoleDBResponse {
    fn from(role: Role) -> Self {
        Self {
            role_id: role.role_id,
            role_name: role.role_name,
            role_details: role.role_details,
            status: role.status,
            created_at: role.created_at,
        }
    }
}

pub struct Roles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Roles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Resolve an external role id to the role's surrogate key.
    ///
    /// Runs on whatever connection the repository was built from, so a caller holding a
    /// transaction gets a transaction-scoped lookup.
    #[instrument(skip(self), fields(role_id = %abbrev_uuid(&role_id)), err)]
    pub async fn resolve(&mut self, role_id: RoleId) -> Result<RoleNo> {
        sqlx::query_scalar::<_, RoleNo>("SELECT role_no FROM roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or_else(|| DbError::UnresolvedReference {
                entity: "Role",
                id: role_id.to_string(),
            })
    }

    #[instrument(skip(self, request), fields(role_name = %request.role_name), err)]
    pub async fn create(&mut self, request: &RoleCreateDBRequest) -> Result<RoleDBResponse> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (role_id, role_name, role_details, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING role_id, role_name, role_details, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.role_name)
        .bind(&request.role_details)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(RoleDBResponse::from(role))
    }

    #[instrument(skip(self), fields(role_id = %abbrev_uuid(&role_id)), err)]
    pub async fn get_by_id(&mut self, role_id: RoleId) -> Result<Option<RoleDBResponse>> {
        let role = sqlx::query_as::<_, Role>("SELECT role_id, role_name, role_details, status, created_at FROM roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(role.map(RoleDBResponse::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_role(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Roles::new(&mut conn);

        let request = RoleCreateDBRequest {
            role_name: "Administrator".to_string(),
            role_details: json!(["profiles:write"]),
            created_by: Some(1),
        };
        let created = repo.create(&request).await.unwrap();
        assert_eq!(created.role_name, "Administrator");
        assert_eq!(created.status, Status::Active);

        let fetched = repo.get_by_id(created.role_id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.role_details, json!(["profiles:write"]));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolve_role(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Roles::new(&mut conn);

        let created = repo.create(&RoleCreateDBRequest::new("Viewer")).await.unwrap();
        let role_no = repo.resolve(created.role_id).await.unwrap();

        let expected: RoleNo = sqlx::query_scalar("SELECT role_no FROM roles WHERE role_id = $1")
            .bind(created.role_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(role_no, expected);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolve_unknown_role(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Roles::new(&mut conn);

        let missing = Uuid::new_v4();
        match repo.resolve(missing).await {
            Err(DbError::UnresolvedReference { entity, id }) => {
                assert_eq!(entity, "Role");
                assert_eq!(id, missing.to_string());
            }
            other => panic!("expected unresolved reference, got {other:?}"),
        }
        assert!(repo.get_by_id(missing).await.unwrap().is_none());
    }
}
