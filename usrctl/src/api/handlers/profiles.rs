use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::profiles::{ListProfilesQuery, ProfileCreate, ProfileCreated, ProfileResponse, ProfileUpdate};
use crate::db::handlers::{Profiles, Repository};
use crate::db::models::profiles::{ProfileCreateDBRequest, ProfileUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::ProfileId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/profiles",
    tag = "profiles",
    summary = "List profiles",
    responses(
        (status = 200, description = "Page of profiles", body = PaginatedResponse<ProfileResponse>),
        (status = 400, description = "Unknown sort column or status"),
        (status = 500, description = "Internal server error")
    ),
    params(ListProfilesQuery)
)]
#[tracing::instrument(skip_all)]
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(query): Query<ListProfilesQuery>,
) -> Result<Json<PaginatedResponse<ProfileResponse>>> {
    let filter = query.to_filter()?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    let (total_records, profiles) = repo.search(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        profiles.into_iter().map(ProfileResponse::from).collect(),
        total_records,
        query.pagination.page(),
        query.pagination.size(),
    )))
}

#[utoipa::path(
    post,
    path = "/profiles",
    tag = "profiles",
    summary = "Create profile",
    request_body = ProfileCreate,
    responses(
        (status = 201, description = "Profile and credential created", body = ProfileCreated),
        (status = 400, description = "Invalid request or unknown role"),
        (status = 409, description = "Username already taken"),
        (status = 503, description = "Store unavailable or transaction deadline exceeded"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_profile(
    State(state): State<AppState>,
    Json(create): Json<ProfileCreate>,
) -> Result<(StatusCode, Json<ProfileCreated>)> {
    create.validate()?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn)
        .with_deadline(state.config.transaction_timeout)
        .with_hash_params(state.config.password);
    let request = ProfileCreateDBRequest::from(create);

    let profile_id = repo.create(&request).await?;
    Ok((StatusCode::CREATED, Json(ProfileCreated { profile_id })))
}

#[utoipa::path(
    get,
    path = "/profiles/{profile_id}",
    tag = "profiles",
    summary = "Get profile",
    responses(
        (status = 200, description = "Profile details", body = ProfileResponse),
        (status = 400, description = "Malformed profile ID"),
        (status = 404, description = "Profile not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("profile_id" = uuid::Uuid, Path, description = "Profile ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, Path(profile_id): Path<ProfileId>) -> Result<Json<ProfileResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    match repo.get_by_id(profile_id).await? {
        Some(profile) => Ok(Json(ProfileResponse::from(profile))),
        None => Err(Error::NotFound {
            resource: "Profile".to_string(),
            id: profile_id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/profiles/{profile_id}",
    tag = "profiles",
    summary = "Update profile",
    request_body = ProfileUpdate,
    responses(
        (status = 204, description = "Profile updated"),
        (status = 400, description = "Invalid request, unknown role or nothing to update"),
        (status = 404, description = "Profile not found"),
        (status = 503, description = "Store unavailable or transaction deadline exceeded"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("profile_id" = uuid::Uuid, Path, description = "Profile ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<ProfileId>,
    Json(update): Json<ProfileUpdate>,
) -> Result<StatusCode> {
    update.validate()?;
    let request = ProfileUpdateDBRequest::from(update);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn).with_deadline(state.config.transaction_timeout);

    repo.update(profile_id, &request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            pagination::PaginatedResponse,
            profiles::{ProfileCreated, ProfileResponse},
        },
        test_utils::*,
        types::Status,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_profile(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let role = create_test_role(&pool, "Administrator").await;

        let response = app.post("/api/v1/profiles").json(&sample_profile_create(role.role_id, "ann")).await;
        response.assert_status(StatusCode::CREATED);
        let created: ProfileCreated = response.json();

        let response = app.get(&format!("/api/v1/profiles/{}", created.profile_id)).await;
        response.assert_status_ok();
        let profile: ProfileResponse = response.json();
        assert_eq!(profile.profile_id, created.profile_id);
        assert_eq!(profile.role_name, "Administrator");
        assert_eq!(profile.email, "ann@x.com");
        assert_eq!(profile.status, Status::Active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_validation_errors(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let role = create_test_role(&pool, "Administrator").await;

        let mut invalid = sample_profile_create(role.role_id, "ann");
        invalid.email = "not-an-email".to_string();
        app.post("/api/v1/profiles")
            .json(&invalid)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let mut blank = sample_profile_create(role.role_id, "ann");
        blank.full_name = "   ".to_string();
        app.post("/api/v1/profiles").json(&blank).await.assert_status(StatusCode::BAD_REQUEST);

        // Unknown role resolves to nothing
        let response = app
            .post("/api/v1/profiles")
            .json(&sample_profile_create(Uuid::new_v4(), "ann"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlong_fields_are_client_errors(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let role = create_test_role(&pool, "Administrator").await;

        let mut create = sample_profile_create(role.role_id, "ann");
        create.mobile_no = Some("5".repeat(20));
        let response = app.post("/api/v1/profiles").json(&create).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("mobile_no must be at most 15 characters");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 0);

        let created: ProfileCreated = app
            .post("/api/v1/profiles")
            .json(&sample_profile_create(role.role_id, "ann"))
            .await
            .json();
        let path = format!("/api/v1/profiles/{}", created.profile_id);

        let response = app.patch(&path).json(&json!({"full_name": "a".repeat(80)})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("full_name must be at most 65 characters");

        let profile: ProfileResponse = app.get(&path).await.json();
        assert_eq!(profile.full_name, "Ann");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_username_conflicts(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let role = create_test_role(&pool, "Administrator").await;

        app.post("/api/v1/profiles")
            .json(&sample_profile_create(role.role_id, "ann"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app.post("/api/v1/profiles").json(&sample_profile_create(role.role_id, "ann")).await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "This username is already taken");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_profile_errors(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;

        app.get(&format!("/api/v1/profiles/{}", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.get("/api/v1/profiles/not-a-uuid").await.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_profile(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let role = create_test_role(&pool, "Administrator").await;

        let created: ProfileCreated = app
            .post("/api/v1/profiles")
            .json(&sample_profile_create(role.role_id, "ann"))
            .await
            .json();
        let path = format!("/api/v1/profiles/{}", created.profile_id);

        app.patch(&path)
            .json(&json!({"status": "I", "mobile_no": "5550100", "updated_by": 4}))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let profile: ProfileResponse = app.get(&path).await.json();
        assert_eq!(profile.status, Status::Inactive);
        assert_eq!(profile.mobile_no.as_deref(), Some("5550100"));
        assert_eq!(profile.updated_by, Some(4));
        assert_eq!(profile.full_name, "Ann");

        // Nothing effective to write
        app.patch(&path)
            .json(&json!({"full_name": "  ", "updated_by": 4}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Unknown profile
        app.patch(&format!("/api/v1/profiles/{}", Uuid::new_v4()))
            .json(&json!({"status": "D"}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_profiles_paginates(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let role = create_test_role(&pool, "Administrator").await;

        for i in 0..25 {
            let mut create = sample_profile_create(role.role_id, &format!("ann{i:02}"));
            create.full_name = format!("Ann {i:02}");
            app.post("/api/v1/profiles").json(&create).await.assert_status(StatusCode::CREATED);
        }
        let mut bob = sample_profile_create(role.role_id, "bob");
        bob.full_name = "Bob".to_string();
        app.post("/api/v1/profiles").json(&bob).await.assert_status(StatusCode::CREATED);

        let response = app.get("/api/v1/profiles?search=ann&status=A&page=1&size=10").await;
        response.assert_status_ok();
        let page: PaginatedResponse<ProfileResponse> = response.json();
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.total_records, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.size, 10);
        assert_eq!(page.data[0].full_name, "Ann 00");

        let last: PaginatedResponse<ProfileResponse> = app.get("/api/v1/profiles?search=ann&page=3&size=10").await.json();
        assert_eq!(last.data.len(), 5);

        let desc: PaginatedResponse<ProfileResponse> = app.get("/api/v1/profiles?sort_by=full_name&order=DESC&size=1").await.json();
        assert_eq!(desc.data[0].full_name, "Bob");
        assert_eq!(desc.total_records, 26);
        assert_eq!(desc.total_pages, 26);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_profiles_rejects_bad_parameters(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;

        app.get("/api/v1/profiles?sort_by=password_hash")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        app.get("/api/v1/profiles?status=X").await.assert_status(StatusCode::BAD_REQUEST);
        app.get("/api/v1/profiles?page=abc").await.assert_status(StatusCode::BAD_REQUEST);

        // Unknown direction falls back to ascending
        let empty: PaginatedResponse<ProfileResponse> = app.get("/api/v1/profiles?order=sideways").await.json();
        assert_eq!(empty.total_records, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.data.is_empty());
    }
}
