//! OpenAPI documentation for the profile management API, served at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::profiles::{ProfileCreate, ProfileCreated, ProfileResponse, ProfileUpdate};
use crate::types::Status;

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Profile management API")
    ),
    paths(
        api::handlers::profiles::list_profiles,
        api::handlers::profiles::create_profile,
        api::handlers::profiles::get_profile,
        api::handlers::profiles::update_profile,
    ),
    components(
        schemas(
            ProfileCreate,
            ProfileUpdate,
            ProfileCreated,
            ProfileResponse,
            PaginatedResponse<ProfileResponse>,
            Status,
        )
    ),
    tags(
        (name = "profiles", description = "User profiles with their login credentials and roles"),
    ),
    info(
        title = "usrctl",
        description = "User profile management over PostgreSQL",
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_profile_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        assert!(paths.contains(&"/profiles".to_string()));
        assert!(paths.contains(&"/profiles/{profile_id}".to_string()));
    }
}
