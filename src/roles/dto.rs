use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permissions::dto::PermissionResponse;

/// Request body for creating or renaming a role. Permission names are only
/// honoured on create; updates go through the link/unlink sub-routes.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permission_names: Vec<String>,
}

/// Batch permission attach payload.
#[derive(Debug, Deserialize)]
pub struct RolePermissionLinkRequest {
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<PermissionResponse>,
}
