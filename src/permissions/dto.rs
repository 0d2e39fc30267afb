use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for creating or renaming a permission.
#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub name: String,
}
