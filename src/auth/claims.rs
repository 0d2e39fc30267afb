use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload bound to a user and an expiry. Single-shot access tokens
/// only, there is no refresh flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}
