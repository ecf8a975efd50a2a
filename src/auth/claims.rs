use serde::{Deserialize, Serialize};

/// JWT payload minted by the external identity provider. The service only
/// verifies; it never signs tokens in production.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // subject id at the identity provider
    pub email: String, // verified email
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,   // issuer
    pub aud: String,   // audience
}
