use serde::{Deserialize, Serialize};

/// Claims minted by the external identity provider. The core trusts these as
/// already verified.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    /// Display name, recorded on attendance records.
    pub name: String,
    pub admin: bool,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
