use serde::{Deserialize, Serialize};

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// The member sending invitations
#[derive(Debug, Clone, PartialEq)]
pub struct Inviter {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

impl From<Claims> for Inviter {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
        }
    }
}
