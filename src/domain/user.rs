use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Validator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Validator => "validator",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "customer" => Some(Role::Customer),
            "validator" => Some(Role::Validator),
            _ => None,
        }
    }
}

/// Authenticated principal, resolved once at the HTTP boundary and passed
/// explicitly into every workflow operation.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub login_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}
