use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codes::{generate_login_id, MAX_CODE_ATTEMPTS};
use crate::domain::user::{AuthUser, Role};
use crate::error::ApiError;
use crate::repo::users_repo::{InsertUserOutcome, UsersRepo};

pub const SESSION_COOKIE: &str = "voucher_auth";
const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;
const BCRYPT_COST: u32 = 10;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub login_id: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub login_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    pub users_repo: UsersRepo,
    pub jwt_secret: String,
}

impl AuthService {
    /// Duplicate emails are rejected before a login id is generated, so a
    /// failed registration never consumes one.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let name = req.name.trim();
        let email = req.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || req.password.is_empty() {
            return Err(ApiError::Validation("name, email and password are required".to_string()));
        }
        if req.password.len() < 6 {
            return Err(ApiError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        let role = Role::parse(&req.role)
            .ok_or_else(|| ApiError::Validation("role must be customer or validator".to_string()))?;

        if self.users_repo.email_exists(&email).await? {
            return Err(ApiError::Conflict("email already registered".to_string()));
        }

        let password_hash = bcrypt::hash(&req.password, BCRYPT_COST)
            .map_err(|e| anyhow::anyhow!("bcrypt hash failed: {e}"))?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let login_id = generate_login_id();
            match self
                .users_repo
                .insert(&login_id, name, &email, &password_hash, role)
                .await?
            {
                InsertUserOutcome::Inserted(_) => {
                    tracing::info!(%login_id, role = role.as_str(), "user registered");
                    return Ok(RegisterResponse { login_id });
                }
                InsertUserOutcome::DuplicateLoginId => continue,
                InsertUserOutcome::DuplicateEmail => {
                    return Err(ApiError::Conflict("email already registered".to_string()));
                }
            }
        }

        Err(ApiError::CodeGenerationExhausted)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<(AuthUser, String), ApiError> {
        let login_id = req.login_id.trim().to_uppercase();
        if login_id.is_empty() || req.password.is_empty() {
            return Err(ApiError::Validation("login_id and password are required".to_string()));
        }

        let user = self
            .users_repo
            .find_by_login_id(&login_id)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        let ok = bcrypt::verify(&req.password, &user.password_hash)
            .map_err(|e| anyhow::anyhow!("bcrypt verify failed: {e}"))?;
        if !ok {
            return Err(ApiError::InvalidCredentials);
        }

        let auth_user = user.into_auth_user();
        let token = self.create_token(&auth_user)?;
        Ok((auth_user, token))
    }

    pub fn create_token(&self, user: &AuthUser) -> Result<String, ApiError> {
        sign_session(&self.jwt_secret, user)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }

    /// Role and identity are re-validated against the persisted row on
    /// every privileged request, not trusted from the token alone.
    pub async fn current_user(&self, token: &str) -> Result<Option<AuthUser>, ApiError> {
        let Some(claims) = verify_session(&self.jwt_secret, token) else {
            return Ok(None);
        };
        let user = self.users_repo.find_by_id(claims.sub).await?;
        Ok(user.map(|u| u.into_auth_user()))
    }
}

pub fn sign_session(secret: &str, user: &AuthUser) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        login_id: user.login_id.clone(),
        name: user.name.clone(),
        role: user.role,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_session(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}
