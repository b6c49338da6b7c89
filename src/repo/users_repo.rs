use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::user::{AuthUser, Role};

#[derive(Clone)]
pub struct UsersRepo {
    pub pool: PgPool,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub login_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl UserRecord {
    pub fn into_auth_user(self) -> AuthUser {
        AuthUser {
            id: self.id,
            login_id: self.login_id,
            name: self.name,
            email: self.email,
            role: self.role,
        }
    }
}

pub enum InsertUserOutcome {
    Inserted(Uuid),
    DuplicateEmail,
    DuplicateLoginId,
}

fn map_user(row: sqlx::postgres::PgRow) -> Result<UserRecord> {
    let role: String = row.get("role");
    Ok(UserRecord {
        id: row.get("id"),
        login_id: row.get("login_id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: Role::parse(&role).ok_or_else(|| anyhow::anyhow!("unknown role: {role}"))?,
    })
}

impl UsersRepo {
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, login_id, name, email, password_hash, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_user).transpose()
    }

    pub async fn find_by_login_id(&self, login_id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, login_id, name, email, password_hash, role FROM users WHERE login_id = $1",
        )
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_user).transpose()
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Relies on the unique constraints to arbitrate duplicate emails and
    /// login-id collisions; the caller retries with a fresh login id.
    pub async fn insert(
        &self,
        login_id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<InsertUserOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (login_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(login_id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertUserOutcome::Inserted(row.get("id"))),
            Err(e) if constraint_is(&e, "users_email_key") => Ok(InsertUserOutcome::DuplicateEmail),
            Err(e) if constraint_is(&e, "users_login_id_key") => {
                Ok(InsertUserOutcome::DuplicateLoginId)
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) fn constraint_is(e: &sqlx::Error, name: &str) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.constraint() == Some(name))
}
