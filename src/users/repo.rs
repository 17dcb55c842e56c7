use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Anything that is not exactly "admin" becomes a regular user.
    pub fn coerce(value: Option<&str>) -> Role {
        match value {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

// The role column is plain TEXT, so the bindings delegate to the &str
// implementations; a derived Type would advertise a "Role" type that does
// not exist in the database.
impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> sqlx::encode::IsNull {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        match <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)? {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role value: {other}").into()),
        }
    }
}

/// A row of the `users` table. Soft-deleted rows keep their data but are
/// invisible to every "active" query below.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
}

/// Partial update over the mutable user fields. `None` leaves a column
/// untouched.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at, deleted_at";

/// Assembles the partial UPDATE. Only supplied fields become SET clauses;
/// `updated_at` is always stamped and the row must still be active.
fn update_query<'q>(id: Uuid, fields: &'q UserUpdate) -> QueryBuilder<'q, sqlx::Postgres> {
    let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut parts = qb.separated(", ");
    if let Some(name) = &fields.name {
        parts.push("name = ").push_bind_unseparated(name);
    }
    if let Some(email) = &fields.email {
        parts.push("email = ").push_bind_unseparated(email);
    }
    if let Some(password_hash) = &fields.password_hash {
        parts.push("password_hash = ").push_bind_unseparated(password_hash);
    }
    if let Some(role) = fields.role {
        parts.push("role = ").push_bind_unseparated(role);
    }
    parts.push("updated_at = NOW()");
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" AND deleted_at IS NULL");
    qb
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Inserts a new user. A unique-index violation on the active email
    /// surfaces as a Conflict, which also settles races between a
    /// pre-check and the insert.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, ApiError> {
        let res = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ApiError::Conflict("Email already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Active users except `exclude_id`, newest first.
    pub async fn list_active_excluding(
        db: &PgPool,
        exclude_id: Uuid,
    ) -> Result<Vec<User>, ApiError> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE deleted_at IS NULL AND id <> $1
             ORDER BY created_at DESC"
        ))
        .bind(exclude_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Applies only the supplied fields and stamps `updated_at`. Returns
    /// false when nothing was supplied or no active row matched.
    pub async fn update(db: &PgPool, id: Uuid, fields: &UserUpdate) -> Result<bool, ApiError> {
        if fields.is_empty() {
            return Ok(false);
        }

        let mut qb = update_query(id, fields);
        let res = qb.build().execute(db).await;
        match res {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ApiError::Conflict("Email already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Marks the row deleted. False when the row is absent or already
    /// deleted; calling it twice is a failed no-op, not an error.
    pub async fn soft_delete(db: &PgPool, id: Uuid) -> Result<bool, ApiError> {
        let done = sqlx::query(
            "UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(done.rows_affected() > 0)
    }
}
